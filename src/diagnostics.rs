//! Reporting channel for conditions that are caller bugs but not failures:
//! releasing an unknown pointer, and dropping an arena with live blocks.

use std::{cell::RefCell, fmt, rc::Rc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
  /// `deallocate` was called with a pointer that is not live in this arena.
  InvalidFree { address: usize, size: usize },
  /// The arena was dropped while `blocks` allocations (`bytes` carved bytes)
  /// were still live.
  Leak { blocks: usize, bytes: usize },
}

impl fmt::Display for Diagnostic {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      Diagnostic::InvalidFree { address, size } => {
        write!(f, "deallocate: unknown pointer {address:#x} ({size} bytes)")
      },
      Diagnostic::Leak { blocks, bytes } => {
        write!(f, "leaked blocks = {blocks} ({bytes} bytes)")
      },
    }
  }
}

pub trait DiagnosticSink {
  fn report(
    &self,
    diagnostic: &Diagnostic,
  );
}

/// Default sink: emits a `tracing` warning per diagnostic.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
  fn report(
    &self,
    diagnostic: &Diagnostic,
  ) {
    match diagnostic {
      Diagnostic::InvalidFree { address, size } => {
        tracing::warn!(address, size, "{diagnostic}");
      },
      Diagnostic::Leak { blocks, bytes } => {
        tracing::warn!(blocks, bytes, "{diagnostic}");
      },
    }
  }
}

/// Collects diagnostics in memory. Clones share the same buffer, so a clone
/// can be handed to an arena while the original is kept for inspection.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
  events: Rc<RefCell<Vec<Diagnostic>>>,
}

impl RecordingSink {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn events(&self) -> Vec<Diagnostic> {
    self.events.borrow().clone()
  }

  pub fn is_empty(&self) -> bool {
    self.events.borrow().is_empty()
  }

  pub fn clear(&self) {
    self.events.borrow_mut().clear();
  }
}

impl DiagnosticSink for RecordingSink {
  fn report(
    &self,
    diagnostic: &Diagnostic,
  ) {
    self.events.borrow_mut().push(diagnostic.clone());
  }
}
