//! Module for tracking the operational state of the routing stage.
//!
//! This module defines the `RouterState` struct, an atomic counter of items
//! currently inside the routing stage. The surrounding pipeline uses it to
//! detect when the stage has drained and can be shut down gracefully.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared state of the routing workers.
#[derive(Debug, Default)]
pub struct RouterState {
    /// The number of items currently being routed.
    pub routing_items: AtomicUsize,
}

impl RouterState {
    /// Creates a new, atomically reference-counted `RouterState`.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Checks if no items are currently inside the stage.
    pub fn is_idle(&self) -> bool {
        self.routing_items.load(Ordering::SeqCst) == 0
    }
}
