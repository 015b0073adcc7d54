//! Graph-level tunables.
//!
//! Per the Design Notes (spec §9): the iteration-termination debounce count
//! is a calibrated constant, not a correctness parameter, and should be a
//! configuration knob rather than a number buried in the feedback operator.

/// Tunables threaded through a [`crate::graph::GraphBuilder`].
#[derive(Clone, Debug)]
pub struct GraphConfig {
    /// Dimension of the root scope's versions: `1` for a single logical
    /// clock, `2` if the caller wants an extra outer coordinate before any
    /// `iterate` adds its own.
    pub root_dimension: usize,
    /// Number of consecutive empty frontier observations the feedback
    /// operator tolerates before concluding an outer version's iteration
    /// has converged. Smaller values risk premature termination when
    /// frontiers tick between batches; the calibrated default is `3`.
    pub iteration_empty_debounce: usize,
    /// Optional hard cap on inner-iteration depth, as a defensive guard
    /// against runaway loop bodies. `None` means unbounded (the default;
    /// termination is governed by the empty-notification debounce alone).
    pub max_iteration_depth: Option<u64>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        GraphConfig {
            root_dimension: 1,
            iteration_empty_debounce: 3,
            max_iteration_depth: None,
        }
    }
}

impl GraphConfig {
    /// Starts from the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the root scope's dimension.
    pub fn with_root_dimension(mut self, dimension: usize) -> Self {
        self.root_dimension = dimension;
        self
    }

    /// Sets the empty-notification debounce count.
    pub fn with_iteration_empty_debounce(mut self, count: usize) -> Self {
        self.iteration_empty_debounce = count;
        self
    }

    /// Sets a hard cap on inner-iteration depth.
    pub fn with_max_iteration_depth(mut self, depth: u64) -> Self {
        self.max_iteration_depth = Some(depth);
        self
    }
}
