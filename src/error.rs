//! Error taxonomy for the dataflow engine.
//!
//! Most variants here describe programmer errors in the graph wiring or in
//! operator implementations: a version built from mismatched dimensions, a
//! frontier sent out of order, data sent below the current frontier. These
//! are raised as panics (`assert!`/`panic!`) at the point of violation,
//! the same way `differential_dataflow`'s own `consolidation.rs` and
//! `operators/*.rs` assert their invariants rather than propagate a
//! `Result`. The type exists so
//! that panic messages are uniform and so the two boundary-contract variants
//! (`HistoricalVersionCompacted`, `AlreadyFinalized`) can share a `Display`
//! impl with their panicking siblings while actually being returned to the
//! caller as `Result<_, Error>`.

/// The error taxonomy of the engine.
///
/// See the module documentation for which variants panic versus which are
/// returned from a fallible API.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Two versions (or antichain elements) of different dimension were compared or combined.
    #[error("dimension mismatch: expected dimension {expected}, found {found}")]
    DimensionMismatch {
        /// Dimension of the left-hand operand.
        expected: usize,
        /// Dimension of the right-hand operand.
        found: usize,
    },
    /// A version was constructed from a negative coordinate, or a step was non-positive.
    #[error("invalid version: {reason}")]
    InvalidVersion {
        /// Human-readable description of the violation.
        reason: String,
    },
    /// A frontier message did not advance the previously sent frontier.
    #[error("non-monotonic frontier advance on edge {edge}")]
    NonMonotonicFrontier {
        /// Identifies the edge on which the violation occurred.
        edge: usize,
    },
    /// An operator's computed output frontier would regress.
    #[error("operator {operator} attempted to retreat its output frontier")]
    InvalidFrontierState {
        /// Name of the offending operator.
        operator: String,
    },
    /// `compact` was called with a frontier that does not dominate the installed one.
    #[error("compaction frontier regressed on arrangement {arrangement}")]
    InvalidCompactionFrontier {
        /// Name/identifier of the arrangement.
        arrangement: String,
    },
    /// A reducer produced a negative multiplicity where the operator disallows it.
    #[error("reducer produced a negative multiplicity, which is not allowed here")]
    NegativeMultiplicityNotAllowed,
    /// Two streams constructed under different graphs were combined.
    #[error("attempted to combine streams from two different graphs")]
    CrossGraph,
    /// A read was requested for a version already advanced past by compaction.
    #[error("requested version has already been compacted away")]
    HistoricalVersionCompacted,
    /// `finalize` was called more than once on the same builder.
    #[error("graph builder has already been finalized")]
    AlreadyFinalized,
}

/// Convenience alias for fallible boundary-contract operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn dimension_mismatch(expected: usize, found: usize) -> Self {
        Error::DimensionMismatch { expected, found }
    }
}
