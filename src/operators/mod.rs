//! Operator implementations.
//!
//! Every operator is a small state machine implementing [`crate::graph::Operator`],
//! driven by the scheduler's `run()` calls. Stateless operators (map, filter,
//! negate, concat) simply translate each drained message; stateful ones
//! (join, reduce, iterate) accumulate an [`crate::trace::Index`] per input.

pub mod linear;
pub mod negate;
pub mod consolidate;
pub mod join;
pub mod reduce;
pub mod distinct;
pub mod iterate;
