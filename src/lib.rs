//! An incremental, change-propagating dataflow engine.
//!
//! Values flow through the graph as signed-multiplicity changes ("a change
//! of `-1` retracts a prior output, `+1` asserts a new one") tagged with a
//! [`Version`](order::Version) from a partial order: a computation is
//! correct if, for every version, accumulating all changes at or before it
//! reproduces running the computation from scratch on the input as of that
//! version. This lets one program both "what does the output look like
//! right now" and "what did the output look like as of an earlier input
//! state" without re-deriving either from the other.
//!
//! Start with [`GraphBuilder`](graph::GraphBuilder) to assemble a dataflow
//! (`new_input`, then the [`Stream`](graph::Stream) combinators: `map`,
//! `filter`, `negate`, `concat`, `consolidate`, `join`, `reduce`, `count`,
//! `distinct`, `iterate`), [`finalize`](graph::GraphBuilder::finalize) it
//! into a [`Graph`](graph::Graph), then drive it with repeated
//! [`Graph::step`](graph::Graph::step) calls while feeding input through the
//! returned [`InputHandle`](graph::InputHandle)s and reading output through
//! [`OutputHandle`](graph::OutputHandle)s.

pub mod antichain;
pub mod config;
pub mod edge;
pub mod error;
pub mod graph;
pub mod logging;
pub mod multiset;
pub mod operators;
pub mod order;
pub mod trace;

pub use antichain::Antichain;
pub use config::GraphConfig;
pub use error::{Error, Result};
pub use graph::{Graph, GraphBuilder, InputHandle, OutputHandle, Stream};
pub use multiset::MultiSet;
pub use order::{PartialOrder, Version};
