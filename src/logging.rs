//! Ambient structured logging.
//!
//! The engine logs through the `log` facade rather than a bespoke event
//! stream: operators emit `trace!`/`debug!` on the traffic they see, and
//! [`GraphBuilder`](crate::graph::GraphBuilder) logs construction and
//! finalization at `debug`/`info`. Binaries and tests install a subscriber
//! (`env_logger::init()` is what this crate's own tests use); the library
//! itself never configures one.

use crate::antichain::Antichain;
use crate::order::Version;

/// Logs a data batch at `debug` level, tagged with an operator or stream name
/// and a graph-local `collection_id` for correlating lines across taps that
/// share a name. `indent` pads the line for readability when a `debug` tap
/// sits inside a nested scope.
///
/// Used by [`crate::graph::Stream::debug`] and available to custom
/// instrumentation that wants the same formatting.
pub fn log_batch<T: std::fmt::Debug>(
    name: &str,
    collection_id: usize,
    indent: Option<usize>,
    version: &Version,
    size: usize,
    sample: &T,
) {
    let pad = " ".repeat(indent.unwrap_or(0));
    log::debug!("{pad}[{collection_id}] {name} @ {version:?}: {size} record(s), e.g. {sample:?}");
}

/// Logs a frontier advance at `trace` level.
pub fn log_frontier(name: &str, collection_id: usize, indent: Option<usize>, frontier: &Antichain) {
    let pad = " ".repeat(indent.unwrap_or(0));
    log::trace!("{pad}[{collection_id}] {name} frontier -> {:?}", frontier.elements());
}
