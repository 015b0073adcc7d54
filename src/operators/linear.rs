//! Record-at-a-time operators: map, filter, and the `debug` tap.
//!
//! Borrows `timely`'s `Map`/`Filter` operator shape, stripped of the
//! capability/progress machinery: here the edge's own frontier propagation
//! takes that role, so the operator body is just "translate one message".

use crate::edge::{Edge, Message, Reader};
use crate::error::Error;
use crate::graph::Operator;
use crate::order::PartialOrder;

/// Applies a function to every record, keeping multiplicities.
pub struct Map<A, B, F> {
    input: Reader<A>,
    output: Edge<B>,
    func: F,
}

impl<A, B, F> Map<A, B, F>
where
    A: Clone,
    B: Clone,
    F: Fn(&A) -> B,
{
    pub fn new(input: Reader<A>, output: Edge<B>, func: F) -> Self {
        Map { input, output, func }
    }
}

impl<A, B, F> Operator for Map<A, B, F>
where
    A: Clone,
    B: Clone,
    F: Fn(&A) -> B,
{
    fn run(&mut self) {
        for message in self.input.drain() {
            match message {
                Message::Data(version, changes) => {
                    self.output.send_data(version, changes.map(&self.func));
                }
                Message::Frontier(frontier) => self.output.send_frontier(frontier),
            }
        }
    }
}

/// Keeps only records satisfying a predicate.
pub struct Filter<A, F> {
    input: Reader<A>,
    output: Edge<A>,
    predicate: F,
}

impl<A, F> Filter<A, F>
where
    A: Clone,
    F: Fn(&A) -> bool,
{
    pub fn new(input: Reader<A>, output: Edge<A>, predicate: F) -> Self {
        Filter { input, output, predicate }
    }
}

impl<A, F> Operator for Filter<A, F>
where
    A: Clone,
    F: Fn(&A) -> bool,
{
    fn run(&mut self) {
        for message in self.input.drain() {
            match message {
                Message::Data(version, changes) => {
                    self.output.send_data(version, changes.filter(&self.predicate));
                }
                Message::Frontier(frontier) => self.output.send_frontier(frontier),
            }
        }
    }
}

/// Binary fan-in: forwards both inputs' data untouched, and the meet of their frontiers.
pub struct Concat<A> {
    left: Reader<A>,
    right: Reader<A>,
    output: Edge<A>,
    left_frontier: crate::antichain::Antichain,
    right_frontier: crate::antichain::Antichain,
    left_seen: bool,
    right_seen: bool,
    output_frontier: Option<crate::antichain::Antichain>,
}

impl<A> Concat<A>
where
    A: Clone,
{
    pub fn new(left: Reader<A>, right: Reader<A>, output: Edge<A>) -> Self {
        Concat {
            left,
            right,
            output,
            left_frontier: crate::antichain::Antichain::new(),
            right_frontier: crate::antichain::Antichain::new(),
            left_seen: false,
            right_seen: false,
            output_frontier: None,
        }
    }

    /// Withholds any frontier downstream until both inputs have announced at
    /// least one of their own: an input that hasn't spoken yet carries no
    /// information, not a promise that nothing more is coming.
    fn emit_frontier(&mut self) {
        if self.left_seen && self.right_seen {
            let frontier = self.left_frontier.meet(&self.right_frontier);
            assert!(
                self.output_frontier.as_ref().is_none_or(|prev| prev.less_equal(&frontier)),
                "{}",
                Error::InvalidFrontierState { operator: "concat".to_string() }
            );
            self.output_frontier = Some(frontier.clone());
            self.output.send_frontier(frontier);
        }
    }
}

impl<A> Operator for Concat<A>
where
    A: Clone,
{
    fn run(&mut self) {
        for message in self.left.drain() {
            match message {
                Message::Data(version, changes) => self.output.send_data(version, changes),
                Message::Frontier(frontier) => {
                    self.left_frontier = frontier;
                    self.left_seen = true;
                    self.emit_frontier();
                }
            }
        }
        for message in self.right.drain() {
            match message {
                Message::Data(version, changes) => self.output.send_data(version, changes),
                Message::Frontier(frontier) => {
                    self.right_frontier = frontier;
                    self.right_seen = true;
                    self.emit_frontier();
                }
            }
        }
    }
}

/// Taps a stream for side-effecting inspection (logging), passing data
/// through unchanged.
///
/// `collection_id` is a graph-local id (allocated by
/// [`crate::graph::Stream::debug`] unless the caller pins one) used only to
/// correlate lines from the same tap in a log; `indent` is a purely cosmetic
/// padding for taps nested inside an `iterate` body.
pub struct Debug<A> {
    input: Reader<A>,
    output: Edge<A>,
    name: String,
    indent: Option<usize>,
    collection_id: usize,
}

impl<A> Debug<A>
where
    A: Clone + std::fmt::Debug,
{
    pub fn new(input: Reader<A>, output: Edge<A>, name: String, indent: Option<usize>, collection_id: usize) -> Self {
        Debug { input, output, name, indent, collection_id }
    }
}

impl<A> Operator for Debug<A>
where
    A: Clone + std::fmt::Debug,
{
    fn run(&mut self) {
        for message in self.input.drain() {
            match message {
                Message::Data(version, changes) => {
                    if let Some((sample, _)) = changes.entries().first() {
                        crate::logging::log_batch(
                            &self.name,
                            self.collection_id,
                            self.indent,
                            &version,
                            changes.entries().len(),
                            sample,
                        );
                    }
                    self.output.send_data(version, changes);
                }
                Message::Frontier(frontier) => {
                    crate::logging::log_frontier(&self.name, self.collection_id, self.indent, &frontier);
                    self.output.send_frontier(frontier);
                }
            }
        }
    }
}
