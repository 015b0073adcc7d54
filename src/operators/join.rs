//! Match pairs of records by key, incrementally.
//!
//! Borrows `JoinArranged`'s delta-join strategy: each side's incoming batch
//! is joined against the *other* side's accumulated trace, and only then
//! folded into this side's own trace, so neither direction double-counts a
//! batch that lands on both inputs at the same version.

use std::hash::Hash;

use crate::antichain::Antichain;
use crate::edge::{Edge, Message, Reader};
use crate::error::Error;
use crate::graph::Operator;
use crate::order::PartialOrder;
use crate::trace::Index;

pub struct Join<K, V1, V2> {
    left: Reader<(K, V1)>,
    right: Reader<(K, V2)>,
    output: Edge<(K, (V1, V2))>,
    trace_a: Index<K, V1>,
    trace_b: Index<K, V2>,
    left_frontier: Antichain,
    right_frontier: Antichain,
    output_frontier: Option<Antichain>,
}

impl<K, V1, V2> Join<K, V1, V2>
where
    K: Eq + Hash + Clone,
    V1: Eq + Hash + Clone,
    V2: Eq + Hash + Clone,
{
    pub fn new(left: Reader<(K, V1)>, right: Reader<(K, V2)>, output: Edge<(K, (V1, V2))>) -> Self {
        Join {
            left,
            right,
            output,
            trace_a: Index::new(),
            trace_b: Index::new(),
            left_frontier: Antichain::new(),
            right_frontier: Antichain::new(),
            output_frontier: None,
        }
    }

    fn emit_frontier(&mut self) {
        let frontier = self.left_frontier.meet(&self.right_frontier);
        assert!(
            self.output_frontier.as_ref().is_none_or(|prev| prev.less_equal(&frontier)),
            "{}",
            Error::InvalidFrontierState { operator: "join".to_string() }
        );
        self.output_frontier = Some(frontier.clone());
        self.trace_a.compact(&frontier, "join.trace_a");
        self.trace_b.compact(&frontier, "join.trace_b");
        self.output.send_frontier(frontier);
    }
}

impl<K, V1, V2> Operator for Join<K, V1, V2>
where
    K: Eq + Hash + Clone,
    V1: Eq + Hash + Clone,
    V2: Eq + Hash + Clone,
{
    fn run(&mut self) {
        for message in self.left.drain() {
            match message {
                Message::Data(version, changes) => {
                    let mut delta: Index<K, V1> = Index::new();
                    for (record, mult) in changes.entries() {
                        let (key, value) = record.clone();
                        delta.add_value(key, version.clone(), (value, *mult));
                    }
                    let results = delta.join(&self.trace_b);
                    self.trace_a.append(&delta);
                    for (out_version, batch) in results {
                        self.output.send_data(out_version, batch);
                    }
                }
                Message::Frontier(frontier) => {
                    self.left_frontier = frontier;
                    self.emit_frontier();
                }
            }
        }
        for message in self.right.drain() {
            match message {
                Message::Data(version, changes) => {
                    let mut delta: Index<K, V2> = Index::new();
                    for (record, mult) in changes.entries() {
                        let (key, value) = record.clone();
                        delta.add_value(key, version.clone(), (value, *mult));
                    }
                    let results = self.trace_a.join(&delta);
                    self.trace_b.append(&delta);
                    for (out_version, batch) in results {
                        self.output.send_data(out_version, batch);
                    }
                }
                Message::Frontier(frontier) => {
                    self.right_frontier = frontier;
                    self.emit_frontier();
                }
            }
        }
    }
}
