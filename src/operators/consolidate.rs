//! Consolidates a stream: merges all changes at one version into a single
//! batch with cancelling entries removed, emitted only once that version is
//! closed (no longer at or above the input frontier).

use std::collections::HashMap;
use std::hash::Hash;

use crate::antichain::Antichain;
use crate::edge::{Edge, Message, Reader};
use crate::graph::Operator;
use crate::multiset::MultiSet;
use crate::order::Version;

pub struct Consolidate<A> {
    input: Reader<A>,
    output: Edge<A>,
    pending: HashMap<Version, MultiSet<A>>,
}

impl<A> Consolidate<A>
where
    A: Eq + Hash + Clone,
{
    pub fn new(input: Reader<A>, output: Edge<A>) -> Self {
        Consolidate { input, output, pending: HashMap::new() }
    }

    fn close_versions(&mut self, frontier: &Antichain) {
        let closed: Vec<Version> = self
            .pending
            .keys()
            .filter(|v| !frontier.less_equal_version(v))
            .cloned()
            .collect();
        for version in closed {
            let batch = self.pending.remove(&version).expect("just listed as a key");
            let consolidated = batch.consolidate();
            if !consolidated.is_empty() {
                self.output.send_data(version, consolidated);
            }
        }
    }
}

impl<A> Operator for Consolidate<A>
where
    A: Eq + Hash + Clone,
{
    fn run(&mut self) {
        for message in self.input.drain() {
            match message {
                Message::Data(version, changes) => {
                    self.pending
                        .entry(version)
                        .and_modify(|existing| *existing = existing.concat(&changes))
                        .or_insert(changes);
                }
                Message::Frontier(frontier) => {
                    self.close_versions(&frontier);
                    self.output.send_frontier(frontier);
                }
            }
        }
    }
}
