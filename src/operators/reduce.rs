//! Generic key-grouped incremental reduction.
//!
//! Borrows `ReduceCore`'s shape: a trace of the group's raw input, a trace
//! of what has already been emitted for that group, and a to-do list of
//! `(key, version)` pairs whose output needs recomputing once that version
//! is no longer in the input frontier. Simplified from a batch-oriented
//! cursor walk to a per-key `HashMap` since there is no multi-worker
//! exchange or persistent batch structure here.

use std::collections::HashSet;
use std::hash::Hash;

use crate::antichain::Antichain;
use crate::edge::{Edge, Message, Reader};
use crate::error::Error;
use crate::graph::Operator;
use crate::multiset::MultiSet;
use crate::order::{PartialOrder, Version};
use crate::trace::Index;

/// `reducer(key, &group)` receives the full, consolidated contents of one
/// key's group as of the version being closed and returns the group's new
/// output as `(value, multiplicity)` pairs. Almost always a multiplicity-1
/// singleton, but left general for operators like `count` that legitimately
/// produce more than one record.
pub struct Reduce<K, V, O, F> {
    input: Reader<(K, V)>,
    output: Edge<(K, O)>,
    trace: Index<K, V>,
    output_trace: Index<K, O>,
    todo: HashSet<(K, Version)>,
    input_frontier: Antichain,
    output_frontier: Option<Antichain>,
    reducer: F,
}

impl<K, V, O, F> Reduce<K, V, O, F>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
    O: Eq + Hash + Clone,
    F: Fn(&K, &[(V, i64)]) -> Vec<(O, i64)>,
{
    pub fn new(input: Reader<(K, V)>, output: Edge<(K, O)>, reducer: F) -> Self {
        Reduce {
            input,
            output,
            trace: Index::new(),
            output_trace: Index::new(),
            todo: HashSet::new(),
            input_frontier: Antichain::new(),
            output_frontier: None,
            reducer,
        }
    }

    /// Enrolls `key` at `version.join(v)` for every version already recorded
    /// for that key (including `version` itself), so a late-arriving update
    /// at an old version still triggers recomputation of everything it affects.
    fn enroll(&mut self, key: &K, version: &Version) {
        for other in self.trace.versions(key) {
            self.todo.insert((key.clone(), version.join(&other)));
        }
    }

    fn close(&mut self, key: K, version: Version) {
        let group = self
            .trace
            .reconstruct_at(&key, &version)
            .expect("todo only enrolls versions not yet past the input frontier that gated the last compaction")
            .consolidate();
        let new_output = MultiSet::from_entries((self.reducer)(&key, group.entries())).consolidate();
        let old_output = self
            .output_trace
            .reconstruct_at(&key, &version)
            .expect("output trace is only compacted to the same frontier that gates closing todo entries")
            .consolidate();
        let delta = new_output.concat(&old_output.negate()).consolidate();
        if delta.is_empty() {
            return;
        }
        for (value, mult) in delta.entries() {
            self.output_trace.add_value(key.clone(), version.clone(), (value.clone(), *mult));
        }
        let keyed: MultiSet<(K, O)> = delta
            .into_entries()
            .into_iter()
            .map(|(value, mult)| ((key.clone(), value), mult))
            .collect();
        self.output.send_data(version, keyed);
    }
}

impl<K, V, O, F> Operator for Reduce<K, V, O, F>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
    O: Eq + Hash + Clone,
    F: Fn(&K, &[(V, i64)]) -> Vec<(O, i64)>,
{
    fn run(&mut self) {
        for message in self.input.drain() {
            match message {
                Message::Data(version, changes) => {
                    let mut touched: Vec<K> = Vec::new();
                    for (record, mult) in changes.entries() {
                        let (key, value) = record.clone();
                        self.trace.add_value(key.clone(), version.clone(), (value, *mult));
                        if !touched.contains(&key) {
                            touched.push(key);
                        }
                    }
                    for key in touched {
                        self.enroll(&key, &version);
                    }
                }
                Message::Frontier(frontier) => {
                    self.input_frontier = frontier.clone();
                    let mut closed: Vec<(K, Version)> = self
                        .todo
                        .iter()
                        .filter(|(_, v)| !self.input_frontier.less_equal_version(v))
                        .cloned()
                        .collect();
                    // Lexicographic order on coordinates is a linear extension of the
                    // product partial order, so sorting this way guarantees that a
                    // key's earlier versions close (and update its output trace)
                    // before any later, dependent version does.
                    closed.sort_by(|a, b| a.1.coordinates().cmp(b.1.coordinates()));
                    for (key, version) in closed {
                        self.todo.remove(&(key.clone(), version.clone()));
                        self.close(key, version);
                    }
                    assert!(
                        self.output_frontier.as_ref().is_none_or(|prev| prev.less_equal(&self.input_frontier)),
                        "{}",
                        Error::InvalidFrontierState { operator: "reduce".to_string() }
                    );
                    self.output_frontier = Some(self.input_frontier.clone());
                    self.trace.compact(&self.input_frontier, "reduce.trace");
                    self.output_trace.compact(&self.input_frontier, "reduce.output_trace");
                    self.output.send_frontier(frontier);
                }
            }
        }
    }
}
