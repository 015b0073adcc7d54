//! Edges: the single-writer, multi-reader queues that connect operators.
//!
//! Grounded on timely's progress-tracking channels: a writer emits interleaved
//! `Data`/`Frontier` messages and every reader sees the same sequence. Unlike
//! timely there is no cross-worker exchange here, so an edge is just a
//! `Rc<RefCell<..>>`-shared queue per reader, fed by one shared writer frontier.

use std::cell::RefCell;
use std::rc::Rc;

use crate::antichain::Antichain;
use crate::error::Error;
use crate::multiset::MultiSet;
use crate::order::{PartialOrder, Version};

/// One message on an edge: either a versioned batch of changes, or a frontier advance.
#[derive(Clone, Debug)]
pub enum Message<T> {
    /// A batch of changes at a specific version.
    Data(Version, MultiSet<T>),
    /// The writer will never again send data at or below this frontier.
    Frontier(Antichain),
}

struct ReaderQueue<T> {
    messages: std::collections::VecDeque<Message<T>>,
    known_frontier: Antichain,
}

impl<T> ReaderQueue<T> {
    fn new() -> Self {
        ReaderQueue {
            messages: std::collections::VecDeque::new(),
            known_frontier: Antichain::new(),
        }
    }
}

/// Shared state of one edge: the writer's current frontier and every reader's queue.
pub struct EdgeState<T> {
    writer_frontier: Antichain,
    frontier_set: bool,
    readers: Vec<ReaderQueue<T>>,
}

impl<T> EdgeState<T> {
    fn new() -> Self {
        EdgeState {
            writer_frontier: Antichain::new(),
            frontier_set: false,
            readers: Vec::new(),
        }
    }
}

/// The write end of an edge. Cloning an `Edge` does not duplicate the queue;
/// use [`Edge::new_reader`] to attach another consumer.
pub struct Edge<T> {
    state: Rc<RefCell<EdgeState<T>>>,
}

impl<T> Clone for Edge<T> {
    fn clone(&self) -> Self {
        Edge { state: Rc::clone(&self.state) }
    }
}

impl<T> Edge<T> {
    /// Creates a new edge with no readers yet attached.
    pub fn new() -> Self {
        Edge { state: Rc::new(RefCell::new(EdgeState::new())) }
    }

    /// Attaches a new reader to this edge and returns a handle to it.
    pub fn new_reader(&self) -> Reader<T> {
        let mut state = self.state.borrow_mut();
        let index = state.readers.len();
        state.readers.push(ReaderQueue::new());
        Reader { state: Rc::clone(&self.state), index }
    }

    /// Sends a batch of changes at `version`.
    ///
    /// Panics if `version` is not `>=` the edge's current writer frontier
    /// (data sent below the frontier the writer already promised to respect).
    pub fn send_data(&self, version: Version, changes: MultiSet<T>)
    where
        T: Clone,
    {
        let mut state = self.state.borrow_mut();
        assert!(
            !state.frontier_set || state.writer_frontier.less_equal_version(&version),
            "{}",
            Error::InvalidVersion { reason: format!("data sent at {version:?} is behind the writer frontier") }
        );
        for reader in &mut state.readers {
            reader.messages.push_back(Message::Data(version.clone(), changes.clone()));
        }
    }

    /// Advances the writer frontier and broadcasts it to every reader.
    ///
    /// Panics if `frontier` does not dominate the previously announced one
    /// (a non-monotonic frontier advance).
    pub fn send_frontier(&self, frontier: Antichain) {
        let mut state = self.state.borrow_mut();
        assert!(
            !state.frontier_set || state.writer_frontier.less_equal(&frontier),
            "{}",
            Error::NonMonotonicFrontier { edge: Rc::as_ptr(&self.state) as usize }
        );
        state.writer_frontier = frontier.clone();
        state.frontier_set = true;
        for reader in &mut state.readers {
            reader.messages.push_back(Message::Frontier(frontier.clone()));
        }
    }
}

impl<T> Default for Edge<T> {
    fn default() -> Self {
        Edge::new()
    }
}

/// The read end of an edge, attached via [`Edge::new_reader`].
pub struct Reader<T> {
    state: Rc<RefCell<EdgeState<T>>>,
    index: usize,
}

impl<T> Clone for Reader<T> {
    fn clone(&self) -> Self {
        Reader { state: Rc::clone(&self.state), index: self.index }
    }
}

impl<T> Reader<T> {
    /// Drains every message currently queued for this reader, in arrival order.
    pub fn drain(&self) -> Vec<Message<T>> {
        let mut state = self.state.borrow_mut();
        let reader = &mut state.readers[self.index];
        let drained: Vec<_> = reader.messages.drain(..).collect();
        for message in &drained {
            if let Message::Frontier(f) = message {
                reader.known_frontier = f.clone();
            }
        }
        drained
    }

    /// True iff the writer's frontier is strictly below `frontier` (i.e. the
    /// writer has not yet promised to never send data at or below `frontier`).
    pub fn probe_frontier_less_than(&self, frontier: &Antichain) -> bool {
        let state = self.state.borrow();
        !state.readers[self.index].known_frontier.less_equal(frontier)
    }

    /// True iff this reader's queue currently has no pending messages.
    pub fn is_empty(&self) -> bool {
        self.state.borrow().readers[self.index].messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multiset::MultiSet;

    fn v(coords: &[u64]) -> Version {
        Version::new(coords.to_vec())
    }

    #[test]
    fn send_data_before_any_frontier_is_announced_is_allowed() {
        let edge: Edge<i32> = Edge::new();
        let reader = edge.new_reader();
        edge.send_data(v(&[0, 0]), MultiSet::singleton(1, 1));
        assert_eq!(reader.drain().len(), 1);
    }

    #[test]
    #[should_panic]
    fn send_data_behind_an_announced_frontier_panics() {
        let edge: Edge<i32> = Edge::new();
        let mut frontier = Antichain::new();
        frontier.insert(v(&[2, 0]));
        edge.send_frontier(frontier);
        edge.send_data(v(&[1, 0]), MultiSet::singleton(1, 1));
    }
}
