//! The graph builder, the scheduler, and the `Stream` handle that carries
//! the engine's combinator methods.
//!
//! Grounded on timely's `Scope`/`Worker` split: a builder accumulates
//! operators while the dataflow is being assembled, then `finalize()`s into
//! an immutable, steppable `Graph` — the single-threaded analogue of
//! `worker.step()` driving installed operators to fixed point.

use std::cell::RefCell;
use std::hash::Hash;
use std::rc::Rc;

use crate::antichain::Antichain;
use crate::config::GraphConfig;
use crate::edge::{Edge, Message, Reader};
use crate::error::Error;
use crate::multiset::MultiSet;
use crate::operators::{consolidate, distinct, iterate, join, linear, negate, reduce};
use crate::order::Version;

/// Anything the scheduler can drive one step forward.
///
/// Implementors drain their input reader(s), do their work, and write to
/// their output edge(s). A `run()` call should fully drain whatever is
/// currently queued; the scheduler does not call `run()` again until more
/// messages have arrived.
pub trait Operator {
    /// Processes every message currently queued on this operator's inputs.
    fn run(&mut self);
}

struct GraphInner {
    config: GraphConfig,
    operators: Vec<Box<dyn Operator>>,
    finalized: bool,
    scope_depth: usize,
    next_collection_id: usize,
}

/// Accumulates operators while a dataflow is being assembled.
///
/// Cloning a `GraphBuilder` shares the same underlying graph: every clone's
/// `new_input`/`finalize` calls act on the same operator list.
#[derive(Clone)]
pub struct GraphBuilder {
    inner: Rc<RefCell<GraphInner>>,
}

impl GraphBuilder {
    /// Starts a new, empty builder with the given configuration.
    pub fn new(config: GraphConfig) -> Self {
        log::debug!("graph builder created with config {config:?}");
        GraphBuilder {
            inner: Rc::new(RefCell::new(GraphInner {
                config,
                operators: Vec::new(),
                finalized: false,
                scope_depth: 0,
                next_collection_id: 0,
            })),
        }
    }

    /// Creates an externally-driven input. The returned [`InputHandle`] is
    /// the only way to push data and advance the frontier on this stream;
    /// the returned [`Stream`] is its read side.
    pub fn new_input<T>(&self) -> (InputHandle<T>, Stream<T>)
    where
        T: Clone + 'static,
    {
        let edge = Edge::new();
        let root_dimension = self.inner.borrow().config.root_dimension;
        let handle = InputHandle { edge: edge.clone(), root_dimension };
        let stream = Stream { graph: Rc::clone(&self.inner), edge };
        (handle, stream)
    }

    /// Opens a nested scope for the duration of the returned guard, mirroring
    /// the engine's `startScope`/`endScope` pairing with RAII: the scope
    /// closes (depth decrements) when the guard is dropped, including on an
    /// early return or panic while assembling the nested dataflow.
    pub fn scope(&self) -> ScopeGuard {
        self.inner.borrow_mut().scope_depth += 1;
        ScopeGuard { inner: Rc::clone(&self.inner) }
    }

    /// Finalizes the builder into a steppable [`Graph`].
    ///
    /// Fails with [`Error::AlreadyFinalized`] if this builder (or a clone of
    /// it) has already been finalized.
    pub fn finalize(&self) -> Result<Graph, Error> {
        let mut inner = self.inner.borrow_mut();
        if inner.finalized {
            return Err(Error::AlreadyFinalized);
        }
        inner.finalized = true;
        log::info!("graph finalized with {} operators", inner.operators.len());
        Ok(Graph { operators: std::mem::take(&mut inner.operators) })
    }
}

/// RAII handle for a nested scope opened by [`GraphBuilder::scope`].
pub struct ScopeGuard {
    inner: Rc<RefCell<GraphInner>>,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        self.inner.borrow_mut().scope_depth -= 1;
    }
}

/// A finalized, steppable dataflow.
pub struct Graph {
    operators: Vec<Box<dyn Operator>>,
}

impl Graph {
    /// Runs every installed operator once, in registration order.
    ///
    /// Operators with nothing queued are no-ops; driving a computation to a
    /// fixed point is a matter of calling `step()` until the caller observes
    /// no further output (e.g. via an [`OutputHandle`]'s drained frontier).
    pub fn step(&mut self) {
        for operator in &mut self.operators {
            operator.run();
        }
    }

    /// The number of operators in this graph.
    pub fn operator_count(&self) -> usize {
        self.operators.len()
    }
}

/// The write side of an externally-driven input.
pub struct InputHandle<T> {
    edge: Edge<T>,
    root_dimension: usize,
}

impl<T: Clone> InputHandle<T> {
    /// Sends a batch of changes at `version`.
    ///
    /// Panics (`DimensionMismatch`) if `version`'s dimension does not match
    /// the graph's configured root dimension: an input built from the wrong
    /// number of coordinates would otherwise only surface as a confusing
    /// dimension mismatch several operators downstream.
    pub fn send(&self, version: Version, changes: MultiSet<T>) {
        assert!(
            version.dimension() == self.root_dimension,
            "{}",
            Error::dimension_mismatch(self.root_dimension, version.dimension())
        );
        self.edge.send_data(version, changes);
    }
    /// Advances this input's frontier.
    pub fn advance_to(&self, frontier: Antichain) {
        self.edge.send_frontier(frontier);
    }
}

/// The read side of a dataflow edge, and the home of every combinator.
///
/// Cheap to clone: cloning shares the same underlying edge, so the same
/// logical stream can feed more than one downstream operator.
pub struct Stream<T> {
    graph: Rc<RefCell<GraphInner>>,
    edge: Edge<T>,
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Stream { graph: Rc::clone(&self.graph), edge: self.edge.clone() }
    }
}

impl<T> Stream<T> {
    fn push_operator(&self, operator: impl Operator + 'static) {
        self.graph.borrow_mut().operators.push(Box::new(operator));
    }

    fn derive<U>(&self, edge: Edge<U>) -> Stream<U> {
        Stream { graph: Rc::clone(&self.graph), edge }
    }

    /// Allocates the next graph-local collection id, used by `debug` taps to
    /// correlate log lines without a global operator counter.
    fn allocate_collection_id(&self) -> usize {
        let mut inner = self.graph.borrow_mut();
        let id = inner.next_collection_id;
        inner.next_collection_id += 1;
        id
    }

    fn assert_same_graph<U>(&self, other: &Stream<U>) {
        assert!(Rc::ptr_eq(&self.graph, &other.graph), "{}", Error::CrossGraph);
    }

    /// Attaches an [`OutputHandle`] to drain this stream's data and frontier
    /// from outside the graph.
    pub fn output(&self) -> OutputHandle<T> {
        OutputHandle { reader: self.edge.new_reader() }
    }
}

impl<T: Clone + 'static> Stream<T> {
    /// Applies `f` to every record, keeping multiplicities.
    pub fn map<U: Clone + 'static>(&self, f: impl Fn(&T) -> U + 'static) -> Stream<U> {
        let output = Edge::new();
        self.push_operator(linear::Map::new(self.edge.new_reader(), output.clone(), f));
        self.derive(output)
    }

    /// Keeps only records satisfying `predicate`.
    pub fn filter(&self, predicate: impl Fn(&T) -> bool + 'static) -> Stream<T> {
        let output = Edge::new();
        self.push_operator(linear::Filter::new(self.edge.new_reader(), output.clone(), predicate));
        self.derive(output)
    }

    /// Flips the sign of every multiplicity.
    pub fn negate(&self) -> Stream<T> {
        let output = Edge::new();
        self.push_operator(negate::Negate::new(self.edge.new_reader(), output.clone()));
        self.derive(output)
    }

    /// Forms the formal sum of `self` and `other`.
    ///
    /// Panics (`CrossGraph`) if the two streams were built under different
    /// [`GraphBuilder`]s.
    pub fn concat(&self, other: &Stream<T>) -> Stream<T> {
        self.assert_same_graph(other);
        let output = Edge::new();
        self.push_operator(linear::Concat::new(self.edge.new_reader(), other.edge.new_reader(), output.clone()));
        self.derive(output)
    }

    /// Taps the stream for inspection, passing data through unchanged.
    ///
    /// `indent` is purely cosmetic, for readability when the tap sits inside
    /// a nested `iterate` body; the collection id used to correlate this
    /// tap's log lines is allocated automatically. Use
    /// [`Stream::debug_with`] to pin a specific id instead.
    pub fn debug(&self, name: &str) -> Stream<T>
    where
        T: std::fmt::Debug,
    {
        self.debug_with(name, None, None)
    }

    /// Like [`Stream::debug`], but lets the caller pin `indent` and
    /// `collection_id` instead of taking the defaults.
    pub fn debug_with(&self, name: &str, indent: Option<usize>, collection_id: Option<usize>) -> Stream<T>
    where
        T: std::fmt::Debug,
    {
        let output = Edge::new();
        let collection_id = collection_id.unwrap_or_else(|| self.allocate_collection_id());
        self.push_operator(linear::Debug::new(
            self.edge.new_reader(),
            output.clone(),
            name.to_string(),
            indent,
            collection_id,
        ));
        self.derive(output)
    }

    /// Closes a feedback loop: `body` is built against the loop variable and
    /// must return the stream whose values feed back into it.
    ///
    /// Mirrors `differential_dataflow`'s `Variable`: the feedback edge is
    /// created before `body` runs (so the loop variable already exists when
    /// the body is built) and wired to the real producer only after the
    /// body returns.
    pub fn iterate(&self, body: impl FnOnce(&Stream<T>) -> Stream<T>) -> Stream<T>
    where
        T: Eq + Hash,
    {
        let ingress_edge = Edge::new();
        self.push_operator(iterate::Ingress::new(self.edge.new_reader(), ingress_edge.clone()));

        let feedback_edge: Edge<T> = Edge::new();
        let var_edge = Edge::new();
        let converged = std::rc::Rc::new(std::cell::Cell::new(false));
        self.push_operator(iterate::Var::new(
            ingress_edge.new_reader(),
            feedback_edge.new_reader(),
            var_edge.clone(),
            converged.clone(),
        ));
        let var_stream = self.derive(var_edge);

        let body_result = body(&var_stream);
        self.assert_same_graph(&body_result);

        let (debounce, max_depth) = {
            let inner = self.graph.borrow();
            (inner.config.iteration_empty_debounce, inner.config.max_iteration_depth)
        };
        self.push_operator(iterate::Feedback::new(
            body_result.edge.new_reader(),
            feedback_edge,
            1,
            debounce,
            max_depth,
            converged,
        ));

        let egress_edge = Edge::new();
        self.push_operator(iterate::Egress::new(body_result.edge.new_reader(), egress_edge.clone()));
        self.derive(egress_edge)
    }
}

impl<T: Eq + Hash + Clone + 'static> Stream<T> {
    /// Groups all changes at one version into a single batch, cancelling
    /// entries out; emitted only once that version is closed.
    pub fn consolidate(&self) -> Stream<T> {
        let output = Edge::new();
        self.push_operator(consolidate::Consolidate::new(self.edge.new_reader(), output.clone()));
        self.derive(output)
    }
}

impl<K: Eq + Hash + Clone + 'static, V: Clone + 'static> Stream<(K, V)> {
    /// Incrementally matches records of `self` and `other` sharing a key.
    ///
    /// Panics (`CrossGraph`) if the two streams were built under different
    /// [`GraphBuilder`]s.
    pub fn join<V2>(&self, other: &Stream<(K, V2)>) -> Stream<(K, (V, V2))>
    where
        V: Eq + Hash,
        V2: Eq + Hash + Clone + 'static,
    {
        self.assert_same_graph(other);
        let output = Edge::new();
        self.push_operator(join::Join::new(self.edge.new_reader(), other.edge.new_reader(), output.clone()));
        self.derive(output)
    }

    /// Incrementally reduces each key's group of values via `reducer`.
    pub fn reduce<O: Eq + Hash + Clone + 'static>(
        &self,
        reducer: impl Fn(&K, &[(V, i64)]) -> Vec<(O, i64)> + 'static,
    ) -> Stream<(K, O)>
    where
        V: Eq + Hash,
    {
        let output = Edge::new();
        self.push_operator(reduce::Reduce::new(self.edge.new_reader(), output.clone(), reducer));
        self.derive(output)
    }

    /// The per-key count of values (with multiplicity), specialized from `reduce`.
    pub fn count(&self) -> Stream<(K, i64)>
    where
        V: Eq + Hash,
    {
        self.reduce(|_key, group| {
            let total: i64 = group.iter().map(|(_, m)| m).sum();
            vec![(total, 1)]
        })
    }

    /// The distinct values present under each key, specialized from `reduce`.
    pub fn distinct(&self) -> Stream<(K, V)>
    where
        V: Eq + Hash,
    {
        let rekeyed: Stream<((K, V), ())> = self.map(|(k, v)| ((k.clone(), v.clone()), ()));
        let reduced: Stream<((K, V), ())> = rekeyed.reduce(distinct::presence_reducer);
        reduced.map(|((k, v), ())| (k.clone(), v.clone()))
    }
}

/// The read side of an output stream, exposed to callers outside the graph.
pub struct OutputHandle<T> {
    reader: Reader<T>,
}

impl<T: Clone> OutputHandle<T> {
    /// Drains every data batch currently queued, discarding frontier messages.
    pub fn drain(&self) -> Vec<(Version, MultiSet<T>)> {
        self.reader
            .drain()
            .into_iter()
            .filter_map(|message| match message {
                Message::Data(version, changes) => Some((version, changes)),
                Message::Frontier(_) => None,
            })
            .collect()
    }

    /// True iff the writer has not yet promised to send no more data at or
    /// below `frontier`.
    pub fn probe_frontier_less_than(&self, frontier: &Antichain) -> bool {
        self.reader.probe_frontier_less_than(frontier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_input_accepts_versions_matching_root_dimension() {
        let builder = GraphBuilder::new(GraphConfig::new().with_root_dimension(2));
        let (input, _stream) = builder.new_input::<i32>();
        input.send(Version::new(vec![0, 0]), MultiSet::singleton(1, 1));
    }

    #[test]
    #[should_panic(expected = "dimension mismatch")]
    fn new_input_rejects_versions_off_the_root_dimension() {
        let builder = GraphBuilder::new(GraphConfig::new().with_root_dimension(2));
        let (input, _stream) = builder.new_input::<i32>();
        input.send(Version::new(vec![0]), MultiSet::singleton(1, 1));
    }
}
