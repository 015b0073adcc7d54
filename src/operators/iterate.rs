//! Iterative application of a dataflow fragment: `ingress` enters a nested
//! scope by extending the version's dimension, `Var` is the loop variable
//! (ingress concatenated with feedback), and `egress` leaves the scope by
//! truncating it back off. Borrows `differential_dataflow::operators::iterate::Variable`'s
//! two-step construction: create the feedback handle before the loop body
//! runs, build the body against it, then `set()` the real producer
//! afterward — here, construct the raw feedback edge first, build the body
//! against the `Var` that reads from it, then attach the `Feedback` operator
//! once the body's result stream exists.

use std::cell::Cell;
use std::rc::Rc;

use crate::antichain::Antichain;
use crate::edge::{Edge, Message, Reader};
use crate::error::Error;
use crate::graph::Operator;
use crate::order::Version;

/// Enters a nested iteration scope by extending every version and frontier
/// by one dimension.
///
/// Data is sent twice: once at round 0, and again retracted at round 1. A
/// loop body is meant to see its external input exactly once, at the round
/// it enters the scope, not on every round after; without the retraction
/// the input would keep contributing to every round's reconstruction
/// forever, since its version would remain `<=` every later round.
pub struct Ingress<T> {
    input: Reader<T>,
    output: Edge<T>,
}

impl<T: Clone> Ingress<T> {
    pub fn new(input: Reader<T>, output: Edge<T>) -> Self {
        Ingress { input, output }
    }
}

impl<T: Clone> Operator for Ingress<T> {
    fn run(&mut self) {
        for message in self.input.drain() {
            match message {
                Message::Data(version, changes) => {
                    let entered = version.extend();
                    self.output.send_data(entered.clone(), changes.clone());
                    self.output.send_data(entered.apply_step(1), changes.negate());
                }
                Message::Frontier(frontier) => self.output.send_frontier(frontier.extend_dimension()),
            }
        }
    }
}

/// Leaves a nested iteration scope by truncating the innermost dimension off
/// every version and frontier.
pub struct Egress<T> {
    input: Reader<T>,
    output: Edge<T>,
}

impl<T: Clone> Egress<T> {
    pub fn new(input: Reader<T>, output: Edge<T>) -> Self {
        Egress { input, output }
    }
}

impl<T: Clone> Operator for Egress<T> {
    fn run(&mut self) {
        for message in self.input.drain() {
            match message {
                Message::Data(version, changes) => self.output.send_data(version.truncate(), changes),
                Message::Frontier(frontier) => self.output.send_frontier(frontier.truncate_dimension()),
            }
        }
    }
}

/// The loop variable: the formal sum of the scope's ingress and its own
/// feedback path.
///
/// Data from both sides is forwarded unconditionally, as `Concat` would. The
/// frontier, though, cannot be the simple meet `Concat` would compute:
/// `ingress`'s reported frontier describes when *external* input to the
/// scope stops, which says nothing about how many more rounds the loop body
/// still has left to run at the current epoch, and naively extending it
/// (appending a trailing `0`) would claim the opposite of what's true and
/// block the very rounds the loop hasn't produced yet. Instead this operator
/// runs its own per-round clock: every call the scope is active, it reports
/// a frontier one round further along than the last, which is enough for
/// operators downstream (`Consolidate`, `Reduce`) to close the *previous*
/// round without pretending to know the future. Only once [`Feedback`]
/// declares the loop converged does the reported frontier catch up to the
/// real external one, letting the scope's output finally close off.
pub struct Var<T> {
    ingress: Reader<T>,
    feedback: Reader<T>,
    output: Edge<T>,
    outer_frontier: Option<Antichain>,
    epoch: Option<Version>,
    round: u64,
    converged: Rc<Cell<bool>>,
}

impl<T: Clone> Var<T> {
    pub fn new(ingress: Reader<T>, feedback: Reader<T>, output: Edge<T>, converged: Rc<Cell<bool>>) -> Self {
        Var { ingress, feedback, output, outer_frontier: None, epoch: None, round: 0, converged }
    }
}

impl<T: Clone> Operator for Var<T> {
    fn run(&mut self) {
        for message in self.ingress.drain() {
            match message {
                Message::Data(version, changes) => {
                    if self.epoch.is_none() {
                        self.epoch = Some(version.truncate());
                    }
                    self.output.send_data(version, changes);
                }
                Message::Frontier(frontier) => self.outer_frontier = Some(frontier),
            }
        }
        for message in self.feedback.drain() {
            if let Message::Data(version, changes) = message {
                self.output.send_data(version, changes);
            }
        }

        let Some(outer_frontier) = &self.outer_frontier else { return };
        let mut floor = Antichain::new();
        if self.converged.get() {
            for element in outer_frontier.elements() {
                let mut coords = element.coordinates().to_vec();
                let last = coords.len() - 1;
                coords[last] = self.round;
                floor.insert(Version::new(coords));
            }
        } else if let Some(epoch) = &self.epoch {
            let mut coords = epoch.coordinates().to_vec();
            coords.push(self.round);
            floor.insert(Version::new(coords));
        } else {
            return;
        }
        self.round += 1;
        self.output.send_frontier(floor);
    }
}

/// Closes the loop: reads the iteration body's result and writes it back,
/// version stepped one round forward, into the raw feedback edge that
/// [`Var`] reads from.
///
/// Termination is a practical necessity this single-threaded engine has to
/// detect on its own rather than infer from a distributed pointstamp
/// algorithm: once a configurable number of consecutive rounds produce no
/// data at all, the loop is declared converged (recorded in the `converged`
/// flag shared with `Var`) and further data is no longer fed back.
pub struct Feedback<T> {
    input: Reader<T>,
    output: Edge<T>,
    step: u64,
    debounce: usize,
    empty_streak: usize,
    max_depth: Option<u64>,
    halted: bool,
    converged: Rc<Cell<bool>>,
}

impl<T> Feedback<T>
where
    T: Clone,
{
    pub fn new(
        input: Reader<T>,
        output: Edge<T>,
        step: u64,
        debounce: usize,
        max_depth: Option<u64>,
        converged: Rc<Cell<bool>>,
    ) -> Self {
        Feedback { input, output, step, debounce, empty_streak: 0, max_depth, halted: false, converged }
    }
}

impl<T> Operator for Feedback<T>
where
    T: Clone,
{
    fn run(&mut self) {
        if self.halted {
            return;
        }
        let mut saw_data = false;
        for message in self.input.drain() {
            if let Message::Data(version, changes) = message {
                saw_data = true;
                let stepped = version.apply_step(self.step);
                if let Some(max_depth) = self.max_depth {
                    let depth = *stepped.coordinates().last().expect("stepped version is non-empty");
                    assert!(depth <= max_depth, "{}", Error::InvalidVersion {
                        reason: format!("iteration depth {depth} exceeds configured maximum {max_depth}"),
                    });
                }
                self.output.send_data(stepped, changes);
            }
        }
        // A round that produced no data at all is the observable sign of
        // convergence. `debounce` consecutive empty rounds, rather than one,
        // absorb a round that looks empty only because messages hadn't
        // finished propagating through the loop body yet.
        if saw_data {
            self.empty_streak = 0;
        } else {
            self.empty_streak += 1;
            if self.empty_streak >= self.debounce {
                self.halted = true;
                self.converged.set(true);
            }
        }
    }
}
