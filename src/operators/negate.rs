//! Negate the multiplicities of a stream's records.

use crate::edge::{Edge, Message, Reader};
use crate::graph::Operator;

/// Flips the sign of every multiplicity, changing nothing else.
pub struct Negate<A> {
    input: Reader<A>,
    output: Edge<A>,
}

impl<A> Negate<A>
where
    A: Clone,
{
    pub fn new(input: Reader<A>, output: Edge<A>) -> Self {
        Negate { input, output }
    }
}

impl<A> Operator for Negate<A>
where
    A: Clone,
{
    fn run(&mut self) {
        for message in self.input.drain() {
            match message {
                Message::Data(version, changes) => self.output.send_data(version, changes.negate()),
                Message::Frontier(frontier) => self.output.send_frontier(frontier),
            }
        }
    }
}
