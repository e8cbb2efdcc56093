//! Randomized stream drivers for tests.
//!
//! A [`Source`] offers queued items with random valid gaps and holds each item stable until it
//! transfers. A [`Sink`] accepts with random readiness. Together they check that a component
//! neither drops nor duplicates nor reorders elements under arbitrary backpressure.

use std::collections::VecDeque;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::*;

/// Producer side of a test stream.
#[derive(Debug)]
pub struct Source<V: Signal> {
    pending: VecDeque<V>,
    current: Option<V>,
    valid_probability: f64,
    rng: SmallRng,
}

impl<V: Signal + Default> Source<V> {
    /// Creates a source offering `items` in order.
    ///
    /// On each cycle without an item on offer, a new item is offered with probability
    /// `valid_probability`, which must lie in `[0, 1]`.
    pub fn new<I: IntoIterator<Item = V>>(items: I, valid_probability: f64, seed: u64) -> Self {
        Self {
            pending: items.into_iter().collect(),
            current: None,
            valid_probability,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Forward signals of this cycle. Call exactly once per cycle.
    pub fn fwd(&mut self) -> Valid<V> {
        if self.current.is_none() && !self.pending.is_empty() && self.rng.gen_bool(self.valid_probability) {
            self.current = self.pending.pop_front();
        }
        Valid::from(self.current.clone())
    }

    /// Clock edge: the offered item is consumed if the consumer was ready.
    pub fn clock(&mut self, bwd: &Ready) {
        if bwd.ready {
            self.current = None;
        }
    }

    /// Returns true once every item has transferred.
    pub fn is_done(&self) -> bool { self.current.is_none() && self.pending.is_empty() }
}

/// Consumer side of a test stream.
#[derive(Debug)]
pub struct Sink<V: Signal> {
    received: Vec<V>,
    ready_probability: f64,
    rng: SmallRng,
}

impl<V: Signal> Sink<V> {
    /// Creates a sink that is ready with probability `ready_probability` on each cycle.
    pub fn new(ready_probability: f64, seed: u64) -> Self {
        Self { received: Vec::new(), ready_probability, rng: SmallRng::seed_from_u64(seed) }
    }

    /// Backward signals of this cycle. Call exactly once per cycle.
    pub fn bwd(&mut self) -> Ready { Ready::new(self.rng.gen_bool(self.ready_probability)) }

    /// Clock edge: records the transferred item, if any.
    pub fn clock(&mut self, fwd: &Valid<V>, bwd: &Ready) {
        if let Some(value) = VrChannel::new(fwd.clone(), *bwd).transfer() {
            self.received.push(value.clone());
        }
    }

    /// Items received so far, in arrival order.
    pub fn received(&self) -> &[V] { &self.received }

    /// Takes the items received so far.
    pub fn take(&mut self) -> Vec<V> { std::mem::take(&mut self.received) }
}

/// Runs a single-stream module between `source` and `sink` until `expected` items have been
/// received or `max_cycles` ticks have elapsed. Returns the number of ticks evaluated.
pub fn run_stream<I, O, M>(
    sim: &mut Simulator<M>, source: &mut Source<I>, sink: &mut Sink<O>, expected: usize, max_cycles: u64,
) -> u64
where
    I: Signal + Default,
    O: Signal,
    M: Module<IngressFwd = Valid<I>, IngressBwd = Ready, EgressFwd = Valid<O>, EgressBwd = Ready>,
{
    let start = sim.cycle();
    while sink.received().len() < expected && sim.cycle() - start < max_cycles {
        let fwd = source.fwd();
        let bwd = sink.bwd();
        let (o_fwd, i_bwd) = sim.step(&fwd, &bwd);
        source.clock(&i_bwd);
        sink.clock(&o_fwd, &bwd);
    }
    sim.cycle() - start
}
