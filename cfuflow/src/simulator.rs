//! Clocked step function.

use log::trace;

use crate::Module;

/// Drives a module one clock tick at a time.
///
/// The simulator is the deterministic step function `(state, inputs) -> (state', outputs)`: each
/// call to [`Simulator::step`] evaluates the forward sweep, the backward sweep, and the clock edge
/// of the wrapped module exactly once.
#[derive(Debug)]
pub struct Simulator<M: Module> {
    module: M,
    cycle: u64,
}

impl<M: Module> Simulator<M> {
    /// Creates a simulator at cycle 0.
    pub fn new(module: M) -> Self { Self { module, cycle: 0 } }

    /// Number of ticks evaluated so far.
    pub fn cycle(&self) -> u64 { self.cycle }

    /// Returns the simulated module.
    pub fn module(&self) -> &M { &self.module }

    /// Returns the simulated module mutably.
    pub fn module_mut(&mut self) -> &mut M { &mut self.module }

    /// Consumes the simulator, returning the module.
    pub fn into_inner(self) -> M { self.module }

    /// Egress forward signals of the current cycle, without ticking.
    pub fn peek(&self, i_fwd: &M::IngressFwd) -> M::EgressFwd { self.module.fwd(i_fwd) }

    /// Evaluates one tick.
    ///
    /// Returns the egress forward and ingress backward signals that were visible during the tick,
    /// i.e. before the clock edge.
    pub fn step(&mut self, i_fwd: &M::IngressFwd, o_bwd: &M::EgressBwd) -> (M::EgressFwd, M::IngressBwd) {
        let o_fwd = self.module.fwd(i_fwd);
        let i_bwd = self.module.bwd(i_fwd, o_bwd);
        trace!("cycle {}: o_fwd {:?}, i_bwd {:?}", self.cycle, o_fwd, i_bwd);
        self.module.clock(i_fwd, o_bwd);
        self.cycle += 1;
        (o_fwd, i_bwd)
    }

    /// Evaluates `n` ticks with the same signals.
    pub fn step_n(&mut self, n: usize, i_fwd: &M::IngressFwd, o_bwd: &M::EgressBwd) {
        for _ in 0..n {
            let _ = self.step(i_fwd, o_bwd);
        }
    }
}
