//! Finite state machine (Mealy machine).

use std::fmt::Debug;

use crate::Module;

/// Logic of a finite state machine.
///
/// `logic` is a pure function generating (1) the current-cycle egress forward signals, (2) the
/// current-cycle ingress backward signals, and (3) the next-cycle state.
pub trait Logic: Debug {
    /// Ingress forward signals.
    type IngressFwd: Debug;

    /// Ingress backward signals.
    type IngressBwd: Debug;

    /// Egress forward signals.
    type EgressFwd: Debug + PartialEq;

    /// Egress backward signals. The default value is the idle (not ready) value.
    type EgressBwd: Debug + Default;

    /// Registers of the machine.
    type State: Debug + Clone;

    /// Initial value of registers, also restored by `Fsm::reset`.
    fn init(&self) -> Self::State;

    /// The transition and output function.
    fn logic(
        &self, i_fwd: &Self::IngressFwd, o_bwd: &Self::EgressBwd, s: &Self::State,
    ) -> (Self::EgressFwd, Self::IngressBwd, Self::State);
}

/// Finite state machine (Mealy machine).
#[derive(Debug, Clone)]
pub struct Fsm<L: Logic> {
    /// FSM function.
    logic: L,
    /// Registers.
    state: L::State,
}

impl<L: Logic> Fsm<L> {
    /// Creates a new FSM with registers at their initial value.
    pub fn new(logic: L) -> Self {
        let state = logic.init();
        Self { logic, state }
    }

    /// Returns the current registers.
    pub fn state(&self) -> &L::State { &self.state }

    /// Returns the FSM function.
    pub fn logic(&self) -> &L { &self.logic }

    /// Restores the initial registers.
    pub fn reset(&mut self) { self.state = self.logic.init(); }
}

impl<L: Logic + Default> Default for Fsm<L> {
    fn default() -> Self { Self::new(L::default()) }
}

impl<L: Logic> Module for Fsm<L> {
    type EgressBwd = L::EgressBwd;
    type EgressFwd = L::EgressFwd;
    type IngressBwd = L::IngressBwd;
    type IngressFwd = L::IngressFwd;

    fn fwd(&self, i_fwd: &L::IngressFwd) -> L::EgressFwd {
        self.logic.logic(i_fwd, &L::EgressBwd::default(), &self.state).0
    }

    fn bwd(&self, i_fwd: &L::IngressFwd, o_bwd: &L::EgressBwd) -> L::IngressBwd {
        self.logic.logic(i_fwd, o_bwd, &self.state).1
    }

    fn clock(&mut self, i_fwd: &L::IngressFwd, o_bwd: &L::EgressBwd) {
        let (o_fwd, _, state_next) = self.logic.logic(i_fwd, o_bwd, &self.state);
        debug_assert_eq!(
            o_fwd,
            self.fwd(i_fwd),
            "{:?}: egress forward signals depend on egress backward signals",
            self.logic
        );
        self.state = state_next;
    }
}
