//! Module.

use std::fmt::Debug;

/// A synchronous component with one ingress and one egress interface.
///
/// Each interface is split into forward signals (valid and payload, flowing from producer to
/// consumer) and backward signals (ready, flowing from consumer to producer). A clock tick is
/// evaluated in three phases:
///
/// 1. `fwd` for every module, upstream first;
/// 2. `bwd` for every module, downstream first;
/// 3. `clock` for every module, which latches the next-cycle state.
///
/// Egress forward signals must not depend on egress backward signals, so `fwd` does not receive
/// them. This is the protocol that keeps the sweeps free of combinational loops.
pub trait Module: Debug {
    /// Ingress forward signals.
    type IngressFwd: Debug;

    /// Ingress backward signals.
    type IngressBwd: Debug;

    /// Egress forward signals.
    type EgressFwd: Debug;

    /// Egress backward signals.
    type EgressBwd: Debug;

    /// Computes the current-cycle egress forward signals.
    fn fwd(&self, i_fwd: &Self::IngressFwd) -> Self::EgressFwd;

    /// Computes the current-cycle ingress backward signals.
    fn bwd(&self, i_fwd: &Self::IngressFwd, o_bwd: &Self::EgressBwd) -> Self::IngressBwd;

    /// Latches the next-cycle state at the clock edge.
    fn clock(&mut self, i_fwd: &Self::IngressFwd, o_bwd: &Self::EgressBwd);
}
