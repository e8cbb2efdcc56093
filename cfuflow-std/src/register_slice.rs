//! Register slice for valid-ready channels.
//!
//! Reference: <https://chipressco.wpcomstaging.com/2019/03/16/valid-ready-protocol-and-register-slice/>

use std::marker::PhantomData;

use crate::*;

/// Forward register slice.
///
/// A single pipeline register: the egress is driven from the register only, and the ingress is
/// ready whenever the register is empty or is being emptied on this cycle.
#[derive(Debug)]
pub struct RegisterSlice<V> {
    _marker: PhantomData<V>,
}

impl<V> Default for RegisterSlice<V> {
    fn default() -> Self { Self { _marker: PhantomData } }
}

impl<V: Signal + Default + PartialEq> Logic for RegisterSlice<V> {
    type EgressBwd = Ready;
    type EgressFwd = Valid<V>;
    type IngressBwd = Ready;
    type IngressFwd = Valid<V>;
    type State = Valid<V>;

    fn init(&self) -> Valid<V> { Valid::invalid() }

    fn logic(&self, fwd: &Valid<V>, bwd: &Ready, s: &Valid<V>) -> (Valid<V>, Ready, Valid<V>) {
        let is_occupied = s.valid;
        let remaining = is_occupied && !bwd.ready;

        let s_next = if fwd.valid && !remaining {
            fwd.clone()
        } else if bwd.ready {
            Valid::invalid()
        } else {
            s.clone()
        };

        (s.clone(), Ready::new(!remaining), s_next)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::testbench::{Sink, Source};

    #[test]
    fn holds_payload_while_stalled() {
        let mut slice = Fsm::new(RegisterSlice::<u16>::default());
        slice.clock(&Valid::valid(7), &Ready::new(false));
        assert_eq!(slice.fwd(&Valid::invalid()), Valid::valid(7));

        // Stalled: the next input is refused and the payload stays.
        assert!(!slice.bwd(&Valid::valid(8), &Ready::new(false)).ready);
        slice.clock(&Valid::valid(8), &Ready::new(false));
        assert_eq!(slice.fwd(&Valid::invalid()), Valid::valid(7));

        // Draining and refilling on the same cycle keeps full throughput.
        assert!(slice.bwd(&Valid::valid(8), &Ready::new(true)).ready);
        slice.clock(&Valid::valid(8), &Ready::new(true));
        assert_eq!(slice.fwd(&Valid::invalid()), Valid::valid(8));
    }

    #[test]
    fn conserves_stream_under_random_backpressure() {
        let items = (0..200u32).collect::<Vec<_>>();

        for seed in 0..8 {
            let mut source = Source::new(items.clone(), 0.6, seed);
            let mut sink = Sink::new(0.4, seed + 100);
            let mut sim = Simulator::new(Fsm::new(RegisterSlice::<u32>::default()));

            let cycles = testbench::run_stream(&mut sim, &mut source, &mut sink, items.len(), 10_000);
            assert!(cycles < 10_000);
            assert_eq!(sink.received(), &items[..]);
        }
    }
}
