//! Accumulator reader.

use arrayvec::ArrayVec;
use cfuflow::*;
use cfuflow_std::*;

use crate::constants::*;
use crate::types::AccumulatorBank;

/// Ingress of the accumulator reader.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AccumulatorReaderIngress {
    /// Accumulator bank from the systolic array.
    pub bank: Valid<AccumulatorBank>,
    /// Scan only the first `HALF_LANES` lanes.
    pub half: bool,
    /// Discards pending lanes.
    pub reset: bool,
}

/// Lanes waiting to be emitted, the next one last.
pub type PendingLanes = ArrayVec<i32, ACCUMULATOR_LANES>;

/// Serializes accumulator banks into a stream of values in ascending lane order.
///
/// A bank is accepted only when no lane of the previous bank remains after this cycle, so the
/// systolic array is stalled rather than overwritten. Lanes without the new flag, and in half mode
/// the upper lanes, are skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct AccumulatorReader;

impl AccumulatorReader {
    fn scan(bank: &AccumulatorBank, half: bool) -> PendingLanes {
        let lanes = if half { HALF_LANES } else { ACCUMULATOR_LANES };
        bank[..lanes].iter().filter(|lane| lane.new).map(|lane| lane.value).rev().collect()
    }
}

impl Logic for AccumulatorReader {
    type EgressBwd = Ready;
    type EgressFwd = Valid<i32>;
    type IngressBwd = Ready;
    type IngressFwd = AccumulatorReaderIngress;
    type State = PendingLanes;

    fn init(&self) -> PendingLanes { PendingLanes::new() }

    fn logic(&self, i_fwd: &AccumulatorReaderIngress, o_bwd: &Ready, s: &PendingLanes) -> (Valid<i32>, Ready, PendingLanes) {
        let o_fwd = Valid::from(s.last().copied());

        if i_fwd.reset {
            return (o_fwd, Ready::new(false), self.init());
        }

        let mut s_next = s.clone();
        if VrChannel::new(o_fwd, *o_bwd).fire() {
            s_next.pop();
        }

        let ready = Ready::new(s_next.is_empty());
        if let Some(bank) = VrChannel::new(i_fwd.bank, ready).transfer() {
            s_next = Self::scan(bank, i_fwd.half);
        }

        (o_fwd, ready, s_next)
    }
}

#[cfg(test)]
mod tests {
    use cfuflow_std::testbench::{Sink, Source};
    use pretty_assertions::assert_eq;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::types::AccumulatorLane;

    fn bank(base: i32) -> AccumulatorBank { std::array::from_fn(|lane| AccumulatorLane::new(base + lane as i32)) }

    /// Lanes the reader is expected to emit for `banks`, in order.
    fn scanned(banks: &[AccumulatorBank], half: bool) -> Vec<i32> {
        let lanes = if half { HALF_LANES } else { ACCUMULATOR_LANES };
        banks.iter().flat_map(|bank| bank[..lanes].iter().filter(|lane| lane.new).map(|lane| lane.value)).collect()
    }

    /// Offers `banks` with random valid gaps and collects the values taken by a randomly ready
    /// consumer.
    fn drain(banks: &[AccumulatorBank], half: bool, valid_probability: f64, ready_probability: f64, seed: u64) -> Vec<i32> {
        let expected = scanned(banks, half).len();
        let mut sim = Simulator::new(Fsm::new(AccumulatorReader));
        let mut source = Source::new(banks.iter().copied(), valid_probability, seed);
        let mut sink = Sink::new(ready_probability, seed + 100);

        while sink.received().len() < expected {
            let ingress = AccumulatorReaderIngress { bank: source.fwd(), half, reset: false };
            let bwd = sink.bwd();
            let (value, accepted) = sim.step(&ingress, &bwd);
            source.clock(&accepted);
            sink.clock(&value, &bwd);
            assert!(sim.cycle() < 10_000);
        }

        // Nothing beyond the expected lanes.
        for _ in 0..20 {
            let ingress = AccumulatorReaderIngress { bank: source.fwd(), half, reset: false };
            let (value, accepted) = sim.step(&ingress, &Ready::new(true));
            source.clock(&accepted);
            assert!(!value.valid);
        }
        sink.take()
    }

    #[test]
    fn serializes_lanes_in_order() {
        assert_eq!(drain(&[bank(0), bank(100)], false, 1.0, 1.0, 0), vec![
            0, 1, 2, 3, 4, 5, 6, 7, 100, 101, 102, 103, 104, 105, 106, 107
        ]);
    }

    #[test]
    fn half_mode_drains_lower_lanes_only() {
        assert_eq!(drain(&[bank(0), bank(10)], true, 1.0, 1.0, 0), vec![0, 1, 2, 3, 10, 11, 12, 13]);
    }

    #[test]
    fn skips_lanes_without_new_data() {
        let mut sparse = bank(0);
        for lane in [0, 3, 6] {
            sparse[lane].new = false;
        }
        assert_eq!(drain(&[sparse], false, 1.0, 1.0, 0), vec![1, 2, 4, 5, 7]);
    }

    #[test]
    fn conserves_lanes_under_random_handshakes() {
        for seed in 0..8 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let banks = (0..20)
                .map(|_| std::array::from_fn(|_| AccumulatorLane { value: rng.gen(), new: rng.gen_bool(0.8) }))
                .collect::<Vec<AccumulatorBank>>();
            let half = seed % 2 == 1;

            assert_eq!(drain(&banks, half, 0.6, 0.5, seed), scanned(&banks, half), "seed {}", seed);
        }
    }

    #[test]
    fn ready_only_when_last_lane_leaves() {
        let reader = AccumulatorReader;
        let ingress = AccumulatorReaderIngress { bank: Valid::valid(bank(0)), half: true, reset: false };

        let (_, ready, pending) = reader.logic(&ingress, &Ready::new(true), &reader.init());
        assert!(ready.ready);
        assert_eq!(pending.as_slice(), &[3, 2, 1, 0]);

        let (_, ready, _) = reader.logic(&ingress, &Ready::new(true), &pending);
        assert!(!ready.ready);

        let last = [0].into_iter().collect::<PendingLanes>();
        let (value, ready, _) = reader.logic(&ingress, &Ready::new(true), &last);
        assert_eq!(value.into_option(), Some(0));
        assert!(ready.ready);

        let (_, ready, _) = reader.logic(&ingress, &Ready::new(false), &last);
        assert!(!ready.ready);
    }

    #[test]
    fn reset_discards_pending_lanes() {
        let reader = AccumulatorReader;
        let ingress = AccumulatorReaderIngress { bank: Valid::valid(bank(0)), half: false, reset: true };
        let (_, ready, pending) = reader.logic(&ingress, &Ready::new(true), &AccumulatorReader::scan(&bank(0), false));
        assert!(!ready.ready);
        assert!(pending.is_empty());
    }
}
