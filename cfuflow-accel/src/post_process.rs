//! Post process pipeline: requantization of accumulator values to 8 bit activations.
//!
//! Arithmetic follows the gemmlowp fixed point kernels used by TFLite: the biased accumulator is
//! multiplied by a Q0.31 multiplier keeping the rounded high half, then divided by a power of two
//! with rounding half away from zero.

use cfuflow::*;
use cfuflow_std::*;

use crate::config::CoreConfig;
use crate::types::PostProcessParams;

/// Returns the high 32 bits of `2 * a * b`, rounded to nearest.
///
/// The only overflowing case, `i32::MIN * i32::MIN`, saturates to `i32::MAX`.
pub fn saturating_rounding_doubling_high_mul(a: i32, b: i32) -> i32 {
    if a == i32::MIN && b == i32::MIN {
        return i32::MAX;
    }

    let ab = i64::from(a) * i64::from(b);
    let nudge = if ab >= 0 { 1 << 30 } else { 1 - (1 << 30) };
    ((ab + nudge) / (1i64 << 31)) as i32
}

/// Returns `x / 2^exponent`, rounded to nearest with ties away from zero.
pub fn rounding_divide_by_pot(x: i32, exponent: u32) -> i32 {
    debug_assert!(exponent < 32);

    let mask = ((1i64 << exponent) - 1) as i32;
    let remainder = x & mask;
    let threshold = (mask >> 1) + i32::from(x < 0);
    (x >> exponent) + i32::from(remainder > threshold)
}

/// Adds the output offset and clamps to the activation range.
///
/// The sum is formed without overflow. An empty range yields `max`, as the hardware's
/// min-then-max comparators do.
pub fn clamp_activation(value: i32, offset: i16, min: i8, max: i8) -> i8 {
    (i64::from(value) + i64::from(offset)).max(i64::from(min)).min(i64::from(max)) as i8
}

/// Requantizes one accumulator value.
pub fn post_process(acc: i32, params: &PostProcessParams, config: &CoreConfig) -> i8 {
    let biased = acc.wrapping_add(i32::from(params.bias));
    let scaled = saturating_rounding_doubling_high_mul(biased, params.multiplier);
    let shifted = rounding_divide_by_pot(scaled, params.shift.value() as u32);
    clamp_activation(shifted, config.output_offset, config.output_activation_min, config.output_activation_max)
}

/// First stage register: biased accumulator and the remaining coefficients.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Signal)]
pub struct Biased {
    /// Accumulator plus bias.
    pub value: i32,
    /// Fixed point multiplier.
    pub multiplier: i32,
    /// Rounding right shift.
    pub shift: Bits<4>,
}

/// Second stage register: scaled value and the remaining shift.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Signal)]
pub struct Scaled {
    /// Value after the fixed point multiplier.
    pub value: i32,
    /// Rounding right shift.
    pub shift: Bits<4>,
}

/// Ingress of the post process pipeline.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PostProcessIngress {
    /// Accumulator stream.
    pub acc: Valid<i32>,
    /// Parameter stream, one record per accumulator value.
    pub params: Valid<PostProcessParams>,
    /// Offset added to each output value.
    pub offset: i16,
    /// The minimum output value.
    pub activation_min: i8,
    /// The maximum output value.
    pub activation_max: i8,
    /// Empties the pipeline.
    pub reset: bool,
}

/// Forward signals of every stage boundary during one cycle.
#[derive(Debug, Clone, Copy)]
struct Stages {
    joined: (Valid<i32>, Valid<PostProcessParams>),
    biased: Valid<Biased>,
    scaled: Valid<Scaled>,
    result: Valid<i8>,
}

/// Post process pipeline.
///
/// The accumulator and parameter streams are joined, so an element of one transfers only together
/// with an element of the other. The joined pair then passes three register slices: bias, scale,
/// then shift with offset and clamp. Latency is three cycles and throughput one element per cycle.
#[derive(Debug, Default)]
pub struct PostProcessPipeline {
    join: Fsm<Join<i32, PostProcessParams>>,
    bias: Fsm<RegisterSlice<Biased>>,
    scale: Fsm<RegisterSlice<Scaled>>,
    shift: Fsm<RegisterSlice<i8>>,
}

impl PostProcessPipeline {
    fn stages(&self, i_fwd: &PostProcessIngress) -> Stages {
        let joined = (i_fwd.acc, i_fwd.params);

        let biased = self.join.fwd(&joined).map_inner(|(acc, params)| Biased {
            value: acc.wrapping_add(i32::from(params.bias)),
            multiplier: params.multiplier,
            shift: params.shift,
        });

        let scaled = self.bias.fwd(&biased).map_inner(|biased| Scaled {
            value: saturating_rounding_doubling_high_mul(biased.value, biased.multiplier),
            shift: biased.shift,
        });

        let result = self.scale.fwd(&scaled).map_inner(|scaled| {
            let shifted = rounding_divide_by_pot(scaled.value, scaled.shift.value() as u32);
            clamp_activation(shifted, i_fwd.offset, i_fwd.activation_min, i_fwd.activation_max)
        });

        Stages { joined, biased, scaled, result }
    }

    /// Returns the readiness of the join's egress and of each stage's egress.
    fn readies(&self, stages: &Stages, o_bwd: &Ready) -> [Ready; 4] {
        let shift = *o_bwd;
        let scale = self.shift.bwd(&stages.result, &shift);
        let bias = self.scale.bwd(&stages.scaled, &scale);
        let join = self.bias.bwd(&stages.biased, &bias);
        [join, bias, scale, shift]
    }
}

impl Module for PostProcessPipeline {
    type EgressBwd = Ready;
    type EgressFwd = Valid<i8>;
    type IngressBwd = (Ready, Ready);
    type IngressFwd = PostProcessIngress;

    fn fwd(&self, i_fwd: &PostProcessIngress) -> Valid<i8> { self.shift.fwd(&self.stages(i_fwd).result) }

    fn bwd(&self, i_fwd: &PostProcessIngress, o_bwd: &Ready) -> (Ready, Ready) {
        if i_fwd.reset {
            return (Ready::new(false), Ready::new(false));
        }

        let stages = self.stages(i_fwd);
        let [join, ..] = self.readies(&stages, o_bwd);
        self.join.bwd(&stages.joined, &join)
    }

    fn clock(&mut self, i_fwd: &PostProcessIngress, o_bwd: &Ready) {
        if i_fwd.reset {
            self.bias.reset();
            self.scale.reset();
            self.shift.reset();
            return;
        }

        let stages = self.stages(i_fwd);
        let [join, bias, scale, shift] = self.readies(&stages, o_bwd);

        self.join.clock(&stages.joined, &join);
        self.bias.clock(&stages.biased, &bias);
        self.scale.clock(&stages.scaled, &scale);
        self.shift.clock(&stages.result, &shift);
    }
}

#[cfg(test)]
mod tests {
    use cfuflow_std::testbench::Sink;
    use pretty_assertions::assert_eq;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    fn config(min: i8, max: i8) -> CoreConfig {
        CoreConfig { output_activation_min: min, output_activation_max: max, ..CoreConfig::default() }
    }

    /// Identity for small values: multiplier of almost one, no shift.
    fn identity() -> PostProcessParams { PostProcessParams::new(0, i32::MAX, 0) }

    #[test]
    fn doubling_high_mul_matches_reference_cases() {
        assert_eq!(saturating_rounding_doubling_high_mul(i32::MIN, i32::MIN), i32::MAX);
        assert_eq!(saturating_rounding_doubling_high_mul(i32::MIN, i32::MAX), -i32::MAX);
        assert_eq!(saturating_rounding_doubling_high_mul(1 << 30, 1 << 30), 1 << 29);
        assert_eq!(saturating_rounding_doubling_high_mul(100, 1 << 30), 50);
        assert_eq!(saturating_rounding_doubling_high_mul(-100, 1 << 30), -50);
        // Ties round up.
        assert_eq!(saturating_rounding_doubling_high_mul(3, 1 << 30), 2);
        assert_eq!(saturating_rounding_doubling_high_mul(-3, 1 << 30), -1);
        assert_eq!(saturating_rounding_doubling_high_mul(0, i32::MIN), 0);
    }

    #[test]
    fn divide_by_pot_rounds_half_away_from_zero() {
        let cases = [(5, 1, 3), (-5, 1, -3), (4, 1, 2), (-4, 1, -2), (7, 2, 2), (-7, 2, -2), (6, 2, 2), (-6, 2, -2)];
        for (x, exponent, expected) in cases {
            assert_eq!(rounding_divide_by_pot(x, exponent), expected, "{} >> {}", x, exponent);
        }
        assert_eq!(rounding_divide_by_pot(i32::MIN, 31), -1);
        assert_eq!(rounding_divide_by_pot(i32::MAX, 0), i32::MAX);
    }

    #[test]
    fn clamps_to_activation_range() {
        let config = config(-10, 10);
        assert_eq!(post_process(-200, &identity(), &config), -10);
        assert_eq!(post_process(200, &identity(), &config), 10);
        for value in -10..=10 {
            assert_eq!(post_process(value, &identity(), &config), value as i8);
        }
    }

    #[test]
    fn clamps_extreme_values_with_offset() {
        for offset in [-255, 0, 255] {
            assert_eq!(clamp_activation(i32::MAX, offset, -10, 10), 10);
            assert_eq!(clamp_activation(i32::MIN, offset, -10, 10), -10);
        }

        let high = CoreConfig { output_offset: 255, ..config(-10, 10) };
        assert_eq!(post_process(i32::MAX, &identity(), &high), 10);
        let low = CoreConfig { output_offset: -255, ..config(-10, 10) };
        assert_eq!(post_process(i32::MIN, &identity(), &low), -10);
    }

    #[test]
    fn empty_range_yields_max() {
        assert_eq!(clamp_activation(0, 0, 5, -5), -5);
        assert_eq!(clamp_activation(i32::MIN, -255, 5, -5), -5);
    }

    #[test]
    fn applies_bias_scale_shift_and_offset() {
        let params = PostProcessParams::new(-20, 1 << 30, 2);
        let config = CoreConfig { output_offset: -128, ..CoreConfig::default() };
        // (1000 - 20) / 2 = 490, 490 / 4 rounds to 123, 123 - 128 = -5.
        assert_eq!(post_process(1000, &params, &config), -5);
    }

    fn ingress(acc: Valid<i32>, params: Valid<PostProcessParams>, config: &CoreConfig) -> PostProcessIngress {
        PostProcessIngress {
            acc,
            params,
            offset: config.output_offset,
            activation_min: config.output_activation_min,
            activation_max: config.output_activation_max,
            reset: false,
        }
    }

    #[test]
    fn latency_is_three_cycles() {
        let config = config(-128, 127);
        let mut sim = Simulator::new(PostProcessPipeline::default());

        let input = ingress(Valid::valid(42), Valid::valid(identity()), &config);
        let idle = ingress(Valid::invalid(), Valid::invalid(), &config);

        let (_, (acc_ready, params_ready)) = sim.step(&input, &Ready::new(true));
        assert!(acc_ready.ready && params_ready.ready);

        let outputs = (0..4).map(|_| sim.step(&idle, &Ready::new(true)).0).collect::<Vec<_>>();
        assert_eq!(outputs, vec![Valid::invalid(), Valid::invalid(), Valid::valid(42), Valid::invalid()]);
    }

    #[test]
    fn streams_advance_in_lockstep() {
        let config = config(-128, 127);
        let mut sim = Simulator::new(PostProcessPipeline::default());

        let (_, (acc_ready, params_ready)) =
            sim.step(&ingress(Valid::valid(1), Valid::invalid(), &config), &Ready::new(true));
        assert!(!acc_ready.ready);
        assert!(params_ready.ready);

        let (_, (acc_ready, _)) = sim.step(&ingress(Valid::valid(1), Valid::valid(identity()), &config), &Ready::new(true));
        assert!(acc_ready.ready);
    }

    #[test]
    fn conserves_pairs_under_random_backpressure() {
        let config = config(-128, 127);
        let mut rng = SmallRng::seed_from_u64(7);
        let accs = (0..300).map(|_| rng.gen_range(-50_000..50_000)).collect::<Vec<i32>>();
        let params = (0..300)
            .map(|_| PostProcessParams::new(rng.gen_range(-500..500), rng.gen_range(1 << 29..i32::MAX), rng.gen_range(0..12)))
            .collect::<Vec<_>>();
        let expected = accs.iter().zip(&params).map(|(acc, params)| post_process(*acc, params, &config)).collect::<Vec<_>>();

        let mut sim = Simulator::new(PostProcessPipeline::default());
        let mut sink = Sink::new(0.5, 11);
        let (mut next_acc, mut next_params) = (0, 0);

        while sink.received().len() < expected.len() {
            // Each stream offers its next element with its own random gaps.
            let acc = if next_acc < accs.len() && rng.gen_bool(0.7) { Valid::valid(accs[next_acc]) } else { Valid::invalid() };
            let record =
                if next_params < params.len() && rng.gen_bool(0.7) { Valid::valid(params[next_params]) } else { Valid::invalid() };

            let bwd = sink.bwd();
            let (result, (acc_ready, params_ready)) = sim.step(&ingress(acc, record, &config), &bwd);
            sink.clock(&result, &bwd);

            next_acc += usize::from(VrChannel::new(acc, acc_ready).fire());
            next_params += usize::from(VrChannel::new(record, params_ready).fire());
            assert_eq!(next_acc, next_params);
            assert!(sim.cycle() < 10_000);
        }

        assert_eq!(sink.take(), expected);
    }

    #[test]
    fn reset_empties_pipeline() {
        let config = config(-128, 127);
        let mut sim = Simulator::new(PostProcessPipeline::default());
        let _ = sim.step(&ingress(Valid::valid(5), Valid::valid(identity()), &config), &Ready::new(false));

        let reset = PostProcessIngress { reset: true, ..ingress(Valid::valid(6), Valid::valid(identity()), &config) };
        let (_, (acc_ready, params_ready)) = sim.step(&reset, &Ready::new(false));
        assert!(!acc_ready.ready && !params_ready.ready);

        let idle = ingress(Valid::invalid(), Valid::invalid(), &config);
        for _ in 0..5 {
            assert!(!sim.step(&idle, &Ready::new(true)).0.valid);
        }
    }
}
