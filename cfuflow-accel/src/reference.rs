//! Reference model of a whole pass, computed without clocks.

use itertools::{iproduct, Itertools};

use crate::config::CoreConfig;
use crate::constants::*;
use crate::filter_store::FilterValues;
use crate::output_word_assembler::pack_word;
use crate::post_process::post_process;
use crate::sysarray::{dot, Activations};
use crate::types::PostProcessParams;

/// Accumulators of one pass, in lane order.
///
/// `activations[w]` and `filters[w]` are the values presented to the array on the pass's `w`-th
/// cycle.
pub fn accumulate(activations: &[Activations], filters: &[FilterValues], input_offset: i16) -> [i32; ACCUMULATOR_LANES] {
    assert_eq!(activations.len(), filters.len());

    let mut acc = [0; ACCUMULATOR_LANES];
    for (lane, (col, row)) in iproduct!(0..SYS_ARRAY_WIDTH, 0..SYS_ARRAY_HEIGHT).enumerate() {
        acc[lane] = activations
            .iter()
            .zip(filters)
            .fold(0i32, |sum, (activation, filter)| sum.wrapping_add(dot(activation[row], filter[col], input_offset)));
    }
    acc
}

/// Accumulators drained from a bank, `HALF_LANES` of them in half mode.
pub fn drained(acc: &[i32; ACCUMULATOR_LANES], half: bool) -> &[i32] {
    if half {
        &acc[..HALF_LANES]
    } else {
        acc
    }
}

/// The endless sequence of parameter records consumed by the post process pipeline.
pub fn param_sequence(
    params: &[PostProcessParams], depth: usize, repeats: usize,
) -> impl Iterator<Item = PostProcessParams> + '_ {
    params[..depth].iter().flat_map(move |params| itertools::repeat_n(*params, repeats)).cycle()
}

/// Requantizes `values` with the matching records of `params`.
pub fn quantize<'a>(
    values: impl IntoIterator<Item = &'a i32>, params: impl IntoIterator<Item = PostProcessParams>, config: &CoreConfig,
) -> Vec<i8> {
    values.into_iter().zip(params).map(|(value, params)| post_process(*value, &params, config)).collect()
}

/// Packs every four consecutive activations into one word. Trailing activations are dropped.
pub fn pack_words(values: &[i8]) -> Vec<u32> {
    values.iter().copied().tuples().map(|(e0, e1, e2, e3)| pack_word([e0, e1, e2, e3])).collect()
}
