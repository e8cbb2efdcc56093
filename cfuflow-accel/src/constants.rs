//! Constants for the accelerator datapath.

use static_assertions::const_assert;

/// Rows of the systolic array. Each row consumes one activation word per cycle.
pub const SYS_ARRAY_HEIGHT: usize = 4;

/// Columns of the systolic array. Each column consumes one filter word per cycle.
pub const SYS_ARRAY_WIDTH: usize = 2;

/// Width of the filter store index of a write command.
pub const FILTER_STORE_SELECT_WIDTH: usize = 1;

/// Accumulators drained from the systolic array, lane `col * SYS_ARRAY_HEIGHT + row`.
pub const ACCUMULATOR_LANES: usize = SYS_ARRAY_HEIGHT * SYS_ARRAY_WIDTH;

/// Lanes drained in half mode.
pub const HALF_LANES: usize = ACCUMULATOR_LANES / 2;

/// Words per filter store.
pub const FILTER_WORDS_PER_STORE: usize = 512;

/// Address width of a filter store.
pub const FILTER_ADDR_WIDTH: usize = 9;

/// Entries of the post process parameter memory.
pub const MAX_CHANNEL_DEPTH: usize = 512;

/// Quantized activations per output word.
pub const ELEMENTS_PER_WORD: usize = 4;

/// Width of the signed input and output offsets.
pub const OFFSET_WIDTH: usize = 9;

/// Width of the packed post process parameter record.
pub const POST_PROCESS_PARAMS_WIDTH: usize = 52;

const_assert!(ACCUMULATOR_LANES == 8);
const_assert!(HALF_LANES == SYS_ARRAY_HEIGHT);
const_assert!(1 << FILTER_STORE_SELECT_WIDTH == SYS_ARRAY_WIDTH);
const_assert!(FILTER_WORDS_PER_STORE.is_power_of_two());
const_assert!(1 << FILTER_ADDR_WIDTH == FILTER_WORDS_PER_STORE);
const_assert!(MAX_CHANNEL_DEPTH.is_power_of_two());
const_assert!(ELEMENTS_PER_WORD * 8 == u32::BITS as usize);
