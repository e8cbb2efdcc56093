//! Payload types crossing component boundaries.

use cfuflow::{Bits, Signal};
use static_assertions::const_assert_eq;

use crate::constants::*;

/// Command writing one word of a filter store.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Signal)]
pub struct FilterWriteCommand {
    /// Filter store index, one store per systolic array column.
    pub store: Bits<FILTER_STORE_SELECT_WIDTH>,
    /// Word address within the store.
    pub addr: Bits<FILTER_ADDR_WIDTH>,
    /// Four packed 8 bit filter values.
    pub data: u32,
}

impl FilterWriteCommand {
    /// Creates a new command.
    pub fn new(store: usize, addr: usize, data: u32) -> Self {
        Self { store: Bits::new(store as u64), addr: Bits::new(addr as u64), data }
    }
}

/// Quantization parameters of one output channel.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Signal)]
pub struct PostProcessParams {
    /// Added to the accumulator before scaling.
    pub bias: i16,
    /// Fixed point multiplier in Q0.31.
    pub multiplier: i32,
    /// Rounding right shift applied after the multiplier.
    pub shift: Bits<4>,
}

impl PostProcessParams {
    /// Creates a new record. `shift` is truncated to 4 bits.
    pub fn new(bias: i16, multiplier: i32, shift: u32) -> Self {
        Self { bias, multiplier, shift: Bits::new(u64::from(shift)) }
    }

    /// Packs the record into the blob stored by the parameter memory.
    pub fn into_blob(self) -> ParamBlob { ParamBlob::from_bits(&self.transl()) }

    /// Unpacks a record from a parameter memory blob.
    pub fn from_blob(blob: ParamBlob) -> Self { Self::from_bits(&blob.transl()) }
}

/// Opaque parameter record as stored in the parameter memory.
pub type ParamBlob = Bits<POST_PROCESS_PARAMS_WIDTH>;

const_assert_eq!(<PostProcessParams as Signal>::WIDTH, POST_PROCESS_PARAMS_WIDTH);
const_assert_eq!(<FilterWriteCommand as Signal>::WIDTH, 42);

/// One accumulator of the systolic array.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Signal)]
pub struct AccumulatorLane {
    /// Accumulated value.
    pub value: i32,
    /// The value is new on this cycle.
    pub new: bool,
}

impl AccumulatorLane {
    /// Creates a lane holding a new value.
    pub fn new(value: i32) -> Self { Self { value, new: true } }
}

/// All accumulators of the systolic array.
pub type AccumulatorBank = [AccumulatorLane; ACCUMULATOR_LANES];
