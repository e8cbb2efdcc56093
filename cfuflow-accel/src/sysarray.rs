//! Behavioral model of the systolic array.
//!
//! Only the array's stream contract is modelled: each cell's multiply-accumulate is computed in a
//! single cycle instead of flowing through a grid of registers.

use cfuflow::*;
use cfuflow_std::*;

use crate::constants::*;
use crate::filter_store::FilterValues;
use crate::types::{AccumulatorBank, AccumulatorLane};

/// Activation words presented to the rows of the array.
pub type Activations = [u32; SYS_ARRAY_HEIGHT];

/// Ingress of a compute array.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ComputeIngress {
    /// Four packed 8 bit activations per row.
    pub activations: Activations,
    /// Filter words from the filter store, one per column.
    pub filters: Valid<FilterValues>,
    /// Clears the accumulators before this cycle's products.
    pub first: bool,
    /// This cycle's products complete the accumulators.
    pub last: bool,
    /// Added to each activation value.
    pub input_offset: i16,
    /// Clears the accumulators and any bank on offer.
    pub reset: bool,
}

/// Interface of a compute array driven by the accelerator core.
///
/// The egress is the accumulator bank stream. The ingress backward signal tells whether a pass may
/// complete on this cycle: `last` is only honored while it is high. Filter values arrive
/// unconditionally, so a pass must not be started while it is low.
pub trait ComputeArray:
    Module<IngressFwd = ComputeIngress, IngressBwd = Ready, EgressFwd = Valid<AccumulatorBank>, EgressBwd = Ready>
{
}

impl<M> ComputeArray for M where
    M: Module<IngressFwd = ComputeIngress, IngressBwd = Ready, EgressFwd = Valid<AccumulatorBank>, EgressBwd = Ready>
{
}

/// Returns the lane of the cell at `row`, `col`.
pub fn lane_index(row: usize, col: usize) -> usize { col * SYS_ARRAY_HEIGHT + row }

/// Sum of products of the four packed values of `activation` and `filter`.
pub fn dot(activation: u32, filter: u32, input_offset: i16) -> i32 {
    activation
        .to_le_bytes()
        .into_iter()
        .zip(filter.to_le_bytes())
        .map(|(a, f)| (i32::from(a as i8) + i32::from(input_offset)) * i32::from(f as i8))
        .sum()
}

/// Registers of the systolic array.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SystolicArrayState {
    /// Accumulators, by lane.
    pub acc: [i32; ACCUMULATOR_LANES],
    /// Completed bank waiting to transfer.
    pub bank: Valid<AccumulatorBank>,
}

/// Systolic array of `SYS_ARRAY_HEIGHT` rows and `SYS_ARRAY_WIDTH` columns.
///
/// Cell `(row, col)` multiplies row `row`'s activations with column `col`'s filter values on every
/// cycle the filter values are valid. The cycle after `last`, every lane is presented as new until
/// the bank transfers. The array is ready for `last` only while no bank is on offer or the bank
/// transfers on the same cycle; a refused `last` leaves the bank on offer untouched and the
/// completed accumulators unpublished.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystolicArray;

impl Logic for SystolicArray {
    type EgressBwd = Ready;
    type EgressFwd = Valid<AccumulatorBank>;
    type IngressBwd = Ready;
    type IngressFwd = ComputeIngress;
    type State = SystolicArrayState;

    fn init(&self) -> SystolicArrayState { SystolicArrayState::default() }

    fn logic(
        &self, i_fwd: &ComputeIngress, o_bwd: &Ready, s: &SystolicArrayState,
    ) -> (Valid<AccumulatorBank>, Ready, SystolicArrayState) {
        let o_fwd = s.bank;

        if i_fwd.reset {
            return (o_fwd, Ready::new(false), self.init());
        }

        let mut s_next = s.clone();
        if VrChannel::new(o_fwd, *o_bwd).fire() {
            s_next.bank = Valid::invalid();
        }
        let ready = Ready::new(!s_next.bank.valid);

        let Some(filters) = i_fwd.filters.as_option() else {
            return (o_fwd, ready, s_next);
        };

        for (col, filter) in filters.iter().enumerate() {
            for (row, activation) in i_fwd.activations.iter().enumerate() {
                let lane = lane_index(row, col);
                let base = if i_fwd.first { 0 } else { s.acc[lane] };
                s_next.acc[lane] = base.wrapping_add(dot(*activation, *filter, i_fwd.input_offset));
            }
        }

        if i_fwd.last && ready.ready {
            s_next.bank = Valid::valid(s_next.acc.map(AccumulatorLane::new));
        }

        (o_fwd, ready, s_next)
    }
}
