//! Output word assembler.

use arrayvec::ArrayVec;
use cfuflow::*;
use cfuflow_std::*;

use crate::constants::ELEMENTS_PER_WORD;

const PENDING_CAPACITY: usize = ELEMENTS_PER_WORD - 1;

/// Ingress of the output word assembler.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AssemblerIngress {
    /// Quantized activations.
    pub input: Valid<i8>,
    /// Discards a partially filled word.
    pub reset: bool,
}

/// Registers of the output word assembler.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AssemblerState {
    /// Activations of the word being filled, in arrival order.
    pub pending: ArrayVec<i8, PENDING_CAPACITY>,
    /// Assembled word waiting to transfer.
    pub word: Valid<u32>,
}

/// Packs four activations into one word, element `i` in bits `8i..8i + 8`.
pub fn pack_word(elements: [i8; ELEMENTS_PER_WORD]) -> u32 { u32::from_le_bytes(elements.map(|e| e as u8)) }

/// Packs every four consecutive activations into one word.
///
/// The fourth activation completes the word in the output register, so it is accepted only when
/// that register is free or transferring on the same cycle.
#[derive(Debug, Default, Clone, Copy)]
pub struct OutputWordAssembler;

impl Logic for OutputWordAssembler {
    type EgressBwd = Ready;
    type EgressFwd = Valid<u32>;
    type IngressBwd = Ready;
    type IngressFwd = AssemblerIngress;
    type State = AssemblerState;

    fn init(&self) -> AssemblerState { AssemblerState::default() }

    fn logic(&self, i_fwd: &AssemblerIngress, o_bwd: &Ready, s: &AssemblerState) -> (Valid<u32>, Ready, AssemblerState) {
        let o_fwd = s.word;

        if i_fwd.reset {
            return (o_fwd, Ready::new(false), self.init());
        }

        let word_free = !s.word.valid || o_bwd.ready;
        let ready = Ready::new(!s.pending.is_full() || word_free);

        let mut s_next = s.clone();
        if VrChannel::new(o_fwd, *o_bwd).fire() {
            s_next.word = Valid::invalid();
        }

        if let Some(&element) = VrChannel::new(i_fwd.input, ready).transfer() {
            if s.pending.is_full() {
                let mut elements = [element; ELEMENTS_PER_WORD];
                elements[..PENDING_CAPACITY].copy_from_slice(&s.pending);
                let word = pack_word(elements);
                s_next.pending.clear();
                s_next.word = Valid::valid(word);
            } else {
                s_next.pending.push(element);
            }
        }

        (o_fwd, ready, s_next)
    }
}
