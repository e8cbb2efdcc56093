//! Filter store.
//!
//! One store per systolic array column. Words are written by command while the store is idle, and
//! replayed in parallel from address 0 on `start`.

use cfuflow::*;
use cfuflow_std::*;
use log::debug;

use crate::constants::*;
use crate::types::FilterWriteCommand;

/// Filter values presented to the systolic array, one word per store.
pub type FilterValues = [u32; SYS_ARRAY_WIDTH];

/// Ingress of the replay sequencer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FilterSequencerIngress {
    /// Number of words to replay.
    pub size: usize,
    /// Starts a replay from address 0.
    pub start: bool,
    /// Cancels any replay.
    pub reset: bool,
    /// Read data registers of the stores.
    pub mem_data: FilterValues,
}

/// Backward signals of the replay sequencer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FilterSequencerControl {
    /// Read request, issued to every store.
    pub read: Valid<usize>,
    /// Write commands may be accepted.
    pub accept_writes: bool,
}

/// Registers of the replay sequencer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FilterSequencerState {
    /// Next address to read.
    pub addr: usize,
    /// A replay is in progress.
    pub running: bool,
    /// The read data registers hold a replayed word.
    pub output_valid: bool,
}

/// Replay sequencer.
///
/// `start` latches address 0; the word is read on the following cycle and presented on the cycle
/// after that. One word is presented per cycle until `size` words have been presented.
#[derive(Debug, Default, Clone, Copy)]
pub struct FilterSequencer;

impl Logic for FilterSequencer {
    type EgressBwd = ();
    type EgressFwd = Valid<FilterValues>;
    type IngressBwd = FilterSequencerControl;
    type IngressFwd = FilterSequencerIngress;
    type State = FilterSequencerState;

    fn init(&self) -> FilterSequencerState { FilterSequencerState::default() }

    fn logic(
        &self, i_fwd: &FilterSequencerIngress, _: &(), s: &FilterSequencerState,
    ) -> (Valid<FilterValues>, FilterSequencerControl, FilterSequencerState) {
        let o_fwd = Valid::new(s.output_valid, i_fwd.mem_data);

        if i_fwd.reset {
            let control = FilterSequencerControl { read: Valid::invalid(), accept_writes: false };
            return (o_fwd, control, self.init());
        }

        let control = FilterSequencerControl { read: Valid::new(s.running, s.addr), accept_writes: !s.running };

        let s_next = if i_fwd.start {
            FilterSequencerState { addr: 0, running: i_fwd.size > 0, output_valid: false }
        } else if s.running {
            let addr = s.addr + 1;
            FilterSequencerState { addr, running: addr < i_fwd.size, output_valid: true }
        } else {
            FilterSequencerState { output_valid: false, ..*s }
        };

        (o_fwd, control, s_next)
    }
}

/// Ingress of the filter store.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FilterStoreIngress {
    /// Write command stream.
    pub write: Valid<FilterWriteCommand>,
    /// Number of words to replay, per store.
    pub size: usize,
    /// Starts a replay from address 0.
    pub start: bool,
    /// Cancels any replay. Stored words are kept.
    pub reset: bool,
}

/// Filter store.
///
/// - Ingress: the write command stream, accepted only while no replay is in progress.
/// - Egress: the replayed words. The egress has no backward signal: the systolic array consumes a
///   word on every cycle it is valid.
#[derive(Debug)]
pub struct FilterStore {
    stores: [Memory<u32>; SYS_ARRAY_WIDTH],
    sequencer: Fsm<FilterSequencer>,
}

impl Default for FilterStore {
    fn default() -> Self {
        Self {
            stores: std::array::from_fn(|_| Memory::new(FILTER_WORDS_PER_STORE)),
            sequencer: Fsm::default(),
        }
    }
}

impl FilterStore {
    /// Returns the word at `addr` of store `store`, bypassing the read port.
    ///
    /// Both indices wrap like those of a write command.
    pub fn peek(&self, store: usize, addr: usize) -> u32 {
        let store = Bits::<FILTER_STORE_SELECT_WIDTH>::new(store as u64).as_usize();
        *self.stores[store].peek(addr)
    }

    /// Returns the replay sequencer.
    pub fn sequencer(&self) -> &Fsm<FilterSequencer> { &self.sequencer }

    fn sequencer_ingress(&self, i_fwd: &FilterStoreIngress) -> FilterSequencerIngress {
        FilterSequencerIngress {
            size: i_fwd.size,
            start: i_fwd.start,
            reset: i_fwd.reset,
            mem_data: std::array::from_fn(|store| *self.stores[store].read_data()),
        }
    }
}

impl Module for FilterStore {
    type EgressBwd = ();
    type EgressFwd = Valid<FilterValues>;
    type IngressBwd = Ready;
    type IngressFwd = FilterStoreIngress;

    fn fwd(&self, i_fwd: &FilterStoreIngress) -> Valid<FilterValues> {
        self.sequencer.fwd(&self.sequencer_ingress(i_fwd))
    }

    fn bwd(&self, i_fwd: &FilterStoreIngress, _: &()) -> Ready {
        Ready::new(self.sequencer.bwd(&self.sequencer_ingress(i_fwd), &()).accept_writes)
    }

    fn clock(&mut self, i_fwd: &FilterStoreIngress, _: &()) {
        let sequencer_ingress = self.sequencer_ingress(i_fwd);
        let control = self.sequencer.bwd(&sequencer_ingress, &());
        let write = VrChannel::new(i_fwd.write, Ready::new(control.accept_writes));

        if i_fwd.start && !i_fwd.reset {
            debug!("filter replay: start, {} words", i_fwd.size);
        }

        for (index, store) in self.stores.iter_mut().enumerate() {
            let port = match write.transfer() {
                Some(command) if command.store.as_usize() == index => {
                    Valid::valid((command.addr.as_usize(), command.data))
                }
                _ => Valid::invalid(),
            };
            store.clock(&port, &control.read);
        }

        let was_running = self.sequencer.state().running;
        self.sequencer.clock(&sequencer_ingress, &());
        if was_running && !self.sequencer.state().running && !i_fwd.reset {
            debug!("filter replay: done");
        }
    }
}
