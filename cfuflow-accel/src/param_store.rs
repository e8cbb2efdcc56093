//! Post process parameter store: memory, sequential writer and cyclic reader.

use cfuflow::*;
use cfuflow_std::*;
use log::debug;

use crate::constants::*;
use crate::types::{ParamBlob, PostProcessParams};

/// Ingress of the parameter writer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParamWriterIngress {
    /// Incoming parameter records.
    pub input: Valid<PostProcessParams>,
    /// Rewinds the write address.
    pub reset: bool,
}

/// Drains the parameter stream into memory addresses `0, 1, 2, ...`.
///
/// The address wraps to 0 after `MAX_CHANNEL_DEPTH - 1`. The writer takes one record per cycle
/// whenever `reset` is low.
#[derive(Debug, Default, Clone, Copy)]
pub struct ParamWriter;

impl Logic for ParamWriter {
    type EgressBwd = ();
    type EgressFwd = Valid<(usize, ParamBlob)>;
    type IngressBwd = Ready;
    type IngressFwd = ParamWriterIngress;
    type State = WrapCounter;

    fn init(&self) -> WrapCounter { WrapCounter::default() }

    fn logic(
        &self, i_fwd: &ParamWriterIngress, _: &(), s: &WrapCounter,
    ) -> (Valid<(usize, ParamBlob)>, Ready, WrapCounter) {
        let ready = Ready::new(!i_fwd.reset);
        let fire = VrChannel::new(i_fwd.input, ready).fire();

        let o_fwd = Valid::new(fire, (s.value(), i_fwd.input.inner.into_blob()));
        let s_next = if i_fwd.reset { self.init() } else { s.next_if(fire, MAX_CHANNEL_DEPTH).0 };

        (o_fwd, ready, s_next)
    }
}

/// Ingress of the cyclic reader.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParamReaderIngress {
    /// Number of live channels.
    pub depth: usize,
    /// Consecutive emissions of each channel.
    pub repeats: usize,
    /// Restarts the cycle at channel 0.
    pub reset: bool,
    /// Read data register of the parameter memory.
    pub mem_data: ParamBlob,
}

/// Registers of the cyclic reader.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParamReaderState {
    /// Channel of the next read.
    pub addr: WrapCounter,
    /// Emissions of `addr` so far.
    pub repeat: WrapCounter,
    /// The read data register holds the element on offer.
    pub primed: bool,
}

/// Replays parameter records cyclically: channel 0 `repeats` times, channel 1 `repeats` times, up
/// to channel `depth - 1`, then channel 0 again.
///
/// The element on offer is the memory's read data register. The next element is read whenever
/// nothing is on offer or the offered element transfers, so after `reset` the first element is
/// offered on the second tick.
#[derive(Debug, Default, Clone, Copy)]
pub struct ParamReader;

impl Logic for ParamReader {
    type EgressBwd = Ready;
    type EgressFwd = Valid<PostProcessParams>;
    type IngressBwd = Valid<usize>;
    type IngressFwd = ParamReaderIngress;
    type State = ParamReaderState;

    fn init(&self) -> ParamReaderState { ParamReaderState::default() }

    fn logic(
        &self, i_fwd: &ParamReaderIngress, o_bwd: &Ready, s: &ParamReaderState,
    ) -> (Valid<PostProcessParams>, Valid<usize>, ParamReaderState) {
        let o_fwd = Valid::new(s.primed, PostProcessParams::from_blob(i_fwd.mem_data));

        if i_fwd.reset {
            return (o_fwd, Valid::invalid(), self.init());
        }

        let advance = !s.primed || o_bwd.ready;
        if !advance {
            return (o_fwd, Valid::invalid(), *s);
        }

        let (repeat, wrapped) = s.repeat.next(i_fwd.repeats);
        let (addr, _) = s.addr.next_if(wrapped, i_fwd.depth);

        (o_fwd, Valid::valid(s.addr.value()), ParamReaderState { addr, repeat, primed: true })
    }
}

/// Ingress of the parameter store.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParamStoreIngress {
    /// Parameter write stream.
    pub write: Valid<PostProcessParams>,
    /// Number of live output channels.
    pub depth: usize,
    /// Rewinds the writer and the reader. Stored records are kept.
    pub reset: bool,
}

/// Parameter memory with its writer and cyclic reader.
///
/// Every accepted write also restarts the reader, since the records it was replaying changed.
#[derive(Debug)]
pub struct ParamStore {
    memory: Memory<ParamBlob>,
    writer: Fsm<ParamWriter>,
    reader: Fsm<ParamReader>,
    repeats: usize,
}

impl Default for ParamStore {
    fn default() -> Self { Self::new(SYS_ARRAY_HEIGHT) }
}

impl ParamStore {
    /// Creates a store whose reader emits each channel `repeats` times.
    pub fn new(repeats: usize) -> Self {
        Self {
            memory: Memory::new(MAX_CHANNEL_DEPTH),
            writer: Fsm::default(),
            reader: Fsm::default(),
            repeats,
        }
    }

    /// Returns the record at `addr`, bypassing the read port.
    pub fn peek(&self, addr: usize) -> PostProcessParams { PostProcessParams::from_blob(*self.memory.peek(addr)) }

    /// Returns the parameter memory.
    pub fn memory(&self) -> &Memory<ParamBlob> { &self.memory }

    fn writer_ingress(&self, i_fwd: &ParamStoreIngress) -> ParamWriterIngress {
        ParamWriterIngress { input: i_fwd.write, reset: i_fwd.reset }
    }

    fn reader_ingress(&self, i_fwd: &ParamStoreIngress) -> ParamReaderIngress {
        let ready = self.writer.bwd(&self.writer_ingress(i_fwd), &());
        let written = VrChannel::new(i_fwd.write, ready).fire();

        ParamReaderIngress {
            depth: i_fwd.depth,
            repeats: self.repeats,
            reset: i_fwd.reset || written,
            mem_data: *self.memory.read_data(),
        }
    }
}

impl Module for ParamStore {
    type EgressBwd = Ready;
    type EgressFwd = Valid<PostProcessParams>;
    type IngressBwd = Ready;
    type IngressFwd = ParamStoreIngress;

    fn fwd(&self, i_fwd: &ParamStoreIngress) -> Valid<PostProcessParams> {
        self.reader.fwd(&self.reader_ingress(i_fwd))
    }

    fn bwd(&self, i_fwd: &ParamStoreIngress, _: &Ready) -> Ready { self.writer.bwd(&self.writer_ingress(i_fwd), &()) }

    fn clock(&mut self, i_fwd: &ParamStoreIngress, o_bwd: &Ready) {
        let writer_ingress = self.writer_ingress(i_fwd);
        let reader_ingress = self.reader_ingress(i_fwd);

        let write = self.writer.fwd(&writer_ingress);
        let read = self.reader.bwd(&reader_ingress, o_bwd);

        if let Some((addr, _)) = write.as_option() {
            debug!("param store: write channel {}, reader restarted", addr);
        }

        self.memory.clock(&write, &read);
        self.writer.clock(&writer_ingress, &());
        self.reader.clock(&reader_ingress, o_bwd);
    }
}

#[cfg(test)]
mod tests {
    use cfuflow_std::testbench::{Sink, Source};
    use pretty_assertions::assert_eq;

    use super::*;

    /// Record tagging channel `channel`.
    fn record(channel: usize) -> PostProcessParams { PostProcessParams::new(channel as i16, 1 << 30, 0) }

    fn load(sim: &mut Simulator<ParamStore>, channels: usize) {
        for channel in 0..channels {
            let ingress = ParamStoreIngress { write: Valid::valid(record(channel)), ..Default::default() };
            let (_, ready) = sim.step(&ingress, &Ready::new(false));
            assert!(ready.ready);
        }
    }

    /// Collects the channels of the first `count` elements read by an always ready consumer.
    fn read(sim: &mut Simulator<ParamStore>, depth: usize, count: usize) -> Vec<i16> {
        let ingress = ParamStoreIngress { depth, ..Default::default() };
        let mut channels = Vec::new();
        while channels.len() < count {
            if let Some(params) = sim.step(&ingress, &Ready::new(true)).0.into_option() {
                channels.push(params.bias);
            }
        }
        channels
    }

    #[test]
    fn cycles_through_channels_with_repeats() {
        let mut sim = Simulator::new(ParamStore::new(2));
        load(&mut sim, 3);

        assert_eq!(read(&mut sim, 3, 12), vec![0, 0, 1, 1, 2, 2, 0, 0, 1, 1, 2, 2]);
    }

    #[test]
    fn replays_under_random_backpressure() {
        for seed in 0..6 {
            let depth = 1 + seed as usize;
            let mut sim = Simulator::new(ParamStore::new(SYS_ARRAY_HEIGHT));
            load(&mut sim, depth);

            let ingress = ParamStoreIngress { depth, ..Default::default() };
            let mut sink = Sink::new(0.4, seed);
            while sink.received().len() < 3 * depth * SYS_ARRAY_HEIGHT {
                let bwd = sink.bwd();
                let (params, _) = sim.step(&ingress, &bwd);
                sink.clock(&params, &bwd);
                assert!(sim.cycle() < 10_000);
            }

            let channels = sink.take().into_iter().map(|params| params.bias as usize).collect::<Vec<_>>();
            let expected = (0..3).flat_map(|_| (0..depth).flat_map(|channel| [channel; SYS_ARRAY_HEIGHT])).collect::<Vec<_>>();
            assert_eq!(channels, expected, "seed {}", seed);
        }
    }

    #[test]
    fn stores_write_stream_with_random_gaps() {
        for seed in 0..4 {
            let mut sim = Simulator::new(ParamStore::default());
            let mut source = Source::new((0..40).map(record), 0.5, seed);

            while !source.is_done() {
                let ingress = ParamStoreIngress { write: source.fwd(), depth: 40, reset: false };
                let (_, ready) = sim.step(&ingress, &Ready::new(true));
                source.clock(&ready);
                assert!(sim.cycle() < 10_000);
            }

            for channel in 0..40 {
                assert_eq!(sim.module().peek(channel), record(channel), "seed {}", seed);
            }
        }
    }

    #[test]
    fn first_element_follows_reset_by_two_ticks() {
        let mut sim = Simulator::new(ParamStore::default());
        load(&mut sim, 1);

        let reset = ParamStoreIngress { depth: 1, reset: true, ..Default::default() };
        let idle = ParamStoreIngress { depth: 1, ..Default::default() };

        let (_, ready) = sim.step(&reset, &Ready::new(true));
        assert!(!ready.ready);
        assert!(!sim.step(&idle, &Ready::new(true)).0.valid);
        assert_eq!(sim.step(&idle, &Ready::new(true)).0.into_option(), Some(record(0)));
    }

    #[test]
    fn write_restarts_reader_and_rewinds_on_reset() {
        let mut sim = Simulator::new(ParamStore::new(1));
        load(&mut sim, 3);
        assert_eq!(read(&mut sim, 3, 2), vec![0, 1]);

        // Rewrite from address 0 after a reset; the reader restarts at channel 0.
        let _ = sim.step(&ParamStoreIngress { reset: true, ..Default::default() }, &Ready::new(false));
        let ingress = ParamStoreIngress { write: Valid::valid(record(7)), depth: 3, ..Default::default() };
        let _ = sim.step(&ingress, &Ready::new(true));

        assert_eq!(sim.module().peek(0), record(7));
        assert_eq!(sim.module().peek(1), record(1));
        assert_eq!(read(&mut sim, 3, 4), vec![7, 1, 2, 7]);
    }

    #[test]
    fn read_port_is_not_transparent() {
        let mut memory = Memory::<ParamBlob>::new(MAX_CHANNEL_DEPTH);
        let old = record(1).into_blob();
        let new = record(2).into_blob();
        memory.clock(&Valid::valid((4, old)), &Valid::invalid());

        memory.clock(&Valid::valid((4, new)), &Valid::valid(4));
        assert_eq!(PostProcessParams::from_blob(*memory.read_data()), record(1));

        memory.clock(&Valid::invalid(), &Valid::valid(4));
        assert_eq!(PostProcessParams::from_blob(*memory.read_data()), record(2));
    }

    #[test]
    fn writer_wraps_at_capacity() {
        let writer = ParamWriter;
        let ingress = ParamWriterIngress { input: Valid::valid(record(0)), reset: false };
        let (write, ready, next) = writer.logic(&ingress, &(), &WrapCounter::new(MAX_CHANNEL_DEPTH - 1));
        assert!(ready.ready);
        assert_eq!(write.inner.0, MAX_CHANNEL_DEPTH - 1);
        assert_eq!(next, WrapCounter::new(0));
    }
}
