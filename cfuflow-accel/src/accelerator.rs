//! Accelerator core.
//!
//! Sequence of use:
//!
//! 1. Set the configuration.
//! 2. Assert `reset`.
//! 3. Write filter words and post process parameters.
//! 4. Wait for the `pass` ready, pulse `filter_start` on a cycle it is high, then frame the pass
//!    with `first` and `last` while the filter words are valid, two and more cycles after
//!    `filter_start`.
//!
//! Output words then flow without further control.

use cfuflow::*;
use cfuflow_std::*;
use log::{debug, trace, warn};

use crate::accumulator_reader::{AccumulatorReader, AccumulatorReaderIngress};
use crate::config::CoreConfig;
use crate::filter_store::{FilterStore, FilterStoreIngress};
use crate::output_word_assembler::{AssemblerIngress, OutputWordAssembler};
use crate::param_store::{ParamStore, ParamStoreIngress};
use crate::post_process::{PostProcessIngress, PostProcessPipeline};
use crate::sysarray::{Activations, ComputeArray, ComputeIngress, SystolicArray};
use crate::types::{FilterWriteCommand, PostProcessParams};

/// Ingress of the accelerator core.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CoreIngress {
    /// Activation words as read from memory, one per systolic array row.
    pub activations: Activations,
    /// Commands to write to the filter store.
    pub filter_write: Valid<FilterWriteCommand>,
    /// Records to write to the post process parameter memory.
    pub param_write: Valid<PostProcessParams>,
    /// Starts the filter replay at address 0, output beginning on the cycle after next.
    pub filter_start: bool,
    /// Beginning of a pass of the systolic array.
    pub first: bool,
    /// End of a pass of the systolic array.
    pub last: bool,
    /// Only half of the accumulators are drained.
    pub half: bool,
    /// Resets sequencing. Stored filter words and parameters are not affected.
    pub reset: bool,
    /// Configuration.
    pub config: CoreConfig,
}

/// Backward signals of the core's write streams.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CoreIngressReady {
    /// The filter write command is accepted.
    pub filter_write: Ready,
    /// The parameter record is accepted.
    pub param_write: Ready,
    /// A pass may start or complete: the compute array holds no accumulator bank that stays on
    /// offer after this cycle. A `last` on a cycle this is low completes nothing.
    pub pass: Ready,
}

/// Ingress of every component during one cycle.
#[derive(Debug, Clone, Copy)]
struct Forward {
    filter_store: FilterStoreIngress,
    compute: ComputeIngress,
    acc_reader: AccumulatorReaderIngress,
    param_store: ParamStoreIngress,
    post_process: PostProcessIngress,
    assembler: AssemblerIngress,
}

/// Egress backward signals of every component during one cycle.
#[derive(Debug, Clone, Copy)]
struct Backward {
    pass: Ready,
    compute: Ready,
    acc_reader: Ready,
    param_store: Ready,
    post_process: Ready,
    assembler: Ready,
}

/// Core of the accelerator.
///
/// Filter store and systolic array feed the accumulator reader; the accumulator stream and the
/// cyclic parameter stream are joined by the post process pipeline; the output word assembler
/// packs the results into the egress stream.
#[derive(Debug, Default)]
pub struct AcceleratorCore<A: ComputeArray = Fsm<SystolicArray>> {
    filter_store: FilterStore,
    compute: A,
    acc_reader: Fsm<AccumulatorReader>,
    param_store: ParamStore,
    post_process: PostProcessPipeline,
    assembler: Fsm<OutputWordAssembler>,
}

impl<A: ComputeArray> AcceleratorCore<A> {
    /// Creates a core around the compute array `compute`.
    pub fn new(compute: A) -> Self {
        Self {
            filter_store: FilterStore::default(),
            compute,
            acc_reader: Fsm::default(),
            param_store: ParamStore::default(),
            post_process: PostProcessPipeline::default(),
            assembler: Fsm::default(),
        }
    }

    /// Returns the filter store.
    pub fn filter_store(&self) -> &FilterStore { &self.filter_store }

    /// Returns the parameter store.
    pub fn param_store(&self) -> &ParamStore { &self.param_store }

    /// Returns the compute array.
    pub fn compute(&self) -> &A { &self.compute }

    fn forward(&self, i_fwd: &CoreIngress) -> Forward {
        let config = &i_fwd.config;

        let filter_store = FilterStoreIngress {
            write: i_fwd.filter_write,
            size: config.num_filter_words,
            start: i_fwd.filter_start,
            reset: i_fwd.reset,
        };

        let compute = ComputeIngress {
            activations: i_fwd.activations,
            filters: self.filter_store.fwd(&filter_store),
            first: i_fwd.first,
            last: i_fwd.last,
            input_offset: config.input_offset,
            reset: i_fwd.reset,
        };

        let acc_reader =
            AccumulatorReaderIngress { bank: self.compute.fwd(&compute), half: i_fwd.half, reset: i_fwd.reset };

        let param_store =
            ParamStoreIngress { write: i_fwd.param_write, depth: config.output_channel_depth, reset: i_fwd.reset };

        let post_process = PostProcessIngress {
            acc: self.acc_reader.fwd(&acc_reader),
            params: self.param_store.fwd(&param_store),
            offset: config.output_offset,
            activation_min: config.output_activation_min,
            activation_max: config.output_activation_max,
            reset: i_fwd.reset,
        };

        let assembler = AssemblerIngress { input: self.post_process.fwd(&post_process), reset: i_fwd.reset };

        Forward { filter_store, compute, acc_reader, param_store, post_process, assembler }
    }

    fn backward(&self, fwd: &Forward, o_bwd: &Ready) -> Backward {
        let assembler = *o_bwd;
        let post_process = self.assembler.bwd(&fwd.assembler, &assembler);
        let (acc_reader, param_store) = self.post_process.bwd(&fwd.post_process, &post_process);
        let compute = self.acc_reader.bwd(&fwd.acc_reader, &acc_reader);
        let pass = self.compute.bwd(&fwd.compute, &compute);

        Backward { pass, compute, acc_reader, param_store, post_process, assembler }
    }
}

impl<A: ComputeArray> Module for AcceleratorCore<A> {
    type EgressBwd = Ready;
    type EgressFwd = Valid<u32>;
    type IngressBwd = CoreIngressReady;
    type IngressFwd = CoreIngress;

    fn fwd(&self, i_fwd: &CoreIngress) -> Valid<u32> { self.assembler.fwd(&self.forward(i_fwd).assembler) }

    fn bwd(&self, i_fwd: &CoreIngress, o_bwd: &Ready) -> CoreIngressReady {
        let fwd = self.forward(i_fwd);
        let bwd = self.backward(&fwd, o_bwd);

        CoreIngressReady {
            filter_write: self.filter_store.bwd(&fwd.filter_store, &()),
            param_write: self.param_store.bwd(&fwd.param_store, &bwd.param_store),
            pass: bwd.pass,
        }
    }

    fn clock(&mut self, i_fwd: &CoreIngress, o_bwd: &Ready) {
        let fwd = self.forward(i_fwd);
        let bwd = self.backward(&fwd, o_bwd);

        if i_fwd.reset {
            debug!("accelerator core: reset");
        } else if i_fwd.last && fwd.compute.filters.valid && !bwd.pass.ready {
            warn!("accelerator core: pass completed while an accumulator bank was pending, results dropped");
        }
        if let Some(bank) = VrChannel::new(fwd.acc_reader.bank, bwd.compute).transfer() {
            debug!("accelerator core: accumulator bank accepted, half {}", i_fwd.half);
            trace!("accumulators {:?}", bank.map(|lane| lane.value));
        }
        if let Some(word) = VrChannel::new(self.assembler.fwd(&fwd.assembler), *o_bwd).transfer() {
            trace!("accelerator core: output word {:#010x}", word);
        }

        self.filter_store.clock(&fwd.filter_store, &());
        self.compute.clock(&fwd.compute, &bwd.compute);
        self.acc_reader.clock(&fwd.acc_reader, &bwd.acc_reader);
        self.param_store.clock(&fwd.param_store, &bwd.param_store);
        self.post_process.clock(&fwd.post_process, &bwd.post_process);
        self.assembler.clock(&fwd.assembler, &bwd.assembler);
    }
}
