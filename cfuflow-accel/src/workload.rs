//! Random convolution workloads, run through a session and through the reference model.

use rand::Rng;

use crate::config::CoreConfig;
use crate::constants::*;
use crate::filter_store::FilterValues;
use crate::reference;
use crate::session::{filter_column, Session, SessionError};
use crate::sysarray::{Activations, ComputeArray};
use crate::types::PostProcessParams;

/// Data of a sequence of passes sharing one filter and parameter load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workload {
    /// Configuration.
    pub config: CoreConfig,
    /// Filter words, presented in parallel to the columns on each cycle of a pass.
    pub filters: Vec<FilterValues>,
    /// Parameter records, one per output channel.
    pub params: Vec<PostProcessParams>,
    /// Activation words of each pass.
    pub passes: Vec<Vec<Activations>>,
    /// Drain only half of the accumulators.
    pub half: bool,
}

impl Workload {
    /// Creates a workload of `passes` passes with random data.
    pub fn random<R: Rng>(rng: &mut R, config: CoreConfig, passes: usize, half: bool) -> Self {
        let words = config.num_filter_words;

        Self {
            config,
            filters: (0..words).map(|_| rng.gen()).collect(),
            params: (0..config.output_channel_depth)
                .map(|_| PostProcessParams::new(rng.gen_range(-1000..1000), rng.gen_range(1 << 29..i32::MAX), rng.gen_range(6..14)))
                .collect(),
            passes: (0..passes).map(|_| (0..words).map(|_| rng.gen()).collect()).collect(),
            half,
        }
    }

    /// Output words predicted by the reference model.
    pub fn expected(&self) -> Vec<u32> {
        let accs = self
            .passes
            .iter()
            .map(|activations| reference::accumulate(activations, &self.filters, self.config.input_offset))
            .collect::<Vec<_>>();
        let values = accs.iter().flat_map(|acc| reference::drained(acc, self.half));
        let params = reference::param_sequence(&self.params, self.config.output_channel_depth, SYS_ARRAY_HEIGHT);

        reference::pack_words(&reference::quantize(values, params, &self.config))
    }

    /// Number of output words of the whole workload.
    pub fn num_words(&self) -> usize {
        let lanes = if self.half { HALF_LANES } else { ACCUMULATOR_LANES };
        self.passes.len() * lanes / ELEMENTS_PER_WORD
    }

    /// Resets the core, loads the workload, runs every pass and collects the output words.
    pub fn run<A: ComputeArray>(&self, session: &mut Session<A>) -> Result<Vec<u32>, SessionError> {
        session.reset();
        for store in 0..SYS_ARRAY_WIDTH {
            session.load_filters(store, &filter_column(&self.filters, store))?;
        }
        session.load_params(&self.params)?;

        for activations in &self.passes {
            session.run_pass(activations, self.half)?;
        }
        session.drain(self.num_words())
    }
}
