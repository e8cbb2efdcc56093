//! Driver sequencing the accelerator core through reset, load and compute passes.

use cfuflow::*;
use cfuflow_std::testbench::Sink;
use cfuflow_std::*;
use log::{debug, info};
use thiserror::Error;

use crate::accelerator::{AcceleratorCore, CoreIngress, CoreIngressReady};
use crate::config::{ConfigError, CoreConfig};
use crate::filter_store::FilterValues;
use crate::sysarray::{Activations, ComputeArray, SystolicArray};
use crate::types::{FilterWriteCommand, PostProcessParams};

/// Ticks spent waiting for the core before giving up.
pub const MAX_WAIT_CYCLES: u64 = 100_000;

#[allow(missing_docs)]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("pass of {len} words does not match num_filter_words {expected}")]
    PassLength { len: usize, expected: usize },

    #[error("timed out after {cycles} cycles waiting for {what}")]
    Timeout { what: &'static str, cycles: u64 },
}

/// Drives an accelerator core, collecting its output words with random backpressure.
#[derive(Debug)]
pub struct Session<A: ComputeArray = Fsm<SystolicArray>> {
    sim: Simulator<AcceleratorCore<A>>,
    config: CoreConfig,
    half: bool,
    sink: Sink<u32>,
}

impl Session {
    /// Creates a session around the behavioral systolic array.
    ///
    /// The output consumer is ready with probability `ready_probability` on each cycle.
    pub fn new(config: CoreConfig, ready_probability: f64, seed: u64) -> Result<Self, SessionError> {
        Self::with_core(AcceleratorCore::default(), config, ready_probability, seed)
    }
}

impl<A: ComputeArray> Session<A> {
    /// Creates a session around `core`.
    pub fn with_core(
        core: AcceleratorCore<A>, config: CoreConfig, ready_probability: f64, seed: u64,
    ) -> Result<Self, SessionError> {
        Ok(Self {
            sim: Simulator::new(core),
            config: config.validated()?,
            half: false,
            sink: Sink::new(ready_probability, seed),
        })
    }

    /// Returns the simulated core.
    pub fn core(&self) -> &AcceleratorCore<A> { self.sim.module() }

    /// Returns the configuration.
    pub fn config(&self) -> &CoreConfig { &self.config }

    /// Number of ticks so far.
    pub fn cycle(&self) -> u64 { self.sim.cycle() }

    /// Ingress with only the configuration and the sticky half flag driven.
    pub fn idle(&self) -> CoreIngress { CoreIngress { half: self.half, config: self.config, ..Default::default() } }

    /// Evaluates one tick.
    pub fn tick(&mut self, ingress: &CoreIngress) -> CoreIngressReady {
        let bwd = self.sink.bwd();
        let (word, ready) = self.sim.step(ingress, &bwd);
        self.sink.clock(&word, &bwd);
        ready
    }

    /// Resets sequencing.
    pub fn reset(&mut self) {
        debug!("session: reset at cycle {}", self.cycle());
        let _ = self.tick(&CoreIngress { reset: true, ..self.idle() });
    }

    /// Writes `words` to filter store `store` from address 0.
    pub fn load_filters(&mut self, store: usize, words: &[u32]) -> Result<(), SessionError> {
        for (addr, data) in words.iter().enumerate() {
            let ingress = CoreIngress { filter_write: Valid::valid(FilterWriteCommand::new(store, addr, *data)), ..self.idle() };
            self.tick_until("filter write", |session| session.tick(&ingress).filter_write.ready)?;
        }
        Ok(())
    }

    /// Writes `params` to the parameter memory from address 0.
    ///
    /// The parameter writer appends; call [`Session::reset`] first to start over at address 0.
    pub fn load_params(&mut self, params: &[PostProcessParams]) -> Result<(), SessionError> {
        for record in params {
            let ingress = CoreIngress { param_write: Valid::valid(*record), ..self.idle() };
            self.tick_until("parameter write", |session| session.tick(&ingress).param_write.ready)?;
        }
        Ok(())
    }

    /// Runs one pass of the systolic array, `activations[w]` meeting filter word `w`.
    ///
    /// Waits first for the core to be ready for a pass, that is for the previous pass's bank to be
    /// accepted. `half` stays in effect until the next pass.
    pub fn run_pass(&mut self, activations: &[Activations], half: bool) -> Result<(), SessionError> {
        let len = self.config.num_filter_words;
        if activations.len() != len || len == 0 {
            return Err(SessionError::PassLength { len: activations.len(), expected: len });
        }

        self.tick_until("compute array", |session| session.tick(&session.idle()).pass.ready)?;

        self.half = half;
        debug!("session: pass of {} words at cycle {}, half {}", len, self.cycle(), half);

        // Start tick, then the address latch tick.
        let _ = self.tick(&CoreIngress { filter_start: true, ..self.idle() });
        let _ = self.tick(&self.idle());

        for (w, activations) in activations.iter().enumerate() {
            let ingress = CoreIngress { activations: *activations, first: w == 0, last: w == len - 1, ..self.idle() };
            let _ = self.tick(&ingress);
        }
        Ok(())
    }

    /// Ticks until `count` output words have been received in total, then takes them.
    pub fn drain(&mut self, count: usize) -> Result<Vec<u32>, SessionError> {
        self.tick_until("output words", |session| {
            if session.sink.received().len() >= count {
                return true;
            }
            let _ = session.tick(&session.idle());
            false
        })?;

        info!("session: {} words received by cycle {}", count, self.cycle());
        Ok(self.sink.take())
    }

    fn tick_until<F: FnMut(&mut Self) -> bool>(&mut self, what: &'static str, mut done: F) -> Result<(), SessionError> {
        for _ in 0..MAX_WAIT_CYCLES {
            if done(self) {
                return Ok(());
            }
        }
        Err(SessionError::Timeout { what, cycles: MAX_WAIT_CYCLES })
    }
}

/// Filter words of one store, as loaded by [`Session::load_filters`], from the per-cycle words.
pub fn filter_column(filters: &[FilterValues], store: usize) -> Vec<u32> { filters.iter().map(|words| words[store]).collect() }
