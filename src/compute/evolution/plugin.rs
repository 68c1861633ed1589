//! Capability interfaces for the pieces the evolutionary core does not own.
//!
//! The core breeds configs, runs them and ranks the results. Everything
//! experiment-specific (how to draw a fresh config, what stimulation to
//! apply, how to simulate, how to score) is supplied by an
//! [`EvolutionPlugin`].

use rand::rngs::StdRng;

use crate::recording::ActivityRecord;
use crate::schema::NetworkConfig;

/// External stimulation at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct Stimulation {
    /// Condition label written to the activity record.
    pub condition: String,
    /// Injected current per neuron.
    pub current: Vec<f64>,
}

/// Time-varying external input of an experiment.
pub trait StimulationProtocol {
    /// Protocol duration in seconds.
    fn max_time(&self) -> f64;

    /// Condition and current vector at `time`.
    fn stimulation_at(&self, time: f64) -> Stimulation;
}

/// Numerical neuron/network dynamics.
pub trait SimulationEngine {
    /// Advance internal state by `dt` seconds under `external_current`.
    fn advance_one_step(&mut self, external_current: &[f64], dt: f64);

    /// Which neurons fired during the most recent step.
    fn firing_state(&self) -> &[bool];
}

/// Experiment-specific hooks consumed by the evolutionary core.
///
/// Implementations must be shareable across the worker threads that run
/// species in parallel.
pub trait EvolutionPlugin: Sync {
    type Protocol: StimulationProtocol;
    type Engine: SimulationEngine;

    /// Draw a structurally valid config from scratch (generation 0).
    fn sample(&self, rng: &mut StdRng) -> NetworkConfig;

    /// Fitness of a finished activity record; higher is better.
    fn score(&self, activity: &ActivityRecord) -> f64;

    /// Stimulation protocol for a network of the given shape.
    fn build_protocol(&self, num_neurons: usize, labels: &[String]) -> Self::Protocol;

    /// Simulation engine initialised from `config`.
    fn build_engine(&self, config: &NetworkConfig) -> Self::Engine;
}
