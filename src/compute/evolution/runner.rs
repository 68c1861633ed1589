//! Drives one simulation to completion and records its activity.

use std::fs;
use std::path::Path;

use log::{debug, warn};

use crate::recording::ActivityWriter;
use crate::schema::NetworkConfig;

use super::archive::ProjectArchive;
use super::error::{EvolutionError, Result};
use super::plugin::{EvolutionPlugin, SimulationEngine, StimulationProtocol};

/// Fixed-step simulation clock.
///
/// Time is derived from the step counter rather than accumulated, so long
/// runs do not drift. The clock produces steps at `t = k * time_step` for
/// every `t < max_time`.
#[derive(Debug, Clone)]
pub struct SimulationClock {
    time_step: f64,
    step: u64,
    total_steps: u64,
}

impl SimulationClock {
    /// Create a clock; `time_step` must be positive.
    pub fn new(max_time: f64, time_step: f64) -> Self {
        Self {
            time_step,
            step: 0,
            total_steps: steps_until(max_time, time_step),
        }
    }

    /// Current simulation time.
    #[inline]
    pub fn time(&self) -> f64 {
        self.step as f64 * self.time_step
    }

    /// Steps taken so far.
    #[inline]
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Number of steps until the clock stops.
    #[inline]
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Whether the protocol's end has been reached.
    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.step >= self.total_steps
    }

    /// Move to the next step.
    #[inline]
    pub fn increment(&mut self) {
        self.step += 1;
    }
}

/// Number of steps of size `dt` with start time below `max_time`.
fn steps_until(max_time: f64, dt: f64) -> u64 {
    if !(max_time > 0.0) || !(dt > 0.0) {
        return 0;
    }
    let raw = max_time / dt;
    let nearest = raw.round();
    // Treat ratios within rounding noise of an integer as exact.
    if (raw - nearest).abs() <= 1e-9 * nearest.max(1.0) {
        nearest as u64
    } else {
        raw.ceil() as u64
    }
}

/// Outcome of one finished species.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeciesOutcome {
    pub generation: usize,
    pub species: usize,
    /// Activity rows written.
    pub rows: u64,
}

/// Runs species simulations through a plug-in's engine and protocol.
pub struct SpeciesRunner<'a, P: EvolutionPlugin> {
    plugin: &'a P,
    time_step: f64,
}

impl<'a, P: EvolutionPlugin> SpeciesRunner<'a, P> {
    pub fn new(plugin: &'a P, time_step: f64) -> Self {
        Self { plugin, time_step }
    }

    /// Simulate `config` and stream its activity to `path`.
    ///
    /// Returns the number of rows written.
    pub fn run(&self, config: &NetworkConfig, path: &Path) -> Result<u64> {
        config.validate()?;

        let num_neurons = config.num_neurons;
        let protocol = self
            .plugin
            .build_protocol(num_neurons, &config.anatomy.labels);
        let mut engine = self.plugin.build_engine(config);
        let mut clock = SimulationClock::new(protocol.max_time(), self.time_step);
        let mut writer = ActivityWriter::create(path, num_neurons)?;

        let total = clock.total_steps();
        let report_every = (total / 10).max(1);

        while !clock.is_stopped() {
            let time = clock.time();
            let stimulation = protocol.stimulation_at(time);
            if stimulation.current.len() != num_neurons {
                return Err(EvolutionError::Simulation(format!(
                    "protocol returned {} currents for {} neurons at t={}",
                    stimulation.current.len(),
                    num_neurons,
                    time
                )));
            }

            engine.advance_one_step(&stimulation.current, self.time_step);
            clock.increment();
            writer.write_row(time, &stimulation.condition, engine.firing_state())?;

            if clock.step() % report_every == 0 {
                debug!("  step {}/{} (t={:.4})", clock.step(), total, time);
            }
        }

        Ok(writer.finalize()?)
    }

    /// Compute species `(generation, species)` from `config` and commit it.
    ///
    /// On any failure the partial activity is removed and no config marker
    /// is left behind, so a later resume redoes the species from scratch.
    pub fn run_species(
        &self,
        archive: &ProjectArchive,
        generation: usize,
        species: usize,
        config: &NetworkConfig,
    ) -> Result<SpeciesOutcome> {
        let removed = archive.clear_stale_artifacts(generation, species)?;
        if removed > 0 {
            warn!(
                "Generation {} species {}: removed {} stale artifact(s) from an interrupted run",
                generation, species, removed
            );
        }
        archive.ensure_species_dir(generation, species)?;

        let partial = archive.partial_activity_path(generation, species);
        let result = self
            .run(config, &partial)
            .and_then(|rows| {
                archive.commit_species(generation, species, config)?;
                Ok(rows)
            });

        match result {
            Ok(rows) => Ok(SpeciesOutcome {
                generation,
                species,
                rows,
            }),
            Err(e) => {
                // Best effort: the next resume clears these anyway.
                let _ = fs::remove_file(&partial);
                let _ = archive.clear_stale_artifacts(generation, species);
                Err(e)
            }
        }
    }
}
