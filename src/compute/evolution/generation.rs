//! Generation orchestration and the multi-generation driver.
//!
//! A generation visits every species index, skipping the ones whose config
//! marker already exists, then always re-evaluates and re-selects from what
//! is on disk. Running the same generation twice is therefore a no-op apart
//! from rewriting identical score tables, and an interrupted run resumes
//! where it stopped.

use log::{info, warn};
use rayon::prelude::*;

use crate::schema::{EvolverConfig, NetworkConfig};

use super::archive::{ProjectArchive, ScoreEntry};
use super::error::Result;
use super::fitness::FitnessEvaluator;
use super::plugin::EvolutionPlugin;
use super::runner::{SpeciesOutcome, SpeciesRunner};
use super::sampler::{ConfigSampler, species_seed};
use super::selection::{WinnerSelector, WinnerSet};

/// What one call to [`GenerationManager::run_generation`] did.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSummary {
    pub generation: usize,
    /// Species simulated during this call.
    pub computed: usize,
    /// Species found complete and skipped.
    pub skipped: usize,
    /// Species in the hall of fame.
    pub evaluated: usize,
    pub best: Option<ScoreEntry>,
    pub mean: Option<f64>,
    /// Winner species indices, best first.
    pub winners: Vec<usize>,
}

/// Runs single generations of one project.
pub struct GenerationManager<'a, P: EvolutionPlugin> {
    config: &'a EvolverConfig,
    plugin: &'a P,
    archive: ProjectArchive,
    run_seed: u64,
}

impl<'a, P: EvolutionPlugin> GenerationManager<'a, P> {
    /// Validate `config` and bind the manager to its project directory.
    pub fn new(config: &'a EvolverConfig, plugin: &'a P, run_seed: u64) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            plugin,
            archive: ProjectArchive::new(config),
            run_seed,
        })
    }

    pub fn archive(&self) -> &ProjectArchive {
        &self.archive
    }

    /// Bring generation `generation` to completion.
    ///
    /// Generations above 0 breed from the winners of the previous one,
    /// which must already exist.
    pub fn run_generation(&self, generation: usize) -> Result<GenerationSummary> {
        let population = self.config.population_size;
        let mut pending = Vec::new();
        for species in 0..population {
            if self.archive.has_species(generation, species) {
                info!(
                    "Generation {} species {} exists, skipped",
                    generation, species
                );
            } else {
                pending.push(species);
            }
        }
        let skipped = population - pending.len();

        let configs = self.sample_configs(generation, &pending)?;
        let outcomes = self.run_species(generation, &configs)?;
        for outcome in &outcomes {
            info!(
                "Generation {} species {}: simulated {} steps",
                outcome.generation, outcome.species, outcome.rows
            );
        }

        let hall = FitnessEvaluator::new(&self.archive, self.plugin)
            .with_parallel(self.config.parallel)
            .evaluate(generation)?;
        let winners = WinnerSelector::new(&self.archive, population)
            .select(generation, self.config.selection_fraction)?;

        Ok(GenerationSummary {
            generation,
            computed: outcomes.len(),
            skipped,
            evaluated: hall.len(),
            best: hall.best(),
            mean: hall.mean(),
            winners: winners.species_indices(),
        })
    }

    /// Draw the config of every pending species, in index order.
    ///
    /// Each species samples from its own seeded stream, so the result does
    /// not depend on which other species were still pending.
    fn sample_configs(
        &self,
        generation: usize,
        pending: &[usize],
    ) -> Result<Vec<(usize, NetworkConfig)>> {
        if pending.is_empty() {
            return Ok(Vec::new());
        }
        let winners = match generation {
            0 => None,
            g => Some(WinnerSet::load(&self.archive, g - 1)?),
        };

        let mut configs = Vec::with_capacity(pending.len());
        for &species in pending {
            let mut sampler = ConfigSampler::new(
                &self.archive,
                self.config.genetics.clone(),
                species_seed(self.run_seed, generation, species),
            );
            let config = match &winners {
                None => sampler.sample_initial(self.plugin),
                Some(winners) => sampler.sample_from_winners(winners)?,
            };
            configs.push((species, config));
        }
        Ok(configs)
    }

    /// Simulate and commit the sampled species.
    ///
    /// In parallel mode every species is attempted and the first failure in
    /// index order is reported. Species that completed stay committed.
    fn run_species(
        &self,
        generation: usize,
        configs: &[(usize, NetworkConfig)],
    ) -> Result<Vec<SpeciesOutcome>> {
        let runner = SpeciesRunner::new(self.plugin, self.config.time_step);
        let run_one = |(species, config): &(usize, NetworkConfig)| {
            let result = runner.run_species(&self.archive, generation, *species, config);
            if let Err(e) = &result {
                warn!("Generation {} species {} failed: {}", generation, species, e);
            }
            result
        };

        if self.config.parallel {
            let results: Vec<Result<SpeciesOutcome>> = configs.par_iter().map(run_one).collect();
            results.into_iter().collect()
        } else {
            configs.iter().map(run_one).collect()
        }
    }
}

/// Runs every generation of a project in order.
pub struct Evolver<P: EvolutionPlugin> {
    config: EvolverConfig,
    plugin: P,
    run_seed: u64,
}

impl<P: EvolutionPlugin> Evolver<P> {
    /// Create a driver; a missing `random_seed` is drawn at random.
    pub fn new(config: EvolverConfig, plugin: P) -> Result<Self> {
        config.validate()?;
        let run_seed = config.random_seed.unwrap_or_else(rand::random);
        if config.random_seed.is_none() {
            info!("No random seed configured, using {}", run_seed);
        }
        Ok(Self {
            config,
            plugin,
            run_seed,
        })
    }

    pub fn config(&self) -> &EvolverConfig {
        &self.config
    }

    pub fn plugin(&self) -> &P {
        &self.plugin
    }

    /// Run generations `0..num_generations`, resuming from existing
    /// artifacts, and report each finished generation to `callback`.
    pub fn run<F>(&self, mut callback: F) -> Result<Vec<GenerationSummary>>
    where
        F: FnMut(&GenerationSummary),
    {
        let manager = GenerationManager::new(&self.config, &self.plugin, self.run_seed)?;
        info!(
            "Project {} at {}: {} generation(s) of {} species",
            self.config.project_name,
            manager.archive().root().display(),
            self.config.num_generations,
            self.config.population_size
        );

        let mut summaries = Vec::with_capacity(self.config.num_generations);
        for generation in 0..self.config.num_generations {
            let summary = manager.run_generation(generation)?;
            callback(&summary);
            summaries.push(summary);
        }
        Ok(summaries)
    }
}
