//! Config production: fresh samples for generation 0, offspring afterwards.

use log::debug;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::schema::{GeneticsConfig, NetworkConfig};

use super::archive::ProjectArchive;
use super::codec::{Chromosome, EncodedConfig};
use super::error::{EvolutionError, Result};
use super::operators::GeneticOperators;
use super::plugin::EvolutionPlugin;
use super::selection::WinnerSet;

/// Seed of the random stream owned by species `(generation, species)`.
///
/// Mixing the coordinates into the run seed gives every species its own
/// stream, independent of execution order and of which species a resumed
/// run skips.
pub fn species_seed(run_seed: u64, generation: usize, species: usize) -> u64 {
    splitmix64(splitmix64(run_seed ^ splitmix64(generation as u64)) ^ species as u64)
}

fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Produces the config a species will simulate.
pub struct ConfigSampler<'a> {
    archive: &'a ProjectArchive,
    operators: GeneticOperators,
}

impl<'a> ConfigSampler<'a> {
    /// Create a sampler drawing from its own seeded stream.
    pub fn new(archive: &'a ProjectArchive, genetics: GeneticsConfig, seed: u64) -> Self {
        Self {
            archive,
            operators: GeneticOperators::new(genetics, seed),
        }
    }

    /// A fresh random config from the plug-in's sampling policy.
    pub fn sample_initial<P: EvolutionPlugin>(&mut self, plugin: &P) -> NetworkConfig {
        let mut rng = StdRng::seed_from_u64(self.operators.next_seed());
        plugin.sample(&mut rng)
    }

    /// Breed an offspring config from the winners of a previous generation.
    ///
    /// Two parents are drawn uniformly with replacement, so a winner may be
    /// crossed with itself. The offspring keeps the first parent's structure.
    pub fn sample_from_winners(&mut self, winners: &WinnerSet) -> Result<NetworkConfig> {
        let generation = winners.generation;
        let (Some(first), Some(second)) = (
            self.operators.choose(&winners.entries).copied(),
            self.operators.choose(&winners.entries).copied(),
        ) else {
            return Err(EvolutionError::EmptyWinnerSet { generation });
        };

        let parent1 =
            EncodedConfig::from_config(&self.archive.load_config(generation, first.species_idx)?);
        let parent2 =
            EncodedConfig::from_config(&self.archive.load_config(generation, second.species_idx)?);
        parent1.template.ensure_compatible(&parent2.template)?;

        let children = self
            .operators
            .crossover(&parent1.chromosome, &parent2.chromosome)?;
        let mut child = keep_first_child(children);
        let mutated = self.operators.mutate(&mut child);

        debug!(
            "Offspring of generation {} species {} x {} ({} gene(s) mutated)",
            generation, first.species_idx, second.species_idx, mutated
        );

        parent1.with_chromosome(child).to_config()
    }
}

/// Crossover yields two complementary children; only the first is bred on.
fn keep_first_child((first, _second): (Chromosome, Chromosome)) -> Chromosome {
    first
}
