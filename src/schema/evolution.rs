//! Evolution run configuration.
//!
//! One immutable [`EvolverConfig`] drives the whole run: where artifacts live,
//! how large each generation is, how winners are selected and how offspring
//! are bred. It is handed to every component at construction.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// File name of the per-species config artifact (the durability marker).
pub const CONFIG_FILENAME: &str = "config.json";
/// File name of the per-species activity record.
pub const ACTIVITY_FILENAME: &str = "activity.csv";
/// File name of the per-generation ranking.
pub const HALL_OF_FAME_FILENAME: &str = "hall_of_fame.csv";
/// File name of the per-generation breeding pool.
pub const WINNERS_FILENAME: &str = "winners.csv";
/// Suffix of in-flight artifacts that have not been committed yet.
pub const PARTIAL_SUFFIX: &str = ".partial";

/// Top-level configuration for an evolutionary run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolverConfig {
    /// Root directory under which projects are stored.
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
    /// Project name; artifacts go to `results_dir/project_name`.
    pub project_name: String,
    /// Number of generations to run.
    #[serde(default = "default_num_generations")]
    pub num_generations: usize,
    /// Number of species per generation.
    #[serde(default = "default_population_size")]
    pub population_size: usize,
    /// Simulation time step in seconds.
    #[serde(default = "default_time_step")]
    pub time_step: f64,
    /// Fraction of each generation kept as winners.
    #[serde(default = "default_selection_fraction")]
    pub selection_fraction: f64,
    /// Recombination settings.
    #[serde(default)]
    pub genetics: GeneticsConfig,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
    /// Run the species of a generation on the rayon pool.
    #[serde(default)]
    pub parallel: bool,
}

impl Default for EvolverConfig {
    fn default() -> Self {
        Self {
            results_dir: default_results_dir(),
            project_name: "association".to_string(),
            num_generations: default_num_generations(),
            population_size: default_population_size(),
            time_step: default_time_step(),
            selection_fraction: default_selection_fraction(),
            genetics: GeneticsConfig::default(),
            random_seed: None,
            parallel: false,
        }
    }
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("experiment_results")
}
fn default_num_generations() -> usize {
    10
}
fn default_population_size() -> usize {
    1000
}
fn default_time_step() -> f64 {
    0.0005
}
fn default_selection_fraction() -> f64 {
    0.1
}

impl EvolverConfig {
    /// Directory holding every generation of this project.
    pub fn project_dir(&self) -> PathBuf {
        self.results_dir.join(&self.project_name)
    }

    /// Number of winners kept per generation: `floor(population_size * fraction)`.
    pub fn winner_count(&self) -> usize {
        (self.population_size as f64 * self.selection_fraction).floor() as usize
    }
}

/// Crossover and mutation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneticsConfig {
    /// Crossover policy.
    #[serde(default)]
    pub crossover: CrossoverMethod,
    /// Mutation policy.
    #[serde(default)]
    pub mutation: MutationMethod,
    /// Per-gene mutation probability, in [0, 1).
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
}

impl Default for GeneticsConfig {
    fn default() -> Self {
        Self {
            crossover: CrossoverMethod::default(),
            mutation: MutationMethod::default(),
            mutation_rate: default_mutation_rate(),
        }
    }
}

fn default_mutation_rate() -> f64 {
    0.05
}

/// How two parent chromosomes exchange genes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "method")]
pub enum CrossoverMethod {
    /// Swap the tails after one random cut point.
    #[default]
    SinglePoint,
    /// Swap the segment between two random cut points.
    TwoPoint,
    /// Swap each gene independently with probability 0.5.
    Uniform,
}

/// How a chromosome's genes are perturbed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum MutationMethod {
    /// Multiply by `exp(N(0, strength))`. Keeps sign and scale, which suits
    /// parameters spanning many orders of magnitude.
    LogNormal {
        #[serde(default = "default_mutation_strength")]
        strength: f64,
    },
    /// Add `N(0, strength)`.
    Gaussian {
        #[serde(default = "default_mutation_strength")]
        strength: f64,
    },
}

impl Default for MutationMethod {
    fn default() -> Self {
        Self::LogNormal {
            strength: default_mutation_strength(),
        }
    }
}

impl MutationMethod {
    /// Noise standard deviation.
    pub fn strength(&self) -> f64 {
        match self {
            Self::LogNormal { strength } | Self::Gaussian { strength } => *strength,
        }
    }
}

fn default_mutation_strength() -> f64 {
    0.1
}

// ============================================================================
// Validation
// ============================================================================

/// Evolution configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum EvolverConfigError {
    #[error("Project name must not be empty")]
    EmptyProjectName,
    #[error("Population size must be at least 1")]
    PopulationTooSmall,
    #[error("Number of generations must be at least 1")]
    NoGenerations,
    #[error("Time step must be positive and finite, got {0}")]
    InvalidTimeStep(f64),
    #[error("Selection fraction must be in (0, 1], got {0}")]
    InvalidFraction(f64),
    #[error("Selection keeps no winners ({population} species x {fraction})")]
    NoWinners { population: usize, fraction: f64 },
    #[error("Mutation rate must be in [0, 1), got {0}")]
    InvalidMutationRate(f64),
    #[error("Mutation strength must be non-negative and finite, got {0}")]
    InvalidMutationStrength(f64),
}

impl EvolverConfig {
    /// Validate the run configuration.
    pub fn validate(&self) -> Result<(), EvolverConfigError> {
        if self.project_name.trim().is_empty() {
            return Err(EvolverConfigError::EmptyProjectName);
        }
        if self.population_size == 0 {
            return Err(EvolverConfigError::PopulationTooSmall);
        }
        if self.num_generations == 0 {
            return Err(EvolverConfigError::NoGenerations);
        }
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(EvolverConfigError::InvalidTimeStep(self.time_step));
        }
        if !(self.selection_fraction > 0.0 && self.selection_fraction <= 1.0) {
            return Err(EvolverConfigError::InvalidFraction(self.selection_fraction));
        }
        if self.winner_count() == 0 {
            return Err(EvolverConfigError::NoWinners {
                population: self.population_size,
                fraction: self.selection_fraction,
            });
        }
        let rate = self.genetics.mutation_rate;
        // A rate of 1 would rule out offspring identical to the crossover child.
        if !(0.0..1.0).contains(&rate) {
            return Err(EvolverConfigError::InvalidMutationRate(rate));
        }
        let strength = self.genetics.mutation.strength();
        if !(strength.is_finite() && strength >= 0.0) {
            return Err(EvolverConfigError::InvalidMutationStrength(strength));
        }
        Ok(())
    }
}
