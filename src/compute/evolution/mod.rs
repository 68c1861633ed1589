//! Evolutionary search over spiking network configs.
//!
//! # Overview
//!
//! A project evolves a population of network configs generation by
//! generation. Every step leaves its result on disk, and the files are the
//! only state shared between steps:
//!
//! - **Codec** (`codec`): config to flat chromosome and back
//! - **Operators** (`operators`): crossover and mutation
//! - **Sampler** (`sampler`): fresh configs for generation 0, offspring of
//!   the previous winners afterwards
//! - **Runner** (`runner`): simulates one species and commits its artifacts
//! - **Fitness** (`fitness`): scores a generation into a hall of fame
//! - **Selection** (`selection`): keeps the top fraction as winners
//! - **Generation** (`generation`): resumable orchestration of the above
//!
//! Experiment-specific behaviour comes from an [`EvolutionPlugin`]; the
//! built-in one is [`AssociationPlugin`].
//!
//! # Example
//!
//! ```rust,no_run
//! use neuroevolver::compute::evolution::{AssociationPlugin, Evolver};
//! use neuroevolver::schema::EvolverConfig;
//!
//! let config = EvolverConfig {
//!     population_size: 50,
//!     num_generations: 5,
//!     random_seed: Some(1),
//!     ..Default::default()
//! };
//!
//! let evolver = Evolver::new(config, AssociationPlugin::default())?;
//! evolver.run(|summary| {
//!     println!(
//!         "Generation {}: best = {:?}, winners = {:?}",
//!         summary.generation, summary.best, summary.winners
//!     );
//! })?;
//! # Ok::<(), neuroevolver::compute::evolution::EvolutionError>(())
//! ```

mod archive;
mod association;
mod codec;
mod error;
mod fitness;
mod generation;
mod operators;
mod plugin;
mod runner;
mod sampler;
mod selection;

pub use archive::{ProjectArchive, ScoreEntry};
pub use association::AssociationPlugin;
pub use codec::{Chromosome, EncodedConfig, GeneSegment, GenomeTemplate, SegmentKind};
pub use error::{EvolutionError, Result};
pub use fitness::{FitnessEvaluator, HallOfFame};
pub use generation::{Evolver, GenerationManager, GenerationSummary};
pub use operators::GeneticOperators;
pub use plugin::{EvolutionPlugin, SimulationEngine, Stimulation, StimulationProtocol};
pub use runner::{SimulationClock, SpeciesOutcome, SpeciesRunner};
pub use sampler::{ConfigSampler, species_seed};
pub use selection::{WinnerSelector, WinnerSet};
