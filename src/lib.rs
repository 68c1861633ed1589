//! Neuroevolver - Resumable evolutionary search over spiking networks.
//!
//! Each generation samples a population of network configs, simulates every
//! one of them under a stimulation protocol, scores the recorded activity
//! and keeps the best fraction as parents of the next generation. All state
//! lives in a project directory, so an interrupted run picks up where it
//! stopped.
//!
//! # Architecture
//!
//! - `schema`: Configuration types for networks, runs and the built-in
//!   experiment
//! - `compute`: Neuron dynamics, stimulation protocols and the evolutionary
//!   pipeline
//! - `recording`: Streaming activity records
//!
//! # Example
//!
//! ```rust,no_run
//! use neuroevolver::{
//!     compute::evolution::{AssociationPlugin, Evolver},
//!     schema::{AssociationConfig, EvolverConfig},
//! };
//!
//! let plugin = AssociationPlugin::new(AssociationConfig::default());
//! let evolver = Evolver::new(EvolverConfig::default(), plugin)?;
//!
//! let summaries = evolver.run(|_| {})?;
//! println!("Ran {} generations", summaries.len());
//! # Ok::<(), neuroevolver::compute::evolution::EvolutionError>(())
//! ```

pub mod compute;
pub mod recording;
pub mod schema;

// Re-export commonly used types
pub use compute::evolution::{AssociationPlugin, EvolutionError, Evolver, GenerationSummary};
pub use schema::{AssociationConfig, EvolverConfig, NetworkConfig};
