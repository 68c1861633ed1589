//! Error taxonomy for the evolutionary pipeline.

use std::io;
use std::path::PathBuf;

use crate::recording::RecordError;
use crate::schema::{ConfigError, EvolverConfigError};

/// Errors raised while running, evaluating or breeding a generation.
#[derive(Debug, thiserror::Error)]
pub enum EvolutionError {
    /// A required artifact (hall of fame, winners) is absent.
    #[error("Required artifact missing: {}", .0.display())]
    ArtifactMissing(PathBuf),
    /// A winner's archived config is absent.
    #[error("Config of generation {generation}, species {species} not found")]
    ConfigNotFound { generation: usize, species: usize },
    /// Chromosomes or layouts cannot be combined.
    #[error("Chromosome encoding mismatch: {0}")]
    EncodingMismatch(String),
    /// An activity record is missing or corrupt for an existing species.
    #[error("Activity record {} unreadable: {reason}", path.display())]
    RecordUnreadable { path: PathBuf, reason: String },
    /// Selection produced no breeding candidates.
    #[error("Generation {generation} has no winners to breed from")]
    EmptyWinnerSet { generation: usize },
    /// The fitness function returned NaN or infinity.
    #[error("Species {species} received non-finite score {score}")]
    InvalidScore { species: usize, score: f64 },
    /// A simulation could not be carried out.
    #[error("Simulation failed: {0}")]
    Simulation(String),
    #[error("Invalid network config: {0}")]
    InvalidNetwork(#[from] ConfigError),
    #[error("Invalid evolution config: {0}")]
    InvalidConfig(#[from] EvolverConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl EvolutionError {
    /// Wrap a recording failure for the record at `path`.
    pub fn unreadable(path: impl Into<PathBuf>, err: RecordError) -> Self {
        Self::RecordUnreadable {
            path: path.into(),
            reason: err.to_string(),
        }
    }
}

impl From<RecordError> for EvolutionError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::Io(e) => Self::Io(e),
            RecordError::Csv(e) => Self::Csv(e),
            other => Self::Simulation(other.to_string()),
        }
    }
}

/// Result alias for evolution operations.
pub type Result<T> = std::result::Result<T, EvolutionError>;
