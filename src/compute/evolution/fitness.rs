//! Scoring of a finished generation.

use log::{debug, info};
use rayon::prelude::*;

use crate::recording::ActivityRecord;

use super::archive::{ProjectArchive, ScoreEntry};
use super::error::{EvolutionError, Result};
use super::plugin::EvolutionPlugin;

/// Per-generation scoreboard, one entry per evaluated species in index order.
#[derive(Debug, Clone, PartialEq)]
pub struct HallOfFame {
    pub generation: usize,
    pub entries: Vec<ScoreEntry>,
}

impl HallOfFame {
    /// Load a previously written hall of fame.
    pub fn load(archive: &ProjectArchive, generation: usize) -> Result<Self> {
        let entries = archive.read_scores(&archive.hall_of_fame_path(generation))?;
        Ok(Self {
            generation,
            entries,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest-scoring entry; ties go to the lower species index.
    pub fn best(&self) -> Option<ScoreEntry> {
        self.entries.iter().copied().reduce(|best, e| {
            if e.score > best.score { e } else { best }
        })
    }

    /// Mean score, `None` when empty.
    pub fn mean(&self) -> Option<f64> {
        if self.entries.is_empty() {
            None
        } else {
            let sum: f64 = self.entries.iter().map(|e| e.score).sum();
            Some(sum / self.entries.len() as f64)
        }
    }
}

/// Turns a generation's activity records into a [`HallOfFame`].
pub struct FitnessEvaluator<'a, P: EvolutionPlugin> {
    archive: &'a ProjectArchive,
    plugin: &'a P,
    parallel: bool,
}

impl<'a, P: EvolutionPlugin> FitnessEvaluator<'a, P> {
    pub fn new(archive: &'a ProjectArchive, plugin: &'a P) -> Self {
        Self {
            archive,
            plugin,
            parallel: false,
        }
    }

    /// Read and score records on the rayon pool.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Score every species directory present under `generation`.
    ///
    /// Always rebuilds the table from the records on disk and overwrites
    /// `hall_of_fame.csv`. A species directory without a readable record
    /// fails the whole evaluation.
    pub fn evaluate(&self, generation: usize) -> Result<HallOfFame> {
        let indices = self.archive.species_indices(generation)?;

        let entries: Vec<ScoreEntry> = if self.parallel {
            indices
                .par_iter()
                .map(|&idx| self.score_species(generation, idx))
                .collect::<Result<_>>()?
        } else {
            indices
                .iter()
                .map(|&idx| self.score_species(generation, idx))
                .collect::<Result<_>>()?
        };

        for entry in &entries {
            debug!(
                "Generation {} species {}: score {}",
                generation, entry.species_idx, entry.score
            );
        }

        self.archive
            .write_scores(&self.archive.hall_of_fame_path(generation), &entries)?;

        let hall = HallOfFame {
            generation,
            entries,
        };
        if let (Some(best), Some(mean)) = (hall.best(), hall.mean()) {
            info!(
                "Generation {}: evaluated {} species, best {:.4} (species {}), mean {:.4}",
                generation,
                hall.len(),
                best.score,
                best.species_idx,
                mean
            );
        }
        Ok(hall)
    }

    fn score_species(&self, generation: usize, species: usize) -> Result<ScoreEntry> {
        let path = self.archive.activity_path(generation, species);
        let record =
            ActivityRecord::read_from(&path).map_err(|e| EvolutionError::unreadable(&path, e))?;

        let score = self.plugin.score(&record);
        if !score.is_finite() {
            return Err(EvolutionError::InvalidScore { species, score });
        }
        Ok(ScoreEntry {
            species_idx: species,
            score,
        })
    }
}
