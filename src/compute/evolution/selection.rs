//! Truncation selection of the breeding pool.

use std::cmp::Ordering;

use log::info;

use super::archive::{ProjectArchive, ScoreEntry};
use super::error::{EvolutionError, Result};
use super::fitness::HallOfFame;

/// Top-ranked species of one generation, best first.
#[derive(Debug, Clone, PartialEq)]
pub struct WinnerSet {
    /// Generation the winners belong to.
    pub generation: usize,
    pub entries: Vec<ScoreEntry>,
}

impl WinnerSet {
    /// Load `winners.csv` of a generation.
    pub fn load(archive: &ProjectArchive, generation: usize) -> Result<Self> {
        let entries = archive.read_scores(&archive.winners_path(generation))?;
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

    /// Winner species indices, best first.
    pub fn species_indices(&self) -> Vec<usize> {
        self.entries.iter().map(|e| e.species_idx).collect()
    }
}

/// Descending by score, ascending by species index on ties.
fn rank(a: &ScoreEntry, b: &ScoreEntry) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.species_idx.cmp(&b.species_idx))
}

/// Persists the top fraction of a generation.
pub struct WinnerSelector<'a> {
    archive: &'a ProjectArchive,
    population_size: usize,
}

impl<'a> WinnerSelector<'a> {
    pub fn new(archive: &'a ProjectArchive, population_size: usize) -> Self {
        Self {
            archive,
            population_size,
        }
    }

    /// Rank the stored hall of fame and write `winners.csv`.
    ///
    /// Keeps `floor(population_size * fraction)` entries, or every entry if
    /// fewer species were evaluated.
    pub fn select(&self, generation: usize, fraction: f64) -> Result<WinnerSet> {
        let hall = HallOfFame::load(self.archive, generation)?;
        self.select_from(&hall, fraction)
    }

    /// Like [`Self::select`] but ranks an in-memory hall of fame.
    pub fn select_from(&self, hall: &HallOfFame, fraction: f64) -> Result<WinnerSet> {
        let generation = hall.generation;
        let count = (self.population_size as f64 * fraction).floor() as usize;
        if count == 0 || hall.is_empty() {
            return Err(EvolutionError::EmptyWinnerSet { generation });
        }

        let mut ranked = hall.entries.clone();
        ranked.sort_by(rank);
        ranked.truncate(count);

        self.archive
            .write_scores(&self.archive.winners_path(generation), &ranked)?;

        info!(
            "Generation {}: selected {} winner(s) {:?}",
            generation,
            ranked.len(),
            ranked.iter().map(|e| e.species_idx).collect::<Vec<_>>()
        );

        Ok(WinnerSet {
            generation,
            entries: ranked,
        })
    }
}
