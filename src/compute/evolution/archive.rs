//! On-disk layout of a project.
//!
//! ```text
//! <results_dir>/<project_name>/
//!   generation_<g>/
//!     hall_of_fame.csv
//!     winners.csv
//!     species_<i>/
//!       config.json      (durability marker, written last)
//!       activity.csv
//! ```
//!
//! Every artifact is first written under a `.partial` name and renamed into
//! place once complete, so a reader never observes a half-written file.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::schema::{
    ACTIVITY_FILENAME, CONFIG_FILENAME, EvolverConfig, HALL_OF_FAME_FILENAME, NetworkConfig,
    PARTIAL_SUFFIX, WINNERS_FILENAME,
};

use super::error::{EvolutionError, Result};

const GENERATION_PREFIX: &str = "generation_";
const SPECIES_PREFIX: &str = "species_";

/// One row of a hall-of-fame or winners table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub species_idx: usize,
    pub score: f64,
}

/// Path resolver and artifact store for one project.
#[derive(Debug, Clone)]
pub struct ProjectArchive {
    root: PathBuf,
}

impl ProjectArchive {
    /// Archive rooted at the configured project directory.
    pub fn new(config: &EvolverConfig) -> Self {
        Self::at(config.project_dir())
    }

    /// Archive rooted at an explicit directory.
    pub fn at<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn generation_dir(&self, generation: usize) -> PathBuf {
        self.root.join(format!("{}{}", GENERATION_PREFIX, generation))
    }

    pub fn species_dir(&self, generation: usize, species: usize) -> PathBuf {
        self.generation_dir(generation)
            .join(format!("{}{}", SPECIES_PREFIX, species))
    }

    pub fn config_path(&self, generation: usize, species: usize) -> PathBuf {
        self.species_dir(generation, species).join(CONFIG_FILENAME)
    }

    pub fn activity_path(&self, generation: usize, species: usize) -> PathBuf {
        self.species_dir(generation, species).join(ACTIVITY_FILENAME)
    }

    /// Where the runner streams activity before the species is committed.
    pub fn partial_activity_path(&self, generation: usize, species: usize) -> PathBuf {
        partial(&self.activity_path(generation, species))
    }

    pub fn hall_of_fame_path(&self, generation: usize) -> PathBuf {
        self.generation_dir(generation).join(HALL_OF_FAME_FILENAME)
    }

    pub fn winners_path(&self, generation: usize) -> PathBuf {
        self.generation_dir(generation).join(WINNERS_FILENAME)
    }

    /// Whether species `(generation, species)` has been fully computed.
    pub fn has_species(&self, generation: usize, species: usize) -> bool {
        self.config_path(generation, species).is_file()
    }

    /// Create the species directory if absent.
    pub fn ensure_species_dir(&self, generation: usize, species: usize) -> io::Result<PathBuf> {
        let dir = self.species_dir(generation, species);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Remove leftovers of an interrupted run from an uncommitted species.
    ///
    /// Does nothing once the config marker exists. Returns the number of
    /// files removed.
    pub fn clear_stale_artifacts(&self, generation: usize, species: usize) -> io::Result<usize> {
        if self.has_species(generation, species) {
            return Ok(0);
        }
        let dir = self.species_dir(generation, species);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e),
        };

        let mut removed = 0;
        for entry in entries {
            let path = entry?.path();
            let is_stale = path.file_name().and_then(|n| n.to_str()).is_some_and(|name| {
                name == ACTIVITY_FILENAME || name.ends_with(PARTIAL_SUFFIX)
            });
            if is_stale && path.is_file() {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Publish a finished species.
    ///
    /// Expects the activity at [`Self::partial_activity_path`]. The activity
    /// is moved into place first and the config marker last, so the marker
    /// only ever exists next to a complete record.
    pub fn commit_species(
        &self,
        generation: usize,
        species: usize,
        config: &NetworkConfig,
    ) -> Result<()> {
        let config_path = self.config_path(generation, species);
        let config_partial = partial(&config_path);
        write_json_synced(&config_partial, config)?;

        fs::rename(
            self.partial_activity_path(generation, species),
            self.activity_path(generation, species),
        )?;
        fs::rename(&config_partial, &config_path)?;
        Ok(())
    }

    /// Load the archived config of a species.
    pub fn load_config(&self, generation: usize, species: usize) -> Result<NetworkConfig> {
        let path = self.config_path(generation, species);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(EvolutionError::ConfigNotFound {
                    generation,
                    species,
                });
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&content)?)
    }

    /// Indices of all species directories present under a generation,
    /// ascending. Entries not named `species_<n>` are ignored.
    pub fn species_indices(&self, generation: usize) -> Result<Vec<usize>> {
        let dir = self.generation_dir(generation);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut indices = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(idx) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.strip_prefix(SPECIES_PREFIX))
                .and_then(|suffix| suffix.parse::<usize>().ok())
            {
                indices.push(idx);
            }
        }
        indices.sort_unstable();
        Ok(indices)
    }

    /// Replace a score table atomically.
    pub fn write_scores(&self, path: &Path, entries: &[ScoreEntry]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = partial(path);
        {
            let file = File::create(&tmp)?;
            let mut writer = csv::Writer::from_writer(BufWriter::new(file));
            // Header is written even for an empty table.
            writer.write_record(["species_idx", "score"])?;
            for entry in entries {
                writer.write_record([entry.species_idx.to_string(), entry.score.to_string()])?;
            }
            let mut inner = writer
                .into_inner()
                .map_err(|e| io::Error::other(e.to_string()))?;
            inner.flush()?;
            inner.get_ref().sync_all()?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Read a score table written by [`Self::write_scores`].
    pub fn read_scores(&self, path: &Path) -> Result<Vec<ScoreEntry>> {
        if !path.is_file() {
            return Err(EvolutionError::ArtifactMissing(path.to_path_buf()));
        }
        let mut reader = csv::Reader::from_path(path)?;
        let mut entries = Vec::new();
        for row in reader.deserialize() {
            entries.push(row?);
        }
        Ok(entries)
    }
}

/// `<path>.partial`
fn partial(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

fn write_json_synced<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(())
}
