//! Activity records: per-timestep firing of every neuron in one species.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use csv::StringRecord;

/// Leading columns preceding the per-neuron firing columns.
pub const TIME_COLUMN: &str = "time";
pub const CONDITION_COLUMN: &str = "condition";

/// One simulated timestep.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityRow {
    /// Simulation time in seconds.
    pub time: f64,
    /// Condition label reported by the stimulation protocol.
    pub condition: String,
    /// Whether each neuron fired during this step.
    pub firing: Vec<bool>,
}

/// Complete activity table of one species.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityRecord {
    /// Number of neurons (firing columns).
    pub num_neurons: usize,
    /// Rows in time order.
    pub rows: Vec<ActivityRow>,
}

impl ActivityRecord {
    /// Create an empty record.
    pub fn new(num_neurons: usize) -> Self {
        Self {
            num_neurons,
            rows: Vec::new(),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the record has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows recorded under `condition`.
    pub fn rows_in<'a>(&'a self, condition: &'a str) -> impl Iterator<Item = &'a ActivityRow> {
        self.rows.iter().filter(move |r| r.condition == condition)
    }

    /// Fraction of (row, neuron) cells that fired, over rows under
    /// `condition` and the given neurons. Zero when nothing matches.
    pub fn firing_fraction(&self, condition: &str, neurons: &[usize]) -> f64 {
        let mut cells = 0usize;
        let mut spikes = 0usize;
        for row in self.rows_in(condition) {
            for &n in neurons {
                cells += 1;
                if row.firing.get(n).copied().unwrap_or(false) {
                    spikes += 1;
                }
            }
        }
        if cells == 0 {
            0.0
        } else {
            spikes as f64 / cells as f64
        }
    }

    /// Total number of spikes across all rows and neurons.
    pub fn spike_count(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.firing.iter().filter(|&&f| f).count())
            .sum()
    }

    /// Load a record written by [`ActivityWriter`].
    pub fn read_from<P: AsRef<Path>>(path: P) -> Result<Self, RecordError> {
        let file = File::open(path)?;
        let mut reader = csv::Reader::from_reader(BufReader::new(file));

        let headers = reader.headers()?.clone();
        if headers.len() < 2
            || &headers[0] != TIME_COLUMN
            || &headers[1] != CONDITION_COLUMN
        {
            return Err(RecordError::Malformed {
                line: 1,
                reason: format!("unexpected header {:?}", headers),
            });
        }
        let num_neurons = headers.len() - 2;

        let mut rows = Vec::new();
        let mut record = StringRecord::new();
        while reader.read_record(&mut record)? {
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            rows.push(parse_row(&record, line)?);
        }

        Ok(Self { num_neurons, rows })
    }
}

fn parse_row(record: &StringRecord, line: u64) -> Result<ActivityRow, RecordError> {
    let malformed = |reason: String| RecordError::Malformed { line, reason };

    let time = record[0]
        .parse::<f64>()
        .map_err(|e| malformed(format!("bad time '{}': {}", &record[0], e)))?;
    let condition = record[1].to_string();
    let firing = record
        .iter()
        .skip(2)
        .map(|cell| match cell {
            "0" => Ok(false),
            "1" => Ok(true),
            other => Err(malformed(format!("bad firing cell '{}'", other))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ActivityRow {
        time,
        condition,
        firing,
    })
}

/// Streaming writer for activity records.
///
/// Rows go straight to disk as they are produced, so long simulations never
/// hold their whole trace in memory.
///
/// Usage:
/// ```ignore
/// let mut writer = ActivityWriter::create("activity.csv", num_neurons)?;
/// while !clock.is_stopped() {
///     // ... advance the engine ...
///     writer.write_row(time, label, engine.firing_state())?;
/// }
/// writer.finalize()?;
/// ```
pub struct ActivityWriter {
    writer: csv::Writer<BufWriter<File>>,
    num_neurons: usize,
    rows_written: u64,
    /// Reused record buffer.
    record: StringRecord,
}

impl ActivityWriter {
    /// Create the file and write the header row.
    pub fn create<P: AsRef<Path>>(path: P, num_neurons: usize) -> Result<Self, RecordError> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(BufWriter::new(file));

        let mut header = StringRecord::with_capacity(16 * (num_neurons + 2), num_neurons + 2);
        header.push_field(TIME_COLUMN);
        header.push_field(CONDITION_COLUMN);
        for i in 0..num_neurons {
            header.push_field(&format!("neuron_{}", i));
        }
        writer.write_record(&header)?;

        Ok(Self {
            writer,
            num_neurons,
            rows_written: 0,
            record: StringRecord::with_capacity(4 * (num_neurons + 2), num_neurons + 2),
        })
    }

    /// Append one row.
    pub fn write_row(
        &mut self,
        time: f64,
        condition: &str,
        firing: &[bool],
    ) -> Result<(), RecordError> {
        if firing.len() != self.num_neurons {
            return Err(RecordError::NeuronCountMismatch {
                expected: self.num_neurons,
                found: firing.len(),
            });
        }

        self.record.clear();
        self.record.push_field(&time.to_string());
        self.record.push_field(condition);
        for &fired in firing {
            self.record.push_field(if fired { "1" } else { "0" });
        }
        self.writer.write_record(&self.record)?;
        self.rows_written += 1;
        Ok(())
    }

    /// Number of rows written so far.
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Flush buffered rows and sync the file to disk.
    pub fn finalize(self) -> Result<u64, RecordError> {
        let rows = self.rows_written;
        let mut inner = self
            .writer
            .into_inner()
            .map_err(|e| RecordError::Io(io::Error::other(e.to_string())))?;
        inner.flush()?;
        inner.get_ref().sync_all()?;
        Ok(rows)
    }
}

/// Activity record I/O errors.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Malformed activity at line {line}: {reason}")]
    Malformed { line: u64, reason: String },
    #[error("Row has {found} firing values, expected {expected}")]
    NeuronCountMismatch { expected: usize, found: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("activity.csv");

        let mut writer = ActivityWriter::create(&path, 3).unwrap();
        writer.write_row(0.0, "rest", &[false, false, false]).unwrap();
        writer.write_row(0.001, "stimulus", &[true, false, true]).unwrap();
        writer.write_row(0.002, "stimulus", &[false, true, false]).unwrap();
        assert_eq!(writer.finalize().unwrap(), 3);

        let record = ActivityRecord::read_from(&path).unwrap();
        assert_eq!(record.num_neurons, 3);
        assert_eq!(record.len(), 3);
        assert_eq!(record.rows[1].time, 0.001);
        assert_eq!(record.rows[1].condition, "stimulus");
        assert_eq!(record.rows[1].firing, vec![true, false, true]);
        assert_eq!(record.spike_count(), 3);
    }

    #[test]
    fn test_header_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("activity.csv");

        let mut writer = ActivityWriter::create(&path, 2).unwrap();
        writer.write_row(0.5, "both", &[true, false]).unwrap();
        writer.finalize().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("time,condition,neuron_0,neuron_1"));
        assert_eq!(lines.next(), Some("0.5,both,1,0"));
    }

    #[test]
    fn test_header_only_is_empty_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("activity.csv");
        ActivityWriter::create(&path, 4).unwrap().finalize().unwrap();

        let record = ActivityRecord::read_from(&path).unwrap();
        assert_eq!(record.num_neurons, 4);
        assert!(record.is_empty());
    }

    #[test]
    fn test_rejects_wrong_width_row() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("activity.csv");
        let mut writer = ActivityWriter::create(&path, 2).unwrap();
        assert!(matches!(
            writer.write_row(0.0, "rest", &[true]),
            Err(RecordError::NeuronCountMismatch { expected: 2, found: 1 })
        ));
    }

    #[test]
    fn test_malformed_cells() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("activity.csv");
        fs::write(&path, "time,condition,neuron_0\n0.0,rest,2\n").unwrap();
        assert!(matches!(
            ActivityRecord::read_from(&path),
            Err(RecordError::Malformed { .. })
        ));

        fs::write(&path, "t,c,neuron_0\n").unwrap();
        assert!(matches!(
            ActivityRecord::read_from(&path),
            Err(RecordError::Malformed { line: 1, .. })
        ));
    }

    #[test]
    fn test_truncated_row_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("activity.csv");
        fs::write(&path, "time,condition,neuron_0,neuron_1\n0.0,rest,0,1\n0.1,rest\n").unwrap();
        assert!(ActivityRecord::read_from(&path).is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            ActivityRecord::read_from(dir.path().join("nope.csv")),
            Err(RecordError::Io(_))
        ));
    }

    #[test]
    fn test_firing_fraction() {
        let record = ActivityRecord {
            num_neurons: 2,
            rows: vec![
                ActivityRow {
                    time: 0.0,
                    condition: "a".into(),
                    firing: vec![true, false],
                },
                ActivityRow {
                    time: 0.1,
                    condition: "a".into(),
                    firing: vec![true, true],
                },
                ActivityRow {
                    time: 0.2,
                    condition: "b".into(),
                    firing: vec![false, false],
                },
            ],
        };
        assert!((record.firing_fraction("a", &[0]) - 1.0).abs() < 1e-12);
        assert!((record.firing_fraction("a", &[1]) - 0.5).abs() < 1e-12);
        assert_eq!(record.firing_fraction("b", &[0, 1]), 0.0);
        assert_eq!(record.firing_fraction("missing", &[0]), 0.0);
    }
}
