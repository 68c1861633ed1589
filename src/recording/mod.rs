//! Recording of per-timestep simulation activity.
//!
//! # File Format
//!
//! Activity is stored as CSV with one header row:
//!
//! ```text
//! time,condition,neuron_0,neuron_1,...,neuron_{n-1}
//! 0,rest,0,0,...,0
//! 0.0005,stimulus,1,0,...,0
//! ```
//!
//! Firing cells are `1` when the neuron spiked during that step and `0`
//! otherwise. Rows are appended while the simulation runs.

mod activity;

pub use activity::{
    ActivityRecord, ActivityRow, ActivityWriter, CONDITION_COLUMN, RecordError, TIME_COLUMN,
};
