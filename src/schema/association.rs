//! Settings for the built-in association experiment.
//!
//! The experiment drives "stimulus" neurons alone, "association" neurons
//! alone, then both together, and finally the stimulus alone again. Networks
//! whose association neurons respond to that last stimulus-only block score
//! highest.

use serde::{Deserialize, Serialize};

/// Label of neurons that receive the conditioned stimulus.
pub const STIMULUS_LABEL: &str = "stimulus";
/// Label of neurons expected to respond after pairing.
pub const ASSOCIATION_LABEL: &str = "association";
/// Label of neurons that receive no external input.
pub const HIDDEN_LABEL: &str = "hidden";
/// Condition reported outside every stimulus block.
pub const REST_CONDITION: &str = "rest";

/// Configuration of the association experiment plug-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssociationConfig {
    /// Neurons per network (first is "stimulus", second "association",
    /// the rest "hidden").
    #[serde(default = "default_num_neurons")]
    pub num_neurons: usize,
    /// Amplitude of injected current in amperes.
    #[serde(default = "default_current_amplitude")]
    pub current_amplitude: f64,
    /// Total protocol duration in seconds.
    #[serde(default = "default_max_time")]
    pub max_time: f64,
    /// Stimulation schedule.
    #[serde(default = "default_schedule")]
    pub schedule: Vec<StimulusBlock>,
    /// Condition whose association response is rewarded.
    #[serde(default = "default_recall_condition")]
    pub recall_condition: String,
    /// Sampling ranges for fresh configs.
    #[serde(default)]
    pub bounds: ParameterBounds,
}

impl Default for AssociationConfig {
    fn default() -> Self {
        Self {
            num_neurons: default_num_neurons(),
            current_amplitude: default_current_amplitude(),
            max_time: default_max_time(),
            schedule: default_schedule(),
            recall_condition: default_recall_condition(),
            bounds: ParameterBounds::default(),
        }
    }
}

fn default_num_neurons() -> usize {
    4
}
fn default_current_amplitude() -> f64 {
    1.2e-10
}
fn default_max_time() -> f64 {
    5.0
}
fn default_recall_condition() -> String {
    "recall".to_string()
}
fn default_schedule() -> Vec<StimulusBlock> {
    vec![
        StimulusBlock::new(0.0, 0.5, "stimulus", &[STIMULUS_LABEL]),
        StimulusBlock::new(1.0, 1.5, "association", &[ASSOCIATION_LABEL]),
        StimulusBlock::new(2.0, 3.0, "both", &[STIMULUS_LABEL, ASSOCIATION_LABEL]),
        StimulusBlock::new(3.5, 4.0, "recall", &[STIMULUS_LABEL]),
    ]
}

/// One window of the stimulation schedule.
///
/// Active for `start < t < end` (both bounds exclusive).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StimulusBlock {
    pub start: f64,
    pub end: f64,
    /// Condition label written to the activity record.
    pub condition: String,
    /// Anatomy labels of the neurons receiving current.
    pub targets: Vec<String>,
}

impl StimulusBlock {
    pub fn new(start: f64, end: f64, condition: &str, targets: &[&str]) -> Self {
        Self {
            start,
            end,
            condition: condition.to_string(),
            targets: targets.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Uniform sampling ranges for leaky integrate-and-fire parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterBounds {
    /// Resting potential (V).
    #[serde(default = "default_u_rest")]
    pub u_rest: (f64, f64),
    /// Membrane resistance (Ohm).
    #[serde(default = "default_r_m")]
    pub r_m: (f64, f64),
    /// Membrane time constant (s).
    #[serde(default = "default_tau_m")]
    pub tau_m: (f64, f64),
    /// Firing threshold (V).
    #[serde(default = "default_u_threshold")]
    pub u_threshold: (f64, f64),
    /// Post-spike reset potential (V).
    #[serde(default = "default_u_reset")]
    pub u_reset: (f64, f64),
    /// Synaptic current decay constant (s).
    #[serde(default = "default_tau_syn")]
    pub tau_syn: (f64, f64),
    /// Synaptic current increment per presynaptic spike (A).
    #[serde(default = "default_weight")]
    pub weight: (f64, f64),
}

impl Default for ParameterBounds {
    fn default() -> Self {
        Self {
            u_rest: default_u_rest(),
            r_m: default_r_m(),
            tau_m: default_tau_m(),
            u_threshold: default_u_threshold(),
            u_reset: default_u_reset(),
            tau_syn: default_tau_syn(),
            weight: default_weight(),
        }
    }
}

fn default_u_rest() -> (f64, f64) {
    (-70e-3, -65e-3)
}
fn default_r_m() -> (f64, f64) {
    (100e6, 600e6)
}
fn default_tau_m() -> (f64, f64) {
    (20e-3, 200e-3)
}
fn default_u_threshold() -> (f64, f64) {
    (-55e-3, -45e-3)
}
fn default_u_reset() -> (f64, f64) {
    (-70e-3, -60e-3)
}
fn default_tau_syn() -> (f64, f64) {
    (5e-3, 100e-3)
}
fn default_weight() -> (f64, f64) {
    (0.0, 5e-10)
}

/// Association settings validation errors.
#[derive(Debug, thiserror::Error)]
pub enum AssociationConfigError {
    #[error("Association experiment needs at least 2 neurons, got {0}")]
    TooFewNeurons(usize),
    #[error("Protocol duration must be positive and finite, got {0}")]
    InvalidMaxTime(f64),
    #[error("Stimulus block '{0}' ends before it starts")]
    InvalidBlock(String),
    #[error("Invalid parameter bounds: {0}")]
    InvalidBounds(String),
}

impl AssociationConfig {
    /// Validate the experiment settings.
    pub fn validate(&self) -> Result<(), AssociationConfigError> {
        if self.num_neurons < 2 {
            return Err(AssociationConfigError::TooFewNeurons(self.num_neurons));
        }
        if !(self.max_time.is_finite() && self.max_time > 0.0) {
            return Err(AssociationConfigError::InvalidMaxTime(self.max_time));
        }
        if let Some(block) = self.schedule.iter().find(|b| b.end < b.start) {
            return Err(AssociationConfigError::InvalidBlock(block.condition.clone()));
        }

        let check_bounds = |bounds: (f64, f64), name: &str| {
            if bounds.0 > bounds.1 {
                Err(AssociationConfigError::InvalidBounds(format!(
                    "{} min ({}) > max ({})",
                    name, bounds.0, bounds.1
                )))
            } else {
                Ok(())
            }
        };

        let b = &self.bounds;
        check_bounds(b.u_rest, "u_rest")?;
        check_bounds(b.r_m, "r_m")?;
        check_bounds(b.tau_m, "tau_m")?;
        check_bounds(b.u_threshold, "u_threshold")?;
        check_bounds(b.u_reset, "u_reset")?;
        check_bounds(b.tau_syn, "tau_syn")?;
        check_bounds(b.weight, "weight")?;

        if b.tau_m.0 <= 0.0 || b.tau_syn.0 <= 0.0 {
            return Err(AssociationConfigError::InvalidBounds(
                "time constants must be positive".to_string(),
            ));
        }
        if b.u_reset.1 >= b.u_threshold.0 {
            return Err(AssociationConfigError::InvalidBounds(
                "reset potential must stay below threshold".to_string(),
            ));
        }
        Ok(())
    }

    /// Anatomy labels for a network of `num_neurons`.
    pub fn labels(&self) -> Vec<String> {
        (0..self.num_neurons)
            .map(|i| match i {
                0 => STIMULUS_LABEL,
                1 => ASSOCIATION_LABEL,
                _ => HIDDEN_LABEL,
            })
            .map(str::to_string)
            .collect()
    }
}
