//! Network configuration: the parameter bundle evaluated by one species.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Structured parameters for one candidate spiking network.
///
/// Neuron count and anatomy are structural: they are carried through
/// recombination unchanged. Everything in `neuron_params` and
/// `synapse_params` is evolvable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Number of neurons in the ensemble.
    pub num_neurons: usize,
    /// Connectivity mask and semantic labels.
    pub anatomy: Anatomy,
    /// Per-neuron parameters, each of length `num_neurons`.
    #[serde(default)]
    pub neuron_params: BTreeMap<String, Vec<f64>>,
    /// Per-synapse parameters, each row-major `num_neurons x num_neurons`
    /// (row = presynaptic, column = postsynaptic).
    #[serde(default)]
    pub synapse_params: BTreeMap<String, Vec<f64>>,
}

/// Anatomical constraints of a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anatomy {
    /// Row-major `num_neurons x num_neurons`; `true` where a synapse may exist.
    pub connections: Vec<bool>,
    /// One semantic label per neuron (e.g. "stimulus", "association").
    pub labels: Vec<String>,
}

impl Anatomy {
    /// All-to-all connectivity without self-connections.
    pub fn fully_connected(labels: Vec<String>) -> Self {
        let n = labels.len();
        let connections = (0..n * n).map(|i| i / n != i % n).collect();
        Self { connections, labels }
    }

    /// Whether neuron `pre` may project onto neuron `post`.
    #[inline]
    pub fn is_connected(&self, pre: usize, post: usize) -> bool {
        let n = self.labels.len();
        self.connections[pre * n + post]
    }

    /// Indices of neurons carrying `label`.
    pub fn neurons_labelled(&self, label: &str) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, l)| l.as_str() == label)
            .map(|(i, _)| i)
            .collect()
    }
}

impl NetworkConfig {
    /// Create a config with no parameters yet.
    pub fn new(anatomy: Anatomy) -> Self {
        Self {
            num_neurons: anatomy.labels.len(),
            anatomy,
            neuron_params: BTreeMap::new(),
            synapse_params: BTreeMap::new(),
        }
    }

    /// Builder-style insertion of a per-neuron parameter.
    pub fn with_neuron_param(mut self, name: &str, values: Vec<f64>) -> Self {
        self.neuron_params.insert(name.to_string(), values);
        self
    }

    /// Builder-style insertion of a per-synapse parameter.
    pub fn with_synapse_param(mut self, name: &str, values: Vec<f64>) -> Self {
        self.synapse_params.insert(name.to_string(), values);
        self
    }

    /// Look up a per-neuron parameter.
    pub fn neuron_param(&self, name: &str) -> Option<&[f64]> {
        self.neuron_params.get(name).map(Vec::as_slice)
    }

    /// Look up a per-synapse parameter.
    pub fn synapse_param(&self, name: &str) -> Option<&[f64]> {
        self.synapse_params.get(name).map(Vec::as_slice)
    }

    /// Number of synapse slots (`num_neurons^2`).
    #[inline]
    pub fn synapse_count(&self) -> usize {
        self.num_neurons * self.num_neurons
    }

    /// Total number of evolvable values.
    pub fn parameter_count(&self) -> usize {
        self.neuron_params.values().map(Vec::len).sum::<usize>()
            + self.synapse_params.values().map(Vec::len).sum::<usize>()
    }

    /// Validate shapes and values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let n = self.num_neurons;
        if n == 0 {
            return Err(ConfigError::EmptyNetwork);
        }
        if self.anatomy.labels.len() != n {
            return Err(ConfigError::LabelCount {
                expected: n,
                found: self.anatomy.labels.len(),
            });
        }
        if self.anatomy.connections.len() != n * n {
            return Err(ConfigError::AnatomyShape {
                expected: n * n,
                found: self.anatomy.connections.len(),
            });
        }
        for (name, values) in &self.neuron_params {
            check_param(name, values, n)?;
        }
        for (name, values) in &self.synapse_params {
            check_param(name, values, n * n)?;
        }
        Ok(())
    }
}

fn check_param(name: &str, values: &[f64], expected: usize) -> Result<(), ConfigError> {
    if values.len() != expected {
        return Err(ConfigError::ParamLength {
            name: name.to_string(),
            expected,
            found: values.len(),
        });
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ConfigError::NonFiniteParam(name.to_string()));
    }
    Ok(())
}

/// Network configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Network must contain at least one neuron")]
    EmptyNetwork,
    #[error("Expected {expected} anatomy labels, found {found}")]
    LabelCount { expected: usize, found: usize },
    #[error("Expected {expected} anatomy connection entries, found {found}")]
    AnatomyShape { expected: usize, found: usize },
    #[error("Parameter '{name}' has {found} values, expected {expected}")]
    ParamLength {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("Parameter '{0}' contains non-finite values")]
    NonFiniteParam(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("n{}", i)).collect()
    }

    #[test]
    fn test_fully_connected_has_no_self_loops() {
        let anatomy = Anatomy::fully_connected(labels(3));
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(anatomy.is_connected(i, j), i != j);
            }
        }
    }

    #[test]
    fn test_validate_ok() {
        let config = NetworkConfig::new(Anatomy::fully_connected(labels(2)))
            .with_neuron_param("tau_m", vec![0.1, 0.2])
            .with_synapse_param("w", vec![0.0, 1.0, 1.0, 0.0]);
        assert!(config.validate().is_ok());
        assert_eq!(config.parameter_count(), 6);
    }

    #[test]
    fn test_validate_rejects_bad_lengths() {
        let config = NetworkConfig::new(Anatomy::fully_connected(labels(2)))
            .with_synapse_param("w", vec![0.0, 1.0, 1.0]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ParamLength { expected: 4, found: 3, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_nan() {
        let config = NetworkConfig::new(Anatomy::fully_connected(labels(1)))
            .with_neuron_param("u_rest", vec![f64::NAN]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonFiniteParam(_))
        ));
    }

    #[test]
    fn test_neurons_labelled() {
        let anatomy = Anatomy::fully_connected(vec![
            "stimulus".into(),
            "hidden".into(),
            "stimulus".into(),
        ]);
        assert_eq!(anatomy.neurons_labelled("stimulus"), vec![0, 2]);
        assert!(anatomy.neurons_labelled("missing").is_empty());
    }

    #[test]
    fn test_serialization() {
        let config = NetworkConfig::new(Anatomy::fully_connected(labels(2)))
            .with_neuron_param("tau_m", vec![0.1, 0.2]);
        let json = serde_json::to_string(&config).unwrap();
        let parsed: NetworkConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
