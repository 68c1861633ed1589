//! Leaky integrate-and-fire ensemble with exponential current synapses.
//!
//! Membrane dynamics per neuron:
//!
//! ```text
//! tau_m * du/dt = (u_rest - u) + r_m * (I_ext + I_syn)
//! ```
//!
//! A neuron fires when `u >= u_threshold` and is reset to `u_reset`. Each
//! synapse carries a current that decays with `tau_syn` and jumps by `w`
//! when its presynaptic neuron fires.

use crate::schema::NetworkConfig;

use super::evolution::SimulationEngine;

/// Resting potential (V).
pub const U_REST: &str = "u_rest";
/// Membrane resistance (Ohm).
pub const R_M: &str = "r_m";
/// Membrane time constant (s).
pub const TAU_M: &str = "tau_m";
/// Firing threshold (V).
pub const U_THRESHOLD: &str = "u_threshold";
/// Post-spike reset potential (V).
pub const U_RESET: &str = "u_reset";
/// Synaptic current decay constant (s).
pub const TAU_SYN: &str = "tau_syn";
/// Synaptic current increment per presynaptic spike (A).
pub const WEIGHT: &str = "w";

/// Per-neuron parameter names read by [`LifEnsemble`].
pub const NEURON_PARAMS: [&str; 5] = [U_REST, R_M, TAU_M, U_THRESHOLD, U_RESET];
/// Per-synapse parameter names read by [`LifEnsemble`].
pub const SYNAPSE_PARAMS: [&str; 2] = [TAU_SYN, WEIGHT];

// Fallbacks for parameters absent from a config.
const DEFAULT_U_REST: f64 = -70e-3;
const DEFAULT_R_M: f64 = 500e6;
const DEFAULT_TAU_M: f64 = 180e-3;
const DEFAULT_U_THRESHOLD: f64 = -50e-3;
const DEFAULT_U_RESET: f64 = -70e-3;
const DEFAULT_TAU_SYN: f64 = 0.1;

/// Smallest time constant used, keeps decay factors finite.
const MIN_TAU: f64 = 1e-9;

/// Simulation state of one network.
#[derive(Debug, Clone)]
pub struct LifEnsemble {
    n: usize,
    u_rest: Vec<f64>,
    r_m: Vec<f64>,
    tau_m: Vec<f64>,
    u_threshold: Vec<f64>,
    u_reset: Vec<f64>,
    /// Row-major `n x n`, zero where the anatomy forbids a synapse.
    weights: Vec<f64>,
    tau_syn: Vec<f64>,

    /// Membrane potentials.
    u: Vec<f64>,
    /// Synaptic currents, row = presynaptic.
    syn_current: Vec<f64>,
    firing: Vec<bool>,
    /// Scratch buffer for summed input per neuron.
    input: Vec<f64>,
}

impl LifEnsemble {
    /// Build an ensemble at rest. Missing parameters take default values.
    pub fn from_config(config: &NetworkConfig) -> Self {
        let n = config.num_neurons;
        let neuron = |name: &str, default: f64| -> Vec<f64> {
            config
                .neuron_param(name)
                .filter(|v| v.len() == n)
                .map(<[f64]>::to_vec)
                .unwrap_or_else(|| vec![default; n])
        };
        let synapse = |name: &str, default: f64| -> Vec<f64> {
            config
                .synapse_param(name)
                .filter(|v| v.len() == n * n)
                .map(<[f64]>::to_vec)
                .unwrap_or_else(|| vec![default; n * n])
        };

        let u_rest = neuron(U_REST, DEFAULT_U_REST);
        let mut weights = synapse(WEIGHT, 0.0);
        for (idx, w) in weights.iter_mut().enumerate() {
            if !config.anatomy.connections.get(idx).copied().unwrap_or(false) {
                *w = 0.0;
            }
        }

        Self {
            n,
            u: u_rest.clone(),
            u_rest,
            r_m: neuron(R_M, DEFAULT_R_M),
            tau_m: neuron(TAU_M, DEFAULT_TAU_M),
            u_threshold: neuron(U_THRESHOLD, DEFAULT_U_THRESHOLD),
            u_reset: neuron(U_RESET, DEFAULT_U_RESET),
            weights,
            tau_syn: synapse(TAU_SYN, DEFAULT_TAU_SYN),
            syn_current: vec![0.0; n * n],
            firing: vec![false; n],
            input: vec![0.0; n],
        }
    }

    /// Number of neurons.
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Membrane potentials.
    pub fn potentials(&self) -> &[f64] {
        &self.u
    }

    /// Total synaptic current arriving at each neuron.
    pub fn synaptic_input(&self) -> Vec<f64> {
        let n = self.n;
        (0..n)
            .map(|post| (0..n).map(|pre| self.syn_current[pre * n + post]).sum())
            .collect()
    }
}

impl SimulationEngine for LifEnsemble {
    fn advance_one_step(&mut self, external_current: &[f64], dt: f64) {
        let n = self.n;

        // Synaptic input from currents accumulated up to the previous step.
        for post in 0..n {
            let mut total = external_current.get(post).copied().unwrap_or(0.0);
            for pre in 0..n {
                total += self.syn_current[pre * n + post];
            }
            self.input[post] = total;
        }

        // Forward Euler on the membrane.
        for i in 0..n {
            let tau = self.tau_m[i].max(MIN_TAU);
            let du = (self.u_rest[i] - self.u[i] + self.r_m[i] * self.input[i]) / tau;
            self.u[i] += dt * du;

            self.firing[i] = self.u[i] >= self.u_threshold[i];
            if self.firing[i] {
                self.u[i] = self.u_reset[i];
            }
        }

        // Exact exponential decay, then spike-triggered jumps.
        for pre in 0..n {
            let fired = self.firing[pre];
            for post in 0..n {
                let idx = pre * n + post;
                let decay = (-dt / self.tau_syn[idx].max(MIN_TAU)).exp();
                self.syn_current[idx] *= decay;
                if fired {
                    self.syn_current[idx] += self.weights[idx];
                }
            }
        }
    }

    fn firing_state(&self) -> &[bool] {
        &self.firing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Anatomy;

    fn pair(weight: f64) -> NetworkConfig {
        let anatomy = Anatomy::fully_connected(vec!["a".into(), "b".into()]);
        NetworkConfig::new(anatomy)
            .with_neuron_param(U_REST, vec![-70e-3; 2])
            .with_neuron_param(R_M, vec![500e6; 2])
            .with_neuron_param(TAU_M, vec![20e-3; 2])
            .with_neuron_param(U_THRESHOLD, vec![-50e-3; 2])
            .with_neuron_param(U_RESET, vec![-70e-3; 2])
            .with_synapse_param(TAU_SYN, vec![10e-3; 4])
            .with_synapse_param(WEIGHT, vec![0.0, weight, weight, 0.0])
    }

    fn spikes(ensemble: &mut LifEnsemble, current: &[f64], steps: usize) -> Vec<usize> {
        let mut counts = vec![0; ensemble.len()];
        for _ in 0..steps {
            ensemble.advance_one_step(current, 1e-3);
            for (c, &f) in counts.iter_mut().zip(ensemble.firing_state()) {
                if f {
                    *c += 1;
                }
            }
        }
        counts
    }

    #[test]
    fn test_silent_without_input() {
        let mut ensemble = LifEnsemble::from_config(&pair(0.0));
        assert_eq!(spikes(&mut ensemble, &[0.0, 0.0], 500), vec![0, 0]);
        assert!((ensemble.potentials()[0] + 70e-3).abs() < 1e-12);
    }

    #[test]
    fn test_driven_neuron_fires() {
        // r_m * I = 60 mV above rest, well past threshold.
        let mut ensemble = LifEnsemble::from_config(&pair(0.0));
        let counts = spikes(&mut ensemble, &[1.2e-10, 0.0], 500);
        assert!(counts[0] > 5);
        assert_eq!(counts[1], 0);
    }

    #[test]
    fn test_synapse_propagates_spikes() {
        let mut ensemble = LifEnsemble::from_config(&pair(5e-10));
        let counts = spikes(&mut ensemble, &[1.2e-10, 0.0], 500);
        assert!(counts[0] > 5);
        assert!(counts[1] > 0);
    }

    #[test]
    fn test_anatomy_masks_weights() {
        let mut config = pair(5e-10);
        config.anatomy.connections = vec![false; 4];
        let mut ensemble = LifEnsemble::from_config(&config);
        let counts = spikes(&mut ensemble, &[1.2e-10, 0.0], 500);
        assert_eq!(counts[1], 0);
        assert!(ensemble.synaptic_input().iter().all(|&i| i == 0.0));
    }

    #[test]
    fn test_missing_params_use_defaults() {
        let config = NetworkConfig::new(Anatomy::fully_connected(vec!["a".into()]));
        let mut ensemble = LifEnsemble::from_config(&config);
        assert_eq!(ensemble.len(), 1);
        assert_eq!(spikes(&mut ensemble, &[0.0], 100), vec![0]);
    }
}
