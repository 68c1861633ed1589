//! Built-in association experiment.
//!
//! Networks are leaky integrate-and-fire ensembles driven by the block
//! schedule of [`AssociationConfig`]. A network scores well when its
//! association neurons fire during the recall block, where only the
//! stimulus neurons are driven, and stay quiet at rest.

use rand::Rng;
use rand::rngs::StdRng;

use crate::compute::lif::{
    LifEnsemble, R_M, TAU_M, TAU_SYN, U_RESET, U_REST, U_THRESHOLD, WEIGHT,
};
use crate::compute::protocol::BlockProtocol;
use crate::recording::ActivityRecord;
use crate::schema::{
    ASSOCIATION_LABEL, Anatomy, AssociationConfig, NetworkConfig, REST_CONDITION,
};

use super::plugin::EvolutionPlugin;

/// [`EvolutionPlugin`] for the association experiment.
#[derive(Debug, Clone, Default)]
pub struct AssociationPlugin {
    config: AssociationConfig,
}

impl AssociationPlugin {
    pub fn new(config: AssociationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AssociationConfig {
        &self.config
    }
}

/// Uniform draw from `[lo, hi]`; degenerate ranges return `lo`.
fn uniform(rng: &mut StdRng, (lo, hi): (f64, f64)) -> f64 {
    if hi > lo { rng.gen_range(lo..=hi) } else { lo }
}

fn draw(rng: &mut StdRng, range: (f64, f64), len: usize) -> Vec<f64> {
    (0..len).map(|_| uniform(rng, range)).collect()
}

impl EvolutionPlugin for AssociationPlugin {
    type Protocol = BlockProtocol;
    type Engine = LifEnsemble;

    fn sample(&self, rng: &mut StdRng) -> NetworkConfig {
        let n = self.config.num_neurons;
        let bounds = &self.config.bounds;
        let anatomy = Anatomy::fully_connected(self.config.labels());

        let u_rest = draw(rng, bounds.u_rest, n);
        let r_m = draw(rng, bounds.r_m, n);
        let tau_m = draw(rng, bounds.tau_m, n);
        let u_threshold = draw(rng, bounds.u_threshold, n);
        let u_reset = draw(rng, bounds.u_reset, n);
        let tau_syn = draw(rng, bounds.tau_syn, n * n);
        let mut weights = draw(rng, bounds.weight, n * n);
        for (w, &connected) in weights.iter_mut().zip(&anatomy.connections) {
            if !connected {
                *w = 0.0;
            }
        }

        NetworkConfig::new(anatomy)
            .with_neuron_param(U_REST, u_rest)
            .with_neuron_param(R_M, r_m)
            .with_neuron_param(TAU_M, tau_m)
            .with_neuron_param(U_THRESHOLD, u_threshold)
            .with_neuron_param(U_RESET, u_reset)
            .with_synapse_param(TAU_SYN, tau_syn)
            .with_synapse_param(WEIGHT, weights)
    }

    /// Recall response of the association neurons minus their rest rate.
    fn score(&self, activity: &ActivityRecord) -> f64 {
        let labels = self.config.labels();
        let targets: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(i, label)| label.as_str() == ASSOCIATION_LABEL && *i < activity.num_neurons)
            .map(|(i, _)| i)
            .collect();

        let recall = activity.firing_fraction(&self.config.recall_condition, &targets);
        let rest = activity.firing_fraction(REST_CONDITION, &targets);
        recall - rest
    }

    fn build_protocol(&self, _num_neurons: usize, labels: &[String]) -> BlockProtocol {
        BlockProtocol::from_config(&self.config, labels)
    }

    fn build_engine(&self, config: &NetworkConfig) -> LifEnsemble {
        LifEnsemble::from_config(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::evolution::StimulationProtocol;
    use crate::recording::ActivityRow;
    use rand::SeedableRng;

    fn row(condition: &str, firing: &[bool]) -> ActivityRow {
        ActivityRow {
            time: 0.0,
            condition: condition.to_string(),
            firing: firing.to_vec(),
        }
    }

    #[test]
    fn test_sample_within_bounds() {
        let plugin = AssociationPlugin::default();
        let mut rng = StdRng::seed_from_u64(3);
        let config = plugin.sample(&mut rng);
        config.validate().unwrap();

        let n = plugin.config().num_neurons;
        assert_eq!(config.num_neurons, n);
        assert_eq!(config.anatomy.labels, plugin.config().labels());

        let bounds = &plugin.config().bounds;
        let within = |v: &[f64], (lo, hi): (f64, f64)| v.iter().all(|&x| lo <= x && x <= hi);
        assert!(within(config.neuron_param(U_REST).unwrap(), bounds.u_rest));
        assert!(within(config.neuron_param(TAU_M).unwrap(), bounds.tau_m));
        assert!(within(config.synapse_param(WEIGHT).unwrap(), bounds.weight));

        let weights = config.synapse_param(WEIGHT).unwrap();
        for i in 0..n {
            assert_eq!(weights[i * n + i], 0.0);
        }
    }

    #[test]
    fn test_sampling_is_seeded() {
        let plugin = AssociationPlugin::default();
        let a = plugin.sample(&mut StdRng::seed_from_u64(11));
        let b = plugin.sample(&mut StdRng::seed_from_u64(11));
        assert_eq!(a, b);
    }

    #[test]
    fn test_score_rewards_recall_response() {
        let plugin = AssociationPlugin::new(AssociationConfig {
            num_neurons: 2,
            ..Default::default()
        });

        let mut record = ActivityRecord::new(2);
        record.rows = vec![
            row("recall", &[true, true]),
            row("recall", &[true, false]),
            row("rest", &[false, false]),
            row("rest", &[false, false]),
        ];
        assert_eq!(plugin.score(&record), 0.5);

        record.rows.push(row("rest", &[false, true]));
        record.rows.push(row("rest", &[false, true]));
        assert_eq!(plugin.score(&record), 0.0);
    }

    #[test]
    fn test_score_of_silent_record() {
        let plugin = AssociationPlugin::default();
        let record = ActivityRecord::new(4);
        assert_eq!(plugin.score(&record), 0.0);
    }

    #[test]
    fn test_protocol_uses_labels() {
        let plugin = AssociationPlugin::default();
        let labels = plugin.config().labels();
        let protocol = plugin.build_protocol(labels.len(), &labels);
        let stimulation = protocol.stimulation_at(1.25);
        assert_eq!(stimulation.condition, "association");
        assert!(stimulation.current[1] > 0.0);
    }
}
