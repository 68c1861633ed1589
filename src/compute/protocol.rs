//! Block-schedule stimulation protocol.

use crate::schema::{AssociationConfig, REST_CONDITION, StimulusBlock};

use super::evolution::{Stimulation, StimulationProtocol};

/// A stimulus block resolved against a concrete network.
#[derive(Debug, Clone)]
struct ResolvedBlock {
    start: f64,
    end: f64,
    condition: String,
    /// Neuron indices receiving current.
    targets: Vec<usize>,
}

/// Injects a constant current into labelled neurons during scheduled
/// windows and reports "rest" everywhere else.
///
/// When blocks overlap the first matching one wins.
#[derive(Debug, Clone)]
pub struct BlockProtocol {
    num_neurons: usize,
    amplitude: f64,
    max_time: f64,
    blocks: Vec<ResolvedBlock>,
}

impl BlockProtocol {
    /// Resolve block targets through the network's anatomy labels.
    /// Labels with no matching neuron are ignored.
    pub fn new(
        schedule: &[StimulusBlock],
        labels: &[String],
        amplitude: f64,
        max_time: f64,
    ) -> Self {
        let blocks = schedule
            .iter()
            .map(|block| ResolvedBlock {
                start: block.start,
                end: block.end,
                condition: block.condition.clone(),
                targets: labels
                    .iter()
                    .enumerate()
                    .filter(|(_, label)| block.targets.contains(*label))
                    .map(|(i, _)| i)
                    .collect(),
            })
            .collect();

        Self {
            num_neurons: labels.len(),
            amplitude,
            max_time,
            blocks,
        }
    }

    /// Protocol of the association experiment.
    pub fn from_config(config: &AssociationConfig, labels: &[String]) -> Self {
        Self::new(
            &config.schedule,
            labels,
            config.current_amplitude,
            config.max_time,
        )
    }

    fn active_block(&self, time: f64) -> Option<&ResolvedBlock> {
        self.blocks
            .iter()
            .find(|b| b.start < time && time < b.end)
    }
}

impl StimulationProtocol for BlockProtocol {
    fn max_time(&self) -> f64 {
        self.max_time
    }

    fn stimulation_at(&self, time: f64) -> Stimulation {
        let mut current = vec![0.0; self.num_neurons];
        match self.active_block(time) {
            Some(block) => {
                for &i in &block.targets {
                    current[i] = self.amplitude;
                }
                Stimulation {
                    condition: block.condition.clone(),
                    current,
                }
            }
            None => Stimulation {
                condition: REST_CONDITION.to_string(),
                current,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn protocol() -> BlockProtocol {
        let config = AssociationConfig {
            num_neurons: 3,
            ..Default::default()
        };
        BlockProtocol::from_config(&config, &config.labels())
    }

    #[test]
    fn test_default_schedule() {
        let p = protocol();
        let amp = AssociationConfig::default().current_amplitude;

        let s = p.stimulation_at(0.25);
        assert_eq!(s.condition, "stimulus");
        assert_eq!(s.current, vec![amp, 0.0, 0.0]);

        let s = p.stimulation_at(1.2);
        assert_eq!(s.condition, "association");
        assert_eq!(s.current, vec![0.0, amp, 0.0]);

        let s = p.stimulation_at(2.5);
        assert_eq!(s.condition, "both");
        assert_eq!(s.current, vec![amp, amp, 0.0]);

        let s = p.stimulation_at(3.7);
        assert_eq!(s.condition, "recall");
        assert_eq!(s.current, vec![amp, 0.0, 0.0]);

        let s = p.stimulation_at(4.5);
        assert_eq!(s.condition, REST_CONDITION);
        assert_eq!(s.current, vec![0.0; 3]);
        assert_eq!(p.max_time(), 5.0);
    }

    #[test]
    fn test_bounds_are_exclusive() {
        let p = protocol();
        assert_eq!(p.stimulation_at(0.0).condition, REST_CONDITION);
        assert_eq!(p.stimulation_at(0.5).condition, REST_CONDITION);
        assert_eq!(p.stimulation_at(1.0).condition, REST_CONDITION);
        assert_eq!(p.stimulation_at(1.0001).condition, "association");
    }

    #[test]
    fn test_unknown_labels_are_ignored() {
        let schedule = vec![StimulusBlock::new(0.0, 1.0, "x", &["missing"])];
        let labels = vec!["a".to_string(), "b".to_string()];
        let p = BlockProtocol::new(&schedule, &labels, 1.0, 1.0);
        let s = p.stimulation_at(0.5);
        assert_eq!(s.condition, "x");
        assert_eq!(s.current, vec![0.0, 0.0]);
    }

    #[test]
    fn test_repeated_labels() {
        let schedule = vec![StimulusBlock::new(0.0, 1.0, "on", &["hidden"])];
        let labels: Vec<String> = vec!["stimulus".into(), "hidden".into(), "hidden".into()];
        let p = BlockProtocol::new(&schedule, &labels, 2.0, 1.0);
        assert_eq!(p.stimulation_at(0.5).current, vec![0.0, 2.0, 2.0]);
    }
}
