//! Flat chromosome encoding of network configs.
//!
//! Neuron parameters come first, then synapse parameters, each group in
//! parameter-name order. The structural part of a config (neuron count,
//! anatomy, parameter names and lengths) travels alongside the chromosome in
//! a [`GenomeTemplate`] and is never recombined.

use serde::{Deserialize, Serialize};

use crate::schema::{Anatomy, NetworkConfig};

use super::error::{EvolutionError, Result};

/// Flat gene vector.
pub type Chromosome = Vec<f64>;

/// Which parameter table a segment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentKind {
    Neuron,
    Synapse,
}

/// Contiguous run of genes holding one named parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneSegment {
    pub name: String,
    pub kind: SegmentKind,
    pub len: usize,
}

/// Structural metadata needed to turn a chromosome back into a config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenomeTemplate {
    pub num_neurons: usize,
    pub anatomy: Anatomy,
    pub segments: Vec<GeneSegment>,
}

impl GenomeTemplate {
    /// Expected chromosome length.
    pub fn chromosome_len(&self) -> usize {
        self.segments.iter().map(|s| s.len).sum()
    }

    /// Check that chromosomes built from both templates can be recombined.
    pub fn ensure_compatible(&self, other: &GenomeTemplate) -> Result<()> {
        if self.num_neurons != other.num_neurons {
            return Err(EvolutionError::EncodingMismatch(format!(
                "neuron counts differ ({} vs {})",
                self.num_neurons, other.num_neurons
            )));
        }
        if self.segments != other.segments {
            return Err(EvolutionError::EncodingMismatch(
                "parameter layouts differ".to_string(),
            ));
        }
        Ok(())
    }

    /// Decode a chromosome into a config with this template's structure.
    pub fn to_config(&self, chromosome: &[f64]) -> Result<NetworkConfig> {
        let expected = self.chromosome_len();
        if chromosome.len() != expected {
            return Err(EvolutionError::EncodingMismatch(format!(
                "chromosome has {} genes, template expects {}",
                chromosome.len(),
                expected
            )));
        }

        let mut config = NetworkConfig::new(self.anatomy.clone());
        config.num_neurons = self.num_neurons;

        let mut offset = 0;
        for segment in &self.segments {
            let values = chromosome[offset..offset + segment.len].to_vec();
            offset += segment.len;
            let table = match segment.kind {
                SegmentKind::Neuron => &mut config.neuron_params,
                SegmentKind::Synapse => &mut config.synapse_params,
            };
            table.insert(segment.name.clone(), values);
        }

        Ok(config)
    }
}

/// A config split into its evolvable genes and fixed structure.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedConfig {
    pub template: GenomeTemplate,
    pub chromosome: Chromosome,
}

impl EncodedConfig {
    /// Encode a config.
    pub fn from_config(config: &NetworkConfig) -> Self {
        let mut segments =
            Vec::with_capacity(config.neuron_params.len() + config.synapse_params.len());
        let mut chromosome = Vec::with_capacity(config.parameter_count());

        let tables = [
            (SegmentKind::Neuron, &config.neuron_params),
            (SegmentKind::Synapse, &config.synapse_params),
        ];
        for (kind, table) in tables {
            for (name, values) in table {
                segments.push(GeneSegment {
                    name: name.clone(),
                    kind,
                    len: values.len(),
                });
                chromosome.extend_from_slice(values);
            }
        }

        Self {
            template: GenomeTemplate {
                num_neurons: config.num_neurons,
                anatomy: config.anatomy.clone(),
                segments,
            },
            chromosome,
        }
    }

    /// Decode back into a config.
    pub fn to_config(&self) -> Result<NetworkConfig> {
        self.template.to_config(&self.chromosome)
    }

    /// Replace the genes, keeping the structure.
    pub fn with_chromosome(self, chromosome: Chromosome) -> Self {
        Self {
            template: self.template,
            chromosome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn labels(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("n{}", i)).collect()
    }

    fn sample_config() -> NetworkConfig {
        NetworkConfig::new(Anatomy::fully_connected(labels(2)))
            .with_neuron_param("u_rest", vec![-70e-3, -65e-3])
            .with_neuron_param("tau_m", vec![0.18, 0.02])
            .with_synapse_param("w", vec![0.0, 1e-10, 2e-10, 0.0])
    }

    #[test]
    fn test_layout_order() {
        let encoded = EncodedConfig::from_config(&sample_config());
        let names: Vec<_> = encoded
            .template
            .segments
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        // Neuron parameters in name order, then synapse parameters.
        assert_eq!(names, vec!["tau_m", "u_rest", "w"]);
        assert_eq!(encoded.chromosome.len(), 8);
        assert_eq!(encoded.chromosome[0], 0.18);
        assert_eq!(encoded.chromosome[2], -70e-3);
    }

    #[test]
    fn test_roundtrip() {
        let config = sample_config();
        let decoded = EncodedConfig::from_config(&config).to_config().unwrap();
        assert_eq!(decoded, config);
    }

    #[test]
    fn test_wrong_length_is_mismatch() {
        let encoded = EncodedConfig::from_config(&sample_config());
        let result = encoded.template.to_config(&[1.0, 2.0]);
        assert!(matches!(result, Err(EvolutionError::EncodingMismatch(_))));
    }

    #[test]
    fn test_incompatible_templates() {
        let a = EncodedConfig::from_config(&sample_config());
        let b = EncodedConfig::from_config(
            &NetworkConfig::new(Anatomy::fully_connected(labels(3)))
                .with_neuron_param("tau_m", vec![0.1; 3]),
        );
        assert!(a.template.ensure_compatible(&a.template).is_ok());
        assert!(matches!(
            a.template.ensure_compatible(&b.template),
            Err(EvolutionError::EncodingMismatch(_))
        ));
    }

    #[test]
    fn test_structure_survives_gene_replacement() {
        let config = sample_config();
        let encoded = EncodedConfig::from_config(&config);
        let genes = vec![1.0; encoded.chromosome.len()];
        let decoded = encoded.with_chromosome(genes).to_config().unwrap();
        assert_eq!(decoded.num_neurons, config.num_neurons);
        assert_eq!(decoded.anatomy, config.anatomy);
        assert_eq!(decoded.neuron_param("tau_m"), Some(&[1.0, 1.0][..]));
    }

    proptest! {
        #[test]
        fn test_random_roundtrip(
            n in 1usize..5,
            seed in proptest::collection::vec(-1e3f64..1e3, 64),
        ) {
            let pick = |i: usize| seed[i % seed.len()];
            let config = NetworkConfig::new(Anatomy::fully_connected(labels(n)))
                .with_neuron_param("a", (0..n).map(pick).collect())
                .with_neuron_param("b", (0..n).map(|i| pick(i + 7)).collect())
                .with_synapse_param("w", (0..n * n).map(|i| pick(i + 13)).collect());

            let encoded = EncodedConfig::from_config(&config);
            prop_assert_eq!(encoded.chromosome.len(), config.parameter_count());
            let decoded = encoded.to_config().unwrap();
            prop_assert_eq!(decoded, config);
        }
    }
}
