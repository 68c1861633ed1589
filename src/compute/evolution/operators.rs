//! Crossover and mutation over flat chromosomes.

use rand::prelude::*;

use crate::schema::{CrossoverMethod, GeneticsConfig, MutationMethod};

use super::codec::Chromosome;
use super::error::{EvolutionError, Result};

/// Seeded recombination operators.
///
/// Every random draw comes from the owned `StdRng`, so two instances built
/// from the same seed produce identical offspring.
pub struct GeneticOperators {
    rng: StdRng,
    genetics: GeneticsConfig,
}

impl GeneticOperators {
    /// Create from seed.
    pub fn new(genetics: GeneticsConfig, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            genetics,
        }
    }

    /// Create from an existing generator.
    pub fn from_rng(genetics: GeneticsConfig, rng: StdRng) -> Self {
        Self { rng, genetics }
    }

    /// Recombine two equal-length parents into two complementary children.
    ///
    /// Wherever the first child took a gene from `parent1`, the second took it
    /// from `parent2`, and vice versa.
    pub fn crossover(
        &mut self,
        parent1: &[f64],
        parent2: &[f64],
    ) -> Result<(Chromosome, Chromosome)> {
        if parent1.len() != parent2.len() {
            return Err(EvolutionError::EncodingMismatch(format!(
                "cannot cross chromosomes of length {} and {}",
                parent1.len(),
                parent2.len()
            )));
        }

        let n = parent1.len();
        let mut child1 = parent1.to_vec();
        let mut child2 = parent2.to_vec();
        if n == 0 {
            return Ok((child1, child2));
        }

        match self.genetics.crossover {
            CrossoverMethod::SinglePoint => {
                let cut = self.rng.gen_range(0..=n);
                swap_range(&mut child1, &mut child2, cut, n);
            }
            CrossoverMethod::TwoPoint => {
                let a = self.rng.gen_range(0..=n);
                let b = self.rng.gen_range(0..=n);
                swap_range(&mut child1, &mut child2, a.min(b), a.max(b));
            }
            CrossoverMethod::Uniform => {
                for i in 0..n {
                    if self.rng.gen_bool(0.5) {
                        std::mem::swap(&mut child1[i], &mut child2[i]);
                    }
                }
            }
        }

        Ok((child1, child2))
    }

    /// Perturb each gene with probability `mutation_rate`.
    ///
    /// Returns the number of genes changed.
    pub fn mutate(&mut self, chromosome: &mut [f64]) -> usize {
        let rate = self.genetics.mutation_rate;
        let mut mutated = 0;

        for gene in chromosome.iter_mut() {
            if self.rng.r#gen::<f64>() < rate {
                *gene = self.perturb(*gene);
                mutated += 1;
            }
        }

        mutated
    }

    /// Apply one draw of mutation noise to a single gene.
    fn perturb(&mut self, gene: f64) -> f64 {
        let noise: f64 = self.rng.sample(rand_distr::StandardNormal);
        match self.genetics.mutation {
            MutationMethod::LogNormal { strength } => gene * (noise * strength).exp(),
            MutationMethod::Gaussian { strength } => gene + noise * strength,
        }
    }

    /// Pick an element uniformly at random.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        items.choose(&mut self.rng)
    }

    /// Generate next u64 for seeding child RNGs.
    pub fn next_seed(&mut self) -> u64 {
        self.rng.r#gen()
    }
}

/// Exchange genes `start..end` between two children.
fn swap_range(child1: &mut [f64], child2: &mut [f64], start: usize, end: usize) {
    child1[start..end].swap_with_slice(&mut child2[start..end]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn genetics(crossover: CrossoverMethod, rate: f64) -> GeneticsConfig {
        GeneticsConfig {
            crossover,
            mutation: MutationMethod::Gaussian { strength: 0.5 },
            mutation_rate: rate,
        }
    }

    const METHODS: [CrossoverMethod; 3] = [
        CrossoverMethod::SinglePoint,
        CrossoverMethod::TwoPoint,
        CrossoverMethod::Uniform,
    ];

    #[test]
    fn test_children_are_complementary() {
        let a: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let b: Vec<f64> = (0..20).map(|i| -(i as f64) - 1.0).collect();

        for method in METHODS {
            let mut ops = GeneticOperators::new(genetics(method, 0.0), 7);
            let (c1, c2) = ops.crossover(&a, &b).unwrap();
            for i in 0..a.len() {
                let from_a = c1[i] == a[i];
                assert!(from_a || c1[i] == b[i]);
                // The sibling holds the other parent's gene.
                assert_eq!(c2[i], if from_a { b[i] } else { a[i] });
            }
        }
    }

    #[test]
    fn test_single_point_is_contiguous() {
        let a = vec![1.0; 10];
        let b = vec![2.0; 10];
        let mut ops = GeneticOperators::new(genetics(CrossoverMethod::SinglePoint, 0.0), 3);
        for _ in 0..20 {
            let (c1, _) = ops.crossover(&a, &b).unwrap();
            let switches = c1.windows(2).filter(|w| w[0] != w[1]).count();
            assert!(switches <= 1);
        }
    }

    #[test]
    fn test_length_mismatch() {
        let mut ops = GeneticOperators::new(GeneticsConfig::default(), 1);
        let result = ops.crossover(&[1.0, 2.0], &[1.0]);
        assert!(matches!(result, Err(EvolutionError::EncodingMismatch(_))));
    }

    #[test]
    fn test_self_crossover_is_identity() {
        let a = vec![0.5, -1.5, 3.0, 7.0];
        for method in METHODS {
            let mut ops = GeneticOperators::new(genetics(method, 0.0), 11);
            let (c1, c2) = ops.crossover(&a, &a).unwrap();
            assert_eq!(c1, a);
            assert_eq!(c2, a);
        }
    }

    #[test]
    fn test_deterministic_given_seed() {
        let a: Vec<f64> = (0..50).map(|i| i as f64).collect();
        let b: Vec<f64> = (0..50).map(|i| (i * 3) as f64).collect();

        let run = |seed| {
            let mut ops = GeneticOperators::new(genetics(CrossoverMethod::TwoPoint, 0.2), seed);
            let (mut c1, c2) = ops.crossover(&a, &b).unwrap();
            ops.mutate(&mut c1);
            (c1, c2)
        };

        assert_eq!(run(42), run(42));
    }

    #[test]
    fn test_zero_rate_is_noop() {
        let mut ops = GeneticOperators::new(genetics(CrossoverMethod::SinglePoint, 0.0), 5);
        let original = vec![1.0, 2.0, 3.0];
        let mut chromosome = original.clone();
        assert_eq!(ops.mutate(&mut chromosome), 0);
        assert_eq!(chromosome, original);
    }

    #[test]
    fn test_lognormal_keeps_sign_and_zero() {
        let config = GeneticsConfig {
            crossover: CrossoverMethod::SinglePoint,
            mutation: MutationMethod::LogNormal { strength: 1.0 },
            mutation_rate: 0.99,
        };
        let mut ops = GeneticOperators::new(config, 9);
        let mut chromosome = vec![-70e-3, 0.0, 5e-10];
        for _ in 0..10 {
            ops.mutate(&mut chromosome);
        }
        assert!(chromosome[0] < 0.0);
        assert_eq!(chromosome[1], 0.0);
        assert!(chromosome[2] > 0.0);
    }

    #[test]
    fn test_high_rate_mutates() {
        let mut ops = GeneticOperators::new(genetics(CrossoverMethod::SinglePoint, 0.99), 13);
        let mut chromosome = vec![1.0; 100];
        let changed = ops.mutate(&mut chromosome);
        assert!(changed > 80);
        assert!(chromosome.iter().filter(|&&g| g != 1.0).count() > 80);
    }

    proptest! {
        #[test]
        fn test_crossover_preserves_length(
            n in 0usize..64,
            seed in any::<u64>(),
            method in 0usize..3,
        ) {
            let a = vec![1.0; n];
            let b = vec![2.0; n];
            let mut ops = GeneticOperators::new(genetics(METHODS[method], 0.5), seed);
            let (mut c1, c2) = ops.crossover(&a, &b).unwrap();
            prop_assert_eq!(c1.len(), n);
            prop_assert_eq!(c2.len(), n);
            ops.mutate(&mut c1);
            prop_assert_eq!(c1.len(), n);
        }
    }
}
