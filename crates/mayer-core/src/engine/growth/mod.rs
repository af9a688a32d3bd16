//! Configurational-bias construction of chains, trees, and rings of overlapping beads.
//!
//! [`ChainGrowthSampler`] builds all bead positions from scratch, anchoring the first
//! placed bead at the origin. Every bond is an overlap between two beads.
//!
//! - **Chain**: beads are bonded in a random visiting order, each placed relative to
//!   the previous one with the configured [`BondModel`](super::config::BondModel).
//! - **Tree**: a uniformly random labeled tree (decoded from a random Prüfer
//!   sequence) is grown breadth-first from bead 0, each child placed relative to its
//!   parent.
//! - **Ring**: a random visiting order closed into a loop, filled in by the exact
//!   midpoint insertion of [`ring`].
//!
//! ## Architecture
//!
//! - **Bond sampling** ([`bond`]) - single-bond distributions for chain and tree mode
//! - **Lens sampling** ([`lens`]) - uniform points in the overlap of two unit spheres
//! - **Ring closure** ([`ring`]) - gap-by-gap insertion with rejection envelopes

pub mod bond;
pub mod lens;
pub mod ring;

use super::config::{ConfigError, GrowthConfig, GrowthMode, PairSigma};
use super::error::MoveError;
use crate::core::random::RandomSource;
use nalgebra::Point3;
use ring::{RingCloser, RingStatistics};
use std::collections::VecDeque;
use tracing::{instrument, trace};

/// Positions of one grown configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GrowthResult {
    /// Bead positions indexed by bead.
    pub positions: Vec<Point3<f64>>,
    /// Beads in placement order; the first sits at the origin.
    pub order: Vec<usize>,
    /// Bonds `(placed_earlier, placed_later)` of the sampled topology.
    pub edges: Vec<(usize, usize)>,
}

#[derive(Debug)]
pub struct ChainGrowthSampler {
    config: GrowthConfig,
    closer: RingCloser,
    degree: Vec<usize>,
    queue: VecDeque<usize>,
}

impl ChainGrowthSampler {
    pub fn new(config: GrowthConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let closer = RingCloser::new(config.max_attempts);
        Ok(Self {
            config,
            closer,
            degree: Vec::new(),
            queue: VecDeque::new(),
        })
    }

    pub fn config(&self) -> &GrowthConfig {
        &self.config
    }

    pub fn ring_statistics(&self) -> &RingStatistics {
        self.closer.statistics()
    }

    /// Checks that `beads` beads can be grown with this configuration.
    pub fn check_bead_count(&self, beads: usize) -> Result<(), MoveError> {
        if beads == 0 {
            return Err(MoveError::Topology {
                move_name: "chain_growth",
                reason: "nothing to grow".to_string(),
            });
        }
        if let PairSigma::Table(table) = &self.config.sigma {
            if table.len() < beads {
                return Err(ConfigError::InvalidParameter {
                    name: "sigma",
                    reason: format!("pair table covers {} beads, need {beads}", table.len()),
                }
                .into());
            }
        }
        if self.config.mode == GrowthMode::Ring {
            ring::check_ring_size(beads)?;
        }
        Ok(())
    }

    pub fn sample(
        &mut self,
        beads: usize,
        rng: &mut dyn RandomSource,
    ) -> Result<GrowthResult, MoveError> {
        let mut result = GrowthResult::default();
        self.sample_into(beads, rng, &mut result)?;
        Ok(result)
    }

    /// Grows `beads` beads into `result`, reusing its buffers.
    #[instrument(level = "trace", skip_all)]
    pub fn sample_into(
        &mut self,
        beads: usize,
        rng: &mut dyn RandomSource,
        result: &mut GrowthResult,
    ) -> Result<(), MoveError> {
        self.check_bead_count(beads)?;
        result.positions.clear();
        result.positions.resize(beads, Point3::origin());
        result.edges.clear();

        match self.config.mode {
            GrowthMode::Chain => self.grow_chain(beads, rng, result)?,
            GrowthMode::Tree => self.grow_tree(beads, rng, result)?,
            GrowthMode::Ring => self.grow_ring(beads, rng, result)?,
        }
        trace!(mode = ?self.config.mode, edges = result.edges.len(), "grew configuration");
        Ok(())
    }

    fn place(
        &self,
        parent: usize,
        child: usize,
        rng: &mut dyn RandomSource,
        result: &mut GrowthResult,
    ) -> Result<(), MoveError> {
        let sigma = self.config.sigma.sigma(parent, child);
        let bond = bond::sample_bond(&self.config.bond, sigma, self.config.max_attempts, rng)?;
        result.positions[child] = result.positions[parent] + bond;
        result.edges.push((parent, child));
        Ok(())
    }

    fn grow_chain(
        &mut self,
        beads: usize,
        rng: &mut dyn RandomSource,
        result: &mut GrowthResult,
    ) -> Result<(), MoveError> {
        result.order = rng.permutation(beads);
        for k in 1..beads {
            self.place(result.order[k - 1], result.order[k], rng, result)?;
        }
        Ok(())
    }

    fn grow_tree(
        &mut self,
        beads: usize,
        rng: &mut dyn RandomSource,
        result: &mut GrowthResult,
    ) -> Result<(), MoveError> {
        let tree = self.random_tree(beads, rng);
        let mut adjacency = vec![Vec::new(); beads];
        for &(a, b) in &tree {
            adjacency[a].push(b);
            adjacency[b].push(a);
        }

        result.order.clear();
        let mut placed = vec![false; beads];
        placed[0] = true;
        self.queue.clear();
        self.queue.push_back(0);
        while let Some(parent) = self.queue.pop_front() {
            result.order.push(parent);
            for &child in &adjacency[parent] {
                if !placed[child] {
                    placed[child] = true;
                    self.place(parent, child, rng, result)?;
                    self.queue.push_back(child);
                }
            }
        }
        Ok(())
    }

    /// Uniform labeled tree on `beads` vertices, decoded from a random Prüfer sequence.
    fn random_tree(&mut self, beads: usize, rng: &mut dyn RandomSource) -> Vec<(usize, usize)> {
        let mut edges = Vec::with_capacity(beads.saturating_sub(1));
        if beads < 2 {
            return edges;
        }
        let code: Vec<usize> = (0..beads - 2).map(|_| rng.next_index(beads)).collect();
        self.degree.clear();
        self.degree.resize(beads, 1);
        for &v in &code {
            self.degree[v] += 1;
        }
        for &v in &code {
            if let Some(leaf) = (0..beads).find(|&u| self.degree[u] == 1) {
                edges.push((leaf, v));
                self.degree[leaf] -= 1;
                self.degree[v] -= 1;
            }
        }
        let mut last = (0..beads).filter(|&u| self.degree[u] == 1);
        if let (Some(a), Some(b)) = (last.next(), last.next()) {
            edges.push((a, b));
        }
        edges
    }

    fn grow_ring(
        &mut self,
        beads: usize,
        rng: &mut dyn RandomSource,
        result: &mut GrowthResult,
    ) -> Result<(), MoveError> {
        result.order = rng.permutation(beads);
        self.closer.close(&mut result.positions, &result.order, rng)?;
        let sigma = self.config.sigma.sigma(0, 0);
        if sigma != 1.0 {
            for &bead in &result.order[1..] {
                result.positions[bead].coords *= sigma;
            }
        }
        match beads {
            1 => {}
            2 => result.edges.push((result.order[0], result.order[1])),
            _ => {
                for k in 0..beads {
                    result
                        .edges
                        .push((result.order[k], result.order[(k + 1) % beads]));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::separation::separation_probability;
    use crate::engine::config::{BondModel, GrowthConfigBuilder};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::sync::Arc;

    fn sampler(mode: GrowthMode) -> ChainGrowthSampler {
        ChainGrowthSampler::new(GrowthConfigBuilder::new().mode(mode).build().unwrap()).unwrap()
    }

    fn assert_bonds_within(result: &GrowthResult, sigma: impl Fn(usize, usize) -> f64) {
        for &(a, b) in &result.edges {
            let d = (result.positions[a] - result.positions[b]).norm();
            assert!(d <= sigma(a, b) + 1e-12, "bond ({a}, {b}) has length {d}");
        }
    }

    #[test]
    fn chain_follows_the_visiting_order() {
        let mut s = sampler(GrowthMode::Chain);
        let mut rng = StdRng::seed_from_u64(80);
        let result = s.sample(7, &mut rng).unwrap();
        assert_eq!(result.positions[result.order[0]], Point3::origin());
        assert_eq!(result.edges.len(), 6);
        for (k, &(a, b)) in result.edges.iter().enumerate() {
            assert_eq!((a, b), (result.order[k], result.order[k + 1]));
        }
        assert_bonds_within(&result, |_, _| 1.0);
    }

    // Five bonds, six beads: the end-to-end distance has radial density
    // proportional to r^2 p(5, r).
    #[test]
    fn chain_end_to_end_distance_matches_the_separation_density() {
        let bonds = 5;
        let samples = 100_000;
        let bins = 25;
        let width = bonds as f64 / bins as f64;
        let mut s = sampler(GrowthMode::Chain);
        let mut rng = StdRng::seed_from_u64(81);
        let mut histogram = vec![0usize; bins];
        let mut result = GrowthResult::default();
        for _ in 0..samples {
            s.sample_into(bonds + 1, &mut rng, &mut result).unwrap();
            let first = result.positions[result.order[0]];
            let last = result.positions[result.order[bonds]];
            let r = (last - first).norm();
            histogram[((r / width) as usize).min(bins - 1)] += 1;
        }

        let fine = 200;
        let expected: Vec<f64> = (0..bins)
            .map(|b| {
                (0..fine)
                    .map(|k| {
                        let r = (b as f64 + (k as f64 + 0.5) / fine as f64) * width;
                        r * r * separation_probability(bonds, r)
                    })
                    .sum::<f64>()
            })
            .collect();
        let total: f64 = expected.iter().sum();
        for b in 0..bins {
            let observed = histogram[b] as f64 / samples as f64;
            let target = expected[b] / total;
            assert!(
                (observed - target).abs() < 0.02,
                "bin {b}: observed {observed}, expected {target}"
            );
        }
    }

    #[test]
    fn tree_is_spanning_and_grown_breadth_first() {
        let mut s = sampler(GrowthMode::Tree);
        let mut rng = StdRng::seed_from_u64(82);
        for beads in 1..12 {
            let result = s.sample(beads, &mut rng).unwrap();
            assert_eq!(result.edges.len(), beads - 1);
            assert_eq!(result.order.len(), beads);
            assert_eq!(result.order[0], 0);
            assert_eq!(result.positions[0], Point3::origin());
            let mut seen = vec![false; beads];
            seen[0] = true;
            for &(parent, child) in &result.edges {
                assert!(seen[parent]);
                assert!(!seen[child]);
                seen[child] = true;
            }
            assert!(seen.iter().all(|&x| x));
            assert_bonds_within(&result, |_, _| 1.0);
        }
    }

    #[test]
    fn random_trees_cover_every_shape_on_four_vertices() {
        let mut s = sampler(GrowthMode::Tree);
        let mut rng = StdRng::seed_from_u64(83);
        let mut stars = 0;
        let trials = 16_000;
        for _ in 0..trials {
            let tree = s.random_tree(4, &mut rng);
            let mut degree = [0; 4];
            for (a, b) in tree {
                degree[a] += 1;
                degree[b] += 1;
            }
            if degree.contains(&3) {
                stars += 1;
            }
        }
        // 4 of the 16 labeled trees on four vertices are stars.
        let fraction = stars as f64 / trials as f64;
        assert!((fraction - 0.25).abs() < 0.02, "fraction = {fraction}");
    }

    #[test]
    fn mixed_sigma_scales_each_bond() {
        let config = GrowthConfigBuilder::new()
            .mode(GrowthMode::Chain)
            .sigma(PairSigma::Custom(Arc::new(|i: usize, j: usize| 0.5 + 0.25 * (i.min(j) % 3) as f64)))
            .build()
            .unwrap();
        let mut s = ChainGrowthSampler::new(config).unwrap();
        let mut rng = StdRng::seed_from_u64(84);
        for _ in 0..500 {
            let result = s.sample(9, &mut rng).unwrap();
            assert_bonds_within(&result, |i, j| 0.5 + 0.25 * (i.min(j) % 3) as f64);
        }
    }

    #[test]
    fn ring_closes_with_scaled_sigma() {
        let config = GrowthConfigBuilder::new()
            .mode(GrowthMode::Ring)
            .sigma(PairSigma::Uniform(2.0))
            .build()
            .unwrap();
        let mut s = ChainGrowthSampler::new(config).unwrap();
        let mut rng = StdRng::seed_from_u64(85);
        for _ in 0..500 {
            let result = s.sample(8, &mut rng).unwrap();
            assert_eq!(result.edges.len(), 8);
            assert_eq!(result.positions[result.order[0]], Point3::origin());
            for &(a, b) in &result.edges {
                assert!((result.positions[a] - result.positions[b]).norm() < 2.0);
            }
        }
        assert_eq!(s.ring_statistics().inserts(8), 500);
    }

    #[test]
    fn unsupported_ring_and_short_sigma_table_are_rejected() {
        let mut s = sampler(GrowthMode::Ring);
        let mut rng = StdRng::seed_from_u64(86);
        assert!(matches!(
            s.sample(13, &mut rng),
            Err(MoveError::UnsupportedRingSize { beads: 13 })
        ));

        let config = GrowthConfigBuilder::new()
            .mode(GrowthMode::Tree)
            .sigma(PairSigma::Table(vec![vec![1.0; 3]; 3]))
            .build()
            .unwrap();
        let s = ChainGrowthSampler::new(config).unwrap();
        assert!(matches!(
            s.check_bead_count(4),
            Err(MoveError::Config { .. })
        ));
    }

    #[test]
    fn square_well_chain_respects_the_outer_radius() {
        let config = GrowthConfigBuilder::new()
            .mode(GrowthMode::Chain)
            .bond(BondModel::SquareWell {
                lambda: 1.5,
                temperature: 0.8,
            })
            .build()
            .unwrap();
        let mut s = ChainGrowthSampler::new(config).unwrap();
        let mut rng = StdRng::seed_from_u64(87);
        for _ in 0..500 {
            let result = s.sample(5, &mut rng).unwrap();
            assert_bonds_within(&result, |_, _| 1.5);
        }
    }
}
