//! Cluster weights: the Mayer-diagram value that Mayer sampling draws configurations from.
//!
//! A [`ClusterWeight`] maps a configuration to a non-negative weight. Moves read
//! it before and after every trial, and the ratio enters the acceptance
//! probability. The lifecycle hooks let weights that cache per-pair values
//! invalidate, commit, or roll back those caches.

use crate::core::models::sim_box::SimulationBox;

pub trait ClusterWeight {
    /// Non-negative weight of the current configuration. Zero marks a
    /// configuration the sampled diagram does not contribute to.
    fn value(&self, sim: &SimulationBox) -> f64;

    fn trial_notify(&mut self) {}

    fn accept_notify(&mut self) {}

    fn reject_notify(&mut self) {}
}

/// Weight one for every configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitCluster;

impl ClusterWeight for UnitCluster {
    fn value(&self, _sim: &SimulationBox) -> f64 {
        1.0
    }
}

/// Product of hard-sphere overlap indicators along a chain or ring of molecules.
///
/// Two molecules overlap when any pair of their atoms is closer than `sigma`.
/// The weight is one when every consecutive pair `(i, i + 1)` overlaps (and the
/// closing pair `(n - 1, 0)` for a ring), and zero otherwise. This is the
/// absolute value of the corresponding hard-sphere Mayer diagram.
#[derive(Debug, Clone, Copy)]
pub struct OverlapCluster {
    pub sigma: f64,
    pub ring: bool,
}

impl OverlapCluster {
    pub fn chain(sigma: f64) -> Self {
        Self { sigma, ring: false }
    }

    pub fn ring(sigma: f64) -> Self {
        Self { sigma, ring: true }
    }

    fn overlaps(&self, sim: &SimulationBox, i: usize, j: usize) -> bool {
        let sigma2 = self.sigma * self.sigma;
        let (mi, mj) = (sim.molecule(i), sim.molecule(j));
        mi.atoms.iter().any(|a| {
            mj.atoms
                .iter()
                .any(|b| sim.separation(&a.position, &b.position).norm_squared() < sigma2)
        })
    }
}

impl ClusterWeight for OverlapCluster {
    fn value(&self, sim: &SimulationBox) -> f64 {
        let n = sim.molecule_count();
        if n < 2 {
            return 1.0;
        }
        let chained = (0..n - 1).all(|i| self.overlaps(sim, i, i + 1));
        let closed = !self.ring || n < 3 || self.overlaps(sim, n - 1, 0);
        if chained && closed { 1.0 } else { 0.0 }
    }
}

/// Adapts a closure into a cluster weight.
pub struct FnCluster<F>(pub F);

impl<F> ClusterWeight for FnCluster<F>
where
    F: Fn(&SimulationBox) -> f64,
{
    fn value(&self, sim: &SimulationBox) -> f64 {
        (self.0)(sim)
    }
}
