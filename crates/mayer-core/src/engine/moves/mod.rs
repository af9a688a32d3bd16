//! Monte Carlo moves and their shared trial life cycle.
//!
//! Every move follows the same protocol:
//!
//! 1. [`MonteCarloMove::do_trial`] captures the old energy and cluster weight,
//!    performs one stochastic perturbation, notifies the box, and captures the
//!    new energy and weight. `Ok(false)` means the move cannot act on the current
//!    configuration and the driver must skip acceptance.
//! 2. [`MonteCarloMove::chi`] turns the captured scalars (and any move-specific
//!    bias) into the acceptance ratio.
//! 3. Exactly one of [`MonteCarloMove::accept_notify`] or
//!    [`MonteCarloMove::reject_notify`] follows. Rejection restores the pre-trial
//!    atoms bit-for-bit.
//!
//! Calling accept or reject without a preceding successful trial panics.
//! Growth moves build configurations from scratch, have no reverse move, and panic
//! when rejected; their chi is always one.

pub mod angle;
pub mod bond_length;
pub mod growth;
pub mod ring_regrow;
pub mod rotate;
pub mod stretch;
pub mod torsion;
pub mod torsion_multi;
pub mod translate;

use super::error::MoveError;
use crate::core::models::bonding::MoleculeGraph;
use crate::core::models::sim_box::SimulationBox;
use crate::core::random::RandomSource;
use tracing::{trace, warn};

pub trait MonteCarloMove {
    fn name(&self) -> &'static str;

    /// Sizes per-box state and validates that the box suits the move.
    fn bind(&mut self, sim: &SimulationBox) -> Result<(), MoveError>;

    fn do_trial(
        &mut self,
        sim: &mut SimulationBox,
        rng: &mut dyn RandomSource,
    ) -> Result<bool, MoveError>;

    /// Acceptance ratio of the last trial. Always non-negative and `+inf` when the
    /// trial leaves a zero-weight configuration for a positive-weight one.
    fn chi(&self, temperature: f64) -> f64;

    fn accept_notify(&mut self, sim: &mut SimulationBox);

    fn reject_notify(&mut self, sim: &mut SimulationBox);

    /// Whether the move may be rejected.
    fn is_reversible(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrialPhase {
    #[default]
    Idle,
    Trialed,
}

/// The scalars a trial records for its acceptance ratio.
#[derive(Debug, Clone, Copy)]
pub struct TrialState {
    phase: TrialPhase,
    pub u_old: f64,
    pub u_new: f64,
    pub w_old: f64,
    pub w_new: f64,
    /// Move-specific factor such as a Jacobian or a Rosenbluth weight ratio.
    pub bias: f64,
}

impl Default for TrialState {
    fn default() -> Self {
        Self {
            phase: TrialPhase::Idle,
            u_old: 0.0,
            u_new: 0.0,
            w_old: 0.0,
            w_new: 0.0,
            bias: 1.0,
        }
    }
}

impl TrialState {
    pub fn phase(&self) -> TrialPhase {
        self.phase
    }

    /// Records the pre-trial weight, and the energy when `with_energy` is set.
    pub fn begin(&mut self, sim: &SimulationBox, with_energy: bool) {
        self.w_old = sim.cluster_weight();
        self.u_old = if with_energy { sim.energy(false) } else { 0.0 };
        self.bias = 1.0;
    }

    /// Notifies the box of the trial and records the post-trial scalars.
    pub fn finish(&mut self, sim: &mut SimulationBox, with_energy: bool) {
        sim.trial_notify();
        self.w_new = sim.cluster_weight();
        self.u_new = if with_energy { sim.energy(false) } else { 0.0 };
        self.phase = TrialPhase::Trialed;
        trace!(
            u_old = self.u_old,
            u_new = self.u_new,
            w_old = self.w_old,
            w_new = self.w_new,
            bias = self.bias,
            "trial finished"
        );
    }

    /// Returns the state to idle after accept or reject.
    ///
    /// # Panics
    ///
    /// Panics when no trial is pending.
    pub fn settle(&mut self, move_name: &str) {
        assert!(
            self.phase == TrialPhase::Trialed,
            "{move_name}: accept or reject called without a preceding trial"
        );
        self.phase = TrialPhase::Idle;
    }

    /// Settles an accepted trial, warning when it moved the chain onto a
    /// zero-weight configuration.
    ///
    /// # Panics
    ///
    /// Panics when no trial is pending.
    pub fn accept(&mut self, move_name: &str) {
        self.settle(move_name);
        if self.enters_zero_weight() {
            warn!(
                move_name,
                w_old = self.w_old,
                "accepted a trial into a zero-weight configuration"
            );
        }
    }

    /// Whether the trial left a positive cluster weight for a zero one.
    pub fn enters_zero_weight(&self) -> bool {
        self.w_old != 0.0 && self.w_new == 0.0
    }

    pub fn weight_ratio(&self) -> f64 {
        weight_ratio(self.w_old, self.w_new)
    }

    /// `bias * (w_new / w_old) * exp(-(u_new - u_old) / T)`.
    pub fn energy_chi(&self, temperature: f64) -> f64 {
        if self.bias == 0.0 {
            return 0.0;
        }
        let boltzmann = boltzmann_factor(self.u_old, self.u_new, temperature);
        combine(self.weight_ratio(), product(self.bias, boltzmann))
    }

    /// `bias * (w_new / w_old)`.
    pub fn cluster_chi(&self) -> f64 {
        if self.bias == 0.0 {
            return 0.0;
        }
        combine(self.weight_ratio(), self.bias)
    }
}

/// Cluster-weight ratio with the zero-weight conventions: a trial from zero to
/// zero has ratio one, from positive to zero ratio zero, and from zero to
/// positive ratio `+inf`.
pub fn weight_ratio(w_old: f64, w_new: f64) -> f64 {
    if w_new == 0.0 {
        if w_old == 0.0 { 1.0 } else { 0.0 }
    } else if w_old == 0.0 {
        f64::INFINITY
    } else {
        w_new / w_old
    }
}

/// `exp(-(u_new - u_old) / T)`, exactly one when the energies are equal
/// (including two infinite energies).
pub fn boltzmann_factor(u_old: f64, u_new: f64, temperature: f64) -> f64 {
    if u_new == u_old {
        1.0
    } else {
        (-(u_new - u_old) / temperature).exp()
    }
}

// Zero and infinite weight ratios dominate every other factor.
fn combine(ratio: f64, factor: f64) -> f64 {
    if ratio == 0.0 || ratio.is_infinite() {
        ratio
    } else {
        ratio * factor
    }
}

// A zero factor wins over an infinite one.
fn product(a: f64, b: f64) -> f64 {
    if a == 0.0 || b == 0.0 { 0.0 } else { a * b }
}

pub(crate) fn random_step(rng: &mut dyn RandomSource, step: f64) -> f64 {
    step * (2.0 * rng.next_f64() - 1.0)
}

/// Per-species lists of the sites an intramolecular move can act on.
#[derive(Debug, Clone, Default)]
pub(crate) struct SiteTable<T> {
    per_species: Vec<Vec<T>>,
    molecules: Vec<usize>,
}

impl<T: Copy> SiteTable<T> {
    /// Collects sites for every species and the molecules that have any.
    pub(crate) fn build<F>(sim: &SimulationBox, sites_of: F) -> Self
    where
        F: Fn(&MoleculeGraph) -> Vec<T>,
    {
        let per_species: Vec<Vec<T>> = (0..sim.species_count())
            .map(|s| sites_of(sim.graph(s)))
            .collect();
        let molecules = sim
            .molecules()
            .iter()
            .filter(|m| !per_species[m.species].is_empty())
            .map(|m| m.index)
            .collect();
        Self {
            per_species,
            molecules,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.molecules.is_empty()
    }

    pub(crate) fn sites(&self, species: usize) -> &[T] {
        &self.per_species[species]
    }

    /// Picks a molecule with at least one site, then one of its sites.
    pub(crate) fn pick(&self, sim: &SimulationBox, rng: &mut dyn RandomSource) -> (usize, T) {
        let molecule = self.molecules[rng.next_index(self.molecules.len())];
        let sites = &self.per_species[sim.molecule(molecule).species];
        (molecule, sites[rng.next_index(sites.len())])
    }
}
