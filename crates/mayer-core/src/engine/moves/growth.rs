use super::{MonteCarloMove, TrialState};
use crate::core::models::sim_box::SimulationBox;
use crate::core::random::RandomSource;
use crate::engine::config::{ConfigError, GrowthConfig, GrowthTarget};
use crate::engine::error::MoveError;
use crate::engine::growth::{ChainGrowthSampler, GrowthResult};
use crate::engine::growth::ring::RingStatistics;
use tracing::{debug, instrument};

/// Regrows the whole configuration with a [`ChainGrowthSampler`].
///
/// The new configuration is drawn independently of the old one, so the move has
/// no reverse and its chi is always one. Drivers must accept every successful
/// trial.
///
/// With [`GrowthTarget::Atoms`] every leaf is a point particle: only positions
/// are replaced, and any orientation an atom carries is left untouched.
#[derive(Debug)]
pub struct ChainGrowthMove {
    sampler: ChainGrowthSampler,
    beads: Option<usize>,
    grown: GrowthResult,
    state: TrialState,
}

impl ChainGrowthMove {
    pub fn new(config: GrowthConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            sampler: ChainGrowthSampler::new(config)?,
            beads: None,
            grown: GrowthResult::default(),
            state: TrialState::default(),
        })
    }

    /// The configuration produced by the last trial.
    pub fn last_growth(&self) -> &GrowthResult {
        &self.grown
    }

    pub fn ring_statistics(&self) -> &RingStatistics {
        self.sampler.ring_statistics()
    }
}

impl MonteCarloMove for ChainGrowthMove {
    fn name(&self) -> &'static str {
        "chain_growth"
    }

    fn bind(&mut self, sim: &SimulationBox) -> Result<(), MoveError> {
        let beads = match self.sampler.config().target {
            GrowthTarget::Atoms => sim.leaf_count(),
            GrowthTarget::Molecules => sim.molecule_count(),
        };
        self.sampler.check_bead_count(beads)?;
        debug!(beads, mode = ?self.sampler.config().mode, "chain growth move bound");
        self.beads = Some(beads);
        Ok(())
    }

    #[instrument(level = "trace", skip_all)]
    fn do_trial(
        &mut self,
        sim: &mut SimulationBox,
        rng: &mut dyn RandomSource,
    ) -> Result<bool, MoveError> {
        let beads = self.beads.ok_or(MoveError::NotBound {
            move_name: "chain_growth",
        })?;
        self.state.begin(sim, false);
        self.sampler.sample_into(beads, rng, &mut self.grown)?;

        match self.sampler.config().target {
            GrowthTarget::Atoms => {
                for (leaf, position) in self.grown.positions.iter().enumerate() {
                    sim.leaf_mut(leaf).position = *position;
                }
            }
            GrowthTarget::Molecules => {
                for (molecule, position) in self.grown.positions.iter().enumerate() {
                    if let Some(anchor) = sim.molecule(molecule).atoms.first() {
                        let delta = position - anchor.position;
                        sim.translate_molecule(molecule, &delta);
                    }
                }
            }
        }

        self.state.finish(sim, false);
        Ok(true)
    }

    fn chi(&self, _temperature: f64) -> f64 {
        1.0
    }

    fn accept_notify(&mut self, sim: &mut SimulationBox) {
        self.state.accept(self.name());
        sim.accept_notify();
    }

    /// # Panics
    ///
    /// Always. A regrown configuration has no reverse move.
    fn reject_notify(&mut self, _sim: &mut SimulationBox) {
        panic!("{} moves cannot be rejected", self.name());
    }

    fn is_reversible(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::{Atom, Orientation};
    use crate::core::models::bonding::MoleculeGraph;
    use crate::core::models::sim_box::Boundary;
    use crate::engine::config::{GrowthConfigBuilder, GrowthMode, PairSigma};
    use nalgebra::{Point3, Unit, Vector3};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn monomer_box(n: usize) -> SimulationBox {
        let mut sim = SimulationBox::new(Boundary::Open);
        let species = sim.add_species(MoleculeGraph::unbonded(1));
        for k in 0..n {
            sim.add_molecule(species, vec![Atom::new(Point3::new(k as f64 * 5.0, 0.0, 0.0))])
                .unwrap();
        }
        sim
    }

    fn growth_move(mode: GrowthMode) -> ChainGrowthMove {
        ChainGrowthMove::new(GrowthConfigBuilder::new().mode(mode).build().unwrap()).unwrap()
    }

    #[test]
    fn ring_neighbors_overlap_in_every_grown_box() {
        let mut sim = monomer_box(6);
        let mut rng = StdRng::seed_from_u64(90);
        let mut mv = growth_move(GrowthMode::Ring);
        mv.bind(&sim).unwrap();
        for _ in 0..10_000 {
            assert!(mv.do_trial(&mut sim, &mut rng).unwrap());
            assert_eq!(mv.chi(1.0), 1.0);
            mv.accept_notify(&mut sim);
            let edges = &mv.last_growth().edges;
            assert_eq!(edges.len(), 6);
            for &(a, b) in edges {
                assert!((sim.leaf(a).position - sim.leaf(b).position).norm() < 1.0);
            }
        }
        assert_eq!(sim.lifecycle_counts().accepts, 10_000);
        assert_eq!(mv.ring_statistics().inserts(6), 10_000);
    }

    #[test]
    fn atom_target_moves_positions_and_keeps_orientations() {
        let mut sim = SimulationBox::new(Boundary::Open);
        let species = sim.add_species(MoleculeGraph::unbonded(1));
        let axes: Vec<_> = (0..4)
            .map(|k| Orientation::Direction(Unit::new_normalize(Vector3::new(1.0, k as f64, 0.5))))
            .collect();
        for (k, axis) in axes.iter().enumerate() {
            let atom = Atom::new(Point3::new(k as f64 * 5.0, 0.0, 0.0)).with_orientation(*axis);
            sim.add_molecule(species, vec![atom]).unwrap();
        }
        let mut rng = StdRng::seed_from_u64(93);
        let mut mv = growth_move(GrowthMode::Chain);
        mv.bind(&sim).unwrap();
        for _ in 0..5 {
            assert!(mv.do_trial(&mut sim, &mut rng).unwrap());
            mv.accept_notify(&mut sim);
            for (leaf, axis) in axes.iter().enumerate() {
                assert_eq!(sim.leaf(leaf).position, mv.last_growth().positions[leaf]);
                assert_eq!(sim.leaf(leaf).orientation, Some(*axis));
            }
        }
    }

    #[test]
    fn molecule_target_moves_molecules_rigidly() {
        let mut sim = SimulationBox::new(Boundary::Open);
        let species = sim.add_species(MoleculeGraph::linear(2));
        for k in 0..4 {
            let x = 3.0 * k as f64;
            sim.add_molecule(
                species,
                vec![
                    Atom::new(Point3::new(x, 0.0, 0.0)),
                    Atom::new(Point3::new(x + 0.4, 0.3, 0.0)),
                ],
            )
            .unwrap();
        }
        let config = GrowthConfigBuilder::new()
            .mode(GrowthMode::Tree)
            .sigma(PairSigma::Uniform(1.2))
            .target(GrowthTarget::Molecules)
            .build()
            .unwrap();
        let mut mv = ChainGrowthMove::new(config).unwrap();
        let mut rng = StdRng::seed_from_u64(91);
        mv.bind(&sim).unwrap();
        assert!(mv.do_trial(&mut sim, &mut rng).unwrap());
        mv.accept_notify(&mut sim);

        for m in 0..4 {
            let atoms = &sim.molecule(m).atoms;
            assert!((atoms[0].position - mv.last_growth().positions[m]).norm() < 1e-12);
            let internal = atoms[1].position - atoms[0].position;
            assert!((internal - nalgebra::Vector3::new(0.4, 0.3, 0.0)).norm() < 1e-12);
        }
        for &(a, b) in &mv.last_growth().edges {
            let d = sim.molecule(a).atoms[0].position - sim.molecule(b).atoms[0].position;
            assert!(d.norm() <= 1.2 + 1e-12);
        }
    }

    #[test]
    fn binding_rejects_unsupported_ring_sizes() {
        let sim = monomer_box(13);
        let mut mv = growth_move(GrowthMode::Ring);
        assert!(matches!(
            mv.bind(&sim),
            Err(MoveError::UnsupportedRingSize { beads: 13 })
        ));
    }

    #[test]
    fn growth_moves_are_irreversible() {
        let mv = growth_move(GrowthMode::Chain);
        assert!(!mv.is_reversible());
    }

    #[test]
    #[should_panic(expected = "cannot be rejected")]
    fn rejecting_a_growth_move_panics() {
        let mut sim = monomer_box(3);
        let mut rng = StdRng::seed_from_u64(92);
        let mut mv = growth_move(GrowthMode::Chain);
        mv.bind(&sim).unwrap();
        mv.do_trial(&mut sim, &mut rng).unwrap();
        mv.reject_notify(&mut sim);
    }
}
