use super::torsion::rotate_torsion;
use super::{MonteCarloMove, SiteTable, TrialState, random_step};
use crate::core::models::sim_box::SimulationBox;
use crate::core::random::RandomSource;
use crate::engine::error::MoveError;
use crate::engine::snapshot::AtomSnapshot;
use crate::engine::transform::{BondedTransformer, recenter};
use tracing::{debug, instrument, trace};

/// One torsion rotation in every molecule except the first, in a single trial.
///
/// Each molecule with torsion bonds gets its own random bond, side, and angle,
/// and is moved back to its pre-trial center of mass afterward. The first
/// molecule anchors the cluster and is never touched.
#[derive(Debug)]
pub struct TorsionMultiMove {
    step: f64,
    sites: Option<SiteTable<(usize, usize)>>,
    transformer: BondedTransformer,
    state: TrialState,
    snapshot: AtomSnapshot,
}

impl TorsionMultiMove {
    pub fn new(step: f64) -> Self {
        Self {
            step,
            sites: None,
            transformer: BondedTransformer::new(),
            state: TrialState::default(),
            snapshot: AtomSnapshot::new(),
        }
    }
}

impl MonteCarloMove for TorsionMultiMove {
    fn name(&self) -> &'static str {
        "torsion_multi"
    }

    fn bind(&mut self, sim: &SimulationBox) -> Result<(), MoveError> {
        let sites = SiteTable::build(sim, |graph| graph.torsion_bonds());
        if sites.is_empty() {
            return Err(MoveError::NoEligibleSites {
                move_name: self.name(),
            });
        }
        debug!(
            molecules = sim.molecule_count(),
            step = self.step,
            "multi-molecule torsion move bound"
        );
        self.sites = Some(sites);
        Ok(())
    }

    #[instrument(level = "trace", skip_all)]
    fn do_trial(
        &mut self,
        sim: &mut SimulationBox,
        rng: &mut dyn RandomSource,
    ) -> Result<bool, MoveError> {
        let sites = self.sites.as_ref().ok_or(MoveError::NotBound {
            move_name: "torsion_multi",
        })?;
        if sim.molecule_count() < 2 {
            return Ok(false);
        }

        self.state.begin(sim, true);
        self.snapshot.clear();
        for molecule in 1..sim.molecule_count() {
            let bonds = sites.sites(sim.molecule(molecule).species);
            if bonds.is_empty() {
                continue;
            }
            let (i, j) = bonds[rng.next_index(bonds.len())];
            let (b, c) = if rng.next_f64() < 0.5 { (i, j) } else { (j, i) };
            let dt = random_step(rng, self.step);

            self.snapshot.capture_molecule(sim, molecule);
            let (atoms, graph) = sim.molecule_parts_mut(molecule);
            let shift = rotate_torsion(atoms, graph, &mut self.transformer, b, c, dt);
            recenter(atoms, &shift);
            trace!(molecule, b, c, dt, "rotated torsion");
        }

        self.state.finish(sim, true);
        Ok(true)
    }

    fn chi(&self, temperature: f64) -> f64 {
        self.state.energy_chi(temperature)
    }

    fn accept_notify(&mut self, sim: &mut SimulationBox) {
        self.state.accept(self.name());
        sim.accept_notify();
    }

    fn reject_notify(&mut self, sim: &mut SimulationBox) {
        self.state.settle(self.name());
        self.snapshot.restore(sim);
        sim.reject_notify();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::moves::test_support::{chain_box, positions};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const TOLERANCE: f64 = 1e-10;

    #[test]
    fn every_molecule_but_the_first_is_twisted_in_place() {
        let mut sim = chain_box(3, 5);
        let first = sim.molecule(0).clone();
        let coms: Vec<_> = sim.molecules().iter().map(|m| m.center_of_mass()).collect();
        let mut rng = StdRng::seed_from_u64(5);
        let mut mv = TorsionMultiMove::new(1.0);
        mv.bind(&sim).unwrap();
        assert!(mv.do_trial(&mut sim, &mut rng).unwrap());

        assert_eq!(sim.molecule(0), &first);
        assert_eq!(mv.snapshot.captured(), &[1, 2]);
        for m in 1..3 {
            assert!((sim.molecule(m).center_of_mass() - coms[m]).norm() < TOLERANCE);
        }
        mv.accept_notify(&mut sim);
    }

    #[test]
    fn rejection_restores_all_twisted_molecules() {
        let mut sim = chain_box(4, 4);
        let before = positions(&sim);
        let mut rng = StdRng::seed_from_u64(6);
        let mut mv = TorsionMultiMove::new(2.0);
        mv.bind(&sim).unwrap();
        for _ in 0..10 {
            assert!(mv.do_trial(&mut sim, &mut rng).unwrap());
            mv.reject_notify(&mut sim);
            assert_eq!(positions(&sim), before);
        }
    }

    #[test]
    fn lone_molecule_is_infeasible() {
        let mut sim = chain_box(1, 4);
        let mut rng = StdRng::seed_from_u64(6);
        let mut mv = TorsionMultiMove::new(2.0);
        mv.bind(&sim).unwrap();
        assert!(!mv.do_trial(&mut sim, &mut rng).unwrap());
    }
}
