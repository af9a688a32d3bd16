use super::{MonteCarloMove, TrialState, random_step};
use crate::core::models::sim_box::SimulationBox;
use crate::core::random::RandomSource;
use crate::engine::error::MoveError;
use crate::engine::snapshot::AtomSnapshot;
use nalgebra::Vector3;
use tracing::{debug, instrument};

/// Rigid displacement of every molecule except the first.
///
/// Each molecule gets an independent displacement uniform in a cube of
/// half-width `step`. The first molecule stays put and anchors the cluster.
/// Acceptance uses the cluster weight only.
#[derive(Debug)]
pub struct TranslateMove {
    step: f64,
    bound: bool,
    state: TrialState,
    snapshot: AtomSnapshot,
}

impl TranslateMove {
    pub fn new(step: f64) -> Self {
        Self {
            step,
            bound: false,
            state: TrialState::default(),
            snapshot: AtomSnapshot::new(),
        }
    }

    pub fn step(&self) -> f64 {
        self.step
    }
}

impl MonteCarloMove for TranslateMove {
    fn name(&self) -> &'static str {
        "translate"
    }

    fn bind(&mut self, sim: &SimulationBox) -> Result<(), MoveError> {
        self.bound = true;
        debug!(molecules = sim.molecule_count(), step = self.step, "translate move bound");
        Ok(())
    }

    #[instrument(level = "trace", skip_all)]
    fn do_trial(
        &mut self,
        sim: &mut SimulationBox,
        rng: &mut dyn RandomSource,
    ) -> Result<bool, MoveError> {
        if !self.bound {
            return Err(MoveError::NotBound {
                move_name: self.name(),
            });
        }
        if sim.molecule_count() < 2 {
            return Ok(false);
        }
        self.state.begin(sim, false);
        self.snapshot.clear();
        for molecule in 1..sim.molecule_count() {
            self.snapshot.capture_molecule(sim, molecule);
            let delta = Vector3::new(
                random_step(rng, self.step),
                random_step(rng, self.step),
                random_step(rng, self.step),
            );
            sim.translate_molecule(molecule, &delta);
        }
        self.state.finish(sim, false);
        Ok(true)
    }

    fn chi(&self, _temperature: f64) -> f64 {
        self.state.cluster_chi()
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
    use crate::core::cluster::OverlapCluster;
    use crate::engine::moves::test_support::{chain_box, positions};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn unbound_move_reports_an_error() {
        let mut sim = chain_box(2, 1);
        let mut rng = StdRng::seed_from_u64(1);
        let mut mv = TranslateMove::new(0.5);
        assert!(matches!(
            mv.do_trial(&mut sim, &mut rng),
            Err(MoveError::NotBound { .. })
        ));
    }

    #[test]
    fn single_molecule_is_infeasible() {
        let mut sim = chain_box(1, 2);
        let mut rng = StdRng::seed_from_u64(1);
        let mut mv = TranslateMove::new(0.5);
        mv.bind(&sim).unwrap();
        assert!(!mv.do_trial(&mut sim, &mut rng).unwrap());
        assert_eq!(sim.lifecycle_counts().trials, 0);
    }

    #[test]
    fn first_molecule_stays_fixed_and_others_move_rigidly() {
        let mut sim = chain_box(3, 3);
        let before = sim.molecules().to_vec();
        let mut rng = StdRng::seed_from_u64(9);
        let mut mv = TranslateMove::new(0.5);
        mv.bind(&sim).unwrap();
        assert!(mv.do_trial(&mut sim, &mut rng).unwrap());
        assert_eq!(sim.molecule(0), &before[0]);
        for m in 1..3 {
            let shift = sim.molecule(m).atoms[0].position - before[m].atoms[0].position;
            assert!(shift.amax() <= 0.5);
            for (a, b) in sim.molecule(m).atoms.iter().zip(&before[m].atoms) {
                assert!(((a.position - b.position) - shift).norm() < 1e-12);
            }
        }
        mv.accept_notify(&mut sim);
        assert_eq!(sim.lifecycle_counts().accepts, 1);
    }

    #[test]
    fn rejection_restores_positions_exactly() {
        let mut sim = chain_box(3, 2).with_cluster(Box::new(OverlapCluster::chain(1.0)));
        let before = positions(&sim);
        let mut rng = StdRng::seed_from_u64(4);
        let mut mv = TranslateMove::new(1.0);
        mv.bind(&sim).unwrap();
        for _ in 0..20 {
            assert!(mv.do_trial(&mut sim, &mut rng).unwrap());
            assert!(mv.chi(1.0) >= 0.0);
            mv.reject_notify(&mut sim);
            assert_eq!(positions(&sim), before);
        }
        assert_eq!(sim.lifecycle_counts().rejects, 20);
    }
}
