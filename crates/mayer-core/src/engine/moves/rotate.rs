use super::{MonteCarloMove, TrialState, random_step};
use crate::core::models::sim_box::SimulationBox;
use crate::core::random::RandomSource;
use crate::core::utils::geometry::rotation_about_axis;
use crate::engine::error::MoveError;
use crate::engine::snapshot::AtomSnapshot;
use crate::engine::transform::RigidTransform;
use tracing::{debug, instrument};

/// Rigid rotation of every molecule except the first about its center of mass.
///
/// The axis is uniform on the sphere and the angle uniform in `[-step, step]`.
/// Orientations rotate with the atoms. Acceptance uses the cluster weight only.
#[derive(Debug)]
pub struct RotateMove {
    step: f64,
    bound: bool,
    state: TrialState,
    snapshot: AtomSnapshot,
}

impl RotateMove {
    pub fn new(step: f64) -> Self {
        Self {
            step,
            bound: false,
            state: TrialState::default(),
            snapshot: AtomSnapshot::new(),
        }
    }
}

impl MonteCarloMove for RotateMove {
    fn name(&self) -> &'static str {
        "rotate"
    }

    fn bind(&mut self, sim: &SimulationBox) -> Result<(), MoveError> {
        self.bound = true;
        debug!(molecules = sim.molecule_count(), step = self.step, "rotate move bound");
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
            let axis = rng.unit_vector();
            let angle = random_step(rng, self.step);
            let transform = RigidTransform::Rotation {
                rotation: rotation_about_axis(&axis, angle),
                pivot: sim.molecule(molecule).center_of_mass(),
            };
            for atom in sim.atoms_mut(molecule) {
                transform.apply(atom);
            }
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
