use super::{MonteCarloMove, TrialState, random_step};
use crate::core::models::sim_box::SimulationBox;
use crate::core::random::RandomSource;
use crate::engine::error::MoveError;
use crate::engine::snapshot::AtomSnapshot;
use tracing::{debug, instrument, trace};

/// Perturbs the internal bond length carried by diatomic-in-bead atoms.
///
/// Every atom with a bond length receives an independent uniform step. If any
/// new length is non-positive the trial keeps that atom unchanged and carries
/// a zero bias. Otherwise the bias is the product of `(l_new / l_old)^2` over
/// all perturbed atoms.
#[derive(Debug)]
pub struct BondLengthMove {
    step: f64,
    leaves: Option<Vec<usize>>,
    molecules: Vec<usize>,
    state: TrialState,
    snapshot: AtomSnapshot,
}

impl BondLengthMove {
    pub fn new(step: f64) -> Self {
        Self {
            step,
            leaves: None,
            molecules: Vec::new(),
            state: TrialState::default(),
            snapshot: AtomSnapshot::new(),
        }
    }
}

impl MonteCarloMove for BondLengthMove {
    fn name(&self) -> &'static str {
        "bond_length"
    }

    fn bind(&mut self, sim: &SimulationBox) -> Result<(), MoveError> {
        let leaves: Vec<usize> = (0..sim.leaf_count())
            .filter(|&leaf| sim.leaf(leaf).bond_length.is_some())
            .collect();
        if leaves.is_empty() {
            return Err(MoveError::NoEligibleSites {
                move_name: self.name(),
            });
        }
        self.molecules = leaves.iter().map(|&l| sim.leaf_location(l).0).collect();
        self.molecules.dedup();
        debug!(sites = leaves.len(), step = self.step, "bond-length move bound");
        self.leaves = Some(leaves);
        Ok(())
    }

    #[instrument(level = "trace", skip_all)]
    fn do_trial(
        &mut self,
        sim: &mut SimulationBox,
        rng: &mut dyn RandomSource,
    ) -> Result<bool, MoveError> {
        let leaves = self.leaves.as_ref().ok_or(MoveError::NotBound {
            move_name: "bond_length",
        })?;

        self.state.begin(sim, true);
        self.snapshot.clear();
        for &molecule in &self.molecules {
            self.snapshot.capture_molecule(sim, molecule);
        }

        let mut bias = 1.0;
        for &leaf in leaves {
            let atom = sim.leaf_mut(leaf);
            let Some(old) = atom.bond_length else {
                continue;
            };
            let new = old + random_step(rng, self.step);
            if new <= 0.0 || old <= 0.0 {
                bias = 0.0;
                continue;
            }
            atom.bond_length = Some(new);
            let ratio = new / old;
            bias *= ratio * ratio;
        }
        self.state.bias = bias;
        trace!(bias, "perturbed bond lengths");

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
