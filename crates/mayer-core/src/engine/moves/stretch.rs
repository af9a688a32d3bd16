use super::{MonteCarloMove, SiteTable, TrialState, random_step};
use crate::core::models::sim_box::SimulationBox;
use crate::core::random::RandomSource;
use crate::engine::error::MoveError;
use crate::engine::snapshot::AtomSnapshot;
use crate::engine::transform::{BondedTransformer, RigidTransform, recenter};
use tracing::{debug, instrument, trace};

/// Changes the length of one bond by translating everything on its far side.
///
/// The bond and the side that moves are both chosen at random. A trial that
/// would shrink the bond to a non-positive length leaves the molecule untouched
/// and carries a zero bias, so it is always rejected. Otherwise the chi includes
/// the radial Jacobian `(r_new / r_old)^2`.
#[derive(Debug)]
pub struct StretchMove {
    step: f64,
    sites: Option<SiteTable<(usize, usize)>>,
    transformer: BondedTransformer,
    state: TrialState,
    snapshot: AtomSnapshot,
}

impl StretchMove {
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

impl MonteCarloMove for StretchMove {
    fn name(&self) -> &'static str {
        "stretch"
    }

    fn bind(&mut self, sim: &SimulationBox) -> Result<(), MoveError> {
        let sites = SiteTable::build(sim, |graph| graph.bonds());
        if sites.is_empty() {
            return Err(MoveError::NoEligibleSites {
                move_name: self.name(),
            });
        }
        debug!(step = self.step, "stretch move bound");
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
            move_name: "stretch",
        })?;
        let (molecule, (i, j)) = sites.pick(sim, rng);
        let (b, c) = if rng.next_f64() < 0.5 { (i, j) } else { (j, i) };

        self.state.begin(sim, true);
        self.snapshot.clear();
        self.snapshot.capture_molecule(sim, molecule);

        let (atoms, graph) = sim.molecule_parts_mut(molecule);
        let bond = atoms[c].position - atoms[b].position;
        let r_old = bond.norm();
        let dr = random_step(rng, self.step);
        let r_new = r_old + dr;

        if r_new <= 0.0 || r_old == 0.0 {
            self.state.bias = 0.0;
        } else {
            self.transformer.reset(atoms.len());
            self.transformer.mark(b);
            let shift = self.transformer.propagate(
                atoms,
                graph,
                c,
                &RigidTransform::Translation(bond * (dr / r_old)),
            );
            recenter(atoms, &shift);
            let ratio = r_new / r_old;
            self.state.bias = ratio * ratio;
        }
        trace!(molecule, b, c, r_old, r_new, "stretched bond");

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

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn bond_lengths(sim: &SimulationBox) -> Vec<f64> {
        let atoms = &sim.molecule(0).atoms;
        sim.graph_of(0)
            .bonds()
            .iter()
            .map(|&(i, j)| (atoms[i].position - atoms[j].position).norm())
            .collect()
    }

    #[test]
    fn exactly_one_bond_changes_and_center_of_mass_holds() {
        let mut sim = chain_box(1, 5);
        let mut rng = StdRng::seed_from_u64(17);
        let mut mv = StretchMove::new(0.2);
        mv.bind(&sim).unwrap();
        for _ in 0..20 {
            let before = bond_lengths(&sim);
            let com = sim.molecule(0).center_of_mass();
            assert!(mv.do_trial(&mut sim, &mut rng).unwrap());
            let after = bond_lengths(&sim);
            let changed: Vec<usize> = (0..before.len())
                .filter(|&k| !f64_approx_equal(before[k], after[k]))
                .collect();
            assert!(changed.len() <= 1);
            if let Some(&k) = changed.first() {
                let ratio = after[k] / before[k];
                assert!(f64_approx_equal(mv.state.bias, ratio * ratio));
            }
            assert!((sim.molecule(0).center_of_mass() - com).norm() < TOLERANCE);
            mv.accept_notify(&mut sim);
        }
    }

    #[test]
    fn collapsing_a_bond_is_always_rejected() {
        let mut sim = chain_box(1, 3);
        let before = positions(&sim);
        let mut rng = StdRng::seed_from_u64(3);
        let mut mv = StretchMove::new(50.0);
        mv.bind(&sim).unwrap();
        let mut saw_collapse = false;
        for _ in 0..50 {
            assert!(mv.do_trial(&mut sim, &mut rng).unwrap());
            if mv.state.bias == 0.0 {
                saw_collapse = true;
                assert_eq!(positions(&sim), before);
                assert_eq!(mv.chi(1.0), 0.0);
            }
            mv.reject_notify(&mut sim);
            assert_eq!(positions(&sim), before);
        }
        assert!(saw_collapse);
    }
}
