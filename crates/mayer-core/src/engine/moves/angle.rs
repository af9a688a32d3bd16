use super::{MonteCarloMove, SiteTable, TrialState, random_step};
use crate::core::models::sim_box::SimulationBox;
use crate::core::random::RandomSource;
use crate::core::utils::geometry::{any_perpendicular, bond_angle, rotation_about_axis};
use crate::engine::error::MoveError;
use crate::engine::snapshot::AtomSnapshot;
use crate::engine::transform::{BondedTransformer, RigidTransform, recenter};
use tracing::{debug, instrument, trace};

/// Bends one bond angle of one molecule.
///
/// A vertex `b` with at least two neighbors is chosen, together with two of its
/// neighbors `a` and `c`. The `a` side rotates by `+dt/2` and the `c` side by
/// `-dt/2` about the normal `(a - b) x (c - b)` through `b`. Both rotations
/// turn their side toward the other, so the angle closes by `dt` (it changes by
/// `-dt`), with `dt` uniform in `[-step, step]`. The molecule is then shifted
/// back to its original center of mass. The acceptance ratio carries the
/// `sin(theta_new) / sin(theta_old)` Jacobian of the angle coordinate.
#[derive(Debug)]
pub struct BondAngleMove {
    step: f64,
    sites: Option<SiteTable<usize>>,
    transformer: BondedTransformer,
    state: TrialState,
    snapshot: AtomSnapshot,
}

impl BondAngleMove {
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

impl MonteCarloMove for BondAngleMove {
    fn name(&self) -> &'static str {
        "bond_angle"
    }

    fn bind(&mut self, sim: &SimulationBox) -> Result<(), MoveError> {
        let sites = SiteTable::build(sim, |graph| graph.angle_vertices());
        if sites.is_empty() {
            return Err(MoveError::NoEligibleSites {
                move_name: self.name(),
            });
        }
        debug!(step = self.step, "bond-angle move bound");
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
            move_name: "bond_angle",
        })?;
        let (molecule, b) = sites.pick(sim, rng);

        self.state.begin(sim, true);
        self.snapshot.clear();
        self.snapshot.capture_molecule(sim, molecule);

        let (atoms, graph) = sim.molecule_parts_mut(molecule);
        let neighbors = graph.neighbors(b);
        let ia = rng.next_index(neighbors.len());
        let mut ic = rng.next_index(neighbors.len() - 1);
        if ic >= ia {
            ic += 1;
        }
        let (a, c) = (neighbors[ia], neighbors[ic]);
        let vertex = atoms[b].position;
        let theta_old = bond_angle(&atoms[a].position, &vertex, &atoms[c].position);

        let ba = atoms[a].position - vertex;
        let mut axis = ba.cross(&(atoms[c].position - vertex));
        if axis.norm_squared() < 1e-20 {
            axis = any_perpendicular(&ba).into_inner();
        }
        let dt = random_step(rng, self.step);

        self.transformer.reset(atoms.len());
        self.transformer.mark(b);
        let opening = RigidTransform::Rotation {
            rotation: rotation_about_axis(&axis, 0.5 * dt),
            pivot: vertex,
        };
        let closing = RigidTransform::Rotation {
            rotation: rotation_about_axis(&axis, -0.5 * dt),
            pivot: vertex,
        };
        let mut shift = self.transformer.propagate(atoms, graph, a, &opening);
        shift += self.transformer.propagate(atoms, graph, c, &closing);
        recenter(atoms, &shift);

        let theta_new = bond_angle(&atoms[a].position, &atoms[b].position, &atoms[c].position);
        let sin_old = theta_old.sin();
        self.state.bias = if sin_old > 0.0 {
            theta_new.sin() / sin_old
        } else {
            1.0
        };
        trace!(molecule, vertex = b, theta_old, theta_new, "bent angle");

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
    use crate::core::forcefield::evaluator::IntraMolecularHarmonic;
    use crate::core::models::bonding::MoleculeGraph;
    use crate::engine::moves::test_support::{chain_box, positions};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const TOLERANCE: f64 = 1e-10;

    fn bond_lengths(sim: &SimulationBox, m: usize) -> Vec<f64> {
        let atoms = &sim.molecule(m).atoms;
        sim.graph_of(m)
            .bonds()
            .iter()
            .map(|&(i, j)| (atoms[i].position - atoms[j].position).norm())
            .collect()
    }

    fn angles(sim: &SimulationBox, m: usize) -> Vec<f64> {
        let atoms = &sim.molecule(m).atoms;
        sim.graph_of(m)
            .angles()
            .iter()
            .map(|&(a, b, c)| bond_angle(&atoms[a].position, &atoms[b].position, &atoms[c].position))
            .collect()
    }

    #[test]
    fn bending_keeps_bonds_and_center_of_mass() {
        let mut sim = chain_box(2, 5);
        let mut rng = StdRng::seed_from_u64(31);
        let mut mv = BondAngleMove::new(0.4);
        mv.bind(&sim).unwrap();
        for _ in 0..25 {
            let bonds: Vec<_> = (0..2).map(|m| bond_lengths(&sim, m)).collect();
            let coms: Vec<_> = sim.molecules().iter().map(|m| m.center_of_mass()).collect();
            let before: Vec<_> = (0..2).map(|m| angles(&sim, m)).collect();
            assert!(mv.do_trial(&mut sim, &mut rng).unwrap());
            let mut changed = 0;
            for m in 0..2 {
                for (x, y) in bond_lengths(&sim, m).iter().zip(&bonds[m]) {
                    assert!((x - y).abs() < TOLERANCE);
                }
                assert!((sim.molecule(m).center_of_mass() - coms[m]).norm() < TOLERANCE);
                for (x, y) in angles(&sim, m).iter().zip(&before[m]) {
                    if (x - y).abs() > TOLERANCE {
                        changed += 1;
                        assert!((x - y).abs() <= 0.4 + TOLERANCE);
                    }
                }
            }
            assert!(changed <= 1);
            mv.accept_notify(&mut sim);
        }
    }

    #[test]
    fn a_positive_step_closes_the_angle() {
        let mut sim = chain_box(1, 3);
        let mut rng = StdRng::seed_from_u64(32);
        let mut mv = BondAngleMove::new(0.5);
        mv.bind(&sim).unwrap();
        let theta_old = angles(&sim, 0)[0];
        for _ in 0..20 {
            let mut replay = rng.clone();
            assert!(mv.do_trial(&mut sim, &mut rng).unwrap());
            // Molecule, vertex, the two neighbors, then the step.
            replay.next_index(1);
            replay.next_index(1);
            replay.next_index(2);
            replay.next_index(1);
            let dt = random_step(&mut replay, 0.5);

            let theta_new = angles(&sim, 0)[0];
            assert!(
                (theta_new - (theta_old - dt)).abs() < TOLERANCE,
                "dt = {dt}, change = {}",
                theta_new - theta_old
            );
            let jacobian = theta_new.sin() / theta_old.sin();
            assert!((mv.state.bias - jacobian).abs() < TOLERANCE);
            mv.reject_notify(&mut sim);
        }
    }

    #[test]
    fn rejection_restores_the_molecule() {
        let mut sim = chain_box(1, 4).with_potential(Box::new(IntraMolecularHarmonic {
            bond_length: 0.8,
            bond_k: 10.0,
            angle: Some((2.0, 5.0)),
        }));
        let before = positions(&sim);
        let mut rng = StdRng::seed_from_u64(2);
        let mut mv = BondAngleMove::new(0.3);
        mv.bind(&sim).unwrap();
        assert!(mv.do_trial(&mut sim, &mut rng).unwrap());
        assert!(mv.chi(1.0) >= 0.0);
        mv.reject_notify(&mut sim);
        assert_eq!(positions(&sim), before);
    }

    #[test]
    fn binding_requires_an_angle_vertex() {
        let mut sim = SimulationBox::new(Default::default());
        let species = sim.add_species(MoleculeGraph::linear(2));
        sim.add_molecule(species, vec![Default::default(); 2]).unwrap();
        let mut mv = BondAngleMove::new(0.3);
        assert!(matches!(
            mv.bind(&sim),
            Err(MoveError::NoEligibleSites { .. })
        ));
    }
}
