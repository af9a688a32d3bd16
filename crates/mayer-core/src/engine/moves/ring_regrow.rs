use super::{MonteCarloMove, TrialState};
use crate::core::models::sim_box::SimulationBox;
use crate::core::random::RandomSource;
use crate::engine::error::MoveError;
use crate::engine::snapshot::AtomSnapshot;
use nalgebra::{Point3, Vector3};
use std::f64::consts::PI;
use tracing::{debug, instrument, trace};

/// Full regrowth of ring polymers by Gaussian bisection, corrected with a
/// Rosenbluth weight.
///
/// Every molecule is a closed ring of `P` beads (`P` a power of two) joined by
/// harmonic springs, with target density `exp(-k * sum |x[j+1] - x[j]|^2)`. Bead 0
/// stays where it is. Level by level (`dr = 2, 4, ..., P`) the beads `nr * P / dr`
/// with odd `nr` are drawn from a Gaussian centered between their two anchors
/// `(nr -+ 1) * P / dr`, whose per-component variance is `scale^2 * m / (8k)` for
/// anchors `m` bonds apart. With `scale = 1` this is the exact conditional
/// distribution and the Rosenbluth weight is the same for every configuration.
///
/// The log weight of the current configuration is computed once at bind time and
/// then carried over from accepted trials, so this move must be the only one that
/// changes intramolecular geometry.
#[derive(Debug)]
pub struct RingRegrowMove {
    spring: f64,
    scale: f64,
    bound: bool,
    log_weight_old: f64,
    log_weight_new: f64,
    positions: Vec<Point3<f64>>,
    state: TrialState,
    snapshot: AtomSnapshot,
}

/// Calls `insert(image, from, to, bonds)` for every bisection insertion of a ring
/// of `beads` beads, in generation order. `to` is already wrapped into the ring.
fn for_each_insertion(beads: usize, mut insert: impl FnMut(usize, usize, usize, usize)) {
    let mut dr = 2;
    while dr <= beads {
        for nr in (1..dr).step_by(2) {
            let image = nr * beads / dr;
            let from = (nr - 1) * beads / dr;
            let to = ((nr + 1) * beads / dr) % beads;
            insert(image, from, to, 2 * beads / dr);
        }
        dr *= 2;
    }
}

impl RingRegrowMove {
    pub fn new(spring: f64, scale: f64) -> Self {
        Self {
            spring,
            scale,
            bound: false,
            log_weight_old: 0.0,
            log_weight_new: 0.0,
            positions: Vec::new(),
            state: TrialState::default(),
            snapshot: AtomSnapshot::new(),
        }
    }

    fn variance(&self, bonds: usize) -> f64 {
        self.scale * self.scale * bonds as f64 / (8.0 * self.spring)
    }

    /// `-k * sum |bond|^2 - sum ln q` for one ring, where `q` is the density the
    /// bisection would generate each bead with.
    fn log_weight(&self, ring: &[Point3<f64>]) -> f64 {
        let beads = ring.len();
        let springs: f64 = (0..beads)
            .map(|j| (ring[(j + 1) % beads] - ring[j]).norm_squared())
            .sum();
        let mut log_generation = 0.0;
        for_each_insertion(beads, |image, from, to, bonds| {
            let variance = self.variance(bonds);
            let center = ring[from] + 0.5 * (ring[to] - ring[from]);
            let d2 = (ring[image] - center).norm_squared();
            log_generation += -1.5 * (2.0 * PI * variance).ln() - d2 / (2.0 * variance);
        });
        -self.spring * springs - log_generation
    }

    pub fn log_weight_old(&self) -> f64 {
        self.log_weight_old
    }
}

impl MonteCarloMove for RingRegrowMove {
    fn name(&self) -> &'static str {
        "ring_regrow"
    }

    fn bind(&mut self, sim: &SimulationBox) -> Result<(), MoveError> {
        for molecule in sim.molecules() {
            let beads = molecule.atom_count();
            if beads < 2 || !beads.is_power_of_two() {
                return Err(MoveError::Topology {
                    move_name: self.name(),
                    reason: format!(
                        "molecule {} has {beads} beads, ring regrowth needs a power of two",
                        molecule.index
                    ),
                });
            }
        }
        if sim.molecule_count() == 0 {
            return Err(MoveError::NoEligibleSites {
                move_name: self.name(),
            });
        }
        self.log_weight_old = sim
            .molecules()
            .iter()
            .map(|m| {
                let ring: Vec<Point3<f64>> = m.atoms.iter().map(|a| a.position).collect();
                self.log_weight(&ring)
            })
            .sum();
        self.bound = true;
        debug!(
            spring = self.spring,
            scale = self.scale,
            log_weight = self.log_weight_old,
            "ring regrowth move bound"
        );
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
        self.state.begin(sim, true);
        self.snapshot.clear();

        let mut log_weight = 0.0;
        let mut positions = std::mem::take(&mut self.positions);
        for molecule in 0..sim.molecule_count() {
            self.snapshot.capture_molecule(sim, molecule);
            let beads = sim.molecule(molecule).atom_count();
            positions.clear();
            positions.resize(beads, Point3::origin());
            positions[0] = sim.molecule(molecule).atoms[0].position;

            for_each_insertion(beads, |image, from, to, bonds| {
                let sigma = self.variance(bonds).sqrt();
                let center = positions[from] + 0.5 * (positions[to] - positions[from]);
                let noise = Vector3::new(
                    rng.next_gaussian(),
                    rng.next_gaussian(),
                    rng.next_gaussian(),
                );
                positions[image] = center + noise * sigma;
            });
            log_weight += self.log_weight(&positions);

            for (atom, position) in sim.atoms_mut(molecule).iter_mut().zip(&positions) {
                atom.position = *position;
            }
        }
        self.positions = positions;

        self.log_weight_new = log_weight;
        self.state.bias = (self.log_weight_new - self.log_weight_old).exp();
        trace!(
            log_weight_old = self.log_weight_old,
            log_weight_new = self.log_weight_new,
            "regrew rings"
        );
        self.state.finish(sim, true);
        Ok(true)
    }

    fn chi(&self, temperature: f64) -> f64 {
        self.state.energy_chi(temperature)
    }

    fn accept_notify(&mut self, sim: &mut SimulationBox) {
        self.state.accept(self.name());
        self.log_weight_old = self.log_weight_new;
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
    use crate::core::models::atom::Atom;
    use crate::core::models::bonding::MoleculeGraph;
    use crate::core::models::sim_box::Boundary;
    use crate::engine::moves::test_support::{chain_box, positions};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const TOLERANCE: f64 = 1e-9;

    fn ring_box(molecules: usize, beads: usize) -> SimulationBox {
        let mut sim = SimulationBox::new(Boundary::Open);
        let species = sim.add_species(MoleculeGraph::ring(beads));
        for m in 0..molecules {
            let atoms = (0..beads)
                .map(|j| {
                    let angle = 2.0 * PI * j as f64 / beads as f64;
                    Atom::new(Point3::new(
                        0.7 * angle.cos() + 3.0 * m as f64,
                        0.7 * angle.sin(),
                        0.1 * j as f64,
                    ))
                })
                .collect();
            sim.add_molecule(species, atoms).unwrap();
        }
        sim
    }

    #[test]
    fn insertion_schedule_visits_every_bead_but_the_first_once() {
        let mut seen = vec![0; 16];
        let mut order = Vec::new();
        for_each_insertion(16, |image, from, to, bonds| {
            seen[image] += 1;
            order.push(image);
            assert_eq!((to + 16 - from) % 16, bonds % 16);
        });
        assert_eq!(seen[0], 0);
        assert!(seen[1..].iter().all(|&c| c == 1));
        assert_eq!(&order[..3], &[8, 4, 12]);
    }

    #[test]
    fn exact_bisection_has_unit_rosenbluth_ratio() {
        let mut sim = ring_box(2, 8);
        let mut rng = StdRng::seed_from_u64(100);
        let mut mv = RingRegrowMove::new(3.0, 1.0);
        mv.bind(&sim).unwrap();
        for _ in 0..50 {
            assert!(mv.do_trial(&mut sim, &mut rng).unwrap());
            assert!((mv.state.bias - 1.0).abs() < TOLERANCE, "bias = {}", mv.state.bias);
            assert!((mv.chi(1.0) - 1.0).abs() < TOLERANCE);
            mv.accept_notify(&mut sim);
        }
    }

    #[test]
    fn regrown_bonds_follow_the_spring_distribution() {
        let beads = 8;
        let k = 2.0;
        let mut sim = ring_box(1, beads);
        let mut rng = StdRng::seed_from_u64(101);
        let mut mv = RingRegrowMove::new(k, 1.0);
        mv.bind(&sim).unwrap();
        let trials = 20_000;
        let mut total = 0.0;
        for _ in 0..trials {
            mv.do_trial(&mut sim, &mut rng).unwrap();
            mv.accept_notify(&mut sim);
            let atoms = &sim.molecule(0).atoms;
            total += (0..beads)
                .map(|j| (atoms[(j + 1) % beads].position - atoms[j].position).norm_squared())
                .sum::<f64>()
                / beads as f64;
        }
        let mean = total / trials as f64;
        let expected = 3.0 / (2.0 * k) * (1.0 - 1.0 / beads as f64);
        assert!((mean - expected).abs() < 0.02 * expected, "mean = {mean}");
    }

    #[test]
    fn first_bead_stays_and_rejection_restores() {
        let mut sim = ring_box(3, 4);
        let before = positions(&sim);
        let anchors: Vec<_> = sim.molecules().iter().map(|m| m.atoms[0].position).collect();
        let mut rng = StdRng::seed_from_u64(102);
        let mut mv = RingRegrowMove::new(1.5, 1.7);
        mv.bind(&sim).unwrap();
        let log_weight = mv.log_weight_old();
        assert!(mv.do_trial(&mut sim, &mut rng).unwrap());
        for (m, anchor) in anchors.iter().enumerate() {
            assert_eq!(&sim.molecule(m).atoms[0].position, anchor);
        }
        assert!(mv.chi(1.0) > 0.0);
        mv.reject_notify(&mut sim);
        assert_eq!(positions(&sim), before);
        assert_eq!(mv.log_weight_old(), log_weight);
    }

    #[test]
    fn accepted_weight_is_carried_over() {
        let mut sim = ring_box(1, 8);
        let mut rng = StdRng::seed_from_u64(103);
        let mut mv = RingRegrowMove::new(1.0, 0.6);
        mv.bind(&sim).unwrap();
        assert!(mv.do_trial(&mut sim, &mut rng).unwrap());
        let new = mv.log_weight_new;
        mv.accept_notify(&mut sim);
        assert_eq!(mv.log_weight_old(), new);
    }

    #[test]
    fn non_power_of_two_rings_are_rejected() {
        let sim = chain_box(2, 3);
        let mut mv = RingRegrowMove::new(1.0, 1.0);
        assert!(matches!(mv.bind(&sim), Err(MoveError::Topology { .. })));
    }
}
