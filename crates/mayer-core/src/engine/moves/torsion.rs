use super::{MonteCarloMove, SiteTable, TrialState, random_step};
use crate::core::models::atom::Atom;
use crate::core::models::bonding::MoleculeGraph;
use crate::core::models::sim_box::SimulationBox;
use crate::core::random::RandomSource;
use crate::core::utils::geometry::rotation_about_axis;
use crate::engine::error::MoveError;
use crate::engine::snapshot::AtomSnapshot;
use crate::engine::transform::{BondedTransformer, RigidTransform, recenter};
use nalgebra::Vector3;
use tracing::{debug, instrument, trace};

/// Rotates the `c` side of bond `b-c` about the `b -> c` axis by `dt`, with `c`
/// as the local pivot.
///
/// Atom `b` is marked first so the walk never crosses back over the bond. A
/// positive `dt` increases every dihedral `a-b-c-d` by `dt`. Returns the
/// mass-weighted displacement for [`recenter`].
pub fn rotate_torsion(
    atoms: &mut [Atom],
    graph: &MoleculeGraph,
    transformer: &mut BondedTransformer,
    b: usize,
    c: usize,
    dt: f64,
) -> Vector3<f64> {
    transformer.reset(atoms.len());
    transformer.mark(b);
    let axis = atoms[c].position - atoms[b].position;
    let transform = RigidTransform::Rotation {
        rotation: rotation_about_axis(&axis, dt),
        pivot: atoms[c].position,
    };
    transformer.propagate(atoms, graph, c, &transform)
}

/// Single torsion rotation in one molecule.
///
/// Eligible bonds join two atoms that both have at least one other neighbor.
/// The side that rotates is chosen at random and the angle is uniform in
/// `[-step, step]`. Energy-driven chi.
#[derive(Debug)]
pub struct TorsionMove {
    step: f64,
    sites: Option<SiteTable<(usize, usize)>>,
    transformer: BondedTransformer,
    state: TrialState,
    snapshot: AtomSnapshot,
}

impl TorsionMove {
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

impl MonteCarloMove for TorsionMove {
    fn name(&self) -> &'static str {
        "torsion"
    }

    fn bind(&mut self, sim: &SimulationBox) -> Result<(), MoveError> {
        let sites = SiteTable::build(sim, |graph| graph.torsion_bonds());
        if sites.is_empty() {
            return Err(MoveError::NoEligibleSites {
                move_name: self.name(),
            });
        }
        debug!(step = self.step, "torsion move bound");
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
            move_name: "torsion",
        })?;
        let (molecule, (i, j)) = sites.pick(sim, rng);
        let (b, c) = if rng.next_f64() < 0.5 { (i, j) } else { (j, i) };
        let dt = random_step(rng, self.step);

        self.state.begin(sim, true);
        self.snapshot.clear();
        self.snapshot.capture_molecule(sim, molecule);

        let (atoms, graph) = sim.molecule_parts_mut(molecule);
        let shift = rotate_torsion(atoms, graph, &mut self.transformer, b, c, dt);
        recenter(atoms, &shift);
        trace!(molecule, b, c, dt, "rotated torsion");

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
