use super::atom::Atom;
use super::bonding::{GraphError, MoleculeGraph};
use super::molecule::Molecule;
use crate::core::cluster::{ClusterWeight, UnitCluster};
use crate::core::forcefield::evaluator::{NoPotential, PotentialEvaluator};
use nalgebra::{Point3, Vector3};

/// Boundary applied to separations between atoms.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Boundary {
    /// No periodic images. The usual choice for cluster integrals.
    #[default]
    Open,
    /// Cubic periodic box with the given edge length.
    Cubic { length: f64 },
}

impl Boundary {
    /// Maps a separation vector to its nearest periodic image.
    pub fn minimum_image(&self, dr: Vector3<f64>) -> Vector3<f64> {
        match *self {
            Boundary::Open => dr,
            Boundary::Cubic { length } => dr.map(|x| x - length * (x / length).round()),
        }
    }
}

/// Number of lifecycle notifications the box has received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LifecycleCounts {
    pub trials: u64,
    pub accepts: u64,
    pub rejects: u64,
}

/// The configuration that moves perturb.
///
/// Holds the molecules, the bonding graph of every species, a flat leaf index
/// over all atoms, the boundary, and the two pluggable evaluators that moves read
/// before and after a trial: the potential energy and the cluster weight.
pub struct SimulationBox {
    molecules: Vec<Molecule>,
    graphs: Vec<MoleculeGraph>,
    leaf_index: Vec<(usize, usize)>,
    boundary: Boundary,
    potential: Box<dyn PotentialEvaluator>,
    cluster: Box<dyn ClusterWeight>,
    lifecycle: LifecycleCounts,
}

impl SimulationBox {
    /// Creates an empty box with no potential and a unit cluster weight.
    pub fn new(boundary: Boundary) -> Self {
        Self {
            molecules: Vec::new(),
            graphs: Vec::new(),
            leaf_index: Vec::new(),
            boundary,
            potential: Box::new(NoPotential),
            cluster: Box::new(UnitCluster),
            lifecycle: LifecycleCounts::default(),
        }
    }

    pub fn with_potential(mut self, potential: Box<dyn PotentialEvaluator>) -> Self {
        self.potential = potential;
        self
    }

    pub fn with_cluster(mut self, cluster: Box<dyn ClusterWeight>) -> Self {
        self.cluster = cluster;
        self
    }

    pub fn set_potential(&mut self, potential: Box<dyn PotentialEvaluator>) {
        self.potential = potential;
    }

    pub fn set_cluster(&mut self, cluster: Box<dyn ClusterWeight>) {
        self.cluster = cluster;
    }

    /// Registers a species and returns its tag.
    pub fn add_species(&mut self, graph: MoleculeGraph) -> usize {
        self.graphs.push(graph);
        self.graphs.len() - 1
    }

    /// Appends a molecule of `species` and returns its index.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::AtomCountMismatch`] when the atom count differs from
    /// the species graph, or [`GraphError::UnknownSpecies`] for an unregistered tag.
    pub fn add_molecule(&mut self, species: usize, atoms: Vec<Atom>) -> Result<usize, GraphError> {
        let graph = self
            .graphs
            .get(species)
            .ok_or(GraphError::UnknownSpecies(species))?;
        if graph.atom_count() != atoms.len() {
            return Err(GraphError::AtomCountMismatch {
                expected: graph.atom_count(),
                found: atoms.len(),
            });
        }
        let index = self.molecules.len();
        for atom in 0..atoms.len() {
            self.leaf_index.push((index, atom));
        }
        let mut molecule = Molecule::new(species, atoms);
        molecule.index = index;
        self.molecules.push(molecule);
        Ok(index)
    }

    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    pub fn molecule_count(&self) -> usize {
        self.molecules.len()
    }

    pub fn molecules(&self) -> &[Molecule] {
        &self.molecules
    }

    pub fn molecule(&self, index: usize) -> &Molecule {
        &self.molecules[index]
    }

    /// Mutable access to the atoms of one molecule. The atom count is fixed.
    pub fn atoms_mut(&mut self, molecule: usize) -> &mut [Atom] {
        &mut self.molecules[molecule].atoms
    }

    /// Splits the borrow so a move can mutate atoms while reading the bonding.
    pub fn molecule_parts_mut(&mut self, molecule: usize) -> (&mut [Atom], &MoleculeGraph) {
        let m = &mut self.molecules[molecule];
        (m.atoms.as_mut_slice(), &self.graphs[m.species])
    }

    pub fn translate_molecule(&mut self, molecule: usize, delta: &Vector3<f64>) {
        self.molecules[molecule].translate(delta);
    }

    pub fn species_count(&self) -> usize {
        self.graphs.len()
    }

    pub fn graph(&self, species: usize) -> &MoleculeGraph {
        &self.graphs[species]
    }

    pub fn graph_of(&self, molecule: usize) -> &MoleculeGraph {
        &self.graphs[self.molecules[molecule].species]
    }

    /// Number of atoms across all molecules.
    pub fn leaf_count(&self) -> usize {
        self.leaf_index.len()
    }

    /// `(molecule, atom)` location of a leaf.
    pub fn leaf_location(&self, leaf: usize) -> (usize, usize) {
        self.leaf_index[leaf]
    }

    pub fn leaf(&self, leaf: usize) -> &Atom {
        let (m, a) = self.leaf_index[leaf];
        &self.molecules[m].atoms[a]
    }

    pub fn leaf_mut(&mut self, leaf: usize) -> &mut Atom {
        let (m, a) = self.leaf_index[leaf];
        &mut self.molecules[m].atoms[a]
    }

    pub fn leaves(&self) -> impl Iterator<Item = &Atom> {
        self.molecules.iter().flat_map(|m| m.atoms.iter())
    }

    /// Separation `b - a` under the box boundary.
    pub fn separation(&self, a: &Point3<f64>, b: &Point3<f64>) -> Vector3<f64> {
        self.boundary.minimum_image(b - a)
    }

    /// Total potential energy of the current configuration.
    pub fn energy(&self, include_long_range: bool) -> f64 {
        self.potential.compute_all(self, include_long_range)
    }

    /// Cluster weight of the current configuration.
    pub fn cluster_weight(&self) -> f64 {
        self.cluster.value(self)
    }

    pub fn trial_notify(&mut self) {
        self.lifecycle.trials += 1;
        self.cluster.trial_notify();
    }

    pub fn accept_notify(&mut self) {
        self.lifecycle.accepts += 1;
        self.cluster.accept_notify();
    }

    pub fn reject_notify(&mut self) {
        self.lifecycle.rejects += 1;
        self.cluster.reject_notify();
    }

    pub fn lifecycle_counts(&self) -> LifecycleCounts {
        self.lifecycle
    }
}
