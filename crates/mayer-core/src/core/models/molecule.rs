use super::atom::Atom;
use nalgebra::{Point3, Vector3};

/// An ordered list of atoms belonging to one species.
///
/// Bond topology is not stored here. Every molecule of a species shares the
/// [`MoleculeGraph`](super::bonding::MoleculeGraph) registered for that species
/// in the [`SimulationBox`](super::sim_box::SimulationBox).
#[derive(Debug, Clone, PartialEq)]
pub struct Molecule {
    /// Species tag, used to look up the bonding graph.
    pub species: usize,
    /// Position of this molecule in the box's molecule list.
    pub index: usize,
    /// Child atoms in species order.
    pub atoms: Vec<Atom>,
}

impl Molecule {
    pub fn new(species: usize, atoms: Vec<Atom>) -> Self {
        Self {
            species,
            index: 0,
            atoms,
        }
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn total_mass(&self) -> f64 {
        self.atoms.iter().map(|a| a.mass).sum()
    }

    /// Mass-weighted center of the molecule.
    ///
    /// Falls back to the geometric center when the total mass is zero.
    pub fn center_of_mass(&self) -> Point3<f64> {
        center_of_mass(&self.atoms)
    }

    /// Translates every atom by `delta`.
    pub fn translate(&mut self, delta: &Vector3<f64>) {
        for atom in &mut self.atoms {
            atom.position += delta;
        }
    }

    /// Translates the molecule so that its center of mass lands on `target`.
    pub fn move_center_to(&mut self, target: &Point3<f64>) {
        let shift = target - self.center_of_mass();
        self.translate(&shift);
    }
}

pub(crate) fn center_of_mass(atoms: &[Atom]) -> Point3<f64> {
    if atoms.is_empty() {
        return Point3::origin();
    }
    let total_mass: f64 = atoms.iter().map(|a| a.mass).sum();
    if total_mass > 0.0 {
        let weighted: Vector3<f64> = atoms.iter().map(|a| a.position.coords * a.mass).sum();
        Point3::from(weighted / total_mass)
    } else {
        let sum: Vector3<f64> = atoms.iter().map(|a| a.position.coords).sum();
        Point3::from(sum / atoms.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-12;

    fn diatomic() -> Molecule {
        Molecule::new(
            0,
            vec![
                Atom::new(Point3::new(0.0, 0.0, 0.0)).with_mass(1.0),
                Atom::new(Point3::new(3.0, 0.0, 0.0)).with_mass(2.0),
            ],
        )
    }

    #[test]
    fn center_of_mass_is_mass_weighted() {
        let com = diatomic().center_of_mass();
        assert!((com - Point3::new(2.0, 0.0, 0.0)).norm() < TOLERANCE);
    }

    #[test]
    fn massless_atoms_use_geometric_center() {
        let mut molecule = diatomic();
        for atom in &mut molecule.atoms {
            atom.mass = 0.0;
        }
        let com = molecule.center_of_mass();
        assert!((com - Point3::new(1.5, 0.0, 0.0)).norm() < TOLERANCE);
    }

    #[test]
    fn move_center_to_preserves_internal_geometry() {
        let mut molecule = diatomic();
        molecule.move_center_to(&Point3::new(-1.0, 4.0, 2.0));
        assert!((molecule.center_of_mass() - Point3::new(-1.0, 4.0, 2.0)).norm() < TOLERANCE);
        let bond = molecule.atoms[1].position - molecule.atoms[0].position;
        assert!((bond - Vector3::new(3.0, 0.0, 0.0)).norm() < TOLERANCE);
    }

    #[test]
    fn total_mass_sums_children() {
        assert_eq!(diatomic().total_mass(), 3.0);
        assert_eq!(diatomic().atom_count(), 2);
    }
}
