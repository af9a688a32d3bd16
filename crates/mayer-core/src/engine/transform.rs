//! Propagation of rigid transforms through a molecule's bond graph.
//!
//! Intramolecular moves rotate or translate one side of a bond, an angle, or a
//! torsion. The [`BondedTransformer`] applies the transform to a start atom and
//! to everything reachable from it through bonds, while a per-trial modified log
//! guarantees that no atom is transformed twice. Atoms that must stay fixed (the
//! vertex of an angle, the near atom of a torsion bond) are marked before the
//! walk so the traversal stops at them.

use crate::core::models::atom::Atom;
use crate::core::models::bonding::MoleculeGraph;
use nalgebra::{Point3, Rotation3, Vector3};
use tracing::trace;

/// A rigid transform applied to individual atoms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RigidTransform {
    /// Rotation about `pivot`. Orientations rotate with the position.
    Rotation {
        rotation: Rotation3<f64>,
        pivot: Point3<f64>,
    },
    Translation(Vector3<f64>),
}

impl RigidTransform {
    /// Applies the transform to `atom` and returns its displacement.
    pub fn apply(&self, atom: &mut Atom) -> Vector3<f64> {
        let old = atom.position;
        match self {
            RigidTransform::Rotation { rotation, pivot } => {
                atom.position = pivot + rotation * (atom.position - pivot);
                atom.orientation = atom.orientation.map(|o| o.rotated(rotation));
            }
            RigidTransform::Translation(delta) => {
                atom.position += delta;
            }
        }
        atom.position - old
    }
}

/// Worklist traversal that transforms every atom reachable from a start atom
/// exactly once per trial.
#[derive(Debug, Default)]
pub struct BondedTransformer {
    visited: Vec<bool>,
    modified: Vec<usize>,
    stack: Vec<usize>,
}

impl BondedTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the modified log for a molecule of `atom_count` atoms.
    pub fn reset(&mut self, atom_count: usize) {
        self.visited.clear();
        self.visited.resize(atom_count, false);
        self.modified.clear();
        self.stack.clear();
    }

    /// Marks `atom` as already handled without transforming it.
    pub fn mark(&mut self, atom: usize) {
        if !self.visited[atom] {
            self.visited[atom] = true;
            self.modified.push(atom);
        }
    }

    pub fn is_modified(&self, atom: usize) -> bool {
        self.visited.get(atom).copied().unwrap_or(false)
    }

    /// Atoms handled since the last reset, in visiting order.
    pub fn modified(&self) -> &[usize] {
        &self.modified
    }

    /// Transforms `start` and every atom reachable from it through atoms not yet
    /// modified in this trial.
    ///
    /// Returns the mass-weighted displacement `sum(m * dr)` of the transformed
    /// atoms, which [`recenter`] uses to restore the center of mass.
    pub fn propagate(
        &mut self,
        atoms: &mut [Atom],
        graph: &MoleculeGraph,
        start: usize,
        transform: &RigidTransform,
    ) -> Vector3<f64> {
        let mut mass_shift = Vector3::zeros();
        if self.visited[start] {
            return mass_shift;
        }
        self.visited[start] = true;
        self.stack.push(start);
        while let Some(atom) = self.stack.pop() {
            self.modified.push(atom);
            let displacement = transform.apply(&mut atoms[atom]);
            mass_shift += displacement * atoms[atom].mass;
            for &next in graph.neighbors(atom) {
                if !self.visited[next] {
                    self.visited[next] = true;
                    self.stack.push(next);
                }
            }
        }
        trace!(start, modified = self.modified.len(), "propagated bonded transform");
        mass_shift
    }
}

/// Shifts every atom by `-mass_shift / total_mass`, undoing the center-of-mass
/// drift accumulated by [`BondedTransformer::propagate`].
pub fn recenter(atoms: &mut [Atom], mass_shift: &Vector3<f64>) {
    let total_mass: f64 = atoms.iter().map(|a| a.mass).sum();
    if total_mass <= 0.0 {
        return;
    }
    let shift = mass_shift / total_mass;
    for atom in atoms {
        atom.position -= shift;
    }
}
