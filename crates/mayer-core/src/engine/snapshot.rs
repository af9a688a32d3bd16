use crate::core::models::atom::Atom;
use crate::core::models::sim_box::SimulationBox;

/// Pre-trial copies of the atoms a move is about to perturb.
///
/// Buffers are reused across trials. Restoring writes the captured atoms back
/// verbatim, so a rejected trial leaves positions, orientations, and bond lengths
/// bit-for-bit identical to the state before the trial.
#[derive(Debug, Default)]
pub struct AtomSnapshot {
    molecules: Vec<usize>,
    buffers: Vec<Vec<Atom>>,
    len: usize,
}

impl AtomSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Molecules captured since the last clear.
    pub fn captured(&self) -> &[usize] {
        &self.molecules[..self.len]
    }

    /// Copies every atom of `molecule`.
    pub fn capture_molecule(&mut self, sim: &SimulationBox, molecule: usize) {
        if self.len == self.buffers.len() {
            self.buffers.push(Vec::new());
            self.molecules.push(molecule);
        }
        let buffer = &mut self.buffers[self.len];
        buffer.clear();
        buffer.extend_from_slice(&sim.molecule(molecule).atoms);
        self.molecules[self.len] = molecule;
        self.len += 1;
    }

    pub fn capture_all(&mut self, sim: &SimulationBox) {
        for molecule in 0..sim.molecule_count() {
            self.capture_molecule(sim, molecule);
        }
    }

    /// Captured atoms of the `k`-th captured molecule.
    pub fn atoms(&self, k: usize) -> &[Atom] {
        &self.buffers[k]
    }

    /// Writes every captured molecule back into the box.
    pub fn restore(&self, sim: &mut SimulationBox) {
        for k in 0..self.len {
            sim.atoms_mut(self.molecules[k])
                .copy_from_slice(&self.buffers[k]);
        }
    }
}
