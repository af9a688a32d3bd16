use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Bond ({0}, {1}) references an atom outside the molecule of {2} atoms")]
    IndexOutOfRange(usize, usize, usize),
    #[error("Atom {0} is bonded to itself")]
    SelfBond(usize),
    #[error("Bond {0} -> {1} has no reverse entry")]
    Asymmetric(usize, usize),
    #[error("Bond ({0}, {1}) is listed more than once")]
    Duplicate(usize, usize),
    #[error("Species {0} is not registered")]
    UnknownSpecies(usize),
    #[error("Species graph has {expected} atoms but the molecule has {found}")]
    AtomCountMismatch { expected: usize, found: usize },
}

/// Bond adjacency shared by every molecule of one species.
///
/// The graph is stored as a symmetric adjacency list. Moves that propagate a
/// rigid transform through the bonds require the graph to be acyclic in the
/// subtree reachable from the pivot they rotate about.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MoleculeGraph {
    adjacency: Vec<Vec<usize>>,
}

impl MoleculeGraph {
    /// Builds a graph from an adjacency list, validating symmetry and range.
    ///
    /// # Arguments
    ///
    /// * `adjacency` - For each atom, the indices of the atoms bonded to it.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] when an index is out of range, an atom is bonded to
    /// itself, a bond is listed twice, or a bond is missing its reverse entry.
    pub fn from_adjacency(adjacency: Vec<Vec<usize>>) -> Result<Self, GraphError> {
        let n = adjacency.len();
        for (i, neighbors) in adjacency.iter().enumerate() {
            for (k, &j) in neighbors.iter().enumerate() {
                if j >= n {
                    return Err(GraphError::IndexOutOfRange(i, j, n));
                }
                if j == i {
                    return Err(GraphError::SelfBond(i));
                }
                if neighbors[..k].contains(&j) {
                    return Err(GraphError::Duplicate(i, j));
                }
                if !adjacency[j].contains(&i) {
                    return Err(GraphError::Asymmetric(i, j));
                }
            }
        }
        Ok(Self { adjacency })
    }

    /// Builds a graph with `atom_count` atoms from an undirected edge list.
    pub fn from_edges(atom_count: usize, edges: &[(usize, usize)]) -> Result<Self, GraphError> {
        let mut adjacency = vec![Vec::new(); atom_count];
        for &(i, j) in edges {
            if i >= atom_count || j >= atom_count {
                return Err(GraphError::IndexOutOfRange(i, j, atom_count));
            }
            if i == j {
                return Err(GraphError::SelfBond(i));
            }
            if adjacency[i].contains(&j) {
                return Err(GraphError::Duplicate(i, j));
            }
            adjacency[i].push(j);
            adjacency[j].push(i);
        }
        Ok(Self { adjacency })
    }

    /// A graph of `atom_count` isolated atoms.
    pub fn unbonded(atom_count: usize) -> Self {
        Self {
            adjacency: vec![Vec::new(); atom_count],
        }
    }

    /// A linear chain `0 - 1 - ... - (atom_count - 1)`.
    pub fn linear(atom_count: usize) -> Self {
        let adjacency = (0..atom_count)
            .map(|i| {
                let mut neighbors = Vec::with_capacity(2);
                if i > 0 {
                    neighbors.push(i - 1);
                }
                if i + 1 < atom_count {
                    neighbors.push(i + 1);
                }
                neighbors
            })
            .collect();
        Self { adjacency }
    }

    /// A closed ring of `atom_count` atoms. Rings of fewer than three atoms
    /// degenerate to a linear graph.
    pub fn ring(atom_count: usize) -> Self {
        let mut graph = Self::linear(atom_count);
        if atom_count >= 3 {
            graph.adjacency[0].push(atom_count - 1);
            graph.adjacency[atom_count - 1].push(0);
        }
        graph
    }

    pub fn atom_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn neighbors(&self, atom: usize) -> &[usize] {
        &self.adjacency[atom]
    }

    pub fn degree(&self, atom: usize) -> usize {
        self.adjacency[atom].len()
    }

    /// Every bond once, as `(i, j)` with `i < j`.
    pub fn bonds(&self) -> Vec<(usize, usize)> {
        self.adjacency
            .iter()
            .enumerate()
            .flat_map(|(i, neighbors)| {
                neighbors
                    .iter()
                    .filter(move |&&j| j > i)
                    .map(move |&j| (i, j))
            })
            .collect()
    }

    /// Every bond angle as `(a, b, c)` with `b` the vertex and `a < c`.
    pub fn angles(&self) -> Vec<(usize, usize, usize)> {
        let mut angles = Vec::new();
        for (b, neighbors) in self.adjacency.iter().enumerate() {
            for (k, &a) in neighbors.iter().enumerate() {
                for &c in &neighbors[k + 1..] {
                    angles.push((a.min(c), b, a.max(c)));
                }
            }
        }
        angles
    }

    /// Atoms with at least two bonded neighbors.
    pub fn angle_vertices(&self) -> Vec<usize> {
        (0..self.atom_count()).filter(|&i| self.degree(i) >= 2).collect()
    }

    /// Bonds whose atoms both carry further neighbors, so that a rotation about
    /// the bond changes a dihedral.
    pub fn torsion_bonds(&self) -> Vec<(usize, usize)> {
        self.bonds()
            .into_iter()
            .filter(|&(i, j)| self.degree(i) >= 2 && self.degree(j) >= 2)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_graph_has_expected_neighbors() {
        let graph = MoleculeGraph::linear(4);
        assert_eq!(graph.neighbors(0), &[1]);
        assert_eq!(graph.neighbors(1), &[0, 2]);
        assert_eq!(graph.neighbors(3), &[2]);
        assert_eq!(graph.bonds(), vec![(0, 1), (1, 2), (2, 3)]);
    }

    #[test]
    fn ring_closes_the_chain() {
        let graph = MoleculeGraph::ring(5);
        assert_eq!(graph.degree(0), 2);
        assert_eq!(graph.degree(4), 2);
        assert_eq!(graph.bonds().len(), 5);
    }

    #[test]
    fn from_adjacency_accepts_symmetric_lists() {
        let graph =
            MoleculeGraph::from_adjacency(vec![vec![1], vec![0, 2], vec![1, 3], vec![2]]).unwrap();
        assert_eq!(graph, MoleculeGraph::linear(4));
    }

    #[test]
    fn from_adjacency_rejects_malformed_lists() {
        assert_eq!(
            MoleculeGraph::from_adjacency(vec![vec![1], vec![]]),
            Err(GraphError::Asymmetric(0, 1))
        );
        assert_eq!(
            MoleculeGraph::from_adjacency(vec![vec![0]]),
            Err(GraphError::SelfBond(0))
        );
        assert_eq!(
            MoleculeGraph::from_adjacency(vec![vec![2], vec![]]),
            Err(GraphError::IndexOutOfRange(0, 2, 2))
        );
        assert_eq!(
            MoleculeGraph::from_adjacency(vec![vec![1, 1], vec![0]]),
            Err(GraphError::Duplicate(0, 1))
        );
    }

    #[test]
    fn from_edges_builds_a_branched_graph() {
        let graph = MoleculeGraph::from_edges(4, &[(0, 1), (1, 2), (1, 3)]).unwrap();
        assert_eq!(graph.degree(1), 3);
        assert_eq!(graph.angle_vertices(), vec![1]);
        assert_eq!(graph.angles().len(), 3);
        assert!(graph.torsion_bonds().is_empty());
    }

    #[test]
    fn torsion_bonds_of_butane_like_chain() {
        let graph = MoleculeGraph::linear(4);
        assert_eq!(graph.torsion_bonds(), vec![(1, 2)]);
    }

    #[test]
    fn from_edges_rejects_duplicates() {
        assert_eq!(
            MoleculeGraph::from_edges(3, &[(0, 1), (1, 0)]),
            Err(GraphError::Duplicate(1, 0))
        );
    }
}
