use super::potentials::{PairPotential, harmonic};
use crate::core::models::sim_box::SimulationBox;
use crate::core::utils::geometry::bond_angle;

/// Energy of a whole configuration.
///
/// Moves call this once before and once after every energy-driven trial, so
/// implementations should be side-effect free. `include_long_range` asks for
/// contributions beyond any truncation the evaluator applies.
pub trait PotentialEvaluator {
    fn compute_all(&self, sim: &SimulationBox, include_long_range: bool) -> f64;
}

/// Zero energy everywhere. Cluster-weight-only sampling uses this.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPotential;

impl PotentialEvaluator for NoPotential {
    fn compute_all(&self, _sim: &SimulationBox, _include_long_range: bool) -> f64 {
        0.0
    }
}

/// Sum of a pair potential over every atom pair in different molecules.
#[derive(Debug, Clone, Copy)]
pub struct InterMolecularPairs {
    pub potential: PairPotential,
    /// Pairs beyond this distance are skipped unless long-range terms are requested.
    pub cutoff: Option<f64>,
}

impl InterMolecularPairs {
    pub fn new(potential: PairPotential) -> Self {
        Self {
            potential,
            cutoff: None,
        }
    }

    pub fn with_cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = Some(cutoff);
        self
    }
}

impl PotentialEvaluator for InterMolecularPairs {
    fn compute_all(&self, sim: &SimulationBox, include_long_range: bool) -> f64 {
        let molecules = sim.molecules();
        let cutoff = if include_long_range { None } else { self.cutoff };
        let mut total = 0.0;
        for (i, mi) in molecules.iter().enumerate() {
            for mj in &molecules[i + 1..] {
                for a in &mi.atoms {
                    for b in &mj.atoms {
                        let dist = sim.separation(&a.position, &b.position).norm();
                        if cutoff.is_some_and(|rc| dist > rc) {
                            continue;
                        }
                        total += self.potential.energy(dist);
                        if total == f64::INFINITY {
                            return total;
                        }
                    }
                }
            }
        }
        total
    }
}

/// Harmonic bond stretching and angle bending over every species graph.
///
/// Energies follow `k (x - x0)^2` with angles in radians.
#[derive(Debug, Clone, Copy)]
pub struct IntraMolecularHarmonic {
    pub bond_length: f64,
    pub bond_k: f64,
    pub angle: Option<(f64, f64)>,
}

impl PotentialEvaluator for IntraMolecularHarmonic {
    fn compute_all(&self, sim: &SimulationBox, _include_long_range: bool) -> f64 {
        let mut total = 0.0;
        for (index, molecule) in sim.molecules().iter().enumerate() {
            let graph = sim.graph_of(index);
            let atoms = &molecule.atoms;
            for (i, j) in graph.bonds() {
                let r = sim.separation(&atoms[i].position, &atoms[j].position).norm();
                total += harmonic(r, self.bond_length, self.bond_k);
            }
            if let Some((theta0, k)) = self.angle {
                for (a, b, c) in graph.angles() {
                    let theta =
                        bond_angle(&atoms[a].position, &atoms[b].position, &atoms[c].position);
                    total += harmonic(theta, theta0, k);
                }
            }
        }
        total
    }
}

/// Sum of several evaluators.
#[derive(Default)]
pub struct SumPotential {
    terms: Vec<Box<dyn PotentialEvaluator>>,
}

impl SumPotential {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, term: Box<dyn PotentialEvaluator>) -> Self {
        self.terms.push(term);
        self
    }
}

impl PotentialEvaluator for SumPotential {
    fn compute_all(&self, sim: &SimulationBox, include_long_range: bool) -> f64 {
        self.terms
            .iter()
            .map(|t| t.compute_all(sim, include_long_range))
            .sum()
    }
}

/// Adapts a closure into an evaluator.
pub struct FnPotential<F>(pub F);

impl<F> PotentialEvaluator for FnPotential<F>
where
    F: Fn(&SimulationBox, bool) -> f64,
{
    fn compute_all(&self, sim: &SimulationBox, include_long_range: bool) -> f64 {
        (self.0)(sim, include_long_range)
    }
}
