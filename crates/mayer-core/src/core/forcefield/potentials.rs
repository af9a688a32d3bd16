#[inline]
pub fn hard_sphere(dist: f64, sigma: f64) -> f64 {
    if dist < sigma { f64::INFINITY } else { 0.0 }
}

#[inline]
pub fn square_well(dist: f64, sigma: f64, lambda: f64, well_depth: f64) -> f64 {
    if dist < sigma {
        f64::INFINITY
    } else if dist < lambda * sigma {
        -well_depth
    } else {
        0.0
    }
}

#[inline]
pub fn lennard_jones_12_6(dist: f64, sigma: f64, well_depth: f64) -> f64 {
    if dist < 1e-6 {
        return f64::INFINITY;
    }
    let s2 = (sigma / dist).powi(2);
    let s6 = s2 * s2 * s2;
    4.0 * well_depth * (s6 * s6 - s6)
}

#[inline]
pub fn harmonic(value: f64, equilibrium: f64, force_constant: f64) -> f64 {
    let dx = value - equilibrium;
    force_constant * dx * dx
}

/// Spherically symmetric pair interaction between atoms of different molecules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PairPotential {
    HardSphere { sigma: f64 },
    SquareWell { sigma: f64, lambda: f64, well_depth: f64 },
    LennardJones { sigma: f64, well_depth: f64 },
}

impl PairPotential {
    #[inline]
    pub fn energy(&self, dist: f64) -> f64 {
        match *self {
            PairPotential::HardSphere { sigma } => hard_sphere(dist, sigma),
            PairPotential::SquareWell {
                sigma,
                lambda,
                well_depth,
            } => square_well(dist, sigma, lambda, well_depth),
            PairPotential::LennardJones { sigma, well_depth } => {
                lennard_jones_12_6(dist, sigma, well_depth)
            }
        }
    }

    /// Mayer function `exp(-u/T) - 1`.
    pub fn mayer_f(&self, dist: f64, temperature: f64) -> f64 {
        let u = self.energy(dist);
        if u == f64::INFINITY {
            return -1.0;
        }
        (-u / temperature).exp() - 1.0
    }
}
