//! Ring closure by recursive midpoint insertion.
//!
//! Beads are visited in a random sequence whose first entry sits at the origin.
//! Each pass walks the open gaps between already inserted sequence positions
//! (the last gap wraps around to the first bead) and inserts one bead into every
//! gap of two or more bonds:
//!
//! - a gap of two bonds takes a uniform point in the lens of the two unit spheres
//!   around its ends,
//! - an odd gap inserts the bead next to its left end, drawn in the unit sphere and
//!   accepted against the separation density of the remaining even gap,
//! - an even gap inserts the midpoint from a Gaussian centered between the ends and
//!   accepted against the product of both half-gap densities, using a tabulated
//!   envelope of that product over the Gaussian.
//!
//! Every rule leaves the joint density proportional to the product of the
//! per-gap separation densities, so the finished ring is an exact sample of a
//! closed chain of overlapping unit spheres.

use super::lens::{lens_point_between, lens_point_by_rejection};
use crate::core::random::RandomSource;
use crate::core::separation::{MAX_BONDS, separation_probability};
use crate::engine::error::MoveError;
use nalgebra::{Point3, Vector3};
use std::sync::LazyLock;
use tracing::{debug, warn};

// Inverse squared Gaussian widths fitted per half-gap size.
const INVERSE_WIDTH: [f64; MAX_BONDS + 1] = [
    0.0,
    1.1,
    0.9 * 1.19776,
    0.674043,
    0.543464,
    0.4489,
    0.381788,
    0.331708,
    0.29308,
    0.262442,
    0.237574,
];

struct BiasTables {
    normal_width: [f64; MAX_BONDS + 1],
    p0: [f64; MAX_BONDS + 1],
    max_bias: [f64; MAX_BONDS + 1],
    max_bias_r: [f64; MAX_BONDS + 1],
}

impl BiasTables {
    fn compute() -> Self {
        let mut tables = BiasTables {
            normal_width: [0.0; MAX_BONDS + 1],
            p0: [0.0; MAX_BONDS + 1],
            max_bias: [0.0; MAX_BONDS + 1],
            max_bias_r: [0.0; MAX_BONDS + 1],
        };
        for i in 1..=MAX_BONDS {
            tables.normal_width[i] = (0.5 / INVERSE_WIDTH[i]).sqrt();
        }
        for i in 2..=MAX_BONDS {
            tables.p0[i] = separation_probability(i, 0.0);
            let sp2 = 0.5 / INVERSE_WIDTH[i];
            let s = 0.5 / INVERSE_WIDTH[i].sqrt();
            let mut r_min = 0.0;
            let mut best_r = 0.0;
            let mut best = -1.0;
            // Zoom in on the maximum of p(i, r)^2 / exp(-r^2 / sp2).
            for k in (5..=50).step_by(3) {
                let dr = s / 2f64.powi(k);
                for j in 0..1000 {
                    let r = r_min + j as f64 * dr;
                    let gauss = (-r * r / sp2).exp();
                    if gauss == 0.0 {
                        continue;
                    }
                    let p = separation_probability(i, r);
                    let ratio = p * p / gauss;
                    if ratio > best {
                        best = ratio;
                        best_r = r;
                    }
                }
                r_min = (best_r - 500.0 * dr / 8.0).max(0.0);
            }
            tables.max_bias[i] = best;
            tables.max_bias_r[i] = best_r;
        }
        debug!("ring closure bias tables built");
        tables
    }
}

static TABLES: LazyLock<BiasTables> = LazyLock::new(BiasTables::compute);

fn gap_supported(gap: usize) -> bool {
    if gap <= 2 {
        true
    } else if gap % 2 == 1 {
        gap - 1 <= MAX_BONDS && gap_supported(gap - 1)
    } else {
        gap / 2 <= MAX_BONDS && gap_supported(gap / 2)
    }
}

/// Whether every gap the insertion sequence produces for a ring of `beads` beads
/// has a tabulated density.
pub fn ring_size_supported(beads: usize) -> bool {
    beads >= 1 && gap_supported(beads)
}

pub fn check_ring_size(beads: usize) -> Result<(), MoveError> {
    if ring_size_supported(beads) {
        Ok(())
    } else {
        Err(MoveError::UnsupportedRingSize { beads })
    }
}

/// Insertion and rejection-trial counts per gap size.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RingStatistics {
    inserts: Vec<u64>,
    trials: Vec<u64>,
}

impl RingStatistics {
    fn grow(&mut self, gap: usize) {
        if self.inserts.len() <= gap {
            self.inserts.resize(gap + 1, 0);
            self.trials.resize(gap + 1, 0);
        }
    }

    fn record_insert(&mut self, gap: usize) {
        self.grow(gap);
        self.inserts[gap] += 1;
    }

    fn record_trial(&mut self, gap: usize) {
        self.grow(gap);
        self.trials[gap] += 1;
    }

    pub fn inserts(&self, gap: usize) -> u64 {
        self.inserts.get(gap).copied().unwrap_or(0)
    }

    pub fn trials(&self, gap: usize) -> u64 {
        self.trials.get(gap).copied().unwrap_or(0)
    }

    /// Fraction of rejection trials accepted for gaps of this size, or `None` if
    /// the gap is never sampled by rejection.
    pub fn acceptance(&self, gap: usize) -> Option<f64> {
        let trials = self.trials(gap);
        if trials == 0 {
            None
        } else {
            Some(self.inserts(gap) as f64 / trials as f64)
        }
    }
}

/// Stateful ring builder. Holds the per-sequence-position insertion flags and
/// the running statistics.
#[derive(Debug, Clone)]
pub struct RingCloser {
    max_attempts: u64,
    inserted: Vec<bool>,
    stats: RingStatistics,
}

impl RingCloser {
    pub fn new(max_attempts: u64) -> Self {
        Self {
            max_attempts,
            inserted: Vec::new(),
            stats: RingStatistics::default(),
        }
    }

    pub fn statistics(&self) -> &RingStatistics {
        &self.stats
    }

    /// Places every bead of a unit-sphere ring. `sequence` is the visiting order;
    /// ring neighbors are consecutive entries, and the last entry closes back to
    /// the first, which is placed at the origin.
    pub fn close(
        &mut self,
        positions: &mut [Point3<f64>],
        sequence: &[usize],
        rng: &mut dyn RandomSource,
    ) -> Result<(), MoveError> {
        let n = sequence.len();
        if n == 0 {
            return Ok(());
        }
        check_ring_size(n)?;
        self.inserted.clear();
        self.inserted.resize(n, false);
        self.inserted[0] = true;
        positions[sequence[0]] = Point3::origin();

        loop {
            let mut prev = 0;
            let mut did_insert = false;
            for i in 1..=n {
                if i < n && !self.inserted[i] {
                    continue;
                }
                let gap = i - prev;
                if gap > 1 {
                    self.stats.record_insert(gap);
                    let next = if i == n { 0 } else { i };
                    let j = if gap % 2 == 1 { prev + 1 } else { (prev + i) / 2 };
                    self.inserted[j] = true;
                    let left = positions[sequence[prev]];
                    let right = positions[sequence[next]];
                    positions[sequence[j]] = if gap == 2 {
                        self.insert_lens(&left, &right, rng)?
                    } else if gap % 2 == 1 {
                        self.insert_odd(gap, &left, &right, rng)?
                    } else {
                        self.insert_even(gap, &left, &right, rng)?
                    };
                    did_insert = true;
                }
                prev = i;
            }
            if !did_insert {
                break;
            }
        }
        Ok(())
    }

    fn exhausted(&self, gap: usize) -> MoveError {
        warn!(gap, attempts = self.max_attempts, "ring insertion gave up");
        MoveError::SamplingExhausted {
            gap,
            attempts: self.max_attempts,
        }
    }

    fn insert_lens(
        &mut self,
        left: &Point3<f64>,
        right: &Point3<f64>,
        rng: &mut dyn RandomSource,
    ) -> Result<Point3<f64>, MoveError> {
        if (right - left).norm_squared() < 1.0 {
            lens_point_by_rejection(left, right, rng, self.max_attempts)
                .ok_or_else(|| self.exhausted(2))
        } else {
            Ok(lens_point_between(left, right, rng))
        }
    }

    fn insert_odd(
        &mut self,
        gap: usize,
        left: &Point3<f64>,
        right: &Point3<f64>,
        rng: &mut dyn RandomSource,
    ) -> Result<Point3<f64>, MoveError> {
        let rest = gap - 1;
        let r2 = (right - left).norm_squared();
        let envelope = if r2 < 1.0 {
            TABLES.p0[rest]
        } else {
            separation_probability(rest, r2.sqrt() - 1.0)
        };
        for _ in 0..self.max_attempts {
            self.stats.record_trial(gap);
            let candidate = left + rng.point_in_unit_sphere();
            let p = separation_probability(rest, (candidate - right).norm());
            if p == 0.0 {
                continue;
            }
            if rng.next_f64() < p / envelope {
                return Ok(candidate);
            }
        }
        Err(self.exhausted(gap))
    }

    fn insert_even(
        &mut self,
        gap: usize,
        left: &Point3<f64>,
        right: &Point3<f64>,
        rng: &mut dyn RandomSource,
    ) -> Result<Point3<f64>, MoveError> {
        let half = gap / 2;
        let tables = &*TABLES;
        let sp2 = tables.normal_width[half].powi(2);
        let sn2 = sp2;
        let width = (sp2 * sn2 / (sp2 + sn2)).sqrt();
        let center = Point3::from(left.coords * (sn2 / (sp2 + sn2)) + right.coords * (sp2 / (sp2 + sn2)));
        let span = (right - left).norm();
        let envelope = if span < 2.0 * tables.max_bias_r[half] {
            tables.max_bias[half]
        } else {
            let mid = 0.5 * span;
            let p = separation_probability(half, mid);
            p * p / (-0.5 * (mid * mid + mid * mid) / sp2).exp()
        };
        for _ in 0..self.max_attempts {
            self.stats.record_trial(gap);
            let offset = Vector3::new(rng.next_gaussian(), rng.next_gaussian(), rng.next_gaussian());
            let candidate = center + offset * width;
            let rp = (candidate - left).norm();
            let rn = (candidate - right).norm();
            let pp = separation_probability(half, rp);
            if pp == 0.0 {
                continue;
            }
            let pn = separation_probability(half, rn);
            if pn == 0.0 {
                continue;
            }
            let gauss = (-0.5 * (rp * rp / sp2 + rn * rn / sn2)).exp();
            if rng.next_f64() < pp * pn / (envelope * gauss) {
                return Ok(candidate);
            }
        }
        Err(self.exhausted(gap))
    }
}
