use crate::core::random::RandomSource;
use crate::engine::config::BondModel;
use crate::engine::error::MoveError;
use nalgebra::Vector3;
use tracing::warn;

/// Probability that a bond falls inside the hard core of diameter `sigma`.
pub fn core_probability(model: &BondModel) -> f64 {
    match *model {
        BondModel::HardSphere => 1.0,
        BondModel::PowerTail { power } => (power - 3.0) / power,
        BondModel::SquareWell {
            lambda,
            temperature,
        } => {
            let well = (lambda.powi(3) - 1.0) * ((1.0 / temperature).exp() - 1.0);
            1.0 / (1.0 + well)
        }
    }
}

/// Draws one bond vector for a pair with contact distance `sigma`.
///
/// Square-well shells are filled by rejection inside the outer sphere, which can
/// fail after `max_attempts` tries.
pub fn sample_bond(
    model: &BondModel,
    sigma: f64,
    max_attempts: u64,
    rng: &mut dyn RandomSource,
) -> Result<Vector3<f64>, MoveError> {
    match *model {
        BondModel::HardSphere => Ok(rng.point_in_unit_sphere() * sigma),
        BondModel::PowerTail { power } => {
            if rng.next_f64() < core_probability(model) {
                Ok(rng.point_in_unit_sphere() * sigma)
            } else {
                // 1 - u lies in (0, 1], keeping the radius finite.
                let u = 1.0 - rng.next_f64();
                let r = sigma * u.powf(-1.0 / (power - 3.0));
                Ok(rng.unit_vector() * r)
            }
        }
        BondModel::SquareWell { lambda, .. } => {
            if rng.next_f64() < core_probability(model) {
                return Ok(rng.point_in_unit_sphere() * sigma);
            }
            for _ in 0..max_attempts {
                let candidate = rng.point_in_unit_sphere() * (lambda * sigma);
                if candidate.norm_squared() >= sigma * sigma {
                    return Ok(candidate);
                }
            }
            warn!(lambda, attempts = max_attempts, "square-well shell sampling gave up");
            Err(MoveError::SamplingExhausted {
                gap: 1,
                attempts: max_attempts,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const SAMPLES: usize = 40_000;

    #[test]
    fn hard_sphere_bonds_stay_inside_sigma() {
        let mut rng = StdRng::seed_from_u64(70);
        for _ in 0..SAMPLES {
            let v = sample_bond(&BondModel::HardSphere, 1.5, 10, &mut rng).unwrap();
            assert!(v.norm() <= 1.5);
        }
    }

    #[test]
    fn power_tail_splits_core_and_tail_by_core_probability() {
        let model = BondModel::PowerTail { power: 6.0 };
        assert!((core_probability(&model) - 0.5).abs() < 1e-15);
        let mut rng = StdRng::seed_from_u64(71);
        let inside = (0..SAMPLES)
            .filter(|_| sample_bond(&model, 1.0, 10, &mut rng).unwrap().norm() < 1.0)
            .count();
        let fraction = inside as f64 / SAMPLES as f64;
        assert!((fraction - 0.5).abs() < 0.01, "fraction = {fraction}");
    }

    #[test]
    fn square_well_bonds_land_in_core_or_shell() {
        let model = BondModel::SquareWell {
            lambda: 1.5,
            temperature: 1.0,
        };
        let p_core = core_probability(&model);
        let expected = 1.0 / (1.0 + (1.5f64.powi(3) - 1.0) * (1.0f64.exp() - 1.0));
        assert!((p_core - expected).abs() < 1e-15);

        let mut rng = StdRng::seed_from_u64(72);
        let mut core = 0;
        for _ in 0..SAMPLES {
            let r = sample_bond(&model, 2.0, 1000, &mut rng).unwrap().norm();
            assert!(r <= 3.0);
            if r < 2.0 {
                core += 1;
            }
        }
        let fraction = core as f64 / SAMPLES as f64;
        assert!((fraction - p_core).abs() < 0.01, "fraction = {fraction}");
    }

    #[test]
    fn a_thin_shell_with_a_tiny_cap_surfaces_exhaustion() {
        let model = BondModel::SquareWell {
            lambda: 1.0001,
            temperature: 0.01,
        };
        assert!(core_probability(&model) < 1e-30);
        let mut rng = StdRng::seed_from_u64(73);
        let failures = (0..200)
            .filter_map(|_| sample_bond(&model, 1.0, 1, &mut rng).err())
            .collect::<Vec<_>>();
        assert!(failures.len() > 150, "failures = {}", failures.len());
        assert!(failures.iter().all(|e| matches!(
            e,
            MoveError::SamplingExhausted {
                gap: 1,
                attempts: 1
            }
        )));
    }
}
