use nalgebra::Vector3;
use rand::Rng;
use rand_distr::StandardNormal;

/// Source of random deviates consumed by the moves and the growth sampler.
///
/// Every `rand::Rng` is a `RandomSource`, so callers pass a seeded `StdRng` or
/// `thread_rng()` directly. The geometric helpers are built on `next_f64` and can be
/// overridden by sources with a faster native implementation.
pub trait RandomSource {
    /// Uniform deviate in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// Standard normal deviate.
    fn next_gaussian(&mut self) -> f64;

    /// Uniform index in `[0, n)`. `n` must be positive.
    fn next_index(&mut self, n: usize) -> usize;

    /// Uniformly distributed direction on the unit sphere (Marsaglia's method).
    fn unit_vector(&mut self) -> Vector3<f64> {
        loop {
            let z1 = 2.0 * self.next_f64() - 1.0;
            let z2 = 2.0 * self.next_f64() - 1.0;
            let s = z1 * z1 + z2 * z2;
            if s < 1.0 {
                let root = 2.0 * (1.0 - s).sqrt();
                return Vector3::new(z1 * root, z2 * root, 1.0 - 2.0 * s);
            }
        }
    }

    /// Uniformly distributed point strictly inside the unit-radius sphere.
    fn point_in_unit_sphere(&mut self) -> Vector3<f64> {
        loop {
            let v = Vector3::new(
                2.0 * self.next_f64() - 1.0,
                2.0 * self.next_f64() - 1.0,
                2.0 * self.next_f64() - 1.0,
            );
            if v.norm_squared() < 1.0 {
                return v;
            }
        }
    }

    /// Fisher-Yates shuffle of `0..n`.
    fn permutation(&mut self, n: usize) -> Vec<usize> {
        let mut seq: Vec<usize> = (0..n).collect();
        for i in 0..n {
            let j = i + self.next_index(n - i);
            seq.swap(i, j);
        }
        seq
    }
}

impl<R: Rng + ?Sized> RandomSource for R {
    fn next_f64(&mut self) -> f64 {
        self.r#gen::<f64>()
    }

    fn next_gaussian(&mut self) -> f64 {
        self.sample(StandardNormal)
    }

    fn next_index(&mut self, n: usize) -> usize {
        self.gen_range(0..n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn unit_vector_has_unit_length() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let v = rng.unit_vector();
            assert!((v.norm() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn unit_vectors_average_to_the_origin() {
        let mut rng = StdRng::seed_from_u64(11);
        let n = 50_000;
        let sum: Vector3<f64> = (0..n).map(|_| rng.unit_vector()).sum();
        assert!((sum / n as f64).norm() < 0.02);
    }

    #[test]
    fn point_in_unit_sphere_fills_the_volume() {
        let mut rng = StdRng::seed_from_u64(3);
        let n = 50_000;
        let mut inner = 0;
        for _ in 0..n {
            let p = rng.point_in_unit_sphere();
            assert!(p.norm_squared() < 1.0);
            if p.norm() < 0.5 {
                inner += 1;
            }
        }
        let fraction = inner as f64 / n as f64;
        assert!((fraction - 0.125).abs() < 0.01);
    }

    #[test]
    fn permutation_contains_every_index_once() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut seq = rng.permutation(17);
        seq.sort_unstable();
        assert_eq!(seq, (0..17).collect::<Vec<_>>());
    }

    #[test]
    fn works_through_a_trait_object() {
        let mut rng = StdRng::seed_from_u64(1);
        let source: &mut dyn RandomSource = &mut rng;
        let x = source.next_f64();
        assert!((0.0..1.0).contains(&x));
        assert!(source.next_index(4) < 4);
    }
}
