//! Uniform sampling inside the lens where two unit-radius spheres overlap.
//!
//! Measured from the tip of one sphere's cap, the lens volume up to depth `h` is
//! proportional to `h^2 (1 - h / 3)`. Sampling a uniform depth therefore needs the
//! inverse of that cubic, [`lens_root`], which refines a tabulated closed form with
//! three Newton steps.

use crate::core::random::RandomSource;
use crate::core::utils::geometry::any_perpendicular;
use nalgebra::{Point3, Vector3};
use std::sync::LazyLock;

const LOOKUP_SIZE: usize = 5000;

static LOOKUP: LazyLock<Vec<f64>> = LazyLock::new(|| {
    (0..LOOKUP_SIZE)
        .map(|i| lens_root_exact((i + 1) as f64 / LOOKUP_SIZE as f64 / 1.5))
        .collect()
});

/// Root `h` in `[0, 1]` of `h^2 (1 - h / 3) = u` for `u` in `[0, 2/3]`.
pub fn lens_root_exact(u: f64) -> f64 {
    let sqrt3 = 3.0f64.sqrt();
    let theta = (sqrt3 * ((4.0 - 3.0 * u) * u).sqrt()).atan2(-2.0 + 3.0 * u) / 3.0;
    1.0 + theta.cos() - sqrt3 * theta.sin()
}

// Series in sqrt(u) for the shallow end of the table.
fn lens_root_approx(u: f64) -> f64 {
    let s = u.sqrt();
    s * (1.0
        + s * (0.16666666666666666
            + s * (0.06944444444444445
                + s * (0.037037037037037035
                    + s * (0.02228009259259259
                        + s * (0.01440329218106996
                            + (0.009769643775720165 + 5.0 * s / 729.0) * s))))))
}

/// Fast inverse of `h^2 (1 - h / 3)`: table lookup plus three Newton iterations.
pub fn lens_root(u: f64) -> f64 {
    let index = (1.5 * u * LOOKUP_SIZE as f64).round() as i64 - 1;
    if index < 6 {
        return lens_root_approx(u);
    }
    let index = (index as usize).min(LOOKUP_SIZE - 1);
    let mut a = LOOKUP[index];
    for _ in 0..3 {
        a = (a * a * (1.0 - 2.0 * a / 3.0) + u) / ((2.0 - a) * a);
    }
    a
}

/// Uniform point in the lens of two unit spheres centered at `(-d/2, 0, 0)` and
/// `(d/2, 0, 0)`, in that frame. Requires `d <= 2`.
pub fn random_lens_point(d: f64, rng: &mut dyn RandomSource) -> Vector3<f64> {
    debug_assert!(d <= 2.0, "spheres {d} apart do not overlap");
    let cap = 1.0 - 0.5 * d;
    let u = rng.next_f64() * cap * cap * (1.0 - cap / 3.0);
    let h = lens_root(u);
    let mut x = cap - h;
    let from_center = 1.0 - h;
    if rng.next_f64() > 0.5 {
        x = -x;
    }
    let diameter = 2.0 * (1.0 - from_center * from_center).max(0.0).sqrt();

    let (mut y, mut z);
    loop {
        y = rng.next_f64() - 0.5;
        z = rng.next_f64() - 0.5;
        if y * y + z * z <= 0.25 {
            break;
        }
    }
    Vector3::new(x, diameter * y, diameter * z)
}

/// Uniform point in the lens of unit spheres centered at `a` and `b`, using the
/// closed-form depth sampler.
pub fn lens_point_between(
    a: &Point3<f64>,
    b: &Point3<f64>,
    rng: &mut dyn RandomSource,
) -> Point3<f64> {
    let ab = b - a;
    let d = ab.norm();
    let local = random_lens_point(d, rng);
    let axis = ab / d;
    let normal = any_perpendicular(&axis).into_inner();
    let binormal = normal.cross(&axis);
    let midpoint = a + 0.5 * ab;
    midpoint + local.x * axis + local.y * normal + local.z * binormal
}

/// Uniform point in the lens of unit spheres centered at `a` and `b` by rejection
/// inside the bounding box of the overlap. Efficient when the spheres are less
/// than one apart. Returns `None` after `max_attempts` rejections.
pub fn lens_point_by_rejection(
    a: &Point3<f64>,
    b: &Point3<f64>,
    rng: &mut dyn RandomSource,
    max_attempts: u64,
) -> Option<Point3<f64>> {
    let lo = Vector3::new(
        a.x.max(b.x) - 1.0,
        a.y.max(b.y) - 1.0,
        a.z.max(b.z) - 1.0,
    );
    let hi = Vector3::new(
        a.x.min(b.x) + 1.0,
        a.y.min(b.y) + 1.0,
        a.z.min(b.z) + 1.0,
    );
    let span = hi - lo;
    for _ in 0..max_attempts {
        let point = Point3::new(
            lo.x + span.x * rng.next_f64(),
            lo.y + span.y * rng.next_f64(),
            lo.z + span.z * rng.next_f64(),
        );
        if (point - a).norm_squared() < 1.0 && (point - b).norm_squared() < 1.0 {
            return Some(point);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const TOLERANCE: f64 = 1e-12;

    fn cap_volume(h: f64) -> f64 {
        h * h * (1.0 - h / 3.0)
    }

    #[test]
    fn exact_root_inverts_the_cap_volume() {
        for k in 1..=100 {
            let u = k as f64 / 150.0;
            let h = lens_root_exact(u);
            assert!((0.0..=1.0 + TOLERANCE).contains(&h));
            assert!((cap_volume(h) - u).abs() < TOLERANCE, "u = {u}");
        }
    }

    #[test]
    fn fast_root_matches_exact_root() {
        let mut u = 1e-6;
        while u <= 2.0 / 3.0 {
            assert!((lens_root(u) - lens_root_exact(u)).abs() < 1e-9, "u = {u}");
            u *= 1.07;
        }
        assert!((lens_root(2.0 / 3.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn lens_points_lie_in_both_spheres() {
        let mut rng = StdRng::seed_from_u64(40);
        for &d in &[0.0, 0.3, 1.0, 1.7, 1.99] {
            let left = Vector3::new(-0.5 * d, 0.0, 0.0);
            let right = Vector3::new(0.5 * d, 0.0, 0.0);
            for _ in 0..2000 {
                let p = random_lens_point(d, &mut rng);
                assert!((p - left).norm() <= 1.0 + 1e-9);
                assert!((p - right).norm() <= 1.0 + 1e-9);
            }
        }
    }

    #[test]
    fn lens_points_are_symmetric_about_the_mid_plane() {
        let mut rng = StdRng::seed_from_u64(41);
        let n = 40_000;
        let mean_x: f64 = (0..n).map(|_| random_lens_point(1.2, &mut rng).x).sum::<f64>() / n as f64;
        assert!(mean_x.abs() < 0.01);
    }

    #[test]
    fn oriented_lens_points_overlap_both_centers() {
        let mut rng = StdRng::seed_from_u64(42);
        let a = Point3::new(0.3, -0.2, 1.0);
        let b = Point3::new(1.1, 0.9, 0.4);
        for _ in 0..2000 {
            let p = lens_point_between(&a, &b, &mut rng);
            assert!((p - a).norm() <= 1.0 + 1e-9);
            assert!((p - b).norm() <= 1.0 + 1e-9);
        }
    }

    #[test]
    fn rejection_sampler_stays_in_the_overlap() {
        let mut rng = StdRng::seed_from_u64(43);
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(0.2, 0.5, -0.3);
        for _ in 0..2000 {
            let p = lens_point_by_rejection(&a, &b, &mut rng, 1000).unwrap();
            assert!((p - a).norm() < 1.0);
            assert!((p - b).norm() < 1.0);
        }
    }
}
