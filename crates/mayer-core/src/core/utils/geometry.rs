use nalgebra::{Point3, Rotation3, Unit, Vector3};
use std::f64::consts::PI;

/// Rotation by `angle` radians about `axis`. The axis need not be normalized.
pub fn rotation_about_axis(axis: &Vector3<f64>, angle: f64) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Unit::new_normalize(*axis), angle)
}

/// Angle `a-b-c` at vertex `b`, in radians.
pub fn bond_angle(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    let ba = a - b;
    let bc = c - b;
    let cos = ba.dot(&bc) / (ba.norm() * bc.norm());
    cos.clamp(-1.0, 1.0).acos()
}

/// Signed dihedral angle `a-b-c-d` about the `b-c` bond, in `(-PI, PI]`.
pub fn dihedral_angle(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    d: &Point3<f64>,
) -> f64 {
    let b1 = b - a;
    let b2 = c - b;
    let b3 = d - c;
    let n1 = b1.cross(&b2);
    let n2 = b2.cross(&b3);
    let y = b2.norm() * b1.dot(&n2);
    let x = n1.dot(&n2);
    y.atan2(x)
}

/// Maps an angle to `(-PI, PI]`.
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped == -PI { PI } else { wrapped }
}

/// A unit vector perpendicular to `v`.
pub fn any_perpendicular(v: &Vector3<f64>) -> Unit<Vector3<f64>> {
    let helper = if v.x.abs() < 0.9 * v.norm() {
        Vector3::x()
    } else {
        Vector3::y()
    };
    Unit::new_normalize(v.cross(&helper))
}
