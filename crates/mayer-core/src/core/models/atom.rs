use nalgebra::{Point3, Rotation3, Unit, UnitQuaternion, Vector3};

/// Orientation carried by an anisotropic atom.
///
/// Linear sites only need a direction, while fully anisotropic sites keep a
/// quaternion. Both are rotated together with the position whenever a move
/// applies a rotation to the atom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Orientation {
    /// A unit direction, for example the axis of a diatomic bead.
    Direction(Unit<Vector3<f64>>),
    /// A full body-frame orientation.
    Quaternion(UnitQuaternion<f64>),
}

impl Orientation {
    /// Returns this orientation after applying `rotation`.
    pub fn rotated(&self, rotation: &Rotation3<f64>) -> Self {
        match self {
            Orientation::Direction(axis) => {
                Orientation::Direction(Unit::new_normalize(rotation * axis.into_inner()))
            }
            Orientation::Quaternion(q) => {
                Orientation::Quaternion(UnitQuaternion::from_rotation_matrix(rotation) * q)
            }
        }
    }
}

/// A single interaction site of a molecule.
///
/// Atoms are plain `Copy` values so snapshot buffers can capture and restore
/// them bit-for-bit without allocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Atom {
    /// Position of the site.
    pub position: Point3<f64>,
    /// Mass used for center-of-mass bookkeeping.
    pub mass: f64,
    /// Optional orientation, rotated along with the position.
    pub orientation: Option<Orientation>,
    /// Optional internal bond length for diatomic-in-bead models.
    pub bond_length: Option<f64>,
}

impl Atom {
    /// Creates a unit-mass atom without orientation or bond length.
    ///
    /// # Arguments
    ///
    /// * `position` - Initial position of the atom.
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            mass: 1.0,
            orientation: None,
            bond_length: None,
        }
    }

    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = Some(orientation);
        self
    }

    pub fn with_bond_length(mut self, bond_length: f64) -> Self {
        self.bond_length = Some(bond_length);
        self
    }
}

impl Default for Atom {
    fn default() -> Self {
        Self::new(Point3::origin())
    }
}
