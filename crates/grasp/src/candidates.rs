//! # Grasp Candidate Generator
//!
//! Proposes gripper poses around a fitted box. Each face of the box gets an
//! approach point `grasp_length` beyond the face, and a fixed set of gripper
//! orientations that point the fingers back at the object.

use std::f64::consts::{FRAC_PI_2, PI};

use geometry::{Aabb, DVec3, Euler, Pose};

/// One of the six axis-aligned approach directions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FaceDirection {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

const fn e(roll: f64, pitch: f64, yaw: f64) -> Euler {
    Euler::new(roll, pitch, yaw)
}

const POS_X: [Euler; 4] = [
    e(FRAC_PI_2, 0.0, -FRAC_PI_2),
    e(FRAC_PI_2, PI, -FRAC_PI_2),
    e(FRAC_PI_2, -FRAC_PI_2, -FRAC_PI_2),
    e(FRAC_PI_2, FRAC_PI_2, -FRAC_PI_2),
];
const NEG_X: [Euler; 6] = [
    e(FRAC_PI_2, 0.0, FRAC_PI_2),
    e(FRAC_PI_2, PI, FRAC_PI_2),
    e(FRAC_PI_2, -FRAC_PI_2, FRAC_PI_2),
    e(FRAC_PI_2, FRAC_PI_2, FRAC_PI_2),
    e(-PI, -FRAC_PI_2, 0.0),
    e(-PI, -FRAC_PI_2, -PI),
];
const POS_Y: [Euler; 4] = [
    e(0.0, FRAC_PI_2, -FRAC_PI_2),
    e(0.0, -FRAC_PI_2, FRAC_PI_2),
    e(FRAC_PI_2, PI, 0.0),
    e(FRAC_PI_2, 0.0, 0.0),
];
const NEG_Y: [Euler; 4] = [
    e(0.0, FRAC_PI_2, FRAC_PI_2),
    e(0.0, -FRAC_PI_2, -FRAC_PI_2),
    e(-FRAC_PI_2, PI, 0.0),
    e(-FRAC_PI_2, 0.0, 0.0),
];
const POS_Z: [Euler; 4] = [
    e(PI, 0.0, FRAC_PI_2),
    e(PI, 0.0, -FRAC_PI_2),
    e(PI, 0.0, 0.0),
    e(PI, 0.0, PI),
];
const NEG_Z: [Euler; 4] = [
    e(0.0, 0.0, -FRAC_PI_2),
    e(0.0, 0.0, FRAC_PI_2),
    e(0.0, 0.0, 0.0),
    e(0.0, 0.0, PI),
];

impl FaceDirection {
    pub const ALL: [FaceDirection; 6] = [
        FaceDirection::PosX,
        FaceDirection::PosY,
        FaceDirection::PosZ,
        FaceDirection::NegX,
        FaceDirection::NegY,
        FaceDirection::NegZ,
    ];

    /// Classify a direction by the sign of its dominant component. Ties
    /// prefer x over y over z. `None` for zero or non-finite vectors.
    #[must_use]
    pub fn classify(direction: DVec3) -> Option<Self> {
        if !direction.is_finite() || direction == DVec3::ZERO {
            return None;
        }
        let a = direction.abs();
        let face = if a.x >= a.y && a.x >= a.z {
            if direction.x > 0.0 {
                Self::PosX
            } else {
                Self::NegX
            }
        } else if a.y >= a.z {
            if direction.y > 0.0 {
                Self::PosY
            } else {
                Self::NegY
            }
        } else if direction.z > 0.0 {
            Self::PosZ
        } else {
            Self::NegZ
        };
        Some(face)
    }

    #[must_use]
    pub fn unit(self) -> DVec3 {
        match self {
            Self::PosX => DVec3::X,
            Self::NegX => DVec3::NEG_X,
            Self::PosY => DVec3::Y,
            Self::NegY => DVec3::NEG_Y,
            Self::PosZ => DVec3::Z,
            Self::NegZ => DVec3::NEG_Z,
        }
    }

    /// Gripper orientations that approach this face with the fingers
    /// pointing at the object.
    #[must_use]
    pub fn orientations(self) -> &'static [Euler] {
        match self {
            Self::PosX => &POS_X,
            Self::NegX => &NEG_X,
            Self::PosY => &POS_Y,
            Self::NegY => &NEG_Y,
            Self::PosZ => &POS_Z,
            Self::NegZ => &NEG_Z,
        }
    }
}

/// A face of the box to approach from.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Face {
    pub direction: FaceDirection,
    /// Unit normal of the face (custom faces need not be axis-aligned).
    pub normal: DVec3,
    /// Approach point relative to the box center.
    pub offset: DVec3,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Candidate {
    pub face: FaceDirection,
    /// Gripper pose in the box frame.
    pub pose: Pose,
}

/// Approach points around `aabb`, relative to its center.
///
/// The default faces are ±x, ±y, ±z pushed out by half the extent plus
/// `grasp_length`. Custom directions are scaled componentwise by the same
/// vector; zero directions are skipped.
#[must_use]
pub fn face_points(aabb: &Aabb, grasp_length: f64, faces: Option<&[DVec3]>) -> Vec<Face> {
    let reach = aabb.extent() / 2.0 + DVec3::splat(grasp_length);
    let directions: Vec<DVec3> = match faces {
        Some(custom) => custom.to_vec(),
        None => FaceDirection::ALL.iter().map(|f| f.unit()).collect(),
    };
    directions
        .into_iter()
        .filter_map(|d| {
            let offset = d * reach;
            let normal = offset.normalize_or_zero();
            let direction = FaceDirection::classify(normal)?;
            Some(Face {
                direction,
                normal,
                offset,
            })
        })
        .collect()
}

/// Whether a face normal has a component on an axis shorter than the
/// longest extent, i.e. the face runs along the longest dimension.
#[must_use]
pub fn spans_longest(extent: DVec3, normal: DVec3) -> bool {
    let longest = extent.max_element();
    (0..3).any(|i| extent[i] < longest && normal[i].abs() > 0.0)
}

/// Every candidate gripper pose for `aabb`, in face order then table order.
///
/// With `handle_filter` only faces that run along the longest dimension are
/// used.
#[must_use]
pub fn generate_candidates(
    aabb: &Aabb,
    grasp_length: f64,
    handle_filter: bool,
    faces: Option<&[DVec3]>,
) -> Vec<Candidate> {
    let center = aabb.center();
    let extent = aabb.extent();
    let mut candidates = Vec::new();
    for face in face_points(aabb, grasp_length, faces) {
        if handle_filter && !spans_longest(extent, face.normal) {
            continue;
        }
        let point = Pose::from_point(center + face.offset);
        candidates.extend(face.direction.orientations().iter().map(|euler| Candidate {
            face: face.direction,
            pose: point.multiply(&Pose::from_euler(*euler)),
        }));
    }
    candidates
}
