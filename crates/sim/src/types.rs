//! Plain data exchanged with the simulation engine.

use std::fmt;
use std::path::PathBuf;

use geometry::{DVec3, Pose};

/// Handle of a body inside one simulation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u32);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A link of a body. Child links are numbered like their parent joints.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LinkId {
    Base,
    Index(usize),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GeometryType {
    Sphere,
    Box,
    Capsule,
    Cylinder,
    Plane,
    Mesh,
}

/// One collision element of a link.
#[derive(Clone, Debug, PartialEq)]
pub struct CollisionShape {
    pub link: LinkId,
    pub geometry: GeometryType,
    /// Mesh scale for meshes, full size for primitives.
    pub dimensions: DVec3,
    /// Shape frame relative to the link frame.
    pub local_frame: Pose,
    /// Source file of the mesh, if any.
    pub file_name: Option<PathBuf>,
}

/// Contact point reported for `body_a`.
#[derive(Clone, Debug, PartialEq)]
pub struct Contact {
    pub body_a: BodyId,
    pub body_b: BodyId,
    pub link_a: LinkId,
    pub link_b: LinkId,
    pub position: DVec3,
    /// Signed separation, negative when penetrating.
    pub distance: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum JointKind {
    Revolute,
    Prismatic,
    Fixed,
}

#[derive(Clone, Debug, PartialEq)]
pub struct JointInfo {
    pub index: usize,
    pub name: String,
    pub kind: JointKind,
    pub lower_limit: f64,
    pub upper_limit: f64,
}

/// Options for loading a model description.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadOptions {
    pub base_position: DVec3,
    pub scale: f64,
    pub body_name: Option<String>,
    pub fixed_base: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            base_position: DVec3::ZERO,
            scale: 1.0,
            body_name: None,
            fixed_base: true,
        }
    }
}
