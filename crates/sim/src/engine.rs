//! # Engine Traits
//!
//! [`Simulation`] is the minimal body/link/joint/contact query surface the
//! grasp search consumes. [`Gripper`] is implemented per robot type and is
//! generic over the engine it drives.

use std::path::Path;

use geometry::{Aabb, DVec3, Pose};

use crate::error::SimError;
use crate::types::{BodyId, CollisionShape, Contact, JointInfo, LinkId, LoadOptions};

pub trait Simulation {
    /// Load a model description file as a new body.
    ///
    /// # Errors
    ///
    /// Fails when the file is not a known model or the scale is not positive.
    fn load_model(&mut self, path: &Path, options: &LoadOptions) -> Result<BodyId, SimError>;

    /// # Errors
    ///
    /// Fails for unknown bodies.
    fn remove_body(&mut self, body: BodyId) -> Result<(), SimError>;

    /// Name the body was loaded under.
    fn body_name(&self, body: BodyId) -> Option<String>;

    /// # Errors
    ///
    /// Fails for unknown bodies.
    fn body_pose(&self, body: BodyId) -> Result<Pose, SimError>;

    /// # Errors
    ///
    /// Fails for unknown bodies.
    fn set_body_pose(&mut self, body: BodyId, pose: &Pose) -> Result<(), SimError>;

    /// World pose of a link frame. The base link frame is the body pose.
    ///
    /// # Errors
    ///
    /// Fails for unknown bodies or links.
    fn link_pose(&self, body: BodyId, link: LinkId) -> Result<Pose, SimError>;

    /// Number of child links (equal to the number of joints).
    ///
    /// # Errors
    ///
    /// Fails for unknown bodies.
    fn num_links(&self, body: BodyId) -> Result<usize, SimError>;

    /// World-frame AABB of one link's collision geometry.
    ///
    /// # Errors
    ///
    /// Fails for unknown bodies or links, or links without collision geometry.
    fn link_aabb(&self, body: BodyId, link: LinkId) -> Result<Aabb, SimError>;

    /// Collision elements of a link, possibly empty.
    ///
    /// # Errors
    ///
    /// Fails for unknown bodies or links.
    fn collision_shapes(&self, body: BodyId, link: LinkId)
        -> Result<Vec<CollisionShape>, SimError>;

    /// Collision vertices of a link in the link frame, each element already
    /// placed by its local collision frame.
    ///
    /// # Errors
    ///
    /// Fails for unknown bodies or links.
    fn link_vertices(&self, body: BodyId, link: LinkId) -> Result<Vec<DVec3>, SimError>;

    /// # Errors
    ///
    /// Fails for unknown bodies.
    fn joints(&self, body: BodyId) -> Result<Vec<JointInfo>, SimError>;

    /// # Errors
    ///
    /// Fails for unknown bodies or joints.
    fn joint_positions(&self, body: BodyId, joints: &[usize]) -> Result<Vec<f64>, SimError>;

    /// # Errors
    ///
    /// Fails for unknown bodies or joints.
    fn set_joint_position(
        &mut self,
        body: BodyId,
        joint: usize,
        position: f64,
    ) -> Result<(), SimError>;

    /// Contacts where `body` is `body_a`.
    ///
    /// # Errors
    ///
    /// Fails for unknown bodies.
    fn contacts(&self, body: BodyId) -> Result<Vec<Contact>, SimError>;

    /// The base link followed by every child link.
    ///
    /// # Errors
    ///
    /// Fails for unknown bodies.
    fn all_links(&self, body: BodyId) -> Result<Vec<LinkId>, SimError> {
        let n = self.num_links(body)?;
        Ok(std::iter::once(LinkId::Base)
            .chain((0..n).map(LinkId::Index))
            .collect())
    }

    /// # Errors
    ///
    /// Fails for unknown bodies or links.
    fn can_collide(&self, body: BodyId, link: LinkId) -> Result<bool, SimError> {
        Ok(!self.collision_shapes(body, link)?.is_empty())
    }

    /// Union of the AABBs of every collidable link.
    ///
    /// # Errors
    ///
    /// Fails for unknown bodies or bodies without any collision geometry.
    fn body_aabb(&self, body: BodyId) -> Result<Aabb, SimError> {
        let mut boxes = Vec::new();
        for link in self.all_links(body)? {
            if self.can_collide(body, link)? {
                boxes.push(self.link_aabb(body, link)?);
            }
        }
        Aabb::union(boxes).ok_or(SimError::NoCollisionGeometry {
            body,
            link: LinkId::Base,
        })
    }

    /// Scale a body was loaded at, read from the first collision element of
    /// the first child link (or the base when there are no child links).
    fn loaded_scale(&self, body: BodyId) -> Option<f64> {
        let link = match self.num_links(body).ok()? {
            0 => LinkId::Base,
            _ => LinkId::Index(0),
        };
        let shapes = self.collision_shapes(body, link).ok()?;
        match shapes.first() {
            Some(shape) => Some(shape.dimensions.x),
            None => {
                tracing::warn!("no collision data for body {body}, scale unknown");
                None
            }
        }
    }
}

/// A robot hand that can be placed by inverse kinematics and actuated.
///
/// Calls mutate the simulation: a configuration passed to
/// [`Gripper::is_colliding`] stays applied afterwards, and opening or closing
/// moves the finger joints of [`Gripper::body`].
pub trait Gripper<S: Simulation + ?Sized> {
    /// Robot type name, used to pick the grasp database file.
    fn type_name(&self) -> &str;

    fn body(&self) -> BodyId;

    /// Joint indices of the fingers on [`Gripper::body`].
    fn gripper_joints(&self) -> &[usize];

    /// Solve for a configuration reaching `target`; `None` when unreachable.
    fn inverse_kinematics(&mut self, sim: &mut S, target: &Pose) -> Option<Vec<f64>>;

    /// Move to `conf` and report whether the robot touches anything.
    ///
    /// # Errors
    ///
    /// Propagates engine failures.
    fn is_colliding(&mut self, sim: &mut S, conf: &[f64]) -> Result<bool, SimError>;

    /// # Errors
    ///
    /// Propagates engine failures.
    fn open_gripper(&mut self, sim: &mut S) -> Result<(), SimError>;

    /// Close the fingers until they are blocked or fully shut.
    ///
    /// # Errors
    ///
    /// Propagates engine failures.
    fn close_gripper(&mut self, sim: &mut S) -> Result<(), SimError>;
}
