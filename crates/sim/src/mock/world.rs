use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use geometry::{Aabb, DQuat, DVec3, Pose};

use super::obb::Obb;
use crate::engine::Simulation;
use crate::error::SimError;
use crate::types::{
    BodyId, CollisionShape, Contact, GeometryType, JointInfo, JointKind, LinkId, LoadOptions,
};

/// A box-shaped collision element, either a primitive or a box-like mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct MockShape {
    pub geometry: GeometryType,
    pub half_extents: DVec3,
    pub local_frame: Pose,
}

impl MockShape {
    #[must_use]
    pub fn cuboid(half_extents: DVec3) -> Self {
        Self {
            geometry: GeometryType::Box,
            half_extents,
            local_frame: Pose::IDENTITY,
        }
    }

    /// Box-shaped triangle mesh. Reports its scale instead of its size.
    #[must_use]
    pub fn mesh(half_extents: DVec3) -> Self {
        Self {
            geometry: GeometryType::Mesh,
            half_extents,
            local_frame: Pose::IDENTITY,
        }
    }

    #[must_use]
    pub fn at(mut self, local_frame: Pose) -> Self {
        self.local_frame = local_frame;
        self
    }

    fn scaled(&self, scale: f64) -> Self {
        Self {
            geometry: self.geometry,
            half_extents: self.half_extents * scale,
            local_frame: Pose::new(self.local_frame.point * scale, self.local_frame.quat),
        }
    }

    /// Corners in the link frame.
    fn vertices(&self) -> [DVec3; 8] {
        Obb::from_pose(&self.local_frame, self.half_extents).corners()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MockJoint {
    pub name: String,
    pub kind: JointKind,
    pub axis: DVec3,
    pub lower: f64,
    pub upper: f64,
}

impl MockJoint {
    #[must_use]
    pub fn fixed(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: JointKind::Fixed,
            axis: DVec3::Z,
            lower: 0.0,
            upper: 0.0,
        }
    }

    #[must_use]
    pub fn prismatic(name: &str, axis: DVec3, lower: f64, upper: f64) -> Self {
        Self {
            name: name.to_string(),
            kind: JointKind::Prismatic,
            axis,
            lower,
            upper,
        }
    }

    #[must_use]
    pub fn revolute(name: &str, axis: DVec3, lower: f64, upper: f64) -> Self {
        Self {
            name: name.to_string(),
            kind: JointKind::Revolute,
            axis,
            lower,
            upper,
        }
    }

    fn motion(&self, q: f64) -> Pose {
        match self.kind {
            JointKind::Fixed => Pose::IDENTITY,
            JointKind::Prismatic => Pose::from_point(self.axis.normalize() * q),
            JointKind::Revolute => {
                Pose::new(DVec3::ZERO, DQuat::from_axis_angle(self.axis.normalize(), q))
            }
        }
    }
}

/// A child link attached to the base through one joint.
#[derive(Clone, Debug, PartialEq)]
pub struct MockLink {
    /// Joint frame relative to the body frame at zero joint position.
    pub origin: Pose,
    pub joint: MockJoint,
    pub shapes: Vec<MockShape>,
}

/// Model description the mock engine can load.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MockModel {
    pub base: Vec<MockShape>,
    pub links: Vec<MockLink>,
    /// Reported as the source file of mesh elements.
    pub mesh_file: Option<PathBuf>,
}

impl MockModel {
    /// Single-link model made of one box-like mesh.
    #[must_use]
    pub fn mesh_box(half_extents: DVec3) -> Self {
        Self {
            base: vec![MockShape::mesh(half_extents)],
            ..Self::default()
        }
    }

    fn scaled(&self, scale: f64) -> Self {
        Self {
            base: self.base.iter().map(|s| s.scaled(scale)).collect(),
            links: self
                .links
                .iter()
                .map(|l| MockLink {
                    origin: Pose::new(l.origin.point * scale, l.origin.quat),
                    joint: l.joint.clone(),
                    shapes: l.shapes.iter().map(|s| s.scaled(scale)).collect(),
                })
                .collect(),
            mesh_file: self.mesh_file.clone(),
        }
    }
}

#[derive(Clone, Debug)]
struct MockBody {
    name: Option<String>,
    model: MockModel,
    pose: Pose,
    joint_positions: Vec<f64>,
    scale: f64,
}

impl MockBody {
    fn shapes(&self, link: LinkId) -> Option<&[MockShape]> {
        match link {
            LinkId::Base => Some(&self.model.base),
            LinkId::Index(i) => self.model.links.get(i).map(|l| l.shapes.as_slice()),
        }
    }

    fn link_pose(&self, link: LinkId) -> Option<Pose> {
        match link {
            LinkId::Base => Some(self.pose),
            LinkId::Index(i) => {
                let l = self.model.links.get(i)?;
                let q = self.joint_positions.get(i).copied().unwrap_or(0.0);
                Some(self.pose.multiply(&l.origin).multiply(&l.joint.motion(q)))
            }
        }
    }

    fn links(&self) -> impl Iterator<Item = LinkId> {
        std::iter::once(LinkId::Base).chain((0..self.model.links.len()).map(LinkId::Index))
    }

    fn obbs(&self, link: LinkId) -> Vec<Obb> {
        let (Some(frame), Some(shapes)) = (self.link_pose(link), self.shapes(link)) else {
            return Vec::new();
        };
        shapes
            .iter()
            .map(|s| Obb::from_pose(&frame.multiply(&s.local_frame), s.half_extents))
            .collect()
    }
}

/// Box world implementing [`Simulation`].
#[derive(Default)]
pub struct MockSim {
    bodies: BTreeMap<BodyId, MockBody>,
    models: HashMap<PathBuf, MockModel>,
    next_id: u32,
}

impl MockSim {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `model` loadable from `path`.
    pub fn register_model(&mut self, path: impl Into<PathBuf>, model: MockModel) {
        self.models.insert(path.into(), model);
    }

    /// Insert a body directly at unit scale.
    pub fn spawn(&mut self, model: MockModel, pose: Pose, name: Option<String>) -> BodyId {
        self.insert(model, pose, name, 1.0)
    }

    /// Static box primitive, handy for floors and obstacles.
    pub fn add_box(&mut self, name: &str, center: DVec3, half_extents: DVec3) -> BodyId {
        let model = MockModel {
            base: vec![MockShape::cuboid(half_extents)],
            ..MockModel::default()
        };
        self.spawn(model, Pose::from_point(center), Some(name.to_string()))
    }

    #[must_use]
    pub fn num_bodies(&self) -> usize {
        self.bodies.len()
    }

    fn insert(&mut self, model: MockModel, pose: Pose, name: Option<String>, scale: f64) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;
        let joint_positions = model
            .links
            .iter()
            .map(|l| 0.0_f64.clamp(l.joint.lower.min(l.joint.upper), l.joint.upper.max(l.joint.lower)))
            .collect();
        self.bodies.insert(
            id,
            MockBody {
                name,
                model,
                pose,
                joint_positions,
                scale,
            },
        );
        id
    }

    fn body(&self, body: BodyId) -> Result<&MockBody, SimError> {
        self.bodies.get(&body).ok_or(SimError::UnknownBody(body))
    }

    fn body_mut(&mut self, body: BodyId) -> Result<&mut MockBody, SimError> {
        self.bodies.get_mut(&body).ok_or(SimError::UnknownBody(body))
    }

    fn check_link(&self, body: BodyId, link: LinkId) -> Result<&MockBody, SimError> {
        let b = self.body(body)?;
        match b.shapes(link) {
            Some(_) => Ok(b),
            None => Err(SimError::UnknownLink { body, link }),
        }
    }

    /// Whether a link of `body` overlaps any other body.
    ///
    /// # Errors
    ///
    /// Fails for unknown bodies or links.
    pub fn link_touches_other(&self, body: BodyId, link: LinkId) -> Result<bool, SimError> {
        let own = self.check_link(body, link)?.obbs(link);
        Ok(self
            .bodies
            .iter()
            .filter(|(id, _)| **id != body)
            .any(|(_, other)| {
                other
                    .links()
                    .flat_map(|l| other.obbs(l))
                    .any(|b| own.iter().any(|a| a.overlaps(&b)))
            }))
    }
}

impl Simulation for MockSim {
    fn load_model(&mut self, path: &Path, options: &LoadOptions) -> Result<BodyId, SimError> {
        if !(options.scale.is_finite() && options.scale > 0.0) {
            return Err(SimError::InvalidScale(options.scale));
        }
        let model = self
            .models
            .get(path)
            .ok_or_else(|| SimError::UnknownModel(path.to_path_buf()))?
            .scaled(options.scale);
        let id = self.insert(
            model,
            Pose::from_point(options.base_position),
            options.body_name.clone(),
            options.scale,
        );
        tracing::debug!("mock engine loaded {} as {id} at scale {}", path.display(), options.scale);
        Ok(id)
    }

    fn remove_body(&mut self, body: BodyId) -> Result<(), SimError> {
        self.bodies
            .remove(&body)
            .map(|_| ())
            .ok_or(SimError::UnknownBody(body))
    }

    fn body_name(&self, body: BodyId) -> Option<String> {
        self.bodies.get(&body).and_then(|b| b.name.clone())
    }

    fn body_pose(&self, body: BodyId) -> Result<Pose, SimError> {
        Ok(self.body(body)?.pose)
    }

    fn set_body_pose(&mut self, body: BodyId, pose: &Pose) -> Result<(), SimError> {
        self.body_mut(body)?.pose = *pose;
        Ok(())
    }

    fn link_pose(&self, body: BodyId, link: LinkId) -> Result<Pose, SimError> {
        self.body(body)?
            .link_pose(link)
            .ok_or(SimError::UnknownLink { body, link })
    }

    fn num_links(&self, body: BodyId) -> Result<usize, SimError> {
        Ok(self.body(body)?.model.links.len())
    }

    fn link_aabb(&self, body: BodyId, link: LinkId) -> Result<Aabb, SimError> {
        let corners: Vec<DVec3> = self
            .check_link(body, link)?
            .obbs(link)
            .iter()
            .flat_map(Obb::corners)
            .collect();
        Aabb::from_points(&corners).ok_or(SimError::NoCollisionGeometry { body, link })
    }

    fn collision_shapes(
        &self,
        body: BodyId,
        link: LinkId,
    ) -> Result<Vec<CollisionShape>, SimError> {
        let b = self.check_link(body, link)?;
        let shapes = b.shapes(link).unwrap_or_default();
        Ok(shapes
            .iter()
            .map(|s| CollisionShape {
                link,
                geometry: s.geometry,
                dimensions: match s.geometry {
                    GeometryType::Mesh => DVec3::splat(b.scale),
                    _ => s.half_extents * 2.0,
                },
                local_frame: s.local_frame,
                file_name: match s.geometry {
                    GeometryType::Mesh => b.model.mesh_file.clone(),
                    _ => None,
                },
            })
            .collect())
    }

    fn link_vertices(&self, body: BodyId, link: LinkId) -> Result<Vec<DVec3>, SimError> {
        let b = self.check_link(body, link)?;
        Ok(b.shapes(link)
            .unwrap_or_default()
            .iter()
            .flat_map(MockShape::vertices)
            .collect())
    }

    fn joints(&self, body: BodyId) -> Result<Vec<JointInfo>, SimError> {
        Ok(self
            .body(body)?
            .model
            .links
            .iter()
            .enumerate()
            .map(|(index, l)| JointInfo {
                index,
                name: l.joint.name.clone(),
                kind: l.joint.kind,
                lower_limit: l.joint.lower,
                upper_limit: l.joint.upper,
            })
            .collect())
    }

    fn joint_positions(&self, body: BodyId, joints: &[usize]) -> Result<Vec<f64>, SimError> {
        let b = self.body(body)?;
        joints
            .iter()
            .map(|&joint| {
                b.joint_positions
                    .get(joint)
                    .copied()
                    .ok_or(SimError::UnknownJoint { body, joint })
            })
            .collect()
    }

    fn set_joint_position(
        &mut self,
        body: BodyId,
        joint: usize,
        position: f64,
    ) -> Result<(), SimError> {
        let slot = self
            .body_mut(body)?
            .joint_positions
            .get_mut(joint)
            .ok_or(SimError::UnknownJoint { body, joint })?;
        *slot = position;
        Ok(())
    }

    fn contacts(&self, body: BodyId) -> Result<Vec<Contact>, SimError> {
        let own = self.body(body)?;
        let mut contacts = Vec::new();
        for link_a in own.links() {
            let boxes_a = own.obbs(link_a);
            for (&other_id, other) in self.bodies.iter().filter(|(id, _)| **id != body) {
                for link_b in other.links() {
                    let hit = other.obbs(link_b).into_iter().find_map(|b| {
                        boxes_a
                            .iter()
                            .find(|a| a.overlaps(&b))
                            .map(|a| (a.center + b.center) / 2.0)
                    });
                    if let Some(position) = hit {
                        contacts.push(Contact {
                            body_a: body,
                            body_b: other_id,
                            link_a,
                            link_b,
                            position,
                            distance: 0.0,
                        });
                    }
                }
            }
        }
        Ok(contacts)
    }
}
