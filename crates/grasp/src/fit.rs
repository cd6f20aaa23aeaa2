//! # Bounding Box Fitter
//!
//! Fits an axis-aligned box to a body (or one of its links) in the frame of
//! its collision geometry, and reports the box edges in the world frame for
//! debugging.

use assets::{description_from_mesh, RotationCache};
use geometry::{apply_affine, Aabb, DVec3, Pose};
use sim::{BodyId, GeometryType, LinkId, Simulation};

use crate::error::GraspError;

#[derive(Clone, Debug, PartialEq)]
pub struct FittedBox {
    /// Box in the local frame of the fitted geometry.
    pub aabb: Aabb,
    /// The 12 box edges placed by the model pose, world frame.
    pub debug_edges: Vec<(DVec3, DVec3)>,
}

/// Fit a box to every collidable link of `body`, or only to `link`.
///
/// Vertices of each link are taken back into the frame of its first
/// collision element. Primitive geometry uses the engine AABB instead.
///
/// # Errors
///
/// Returns [`GraspError::NoCollisionGeometry`] when no vertices are found,
/// and propagates engine failures.
pub fn fit_box<S: Simulation + ?Sized>(
    sim: &S,
    rotations: &mut RotationCache,
    body: BodyId,
    link: Option<LinkId>,
) -> Result<FittedBox, GraspError> {
    let links = match link {
        Some(link) => vec![link],
        None => sim.all_links(body)?,
    };

    let mut vertices = Vec::new();
    for &l in &links {
        let points = sim.link_vertices(body, l)?;
        if points.is_empty() {
            continue;
        }
        let frame = sim
            .collision_shapes(body, l)?
            .first()
            .map_or(Pose::IDENTITY, |shape| shape.local_frame);
        vertices.extend(apply_affine(&frame.invert(), &points));
    }

    let reference = link.unwrap_or(LinkId::Base);
    let Some(from_points) = Aabb::from_points(&vertices) else {
        return Err(GraspError::NoCollisionGeometry {
            body,
            link: reference,
        });
    };

    let first_shape = sim.collision_shapes(body, reference)?.into_iter().next();
    let aabb = match first_shape {
        Some(shape) if shape.geometry != GeometryType::Mesh => match link {
            Some(l) => sim.link_aabb(body, l)?,
            None => sim.body_aabb(body)?,
        },
        _ => from_points,
    };

    let pose = model_pose(sim, rotations, body, link)?;
    let debug_edges = aabb
        .edges()
        .into_iter()
        .map(|(a, b)| (pose.transform_point(a), pose.transform_point(b)))
        .collect();

    tracing::debug!(
        "fitted box of {body} ({} vertices): extent {:?}",
        vertices.len(),
        aabb.extent()
    );
    Ok(FittedBox { aabb, debug_edges })
}

/// World pose of the frame a fitted box is expressed in: the link pose for a
/// link, or the body pose corrected by the model's base rotation.
///
/// # Errors
///
/// Propagates engine failures.
pub fn model_pose<S: Simulation + ?Sized>(
    sim: &S,
    rotations: &mut RotationCache,
    body: BodyId,
    link: Option<LinkId>,
) -> Result<Pose, GraspError> {
    if let Some(link) = link {
        return Ok(sim.link_pose(body, link)?);
    }
    let body_pose = sim.body_pose(body)?;
    let probe = match sim.num_links(body)? {
        0 => LinkId::Base,
        _ => LinkId::Index(0),
    };
    let description = sim
        .collision_shapes(body, probe)?
        .into_iter()
        .find_map(|shape| shape.file_name)
        .and_then(|file| description_from_mesh(&file));
    let rotation = match description {
        Some(path) => rotations.model_rotation(&path),
        None => Pose::IDENTITY,
    };
    Ok(body_pose.multiply(&rotation))
}
