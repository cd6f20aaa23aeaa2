//! # Asset Loader
//!
//! Loads a catalogued model into a [`Simulation`] at a scale sampled from its
//! category constraints, optionally resting on a floor body.

use std::path::PathBuf;

use geometry::{DVec3, Pose};
use sim::{BodyId, JointKind, LoadOptions, Simulation};

use crate::cache::ExtentCache;
use crate::catalog::CategoryGroup;
use crate::error::AssetError;
use crate::library::ModelLibrary;
use crate::scale::{compute_scale, ScalePolicy};
use crate::urdf::instance_name;

/// Clearance between a placed model and the floor.
const FLOOR_GAP: f64 = 0.01;

#[derive(Clone, Debug, PartialEq)]
pub struct LoadRequest {
    pub category: String,
    pub model_id: String,
    /// Body name, defaults to `<category>_<model_id>`.
    pub name: Option<String>,
    pub position: DVec3,
    /// Body to rest the model on. Only the x and y of `position` are used.
    pub floor: Option<BodyId>,
}

impl LoadRequest {
    #[must_use]
    pub fn new(category: &str, model_id: &str) -> Self {
        Self {
            category: category.to_string(),
            model_id: model_id.to_string(),
            name: None,
            position: DVec3::ZERO,
            floor: None,
        }
    }

    #[must_use]
    pub fn on_floor(mut self, floor: BodyId) -> Self {
        self.floor = Some(floor);
        self
    }

    #[must_use]
    pub fn at(mut self, position: DVec3) -> Self {
        self.position = position;
        self
    }

    #[must_use]
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoadedAsset {
    pub body: BodyId,
    pub name: String,
    pub scale: f64,
    pub path: PathBuf,
    /// Instance name declared in the description, the grasp database key.
    pub instance_name: Option<String>,
}

pub struct AssetLoader {
    library: ModelLibrary,
    extents: ExtentCache,
    policy: ScalePolicy,
    rng: fastrand::Rng,
}

impl AssetLoader {
    #[must_use]
    pub fn new(library: ModelLibrary, extents: ExtentCache, policy: ScalePolicy) -> Self {
        Self {
            library,
            extents,
            policy,
            rng: fastrand::Rng::new(),
        }
    }

    /// Reproducible scale sampling.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = fastrand::Rng::with_seed(seed);
        self
    }

    #[must_use]
    pub fn library(&self) -> &ModelLibrary {
        &self.library
    }

    pub fn library_mut(&mut self) -> &mut ModelLibrary {
        &mut self.library
    }

    #[must_use]
    pub fn extents(&self) -> &ExtentCache {
        &self.extents
    }

    /// AABB extent of a model at unit scale, measured once by loading it at
    /// the origin and removing it again.
    ///
    /// # Errors
    ///
    /// Fails when the model cannot be found or loaded, or the cache file
    /// cannot be written.
    pub fn natural_extent<S: Simulation + ?Sized>(
        &mut self,
        sim: &mut S,
        category: &str,
        model_id: &str,
    ) -> Result<DVec3, AssetError> {
        let path = self.library.model_path(category, model_id)?;
        let key = self.library.relative_name(&path);
        self.extents.get_or_measure(&key, || {
            let options = LoadOptions {
                body_name: Some("tmp".to_string()),
                ..LoadOptions::default()
            };
            let body = sim.load_model(&path, &options)?;
            let extent = sim.body_aabb(body).map(|aabb| aabb.extent());
            sim.remove_body(body)?;
            Ok(extent?)
        })
    }

    /// Scale for a model: 1 for uncatalogued or unconstrained categories,
    /// otherwise sampled from the admissible interval.
    ///
    /// # Errors
    ///
    /// Fails when the natural extent cannot be measured or the constraints
    /// cannot be met under the configured policy.
    pub fn sample_scale<S: Simulation + ?Sized>(
        &mut self,
        sim: &mut S,
        category: &str,
        model_id: &str,
    ) -> Result<f64, AssetError> {
        let Some(constraints) = self.library.catalog().constraints(category).cloned() else {
            return Ok(1.0);
        };
        let extent = self.natural_extent(sim, category, model_id)?;
        compute_scale(category, Some(&constraints), extent, self.policy, &mut self.rng)
    }

    /// Load a model, rest it on the floor if one is given and open folded
    /// containers.
    ///
    /// # Errors
    ///
    /// Fails when the model cannot be resolved, measured, scaled or loaded.
    pub fn load<S: Simulation + ?Sized>(
        &mut self,
        sim: &mut S,
        request: &LoadRequest,
    ) -> Result<LoadedAsset, AssetError> {
        let LoadRequest {
            category,
            model_id,
            ..
        } = request;
        let path = self.library.model_path(category, model_id)?;
        let name = request
            .name
            .clone()
            .unwrap_or_else(|| format!("{category}_{model_id}"));
        tracing::info!("loading {name} from {}", path.display());

        let scale = self.sample_scale(sim, category, model_id)?;

        let mut position = request.position;
        if let Some(floor) = request.floor {
            let extent = self.natural_extent(sim, category, model_id)?;
            position.z = sim.body_aabb(floor)?.upper.z + extent.z * scale / 2.0 + FLOOR_GAP;
        }

        let options = LoadOptions {
            base_position: position,
            scale,
            body_name: Some(name.clone()),
            ..LoadOptions::default()
        };
        let body = sim.load_model(&path, &options)?;

        if let Some(floor) = request.floor {
            seat_on(sim, body, floor)?;
        }

        if self
            .library
            .catalog()
            .in_group(category, CategoryGroup::FoldedContainer)
        {
            open_container(sim, body, category, model_id)?;
        }

        tracing::debug!("loaded {name} as body {body} at scale {scale:.4}");
        Ok(LoadedAsset {
            body,
            name,
            scale,
            instance_name: instance_name(&path),
            path,
        })
    }
}

/// Move `body` vertically so its AABB bottom sits just above `floor`.
fn seat_on<S: Simulation + ?Sized>(
    sim: &mut S,
    body: BodyId,
    floor: BodyId,
) -> Result<(), AssetError> {
    let pose = sim.body_pose(body)?;
    let bottom_to_origin = pose.point.z - sim.body_aabb(body)?.lower.z;
    let top = sim.body_aabb(floor)?.upper.z;
    let point = DVec3::new(pose.point.x, pose.point.y, top + bottom_to_origin + FLOOR_GAP);
    sim.set_body_pose(body, &Pose::new(point, pose.quat))?;
    Ok(())
}

/// Swing the lids of suitcases and boxes open so their interior is usable.
fn open_container<S: Simulation + ?Sized>(
    sim: &mut S,
    body: BodyId,
    category: &str,
    model_id: &str,
) -> Result<(), AssetError> {
    const OPEN: f64 = 1.57;
    for joint in sim.joints(body)? {
        if joint.kind != JointKind::Revolute {
            continue;
        }
        let position = match (category, model_id) {
            ("Suitcase", _) => joint.lower_limit + OPEN,
            ("Box", "100426") => 1.46,
            ("Box", "100154") => 0.8,
            _ => OPEN,
        };
        tracing::debug!("opening joint {} of {body} to {position}", joint.name);
        sim.set_joint_position(body, joint.index, position)?;
    }
    Ok(())
}

