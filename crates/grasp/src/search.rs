//! # Grasp Search
//!
//! Looks grasps up in the robot's database and, on a miss, fits a box to the
//! object, generates candidates, validates each one and stores the accepted
//! grasps for next time.

use std::collections::BTreeMap;

use assets::{Catalog, CategoryGroup, RotationCache};
use geometry::{DVec3, Pose};
use sim::{BodyId, Gripper, LinkId, Simulation};

use crate::candidates::generate_candidates;
use crate::config::GraspConfig;
use crate::db::GraspDb;
use crate::error::GraspError;
use crate::fit::fit_box;
use crate::validate::{GraspValidator, Outcome, Rejection};

/// What to grasp and how.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraspRequest {
    /// Database key. Without it grasps are computed but not stored.
    pub instance_name: Option<String>,
    /// Grasp one link (a handle) instead of the whole body.
    pub link: Option<LinkId>,
    /// Custom approach directions.
    pub faces: Option<Vec<DVec3>>,
    /// Overrides the configured handle filter.
    pub handle_filter: Option<bool>,
}

impl GraspRequest {
    #[must_use]
    pub fn new(instance_name: Option<&str>) -> Self {
        Self {
            instance_name: instance_name.map(str::to_string),
            ..Self::default()
        }
    }

    /// Request with the handle filter turned on for side-grasp categories.
    #[must_use]
    pub fn for_category(catalog: &Catalog, category: &str, instance_name: Option<&str>) -> Self {
        let mut request = Self::new(instance_name);
        if catalog.in_group(category, CategoryGroup::SideGrasp) {
            request.handle_filter = Some(true);
        }
        request
    }

    #[must_use]
    pub fn on_link(mut self, link: LinkId) -> Self {
        self.link = Some(link);
        self
    }

    #[must_use]
    pub fn with_faces(mut self, faces: Vec<DVec3>) -> Self {
        self.faces = Some(faces);
        self
    }
}

/// Result of a search.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraspSearch {
    /// Grasps relative to the object's body frame.
    pub grasps: Vec<Pose>,
    /// Served from the database without validating anything.
    pub cached: bool,
    pub scale: Option<f64>,
    /// Number of candidates validated.
    pub candidates: usize,
    pub rejections: BTreeMap<Rejection, usize>,
    /// Fitted box edges in the world frame, empty for cached results.
    pub debug_edges: Vec<(DVec3, DVec3)>,
}

pub struct GraspPlanner {
    config: GraspConfig,
    validator: GraspValidator,
    rotations: RotationCache,
}

impl GraspPlanner {
    #[must_use]
    pub fn new(config: GraspConfig) -> Self {
        Self {
            validator: GraspValidator::from_config(&config),
            config,
            rotations: RotationCache::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &GraspConfig {
        &self.config
    }

    /// Grasps for `body` with `gripper`, from the database when possible.
    ///
    /// # Errors
    ///
    /// Fails when the body has no collision geometry or the engine or the
    /// database file fails.
    pub fn get_grasp_poses<S, G>(
        &mut self,
        sim: &mut S,
        gripper: &mut G,
        body: BodyId,
        request: &GraspRequest,
    ) -> Result<GraspSearch, GraspError>
    where
        S: Simulation + ?Sized,
        G: Gripper<S> + ?Sized,
    {
        let scale = sim.loaded_scale(body);
        let db_path = GraspDb::path_for(&self.config.grasps_dir, gripper.type_name());
        let mut db = GraspDb::open_or_create(db_path)?.with_round_digits(self.config.round_digits);

        if let Some(instance) = &request.instance_name {
            if let Some(grasps) = db.lookup(instance, scale) {
                return Ok(GraspSearch {
                    grasps,
                    cached: true,
                    scale,
                    ..GraspSearch::default()
                });
            }
        }

        let fitted = fit_box(&*sim, &mut self.rotations, body, request.link)?;
        let candidates = generate_candidates(
            &fitted.aabb,
            self.config.grasp_length,
            request.handle_filter.unwrap_or(self.config.handle_filter),
            request.faces.as_deref(),
        );

        let mut grasps = Vec::new();
        let mut rejections: BTreeMap<Rejection, usize> = BTreeMap::new();
        for candidate in &candidates {
            match self.validator.validate(sim, gripper, body, &candidate.pose)? {
                Outcome::Accepted(grasp) => grasps.push(grasp),
                Outcome::Rejected(reason) => {
                    tracing::debug!("{:?} candidate rejected: {reason}", candidate.face);
                    *rejections.entry(reason).or_default() += 1;
                }
            }
        }

        let label = request.instance_name.as_deref().unwrap_or("<unnamed>");
        tracing::info!(
            "{label}: {} of {} candidates accepted for {body} ({} rejected)",
            grasps.len(),
            candidates.len(),
            candidates.len() - grasps.len()
        );
        if grasps.is_empty() {
            tracing::warn!("no grasps found for {label}");
        }

        match &request.instance_name {
            Some(instance) => {
                let name = sim.body_name(body);
                db.upsert(instance, name.as_deref(), &grasps, scale)?;
            }
            None => tracing::warn!("body {body} has no instance name, grasps are not cached"),
        }

        Ok(GraspSearch {
            grasps,
            cached: false,
            scale,
            candidates: candidates.len(),
            rejections,
            debug_edges: fitted.debug_edges,
        })
    }
}
