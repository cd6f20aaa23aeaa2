//! # Grasper Application Logic
//!
//! Subcommands of the `grasper` binary:
//!
//! -   `catalog` lists categories with their size constraints and group.
//! -   `models` resolves a category's model ids and description files under
//!     the configured models directory.
//! -   `scale` samples a scale factor for an object of a given extent.
//! -   `candidates` prints the grasp candidates around a box.
//! -   `lookup` reads grasps for an object instance from a robot's database.
//! -   `demo` runs a full grasp search on a cube in the in-process mock world.
//!
//! Every subcommand reads the same [`GraspConfig`], from `--config` when it
//! is given and from the defaults otherwise.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use assets::{compute_scale, Catalog, ExtentCache, ModelLibrary, ScalePolicy};
use clap::{Parser, Subcommand};
use geometry::{Aabb, DVec3};
use grasp::{generate_candidates, GraspConfig, GraspDb, GraspPlanner, GraspRequest, GraspSearch};
use sim::mock::{FloatingGripper, MockSim};
use sim::Simulation;
use tracing::Level;

#[derive(Debug, Parser)]
#[command(name = "grasper", version, about = "Object loading and grasp search")]
pub struct Cli {
    /// JSON file with grasp search settings.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log debug output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    #[must_use]
    pub fn log_level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        }
    }

    /// # Errors
    ///
    /// Fails if the config file cannot be read or parsed.
    pub fn grasp_config(&self) -> Result<GraspConfig> {
        match &self.config {
            Some(path) => GraspConfig::from_file(path)
                .with_context(|| format!("loading config {}", path.display())),
            None => Ok(GraspConfig::default()),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List object categories.
    Catalog {
        /// Only show this category.
        #[arg(long)]
        category: Option<String>,
    },
    /// List the models of a category on disk.
    Models { category: String },
    /// Sample a scale factor for an object of the given natural extent.
    Scale {
        category: String,
        dx: f64,
        dy: f64,
        dz: f64,
        #[arg(long)]
        seed: Option<u64>,
        /// Use the midpoint of conflicting constraints instead of failing.
        #[arg(long)]
        midpoint: bool,
    },
    /// Print grasp candidates around a box centered at the origin.
    Candidates {
        dx: f64,
        dy: f64,
        dz: f64,
        #[arg(long)]
        grasp_length: Option<f64>,
        #[arg(long)]
        handle_filter: bool,
    },
    /// Print stored grasps of an object instance.
    Lookup {
        robot_type: String,
        instance: String,
        #[arg(long)]
        scale: Option<f64>,
    },
    /// Search grasps for a cube resting on a floor in the mock world.
    Demo {
        /// Cube edge length in meters.
        #[arg(long, default_value_t = 0.05)]
        size: f64,
    },
}

/// Run one subcommand.
///
/// # Errors
///
/// Returns any error from loading the configuration or from the subcommand.
pub fn run(cli: &Cli) -> Result<()> {
    let config = cli.grasp_config()?;
    match &cli.command {
        Command::Catalog { category } => {
            let catalog = Catalog::builtin()?;
            for line in catalog_lines(&catalog, category.as_deref())? {
                println!("{line}");
            }
        }
        Command::Models { category } => {
            let mut library = ModelLibrary::new(&config.models_dir, Catalog::builtin()?);
            let ids = library.model_ids(category)?.to_vec();
            let extents = ExtentCache::open(&config.extents_file);
            for id in ids {
                let path = library.model_path(category, &id)?;
                let key = library.relative_name(&path);
                match extents.get(&key) {
                    Some(e) => println!("{id}\t{}\t[{:.4}, {:.4}, {:.4}]", path.display(), e.x, e.y, e.z),
                    None => println!("{id}\t{}", path.display()),
                }
            }
        }
        Command::Scale {
            category,
            dx,
            dy,
            dz,
            seed,
            midpoint,
        } => {
            let policy = if *midpoint {
                ScalePolicy::Midpoint
            } else {
                config.scale_policy
            };
            let mut rng = seed.map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);
            let catalog = Catalog::builtin()?;
            let extent = DVec3::new(*dx, *dy, *dz);
            let scale = compute_scale(category, catalog.constraints(category), extent, policy, &mut rng)?;
            println!("{scale:.6}");
        }
        Command::Candidates {
            dx,
            dy,
            dz,
            grasp_length,
            handle_filter,
        } => {
            let aabb = Aabb::from_extent_center(DVec3::new(*dx, *dy, *dz), DVec3::ZERO);
            let length = grasp_length.unwrap_or(config.grasp_length);
            let filter = *handle_filter || config.handle_filter;
            for line in candidate_lines(&aabb, length, filter, config.round_digits)? {
                println!("{line}");
            }
        }
        Command::Lookup {
            robot_type,
            instance,
            scale,
        } => {
            let path = GraspDb::path_for(&config.grasps_dir, robot_type);
            if !path.exists() {
                bail!("no grasp database at {}", path.display());
            }
            let db = GraspDb::open(&path);
            let Some(grasps) = db.lookup(instance, *scale) else {
                bail!("no grasps for {instance} in {}", path.display());
            };
            for pose in grasps {
                println!("{}", serde_json::to_string(&pose.to_rounded_flat(config.round_digits))?);
            }
        }
        Command::Demo { size } => {
            let config_digits = config.round_digits;
            let search = demo(config, *size)?;
            println!(
                "{} grasps from {} candidates (cached: {})",
                search.grasps.len(),
                search.candidates,
                search.cached
            );
            for pose in &search.grasps {
                println!("{}", serde_json::to_string(&pose.to_rounded_flat(config_digits))?);
            }
            for (reason, count) in &search.rejections {
                println!("  {reason}: {count}");
            }
        }
    }
    Ok(())
}

/// One line per category: name, group, model count and constraints.
///
/// # Errors
///
/// Fails if `only` names a category the catalog does not have.
pub fn catalog_lines(catalog: &Catalog, only: Option<&str>) -> Result<Vec<String>> {
    if let Some(name) = only {
        if catalog.category(name).is_none() {
            bail!("unknown category {name}");
        }
    }
    let mut lines = Vec::new();
    for (name, entry) in &catalog.categories {
        if only.is_some_and(|o| o != name) {
            continue;
        }
        let group = catalog
            .group_of(name)
            .map_or_else(|| "-".to_string(), |g| format!("{g:?}"));
        let constraints = serde_json::to_string(&entry.constraints)?;
        lines.push(format!("{name}\t{group}\t{}\t{constraints}", entry.models.len()));
    }
    Ok(lines)
}

/// One line per candidate around `aabb`: the face and the rounded
/// `[x, y, z, roll, pitch, yaw]` pose.
///
/// # Errors
///
/// Only fails if a pose cannot be serialized.
pub fn candidate_lines(
    aabb: &Aabb,
    grasp_length: f64,
    handle_filter: bool,
    digits: u32,
) -> Result<Vec<String>> {
    generate_candidates(aabb, grasp_length, handle_filter, None)
        .iter()
        .map(|candidate| {
            let flat = candidate.pose.to_rounded_flat(digits);
            Ok(format!("{:?}\t{}", candidate.face, serde_json::to_string(&flat)?))
        })
        .collect()
}

/// Search grasps for a cube of edge `size` resting on a floor, with the
/// mock floating gripper.
///
/// # Errors
///
/// Returns any error of the grasp search.
pub fn demo(config: GraspConfig, size: f64) -> Result<GraspSearch> {
    if size <= 0.0 {
        bail!("cube size must be positive, got {size}");
    }
    let mut sim = MockSim::new();
    sim.add_box("floor", DVec3::new(0.0, 0.0, -0.05), DVec3::new(1.0, 1.0, 0.05));
    let half = size / 2.0;
    let cube = sim.add_box("demo_cube", DVec3::new(0.5, 0.0, half + 0.001), DVec3::splat(half));
    let mut gripper = FloatingGripper::spawn(&mut sim, DVec3::new(0.0, 0.0, 1.0), 2.0)?;
    tracing::info!(
        "mock world with {} bodies, cube {} at {:?}",
        sim.num_bodies(),
        cube,
        sim.body_pose(cube)?.point
    );

    let mut planner = GraspPlanner::new(config);
    let request = GraspRequest::new(Some("demo_cube"));
    Ok(planner.get_grasp_poses(&mut sim, &mut gripper, cube, &request)?)
}
