use std::path::{Path, PathBuf};

use anyhow::Result;
use assets::{instance_name, Catalog};
use geometry::{DVec3, Pose};
use grasp::{GraspConfig, GraspDb, GraspError, GraspPlanner, GraspRequest, Rejection};
use sim::mock::{FloatingGripper, MockJoint, MockLink, MockModel, MockShape, MockSim};
use sim::{BodyId, LinkId, LoadOptions, Simulation};

/// Writes a minimal description and registers a 5 cm mesh cube under it.
fn cube_model(root: &Path, sim: &mut MockSim) -> Result<PathBuf> {
    let dir = root.join("Cube").join("1");
    std::fs::create_dir_all(dir.join("textured_objs"))?;
    let path = dir.join("mobility.urdf");
    std::fs::write(
        &path,
        "<?xml version=\"1.0\"?>\n<robot name=\"cube_1\">\n  <link name=\"base\"/>\n</robot>\n",
    )?;
    let mut model = MockModel::mesh_box(DVec3::splat(0.025));
    model.mesh_file = Some(dir.join("textured_objs").join("original-1.obj"));
    sim.register_model(&path, model);
    Ok(path)
}

struct Scene {
    sim: MockSim,
    gripper: FloatingGripper,
    cube: BodyId,
    instance: Option<String>,
}

fn scene(root: &Path) -> Result<Scene> {
    let mut sim = MockSim::new();
    sim.add_box("floor", DVec3::new(0.0, 0.0, -0.05), DVec3::new(1.0, 1.0, 0.05));
    let path = cube_model(root, &mut sim)?;
    let options = LoadOptions {
        base_position: DVec3::new(0.5, 0.0, 0.026),
        body_name: Some("Cube_1".to_string()),
        ..LoadOptions::default()
    };
    let cube = sim.load_model(&path, &options)?;
    let gripper = FloatingGripper::spawn(&mut sim, DVec3::new(0.0, 0.0, 1.0), 2.0)?;
    Ok(Scene {
        sim,
        gripper,
        cube,
        instance: instance_name(&path),
    })
}

fn config(root: &Path) -> GraspConfig {
    GraspConfig {
        grasps_dir: root.join("grasps"),
        ..GraspConfig::default()
    }
}

#[test]
fn cube_on_floor_search_then_cache() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let Scene {
        mut sim,
        mut gripper,
        cube,
        instance,
    } = scene(dir.path())?;
    assert_eq!(instance.as_deref(), Some("cube_1"));

    let mut planner = GraspPlanner::new(config(dir.path()));
    let request = GraspRequest::new(instance.as_deref());
    let search = planner.get_grasp_poses(&mut sim, &mut gripper, cube, &request)?;

    assert!(!search.cached);
    assert_eq!(search.scale, Some(1.0));
    assert_eq!(search.candidates, 26);
    assert_eq!(search.grasps.len(), 13);
    assert_eq!(search.rejections.get(&Rejection::OpenCollision), Some(&12));
    assert_eq!(search.rejections.get(&Rejection::NoContact), Some(&1));
    assert_eq!(search.debug_edges.len(), 12);

    // Nothing approaches from under the floor.
    assert!(search.grasps.iter().all(|g| g.point.z > -0.01));
    // Every top grasp survives.
    let top = search.grasps.iter().filter(|g| g.point.z > 0.04).count();
    assert_eq!(top, 4);

    let db_path = GraspDb::path_for(&dir.path().join("grasps"), "FloatingGripper");
    let db = GraspDb::open(&db_path);
    let entry = db.get("cube_1").expect("stored entry");
    assert_eq!(entry.name, "Cube_1");
    assert_eq!(entry.scale, Some(1.0));
    assert_eq!(entry.grasps.len(), 13);

    let again = planner.get_grasp_poses(&mut sim, &mut gripper, cube, &request)?;
    assert!(again.cached);
    assert_eq!(again.candidates, 0);
    assert_eq!(again.grasps.len(), search.grasps.len());
    for (cached, fresh) in again.grasps.iter().zip(&search.grasps) {
        assert!(cached.approx_eq(fresh, 1e-4));
    }
    Ok(())
}

#[test]
fn accepted_grasps_validate_again() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let Scene {
        mut sim,
        mut gripper,
        cube,
        ..
    } = scene(dir.path())?;
    let mut planner = GraspPlanner::new(config(dir.path()));
    let search =
        planner.get_grasp_poses(&mut sim, &mut gripper, cube, &GraspRequest::new(None))?;

    let validator = grasp::GraspValidator::default();
    for g in &search.grasps {
        let outcome = validator.validate(&mut sim, &mut gripper, cube, g)?;
        assert_eq!(outcome.accepted(), Some(*g));
    }
    Ok(())
}

#[test]
fn unnamed_objects_are_not_cached() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let Scene {
        mut sim,
        mut gripper,
        cube,
        ..
    } = scene(dir.path())?;
    let mut planner = GraspPlanner::new(config(dir.path()));
    let search =
        planner.get_grasp_poses(&mut sim, &mut gripper, cube, &GraspRequest::new(None))?;
    assert!(!search.grasps.is_empty());

    let db_path = GraspDb::path_for(&dir.path().join("grasps"), "FloatingGripper");
    assert!(db_path.exists());
    assert!(GraspDb::open(&db_path).is_empty());
    Ok(())
}

#[test]
fn side_grasp_categories_use_the_handle_filter() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut sim = MockSim::new();
    let bar = sim.add_box("bar", DVec3::new(0.5, 0.0, 0.5), DVec3::new(0.1, 0.025, 0.015));
    let mut gripper = FloatingGripper::spawn(&mut sim, DVec3::new(0.0, 0.0, 1.0), 2.0)?;

    let catalog = Catalog::builtin()?;
    let request = GraspRequest::for_category(&catalog, "Eyeglasses", None);
    assert_eq!(request.handle_filter, Some(true));
    assert_eq!(GraspRequest::for_category(&catalog, "Bowl", None).handle_filter, None);

    let mut planner = GraspPlanner::new(config(dir.path()));
    let search = planner.get_grasp_poses(&mut sim, &mut gripper, bar, &request)?;
    assert_eq!(search.candidates, 16);
    Ok(())
}

#[test]
fn body_without_geometry_cannot_be_grasped() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut sim = MockSim::new();
    let ghost = sim.spawn(MockModel::default(), Pose::IDENTITY, Some("ghost".into()));
    let mut gripper = FloatingGripper::spawn(&mut sim, DVec3::ZERO, 2.0)?;

    let mut planner = GraspPlanner::new(config(dir.path()));
    let err = planner
        .get_grasp_poses(&mut sim, &mut gripper, ghost, &GraspRequest::new(Some("ghost")))
        .unwrap_err();
    assert!(matches!(err, GraspError::NoCollisionGeometry { .. }));
    Ok(())
}

#[test]
fn link_request_fits_only_that_link() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let mut sim = MockSim::new();
    let handle = MockLink {
        origin: Pose::from_point(DVec3::new(0.2, 0.0, 0.1)),
        joint: MockJoint::fixed("handle_joint"),
        shapes: vec![MockShape::mesh(DVec3::new(0.01, 0.05, 0.01))],
    };
    let model = MockModel {
        base: vec![MockShape::cuboid(DVec3::new(0.2, 0.2, 0.2))],
        links: vec![handle],
        mesh_file: None,
    };
    let drawer = sim.spawn(model, Pose::from_point(DVec3::new(0.5, 0.0, 0.3)), Some("drawer".into()));
    let mut gripper =
        FloatingGripper::spawn(&mut sim, DVec3::new(0.0, 0.0, 1.0), 2.0)?.with_type_name("Panda");

    let request = GraspRequest::new(Some("drawer::handle"))
        .on_link(LinkId::Index(0))
        .with_faces(vec![DVec3::Z]);
    let mut planner = GraspPlanner::new(config(dir.path()));
    let search = planner.get_grasp_poses(&mut sim, &mut gripper, drawer, &request)?;

    assert_eq!(search.candidates, 4);
    let handle_center = DVec3::new(0.7, 0.0, 0.4);
    for (a, b) in &search.debug_edges {
        assert!((*a - handle_center).abs().max_element() <= 0.05 + 1e-9);
        assert!((*b - handle_center).abs().max_element() <= 0.05 + 1e-9);
    }
    assert!(GraspDb::path_for(&dir.path().join("grasps"), "Panda").exists());
    Ok(())
}
