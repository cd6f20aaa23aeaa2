use geometry::{DQuat, DVec3, Pose};

use super::world::{MockJoint, MockLink, MockModel, MockShape, MockSim};
use crate::engine::{Gripper, Simulation};
use crate::error::SimError;
use crate::types::{BodyId, LinkId};

const PALM_HALF_EXTENTS: DVec3 = DVec3::new(0.01, 0.05, 0.005);
const FINGER_HALF_EXTENTS: DVec3 = DVec3::new(0.008, 0.005, 0.025);
const FINGER_TRAVEL: f64 = 0.04;
const CLOSE_STEP: f64 = 0.001;
const CONF_LEN: usize = 7;

/// Two-finger parallel gripper floating in space.
///
/// The tool frame is the body frame: fingers point along +z and open along
/// ±y. Inverse kinematics succeeds for any target within `reach` of the
/// mount point, and a configuration is `[x, y, z, qx, qy, qz, qw]`.
pub struct FloatingGripper {
    body: BodyId,
    joints: [usize; 2],
    mount: DVec3,
    reach: f64,
    type_name: String,
}

impl FloatingGripper {
    /// Insert the gripper body into `sim`, parked open at `mount`.
    ///
    /// # Errors
    ///
    /// Propagates engine failures while opening the fingers.
    pub fn spawn(sim: &mut MockSim, mount: DVec3, reach: f64) -> Result<Self, SimError> {
        let finger = |name: &str, axis: DVec3| MockLink {
            origin: Pose::from_point(DVec3::new(0.0, 0.0, FINGER_HALF_EXTENTS.z)),
            joint: MockJoint::prismatic(name, axis, 0.0, FINGER_TRAVEL),
            shapes: vec![MockShape::cuboid(FINGER_HALF_EXTENTS)],
        };
        let model = MockModel {
            base: vec![MockShape::cuboid(PALM_HALF_EXTENTS)
                .at(Pose::from_point(DVec3::new(0.0, 0.0, -PALM_HALF_EXTENTS.z)))],
            links: vec![finger("finger_left", DVec3::Y), finger("finger_right", DVec3::NEG_Y)],
            mesh_file: None,
        };
        let body = sim.spawn(model, Pose::from_point(mount), Some("floating_gripper".into()));
        let mut gripper = Self {
            body,
            joints: [0, 1],
            mount,
            reach,
            type_name: "FloatingGripper".to_string(),
        };
        gripper.open_gripper(sim)?;
        Ok(gripper)
    }

    /// Override the robot type name used for database files.
    #[must_use]
    pub fn with_type_name(mut self, name: &str) -> Self {
        self.type_name = name.to_string();
        self
    }

    fn pose_from_conf(conf: &[f64]) -> Result<Pose, SimError> {
        if conf.len() != CONF_LEN {
            return Err(SimError::InvalidConfiguration {
                got: conf.len(),
                expected: CONF_LEN,
            });
        }
        Ok(Pose::new(
            DVec3::new(conf[0], conf[1], conf[2]),
            DQuat::from_xyzw(conf[3], conf[4], conf[5], conf[6]).normalize(),
        ))
    }
}

impl Gripper<MockSim> for FloatingGripper {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn body(&self) -> BodyId {
        self.body
    }

    fn gripper_joints(&self) -> &[usize] {
        &self.joints
    }

    fn inverse_kinematics(&mut self, _sim: &mut MockSim, target: &Pose) -> Option<Vec<f64>> {
        if target.point.distance(self.mount) > self.reach {
            return None;
        }
        let (p, q) = (target.point, target.quat);
        Some(vec![p.x, p.y, p.z, q.x, q.y, q.z, q.w])
    }

    fn is_colliding(&mut self, sim: &mut MockSim, conf: &[f64]) -> Result<bool, SimError> {
        let pose = Self::pose_from_conf(conf)?;
        sim.set_body_pose(self.body, &pose)?;
        for link in sim.all_links(self.body)? {
            if sim.link_touches_other(self.body, link)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn open_gripper(&mut self, sim: &mut MockSim) -> Result<(), SimError> {
        for joint in self.joints {
            sim.set_joint_position(self.body, joint, FINGER_TRAVEL)?;
        }
        Ok(())
    }

    fn close_gripper(&mut self, sim: &mut MockSim) -> Result<(), SimError> {
        for joint in self.joints {
            let link = LinkId::Index(joint);
            let mut q = sim.joint_positions(self.body, &[joint])?[0];
            while q > 0.0 && !sim.link_touches_other(self.body, link)? {
                q = (q - CLOSE_STEP).max(0.0);
                sim.set_joint_position(self.body, joint, q)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_target_has_no_solution() {
        let mut sim = MockSim::new();
        let mut gripper = FloatingGripper::spawn(&mut sim, DVec3::ZERO, 1.0).unwrap();
        let far = Pose::from_point(DVec3::new(2.0, 0.0, 0.0));
        assert!(gripper.inverse_kinematics(&mut sim, &far).is_none());
        let near = Pose::from_point(DVec3::new(0.5, 0.0, 0.0));
        assert_eq!(gripper.inverse_kinematics(&mut sim, &near).unwrap().len(), CONF_LEN);
    }

    #[test]
    fn closes_on_object_between_fingers() {
        let mut sim = MockSim::new();
        let cube = sim.add_box("cube", DVec3::new(0.0, 0.0, 0.5), DVec3::splat(0.025));
        let mut gripper = FloatingGripper::spawn(&mut sim, DVec3::ZERO, 1.0).unwrap();
        // Fingers straddle the cube, pointing along +z.
        let target = Pose::from_point(DVec3::new(0.0, 0.0, 0.5 - 0.045));
        let conf = gripper.inverse_kinematics(&mut sim, &target).unwrap();
        assert!(!gripper.is_colliding(&mut sim, &conf).unwrap());

        gripper.close_gripper(&mut sim).unwrap();
        let contacts = sim.contacts(gripper.body()).unwrap();
        assert!(contacts.iter().any(|c| c.body_b == cube));
        let aperture: f64 = sim
            .joint_positions(gripper.body(), gripper.gripper_joints())
            .unwrap()
            .iter()
            .sum();
        assert!((aperture - 0.06).abs() < 3.0 * CLOSE_STEP);
    }

    #[test]
    fn closes_fully_on_empty_space() {
        let mut sim = MockSim::new();
        let mut gripper = FloatingGripper::spawn(&mut sim, DVec3::ZERO, 1.0).unwrap();
        gripper.close_gripper(&mut sim).unwrap();
        let q = sim
            .joint_positions(gripper.body(), gripper.gripper_joints())
            .unwrap();
        assert!(q.iter().all(|v| *v == 0.0));
        assert!(sim.contacts(gripper.body()).unwrap().is_empty());
    }

    #[test]
    fn bad_configuration_is_an_error() {
        let mut sim = MockSim::new();
        let mut gripper = FloatingGripper::spawn(&mut sim, DVec3::ZERO, 1.0).unwrap();
        assert!(gripper.is_colliding(&mut sim, &[0.0; 3]).is_err());
    }
}
