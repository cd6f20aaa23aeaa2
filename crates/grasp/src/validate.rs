//! # Grasp Validator
//!
//! Decides whether a candidate grasp works in the current scene:
//!
//! 1.  the grasp composed with the object's pose must be reachable by
//!     inverse kinematics;
//! 2.  the open gripper at that configuration must not touch anything;
//! 3.  closing the gripper must make contact with the object;
//! 4.  the closed fingers must not have shut past the empty threshold.
//!
//! Validation moves the gripper and its fingers, so the simulation and
//! gripper are borrowed mutably for the whole call.

use std::fmt;

use geometry::{DVec3, Pose};
use sim::{BodyId, Gripper, Simulation};

use crate::config::GraspConfig;
use crate::error::GraspError;

/// Why a candidate was turned down.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rejection {
    /// No inverse kinematics solution.
    Unreachable,
    /// The open gripper collides at the grasp configuration.
    OpenCollision,
    /// The closed gripper does not touch the object.
    NoContact,
    /// The gripper closed (almost) completely.
    ClosedEmpty,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Unreachable => "unreachable",
            Self::OpenCollision => "open gripper collides",
            Self::NoContact => "no contact with object",
            Self::ClosedEmpty => "gripper closed on nothing",
        };
        f.write_str(reason)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Outcome {
    /// The grasp that was used, relative to the object.
    Accepted(Pose),
    Rejected(Rejection),
}

impl Outcome {
    #[must_use]
    pub fn accepted(self) -> Option<Pose> {
        match self {
            Self::Accepted(pose) => Some(pose),
            Self::Rejected(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraspValidator {
    pub closed_gripper_threshold: f64,
    pub length_variants: Vec<f64>,
}

impl Default for GraspValidator {
    fn default() -> Self {
        Self::from_config(&GraspConfig::default())
    }
}

impl GraspValidator {
    #[must_use]
    pub fn from_config(config: &GraspConfig) -> Self {
        Self {
            closed_gripper_threshold: config.closed_gripper_threshold,
            length_variants: config.length_variants.clone(),
        }
    }

    /// Try `grasp` on `body`, once per length variant, and return the first
    /// accepted variant or the last rejection.
    ///
    /// # Errors
    ///
    /// Propagates engine failures. Failing checks are not errors.
    pub fn validate<S, G>(
        &self,
        sim: &mut S,
        gripper: &mut G,
        body: BodyId,
        grasp: &Pose,
    ) -> Result<Outcome, GraspError>
    where
        S: Simulation + ?Sized,
        G: Gripper<S> + ?Sized,
    {
        let body_pose = sim.body_pose(body)?;
        let mut outcome = Outcome::Rejected(Rejection::Unreachable);
        for &dz in &self.length_variants {
            let candidate = pulled_in(grasp, dz);
            outcome = self.check(sim, gripper, body, &body_pose, &candidate)?;
            if let Outcome::Accepted(_) = outcome {
                break;
            }
        }
        Ok(outcome)
    }

    fn check<S, G>(
        &self,
        sim: &mut S,
        gripper: &mut G,
        body: BodyId,
        body_pose: &Pose,
        grasp: &Pose,
    ) -> Result<Outcome, GraspError>
    where
        S: Simulation + ?Sized,
        G: Gripper<S> + ?Sized,
    {
        let target = body_pose.multiply(grasp);
        gripper.open_gripper(sim)?;

        let Some(conf) = gripper.inverse_kinematics(sim, &target) else {
            return Ok(Outcome::Rejected(Rejection::Unreachable));
        };
        if gripper.is_colliding(sim, &conf)? {
            return Ok(Outcome::Rejected(Rejection::OpenCollision));
        }

        gripper.close_gripper(sim)?;
        let robot = gripper.body();
        if !sim.contacts(robot)?.iter().any(|c| c.body_b == body) {
            return Ok(Outcome::Rejected(Rejection::NoContact));
        }
        let aperture: f64 = sim
            .joint_positions(robot, gripper.gripper_joints())?
            .iter()
            .sum();
        if aperture.abs() < self.closed_gripper_threshold {
            return Ok(Outcome::Rejected(Rejection::ClosedEmpty));
        }
        Ok(Outcome::Accepted(*grasp))
    }
}

/// Move every non-zero position component of `grasp` toward the origin by
/// `dz`.
fn pulled_in(grasp: &Pose, dz: f64) -> Pose {
    let p = grasp.point;
    let shift = |v: f64| if v.abs() > 0.0 { v - v.signum() * dz } else { v };
    Pose::new(DVec3::new(shift(p.x), shift(p.y), shift(p.z)), grasp.quat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim::mock::{FloatingGripper, MockSim};

    fn scene() -> (MockSim, FloatingGripper, BodyId) {
        let mut sim = MockSim::new();
        let cube = sim.add_box("cube", DVec3::new(0.5, 0.0, 0.5), DVec3::splat(0.025));
        let gripper = FloatingGripper::spawn(&mut sim, DVec3::new(0.0, 0.0, 1.0), 2.0).unwrap();
        (sim, gripper, cube)
    }

    fn from_below(offset: f64) -> Pose {
        Pose::from_point(DVec3::new(0.0, 0.0, -offset))
    }

    #[test]
    fn straddling_grasp_is_accepted() {
        let (mut sim, mut gripper, cube) = scene();
        let outcome = GraspValidator::default()
            .validate(&mut sim, &mut gripper, cube, &from_below(0.045))
            .unwrap();
        assert_eq!(outcome, Outcome::Accepted(from_below(0.045)));
    }

    #[test]
    fn unreachable_grasp() {
        let mut sim = MockSim::new();
        let cube = sim.add_box("cube", DVec3::new(5.0, 0.0, 0.0), DVec3::splat(0.025));
        let mut gripper = FloatingGripper::spawn(&mut sim, DVec3::ZERO, 1.0).unwrap();
        let outcome = GraspValidator::default()
            .validate(&mut sim, &mut gripper, cube, &from_below(0.045))
            .unwrap();
        assert_eq!(outcome, Outcome::Rejected(Rejection::Unreachable));
    }

    #[test]
    fn palm_inside_object_collides() {
        let (mut sim, mut gripper, cube) = scene();
        let outcome = GraspValidator::default()
            .validate(&mut sim, &mut gripper, cube, &from_below(0.01))
            .unwrap();
        assert_eq!(outcome, Outcome::Rejected(Rejection::OpenCollision));
    }

    #[test]
    fn grasp_beside_object_has_no_contact() {
        let (mut sim, mut gripper, cube) = scene();
        let beside = Pose::from_point(DVec3::new(0.2, 0.0, -0.045));
        let outcome = GraspValidator::default()
            .validate(&mut sim, &mut gripper, cube, &beside)
            .unwrap();
        assert_eq!(outcome, Outcome::Rejected(Rejection::NoContact));
    }

    #[test]
    fn threshold_decides_empty_gripper() {
        let (mut sim, mut gripper, cube) = scene();
        let validator = GraspValidator {
            closed_gripper_threshold: 0.1,
            ..GraspValidator::default()
        };
        let outcome = validator
            .validate(&mut sim, &mut gripper, cube, &from_below(0.045))
            .unwrap();
        assert_eq!(outcome, Outcome::Rejected(Rejection::ClosedEmpty));
    }

    #[test]
    fn length_variants_pull_toward_object() {
        let (mut sim, mut gripper, cube) = scene();
        let validator = GraspValidator {
            length_variants: vec![0.0, 0.04],
            ..GraspValidator::default()
        };
        // Too far out for the fingers to reach; the second variant is used.
        let far = from_below(0.085);
        let outcome = validator.validate(&mut sim, &mut gripper, cube, &far).unwrap();
        let used = outcome.accepted().unwrap();
        assert!((used.point.z + 0.045).abs() < 1e-12);
    }

    #[test]
    fn pulled_in_keeps_zero_components() {
        let p = pulled_in(&Pose::from_point(DVec3::new(0.1, 0.0, -0.2)), 0.05);
        assert!((p.point - DVec3::new(0.05, 0.0, -0.15)).length() < 1e-12);
    }
}
