#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! # Simulation Contract
//!
//! The grasp search never talks to a physics engine directly. It consumes the
//! small, synchronous query surface defined here:
//!
//! -   [`Simulation`] exposes bodies, links, collision shapes, joint state and
//!     contacts, and loads model descriptions at a given scale.
//! -   [`Gripper`] is the robot side: inverse kinematics, gripper actuation
//!     and collision checks at a configuration.
//!
//! Every call blocks and mutates shared engine state, so a simulation handle
//! and its gripper must be owned by one validation sequence at a time.
//!
//! ## Mock engine
//!
//! With the `mock` feature the crate also ships [`mock::MockSim`], a box world
//! with oriented-box overlap tests, and [`mock::FloatingGripper`], a
//! two-finger gripper without an arm. Both are deterministic and are what the
//! workspace tests and the `grasper demo` command run against.

pub mod engine;
pub mod error;
pub mod types;

#[cfg(feature = "mock")]
pub mod mock;

pub use engine::{Gripper, Simulation};
pub use error::SimError;
pub use types::{
    BodyId, CollisionShape, Contact, GeometryType, JointInfo, JointKind, LinkId, LoadOptions,
};
