//! Deterministic in-process engine used by tests and the demo.
//!
//! Bodies are made of oriented boxes. Collision is a separating-axis test
//! between boxes, contacts are reported per overlapping link pair, and joints
//! are either prismatic, revolute or fixed.

mod gripper;
mod obb;
mod world;

pub use gripper::FloatingGripper;
pub use obb::Obb;
pub use world::{MockJoint, MockLink, MockModel, MockShape, MockSim};
