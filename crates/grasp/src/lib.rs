#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! # Grasp Search
//!
//! Finds gripper poses that pick up an object in a simulated scene:
//!
//! -   [`fit_box`] fits an axis-aligned box to the object's collision
//!     geometry.
//! -   [`generate_candidates`] places approach poses around the box faces
//!     from a fixed table of orientations per face.
//! -   [`GraspValidator`] accepts a candidate only if it is reachable, the
//!     open gripper is collision free and the closed gripper holds the
//!     object.
//! -   [`GraspDb`] persists accepted grasps per robot type, keyed by object
//!     instance name and scale.
//! -   [`GraspPlanner`] runs the whole search with a database read-through.

pub mod candidates;
pub mod config;
pub mod db;
pub mod error;
pub mod fit;
pub mod search;
pub mod validate;

pub use candidates::{face_points, generate_candidates, spans_longest, Candidate, Face, FaceDirection};
pub use config::GraspConfig;
pub use db::{scale_key, GraspDb, GraspEntry, StoredGrasp};
pub use error::GraspError;
pub use fit::{fit_box, model_pose, FittedBox};
pub use search::{GraspPlanner, GraspRequest, GraspSearch};
pub use validate::{GraspValidator, Outcome, Rejection};
