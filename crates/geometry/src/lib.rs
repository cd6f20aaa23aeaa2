#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! # Grasp Geometry
//!
//! Small, dependency-light geometry layer shared by the simulation contract,
//! the asset catalog and the grasp search.
//!
//! ## Key Components
//!
//! -   **Poses:** [`Pose`] couples a position with a unit quaternion and
//!     supports composition, inversion and point transforms. [`Euler`] holds
//!     roll/pitch/yaw triples in the fixed-axis XYZ convention used by the
//!     grasp database.
//! -   **Bounding boxes:** [`Aabb`] is an axis-aligned box with fitting from
//!     point clouds, unions, and edge enumeration.
//! -   **Rounding:** [`round_to`] and [`Pose::to_rounded_flat`] produce the
//!     compact six-number encoding stored on disk.
//!
//! All math is done in `f64` on top of `glam`'s double precision types.

pub mod aabb;
pub mod pose;
pub mod round;

pub use aabb::Aabb;
pub use glam::{DMat3, DMat4, DQuat, DVec3};
pub use pose::{apply_affine, Euler, Pose};
pub use round::{approx_eq_slice, round_to};
