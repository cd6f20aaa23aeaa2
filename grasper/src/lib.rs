//! # Grasper
//!
//! Command line front end for the object asset and grasp search crates.
//!
//! ## The Crates
//!
//! -   **[`geometry`]:** poses, Euler angles and axis-aligned boxes.
//! -   **[`sim`]:** the [`sim::Simulation`] and [`sim::Gripper`] traits every
//!     engine adapter implements, plus an in-process mock world.
//! -   **[`assets`]:** the category catalog, model lookup on disk, the scale
//!     normalizer and the asset loader.
//! -   **[`grasp`]:** box fitting, candidate generation, validation and the
//!     per-robot grasp database.
//!
//! The binary's subcommands live in [`app`].

pub mod app;

pub use assets;
pub use geometry;
pub use grasp;
pub use sim;
