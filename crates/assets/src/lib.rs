#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! # Object Assets
//!
//! Everything needed to get an articulated object model into a simulation at
//! a sensible size.
//!
//! -   [`Catalog`] is the static table of categories, their model ids and
//!     their optional size constraints, loaded from JSON.
//! -   [`ModelLibrary`] resolves `(category, model_id)` pairs to description
//!     files on disk.
//! -   [`compute_scale`] turns a model's natural extent and its category
//!     constraints into a uniform scale factor.
//! -   [`ExtentCache`] and [`RotationCache`] memoize per-model measurements.
//! -   [`AssetLoader`] ties these together and loads a model into any
//!     [`sim::Simulation`].

pub mod cache;
pub mod catalog;
pub mod error;
pub mod library;
pub mod loader;
pub mod scale;
pub mod urdf;

pub use cache::{ExtentCache, Memo, RotationCache};
pub use catalog::{Catalog, CategoryEntry, CategoryGroup, SizeConstraints};
pub use error::AssetError;
pub use library::{ModelId, ModelLibrary};
pub use loader::{AssetLoader, LoadRequest, LoadedAsset};
pub use scale::{compute_scale, scale_interval, ScalePolicy};
pub use urdf::{base_joint_rpy, description_from_mesh, instance_name, parse_instance_name};
