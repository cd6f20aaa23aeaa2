//! # Process-Lifetime Caches
//!
//! Every cache here is populated on first use and never evicted: the key
//! spaces (models in a catalog) are small and the values are immutable for a
//! run. [`ExtentCache`] additionally persists to a JSON file so measurements
//! survive across runs.

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;
use std::f64::consts::{FRAC_PI_2, PI};
use std::hash::Hash;
use std::path::{Path, PathBuf};

use geometry::{approx_eq_slice, DVec3, Euler, Pose};

use crate::error::AssetError;
use crate::library::ModelId;
use crate::urdf::base_joint_rpy;

/// Populate-on-miss map without eviction.
#[derive(Debug)]
pub struct Memo<K, V> {
    map: HashMap<K, V>,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self {
            map: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash, V> Memo<K, V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value or compute, store and return it. A failed
    /// computation stores nothing.
    ///
    /// # Errors
    ///
    /// Propagates the error of `compute`.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        key: K,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<&V, E> {
        match self.map.entry(key) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => Ok(e.insert(compute()?)),
        }
    }

    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        self.map.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Natural (unit scale) AABB extents keyed by model path relative to the
/// models root, backed by a JSON file.
#[derive(Debug)]
pub struct ExtentCache {
    path: PathBuf,
    extents: BTreeMap<String, [f64; 3]>,
}

impl ExtentCache {
    /// Read the cache file. A missing or corrupt file yields an empty cache.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let extents = match std::fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!("ignoring corrupt extent cache {}: {e}", path.display());
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self { path, extents }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<DVec3> {
        self.extents.get(key).copied().map(DVec3::from_array)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.extents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.extents.is_empty()
    }

    /// Cached extent, or measure it, store it and rewrite the file.
    ///
    /// # Errors
    ///
    /// Propagates measurement failures and file write errors.
    pub fn get_or_measure(
        &mut self,
        key: &str,
        measure: impl FnOnce() -> Result<DVec3, AssetError>,
    ) -> Result<DVec3, AssetError> {
        if let Some(extent) = self.get(key) {
            return Ok(extent);
        }
        let extent = measure()?;
        tracing::info!("measured natural extent of {key}: {extent:?}");
        self.extents.insert(key.to_string(), extent.to_array());
        self.save()?;
        Ok(extent)
    }

    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub fn save(&self) -> Result<(), AssetError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| AssetError::io(dir, e))?;
        }
        let json = serde_json::to_string_pretty(&self.extents)?;
        std::fs::write(&self.path, json).map_err(|e| AssetError::io(&self.path, e))
    }
}

/// Frame correction for a base joint `rpy`, matching the three mounting
/// conventions found in the model dataset within 0.1 rad.
#[must_use]
pub fn rotation_for_rpy(rpy: [f64; 3]) -> Pose {
    const TOLERANCE: f64 = 0.1;
    let table = [
        ([FRAC_PI_2, FRAC_PI_2, -FRAC_PI_2], Euler::new(FRAC_PI_2, 0.0, -FRAC_PI_2)),
        ([PI, PI, -FRAC_PI_2], Euler::new(0.0, 0.0, FRAC_PI_2)),
        ([FRAC_PI_2, 0.0, -FRAC_PI_2], Euler::new(FRAC_PI_2, 0.0, -FRAC_PI_2)),
    ];
    table
        .iter()
        .find(|(pattern, _)| approx_eq_slice(pattern, &rpy, TOLERANCE))
        .map_or(Pose::IDENTITY, |(_, euler)| Pose::from_euler(*euler))
}

/// Per-model frame corrections keyed by [`ModelId`].
#[derive(Debug, Default)]
pub struct RotationCache {
    rotations: Memo<ModelId, Pose>,
}

impl RotationCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Frame correction of the model described at `description`, read once
    /// per model. Unreadable or malformed descriptions map to the identity.
    /// A file outside the `<category>/<model_id>/` layout is read every time.
    pub fn model_rotation(&mut self, description: &Path) -> Pose {
        let Some(id) = ModelId::from_description(description) else {
            return read_rotation(description);
        };
        let rotation = self
            .rotations
            .get_or_try_insert_with(id, || Ok::<_, Infallible>(read_rotation(description)));
        match rotation {
            Ok(pose) => *pose,
            Err(never) => match never {},
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rotations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rotations.is_empty()
    }
}

fn read_rotation(description: &Path) -> Pose {
    let xml = match std::fs::read_to_string(description) {
        Ok(xml) => xml,
        Err(e) => {
            tracing::debug!("no model rotation for {}: {e}", description.display());
            return Pose::IDENTITY;
        }
    };
    match base_joint_rpy(&xml) {
        Ok(Some(rpy)) => rotation_for_rpy(rpy),
        Ok(None) => Pose::IDENTITY,
        Err(e) => {
            tracing::warn!("malformed description {}: {e}", description.display());
            Pose::IDENTITY
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memo_computes_once() {
        let mut memo: Memo<&str, usize> = Memo::new();
        let mut calls = 0;
        for _ in 0..3 {
            let v = memo
                .get_or_try_insert_with("k", || {
                    calls += 1;
                    Ok::<_, ()>(7)
                })
                .unwrap();
            assert_eq!(*v, 7);
        }
        assert_eq!(calls, 1);
        assert_eq!(memo.len(), 1);
    }

    #[test]
    fn memo_does_not_store_failures() {
        let mut memo: Memo<&str, usize> = Memo::new();
        assert!(memo.get_or_try_insert_with("k", || Err("boom")).is_err());
        assert!(memo.is_empty());
    }

    #[test]
    fn known_rpy_patterns() {
        let r = rotation_for_rpy([1.57, 1.57, -1.57]);
        assert!(r.approx_eq(&Pose::from_euler(Euler::new(FRAC_PI_2, 0.0, -FRAC_PI_2)), 1e-9));
        let r = rotation_for_rpy([3.1, 3.1, -1.6]);
        assert!(r.approx_eq(&Pose::from_euler(Euler::new(0.0, 0.0, FRAC_PI_2)), 1e-9));
        let r = rotation_for_rpy([0.0, 0.0, 0.0]);
        assert!(r.approx_eq(&Pose::IDENTITY, 1e-12));
    }

    #[test]
    fn missing_description_is_identity_and_cached() {
        let mut cache = RotationCache::new();
        let pose = cache.model_rotation(Path::new("/nonexistent/Bowl/7000/mobility.urdf"));
        assert!(pose.approx_eq(&Pose::IDENTITY, 1e-12));
        assert_eq!(cache.len(), 1);

        cache.model_rotation(Path::new("mobility.urdf"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn rotation_is_read_once_per_model() {
        let dir = tempfile::tempdir().unwrap();
        let model_dir = dir.path().join("Bottle").join("3380");
        std::fs::create_dir_all(&model_dir).unwrap();
        let description = model_dir.join("mobility.urdf");
        std::fs::write(
            &description,
            r#"<robot name="bottle_3380">
  <link name="base"/>
  <joint name="joint_0" type="fixed">
    <origin rpy="1.57 1.57 -1.57" xyz="0 0 0"/>
    <parent link="base"/>
  </joint>
</robot>"#,
        )
        .unwrap();

        let mut cache = RotationCache::new();
        let expected = Pose::from_euler(Euler::new(FRAC_PI_2, 0.0, -FRAC_PI_2));
        assert!(cache.model_rotation(&description).approx_eq(&expected, 1e-9));

        std::fs::remove_file(&description).unwrap();
        assert!(cache.model_rotation(&description).approx_eq(&expected, 1e-9));
        let elsewhere = Path::new("/other/root/Bottle/3380/mobility.urdf");
        assert!(cache.model_rotation(elsewhere).approx_eq(&expected, 1e-9));
        assert_eq!(cache.len(), 1);
    }
}
