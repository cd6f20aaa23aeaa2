//! # Grasp Database
//!
//! One JSON document per robot type, mapping object instance names to the
//! grasps found for them:
//!
//! ```json
//! {
//!   "bowl_7000": {
//!     "name": "Bowl_7000",
//!     "grasps": [[0.1, 0.0, 0.0, 1.5708, 0.0, -1.5708]],
//!     "datetime": "240131_120000",
//!     "scale": 0.32,
//!     "other_scales": { "0.3": [[0.0938, 0.0, 0.0, 1.5708, 0.0, -1.5708]] }
//!   }
//! }
//! ```
//!
//! The first scale an instance is solved at is its canonical scale. Grasps
//! found later at other scales go into `other_scales` and never replace the
//! canonical list. Entries are written in creation order.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use geometry::{DQuat, DVec3, Euler, Pose};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::GraspError;

const DEFAULT_DIGITS: u32 = 4;
const SCALE_EPSILON: f64 = 1e-9;

/// A grasp as written on disk. Older files used a point with either Euler
/// angles or a quaternion; new grasps are always written flat.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredGrasp {
    /// `[x, y, z, roll, pitch, yaw]`
    Flat([f64; 6]),
    /// `[[x, y, z], [roll, pitch, yaw]]`
    PointEuler([f64; 3], [f64; 3]),
    /// `[[x, y, z], [qx, qy, qz, qw]]`
    PointQuat([f64; 3], [f64; 4]),
}

impl StoredGrasp {
    #[must_use]
    pub fn to_pose(&self) -> Pose {
        match self {
            Self::Flat(flat) => Pose::from_flat(*flat),
            Self::PointEuler(point, rpy) => {
                Pose::new(DVec3::from_array(*point), Euler::from_array(*rpy).to_quat())
            }
            Self::PointQuat(point, [x, y, z, w]) => Pose::new(
                DVec3::from_array(*point),
                DQuat::from_xyzw(*x, *y, *z, *w).normalize(),
            ),
        }
    }
}

fn default_name() -> String {
    "None".to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraspEntry {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub grasps: Vec<StoredGrasp>,
    #[serde(default)]
    pub datetime: String,
    #[serde(default)]
    pub scale: Option<f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub other_scales: BTreeMap<String, Vec<StoredGrasp>>,
    /// Fields written by other tools, kept as they are.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Key of a scale in `other_scales`: the shortest round-trip decimal form,
/// `"None"` when the scale is unknown. Exponents carry a sign and at least
/// two digits (`1e-05`, `2e+16`), the form existing databases were written
/// with.
#[must_use]
pub fn scale_key(scale: Option<f64>) -> String {
    let Some(s) = scale else {
        return "None".to_string();
    };
    let shortest = format!("{s:?}");
    match shortest.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => shortest,
    }
}

fn same_scale(a: Option<f64>, b: Option<f64>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => (a - b).abs() <= SCALE_EPSILON,
        _ => false,
    }
}

fn decode(grasps: &[StoredGrasp]) -> Option<Vec<Pose>> {
    if grasps.is_empty() {
        return None;
    }
    Some(grasps.iter().map(StoredGrasp::to_pose).collect())
}

/// Grasps of one robot type, backed by a JSON file.
#[derive(Debug)]
pub struct GraspDb {
    path: PathBuf,
    entries: BTreeMap<String, GraspEntry>,
    digits: u32,
}

impl GraspDb {
    /// `<dir>/hand_grasps_<robot_type>.json`
    #[must_use]
    pub fn path_for(dir: &Path, robot_type: &str) -> PathBuf {
        dir.join(format!("hand_grasps_{robot_type}.json"))
    }

    /// Read the store at `path`. A missing or corrupt file is an empty store.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!("grasp database {} is corrupt, starting empty: {e}", path.display());
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self {
            path,
            entries,
            digits: DEFAULT_DIGITS,
        }
    }

    /// Open the store, writing an empty document first if none exists.
    ///
    /// # Errors
    ///
    /// Fails when the directory or the empty file cannot be created.
    pub fn open_or_create(path: impl Into<PathBuf>) -> Result<Self, GraspError> {
        let db = Self::open(path);
        if !db.path.exists() {
            db.save()?;
        }
        Ok(db)
    }

    /// Decimal digits kept for new grasps.
    #[must_use]
    pub fn with_round_digits(mut self, digits: u32) -> Self {
        self.digits = digits;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn get(&self, instance_name: &str) -> Option<&GraspEntry> {
        self.entries.get(instance_name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Grasps stored for `instance_name` at `scale`.
    ///
    /// The canonical list is used for plain instance names and for any
    /// instance looked up at its canonical scale, with positions rescaled by
    /// `scale / canonical` when both are known. Instances named `a::b` (parts
    /// of an object) prefer a list stored at exactly the requested scale and
    /// fall back to the rescaled canonical list.
    #[must_use]
    pub fn lookup(&self, instance_name: &str, scale: Option<f64>) -> Option<Vec<Pose>> {
        let entry = self.entries.get(instance_name)?;
        let canonical_only =
            !instance_name.contains("::") || same_scale(scale, entry.scale);
        if !canonical_only {
            if let Some(found) = entry
                .other_scales
                .get(&scale_key(scale))
                .and_then(|list| decode(list))
            {
                tracing::info!(
                    "found {} grasps for {instance_name} at scale {}",
                    found.len(),
                    scale_key(scale)
                );
                return Some(found);
            }
        }

        let mut found = decode(&entry.grasps)?;
        if let (Some(requested), Some(canonical)) = (scale, entry.scale) {
            if !same_scale(scale, entry.scale) && canonical > 0.0 {
                let factor = requested / canonical;
                found = found.iter().map(|g| g.scaled(factor)).collect();
            }
        }
        tracing::info!(
            "found {} grasps for {instance_name} | scale = {}",
            found.len(),
            scale_key(scale)
        );
        Some(found)
    }

    /// Record grasps found for `instance_name` and rewrite the file.
    ///
    /// Returns `false` and writes nothing when `grasps` is empty.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be written.
    pub fn upsert(
        &mut self,
        instance_name: &str,
        name: Option<&str>,
        grasps: &[Pose],
        scale: Option<f64>,
    ) -> Result<bool, GraspError> {
        let now = chrono::Local::now().format("%y%m%d_%H%M%S").to_string();
        self.upsert_with_timestamp(instance_name, name, grasps, scale, &now)
    }

    /// [`GraspDb::upsert`] with an explicit creation timestamp.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be written.
    pub fn upsert_with_timestamp(
        &mut self,
        instance_name: &str,
        name: Option<&str>,
        grasps: &[Pose],
        scale: Option<f64>,
        datetime: &str,
    ) -> Result<bool, GraspError> {
        if grasps.is_empty() {
            return Ok(false);
        }
        let rounded: Vec<StoredGrasp> = grasps
            .iter()
            .map(|g| StoredGrasp::Flat(g.to_rounded_flat(self.digits)))
            .collect();

        match self.entries.get_mut(instance_name) {
            Some(entry) => {
                entry.other_scales.insert(scale_key(scale), rounded);
            }
            None => {
                self.entries.insert(
                    instance_name.to_string(),
                    GraspEntry {
                        name: name.map_or_else(default_name, str::to_string),
                        grasps: rounded,
                        datetime: datetime.to_string(),
                        scale,
                        other_scales: BTreeMap::new(),
                        extra: BTreeMap::new(),
                    },
                );
            }
        }
        self.save()?;
        tracing::info!("saved {} grasps for {instance_name}", grasps.len());
        Ok(true)
    }

    /// Write the whole store, entries ordered by creation time.
    ///
    /// # Errors
    ///
    /// Fails when the directory or file cannot be written.
    pub fn save(&self) -> Result<(), GraspError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| GraspError::io(dir, e))?;
        }
        let file = File::create(&self.path).map_err(|e| GraspError::io(&self.path, e))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &ByCreation(&self.entries))?;
        Ok(())
    }

    /// Instance names in file order.
    #[must_use]
    pub fn instance_names(&self) -> Vec<&str> {
        ByCreation(&self.entries)
            .ordered()
            .into_iter()
            .map(|(k, _)| k.as_str())
            .collect()
    }
}

struct ByCreation<'a>(&'a BTreeMap<String, GraspEntry>);

impl<'a> ByCreation<'a> {
    fn ordered(&self) -> Vec<(&'a String, &'a GraspEntry)> {
        let mut entries: Vec<_> = self.0.iter().collect();
        entries.sort_by(|(ka, a), (kb, b)| a.datetime.cmp(&b.datetime).then_with(|| ka.cmp(kb)));
        entries
    }
}

impl Serialize for ByCreation<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entries = self.ordered();
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, entry) in entries {
            map.serialize_entry(key, entry)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_keys_match_stored_form() {
        assert_eq!(scale_key(Some(1.0)), "1.0");
        assert_eq!(scale_key(Some(0.5)), "0.5");
        assert_eq!(scale_key(Some(0.3217)), "0.3217");
        assert_eq!(scale_key(None), "None");
    }

    #[test]
    fn scale_key_exponents_are_padded() {
        assert_eq!(scale_key(Some(1e-5)), "1e-05");
        assert_eq!(scale_key(Some(2.5e-7)), "2.5e-07");
        assert_eq!(scale_key(Some(3e-123)), "3e-123");
        assert_eq!(scale_key(Some(2e16)), "2e+16");
        assert_eq!(scale_key(Some(0.0001)), "0.0001");
    }

    #[test]
    fn legacy_encodings_decode_to_the_same_pose() {
        let json = r"[
            [0.1, 0.0, 0.2, 0.0, 0.0, 1.5707963267948966],
            [[0.1, 0.0, 0.2], [0.0, 0.0, 1.5707963267948966]],
            [[0.1, 0.0, 0.2], [0.0, 0.0, 0.7071067811865476, 0.7071067811865476]]
        ]";
        let grasps: Vec<StoredGrasp> = serde_json::from_str(json).unwrap();
        assert!(matches!(grasps[0], StoredGrasp::Flat(_)));
        assert!(matches!(grasps[1], StoredGrasp::PointEuler(..)));
        assert!(matches!(grasps[2], StoredGrasp::PointQuat(..)));
        let first = grasps[0].to_pose();
        for g in &grasps[1..] {
            assert!(g.to_pose().approx_eq(&first, 1e-9));
        }
    }

    #[test]
    fn unknown_fields_survive() {
        let json = r#"{ "name": "x", "grasps": [], "datetime": "1", "scale": null,
                        "grasps_length_variants": [1, 2] }"#;
        let entry: GraspEntry = serde_json::from_str(json).unwrap();
        assert!(entry.extra.contains_key("grasps_length_variants"));
        let back = serde_json::to_value(&entry).unwrap();
        assert_eq!(back["grasps_length_variants"], serde_json::json!([1, 2]));
    }
}
