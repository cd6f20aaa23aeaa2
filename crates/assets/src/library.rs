//! Model files on disk, laid out as `<root>/<category>/<model_id>/*.urdf`.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::cache::Memo;
use crate::catalog::Catalog;
use crate::error::AssetError;

/// A catalogued model, `(category, model_id)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId {
    pub category: String,
    pub model_id: String,
}

impl ModelId {
    #[must_use]
    pub fn new(category: &str, model_id: &str) -> Self {
        Self {
            category: category.to_string(),
            model_id: model_id.to_string(),
        }
    }

    /// Model a description file belongs to, read from the two directories
    /// above it.
    #[must_use]
    pub fn from_description(path: &Path) -> Option<Self> {
        let model_dir = path.parent()?;
        let model_id = model_dir.file_name()?.to_str()?;
        let category = model_dir.parent()?.file_name()?.to_str()?;
        Some(Self::new(category, model_id))
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.model_id)
    }
}

pub struct ModelLibrary {
    root: PathBuf,
    catalog: Catalog,
    ids: Memo<String, Vec<String>>,
    paths: Memo<ModelId, PathBuf>,
}

impl ModelLibrary {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, catalog: Catalog) -> Self {
        Self {
            root: root.into(),
            catalog,
            ids: Memo::new(),
            paths: Memo::new(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Model ids of a category: the catalog list when the category is known,
    /// otherwise the sorted subdirectories of `<root>/<category>`.
    ///
    /// # Errors
    ///
    /// Fails when an uncatalogued category has no readable directory.
    pub fn model_ids(&mut self, category: &str) -> Result<&[String], AssetError> {
        let (root, catalog) = (&self.root, &self.catalog);
        let ids = self.ids.get_or_try_insert_with(category.to_string(), || {
            if let Some(entry) = catalog.category(category) {
                return Ok(entry.models.clone());
            }
            let dir = root.join(category);
            let entries = std::fs::read_dir(&dir).map_err(|e| AssetError::io(&dir, e))?;
            let mut ids: Vec<String> = entries
                .filter_map(Result::ok)
                .filter(|e| e.path().is_dir())
                .filter_map(|e| e.file_name().to_str().map(str::to_string))
                .collect();
            ids.sort();
            if ids.is_empty() {
                return Err(AssetError::UnknownCategory(category.to_string()));
            }
            Ok(ids)
        })?;
        Ok(ids)
    }

    /// Description file of a model: the first `*.urdf` in its directory, in
    /// name order.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::NoModelFile`] if the directory holds no
    /// description, or an i/o error if it cannot be listed.
    pub fn model_path(&mut self, category: &str, model_id: &str) -> Result<PathBuf, AssetError> {
        let root = &self.root;
        let path = self.paths.get_or_try_insert_with(
            ModelId::new(category, model_id),
            || {
                let dir = root.join(category).join(model_id);
                let entries = std::fs::read_dir(&dir).map_err(|e| AssetError::io(&dir, e))?;
                let mut files: Vec<PathBuf> = entries
                    .filter_map(Result::ok)
                    .map(|e| e.path())
                    .filter(|p| p.extension().is_some_and(|ext| ext == "urdf"))
                    .collect();
                files.sort();
                files
                    .into_iter()
                    .next()
                    .ok_or(AssetError::NoModelFile(dir))
            },
        )?;
        Ok(path.clone())
    }

    /// Path of a model file relative to the library root, used as the key of
    /// the extent cache.
    #[must_use]
    pub fn relative_name(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogued_ids_come_from_the_catalog() {
        let mut lib = ModelLibrary::new("/nonexistent", Catalog::builtin().unwrap());
        let ids = lib.model_ids("Bowl").unwrap();
        assert_eq!(ids.first().map(String::as_str), Some("7000"));
    }

    #[test]
    fn unknown_category_without_directory_fails() {
        let mut lib = ModelLibrary::new("/nonexistent", Catalog::builtin().unwrap());
        assert!(lib.model_ids("Teapot").is_err());
        assert!(lib.model_path("Bowl", "7000").is_err());
    }

    #[test]
    fn model_id_from_description_path() {
        let id = ModelId::from_description(Path::new("/models/Bowl/7000/mobility.urdf"));
        assert_eq!(id, Some(ModelId::new("Bowl", "7000")));
        assert_eq!(id.map(|id| id.to_string()).as_deref(), Some("Bowl/7000"));
        assert_eq!(ModelId::from_description(Path::new("mobility.urdf")), None);
    }

    #[test]
    fn relative_name_strips_root() {
        let lib = ModelLibrary::new("/models", Catalog::builtin().unwrap());
        assert_eq!(
            lib.relative_name(Path::new("/models/Bowl/7000/mobility.urdf")),
            "Bowl/7000/mobility.urdf"
        );
    }
}
