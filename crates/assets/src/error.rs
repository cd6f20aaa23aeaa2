use std::path::PathBuf;

use sim::SimError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("unknown category {0}")]
    UnknownCategory(String),
    #[error("no model description file in {0}")]
    NoModelFile(PathBuf),
    #[error(
        "size constraints for {category} cannot be met: scale interval [{lower}, {upper}] is empty"
    )]
    UnsatisfiableConstraints {
        category: String,
        lower: f64,
        upper: f64,
    },
    #[error("natural extent along axis {axis} is {value}, no scale can be derived")]
    DegenerateExtent { axis: usize, value: f64 },
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed model description: {0}")]
    Urdf(String),
    #[error(transparent)]
    Sim(#[from] SimError),
}

impl AssetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
