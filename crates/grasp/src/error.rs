use std::path::PathBuf;

use assets::AssetError;
use sim::{BodyId, LinkId, SimError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraspError {
    #[error("body {body} has no collidable geometry on {link:?}")]
    NoCollisionGeometry { body: BodyId, link: LinkId },
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Sim(#[from] SimError),
    #[error(transparent)]
    Asset(#[from] AssetError),
}

impl GraspError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
