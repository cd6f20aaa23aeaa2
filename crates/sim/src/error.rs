use std::path::PathBuf;

use thiserror::Error;

use crate::types::{BodyId, LinkId};

#[derive(Error, Debug)]
pub enum SimError {
    #[error("unknown body {0}")]
    UnknownBody(BodyId),
    #[error("body {body} has no link {link:?}")]
    UnknownLink { body: BodyId, link: LinkId },
    #[error("body {body} has no joint {joint}")]
    UnknownJoint { body: BodyId, joint: usize },
    #[error("no model description at {0}")]
    UnknownModel(PathBuf),
    #[error("body {body} link {link:?} has no collision geometry")]
    NoCollisionGeometry { body: BodyId, link: LinkId },
    #[error("invalid load scale {0}")]
    InvalidScale(f64),
    #[error("configuration has {got} values, expected {expected}")]
    InvalidConfiguration { got: usize, expected: usize },
}
