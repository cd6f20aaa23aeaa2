//! # Model Description Probing
//!
//! Two small reads of an articulated-body description: the declared instance
//! name that keys the grasp database, and the `rpy` of the joint attaching the
//! first link to the `base` link.

use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::AssetError;

const NAME_SCAN_LINES: usize = 50;
const ROBOT_NAME_TAG: &str = "<robot name=\"";

/// Declared name in the first lines of `text`; `None` unless exactly one
/// `<robot name="...">` declaration is found.
#[must_use]
pub fn parse_instance_name(text: &str) -> Option<String> {
    let mut names = text.lines().take(NAME_SCAN_LINES).filter_map(|line| {
        let start = line.find(ROBOT_NAME_TAG)? + ROBOT_NAME_TAG.len();
        let rest = &line[start..];
        rest.find('"').map(|end| rest[..end].to_string())
    });
    match (names.next(), names.next()) {
        (Some(name), None) => Some(name),
        _ => None,
    }
}

/// Instance name of the description at `path`, `None` when unreadable.
#[must_use]
pub fn instance_name(path: &Path) -> Option<String> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            tracing::debug!("cannot read {}: {e}", path.display());
            return None;
        }
    };
    parse_instance_name(&text)
}

const MESH_SUBDIRS: [&str; 3] = ["textured_objs", "base_objs", "vhacd"];
const DESCRIPTION_FILE: &str = "mobility.urdf";

/// Description file of the model a collision mesh belongs to: the mesh
/// directory with mesh sub-folders stripped, joined with `mobility.urdf`.
#[must_use]
pub fn description_from_mesh(mesh_file: &Path) -> Option<std::path::PathBuf> {
    let mut dir = mesh_file.parent()?;
    while dir
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| MESH_SUBDIRS.contains(&n))
    {
        dir = dir.parent()?;
    }
    Some(dir.join(DESCRIPTION_FILE))
}

fn attribute(e: &BytesStart, name: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name.as_bytes())
        .and_then(|a| String::from_utf8(a.value.to_vec()).ok())
}

fn parse_triple(s: &str) -> Result<[f64; 3], AssetError> {
    let parts = s
        .split_whitespace()
        .map(str::parse::<f64>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| AssetError::Urdf(format!("invalid vector: {s}")))?;
    <[f64; 3]>::try_from(parts)
        .map_err(|p| AssetError::Urdf(format!("expected 3 values, got {}: {s}", p.len())))
}

#[derive(Default)]
struct JointOrigin {
    parent: Option<String>,
    rpy: [f64; 3],
}

/// `rpy` of the joint whose parent link is `base`, or of the only joint.
///
/// # Errors
///
/// Returns [`AssetError::Urdf`] for malformed XML or `rpy` values.
pub fn base_joint_rpy(xml: &str) -> Result<Option<[f64; 3]>, AssetError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut joints: Vec<JointOrigin> = Vec::new();
    let mut current: Option<JointOrigin> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"joint" => {
                current = Some(JointOrigin::default());
            }
            Ok(Event::Start(ref e) | Event::Empty(ref e)) => {
                if let Some(joint) = current.as_mut() {
                    match e.name().as_ref() {
                        b"parent" => joint.parent = attribute(e, "link"),
                        b"origin" => {
                            if let Some(rpy) = attribute(e, "rpy") {
                                joint.rpy = parse_triple(&rpy)?;
                            }
                        }
                        _ => {}
                    }
                }
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"joint" => {
                joints.extend(current.take());
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(AssetError::Urdf(e.to_string())),
        }
        buf.clear();
    }

    if joints.len() == 1 {
        return Ok(joints.pop().map(|j| j.rpy));
    }
    Ok(joints
        .into_iter()
        .find(|j| j.parent.as_deref() == Some("base"))
        .map(|j| j.rpy))
}
