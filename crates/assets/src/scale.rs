//! # Scale Normalizer
//!
//! Picks a uniform scale factor that brings a model's natural extent inside
//! its category's size constraints.
//!
//! Each constraint `[min, max]` on an axis of extent `e` admits scales in
//! `[min / e, max / e]`. The admissible interval is the intersection over all
//! constraints, and the scale is drawn uniformly from it.

use geometry::DVec3;
use serde::{Deserialize, Serialize};

use crate::catalog::SizeConstraints;
use crate::error::AssetError;

/// What to do when the constraint intervals do not intersect.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalePolicy {
    /// Fail with [`AssetError::UnsatisfiableConstraints`].
    #[default]
    Reject,
    /// Use the midpoint between the conflicting bounds.
    Midpoint,
}

/// Intersected admissible scale interval, `None` when no constraint applies.
/// The returned interval may be inverted (`lower > upper`).
///
/// # Errors
///
/// Returns [`AssetError::DegenerateExtent`] if a constrained axis has no
/// positive extent.
pub fn scale_interval(
    constraints: &SizeConstraints,
    extent: DVec3,
) -> Result<Option<(f64, f64)>, AssetError> {
    let extent = extent.to_array();
    let ranges = constraints.axis_ranges(extent);
    if ranges.is_empty() {
        return Ok(None);
    }

    let mut lower = f64::NEG_INFINITY;
    let mut upper = f64::INFINITY;
    for (axis, [min, max]) in ranges {
        let e = extent[axis];
        if !(e.is_finite() && e > 0.0) {
            return Err(AssetError::DegenerateExtent { axis, value: e });
        }
        lower = lower.max(min / e);
        upper = upper.min(max / e);
    }
    Ok(Some((lower, upper)))
}

/// Scale for a model of natural extent `extent` in `category`.
///
/// Returns 1 when the category has no constraints.
///
/// # Errors
///
/// Returns [`AssetError::UnsatisfiableConstraints`] for an empty interval
/// under [`ScalePolicy::Reject`], and [`AssetError::DegenerateExtent`] for
/// zero-sized constrained axes.
pub fn compute_scale(
    category: &str,
    constraints: Option<&SizeConstraints>,
    extent: DVec3,
    policy: ScalePolicy,
    rng: &mut fastrand::Rng,
) -> Result<f64, AssetError> {
    let Some(constraints) = constraints else {
        return Ok(1.0);
    };
    let Some((lower, upper)) = scale_interval(constraints, extent)? else {
        return Ok(1.0);
    };

    if lower > upper {
        return match policy {
            ScalePolicy::Reject => Err(AssetError::UnsatisfiableConstraints {
                category: category.to_string(),
                lower,
                upper,
            }),
            ScalePolicy::Midpoint => {
                let scale = (lower + upper) / 2.0;
                tracing::warn!(
                    "size constraints of {category} conflict ([{lower}, {upper}]), using {scale}"
                );
                Ok(scale)
            }
        };
    }

    Ok(lower + rng.f64() * (upper - lower))
}
