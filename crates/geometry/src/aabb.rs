//! Axis-aligned bounding boxes.

use glam::DVec3;

/// Box given by its componentwise lower and upper corners.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb {
    pub lower: DVec3,
    pub upper: DVec3,
}

impl Aabb {
    #[must_use]
    pub const fn new(lower: DVec3, upper: DVec3) -> Self {
        Self { lower, upper }
    }

    /// Componentwise min/max over `points`. `None` for an empty slice.
    #[must_use]
    pub fn from_points(points: &[DVec3]) -> Option<Self> {
        let first = *points.first()?;
        let (lower, upper) = points
            .iter()
            .fold((first, first), |(lo, hi), p| (lo.min(*p), hi.max(*p)));
        Some(Self { lower, upper })
    }

    /// Box of the given extent centred at `center`.
    #[must_use]
    pub fn from_extent_center(extent: DVec3, center: DVec3) -> Self {
        let half = extent / 2.0;
        Self {
            lower: center - half,
            upper: center + half,
        }
    }

    /// Smallest box containing every input box. `None` when there are none.
    pub fn union<I>(boxes: I) -> Option<Self>
    where
        I: IntoIterator<Item = Aabb>,
    {
        boxes.into_iter().reduce(|a, b| Aabb {
            lower: a.lower.min(b.lower),
            upper: a.upper.max(b.upper),
        })
    }

    #[must_use]
    pub fn center(&self) -> DVec3 {
        (self.lower + self.upper) / 2.0
    }

    #[must_use]
    pub fn extent(&self) -> DVec3 {
        self.upper - self.lower
    }

    /// `lower <= upper` on every axis.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lower.cmple(self.upper).all()
    }

    #[must_use]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.lower.x <= other.upper.x
            && self.upper.x >= other.lower.x
            && self.lower.y <= other.upper.y
            && self.upper.y >= other.lower.y
            && self.lower.z <= other.upper.z
            && self.upper.z >= other.lower.z
    }

    /// Scale both corners about the origin.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            lower: self.lower * factor,
            upper: self.upper * factor,
        }
    }

    /// The eight corners, indexed by the bit pattern `(x, y, z)` where a set
    /// bit selects the upper coordinate.
    #[must_use]
    pub fn corners(&self) -> [DVec3; 8] {
        let mut out = [DVec3::ZERO; 8];
        for (i, corner) in out.iter_mut().enumerate() {
            *corner = DVec3::new(
                if i & 0b100 == 0 { self.lower.x } else { self.upper.x },
                if i & 0b010 == 0 { self.lower.y } else { self.upper.y },
                if i & 0b001 == 0 { self.lower.z } else { self.upper.z },
            );
        }
        out
    }

    /// The twelve edges: every pair of corners differing in exactly one axis.
    #[must_use]
    pub fn edges(&self) -> Vec<(DVec3, DVec3)> {
        let corners = self.corners();
        let mut lines = Vec::with_capacity(12);
        for i in 0..corners.len() {
            for j in (i + 1)..corners.len() {
                if (i ^ j).count_ones() == 1 {
                    lines.push((corners[i], corners[j]));
                }
            }
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_from_points() {
        let pts = [
            DVec3::new(0.0, 1.0, -1.0),
            DVec3::new(2.0, -1.0, 0.5),
            DVec3::new(1.0, 0.0, 0.0),
        ];
        let aabb = Aabb::from_points(&pts).unwrap();
        assert_eq!(aabb.lower, DVec3::new(0.0, -1.0, -1.0));
        assert_eq!(aabb.upper, DVec3::new(2.0, 1.0, 0.5));
        assert!(aabb.is_valid());
    }

    #[test]
    fn empty_points_have_no_box() {
        assert!(Aabb::from_points(&[]).is_none());
        assert!(Aabb::union(Vec::new()).is_none());
    }

    #[test]
    fn union_covers_inputs() {
        let a = Aabb::new(DVec3::ZERO, DVec3::ONE);
        let b = Aabb::new(DVec3::splat(-1.0), DVec3::splat(0.5));
        let u = Aabb::union([a, b]).unwrap();
        assert_eq!(u.lower, DVec3::splat(-1.0));
        assert_eq!(u.upper, DVec3::ONE);
    }

    #[test]
    fn twelve_axis_aligned_edges() {
        let aabb = Aabb::new(DVec3::ZERO, DVec3::new(1.0, 2.0, 3.0));
        let edges = aabb.edges();
        assert_eq!(edges.len(), 12);
        for (a, b) in edges {
            let differing = (a - b).to_array().iter().filter(|d| d.abs() > 0.0).count();
            assert_eq!(differing, 1);
        }
    }

    #[test]
    fn extent_center_round_trip() {
        let aabb = Aabb::from_extent_center(DVec3::new(0.16, 0.16, 0.08), DVec3::new(0.0, 0.0, 0.04));
        assert!((aabb.extent() - DVec3::new(0.16, 0.16, 0.08)).length() < 1e-12);
        assert!((aabb.center() - DVec3::new(0.0, 0.0, 0.04)).length() < 1e-12);
        assert!(aabb.lower.z.abs() < 1e-12);
    }

    #[test]
    fn touching_boxes_overlap() {
        let a = Aabb::new(DVec3::ZERO, DVec3::ONE);
        let b = Aabb::new(DVec3::new(1.0, 0.0, 0.0), DVec3::new(2.0, 1.0, 1.0));
        let c = Aabb::new(DVec3::new(1.5, 0.0, 0.0), DVec3::new(2.0, 1.0, 1.0));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }
}
