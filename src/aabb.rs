use std::ops::Range;
use ultraviolet::Vec3;

/// Corner pairs that differ along exactly one axis, indexing into [`AABB::corners`].
pub const EDGES: [(usize, usize); 12] = [
    // Along x
    (0, 1),
    (2, 3),
    (4, 5),
    (6, 7),
    // Along y
    (0, 2),
    (1, 3),
    (4, 6),
    (5, 7),
    // Along z
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

#[derive(Clone, Debug, PartialEq)]
pub struct AABB(Range<Vec3>);

impl AABB {
    /// Cube with edge length `size` centered on `center`.
    pub fn cube(center: Vec3, size: f32) -> Self {
        let half = Vec3::broadcast(size / 2.);
        Self(center - half..center + half)
    }

    /// Smallest box containing every point, `None` when there are no points.
    pub fn from_points(mut points: impl Iterator<Item = Vec3>) -> Option<Self> {
        let first = points.next()?;
        let range = points.fold(first..first, |range, p| {
            range.start.min_by_component(p)..range.end.max_by_component(p)
        });
        Some(Self(range))
    }

    pub fn center(&self) -> Vec3 {
        (self.0.start + self.0.end) / 2.
    }

    pub fn diagonal(&self) -> f32 {
        (self.0.end - self.0.start).mag()
    }

    /// Corner `i` takes the end of the range on axis `a` when bit `a` of `i` is set.
    pub fn corners(&self) -> [Vec3; 8] {
        let (s, e) = (self.0.start, self.0.end);
        let mut corners = [Vec3::zero(); 8];
        for (i, corner) in corners.iter_mut().enumerate() {
            *corner = Vec3::new(
                if i & 1 != 0 { e.x } else { s.x },
                if i & 2 != 0 { e.y } else { s.y },
                if i & 4 != 0 { e.z } else { s.z },
            );
        }
        corners
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points_spans_all() {
        let points = vec![
            Vec3::new(1., -2., 3.),
            Vec3::new(-4., 5., 0.),
            Vec3::new(2., 0., -1.),
        ];
        let aabb = AABB::from_points(points.into_iter()).unwrap();
        let corners = aabb.corners();
        assert_eq!(corners[0], Vec3::new(-4., -2., -1.));
        assert_eq!(corners[7], Vec3::new(2., 5., 3.));
        assert_eq!(aabb.center(), Vec3::new(-1., 1.5, 1.));
    }

    #[test]
    fn test_from_no_points() {
        assert!(AABB::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn test_cube_edges_have_unit_length() {
        let cube = AABB::cube(Vec3::new(3., 3., 3.), 2.);
        let corners = cube.corners();
        assert_eq!(corners[0], Vec3::new(2., 2., 2.));
        assert_eq!(corners[7], Vec3::new(4., 4., 4.));
        for &(a, b) in EDGES.iter() {
            assert_eq!((corners[a] - corners[b]).mag(), 2.);
        }
    }
}
