//! Unions of cuboids.

use tracing::warn;

use super::{Cuboid, Point};

/// A region made of one or more [`Cuboid`]s of the same dimension.
///
/// A point is inside the volume when it is inside any member cuboid. The
/// bounding box is recomputed from the members on every call.
#[derive(Clone, Debug, PartialEq)]
pub struct Volume {
    dimension: usize,
    cuboids: Vec<Cuboid>,
}

impl Volume {
    /// An empty volume of the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            cuboids: Vec::new(),
        }
    }

    /// A volume made of a single cuboid.
    pub fn from_cuboid(cuboid: Cuboid) -> Self {
        Self {
            dimension: cuboid.dimension(),
            cuboids: vec![cuboid],
        }
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    pub fn cuboids(&self) -> &[Cuboid] {
        &self.cuboids
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cuboids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cuboids.is_empty()
    }

    /// Add a cuboid. Returns `false` and leaves the volume untouched if the
    /// cuboid has the wrong dimension.
    pub fn push_cuboid(&mut self, cuboid: Cuboid) -> bool {
        if cuboid.dimension() != self.dimension {
            warn!(
                expected = self.dimension,
                got = cuboid.dimension(),
                "cuboid has the wrong dimension for this volume"
            );
            return false;
        }
        self.cuboids.push(cuboid);
        true
    }

    /// Add the cuboid spanned by two corners.
    pub fn push_corners(&mut self, low: Point, high: Point) -> bool {
        self.push_cuboid(Cuboid::new(low, high))
    }

    /// Whether any member cuboid contains `point`.
    #[inline]
    pub fn contains(&self, point: &Point) -> bool {
        self.cuboids.iter().any(|c| c.contains(point))
    }

    /// Smallest low-corner coordinate along `axis`.
    ///
    /// An axis beyond the volume's dimension is reported and yields `-1.0`.
    /// An empty volume yields `+inf`.
    pub fn min(&self, axis: usize) -> f64 {
        if axis >= self.dimension {
            warn!(axis, dimension = self.dimension, "volume axis out of range");
            return -1.0;
        }
        self.cuboids
            .iter()
            .map(|c| c.low().get(axis))
            .fold(f64::INFINITY, f64::min)
    }

    /// Largest high-corner coordinate along `axis`.
    ///
    /// An axis beyond the volume's dimension is reported and yields `-1.0`.
    /// An empty volume yields `-inf`.
    pub fn max(&self, axis: usize) -> f64 {
        if axis >= self.dimension {
            warn!(axis, dimension = self.dimension, "volume axis out of range");
            return -1.0;
        }
        self.cuboids
            .iter()
            .map(|c| c.high().get(axis))
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// The bounding box of all member cuboids.
    pub fn limits(&self) -> Cuboid {
        let low = (0..self.dimension).map(|d| self.min(d)).collect::<Vec<_>>();
        let high = (0..self.dimension).map(|d| self.max(d)).collect::<Vec<_>>();
        Cuboid::from_corners_unchecked(Point::new(low), Point::new(high))
    }
}

impl From<Cuboid> for Volume {
    fn from(cuboid: Cuboid) -> Self {
        Self::from_cuboid(cuboid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    /// An L-shaped region: [0,2]x[0,1] plus [0,1]x[1,2].
    fn l_shape() -> Volume {
        let mut volume = Volume::from_cuboid(Cuboid::new(
            Point::from([0.0, 0.0]),
            Point::from([2.0, 1.0]),
        ));
        volume.push_corners(Point::from([0.0, 1.0]), Point::from([1.0, 2.0]));
        volume
    }

    #[test]
    fn test_union_membership() {
        let volume = l_shape();
        assert_eq!(volume.len(), 2);
        assert!(volume.contains(&Point::from([1.5, 0.5])));
        assert!(volume.contains(&Point::from([0.5, 1.5])));
        assert!(!volume.contains(&Point::from([1.5, 1.5])));
    }

    #[test]
    fn test_min_max_and_limits() {
        let volume = l_shape();
        assert_eq!(volume.min(0), 0.0);
        assert_eq!(volume.max(0), 2.0);
        assert_eq!(volume.min(1), 0.0);
        assert_eq!(volume.max(1), 2.0);

        let limits = volume.limits();
        assert_eq!(limits.low().coords(), &[0.0, 0.0]);
        assert_eq!(limits.high().coords(), &[2.0, 2.0]);
        assert!(limits.contains(&Point::from([1.5, 1.5])));
    }

    #[test]
    #[traced_test]
    fn test_axis_out_of_range() {
        let volume = l_shape();
        assert_eq!(volume.min(2), -1.0);
        assert_eq!(volume.max(7), -1.0);
        assert!(logs_contain("volume axis out of range"));
    }

    #[test]
    fn test_empty_volume_bounds_are_neutral() {
        let volume = Volume::new(2);
        assert!(volume.is_empty());
        assert_eq!(volume.min(0), f64::INFINITY);
        assert_eq!(volume.max(0), f64::NEG_INFINITY);
        assert!(!volume.contains(&Point::origin(2)));
    }

    #[test]
    #[traced_test]
    fn test_rejects_wrong_dimension() {
        let mut volume = l_shape();
        let accepted = volume.push_cuboid(Cuboid::uniform(3, 0.0, 1.0));
        assert!(!accepted);
        assert_eq!(volume.len(), 2);
        assert!(logs_contain("cuboid has the wrong dimension for this volume"));
    }
}
