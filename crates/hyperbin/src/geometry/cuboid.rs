//! Axis-aligned boxes.

use tracing::warn;

use super::Point;

/// An axis-aligned box spanned by a low and a high corner.
///
/// Membership is half-open on every axis: a coordinate `x` is inside when
/// `low < x <= high`. The low faces are excluded and the high faces included,
/// so neighbouring boxes that share a face never both claim a point on it.
#[derive(Clone, Debug, PartialEq)]
pub struct Cuboid {
    low: Point,
    high: Point,
}

impl Cuboid {
    /// A zero-width box at the origin.
    pub fn degenerate(dimension: usize) -> Self {
        Self {
            low: Point::origin(dimension),
            high: Point::origin(dimension),
        }
    }

    /// Build a box from its corners.
    ///
    /// `low` must be strictly below `high` on every axis. Otherwise the
    /// problem is reported and a degenerate box of `low`'s dimension is
    /// returned instead.
    pub fn new(low: Point, high: Point) -> Self {
        if low.all_lt(&high) {
            return Self { low, high };
        }
        warn!(
            low = ?low.coords(),
            high = ?high.coords(),
            "cuboid low corner is not below its high corner; using a degenerate cuboid"
        );
        Self::degenerate(low.dimension())
    }

    /// A box spanning `[low, high]` on every axis.
    ///
    /// An inverted range is reported but kept as given.
    pub fn uniform(dimension: usize, low: f64, high: f64) -> Self {
        if low > high {
            warn!(low, high, "cuboid low edge is above its high edge");
        }
        Self {
            low: Point::filled(dimension, low),
            high: Point::filled(dimension, high),
        }
    }

    /// Build a box without checking the corners. Used for bounding boxes,
    /// which are valid by construction.
    pub(crate) fn from_corners_unchecked(low: Point, high: Point) -> Self {
        debug_assert_eq!(low.dimension(), high.dimension());
        Self { low, high }
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.low.dimension()
    }

    #[inline]
    pub fn low(&self) -> &Point {
        &self.low
    }

    #[inline]
    pub fn high(&self) -> &Point {
        &self.high
    }

    /// Whether `point` lies inside the box.
    #[inline]
    pub fn contains(&self, point: &Point) -> bool {
        self.low.all_lt(point) && self.high.all_gte(point)
    }

    /// Like [`contains`](Self::contains), but only looks at the axes in `dims`.
    pub fn contains_in(&self, point: &Point, dims: &[usize]) -> bool {
        dims.iter().all(|&d| {
            let value = point.get(d);
            self.low.get(d) < value && value <= self.high.get(d)
        })
    }

    /// Corner-wise equality.
    ///
    /// Boxes of different dimension are reported and compare as neither
    /// equal nor different.
    pub fn coincides(&self, other: &Cuboid) -> bool {
        self.same_dimension(other) && self.low.all_eq(&other.low) && self.high.all_eq(&other.high)
    }

    /// Negation of [`coincides`](Self::coincides) for boxes of equal dimension.
    pub fn differs(&self, other: &Cuboid) -> bool {
        self.same_dimension(other) && (self.low.any_ne(&other.low) || self.high.any_ne(&other.high))
    }

    fn same_dimension(&self, other: &Cuboid) -> bool {
        if self.dimension() != other.dimension() {
            warn!(
                left = self.dimension(),
                right = other.dimension(),
                "comparing cuboids of different dimensions"
            );
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn unit_square() -> Cuboid {
        Cuboid::new(Point::from([0.0, 0.0]), Point::from([1.0, 1.0]))
    }

    #[test]
    fn test_half_open_membership() {
        let square = unit_square();

        assert!(!square.contains(&Point::from([0.0, 0.0])));
        assert!(square.contains(&Point::from([1.0, 1.0])));
        assert!(square.contains(&Point::from([0.5, 0.5])));
        assert!(square.contains(&Point::from([1.0, 0.5])));

        // On a low face along one axis: outside.
        assert!(!square.contains(&Point::from([1.0, 0.0])));
        assert!(!square.contains(&Point::from([0.0, 1.0])));

        assert!(!square.contains(&Point::from([1.0 + 1e-12, 0.5])));
    }

    #[test]
    #[traced_test]
    fn test_inverted_corners_give_degenerate_cuboid() {
        let cuboid = Cuboid::new(Point::from([1.0, 0.0]), Point::from([0.0, 1.0]));
        assert_eq!(cuboid, Cuboid::degenerate(2));
        assert!(!cuboid.contains(&Point::from([0.0, 0.0])));
        assert!(logs_contain("using a degenerate cuboid"));
    }

    #[test]
    fn test_touching_corners_are_rejected() {
        let cuboid = Cuboid::new(Point::from([0.0, 0.0]), Point::from([1.0, 0.0]));
        assert_eq!(cuboid, Cuboid::degenerate(2));
    }

    #[test]
    #[traced_test]
    fn test_uniform() {
        let cube = Cuboid::uniform(3, -1.0, 1.0);
        assert_eq!(cube.dimension(), 3);
        assert!(cube.contains(&Point::origin(3)));

        let inverted = Cuboid::uniform(2, 1.0, 0.0);
        assert_eq!(inverted.low().coords(), &[1.0, 1.0]);
        assert!(logs_contain("cuboid low edge is above its high edge"));
    }

    #[test]
    fn test_contains_in_selected_dims() {
        let square = unit_square();
        let point = Point::from([0.5, 5.0]);
        assert!(!square.contains(&point));
        assert!(square.contains_in(&point, &[0]));
        assert!(!square.contains_in(&point, &[0, 1]));
        assert!(square.contains_in(&point, &[]));
    }

    #[test]
    #[traced_test]
    fn test_comparisons() {
        let a = unit_square();
        let b = unit_square();
        let c = Cuboid::uniform(2, 0.0, 2.0);
        assert!(a.coincides(&b));
        assert!(!a.differs(&b));
        assert!(a.differs(&c));

        let cube = Cuboid::uniform(3, 0.0, 1.0);
        assert!(!a.coincides(&cube));
        assert!(!a.differs(&cube));
        assert!(logs_contain("comparing cuboids of different dimensions"));
    }
}
