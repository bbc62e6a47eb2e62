//! A position in multi-dimensional space.
//!
//! The dimension of a [`Point`] is fixed when it is created. Relational
//! queries between points of different dimension never fail: they report a
//! diagnostic and answer `false`.

use tracing::warn;

/// A fixed-dimension tuple of coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct Point {
    coords: Vec<f64>,
}

impl Point {
    /// Create a point from its coordinates.
    ///
    /// # Example
    /// ```
    /// use hyperbin::Point;
    /// let p = Point::new(vec![1.0, 2.0, 3.0]);
    /// assert_eq!(p.dimension(), 3);
    /// ```
    pub fn new(coords: Vec<f64>) -> Self {
        Self { coords }
    }

    /// The origin of a `dimension`-dimensional space.
    pub fn origin(dimension: usize) -> Self {
        Self::filled(dimension, 0.0)
    }

    /// A point with every coordinate set to `value`.
    pub fn filled(dimension: usize, value: f64) -> Self {
        Self {
            coords: vec![value; dimension],
        }
    }

    /// Number of coordinates.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.coords.len()
    }

    /// Coordinates as a slice.
    #[inline]
    pub fn coords(&self) -> &[f64] {
        &self.coords
    }

    /// Read coordinate `index`.
    ///
    /// An out-of-range index is reported and the last coordinate is returned
    /// instead. This is not a bounds check: callers must not rely on it.
    /// A zero-dimensional point yields NaN.
    pub fn get(&self, index: usize) -> f64 {
        match self.coords.get(index) {
            Some(&value) => value,
            None => {
                warn!(
                    index,
                    dimension = self.dimension(),
                    "point coordinate index out of range"
                );
                self.coords.last().copied().unwrap_or(f64::NAN)
            }
        }
    }

    /// Overwrite coordinate `index`.
    ///
    /// Out-of-range writes are reported and land on the last coordinate.
    pub fn set(&mut self, index: usize, value: f64) {
        let dimension = self.dimension();
        if index >= dimension {
            warn!(index, dimension, "point coordinate index out of range");
        }
        if let Some(slot) = self.coords.get_mut(index.min(dimension.saturating_sub(1))) {
            *slot = value;
        }
    }

    /// Whether `other` has the same dimension, reporting a diagnostic if not.
    pub fn compatible(&self, other: &Point) -> bool {
        if self.dimension() != other.dimension() {
            warn!(
                left = self.dimension(),
                right = other.dimension(),
                "points have different dimensions"
            );
            return false;
        }
        true
    }

    /// Every coordinate of `self` is strictly less than the matching one of `other`.
    pub fn all_lt(&self, other: &Point) -> bool {
        self.all_pairs(other, |a, b| a < b)
    }

    /// Every coordinate of `self` is strictly greater than the matching one of `other`.
    pub fn all_gt(&self, other: &Point) -> bool {
        self.all_pairs(other, |a, b| a > b)
    }

    /// Every coordinate of `self` is less than or equal to the matching one of `other`.
    pub fn all_lte(&self, other: &Point) -> bool {
        self.all_pairs(other, |a, b| a <= b)
    }

    /// Every coordinate of `self` is greater than or equal to the matching one of `other`.
    pub fn all_gte(&self, other: &Point) -> bool {
        self.all_pairs(other, |a, b| a >= b)
    }

    /// Coordinate-wise equality. `false` when the dimensions differ.
    pub fn all_eq(&self, other: &Point) -> bool {
        self.all_pairs(other, |a, b| a == b)
    }

    /// At least one coordinate differs. Also `false` when the dimensions
    /// differ, so `all_eq` and `any_ne` are not complements of each other.
    pub fn any_ne(&self, other: &Point) -> bool {
        self.compatible(other) && self.coords.iter().zip(&other.coords).any(|(a, b)| a != b)
    }

    #[inline]
    fn all_pairs(&self, other: &Point, pred: impl Fn(f64, f64) -> bool) -> bool {
        self.compatible(other)
            && self
                .coords
                .iter()
                .zip(&other.coords)
                .all(|(&a, &b)| pred(a, b))
    }
}

impl From<Vec<f64>> for Point {
    fn from(coords: Vec<f64>) -> Self {
        Self::new(coords)
    }
}

impl From<&[f64]> for Point {
    fn from(coords: &[f64]) -> Self {
        Self::new(coords.to_vec())
    }
}

impl<const N: usize> From<[f64; N]> for Point {
    fn from(coords: [f64; N]) -> Self {
        Self::new(coords.to_vec())
    }
}
