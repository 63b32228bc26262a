//! Axis-aligned bounding box.
//!
//! Boxes are always three dimensional. Points of lower space dimension are
//! padded with zeros, so a 2D box simply has a flat z extent.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box (AABB).
///
/// # Example
///
/// ```
/// use mesh_types::{Aabb, Point3};
///
/// let aabb = Aabb::new(
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(10.0, 10.0, 10.0),
/// );
///
/// assert_eq!(aabb.size(), Point3::new(10.0, 10.0, 10.0).coords);
/// assert!(aabb.contains(&Point3::new(5.0, 5.0, 5.0), 0.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Aabb {
    /// Minimum corner.
    pub min: Point3<f64>,
    /// Maximum corner.
    pub max: Point3<f64>,
}

impl Aabb {
    /// Create a new AABB from two corners, reordering components if needed.
    #[must_use]
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self {
            min: Point3::new(min.x.min(max.x), min.y.min(max.y), min.z.min(max.z)),
            max: Point3::new(min.x.max(max.x), min.y.max(max.y), min.z.max(max.z)),
        }
    }

    /// Create an empty AABB (min > max), the neutral element for expansion.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::{Aabb, Point3};
    ///
    /// let mut aabb = Aabb::empty();
    /// assert!(aabb.is_empty());
    ///
    /// aabb.expand_to_include(&Point3::new(1.0, 2.0, 3.0));
    /// assert!(!aabb.is_empty());
    /// ```
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Point3::new is not const in nalgebra
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Create a box from a flat `[min0, max0, min1, max1, ...]` array.
    ///
    /// Missing dimensions get a zero extent at the origin.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::{Aabb, Point3};
    ///
    /// let b = Aabb::from_minmax(&[0.0, 1.0, -2.0, 2.0]);
    /// assert_eq!(b.min, Point3::new(0.0, -2.0, 0.0));
    /// assert_eq!(b.max, Point3::new(1.0, 2.0, 0.0));
    /// ```
    #[must_use]
    pub fn from_minmax(minmax: &[f64]) -> Self {
        let mut min = [0.0; 3];
        let mut max = [0.0; 3];
        for (k, pair) in minmax.chunks_exact(2).take(3).enumerate() {
            min[k] = pair[0];
            max[k] = pair[1];
        }
        Self {
            min: Point3::from(min),
            max: Point3::from(max),
        }
    }

    /// Flatten the first `dim` axes to `[min0, max0, min1, max1, ...]`.
    #[must_use]
    pub fn to_minmax(&self, dim: usize) -> Vec<f64> {
        (0..dim.min(3))
            .flat_map(|k| [self.min[k], self.max[k]])
            .collect()
    }

    /// Bounding box of points given as `dim`-component slices.
    #[must_use]
    pub fn from_slices<'a>(points: impl IntoIterator<Item = &'a [f64]>) -> Self {
        let mut aabb = Self::empty();
        for p in points {
            aabb.expand_to_include(&pad(p));
        }
        aabb
    }

    /// Whether min > max along some axis.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Extent along each axis.
    #[inline]
    #[must_use]
    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }

    /// Center of the box.
    #[inline]
    #[must_use]
    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    /// Index of the axis with the largest extent.
    #[must_use]
    pub fn longest_axis(&self) -> usize {
        let s = self.size();
        if s.x >= s.y && s.x >= s.z {
            0
        } else if s.y >= s.z {
            1
        } else {
            2
        }
    }

    /// Whether `point` lies inside the box enlarged by `tol`.
    #[inline]
    #[must_use]
    pub fn contains(&self, point: &Point3<f64>, tol: f64) -> bool {
        (0..3).all(|k| point[k] >= self.min[k] - tol && point[k] <= self.max[k] + tol)
    }

    /// Whether the boxes overlap, touching included, within `tol`.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_types::{Aabb, Point3};
    ///
    /// let a = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
    /// let b = Aabb::new(Point3::new(1.05, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0));
    /// assert!(!a.intersects(&b, 0.0));
    /// assert!(a.intersects(&b, 0.1));
    /// ```
    #[inline]
    #[must_use]
    pub fn intersects(&self, other: &Self, tol: f64) -> bool {
        (0..3).all(|k| self.min[k] <= other.max[k] + tol && self.max[k] >= other.min[k] - tol)
    }

    /// Enclosing box of two boxes.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Grow the box to include a point.
    pub fn expand_to_include(&mut self, point: &Point3<f64>) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    /// Box grown by `margin` on all sides.
    #[must_use]
    pub fn expanded(&self, margin: f64) -> Self {
        let m = Vector3::repeat(margin);
        Self {
            min: self.min - m,
            max: self.max + m,
        }
    }

    /// Squared distance from a point to the box, 0 inside.
    #[must_use]
    pub fn distance_squared_to(&self, point: &Point3<f64>) -> f64 {
        (0..3)
            .map(|k| {
                let d = (self.min[k] - point[k]).max(point[k] - self.max[k]).max(0.0);
                d * d
            })
            .sum()
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

/// Pad a point of up to three components to a [`Point3`].
#[must_use]
pub fn pad(p: &[f64]) -> Point3<f64> {
    let mut out = Point3::origin();
    for (k, v) in p.iter().take(3).enumerate() {
        out[k] = *v;
    }
    out
}
