//! Directed (oriented) bounding box.
//!
//! The box axes are the principal axes of inertia of the point cloud, found
//! with cyclic Jacobi rotations on the inertia tensor. The box extent is the
//! min/max of the points projected on those axes. Supported space
//! dimensions are 1, 2 and 3; a box of dimension 0 is the "empty" box, which
//! intersects and contains everything.

// Point counts are converted to f64 to average coordinates.
#![allow(clippy::cast_precision_loss)]

use tracing::warn;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{MeasureError, MeasureResult};

const JACOBI_TOLERANCE: f64 = 1e-9;

/// Bounding box aligned with the principal axes of its points.
///
/// # Example
///
/// ```
/// use mesh_measure::DirectedBoundingBox;
///
/// // points on a line at 45 degrees: the box is thin along one axis
/// let pts = [0.0, 0.0, 1.0, 1.0, 2.0, 2.0];
/// let obb = DirectedBoundingBox::new(&pts, 2).unwrap();
///
/// assert!(!obb.is_out(&[1.0, 1.0]));
/// assert!(obb.is_out(&[1.0, 0.0]));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DirectedBoundingBox {
    dim: usize,
    /// `dim` unit axes, one per row.
    axes: Vec<f64>,
    /// `[min0, max0, min1, max1, ...]` in the local frame.
    minmax: Vec<f64>,
    converged: bool,
}

impl Default for DirectedBoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl DirectedBoundingBox {
    /// Box of dimension 0, to be filled by [`set_data`](Self::set_data).
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            dim: 0,
            axes: Vec::new(),
            minmax: Vec::new(),
            converged: true,
        }
    }

    /// Box of `points`, given fully interlaced with `dim` components each.
    ///
    /// With no points the box has inverted bounds (`+MAX`/`-MAX`) and
    /// contains nothing.
    ///
    /// # Errors
    ///
    /// Returns [`MeasureError::InvalidParams`] if `dim > 3`, and
    /// [`MeasureError::SizeMismatch`] if `points.len()` is not a multiple of
    /// `dim`.
    pub fn new(points: &[f64], dim: usize) -> MeasureResult<Self> {
        if dim == 0 {
            return Ok(Self::empty());
        }
        if points.len() % dim != 0 {
            return Err(MeasureError::SizeMismatch {
                context: "directed bounding box points",
                expected: points.len().next_multiple_of(dim),
                actual: points.len(),
            });
        }
        Self::from_points(points.chunks_exact(dim), dim)
    }

    /// Box of points given one slice per point.
    ///
    /// Only the first `dim` components of each point are read.
    ///
    /// # Errors
    ///
    /// Returns [`MeasureError::InvalidParams`] if `dim > 3` or a point has
    /// fewer than `dim` components.
    pub fn from_points<'a, I>(points: I, dim: usize) -> MeasureResult<Self>
    where
        I: IntoIterator<Item = &'a [f64]>,
        I::IntoIter: Clone,
    {
        if dim > 3 {
            return Err(MeasureError::invalid_params(format!(
                "directed bounding box supports dimensions 1 to 3, got {dim}"
            )));
        }
        if dim == 0 {
            return Ok(Self::empty());
        }
        let points = points.into_iter();
        if let Some(short) = points.clone().find(|p| p.len() < dim) {
            return Err(MeasureError::invalid_params(format!(
                "point with {} components in a {dim}D box",
                short.len()
            )));
        }

        let mut obb = Self::unbounded_identity(dim);
        let count = points.clone().count();
        if count == 0 {
            return Ok(obb);
        }

        if dim > 1 {
            let mut gc = [0.0; 3];
            for p in points.clone() {
                for (g, v) in gc.iter_mut().zip(p) {
                    *g += v;
                }
            }
            for g in &mut gc {
                *g /= count as f64;
            }
            let mut tensor = [[0.0; 3]; 3];
            for p in points.clone() {
                add_to_inertia_tensor(&mut tensor, p, &gc, dim);
            }
            obb.converged = obb.jacobi_axes(&mut tensor, 5 * dim * dim);
            if !obb.converged {
                warn!(dim, points = count, "principal axes search did not converge");
            }
        }

        for p in points {
            obb.add_point(p);
        }
        Ok(obb)
    }

    /// Identity axes with inverted bounds.
    fn unbounded_identity(dim: usize) -> Self {
        let mut axes = vec![0.0; dim * dim];
        for i in 0..dim {
            axes[i * dim + i] = 1.0;
        }
        Self {
            dim,
            axes,
            minmax: [f64::MAX, -f64::MAX].repeat(dim),
            converged: true,
        }
    }

    /// Diagonalize the upper triangle of `tensor` and store its eigenvectors
    /// as the box axes. Returns whether the off-diagonal terms vanished
    /// within `max_rotations` rotations.
    fn jacobi_axes(&mut self, tensor: &mut [[f64; 3]; 3], max_rotations: usize) -> bool {
        let dim = self.dim;
        // accumulated rotation, eigenvectors in columns
        let mut v = [[0.0; 3]; 3];
        for (i, row) in v.iter_mut().enumerate() {
            row[i] = 1.0;
        }

        for _ in 0..max_rotations {
            let (k, l, max) = largest_off_diagonal(tensor, dim);
            if max < JACOBI_TOLERANCE {
                break;
            }

            let diff = tensor[l][l] - tensor[k][k];
            let t = if tensor[k][l].abs() < diff.abs() * 1.0e-36 {
                tensor[k][l] / diff
            } else {
                let phi = diff / (2.0 * tensor[k][l]);
                let t = 1.0 / (phi.abs() + (phi * phi + 1.0).sqrt());
                if phi < 0.0 { -t } else { t }
            };
            let c = 1.0 / (t * t + 1.0).sqrt();
            let s = t * c;
            let tau = s / (1.0 + c);
            tensor[k][k] -= t * tensor[k][l];
            tensor[l][l] += t * tensor[k][l];
            tensor[k][l] = 0.0;

            let rot = Rotation { s, tau };
            for i in 0..k {
                rot.apply(tensor, (i, k), (i, l));
            }
            for i in k + 1..l {
                rot.apply(tensor, (k, i), (i, l));
            }
            for i in l + 1..dim {
                rot.apply(tensor, (k, i), (l, i));
            }
            for i in 0..dim {
                rot.apply(&mut v, (i, k), (i, l));
            }
        }

        for axis in 0..dim {
            for i in 0..dim {
                self.axes[axis * dim + i] = v[i][axis];
            }
        }
        // the last permitted rotation may be the one that converged
        largest_off_diagonal(tensor, dim).2 < JACOBI_TOLERANCE
    }

    fn axis(&self, i: usize) -> &[f64] {
        &self.axes[i * self.dim..(i + 1) * self.dim]
    }

    fn add_point(&mut self, p: &[f64]) {
        let local = self.to_local(p);
        for (i, v) in local.iter().take(self.dim).enumerate() {
            self.minmax[2 * i] = self.minmax[2 * i].min(*v);
            self.minmax[2 * i + 1] = self.minmax[2 * i + 1].max(*v);
        }
    }

    /// Space dimension, 0 for an empty box.
    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dim
    }

    /// Box axes, `dim` unit vectors one after the other.
    #[must_use]
    pub fn axes(&self) -> &[f64] {
        &self.axes
    }

    /// Local extent `[min0, max0, min1, max1, ...]`.
    #[must_use]
    pub fn minmax(&self) -> &[f64] {
        &self.minmax
    }

    /// Whether the principal axes search converged.
    ///
    /// A non-converged box is still a valid bounding box, only less tight.
    #[must_use]
    pub const fn is_converged(&self) -> bool {
        self.converged
    }

    /// Coordinates of a global point in the box frame.
    ///
    /// The frame origin is the global origin. Components past `dim` are 0.
    #[must_use]
    pub fn to_local(&self, p: &[f64]) -> [f64; 3] {
        let mut out = [0.0; 3];
        if self.dim == 1 {
            out[0] = p[0];
            return out;
        }
        for (i, o) in out.iter_mut().enumerate().take(self.dim) {
            *o = self.axis(i).iter().zip(p).map(|(a, b)| a * b).sum();
        }
        out
    }

    /// Global coordinates of a point given in the box frame.
    #[must_use]
    pub fn from_local(&self, p: &[f64]) -> [f64; 3] {
        let mut out = [0.0; 3];
        if self.dim == 1 {
            out[0] = p[0];
            return out;
        }
        for (i, pi) in p.iter().enumerate().take(self.dim) {
            for (o, a) in out.iter_mut().zip(self.axis(i)) {
                *o += pi * a;
            }
        }
        out
    }

    /// Grow the box by `tol` on every side.
    pub fn enlarge(&mut self, tol: f64) {
        for pair in self.minmax.chunks_exact_mut(2) {
            pair[0] -= tol;
            pair[1] += tol;
        }
    }

    /// Whether `point` lies outside the box. The empty box contains
    /// everything.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_measure::DirectedBoundingBox;
    ///
    /// let obb = DirectedBoundingBox::new(&[0.0, 2.0, 5.0], 1).unwrap();
    /// assert!(!obb.is_out(&[3.0]));
    /// assert!(obb.is_out(&[5.5]));
    /// assert!(!DirectedBoundingBox::empty().is_out(&[1e9]));
    /// ```
    #[must_use]
    pub fn is_out(&self, point: &[f64]) -> bool {
        if self.dim < 1 {
            return false;
        }
        let local = self.to_local(point);
        self.minmax
            .chunks_exact(2)
            .zip(local)
            .any(|(mm, v)| v < mm[0] || v > mm[1])
    }

    /// Corners of a box with local extent `minmax`, `dim` components each.
    ///
    /// Along axis `i` the corners alternate between min and max in blocks of
    /// `2^(dim - 1 - i)`.
    #[must_use]
    pub fn corners(&self, minmax: &[f64]) -> Vec<f64> {
        corners(self.dim, minmax)
    }

    /// Whether the two boxes surely do not intersect.
    ///
    /// Uses the separating axes of both boxes. Boxes of different
    /// dimensions, or an empty box, are never reported disjoint.
    #[must_use]
    pub fn is_disjoint_with(&self, other: &Self) -> bool {
        if self.dim < 1 || other.dim < 1 || self.dim != other.dim {
            return false;
        }
        if self.dim == 1 {
            return is_minmax_out(&other.minmax, &self.minmax, 1);
        }
        for (axis_box, corner_box) in [(other, self), (self, other)] {
            let mut projected = Self {
                minmax: [f64::MAX, -f64::MAX].repeat(self.dim),
                ..axis_box.clone()
            };
            for corner in corners(self.dim, &corner_box.minmax).chunks_exact(self.dim) {
                let global = corner_box.from_local(corner);
                projected.add_point(&global);
            }
            if is_minmax_out(&projected.minmax, &axis_box.minmax, self.dim) {
                return true;
            }
        }
        false
    }

    /// Whether the box surely does not intersect the axis-aligned box
    /// `aabb`, given as `[min0, max0, min1, max1, ...]`.
    ///
    /// # Example
    ///
    /// ```
    /// use mesh_measure::DirectedBoundingBox;
    ///
    /// let obb = DirectedBoundingBox::new(&[0.0, 0.0, 1.0, 1.0, 2.0, 2.0], 2).unwrap();
    /// assert!(obb.is_disjoint_with_aabb(&[1.8, 2.5, -0.5, 0.2]));
    /// assert!(!obb.is_disjoint_with_aabb(&[0.5, 1.5, 0.5, 1.5]));
    /// ```
    #[must_use]
    pub fn is_disjoint_with_aabb(&self, aabb: &[f64]) -> bool {
        if self.dim < 1 || aabb.len() < 2 * self.dim {
            return false;
        }
        if self.dim == 1 {
            return is_minmax_out(&self.minmax, aabb, 1);
        }

        let mut projected = Self {
            minmax: [f64::MAX, -f64::MAX].repeat(self.dim),
            ..self.clone()
        };
        for corner in corners(self.dim, aabb).chunks_exact(self.dim) {
            projected.add_point(corner);
        }
        if is_minmax_out(&projected.minmax, &self.minmax, self.dim) {
            return true;
        }

        let mut global = [f64::MAX, -f64::MAX].repeat(self.dim);
        for corner in corners(self.dim, &self.minmax).chunks_exact(self.dim) {
            let g = self.from_local(corner);
            for (i, v) in g.iter().take(self.dim).enumerate() {
                global[2 * i] = global[2 * i].min(*v);
                global[2 * i + 1] = global[2 * i + 1].max(*v);
            }
        }
        is_minmax_out(&global, aabb, self.dim)
    }

    /// Number of values in [`data`](Self::data) for dimension `dim`.
    #[must_use]
    pub const fn data_size(dim: usize) -> usize {
        1 + dim * dim + 2 * dim
    }

    /// Serialized state: `[dim, axes..., minmax...]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn data(&self) -> Vec<f64> {
        let mut data = Vec::with_capacity(Self::data_size(self.dim));
        data.push(self.dim as f64);
        data.extend_from_slice(&self.axes);
        data.extend_from_slice(&self.minmax);
        data.resize(Self::data_size(self.dim), 0.0);
        data
    }

    /// Restore the state produced by [`data`](Self::data).
    ///
    /// A leading 0 resets the box to empty.
    ///
    /// # Errors
    ///
    /// Returns [`MeasureError::InvalidParams`] for a dimension that is not
    /// 0 to 3, and [`MeasureError::SizeMismatch`] if `data` is truncated.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn set_data(&mut self, data: &[f64]) -> MeasureResult<()> {
        let Some(&head) = data.first() else {
            return Err(MeasureError::SizeMismatch {
                context: "directed bounding box data",
                expected: 1,
                actual: 0,
            });
        };
        if !(0.0..=3.0).contains(&head) || head.fract() != 0.0 {
            return Err(MeasureError::invalid_params(format!(
                "invalid box dimension {head}"
            )));
        }
        let dim = head as usize;
        if dim == 0 {
            *self = Self::empty();
            return Ok(());
        }
        MeasureError::check_len("directed bounding box data", data.len(), Self::data_size(dim))?;
        let axes_end = 1 + dim * dim;
        self.dim = dim;
        self.axes = data[1..axes_end].to_vec();
        self.minmax = data[axes_end..axes_end + 2 * dim].to_vec();
        self.converged = true;
        Ok(())
    }

    /// Box restored from [`data`](Self::data).
    ///
    /// # Errors
    ///
    /// Same as [`set_data`](Self::set_data).
    pub fn from_data(data: &[f64]) -> MeasureResult<Self> {
        let mut obb = Self::empty();
        obb.set_data(data)?;
        Ok(obb)
    }
}

fn add_to_inertia_tensor(tensor: &mut [[f64; 3]; 3], p: &[f64], gc: &[f64; 3], dim: usize) {
    let x = p[0] - gc[0];
    let y = p[1] - gc[1];
    if dim == 3 {
        let z = p[2] - gc[2];
        tensor[0][0] += y * y + z * z;
        tensor[1][1] += x * x + z * z;
        tensor[2][2] += x * x + y * y;
        tensor[0][1] -= x * y;
        tensor[0][2] -= x * z;
        tensor[1][2] -= y * z;
    } else {
        tensor[0][0] += y * y;
        tensor[1][1] += x * x;
        tensor[0][1] -= x * y;
    }
}

/// Position and magnitude of the largest off-diagonal term of the upper
/// triangle.
fn largest_off_diagonal(tensor: &[[f64; 3]; 3], dim: usize) -> (usize, usize, f64) {
    let (mut k, mut l, mut max) = (0, 0, 0.0);
    for i in 0..dim.saturating_sub(1) {
        for j in i + 1..dim {
            if tensor[i][j].abs() > max {
                max = tensor[i][j].abs();
                k = i;
                l = j;
            }
        }
    }
    (k, l, max)
}

/// Plane rotation of the Jacobi sweep.
struct Rotation {
    s: f64,
    tau: f64,
}

impl Rotation {
    fn apply(&self, m: &mut [[f64; 3]; 3], (r1, c1): (usize, usize), (r2, c2): (usize, usize)) {
        let t1 = m[r1][c1];
        let t2 = m[r2][c2];
        m[r1][c1] -= self.s * (t2 + self.tau * t1);
        m[r2][c2] += self.s * (t1 - self.tau * t2);
    }
}

fn corners(dim: usize, minmax: &[f64]) -> Vec<f64> {
    let count = 1_usize << dim;
    let mut out = vec![0.0; count * dim];
    let mut block = count / 2;
    for i in 0..dim {
        for c in 0..count {
            let use_max = (c / block) % 2 == 1;
            out[c * dim + i] = minmax[2 * i + usize::from(use_max)];
        }
        block = (block / 2).max(1);
    }
    out
}

fn is_minmax_out(a: &[f64], b: &[f64], dim: usize) -> bool {
    (0..dim).any(|i| a[2 * i] > b[2 * i + 1] || a[2 * i + 1] < b[2 * i])
}
