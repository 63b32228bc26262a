//! Cell quality metrics.
//!
//! Each metric reads the corner coordinates of one cell from a flat buffer,
//! three values per node, nodes in cell order. Degenerate cells yield a
//! sentinel instead of an error: `f64::MAX` for ratios, `f64::MIN_POSITIVE`
//! for [`quad_warp`] and `0` for [`quad_skew`].
//!
//! # Example
//!
//! ```
//! use mesh_measure::{tri_aspect_ratio, tri_edge_ratio};
//!
//! let h = 3.0_f64.sqrt() / 2.0;
//! let equilateral = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.5, h, 0.0];
//! assert!((tri_edge_ratio(&equilateral).unwrap() - 1.0).abs() < 1e-12);
//! assert!((tri_aspect_ratio(&equilateral).unwrap() - 1.0).abs() < 1e-12);
//! ```

use nalgebra::Vector3;

use crate::error::{MeasureError, MeasureResult};

const DEGENERATE: f64 = 1e-15;

fn corners<const N: usize>(context: &'static str, coo: &[f64]) -> MeasureResult<[Vector3<f64>; N]> {
    MeasureError::check_len(context, coo.len(), 3 * N)?;
    Ok(std::array::from_fn(|i| {
        Vector3::new(coo[3 * i], coo[3 * i + 1], coo[3 * i + 2])
    }))
}

fn max_over_min(squared: &[f64]) -> f64 {
    let min = squared.iter().copied().fold(f64::INFINITY, f64::min);
    let max = squared.iter().copied().fold(0.0, f64::max);
    if min > DEGENERATE {
        (max / min).sqrt()
    } else {
        f64::MAX
    }
}

/// Cosine of the angle between the two lines joining opposite edge
/// midpoints of a quadrangle. 0 for a rectangle.
///
/// # Errors
///
/// Returns [`MeasureError::SizeMismatch`] for fewer than 12 values.
pub fn quad_skew(coo: &[f64]) -> MeasureResult<f64> {
    let [p0, p1, p2, p3] = corners::<4>("quad skew", coo)?;
    let pa0 = p1 + p2 - p0 - p3;
    let pa1 = p2 + p3 - p0 - p1;
    let (l0, l1) = (pa0.norm(), pa1.norm());
    if l0 < DEGENERATE || l1 < DEGENERATE {
        return Ok(0.0);
    }
    Ok((pa0 / l0).dot(&(pa1 / l1)))
}

/// Longest over shortest edge of a quadrangle.
///
/// # Errors
///
/// Returns [`MeasureError::SizeMismatch`] for fewer than 12 values.
pub fn quad_edge_ratio(coo: &[f64]) -> MeasureResult<f64> {
    let [p0, p1, p2, p3] = corners::<4>("quad edge ratio", coo)?;
    Ok(max_over_min(&[
        (p1 - p0).norm_squared(),
        (p2 - p1).norm_squared(),
        (p3 - p2).norm_squared(),
        (p0 - p3).norm_squared(),
    ]))
}

/// Aspect ratio of a quadrangle: half perimeter times the longest edge over
/// the sum of the corner cross products. 1 for a square.
///
/// # Errors
///
/// Returns [`MeasureError::SizeMismatch`] for fewer than 12 values.
pub fn quad_aspect_ratio(coo: &[f64]) -> MeasureResult<f64> {
    let [p0, p1, p2, p3] = corners::<4>("quad aspect ratio", coo)?;
    let (e0, e1, e2, e3) = (p1 - p0, p2 - p1, p3 - p2, p0 - p3);
    let (a, b, c, d) = (e0.norm(), e1.norm(), e2.norm(), e3.norm());
    let hm = a.max(b).max(c.max(d));
    let e = e0.cross(&e1).norm() + e2.cross(&e3).norm();
    if d > DEGENERATE && e > DEGENERATE {
        Ok(0.5 * (a + b + c + d) * hm / e)
    } else {
        Ok(f64::MAX)
    }
}

/// Warpage of a quadrangle: cube of the smallest cosine between the normals
/// at opposite corners. 1 for a planar convex quadrangle.
///
/// # Errors
///
/// Returns [`MeasureError::SizeMismatch`] for fewer than 12 values.
pub fn quad_warp(coo: &[f64]) -> MeasureResult<f64> {
    let [p0, p1, p2, p3] = corners::<4>("quad warp", coo)?;
    let (e0, e1, e2, e3) = (p1 - p0, p2 - p1, p3 - p2, p0 - p3);
    let normals = [e3.cross(&e0), e0.cross(&e1), e1.cross(&e2), e2.cross(&e3)];
    if normals.iter().any(|n| n.norm() < DEGENERATE) {
        return Ok(f64::MIN_POSITIVE);
    }
    let [n0, n1, n2, n3] = normals.map(|n| n.normalize());
    let warp = n0.dot(&n2).min(n1.dot(&n3));
    Ok(warp * warp * warp)
}

/// Longest over shortest edge of a triangle.
///
/// # Errors
///
/// Returns [`MeasureError::SizeMismatch`] for fewer than 9 values.
pub fn tri_edge_ratio(coo: &[f64]) -> MeasureResult<f64> {
    let [p0, p1, p2] = corners::<3>("tri edge ratio", coo)?;
    Ok(max_over_min(&[
        (p1 - p0).norm_squared(),
        (p2 - p1).norm_squared(),
        (p0 - p2).norm_squared(),
    ]))
}

/// Aspect ratio of a triangle, normalized to 1 for the equilateral one.
///
/// # Errors
///
/// Returns [`MeasureError::SizeMismatch`] for fewer than 9 values.
pub fn tri_aspect_ratio(coo: &[f64]) -> MeasureResult<f64> {
    let [p0, p1, p2] = corners::<3>("tri aspect ratio", coo)?;
    let (e0, e1, e2) = (p1 - p0, p2 - p1, p0 - p2);
    let (a, b, c) = (e0.norm(), e1.norm(), e2.norm());
    let hm = a.max(b).max(c);
    let d = e0.cross(&e1).norm();
    if d > DEGENERATE {
        Ok(3.0_f64.sqrt() / 6.0 * hm * (a + b + c) / d)
    } else {
        Ok(f64::MAX)
    }
}

/// Longest over shortest of the six edges of a tetrahedron.
///
/// # Errors
///
/// Returns [`MeasureError::SizeMismatch`] for fewer than 12 values.
pub fn tetra_edge_ratio(coo: &[f64]) -> MeasureResult<f64> {
    let [p0, p1, p2, p3] = corners::<4>("tetra edge ratio", coo)?;
    Ok(max_over_min(&[
        (p1 - p0).norm_squared(),
        (p2 - p1).norm_squared(),
        (p0 - p2).norm_squared(),
        (p3 - p0).norm_squared(),
        (p3 - p1).norm_squared(),
        (p3 - p2).norm_squared(),
    ]))
}

/// Aspect ratio of a tetrahedron, normalized to 1 for the regular one.
///
/// Flat tetrahedra (`|det| < 1e-15`) yield `f64::MAX`.
///
/// # Errors
///
/// Returns [`MeasureError::SizeMismatch`] for fewer than 12 values.
pub fn tetra_aspect_ratio(coo: &[f64]) -> MeasureResult<f64> {
    let [p0, p1, p2, p3] = corners::<4>("tetra aspect ratio", coo)?;
    let (ab, ac, ad) = (p1 - p0, p2 - p0, p3 - p0);
    let (bc, bd, cd) = (p2 - p1, p3 - p1, p3 - p2);
    let det = ab.dot(&ac.cross(&ad));
    if det.abs() < DEGENERATE {
        return Ok(f64::MAX);
    }
    let hm = [ab, bc, ac, ad, bd, cd]
        .iter()
        .map(Vector3::norm_squared)
        .fold(0.0, f64::max)
        .sqrt();
    let faces = ab.cross(&bc).norm() + ab.cross(&ad).norm() + ac.cross(&ad).norm() + bc.cross(&cd).norm();
    Ok(6.0_f64.sqrt() / 12.0 * hm * faces / det.abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SQUARE: [f64; 12] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0];
    const RECT: [f64; 12] = [0.0, 0.0, 0.0, 3.0, 0.0, 0.0, 3.0, 1.0, 0.0, 0.0, 1.0, 0.0];

    fn regular_tetra() -> [f64; 12] {
        let s = 1.0 / 8.0_f64.sqrt();
        [s, s, s, s, -s, -s, -s, s, -s, -s, -s, s]
    }

    #[test]
    fn test_square_is_ideal() {
        assert_relative_eq!(quad_skew(&SQUARE).unwrap(), 0.0);
        assert_relative_eq!(quad_edge_ratio(&SQUARE).unwrap(), 1.0);
        assert_relative_eq!(quad_aspect_ratio(&SQUARE).unwrap(), 1.0);
        assert_relative_eq!(quad_warp(&SQUARE).unwrap(), 1.0);
    }

    #[test]
    fn test_rectangle() {
        assert_relative_eq!(quad_edge_ratio(&RECT).unwrap(), 3.0);
        // 0.5 * 8 * 3 / (3 + 3)
        assert_relative_eq!(quad_aspect_ratio(&RECT).unwrap(), 2.0);
        assert_relative_eq!(quad_skew(&RECT).unwrap(), 0.0);
    }

    #[test]
    fn test_skewed_quad() {
        // parallelogram sheared by 45 degrees
        let q = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 2.0, 1.0, 0.0, 1.0, 1.0, 0.0];
        assert_relative_eq!(quad_skew(&q).unwrap(), 0.5_f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_warped_quad() {
        let q = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.5, 0.0, 1.0, 0.0];
        let w = quad_warp(&q).unwrap();
        assert!(w > 0.0 && w < 1.0);
    }

    #[test]
    fn test_degenerate_sentinels() {
        let collapsed = [0.0; 12];
        assert_eq!(quad_skew(&collapsed).unwrap(), 0.0);
        assert_eq!(quad_edge_ratio(&collapsed).unwrap(), f64::MAX);
        assert_eq!(quad_aspect_ratio(&collapsed).unwrap(), f64::MAX);
        assert_eq!(quad_warp(&collapsed).unwrap(), f64::MIN_POSITIVE);
        assert_eq!(tri_edge_ratio(&collapsed[..9]).unwrap(), f64::MAX);
        assert_eq!(tri_aspect_ratio(&collapsed[..9]).unwrap(), f64::MAX);
        assert_eq!(tetra_edge_ratio(&collapsed).unwrap(), f64::MAX);
        assert_eq!(tetra_aspect_ratio(&collapsed).unwrap(), f64::MAX);
    }

    #[test]
    fn test_flat_tetra_aspect_ratio() {
        let flat = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0];
        assert_eq!(tetra_aspect_ratio(&flat).unwrap(), f64::MAX);
        assert_relative_eq!(tetra_edge_ratio(&flat).unwrap(), 2.0_f64.sqrt());
    }

    #[test]
    fn test_regular_tetra() {
        let t = regular_tetra();
        assert_relative_eq!(tetra_edge_ratio(&t).unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(tetra_aspect_ratio(&t).unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_right_triangle() {
        let t = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        assert_relative_eq!(tri_edge_ratio(&t).unwrap(), 2.0_f64.sqrt());
        assert!(tri_aspect_ratio(&t).unwrap() > 1.0);
    }

    #[test]
    fn test_short_buffer() {
        assert!(quad_skew(&[0.0; 11]).is_err());
        assert!(tri_edge_ratio(&[0.0; 8]).is_err());
    }
}
