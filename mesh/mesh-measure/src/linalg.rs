//! Small dense linear algebra kernel.
//!
//! BLAS-1 style vector routines and the LINPACK LU factorization/inversion
//! pair, on column-major storage with a leading dimension `lda`. Increments
//! may be negative: the first visited element is then at `(n - 1) * |inc|`,
//! as in the reference BLAS.
//!
//! Every routine checks that its buffers are long enough for the requested
//! shape and stride and returns [`MeasureError::SizeMismatch`] otherwise.

use tracing::warn;

use crate::error::{MeasureError, MeasureResult};

/// Result of [`dgefa`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LuFactor {
    /// Row interchanged with row `k` at elimination step `k`.
    pub pivots: Vec<usize>,
    /// First elimination step with a zero pivot, if any.
    ///
    /// The factorization itself is complete, but [`dgedi`] divides by zero
    /// when this is set.
    pub singular_at: Option<usize>,
}

fn strided_len(n: usize, inc: isize) -> usize {
    if n == 0 { 0 } else { 1 + (n - 1) * inc.unsigned_abs() }
}

fn positions(n: usize, inc: isize) -> impl Iterator<Item = usize> {
    let step = inc.unsigned_abs();
    let first = if inc >= 0 { 0 } else { n.saturating_sub(1) * step };
    (0..n).map(move |i| if inc >= 0 { first + i * step } else { first - i * step })
}

/// Dot product of two strided vectors.
///
/// # Errors
///
/// Returns [`MeasureError::SizeMismatch`] if a buffer is too short.
///
/// # Example
///
/// ```
/// use mesh_measure::ddot;
///
/// let x = [1.0, 2.0, 3.0];
/// let y = [4.0, 0.0, 5.0, 0.0, 6.0];
/// assert_eq!(ddot(3, &x, 1, &y, 2).unwrap(), 32.0);
/// ```
pub fn ddot(n: usize, dx: &[f64], incx: isize, dy: &[f64], incy: isize) -> MeasureResult<f64> {
    MeasureError::check_len("ddot x", dx.len(), strided_len(n, incx))?;
    MeasureError::check_len("ddot y", dy.len(), strided_len(n, incy))?;
    if incx == 1 && incy == 1 {
        return Ok(dx[..n].iter().zip(&dy[..n]).map(|(a, b)| a * b).sum());
    }
    Ok(positions(n, incx)
        .zip(positions(n, incy))
        .map(|(ix, iy)| dx[ix] * dy[iy])
        .sum())
}

/// Scale a strided vector in place: `x = alpha * x`.
///
/// # Errors
///
/// Returns [`MeasureError::SizeMismatch`] if `x` is too short.
pub fn dscal(n: usize, alpha: f64, x: &mut [f64], incx: isize) -> MeasureResult<()> {
    MeasureError::check_len("dscal x", x.len(), strided_len(n, incx))?;
    for ix in positions(n, incx) {
        x[ix] *= alpha;
    }
    Ok(())
}

/// Constant times a vector plus a vector: `y = y + alpha * x`.
///
/// Does nothing when `alpha == 0`.
///
/// # Errors
///
/// Returns [`MeasureError::SizeMismatch`] if a buffer is too short.
pub fn daxpy(
    n: usize,
    alpha: f64,
    dx: &[f64],
    incx: isize,
    dy: &mut [f64],
    incy: isize,
) -> MeasureResult<()> {
    MeasureError::check_len("daxpy x", dx.len(), strided_len(n, incx))?;
    MeasureError::check_len("daxpy y", dy.len(), strided_len(n, incy))?;
    #[allow(clippy::float_cmp)]
    if alpha == 0.0 {
        return Ok(());
    }
    for (ix, iy) in positions(n, incx).zip(positions(n, incy)) {
        dy[iy] += alpha * dx[ix];
    }
    Ok(())
}

/// Interchange two strided vectors.
///
/// # Errors
///
/// Returns [`MeasureError::SizeMismatch`] if a buffer is too short.
pub fn dswap(n: usize, x: &mut [f64], incx: isize, y: &mut [f64], incy: isize) -> MeasureResult<()> {
    MeasureError::check_len("dswap x", x.len(), strided_len(n, incx))?;
    MeasureError::check_len("dswap y", y.len(), strided_len(n, incy))?;
    if incx == 1 && incy == 1 {
        x[..n].swap_with_slice(&mut y[..n]);
        return Ok(());
    }
    for (ix, iy) in positions(n, incx).zip(positions(n, incy)) {
        std::mem::swap(&mut x[ix], &mut y[iy]);
    }
    Ok(())
}

/// 0-based position of the element of largest absolute value.
///
/// Returns `None` when `n < 1` or `incx <= 0`. Ties keep the first one.
///
/// # Example
///
/// ```
/// use mesh_measure::idamax;
///
/// assert_eq!(idamax(4, &[1.0, -7.0, 3.0, 7.0], 1), Some(1));
/// assert_eq!(idamax(0, &[], 1), None);
/// ```
#[must_use]
pub fn idamax(n: usize, dx: &[f64], incx: isize) -> Option<usize> {
    if n < 1 || incx <= 0 || dx.len() < strided_len(n, incx) {
        return None;
    }
    let mut best = 0;
    let mut dmax = dx[0].abs();
    for (i, ix) in positions(n, incx).enumerate().skip(1) {
        if dx[ix].abs() > dmax {
            best = i;
            dmax = dx[ix].abs();
        }
    }
    Some(best)
}

fn check_square(context: &'static str, a: &[f64], lda: usize, n: usize) -> MeasureResult<()> {
    if lda < n {
        return Err(MeasureError::invalid_params(format!(
            "{context}: leading dimension {lda} smaller than order {n}"
        )));
    }
    let needed = if n == 0 { 0 } else { lda * (n - 1) + n };
    MeasureError::check_len(context, a.len(), needed)
}

/// LU factorization with partial pivoting (LINPACK `DGEFA`).
///
/// On return `a` holds the upper triangular factor and the multipliers of
/// the unit lower triangular one.
///
/// # Errors
///
/// Returns [`MeasureError::SizeMismatch`] if `a` is too short for an
/// `n x n` matrix with leading dimension `lda`, and
/// [`MeasureError::InvalidParams`] if `lda < n`.
#[allow(clippy::float_cmp)] // exact zero pivot test
pub fn dgefa(a: &mut [f64], lda: usize, n: usize) -> MeasureResult<LuFactor> {
    check_square("dgefa", a, lda, n)?;
    let mut pivots = vec![0; n];
    let mut singular_at = None;
    if n == 0 {
        return Ok(LuFactor {
            pivots,
            singular_at,
        });
    }
    for k in 0..n - 1 {
        let col_k = k * lda;
        let l = idamax(n - k, &a[k + col_k..], 1).unwrap_or(0) + k;
        pivots[k] = l;
        if a[l + col_k] == 0.0 {
            singular_at.get_or_insert(k);
            continue;
        }
        if l != k {
            a.swap(l + col_k, k + col_k);
        }
        let t = -1.0 / a[k + col_k];
        dscal(n - k - 1, t, &mut a[k + 1 + col_k..], 1)?;
        for j in k + 1..n {
            let col_j = j * lda;
            let t = a[l + col_j];
            if l != k {
                a[l + col_j] = a[k + col_j];
                a[k + col_j] = t;
            }
            let (left, right) = a.split_at_mut(col_j);
            daxpy(n - k - 1, t, &left[k + 1 + col_k..], 1, &mut right[k + 1..], 1)?;
        }
    }
    pivots[n - 1] = n - 1;
    if a[n - 1 + (n - 1) * lda] == 0.0 {
        singular_at.get_or_insert(n - 1);
    }
    Ok(LuFactor {
        pivots,
        singular_at,
    })
}

/// Inverse of a matrix factored by [`dgefa`] (LINPACK `DGEDI`, job 1).
///
/// A zero on the diagonal of the factor propagates infinities and NaNs into
/// the result instead of failing.
///
/// # Errors
///
/// Returns [`MeasureError::SizeMismatch`] if `a` or `pivots` is too short.
pub fn dgedi(a: &mut [f64], lda: usize, n: usize, pivots: &[usize]) -> MeasureResult<()> {
    check_square("dgedi", a, lda, n)?;
    MeasureError::check_len("dgedi pivots", pivots.len(), n)?;
    // inverse(U)
    for k in 0..n {
        let kk = k + k * lda;
        a[kk] = 1.0 / a[kk];
        let t = -a[kk];
        dscal(k, t, &mut a[k * lda..], 1)?;
        for j in k + 1..n {
            let t = a[k + j * lda];
            a[k + j * lda] = 0.0;
            let (left, right) = a.split_at_mut(j * lda);
            daxpy(k + 1, t, &left[k * lda..], 1, right, 1)?;
        }
    }
    // inverse(U) * inverse(L)
    let mut work = vec![0.0; n];
    for k in (0..n.saturating_sub(1)).rev() {
        for i in k + 1..n {
            work[i] = a[i + k * lda];
            a[i + k * lda] = 0.0;
        }
        for j in k + 1..n {
            let (left, right) = a.split_at_mut(j * lda);
            daxpy(n, work[j], right, 1, &mut left[k * lda..], 1)?;
        }
        let l = pivots[k];
        if l != k {
            let (left, right) = a.split_at_mut(l * lda);
            dswap(n, &mut left[k * lda..], 1, right, 1)?;
        }
    }
    Ok(())
}

/// Product `C = A * B` of row-major matrices `A (n1 x p1)` and `B (n2 x p2)`.
///
/// # Errors
///
/// Returns [`MeasureError::DimensionMismatch`] if `p1 != n2` and
/// [`MeasureError::SizeMismatch`] if a buffer is too short.
///
/// # Example
///
/// ```
/// use mesh_measure::matrix_product;
///
/// let a = [1.0, 2.0, 3.0, 4.0];
/// let b = [5.0, 6.0];
/// assert_eq!(matrix_product(&a, 2, 2, &b, 2, 1).unwrap(), vec![17.0, 39.0]);
/// assert!(matrix_product(&a, 2, 2, &b, 1, 2).is_err());
/// ```
pub fn matrix_product(
    a: &[f64],
    n1: usize,
    p1: usize,
    b: &[f64],
    n2: usize,
    p2: usize,
) -> MeasureResult<Vec<f64>> {
    if p1 != n2 {
        return Err(MeasureError::DimensionMismatch { cols: p1, rows: n2 });
    }
    MeasureError::check_len("matrix product A", a.len(), n1 * p1)?;
    MeasureError::check_len("matrix product B", b.len(), n2 * p2)?;
    let mut c = vec![0.0; n1 * p2];
    for i in 0..n1 {
        for j in 0..p2 {
            c[i * p2 + j] = (0..p1).map(|k| a[i * p1 + k] * b[k * p2 + j]).sum();
        }
    }
    Ok(c)
}

/// Inverse of an `n x n` matrix.
///
/// The storage order does not matter: the inverse of the transpose is the
/// transpose of the inverse. A singular matrix yields infinities and NaNs;
/// callers needing a guarantee must check invertibility themselves.
///
/// # Errors
///
/// Returns [`MeasureError::SizeMismatch`] if `a` holds fewer than `n * n`
/// values.
///
/// # Example
///
/// ```
/// use mesh_measure::inverse_matrix;
///
/// let inv = inverse_matrix(&[4.0, 7.0, 2.0, 6.0], 2).unwrap();
/// let expected = [0.6, -0.7, -0.2, 0.4];
/// for (a, b) in inv.iter().zip(expected) {
///     assert!((a - b).abs() < 1e-12);
/// }
/// ```
pub fn inverse_matrix(a: &[f64], n: usize) -> MeasureResult<Vec<f64>> {
    MeasureError::check_len("inverse matrix", a.len(), n * n)?;
    let mut inv = a[..n * n].to_vec();
    let lu = dgefa(&mut inv, n, n)?;
    if let Some(k) = lu.singular_at {
        warn!(order = n, step = k, "inverting a singular matrix");
    }
    dgedi(&mut inv, n, n, &lu.pivots)?;
    Ok(inv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ddot_negative_increment() {
        let x = [1.0, 2.0, 3.0];
        let y = [1.0, 10.0, 100.0];
        // x traversed forwards, y backwards
        assert_relative_eq!(ddot(3, &x, 1, &y, -1).unwrap(), 100.0 + 20.0 + 3.0);
        assert_relative_eq!(ddot(0, &[], 1, &[], 1).unwrap(), 0.0);
        assert!(ddot(3, &x, 2, &y, 1).is_err());
    }

    #[test]
    fn test_dscal_strided() {
        let mut x = [1.0, 1.0, 1.0, 1.0];
        dscal(2, 3.0, &mut x, 2).unwrap();
        assert_eq!(x, [3.0, 1.0, 3.0, 1.0]);
    }

    #[test]
    fn test_daxpy_zero_alpha_is_noop() {
        let mut y = [1.0, 2.0];
        daxpy(2, 0.0, &[5.0, 5.0], 1, &mut y, 1).unwrap();
        assert_eq!(y, [1.0, 2.0]);
        daxpy(2, 2.0, &[5.0, 5.0], 1, &mut y, 1).unwrap();
        assert_eq!(y, [11.0, 12.0]);
    }

    #[test]
    fn test_dswap_strided_swaps_both_ways() {
        let mut x = [1.0, 0.0, 2.0];
        let mut y = [7.0, 8.0];
        dswap(2, &mut x, 2, &mut y, 1).unwrap();
        assert_eq!(x, [7.0, 0.0, 8.0]);
        assert_eq!(y, [1.0, 2.0]);
    }

    #[test]
    fn test_idamax_strided() {
        assert_eq!(idamax(3, &[1.0, 100.0, -5.0, 100.0, 2.0], 2), Some(1));
        assert_eq!(idamax(3, &[1.0, 2.0, 3.0], -1), None);
        assert_eq!(idamax(1, &[-4.0], 1), Some(0));
    }

    #[test]
    fn test_dgefa_reports_singular() {
        let mut a = [1.0, 2.0, 2.0, 4.0];
        let lu = dgefa(&mut a, 2, 2).unwrap();
        assert_eq!(lu.singular_at, Some(1));

        let mut b = [0.0, 0.0, 0.0, 1.0];
        assert_eq!(dgefa(&mut b, 2, 2).unwrap().singular_at, Some(0));
    }

    #[test]
    fn test_inverse_3x3() {
        let a = [2.0, 0.0, 1.0, 1.0, 3.0, 2.0, 1.0, 1.0, 1.0];
        let inv = inverse_matrix(&a, 3).unwrap();
        let id = matrix_product(&a, 3, 3, &inv, 3, 3).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(id[i * 3 + j], expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_inverse_needs_pivoting() {
        let a = [0.0, 1.0, 1.0, 0.0];
        let inv = inverse_matrix(&a, 2).unwrap();
        assert_eq!(inv, vec![0.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_inverse_singular_propagates_non_finite() {
        let inv = inverse_matrix(&[1.0, 2.0, 2.0, 4.0], 2).unwrap();
        assert!(inv.iter().any(|v| !v.is_finite()));
    }

    #[test]
    fn test_inverse_short_buffer() {
        assert!(matches!(
            inverse_matrix(&[1.0, 2.0], 2),
            Err(MeasureError::SizeMismatch { .. })
        ));
    }
}
