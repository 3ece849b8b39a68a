//! Packed storage and trace kernels for Hermitian spectral matrices.
//!
//! Spectral density matrices and periodograms are Hermitian, so per-frequency
//! values are stored as the lower triangle in row-major order (`d*(d+1)/2`
//! entries) and expanded into full `nalgebra` matrices only where a solve is
//! about to happen. The trace helpers below return real parts directly; the
//! quantities they feed (likelihood value, gradient, Hessian) are real by
//! construction.

use nalgebra::DMatrix;
use ndarray::ArrayView1;
use num_complex::Complex64;

/// Number of packed entries for a `dim x dim` Hermitian matrix.
pub(crate) fn compact_len(dim: usize) -> usize {
    dim * (dim + 1) / 2
}

/// Packed offset of entry `(row, col)` with `row >= col`.
pub(crate) fn compact_index(row: usize, col: usize) -> usize {
    debug_assert!(row >= col, "packed storage holds the lower triangle");
    row * (row + 1) / 2 + col
}

/// Expand a packed lower triangle into a full Hermitian matrix.
///
/// `out` must already be `dim x dim`; the strict upper triangle is filled
/// with conjugates of the packed entries. Slices convert with `.into()`.
pub(crate) fn expand_hermitian(
    packed: ArrayView1<'_, Complex64>,
    dim: usize,
    out: &mut DMatrix<Complex64>,
) {
    for row in 0..dim {
        for col in 0..=row {
            let entry = packed[compact_index(row, col)];
            out[(row, col)] = entry;
            if row != col {
                out[(col, row)] = entry.conj();
            }
        }
    }
}

/// Re tr(A).
pub(crate) fn trace_re(mat: &DMatrix<Complex64>) -> f64 {
    (0..mat.nrows()).map(|i| mat[(i, i)].re).sum()
}

/// Re tr(AB) without forming the product.
pub(crate) fn trace_prod_re(a: &DMatrix<Complex64>, b: &DMatrix<Complex64>) -> f64 {
    let dim = a.nrows();
    let mut acc = 0.0;
    for i in 0..dim {
        for j in 0..dim {
            acc += (a[(i, j)] * b[(j, i)]).re;
        }
    }
    acc
}

/// Re tr(ABC) without forming intermediate products.
pub(crate) fn trace_prod3_re(
    a: &DMatrix<Complex64>,
    b: &DMatrix<Complex64>,
    c: &DMatrix<Complex64>,
) -> f64 {
    let dim = a.nrows();
    let mut acc = 0.0;
    for i in 0..dim {
        for k in 0..dim {
            let mut ab = Complex64::new(0.0, 0.0);
            for j in 0..dim {
                ab += a[(i, j)] * b[(j, k)];
            }
            acc += (ab * c[(k, i)]).re;
        }
    }
    acc
}
