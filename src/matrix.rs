//! Shape-checked dense matrix arithmetic over borrowed `f64` slices.
//!
//! Every view here borrows its backing storage rather than owning it, so the
//! whole module works without an allocator. Shapes are checked once when a
//! view is constructed; the arithmetic functions below trust the shapes they
//! are given and only `debug_assert!` the relationships between them, the
//! same way the filter core trusts the shapes it derived during validation.

use crate::error::{Error, ErrorKind};

/// A read-only view over a row-major `rows x cols` matrix.
#[derive(Clone, Copy)]
pub struct MatrixView<'a> {
    rows: usize,
    cols: usize,
    data: &'a [f64],
}

impl<'a> MatrixView<'a> {
    /// Builds a view over `data`, which must contain exactly `rows * cols` elements.
    pub fn new(rows: usize, cols: usize, data: &'a [f64]) -> Result<Self, Error> {
        if data.len() != rows * cols {
            return Err(Error::new(
                ErrorKind::InvalidDimensions,
                "matrix data length does not match rows * cols",
            ));
        }
        Ok(Self { rows, cols, data })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        self.data
    }
}

/// A mutable view over a row-major `rows x cols` matrix.
pub struct MatrixViewMut<'a> {
    rows: usize,
    cols: usize,
    data: &'a mut [f64],
}

impl<'a> MatrixViewMut<'a> {
    /// Builds a view over `data`, which must contain exactly `rows * cols` elements.
    pub fn new(rows: usize, cols: usize, data: &'a mut [f64]) -> Result<Self, Error> {
        if data.len() != rows * cols {
            return Err(Error::new(
                ErrorKind::InvalidDimensions,
                "matrix data length does not match rows * cols",
            ));
        }
        Ok(Self { rows, cols, data })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    #[inline]
    pub fn as_view(&self) -> MatrixView<'_> {
        MatrixView {
            rows: self.rows,
            cols: self.cols,
            data: self.data,
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        self.data
    }
}

/// `c <- a * b`. `a` is `p x q`, `b` is `q x r`, `c` is `p x r`.
///
/// `c` is a distinct buffer from `a` and `b` (the borrow checker enforces
/// this at the call site), so no staging buffer is needed.
pub fn mul(a: MatrixView, b: MatrixView, c: &mut MatrixViewMut) {
    debug_assert_eq!(a.cols(), b.rows());
    debug_assert_eq!(c.rows(), a.rows());
    debug_assert_eq!(c.cols(), b.cols());
    for i in 0..c.rows() {
        for j in 0..c.cols() {
            let mut sum = 0.0;
            for kk in 0..a.cols() {
                sum += a.get(i, kk) * b.get(kk, j);
            }
            c.set(i, j, sum);
        }
    }
}

/// `bc <- a * bc`, i.e. `c ← a·b` where the destination aliases the right
/// operand. `a` is `q x q`, `bc` is `q x r`.
///
/// Column `j` of the product depends only on column `j` of `bc`, so each
/// column can be staged into `aux` (at least `q` elements), overwritten in
/// place, and moved to the next column without disturbing any column still
/// to be processed.
pub fn mul_assign_right(a: MatrixView, bc: &mut MatrixViewMut, aux: &mut [f64]) {
    let q = a.cols();
    debug_assert_eq!(a.rows(), q);
    debug_assert_eq!(bc.rows(), q);
    debug_assert!(aux.len() >= q);
    let r = bc.cols();
    for j in 0..r {
        for row in 0..q {
            aux[row] = bc.get(row, j);
        }
        for i in 0..q {
            let mut sum = 0.0;
            for kk in 0..q {
                sum += a.get(i, kk) * aux[kk];
            }
            bc.set(i, j, sum);
        }
    }
}

/// `c <- a * b^T`. `a` is `p x q`, `b` is `r x q`, `c` is `p x r`.
pub fn mul_transb(a: MatrixView, b: MatrixView, c: &mut MatrixViewMut) {
    debug_assert_eq!(a.cols(), b.cols());
    debug_assert_eq!(c.rows(), a.rows());
    debug_assert_eq!(c.cols(), b.rows());
    for i in 0..c.rows() {
        for j in 0..c.cols() {
            let mut sum = 0.0;
            for kk in 0..a.cols() {
                sum += a.get(i, kk) * b.get(j, kk);
            }
            c.set(i, j, sum);
        }
    }
}

/// `c <- a^T * b`. `a` is `q x p`, `b` is `q x r`, `c` is `p x r`.
pub fn mul_transa(a: MatrixView, b: MatrixView, c: &mut MatrixViewMut) {
    debug_assert_eq!(a.rows(), b.rows());
    debug_assert_eq!(c.rows(), a.cols());
    debug_assert_eq!(c.cols(), b.cols());
    for i in 0..c.rows() {
        for j in 0..c.cols() {
            let mut sum = 0.0;
            for kk in 0..a.rows() {
                sum += a.get(kk, i) * b.get(kk, j);
            }
            c.set(i, j, sum);
        }
    }
}

/// `ac <- ac * b^T`, i.e. `c ← a·bᵀ` where the destination aliases the left
/// operand. `ac` is `q x q`, `b` is `q x q`.
///
/// Row `i` of the product depends only on row `i` of `ac`, so each row is
/// staged into `aux` (at least `q` elements) before being overwritten.
pub fn mul_transb_assign_left(ac: &mut MatrixViewMut, b: MatrixView, aux: &mut [f64]) {
    let q = ac.cols();
    debug_assert_eq!(ac.rows(), q);
    debug_assert_eq!(b.rows(), q);
    debug_assert_eq!(b.cols(), q);
    debug_assert!(aux.len() >= q);
    for i in 0..q {
        for col in 0..q {
            aux[col] = ac.get(i, col);
        }
        for j in 0..q {
            let mut sum = 0.0;
            for kk in 0..q {
                sum += aux[kk] * b.get(j, kk);
            }
            ac.set(i, j, sum);
        }
    }
}

/// `a <- a + b`, same shape.
pub fn add_inplace(a: &mut MatrixViewMut, b: MatrixView) {
    debug_assert_eq!(a.rows(), b.rows());
    debug_assert_eq!(a.cols(), b.cols());
    for i in 0..a.rows() {
        for j in 0..a.cols() {
            let sum = a.get(i, j) + b.get(i, j);
            a.set(i, j, sum);
        }
    }
}

/// `c <- a - b`. `c` is a distinct buffer from `a` and `b`.
pub fn sub(a: MatrixView, b: MatrixView, c: &mut MatrixViewMut) {
    debug_assert_eq!(a.rows(), b.rows());
    debug_assert_eq!(a.cols(), b.cols());
    debug_assert_eq!(c.rows(), a.rows());
    debug_assert_eq!(c.cols(), a.cols());
    for i in 0..c.rows() {
        for j in 0..c.cols() {
            c.set(i, j, a.get(i, j) - b.get(i, j));
        }
    }
}

/// `b <- a - b`, the minuend-first in-place form used for the innovation.
pub fn sub_inplace_b(a: MatrixView, b: &mut MatrixViewMut) {
    debug_assert_eq!(a.rows(), b.rows());
    debug_assert_eq!(a.cols(), b.cols());
    for i in 0..b.rows() {
        for j in 0..b.cols() {
            let value = a.get(i, j) - b.get(i, j);
            b.set(i, j, value);
        }
    }
}

/// `a <- a - b`, the destination-first in-place form used for the covariance update.
pub fn sub_inplace_a(a: &mut MatrixViewMut, b: MatrixView) {
    debug_assert_eq!(a.rows(), b.rows());
    debug_assert_eq!(a.cols(), b.cols());
    for i in 0..a.rows() {
        for j in 0..a.cols() {
            let value = a.get(i, j) - b.get(i, j);
            a.set(i, j, value);
        }
    }
}

/// Elementwise copy; shapes must match.
pub fn copy(src: MatrixView, dst: &mut MatrixViewMut) {
    debug_assert_eq!(src.rows(), dst.rows());
    debug_assert_eq!(src.cols(), dst.cols());
    for i in 0..dst.rows() {
        for j in 0..dst.cols() {
            dst.set(i, j, src.get(i, j));
        }
    }
}

/// In-place lower Cholesky factorization: overwrites the lower triangle of
/// `s` (assumed symmetric positive-definite) with its factor `L` such that
/// `L * L^T == s`, and zeroes the upper triangle.
///
/// Returns [`ErrorKind::NotPositiveDefinite`] if a non-positive pivot is
/// encountered, rather than producing a result with unspecified meaning.
pub fn cholesky_decompose_lower(s: &mut MatrixViewMut) -> Result<(), Error> {
    let n = s.rows();
    debug_assert_eq!(s.cols(), n);
    for j in 0..n {
        let mut sum = s.get(j, j);
        for p in 0..j {
            sum -= s.get(j, p) * s.get(j, p);
        }
        if sum <= 0.0 {
            return Err(Error::new(
                ErrorKind::NotPositiveDefinite,
                "innovation covariance is not positive-definite",
            ));
        }
        let diag = sum.sqrt();
        s.set(j, j, diag);
        for i in (j + 1)..n {
            let mut sum2 = s.get(i, j);
            for p in 0..j {
                sum2 -= s.get(i, p) * s.get(j, p);
            }
            s.set(i, j, sum2 / diag);
        }
    }
    for i in 0..n {
        for j in (i + 1)..n {
            s.set(i, j, 0.0);
        }
    }
    Ok(())
}

/// `linv <- l^-1`, assuming `l` is lower-triangular with a non-zero diagonal.
pub fn invert_lower(l: MatrixView, linv: &mut MatrixViewMut) {
    let n = l.rows();
    debug_assert_eq!(l.cols(), n);
    debug_assert_eq!(linv.rows(), n);
    debug_assert_eq!(linv.cols(), n);
    for i in 0..n {
        for j in 0..n {
            linv.set(i, j, 0.0);
        }
    }
    for i in 0..n {
        linv.set(i, i, 1.0 / l.get(i, i));
        for j in 0..i {
            let mut sum = 0.0;
            for kk in j..i {
                sum += l.get(i, kk) * linv.get(kk, j);
            }
            linv.set(i, j, -sum / l.get(i, i));
        }
    }
}
