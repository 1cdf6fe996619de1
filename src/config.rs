//! Configuration validation: derives the filter's dimensions from the
//! supplied matrices and checks every declared shape is internally
//! consistent before a [`crate::KalmanFilter`] can be built over it.

use crate::error::{Error, ErrorKind};
use crate::matrix::MatrixView;

fn invalid(context: &'static str) -> Error {
    Error::new(ErrorKind::InvalidDimensions, context)
}

/// An immutable bundle of the matrices that define a linear system: state
/// transition, process noise, measurement model, and measurement noise,
/// plus an optional control input matrix.
///
/// Dimensions are derived once here: `n` from `x_init`'s rows, `k` from
/// `h`'s rows, `m` from `b`'s columns (zero if `b` is absent).
pub struct KalmanConfig<'a> {
    pub(crate) x_init: MatrixView<'a>,
    pub(crate) f: MatrixView<'a>,
    pub(crate) b: Option<MatrixView<'a>>,
    pub(crate) q: MatrixView<'a>,
    pub(crate) p_init: MatrixView<'a>,
    pub(crate) h: MatrixView<'a>,
    pub(crate) r: MatrixView<'a>,
    n: usize,
    k: usize,
    m: usize,
}

impl<'a> KalmanConfig<'a> {
    /// Validates the shape relationships spelled out in the data model and
    /// returns a bound configuration, or the first `InvalidDimensions`
    /// violation found.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        x_init: MatrixView<'a>,
        f: MatrixView<'a>,
        b: Option<MatrixView<'a>>,
        q: MatrixView<'a>,
        p_init: MatrixView<'a>,
        h: MatrixView<'a>,
        r: MatrixView<'a>,
    ) -> Result<Self, Error> {
        if x_init.cols() != 1 {
            return Err(invalid("X_init must have exactly one column"));
        }
        let n = x_init.rows();

        if f.rows() != n || f.cols() != n {
            return Err(invalid("F must be n x n"));
        }
        if p_init.rows() != n || p_init.cols() != n {
            return Err(invalid("P_init must be n x n"));
        }
        if q.rows() != n || q.cols() != n {
            return Err(invalid("Q must be n x n"));
        }
        if h.cols() != n {
            return Err(invalid("H must have n columns"));
        }
        let k = h.rows();
        if r.rows() != k || r.cols() != k {
            return Err(invalid("R must be k x k"));
        }

        let m = match b {
            Some(b) => {
                if b.rows() != n {
                    return Err(invalid("B must have n rows"));
                }
                b.cols()
            }
            None => 0,
        };

        Ok(Self {
            x_init,
            f,
            b,
            q,
            p_init,
            h,
            r,
            n,
            k,
            m,
        })
    }

    /// `n`: the number of states, derived from `X_init`'s row count.
    pub fn num_states(&self) -> usize {
        self.n
    }

    /// `k`: the number of measurements, derived from `H`'s row count.
    pub fn num_measurements(&self) -> usize {
        self.k
    }

    /// `m`: the number of controls, derived from `B`'s column count, or zero
    /// if no control matrix was supplied.
    pub fn num_controls(&self) -> usize {
        self.m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(rows: usize, cols: usize, data: &[f64]) -> MatrixView<'_> {
        MatrixView::new(rows, cols, data).unwrap()
    }

    #[test]
    fn derives_dimensions() {
        let x_init = view(2, 1, &[3.0, 4.0]);
        let f = view(2, 2, &[1.0, 0.001, 0.0, 1.0]);
        let p_init = view(2, 2, &[0.0, 0.0, 0.0, 0.0]);
        let q = view(2, 2, &[1.0, 0.0, 0.0, 1.0]);
        let h = view(1, 2, &[1.0, 0.0]);
        let r = view(1, 1, &[1.0]);

        let config = KalmanConfig::new(x_init, f, None, q, p_init, h, r).unwrap();
        assert_eq!(config.num_states(), 2);
        assert_eq!(config.num_measurements(), 1);
        assert_eq!(config.num_controls(), 0);
    }

    #[test]
    fn rejects_non_square_f() {
        let x_init = view(2, 1, &[3.0, 4.0]);
        let f = view(1, 2, &[1.0, 0.001]);
        let p_init = view(2, 2, &[0.0, 0.0, 0.0, 0.0]);
        let q = view(2, 2, &[1.0, 0.0, 0.0, 1.0]);
        let h = view(1, 2, &[1.0, 0.0]);
        let r = view(1, 1, &[1.0]);

        let err = KalmanConfig::new(x_init, f, None, q, p_init, h, r).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidDimensions);
    }

    #[test]
    fn derives_control_dimension() {
        let x_init = view(2, 1, &[3.0, 4.0]);
        let f = view(2, 2, &[1.0, 0.001, 0.0, 1.0]);
        let p_init = view(2, 2, &[0.0, 0.0, 0.0, 0.0]);
        let q = view(2, 2, &[1.0, 0.0, 0.0, 1.0]);
        let h = view(1, 2, &[1.0, 0.0]);
        let r = view(1, 1, &[1.0]);
        let b = view(2, 2, &[1.0, 1.0, 1.0, 1.0]);

        let config = KalmanConfig::new(x_init, f, Some(b), q, p_init, h, r).unwrap();
        assert_eq!(config.num_controls(), 2);
    }
}
