//! No-alloc linear Kalman filter engine for embedded and realtime control.
//!
//! Characteristics:
//! - No dynamic allocation: every working and scratch matrix is backed by a
//!   caller-provided `&mut [f64]` slice, size-checked once when the filter
//!   is constructed.
//! - `no_std` by default; the `std` feature only adds `log` tracing.
//! - A filter value only exists once its storage has passed validation, so
//!   there is no separate "initialized" flag to forget to check.
//!
//! Throughout the library, `n` is the number of states, `k` the number of
//! measurements, and `m` the number of controls, matching the data model's
//! naming.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(debug_assertions)]
use approx::relative_eq;

// Without std, `trace!` is a no-op so call sites don't need feature gates of
// their own.
#[cfg(not(feature = "std"))]
macro_rules! trace {
    ($e:expr) => {{}};
    ($e:expr, $($es:expr),+) => {{}};
}
#[cfg(not(feature = "std"))]
pub(crate) use trace;

mod config;
mod error;
mod filter;
mod matrix;
mod state_and_covariance;
mod storage;

pub use config::KalmanConfig;
pub use error::{Error, ErrorKind};
pub use filter::KalmanFilter;
pub use matrix::{MatrixView, MatrixViewMut};
pub use state_and_covariance::StateAndCovariance;
pub use storage::FilterStorage;

#[cfg(feature = "std")]
pub use storage::FilterStorageBuf;

/// Runtime check (debug builds only) that a covariance matrix stayed
/// symmetric to within floating-point tolerance after an update.
#[cfg_attr(not(debug_assertions), allow(unused_variables))]
pub(crate) fn debug_assert_symmetric(p: MatrixView<'_>) {
    #[cfg(debug_assertions)]
    {
        for i in 0..p.rows() {
            for j in 0..p.cols() {
                debug_assert!(
                    relative_eq!(p.get(i, j), p.get(j, i), max_relative = 1e-5),
                    "covariance matrix is not symmetric at ({}, {})",
                    i,
                    j
                );
            }
        }
    }
}
