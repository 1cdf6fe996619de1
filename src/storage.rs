//! Storage descriptors: the caller-owned scratch and working memory the
//! filter is bound to at construction time and never reallocates.
//!
//! A storage descriptor in the abstract spec is a `(capacity, region)` pair,
//! validated for sufficiency once. In Rust that collapses to a plain
//! `&mut [f64]`: a reference can't be null, and `slice.len()` already is the
//! capacity.

use crate::error::{Error, ErrorKind};

/// The full set of caller-provided working and scratch buffers a
/// [`crate::KalmanFilter`] needs, named after the role each plays in
/// predict/update.
///
/// `temp_bu` is only read when the configuration declares a control matrix
/// (`num_controls() > 0`); pass an empty slice otherwise.
pub struct FilterStorage<'a> {
    pub x: &'a mut [f64],
    pub p: &'a mut [f64],
    pub temp_x_hat: &'a mut [f64],
    pub temp_bu: &'a mut [f64],
    pub temp_measurement: &'a mut [f64],
    pub p_ht: &'a mut [f64],
    pub y: &'a mut [f64],
    pub s: &'a mut [f64],
    pub s_inv: &'a mut [f64],
    pub k_gain: &'a mut [f64],
    pub k_h: &'a mut [f64],
    pub k_h_p: &'a mut [f64],
}

pub(crate) fn require(slice: &[f64], min: usize, label: &'static str) -> Result<(), Error> {
    if slice.len() < min {
        return Err(Error::new(ErrorKind::StorageTooSmall, label));
    }
    Ok(())
}

/// Owned, heap-backed storage for a filter of given dimensions, for tests
/// and for callers that don't need the `no_std` guarantee. Not used by the
/// filter core itself; the core only ever sees borrowed [`FilterStorage`].
#[cfg(feature = "std")]
pub struct FilterStorageBuf {
    x: Vec<f64>,
    p: Vec<f64>,
    temp_x_hat: Vec<f64>,
    temp_bu: Vec<f64>,
    temp_measurement: Vec<f64>,
    p_ht: Vec<f64>,
    y: Vec<f64>,
    s: Vec<f64>,
    s_inv: Vec<f64>,
    k_gain: Vec<f64>,
    k_h: Vec<f64>,
    k_h_p: Vec<f64>,
}

#[cfg(feature = "std")]
impl FilterStorageBuf {
    /// Allocates zeroed storage sized exactly to `config`'s derived
    /// dimensions.
    pub fn zeroed_for(config: &crate::config::KalmanConfig<'_>) -> Self {
        let n = config.num_states();
        let k = config.num_measurements();
        Self {
            x: vec![0.0; n],
            p: vec![0.0; n * n],
            temp_x_hat: vec![0.0; n],
            // temp_bu holds the n x 1 product `B * u`, so it is sized by n,
            // not m — matching the `temp_Bu_storage` minimum in `filter::new`.
            temp_bu: vec![0.0; n],
            temp_measurement: vec![0.0; k],
            p_ht: vec![0.0; n * k],
            y: vec![0.0; k],
            s: vec![0.0; k * k],
            s_inv: vec![0.0; k * k],
            k_gain: vec![0.0; n * k],
            k_h: vec![0.0; n * n],
            k_h_p: vec![0.0; n * n],
        }
    }

    /// Borrows this buffer as a [`FilterStorage`] suitable for
    /// [`crate::KalmanFilter::new`].
    pub fn as_mut(&mut self) -> FilterStorage<'_> {
        FilterStorage {
            x: &mut self.x,
            p: &mut self.p,
            temp_x_hat: &mut self.temp_x_hat,
            temp_bu: &mut self.temp_bu,
            temp_measurement: &mut self.temp_measurement,
            p_ht: &mut self.p_ht,
            y: &mut self.y,
            s: &mut self.s,
            s_inv: &mut self.s_inv,
            k_gain: &mut self.k_gain,
            k_h: &mut self.k_h,
            k_h_p: &mut self.k_h_p,
        }
    }
}
