use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::foundation::error::{GeoseqError, GeoseqResult};

/// A resolved geographic position (WGS84 degrees, elevation in meters).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Position {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Elevation above sea level in meters.
    pub elevation: f64,
}

impl Position {
    /// Returns `true` when latitude and longitude are finite and within WGS84 bounds.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.elevation.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Cooperative cancellation shared between a running build and whoever may reset it.
///
/// Workers check the flag before starting each unit of work; units already in flight finish.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create a flag in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Fail with [`GeoseqError::Cancelled`] if cancellation was requested.
    pub fn check(&self, what: &str) -> GeoseqResult<()> {
        if self.is_cancelled() {
            return Err(GeoseqError::cancelled(format!("{what} interrupted")));
        }
        Ok(())
    }
}

/// Worker pool sizing for per-photo and per-variant work.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Threading {
    /// Optional explicit worker thread count; `None` lets rayon decide.
    pub threads: Option<usize>,
}

impl Threading {
    /// Build a rayon pool sized by `threads`.
    pub fn build_pool(self) -> GeoseqResult<rayon::ThreadPool> {
        if let Some(n) = self.threads
            && n == 0
        {
            return Err(GeoseqError::validation(
                "threading 'threads' must be >= 1 when set",
            ));
        }

        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(n) = self.threads {
            builder = builder.num_threads(n);
        }
        builder
            .build()
            .map_err(|e| GeoseqError::validation(format!("failed to build rayon thread pool: {e}")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
