//! Progress hooks for the per-parcel stages.
//!
//! The pipeline reports through [`ProgressCallback`] so it never depends on
//! a terminal. The CLI plugs in `indicatif` bars; library callers and tests
//! pass [`NullProgress`].

/// Receives progress from the scoring and loading stages.
///
/// Distance evaluation and noise lookup call [`inc`](Self::inc) from
/// `rayon` worker threads, hence `Send + Sync`.
pub trait ProgressCallback: Send + Sync {
    /// Units of work in the whole run (parcels times lookups per parcel).
    fn set_total(&self, total: u64);

    fn inc(&self, delta: u64);

    /// Names the stage currently running.
    fn set_message(&self, msg: String);

    /// Called once when the run completes.
    fn finish(&self, msg: String);
}

/// Discards every report.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}
