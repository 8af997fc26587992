#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Scoring pipeline for the urban context vulnerability index.
//!
//! Each stage takes the previous stage's output by reference and returns
//! a new value; nothing is mutated in place:
//!
//! 1. [`distance`]: nearest-feature distance per parcel and criterion.
//! 2. [`quartile`]: population quartile rank per criterion.
//! 3. [`aggregate`]: summed ranks per criterion group.
//! 4. [`normalize`]: group sums rescaled onto 1-4.
//! 5. [`noise`]: decibel lookup and noise band per parcel.
//! 6. [`compose`]: composite index.
//!
//! [`pipeline::run`] chains all of them and builds the [`RunReport`].
//!
//! [`RunReport`]: urban_index_models::RunReport

pub mod aggregate;
pub mod compose;
pub mod distance;
pub mod noise;
pub mod normalize;
pub mod pipeline;
pub mod progress;
pub mod quartile;

use urban_index_models::Criterion;
use urban_index_spatial::{ReferenceLayer, SpatialError};

pub use pipeline::{ScoredRun, ScoringInputs, ScoringOptions, run};

/// Errors that abort a scoring run.
#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    /// Reference or parcel data is unusable.
    #[error(transparent)]
    Spatial(#[from] SpatialError),

    /// There are no parcels to score.
    #[error("No parcels to score")]
    EmptyPopulation,

    /// Two per-parcel tables passed to one stage disagree on length.
    #[error("{stage}: expected {expected} parcels, found {found}")]
    LengthMismatch {
        /// Stage that detected the mismatch.
        stage: &'static str,
        /// Parcel count of the leading table.
        expected: usize,
        /// Parcel count of the offending table.
        found: usize,
    },
}

/// One reference layer per proximity criterion.
pub struct ReferenceLayers {
    /// Indexed by [`Criterion::index`]; always one entry per criterion.
    layers: Vec<ReferenceLayer>,
}

impl ReferenceLayers {
    /// Builds the set by calling `load` once per criterion in canonical
    /// order, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `load`.
    pub fn try_from_fn<E>(
        mut load: impl FnMut(Criterion) -> Result<ReferenceLayer, E>,
    ) -> Result<Self, E> {
        let layers = Criterion::ALL
            .into_iter()
            .map(&mut load)
            .collect::<Result<Vec<_>, E>>()?;
        Ok(Self { layers })
    }

    #[must_use]
    pub fn get(&self, criterion: Criterion) -> &ReferenceLayer {
        &self.layers[criterion.index()]
    }
}
