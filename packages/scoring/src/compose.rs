//! Stage 6: composite index.

use urban_index_models::{MissingNoisePolicy, NoiseBand, ScoredParcel};

use crate::ScoringError;
use crate::aggregate::GroupValues;
use crate::distance::DistanceTable;
use crate::noise::NoiseTable;
use crate::quartile::QuartileTable;

/// Sums the four finalized criterion scores.
///
/// Each input is already in 1-4, so the result lies in 4-16 when a noise
/// band is present. An absent band contributes whatever `policy` says.
#[must_use]
pub fn composite_index(
    normalized: GroupValues,
    noise: Option<NoiseBand>,
    policy: MissingNoisePolicy,
) -> u8 {
    normalized.green_space + normalized.transport + normalized.services + policy.contribution(noise)
}

/// Merges every stage's output into one row per parcel.
///
/// # Errors
///
/// Returns [`ScoringError::LengthMismatch`] if the stage outputs disagree
/// on the number of parcels.
pub fn compose(
    distances: &DistanceTable,
    quartiles: &QuartileTable,
    sums: &[GroupValues],
    normalized: &[GroupValues],
    noise: &NoiseTable,
    policy: MissingNoisePolicy,
) -> Result<Vec<ScoredParcel>, ScoringError> {
    let expected = distances.parcel_count();
    for (stage, found) in [
        ("quartile", quartiles.parcel_count()),
        ("aggregate", sums.len()),
        ("normalize", normalized.len()),
        ("noise", noise.readings.len()),
    ] {
        if found != expected {
            return Err(ScoringError::LengthMismatch {
                stage,
                expected,
                found,
            });
        }
    }

    Ok((0..expected)
        .map(|parcel| {
            let sum = sums[parcel];
            let norm = normalized[parcel];
            let reading = noise.readings[parcel];

            ScoredParcel {
                distances: distances.row(parcel),
                ranks: quartiles.row(parcel),
                sum_green_space: sum.green_space,
                sum_transport: sum.transport,
                sum_services: sum.services,
                norm_transport: norm.transport,
                norm_services: norm.services,
                decibels: reading.decibels,
                noise_band: reading.band,
                context_index: composite_index(norm, reading.band, policy),
            }
        })
        .collect())
}
