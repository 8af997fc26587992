//! Stage 5: traffic-noise reading and band per parcel.
//!
//! Each parcel's representative point is looked up in the noise index.
//! Absent readings stay absent here; defaulting them is the composer's
//! job.

use rayon::prelude::*;
use urban_index_models::NoiseBand;
use urban_index_spatial::{NoiseIndex, Parcel};

use crate::progress::ProgressCallback;

/// Noise attributes of one parcel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NoiseReading {
    /// Decibels of the containing noise polygon, if any.
    pub decibels: Option<f64>,
    /// Band of `decibels`, absent if there is no reading or it lies
    /// outside `[0, 100]`.
    pub band: Option<NoiseBand>,
}

impl NoiseReading {
    #[must_use]
    pub fn from_decibels(decibels: Option<f64>) -> Self {
        Self {
            decibels,
            band: decibels.and_then(NoiseBand::from_decibels),
        }
    }

    /// A reading was found but could not be banded.
    #[must_use]
    pub const fn is_out_of_range(&self) -> bool {
        self.decibels.is_some() && self.band.is_none()
    }
}

/// Per-parcel readings plus the non-fatal condition counts.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseTable {
    pub readings: Vec<NoiseReading>,
    /// Parcels outside every noise polygon.
    pub missing: usize,
    /// Parcels with a reading outside `[0, 100]`.
    pub out_of_range: usize,
}

/// Looks up and bands the noise reading of every parcel.
#[must_use]
pub fn classify(
    parcels: &[Parcel],
    index: &NoiseIndex,
    progress: &dyn ProgressCallback,
) -> NoiseTable {
    progress.set_message("Noise lookup".to_string());

    let readings: Vec<NoiseReading> = parcels
        .par_iter()
        .map(|parcel| {
            let reading =
                NoiseReading::from_decibels(index.lookup(parcel.representative_point()));
            progress.inc(1);
            reading
        })
        .collect();

    let missing = readings.iter().filter(|r| r.decibels.is_none()).count();
    let out_of_range = readings.iter().filter(|r| r.is_out_of_range()).count();

    if missing > 0 {
        log::warn!(
            "{missing} of {} parcels fall outside every noise polygon",
            readings.len()
        );
    }
    if out_of_range > 0 {
        log::warn!(
            "{out_of_range} parcels have decibel readings outside [{}, {}]; left unbanded",
            NoiseBand::DECIBEL_FLOOR,
            NoiseBand::DECIBEL_CEILING
        );
    }
    log::info!(
        "Classified noise for {} parcels against {} polygons",
        readings.len(),
        index.len()
    );

    NoiseTable {
        readings,
        missing,
        out_of_range,
    }
}

#[cfg(test)]
mod tests {
    use geo::{Geometry, polygon};
    use urban_index_spatial::NoiseZone;

    use super::*;
    use crate::progress::NullProgress;

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Geometry<f64> {
        Geometry::Polygon(polygon![
            (x: x0, y: y0),
            (x: x1, y: y0),
            (x: x1, y: y1),
            (x: x0, y: y1),
        ])
    }

    #[test]
    fn bands_readings_and_counts_conditions() {
        let index = NoiseIndex::new(vec![
            NoiseZone {
                geometry: square(0.0, 0.0, 10.0, 10.0),
                decibels: 44.9,
            },
            NoiseZone {
                geometry: square(10.0, 0.0, 20.0, 10.0),
                decibels: 65.0,
            },
            NoiseZone {
                geometry: square(20.0, 0.0, 30.0, 10.0),
                decibels: 120.0,
            },
        ])
        .unwrap();

        let parcels: Vec<Parcel> = [1.0, 11.0, 21.0, 41.0]
            .iter()
            .enumerate()
            .map(|(i, &x)| Parcel::new(i, square(x, 1.0, x + 1.0, 2.0)).unwrap())
            .collect();

        let table = classify(&parcels, &index, &NullProgress);

        assert_eq!(
            table.readings,
            vec![
                NoiseReading {
                    decibels: Some(44.9),
                    band: Some(NoiseBand::Quiet),
                },
                NoiseReading {
                    decibels: Some(65.0),
                    band: Some(NoiseBand::VeryLoud),
                },
                NoiseReading {
                    decibels: Some(120.0),
                    band: None,
                },
                NoiseReading::default(),
            ]
        );
        assert_eq!(table.missing, 1);
        assert_eq!(table.out_of_range, 1);
    }

    #[test]
    fn absent_reading_stays_absent() {
        let reading = NoiseReading::from_decibels(None);
        assert_eq!(reading.band, None);
        assert!(!reading.is_out_of_range());
    }

    #[test]
    fn negative_reading_is_out_of_range() {
        let reading = NoiseReading::from_decibels(Some(-3.0));
        assert_eq!(reading.band, None);
        assert!(reading.is_out_of_range());
    }
}
