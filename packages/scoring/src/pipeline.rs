//! End-to-end scoring run.
//!
//! Chains every stage over a frozen parcel population and frozen
//! reference layers, then assembles the [`RunReport`]. Reference-data
//! errors abort before any row is produced; every other condition is
//! counted in the report.

use std::collections::BTreeMap;
use std::time::Instant;

use urban_index_models::{Criterion, MissingNoisePolicy, RunReport, ScoredParcel};
use urban_index_spatial::{NoiseIndex, Parcel};

use crate::progress::ProgressCallback;
use crate::{ReferenceLayers, ScoringError, aggregate, compose, distance, noise, normalize, quartile};

/// Everything a run reads. Nothing here is modified by scoring.
pub struct ScoringInputs {
    pub parcels: Vec<Parcel>,
    pub layers: ReferenceLayers,
    pub noise: NoiseIndex,
}

/// Caller-selected run policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoringOptions {
    pub missing_noise_policy: MissingNoisePolicy,
}

/// Scored rows (in parcel order) and the run report.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRun {
    pub parcels: Vec<ScoredParcel>,
    pub report: RunReport,
}

/// Scores every parcel.
///
/// # Errors
///
/// Returns [`ScoringError`] if there are no parcels or a distance cannot
/// be computed.
#[allow(clippy::cast_possible_truncation)]
pub fn run(
    inputs: &ScoringInputs,
    options: ScoringOptions,
    progress: &dyn ProgressCallback,
) -> Result<ScoredRun, ScoringError> {
    let start = Instant::now();
    let parcel_count = inputs.parcels.len();
    if parcel_count == 0 {
        return Err(ScoringError::EmptyPopulation);
    }

    // One unit per parcel per reference layer, plus one for the noise lookup.
    progress.set_total((parcel_count * (Criterion::ALL.len() + 1)) as u64);

    let distances = distance::evaluate(&inputs.parcels, &inputs.layers, progress)?;
    let quartiles = quartile::classify(&distances);
    let sums = aggregate::aggregate(&quartiles);
    let normalized = normalize::normalize(&sums);
    let noise = noise::classify(&inputs.parcels, &inputs.noise, progress);

    let parcels = compose::compose(
        &distances,
        &quartiles,
        &sums,
        &normalized,
        &noise,
        options.missing_noise_policy,
    )?;

    let mut index_distribution = BTreeMap::new();
    for parcel in &parcels {
        *index_distribution.entry(parcel.context_index).or_insert(0) += 1;
    }

    let report = RunReport {
        parcel_count,
        boundaries: quartiles.boundaries().collect(),
        degenerate_distributions: quartiles.degenerate().cloned().collect(),
        missing_noise: noise.missing,
        out_of_range_decibels: noise.out_of_range,
        missing_noise_policy: options.missing_noise_policy,
        index_distribution,
    };

    let unbanded = report.missing_noise + report.out_of_range_decibels;
    if unbanded > 0 {
        log::warn!(
            "{unbanded} parcels without a noise band contribute {} to the index ({} policy)",
            options.missing_noise_policy.contribution(None),
            options.missing_noise_policy
        );
    }

    progress.finish(format!("Scored {parcel_count} parcels"));
    log::info!(
        "Scored {parcel_count} parcels in {:.2}s",
        start.elapsed().as_secs_f64()
    );

    Ok(ScoredRun { parcels, report })
}

#[cfg(test)]
mod tests {
    use geo::{Geometry, point, polygon};
    use urban_index_models::{NoiseBand, QuartileRank};
    use urban_index_spatial::{NoiseZone, ReferenceLayer};

    use super::*;
    use crate::progress::NullProgress;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Geometry<f64> {
        Geometry::Polygon(polygon![
            (x: x0, y: y0),
            (x: x1, y: y0),
            (x: x1, y: y1),
            (x: x0, y: y1),
        ])
    }

    /// Four unit-square parcels at x = 0, 10, 20, 30.
    ///
    /// Every reference layer is a single point. Bus sits past the last
    /// parcel, every other layer sits before the first, so ranks run
    /// 1-2-3-4 for everything except bus (4-3-2-1). Two noise polygons
    /// cover parcels A-B (50 dB) and C (70 dB); D has no reading.
    fn fixture() -> ScoringInputs {
        let parcels = (0..4_u32)
            .map(|i| {
                let x = f64::from(i) * 10.0;
                Parcel::new(i as usize, rect(x, 0.0, x + 1.0, 1.0)).unwrap()
            })
            .collect();

        let layers = ReferenceLayers::try_from_fn(|criterion| {
            let x = match criterion {
                Criterion::Bus => 32.0,
                Criterion::Rail => -2.0,
                _ => -1.0,
            };
            ReferenceLayer::new(
                criterion.to_string(),
                vec![Geometry::Point(point!(x: x, y: 0.5))],
            )
        })
        .unwrap();

        let noise = NoiseIndex::new(vec![
            NoiseZone {
                geometry: rect(-5.0, -5.0, 15.0, 5.0),
                decibels: 50.0,
            },
            NoiseZone {
                geometry: rect(15.0, -5.0, 25.0, 5.0),
                decibels: 70.0,
            },
        ])
        .unwrap();

        ScoringInputs {
            parcels,
            layers,
            noise,
        }
    }

    #[test]
    fn reproduces_hand_computed_index() {
        let run = run(&fixture(), ScoringOptions::default(), &NullProgress).unwrap();
        let rows = &run.parcels;

        let green: Vec<u8> = rows
            .iter()
            .map(|r| r.ranks[Criterion::GreenSpace].value())
            .collect();
        let bus: Vec<u8> = rows.iter().map(|r| r.ranks[Criterion::Bus].value()).collect();
        assert_eq!(green, vec![1, 2, 3, 4]);
        assert_eq!(bus, vec![4, 3, 2, 1]);

        // Rail + bus is always 5, the transport midpoint: 2.5 rounds to 2.
        assert!(rows.iter().all(|r| r.sum_transport == 5));
        assert!(rows.iter().all(|r| r.norm_transport == 2));

        let services: Vec<(u8, u8)> = rows
            .iter()
            .map(|r| (r.sum_services, r.norm_services))
            .collect();
        assert_eq!(services, vec![(3, 1), (6, 2), (9, 3), (12, 4)]);

        let bands: Vec<Option<NoiseBand>> = rows.iter().map(|r| r.noise_band).collect();
        assert_eq!(
            bands,
            vec![
                Some(NoiseBand::Moderate),
                Some(NoiseBand::Moderate),
                Some(NoiseBand::VeryLoud),
                None
            ]
        );

        // A: 1 + 2 + 1 + 2, B: 2 + 2 + 2 + 2, C: 3 + 2 + 3 + 4, D: 4 + 2 + 4 + 0
        let index: Vec<u8> = rows.iter().map(|r| r.context_index).collect();
        assert_eq!(index, vec![6, 8, 12, 10]);

        assert!((rows[0].distances[Criterion::GreenSpace] - 1.0).abs() < 1e-12);
        assert!((rows[3].distances[Criterion::Bus] - 1.0).abs() < 1e-12);
        assert!((rows[1].distances[Criterion::Rail] - 12.0).abs() < 1e-12);
    }

    #[test]
    fn report_counts_conditions() {
        let run = run(&fixture(), ScoringOptions::default(), &NullProgress).unwrap();
        let report = &run.report;

        assert_eq!(report.parcel_count, 4);
        assert_eq!(report.missing_noise, 1);
        assert_eq!(report.out_of_range_decibels, 0);
        assert!(report.degenerate_distributions.is_empty());
        assert_eq!(report.boundaries.len(), Criterion::ALL.len());
        assert_eq!(
            report.index_distribution,
            BTreeMap::from([(6, 1), (8, 1), (10, 1), (12, 1)])
        );
        assert!(report.has_warnings());
    }

    #[test]
    fn worst_policy_fills_missing_noise() {
        let options = ScoringOptions {
            missing_noise_policy: MissingNoisePolicy::Worst,
        };
        let run = run(&fixture(), options, &NullProgress).unwrap();
        let index: Vec<u8> = run.parcels.iter().map(|r| r.context_index).collect();
        assert_eq!(index, vec![6, 8, 12, 14]);
        assert_eq!(run.parcels[3].noise_band, None);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let inputs = fixture();
        let first = run(&inputs, ScoringOptions::default(), &NullProgress).unwrap();
        let second = run(&inputs, ScoringOptions::default(), &NullProgress).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn single_parcel_is_degenerate_but_scored() {
        let mut inputs = fixture();
        inputs.parcels.truncate(1);
        let run = run(&inputs, ScoringOptions::default(), &NullProgress).unwrap();

        assert_eq!(run.parcels.len(), 1);
        assert!(
            run.parcels[0]
                .ranks
                .iter()
                .all(|(_, rank)| *rank == QuartileRank::First)
        );
        assert_eq!(
            run.report.degenerate_distributions.len(),
            Criterion::ALL.len()
        );
        // 1 + normalized(2) + normalized(3) + band(50 dB)
        assert_eq!(run.parcels[0].context_index, 1 + 1 + 1 + 2);
    }

    #[test]
    fn empty_population_is_rejected() {
        let mut inputs = fixture();
        inputs.parcels.clear();
        let err = run(&inputs, ScoringOptions::default(), &NullProgress).unwrap_err();
        assert!(matches!(err, ScoringError::EmptyPopulation));
    }
}
