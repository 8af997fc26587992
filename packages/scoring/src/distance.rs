//! Stage 1: nearest-feature distance per parcel and proximity criterion.

use rayon::prelude::*;
use urban_index_models::{Criterion, PerCriterion};
use urban_index_spatial::Parcel;

use crate::progress::ProgressCallback;
use crate::{ReferenceLayers, ScoringError};

/// One distance column per criterion, each with one entry per parcel in
/// input order.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceTable {
    columns: PerCriterion<Vec<f64>>,
}

impl DistanceTable {
    /// Builds a table from precomputed columns.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::EmptyPopulation`] if the columns are empty
    /// and [`ScoringError::LengthMismatch`] if they differ in length.
    pub fn from_columns(columns: PerCriterion<Vec<f64>>) -> Result<Self, ScoringError> {
        let expected = columns[Criterion::GreenSpace].len();
        if expected == 0 {
            return Err(ScoringError::EmptyPopulation);
        }
        for (_, column) in columns.iter() {
            if column.len() != expected {
                return Err(ScoringError::LengthMismatch {
                    stage: "distance",
                    expected,
                    found: column.len(),
                });
            }
        }
        Ok(Self { columns })
    }

    #[must_use]
    pub fn column(&self, criterion: Criterion) -> &[f64] {
        &self.columns[criterion]
    }

    #[must_use]
    pub fn parcel_count(&self) -> usize {
        self.columns[Criterion::GreenSpace].len()
    }

    /// Distances of one parcel to every criterion.
    #[must_use]
    pub fn row(&self, parcel: usize) -> PerCriterion<f64> {
        PerCriterion::from_fn(|criterion| self.columns[criterion][parcel])
    }
}

/// Computes every parcel's distance to the nearest feature of each
/// reference layer.
///
/// Parcels are evaluated independently on the `rayon` pool; columns keep
/// input order.
///
/// # Errors
///
/// Returns [`ScoringError::EmptyPopulation`] when `parcels` is empty, or
/// the first distance error encountered.
pub fn evaluate(
    parcels: &[Parcel],
    layers: &ReferenceLayers,
    progress: &dyn ProgressCallback,
) -> Result<DistanceTable, ScoringError> {
    if parcels.is_empty() {
        return Err(ScoringError::EmptyPopulation);
    }

    let mut columns = PerCriterion::from_fn(|_| Vec::new());

    for criterion in Criterion::ALL {
        let layer = layers.get(criterion);
        progress.set_message(format!("Distances to {criterion}"));

        columns[criterion] = parcels
            .par_iter()
            .map(|parcel| {
                let distance = layer.nearest_distance(parcel);
                progress.inc(1);
                distance
            })
            .collect::<Result<Vec<f64>, _>>()?;

        log::info!(
            "{criterion}: computed {} distances against {} features",
            parcels.len(),
            layer.len()
        );
    }

    DistanceTable::from_columns(columns)
}

#[cfg(test)]
mod tests {
    use geo::{Geometry, point, polygon};
    use urban_index_spatial::ReferenceLayer;

    use super::*;
    use crate::progress::NullProgress;

    fn square(index: usize, x: f64) -> Parcel {
        Parcel::new(
            index,
            Geometry::Polygon(polygon![
                (x: x, y: 0.0),
                (x: x + 1.0, y: 0.0),
                (x: x + 1.0, y: 1.0),
                (x: x, y: 1.0),
            ]),
        )
        .unwrap()
    }

    fn layers_at(x: f64) -> ReferenceLayers {
        ReferenceLayers::try_from_fn(|criterion| {
            ReferenceLayer::new(
                criterion.to_string(),
                vec![Geometry::Point(point!(x: x, y: 0.5))],
            )
        })
        .unwrap()
    }

    #[test]
    fn columns_follow_parcel_order() {
        let parcels = vec![square(0, 0.0), square(1, 10.0), square(2, 5.0)];
        let table = evaluate(&parcels, &layers_at(-1.0), &NullProgress).unwrap();

        assert_eq!(table.parcel_count(), 3);
        for criterion in Criterion::ALL {
            let column = table.column(criterion);
            assert!((column[0] - 1.0).abs() < 1e-12);
            assert!((column[1] - 11.0).abs() < 1e-12);
            assert!((column[2] - 6.0).abs() < 1e-12);
        }
        assert!((table.row(2)[Criterion::Sports] - 6.0).abs() < 1e-12);
    }

    #[test]
    fn empty_population_is_an_error() {
        let err = evaluate(&[], &layers_at(0.0), &NullProgress).unwrap_err();
        assert!(matches!(err, ScoringError::EmptyPopulation));
    }

    #[test]
    fn ragged_columns_are_rejected() {
        let mut columns = PerCriterion::from_fn(|_| vec![1.0, 2.0]);
        columns[Criterion::Bus] = vec![1.0];
        let err = DistanceTable::from_columns(columns).unwrap_err();
        assert!(matches!(
            err,
            ScoringError::LengthMismatch {
                expected: 2,
                found: 1,
                ..
            }
        ));
    }
}
