//! In-memory spatial index over traffic-noise polygons.
//!
//! Builds an R-tree over the noise layer once, then answers
//! point-in-polygon decibel lookups for parcel representative points.

use geo::{Contains, Geometry, MultiPolygon, Point};
use rstar::{AABB, RTree, RTreeObject};

use crate::{SpatialError, into_multi_polygon, rect_envelope, validate_geometry};

/// One noise polygon with its decibel reading, as supplied by the
/// data-access layer.
#[derive(Debug, Clone)]
pub struct NoiseZone {
    pub geometry: Geometry<f64>,
    pub decibels: f64,
}

/// A noise polygon stored in the R-tree with its metadata.
struct NoiseEntry {
    /// Position in the source layer; lower wins on overlap.
    order: usize,
    decibels: f64,
    envelope: AABB<[f64; 2]>,
    polygon: MultiPolygon<f64>,
}

impl RTreeObject for NoiseEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Pre-built spatial index for the traffic-noise layer.
///
/// Constructed once and shared read-only across all parcel lookups.
pub struct NoiseIndex {
    zones: RTree<NoiseEntry>,
}

impl NoiseIndex {
    /// Layer name used in errors raised for noise polygons.
    pub const LAYER: &'static str = "noise";

    /// Validates every zone and bulk-loads the R-tree.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError`] if the layer is empty, a zone is not a
    /// valid non-empty polygon, or a decibel reading is not finite.
    pub fn new(zones: Vec<NoiseZone>) -> Result<Self, SpatialError> {
        if zones.is_empty() {
            return Err(SpatialError::EmptyLayer {
                layer: Self::LAYER.to_string(),
            });
        }

        let entries = zones
            .into_iter()
            .enumerate()
            .map(|(order, zone)| {
                if !zone.decibels.is_finite() {
                    return Err(SpatialError::NonFiniteDecibels {
                        layer: Self::LAYER.to_string(),
                        index: order,
                        value: zone.decibels,
                    });
                }

                let rect = validate_geometry(Self::LAYER, order, &zone.geometry)?;
                let polygon = into_multi_polygon(Self::LAYER, order, zone.geometry)?;

                Ok(NoiseEntry {
                    order,
                    decibels: zone.decibels,
                    envelope: rect_envelope(rect),
                    polygon,
                })
            })
            .collect::<Result<Vec<_>, SpatialError>>()?;

        log::info!("Loaded {} noise polygons into spatial index", entries.len());

        Ok(Self {
            zones: RTree::bulk_load(entries),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.size()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.size() == 0
    }

    /// Decibel reading of the noise polygon containing `point`.
    ///
    /// Points on a polygon boundary are not contained. If several polygons
    /// contain the point, the one that came first in the layer wins.
    #[must_use]
    pub fn lookup(&self, point: Point<f64>) -> Option<f64> {
        let query_env = AABB::from_point([point.x(), point.y()]);

        self.zones
            .locate_in_envelope_intersecting(&query_env)
            .filter(|entry| entry.polygon.contains(&point))
            .min_by_key(|entry| entry.order)
            .map(|entry| entry.decibels)
    }
}
