//! Nearest-feature distance search against a proximity reference layer.
//!
//! Features are bulk-loaded into an R-tree by bounding rectangle. A search
//! seeds an upper bound from the feature whose rectangle is closest to the
//! parcel's representative point, then measures only the features whose
//! rectangles fall within that bound of the parcel's own rectangle.

use geo::{Distance as _, Euclidean, Geometry, Rect};
use rstar::{AABB, Envelope as _, PointDistance, RTree, RTreeObject};

use crate::{Parcel, SpatialError, rect_distance, rect_envelope, validate_geometry};

struct ReferenceFeature {
    geometry: Geometry<f64>,
    rect: Rect<f64>,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for ReferenceFeature {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl PointDistance for ReferenceFeature {
    /// Squared distance from `point` to the feature's bounding rectangle.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        self.envelope.distance_2(point)
    }
}

/// An immutable, non-empty collection of reference geometries (points,
/// lines or polygons) for one proximity criterion.
pub struct ReferenceLayer {
    name: String,
    features: RTree<ReferenceFeature>,
}

impl ReferenceLayer {
    /// Validates every geometry and builds the layer.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::EmptyLayer`] if `geometries` is empty, or
    /// the first validation error found among the features.
    pub fn new(
        name: impl Into<String>,
        geometries: Vec<Geometry<f64>>,
    ) -> Result<Self, SpatialError> {
        let name = name.into();
        if geometries.is_empty() {
            return Err(SpatialError::EmptyLayer { layer: name });
        }

        let features = geometries
            .into_iter()
            .enumerate()
            .map(|(index, geometry)| {
                let rect = validate_geometry(&name, index, &geometry)?;
                Ok(ReferenceFeature {
                    geometry,
                    rect,
                    envelope: rect_envelope(rect),
                })
            })
            .collect::<Result<Vec<_>, SpatialError>>()?;

        log::debug!("Layer '{name}': {} reference features", features.len());

        Ok(Self {
            name,
            features: RTree::bulk_load(features),
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.features.size()
    }

    /// Always `false`; construction rejects empty layers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.size() == 0
    }

    /// Minimum Euclidean distance from `parcel` to any feature in the layer.
    ///
    /// Zero when the parcel touches or overlaps a feature. Only features
    /// whose bounding rectangle lies within the seed distance of the
    /// parcel's rectangle are measured exactly.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::NonFiniteDistance`] if no finite distance
    /// could be computed.
    pub fn nearest_distance(&self, parcel: &Parcel) -> Result<f64, SpatialError> {
        let non_finite = || SpatialError::NonFiniteDistance {
            layer: self.name.clone(),
            parcel: parcel.index(),
        };

        let anchor = parcel.representative_point();
        let seed = self
            .features
            .nearest_neighbor(&[anchor.x(), anchor.y()])
            .ok_or_else(non_finite)?;

        let mut best = Euclidean.distance(parcel.geometry(), &seed.geometry);
        if !best.is_finite() {
            return Err(non_finite());
        }
        if best <= 0.0 {
            return Ok(0.0);
        }

        // Anything closer than `best` has a rectangle within `best` of the
        // parcel's rectangle on both axes.
        let rect = parcel.rect();
        let window = AABB::from_corners(
            [rect.min().x - best, rect.min().y - best],
            [rect.max().x + best, rect.max().y + best],
        );

        for feature in self.features.locate_in_envelope_intersecting(&window) {
            if rect_distance(rect, feature.rect) >= best {
                continue;
            }

            let distance = Euclidean.distance(parcel.geometry(), &feature.geometry);
            if distance < best {
                best = distance;
                if best <= 0.0 {
                    break;
                }
            }
        }

        Ok(best)
    }
}
