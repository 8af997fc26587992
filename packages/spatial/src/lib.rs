#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Planar geometry primitives for parcel scoring.
//!
//! Wraps validated parcel polygons ([`Parcel`]), proximity reference
//! layers with nearest-feature distance search ([`ReferenceLayer`]), and
//! an R-tree over traffic-noise polygons for point-in-polygon decibel
//! lookups ([`NoiseIndex`]). All geometry is assumed to already share one
//! planar coordinate reference system.

pub mod distance;
pub mod noise;

use geo::{BoundingRect, Geometry, InteriorPoint, MultiPolygon, Point, Rect, Validation};
use rstar::AABB;
use thiserror::Error;

pub use distance::ReferenceLayer;
pub use noise::{NoiseIndex, NoiseZone};

/// Reference-data problems. Every variant is fatal for a run.
#[derive(Debug, Error)]
pub enum SpatialError {
    /// The layer has no features at all.
    #[error("Layer '{layer}' has no features")]
    EmptyLayer {
        /// Layer name.
        layer: String,
    },

    /// A feature's geometry has no coordinates.
    #[error("Feature {index} of layer '{layer}' has an empty geometry")]
    EmptyGeometry {
        /// Layer name.
        layer: String,
        /// Zero-based feature position in the layer.
        index: usize,
    },

    /// A feature's geometry fails OGC validity rules (self-intersections,
    /// unclosed rings, non-finite coordinates, ...).
    #[error("Feature {index} of layer '{layer}' has an invalid geometry")]
    InvalidGeometry {
        /// Layer name.
        layer: String,
        /// Zero-based feature position in the layer.
        index: usize,
    },

    /// A polygon was required but another geometry kind was found.
    #[error("Feature {index} of layer '{layer}' is a {kind}, expected a polygon")]
    NonPolygonal {
        /// Layer name.
        layer: String,
        /// Zero-based feature position in the layer.
        index: usize,
        /// Geometry kind that was found.
        kind: &'static str,
    },

    /// A noise polygon carries a NaN or infinite decibel reading.
    #[error("Feature {index} of layer '{layer}' has a non-finite decibel value ({value})")]
    NonFiniteDecibels {
        /// Layer name.
        layer: String,
        /// Zero-based feature position in the layer.
        index: usize,
        /// The offending reading.
        value: f64,
    },

    /// The nearest-feature search produced a NaN or infinite distance.
    #[error("Distance from parcel {parcel} to layer '{layer}' is not finite")]
    NonFiniteDistance {
        /// Layer name.
        layer: String,
        /// Zero-based parcel position.
        parcel: usize,
    },
}

/// A validated residential parcel.
///
/// The geometry is fixed at construction; every derived attribute lives
/// outside this type.
#[derive(Debug, Clone)]
pub struct Parcel {
    index: usize,
    geometry: Geometry<f64>,
    rect: Rect<f64>,
    representative_point: Point<f64>,
}

impl Parcel {
    /// Layer name used in errors raised for parcels.
    pub const LAYER: &'static str = "parcels";

    /// Validates a parcel polygon and derives its representative point.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError`] if the geometry is not polygonal, is empty,
    /// or is invalid.
    pub fn new(index: usize, geometry: Geometry<f64>) -> Result<Self, SpatialError> {
        let polygon = into_multi_polygon(Self::LAYER, index, geometry)?;
        let geometry = Geometry::MultiPolygon(polygon);
        let rect = validate_geometry(Self::LAYER, index, &geometry)?;

        let representative_point =
            geometry
                .interior_point()
                .ok_or_else(|| SpatialError::EmptyGeometry {
                    layer: Self::LAYER.to_string(),
                    index,
                })?;

        Ok(Self {
            index,
            geometry,
            rect,
            representative_point,
        })
    }

    /// Zero-based position of this parcel in its input layer.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub const fn geometry(&self) -> &Geometry<f64> {
        &self.geometry
    }

    /// A point guaranteed to lie inside the parcel.
    ///
    /// Unlike the centroid, this never falls outside a concave parcel, so
    /// it is safe to use for containment lookups.
    #[must_use]
    pub const fn representative_point(&self) -> Point<f64> {
        self.representative_point
    }

    const fn rect(&self) -> Rect<f64> {
        self.rect
    }
}

/// Checks that a feature geometry is non-empty and valid, returning its
/// bounding rectangle.
///
/// # Errors
///
/// Returns [`SpatialError::EmptyGeometry`] or
/// [`SpatialError::InvalidGeometry`].
pub fn validate_geometry(
    layer: &str,
    index: usize,
    geometry: &Geometry<f64>,
) -> Result<Rect<f64>, SpatialError> {
    let Some(rect) = geometry.bounding_rect() else {
        return Err(SpatialError::EmptyGeometry {
            layer: layer.to_string(),
            index,
        });
    };

    if !geometry.is_valid() {
        return Err(SpatialError::InvalidGeometry {
            layer: layer.to_string(),
            index,
        });
    }

    Ok(rect)
}

/// Converts a `Polygon` or `MultiPolygon` geometry into a [`MultiPolygon`].
///
/// # Errors
///
/// Returns [`SpatialError::NonPolygonal`] for any other geometry kind.
pub fn into_multi_polygon(
    layer: &str,
    index: usize,
    geometry: Geometry<f64>,
) -> Result<MultiPolygon<f64>, SpatialError> {
    match geometry {
        Geometry::MultiPolygon(mp) => Ok(mp),
        Geometry::Polygon(p) => Ok(MultiPolygon(vec![p])),
        other => Err(SpatialError::NonPolygonal {
            layer: layer.to_string(),
            index,
            kind: geometry_kind(&other),
        }),
    }
}

const fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

/// Lower bound on the distance between anything inside `a` and anything
/// inside `b`.
/// R-tree envelope of a bounding rectangle.
fn rect_envelope(rect: Rect<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y])
}

fn rect_distance(a: Rect<f64>, b: Rect<f64>) -> f64 {
    let dx = (a.min().x - b.max().x).max(b.min().x - a.max().x).max(0.0);
    let dy = (a.min().y - b.max().y).max(b.min().y - a.max().y).max(0.0);
    dx.hypot(dy)
}
