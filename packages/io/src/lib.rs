#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! GeoJSON data access for the context index.
//!
//! [`load`] turns `FeatureCollection` files into validated parcels,
//! reference layers and the noise index. [`sink`] writes the scored
//! parcels back out as a `FeatureCollection` and the run report as JSON.
//! Coordinate reconciliation is out of scope: every layer must already use
//! the same planar CRS.

pub mod load;
pub mod sink;

use std::path::PathBuf;

use thiserror::Error;
use urban_index_spatial::SpatialError;

pub use load::{
    LAYER_COUNT, ParcelLayer, load_inputs, load_noise_layer, load_parcels, load_reference_layer,
};
pub use sink::{write_report, write_scored_parcels};

/// Errors raised while reading or writing layers.
#[derive(Debug, Error)]
pub enum LayerError {
    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid GeoJSON in {}: {source}", path.display())]
    GeoJson {
        path: PathBuf,
        #[source]
        source: Box<geojson::Error>,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{} is not a GeoJSON FeatureCollection", path.display())]
    NotFeatureCollection { path: PathBuf },

    #[error("Feature {index} of layer '{layer}' has no geometry")]
    MissingGeometry { layer: String, index: usize },

    #[error("Feature {index} of layer '{layer}' has no '{attribute}' attribute")]
    MissingAttribute {
        layer: String,
        index: usize,
        attribute: String,
    },

    #[error("Feature {index} of layer '{layer}' has a non-numeric '{attribute}' ({value})")]
    NonNumericAttribute {
        layer: String,
        index: usize,
        attribute: String,
        value: String,
    },

    #[error("Cannot write {rows} scored rows onto {features} parcel features")]
    RowCountMismatch { features: usize, rows: usize },

    #[error(transparent)]
    Spatial(#[from] SpatialError),
}

impl LayerError {
    fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    fn geojson(path: impl Into<PathBuf>, source: geojson::Error) -> Self {
        Self::GeoJson {
            path: path.into(),
            source: Box::new(source),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    /// A fresh path under the system temp dir, unique per test process and
    /// call.
    pub fn temp_path(name: &str) -> PathBuf {
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!(
            "urban_index_io_{}_{n}_{name}",
            std::process::id()
        ))
    }

    pub fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = temp_path(name);
        std::fs::write(&path, contents).unwrap();
        path
    }
}
