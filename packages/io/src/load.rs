//! Layer loading.
//!
//! Every layer is a `GeoJSON` `FeatureCollection`. Parcels must be
//! polygonal, reference layers may hold any geometry kind, and the noise
//! layer must be polygonal with a numeric decibel attribute on every
//! feature. Any problem is fatal.

use std::path::Path;

use geo::Geometry;
use geojson::{Feature, GeoJson, JsonObject, JsonValue};
use urban_index_models::{Criterion, IndexConfig};
use urban_index_scoring::progress::ProgressCallback;
use urban_index_scoring::{ReferenceLayers, ScoringInputs};
use urban_index_spatial::{NoiseIndex, NoiseZone, Parcel, ReferenceLayer, SpatialError};

use crate::LayerError;

/// Parcels ready for scoring, plus the source features they came from.
///
/// The features are kept so the sink can write the original geometry and
/// properties back out unchanged.
pub struct ParcelLayer {
    pub parcels: Vec<Parcel>,
    pub features: Vec<Feature>,
}

/// Reads a `GeoJSON` file and returns its features.
///
/// # Errors
///
/// Returns [`LayerError`] if the file cannot be read, is not valid
/// `GeoJSON`, or is not a `FeatureCollection`.
pub fn read_features(path: &Path) -> Result<Vec<Feature>, LayerError> {
    let text = std::fs::read_to_string(path).map_err(|e| LayerError::io(path, e))?;
    let geojson: GeoJson = text.parse().map_err(|e| LayerError::geojson(path, e))?;

    match geojson {
        GeoJson::FeatureCollection(collection) => Ok(collection.features),
        GeoJson::Feature(_) | GeoJson::Geometry(_) => Err(LayerError::NotFeatureCollection {
            path: path.to_path_buf(),
        }),
    }
}

/// Converts a feature's geometry to `geo`.
fn feature_geometry(
    path: &Path,
    layer: &str,
    index: usize,
    feature: &Feature,
) -> Result<Geometry<f64>, LayerError> {
    let geometry = feature
        .geometry
        .clone()
        .ok_or_else(|| LayerError::MissingGeometry {
            layer: layer.to_string(),
            index,
        })?;

    geometry
        .try_into()
        .map_err(|e| LayerError::geojson(path, e))
}

/// Loads and validates the parcel layer.
///
/// # Errors
///
/// Returns [`LayerError`] if the file is unreadable, holds no parcels, or
/// any parcel lacks a valid polygonal geometry.
pub fn load_parcels(path: &Path) -> Result<ParcelLayer, LayerError> {
    let features = read_features(path)?;
    if features.is_empty() {
        return Err(SpatialError::EmptyLayer {
            layer: Parcel::LAYER.to_string(),
        }
        .into());
    }

    let parcels = features
        .iter()
        .enumerate()
        .map(|(index, feature)| {
            let geometry = feature_geometry(path, Parcel::LAYER, index, feature)?;
            Ok(Parcel::new(index, geometry)?)
        })
        .collect::<Result<Vec<_>, LayerError>>()?;

    log::info!("Loaded {} parcels from {}", parcels.len(), path.display());

    Ok(ParcelLayer { parcels, features })
}

/// Loads the reference layer for one proximity criterion.
///
/// # Errors
///
/// Returns [`LayerError`] if the file is unreadable, empty, or holds a
/// missing or invalid geometry.
pub fn load_reference_layer(
    criterion: Criterion,
    path: &Path,
) -> Result<ReferenceLayer, LayerError> {
    let layer = criterion.to_string();
    let geometries = read_features(path)?
        .iter()
        .enumerate()
        .map(|(index, feature)| feature_geometry(path, &layer, index, feature))
        .collect::<Result<Vec<_>, LayerError>>()?;

    let reference = ReferenceLayer::new(layer, geometries)?;
    log::info!(
        "Loaded {} {} features from {}",
        reference.len(),
        criterion,
        path.display()
    );

    Ok(reference)
}

/// Reads the decibel attribute of one noise feature.
///
/// Numbers are taken as-is; strings are accepted if they parse as a
/// number, since shapefile exports often store readings as text.
fn decibel_value(
    properties: Option<&JsonObject>,
    attribute: &str,
    index: usize,
) -> Result<f64, LayerError> {
    let missing = || LayerError::MissingAttribute {
        layer: NoiseIndex::LAYER.to_string(),
        index,
        attribute: attribute.to_string(),
    };

    let value = properties
        .and_then(|props| props.get(attribute))
        .ok_or_else(missing)?;

    let parsed = match value {
        JsonValue::Null => return Err(missing()),
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed.ok_or_else(|| LayerError::NonNumericAttribute {
        layer: NoiseIndex::LAYER.to_string(),
        index,
        attribute: attribute.to_string(),
        value: value.to_string(),
    })
}

/// Loads the traffic-noise layer into a [`NoiseIndex`].
///
/// # Errors
///
/// Returns [`LayerError`] if the file is unreadable, empty, a zone is not
/// a valid polygon, or a feature lacks a numeric `attribute`.
pub fn load_noise_layer(path: &Path, attribute: &str) -> Result<NoiseIndex, LayerError> {
    let zones = read_features(path)?
        .iter()
        .enumerate()
        .map(|(index, feature)| {
            Ok(NoiseZone {
                geometry: feature_geometry(path, NoiseIndex::LAYER, index, feature)?,
                decibels: decibel_value(feature.properties.as_ref(), attribute, index)?,
            })
        })
        .collect::<Result<Vec<_>, LayerError>>()?;

    Ok(NoiseIndex::new(zones)?)
}

/// Number of layers [`load_inputs`] reads: parcels, one per proximity
/// criterion, and noise.
pub const LAYER_COUNT: usize = Criterion::ALL.len() + 2;

/// Loads every layer named by `config`, advancing `progress` once per
/// layer.
///
/// Returns the scoring inputs and the parcel source features, in the
/// order the sink expects them back.
///
/// # Errors
///
/// Returns the first [`LayerError`] raised by any layer.
pub fn load_inputs(
    config: &IndexConfig,
    progress: &dyn ProgressCallback,
) -> Result<(ScoringInputs, Vec<Feature>), LayerError> {
    progress.set_total(LAYER_COUNT as u64);

    progress.set_message(Parcel::LAYER.to_string());
    let ParcelLayer { parcels, features } = load_parcels(&config.layers.parcels)?;
    progress.inc(1);

    let layers = ReferenceLayers::try_from_fn(|criterion| {
        progress.set_message(criterion.to_string());
        let layer = load_reference_layer(criterion, config.layers.reference(criterion))?;
        progress.inc(1);
        Ok::<_, LayerError>(layer)
    })?;

    progress.set_message(NoiseIndex::LAYER.to_string());
    let noise = load_noise_layer(&config.layers.noise, &config.noise.decibel_attribute)?;
    progress.inc(1);

    progress.finish(format!("Loaded {LAYER_COUNT} layers"));

    Ok((
        ScoringInputs {
            parcels,
            layers,
            noise,
        },
        features,
    ))
}

#[cfg(test)]
mod tests {
    use geo::point;
    use serde_json::json;

    use super::*;
    use crate::test_support::write_temp;

    fn square_feature(x: f64, properties: &JsonValue) -> JsonValue {
        json!({
            "type": "Feature",
            "properties": properties,
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[x, 0.0], [x + 1.0, 0.0], [x + 1.0, 1.0], [x, 1.0], [x, 0.0]]]
            }
        })
    }

    fn collection(features: Vec<JsonValue>) -> String {
        json!({ "type": "FeatureCollection", "features": features }).to_string()
    }

    #[test]
    fn loads_parcels_in_file_order() {
        let path = write_temp(
            "parcels.geojson",
            &collection(vec![
                square_feature(0.0, &json!({ "id": "a" })),
                square_feature(5.0, &json!({ "id": "b" })),
            ]),
        );

        let layer = load_parcels(&path).unwrap();
        assert_eq!(layer.parcels.len(), 2);
        assert_eq!(layer.features.len(), 2);
        assert_eq!(layer.parcels[1].index(), 1);
        assert!(layer.parcels[1].representative_point().x() > 5.0);
        assert_eq!(
            layer.features[0].property("id"),
            Some(&JsonValue::from("a"))
        );
    }

    #[test]
    fn point_parcel_is_rejected() {
        let path = write_temp(
            "point_parcels.geojson",
            &collection(vec![json!({
                "type": "Feature",
                "properties": {},
                "geometry": { "type": "Point", "coordinates": [1.0, 2.0] }
            })]),
        );

        let err = load_parcels(&path).err().unwrap();
        assert!(matches!(
            err,
            LayerError::Spatial(SpatialError::NonPolygonal { index: 0, .. })
        ));
    }

    #[test]
    fn feature_without_geometry_is_rejected() {
        let path = write_temp(
            "null_geometry.geojson",
            &collection(vec![json!({
                "type": "Feature",
                "properties": {},
                "geometry": null
            })]),
        );

        let err = load_reference_layer(Criterion::Bus, &path).err().unwrap();
        assert!(matches!(
            err,
            LayerError::MissingGeometry { ref layer, index: 0 } if layer == "bus"
        ));
    }

    #[test]
    fn reference_layer_accepts_points() {
        let path = write_temp(
            "stops.geojson",
            &collection(vec![json!({
                "type": "Feature",
                "properties": {},
                "geometry": { "type": "Point", "coordinates": [3.0, 0.5] }
            })]),
        );

        let layer = load_reference_layer(Criterion::Rail, &path).unwrap();
        assert_eq!(layer.name(), "rail");
        assert_eq!(layer.len(), 1);
    }

    #[test]
    fn empty_reference_layer_is_fatal() {
        let path = write_temp("empty.geojson", &collection(Vec::new()));
        let err = load_reference_layer(Criterion::Health, &path).err().unwrap();
        assert!(matches!(
            err,
            LayerError::Spatial(SpatialError::EmptyLayer { .. })
        ));
    }

    #[test]
    fn empty_parcel_layer_is_fatal() {
        let path = write_temp("empty_parcels.geojson", &collection(Vec::new()));
        let err = load_parcels(&path).err().unwrap();
        assert!(matches!(
            err,
            LayerError::Spatial(SpatialError::EmptyLayer { ref layer }) if layer == Parcel::LAYER
        ));
    }

    #[test]
    fn bare_geometry_is_not_a_collection() {
        let path = write_temp(
            "bare.geojson",
            r#"{ "type": "Point", "coordinates": [0.0, 0.0] }"#,
        );
        let err = read_features(&path).unwrap_err();
        assert!(matches!(err, LayerError::NotFeatureCollection { .. }));
    }

    #[test]
    fn malformed_json_is_reported() {
        let path = write_temp("broken.geojson", "{ not json");
        assert!(matches!(
            read_features(&path).unwrap_err(),
            LayerError::GeoJson { .. }
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let path = std::env::temp_dir().join("urban_index_io_does_not_exist.geojson");
        assert!(matches!(
            read_features(&path).unwrap_err(),
            LayerError::Io { .. }
        ));
    }

    #[test]
    fn noise_layer_reads_numeric_and_text_decibels() {
        let path = write_temp(
            "noise.geojson",
            &collection(vec![
                square_feature(0.0, &json!({ "DB_HI": 52.5 })),
                square_feature(2.0, &json!({ "DB_HI": "67" })),
            ]),
        );

        let index = load_noise_layer(&path, "DB_HI").unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.lookup(point!(x: 0.5, y: 0.5)), Some(52.5));
        assert_eq!(index.lookup(point!(x: 2.5, y: 0.5)), Some(67.0));
    }

    #[test]
    fn noise_layer_requires_attribute() {
        let path = write_temp(
            "noise_missing.geojson",
            &collection(vec![
                square_feature(0.0, &json!({ "DB_HI": 50 })),
                square_feature(2.0, &json!({ "DB_LO": 40 })),
            ]),
        );

        let err = load_noise_layer(&path, "DB_HI").err().unwrap();
        assert!(matches!(
            err,
            LayerError::MissingAttribute { index: 1, ref attribute, .. } if attribute == "DB_HI"
        ));
    }

    #[test]
    fn null_decibels_count_as_missing() {
        let path = write_temp(
            "noise_null.geojson",
            &collection(vec![square_feature(0.0, &json!({ "DB_HI": null }))]),
        );
        assert!(matches!(
            load_noise_layer(&path, "DB_HI").err().unwrap(),
            LayerError::MissingAttribute { index: 0, .. }
        ));
    }

    #[test]
    fn noise_layer_rejects_non_numeric_attribute() {
        let path = write_temp(
            "noise_text.geojson",
            &collection(vec![square_feature(0.0, &json!({ "DB_HI": "loud" }))]),
        );

        let err = load_noise_layer(&path, "DB_HI").err().unwrap();
        assert!(matches!(err, LayerError::NonNumericAttribute { index: 0, .. }));
    }

    #[test]
    fn noise_attribute_name_is_configurable() {
        let path = write_temp(
            "noise_custom.geojson",
            &collection(vec![square_feature(0.0, &json!({ "lden": 71.0 }))]),
        );
        let index = load_noise_layer(&path, "lden").unwrap();
        assert_eq!(index.lookup(point!(x: 0.5, y: 0.5)), Some(71.0));
    }

    fn config_with_parcels(parcels: std::path::PathBuf) -> IndexConfig {
        use std::path::PathBuf;

        use urban_index_models::{LayerPaths, NoiseSettings};

        let point = write_temp(
            "cfg_point.geojson",
            &collection(vec![json!({
                "type": "Feature",
                "properties": {},
                "geometry": { "type": "Point", "coordinates": [-1.0, 0.5] }
            })]),
        );
        let noise = write_temp(
            "cfg_noise.geojson",
            &collection(vec![square_feature(0.0, &json!({ "DB_HI": 60 }))]),
        );

        IndexConfig {
            output: PathBuf::from("out.geojson"),
            summary: None,
            layers: LayerPaths {
                parcels,
                green_space: point.clone(),
                rail: point.clone(),
                bus: point.clone(),
                health: point.clone(),
                education: point.clone(),
                sports: point,
                noise,
            },
            noise: NoiseSettings::default(),
        }
    }

    #[test]
    fn loads_every_layer_from_config() {
        use urban_index_scoring::progress::NullProgress;

        let parcels = write_temp(
            "cfg_parcels.geojson",
            &collection(vec![
                square_feature(0.0, &json!({})),
                square_feature(3.0, &json!({})),
            ]),
        );

        let (inputs, features) = load_inputs(&config_with_parcels(parcels), &NullProgress).unwrap();
        assert_eq!(inputs.parcels.len(), 2);
        assert_eq!(features.len(), 2);
        for criterion in Criterion::ALL {
            assert_eq!(inputs.layers.get(criterion).name(), criterion.as_ref());
        }
        assert_eq!(inputs.noise.len(), 1);
    }

    #[test]
    fn load_inputs_rejects_empty_parcel_layer() {
        use urban_index_scoring::progress::NullProgress;

        let parcels = write_temp("cfg_empty_parcels.geojson", &collection(Vec::new()));
        let err = load_inputs(&config_with_parcels(parcels), &NullProgress)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            LayerError::Spatial(SpatialError::EmptyLayer { .. })
        ));
    }
}
