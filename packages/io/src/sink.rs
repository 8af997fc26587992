//! Result sink: scored parcels as `GeoJSON`, run report as JSON.
//!
//! Nothing is written unless scoring completed, so a failed run never
//! leaves a partial output behind.

use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::Path;

use geojson::{Feature, FeatureCollection, JsonObject, JsonValue};
use serde::Serialize;
use urban_index_models::{Criterion, RunReport, ScoredParcel};

use crate::LayerError;

/// Attributes added to every parcel feature, keyed by output field name.
#[must_use]
pub fn scored_properties(row: &ScoredParcel) -> JsonObject {
    let mut props = JsonObject::new();

    for criterion in Criterion::ALL {
        props.insert(
            format!("dist_{criterion}"),
            JsonValue::from(row.distances[criterion]),
        );
        props.insert(
            format!("rank_{criterion}"),
            JsonValue::from(row.ranks[criterion].value()),
        );
    }

    props.insert("sum_green_space".into(), row.sum_green_space.into());
    props.insert("sum_transport".into(), row.sum_transport.into());
    props.insert("sum_services".into(), row.sum_services.into());
    props.insert("norm_transport".into(), row.norm_transport.into());
    props.insert("norm_services".into(), row.norm_services.into());
    props.insert(
        "db_veh".into(),
        row.decibels.map_or(JsonValue::Null, JsonValue::from),
    );
    props.insert(
        "noise_band".into(),
        row.noise_band
            .map_or(JsonValue::Null, |band| band.value().into()),
    );
    props.insert("context_index".into(), row.context_index.into());

    props
}

/// Writes the parcel features with the scored attributes merged into their
/// original properties. Scored fields replace same-named source fields.
///
/// # Errors
///
/// Returns [`LayerError`] if `features` and `rows` differ in length or the
/// file cannot be written.
pub fn write_scored_parcels(
    path: &Path,
    features: &[Feature],
    rows: &[ScoredParcel],
) -> Result<(), LayerError> {
    if features.len() != rows.len() {
        return Err(LayerError::RowCountMismatch {
            features: features.len(),
            rows: rows.len(),
        });
    }

    let features = features
        .iter()
        .zip(rows)
        .map(|(feature, row)| {
            let mut properties = feature.properties.clone().unwrap_or_default();
            properties.extend(scored_properties(row));
            Feature {
                properties: Some(properties),
                ..feature.clone()
            }
        })
        .collect();

    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };

    write_json(path, &collection)?;
    log::info!("Wrote {} scored parcels to {}", rows.len(), path.display());

    Ok(())
}

/// Writes the run report as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`LayerError`] if the file cannot be written.
pub fn write_report(path: &Path, report: &RunReport) -> Result<(), LayerError> {
    write_json(path, report)?;
    log::info!("Wrote run summary to {}", path.display());
    Ok(())
}

fn write_json(path: &Path, value: &impl Serialize) -> Result<(), LayerError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| LayerError::io(parent, e))?;
    }

    let file = File::create(path).map_err(|e| LayerError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush().map_err(|e| LayerError::io(path, e))?;

    Ok(())
}
