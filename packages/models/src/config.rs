//! Run configuration, deserialized from TOML.
//!
//! A run file names the parcel layer, one reference layer per proximity
//! criterion, and the traffic-noise layer. See `config/example.toml` at
//! the workspace root for a documented example.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::{Criterion, NoiseBand};

/// Attribute carrying the decibel reading on the noise layer, unless
/// overridden.
pub const DEFAULT_DECIBEL_ATTRIBUTE: &str = "DB_HI";

/// A complete index run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexConfig {
    /// Destination of the scored parcel `GeoJSON`.
    pub output: PathBuf,
    /// Optional destination of the JSON run report.
    #[serde(default)]
    pub summary: Option<PathBuf>,
    pub layers: LayerPaths,
    #[serde(default)]
    pub noise: NoiseSettings,
}

impl IndexConfig {
    /// Rewrites every relative path so it is relative to `base` (normally
    /// the directory holding the config file).
    #[must_use]
    pub fn resolve_relative_to(mut self, base: &Path) -> Self {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };

        resolve(&mut self.output);
        if let Some(summary) = self.summary.as_mut() {
            resolve(summary);
        }
        for path in self.layers.paths_mut() {
            resolve(path);
        }

        self
    }
}

/// Input layer locations. All layers must share one planar CRS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerPaths {
    /// Residential parcel polygons.
    pub parcels: PathBuf,
    pub green_space: PathBuf,
    pub rail: PathBuf,
    pub bus: PathBuf,
    pub health: PathBuf,
    pub education: PathBuf,
    pub sports: PathBuf,
    /// Traffic-noise polygons carrying a decibel attribute.
    pub noise: PathBuf,
}

impl LayerPaths {
    /// Reference layer backing a proximity criterion.
    #[must_use]
    pub fn reference(&self, criterion: Criterion) -> &Path {
        match criterion {
            Criterion::GreenSpace => &self.green_space,
            Criterion::Rail => &self.rail,
            Criterion::Bus => &self.bus,
            Criterion::Health => &self.health,
            Criterion::Education => &self.education,
            Criterion::Sports => &self.sports,
        }
    }

    fn paths_mut(&mut self) -> [&mut PathBuf; 8] {
        [
            &mut self.parcels,
            &mut self.green_space,
            &mut self.rail,
            &mut self.bus,
            &mut self.health,
            &mut self.education,
            &mut self.sports,
            &mut self.noise,
        ]
    }
}

/// Noise-layer settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoiseSettings {
    #[serde(default = "default_decibel_attribute")]
    pub decibel_attribute: String,
    #[serde(default)]
    pub missing_policy: MissingNoisePolicy,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            decibel_attribute: default_decibel_attribute(),
            missing_policy: MissingNoisePolicy::default(),
        }
    }
}

fn default_decibel_attribute() -> String {
    DEFAULT_DECIBEL_ATTRIBUTE.to_string()
}

/// What the composite index adds for a parcel with no noise band.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MissingNoisePolicy {
    /// Contribute 0, so the index can fall below 4.
    #[default]
    Zero,
    /// Contribute the loudest band.
    Worst,
}

impl MissingNoisePolicy {
    /// Noise contribution for a parcel, applying this policy when the band
    /// is absent.
    #[must_use]
    pub fn contribution(self, band: Option<NoiseBand>) -> u8 {
        match (band, self) {
            (Some(band), _) => band.value(),
            (None, Self::Zero) => 0,
            (None, Self::Worst) => NoiseBand::VeryLoud.value(),
        }
    }
}
