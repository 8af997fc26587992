#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Criterion taxonomy and ordinal score types for the urban context
//! vulnerability index.
//!
//! Every parcel is scored on four criteria: proximity to green space,
//! proximity to public transport, proximity to basic services, and
//! traffic-noise exposure. The first three are built from six proximity
//! sub-criteria (one reference layer each) which are ranked into
//! population quartiles, summed per [`CriterionGroup`], and rescaled onto
//! the fixed ordinal range 1-4. Noise is classified into a [`NoiseBand`].

pub mod config;
pub mod report;

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use config::{IndexConfig, LayerPaths, MissingNoisePolicy, NoiseSettings};
pub use report::{DegenerateDistribution, QuartileBoundaries, RunReport};

/// Lowest score any single criterion can contribute once finalized.
pub const MIN_ORDINAL: u8 = 1;

/// Highest score any single criterion can contribute once finalized.
pub const MAX_ORDINAL: u8 = 4;

/// A proximity sub-criterion, backed by exactly one reference layer.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Criterion {
    /// Parks and other green-space polygons.
    GreenSpace,
    /// Rail / metro stops.
    Rail,
    /// Bus stops.
    Bus,
    /// Health centers.
    Health,
    /// Educational centers.
    Education,
    /// Sports facilities.
    Sports,
}

impl Criterion {
    /// All proximity sub-criteria in canonical (column) order.
    pub const ALL: [Self; 6] = [
        Self::GreenSpace,
        Self::Rail,
        Self::Bus,
        Self::Health,
        Self::Education,
        Self::Sports,
    ];

    /// Position of this criterion in [`Self::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The semantic group this sub-criterion is summed into.
    #[must_use]
    pub const fn group(self) -> CriterionGroup {
        match self {
            Self::GreenSpace => CriterionGroup::GreenSpace,
            Self::Rail | Self::Bus => CriterionGroup::Transport,
            Self::Health | Self::Education | Self::Sports => CriterionGroup::Services,
        }
    }
}

/// A proximity criterion group. Quartile ranks of the members are summed
/// and, for multi-member groups, rescaled onto 1-4.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CriterionGroup {
    /// Green space (single sub-criterion).
    GreenSpace,
    /// Rail + bus.
    Transport,
    /// Health + education + sports.
    Services,
}

impl CriterionGroup {
    pub const ALL: [Self; 3] = [Self::GreenSpace, Self::Transport, Self::Services];

    /// Sub-criteria belonging to this group.
    #[must_use]
    pub const fn members(self) -> &'static [Criterion] {
        match self {
            Self::GreenSpace => &[Criterion::GreenSpace],
            Self::Transport => &[Criterion::Rail, Criterion::Bus],
            Self::Services => &[Criterion::Health, Criterion::Education, Criterion::Sports],
        }
    }

    /// Number of sub-criteria in the group.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn cardinality(self) -> u8 {
        self.members().len() as u8
    }

    /// Smallest possible summed rank: every member in the first quartile.
    #[must_use]
    pub const fn theoretical_min(self) -> u8 {
        self.cardinality() * MIN_ORDINAL
    }

    /// Largest possible summed rank: every member in the fourth quartile.
    #[must_use]
    pub const fn theoretical_max(self) -> u8 {
        self.cardinality() * MAX_ORDINAL
    }
}

/// Fixed-size map from each [`Criterion`] to a value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerCriterion<T>([T; 6]);

impl<T> PerCriterion<T> {
    /// Builds the map by evaluating `f` once per criterion, in canonical order.
    pub fn from_fn(mut f: impl FnMut(Criterion) -> T) -> Self {
        Self(Criterion::ALL.map(&mut f))
    }

    /// Iterates `(criterion, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Criterion, &T)> {
        Criterion::ALL.into_iter().zip(self.0.iter())
    }
}

impl<T> Index<Criterion> for PerCriterion<T> {
    type Output = T;

    fn index(&self, criterion: Criterion) -> &T {
        &self.0[criterion.index()]
    }
}

impl<T> IndexMut<Criterion> for PerCriterion<T> {
    fn index_mut(&mut self, criterion: Criterion) -> &mut T {
        &mut self.0[criterion.index()]
    }
}

/// Quartile of a parcel within the population's distance distribution
/// for one criterion. `First` is the most proximate quarter.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum QuartileRank {
    First = 1,
    Second = 2,
    Third = 3,
    Fourth = 4,
}

impl QuartileRank {
    pub const ALL: [Self; 4] = [Self::First, Self::Second, Self::Third, Self::Fourth];

    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }
}

/// Traffic-noise exposure band derived from a decibel reading.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NoiseBand {
    /// `[0, 45)` dB
    Quiet = 1,
    /// `[45, 55)` dB
    Moderate = 2,
    /// `[55, 65)` dB
    Loud = 3,
    /// `[65, 100]` dB
    VeryLoud = 4,
}

impl NoiseBand {
    /// Lowest decibel value that can be banded (inclusive).
    pub const DECIBEL_FLOOR: f64 = 0.0;
    /// Highest decibel value that can be banded (inclusive).
    pub const DECIBEL_CEILING: f64 = 100.0;
    /// Lower edges of `Moderate`, `Loud` and `VeryLoud`.
    pub const EDGES: [f64; 3] = [45.0, 55.0, 65.0];

    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Classifies a decibel reading.
    ///
    /// Bands are left-closed, and the top band also includes the ceiling.
    /// Readings outside `[0, 100]` (and NaN) have no band.
    #[must_use]
    pub fn from_decibels(db: f64) -> Option<Self> {
        if !(Self::DECIBEL_FLOOR..=Self::DECIBEL_CEILING).contains(&db) {
            return None;
        }

        let [moderate, loud, very_loud] = Self::EDGES;
        Some(if db < moderate {
            Self::Quiet
        } else if db < loud {
            Self::Moderate
        } else if db < very_loud {
            Self::Loud
        } else {
            Self::VeryLoud
        })
    }
}

/// Every derived attribute for one parcel, in input order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredParcel {
    /// Nearest-feature distance per proximity criterion.
    pub distances: PerCriterion<f64>,
    /// Population quartile per proximity criterion.
    pub ranks: PerCriterion<QuartileRank>,
    /// Summed quartile ranks (`sum_green_space` is the green-space rank).
    pub sum_green_space: u8,
    pub sum_transport: u8,
    pub sum_services: u8,
    /// Transport and services sums rescaled onto 1-4.
    pub norm_transport: u8,
    pub norm_services: u8,
    /// Decibel reading at the parcel's representative point, if any.
    pub decibels: Option<f64>,
    pub noise_band: Option<NoiseBand>,
    /// Composite index: green space + transport + services + noise.
    pub context_index: u8,
}
