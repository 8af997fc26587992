//! Stage 3: summed quartile ranks per criterion group.

use urban_index_models::{CriterionGroup, PerCriterion, QuartileRank};

use crate::quartile::QuartileTable;

/// One value per criterion group for a single parcel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroupValues {
    pub green_space: u8,
    pub transport: u8,
    pub services: u8,
}

impl GroupValues {
    #[must_use]
    pub const fn get(&self, group: CriterionGroup) -> u8 {
        match group {
            CriterionGroup::GreenSpace => self.green_space,
            CriterionGroup::Transport => self.transport,
            CriterionGroup::Services => self.services,
        }
    }

    /// Builds a value set by evaluating `f` once per group.
    pub fn from_fn(mut f: impl FnMut(CriterionGroup) -> u8) -> Self {
        Self {
            green_space: f(CriterionGroup::GreenSpace),
            transport: f(CriterionGroup::Transport),
            services: f(CriterionGroup::Services),
        }
    }
}

/// Sum of the members' quartile ranks. Lies in
/// `[group.theoretical_min(), group.theoretical_max()]`.
#[must_use]
pub fn sum_ranks(group: CriterionGroup, ranks: &PerCriterion<QuartileRank>) -> u8 {
    group
        .members()
        .iter()
        .map(|criterion| ranks[*criterion].value())
        .sum()
}

/// Per-parcel group sums, in parcel order.
#[must_use]
pub fn aggregate(quartiles: &QuartileTable) -> Vec<GroupValues> {
    let sums: Vec<GroupValues> = (0..quartiles.parcel_count())
        .map(|parcel| {
            let ranks = quartiles.row(parcel);
            GroupValues::from_fn(|group| sum_ranks(group, &ranks))
        })
        .collect();

    log::info!("Summed quartile ranks for {} parcels", sums.len());

    sums
}
