//! Stage 4: fixed-range renormalization of group sums onto 1-4.
//!
//! Rescaling uses each group's theoretical range, never the observed one,
//! so scores stay comparable across parcel populations and partial reruns.
//! Results are clamped to 1-4 and rounded half to even.

use urban_index_models::{CriterionGroup, MAX_ORDINAL, MIN_ORDINAL};

use crate::aggregate::GroupValues;

/// Maps `score` from `[min, max]` onto `[1, 4]` as
/// `1 + 3 * (score - min) / (max - min)`, clamped to 1-4 and rounded half
/// to even (`2.5 -> 2`, `3.5 -> 4`).
///
/// A degenerate range (`max <= min`) maps everything to 1.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn rescale(score: u8, min: u8, max: u8) -> u8 {
    if max <= min {
        return MIN_ORDINAL;
    }

    let lo = f64::from(MIN_ORDINAL);
    let hi = f64::from(MAX_ORDINAL);
    let scaled =
        lo + (hi - lo) * (f64::from(score) - f64::from(min)) / (f64::from(max) - f64::from(min));

    scaled.clamp(lo, hi).round_ties_even() as u8
}

/// Rescales a group sum using the group's theoretical range.
#[must_use]
pub fn normalize_group(group: CriterionGroup, sum: u8) -> u8 {
    rescale(sum, group.theoretical_min(), group.theoretical_max())
}

/// Per-parcel normalized scores. Green space has a single member, so its
/// rank passes through unchanged.
#[must_use]
pub fn normalize(sums: &[GroupValues]) -> Vec<GroupValues> {
    sums.iter()
        .map(|sum| GroupValues {
            green_space: sum.green_space,
            transport: normalize_group(CriterionGroup::Transport, sum.transport),
            services: normalize_group(CriterionGroup::Services, sum.services),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extremes_map_to_range_ends() {
        assert_eq!(rescale(2, 2, 8), 1);
        assert_eq!(rescale(8, 2, 8), 4);
        assert_eq!(rescale(3, 3, 12), 1);
        assert_eq!(rescale(12, 3, 12), 4);
    }

    #[test]
    fn midpoint_rounds_half_to_even() {
        // 1 + 3 * 3 / 6 = 2.5
        assert_eq!(rescale(5, 2, 8), 2);
        // 1 + 3 * 5 / 6 = 3.5
        assert_eq!(rescale(7, 2, 8), 4);
        // 1 + 3 * 1 / 6 = 1.5
        assert_eq!(rescale(3, 2, 8), 2);
    }

    #[test]
    fn transport_table() {
        let got: Vec<u8> = (2..=8)
            .map(|s| normalize_group(CriterionGroup::Transport, s))
            .collect();
        assert_eq!(got, vec![1, 2, 2, 2, 3, 4, 4]);
    }

    #[test]
    fn services_table() {
        let got: Vec<u8> = (3..=12)
            .map(|s| normalize_group(CriterionGroup::Services, s))
            .collect();
        assert_eq!(got, vec![1, 1, 2, 2, 2, 3, 3, 3, 4, 4]);
    }

    #[test]
    fn green_space_range_is_identity() {
        for rank in 1..=4 {
            assert_eq!(normalize_group(CriterionGroup::GreenSpace, rank), rank);
        }
    }

    #[test]
    fn clamps_below_and_above_range() {
        assert_eq!(rescale(0, 2, 8), 1);
        assert_eq!(rescale(1, 3, 12), 1);
        assert_eq!(rescale(200, 2, 8), 4);
        assert_eq!(rescale(13, 3, 12), 4);
    }

    #[test]
    fn degenerate_range_is_minimum() {
        assert_eq!(rescale(5, 5, 5), 1);
        assert_eq!(rescale(5, 8, 2), 1);
    }

    #[test]
    fn normalizes_every_parcel() {
        let sums = [
            GroupValues {
                green_space: 3,
                transport: 8,
                services: 3,
            },
            GroupValues {
                green_space: 1,
                transport: 5,
                services: 7,
            },
        ];
        assert_eq!(
            normalize(&sums),
            vec![
                GroupValues {
                    green_space: 3,
                    transport: 4,
                    services: 1,
                },
                GroupValues {
                    green_space: 1,
                    transport: 2,
                    services: 2,
                },
            ]
        );
    }
}
