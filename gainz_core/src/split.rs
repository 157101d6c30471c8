//! Weekly split selection.

use crate::types::{DayFocus, Experience};

/// Repeating pattern for five or more training days
const HIGH_FREQUENCY_PATTERN: [DayFocus; 5] = [
    DayFocus::Push,
    DayFocus::Pull,
    DayFocus::Legs,
    DayFocus::Upper,
    DayFocus::Lower,
];

pub struct SplitPlanner;

impl SplitPlanner {
    /// Pick the day foci for a weekly frequency and experience level
    ///
    /// - 2 days: full body twice
    /// - 3 days: push, pull, legs
    /// - 4 days: upper/lower for novices, otherwise push, pull, legs, accessory
    /// - 5-7 days: push, pull, legs, upper, lower, repeated to the requested count
    /// - anything else: full body twice
    pub fn choose_split(weekly_frequency: u8, experience: Experience) -> Vec<DayFocus> {
        use DayFocus::*;

        match (weekly_frequency, experience) {
            (2, _) => vec![FullBody, FullBody],
            (3, _) => vec![Push, Pull, Legs],
            (4, Experience::Novice) => vec![Upper, Lower, Upper, Lower],
            (4, _) => vec![Push, Pull, Legs, Accessory],
            (5..=7, _) => HIGH_FREQUENCY_PATTERN
                .iter()
                .copied()
                .cycle()
                .take(usize::from(weekly_frequency))
                .collect(),
            (other, _) => {
                tracing::warn!(
                    "Unsupported weekly frequency {}, falling back to full body split",
                    other
                );
                vec![FullBody, FullBody]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use DayFocus::*;

    #[test]
    fn test_three_days_is_push_pull_legs() {
        for experience in [Experience::Novice, Experience::Intermediate, Experience::Advanced] {
            assert_eq!(SplitPlanner::choose_split(3, experience), vec![Push, Pull, Legs]);
        }
    }

    #[test]
    fn test_four_days_depends_on_experience() {
        assert_eq!(
            SplitPlanner::choose_split(4, Experience::Novice),
            vec![Upper, Lower, Upper, Lower]
        );
        assert_eq!(
            SplitPlanner::choose_split(4, Experience::Advanced),
            vec![Push, Pull, Legs, Accessory]
        );
    }

    #[test]
    fn test_high_frequency_matches_requested_count() {
        assert_eq!(
            SplitPlanner::choose_split(5, Experience::Intermediate),
            vec![Push, Pull, Legs, Upper, Lower]
        );
        assert_eq!(
            SplitPlanner::choose_split(6, Experience::Intermediate),
            vec![Push, Pull, Legs, Upper, Lower, Push]
        );
        assert_eq!(SplitPlanner::choose_split(7, Experience::Advanced).len(), 7);
    }

    #[test]
    fn test_unsupported_frequency_falls_back() {
        assert_eq!(SplitPlanner::choose_split(1, Experience::Novice), vec![FullBody, FullBody]);
        assert_eq!(SplitPlanner::choose_split(9, Experience::Advanced), vec![FullBody, FullBody]);
        assert_eq!(SplitPlanner::choose_split(2, Experience::Advanced), vec![FullBody, FullBody]);
    }
}
