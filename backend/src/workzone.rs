use serde::{Deserialize, Serialize};

use crate::models::WorkzoneRange;

/// Workzone bound selection on the selected lane.
///
/// Bounds are kept in click order; [`WorkzoneSelector::range`] normalizes
/// them for consumers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WorkzoneSelector {
    #[default]
    Empty,
    OneSelected { index: usize },
    Bounded { first: usize, second: usize },
}

impl WorkzoneSelector {
    /// Apply a projected click index.
    pub fn select(self, k: usize) -> Self {
        match self {
            Self::Empty => Self::OneSelected { index: k },
            Self::OneSelected { index } if index == k => self,
            Self::OneSelected { index } => Self::Bounded {
                first: index,
                second: k,
            },
            Self::Bounded { .. } => Self::OneSelected { index: k },
        }
    }

    pub fn reset(self) -> Self {
        Self::Empty
    }

    pub fn selected_count(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::OneSelected { .. } => 1,
            Self::Bounded { .. } => 2,
        }
    }

    /// Normalized bounds, only once both have been chosen.
    pub fn range(&self) -> Option<WorkzoneRange> {
        match *self {
            Self::Bounded { first, second } => Some(WorkzoneRange::from_bounds(first, second)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_click_selects_one() {
        assert_eq!(
            WorkzoneSelector::Empty.select(4),
            WorkzoneSelector::OneSelected { index: 4 }
        );
    }

    #[test]
    fn duplicate_click_is_ignored() {
        let one = WorkzoneSelector::OneSelected { index: 4 };
        assert_eq!(one.select(4), one);
    }

    #[test]
    fn second_click_keeps_click_order() {
        assert_eq!(
            WorkzoneSelector::OneSelected { index: 9 }.select(2),
            WorkzoneSelector::Bounded {
                first: 9,
                second: 2
            }
        );
    }

    #[test]
    fn click_after_bounded_restarts() {
        let bounded = WorkzoneSelector::Bounded {
            first: 1,
            second: 5,
        };
        assert_eq!(bounded.select(1), WorkzoneSelector::OneSelected { index: 1 });
        assert_eq!(bounded.select(7), WorkzoneSelector::OneSelected { index: 7 });
    }

    #[test]
    fn reset_from_any_state() {
        for state in [
            WorkzoneSelector::Empty,
            WorkzoneSelector::OneSelected { index: 3 },
            WorkzoneSelector::Bounded {
                first: 3,
                second: 8,
            },
        ] {
            assert_eq!(state.reset(), WorkzoneSelector::Empty);
        }
    }

    #[test]
    fn range_is_normalized_and_only_when_bounded() {
        assert_eq!(WorkzoneSelector::Empty.range(), None);
        assert_eq!(WorkzoneSelector::OneSelected { index: 3 }.range(), None);
        assert_eq!(
            WorkzoneSelector::Bounded {
                first: 8,
                second: 3
            }
            .range(),
            Some(WorkzoneRange { start: 3, end: 8 })
        );
    }

    #[test]
    fn selected_count_tracks_state() {
        let mut state = WorkzoneSelector::default();
        let mut counts = vec![state.selected_count()];
        for k in [2, 2, 6, 1] {
            state = state.select(k);
            counts.push(state.selected_count());
        }
        assert_eq!(counts, vec![0, 1, 1, 2, 1]);
    }
}
