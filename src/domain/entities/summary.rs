use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Roll-up numbers shown on the summary cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SummaryStats {
    pub record_count: usize,
    pub total_enrollments: u64,
    pub distinct_states: usize,
    pub distinct_districts: usize,
}

/// How `state` and `district` labels are compared when filtering and
/// counting distinct values. Upstream labels vary in case and spacing, so
/// `Exact` can under-count; the choice is left to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizationPolicy {
    #[default]
    Exact,
    CaseInsensitiveTrimmed,
}

impl NormalizationPolicy {
    pub fn normalize<'a>(self, value: &'a str) -> Cow<'a, str> {
        match self {
            NormalizationPolicy::Exact => Cow::Borrowed(value),
            NormalizationPolicy::CaseInsensitiveTrimmed => Cow::Owned(value.trim().to_lowercase()),
        }
    }

    pub fn matches(self, left: &str, right: &str) -> bool {
        match self {
            NormalizationPolicy::Exact => left == right,
            NormalizationPolicy::CaseInsensitiveTrimmed => {
                self.normalize(left) == self.normalize(right)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTotal {
    pub state: String,
    pub total_enrollments: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub month: String,
    pub total: u64,
}

/// Chart view-model: one shaded region per location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoroplethPoint {
    pub location: String,
    pub value: u64,
    pub label: String,
}
