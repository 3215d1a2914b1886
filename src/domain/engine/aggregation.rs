use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::domain::entities::enrollment::{parse_enrollment_date, EnrollmentRecord};
use crate::domain::entities::summary::{
    ChoroplethPoint, NormalizationPolicy, StateTotal, SummaryStats, TimelinePoint,
};

/// Summary over `records` with exact label comparison.
pub fn summarize(records: &[EnrollmentRecord]) -> SummaryStats {
    summarize_with(records, NormalizationPolicy::Exact)
}

pub fn summarize_with(records: &[EnrollmentRecord], policy: NormalizationPolicy) -> SummaryStats {
    let mut states = HashSet::new();
    let mut districts = HashSet::new();
    let mut total_enrollments = 0_u64;

    for record in records {
        total_enrollments = total_enrollments.saturating_add(record.total());

        let state = policy.normalize(&record.state);
        if !state.is_empty() {
            states.insert(state);
        }
        let district = policy.normalize(&record.district);
        if !district.is_empty() {
            districts.insert(district);
        }
    }

    SummaryStats {
        record_count: records.len(),
        total_enrollments,
        distinct_states: states.len(),
        distinct_districts: districts.len(),
    }
}

/// States ranked by total enrollments, largest first, ties by name.
pub fn state_distribution(records: &[EnrollmentRecord], limit: usize) -> Vec<StateTotal> {
    let mut totals: HashMap<&str, u64> = HashMap::new();
    for record in records.iter().filter(|record| !record.state.is_empty()) {
        let entry = totals.entry(record.state.as_str()).or_default();
        *entry = entry.saturating_add(record.total());
    }

    let mut ranked: Vec<StateTotal> = totals
        .into_iter()
        .map(|(state, total_enrollments)| StateTotal {
            state: state.to_string(),
            total_enrollments,
        })
        .collect();
    ranked.sort_by(|left, right| {
        right
            .total_enrollments
            .cmp(&left.total_enrollments)
            .then_with(|| left.state.cmp(&right.state))
    });
    ranked.truncate(limit);
    ranked
}

/// Monthly totals keyed `YYYY-MM-01`, oldest first. Undated rows are skipped.
pub fn enrollment_timeline(records: &[EnrollmentRecord]) -> Vec<TimelinePoint> {
    let mut months: BTreeMap<String, u64> = BTreeMap::new();
    for record in records {
        let Some(date) = parse_enrollment_date(&record.date) else {
            continue;
        };
        let entry = months.entry(date.format("%Y-%m").to_string()).or_default();
        *entry = entry.saturating_add(record.total());
    }

    months
        .into_iter()
        .map(|(month, total)| TimelinePoint {
            month: format!("{month}-01"),
            total,
        })
        .collect()
}

/// Sorted distinct non-empty state labels, as stored.
pub fn known_states(records: &[EnrollmentRecord]) -> Vec<String> {
    records
        .iter()
        .filter(|record| !record.state.is_empty())
        .map(|record| record.state.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn choropleth(records: &[EnrollmentRecord]) -> Vec<ChoroplethPoint> {
    let mut points: Vec<ChoroplethPoint> = state_distribution(records, usize::MAX)
        .into_iter()
        .map(|entry| ChoroplethPoint {
            label: format!("{}: {} enrollments", entry.state, entry.total_enrollments),
            location: entry.state,
            value: entry.total_enrollments,
        })
        .collect();
    points.sort_by(|left, right| left.location.cmp(&right.location));
    points
}
