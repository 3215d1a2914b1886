use std::collections::HashMap;

use crate::domain::entities::dataset::DatasetKind;
use crate::domain::entities::enrollment::{parse_enrollment_date, EnrollmentRecord};

/// Column positions of one upstream layout, resolved from its header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    date: Option<usize>,
    state: usize,
    district: Option<usize>,
    pincode: Option<usize>,
    counts: [Option<usize>; 3],
}

impl ColumnMap {
    pub fn resolve<S: AsRef<str>>(headers: &[S], kind: DatasetKind) -> anyhow::Result<Self> {
        let position = |name: &str| {
            headers
                .iter()
                .position(|header| header.as_ref().trim().eq_ignore_ascii_case(name))
        };

        let Some(state) = position("state") else {
            anyhow::bail!("{} header must include a state column", kind.as_str())
        };
        let counts = kind.count_columns().map(|column| column.and_then(position));
        if counts.iter().all(Option::is_none) {
            anyhow::bail!(
                "{} header has none of the expected count columns",
                kind.as_str()
            )
        }

        Ok(Self {
            date: position("date"),
            state,
            district: position("district"),
            pincode: position("pincode"),
            counts,
        })
    }

    /// Maps one data row. Rows without a state are dropped.
    pub fn record<S: AsRef<str>>(&self, row: &[S]) -> Option<EnrollmentRecord> {
        let cell = |idx: Option<usize>| {
            idx.and_then(|idx| row.get(idx))
                .map(|value| value.as_ref().trim())
                .unwrap_or("")
        };

        let state = cell(Some(self.state));
        if state.is_empty() {
            return None;
        }

        let raw_date = cell(self.date);
        let date = parse_enrollment_date(raw_date)
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| raw_date.to_string());
        let [age_0_5, age_5_17, age_18_greater] = self.counts.map(|idx| parse_count(cell(idx)));

        Some(
            EnrollmentRecord::new(&date, state, cell(self.district), [age_0_5, age_5_17, age_18_greater])
                .with_pincode(cell(self.pincode)),
        )
    }
}

/// Reads a count the way the upstream exports need: digits only, so
/// `"1,204"` is 1204 and anything without digits is 0.
pub fn parse_count(value: &str) -> u64 {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

/// Merges rows sharing `(date, state, district, pincode)` by summing their
/// counts. First-seen order is kept.
pub fn consolidate(records: Vec<EnrollmentRecord>) -> Vec<EnrollmentRecord> {
    let mut positions = HashMap::new();
    let mut merged: Vec<EnrollmentRecord> = Vec::with_capacity(records.len());

    for record in records {
        let key = record.location_day_key();
        match positions.get(&key).copied() {
            Some(idx) => {
                let existing: &mut EnrollmentRecord = &mut merged[idx];
                existing.age_0_5 = existing.age_0_5.saturating_add(record.age_0_5);
                existing.age_5_17 = existing.age_5_17.saturating_add(record.age_5_17);
                existing.age_18_greater =
                    existing.age_18_greater.saturating_add(record.age_18_greater);
            }
            None => {
                positions.insert(key, merged.len());
                merged.push(record);
            }
        }
    }

    merged
}
