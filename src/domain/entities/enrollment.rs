use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// One row of age-banded enrollment counts for a date and location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub district: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pincode: Option<String>,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub age_0_5: u64,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub age_5_17: u64,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub age_18_greater: u64,
}

fn count_or_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or(0))
}

impl EnrollmentRecord {
    pub fn new(date: &str, state: &str, district: &str, counts: [u64; 3]) -> Self {
        Self {
            date: date.to_string(),
            state: state.to_string(),
            district: district.to_string(),
            pincode: None,
            age_0_5: counts[0],
            age_5_17: counts[1],
            age_18_greater: counts[2],
        }
    }

    pub fn with_pincode(mut self, pincode: &str) -> Self {
        self.pincode = Some(pincode.to_string()).filter(|code| !code.is_empty());
        self
    }

    /// Sum of the three age bands.
    pub fn total(&self) -> u64 {
        self.age_0_5
            .saturating_add(self.age_5_17)
            .saturating_add(self.age_18_greater)
    }

    /// Text value of a string field, `None` for numeric fields.
    pub fn text(&self, field: RecordField) -> Option<&str> {
        match field {
            RecordField::Date => Some(&self.date),
            RecordField::State => Some(&self.state),
            RecordField::District => Some(&self.district),
            RecordField::Pincode => Some(self.pincode.as_deref().unwrap_or("")),
            _ => None,
        }
    }

    /// Count value of a numeric field, `None` for string fields.
    pub fn count(&self, field: RecordField) -> Option<u64> {
        match field {
            RecordField::Age0To5 => Some(self.age_0_5),
            RecordField::Age5To17 => Some(self.age_5_17),
            RecordField::Age18Greater => Some(self.age_18_greater),
            _ => None,
        }
    }

    /// Key under which duplicate upstream rows are merged on import.
    pub fn location_day_key(&self) -> (String, String, String, String) {
        (
            self.date.clone(),
            self.state.clone(),
            self.district.clone(),
            self.pincode.clone().unwrap_or_default(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordField {
    #[serde(rename = "date")]
    Date,
    #[serde(rename = "state")]
    State,
    #[serde(rename = "district")]
    District,
    #[serde(rename = "pincode")]
    Pincode,
    #[serde(rename = "age_0_5")]
    Age0To5,
    #[serde(rename = "age_5_17")]
    Age5To17,
    #[serde(rename = "age_18_greater")]
    Age18Greater,
}

impl RecordField {
    pub const ALL: [RecordField; 7] = [
        RecordField::Date,
        RecordField::State,
        RecordField::District,
        RecordField::Pincode,
        RecordField::Age0To5,
        RecordField::Age5To17,
        RecordField::Age18Greater,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RecordField::Date => "date",
            RecordField::State => "state",
            RecordField::District => "district",
            RecordField::Pincode => "pincode",
            RecordField::Age0To5 => "age_0_5",
            RecordField::Age5To17 => "age_5_17",
            RecordField::Age18Greater => "age_18_greater",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            RecordField::Age0To5 | RecordField::Age5To17 | RecordField::Age18Greater
        )
    }
}

impl std::fmt::Display for RecordField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts `YYYY-MM-DD` and the `DD-MM-YYYY` form found in raw exports.
pub fn parse_enrollment_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let first = value.split('-').next()?;
    let format = if first.len() == 4 { "%Y-%m-%d" } else { "%d-%m-%Y" };
    NaiveDate::parse_from_str(value, format).ok()
}
