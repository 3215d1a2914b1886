use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImportId(pub i64);

impl From<i64> for ImportId {
    fn from(value: i64) -> Self {
        ImportId(value)
    }
}

impl From<ImportId> for i64 {
    fn from(value: ImportId) -> Self {
        value.0
    }
}

/// Upstream dataset layout. Each one names its age-band columns differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Enrollment,
    Demographic,
    Biometric,
}

impl DatasetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DatasetKind::Enrollment => "enrollment",
            DatasetKind::Demographic => "demographic",
            DatasetKind::Biometric => "biometric",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "enrollment" => Some(DatasetKind::Enrollment),
            "demographic" => Some(DatasetKind::Demographic),
            "biometric" => Some(DatasetKind::Biometric),
            _ => None,
        }
    }

    /// Source headers for the `age_0_5`, `age_5_17` and `age_18_greater` bands.
    pub fn count_columns(self) -> [Option<&'static str>; 3] {
        match self {
            DatasetKind::Enrollment => [Some("age_0_5"), Some("age_5_17"), Some("age_18_greater")],
            DatasetKind::Demographic => [None, Some("demo_age_5_17"), Some("demo_age_17_")],
            DatasetKind::Biometric => [None, Some("bio_age_5_17"), Some("bio_age_17_")],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportMeta {
    pub id: ImportId,
    pub kind: DatasetKind,
    pub source_path: String,
    pub row_count: i64,
    pub imported_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportResult {
    pub import_id: ImportId,
    pub row_count: i64,
}
