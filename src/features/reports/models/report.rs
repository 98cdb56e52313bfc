use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use super::DateRange;

/// Report category. Each category is served by its own registry and workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportCategory {
    Alarm,
    Audit,
}

impl ReportCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportCategory::Alarm => "alarm",
            ReportCategory::Audit => "audit",
        }
    }

    /// Whether the generation request carries the requester's username.
    ///
    /// Audit generation is anonymous on the backend, so audit listings may
    /// have no `generatedBy`.
    pub fn sends_username(&self) -> bool {
        matches!(self, ReportCategory::Alarm)
    }
}

impl std::fmt::Display for ReportCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Operator username, trimmed and non-empty
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Review state of a stored report. `Reviewed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Generated,
    Reviewed,
}

/// Stored report record as listed by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: i64,
    #[serde(default)]
    pub report_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub generated_on: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_identity")]
    pub generated_by: Option<Identity>,
    #[serde(default, deserialize_with = "deserialize_identity")]
    pub reviewed_by: Option<Identity>,
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub review_date: Option<DateTime<Utc>>,
    /// Known only for reports generated through this service; never read from a listing
    #[serde(default, skip_deserializing)]
    pub date_range_covered: Option<DateRange>,
}

impl Report {
    pub fn is_reviewed(&self) -> bool {
        self.reviewed_by.is_some()
    }

    pub fn status(&self) -> ReportStatus {
        if self.is_reviewed() {
            ReportStatus::Reviewed
        } else {
            ReportStatus::Generated
        }
    }

    pub fn is_generated_by(&self, user: &Identity) -> bool {
        self.generated_by.as_ref() == Some(user)
    }
}

/// Blank usernames from the backend mean "nobody"
fn deserialize_identity<'de, D>(deserializer: D) -> Result<Option<Identity>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(Identity::new))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    EpochMillis(i64),
    Text(String),
}

/// Backend timestamps arrive either as epoch milliseconds or as text.
/// Non-positive epochs are the backend's "not set" marker.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawTimestamp>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawTimestamp::EpochMillis(millis)) if millis <= 0 => Ok(None),
        Some(RawTimestamp::EpochMillis(millis)) => DateTime::from_timestamp_millis(millis)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("timestamp out of range: {}", millis))),
        Some(RawTimestamp::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(RawTimestamp::Text(text)) => parse_timestamp_text(text.trim())
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("unrecognized timestamp: '{}'", text))),
    }
}

fn parse_timestamp_text(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|pattern| NaiveDateTime::parse_from_str(text, pattern).ok())
        .map(|naive| naive.and_utc())
}
