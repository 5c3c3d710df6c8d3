use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::UnknownSortOption;

/// A single job posting as returned by the job service.
///
/// `link` is the only field the service guarantees; everything else may be
/// missing and falls back to its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub is_featured: bool,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub is_clicked: bool,
    #[serde(default)]
    pub application_success: Option<bool>,
    #[serde(default, deserialize_with = "nullable_count")]
    pub application_attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_application_date: Option<String>,
}

impl JobRecord {
    pub fn new(link: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            title: None,
            description: None,
            location: None,
            company: None,
            experience: None,
            publish_date: None,
            is_featured: false,
            is_clicked: false,
            application_success: None,
            application_attempts: 0,
            last_application_date: None,
        }
    }

    /// Parsed `publish_date`, or `None` when missing or unparsable.
    pub fn published_at(&self) -> Option<NaiveDateTime> {
        self.publish_date.as_deref().and_then(parse_service_date)
    }

    /// Featured rank used by the `featured` sort: false=0, true=1.
    pub fn featured_rank(&self) -> u8 {
        u8::from(self.is_featured)
    }
}

/// Parses the date strings the job service emits.
///
/// Accepts RFC 3339 timestamps, bare `YYYY-MM-DD` dates and naive
/// `YYYY-MM-DD[T ]HH:MM:SS` timestamps. Offsets are normalized to UTC.
pub fn parse_service_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.naive_utc());
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(parsed);
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(parsed);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagRepr {
    Bool(bool),
    Int(i64),
    Float(f64),
}

// The service has been observed sending both `true` and `1` for flags.
fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let repr = Option::<FlagRepr>::deserialize(deserializer)?;
    Ok(match repr {
        Some(FlagRepr::Bool(value)) => value,
        Some(FlagRepr::Int(value)) => value != 0,
        Some(FlagRepr::Float(value)) => value != 0.0,
        None => false,
    })
}

fn nullable_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u32>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOption {
    #[default]
    Recent,
    Featured,
    Oldest,
}

impl SortOption {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOption::Recent => "recent",
            SortOption::Featured => "featured",
            SortOption::Oldest => "oldest",
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOption {
    type Err = UnknownSortOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recent" => Ok(SortOption::Recent),
            "featured" => Ok(SortOption::Featured),
            "oldest" => Ok(SortOption::Oldest),
            _ => Err(UnknownSortOption(s.to_string())),
        }
    }
}

/// User-entered search, filter and sort state. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub search_term: String,
    pub location_filter: Option<String>,
    pub experience_filter: Option<String>,
    pub sort_option: SortOption,
}

impl FilterCriteria {
    pub fn with_search_term(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location_filter = Some(location.into());
        self
    }

    pub fn with_experience(mut self, experience: impl Into<String>) -> Self {
        self.experience_filter = Some(experience.into());
        self
    }

    pub fn with_sort(mut self, sort_option: SortOption) -> Self {
        self.sort_option = sort_option;
        self
    }

    /// Location needle, treating an empty filter as unset.
    pub fn active_location(&self) -> Option<&str> {
        self.location_filter.as_deref().filter(|v| !v.is_empty())
    }

    /// Experience needle, treating an empty filter as unset.
    pub fn active_experience(&self) -> Option<&str> {
        self.experience_filter.as_deref().filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutomationState {
    #[default]
    Stopped,
    Running,
}

impl AutomationState {
    pub fn is_running(self) -> bool {
        self == AutomationState::Running
    }
}

impl fmt::Display for AutomationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AutomationState::Stopped => f.write_str("stopped"),
            AutomationState::Running => f.write_str("running"),
        }
    }
}
