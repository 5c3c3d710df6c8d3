use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::AutomationState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkJobClickedRequest {
    pub link: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverallStats {
    #[serde(default)]
    pub total_applications: u64,
    #[serde(default)]
    pub successful_applications: u64,
    #[serde(default)]
    pub failed_applications: u64,
    #[serde(default)]
    pub total_attempts: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteStats {
    #[serde(default)]
    pub successes: u64,
    #[serde(default)]
    pub attempts: u64,
}

/// Aggregate application statistics reported alongside automation status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationStats {
    #[serde(default)]
    pub overall: OverallStats,
    #[serde(default)]
    pub by_site: BTreeMap<String, SiteStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationStatusResponse {
    pub status: AutomationState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<ApplicationStats>,
    #[serde(default)]
    pub applied_count: u64,
}
