//! Card-level labels derived from a single job record.

use chrono::NaiveDate;
use shared::domain::{parse_service_date, JobRecord};

pub const COMPANY_FALLBACK: &str = "Company not specified";
pub const LOCATION_FALLBACK: &str = "Location not specified";

const NEW_JOB_MAX_DAYS: i64 = 3;
const OLD_JOB_MIN_DAYS: i64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeLabel {
    New,
    Old,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExperienceTier {
    Junior,
    Mid,
    Senior,
    Unspecified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationBadge {
    Succeeded,
    Failed,
    Attempts(u32),
}

pub fn age_label(publish_date: Option<&str>, today: NaiveDate) -> Option<AgeLabel> {
    let published = parse_service_date(publish_date?)?.date();
    let age_days = (today - published).num_days();
    if age_days < NEW_JOB_MAX_DAYS {
        Some(AgeLabel::New)
    } else if age_days > OLD_JOB_MIN_DAYS {
        Some(AgeLabel::Old)
    } else {
        None
    }
}

pub fn experience_tier(experience: Option<&str>) -> ExperienceTier {
    let Some(experience) = experience else {
        return ExperienceTier::Unspecified;
    };
    let exp = experience.to_lowercase();
    if exp.contains("junior") || exp.contains("0-2") {
        ExperienceTier::Junior
    } else if exp.contains("mid") || exp.contains("2-5") {
        ExperienceTier::Mid
    } else if exp.contains("senior") || exp.contains("5+") {
        ExperienceTier::Senior
    } else {
        ExperienceTier::Unspecified
    }
}

pub fn application_badge(job: &JobRecord) -> Option<ApplicationBadge> {
    match job.application_success {
        Some(true) => Some(ApplicationBadge::Succeeded),
        Some(false) => Some(ApplicationBadge::Failed),
        None if job.application_attempts > 0 => {
            Some(ApplicationBadge::Attempts(job.application_attempts))
        }
        None => None,
    }
}

pub fn company_or_fallback(job: &JobRecord) -> &str {
    job.company.as_deref().unwrap_or(COMPANY_FALLBACK)
}

pub fn location_or_fallback(job: &JobRecord) -> &str {
    job.location.as_deref().unwrap_or(LOCATION_FALLBACK)
}
