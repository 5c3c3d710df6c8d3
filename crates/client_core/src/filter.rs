//! Pure filter/sort pipeline from (collection, criteria) to the visible list.

use std::cmp::Reverse;

use shared::domain::{FilterCriteria, JobRecord, SortOption};

fn contains_ci(haystack: Option<&str>, needle_lower: &str) -> bool {
    haystack
        .map(|value| value.to_lowercase().contains(needle_lower))
        .unwrap_or(false)
}

pub fn matches_criteria(job: &JobRecord, criteria: &FilterCriteria) -> bool {
    if !criteria.search_term.is_empty() {
        let term = criteria.search_term.to_lowercase();
        let hit = contains_ci(job.title.as_deref(), &term)
            || contains_ci(job.description.as_deref(), &term)
            || contains_ci(job.location.as_deref(), &term);
        if !hit {
            return false;
        }
    }

    if let Some(location) = criteria.active_location() {
        if !contains_ci(job.location.as_deref(), &location.to_lowercase()) {
            return false;
        }
    }

    if let Some(experience) = criteria.active_experience() {
        if !contains_ci(job.experience.as_deref(), &experience.to_lowercase()) {
            return false;
        }
    }

    true
}

/// Missing or unparsable dates order as the earliest instant.
///
/// `featured` is stable. Date orders break ties on `link`, so `oldest` is
/// exactly `recent` reversed and re-sorting a sorted list is a no-op.
pub fn sort_jobs(jobs: &mut [JobRecord], sort_option: SortOption) {
    match sort_option {
        SortOption::Featured => jobs.sort_by_key(|job| Reverse(job.featured_rank())),
        SortOption::Recent => sort_newest_first(jobs),
        SortOption::Oldest => {
            sort_newest_first(jobs);
            jobs.reverse();
        }
    }
}

fn sort_newest_first(jobs: &mut [JobRecord]) {
    jobs.sort_by_cached_key(|job| (Reverse(job.published_at()), job.link.clone()));
}

pub fn apply_filters(jobs: &[JobRecord], criteria: &FilterCriteria) -> Vec<JobRecord> {
    let mut visible: Vec<JobRecord> = jobs
        .iter()
        .filter(|job| matches_criteria(job, criteria))
        .cloned()
        .collect();
    sort_jobs(&mut visible, criteria.sort_option);
    visible
}
