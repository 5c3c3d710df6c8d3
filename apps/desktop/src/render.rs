//! Plain-text rendering of the job list for the terminal.

use std::fmt::Write as _;

use chrono::NaiveDate;
use client_core::{
    presentation::{
        age_label, application_badge, company_or_fallback, experience_tier, location_or_fallback,
        AgeLabel, ApplicationBadge, ExperienceTier,
    },
    AutomationSnapshot, NotificationKind, ViewSnapshot,
};
use shared::{domain::parse_service_date, domain::JobRecord, protocol::ApplicationStats};

fn tier_label(tier: ExperienceTier) -> &'static str {
    match tier {
        ExperienceTier::Junior => "junior",
        ExperienceTier::Mid => "mid",
        ExperienceTier::Senior => "senior",
        ExperienceTier::Unspecified => "other",
    }
}

pub fn render_job(out: &mut String, job: &JobRecord, today: NaiveDate) {
    let marker = if job.is_featured { "*" } else { "-" };
    let title = job.title.as_deref().unwrap_or("Untitled position");
    let _ = write!(out, "{marker} {title}");

    let mut badges = Vec::new();
    if age_label(job.publish_date.as_deref(), today) == Some(AgeLabel::New) {
        badges.push("New".to_string());
    }
    if job.is_clicked {
        badges.push("Viewed".to_string());
    }
    if let Some(experience) = job.experience.as_deref() {
        badges.push(format!(
            "{experience} ({})",
            tier_label(experience_tier(Some(experience)))
        ));
    }
    match application_badge(job) {
        Some(ApplicationBadge::Succeeded) => badges.push("Applied Successfully".into()),
        Some(ApplicationBadge::Failed) => badges.push("Application Failed".into()),
        Some(ApplicationBadge::Attempts(n)) => badges.push(format!("Attempts: {n}")),
        None => {}
    }
    for badge in badges {
        let _ = write!(out, " [{badge}]");
    }
    out.push('\n');

    let _ = write!(
        out,
        "    {} | {}",
        company_or_fallback(job),
        location_or_fallback(job)
    );
    if let Some(date) = job.publish_date.as_deref() {
        let _ = write!(out, " | {date}");
    }
    if let Some(last) = job
        .last_application_date
        .as_deref()
        .and_then(parse_service_date)
    {
        let _ = write!(out, " | last attempt {}", last.date());
    }
    out.push('\n');
    let _ = writeln!(out, "    {}", job.link);
}

pub fn render_jobs(jobs: &[JobRecord], today: NaiveDate) -> String {
    let mut out = String::new();
    if jobs.is_empty() {
        out.push_str("No jobs match the current filters.\n");
        return out;
    }
    for job in jobs {
        render_job(&mut out, job, today);
    }
    out
}

pub fn render_stats(stats: &ApplicationStats) -> String {
    let overall = &stats.overall;
    let mut out = format!(
        "Applications: {} total, {} successful, {} failed, {} attempts\n",
        overall.total_applications,
        overall.successful_applications,
        overall.failed_applications,
        overall.total_attempts
    );
    for (site, site_stats) in &stats.by_site {
        let _ = writeln!(
            out,
            "  {site}: {} successes / {} attempts",
            site_stats.successes, site_stats.attempts
        );
    }
    out
}

pub fn render_automation(snapshot: &AutomationSnapshot, show_stats: bool) -> String {
    let mut out = format!("Automation: {}", snapshot.status);
    if snapshot.status.is_running() {
        let _ = write!(out, " ({} jobs applied)", snapshot.applied_count);
    }
    out.push('\n');
    if show_stats && snapshot.status.is_running() {
        if let Some(stats) = &snapshot.stats {
            out.push_str(&render_stats(stats));
        }
    }
    out
}

pub fn render_snapshot(snapshot: &ViewSnapshot, today: NaiveDate) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "Showing {} of {} jobs (sort: {})",
        snapshot.visible.len(),
        snapshot.total_jobs,
        snapshot.criteria.sort_option
    );
    if snapshot.loading {
        out.push_str(" loading...");
    }
    if snapshot.refreshing {
        out.push_str(" refreshing...");
    }
    out.push('\n');

    if let Some(status) = snapshot.automation_status {
        let _ = write!(out, "Automation: {status}");
        if let (true, Some(applied)) = (status.is_running(), snapshot.applied_count) {
            let _ = write!(out, " ({applied} jobs applied)");
        }
        out.push('\n');
    }
    if let Some(stats) = &snapshot.stats {
        out.push_str(&render_stats(stats));
    }
    if let Some(notification) = &snapshot.notification {
        let prefix = match notification.kind {
            NotificationKind::Success => "ok",
            NotificationKind::Error => "error",
        };
        let _ = writeln!(out, "[{prefix}] {}", notification.message);
    }
    out.push('\n');
    out.push_str(&render_jobs(&snapshot.visible, today));
    out
}
