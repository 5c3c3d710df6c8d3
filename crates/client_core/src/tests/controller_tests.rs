use super::*;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::protocol::{AutomationStatusResponse, OverallStats};
use tokio::sync::oneshot;

use crate::tests::NoopLinkOpener;

struct FakeJobService {
    jobs: Mutex<Vec<JobRecord>>,
    status: Mutex<AutomationStatusResponse>,
    calls: Mutex<Vec<String>>,
    fail_fetch: AtomicBool,
    fail_update: AtomicBool,
    fail_mark: AtomicBool,
    fail_automation: AtomicBool,
    update_gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl FakeJobService {
    fn with_jobs(jobs: Vec<JobRecord>) -> Arc<Self> {
        Arc::new(Self {
            jobs: Mutex::new(jobs),
            status: Mutex::new(AutomationStatusResponse::default()),
            calls: Mutex::new(Vec::new()),
            fail_fetch: AtomicBool::new(false),
            fail_update: AtomicBool::new(false),
            fail_mark: AtomicBool::new(false),
            fail_automation: AtomicBool::new(false),
            update_gate: Mutex::new(None),
        })
    }

    async fn record(&self, call: impl Into<String>) {
        self.calls.lock().await.push(call.into());
    }

    async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    async fn count(&self, call: &str) -> usize {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|c| c.as_str() == call)
            .count()
    }
}

#[async_trait]
impl JobService for FakeJobService {
    async fn fetch_jobs(&self) -> Result<Vec<JobRecord>> {
        self.record("fetch_jobs").await;
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(anyhow!("connection refused"));
        }
        Ok(self.jobs.lock().await.clone())
    }

    async fn trigger_update(&self) -> Result<()> {
        self.record("update").await;
        let gate = self.update_gate.lock().await.take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(anyhow!("update crashed"));
        }
        Ok(())
    }

    async fn mark_job_clicked(&self, link: &str) -> Result<()> {
        self.record(format!("mark:{link}")).await;
        if self.fail_mark.load(Ordering::SeqCst) {
            return Err(anyhow!("mark failed"));
        }
        for job in self.jobs.lock().await.iter_mut() {
            if job.link == link {
                job.is_clicked = true;
            }
        }
        Ok(())
    }

    async fn start_automation(&self) -> Result<()> {
        self.record("start").await;
        if self.fail_automation.load(Ordering::SeqCst) {
            return Err(anyhow!("automation unavailable"));
        }
        let mut status = self.status.lock().await;
        status.status = AutomationState::Running;
        status.applied_count = 3;
        status.stats = Some(ApplicationStats {
            overall: OverallStats {
                total_applications: 3,
                successful_applications: 2,
                failed_applications: 1,
                total_attempts: 4,
            },
            ..ApplicationStats::default()
        });
        Ok(())
    }

    async fn stop_automation(&self) -> Result<()> {
        self.record("stop").await;
        if self.fail_automation.load(Ordering::SeqCst) {
            return Err(anyhow!("automation unavailable"));
        }
        self.status.lock().await.status = AutomationState::Stopped;
        Ok(())
    }

    async fn automation_status(&self) -> Result<AutomationStatusResponse> {
        self.record("status").await;
        Ok(self.status.lock().await.clone())
    }
}

struct RecordingOpener {
    opened: Mutex<Vec<String>>,
}

#[async_trait]
impl LinkOpener for RecordingOpener {
    async fn open(&self, link: &str) -> Result<()> {
        self.opened.lock().await.push(link.to_string());
        Ok(())
    }
}

fn job(link: &str, publish_date: &str, location: &str) -> JobRecord {
    let mut job = JobRecord::new(link);
    job.title = Some(format!("Engineer {link}"));
    job.publish_date = Some(publish_date.to_string());
    job.location = Some(location.to_string());
    job
}

fn sample_jobs() -> Vec<JobRecord> {
    vec![
        job("jan-2024", "2024-01-01", "Paris"),
        job("jun-2024", "2024-06-01", "Remote, EU"),
        job("jan-2023", "2023-01-01", "Lyon"),
    ]
}

fn test_config() -> ControllerConfig {
    ControllerConfig {
        notification_ttl: Duration::from_secs(60),
        ..ControllerConfig::default()
    }
}

fn controller_for(service: &Arc<FakeJobService>, config: ControllerConfig) -> Arc<JobListController> {
    JobListController::new(config, service.clone(), Arc::new(NoopLinkOpener))
}

fn links(jobs: &[JobRecord]) -> Vec<&str> {
    jobs.iter().map(|job| job.link.as_str()).collect()
}

#[tokio::test]
async fn load_jobs_replaces_collection_and_sorts_recent_first() {
    let service = FakeJobService::with_jobs(sample_jobs());
    let controller = controller_for(&service, test_config());

    controller.load_jobs().await.expect("load");

    let visible = controller.visible_jobs().await;
    assert_eq!(links(&visible), vec!["jun-2024", "jan-2024", "jan-2023"]);
    assert!(!controller.is_loading().await);
    assert!(controller.notification().await.is_none());
}

#[tokio::test]
async fn failed_load_keeps_previous_collection_and_notifies() {
    let service = FakeJobService::with_jobs(sample_jobs());
    let controller = controller_for(&service, test_config());
    controller.load_jobs().await.expect("first load");

    service.jobs.lock().await.clear();
    service.fail_fetch.store(true, Ordering::SeqCst);
    let err = controller.load_jobs().await.expect_err("load must fail");
    assert!(matches!(err, ControllerError::Service(_)));

    assert_eq!(controller.jobs().await.len(), 3);
    let notification = controller.notification().await.expect("notification");
    assert!(notification.is_error());
    assert_eq!(notification.message, "Failed to fetch jobs. Please try again.");
}

#[tokio::test]
async fn loading_flag_is_reported_around_fetch() {
    let service = FakeJobService::with_jobs(sample_jobs());
    let controller = controller_for(&service, test_config());
    let mut events = controller.subscribe();

    controller.load_jobs().await.expect("load");

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert_eq!(
        seen,
        vec![
            ControllerEvent::LoadingChanged(true),
            ControllerEvent::JobsReplaced { total: 3 },
            ControllerEvent::VisibleListChanged { visible: 3 },
            ControllerEvent::LoadingChanged(false),
        ]
    );
}

#[tokio::test]
async fn refresh_while_refreshing_is_ignored() {
    let service = FakeJobService::with_jobs(sample_jobs());
    let (release_tx, release_rx) = oneshot::channel();
    *service.update_gate.lock().await = Some(release_rx);
    let controller = controller_for(&service, test_config());

    let first = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.refresh().await })
    };
    while !controller.is_refreshing() {
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    let second = controller.refresh().await.expect("second refresh");
    assert_eq!(second, RefreshOutcome::AlreadyRefreshing);

    release_tx.send(()).expect("release gate");
    let first = first.await.expect("join").expect("first refresh");
    assert_eq!(first, RefreshOutcome::Completed);
    assert!(!controller.is_refreshing());
    assert_eq!(service.count("update").await, 1);

    let third = controller.refresh().await.expect("third refresh");
    assert_eq!(third, RefreshOutcome::Completed);
    assert_eq!(service.count("update").await, 2);
    assert_eq!(
        controller.notification().await.map(|n| n.message),
        Some("Jobs updated successfully!".to_string())
    );
}

#[tokio::test]
async fn refresh_update_failure_notifies_without_reloading() {
    let service = FakeJobService::with_jobs(sample_jobs());
    service.fail_update.store(true, Ordering::SeqCst);
    let controller = controller_for(&service, test_config());

    controller.refresh().await.expect_err("refresh must fail");

    assert_eq!(service.calls().await, vec!["update"]);
    assert!(!controller.is_refreshing());
    let notification = controller.notification().await.expect("notification");
    assert_eq!(notification.message, "Failed to update jobs. Please try again.");
}

#[tokio::test]
async fn record_click_reloads_after_success() {
    let service = FakeJobService::with_jobs(sample_jobs());
    let controller = controller_for(&service, test_config());

    controller.record_click("jan-2023").await;

    assert_eq!(service.calls().await, vec!["mark:jan-2023", "fetch_jobs"]);
    let clicked: Vec<_> = controller
        .jobs()
        .await
        .into_iter()
        .filter(|job| job.is_clicked)
        .map(|job| job.link)
        .collect();
    assert_eq!(clicked, vec!["jan-2023".to_string()]);
}

#[tokio::test]
async fn record_click_reloads_even_when_marking_fails() {
    let service = FakeJobService::with_jobs(sample_jobs());
    service.fail_mark.store(true, Ordering::SeqCst);
    let controller = controller_for(&service, test_config());

    controller.record_click("jan-2024").await;

    assert_eq!(service.calls().await, vec!["mark:jan-2024", "fetch_jobs"]);
    assert!(controller.notification().await.is_none());
    assert_eq!(controller.jobs().await.len(), 3);
}

#[tokio::test]
async fn background_reload_failure_is_not_surfaced() {
    let service = FakeJobService::with_jobs(sample_jobs());
    service.fail_fetch.store(true, Ordering::SeqCst);
    let controller = controller_for(&service, test_config());

    controller.record_click("jan-2024").await;

    assert!(controller.notification().await.is_none());
}

#[tokio::test]
async fn open_job_opens_link_then_tracks_click() {
    let service = FakeJobService::with_jobs(sample_jobs());
    let opener = Arc::new(RecordingOpener {
        opened: Mutex::new(Vec::new()),
    });
    let controller = JobListController::new(test_config(), service.clone(), opener.clone());

    let tracking = controller.open_job("jun-2024").await;
    assert_eq!(*opener.opened.lock().await, vec!["jun-2024".to_string()]);

    tracking.await.expect("tracking task");
    assert_eq!(service.calls().await, vec!["mark:jun-2024", "fetch_jobs"]);
}

#[tokio::test]
async fn criteria_changes_recompute_visible_list() {
    let service = FakeJobService::with_jobs(sample_jobs());
    let controller = controller_for(&service, test_config());
    controller.load_jobs().await.expect("load");

    controller.set_search_term("remote").await;
    assert_eq!(links(&controller.visible_jobs().await), vec!["jun-2024"]);

    controller.set_search_term("").await;
    controller.set_sort_option(SortOption::Oldest).await;
    assert_eq!(
        links(&controller.visible_jobs().await),
        vec!["jan-2023", "jan-2024", "jun-2024"]
    );

    controller.set_location_filter(Some("paris".into())).await;
    assert_eq!(links(&controller.visible_jobs().await), vec!["jan-2024"]);

    controller.set_criteria(FilterCriteria::default()).await;
    assert_eq!(controller.visible_jobs().await.len(), 3);
    assert_eq!(controller.criteria().await, FilterCriteria::default());
}

#[tokio::test]
async fn toggle_starts_automation_and_adopts_polled_status() {
    let service = FakeJobService::with_jobs(Vec::new());
    let controller = controller_for(&service, test_config());

    let snapshot = controller.toggle_automation().await.expect("toggle");

    assert_eq!(snapshot.status, AutomationState::Running);
    assert_eq!(snapshot.applied_count, 3);
    assert_eq!(service.calls().await, vec!["start", "status"]);
    let notification = controller.notification().await.expect("notification");
    assert_eq!(notification.kind, NotificationKind::Success);
    assert_eq!(notification.message, "Job application automation started");

    let snapshot = controller.toggle_automation().await.expect("toggle back");
    assert_eq!(snapshot.status, AutomationState::Stopped);
    assert_eq!(service.count("stop").await, 1);
}

#[tokio::test]
async fn failed_toggle_leaves_status_unchanged() {
    let service = FakeJobService::with_jobs(Vec::new());
    service.status.lock().await.status = AutomationState::Running;
    let controller = controller_for(&service, test_config());
    controller.poll_status().await.expect("poll");

    service.fail_automation.store(true, Ordering::SeqCst);
    controller
        .toggle_automation()
        .await
        .expect_err("toggle must fail");

    assert_eq!(controller.automation().await.status, AutomationState::Running);
    let notification = controller.notification().await.expect("notification");
    assert_eq!(notification.message, "Failed to stop automation");
    assert_eq!(service.count("status").await, 1);
}

#[tokio::test]
async fn toggle_is_rejected_when_controls_are_hidden() {
    let service = FakeJobService::with_jobs(Vec::new());
    let config = ControllerConfig {
        show_automation_controls: false,
        ..test_config()
    };
    let controller = controller_for(&service, config);

    let err = controller.toggle_automation().await.expect_err("hidden");
    assert!(matches!(err, ControllerError::AutomationControlsHidden));
    assert!(service.calls().await.is_empty());
}

#[tokio::test]
async fn snapshot_shows_stats_only_while_running() {
    let service = FakeJobService::with_jobs(sample_jobs());
    let controller = controller_for(&service, test_config());
    controller.load_jobs().await.expect("load");

    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.total_jobs, 3);
    assert_eq!(snapshot.automation_status, Some(AutomationState::Stopped));
    assert!(snapshot.stats.is_none());

    controller.toggle_automation().await.expect("start");
    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.applied_count, Some(3));
    assert_eq!(
        snapshot.stats.map(|s| s.overall.successful_applications),
        Some(2)
    );

    let hidden = controller_for(
        &service,
        ControllerConfig {
            show_stats: false,
            show_automation_controls: false,
            ..test_config()
        },
    );
    hidden.poll_status().await.expect("poll");
    let snapshot = hidden.snapshot().await;
    assert_eq!(snapshot.automation_status, None);
    assert_eq!(snapshot.applied_count, None);
    assert!(snapshot.stats.is_none());
}

#[tokio::test]
async fn notifications_auto_dismiss_without_clearing_newer_ones() {
    let service = FakeJobService::with_jobs(Vec::new());
    service.fail_fetch.store(true, Ordering::SeqCst);
    let config = ControllerConfig {
        notification_ttl: Duration::from_millis(300),
        ..ControllerConfig::default()
    };
    let controller = controller_for(&service, config);

    let _ = controller.load_jobs().await;
    let first = controller.notification().await.expect("first");
    tokio::time::sleep(Duration::from_millis(100)).await;
    let _ = controller.load_jobs().await;
    let second = controller.notification().await.expect("second");
    assert!(second.id > first.id);

    // First notification's timer fires here and must leave the second alone.
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(controller.notification().await, Some(second));

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(controller.notification().await.is_none());
}

#[tokio::test]
async fn manual_dismiss_clears_matching_notification() {
    let service = FakeJobService::with_jobs(Vec::new());
    service.fail_fetch.store(true, Ordering::SeqCst);
    let controller = controller_for(&service, test_config());
    let _ = controller.load_jobs().await;
    let active = controller.notification().await.expect("active");

    controller.dismiss_notification(active.id + 1).await;
    assert!(controller.notification().await.is_some());
    controller.dismiss_notification(active.id).await;
    assert!(controller.notification().await.is_none());
}

#[tokio::test]
async fn mount_loads_polls_and_unmount_stops_timers() {
    let service = FakeJobService::with_jobs(sample_jobs());
    let config = ControllerConfig {
        status_poll_interval: Duration::from_millis(15),
        jobs_refresh_interval: Duration::from_millis(20),
        ..test_config()
    };
    let controller = controller_for(&service, config);

    let mounted = controller.mount();
    assert_eq!(mounted.running_tasks(), vec!["jobs-refresh", "automation-status"]);
    tokio::time::sleep(Duration::from_millis(80)).await;

    assert!(service.count("status").await >= 2);
    assert!(service.count("fetch_jobs").await >= 2);
    assert_eq!(mounted.controller().visible_jobs().await.len(), 3);

    mounted.unmount().await;
    let settled = service.calls().await.len();
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(service.calls().await.len(), settled);
}

#[tokio::test]
async fn mount_skips_status_poll_when_nothing_displays_it() {
    let service = FakeJobService::with_jobs(sample_jobs());
    let config = ControllerConfig {
        show_automation_controls: false,
        show_stats: false,
        ..test_config()
    };
    let controller = controller_for(&service, config);

    let mounted = controller.mount();
    assert_eq!(mounted.running_tasks(), vec!["jobs-refresh"]);
    mounted.unmount().await;
    assert_eq!(service.count("status").await, 0);
}
