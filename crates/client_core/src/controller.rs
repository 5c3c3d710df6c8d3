//! Job list controller: owns the fetched collection, the user's criteria and
//! the derived visible list, and relays user actions to the job service.

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

use shared::{
    domain::{AutomationState, FilterCriteria, JobRecord, SortOption},
    protocol::ApplicationStats,
};
use thiserror::Error;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    config::{ConfigError, ControllerConfig},
    filter::apply_filters,
    notification::{self, Notification, NotificationKind},
    scheduler::{FirstTick, PeriodicTask},
    HttpJobService, JobService, LinkOpener,
};

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("automation controls are hidden for this screen")]
    AutomationControlsHidden,
    #[error(transparent)]
    Service(#[from] anyhow::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    JobsReplaced { total: usize },
    VisibleListChanged { visible: usize },
    LoadingChanged(bool),
    RefreshingChanged(bool),
    NotificationShown(Notification),
    NotificationDismissed { id: u64 },
    AutomationUpdated(AutomationState),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Completed,
    AlreadyRefreshing,
}

/// Last server-reported automation state. Replaced wholesale on every poll.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutomationSnapshot {
    pub status: AutomationState,
    pub stats: Option<ApplicationStats>,
    pub applied_count: u64,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSnapshot {
    pub visible: Vec<JobRecord>,
    pub total_jobs: usize,
    pub criteria: FilterCriteria,
    pub loading: bool,
    pub refreshing: bool,
    pub notification: Option<Notification>,
    /// `None` when automation controls are hidden.
    pub automation_status: Option<AutomationState>,
    pub applied_count: Option<u64>,
    /// Only present while automation runs and stats are shown.
    pub stats: Option<ApplicationStats>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureSurface {
    User,
    Silent,
}

#[derive(Default)]
struct ControllerState {
    jobs: Vec<JobRecord>,
    criteria: FilterCriteria,
    visible: Vec<JobRecord>,
    loads_in_flight: usize,
    automation: AutomationSnapshot,
    notification: Option<Notification>,
}

impl ControllerState {
    fn recompute_visible(&mut self) -> usize {
        self.visible = apply_filters(&self.jobs, &self.criteria);
        self.visible.len()
    }
}

pub struct JobListController {
    config: ControllerConfig,
    service: Arc<dyn JobService>,
    opener: Arc<dyn LinkOpener>,
    inner: Mutex<ControllerState>,
    refreshing: AtomicBool,
    next_notification_id: AtomicU64,
    events: broadcast::Sender<ControllerEvent>,
}

struct RefreshGuard<'a> {
    controller: &'a JobListController,
}

impl<'a> RefreshGuard<'a> {
    fn acquire(controller: &'a JobListController) -> Option<Self> {
        controller
            .refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        controller.emit(ControllerEvent::RefreshingChanged(true));
        Some(Self { controller })
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.controller.refreshing.store(false, Ordering::Release);
        self.controller
            .emit(ControllerEvent::RefreshingChanged(false));
    }
}

impl JobListController {
    pub fn new(
        config: ControllerConfig,
        service: Arc<dyn JobService>,
        opener: Arc<dyn LinkOpener>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Arc::new(Self {
            config,
            service,
            opener,
            inner: Mutex::new(ControllerState::default()),
            refreshing: AtomicBool::new(false),
            next_notification_id: AtomicU64::new(1),
            events,
        })
    }

    /// Builds a controller backed by the HTTP job service named in `config`.
    pub fn connect(
        config: ControllerConfig,
        opener: Arc<dyn LinkOpener>,
    ) -> Result<Arc<Self>, ConfigError> {
        config.validate()?;
        let service = HttpJobService::new(&config.api_base_url)?;
        Ok(Self::new(config, Arc::new(service), opener))
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: ControllerEvent) {
        let _ = self.events.send(event);
    }

    pub async fn load_jobs(self: &Arc<Self>) -> Result<(), ControllerError> {
        self.reload(FailureSurface::User).await
    }

    async fn reload(self: &Arc<Self>, surface: FailureSurface) -> Result<(), ControllerError> {
        self.set_loading(true).await;
        let fetched = self.service.fetch_jobs().await;

        let result = match fetched {
            Ok(jobs) => {
                let (total, visible) = {
                    let mut guard = self.inner.lock().await;
                    guard.jobs = jobs;
                    let visible = guard.recompute_visible();
                    (guard.jobs.len(), visible)
                };
                debug!(total, visible, "job collection replaced");
                self.emit(ControllerEvent::JobsReplaced { total });
                self.emit(ControllerEvent::VisibleListChanged { visible });
                Ok(())
            }
            Err(err) => {
                let background = surface == FailureSurface::Silent;
                warn!(error = ?err, background, "failed to fetch jobs");
                if surface == FailureSurface::User {
                    self.notify(NotificationKind::Error, notification::JOBS_FETCH_FAILED)
                        .await;
                }
                Err(ControllerError::Service(err))
            }
        };

        self.set_loading(false).await;
        result
    }

    async fn set_loading(&self, starting: bool) {
        let changed = {
            let mut guard = self.inner.lock().await;
            let was_loading = guard.loads_in_flight > 0;
            if starting {
                guard.loads_in_flight += 1;
            } else {
                guard.loads_in_flight = guard.loads_in_flight.saturating_sub(1);
            }
            let now_loading = guard.loads_in_flight > 0;
            (was_loading != now_loading).then_some(now_loading)
        };
        if let Some(loading) = changed {
            self.emit(ControllerEvent::LoadingChanged(loading));
        }
    }

    /// Asks the service to regenerate its collection, then reloads it.
    ///
    /// Calls made while a refresh is already in flight are ignored.
    pub async fn refresh(self: &Arc<Self>) -> Result<RefreshOutcome, ControllerError> {
        let Some(_guard) = RefreshGuard::acquire(self) else {
            debug!("refresh already in flight, ignoring");
            return Ok(RefreshOutcome::AlreadyRefreshing);
        };

        info!("requesting server-side job refresh");
        if let Err(err) = self.service.trigger_update().await {
            warn!(error = ?err, "job refresh failed");
            self.notify(NotificationKind::Error, notification::JOBS_UPDATE_FAILED)
                .await;
            return Err(ControllerError::Service(err));
        }

        self.load_jobs().await?;
        self.notify(NotificationKind::Success, notification::JOBS_UPDATED)
            .await;
        Ok(RefreshOutcome::Completed)
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Acquire)
    }

    /// Reports a job as opened and reloads so the server flag shows up.
    ///
    /// The reload happens whether or not the report succeeded; failures are
    /// only logged.
    pub async fn record_click(self: &Arc<Self>, link: &str) {
        if let Err(err) = self.service.mark_job_clicked(link).await {
            warn!(%link, error = ?err, "failed to mark job as clicked");
        }
        let _ = self.reload(FailureSurface::Silent).await;
    }

    /// Opens the job's link right away and tracks the click in the background.
    pub async fn open_job(self: &Arc<Self>, link: impl Into<String>) -> JoinHandle<()> {
        let link = link.into();
        if let Err(err) = self.opener.open(&link).await {
            warn!(%link, error = ?err, "failed to open job link");
        }

        let controller = self.clone();
        tokio::spawn(async move { controller.record_click(&link).await })
    }

    pub async fn set_search_term(&self, term: impl Into<String>) {
        let term = term.into();
        self.update_criteria(|criteria| criteria.search_term = term)
            .await;
    }

    pub async fn set_location_filter(&self, location: Option<String>) {
        self.update_criteria(|criteria| criteria.location_filter = location)
            .await;
    }

    pub async fn set_experience_filter(&self, experience: Option<String>) {
        self.update_criteria(|criteria| criteria.experience_filter = experience)
            .await;
    }

    pub async fn set_sort_option(&self, sort_option: SortOption) {
        self.update_criteria(|criteria| criteria.sort_option = sort_option)
            .await;
    }

    pub async fn set_criteria(&self, criteria: FilterCriteria) {
        self.update_criteria(|current| *current = criteria).await;
    }

    async fn update_criteria(&self, update: impl FnOnce(&mut FilterCriteria)) {
        let visible = {
            let mut guard = self.inner.lock().await;
            update(&mut guard.criteria);
            guard.recompute_visible()
        };
        self.emit(ControllerEvent::VisibleListChanged { visible });
    }

    pub async fn criteria(&self) -> FilterCriteria {
        self.inner.lock().await.criteria.clone()
    }

    pub async fn visible_jobs(&self) -> Vec<JobRecord> {
        self.inner.lock().await.visible.clone()
    }

    pub async fn jobs(&self) -> Vec<JobRecord> {
        self.inner.lock().await.jobs.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.inner.lock().await.loads_in_flight > 0
    }

    /// Starts or stops automation based on the last reported status.
    ///
    /// The local status only changes through the follow-up poll.
    pub async fn toggle_automation(self: &Arc<Self>) -> Result<AutomationSnapshot, ControllerError> {
        if !self.config.show_automation_controls {
            return Err(ControllerError::AutomationControlsHidden);
        }

        let current = self.inner.lock().await.automation.status;
        let (result, done_message, failed_message) = match current {
            AutomationState::Running => (
                self.service.stop_automation().await,
                notification::AUTOMATION_STOPPED,
                notification::AUTOMATION_STOP_FAILED,
            ),
            AutomationState::Stopped => (
                self.service.start_automation().await,
                notification::AUTOMATION_STARTED,
                notification::AUTOMATION_START_FAILED,
            ),
        };

        if let Err(err) = result {
            warn!(%current, error = ?err, "automation toggle failed");
            self.notify(NotificationKind::Error, failed_message).await;
            return Err(ControllerError::Service(err));
        }

        info!(from = %current, "automation toggle accepted");
        self.notify(NotificationKind::Success, done_message).await;
        let _ = self.poll_status().await;
        Ok(self.automation().await)
    }

    /// Replaces the automation snapshot with the server's current view.
    pub async fn poll_status(&self) -> Result<AutomationSnapshot, ControllerError> {
        let response = match self.service.automation_status().await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = ?err, "failed to poll automation status");
                return Err(ControllerError::Service(err));
            }
        };

        let snapshot = AutomationSnapshot {
            status: response.status,
            stats: response.stats,
            applied_count: response.applied_count,
        };
        self.inner.lock().await.automation = snapshot.clone();
        self.emit(ControllerEvent::AutomationUpdated(snapshot.status));
        Ok(snapshot)
    }

    pub async fn automation(&self) -> AutomationSnapshot {
        self.inner.lock().await.automation.clone()
    }

    async fn notify(self: &Arc<Self>, kind: NotificationKind, message: &str) {
        let id = self.next_notification_id.fetch_add(1, Ordering::Relaxed);
        let notification = Notification {
            id,
            kind,
            message: message.to_string(),
        };
        self.inner.lock().await.notification = Some(notification.clone());
        self.emit(ControllerEvent::NotificationShown(notification));

        let controller = Arc::downgrade(self);
        let ttl = self.config.notification_ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if let Some(controller) = controller.upgrade() {
                controller.dismiss_notification(id).await;
            }
        });
    }

    /// Clears the active notification if it is still the one with `id`.
    pub async fn dismiss_notification(&self, id: u64) {
        let dismissed = {
            let mut guard = self.inner.lock().await;
            match &guard.notification {
                Some(current) if current.id == id => {
                    guard.notification = None;
                    true
                }
                _ => false,
            }
        };
        if dismissed {
            self.emit(ControllerEvent::NotificationDismissed { id });
        }
    }

    pub async fn notification(&self) -> Option<Notification> {
        self.inner.lock().await.notification.clone()
    }

    pub async fn snapshot(&self) -> ViewSnapshot {
        let guard = self.inner.lock().await;
        let automation = &guard.automation;
        let show_controls = self.config.show_automation_controls;
        let stats = if self.config.show_stats && automation.status.is_running() {
            automation.stats.clone()
        } else {
            None
        };

        ViewSnapshot {
            visible: guard.visible.clone(),
            total_jobs: guard.jobs.len(),
            criteria: guard.criteria.clone(),
            loading: guard.loads_in_flight > 0,
            refreshing: self.is_refreshing(),
            notification: guard.notification.clone(),
            automation_status: show_controls.then_some(automation.status),
            applied_count: show_controls.then_some(automation.applied_count),
            stats,
        }
    }

    /// Loads the collection and starts the periodic refresh and status poll.
    ///
    /// Everything started here stops when the returned handle is unmounted
    /// or dropped.
    pub fn mount(self: &Arc<Self>) -> MountedController {
        info!(
            api = %self.config.api_base_url,
            refresh_every = ?self.config.jobs_refresh_interval,
            poll_every = ?self.config.status_poll_interval,
            "mounting job list"
        );

        let controller = self.clone();
        let initial_load = tokio::spawn(async move {
            let _ = controller.load_jobs().await;
        });

        let controller = self.clone();
        let jobs_refresh = PeriodicTask::spawn(
            "jobs-refresh",
            self.config.jobs_refresh_interval,
            FirstTick::AfterPeriod,
            move || {
                let controller = controller.clone();
                async move {
                    let _ = controller.reload(FailureSurface::Silent).await;
                }
            },
        );

        let status_poll = self.config.polls_status().then(|| {
            let controller = self.clone();
            PeriodicTask::spawn(
                "automation-status",
                self.config.status_poll_interval,
                FirstTick::Immediate,
                move || {
                    let controller = controller.clone();
                    async move {
                        let _ = controller.poll_status().await;
                    }
                },
            )
        });

        MountedController {
            controller: self.clone(),
            initial_load: Some(initial_load),
            jobs_refresh: Some(jobs_refresh),
            status_poll,
        }
    }
}

/// A controller with its background work running.
pub struct MountedController {
    controller: Arc<JobListController>,
    initial_load: Option<JoinHandle<()>>,
    jobs_refresh: Option<PeriodicTask>,
    status_poll: Option<PeriodicTask>,
}

impl MountedController {
    pub fn controller(&self) -> &Arc<JobListController> {
        &self.controller
    }

    pub fn running_tasks(&self) -> Vec<&'static str> {
        self.jobs_refresh
            .iter()
            .chain(self.status_poll.iter())
            .filter(|task| !task.is_finished())
            .map(PeriodicTask::name)
            .collect()
    }

    pub async fn unmount(mut self) {
        if let Some(initial_load) = self.initial_load.take() {
            initial_load.abort();
        }
        if let Some(task) = self.jobs_refresh.take() {
            task.cancel().await;
        }
        if let Some(task) = self.status_poll.take() {
            task.cancel().await;
        }
        info!("job list unmounted");
    }
}

impl Drop for MountedController {
    fn drop(&mut self) {
        if let Some(initial_load) = self.initial_load.take() {
            initial_load.abort();
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
