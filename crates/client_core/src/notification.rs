#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// Transient user-visible message. Auto-dismissed by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn is_error(&self) -> bool {
        self.kind == NotificationKind::Error
    }
}

pub(crate) const JOBS_FETCH_FAILED: &str = "Failed to fetch jobs. Please try again.";
pub(crate) const JOBS_UPDATE_FAILED: &str = "Failed to update jobs. Please try again.";
pub(crate) const JOBS_UPDATED: &str = "Jobs updated successfully!";
pub(crate) const AUTOMATION_STARTED: &str = "Job application automation started";
pub(crate) const AUTOMATION_STOPPED: &str = "Job application automation stopped";
pub(crate) const AUTOMATION_START_FAILED: &str = "Failed to start automation";
pub(crate) const AUTOMATION_STOP_FAILED: &str = "Failed to stop automation";
