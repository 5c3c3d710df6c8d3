use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::JobRecord,
    protocol::{AutomationStatusResponse, MarkJobClickedRequest},
};
use tracing::debug;
use url::Url;

pub mod config;
pub mod controller;
pub mod filter;
pub mod notification;
pub mod presentation;
pub mod scheduler;

pub use config::{ConfigError, ControllerConfig};
pub use controller::{
    AutomationSnapshot, ControllerError, ControllerEvent, JobListController, MountedController,
    RefreshOutcome, ViewSnapshot,
};
pub use filter::{apply_filters, matches_criteria, sort_jobs};
pub use notification::{Notification, NotificationKind};
pub use scheduler::{FirstTick, PeriodicTask};

/// Remote job service the controller talks to.
#[async_trait]
pub trait JobService: Send + Sync {
    async fn fetch_jobs(&self) -> Result<Vec<JobRecord>>;
    async fn trigger_update(&self) -> Result<()>;
    async fn mark_job_clicked(&self, link: &str) -> Result<()>;
    async fn start_automation(&self) -> Result<()>;
    async fn stop_automation(&self) -> Result<()>;
    async fn automation_status(&self) -> Result<AutomationStatusResponse>;
}

/// Hands a job's external link to whatever can display it.
#[async_trait]
pub trait LinkOpener: Send + Sync {
    async fn open(&self, link: &str) -> Result<()>;
}

pub struct HttpJobService {
    http: Client,
    base_url: String,
}

impl HttpJobService {
    pub fn new(base_url: &str) -> std::result::Result<Self, ConfigError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> std::result::Result<Self, ConfigError> {
        let parsed = Url::parse(base_url.trim()).map_err(|source| ConfigError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme(parsed.scheme().to_string()));
        }
        Ok(Self {
            http,
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }
}

#[async_trait]
impl JobService for HttpJobService {
    async fn fetch_jobs(&self) -> Result<Vec<JobRecord>> {
        let jobs: Vec<JobRecord> = self
            .http
            .get(self.endpoint("jobs"))
            .send()
            .await
            .context("GET /jobs failed")?
            .error_for_status()
            .context("GET /jobs returned an error status")?
            .json()
            .await
            .context("GET /jobs returned an unreadable body")?;
        debug!(count = jobs.len(), "fetched jobs");
        Ok(jobs)
    }

    async fn trigger_update(&self) -> Result<()> {
        self.http
            .get(self.endpoint("update-jobs"))
            .send()
            .await
            .context("GET /update-jobs failed")?
            .error_for_status()
            .context("GET /update-jobs returned an error status")?;
        Ok(())
    }

    async fn mark_job_clicked(&self, link: &str) -> Result<()> {
        self.http
            .post(self.endpoint("mark-job-clicked"))
            .json(&MarkJobClickedRequest {
                link: link.to_string(),
            })
            .send()
            .await
            .context("POST /mark-job-clicked failed")?
            .error_for_status()
            .context("POST /mark-job-clicked returned an error status")?;
        Ok(())
    }

    async fn start_automation(&self) -> Result<()> {
        self.http
            .post(self.endpoint("start-automation"))
            .send()
            .await
            .context("POST /start-automation failed")?
            .error_for_status()
            .context("POST /start-automation returned an error status")?;
        Ok(())
    }

    async fn stop_automation(&self) -> Result<()> {
        self.http
            .post(self.endpoint("stop-automation"))
            .send()
            .await
            .context("POST /stop-automation failed")?
            .error_for_status()
            .context("POST /stop-automation returned an error status")?;
        Ok(())
    }

    async fn automation_status(&self) -> Result<AutomationStatusResponse> {
        self.http
            .get(self.endpoint("automation-status"))
            .send()
            .await
            .context("GET /automation-status failed")?
            .error_for_status()
            .context("GET /automation-status returned an error status")?
            .json()
            .await
            .context("GET /automation-status returned an unreadable body")
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
