use std::{future::Future, io, path::PathBuf, sync::Arc};

use anyhow::Result;
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use client_core::{ControllerEvent, JobListController, RefreshOutcome};
use shared::domain::{FilterCriteria, SortOption};
use tokio::sync::broadcast::error::RecvError;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod opener;
mod render;

use opener::StdoutLinkOpener;

#[derive(Parser, Debug)]
#[command(name = "job-board", about = "Browse job postings and drive the job service")]
struct Cli {
    /// Base URL of the job service (overrides config file and environment).
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Path to a TOML config file (defaults to ./job-board.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone)]
struct FilterArgs {
    #[arg(long, default_value = "")]
    search: String,
    #[arg(long)]
    location: Option<String>,
    #[arg(long)]
    experience: Option<String>,
    #[arg(long, default_value_t = SortOption::Recent)]
    sort: SortOption,
}

impl From<FilterArgs> for FilterCriteria {
    fn from(args: FilterArgs) -> Self {
        FilterCriteria {
            search_term: args.search,
            location_filter: args.location,
            experience_filter: args.experience,
            sort_option: args.sort,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch jobs and print the filtered list.
    List {
        #[command(flatten)]
        filters: FilterArgs,
        /// Print the visible jobs as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Ask the service to regenerate its job collection.
    Refresh,
    /// Open a job link and report the click.
    Open { link: String },
    /// Inspect or toggle the auto-apply process.
    Automation {
        #[command(subcommand)]
        action: AutomationAction,
    },
    /// Keep the list on screen, refreshing on the configured timers.
    Watch {
        #[command(flatten)]
        filters: FilterArgs,
    },
}

#[derive(Subcommand, Debug)]
enum AutomationAction {
    Status,
    Toggle,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let settings = config::load_settings(cli.config.as_deref(), cli.api_url.as_deref())?;
    let show_stats = settings.show_stats;
    let controller = JobListController::connect(settings, Arc::new(StdoutLinkOpener))?;

    match cli.command {
        Command::List { filters, json } => {
            controller.set_criteria(filters.into()).await;
            let loaded = controller.load_jobs().await;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&controller.visible_jobs().await)?
                );
            } else {
                print!("{}", render_now(&controller).await);
            }
            loaded?;
        }
        Command::Refresh => {
            let outcome = controller.refresh().await;
            if let Some(notification) = controller.notification().await {
                println!("{}", notification.message);
            }
            if let RefreshOutcome::Completed = outcome? {
                println!("{} jobs available", controller.jobs().await.len());
            }
        }
        Command::Open { link } => {
            let tracking = controller.open_job(link).await;
            tracking.await?;
        }
        Command::Automation { action } => {
            // A fresh process knows nothing yet; toggling relies on the reported status.
            controller.poll_status().await?;
            if let AutomationAction::Toggle = action {
                let result = controller.toggle_automation().await;
                if let Some(notification) = controller.notification().await {
                    println!("{}", notification.message);
                }
                result?;
            }
            print!(
                "{}",
                render::render_automation(&controller.automation().await, show_stats)
            );
        }
        Command::Watch { filters } => {
            controller.set_criteria(filters.into()).await;
            watch(controller).await?;
        }
    }

    Ok(())
}

async fn render_now(controller: &JobListController) -> String {
    render::render_snapshot(&controller.snapshot().await, Local::now().date_naive())
}

async fn watch(controller: Arc<JobListController>) -> Result<()> {
    watch_until(controller, tokio::signal::ctrl_c()).await
}

/// Re-renders on controller events until `shutdown` resolves. The shutdown
/// future is polled across iterations so a signal during a render is kept.
async fn watch_until<S>(controller: Arc<JobListController>, shutdown: S) -> Result<()>
where
    S: Future<Output = io::Result<()>>,
{
    let mut events = controller.subscribe();
    let mounted = controller.mount();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            signal = &mut shutdown => {
                signal?;
                info!("shutdown requested, unmounting job list");
                break;
            }
            event = events.recv() => match event {
                Ok(ControllerEvent::JobsReplaced { .. })
                | Ok(ControllerEvent::LoadingChanged(_)) => {}
                Ok(_) => print!("{}", render_now(&controller).await),
                Err(RecvError::Lagged(skipped)) => {
                    info!(skipped, "render fell behind controller events");
                    print!("{}", render_now(&controller).await);
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    mounted.unmount().await;
    Ok(())
}
