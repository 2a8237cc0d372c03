mod app;
mod config;
mod logging;
mod refresh;
mod scheduler;
mod ui;

use anyhow::{anyhow, Context, Result};
use app::{App, TimerEffect, ViewOverrides};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use config::Config;
use crossterm::{
    event::EventStream,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use refresh::Fetcher;
use scheduler::Scheduler;
use serde::Serialize;
use std::{fs, io, sync::Arc};
use tdash_core::{AgeView, SortOrder, StatusKey};
use tdash_source::{DataSourceAdapter, HttpBackend};
use tdash_storage::SqliteCacheStore;
use tokio::sync::mpsc;
use tracing::{info, warn};
use ui::KeyAction;

const FETCH_QUEUE_CAPACITY: usize = 64;
const TIMER_QUEUE_CAPACITY: usize = 16;

#[derive(Parser)]
#[command(name = "tdash")]
#[command(about = "Live support-ticket dashboard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    #[command(flatten)]
    view: ViewArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive dashboard (default)
    Run,
    /// Fetch every dataset once and print the dashboard view as JSON
    Snapshot {
        #[arg(long)]
        pretty: bool,
    },
}

#[derive(Args, Default)]
struct ViewArgs {
    /// Department id to select (repeatable)
    #[arg(long = "department", global = true)]
    departments: Vec<String>,
    /// Agent name to select (repeatable)
    #[arg(long = "agent", global = true)]
    agents: Vec<String>,
    /// Status column to show: open, hold, in-progress, escalated, total
    #[arg(long = "status", global = true, value_parser = parse_status)]
    statuses: Vec<StatusKey>,
    /// Sort order: asc or desc
    #[arg(long, global = true, value_parser = parse_sort)]
    sort: Option<SortOrder>,
    /// 1-based candidate page
    #[arg(long, global = true)]
    page: Option<usize>,
    /// Table to enable: agents, department, pending, metrics, archived
    #[arg(long = "table", global = true, value_parser = parse_table)]
    tables: Vec<String>,
    /// Agent to show in a department panel, as DEPARTMENT=AGENT (repeatable)
    #[arg(long = "pick", global = true, value_parser = parse_pick)]
    picks: Vec<(String, String)>,
    /// Backend base url, overriding TDASH_BACKEND_URL
    #[arg(long, global = true)]
    backend_url: Option<String>,
}

impl ViewArgs {
    fn overrides(&self) -> ViewOverrides {
        let mut tables = Vec::new();
        for table in &self.tables {
            match table.as_str() {
                "agents" => tables.extend(AgeView::AGENT_BUCKETS),
                "department" => tables.push(AgeView::Department),
                "pending" => tables.push(AgeView::Pending),
                "metrics" => tables.push(AgeView::Metrics),
                "archived" => tables.push(AgeView::Archived),
                _ => {}
            }
        }
        ViewOverrides {
            departments: self.departments.clone(),
            agents: self.agents.clone(),
            statuses: self.statuses.clone(),
            sort: self.sort,
            page: self.page,
            tables,
            picks: self.picks.clone(),
        }
    }
}

fn parse_status(value: &str) -> Result<StatusKey, String> {
    value.parse()
}

fn parse_sort(value: &str) -> Result<SortOrder, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "asc" => Ok(SortOrder::Asc),
        "desc" => Ok(SortOrder::Desc),
        other => Err(format!("expected asc or desc, got {other}")),
    }
}

fn parse_table(value: &str) -> Result<String, String> {
    let table = value.trim().to_ascii_lowercase();
    match table.as_str() {
        "agents" | "department" | "pending" | "metrics" | "archived" => Ok(table),
        other => Err(format!("unknown table {other}")),
    }
}

fn parse_pick(value: &str) -> Result<(String, String), String> {
    let (department, agent) = value
        .split_once('=')
        .ok_or_else(|| format!("expected DEPARTMENT=AGENT, got {value}"))?;
    let (department, agent) = (department.trim(), agent.trim());
    if department.is_empty() || agent.is_empty() {
        return Err(format!("expected DEPARTMENT=AGENT, got {value}"));
    }
    Ok((department.to_string(), agent.to_string()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = config::load_config().context("invalid configuration")?;
    if let Some(url) = cli.view.backend_url.as_deref() {
        config.backend_url = config::normalize_backend_url(url)?;
    }
    logging::init_logging(&config);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let overrides = cli.view.overrides();
    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => runtime.block_on(run_dashboard(config, overrides)),
        Commands::Snapshot { pretty } => runtime.block_on(print_snapshot(config, overrides, pretty)),
    }
}

type BoardAdapter = DataSourceAdapter<HttpBackend, Arc<SqliteCacheStore>>;

fn open_sources(config: &Config) -> Result<(Arc<SqliteCacheStore>, Arc<BoardAdapter>)> {
    fs::create_dir_all(&config.state_dir)
        .with_context(|| format!("failed to create {}", config.state_dir.display()))?;
    let cache_path = config.cache_path();
    let cache = Arc::new(
        SqliteCacheStore::open(&cache_path)
            .with_context(|| format!("failed to open cache at {}", cache_path.display()))?,
    );
    let backend = HttpBackend::new(config.backend_url.clone(), config.http_timeout)
        .context("failed to build http backend")?;
    let adapter = Arc::new(DataSourceAdapter::new(backend, Arc::clone(&cache)));
    Ok((cache, adapter))
}

async fn run_dashboard(config: Config, overrides: ViewOverrides) -> Result<()> {
    let (cache, adapter) = open_sources(&config)?;
    info!(backend = %config.backend_url, "starting dashboard");
    let mut app = App::new(config, cache);
    app.apply_overrides(overrides);

    let (fetch_tx, mut fetch_rx) = mpsc::channel(FETCH_QUEUE_CAPACITY);
    let fetcher = Fetcher::new(adapter, fetch_tx);
    fetcher.spawn_departments();

    let (timer_tx, mut timer_rx) = mpsc::channel(TIMER_QUEUE_CAPACITY);
    let mut scheduler = Scheduler::new(timer_tx);
    scheduler.reconcile(&app.schedule_plan());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let mut events = EventStream::new();

    let outcome = loop {
        if let Some(department_id) = app.take_archived_request() {
            fetcher.spawn_archived(department_id);
        }
        if let Err(err) = terminal.draw(|frame| ui::render_ui(frame, &app)) {
            break Err(anyhow!(err));
        }
        tokio::select! {
            Some(kind) = timer_rx.recv() => {
                if let TimerEffect::Refresh(generation) = app.on_timer(kind) {
                    fetcher.spawn_bulk(generation);
                }
            }
            Some(event) = fetch_rx.recv() => {
                app.apply_fetch(event);
            }
            maybe_event = events.next() => {
                match maybe_event {
                    Some(Ok(event)) => match ui::handle_input(event, &mut app) {
                        KeyAction::Quit => break Ok(()),
                        KeyAction::Refresh => {
                            let generation = app.next_generation();
                            fetcher.spawn_bulk(generation);
                        }
                        KeyAction::None => {}
                    },
                    Some(Err(err)) => warn!(error = %err, "terminal event error"),
                    None => break Ok(()),
                }
            }
        }
        scheduler.reconcile(&app.schedule_plan());
    };

    scheduler.shutdown();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    outcome
}

#[derive(Serialize)]
struct SnapshotReport<'a> {
    generated_at: String,
    backend_url: &'a str,
    status: &'a app::FetchStatus,
    view: &'a tdash_pipeline::DashboardView,
}

async fn print_snapshot(config: Config, overrides: ViewOverrides, pretty: bool) -> Result<()> {
    let (cache, adapter) = open_sources(&config)?;
    let mut app = App::new(config, cache);
    app.apply_overrides(overrides);

    let generation = app.next_generation();
    let (departments, snapshot, metrics) = tokio::join!(
        adapter.fetch_departments(),
        adapter.fetch_agent_snapshot(),
        adapter.fetch_metrics(),
    );
    app.apply_fetch(refresh::FetchEvent::Departments(departments));
    app.apply_fetch(refresh::FetchEvent::Snapshot {
        generation,
        fetched: snapshot,
    });
    app.apply_fetch(refresh::FetchEvent::Metrics {
        generation,
        fetched: metrics,
    });
    if let Some(department_id) = app.take_archived_request() {
        let fetched = adapter.fetch_archived(department_id.as_deref()).await;
        app.apply_fetch(refresh::FetchEvent::Archived {
            department_id,
            fetched,
        });
    }

    let report = SnapshotReport {
        generated_at: Utc::now().to_rfc3339(),
        backend_url: &app.config.backend_url,
        status: &app.status,
        view: &app.view,
    };
    let rendered = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{rendered}");
    Ok(())
}
