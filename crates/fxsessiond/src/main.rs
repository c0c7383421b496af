//! fxsessiond - The fxsession background service
//!
//! This is the main entry point for the fxsessiond service.
//! It wires together all the components:
//! - Configuration loading (built-in session tables when no file exists)
//! - Store initialization
//! - Session engine
//! - Notification sink

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::Parser;
use fxsession_api::{Notification, WindowPhase};
use fxsession_config::{Policy, default_policy, load_config};
use fxsession_core::{
    CoreEvent, FiredAlert, FiredAlerts, NotificationSink, NotifyResult, SessionEngine,
};
use fxsession_store::{AuditEvent, AuditEventType, SqliteStore, Store};
use fxsession_util::{
    default_config_path, format_duration, format_hour, is_mock_time_active, now_utc,
    validate_offset,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{SignalKind, signal};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// fxsessiond - Forex trading-session clock and alert service
#[derive(Parser, Debug)]
#[command(name = "fxsessiond")]
#[command(about = "Forex trading-session clock and alert service", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/fxsession/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Data directory override (or set FXSESSION_DATA_DIR env var)
    #[arg(short, long, env = "FXSESSION_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Observer offset from UTC in hours, overriding the config (e.g. 5.5, -3.5)
    #[arg(short, long, allow_negative_numbers = true)]
    offset: Option<f64>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Print a single snapshot as JSON and exit
    #[arg(long)]
    once: bool,
}

/// Load the policy from `path`, falling back to the built-in tables when the
/// file does not exist, and apply the command-line offset.
fn load_policy(path: &Path, offset: Option<f64>) -> Result<Policy> {
    let mut policy = if path.exists() {
        let policy = load_config(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?;
        info!(
            config_path = %path.display(),
            session_count = policy.session_count(),
            "Configuration loaded"
        );
        policy
    } else {
        info!(
            config_path = %path.display(),
            "No config file found, using built-in session tables"
        );
        default_policy().context("Built-in configuration is invalid")?
    };

    if let Some(offset) = offset {
        policy.engine.observer_offset_hours =
            validate_offset(offset).context("Invalid --offset")?;
    }

    Ok(policy)
}

/// Sink that writes alerts to the service log
struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&self, alert: &FiredAlert, notification: &Notification) -> NotifyResult<()> {
        info!(
            alert_id = %alert.event.id,
            trigger = %format_hour(alert.event.trigger_hour),
            title = %notification.title,
            body = %notification.body,
            "Session alert"
        );
        Ok(())
    }
}

/// Main service state
struct Service {
    engine: SessionEngine,
    store: Arc<dyn Store>,
    sink: Box<dyn NotificationSink>,
    fired: FiredAlerts,
    config_path: PathBuf,
    offset_override: Option<f64>,
    last_phases: HashMap<(String, String), WindowPhase>,
    current_day: Option<NaiveDate>,
}

impl Service {
    fn new(args: &Args) -> Result<Self> {
        let policy = load_policy(&args.config, args.offset)?;

        let data_dir = args
            .data_dir
            .clone()
            .unwrap_or_else(|| policy.service.data_dir.clone());

        // Create data directory
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

        // Initialize store
        let db_path = data_dir.join("fxsession.db");
        let store: Arc<dyn Store> = Arc::new(
            SqliteStore::open(&db_path)
                .with_context(|| format!("Failed to open database {:?}", db_path))?,
        );

        if !store.is_healthy() {
            anyhow::bail!("Database {:?} failed its health check", db_path);
        }

        info!(db_path = %db_path.display(), "Store initialized");

        store.append_audit(AuditEvent::new(AuditEventType::ServiceStarted))?;
        store.append_audit(AuditEvent::new(AuditEventType::PolicyLoaded {
            session_count: policy.session_count(),
        }))?;

        // Restore fired alerts so a restart does not repeat them
        let mut fired = FiredAlerts::new();
        for day in FiredAlerts::live_days(now_utc().date_naive()) {
            fired.extend(day, store.load_fired_alerts(day)?);
        }
        if !fired.is_empty() {
            info!(count = fired.len(), "Restored fired alerts");
        }

        let engine = SessionEngine::new(policy);

        Ok(Self {
            engine,
            store,
            sink: Box::new(LogSink),
            fired,
            config_path: args.config.clone(),
            offset_override: args.offset,
            last_phases: HashMap::new(),
            current_day: None,
        })
    }

    async fn run(mut self) -> Result<()> {
        // Set up signal handlers
        let mut sigterm = signal(SignalKind::terminate())
            .context("Failed to create SIGTERM handler")?;
        let mut sigint = signal(SignalKind::interrupt())
            .context("Failed to create SIGINT handler")?;
        let mut sighup = signal(SignalKind::hangup())
            .context("Failed to create SIGHUP handler")?;

        let service_config = &self.engine.policy().service;
        let mut snapshot_timer = tokio::time::interval(service_config.snapshot_interval);
        snapshot_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut alert_timer = tokio::time::interval(service_config.alert_interval);
        alert_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            snapshot_interval = ?service_config.snapshot_interval,
            alert_interval = ?service_config.alert_interval,
            "Service running"
        );

        loop {
            tokio::select! {
                // Signal: SIGTERM or SIGINT - graceful shutdown
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    break;
                }

                // Signal: SIGHUP - reload configuration
                _ = sighup.recv() => {
                    info!("Received SIGHUP, reloading configuration");
                    self.reload();
                }

                // Snapshot timer - re-evaluate every window
                _ = snapshot_timer.tick() => {
                    self.publish_snapshot(now_utc());
                }

                // Alert timer - fire due alerts, report table switches
                _ = alert_timer.tick() => {
                    self.check_alerts(now_utc());
                }
            }
        }

        // Graceful shutdown
        info!("Shutting down fxsessiond");

        if let Err(e) = self.store.append_audit(AuditEvent::new(AuditEventType::ServiceStopped)) {
            warn!(error = %e, "Failed to log service shutdown");
        }

        info!("Shutdown complete");
        Ok(())
    }

    fn publish_snapshot(&mut self, now: DateTime<Utc>) {
        let ctx = self.engine.context_at(now);
        let snapshot = self.engine.evaluate(&ctx);

        for window in &snapshot.windows {
            let key = (window.session.to_string(), window.role.clone());
            let previous = self.last_phases.insert(key, window.state.phase);
            if let Some(previous) = previous
                && previous != window.state.phase
            {
                let countdown = Duration::from_secs(window.state.remaining_secs.unsigned_abs());
                info!(
                    window = %window.label,
                    from = ?previous,
                    to = ?window.state.phase,
                    remaining = %format_duration(countdown),
                    "Window phase changed"
                );
            }
        }

        if let Err(e) = self.store.save_snapshot(&snapshot) {
            warn!(error = %e, "Failed to save snapshot");
        }
    }

    fn check_alerts(&mut self, now: DateTime<Utc>) {
        let today = now.date_naive();
        if self.current_day != Some(today) {
            // Keep yesterday for triggers that straddle midnight
            if let Some(yesterday) = today.pred_opt() {
                match self.store.prune_fired_alerts(yesterday) {
                    Ok(removed) => debug!(removed, "Pruned old fired alerts"),
                    Err(e) => warn!(error = %e, "Failed to prune fired alerts"),
                }
            }
            self.current_day = Some(today);
        }

        let ctx = self.engine.context_at(now);
        let events = self.engine.tick(&ctx, &mut self.fired);
        for event in events {
            self.handle_core_event(event);
        }
    }

    fn handle_core_event(&self, event: CoreEvent) {
        match event {
            CoreEvent::TableSwitched { from, to } => {
                if let Err(e) = self
                    .store
                    .append_audit(AuditEvent::new(AuditEventType::TableSwitched { from, to }))
                {
                    warn!(error = %e, "Failed to log table switch");
                }
            }

            CoreEvent::AlertFired {
                alert,
                notification,
            } => {
                if let Err(e) = self.store.record_fired_alert(alert.day(), &alert.key) {
                    warn!(error = %e, key = %alert.key, "Failed to persist fired alert");
                }
                if let Err(e) = self.store.append_audit(AuditEvent::new(AuditEventType::AlertFired {
                    alert_id: alert.event.id.to_string(),
                    trigger_hour: alert.event.trigger_hour,
                })) {
                    warn!(error = %e, "Failed to log fired alert");
                }
                if let Err(e) = self.sink.notify(&alert, &notification) {
                    warn!(error = %e, alert_id = %alert.event.id, "Failed to deliver notification");
                }
            }

            CoreEvent::PolicyReloaded { session_count } => {
                if let Err(e) = self
                    .store
                    .append_audit(AuditEvent::new(AuditEventType::PolicyLoaded { session_count }))
                {
                    warn!(error = %e, "Failed to log policy reload");
                }
            }
        }
    }

    fn reload(&mut self) {
        match load_policy(&self.config_path, self.offset_override) {
            Ok(policy) => {
                let event = self.engine.reload_policy(policy);
                self.last_phases.clear();
                self.handle_core_event(event);
            }
            Err(e) => {
                error!(error = %format!("{:#}", e), "Config reload failed, keeping current policy");
            }
        }
    }
}

/// Evaluate once at the current time and print the snapshot
fn print_snapshot(args: &Args) -> Result<()> {
    let policy = load_policy(&args.config, args.offset)?;
    let engine = SessionEngine::new(policy);
    let snapshot = engine.evaluate(&engine.context_at(now_utc()));

    let json = serde_json::to_string_pretty(&snapshot).context("Failed to serialize snapshot")?;
    println!("{}", json);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging. Logs go to stderr so `--once` output stays clean JSON.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "fxsessiond starting"
    );

    if is_mock_time_active() {
        warn!(now = %now_utc(), "Mock time is active");
    }

    if args.once {
        return print_snapshot(&args);
    }

    // Create and run the service
    let service = Service::new(&args)?;
    service.run().await
}
