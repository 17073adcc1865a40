use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use logger::LevelFilter;

use uptime_service::config::Config;
use uptime_service::database::{Database, open_database};
use uptime_service::metrics::{MAX_RESPONSE_HOURS, MAX_UPTIME_DAYS, MetricsAggregator};
use uptime_service::models::{Incident, Monitor, MonitorStatus, MonitorType, StatusPage};
use uptime_service::monitoring::CheckDispatcher;
use uptime_service::monitoring::validation::validate_monitor;
use uptime_service::runner::Runner;
use uptime_service::Error;

#[derive(Parser)]
#[command(name = "uptime")]
#[command(about = "Probe network targets and track their availability")]
#[command(version)]
struct Cli {
    /// Config file (defaults to $XDG_CONFIG_HOME/uptime/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log check activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a monitor
    Add {
        name: String,
        /// http, tcp, ping, dns or cert
        #[arg(value_name = "TYPE")]
        monitor_type: String,
        target: String,
        /// Seconds between checks
        #[arg(long)]
        interval: Option<u64>,
        /// Seconds before a probe attempt is abandoned
        #[arg(long)]
        timeout: Option<u64>,
        #[arg(long, default_value_t = 0)]
        retries: u32,
        #[arg(long, num_args = 1..)]
        tags: Vec<String>,
    },

    /// Run one check cycle over every monitor that is not paused
    CheckAll,

    /// Check a single monitor
    Check { id: String },

    /// Show every monitor with its last result
    Status,

    /// Stop checking a monitor
    Pause { id: String },

    /// Resume checking a paused monitor
    Resume { id: String },

    /// List incidents
    Incidents {
        #[arg(long)]
        monitor: Option<String>,
        /// Only unresolved incidents
        #[arg(long)]
        open: bool,
    },

    /// Resolve an incident by hand
    Resolve { id: String },

    /// Uptime percentage over a window of days
    Uptime {
        id: String,
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..=MAX_UPTIME_DAYS as i64))]
        days: Option<u32>,
    },

    /// Response time statistics over a window of hours
    Stats {
        id: String,
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..=MAX_RESPONSE_HOURS as i64))]
        hours: Option<u32>,
    },

    /// Most recent heartbeats, oldest first
    History {
        id: String,
        #[arg(long, default_value_t = 100)]
        limit: usize,
    },

    /// Manage status pages
    #[command(subcommand)]
    Page(PageCommands),

    /// Print the active configuration
    Config,
}

#[derive(Subcommand)]
enum PageCommands {
    /// Create a status page listing the given monitors
    Create {
        name: String,
        slug: String,
        #[arg(required = true)]
        monitors: Vec<String>,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Show a status page with the current state of its monitors
    Show { slug: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.verbose {
        logger::init_with_level(LevelFilter::INFO);
    } else {
        logger::init();
    }

    let config = Config::from_config(cli.config.as_ref()).context("Failed to load configuration")?;

    if let Commands::Config = cli.command {
        print!("{config}");
        return Ok(());
    }

    let store: Arc<dyn Database> = Arc::new(
        open_database(&config.database.path, config.runner.parallelism.max(1))
            .await
            .with_context(|| format!("Failed to open database at {}", config.database.path.display()))?,
    );

    run(cli.command, &config, store).await
}

async fn run(command: Commands, config: &Config, store: Arc<dyn Database>) -> Result<()> {
    match command {
        Commands::Add { name, monitor_type, target, interval, timeout, retries, tags } => {
            let monitor_type: MonitorType = monitor_type.parse()?;
            let monitor = Monitor::new(name, monitor_type, target)
                .with_interval(interval.unwrap_or(config.defaults.interval_seconds))
                .with_timeout(timeout.unwrap_or(config.defaults.timeout_seconds))
                .with_retries(retries)
                .with_tags(tags);
            validate_monitor(&monitor)?;
            store.insert_monitor(&monitor).await?;
            println!("Monitor added: {}", monitor.id);
        }

        Commands::CheckAll => {
            let results = runner(config, store)?.check_all().await?;
            for (id, up) in results {
                println!("{id}: {}", mark(up));
            }
        }

        Commands::Check { id } => match runner(config, store)?.check_monitor(&id).await? {
            Some(transition) => println!(
                "{id}: {} {} ({})",
                mark(transition.is_up()),
                transition.status,
                format_ms(transition.response_time_ms)
            ),
            None => println!("{id}: paused"),
        },

        Commands::Status => {
            for monitor in store.list_monitors().await? {
                println!(
                    "{} ({}): {} ({})",
                    monitor.name,
                    monitor.id,
                    monitor.status,
                    format_ms(monitor.response_time_ms)
                );
            }
        }

        Commands::Pause { id } => {
            store.set_monitor_status(&id, MonitorStatus::Paused).await?;
            println!("Monitor paused: {id}");
        }

        Commands::Resume { id } => {
            let monitor = store.get_monitor(&id).await?.ok_or_else(|| Error::monitor_not_found(&id))?;
            if monitor.is_paused() {
                store.set_monitor_status(&id, MonitorStatus::Unknown).await?;
            }
            println!("Monitor resumed: {id}");
        }

        Commands::Incidents { monitor, open } => {
            for incident in store.get_incidents(monitor.as_deref(), open).await? {
                println!("{}", format_incident(&incident));
            }
        }

        Commands::Resolve { id } => {
            let incident = runner(config, store)?.resolve_incident(&id).await?;
            println!("{}", format_incident(&incident));
        }

        Commands::Uptime { id, days } => {
            let days = days.unwrap_or(config.metrics.uptime_days);
            let uptime = aggregator(config, store).uptime(&id, days).await?;
            println!("{id}: {uptime:.3}% over {days} day(s)");
        }

        Commands::Stats { id, hours } => {
            let hours = hours.unwrap_or(config.metrics.response_hours);
            let stats = aggregator(config, store).response_stats(&id, hours).await?;
            println!(
                "{id}: avg {:.1}ms, min {:.1}ms, max {:.1}ms over {} sample(s) in {hours}h",
                stats.mean, stats.min, stats.max, stats.count
            );
        }

        Commands::History { id, limit } => {
            for heartbeat in aggregator(config, store).history(&id, limit).await? {
                println!(
                    "{} {} {}",
                    format_time(heartbeat.timestamp),
                    heartbeat.status,
                    format_ms(heartbeat.response_time_ms)
                );
            }
        }

        Commands::Page(PageCommands::Create { name, slug, monitors, description }) => {
            for id in &monitors {
                store.get_monitor(id).await?.ok_or_else(|| Error::monitor_not_found(id))?;
            }
            let mut page = StatusPage::new(name, slug, monitors);
            page.description = description;
            store.insert_status_page(&page).await?;
            println!("Status page created: {}", page.slug);
        }

        Commands::Page(PageCommands::Show { slug }) => {
            let page = store
                .get_status_page(&slug)
                .await?
                .ok_or_else(|| Error::NotFound { kind: "status page", id: slug.clone() })?;
            println!("{}", page.name);
            if !page.description.is_empty() {
                println!("{}", page.description);
            }
            for id in &page.monitors {
                match store.get_monitor(id).await? {
                    Some(monitor) => println!("  {} ({}): {}", monitor.name, monitor.id, monitor.status),
                    None => println!("  {id}: missing"),
                }
            }
        }

        Commands::Config => print!("{config}"),
    }

    Ok(())
}

fn runner(config: &Config, store: Arc<dyn Database>) -> Result<Runner> {
    let dispatcher = CheckDispatcher::new().context("Failed to build probes")?;
    Ok(Runner::new(store, Arc::new(dispatcher))
        .with_parallelism(config.runner.parallelism)
        .with_retry_policy(config.runner.retry_policy))
}

fn aggregator(config: &Config, store: Arc<dyn Database>) -> MetricsAggregator {
    MetricsAggregator::new(store, config.metrics.open_incident_policy)
}

fn mark(up: bool) -> &'static str {
    if up { "✓" } else { "✗" }
}

fn format_ms(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |ms| format!("{ms:.1}ms"))
}

fn format_time(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn format_incident(incident: &Incident) -> String {
    let resolution = match (incident.resolved_at, incident.duration) {
        (Some(at), Some(duration)) => {
            format!("resolved {} after {:.1}s", format_time(at), duration.num_milliseconds() as f64 / 1000.0)
        }
        _ => "open".to_string(),
    };
    format!(
        "{} [{}] started {} {}: {}",
        incident.id,
        incident.monitor_id,
        format_time(incident.started_at),
        resolution,
        incident.cause
    )
}
