use chrono::Local;
use std::time::Duration;
use tracing::{error, info};

use crate::config::MonitorConfig;
use crate::db::connection::Database;
use crate::monitor::{Monitor, RetryPolicy, RunScope};
use crate::notify::WebhookSink;
use crate::providers::{BisClient, FeedClient};

mod address;
mod config;
mod db;
mod errors;
mod monitor;
mod notify;
mod providers;
mod schedule;

#[cfg(test)]
mod tests;

const DEFAULT_CONFIG_PATH: &str = "config/monitor.toml";

enum Mode {
    Daemon,
    Once,
    Owner(i64),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("building_monitor=info")),
        )
        .init();

    let (mode, config_path) = match parse_args() {
        Ok(parsed) => parsed,
        Err(msg) => {
            eprintln!("{msg}");
            eprintln!("Usage: building_monitor [--config <path>] [--once | --owner <id>]");
            std::process::exit(2);
        }
    };

    let config = match config::load_config(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "failed to load configuration");
            std::process::exit(1);
        }
    };

    if let Some(parent) = std::path::Path::new(&config.db_path).parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                error!(error = %e, "failed to create store directory");
                std::process::exit(1);
            }
        }
    }

    let db = Database::new(config.db_path.clone());
    if let Err(e) = db::migrations::init_store(&db) {
        error!(error = %e, "store initialization failed");
        std::process::exit(1);
    }

    let bis = match BisClient::new(config.proxy.as_deref()) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "failed to build BIS client");
            std::process::exit(1);
        }
    };
    let feed = match FeedClient::new() {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "failed to build 311 client");
            std::process::exit(1);
        }
    };
    let sink = match WebhookSink::new() {
        Ok(sink) => sink,
        Err(e) => {
            error!(error = %e, "failed to build webhook client");
            std::process::exit(1);
        }
    };

    let monitor = Monitor {
        db: &db,
        bis: &bis,
        feed: &feed,
        sink: &sink,
    };
    let policy = RetryPolicy::default();

    match mode {
        // Manual runs propagate success to the caller through the exit code.
        Mode::Owner(owner_id) => {
            let code = match monitor.run_check(&config, RunScope::Owner(owner_id), &policy) {
                Ok(report) => {
                    info!(
                        checked = report.addresses_checked,
                        failed = report.failed_addresses.len(),
                        "owner run completed"
                    );
                    0
                }
                Err(e) => {
                    error!(error = %e, "owner run failed");
                    1
                }
            };
            std::process::exit(code);
        }
        Mode::Once => {
            let code = match monitor.run_check(&config, RunScope::All, &policy) {
                Ok(_) => 0,
                Err(e) => {
                    error!(error = %e, "run failed");
                    1
                }
            };
            std::process::exit(code);
        }
        Mode::Daemon => run_daemon(&monitor, &config, &policy),
    }
}

fn parse_args() -> Result<(Mode, String), String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut mode = Mode::Daemon;
    let mut config_path = DEFAULT_CONFIG_PATH.to_string();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--once" => mode = Mode::Once,
            "--owner" => {
                i += 1;
                let id = args
                    .get(i)
                    .and_then(|s| s.parse::<i64>().ok())
                    .ok_or("--owner requires a numeric owner id")?;
                mode = Mode::Owner(id);
            }
            "--config" => {
                i += 1;
                config_path = args
                    .get(i)
                    .cloned()
                    .ok_or("--config requires a file path")?;
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    Ok((mode, config_path))
}

fn run_daemon(monitor: &Monitor<'_>, config: &MonitorConfig, policy: &RetryPolicy) -> ! {
    loop {
        match monitor.run_check(config, RunScope::All, policy) {
            Ok(report) => info!(
                checked = report.addresses_checked,
                failed = report.failed_addresses.len(),
                "scheduled run completed"
            ),
            Err(e) => {
                error!(error = %e, "scheduled run failed, retrying in 5 minutes");
                std::thread::sleep(Duration::from_secs(300));
                continue;
            }
        }

        match schedule::next_run_time(Local::now(), &config.schedule) {
            Some(next) => {
                info!(next = %next, "sleeping until next scheduled run");
                let wait = (next - Local::now()).to_std().unwrap_or_default();
                std::thread::sleep(wait);
            }
            None => {
                error!("no valid hours in schedule, sleeping one hour");
                std::thread::sleep(Duration::from_secs(3600));
            }
        }
    }
}
