//! `coursedesk-tui`: terminal admin console for Coursedesk.
//!
//! Built on [ratatui](https://ratatui.rs). Each entity kind (users,
//! subjects, tasks) gets a listing screen, navigable with number keys 1-3.
//! Edit and delete modals are hosted by the app, not by the listing, and
//! reach the listing only through the core action coordinator.
//!
//! Logs are written to a file (default `/tmp/coursedesk-tui.log`) to avoid
//! corrupting the terminal UI.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
mod screen;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use coursedesk_config::Config;
use coursedesk_core::{ClientConfig, Session};

use crate::app::App;

/// Terminal admin console for users, subjects, and tasks.
#[derive(Parser, Debug)]
#[command(name = "coursedesk-tui", version, about)]
struct Cli {
    /// Config profile to use
    #[arg(short = 'p', long, env = "COURSEDESK_PROFILE")]
    profile: Option<String>,

    /// Admin API base URL (overrides profile)
    #[arg(short = 'a', long, env = "COURSEDESK_API_URL")]
    api_url: Option<String>,

    /// Log file path
    #[arg(long, default_value = "/tmp/coursedesk-tui.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-based tracing; stdout belongs to the terminal UI. Hold the guard
/// for the lifetime of the app so logs flush.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "coursedesk_tui={log_level},coursedesk_core={log_level},coursedesk_api={log_level}"
        ))
    });

    let log_dir = cli
        .log_file
        .parent()
        .unwrap_or(std::path::Path::new("/tmp"));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("coursedesk-tui.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    guard
}

/// Resolve the client config: profile from the shared config file, then
/// `--api-url`.
fn resolve_config(cli: &Cli, cfg: &Config, profile_name: &str) -> Result<ClientConfig> {
    let mut client_config = match cfg.profiles.get(profile_name) {
        Some(profile) => coursedesk_config::profile_to_client_config(profile, &cfg.defaults)?,
        None => {
            let url = cli.api_url.as_deref().ok_or_else(|| {
                eyre!(
                    "no profile '{profile_name}' in {}; run `coursedesk config init` or pass --api-url",
                    coursedesk_config::config_path().display()
                )
            })?;
            ClientConfig::new(url.parse().wrap_err("invalid --api-url")?)
        }
    };

    if let Some(url) = cli.api_url.as_deref() {
        client_config.base_url = url.parse().wrap_err("invalid --api-url")?;
    }
    Ok(client_config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Hooks first so a panic during init still restores the terminal
    tui::install_hooks()?;
    let _log_guard = setup_tracing(&cli);

    let cfg = coursedesk_config::load_config_or_default();
    let profile_name = cfg.profile_name(cli.profile.as_deref());
    let client_config = resolve_config(&cli, &cfg, &profile_name)?;

    info!(
        profile = %profile_name,
        url = %client_config.base_url,
        discipline = %client_config.discipline,
        "starting coursedesk-tui"
    );

    let session = coursedesk_config::open_session(&profile_name).unwrap_or_else(|e| {
        warn!(error = %e, "token storage unavailable, token will not persist");
        Session::ephemeral()
    });
    let client = client_config.connect(session)?;

    let mut app = App::new(client, &client_config);
    app.run().await?;

    Ok(())
}
