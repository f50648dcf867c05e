//! `arronax-tui`: interactive terminal explorer for Tezos data indexed by Conseil.
//!
//! Built on [ratatui](https://ratatui.rs) with state from `arronax-core`'s
//! [`StateStream`](arronax_core::StateStream). One explorer screen shows the
//! selected entity (blocks, accounts, operations) as a paged table, with a
//! filter panel, a record modal and a network switcher.
//!
//! Logs are written to a file (default `/tmp/arronax-tui.log`) so they never
//! corrupt the terminal. A background data bridge forwards every store
//! snapshot into the TUI action loop.

mod action;
mod app;
mod command_queue;
mod component;
mod data_bridge;
mod event;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use arronax_core::Explorer;

use crate::app::App;

/// Terminal explorer for Tezos blocks, accounts and operations.
#[derive(Parser, Debug)]
#[command(name = "arronax-tui", version, about)]
struct Cli {
    /// Network to open (defaults to the config's default_network)
    #[arg(short = 'n', long, env = "ARRONAX_NETWORK")]
    network: Option<String>,

    /// Log file path (defaults to /tmp/arronax-tui.log)
    #[arg(long, default_value = "/tmp/arronax-tui.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Set up file-based tracing. Nothing may log to stdout/stderr while the
/// terminal is in raw mode. The returned guard flushes logs on drop.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("arronax_tui={log_level},arronax_core={log_level}"))
    });

    let log_dir = cli
        .log_file
        .parent()
        .unwrap_or(std::path::Path::new("/tmp"));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("arronax-tui.log"));

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

/// Build the explorer from the shared config file.
fn build_explorer(cli: &Cli) -> Result<Explorer> {
    let cfg = arronax_config::load_config()
        .wrap_err("no usable config; run `arronax config init` first")?;
    let explorer_config = arronax_config::config_to_explorer_config(&cfg, cli.network.as_deref())?;
    Ok(Explorer::new(explorer_config)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Hooks go in before the terminal switches modes
    tui::install_hooks()?;

    let _log_guard = setup_tracing(&cli);

    let explorer = build_explorer(&cli)?;
    info!(
        network = %explorer.config().default_network,
        entity = %explorer.config().default_entity,
        "starting arronax-tui"
    );

    let mut app = App::new(explorer);
    app.run().await?;

    Ok(())
}
