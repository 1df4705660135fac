mod commands;
mod gateway;
mod replies;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use taskbot_channels::{zalo, LogNotifier};
use taskbot_core::config::{self, Config};
use taskbot_memory::{Inbox, Store};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "taskbot",
    version,
    about = "Group-chat task tracker for Zalo OA webhooks"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Keep tasks and inbox in memory only; nothing is written to disk.
    #[arg(long, global = true)]
    ephemeral: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Process one webhook payload from FILE, or stdin when omitted.
    Handle {
        file: Option<PathBuf>,
    },
    /// Process newline-delimited webhook payloads from stdin until EOF.
    Run,
    /// Send the task report to the destination conversation.
    Report,
    /// Print tasks (open only unless --all).
    Tasks {
        #[arg(long)]
        all: bool,
    },
    /// Remove every task. Ids keep counting.
    Clear,
    /// Print configuration and task counts.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli.config)?;
    let _log_guard = init_logging(&cfg, cli.ephemeral);

    match cli.command {
        Commands::Handle { file } => {
            let body = match &file {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                None => std::io::read_to_string(std::io::stdin())
                    .context("failed to read payload from stdin")?,
            };
            let event = zalo::parse_webhook(&body)?;
            let gw = build_gateway(&cfg, cli.ephemeral);
            let outcome = gw.handle_event(event).await;
            println!("{outcome}");
        }
        Commands::Run => {
            let gw = build_gateway(&cfg, cli.ephemeral);
            run_loop(&gw).await?;
        }
        Commands::Report => {
            let gw = build_gateway(&cfg, cli.ephemeral);
            if !gw.report_to_destination().await {
                anyhow::bail!("no destination known. Set notify.default_target in config.toml.");
            }
        }
        Commands::Tasks { all } => {
            let (store, _) = open_state(&cfg, cli.ephemeral);
            let tasks = store.tasks();
            let shown: Vec<_> = tasks.iter().filter(|t| all || t.is_open()).collect();
            if shown.is_empty() {
                println!("{}", replies::t("no_open_tasks"));
            }
            for task in shown {
                let mark = if task.done { "x" } else { " " };
                println!(
                    "[{mark}] {}",
                    replies::task_line(task, cfg.tasks.utc_offset_hours)
                );
            }
        }
        Commands::Clear => {
            let (mut store, _) = open_state(&cfg, cli.ephemeral);
            let removed = store.clear()?;
            println!("Cleared {removed} tasks.");
        }
        Commands::Status => {
            let (store, inbox) = open_state(&cfg, cli.ephemeral);
            let stats = store.stats();
            println!("{} status\n", cfg.bot.name);
            println!("Config: {}", cli.config);
            println!("Data dir: {}", cfg.bot.data_path().display());
            println!("Store: {}", store.backend());
            println!(
                "Tasks: {} total, {} open, {} done",
                stats.total, stats.open, stats.done
            );
            println!("Inbox: {} recent messages", inbox.len());
            println!(
                "Resolver: min quote {} chars, windows {}s/{}s, reconfirm {:?}",
                cfg.resolver.min_quote_len,
                cfg.resolver.same_sender_window_secs,
                cfg.resolver.any_sender_window_secs,
                cfg.resolver.reconfirm
            );
            println!(
                "Replies: {}",
                match (cfg.notify.enabled, cfg.notify.default_target.as_str()) {
                    (false, _) => "disabled".to_string(),
                    (true, "") => "enabled".to_string(),
                    (true, target) => format!("enabled, reports to {target}"),
                }
            );
        }
    }

    Ok(())
}

/// Read payloads line by line until EOF or Ctrl-C. Malformed lines are skipped.
async fn run_loop(gw: &gateway::Gateway) -> anyhow::Result<()> {
    info!("reading webhook payloads from stdin");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut handled = 0usize;
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        };
        let Some(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        match zalo::parse_webhook(&line) {
            Ok(event) => {
                let outcome = gw.handle_event(event).await;
                info!("{outcome}");
                handled += 1;
            }
            Err(e) => warn!("skipping payload: {e}"),
        }
    }
    info!(
        "processed {handled} events, destination: {}",
        gw.destination().get().unwrap_or("none")
    );
    Ok(())
}

fn build_gateway(cfg: &Config, ephemeral: bool) -> gateway::Gateway {
    let (store, inbox) = open_state(cfg, ephemeral);
    let gw = gateway::Gateway::new(cfg, store, inbox, Arc::new(LogNotifier));
    if ephemeral {
        return gw;
    }
    let destination =
        gateway::Destination::open(&cfg.bot.data_path(), &cfg.notify.default_target);
    gw.with_destination(destination)
}

/// Store and inbox, file-backed under the data dir unless ephemeral.
fn open_state(cfg: &Config, ephemeral: bool) -> (Store, Inbox) {
    let retention = gateway::Gateway::inbox_retention(cfg);
    if ephemeral {
        return (
            Store::in_memory(),
            Inbox::new(cfg.inbox.capacity, retention),
        );
    }
    let data_dir = cfg.bot.data_path();
    (
        Store::open(&data_dir),
        Inbox::open(&data_dir, cfg.inbox.capacity, retention),
    )
}

/// Log to stderr, plus a daily-rotated file under `{data_dir}/logs` when
/// persistent. `RUST_LOG` overrides `bot.log_level`.
fn init_logging(cfg: &Config, ephemeral: bool) -> Option<WorkerGuard> {
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.bot.log_level))
    };
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = cfg.bot.data_path().join("logs");
    if ephemeral || !ensure_dir(&log_dir) {
        tracing_subscriber::registry()
            .with(filter())
            .with(stderr_layer)
            .init();
        return None;
    }

    let file_appender = tracing_appender::rolling::daily(&log_dir, "taskbot.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::registry()
        .with(filter())
        .with(stderr_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .init();
    Some(guard)
}

fn ensure_dir(dir: &Path) -> bool {
    match std::fs::create_dir_all(dir) {
        Ok(()) => true,
        Err(e) => {
            eprintln!("cannot create log dir {}: {e}", dir.display());
            false
        }
    }
}
