use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tripwire_protocol::Request;
use tripwire_server::service::malformed_request;
use tripwire_server::{GameService, IdempotencyCache, ServerConfig, SystemClock};

/// Serves minesweeper games over JSON lines on stdin and stdout.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    /// Force a seed instead of random
    #[arg(short, long)]
    seed: Option<u64>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(args.verbose.log_level_filter().as_str().to_ascii_lowercase())
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn spawn_sweeper(cache: Arc<IdempotencyCache>, every: Duration) -> anyhow::Result<()> {
    thread::Builder::new()
        .name("idempotency-sweep".into())
        .spawn(move || {
            loop {
                thread::sleep(every);
                cache.sweep();
            }
        })
        .context("spawning sweeper thread")?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args);

    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    log::debug!("{config:?}");

    let service = GameService::from_config(&config, Arc::new(SystemClock));
    if let Some(every) = config.sweep_interval() {
        spawn_sweeper(Arc::clone(service.idempotency()), every)?;
    }

    log::info!("Ready");
    let stdin = io::stdin().lock();
    let mut stdout = io::stdout().lock();
    for line in stdin.lines() {
        let line = line.context("reading request")?;
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => service.handle(request),
            Err(err) => {
                log::debug!("Malformed request: {err}");
                malformed_request(&err)
            }
        };
        serde_json::to_writer(&mut stdout, &response).context("writing response")?;
        writeln!(stdout)?;
        stdout.flush()?;
    }

    service.shutdown();
    log::info!("Input closed, shutting down");
    Ok(())
}
