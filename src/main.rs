//! SAE Dump Player - Main Entry Point
//!
//! Replays a dump file onto Redis streams with its original timing, looping
//! until SIGINT or SIGTERM is received.

use anyhow::Context;
use clap::Parser;
use saedump_player::{
    backend::{LogPublisher, PublishStats, Publisher, RedisPublisher},
    config::PlayerConfig,
    payload::FieldPath,
    session::{DumpPlayer, PlaybackOutcome, StopSignal},
    types::ChannelMapping,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments
#[derive(Parser, Debug, Clone)]
#[command(name = "saedump-player")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Replays recorded SAE dumps onto Redis streams with their original timing")]
struct Args {
    /// Dump file to replay
    dump: PathBuf,

    /// Path to configuration file (TOML format)
    /// If not specified, the platform config directory is checked
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Redis host
    #[arg(long)]
    redis_host: Option<String>,

    /// Redis port
    #[arg(long)]
    redis_port: Option<u16>,

    /// Approximate number of entries kept per stream
    #[arg(long, value_name = "N")]
    stream_maxlen: Option<usize>,

    /// Publish a recorded stream on another channel (repeatable)
    #[arg(short, long = "map", value_name = "SRC=DST")]
    map: Vec<String>,

    /// Dotted tag path of the capture timestamp inside payloads
    #[arg(long, value_name = "TAGS")]
    timestamp_field: Option<FieldPath>,

    /// Stop after N complete passes
    #[arg(long, value_name = "N")]
    passes: Option<u64>,

    /// Play the dump once instead of looping
    #[arg(long, conflicts_with = "passes")]
    once: bool,

    /// Log publishes instead of sending them to Redis
    #[arg(long)]
    dry_run: bool,

    /// Also write logs to a daily rolling file in this directory
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,
}

fn init_logging(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,saedump_player=debug"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "saedump-player.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    guard
}

/// Apply command line flags on top of the loaded config
fn apply_overrides(config: &mut PlayerConfig, args: &Args) -> saedump_player::Result<()> {
    if let Some(host) = &args.redis_host {
        config.redis.host = host.clone();
    }
    if let Some(port) = args.redis_port {
        config.redis.port = port;
    }
    if let Some(maxlen) = args.stream_maxlen {
        config.redis.stream_maxlen = maxlen;
    }
    for entry in &args.map {
        let (source, destination) = ChannelMapping::parse_entry(entry)?;
        config.playback.channel_mapping.insert(source, destination);
    }
    if let Some(field) = &args.timestamp_field {
        config.playback.timestamp_field = field.clone();
    }
    if let Some(passes) = args.passes {
        config.playback.max_passes = Some(passes);
        config.playback.loop_playback = true;
    }
    if args.once {
        config.playback.loop_playback = false;
    }
    config.validate()
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Turn the first SIGINT/SIGTERM into a stop request
fn install_signal_handler(stop: StopSignal) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build signal runtime")?;

    std::thread::Builder::new()
        .name("signals".to_string())
        .spawn(move || {
            runtime.block_on(shutdown_signal());
            tracing::info!("Shutdown signal received");
            stop.request_stop();
        })
        .context("Failed to spawn signal thread")?;

    Ok(())
}

fn run(args: &Args) -> anyhow::Result<(PlaybackOutcome, PublishStats)> {
    let mut config = PlayerConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;
    apply_overrides(&mut config, args).context("Invalid command line arguments")?;

    let stop = StopSignal::new();
    install_signal_handler(stop.clone())?;

    let publisher: Box<dyn Publisher> = if args.dry_run {
        Box::new(LogPublisher::new())
    } else {
        Box::new(RedisPublisher::connect(&config.redis)?)
    };

    let mut player = DumpPlayer::open(&args.dump, publisher, config.player_options())
        .with_context(|| format!("Failed to open dump {:?}", args.dump))?;

    let outcome = player.run(&stop)?;
    Ok((outcome, player.publish_stats()))
}

fn main() -> ExitCode {
    let args = Args::parse();
    let _log_guard = init_logging(args.log_dir.as_deref());

    tracing::info!("Starting SAE dump player");

    match run(&args) {
        Ok((outcome, published)) => {
            let stats = outcome.stats();
            tracing::info!(
                "Shutting down after {} events ({} passes completed, {} behind schedule)",
                stats.events_published,
                stats.passes_completed,
                stats.events_behind_schedule
            );
            tracing::info!(
                "Published {} messages ({} bytes, {} failures)",
                published.messages_published,
                published.bytes_published,
                published.failures
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}
