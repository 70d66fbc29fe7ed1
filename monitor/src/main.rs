use anyhow::Context;
use clap::Parser;
use gui_bridge::bridge::GuiBridge;
use output::{CommandNotifier, ConsoleRenderer, LogNotifier, RenderFanout};
use presencecore::dispatch::{Dispatcher, NotificationSink, RenderSink};
use presencecore::prelude::ShutdownSignal;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use workflow::config::{MonitorConfig, SourceKind};
use workflow::runner::Runner;

mod generator;
mod gui_bridge;
mod output;
mod sources;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "mmWave presence monitor")]
struct Args {
    /// Load a monitor config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    /// Line source to read sensor frames from
    #[arg(long, value_enum)]
    source: Option<SourceKind>,
    /// Device path for the `device` source (e.g. /dev/ttyUSB0)
    #[arg(long)]
    device: Option<PathBuf>,
    /// Capture file for the `replay` source
    #[arg(long)]
    replay: Option<PathBuf>,
    #[arg(long)]
    persistence_seconds: Option<f64>,
    #[arg(long)]
    tick_ms: Option<u64>,
    #[arg(long)]
    max_range: Option<f32>,
    #[arg(long)]
    read_timeout_ms: Option<u64>,
    #[arg(long)]
    queue_capacity: Option<usize>,
    /// Seed for the synthetic source
    #[arg(long)]
    seed: Option<u64>,
    /// Text-to-speech program run on each new detection, e.g. "espeak"
    #[arg(long)]
    speech_command: Option<String>,
    /// Serve the latest frame as JSON over HTTP
    #[arg(long, default_value_t = false)]
    serve: bool,
    #[arg(long)]
    serve_address: Option<SocketAddr>,
}

impl Args {
    fn apply(self, config: &mut MonitorConfig) {
        if let Some(source) = self.source {
            config.source = source;
        }
        if let Some(path) = self.device {
            config.device_path = Some(path);
        }
        if let Some(path) = self.replay {
            config.replay_path = Some(path);
        }
        if let Some(seconds) = self.persistence_seconds {
            config.persistence_duration_seconds = seconds;
        }
        if let Some(ms) = self.tick_ms {
            config.tick_interval_milliseconds = ms;
        }
        if let Some(range) = self.max_range {
            config.max_range_meters = range;
            config.synthetic.max_range_meters = range;
        }
        if let Some(ms) = self.read_timeout_ms {
            config.read_timeout_milliseconds = ms;
        }
        if let Some(capacity) = self.queue_capacity {
            config.queue_capacity = capacity;
        }
        if let Some(seed) = self.seed {
            config.synthetic.seed = seed;
        }
        if let Some(command) = self.speech_command {
            config.speech_command = Some(command);
        }
        if let Some(address) = self.serve_address {
            config.serve_address = address;
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let serve = args.serve;

    let mut config = match &args.config {
        Some(path) => MonitorConfig::load(path)?,
        None => MonitorConfig::default(),
    };
    args.apply(&mut config);
    config.validate().context("invalid monitor configuration")?;

    let source = sources::open_source(&config)?;

    let mut renderers: Vec<Box<dyn RenderSink>> = vec![Box::new(ConsoleRenderer::new())];
    if serve {
        let bridge = GuiBridge::serve(config.serve_address)?;
        renderers.push(Box::new(bridge.renderer()));
    }

    let notifier: Arc<dyn NotificationSink> = match config.speech_command.as_deref() {
        Some(command) => Arc::new(
            CommandNotifier::new(command).context("configuring speech command")?,
        ),
        None => Arc::new(LogNotifier),
    };

    let dispatcher = Dispatcher::new(
        config.to_dispatch_config(),
        Box::new(RenderFanout::new(renderers)),
        notifier,
    );

    println!("[MONITOR] Scanning for targets (Ctrl+C to stop)...");
    let summary = Runner::new(config).run(source, dispatcher, ShutdownSignal::new())?;

    println!(
        "[MONITOR] stopped ({:?}) -> ticks {}, appearances {}, frames accepted {}, no target {}, malformed {}, dropped {}",
        summary.stop,
        summary.ticks,
        summary.appearances,
        summary.metrics.accepted,
        summary.metrics.no_target,
        summary.metrics.malformed,
        summary.dropped_lines
    );
    if let Some(report) = summary.reader {
        println!(
            "[MONITOR] reader {:?} -> lines {}, timeouts {}",
            report.exit, report.stats.lines_pushed, report.stats.timeouts
        );
    }

    Ok(())
}
