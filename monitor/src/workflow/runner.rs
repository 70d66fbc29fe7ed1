use crate::workflow::config::MonitorConfig;
use anyhow::{bail, Context};
use log::{debug, info};
use presencecore::detection::{DetectionPhase, DetectionStateMachine, StateEvent};
use presencecore::dispatch::Dispatcher;
use presencecore::ingest::{IngestQueue, LineSource, ReaderExit, ReaderReport, SourceReader};
use presencecore::prelude::{MonotonicClock, ShutdownSignal};
use presencecore::telemetry::Metrics;
use std::thread;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use tokio::sync::oneshot;
use tokio::time::{self, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Interrupted,
    Cancelled,
    /// The source closed and the last target has aged out.
    SourceExhausted,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub stop: StopReason,
    pub ticks: usize,
    pub appearances: usize,
    pub metrics: Metrics,
    pub dropped_lines: u64,
    pub reader: Option<ReaderReport>,
}

/// Drives the reader thread and the fixed-cadence tick loop.
#[derive(Clone)]
pub struct Runner {
    config: MonitorConfig,
}

impl Runner {
    pub fn new(config: MonitorConfig) -> Self {
        Self { config }
    }

    pub fn run(
        &self,
        source: Box<dyn LineSource>,
        dispatcher: Dispatcher,
        shutdown: ShutdownSignal,
    ) -> anyhow::Result<RunSummary> {
        let runtime = TokioBuilder::new_current_thread()
            .enable_all()
            .build()
            .context("creating runtime for the tick loop")?;
        let result = runtime.block_on(self.tick_loop(source, dispatcher, shutdown.clone()));
        shutdown.trigger();
        result
    }

    async fn tick_loop(
        &self,
        source: Box<dyn LineSource>,
        mut dispatcher: Dispatcher,
        shutdown: ShutdownSignal,
    ) -> anyhow::Result<RunSummary> {
        let clock = MonotonicClock::start();
        let queue = IngestQueue::with_capacity(self.config.queue_capacity);
        let mut machine = DetectionStateMachine::new(self.config.to_detection_config())
            .context("building detection state machine")?;

        let reader = SourceReader::new(queue.clone(), clock)
            .with_read_timeout(self.config.read_timeout());
        let reader_shutdown = shutdown.clone();
        let (done_tx, mut reader_done) = oneshot::channel();
        thread::Builder::new()
            .name("source-reader".into())
            .spawn(move || {
                let mut source = source;
                let _ = done_tx.send(reader.run(&mut source, &reader_shutdown));
            })
            .context("starting source reader thread")?;

        let mut ticker = time::interval(self.config.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let ctrl_c = signal::ctrl_c();
        tokio::pin!(ctrl_c);

        let mut reader_report: Option<ReaderReport> = None;
        let mut phase = DetectionPhase::NoTarget;
        let mut appearances = 0;

        info!(
            "monitoring with {:.1}s persistence every {}ms",
            self.config.persistence_duration_seconds, self.config.tick_interval_milliseconds
        );

        let stop = loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let outcome = machine.tick_from_queue(&queue, clock.now());
                    if outcome.event.is_appearance() {
                        appearances += 1;
                    }
                    if outcome.snapshot.phase() != phase {
                        debug!("{:?} -> {:?} at {:.2}s", phase, outcome.snapshot.phase(), outcome.snapshot.evaluated_at);
                        phase = outcome.snapshot.phase();
                    }
                    dispatcher.dispatch_outcome(&outcome);

                    if shutdown.is_triggered() {
                        break StopReason::Cancelled;
                    }
                    if reader_report.is_some() && queue.is_empty() && outcome.event == StateEvent::Absent {
                        break StopReason::SourceExhausted;
                    }
                }
                finished = &mut reader_done, if reader_report.is_none() => {
                    match finished {
                        Ok(Ok(report)) if report.exit == ReaderExit::Cancelled => {
                            reader_report = Some(report);
                            break StopReason::Cancelled;
                        }
                        Ok(Ok(report)) => {
                            info!("source closed after {} lines, draining remaining state", report.stats.lines_pushed);
                            reader_report = Some(report);
                        }
                        Ok(Err(err)) => {
                            shutdown.trigger();
                            return Err(err).context("reading sensor frames");
                        }
                        Err(_) => bail!("source reader stopped without reporting"),
                    }
                }
                interrupted = &mut ctrl_c => {
                    interrupted.context("awaiting Ctrl+C")?;
                    break StopReason::Interrupted;
                }
            }
        };

        shutdown.trigger();
        let metrics = machine.metrics().snapshot();
        let summary = RunSummary {
            stop,
            ticks: metrics.ticks,
            appearances,
            metrics,
            dropped_lines: queue.dropped_count(),
            reader: reader_report,
        };
        debug!("run summary {:?}", summary);
        Ok(summary)
    }
}
