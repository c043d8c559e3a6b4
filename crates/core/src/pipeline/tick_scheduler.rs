use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::pipeline::pipeline_control::ControlCommand;
use crate::pipeline::pipeline_driver::{PipelineDriver, PipelineState, TickOutcome};
use crate::shared::constants::TICK_INTERVAL_MS;

/// Counts of what a scheduler run did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerReport {
    pub ticks: u64,
    pub published: u64,
    pub empty_reads: u64,
    pub no_cached_frame: u64,
    /// Ticks that took longer than the interval.
    pub overruns: u64,
}

impl SchedulerReport {
    fn record(&mut self, outcome: TickOutcome) {
        self.ticks += 1;
        match outcome {
            TickOutcome::Published { .. } => self.published += 1,
            TickOutcome::EmptyRead => self.empty_reads += 1,
            TickOutcome::NoCachedFrame => self.no_cached_frame += 1,
            TickOutcome::NotRunning => {}
        }
    }
}

/// Runs driver ticks on the calling thread at a fixed interval.
///
/// Ticks never overlap. When a tick overruns its slot the next deadline is
/// re-based on the current time, so missed ticks are skipped instead of
/// fired back to back. Control commands are applied only between ticks.
pub struct TickScheduler {
    interval: Duration,
    max_ticks: Option<u64>,
    stop: Arc<AtomicBool>,
    commands: Option<Receiver<ControlCommand>>,
}

impl TickScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            max_ticks: None,
            stop: Arc::new(AtomicBool::new(false)),
            commands: None,
        }
    }

    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }

    pub fn with_commands(mut self, commands: Receiver<ControlCommand>) -> Self {
        self.commands = Some(commands);
        self
    }

    /// Flag that ends [`run`](Self::run) once set. Clone it into other
    /// threads.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Ticks `driver` until the stop flag is set, a `Stop` command arrives,
    /// the tick limit is reached or the driver leaves the running state.
    pub fn run(&self, driver: &mut PipelineDriver) -> SchedulerReport {
        let mut report = SchedulerReport::default();
        let mut deadline = Instant::now();

        loop {
            if self.stop.load(Ordering::Relaxed) {
                break;
            }
            if self.drain_commands(driver).is_break() {
                self.stop.store(true, Ordering::Relaxed);
                break;
            }
            if driver.state() != PipelineState::Running {
                log::debug!("Driver is {}, scheduler exiting", driver.state());
                break;
            }

            report.record(driver.tick());

            if self.max_ticks.is_some_and(|max| report.ticks >= max) {
                break;
            }

            deadline += self.interval;
            let now = Instant::now();
            if now > deadline {
                report.overruns += 1;
                log::trace!("Tick {} overran by {:?}", report.ticks, now - deadline);
                deadline = now;
                continue;
            }
            if self.wait_until(deadline, driver).is_break() {
                self.stop.store(true, Ordering::Relaxed);
                break;
            }
        }

        log::debug!("Scheduler finished: {report:?}");
        report
    }

    fn drain_commands(&self, driver: &mut PipelineDriver) -> ControlFlow<()> {
        let Some(commands) = &self.commands else {
            return ControlFlow::Continue(());
        };
        for command in commands.try_iter() {
            if command.apply(driver).is_break() {
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    /// Sleeps until `deadline`, applying commands as they arrive.
    fn wait_until(&self, deadline: Instant, driver: &mut PipelineDriver) -> ControlFlow<()> {
        let Some(commands) = &self.commands else {
            thread::sleep(deadline.saturating_duration_since(Instant::now()));
            return ControlFlow::Continue(());
        };
        loop {
            match commands.recv_deadline(deadline) {
                Ok(command) => {
                    if command.apply(driver).is_break() {
                        return ControlFlow::Break(());
                    }
                }
                Err(RecvTimeoutError::Timeout) => return ControlFlow::Continue(()),
                Err(RecvTimeoutError::Disconnected) => {
                    thread::sleep(deadline.saturating_duration_since(Instant::now()));
                    return ControlFlow::Continue(());
                }
            }
        }
    }
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new(Duration::from_millis(TICK_INTERVAL_MS))
    }
}
