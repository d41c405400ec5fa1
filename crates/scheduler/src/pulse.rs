//! The pulse loop — the scheduler proper.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use verdant_config::SchedulerConfig;
use verdant_core::error::Error;
use verdant_core::event::{DomainEvent, EventBus};

use crate::cadence::CadencePolicy;

/// A unit of scheduled work. Implementations must be infallible in the
/// panic sense; an `Err` marks the pulse failed and is otherwise contained.
#[async_trait]
pub trait PulseTask: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, cycle: u64) -> Result<(), Error>;
}

/// One beat of the scheduler. The sequence counter is owned by the
/// scheduler and resets on restart; it is not persisted.
#[derive(Debug, Clone)]
pub struct PulseCycle {
    pub sequence: u64,
    pub started_at: DateTime<Utc>,
}

/// Lifecycle states, tracked for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Standby,
    Running,
    Backoff,
    Stopped,
}

impl std::fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SchedulerState::Standby => "standby",
            SchedulerState::Running => "running",
            SchedulerState::Backoff => "backoff",
            SchedulerState::Stopped => "stopped",
        };
        write!(f, "{name}")
    }
}

/// The perpetual scheduler. Runs registered tasks on their cadence, one
/// pulse at a time; a failed pulse lengthens the next sleep to the backoff
/// interval but never exits the loop.
pub struct Scheduler {
    tasks: Vec<(CadencePolicy, Arc<dyn PulseTask>)>,
    pulse_interval: Duration,
    backoff: Duration,
    event_bus: Arc<EventBus>,
    rng: StdRng,
    sequence: u64,
}

impl Scheduler {
    pub fn new(config: &SchedulerConfig, event_bus: Arc<EventBus>) -> Self {
        Self {
            tasks: Vec::new(),
            pulse_interval: Duration::from_secs(config.pulse_interval_secs),
            backoff: Duration::from_secs(config.backoff_secs),
            event_bus,
            rng: StdRng::from_entropy(),
            sequence: 0,
        }
    }

    /// Replace the RNG with a seeded one. Probability-gated tasks then fire
    /// on a reproducible schedule.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Register a task under a cadence policy. Registration order is
    /// execution order within a pulse.
    pub fn register(&mut self, policy: CadencePolicy, task: Arc<dyn PulseTask>) {
        debug!(task = task.name(), ?policy, "Registered pulse task");
        self.tasks.push((policy, task));
    }

    /// The current pulse sequence (0 before the first pulse).
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Run one pulse: advance the sequence, run every task whose policy
    /// fires, contain each failure. Returns whether any task failed.
    pub async fn run_pulse(&mut self) -> bool {
        self.sequence += 1;
        let cycle = PulseCycle {
            sequence: self.sequence,
            started_at: Utc::now(),
        };
        debug!(sequence = cycle.sequence, "Pulse started");

        let mut failed = false;
        for (policy, task) in &self.tasks {
            if !policy.should_fire(cycle.sequence, &mut self.rng) {
                continue;
            }
            debug!(task = task.name(), sequence = cycle.sequence, "Task firing");
            if let Err(e) = task.run(cycle.sequence).await {
                error!(
                    task = task.name(),
                    sequence = cycle.sequence,
                    error = %e,
                    "Pulse task failed"
                );
                self.event_bus.publish(DomainEvent::PulseTaskFailed {
                    task_name: task.name().to_string(),
                    error_message: e.to_string(),
                    timestamp: Utc::now(),
                });
                failed = true;
            }
        }

        info!(sequence = cycle.sequence, failed, "Pulse complete");
        self.event_bus.publish(DomainEvent::PulseCompleted {
            sequence: cycle.sequence,
            failed,
            timestamp: Utc::now(),
        });
        failed
    }

    /// The perpetual loop. Pulses, then sleeps for the pulse interval (or
    /// the backoff interval after a failed pulse). The sleep is the sole
    /// cancellation point: an in-flight pulse always runs to completion.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            state = %SchedulerState::Standby,
            interval_secs = self.pulse_interval.as_secs(),
            backoff_secs = self.backoff.as_secs(),
            tasks = self.tasks.len(),
            "Scheduler starting"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            let failed = self.run_pulse().await;
            let (state, sleep_for) = if failed {
                (SchedulerState::Backoff, self.backoff)
            } else {
                (SchedulerState::Running, self.pulse_interval)
            };
            debug!(state = %state, sleep_secs = sleep_for.as_secs(), "Sleeping until next pulse");

            tokio::select! {
                _ = tokio::time::sleep(sleep_for) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!(state = %SchedulerState::Stopped, sequence = self.sequence, "Scheduler stopped");
    }

    /// Spawn the loop on a task. The returned handle owns the shutdown
    /// channel.
    pub fn start(self) -> SchedulerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(self.run(shutdown_rx));
        SchedulerHandle { shutdown_tx, join }
    }
}

/// Handle to a running scheduler.
pub struct SchedulerHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Request a cooperative stop. The loop exits at its next cancellation
    /// point.
    pub fn stop(&self) {
        if self.shutdown_tx.send(true).is_err() {
            warn!("Scheduler already stopped");
        }
    }

    /// Wait for the loop to finish.
    pub async fn join(self) {
        if let Err(e) = self.join.await {
            error!(error = %e, "Scheduler task aborted");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTask {
        runs: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl PulseTask for CountingTask {
        fn name(&self) -> &str {
            "counting"
        }
        async fn run(&self, _cycle: u64) -> Result<(), Error> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingTask;

    #[async_trait]
    impl PulseTask for FailingTask {
        fn name(&self) -> &str {
            "failing"
        }
        async fn run(&self, _cycle: u64) -> Result<(), Error> {
            Err(Error::Internal("probe wiring loose".into()))
        }
    }

    fn scheduler(interval_secs: u64, backoff_secs: u64) -> Scheduler {
        let config = SchedulerConfig {
            pulse_interval_secs: interval_secs,
            backoff_secs,
            ..SchedulerConfig::default()
        };
        Scheduler::new(&config, Arc::new(EventBus::default()))
            .with_rng(StdRng::seed_from_u64(1))
    }

    #[tokio::test]
    async fn pulse_advances_sequence_and_runs_tasks() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut scheduler = scheduler(600, 60);
        scheduler.register(
            CadencePolicy::EveryPulse,
            Arc::new(CountingTask { runs: runs.clone() }),
        );

        assert!(!scheduler.run_pulse().await);
        assert!(!scheduler.run_pulse().await);
        assert_eq!(scheduler.sequence(), 2);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cadence_task_fires_only_on_multiples() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut scheduler = scheduler(600, 60);
        scheduler.register(
            CadencePolicy::EveryCycles(3),
            Arc::new(CountingTask { runs: runs.clone() }),
        );

        for _ in 0..7 {
            scheduler.run_pulse().await;
        }
        // Cycles 3 and 6 out of 1..=7
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn task_failure_marks_pulse_but_later_tasks_still_run() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut scheduler = scheduler(600, 60);
        let mut events = scheduler.event_bus.subscribe();
        scheduler.register(CadencePolicy::EveryPulse, Arc::new(FailingTask));
        scheduler.register(
            CadencePolicy::EveryPulse,
            Arc::new(CountingTask { runs: runs.clone() }),
        );

        assert!(scheduler.run_pulse().await);
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        let first = events.recv().await.unwrap();
        assert!(matches!(
            first.as_ref(),
            DomainEvent::PulseTaskFailed { task_name, .. } if task_name == "failing"
        ));
        let second = events.recv().await.unwrap();
        assert!(matches!(
            second.as_ref(),
            DomainEvent::PulseCompleted { failed: true, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn loop_continues_pulsing_after_failures() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut sched = scheduler(600, 60);
        sched.register(CadencePolicy::EveryPulse, Arc::new(FailingTask));
        sched.register(
            CadencePolicy::EveryPulse,
            Arc::new(CountingTask { runs: runs.clone() }),
        );

        let handle = sched.start();
        // Paused time auto-advances through the backoff sleeps while this
        // task is itself blocked on the timer.
        tokio::time::sleep(Duration::from_secs(250)).await;
        handle.stop();
        handle.join().await;

        assert!(runs.load(Ordering::SeqCst) > 1, "loop must survive failed pulses");
    }

    #[tokio::test(start_paused = true)]
    async fn stop_exits_the_loop() {
        let sched = scheduler(600, 60);
        let handle = sched.start();
        tokio::time::sleep(Duration::from_secs(1)).await;
        handle.stop();
        // join() only returns once the loop observed the signal and exited
        handle.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_before_first_pulse_means_no_pulses() {
        let sched = scheduler(600, 60);
        let events = sched.event_bus.clone();
        let mut rx = events.subscribe();

        let (tx, rx_shutdown) = watch::channel(true);
        sched.run(rx_shutdown).await;
        drop(tx);

        assert!(matches!(
            rx.try_recv(),
            Err(tokio::sync::broadcast::error::TryRecvError::Empty)
        ));
    }
}
