//! The Verdant perpetual scheduler.
//!
//! The scheduler is the agent's heartbeat: an infinite pulse loop that runs
//! registered tasks on their cadence, sleeps between pulses, backs off after
//! a failed pulse, and only exits on a cooperative shutdown signal. Task
//! failures are contained per pulse; the loop itself never terminates on
//! error.

pub mod cadence;
pub mod pulse;
pub mod tasks;

pub use cadence::CadencePolicy;
pub use pulse::{PulseCycle, PulseTask, Scheduler, SchedulerHandle, SchedulerState};
pub use tasks::{DailyBriefTask, MarketScanTask, SelfDiagnosisTask};
