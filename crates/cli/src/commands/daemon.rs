//! `verdant daemon` — the perpetual runtime.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use verdant_config::AppConfig;
use verdant_scheduler::{
    CadencePolicy, DailyBriefTask, MarketScanTask, Scheduler, SelfDiagnosisTask,
};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let runtime = super::build_runtime(&config).await?;

    println!("Verdant Daemon — starting perpetual runtime");
    println!("  Pulse interval: {}s", config.scheduler.pulse_interval_secs);
    println!("  Backoff:        {}s", config.scheduler.backoff_secs);
    println!(
        "  Market scan:    p = {}",
        config.scheduler.scan_probability
    );
    println!(
        "  Brief cadence:  every {} cycles → {}",
        config.scheduler.brief_every_cycles, config.scheduler.admin_recipient
    );
    println!("  Notifier:       {}", runtime.notifier.name());

    let agent = Arc::new(Mutex::new(runtime.agent));

    let mut scheduler = Scheduler::new(&config.scheduler, runtime.event_bus.clone());
    scheduler.register(
        CadencePolicy::EveryPulse,
        Arc::new(SelfDiagnosisTask::new(agent)),
    );
    scheduler.register(
        CadencePolicy::Probability(config.scheduler.scan_probability),
        Arc::new(MarketScanTask::new(runtime.tools.clone())),
    );
    scheduler.register(
        CadencePolicy::EveryCycles(config.scheduler.brief_every_cycles),
        Arc::new(DailyBriefTask::new(
            runtime.notifier.clone(),
            runtime.event_bus.clone(),
            config.scheduler.admin_recipient.clone(),
        )),
    );

    let handle = scheduler.start();
    info!("Scheduler running; press Ctrl+C to stop");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    handle.stop();
    handle.join().await;

    println!("Verdant daemon stopped.");
    Ok(())
}
