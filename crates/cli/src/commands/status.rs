//! `verdant status` — show configuration and registered tools.

use verdant_config::AppConfig;
use verdant_notify::RecordingNotifier;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("Verdant Status");
    println!("==============");
    println!("  Config file:    {}", AppConfig::config_path().display());
    println!("  API endpoint:   {}", config.engine.api_url);
    println!("  Model:          {}", config.engine.model);
    println!("  Temperature:    {}", config.engine.temperature);
    println!(
        "  API key:        {}",
        if config.engine.api_key.is_some() {
            "configured"
        } else {
            "missing"
        }
    );
    println!("  Retrieval k:    {}", config.retrieval.top_k);
    println!("  Pulse interval: {}s", config.scheduler.pulse_interval_secs);
    println!(
        "  Brief cadence:  every {} cycles",
        config.scheduler.brief_every_cycles
    );
    println!("  Notify mode:    {}", config.notify.mode);

    // Tool summary comes from the real registry wiring, against a throwaway
    // notifier so the listing never sends anything.
    let registry = verdant_tools::default_registry(std::sync::Arc::new(RecordingNotifier::new()))?;
    let mut names = registry.names();
    names.sort();
    println!("\n  Tools ({}):", names.len());
    for name in names {
        println!("    - {name}");
    }

    if AppConfig::config_path().exists() {
        println!("\n  Config file found");
    } else {
        println!("\n  No config file — using built-in defaults");
    }

    Ok(())
}
