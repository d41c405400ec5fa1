//! Subcommand implementations.

pub mod agent;
pub mod daemon;
pub mod status;

use std::sync::Arc;

use tracing::{info, warn};

use verdant_agent::AgentLoop;
use verdant_config::AppConfig;
use verdant_core::directive::Directive;
use verdant_core::event::EventBus;
use verdant_core::notify::Notifier;
use verdant_core::retrieval::RetrievalAugmenter;
use verdant_core::tool::ToolRegistry;
use verdant_engine::{HttpEngine, HttpEngineConfig};
use verdant_notify::{HttpNotifier, LogNotifier};
use verdant_retrieval::{Bounded, KeywordIndex};

/// Everything the runtime needs, built once from config. Construction is
/// explicit dependency injection; nothing here is a global.
pub(crate) struct Runtime {
    pub agent: AgentLoop,
    pub tools: Arc<ToolRegistry>,
    pub notifier: Arc<dyn Notifier>,
    pub event_bus: Arc<EventBus>,
}

pub(crate) fn require_api_key(config: &AppConfig) -> Result<String, Box<dyn std::error::Error>> {
    match &config.engine.api_key {
        Some(key) => Ok(key.clone()),
        None => {
            eprintln!();
            eprintln!("  ERROR: No API key configured!");
            eprintln!();
            eprintln!("  Set the environment variable:");
            eprintln!("    export VERDANT_API_KEY='sk-or-v1-...'");
            eprintln!();
            eprintln!("  Or add it to your config file:");
            eprintln!("    {}", AppConfig::config_path().display());
            eprintln!();
            Err("No API key found. See above for setup instructions.".into())
        }
    }
}

/// Build the full dependency context: notifier, tools, retriever, engine,
/// agent loop.
pub(crate) async fn build_runtime(
    config: &AppConfig,
) -> Result<Runtime, Box<dyn std::error::Error>> {
    let api_key = require_api_key(config)?;

    let notifier: Arc<dyn Notifier> = match config.notify.mode.as_str() {
        "http" => {
            let api_url = config
                .notify
                .api_url
                .as_deref()
                .ok_or("notify.mode = \"http\" requires notify.api_url")?;
            let key = config
                .notify
                .api_key
                .as_deref()
                .ok_or("notify.mode = \"http\" requires an API key (VERDANT_NOTIFY_KEY)")?;
            Arc::new(HttpNotifier::new(api_url, key, &config.notify.sender)?)
        }
        _ => Arc::new(LogNotifier::new()),
    };

    let tools = Arc::new(
        verdant_tools::default_registry(notifier.clone())?
            .with_invoke_timeout(std::time::Duration::from_secs(config.agent.tool_timeout_secs)),
    );

    let index = KeywordIndex::new();
    if let Some(dir) = &config.retrieval.corpus_dir {
        seed_corpus(&index, dir).await;
    }
    let retriever: Arc<dyn RetrievalAugmenter> = Arc::new(Bounded::new(
        index,
        std::time::Duration::from_millis(config.retrieval.timeout_ms),
    ));

    let directive = match &config.agent.system_prompt {
        Some(prompt) => Directive::with_override(prompt.clone()),
        None => Directive::default(),
    };

    let engine = HttpEngine::new(
        HttpEngineConfig {
            api_url: config.engine.api_url.clone(),
            api_key,
            model: config.engine.model.clone(),
            temperature: config.engine.temperature,
            max_tokens: config.engine.max_tokens,
            request_timeout: std::time::Duration::from_secs(config.engine.request_timeout_secs),
        },
        &directive.system_prompt,
        tools.definitions(),
    )?;

    let event_bus = Arc::new(EventBus::default());
    let agent = AgentLoop::new(
        Arc::new(engine),
        retriever,
        tools.clone(),
        event_bus.clone(),
        directive,
    )
    .with_retrieval_k(config.retrieval.top_k);

    Ok(Runtime {
        agent,
        tools,
        notifier,
        event_bus,
    })
}

/// Index every readable text file in the corpus directory.
async fn seed_corpus(index: &KeywordIndex, dir: &std::path::Path) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Corpus directory unreadable, skipping");
            return;
        }
    };

    let mut loaded = 0usize;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let mut metadata = serde_json::Map::new();
                metadata.insert(
                    "source".into(),
                    serde_json::json!(path.file_name().and_then(|n| n.to_str()).unwrap_or("?")),
                );
                index.add_document(content, metadata).await;
                loaded += 1;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping unreadable corpus file");
            }
        }
    }
    info!(loaded, dir = %dir.display(), "Corpus indexed");
}
