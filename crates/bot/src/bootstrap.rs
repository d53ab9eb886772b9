//! AppState construction shared by the CLI commands (`chat`, `run`,
//! `cleanup`).

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use sb_agent::{Agent, OpenAiAgent};
use sb_cache::{CallCache, QuickAnswers};
use sb_domain::clock::{self, Clock};
use sb_domain::config::{Config, ConfigSeverity};
use sb_memory::ConversationMemory;
use sb_store::{CacheRowStore, ConversationStore, FileStore, PreferenceStore};
use sb_woocommerce::{CachedShop, RestShopClient, ShopClient, ToolRegistry};

use crate::runtime::{Assistant, CleanupScheduler, RetentionPurge};
use crate::state::AppState;

/// Validate config, initialize every subsystem and return a fully-wired
/// [`AppState`] talking to the configured shop and LLM.
pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    check_config(&config)?;

    let clock = clock::system();
    let call_cache = Arc::new(CallCache::new(
        config.cache.enabled,
        Duration::from_secs(config.cache.expiry_secs),
        clock.clone(),
    ));
    tracing::info!(
        enabled = config.cache.enabled,
        expiry_secs = config.cache.expiry_secs,
        "call cache ready"
    );

    // ── Shop + tools ─────────────────────────────────────────────────
    let rest: Arc<dyn ShopClient> =
        Arc::new(RestShopClient::new(&config.shop).context("building shop client")?);
    let shop: Arc<dyn ShopClient> = Arc::new(CachedShop::new(rest, call_cache.clone()));
    let tools = ToolRegistry::new(shop);
    tracing::info!(
        base_url = %config.shop.base_url,
        tools = tools.definitions().len(),
        "shop tools ready"
    );

    // ── Agent ────────────────────────────────────────────────────────
    let agent: Arc<dyn Agent> = Arc::new(
        OpenAiAgent::from_config(&config.llm, tools).context("building agent")?,
    );
    tracing::info!(model = %config.llm.model, "agent ready");

    assemble(config, clock, call_cache, agent)
}

/// Wire the stateful parts around an already-built agent.
///
/// This is the seam tests use to substitute the agent and the clock.
pub fn assemble(
    config: Arc<Config>,
    clock: Arc<dyn Clock>,
    call_cache: Arc<CallCache>,
    agent: Arc<dyn Agent>,
) -> anyhow::Result<AppState> {
    let quick_answers = Arc::new(QuickAnswers::from_config(&config.cache));

    // ── Durable store ────────────────────────────────────────────────
    let store = if config.storage.enabled {
        let store = FileStore::open(&config.storage.state_path, clock.clone()).with_context(|| {
            format!(
                "opening state directory {}",
                config.storage.state_path.display()
            )
        })?;
        tracing::info!(path = %store.root().display(), "durable store ready");
        Some(Arc::new(store))
    } else {
        tracing::info!("persistence disabled");
        None
    };
    let conversations = store.clone().map(|s| s as Arc<dyn ConversationStore>);
    let responses = store.clone().map(|s| s as Arc<dyn CacheRowStore>);
    let preferences = store.map(|s| s as Arc<dyn PreferenceStore>);

    // ── Memory ───────────────────────────────────────────────────────
    let memory = Arc::new(ConversationMemory::new(
        &config.memory,
        conversations.clone(),
        clock.clone(),
    ));

    // ── Retention cleanup ────────────────────────────────────────────
    let purge = match (conversations, responses.clone()) {
        (Some(conversations), Some(responses)) => Some(Arc::new(RetentionPurge::new(
            conversations,
            responses,
            clock.clone(),
            &config.cleanup,
        ))),
        _ => None,
    };
    let cleanup = Arc::new(CleanupScheduler::new(&config.cleanup, purge));

    let assistant = Arc::new(Assistant::new(
        memory.clone(),
        quick_answers.clone(),
        responses,
        agent,
        call_cache.clone(),
        config.bot.debug,
    ));

    Ok(AppState {
        config,
        clock,
        call_cache,
        quick_answers,
        memory,
        preferences,
        assistant,
        cleanup,
    })
}

/// Log every issue; fail on errors.
fn check_config(config: &Config) -> anyhow::Result<()> {
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    let errors = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .count();
    if errors > 0 {
        anyhow::bail!("config validation failed with {errors} error(s)");
    }
    Ok(())
}
