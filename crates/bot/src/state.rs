use std::sync::Arc;

use sb_cache::{CallCache, QuickAnswers};
use sb_domain::clock::Clock;
use sb_domain::config::Config;
use sb_memory::ConversationMemory;
use sb_store::PreferenceStore;

use crate::runtime::{Assistant, CleanupScheduler};

/// Everything a front end needs, built once by [`crate::bootstrap`].
///
/// Caches and registries live here as explicit instances rather than
/// process-wide globals, so tests can build as many isolated states as they
/// like.
#[derive(Clone)]
pub struct AppState {
    // ── Core ──────────────────────────────────────────────────────────
    pub config: Arc<Config>,
    pub clock: Arc<dyn Clock>,

    // ── Caches & memory ───────────────────────────────────────────────
    pub call_cache: Arc<CallCache>,
    pub quick_answers: Arc<QuickAnswers>,
    pub memory: Arc<ConversationMemory>,

    // ── Durable store (absent when persistence is disabled) ───────────
    pub preferences: Option<Arc<dyn PreferenceStore>>,

    // ── Runtime ───────────────────────────────────────────────────────
    pub assistant: Arc<Assistant>,
    pub cleanup: Arc<CleanupScheduler>,
}
