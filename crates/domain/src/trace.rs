use serde::Serialize;

/// Structured trace events emitted across all shopbot crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    CacheHit {
        function: String,
        age_secs: i64,
    },
    CacheMiss {
        function: String,
        expired: bool,
    },
    CacheCleared {
        function: Option<String>,
        removed: usize,
    },
    QuickAnswer {
        source: String,
        normalized: String,
    },
    TurnPersisted {
        user_id: String,
        message_id: String,
        ok: bool,
    },
    HistoryFallback {
        user_id: String,
        reason: String,
        local_turns: usize,
    },
    CleanupCycle {
        conversations_deleted: u64,
        cache_rows_deleted: u64,
        duration_ms: u64,
    },
    ShopCall {
        endpoint: String,
        status: u16,
        duration_ms: u64,
    },
    AgentCall {
        model: String,
        rounds: u32,
        tool_calls: usize,
        duration_ms: u64,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "sb_event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_event_tag() {
        let ev = TraceEvent::CacheCleared {
            function: Some("get_products".into()),
            removed: 2,
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["event"], "CacheCleared");
        assert_eq!(json["removed"], 2);
    }
}
