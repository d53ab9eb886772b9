//! `shopbot cleanup`: one retention purge, in the foreground.

use std::sync::Arc;

use anyhow::Context;

use sb_domain::config::Config;

use crate::bootstrap;

pub async fn cleanup(config: Arc<Config>) -> anyhow::Result<()> {
    let state = bootstrap::build_app_state(config)?;
    let report = state
        .cleanup
        .run_once()
        .await
        .context("retention purge")?;

    println!(
        "Removed {} conversation turn(s) and {} cached response(s)",
        report.conversations_deleted, report.cache_rows_deleted
    );
    Ok(())
}
