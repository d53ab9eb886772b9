//! `shopbot run`: one message in, one reply out.  Useful for scripting.

use std::sync::Arc;

use serde_json::json;

use sb_domain::config::Config;

use crate::bootstrap;

/// Answer `message` as `user_id` and print the reply.  Exits with code 1
/// when the assistant could not produce an answer.
pub async fn run(
    config: Arc<Config>,
    message: String,
    user_id: String,
    json_output: bool,
) -> anyhow::Result<()> {
    let state = bootstrap::build_app_state(config)?;
    let reply = state.assistant.handle(&user_id, &message).await;

    if json_output {
        let out = json!({
            "user_id": user_id,
            "reply": reply.text,
            "source": reply.source,
        });
        let text = serde_json::to_string_pretty(&out)
            .map_err(|e| anyhow::anyhow!("serializing reply: {e}"))?;
        println!("{text}");
    } else {
        println!("{}", reply.text);
    }

    if reply.is_failure() {
        std::process::exit(1);
    }
    Ok(())
}
