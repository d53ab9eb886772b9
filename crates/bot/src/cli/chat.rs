//! `shopbot chat`: interactive REPL.
//!
//! Each line goes through the assistant pipeline as `user_id`.  The
//! retention cleanup worker runs for as long as the REPL is open.

use std::sync::Arc;

use serde_json::Value;

use sb_domain::config::Config;

use crate::bootstrap;
use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Public entry point
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn chat(config: Arc<Config>, user_id: String) -> anyhow::Result<()> {
    let state = bootstrap::build_app_state(config)?;
    let cleanup_started = state.cleanup.start();

    let history_path = dirs::home_dir()
        .unwrap_or_default()
        .join(".shopbot")
        .join("chat_history.txt");
    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let mut rl = rustyline::DefaultEditor::new()?;
    let _ = rl.load_history(&history_path);

    // Banner on stderr; stdout carries replies only.
    eprintln!("shopbot interactive chat");
    eprintln!("User: {user_id}  |  Type /help for commands, Ctrl+D to exit");
    eprintln!();

    loop {
        match rl.readline("you> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(&line).ok();

                if trimmed.starts_with('/') {
                    if handle_slash_command(&state, &user_id, trimmed).await {
                        break;
                    }
                    continue;
                }

                let reply = state.assistant.handle(&user_id, trimmed).await;
                if reply.is_failure() {
                    println!("\x1B[31m{}\x1B[0m", reply.text);
                } else {
                    println!("{}", reply.text);
                }
                println!();
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                eprintln!("(Use Ctrl+D or /exit to quit)");
            }
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("\x1B[31mreadline error: {e}\x1B[0m");
                break;
            }
        }
    }

    rl.save_history(&history_path).ok();

    if cleanup_started && !state.cleanup.stop().await {
        tracing::warn!("cleanup worker still running at exit");
    }

    eprintln!("Goodbye!");
    Ok(())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Slash command handling
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Process a slash command.  Returns `true` if the REPL should exit.
async fn handle_slash_command(state: &AppState, user_id: &str, input: &str) -> bool {
    let mut parts = input.splitn(2, ' ');
    let cmd = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::trim).filter(|s| !s.is_empty());

    match cmd {
        "/exit" | "/quit" => return true,

        "/reset" => {
            state.assistant.reset(user_id).await;
            eprintln!("השיחה אופסה בהצלחה! אתה יכול להתחיל שיחה חדשה.");
        }

        "/clear_cache" => {
            let removed = state.assistant.clear_cache();
            tracing::info!(removed, "call cache cleared from chat");
            eprintln!("המטמון נוקה בהצלחה!");
        }

        "/stats" => match serde_json::to_string_pretty(&state.assistant.stats()) {
            Ok(text) => eprintln!("{text}"),
            Err(e) => eprintln!("\x1B[31merror: {e}\x1B[0m"),
        },

        "/prefs" => show_or_update_prefs(state, user_id, arg).await,

        "/help" => {
            eprintln!("Commands:");
            eprintln!("  /reset               Forget this conversation");
            eprintln!("  /clear_cache         Drop cached store data");
            eprintln!("  /stats               Memory and cache statistics");
            eprintln!("  /prefs [key value]   Show or change your preferences");
            eprintln!("  /exit, /quit         Exit the chat");
            eprintln!("  /help                Show this help");
        }

        other => {
            eprintln!("Unknown command: {other}  (type /help for a list)");
        }
    }

    false
}

async fn show_or_update_prefs(state: &AppState, user_id: &str, arg: Option<&str>) {
    let Some(prefs) = &state.preferences else {
        eprintln!("Preferences need persistence; enable [storage] in the config.");
        return;
    };

    let result = match arg.and_then(|a| a.split_once(' ')) {
        Some((key, raw)) => prefs.update_preference(user_id, key, parse_value(raw)).await,
        None if arg.is_some() => {
            eprintln!("Usage: /prefs <key> <value>");
            return;
        }
        None => prefs.get_preferences(user_id).await,
    };

    match result.map(|p| serde_json::to_string_pretty(&p)) {
        Ok(Ok(text)) => eprintln!("{text}"),
        Ok(Err(e)) => eprintln!("\x1B[31merror: {e}\x1B[0m"),
        Err(e) => eprintln!("\x1B[31merror: {e}\x1B[0m"),
    }
}

/// JSON when it parses (`true`, `3`, `"x"`), otherwise a plain string.
fn parse_value(raw: &str) -> Value {
    let raw = raw.trim();
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_parse_as_json_or_fall_back_to_strings() {
        assert_eq!(parse_value("false"), Value::Bool(false));
        assert_eq!(parse_value(" 3 "), serde_json::json!(3));
        assert_eq!(parse_value("en"), Value::String("en".into()));
    }
}
