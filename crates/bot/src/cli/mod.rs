pub mod chat;
pub mod cleanup;
pub mod config;
pub mod run;

use clap::{Parser, Subcommand};

/// Default user id for CLI sessions.
pub const DEFAULT_USER: &str = "cli";

/// shopbot: a WooCommerce store assistant.
#[derive(Debug, Parser)]
#[command(name = "shopbot", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactive chat (default when no subcommand is given).
    Chat {
        /// Conversation owner.
        #[arg(long, default_value = DEFAULT_USER)]
        user: String,
    },
    /// Send a single message and print the reply.
    Run {
        /// The message to send.
        message: String,
        /// Conversation owner.
        #[arg(long, default_value = DEFAULT_USER)]
        user: String,
        /// Print the reply as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Run one retention purge cycle and print what was removed.
    Cleanup,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path in `SHOPBOT_CONFIG` (or
/// `config.toml`).  A missing file yields the defaults.  Returns the parsed
/// [`Config`](sb_domain::config::Config) and the path that was used.
pub fn load_config() -> anyhow::Result<(sb_domain::config::Config, String)> {
    let config_path = std::env::var("SHOPBOT_CONFIG").unwrap_or_else(|_| "config.toml".into());
    let config = load_config_from(&config_path)?;
    Ok((config, config_path))
}

pub fn load_config_from(config_path: &str) -> anyhow::Result<sb_domain::config::Config> {
    if !std::path::Path::new(config_path).exists() {
        return Ok(sb_domain::config::Config::default());
    }
    let raw = std::fs::read_to_string(config_path)
        .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
    toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let cfg = load_config_from(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.memory.max_messages, 50);
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[bot]\ndebug = true\n[cache]\nexpiry_secs = 60\n").unwrap();
        let cfg = load_config_from(path.to_str().unwrap()).unwrap();
        assert!(cfg.bot.debug);
        assert_eq!(cfg.cache.expiry_secs, 60);
    }

    #[test]
    fn malformed_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[memory\n").unwrap();
        let err = load_config_from(path.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("parsing"));
    }

    #[test]
    fn no_subcommand_parses() {
        let cli = Cli::try_parse_from(["shopbot"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn run_takes_message_and_flags() {
        let cli = Cli::try_parse_from(["shopbot", "run", "שלום", "--user", "42", "--json"]).unwrap();
        match cli.command {
            Some(Command::Run { message, user, json }) => {
                assert_eq!(message, "שלום");
                assert_eq!(user, "42");
                assert!(json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
