use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use sb_bot::cli::{Cli, Command, ConfigCommand, DEFAULT_USER};
use sb_domain::config::ObservabilityConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        // Default to chat when no subcommand is given.
        None => {
            let (config, _) = sb_bot::cli::load_config()?;
            init_tracing(&config.observability);
            sb_bot::cli::chat::chat(Arc::new(config), DEFAULT_USER.to_owned()).await
        }
        Some(Command::Chat { user }) => {
            let (config, _) = sb_bot::cli::load_config()?;
            init_tracing(&config.observability);
            sb_bot::cli::chat::chat(Arc::new(config), user).await
        }
        Some(Command::Run { message, user, json }) => {
            init_cli_tracing();
            let (config, _) = sb_bot::cli::load_config()?;
            sb_bot::cli::run::run(Arc::new(config), message, user, json).await
        }
        Some(Command::Cleanup) => {
            init_cli_tracing();
            let (config, _) = sb_bot::cli::load_config()?;
            sb_bot::cli::cleanup::cleanup(Arc::new(config)).await
        }
        Some(Command::Config(ConfigCommand::Validate)) => {
            let (config, config_path) = sb_bot::cli::load_config()?;
            if !sb_bot::cli::config::validate(&config, &config_path) {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Show)) => {
            let (config, _) = sb_bot::cli::load_config()?;
            sb_bot::cli::config::show(&config)
        }
        Some(Command::Version) => {
            println!("shopbot {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Structured tracing for the long-running `chat` process, on stderr so
/// replies on stdout stay clean.  `RUST_LOG` overrides the configured
/// filter.
fn init_tracing(obs: &ObservabilityConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&obs.default_filter));

    let registry = tracing_subscriber::registry().with(env_filter);
    if obs.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

/// Compact stderr-only tracing for one-shot commands.
///
/// Defaults to `warn` so diagnostics do not pollute stdout.
fn init_cli_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
