mod commands;

use anyhow::Context;
use asset_relay_core::config::normalize_prefix;
use clap::{CommandFactory, Parser};
use clap_complete::{Shell, generate};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str =
    "asset_relay=info,asset_relay_core=info,asset_relay_store=info,tower_http=info";

#[derive(Parser)]
#[command(name = "asset-relay")]
#[command(version, about = "Serves WebGL build assets from blob storage", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Run the asset server
    Serve {
        /// Path to relay.toml
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Address to listen on (overrides server.bind)
        #[arg(short, long)]
        bind: Option<SocketAddr>,

        /// Route prefix (overrides server.route_prefix)
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Resolve a single asset and print how it would be served
    Resolve {
        /// Container (bucket) name
        container: String,

        /// Asset path inside the container
        path: String,

        /// Path to relay.toml
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the payload, exactly as served, to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check that all files of a WebGL build are resolvable
    Probe {
        /// Container (bucket) name
        container: String,

        /// Build id, e.g. `Build/game` for Build/game.loader.js etc.
        build_id: String,

        /// Path to relay.toml
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Validate configuration
    CheckConfig {
        /// Path to relay.toml
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Command::Serve {
            config,
            bind,
            prefix,
        } => {
            let mut config = commands::load_config(config.as_deref())?;
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            if let Some(prefix) = prefix {
                config.server.route_prefix =
                    normalize_prefix(&prefix).context("Invalid --prefix")?;
            }
            commands::serve::run(config).await
        }
        Command::Resolve {
            container,
            path,
            config,
            output,
        } => {
            let config = commands::load_config(config.as_deref())?;
            commands::resolve::run(config, container, path, output).await
        }
        Command::Probe {
            container,
            build_id,
            config,
        } => {
            let config = commands::load_config(config.as_deref())?;
            commands::probe::run(config, container, build_id).await
        }
        Command::CheckConfig { config } => commands::check_config::run(config).await,
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "asset-relay", &mut io::stdout());
            Ok(())
        }
    }
}
