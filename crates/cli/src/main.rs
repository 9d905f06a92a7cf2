mod validate_commands;

use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "upwire", about = "upwire - RCS business-messaging channel emulator")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    // Gateway arguments (used when no subcommand is provided, or with `gateway`)
    /// Address to bind to (overrides config value).
    #[arg(long, global = true)]
    bind: Option<String>,
    /// Port to listen on (overrides config value).
    #[arg(long, global = true)]
    port: Option<u16>,
    /// Custom config directory (overrides default ~/.config/upwire/).
    #[arg(long, global = true, env = "UPWIRE_CONFIG_DIR")]
    config_dir: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the callback gateway (default when no subcommand is provided).
    Gateway,
    /// Validate a payload file offline and print the categorized report.
    Validate {
        /// Path to the JSON payload.
        #[arg(long)]
        file: std::path::PathBuf,
        /// Treat the payload as an RBM callback event instead of a message.
        #[arg(long, default_value_t = false)]
        event: bool,
    },
}

/// Initialise tracing: `RUST_LOG` wins, then `--log-level`.
fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    match cli.command {
        // Default: start the gateway when no subcommand is provided.
        None | Some(Commands::Gateway) => {
            info!(version = env!("CARGO_PKG_VERSION"), "upwire starting");
            upwire_gateway::start_gateway(cli.bind, cli.port, cli.config_dir).await
        }
        Some(Commands::Validate { file, event }) => {
            validate_commands::handle_validate(&file, event)
        }
    }
}
