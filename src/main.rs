//! basenet - AWS base network topology
//!
//! This is the main entry point for the basenet CLI.

mod cli;

use anyhow::Result;
use basenet::config::{Config, LoggingConfig};
use cli::commands::CommandContext;
use cli::output::OutputFormatter;
use cli::{Cli, Commands};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Application version information
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse_args();

    let config = match Config::load(cli.config.as_ref()) {
        Ok(config) => config,
        Err(e) => {
            OutputFormatter::new(!cli.no_color, cli.is_json(), cli.verbosity())
                .error(&format!("Failed to load config: {:#}", e));
            std::process::exit(4);
        }
    };

    // Initialize logging based on verbosity
    init_logging(cli.verbosity(), &config.logging);

    if cli.verbosity() >= 2 {
        eprintln!("basenet v{}", VERSION);
    }

    let mut ctx = CommandContext::new(&cli, config);

    let exit_code = match run(&cli, &mut ctx).await {
        Ok(code) => code,
        Err(e) => {
            ctx.output.error(&format!("{:#}", e));
            e.downcast_ref::<basenet::Error>()
                .map_or(1, basenet::Error::exit_code)
        }
    };

    std::process::exit(exit_code);
}

async fn run(cli: &Cli, ctx: &mut CommandContext) -> Result<i32> {
    match &cli.command {
        Commands::Settings(args) => args.execute(ctx).await,
        Commands::Preview(args) => args.execute(ctx).await,
        Commands::Graph(args) => args.execute(ctx).await,
    }
}

/// Initialize logging based on verbosity level
fn init_logging(verbosity: u8, logging: &LoggingConfig) {
    let filter = match verbosity {
        0 => logging.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let registry = tracing_subscriber::registry().with(env_filter);
    if logging.log_format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(verbosity >= 3)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
