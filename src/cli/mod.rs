//! CLI module for basenet
//!
//! Argument parsing and subcommand dispatch.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// basenet - AWS base network topology
///
/// Resolves stack configuration into a VPC, subnets, routing, NAT and an S3
/// endpoint, and previews the resulting resource graph.
#[derive(Parser, Debug, Clone)]
#[command(name = "basenet")]
#[command(version)]
#[command(about = "AWS base network topology provisioner", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true, env = "BASENET_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Override the configured region
    #[arg(short = 'r', long, global = true)]
    pub region: Option<String>,

    /// Fail on malformed configuration values instead of using defaults
    #[arg(long, global = true)]
    pub strict: bool,

    /// Ask EC2 for the region's availability zones
    #[cfg(feature = "aws")]
    #[arg(long, global = true)]
    pub discover_zones: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output with colors
    #[default]
    Human,
    /// JSON output for scripting
    Json,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print the resolved network settings
    Settings(commands::settings::SettingsArgs),

    /// Build the topology against the in-memory engine
    Preview(commands::preview::PreviewArgs),

    /// Print the resource dependency graph
    Graph(commands::graph::GraphArgs),
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Get the effective verbosity level (0-3)
    pub fn verbosity(&self) -> u8 {
        self.verbose.min(3)
    }

    /// Check if JSON output is requested
    pub fn is_json(&self) -> bool {
        matches!(self.output, OutputFormat::Json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preview() {
        let cli = Cli::try_parse_from(["basenet", "-vv", "--output", "json", "preview"]).unwrap();
        assert_eq!(cli.verbosity(), 2);
        assert!(cli.is_json());
        assert!(matches!(cli.command, Commands::Preview(_)));
    }

    #[test]
    fn test_global_args_after_subcommand() {
        let cli = Cli::try_parse_from([
            "basenet",
            "settings",
            "--region",
            "eu-west-1",
            "--strict",
            "-c",
            "stack.yaml",
        ])
        .unwrap();
        assert_eq!(cli.region.as_deref(), Some("eu-west-1"));
        assert!(cli.strict);
        assert_eq!(cli.config, Some(PathBuf::from("stack.yaml")));
    }

    #[test]
    fn test_verbosity_is_capped() {
        let cli = Cli::try_parse_from(["basenet", "-vvvvv", "graph"]).unwrap();
        assert_eq!(cli.verbosity(), 3);
    }
}
