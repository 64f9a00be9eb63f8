//! Subcommands module for basenet CLI

pub mod graph;
pub mod preview;
pub mod settings;

use crate::cli::output::OutputFormatter;
use anyhow::Result;
use basenet::config::Config;
use basenet::graph::{Deployment, InMemoryGraph};
use basenet::settings::{DisabledZoneDiscovery, NetworkSettings, RawNetworkConfig, ZoneDiscovery};
use std::sync::Arc;
use tracing::debug;

#[cfg(feature = "aws")]
const DISCOVERY_HINT: &str = "pass --discover-zones or set availabilityZones";
#[cfg(not(feature = "aws"))]
const DISCOVERY_HINT: &str =
    "set availabilityZones (zone lookup needs a build with the `aws` feature)";

/// Common context shared between commands
pub struct CommandContext {
    /// Configuration
    pub config: Config,
    /// Output formatter
    pub output: OutputFormatter,
    /// Query EC2 for availability zones
    pub discover_zones: bool,
}

impl CommandContext {
    /// Create a new command context from CLI arguments
    pub fn new(cli: &crate::cli::Cli, mut config: Config) -> Self {
        let output = OutputFormatter::new(!cli.no_color, cli.is_json(), cli.verbosity());

        if let Some(region) = &cli.region {
            config.region = Some(region.clone());
        }
        if cli.strict {
            config.strict_config = true;
        }

        #[cfg(feature = "aws")]
        let discover_zones = cli.discover_zones;
        #[cfg(not(feature = "aws"))]
        let discover_zones = false;

        Self {
            config,
            output,
            discover_zones,
        }
    }

    /// Zone discovery for the configured region.
    ///
    /// Without EC2 access every lookup fails, so only an explicit
    /// `availabilityZones` list resolves.
    pub fn zone_discovery(&self) -> Box<dyn ZoneDiscovery> {
        match self.ec2_discovery() {
            Some(discovery) => discovery,
            None => Box::new(DisabledZoneDiscovery::new(DISCOVERY_HINT)),
        }
    }

    #[cfg(feature = "aws")]
    fn ec2_discovery(&self) -> Option<Box<dyn ZoneDiscovery>> {
        if self.discover_zones {
            Some(Box::new(basenet::settings::Ec2ZoneDiscovery))
        } else {
            None
        }
    }

    #[cfg(not(feature = "aws"))]
    fn ec2_discovery(&self) -> Option<Box<dyn ZoneDiscovery>> {
        None
    }

    /// Resolve network settings from the loaded configuration
    pub async fn resolve_settings(&self) -> Result<NetworkSettings> {
        let values = self.config.stack_values();
        debug!(values = values.len(), region = %self.config.region(), "Resolving settings");

        let discovery = self.zone_discovery();
        let settings = RawNetworkConfig::new(&values)
            .with_policy(self.config.shape_policy())
            .resolve(discovery.as_ref(), self.config.region())
            .await
            .map_err(basenet::Error::from)?;
        Ok(settings)
    }

    /// A deployment backed by a fresh in-memory engine
    pub fn preview_deployment(&self) -> (Arc<InMemoryGraph>, Deployment) {
        let engine = Arc::new(InMemoryGraph::new());
        let deployment = Deployment::new(engine.clone(), self.config.stack_context());
        (engine, deployment)
    }
}
