//! Network settings resolution.
//!
//! Raw stack configuration is read through a [`ConfigSource`] and resolved
//! once into an immutable [`NetworkSettings`]: the availability zone list,
//! the per-zone CIDR blocks and tags of every subnet tier, and a
//! [`ZonePlan`] per zone that the topology builder walks.
//!
//! Every key is optional. Missing lists fall back to the built-in default
//! tables in [`defaults`], sliced to the number of zones.

pub mod defaults;
pub mod plan;
pub mod source;
pub mod zones;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

pub use plan::{SubnetPlan, SubnetRole, Tags, ZonePlan};
pub use source::{ConfigSource, StackValues};
#[cfg(feature = "aws")]
pub use zones::Ec2ZoneDiscovery;
pub use zones::{DisabledZoneDiscovery, StaticZones, ZoneDiscovery};

/// Configuration keys read by the resolver
pub mod keys {
    pub const AVAILABILITY_ZONES: &str = "availabilityZones";
    pub const NUMBER_OF_AVAILABILITY_ZONES: &str = "numberOfAvailabilityZones";
    pub const CREATE_PRIVATE_SUBNETS: &str = "createPrivateSubnets";
    pub const CREATE_PROTECTED_SUBNETS: &str = "createProtectedSubnets";
    pub const VPC_CIDR: &str = "vpcCidr";
    pub const VPC_TENANCY: &str = "vpcTenancy";
    pub const PUBLIC_SUBNET_CIDRS: &str = "publicSubnetCidrs";
    pub const PRIVATE_SUBNET_CIDRS: &str = "privateSubnetCidrs";
    pub const PROTECTED_SUBNET_CIDRS: &str = "protectedSubnetCidrs";
    pub const PUBLIC_SUBNET_TAGS: &str = "publicSubnetTags";
    pub const PRIVATE_SUBNET_TAGS: &str = "privateSubnetTags";
    pub const PROTECTED_SUBNET_TAGS: &str = "protectedSubnetTags";
}

/// Errors raised while resolving network settings
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Configuration value '{key}' is not a valid {expected}: {found}")]
    ConfigShape {
        key: String,
        expected: &'static str,
        found: String,
    },

    #[error("Failed to list availability zones for region '{region}': {message}")]
    Discovery { region: String, message: String },

    #[error("{list} has {available} entries but {requested} are required")]
    IndexOutOfRange {
        list: String,
        requested: usize,
        available: usize,
    },
}

/// Result type for settings resolution
pub type SettingsResult<T> = Result<T, SettingsError>;

/// What to do with a configured value of the wrong shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapePolicy {
    /// Warn and use the default
    #[default]
    Lenient,
    /// Fail with [`SettingsError::ConfigShape`]
    Strict,
}

/// Raw accessors over the configuration source.
///
/// Nothing is cached: each accessor re-reads the source. Call
/// [`RawNetworkConfig::resolve`] to obtain a consistent snapshot.
#[derive(Debug)]
pub struct RawNetworkConfig<'a, S: ConfigSource> {
    source: &'a S,
    policy: ShapePolicy,
}

impl<'a, S: ConfigSource> RawNetworkConfig<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            policy: ShapePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ShapePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> ShapePolicy {
        self.policy
    }

    fn checked<T>(&self, result: SettingsResult<Option<T>>) -> SettingsResult<Option<T>> {
        match result {
            Err(err @ SettingsError::ConfigShape { .. }) if self.policy == ShapePolicy::Lenient => {
                warn!(error = %err, "Ignoring malformed configuration value, using default");
                Ok(None)
            }
            other => other,
        }
    }

    pub fn create_private_subnets(&self) -> SettingsResult<bool> {
        Ok(self
            .checked(self.source.try_bool(keys::CREATE_PRIVATE_SUBNETS))?
            .unwrap_or(defaults::DEFAULT_CREATE_PRIVATE_SUBNETS))
    }

    /// The configured flag alone. Protected subnets are only created when
    /// private subnets are as well.
    pub fn create_protected_subnets(&self) -> SettingsResult<bool> {
        Ok(self
            .checked(self.source.try_bool(keys::CREATE_PROTECTED_SUBNETS))?
            .unwrap_or(defaults::DEFAULT_CREATE_PROTECTED_SUBNETS))
    }

    fn protected_enabled(&self) -> SettingsResult<bool> {
        Ok(self.create_private_subnets()? && self.create_protected_subnets()?)
    }

    pub fn number_of_availability_zones(&self) -> SettingsResult<u32> {
        Ok(self
            .checked(self.source.try_u32(keys::NUMBER_OF_AVAILABILITY_ZONES))?
            .unwrap_or(defaults::DEFAULT_ZONE_COUNT))
    }

    pub fn vpc_cidr(&self) -> SettingsResult<String> {
        Ok(self
            .checked(self.source.try_string(keys::VPC_CIDR))?
            .unwrap_or_else(|| defaults::DEFAULT_VPC_CIDR.to_string()))
    }

    pub fn vpc_tenancy(&self) -> SettingsResult<String> {
        Ok(self
            .checked(self.source.try_string(keys::VPC_TENANCY))?
            .unwrap_or_else(|| defaults::DEFAULT_VPC_TENANCY.to_string()))
    }

    /// The configured zone list verbatim, or the first
    /// `numberOfAvailabilityZones` zones the region reports.
    pub async fn availability_zones(
        &self,
        discovery: &dyn ZoneDiscovery,
        region: &str,
    ) -> SettingsResult<Vec<String>> {
        if let Some(zones) = self.checked(
            self.source
                .try_object::<Vec<String>>(keys::AVAILABILITY_ZONES),
        )? {
            return Ok(zones);
        }

        let count = self.number_of_availability_zones()? as usize;
        let mut zones = discovery.list_availability_zones(region).await?;
        if count > zones.len() {
            return Err(SettingsError::IndexOutOfRange {
                list: format!("availability zones of {}", region),
                requested: count,
                available: zones.len(),
            });
        }

        zones.truncate(count);
        Ok(zones)
    }

    fn cidrs(&self, key: &str, table: &[&str], zone_count: usize) -> SettingsResult<Vec<String>> {
        match self.checked(self.source.try_object::<Vec<String>>(key))? {
            Some(cidrs) => Ok(cidrs),
            None => defaults::slice_table(table, zone_count, key),
        }
    }

    fn tags(&self, key: &str, role: SubnetRole, zone_count: usize) -> SettingsResult<Vec<Tags>> {
        match self.checked(self.source.try_object::<Vec<Tags>>(key))? {
            Some(tags) => Ok(tags),
            None => Ok((0..zone_count).map(|_| role.default_tags()).collect()),
        }
    }

    pub fn public_subnet_cidrs(&self, zone_count: usize) -> SettingsResult<Vec<String>> {
        self.cidrs(
            keys::PUBLIC_SUBNET_CIDRS,
            &defaults::PUBLIC_SUBNET_CIDRS,
            zone_count,
        )
    }

    pub fn public_subnet_tags(&self, zone_count: usize) -> SettingsResult<Vec<Tags>> {
        self.tags(keys::PUBLIC_SUBNET_TAGS, SubnetRole::Public, zone_count)
    }

    pub fn private_subnet_cidrs(&self, zone_count: usize) -> SettingsResult<Vec<String>> {
        if !self.create_private_subnets()? {
            return Ok(Vec::new());
        }
        self.cidrs(
            keys::PRIVATE_SUBNET_CIDRS,
            &defaults::PRIVATE_SUBNET_CIDRS,
            zone_count,
        )
    }

    pub fn private_subnet_tags(&self, zone_count: usize) -> SettingsResult<Vec<Tags>> {
        if !self.create_private_subnets()? {
            return Ok(Vec::new());
        }
        self.tags(keys::PRIVATE_SUBNET_TAGS, SubnetRole::Private, zone_count)
    }

    pub fn protected_subnet_cidrs(&self, zone_count: usize) -> SettingsResult<Vec<String>> {
        if !self.protected_enabled()? {
            return Ok(Vec::new());
        }
        self.cidrs(
            keys::PROTECTED_SUBNET_CIDRS,
            &defaults::PROTECTED_SUBNET_CIDRS,
            zone_count,
        )
    }

    pub fn protected_subnet_tags(&self, zone_count: usize) -> SettingsResult<Vec<Tags>> {
        if !self.protected_enabled()? {
            return Ok(Vec::new());
        }
        self.tags(keys::PROTECTED_SUBNET_TAGS, SubnetRole::Protected, zone_count)
    }

    /// Read every value once and freeze the result.
    pub async fn resolve(
        &self,
        discovery: &dyn ZoneDiscovery,
        region: &str,
    ) -> SettingsResult<NetworkSettings> {
        let availability_zones = self.availability_zones(discovery, region).await?;
        let zone_count = availability_zones.len();

        let create_private_subnets = self.create_private_subnets()?;
        let create_protected_subnets = create_private_subnets && self.create_protected_subnets()?;

        let public_subnet_cidrs = self.public_subnet_cidrs(zone_count)?;
        let public_subnet_tags = self.public_subnet_tags(zone_count)?;
        let private_subnet_cidrs = self.private_subnet_cidrs(zone_count)?;
        let private_subnet_tags = self.private_subnet_tags(zone_count)?;
        let protected_subnet_cidrs = self.protected_subnet_cidrs(zone_count)?;
        let protected_subnet_tags = self.protected_subnet_tags(zone_count)?;

        covers(keys::PUBLIC_SUBNET_CIDRS, public_subnet_cidrs.len(), zone_count)?;
        covers(keys::PUBLIC_SUBNET_TAGS, public_subnet_tags.len(), zone_count)?;
        if create_private_subnets {
            covers(keys::PRIVATE_SUBNET_CIDRS, private_subnet_cidrs.len(), zone_count)?;
            covers(keys::PRIVATE_SUBNET_TAGS, private_subnet_tags.len(), zone_count)?;
        }
        if create_protected_subnets {
            covers(keys::PROTECTED_SUBNET_CIDRS, protected_subnet_cidrs.len(), zone_count)?;
            covers(keys::PROTECTED_SUBNET_TAGS, protected_subnet_tags.len(), zone_count)?;
        }

        let zones = availability_zones
            .iter()
            .enumerate()
            .map(|(i, zone)| ZonePlan {
                index: i,
                zone: zone.clone(),
                public: SubnetPlan::new(
                    SubnetRole::Public,
                    i,
                    public_subnet_cidrs[i].clone(),
                    public_subnet_tags[i].clone(),
                ),
                private: create_private_subnets.then(|| {
                    SubnetPlan::new(
                        SubnetRole::Private,
                        i,
                        private_subnet_cidrs[i].clone(),
                        private_subnet_tags[i].clone(),
                    )
                }),
                protected: create_protected_subnets.then(|| {
                    SubnetPlan::new(
                        SubnetRole::Protected,
                        i,
                        protected_subnet_cidrs[i].clone(),
                        protected_subnet_tags[i].clone(),
                    )
                }),
            })
            .collect();

        let settings = NetworkSettings {
            region: region.to_string(),
            availability_zones,
            number_of_availability_zones: self.number_of_availability_zones()?,
            create_private_subnets,
            create_protected_subnets,
            vpc_cidr: self.vpc_cidr()?,
            vpc_tenancy: self.vpc_tenancy()?,
            public_subnet_cidrs,
            private_subnet_cidrs,
            protected_subnet_cidrs,
            public_subnet_tags,
            private_subnet_tags,
            protected_subnet_tags,
            zones,
        };

        debug!(
            region = %settings.region,
            zones = ?settings.availability_zones,
            private = settings.create_private_subnets,
            protected = settings.create_protected_subnets,
            "Resolved network settings"
        );

        Ok(settings)
    }
}

fn covers(key: &str, len: usize, zone_count: usize) -> SettingsResult<()> {
    if len < zone_count {
        return Err(SettingsError::IndexOutOfRange {
            list: key.to_string(),
            requested: zone_count,
            available: len,
        });
    }
    Ok(())
}

/// Fully resolved network settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSettings {
    region: String,
    availability_zones: Vec<String>,
    number_of_availability_zones: u32,
    create_private_subnets: bool,
    /// Effective flag: false whenever private subnets are disabled
    create_protected_subnets: bool,
    vpc_cidr: String,
    vpc_tenancy: String,
    public_subnet_cidrs: Vec<String>,
    private_subnet_cidrs: Vec<String>,
    protected_subnet_cidrs: Vec<String>,
    public_subnet_tags: Vec<Tags>,
    private_subnet_tags: Vec<Tags>,
    protected_subnet_tags: Vec<Tags>,
    zones: Vec<ZonePlan>,
}

impl NetworkSettings {
    /// Resolve from a configuration source with the default shape policy.
    pub async fn resolve<S: ConfigSource>(
        source: &S,
        discovery: &dyn ZoneDiscovery,
        region: &str,
    ) -> SettingsResult<Self> {
        RawNetworkConfig::new(source).resolve(discovery, region).await
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn availability_zones(&self) -> &[String] {
        &self.availability_zones
    }

    pub fn zone_count(&self) -> usize {
        self.availability_zones.len()
    }

    pub fn number_of_availability_zones(&self) -> u32 {
        self.number_of_availability_zones
    }

    pub fn create_private_subnets(&self) -> bool {
        self.create_private_subnets
    }

    pub fn create_protected_subnets(&self) -> bool {
        self.create_protected_subnets
    }

    pub fn vpc_cidr(&self) -> &str {
        &self.vpc_cidr
    }

    pub fn vpc_tenancy(&self) -> &str {
        &self.vpc_tenancy
    }

    pub fn public_subnet_cidrs(&self) -> &[String] {
        &self.public_subnet_cidrs
    }

    pub fn private_subnet_cidrs(&self) -> &[String] {
        &self.private_subnet_cidrs
    }

    pub fn protected_subnet_cidrs(&self) -> &[String] {
        &self.protected_subnet_cidrs
    }

    pub fn public_subnet_tags(&self) -> &[Tags] {
        &self.public_subnet_tags
    }

    pub fn private_subnet_tags(&self) -> &[Tags] {
        &self.private_subnet_tags
    }

    pub fn protected_subnet_tags(&self) -> &[Tags] {
        &self.protected_subnet_tags
    }

    /// One plan per availability zone, in zone order
    pub fn zones(&self) -> &[ZonePlan] {
        &self.zones
    }
}
