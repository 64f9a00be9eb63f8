//! Availability zone discovery.

use async_trait::async_trait;

use super::{SettingsError, SettingsResult};

/// Lists the availability zones of a region.
#[async_trait]
pub trait ZoneDiscovery: Send + Sync {
    /// Zone names in the order the provider reports them.
    async fn list_availability_zones(&self, region: &str) -> SettingsResult<Vec<String>>;
}

/// A fixed zone list, whatever the region.
#[derive(Debug, Clone, Default)]
pub struct StaticZones {
    zones: Vec<String>,
}

impl StaticZones {
    pub fn new<I, S>(zones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            zones: zones.into_iter().map(Into::into).collect(),
        }
    }

    /// `<region>a`, `<region>b`, ... in letter order.
    pub fn lettered(region: &str, count: usize) -> Self {
        Self::new(
            (b'a'..=b'z')
                .take(count)
                .map(|suffix| format!("{}{}", region, suffix as char)),
        )
    }
}

#[async_trait]
impl ZoneDiscovery for StaticZones {
    async fn list_availability_zones(&self, _region: &str) -> SettingsResult<Vec<String>> {
        Ok(self.zones.clone())
    }
}

/// Discovery for runs that cannot look zones up.
///
/// Every lookup fails with [`SettingsError::Discovery`], so settings only
/// resolve when `availabilityZones` is configured explicitly.
#[derive(Debug, Clone)]
pub struct DisabledZoneDiscovery {
    hint: String,
}

impl DisabledZoneDiscovery {
    pub fn new(hint: impl Into<String>) -> Self {
        Self { hint: hint.into() }
    }
}

#[async_trait]
impl ZoneDiscovery for DisabledZoneDiscovery {
    async fn list_availability_zones(&self, region: &str) -> SettingsResult<Vec<String>> {
        Err(SettingsError::Discovery {
            region: region.to_string(),
            message: format!("zone discovery is disabled; {}", self.hint),
        })
    }
}

/// Zone discovery through `DescribeAvailabilityZones`.
#[cfg(feature = "aws")]
#[derive(Debug, Clone, Default)]
pub struct Ec2ZoneDiscovery;

#[cfg(feature = "aws")]
impl Ec2ZoneDiscovery {
    async fn create_client(region: &str) -> aws_sdk_ec2::Client {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_sdk_ec2::config::Region::new(region.to_string()))
            .load()
            .await;

        aws_sdk_ec2::Client::new(&config)
    }
}

#[cfg(feature = "aws")]
#[async_trait]
impl ZoneDiscovery for Ec2ZoneDiscovery {
    async fn list_availability_zones(&self, region: &str) -> SettingsResult<Vec<String>> {
        use aws_sdk_ec2::types::Filter;

        let client = Self::create_client(region).await;

        let resp = client
            .describe_availability_zones()
            .filters(Filter::builder().name("state").values("available").build())
            .send()
            .await
            .map_err(|e| SettingsError::Discovery {
                region: region.to_string(),
                message: format!("Failed to describe availability zones: {}", e),
            })?;

        Ok(resp
            .availability_zones()
            .iter()
            .filter_map(|zone| zone.zone_name().map(str::to_string))
            .collect())
    }
}
