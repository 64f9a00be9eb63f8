//! Per-zone subnet plans.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Tags attached to a resource, in insertion order
pub type Tags = IndexMap<String, String>;

/// Which tier a subnet belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubnetRole {
    Public,
    Private,
    Protected,
}

impl SubnetRole {
    /// Value of the default `Network` tag. Protected subnets share the
    /// private role.
    pub fn network_tag(&self) -> &'static str {
        match self {
            SubnetRole::Public => "Public",
            SubnetRole::Private | SubnetRole::Protected => "Private",
        }
    }

    /// Logical resource name of this tier's subnet in zone `index`.
    pub fn logical_name(&self, index: usize) -> String {
        match self {
            SubnetRole::Public => format!("PublicSubnet{}", index),
            SubnetRole::Private => format!("PrivateSubnet{}A", index),
            SubnetRole::Protected => format!("PrivateSubnet{}B", index),
        }
    }

    /// Value of the `Name` tag of this tier's subnet in zone `index`.
    pub fn display_name(&self, index: usize) -> String {
        match self {
            SubnetRole::Public => format!("Public subnet {}", index),
            SubnetRole::Private => format!("Private subnet {}A", index),
            SubnetRole::Protected => format!("Private subnet {}B", index),
        }
    }

    /// A fresh default tag map.
    pub fn default_tags(&self) -> Tags {
        let mut tags = Tags::new();
        tags.insert("Network".to_string(), self.network_tag().to_string());
        tags
    }
}

impl fmt::Display for SubnetRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubnetRole::Public => write!(f, "public"),
            SubnetRole::Private => write!(f, "private"),
            SubnetRole::Protected => write!(f, "protected"),
        }
    }
}

/// Everything needed to create one subnet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetPlan {
    pub role: SubnetRole,
    pub logical_name: String,
    pub display_name: String,
    pub cidr: String,
    /// Configured tags with `Name` set to the display name
    pub tags: Tags,
}

impl SubnetPlan {
    pub fn new(role: SubnetRole, index: usize, cidr: impl Into<String>, mut tags: Tags) -> Self {
        let display_name = role.display_name(index);
        tags.insert("Name".to_string(), display_name.clone());

        Self {
            role,
            logical_name: role.logical_name(index),
            display_name,
            cidr: cidr.into(),
            tags,
        }
    }
}

/// The subnets of one availability zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZonePlan {
    pub index: usize,
    pub zone: String,
    pub public: SubnetPlan,
    pub private: Option<SubnetPlan>,
    pub protected: Option<SubnetPlan>,
}

impl ZonePlan {
    pub fn subnets(&self) -> impl Iterator<Item = &SubnetPlan> {
        std::iter::once(&self.public)
            .chain(self.private.as_ref())
            .chain(self.protected.as_ref())
    }
}
