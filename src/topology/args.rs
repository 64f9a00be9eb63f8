//! Typed arguments for every resource the topology creates.
//!
//! Field names follow the EC2 resource model; they are flattened into
//! camelCase input properties when registered.

use crate::graph::{Input, Inputs, Output, ResourceArgs, ResourceType};
use crate::settings::{SubnetPlan, Tags};

/// Destination of every default route.
pub const ANY_IPV4: &str = "0.0.0.0/0";

fn inputs<const N: usize>(pairs: [(&str, Input); N]) -> Inputs {
    pairs
        .into_iter()
        .map(|(key, input)| (key.to_string(), input))
        .collect()
}

/// Tags holding only `Name`, plus the given extra pairs.
pub fn name_tags(name: impl Into<String>, extra: &[(&str, &str)]) -> Tags {
    let mut tags = Tags::new();
    tags.insert("Name".to_string(), name.into());
    for (key, value) in extra {
        tags.insert(key.to_string(), value.to_string());
    }
    tags
}

#[derive(Debug, Clone)]
pub struct VpcArgs {
    pub cidr_block: String,
    pub instance_tenancy: String,
    pub enable_dns_support: bool,
    pub enable_dns_hostnames: bool,
    pub tags: Tags,
}

impl ResourceArgs for VpcArgs {
    const TYPE: ResourceType = ResourceType::Vpc;

    fn into_inputs(self) -> Inputs {
        inputs([
            ("cidrBlock", self.cidr_block.into()),
            ("instanceTenancy", self.instance_tenancy.into()),
            ("enableDnsSupport", self.enable_dns_support.into()),
            ("enableDnsHostnames", self.enable_dns_hostnames.into()),
            ("tags", self.tags.into()),
        ])
    }
}

#[derive(Debug, Clone)]
pub struct VpcDhcpOptionsArgs {
    pub domain_name: String,
    pub domain_name_servers: Vec<String>,
}

impl ResourceArgs for VpcDhcpOptionsArgs {
    const TYPE: ResourceType = ResourceType::VpcDhcpOptions;

    fn into_inputs(self) -> Inputs {
        inputs([
            ("domainName", self.domain_name.into()),
            ("domainNameServers", self.domain_name_servers.into()),
        ])
    }
}

#[derive(Debug, Clone)]
pub struct VpcDhcpOptionsAssociationArgs {
    pub vpc_id: Output<String>,
    pub dhcp_options_id: Output<String>,
}

impl ResourceArgs for VpcDhcpOptionsAssociationArgs {
    const TYPE: ResourceType = ResourceType::VpcDhcpOptionsAssociation;

    fn into_inputs(self) -> Inputs {
        inputs([
            ("vpcId", self.vpc_id.into()),
            ("dhcpOptionsId", self.dhcp_options_id.into()),
        ])
    }
}

#[derive(Debug, Clone)]
pub struct InternetGatewayArgs {
    pub vpc_id: Output<String>,
    pub tags: Tags,
}

impl ResourceArgs for InternetGatewayArgs {
    const TYPE: ResourceType = ResourceType::InternetGateway;

    fn into_inputs(self) -> Inputs {
        inputs([("vpcId", self.vpc_id.into()), ("tags", self.tags.into())])
    }
}

#[derive(Debug, Clone)]
pub struct RouteTableArgs {
    pub vpc_id: Output<String>,
    pub tags: Tags,
}

impl ResourceArgs for RouteTableArgs {
    const TYPE: ResourceType = ResourceType::RouteTable;

    fn into_inputs(self) -> Inputs {
        inputs([("vpcId", self.vpc_id.into()), ("tags", self.tags.into())])
    }
}

/// Next hop of a route
#[derive(Debug, Clone)]
pub enum RouteTarget {
    InternetGateway(Output<String>),
    NatGateway(Output<String>),
}

#[derive(Debug, Clone)]
pub struct RouteArgs {
    pub route_table_id: Output<String>,
    pub destination_cidr_block: String,
    pub target: RouteTarget,
}

impl RouteArgs {
    /// A `0.0.0.0/0` route through `target`.
    pub fn default_route(route_table_id: Output<String>, target: RouteTarget) -> Self {
        Self {
            route_table_id,
            destination_cidr_block: ANY_IPV4.to_string(),
            target,
        }
    }
}

impl ResourceArgs for RouteArgs {
    const TYPE: ResourceType = ResourceType::Route;

    fn into_inputs(self) -> Inputs {
        let target: (&str, Input) = match self.target {
            RouteTarget::InternetGateway(id) => ("gatewayId", id.into()),
            RouteTarget::NatGateway(id) => ("natGatewayId", id.into()),
        };

        inputs([
            ("routeTableId", self.route_table_id.into()),
            ("destinationCidrBlock", self.destination_cidr_block.into()),
            target,
        ])
    }
}

#[derive(Debug, Clone)]
pub struct RouteTableAssociationArgs {
    pub subnet_id: Output<String>,
    pub route_table_id: Output<String>,
}

impl ResourceArgs for RouteTableAssociationArgs {
    const TYPE: ResourceType = ResourceType::RouteTableAssociation;

    fn into_inputs(self) -> Inputs {
        inputs([
            ("subnetId", self.subnet_id.into()),
            ("routeTableId", self.route_table_id.into()),
        ])
    }
}

#[derive(Debug, Clone)]
pub struct SubnetArgs {
    pub vpc_id: Output<String>,
    pub availability_zone: String,
    pub cidr_block: String,
    /// Left unset for private subnets
    pub map_public_ip_on_launch: Option<bool>,
    pub tags: Tags,
}

impl SubnetArgs {
    pub fn from_plan(vpc_id: Output<String>, zone: &str, plan: &SubnetPlan) -> Self {
        Self {
            vpc_id,
            availability_zone: zone.to_string(),
            cidr_block: plan.cidr.clone(),
            map_public_ip_on_launch: None,
            tags: plan.tags.clone(),
        }
    }

    pub fn map_public_ip_on_launch(mut self, enabled: bool) -> Self {
        self.map_public_ip_on_launch = Some(enabled);
        self
    }
}

impl ResourceArgs for SubnetArgs {
    const TYPE: ResourceType = ResourceType::Subnet;

    fn into_inputs(self) -> Inputs {
        let mut inputs = inputs([
            ("vpcId", self.vpc_id.into()),
            ("availabilityZone", self.availability_zone.into()),
            ("cidrBlock", self.cidr_block.into()),
        ]);
        if let Some(enabled) = self.map_public_ip_on_launch {
            inputs.insert("mapPublicIpOnLaunch".to_string(), enabled.into());
        }
        inputs.insert("tags".to_string(), self.tags.into());
        inputs
    }
}

#[derive(Debug, Clone)]
pub struct EipArgs {
    /// Allocate for use in a VPC
    pub vpc: bool,
}

impl ResourceArgs for EipArgs {
    const TYPE: ResourceType = ResourceType::Eip;

    fn into_inputs(self) -> Inputs {
        inputs([("vpc", self.vpc.into())])
    }
}

#[derive(Debug, Clone)]
pub struct NatGatewayArgs {
    pub subnet_id: Output<String>,
    pub allocation_id: Output<String>,
}

impl ResourceArgs for NatGatewayArgs {
    const TYPE: ResourceType = ResourceType::NatGateway;

    fn into_inputs(self) -> Inputs {
        inputs([
            ("subnetId", self.subnet_id.into()),
            ("allocationId", self.allocation_id.into()),
        ])
    }
}

#[derive(Debug, Clone)]
pub struct NetworkAclArgs {
    pub vpc_id: Output<String>,
    pub subnet_ids: Output<Vec<String>>,
    pub tags: Tags,
}

impl ResourceArgs for NetworkAclArgs {
    const TYPE: ResourceType = ResourceType::NetworkAcl;

    fn into_inputs(self) -> Inputs {
        inputs([
            ("vpcId", self.vpc_id.into()),
            ("subnetIds", self.subnet_ids.into()),
            ("tags", self.tags.into()),
        ])
    }
}

#[derive(Debug, Clone)]
pub struct NetworkAclRuleArgs {
    pub network_acl_id: Output<String>,
    pub cidr_block: String,
    pub egress: bool,
    pub protocol: String,
    pub rule_action: String,
    pub rule_number: u32,
}

impl NetworkAclRuleArgs {
    /// Rule 100: allow all protocols from or to anywhere.
    pub fn allow_all(network_acl_id: Output<String>, egress: bool) -> Self {
        Self {
            network_acl_id,
            cidr_block: ANY_IPV4.to_string(),
            egress,
            protocol: "-1".to_string(),
            rule_action: "allow".to_string(),
            rule_number: 100,
        }
    }
}

impl ResourceArgs for NetworkAclRuleArgs {
    const TYPE: ResourceType = ResourceType::NetworkAclRule;

    fn into_inputs(self) -> Inputs {
        inputs([
            ("networkAclId", self.network_acl_id.into()),
            ("cidrBlock", self.cidr_block.into()),
            ("egress", self.egress.into()),
            ("protocol", self.protocol.into()),
            ("ruleAction", self.rule_action.into()),
            ("ruleNumber", self.rule_number.into()),
        ])
    }
}

#[derive(Debug, Clone)]
pub struct VpcEndpointArgs {
    pub vpc_id: Output<String>,
    pub service_name: String,
    /// Endpoint policy as JSON text
    pub policy: String,
    pub route_table_ids: Output<Vec<String>>,
}

impl ResourceArgs for VpcEndpointArgs {
    const TYPE: ResourceType = ResourceType::VpcEndpoint;

    fn into_inputs(self) -> Inputs {
        inputs([
            ("vpcId", self.vpc_id.into()),
            ("policy", self.policy.into()),
            ("routeTableIds", self.route_table_ids.into()),
            ("serviceName", self.service_name.into()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_route_target_property() {
        let args = RouteArgs::default_route(
            Output::known("rtb-1".to_string()),
            RouteTarget::NatGateway(Output::known("nat-1".to_string())),
        );
        let inputs = args.into_inputs();

        assert!(inputs.contains_key("natGatewayId"));
        assert!(!inputs.contains_key("gatewayId"));
        assert!(matches!(
            inputs.get("destinationCidrBlock"),
            Some(Input::Value(v)) if v == &json!("0.0.0.0/0")
        ));
    }

    #[test]
    fn test_private_subnet_omits_public_ip_flag() {
        let plan = SubnetPlan::new(
            crate::settings::SubnetRole::Private,
            0,
            "10.0.0.0/19",
            Tags::new(),
        );
        let inputs = SubnetArgs::from_plan(Output::known("vpc-1".to_string()), "us-east-1a", &plan)
            .into_inputs();

        assert!(!inputs.contains_key("mapPublicIpOnLaunch"));
        let keys: Vec<&str> = inputs.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["vpcId", "availabilityZone", "cidrBlock", "tags"]);
    }

    #[test]
    fn test_allow_all_rule() {
        let rule = NetworkAclRuleArgs::allow_all(Output::known("acl-1".to_string()), true);
        assert_eq!(rule.rule_number, 100);
        assert_eq!(rule.protocol, "-1");
        assert_eq!(rule.cidr_block, "0.0.0.0/0");
        assert!(rule.egress);
    }
}
