//! Network topology builder.
//!
//! Walks the resolved [`NetworkSettings`] and registers the base network:
//!
//! ```text
//! VPC ── DHCP options ── Internet Gateway ── public route table
//!  │
//!  └─ per zone i:
//!       PublicSubnet<i> ─┬─ NAT<i>EIP ── NATGateway<i>          (private)
//!                        ├─ PrivateSubnet<i>A + route table      (private)
//!                        └─ PrivateSubnet<i>B + route table
//!                           + network ACL                       (protected)
//!
//! S3 gateway endpoint on every private route table              (private)
//! ```
//!
//! Registration never waits; the [`Deployment`] orders creation by the
//! identifiers each resource consumes. Outputs are exported only after every
//! resource exists.

pub mod args;
pub mod outputs;

use serde_json::json;
use tracing::info;

use crate::graph::{Deployment, GraphResult, Output, Resource, ResourceOptions};
use crate::settings::{NetworkSettings, SubnetPlan};

use args::{
    name_tags, EipArgs, InternetGatewayArgs, NatGatewayArgs, NetworkAclArgs, NetworkAclRuleArgs,
    RouteArgs, RouteTableArgs, RouteTableAssociationArgs, RouteTarget, SubnetArgs, VpcArgs,
    VpcDhcpOptionsArgs, VpcDhcpOptionsAssociationArgs, VpcEndpointArgs,
};
pub use outputs::ExportedOutputs;

/// Internal DNS domain EC2 hands out in `region`.
pub fn dhcp_domain_name(region: &str) -> String {
    if region == "us-east-1" {
        "ec2.internal".to_string()
    } else {
        format!("{}.compute.internal", region)
    }
}

/// Service name of the S3 gateway endpoint in `region`.
pub fn s3_service_name(region: &str) -> String {
    format!("com.amazonaws.{}.s3", region)
}

/// Endpoint policy allowing every principal every action.
pub fn open_endpoint_policy() -> String {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Action": "*",
            "Effect": "Allow",
            "Resource": "*",
            "Principal": "*",
        }],
    })
    .to_string()
}

/// Subnet, route table and default route through a NAT gateway.
struct PrivateTier {
    subnet: Resource,
    route_table: Resource,
}

fn private_tier(
    deployment: &Deployment,
    vpc: &Resource,
    nat_gateway: &Resource,
    zone: &str,
    plan: &SubnetPlan,
) -> GraphResult<PrivateTier> {
    let subnet = deployment.register(
        plan.logical_name.clone(),
        SubnetArgs::from_plan(vpc.id(), zone, plan),
        ResourceOptions::default(),
    )?;

    let route_table = deployment.register(
        format!("{}RouteTable", plan.logical_name),
        RouteTableArgs {
            vpc_id: vpc.id(),
            tags: name_tags(plan.display_name.clone(), &[("Network", "Private")]),
        },
        ResourceOptions::default(),
    )?;

    deployment.register(
        format!("{}Route", plan.logical_name),
        RouteArgs::default_route(route_table.id(), RouteTarget::NatGateway(nat_gateway.id())),
        ResourceOptions::default(),
    )?;

    deployment.register(
        format!("{}RouteTableAssociation", plan.logical_name),
        RouteTableAssociationArgs {
            subnet_id: subnet.id(),
            route_table_id: route_table.id(),
        },
        ResourceOptions::default(),
    )?;

    Ok(PrivateTier {
        subnet,
        route_table,
    })
}

/// Handles the exported outputs are read from.
struct Registered {
    vpc: Resource,
    public_route_table: Resource,
    s3_endpoint: Option<Resource>,
    nat_eips: Vec<Output<String>>,
    public_subnet_ids: Vec<Output<String>>,
    private_subnet_ids: Vec<Output<String>>,
    protected_subnet_ids: Vec<Output<String>>,
    private_route_table_ids: Vec<Output<String>>,
}

fn register_topology(
    settings: &NetworkSettings,
    deployment: &Deployment,
    stack_name: &str,
) -> GraphResult<Registered> {
    let vpc = deployment.register(
        "VPC",
        VpcArgs {
            cidr_block: settings.vpc_cidr().to_string(),
            instance_tenancy: settings.vpc_tenancy().to_string(),
            enable_dns_support: true,
            enable_dns_hostnames: true,
            tags: name_tags(stack_name.to_string(), &[]),
        },
        ResourceOptions::default(),
    )?;

    let dhcp_options = deployment.register(
        "DHCPOptions",
        VpcDhcpOptionsArgs {
            domain_name: dhcp_domain_name(settings.region()),
            domain_name_servers: vec!["AmazonProvidedDNS".to_string()],
        },
        ResourceOptions::default(),
    )?;
    deployment.register(
        "VPCDHCPOptionsAssociation",
        VpcDhcpOptionsAssociationArgs {
            vpc_id: vpc.id(),
            dhcp_options_id: dhcp_options.id(),
        },
        ResourceOptions::default(),
    )?;

    let internet_gateway = deployment.register(
        "InternetGateway",
        InternetGatewayArgs {
            vpc_id: vpc.id(),
            tags: name_tags(stack_name.to_string(), &[]),
        },
        ResourceOptions::default(),
    )?;

    let public_route_table = deployment.register(
        "PublicSubnetRouteTable",
        RouteTableArgs {
            vpc_id: vpc.id(),
            tags: name_tags("Public Subnets", &[("Network", "Public")]),
        },
        ResourceOptions::default(),
    )?;
    deployment.register(
        "PublicSubnetRoute",
        RouteArgs::default_route(
            public_route_table.id(),
            RouteTarget::InternetGateway(internet_gateway.id()),
        ),
        ResourceOptions::default(),
    )?;

    let mut nat_eips = Vec::new();
    let mut public_subnet_ids = Vec::new();
    let mut private_subnet_ids = Vec::new();
    let mut protected_subnet_ids = Vec::new();
    let mut private_route_table_ids = Vec::new();

    for zone in settings.zones() {
        let public_subnet = deployment.register(
            zone.public.logical_name.clone(),
            SubnetArgs::from_plan(vpc.id(), &zone.zone, &zone.public).map_public_ip_on_launch(true),
            ResourceOptions::default(),
        )?;
        public_subnet_ids.push(public_subnet.id());

        deployment.register(
            format!("{}RouteTableAssociation", zone.public.logical_name),
            RouteTableAssociationArgs {
                subnet_id: public_subnet.id(),
                route_table_id: public_route_table.id(),
            },
            ResourceOptions::default(),
        )?;

        let Some(private_plan) = &zone.private else {
            continue;
        };

        let eip = deployment.register(
            format!("NAT{}EIP", zone.index),
            EipArgs { vpc: true },
            ResourceOptions::default().depends_on(&internet_gateway),
        )?;
        let nat_gateway = deployment.register(
            format!("NATGateway{}", zone.index),
            NatGatewayArgs {
                subnet_id: public_subnet.id(),
                allocation_id: eip.id(),
            },
            ResourceOptions::default(),
        )?;
        nat_eips.push(eip.string_attribute("publicIp"));

        let private = private_tier(deployment, &vpc, &nat_gateway, &zone.zone, private_plan)?;
        private_subnet_ids.push(private.subnet.id());
        private_route_table_ids.push(private.route_table.id());

        if let Some(protected_plan) = &zone.protected {
            let protected =
                private_tier(deployment, &vpc, &nat_gateway, &zone.zone, protected_plan)?;
            protected_subnet_ids.push(protected.subnet.id());
            private_route_table_ids.push(protected.route_table.id());

            let network_acl = deployment.register(
                format!("{}NetworkAcl", protected_plan.logical_name),
                NetworkAclArgs {
                    vpc_id: vpc.id(),
                    subnet_ids: Output::all([protected.subnet.id()]),
                    tags: name_tags(
                        format!("NACL protected subnet {}", zone.index),
                        &[("Network", "NACL Protected")],
                    ),
                },
                ResourceOptions::default(),
            )?;
            deployment.register(
                format!("{}NetworkAclEntryInbound", protected_plan.logical_name),
                NetworkAclRuleArgs::allow_all(network_acl.id(), false),
                ResourceOptions::default(),
            )?;
            deployment.register(
                format!("{}NetworkAclEntryOutbound", protected_plan.logical_name),
                NetworkAclRuleArgs::allow_all(network_acl.id(), true),
                ResourceOptions::default(),
            )?;
        }
    }

    let s3_endpoint = if settings.create_private_subnets() {
        Some(deployment.register(
            "S3VPCEndpoint",
            VpcEndpointArgs {
                vpc_id: vpc.id(),
                service_name: s3_service_name(settings.region()),
                policy: open_endpoint_policy(),
                route_table_ids: Output::all(private_route_table_ids.clone()),
            },
            ResourceOptions::default(),
        )?)
    } else {
        None
    };

    Ok(Registered {
        vpc,
        public_route_table,
        s3_endpoint,
        nat_eips,
        public_subnet_ids,
        private_subnet_ids,
        protected_subnet_ids,
        private_route_table_ids,
    })
}

/// Register the whole topology, wait for it, then export its outputs.
///
/// The first registration or creation failure aborts the build: pending
/// creations are cancelled, nothing is exported and resources already
/// created are left in place.
pub async fn build(
    settings: &NetworkSettings,
    deployment: &Deployment,
) -> GraphResult<ExportedOutputs> {
    let stack_name = deployment.context().qualified_name();
    info!(
        stack = %stack_name,
        region = %settings.region(),
        zones = settings.zone_count(),
        "Building network topology"
    );

    let registered = match register_topology(settings, deployment, &stack_name) {
        Ok(registered) => registered,
        Err(err) => {
            deployment.abort_pending();
            return Err(err);
        }
    };
    let Registered {
        vpc,
        public_route_table,
        s3_endpoint,
        nat_eips,
        public_subnet_ids,
        private_subnet_ids,
        protected_subnet_ids,
        private_route_table_ids,
    } = registered;

    info!(
        resources = deployment.resource_count(),
        "Registered network topology"
    );
    deployment.wait().await?;

    let s3_vpc_endpoint_id = match &s3_endpoint {
        Some(endpoint) => Some(endpoint.id().resolve().await?),
        None => None,
    };

    let outputs = ExportedOutputs {
        vpc_id: vpc.id().resolve().await?,
        vpc_cidr: vpc.string_attribute("cidrBlock").resolve().await?,
        nat_eips: Output::all(nat_eips).resolve().await?,
        public_subnet_ids: Output::all(public_subnet_ids).resolve().await?,
        public_subnet_cidrs: settings.public_subnet_cidrs().to_vec(),
        public_subnet_route_table_id: public_route_table.id().resolve().await?,
        private_subnet_ids: Output::all(private_subnet_ids).resolve().await?,
        private_subnet_cidrs: settings.private_subnet_cidrs().to_vec(),
        protected_subnet_ids: Output::all(protected_subnet_ids).resolve().await?,
        protected_subnet_cidrs: settings.protected_subnet_cidrs().to_vec(),
        private_subnet_route_table_ids: Output::all(private_route_table_ids).resolve().await?,
        s3_vpc_endpoint_id,
    };

    deployment.export_all(outputs.to_map()?).await?;
    info!(vpc = %outputs.vpc_id, "Network topology exported");

    Ok(outputs)
}
