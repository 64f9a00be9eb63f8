//! Settings command - print the resolved network settings

use super::CommandContext;
use anyhow::Result;
use clap::Parser;

/// Arguments for the settings command
#[derive(Parser, Debug, Clone)]
pub struct SettingsArgs {
    /// Also print the tags of every subnet
    #[arg(long)]
    pub tags: bool,
}

impl SettingsArgs {
    /// Execute the settings command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let settings = ctx.resolve_settings().await?;

        if ctx.output.is_json() {
            ctx.output.document(&serde_json::to_value(&settings)?);
            return Ok(0);
        }

        ctx.output.banner("NETWORK SETTINGS");
        ctx.output.field("Stack", &ctx.config.stack_context().qualified_name());
        ctx.output.field("Region", settings.region());
        ctx.output.field("VPC CIDR", settings.vpc_cidr());
        ctx.output.field("VPC tenancy", settings.vpc_tenancy());
        ctx.output.field(
            "Private subnets",
            &settings.create_private_subnets().to_string(),
        );
        ctx.output.field(
            "Protected subnets",
            &settings.create_protected_subnets().to_string(),
        );

        ctx.output.section("Subnets");
        let rows: Vec<Vec<String>> = settings
            .zones()
            .iter()
            .flat_map(|zone| {
                zone.subnets().map(move |subnet| {
                    vec![
                        zone.zone.clone(),
                        subnet.logical_name.clone(),
                        subnet.role.to_string(),
                        subnet.cidr.clone(),
                    ]
                })
            })
            .collect();
        ctx.output.table(&["Zone", "Subnet", "Role", "CIDR"], &rows);

        if self.tags {
            for subnet in settings.zones().iter().flat_map(|zone| zone.subnets()) {
                let items: Vec<String> = subnet
                    .tags
                    .iter()
                    .map(|(key, value)| format!("{}={}", key, value))
                    .collect();
                ctx.output.list(&subnet.logical_name, &items);
            }
        }

        ctx.output.flush();
        Ok(0)
    }
}
