//! Preview command - build the topology against the in-memory engine

use super::CommandContext;
use anyhow::Result;
use basenet::topology;
use clap::Parser;
use serde_json::json;

/// Arguments for the preview command
#[derive(Parser, Debug, Clone)]
pub struct PreviewArgs {
    /// List every created resource with its identifier
    #[arg(long)]
    pub resources: bool,
}

impl PreviewArgs {
    /// Execute the preview command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let settings = ctx.resolve_settings().await?;
        if !settings.create_private_subnets() {
            ctx.output
                .warning("Private subnets are disabled: no NAT gateways or S3 endpoint");
        }
        let (engine, deployment) = ctx.preview_deployment();

        let outputs = topology::build(&settings, &deployment)
            .await
            .map_err(basenet::Error::from)?;
        let counts = deployment.dependency_graph().count_by_type();

        if ctx.output.is_json() {
            let counts: serde_json::Map<String, serde_json::Value> = counts
                .iter()
                .map(|(resource_type, count)| (resource_type.token().to_string(), json!(count)))
                .collect();
            ctx.output.document(&json!({
                "stack": deployment.context().qualified_name(),
                "resources": counts,
                "outputs": engine.exports(),
            }));
            return Ok(0);
        }

        ctx.output.banner("PREVIEW");
        ctx.output.info(&format!(
            "{} resources in {} zones",
            deployment.resource_count(),
            settings.zone_count()
        ));

        ctx.output.section("Resources");
        let rows: Vec<Vec<String>> = counts
            .iter()
            .map(|(resource_type, count)| vec![resource_type.token().to_string(), count.to_string()])
            .collect();
        ctx.output.table(&["Type", "Count"], &rows);

        if self.resources {
            let items: Vec<String> = engine
                .created()
                .iter()
                .map(|(request, state)| format!("{} => {}", request.urn, state.id))
                .collect();
            ctx.output.list("Created", &items);
        }

        ctx.output.section("Outputs");
        for (name, value) in outputs.to_map()? {
            let rendered = match value {
                serde_json::Value::String(text) => text,
                other => other.to_string(),
            };
            ctx.output.field(&name, &rendered);
        }

        ctx.output.flush();
        Ok(0)
    }
}
