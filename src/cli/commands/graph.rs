//! Graph command - print the resource dependency graph

use super::CommandContext;
use anyhow::Result;
use basenet::topology;
use clap::Parser;
use serde_json::json;

/// Arguments for the graph command
#[derive(Parser, Debug, Clone)]
pub struct GraphArgs {
    /// Print the creation order instead of DOT
    #[arg(long)]
    pub order: bool,
}

impl GraphArgs {
    /// Execute the graph command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let settings = ctx.resolve_settings().await?;
        let (_engine, deployment) = ctx.preview_deployment();

        topology::build(&settings, &deployment)
            .await
            .map_err(basenet::Error::from)?;
        let graph = deployment.dependency_graph();

        if self.order {
            let order: Vec<String> = graph
                .get_execution_order()
                .map_err(basenet::Error::from)?
                .iter()
                .map(ToString::to_string)
                .collect();

            if ctx.output.is_json() {
                ctx.output.document(&json!({ "order": order }));
            } else {
                ctx.output.list("Creation order", &order);
            }
        } else if ctx.output.is_json() {
            ctx.output.document(&json!({
                "nodes": graph.node_count(),
                "edges": graph.edge_count(),
                "dot": graph.to_dot(),
            }));
        } else {
            ctx.output.raw(&graph.to_dot());
        }

        ctx.output.flush();
        Ok(0)
    }
}
