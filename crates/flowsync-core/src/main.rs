use anyhow::Context;
use serde::Serialize;

use flowsync_core::{ApiResult, ExecutionQuery, FlowId, FlowSync, FlowSyncConfig};

fn print<T: Serialize>(result: &ApiResult<T>) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = FlowSyncConfig::load().context("loading configuration")?;
    flowsync_core::init_tracing_with_level(&config.log_level);

    let sync = FlowSync::from_config(&config).context("building HTTP transport")?;
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        [] | ["flows"] => print(&sync.flows().list_flows().await)?,
        ["flow", id] => print(&sync.flows().get_flow(&FlowId::from(*id)).await)?,
        ["public"] => print(&sync.flows().get_public_flows().await)?,
        ["executions", rest @ ..] => {
            let query = rest
                .iter()
                .filter_map(|pair| pair.split_once('='))
                .fold(ExecutionQuery::new(), |query, (key, value)| query.param(key, value));
            print(&sync.executions().list_executions(&query).await)?;
            let recent: Vec<_> = sync.executions().recent_executions().into_iter().map(|e| e.id).collect();
            tracing::info!(?recent, "Most recent executions");
        }
        _ => anyhow::bail!("usage: flowsync [flows | flow <id> | public | executions [key=value ...]]"),
    }

    sync.shutdown().await;
    Ok(())
}
