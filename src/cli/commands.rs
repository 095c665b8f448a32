//! Subcommand execution

use anyhow::{Context, Result};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::args::{Cli, Commands};
use super::console::Console;
use crate::actions::{ActionDispatcher, CloudActionClient, ACTIONS};
use crate::config::GateConfig;
use crate::core::{ActionOutcome, Identity};
use crate::permissions::PermissionPoller;
use crate::transport::{HttpErrorMode, RequestExecutor};

/// Process exit code for an outcome: 0 ok, 2 approval pending, 1 otherwise
pub fn exit_code(outcome: &ActionOutcome) -> u8 {
    match outcome {
        ActionOutcome::Ok { .. } => 0,
        ActionOutcome::PermissionRequired(_) => 2,
        _ => 1,
    }
}

/// Config file (or defaults), then environment, then `--base-url`
pub fn load_config(cli: &Cli) -> Result<GateConfig> {
    let config = match &cli.config {
        Some(path) => GateConfig::from_file(path)?.apply_env(),
        None => GateConfig::from_env(),
    };

    let config = match &cli.base_url {
        Some(url) => config.with_base_url(url.as_str()),
        None => config,
    };
    config.validate()?;
    Ok(config)
}

/// Run the selected subcommand and return the process exit code
pub async fn execute(cli: &Cli) -> Result<u8> {
    let console = Console::new();
    let config = load_config(cli)?;
    tracing::debug!("Using authority at {}", config.base_url);

    match &cli.command {
        Commands::Actions => {
            console.print_actions(ACTIONS);
            Ok(0)
        }
        Commands::Action {
            name,
            payload,
            detail,
        } => {
            let payload = payload
                .as_deref()
                .map(serde_json::from_str::<Value>)
                .transpose()
                .context("--payload is not valid JSON")?;

            let dispatcher = ActionDispatcher::new(&config)?;
            if let Some(identity) = &cli.identity {
                dispatcher.set_identity(identity);
            }

            let outcome = dispatcher.dispatch(name, payload, detail.as_deref()).await;
            console.print_outcome(&outcome);
            Ok(exit_code(&outcome))
        }
        Commands::Cloud { request } => {
            let request: Value =
                serde_json::from_str(request).context("REQUEST_JSON is not valid JSON")?;

            let client = CloudActionClient::new(&config)?;
            if let Some(identity) = &cli.identity {
                client.set_identity(identity);
            }

            let outcome = client.run(request).await;
            console.print_outcome(&outcome);
            Ok(exit_code(&outcome))
        }
        Commands::Wait { id, timeout } => {
            let identity = Arc::new(Identity::from_env(&config.identity_env));
            if let Some(value) = &cli.identity {
                identity.set(value);
            }
            let executor = RequestExecutor::new(
                config.base_url.as_str(),
                config.action_timeout(),
                identity,
                config.identity_header.as_str(),
                HttpErrorMode::Tolerate,
            )?;
            let poller =
                PermissionPoller::new(Arc::new(executor)).with_interval(config.poll_interval());
            let timeout = timeout
                .map(Duration::from_secs)
                .unwrap_or_else(|| config.wait_timeout());

            let cancel = CancellationToken::new();
            let trigger = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    trigger.cancel();
                }
            });

            let outcome = poller.wait_cancellable(id, timeout, &cancel).await;
            console.print_wait(id.trim(), outcome);
            Ok(if outcome.is_approved() { 0 } else { 1 })
        }
    }
}
