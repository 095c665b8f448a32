//! CLI argument definitions
//!
//! Uses clap derive. One subcommand per entry point of the gate.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// approval-gate - run device and cloud actions behind human approval
#[derive(Parser, Debug)]
#[command(name = "approval-gate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Base URL of the authority and action endpoints
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Identity sent with every request
    #[arg(long, global = true)]
    pub identity: Option<String>,

    /// JSON config file
    #[arg(long, global = true, value_name = "FILE", env = "APPROVAL_GATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Write logs to a daily-rolling file in this directory
    #[arg(long, global = true, value_name = "DIR")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a named device action
    #[command(after_help = "EXAMPLES:
    # Ungated read
    approval-gate action python.status

    # Gated action; prints the pending grant if approval is needed
    approval-gate action shell.exec --payload '{\"cmd\":\"pip\",\"args\":[\"list\"]}'
")]
    Action {
        /// Action name (see `approval-gate actions`)
        name: String,

        /// JSON object sent to the action endpoint
        #[arg(long, value_name = "JSON")]
        payload: Option<String>,

        /// Justification shown to the approver
        #[arg(long)]
        detail: Option<String>,
    },

    /// Send a request through the cloud proxy, waiting for approval if asked
    Cloud {
        /// JSON request object
        #[arg(value_name = "REQUEST_JSON")]
        request: String,
    },

    /// Wait for a decision on a grant
    Wait {
        /// Grant id
        id: String,

        /// Seconds to wait (minimum 1)
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },

    /// List the named actions
    Actions,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_action() {
        let cli = Cli::try_parse_from([
            "approval-gate",
            "--identity",
            "me",
            "action",
            "shell.exec",
            "--payload",
            r#"{"cmd":"uv"}"#,
        ])
        .unwrap();

        assert_eq!(cli.identity.as_deref(), Some("me"));
        match cli.command {
            Commands::Action { name, payload, detail } => {
                assert_eq!(name, "shell.exec");
                assert_eq!(payload.as_deref(), Some(r#"{"cmd":"uv"}"#));
                assert!(detail.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_wait_with_global_flag_after_subcommand() {
        let cli = Cli::try_parse_from([
            "approval-gate",
            "wait",
            "g-1",
            "--timeout",
            "5",
            "--base-url",
            "http://device:8765",
        ])
        .unwrap();

        assert_eq!(cli.base_url.as_deref(), Some("http://device:8765"));
        assert!(matches!(cli.command, Commands::Wait { timeout: Some(5), .. }));
    }
}
