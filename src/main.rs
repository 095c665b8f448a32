use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use approval_gate::cli::{self, Cli, Console};
use approval_gate::logging::{self, LogConfig};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            Console::new().print_error(&format!("{:#}", e));
            ExitCode::from(1)
        }
    }
}

async fn run(cli: &Cli) -> Result<u8> {
    let mut log_config = LogConfig::default().with_json(cli.json_logs);
    if let Some(dir) = &cli.log_file {
        log_config = log_config.with_log_dir(dir.clone());
    }
    // Held until exit so buffered file logs are flushed
    let _guard = logging::init_logging(&log_config)?;

    tracing::info!("=== approval-gate starting ===");
    let code = cli::execute(cli).await?;
    tracing::info!("=== approval-gate finished (exit {}) ===", code);

    Ok(code)
}
