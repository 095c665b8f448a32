//! Command-line front end
//!
//! - `args` - clap definitions
//! - `commands` - subcommand execution and exit codes
//! - `console` - colored terminal output

mod args;
mod commands;
mod console;

pub use args::{Cli, Commands};
pub use commands::{execute, exit_code, load_config};
pub use console::Console;
