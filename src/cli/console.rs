use colored::*;
use serde_json::Value;

use crate::actions::ActionSpec;
use crate::core::ActionOutcome;
use crate::permissions::WaitOutcome;

/// Terminal output for the CLI
///
/// Status lines go to stderr with color; JSON results go to stdout so they
/// can be piped.
pub struct Console {
    ok_color: Color,
    pending_color: Color,
    error_color: Color,
}

impl Console {
    pub fn new() -> Self {
        Self {
            ok_color: Color::Green,
            pending_color: Color::Yellow,
            error_color: Color::Red,
        }
    }

    /// Print a status line and the outcome's JSON
    pub fn print_outcome(&self, outcome: &ActionOutcome) {
        let color = match outcome {
            ActionOutcome::Ok { .. } => self.ok_color,
            ActionOutcome::PermissionRequired(_) => self.pending_color,
            _ => self.error_color,
        };
        eprintln!("{} {}", "Outcome:".bold(), outcome.label().color(color));
        if let ActionOutcome::PermissionRequired(grant) = outcome {
            if grant.has_id() {
                eprintln!(
                    "{}",
                    format!("Approve grant {} and run the action again", grant.id)
                        .color(self.pending_color)
                );
            }
        }
        self.print_json(&outcome.to_json());
    }

    /// Print the result of waiting on a grant
    pub fn print_wait(&self, id: &str, outcome: WaitOutcome) {
        let color = if outcome.is_approved() {
            self.ok_color
        } else {
            self.error_color
        };
        eprintln!("{} {}", "Grant:".bold(), outcome.as_str().color(color));
        self.print_json(&serde_json::json!({"id": id, "status": outcome.as_str()}));
    }

    /// Print the action table
    pub fn print_actions(&self, actions: &[ActionSpec]) {
        for spec in actions {
            let gate = if spec.requires_permission {
                "grant".color(self.pending_color)
            } else {
                "open".color(self.ok_color)
            };
            println!(
                "{:<18} {:<5} {:<18} {}",
                spec.name.bold(),
                spec.method.as_str(),
                spec.path,
                gate
            );
        }
    }

    pub fn print_error(&self, message: &str) {
        eprintln!("{} {}", "Error:".color(self.error_color).bold(), message);
    }

    fn print_json(&self, value: &Value) {
        match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{}", text),
            Err(_) => println!("{}", value),
        }
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}
