//! Colored output helpers for CLI
//!
//! Every user-facing line the `tickerwise` binary prints goes through
//! [`Output`], so `--no-color` switches the whole surface to plain tags.

use crate::workflows::{StepResult, StepStatus};
use owo_colors::OwoColorize;

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    pub fn new() -> Self {
        Self { colored: true }
    }

    pub fn no_color() -> Self {
        Self { colored: false }
    }

    pub fn banner(&self) {
        let version = format!("v{}", env!("CARGO_PKG_VERSION"));
        if self.colored {
            println!(
                "\n   {} {}\n   {}\n",
                "tickerwise".bright_cyan().bold(),
                version.dimmed(),
                "Stock analysis reports from a sequential agent pipeline".bright_white()
            );
        } else {
            println!(
                "\n   tickerwise {}\n   Stock analysis reports from a sequential agent pipeline\n",
                version
            );
        }
    }

    /// Print a success message with a checkmark
    pub fn success(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "✓".green().bold(), message.green());
        } else {
            println!("  [OK] {}", message);
        }
    }

    pub fn info(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "•".blue(), message);
        } else {
            println!("  [INFO] {}", message);
        }
    }

    pub fn warning(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            println!("  [WARN] {}", message);
        }
    }

    /// Print an error message to stderr
    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("  [ERROR] {}", message);
        }
    }

    /// Print a step message (for multi-step operations)
    pub fn step(&self, step_num: usize, total: usize, message: &str) {
        if self.colored {
            println!(
                "  {} {}",
                format!("[{}/{}]", step_num, total).dimmed(),
                message.bright_white()
            );
        } else {
            println!("  [{}/{}] {}", step_num, total, message);
        }
    }

    /// One line summarizing a finished pipeline step
    pub fn step_result(&self, result: &StepResult) {
        let detail = format!(
            "{} tool call(s), {} iteration(s)",
            result.tool_calls, result.iterations
        );
        match (result.status, self.colored) {
            (StepStatus::Completed, true) => println!(
                "  {} {} {}",
                "✓".green().bold(),
                result.step.bright_white(),
                detail.dimmed()
            ),
            (StepStatus::Failed, true) => println!(
                "  {} {} {}",
                "✗".red().bold(),
                result.step.red(),
                detail.dimmed()
            ),
            (StepStatus::Completed, false) => println!("  [OK] {} ({})", result.step, detail),
            (StepStatus::Failed, false) => println!("  [FAILED] {} ({})", result.step, detail),
        }
    }

    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    pub fn subheader(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.cyan().bold());
        } else {
            println!("\n  --- {} ---", title);
        }
    }

    /// Print a key-value pair
    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    /// Print a multi-line body (report, step output) unindented and uncolored
    pub fn block(&self, text: &str) {
        println!("\n{}\n", text.trim_end());
    }

    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {} {}", "›".dimmed(), message.dimmed().italic());
        } else {
            println!("\n  [TIP] {}", message);
        }
    }
}
