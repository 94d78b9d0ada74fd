//! Output formatting module for awplus
//!
//! Colored human output, and structured messages on stderr for the machine formats.

use colored::Colorize;
use std::io::{self, Write};

/// Output formatter for different output modes
pub struct OutputFormatter {
    /// Use colored output
    use_color: bool,
    /// Machine-readable output mode (json or yaml); decorations are suppressed
    machine_mode: bool,
    /// Verbosity level
    verbosity: u8,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(use_color: bool, machine_mode: bool, verbosity: u8) -> Self {
        Self {
            use_color,
            machine_mode,
            verbosity,
        }
    }

    /// Print a banner/header
    pub fn banner(&self, title: &str) {
        if self.machine_mode {
            return;
        }

        let line = "=".repeat(title.len() + 4);
        if self.use_color {
            println!("\n{}", line.bright_blue());
            println!("{}", format!("  {}  ", title).bright_blue().bold());
            println!("{}\n", line.bright_blue());
        } else {
            println!("\n{}", line);
            println!("  {}  ", title);
            println!("{}\n", line);
        }
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        if self.machine_mode {
            return;
        }

        if self.use_color {
            println!("\n{}", title.cyan().bold());
            println!("{}", "-".repeat(title.len()).cyan());
        } else {
            println!("\n{}", title);
            println!("{}", "-".repeat(title.len()));
        }
    }

    /// Print the module status line
    pub fn status(&self, module: &str, changed: bool, message: &str) {
        if self.machine_mode {
            return;
        }

        let status = match (changed, self.use_color) {
            (true, true) => "changed".yellow().to_string(),
            (true, false) => "changed".to_string(),
            (false, true) => "ok".green().to_string(),
            (false, false) => "ok".to_string(),
        };
        let module = if self.use_color {
            module.bright_white().bold().to_string()
        } else {
            module.to_string()
        };
        println!("{}: [{}] => {}", status, module, message);
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.machine_mode {
            let err = serde_json::json!({
                "type": "error",
                "message": message
            });
            eprintln!("{}", err);
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "ERROR:".red().bold(), message);
        } else {
            eprintln!("ERROR: {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.machine_mode {
            let warn = serde_json::json!({
                "type": "warning",
                "message": message
            });
            eprintln!("{}", warn);
            return;
        }

        if self.use_color {
            eprintln!("{} {}", "WARNING:".yellow().bold(), message);
        } else {
            eprintln!("WARNING: {}", message);
        }
    }

    /// Print an info message (respects verbosity)
    pub fn info(&self, message: &str) {
        if self.verbosity < 1 || self.machine_mode {
            return;
        }

        if self.use_color {
            println!("{} {}", "INFO:".blue(), message);
        } else {
            println!("INFO: {}", message);
        }
    }

    /// Print a debug message (requires higher verbosity)
    pub fn debug(&self, message: &str) {
        if self.verbosity < 2 || self.machine_mode {
            return;
        }

        if self.use_color {
            println!("{} {}", "DEBUG:".magenta(), message);
        } else {
            println!("DEBUG: {}", message);
        }
    }

    /// Print a unified diff, coloring added and removed lines
    pub fn diff(&self, details: &str) {
        if self.machine_mode {
            return;
        }

        println!();
        for line in details.lines() {
            if !self.use_color {
                println!("{}", line);
            } else if line.starts_with("+++") || line.starts_with("---") {
                println!("{}", line.bold());
            } else if line.starts_with('+') {
                println!("{}", line.green());
            } else if line.starts_with('-') {
                println!("{}", line.red());
            } else if line.starts_with("@@") {
                println!("{}", line.cyan());
            } else {
                println!("{}", line);
            }
        }
    }

    /// Print the command list of one invocation
    pub fn commands(&self, commands: &[String]) {
        if self.machine_mode {
            return;
        }

        if commands.is_empty() {
            println!("  (no commands)");
            return;
        }
        for command in commands {
            if self.use_color {
                println!("  {}", command.yellow());
            } else {
                println!("  {}", command);
            }
        }
    }

    /// Print a list of items
    pub fn list(&self, title: &str, items: &[String]) {
        if self.machine_mode {
            return;
        }

        if self.use_color {
            println!("\n{}:", title.bright_white().bold());
        } else {
            println!("\n{}:", title);
        }

        for item in items {
            if self.use_color {
                println!("  {} {}", "-".bright_black(), item);
            } else {
                println!("  - {}", item);
            }
        }
    }

    /// Flush stdout
    pub fn flush(&self) {
        let _ = io::stdout().flush();
    }
}
