//! Output formatting for the CLI.
//!
//! Everything goes to stderr; stdout is reserved for rendered documents.

use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};

/// Output handler for CLI messages.
#[derive(Clone)]
pub struct Output {
    verbose: bool,
    json: bool,
    term: Term,
}

impl Output {
    /// Create a new output handler.
    pub fn new(verbose: bool, json: bool) -> Self {
        Self {
            verbose,
            json,
            term: Term::stderr(),
        }
    }

    fn line(&self, line: &str) {
        // stderr went away; nothing left to report to
        let _ = self.term.write_line(line);
    }

    /// Print an info message.
    pub fn info(&self, msg: &str) {
        if self.json {
            return;
        }
        self.line(&format!("{} {}", style("ℹ").blue(), msg));
    }

    /// Print a success message.
    pub fn success(&self, msg: &str) {
        if self.json {
            return;
        }
        self.line(&format!("{} {}", style("✓").green(), msg));
    }

    /// Print a warning message.
    pub fn warn(&self, msg: &str) {
        if self.json {
            return;
        }
        self.line(&format!("{} {}", style("⚠").yellow(), msg));
    }

    /// Print an error message.
    pub fn error(&self, msg: &str) {
        if self.json {
            self.line(&error_json(msg));
            return;
        }
        self.line(&format!("{} {}", style("✗").red(), style(msg).red()));
    }

    /// Print a debug message (only in verbose mode).
    pub fn debug(&self, msg: &str) {
        if !self.verbose || self.json {
            return;
        }
        self.line(&format!("{} {}", style("→").dim(), style(msg).dim()));
    }

    /// Print a key-value pair.
    pub fn kv(&self, key: &str, value: &str) {
        if self.json {
            return;
        }
        self.line(&format!("  {}: {}", style(key).dim(), value));
    }

    /// Create a spinner for indeterminate progress.
    pub fn spinner(&self, msg: &str) -> ProgressBar {
        if self.json || !self.term.is_term() {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(template);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }

    /// Check if verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Machine-readable error line.
fn error_json(msg: &str) -> String {
    serde_json::json!({ "error": msg }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_json_escapes() {
        let line = error_json(r#"could not load manifest at "x.json""#);
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();

        assert_eq!(value["error"], r#"could not load manifest at "x.json""#);
    }

    #[test]
    fn test_json_mode_hides_spinner() {
        let output = Output::new(false, true);

        assert!(output.spinner("working").is_hidden());
    }
}
