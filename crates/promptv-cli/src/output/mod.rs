//! Output formatting helpers for the CLI.
//!
//! This module provides formatting utilities for displaying versions, tags
//! and diffs in various formats (JSON, table, plain text).

mod json;
mod text;

use std::io::IsTerminal;

// Re-export public API
pub use json::{prompt_list_json, tag_json, version_info_json, version_json};
pub use text::{print_diff, print_prompt_list, print_tag, print_tag_list, print_version_list};

/// Output mode determines how results are formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Machine-readable JSON output only
    Json,
    /// Plain text, stable for logs and scripts
    #[default]
    Plain,
    /// Human-friendly with colors and tables (TTY only)
    Pretty,
}

impl OutputMode {
    /// Resolve output mode from flags and environment.
    ///
    /// Routing rules:
    /// 1. `--json` overrides everything
    /// 2. `TERM=dumb` or `NO_COLOR` forces plain
    /// 3. Pretty only when stdout is a TTY
    pub fn resolve(json_flag: bool, is_tty: bool, plain_env: bool) -> Self {
        if json_flag {
            return Self::Json;
        }
        if plain_env {
            return Self::Plain;
        }
        if is_tty {
            Self::Pretty
        } else {
            Self::Plain
        }
    }

    /// Resolve against the real stdout and environment.
    pub fn detect(json_flag: bool) -> Self {
        let term_is_dumb = std::env::var("TERM").is_ok_and(|term| term == "dumb");
        let no_color = std::env::var_os("NO_COLOR").is_some();
        Self::resolve(
            json_flag,
            std::io::stdout().is_terminal(),
            term_is_dumb || no_color,
        )
    }

    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json)
    }

    pub fn is_pretty(&self) -> bool {
        matches!(self, Self::Pretty)
    }
}
