//! Text and JSON renderings of an [`EditScript`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{DiffOp, DiffStats, DiffTag, EditScript, Line};
use crate::error::{PromptvError, Result};

pub(crate) const NO_NEWLINE_MARKER: &str = "\\ No newline at end of file";

/// Output format for [`EditScript::render`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiffFormat {
    #[default]
    SideBySide,
    Unified,
    Json,
}

impl FromStr for DiffFormat {
    type Err = PromptvError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "side-by-side" => Ok(DiffFormat::SideBySide),
            "unified" => Ok(DiffFormat::Unified),
            "json" | "structured" => Ok(DiffFormat::Json),
            other => Err(PromptvError::InvalidReference(format!(
                "Unknown diff format '{}': expected side-by-side, unified or json",
                other
            ))),
        }
    }
}

impl fmt::Display for DiffFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiffFormat::SideBySide => "side-by-side",
            DiffFormat::Unified => "unified",
            DiffFormat::Json => "json",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub label_a: String,
    pub label_b: String,
    /// Unchanged lines shown around each change in unified output
    pub context_lines: usize,
    /// Width of each side-by-side column, in characters
    pub column_width: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            label_a: "a".to_string(),
            label_b: "b".to_string(),
            context_lines: 3,
            column_width: 50,
        }
    }
}

impl RenderOptions {
    pub fn with_labels(mut self, label_a: impl Into<String>, label_b: impl Into<String>) -> Self {
        self.label_a = label_a.into();
        self.label_b = label_b.into();
        self
    }

    pub fn with_context_lines(mut self, context_lines: usize) -> Self {
        self.context_lines = context_lines;
        self
    }

    pub fn with_column_width(mut self, column_width: usize) -> Self {
        self.column_width = column_width;
        self
    }
}

/// Machine-readable diff, serialized by the `json` format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredDiff {
    pub label_a: String,
    pub label_b: String,
    pub changes: Vec<StructuredChange>,
    pub stats: DiffStats,
}

/// One row of a [`StructuredDiff`].
///
/// `text` is the old line for deletions, replacements and unchanged lines and
/// the new line for insertions. Replacements carry the new line in
/// `new_text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredChange {
    pub operation: DiffTag,
    pub old_line: Option<usize>,
    pub new_line: Option<usize>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_text: Option<String>,
}

impl StructuredDiff {
    pub fn from_script(script: &EditScript, options: &RenderOptions) -> Self {
        let changes = script
            .ops()
            .iter()
            .map(|op| {
                let old_text = op.old.as_ref().map(|l| l.text.clone());
                let new_text = op.new.as_ref().map(|l| l.text.clone());
                let (text, new_text) = match op.tag {
                    DiffTag::Insert => (new_text.unwrap_or_default(), None),
                    DiffTag::Replace => (old_text.unwrap_or_default(), new_text),
                    DiffTag::Equal | DiffTag::Delete => (old_text.unwrap_or_default(), None),
                };
                StructuredChange {
                    operation: op.tag,
                    old_line: op.old.as_ref().map(|l| l.number),
                    new_line: op.new.as_ref().map(|l| l.number),
                    text,
                    new_text,
                }
            })
            .collect();

        Self {
            label_a: options.label_a.clone(),
            label_b: options.label_b.clone(),
            changes,
            stats: script.stats(),
        }
    }
}

pub(crate) fn json(script: &EditScript, options: &RenderOptions) -> Result<String> {
    Ok(serde_json::to_string_pretty(&StructuredDiff::from_script(
        script, options,
    ))?)
}

// --- Side by side ---

pub(crate) fn side_by_side(script: &EditScript, options: &RenderOptions) -> String {
    let width = options.column_width.max(8);
    let mut out = String::new();

    push_row(&mut out, &fit(&options.label_a, width), &options.label_b);
    push_row(&mut out, &"-".repeat(width), &"-".repeat(width));

    for op in script.ops() {
        let marker = match op.tag {
            DiffTag::Equal => "  ",
            DiffTag::Delete => "--",
            DiffTag::Insert => "++",
            DiffTag::Replace => "~~",
        };
        let left = match &op.old {
            Some(line) => cell(line, marker, width),
            None => " ".repeat(width),
        };
        let right = match &op.new {
            Some(line) => cell(line, marker, width),
            None => String::new(),
        };
        push_row(&mut out, &left, &right);
    }
    out
}

fn cell(line: &Line, marker: &str, width: usize) -> String {
    fit(&format!("{:>4} {} {}", line.number, marker, line.text), width)
}

/// Pad or truncate to exactly `width` characters.
fn fit(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count > width {
        let mut cut: String = text.chars().take(width - 1).collect();
        cut.push('…');
        cut
    } else {
        format!("{}{}", text, " ".repeat(width - count))
    }
}

fn push_row(out: &mut String, left: &str, right: &str) {
    let row = format!("{} | {}", left, right);
    out.push_str(row.trim_end());
    out.push('\n');
}

// --- Unified ---

pub(crate) fn unified(script: &EditScript, options: &RenderOptions) -> String {
    let ops = script.ops();
    let runs = change_runs(ops);
    if runs.is_empty() {
        return String::new();
    }

    let mut out = format!("--- {}\n+++ {}\n", options.label_a, options.label_b);
    let context = options.context_lines;

    let mut index = 0;
    while index < runs.len() {
        let first = runs[index];
        let mut last = first;
        index += 1;
        while index < runs.len() && runs[index].0 - last.1 <= 2 * context {
            last = runs[index];
            index += 1;
        }

        let start = first.0.saturating_sub(context);
        let end = (last.1 + context).min(ops.len());
        push_hunk(&mut out, ops, start, end);
    }
    out
}

/// Maximal `[start, end)` ranges of consecutive non-equal ops.
fn change_runs(ops: &[DiffOp]) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut open: Option<usize> = None;
    for (index, op) in ops.iter().enumerate() {
        match (op.tag == DiffTag::Equal, open) {
            (false, None) => open = Some(index),
            (true, Some(start)) => {
                runs.push((start, index));
                open = None;
            }
            _ => {}
        }
    }
    if let Some(start) = open {
        runs.push((start, ops.len()));
    }
    runs
}

fn push_hunk(out: &mut String, ops: &[DiffOp], start: usize, end: usize) {
    let hunk = &ops[start..end];
    let old_before = ops[..start].iter().filter(|op| op.old.is_some()).count();
    let new_before = ops[..start].iter().filter(|op| op.new.is_some()).count();
    let old_count = hunk.iter().filter(|op| op.old.is_some()).count();
    let new_count = hunk.iter().filter(|op| op.new.is_some()).count();

    // A side with no lines reports the line before the hunk.
    let old_start = if old_count == 0 { old_before } else { old_before + 1 };
    let new_start = if new_count == 0 { new_before } else { new_before + 1 };
    out.push_str(&format!(
        "@@ -{},{} +{},{} @@\n",
        old_start, old_count, new_start, new_count
    ));

    let mut position = 0;
    while position < hunk.len() {
        if hunk[position].tag == DiffTag::Equal {
            if let Some(line) = &hunk[position].old {
                push_line(out, ' ', line);
            }
            position += 1;
            continue;
        }

        let block_end = hunk[position..]
            .iter()
            .position(|op| op.tag == DiffTag::Equal)
            .map_or(hunk.len(), |offset| position + offset);
        let block = &hunk[position..block_end];
        for line in block.iter().filter_map(|op| op.old.as_ref()) {
            push_line(out, '-', line);
        }
        for line in block.iter().filter_map(|op| op.new.as_ref()) {
            push_line(out, '+', line);
        }
        position = block_end;
    }
}

fn push_line(out: &mut String, prefix: char, line: &Line) {
    out.push(prefix);
    out.push_str(&line.text);
    out.push('\n');
    if !line.newline {
        out.push_str(NO_NEWLINE_MARKER);
        out.push('\n');
    }
}
