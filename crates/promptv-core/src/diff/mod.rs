//! Line-level diffs between prompt versions.
//!
//! [`compute`] aligns two texts line by line and produces an [`EditScript`].
//! Every output format (side-by-side, unified, structured JSON) is rendered
//! from that one script, so they always agree.

mod lcs;
mod patch;
mod render;

pub use patch::apply_unified;
pub use render::{DiffFormat, RenderOptions, StructuredChange, StructuredDiff};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Kind of a diff operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffTag {
    Equal,
    Insert,
    Delete,
    Replace,
}

impl DiffTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiffTag::Equal => "equal",
            DiffTag::Insert => "insert",
            DiffTag::Delete => "delete",
            DiffTag::Replace => "replace",
        }
    }
}

/// One line of an input text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// 1-based line number in its text
    pub number: usize,

    /// Line content without the terminator
    pub text: String,

    /// Whether the line ended with `\n` (only the last line may not)
    pub newline: bool,
}

/// A single aligned row of the edit script.
///
/// `Equal` and `Replace` carry both lines, `Delete` only `old`, `Insert`
/// only `new`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffOp {
    pub tag: DiffTag,
    pub old: Option<Line>,
    pub new: Option<Line>,
}

/// Line counts per operation kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    pub additions: usize,
    pub deletions: usize,
    pub changes: usize,
    pub unchanged: usize,
}

/// The ordered result of comparing two texts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditScript {
    ops: Vec<DiffOp>,
}

/// Compare two texts line by line.
///
/// Runs of deletions and insertions between two equal lines are paired
/// position by position into replacements; the surplus of the longer side
/// follows as plain deletions or insertions.
pub fn compute(old: &str, new: &str) -> EditScript {
    let old_lines = split_lines(old);
    let new_lines = split_lines(new);

    let keyed_old: Vec<(&str, bool)> = old_lines.iter().map(|l| (l.text.as_str(), l.newline)).collect();
    let keyed_new: Vec<(&str, bool)> = new_lines.iter().map(|l| (l.text.as_str(), l.newline)).collect();
    let steps = lcs::align(&keyed_old, &keyed_new);

    let mut ops = Vec::with_capacity(steps.len());
    let mut deleted = Vec::new();
    let mut inserted = Vec::new();
    for step in steps {
        match step {
            lcs::Step::Delete(i) => deleted.push(old_lines[i].clone()),
            lcs::Step::Insert(j) => inserted.push(new_lines[j].clone()),
            lcs::Step::Equal(i, j) => {
                flush_block(&mut ops, &mut deleted, &mut inserted);
                ops.push(DiffOp {
                    tag: DiffTag::Equal,
                    old: Some(old_lines[i].clone()),
                    new: Some(new_lines[j].clone()),
                });
            }
        }
    }
    flush_block(&mut ops, &mut deleted, &mut inserted);

    EditScript { ops }
}

fn flush_block(ops: &mut Vec<DiffOp>, deleted: &mut Vec<Line>, inserted: &mut Vec<Line>) {
    let paired = deleted.len().min(inserted.len());
    let mut old_rest = deleted.drain(..);
    let mut new_rest = inserted.drain(..);

    for _ in 0..paired {
        ops.push(DiffOp {
            tag: DiffTag::Replace,
            old: old_rest.next(),
            new: new_rest.next(),
        });
    }
    ops.extend(old_rest.map(|line| DiffOp {
        tag: DiffTag::Delete,
        old: Some(line),
        new: None,
    }));
    ops.extend(new_rest.map(|line| DiffOp {
        tag: DiffTag::Insert,
        old: None,
        new: Some(line),
    }));
}

pub(crate) fn split_lines(content: &str) -> Vec<Line> {
    content
        .split_inclusive('\n')
        .enumerate()
        .map(|(index, raw)| {
            let (text, newline) = match raw.strip_suffix('\n') {
                Some(text) => (text, true),
                None => (raw, false),
            };
            Line {
                number: index + 1,
                text: text.to_string(),
                newline,
            }
        })
        .collect()
}

impl EditScript {
    /// Every row, including unchanged lines.
    pub fn ops(&self) -> &[DiffOp] {
        &self.ops
    }

    /// Rows that are not `Equal`.
    pub fn changes(&self) -> impl Iterator<Item = &DiffOp> {
        self.ops.iter().filter(|op| op.tag != DiffTag::Equal)
    }

    pub fn edit_count(&self) -> usize {
        self.changes().count()
    }

    /// True when both texts were identical.
    pub fn is_identity(&self) -> bool {
        self.edit_count() == 0
    }

    pub fn stats(&self) -> DiffStats {
        let mut stats = DiffStats::default();
        for op in &self.ops {
            match op.tag {
                DiffTag::Equal => stats.unchanged += 1,
                DiffTag::Insert => stats.additions += 1,
                DiffTag::Delete => stats.deletions += 1,
                DiffTag::Replace => stats.changes += 1,
            }
        }
        stats
    }

    pub fn render(&self, format: DiffFormat, options: &RenderOptions) -> Result<String> {
        match format {
            DiffFormat::SideBySide => Ok(render::side_by_side(self, options)),
            DiffFormat::Unified => Ok(render::unified(self, options)),
            DiffFormat::Json => render::json(self, options),
        }
    }
}
