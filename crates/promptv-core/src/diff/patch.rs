//! Applying unified diffs.

use std::iter::Peekable;
use std::str::SplitTerminator;

use super::render::NO_NEWLINE_MARKER;
use super::{split_lines, Line};
use crate::error::{PromptvError, Result};

struct Hunk {
    old_start: usize,
    old_count: usize,
    body: Vec<BodyLine>,
}

struct BodyLine {
    kind: char,
    text: String,
    newline: bool,
}

/// Apply a unified diff, as produced by the `unified` format, to `original`.
///
/// Context and removed lines must match `original` exactly, including
/// whether the last line ends with a newline. An empty patch returns the
/// input unchanged.
pub fn apply_unified(original: &str, patch: &str) -> Result<String> {
    let hunks = parse(patch)?;
    let source = split_lines(original);
    let mut output: Vec<(String, bool)> = Vec::with_capacity(source.len());
    let mut cursor = 0;

    for (index, hunk) in hunks.iter().enumerate() {
        // A side with no lines names the line before the change.
        let target = if hunk.old_count == 0 {
            hunk.old_start
        } else {
            hunk.old_start.saturating_sub(1)
        };
        if target < cursor || target > source.len() {
            return Err(mismatch(index, "hunk is out of order or past the end of the input"));
        }
        output.extend(source[cursor..target].iter().map(|l| (l.text.clone(), l.newline)));
        cursor = target;

        for line in &hunk.body {
            match line.kind {
                '+' => output.push((line.text.clone(), line.newline)),
                kind => {
                    let expected = source.get(cursor).ok_or_else(|| {
                        mismatch(index, "patch expects more lines than the input has")
                    })?;
                    if !matches_line(expected, line) {
                        return Err(mismatch(
                            index,
                            &format!("line {} does not match the patch", expected.number),
                        ));
                    }
                    if kind == ' ' {
                        output.push((line.text.clone(), line.newline));
                    }
                    cursor += 1;
                }
            }
        }
    }
    output.extend(source[cursor..].iter().map(|l| (l.text.clone(), l.newline)));

    let mut result = String::with_capacity(original.len());
    for (text, newline) in output {
        result.push_str(&text);
        if newline {
            result.push('\n');
        }
    }
    Ok(result)
}

fn matches_line(expected: &Line, line: &BodyLine) -> bool {
    expected.text == line.text && expected.newline == line.newline
}

fn mismatch(hunk: usize, detail: &str) -> PromptvError {
    PromptvError::InvalidReference(format!(
        "Patch does not apply: hunk {}: {}",
        hunk + 1,
        detail
    ))
}

fn malformed(detail: impl std::fmt::Display) -> PromptvError {
    PromptvError::InvalidReference(format!("Malformed patch: {}", detail))
}

fn parse(patch: &str) -> Result<Vec<Hunk>> {
    let mut lines = patch.split_terminator('\n').peekable();
    let mut hunks = Vec::new();

    while let Some(line) = lines.next() {
        if line.starts_with("@@") {
            hunks.push(parse_hunk(line, &mut lines)?);
        } else if hunks.is_empty() && (line.starts_with("---") || line.starts_with("+++")) {
            continue;
        } else if !line.trim().is_empty() {
            return Err(malformed(format!("unexpected line '{}'", line)));
        }
    }
    Ok(hunks)
}

fn parse_hunk(header: &str, lines: &mut Peekable<SplitTerminator<'_, char>>) -> Result<Hunk> {
    let mut parts = header.split_whitespace();
    let (old, new) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some("@@"), Some(old), Some(new), Some("@@")) => (old, new),
        _ => return Err(malformed(format!("bad hunk header '{}'", header))),
    };
    let (old_start, old_count) = parse_range(old, '-', header)?;
    let (_, new_count) = parse_range(new, '+', header)?;

    let mut body: Vec<BodyLine> = Vec::new();
    let (mut old_seen, mut new_seen) = (0, 0);
    while old_seen < old_count || new_seen < new_count {
        let raw = lines
            .next()
            .ok_or_else(|| malformed(format!("hunk '{}' is truncated", header)))?;
        if raw == NO_NEWLINE_MARKER {
            mark_no_newline(&mut body, header)?;
            continue;
        }
        let mut chars = raw.chars();
        let kind = chars.next().unwrap_or(' ');
        match kind {
            ' ' => {
                old_seen += 1;
                new_seen += 1;
            }
            '-' => old_seen += 1,
            '+' => new_seen += 1,
            _ => return Err(malformed(format!("unexpected line '{}'", raw))),
        }
        body.push(BodyLine {
            kind,
            text: chars.as_str().to_string(),
            newline: true,
        });
    }
    if old_seen != old_count || new_seen != new_count {
        return Err(malformed(format!("line counts do not match '{}'", header)));
    }
    if lines.peek() == Some(&NO_NEWLINE_MARKER) {
        lines.next();
        mark_no_newline(&mut body, header)?;
    }

    Ok(Hunk {
        old_start,
        old_count,
        body,
    })
}

fn mark_no_newline(body: &mut [BodyLine], header: &str) -> Result<()> {
    let last = body
        .last_mut()
        .ok_or_else(|| malformed(format!("stray end-of-file marker in '{}'", header)))?;
    last.newline = false;
    Ok(())
}

fn parse_range(range: &str, sign: char, header: &str) -> Result<(usize, usize)> {
    let bad = || malformed(format!("bad range '{}' in '{}'", range, header));
    let range = range.strip_prefix(sign).ok_or_else(bad)?;
    let (start, count) = match range.split_once(',') {
        Some((start, count)) => (start, count),
        None => (range, "1"),
    };
    Ok((
        start.parse().map_err(|_| bad())?,
        count.parse().map_err(|_| bad())?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{compute, DiffFormat, RenderOptions};
    use crate::error::ErrorKind;

    fn round_trip(old: &str, new: &str, context: usize) {
        let options = RenderOptions::default().with_context_lines(context);
        let patch = compute(old, new)
            .render(DiffFormat::Unified, &options)
            .unwrap();
        assert_eq!(apply_unified(old, &patch).unwrap(), new, "patch:\n{}", patch);
    }

    #[test]
    fn test_round_trips() {
        let cases = [
            ("", ""),
            ("", "a\nb\n"),
            ("a\nb\n", ""),
            ("only", "only\n"),
            ("only\n", "only"),
            ("Hello {{name}}", "Hi {{name}}!"),
            ("a\nb\nc\nd\ne\nf\ng\nh\n", "a\nB\nc\nd\ne\nf\nG\nh\ni\n"),
            ("x\ny\n", "w\nx\ny\nz"),
        ];
        for (old, new) in cases {
            for context in [0, 1, 3] {
                round_trip(old, new, context);
            }
        }
    }

    #[test]
    fn test_round_trip_long_document() {
        let old: String = (1..=60).map(|i| format!("line {}\n", i)).collect();
        let new: String = (1..=60)
            .filter(|i| i % 17 != 0)
            .map(|i| {
                if i % 11 == 0 {
                    format!("changed {}\n", i)
                } else {
                    format!("line {}\n", i)
                }
            })
            .collect();
        round_trip(&old, &new, 3);
        round_trip(&old, &new, 0);
    }

    #[test]
    fn test_empty_patch_is_identity() {
        assert_eq!(apply_unified("a\nb\n", "").unwrap(), "a\nb\n");
    }

    #[test]
    fn test_mismatched_context_is_rejected() {
        let patch = "--- a\n+++ b\n@@ -1,2 +1,2 @@\n keep\n-old\n+new\n";
        let err = apply_unified("other\nold\n", patch).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidReference);
        assert!(err.to_string().contains("does not apply"));
    }

    #[test]
    fn test_malformed_patches_are_rejected() {
        let truncated = "@@ -1,2 +1,2 @@\n keep\n";
        assert!(apply_unified("keep\nx\n", truncated).is_err());
        assert!(apply_unified("x\n", "@@ nonsense @@\n").is_err());
        assert!(apply_unified("x\n", "garbage\n").is_err());
    }
}
