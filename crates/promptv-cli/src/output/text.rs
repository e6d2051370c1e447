//! Text and table output formatting for versions, tags and diffs.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::{NOTHING, UTF8_FULL};
use comfy_table::{Cell, ContentArrangement, Table};
use owo_colors::OwoColorize;

use promptv_core::{DiffFormat, Tag, VersionInfo};

use super::OutputMode;

const MESSAGE_MAX: usize = 60;

fn new_table(mode: OutputMode, headers: &[&str]) -> Table {
    let mut table = Table::new();
    if mode.is_pretty() {
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS);
    } else {
        table.load_preset(NOTHING);
    }
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(headers.iter().map(|h| Cell::new(*h)).collect::<Vec<_>>());
    table
}

fn truncate(text: &str, max: usize) -> String {
    let first_line = text.lines().next().unwrap_or_default();
    if first_line.chars().count() > max {
        let mut cut: String = first_line.chars().take(max - 1).collect();
        cut.push('…');
        cut
    } else {
        first_line.to_string()
    }
}

pub fn print_version_list(mode: OutputMode, versions: &[VersionInfo]) {
    let mut table = new_table(mode, &["VERSION", "CREATED", "LINES", "BYTES", "MESSAGE"]);
    for info in versions {
        table.add_row(vec![
            info.version.to_string(),
            info.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            info.line_count.to_string(),
            info.size_bytes.to_string(),
            truncate(info.message.as_deref().unwrap_or(""), MESSAGE_MAX),
        ]);
    }
    println!("{}", table);
}

pub fn print_prompt_list(mode: OutputMode, prompts: &[(String, u32)]) {
    let mut table = new_table(mode, &["PROMPT", "LATEST"]);
    for (name, latest) in prompts {
        table.add_row(vec![name.clone(), latest.to_string()]);
    }
    println!("{}", table);
}

pub fn print_tag_list(mode: OutputMode, tags: &[Tag]) {
    let mut table = new_table(mode, &["TAG", "VERSION", "CREATED", "DESCRIPTION"]);
    for tag in tags {
        table.add_row(vec![
            tag.name.clone(),
            tag.version.to_string(),
            tag.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            truncate(tag.description.as_deref().unwrap_or(""), MESSAGE_MAX),
        ]);
    }
    println!("{}", table);
}

pub fn print_tag(tag: &Tag) {
    println!("Tag: {}", tag.name);
    println!("Prompt: {}/{}", tag.project, tag.prompt);
    println!("Version: {}", tag.version);
    println!("Created: {}", tag.created_at);
    if let Some(description) = &tag.description {
        println!("Description: {}", description);
    }
}

/// Print rendered diff output, coloring it in pretty mode.
pub fn print_diff(mode: OutputMode, format: DiffFormat, column_width: usize, rendered: &str) {
    if format == DiffFormat::Json {
        println!("{}", rendered);
        return;
    }
    if !mode.is_pretty() {
        print!("{}", rendered);
        return;
    }
    for (index, line) in rendered.lines().enumerate() {
        println!("{}", color_diff_line(format, column_width, index, line));
    }
}

/// Color one line of side-by-side or unified output.
fn color_diff_line(format: DiffFormat, column_width: usize, index: usize, line: &str) -> String {
    match format {
        DiffFormat::Unified => {
            if line.starts_with("---") || line.starts_with("+++") {
                line.bold().to_string()
            } else if line.starts_with("@@") {
                line.cyan().to_string()
            } else if line.starts_with('+') {
                line.green().to_string()
            } else if line.starts_with('-') {
                line.red().to_string()
            } else {
                line.to_string()
            }
        }
        DiffFormat::SideBySide => {
            if index < 2 {
                return line.bold().to_string();
            }
            match side_by_side_marker(line, column_width) {
                Some("--") => line.red().to_string(),
                Some("++") => line.green().to_string(),
                Some("~~") => line.yellow().to_string(),
                _ => line.to_string(),
            }
        }
        DiffFormat::Json => line.to_string(),
    }
}

/// Marker of a side-by-side row: cells start with a 4-wide line number, a
/// space and the two-character marker. Insert rows have a blank left cell.
fn side_by_side_marker(line: &str, column_width: usize) -> Option<&str> {
    let width = column_width.max(8);
    let left_end = line.char_indices().nth(width).map_or(line.len(), |(i, _)| i);
    let left = &line[..left_end];
    let cell = if left.trim().is_empty() {
        line.get(left_end + 3..)?
    } else {
        left
    };
    cell.get(5..7)
}
