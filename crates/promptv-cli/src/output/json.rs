//! JSON output formatting for versions and tags.

use promptv_core::{Tag, Version, VersionInfo};

/// Convert a version to JSON for output.
pub fn version_json(project: &str, name: &str, version: &Version) -> serde_json::Value {
    serde_json::json!({
        "project": project,
        "prompt": name,
        "version": version.version,
        "content": version.content,
        "message": version.message,
        "created_at": version.created_at,
    })
}

pub fn version_info_json(info: &VersionInfo) -> serde_json::Value {
    serde_json::json!({
        "version": info.version,
        "created_at": info.created_at,
        "message": info.message,
        "size_bytes": info.size_bytes,
        "line_count": info.line_count,
    })
}

pub fn tag_json(tag: &Tag) -> serde_json::Value {
    serde_json::json!({
        "name": tag.name,
        "project": tag.project,
        "prompt": tag.prompt,
        "version": tag.version,
        "description": tag.description,
        "created_at": tag.created_at,
    })
}

pub fn prompt_list_json(project: &str, prompts: &[(String, u32)]) -> serde_json::Value {
    let prompts: Vec<serde_json::Value> = prompts
        .iter()
        .map(|(name, latest)| serde_json::json!({ "name": name, "latest_version": latest }))
        .collect();
    serde_json::json!({ "project": project, "prompts": prompts })
}
