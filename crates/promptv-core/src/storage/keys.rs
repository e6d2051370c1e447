//! Storage key layout.
//!
//! ```text
//! prompts/<project>/<prompt>/prompt.json
//! prompts/<project>/<prompt>/versions/<n:010>.json
//! prompts/<project>/<prompt>/tags/<tag>.json
//! ```
//!
//! Version numbers are zero-padded so lexical key order equals numeric order.

const ROOT: &str = "prompts/";
const MANIFEST: &str = "prompt.json";
const VERSIONS: &str = "versions/";
const TAGS: &str = "tags/";
const RECORD_EXT: &str = ".json";

pub fn root_prefix() -> &'static str {
    ROOT
}

pub fn project_prefix(project: &str) -> String {
    format!("{}{}/", ROOT, project)
}

pub fn prompt_prefix(project: &str, name: &str) -> String {
    format!("{}{}/{}/", ROOT, project, name)
}

pub fn manifest_key(project: &str, name: &str) -> String {
    format!("{}{}", prompt_prefix(project, name), MANIFEST)
}

pub fn versions_prefix(project: &str, name: &str) -> String {
    format!("{}{}", prompt_prefix(project, name), VERSIONS)
}

pub fn version_key(project: &str, name: &str, version: u32) -> String {
    format!(
        "{}{:010}{}",
        versions_prefix(project, name),
        version,
        RECORD_EXT
    )
}

pub fn tags_prefix(project: &str, name: &str) -> String {
    format!("{}{}", prompt_prefix(project, name), TAGS)
}

pub fn tag_key(project: &str, name: &str, tag: &str) -> String {
    format!("{}{}{}", tags_prefix(project, name), tag, RECORD_EXT)
}

/// Parse the version number out of a key produced by [`version_key`].
pub fn parse_version_key(prefix: &str, key: &str) -> Option<u32> {
    let file = key.strip_prefix(prefix)?.strip_suffix(RECORD_EXT)?;
    if file.len() != 10 || !file.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    file.parse().ok()
}

/// First path segment below `prefix`, e.g. the prompt name for a key under a
/// project prefix.
pub fn child_segment<'a>(prefix: &str, key: &'a str) -> Option<&'a str> {
    let rest = key.strip_prefix(prefix)?;
    let (segment, remainder) = rest.split_once('/')?;
    if segment.is_empty() || remainder.is_empty() {
        return None;
    }
    Some(segment)
}

/// Whether `key` is a version record directly below a prompt inside
/// `project_prefix`.
pub fn is_version_record(project_prefix: &str, key: &str) -> bool {
    key.strip_prefix(project_prefix)
        .and_then(|rest| rest.split_once('/'))
        .is_some_and(|(_, rest)| rest.starts_with(VERSIONS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_keys_sort_numerically() {
        let k2 = version_key("proj", "p", 2);
        let k10 = version_key("proj", "p", 10);
        assert_eq!(k2, "prompts/proj/p/versions/0000000002.json");
        assert!(k2 < k10);
    }

    #[test]
    fn test_parse_version_key() {
        let prefix = versions_prefix("proj", "p");
        assert_eq!(parse_version_key(&prefix, &version_key("proj", "p", 7)), Some(7));
        assert_eq!(parse_version_key(&prefix, "prompts/proj/p/versions/7.json"), None);
        assert_eq!(parse_version_key(&prefix, "prompts/proj/p/tags/prod.json"), None);
    }

    #[test]
    fn test_child_segment() {
        let prefix = project_prefix("proj");
        assert_eq!(
            child_segment(&prefix, "prompts/proj/greeting/prompt.json"),
            Some("greeting")
        );
        assert_eq!(child_segment(&prefix, "prompts/proj/stray.json"), None);
        assert_eq!(child_segment(root_prefix(), "prompts/proj/p/x.json"), Some("proj"));
    }

    #[test]
    fn test_is_version_record() {
        let prefix = project_prefix("proj");
        assert!(is_version_record(&prefix, &version_key("proj", "p", 1)));
        assert!(!is_version_record(&prefix, &tag_key("proj", "p", "prod")));
        assert!(!is_version_record(&prefix, &manifest_key("proj", "p")));
    }
}
