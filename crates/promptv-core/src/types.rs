//! Core data types for the version store.
//!
//! These are also the persisted record formats (JSON via serde).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An immutable, numbered snapshot of a prompt's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    /// Version number, starting at 1
    pub version: u32,

    /// Full prompt text
    pub content: String,

    /// When this version was committed
    pub created_at: DateTime<Utc>,

    /// Optional commit message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Version {
    pub fn info(&self) -> VersionInfo {
        VersionInfo {
            version: self.version,
            created_at: self.created_at,
            message: self.message.clone(),
            size_bytes: self.content.len(),
            line_count: self.content.lines().count(),
        }
    }
}

/// Version metadata without content, as returned by listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub message: Option<String>,
    pub size_bytes: usize,
    pub line_count: usize,
}

/// A named pointer to one version of one prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub project: String,
    pub prompt: String,
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Per-prompt index record.
///
/// Advisory: the version records are the source of truth, and the manifest
/// is rewritten from them whenever it lags behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptManifest {
    pub project: String,
    pub name: String,
    pub current_version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
