//! # Promptv Core
//!
//! Core library for promptv - local version control for LLM prompts.
//!
//! This crate provides the versioning model, persistence abstractions and
//! diffing independent of the CLI interface.
//!
//! ## Architecture
//!
//! - **store**: Append-only numbered versions per (project, prompt) and
//!   reference resolution
//! - **tags**: Named, immutable pointers to versions
//! - **diff**: Line-level edit scripts with side-by-side, unified and JSON
//!   renderings
//! - **cache**: Time-boxed read-through cache with single-flight loads
//! - **client**: Long-lived handle combining the store and the cache
//! - **storage**: Backend trait with filesystem and in-memory implementations

pub mod cache;
pub mod client;
pub mod clock;
pub mod diff;
pub mod error;
pub mod names;
pub mod storage;
pub mod store;
pub mod tags;
pub mod types;
pub mod variables;

pub use cache::{CacheKey, CacheLayer, CacheStats};
pub use client::PromptClient;
pub use clock::{Clock, ManualClock, SystemClock};
pub use diff::{compute, DiffFormat, DiffTag, EditScript, RenderOptions};
pub use error::{ErrorKind, PromptvError, Result};
pub use storage::{FsBackend, MemoryBackend, RetryPolicy, StorageBackend};
pub use store::VersionStore;
pub use tags::TagRegistry;
pub use types::{PromptManifest, Tag, Version, VersionInfo};
pub use variables::{Renderer, Variables};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
