//! The version store: append-only, numbered versions per (project, prompt).
//!
//! A commit is a single create-only write of the version record; that write
//! is the commit point. The per-prompt manifest written afterwards is an
//! advisory index. Reads trust the version records, rewrite a manifest that
//! lags behind them, and refuse to guess when the records themselves are
//! inconsistent.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::clock::{Clock, SystemClock};
use crate::error::{PromptvError, Result};
use crate::names::{self, LATEST};
use crate::storage::keys;
use crate::storage::{FsBackend, MemoryBackend, RetryPolicy, StorageBackend};
use crate::tags::TagRegistry;
use crate::types::{PromptManifest, Version, VersionInfo};

/// How many times a commit recomputes its version number after losing a race
/// for it before giving up.
const DEFAULT_COMMIT_ATTEMPTS: u32 = 8;

/// Handle to a prompt store. Construct once and pass it to every operation.
pub struct VersionStore {
    backend: Arc<dyn StorageBackend>,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
    commit_attempts: u32,
}

impl VersionStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            clock: Arc::new(SystemClock),
            retry: RetryPolicy::default(),
            commit_attempts: DEFAULT_COMMIT_ATTEMPTS,
        }
    }

    /// Store rooted at a directory on the local filesystem.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FsBackend::new(root)))
    }

    /// Store that lives only as long as this handle.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_commit_attempts(mut self, attempts: u32) -> Self {
        self.commit_attempts = attempts.max(1);
        self
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Tag operations scoped to this store.
    pub fn tags(&self) -> TagRegistry<'_> {
        TagRegistry::new(self)
    }

    // --- Version operations ---

    /// Append a new version and return it.
    ///
    /// The new number is one past the highest existing version, or 1 for a
    /// new prompt. If a concurrent writer claims that number first, the
    /// number is recomputed; after too many lost races the commit fails with
    /// `ConcurrencyConflict` and nothing is written.
    pub fn commit(
        &self,
        project: &str,
        name: &str,
        content: &str,
        message: Option<&str>,
    ) -> Result<Version> {
        names::validate_project(project)?;
        names::validate_prompt(name)?;

        for attempt in 1..=self.commit_attempts {
            let numbers = self.version_numbers(project, name)?;
            let next = match numbers.last() {
                Some(last) => last.checked_add(1).ok_or_else(|| {
                    PromptvError::ConcurrencyConflict(format!(
                        "Version numbers exhausted for prompt '{}/{}'",
                        project, name
                    ))
                })?,
                None => 1,
            };
            let version = Version {
                version: next,
                content: content.to_string(),
                created_at: self.clock.now(),
                message: message.map(str::to_string),
            };

            if self.write_record_new(&keys::version_key(project, name, next), &version)? {
                self.record_commit(project, name, &version);
                tracing::info!(project, prompt = name, version = next, "committed version");
                return Ok(version);
            }
            tracing::debug!(
                project,
                prompt = name,
                version = next,
                attempt,
                "version number claimed concurrently, retrying"
            );
        }

        Err(PromptvError::ConcurrencyConflict(format!(
            "Could not claim a version number for prompt '{}/{}' after {} attempts",
            project, name, self.commit_attempts
        )))
    }

    /// Resolve `reference` and load that version.
    pub fn get(&self, project: &str, name: &str, reference: &str) -> Result<Version> {
        let number = self.resolve(project, name, reference)?;
        self.load_version(project, name, number)
    }

    /// Resolve a reference to a version number.
    ///
    /// Order: exact tag name, then integer, then `latest`. A well-formed tag
    /// name with no matching tag is `NotFound`; anything else unrecognised is
    /// `InvalidReference`. References that can never name a tag skip the tag
    /// lookup.
    pub fn resolve(&self, project: &str, name: &str, reference: &str) -> Result<u32> {
        let latest = self.latest_version(project, name)?;

        if names::is_valid_tag_name(reference) {
            if let Some(tag) = self.tags().find(project, name, reference)? {
                if tag.version == 0 || tag.version > latest {
                    return Err(PromptvError::ConcurrencyConflict(format!(
                        "Tag '{}' of prompt '{}/{}' points at version {}, but the latest version is {}",
                        reference, project, name, tag.version, latest
                    )));
                }
                tracing::debug!(project, prompt = name, tag = reference, version = tag.version, "resolved tag");
                return Ok(tag.version);
            }
        }

        if names::looks_like_number(reference) {
            return match reference.parse::<u32>() {
                Ok(number) if (1..=latest).contains(&number) => Ok(number),
                _ => Err(PromptvError::NotFound(format!(
                    "Version '{}' not found for prompt '{}/{}' (latest is {})",
                    reference, project, name, latest
                ))),
            };
        }

        if reference == LATEST {
            return Ok(latest);
        }

        if names::is_valid_tag_name(reference) {
            return Err(PromptvError::NotFound(format!(
                "Tag '{}' not found for prompt '{}/{}'",
                reference, project, name
            )));
        }

        Err(PromptvError::InvalidReference(format!(
            "'{}' is not a version number, 'latest', or a tag name",
            reference
        )))
    }

    /// Version metadata, ascending by number.
    pub fn list(&self, project: &str, name: &str) -> Result<Vec<VersionInfo>> {
        let latest = self.latest_version(project, name)?;
        (1..=latest)
            .map(|number| self.load_version(project, name, number).map(|v| v.info()))
            .collect()
    }

    /// Delete a prompt with all of its versions and tags.
    pub fn remove(&self, project: &str, name: &str) -> Result<()> {
        names::validate_project(project)?;
        names::validate_prompt(name)?;

        let prefix = keys::prompt_prefix(project, name);
        if self.list_keys(&prefix)?.is_empty() {
            return Err(Self::prompt_not_found(project, name));
        }
        self.delete_key(&prefix)?;
        tracing::info!(project, prompt = name, "removed prompt");
        Ok(())
    }

    /// Highest committed version number. `NotFound` if the prompt has none.
    pub fn latest_version(&self, project: &str, name: &str) -> Result<u32> {
        Ok(self.require_manifest(project, name)?.current_version)
    }

    pub fn exists(&self, project: &str, name: &str) -> Result<bool> {
        names::validate_project(project)?;
        names::validate_prompt(name)?;
        Ok(self.manifest_state(project, name)?.is_some())
    }

    /// The prompt's manifest, reconciled against its version records.
    pub fn manifest(&self, project: &str, name: &str) -> Result<PromptManifest> {
        self.require_manifest(project, name)
    }

    /// Names of prompts in `project` that have at least one version, sorted.
    pub fn list_prompts(&self, project: &str) -> Result<Vec<String>> {
        names::validate_project(project)?;
        let prefix = keys::project_prefix(project);
        let found = self.list_keys(&prefix)?;
        let prompts: BTreeSet<String> = found
            .iter()
            .filter(|key| keys::is_version_record(&prefix, key))
            .filter_map(|key| keys::child_segment(&prefix, key))
            .map(str::to_string)
            .collect();
        Ok(prompts.into_iter().collect())
    }

    /// Names of projects that contain at least one prompt, sorted.
    pub fn list_projects(&self) -> Result<Vec<String>> {
        let root = keys::root_prefix();
        let found = self.list_keys(root)?;
        let projects: BTreeSet<String> = found
            .iter()
            .filter_map(|key| {
                let project = keys::child_segment(root, key)?;
                keys::is_version_record(&keys::project_prefix(project), key)
                    .then(|| project.to_string())
            })
            .collect();
        Ok(projects.into_iter().collect())
    }

    // --- Record helpers shared with the tag registry ---

    pub(crate) fn read_record<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.retry.run("read", || self.backend.read(key))? {
            Some(bytes) => serde_json::from_slice(&bytes).map(Some).map_err(|e| {
                PromptvError::storage(format!("Malformed record '{}': {}", key, e))
            }),
            None => Ok(None),
        }
    }

    pub(crate) fn write_record<T: Serialize>(&self, key: &str, record: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(record)?;
        self.retry.run("write", || self.backend.write(key, &bytes))
    }

    pub(crate) fn write_record_new<T: Serialize>(&self, key: &str, record: &T) -> Result<bool> {
        let bytes = serde_json::to_vec_pretty(record)?;
        self.retry.run("write_new", || self.backend.write_new(key, &bytes))
    }

    pub(crate) fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        self.retry.run("list", || self.backend.list(prefix))
    }

    pub(crate) fn delete_key(&self, key: &str) -> Result<()> {
        self.retry.run("delete", || self.backend.delete(key))
    }

    /// Version record if present, without consulting the manifest.
    pub(crate) fn find_version(
        &self,
        project: &str,
        name: &str,
        number: u32,
    ) -> Result<Option<Version>> {
        self.read_record(&keys::version_key(project, name, number))
    }

    pub(crate) fn prompt_not_found(project: &str, name: &str) -> PromptvError {
        PromptvError::NotFound(format!("Prompt '{}/{}' not found", project, name))
    }

    // --- Internals ---

    fn load_version(&self, project: &str, name: &str, number: u32) -> Result<Version> {
        let key = keys::version_key(project, name, number);
        let version: Version = self.read_record(&key)?.ok_or_else(|| {
            PromptvError::NotFound(format!(
                "Version {} not found for prompt '{}/{}'",
                number, project, name
            ))
        })?;
        if version.version != number {
            return Err(PromptvError::ConcurrencyConflict(format!(
                "Record '{}' claims to be version {}",
                key, version.version
            )));
        }
        Ok(version)
    }

    /// Committed version numbers, verified to be exactly `1..=n`.
    fn version_numbers(&self, project: &str, name: &str) -> Result<Vec<u32>> {
        let prefix = keys::versions_prefix(project, name);
        let mut numbers = Vec::new();
        for key in self.list_keys(&prefix)? {
            let number = keys::parse_version_key(&prefix, &key).ok_or_else(|| {
                PromptvError::ConcurrencyConflict(format!("Unexpected version record '{}'", key))
            })?;
            numbers.push(number);
        }
        numbers.sort_unstable();

        for (expected, actual) in (1u32..).zip(numbers.iter()) {
            if *actual != expected {
                return Err(PromptvError::ConcurrencyConflict(format!(
                    "Version history of prompt '{}/{}' has a gap: expected version {}, found {}",
                    project, name, expected, actual
                )));
            }
        }
        Ok(numbers)
    }

    fn require_manifest(&self, project: &str, name: &str) -> Result<PromptManifest> {
        names::validate_project(project)?;
        names::validate_prompt(name)?;
        self.manifest_state(project, name)?
            .ok_or_else(|| Self::prompt_not_found(project, name))
    }

    /// Current manifest, or `None` if the prompt does not exist.
    ///
    /// The manifest is read before the version records: it is written after
    /// them, so in a healthy store it can only lag behind, never lead.
    fn manifest_state(&self, project: &str, name: &str) -> Result<Option<PromptManifest>> {
        let manifest_key = keys::manifest_key(project, name);
        let stored: Option<PromptManifest> = self.read_record(&manifest_key)?;
        let numbers = self.version_numbers(project, name)?;

        let (latest, stored) = match (numbers.last().copied(), stored) {
            (None, None) => return Ok(None),
            (None, Some(manifest)) => {
                return Err(PromptvError::ConcurrencyConflict(format!(
                    "Manifest of prompt '{}/{}' references version {} but no versions exist",
                    project, name, manifest.current_version
                )));
            }
            (Some(latest), Some(manifest)) if manifest.current_version == latest => {
                return Ok(Some(manifest));
            }
            (Some(latest), Some(manifest)) if manifest.current_version > latest => {
                return Err(PromptvError::ConcurrencyConflict(format!(
                    "Manifest of prompt '{}/{}' references version {} but the latest version is {}",
                    project, name, manifest.current_version, latest
                )));
            }
            (Some(latest), stored) => (latest, stored),
        };

        let newest = self.load_version(project, name, latest)?;
        let created_at = match stored.as_ref() {
            Some(manifest) => manifest.created_at,
            None => self.first_created_at(project, name, &newest)?,
        };
        let manifest = PromptManifest {
            project: project.to_string(),
            name: name.to_string(),
            current_version: latest,
            created_at,
            updated_at: newest.created_at,
        };
        tracing::warn!(
            project,
            prompt = name,
            recorded = stored.map(|m| m.current_version).unwrap_or(0),
            latest,
            "manifest behind version records, reconciling"
        );
        if let Err(err) = self.write_record(&manifest_key, &manifest) {
            tracing::warn!(project, prompt = name, error = %err, "failed to rewrite manifest");
        }
        Ok(Some(manifest))
    }

    fn first_created_at(
        &self,
        project: &str,
        name: &str,
        newest: &Version,
    ) -> Result<DateTime<Utc>> {
        if newest.version == 1 {
            return Ok(newest.created_at);
        }
        Ok(self.load_version(project, name, 1)?.created_at)
    }

    /// Advance the manifest after a successful commit.
    ///
    /// Failures here do not fail the commit: the version record is already
    /// durable and the next read reconciles the manifest.
    fn record_commit(&self, project: &str, name: &str, version: &Version) {
        let manifest_key = keys::manifest_key(project, name);
        let stored: Option<PromptManifest> = match self.read_record(&manifest_key) {
            Ok(stored) => stored,
            Err(err) => {
                tracing::warn!(project, prompt = name, error = %err, "failed to read manifest after commit");
                return;
            }
        };
        if stored
            .as_ref()
            .is_some_and(|m| m.current_version >= version.version)
        {
            return;
        }

        let created_at = match stored {
            Some(manifest) => manifest.created_at,
            None => match self.first_created_at(project, name, version) {
                Ok(created_at) => created_at,
                Err(err) => {
                    tracing::warn!(project, prompt = name, error = %err, "failed to read first version");
                    version.created_at
                }
            },
        };
        let manifest = PromptManifest {
            project: project.to_string(),
            name: name.to_string(),
            current_version: version.version,
            created_at,
            updated_at: version.created_at,
        };
        if let Err(err) = self.write_record(&manifest_key, &manifest) {
            tracing::warn!(
                project,
                prompt = name,
                version = version.version,
                error = %err,
                "failed to update manifest after commit"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn store() -> VersionStore {
        VersionStore::in_memory()
    }

    #[test]
    fn test_first_commit_is_version_one() {
        let store = store();
        let version = store.commit("proj", "p", "hello", Some("init")).unwrap();
        assert_eq!(version.version, 1);
        assert_eq!(version.message.as_deref(), Some("init"));
        assert_eq!(store.latest_version("proj", "p").unwrap(), 1);
    }

    #[test]
    fn test_commits_are_numbered_sequentially() {
        let store = store();
        for expected in 1..=5 {
            let version = store
                .commit("proj", "p", &format!("content {}", expected), None)
                .unwrap();
            assert_eq!(version.version, expected);
        }
        let numbers: Vec<u32> = store
            .list("proj", "p")
            .unwrap()
            .iter()
            .map(|info| info.version)
            .collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_prompts_are_isolated_by_project() {
        let store = store();
        store.commit("a", "p", "from a", None).unwrap();
        store.commit("b", "p", "from b", None).unwrap();
        store.commit("b", "p", "from b again", None).unwrap();

        assert_eq!(store.latest_version("a", "p").unwrap(), 1);
        assert_eq!(store.latest_version("b", "p").unwrap(), 2);
        assert_eq!(store.get("a", "p", "latest").unwrap().content, "from a");
    }

    #[test]
    fn test_resolution_order_and_errors() {
        let store = store();
        store.commit("proj", "p", "one", None).unwrap();
        store.commit("proj", "p", "two", None).unwrap();
        store.tags().create("proj", "p", "prod", 1, None).unwrap();

        assert_eq!(store.resolve("proj", "p", "prod").unwrap(), 1);
        assert_eq!(store.resolve("proj", "p", "2").unwrap(), 2);
        assert_eq!(store.resolve("proj", "p", "latest").unwrap(), 2);

        let kind = |reference: &str| store.resolve("proj", "p", reference).unwrap_err().kind();
        assert_eq!(kind("3"), ErrorKind::NotFound);
        assert_eq!(kind("0"), ErrorKind::NotFound);
        assert_eq!(kind("-1"), ErrorKind::NotFound);
        assert_eq!(kind("staging"), ErrorKind::NotFound);
        assert_eq!(kind(""), ErrorKind::InvalidReference);
        assert_eq!(kind("not a ref!"), ErrorKind::InvalidReference);
    }

    /// Counts reads of tag records.
    struct TagReadCounter {
        inner: MemoryBackend,
        tag_reads: AtomicUsize,
    }

    impl StorageBackend for TagReadCounter {
        fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
            if key.contains("/tags/") {
                self.tag_reads.fetch_add(1, Ordering::SeqCst);
            }
            self.inner.read(key)
        }

        fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
            self.inner.write(key, bytes)
        }

        fn write_new(&self, key: &str, bytes: &[u8]) -> Result<bool> {
            self.inner.write_new(key, bytes)
        }

        fn list(&self, prefix: &str) -> Result<Vec<String>> {
            self.inner.list(prefix)
        }

        fn delete(&self, prefix: &str) -> Result<()> {
            self.inner.delete(prefix)
        }
    }

    #[test]
    fn test_numbers_and_latest_skip_tag_lookup() {
        let backend = Arc::new(TagReadCounter {
            inner: MemoryBackend::new(),
            tag_reads: AtomicUsize::new(0),
        });
        let store = VersionStore::new(backend.clone());
        store.commit("proj", "p", "one", None).unwrap();
        store.commit("proj", "p", "two", None).unwrap();

        assert_eq!(store.resolve("proj", "p", "1").unwrap(), 1);
        assert_eq!(store.resolve("proj", "p", "latest").unwrap(), 2);
        assert_eq!(
            store.resolve("proj", "p", "7").unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(backend.tag_reads.load(Ordering::SeqCst), 0);

        assert_eq!(
            store.resolve("proj", "p", "prod").unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(backend.tag_reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unknown_prompt_is_not_found() {
        let store = store();
        let kind = |err: PromptvError| err.kind();
        assert_eq!(kind(store.get("proj", "nope", "latest").unwrap_err()), ErrorKind::NotFound);
        assert_eq!(kind(store.list("proj", "nope").unwrap_err()), ErrorKind::NotFound);
        assert_eq!(kind(store.remove("proj", "nope").unwrap_err()), ErrorKind::NotFound);
        assert!(!store.exists("proj", "nope").unwrap());
    }

    #[test]
    fn test_invalid_names_are_rejected() {
        let store = store();
        let err = store.commit("proj", "../escape", "x", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidReference);
        let err = store.commit("", "p", "x", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidReference);
    }

    #[test]
    fn test_remove_then_recommit_restarts_numbering() {
        let store = store();
        store.commit("proj", "p", "one", None).unwrap();
        store.commit("proj", "p", "two", None).unwrap();
        store.tags().create("proj", "p", "prod", 2, None).unwrap();

        store.remove("proj", "p").unwrap();
        assert!(!store.exists("proj", "p").unwrap());

        let version = store.commit("proj", "p", "fresh", None).unwrap();
        assert_eq!(version.version, 1);
        assert!(store.tags().list("proj", "p").unwrap().is_empty());
    }

    #[test]
    fn test_list_prompts_and_projects() {
        let store = store();
        store.commit("proj", "beta", "b", None).unwrap();
        store.commit("proj", "alpha", "a", None).unwrap();
        store.commit("other", "gamma", "g", None).unwrap();

        assert_eq!(store.list_prompts("proj").unwrap(), vec!["alpha", "beta"]);
        assert_eq!(store.list_projects().unwrap(), vec!["other", "proj"]);
        assert!(store.list_prompts("empty").unwrap().is_empty());
    }
}
