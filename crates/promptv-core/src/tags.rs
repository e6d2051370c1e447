//! Named pointers to versions.
//!
//! A tag is unique per (project, prompt, name). Tags are created once and
//! never retargeted; moving a tag means deleting and recreating it.

use crate::error::{PromptvError, Result};
use crate::names;
use crate::storage::keys;
use crate::store::VersionStore;
use crate::types::Tag;

/// Tag operations over a [`VersionStore`]. Obtain one with
/// [`VersionStore::tags`].
pub struct TagRegistry<'a> {
    store: &'a VersionStore,
}

impl<'a> TagRegistry<'a> {
    pub(crate) fn new(store: &'a VersionStore) -> Self {
        Self { store }
    }

    /// Point a new tag at an existing version.
    ///
    /// The target version is read again once the tag is written. If the
    /// prompt was removed (or removed and recommitted) in between, the tag
    /// is deleted again and the call fails.
    pub fn create(
        &self,
        project: &str,
        name: &str,
        tag: &str,
        version: u32,
        description: Option<&str>,
    ) -> Result<Tag> {
        names::validate_tag(tag)?;
        let latest = self.store.latest_version(project, name)?;
        if version == 0 || version > latest {
            return Err(PromptvError::NotFound(format!(
                "Version {} not found for prompt '{}/{}' (latest is {})",
                version, project, name, latest
            )));
        }
        let target = self
            .store
            .find_version(project, name, version)?
            .ok_or_else(|| VersionStore::prompt_not_found(project, name))?;

        let record = Tag {
            name: tag.to_string(),
            project: project.to_string(),
            prompt: name.to_string(),
            version,
            description: description.map(str::to_string),
            created_at: self.store.clock().now(),
        };
        let key = keys::tag_key(project, name, tag);
        if !self.store.write_record_new(&key, &record)? {
            return Err(PromptvError::AlreadyExists(format!(
                "Tag '{}' already exists for prompt '{}/{}'",
                tag, project, name
            )));
        }

        let current = self.store.find_version(project, name, version)?;
        let still_there = current
            .as_ref()
            .is_some_and(|current| current.created_at == target.created_at);
        if !still_there {
            self.store.delete_key(&key)?;
            tracing::warn!(project, prompt = name, tag, version, "target version changed while tagging");
            return Err(match current {
                None => VersionStore::prompt_not_found(project, name),
                Some(_) => PromptvError::ConcurrencyConflict(format!(
                    "Version {} of prompt '{}/{}' was replaced while creating tag '{}'",
                    version, project, name, tag
                )),
            });
        }

        tracing::info!(project, prompt = name, tag, version, "created tag");
        Ok(record)
    }

    pub fn get(&self, project: &str, name: &str, tag: &str) -> Result<Tag> {
        names::validate_project(project)?;
        names::validate_prompt(name)?;
        if !names::is_key_safe(tag) {
            return Err(PromptvError::InvalidReference(format!(
                "Invalid tag name '{}'",
                tag
            )));
        }
        self.find(project, name, tag)?.ok_or_else(|| {
            PromptvError::NotFound(format!(
                "Tag '{}' not found for prompt '{}/{}'",
                tag, project, name
            ))
        })
    }

    /// Tags of a prompt, oldest first. Ties are broken by name.
    pub fn list(&self, project: &str, name: &str) -> Result<Vec<Tag>> {
        self.store.latest_version(project, name)?;

        let prefix = keys::tags_prefix(project, name);
        let mut tags = Vec::new();
        for key in self.store.list_keys(&prefix)? {
            // Deleted between listing and reading.
            if let Some(tag) = self.store.read_record::<Tag>(&key)? {
                tags.push(tag);
            }
        }
        tags.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(tags)
    }

    /// Remove a tag and return what it pointed at. The version itself is
    /// untouched.
    pub fn delete(&self, project: &str, name: &str, tag: &str) -> Result<Tag> {
        let existing = self.get(project, name, tag)?;
        self.store.delete_key(&keys::tag_key(project, name, tag))?;
        tracing::info!(project, prompt = name, tag, version = existing.version, "deleted tag");
        Ok(existing)
    }

    /// Tag record if present. Callers validate `tag` first.
    pub(crate) fn find(&self, project: &str, name: &str, tag: &str) -> Result<Option<Tag>> {
        self.store.read_record(&keys::tag_key(project, name, tag))
    }
}
