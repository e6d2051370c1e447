//! Long-lived client handle: the version store plus a read-through cache.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheKey, CacheLayer, CacheStats};
use crate::diff::{self, EditScript};
use crate::error::Result;
use crate::store::VersionStore;
use crate::types::{Tag, Version};
use crate::variables::{fingerprint, Renderer, Variables};

pub struct PromptClient {
    store: VersionStore,
    cache: CacheLayer<String>,
    renderer: Option<Arc<dyn Renderer>>,
}

impl PromptClient {
    /// The cache shares the store's clock.
    pub fn new(store: VersionStore, cache_ttl: Duration) -> Self {
        let cache = CacheLayer::new(cache_ttl).with_clock(store.clock().clone());
        Self {
            store,
            cache,
            renderer: None,
        }
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_cache_capacity(mut self, max_entries: usize) -> Self {
        self.cache = self.cache.with_max_entries(max_entries);
        self
    }

    pub fn store(&self) -> &VersionStore {
        &self.store
    }

    /// Content of the referenced version, with `variables` substituted when
    /// a renderer is configured. Served from the cache while fresh.
    pub fn get_prompt(
        &self,
        project: &str,
        name: &str,
        reference: &str,
        variables: &Variables,
    ) -> Result<String> {
        let key = CacheKey::new(project, name, reference, fingerprint(variables));
        self.cache.get_or_load(&key, || {
            let version = self.store.get(project, name, reference)?;
            match &self.renderer {
                Some(renderer) if !variables.is_empty() => {
                    renderer.render(&version.content, variables)
                }
                _ => Ok(version.content),
            }
        })
    }

    pub fn commit(
        &self,
        project: &str,
        name: &str,
        content: &str,
        message: Option<&str>,
    ) -> Result<Version> {
        let version = self.store.commit(project, name, content, message)?;
        self.cache.invalidate_prompt(project, name);
        Ok(version)
    }

    pub fn create_tag(
        &self,
        project: &str,
        name: &str,
        tag: &str,
        version: u32,
        description: Option<&str>,
    ) -> Result<Tag> {
        let created = self
            .store
            .tags()
            .create(project, name, tag, version, description)?;
        self.cache.invalidate_prompt(project, name);
        Ok(created)
    }

    pub fn delete_tag(&self, project: &str, name: &str, tag: &str) -> Result<Tag> {
        let removed = self.store.tags().delete(project, name, tag)?;
        self.cache.invalidate_prompt(project, name);
        Ok(removed)
    }

    pub fn remove(&self, project: &str, name: &str) -> Result<()> {
        self.store.remove(project, name)?;
        self.cache.invalidate_prompt(project, name);
        Ok(())
    }

    /// Edit script from `reference_a` to `reference_b`.
    pub fn diff(
        &self,
        project: &str,
        name: &str,
        reference_a: &str,
        reference_b: &str,
    ) -> Result<EditScript> {
        let a = self.store.get(project, name, reference_a)?;
        let b = self.store.get(project, name, reference_b)?;
        Ok(diff::compute(&a.content, &b.content))
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
