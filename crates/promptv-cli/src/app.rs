use std::path::PathBuf;
use std::time::Duration;

use promptv_core::{ErrorKind, PromptClient, PromptvError, RetryPolicy, VersionStore};

use crate::cli::Cli;
use crate::config::{default_config_path, default_store_path, read_config, PromptvConfig};
use crate::constants::exit_codes;

pub fn resolve_config_path() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("PROMPTV_CONFIG") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    default_config_path()
}

/// Config file contents, or defaults when no config file exists yet.
pub fn load_config() -> anyhow::Result<PromptvConfig> {
    let path = resolve_config_path()?;
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(PromptvConfig::default());
    }
    read_config(&path)
}

/// `--store` / `PROMPTV_STORE`, then the config file, then the XDG data dir.
pub fn resolve_store_path(cli: &Cli, config: &PromptvConfig) -> anyhow::Result<PathBuf> {
    if let Some(path) = cli.store.as_ref() {
        return Ok(PathBuf::from(path));
    }
    if let Some(path) = config.store.path.as_ref() {
        return Ok(PathBuf::from(path));
    }
    default_store_path()
}

/// Everything a command needs: the client and the effective config.
pub struct AppContext {
    pub client: PromptClient,
    pub config: PromptvConfig,
}

impl AppContext {
    pub fn open(cli: &Cli) -> anyhow::Result<Self> {
        let config = load_config()?;
        let store_path = resolve_store_path(cli, &config)?;
        tracing::debug!(store = %store_path.display(), project = %cli.project, "opening store");

        let retry = RetryPolicy {
            max_retries: config.store.max_retries,
            ..RetryPolicy::default()
        };
        let store = VersionStore::open(store_path).with_retry_policy(retry);
        let client = PromptClient::new(store, Duration::from_secs(config.cache.ttl_seconds))
            .with_cache_capacity(config.cache.max_entries);
        Ok(Self { client, config })
    }

    pub fn store(&self) -> &VersionStore {
        self.client.store()
    }
}

/// Exit code for a failed command, keyed on the core error kind.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    let kind = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<PromptvError>())
        .map(PromptvError::kind);
    match kind {
        Some(ErrorKind::NotFound) => exit_codes::NOT_FOUND,
        Some(ErrorKind::InvalidReference) => exit_codes::INVALID_INPUT,
        Some(ErrorKind::AlreadyExists) => exit_codes::ALREADY_EXISTS,
        Some(ErrorKind::StorageFailure) => exit_codes::STORAGE_FAILURE,
        Some(ErrorKind::ConcurrencyConflict) => exit_codes::CONFLICT,
        None => 1,
    }
}

/// Hint printed under an error, when there is a useful next step.
pub fn hint_for(err: &anyhow::Error) -> Option<&'static str> {
    let kind = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<PromptvError>())
        .map(PromptvError::kind)?;
    match kind {
        ErrorKind::NotFound => Some("Hint: Run `promptv list` to see prompts and versions."),
        ErrorKind::AlreadyExists => {
            Some("Hint: Delete the tag first with `promptv tag delete <NAME> <TAG>`.")
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_follow_error_kind() {
        let not_found = anyhow::Error::new(PromptvError::NotFound("x".into()));
        assert_eq!(exit_code_for(&not_found), exit_codes::NOT_FOUND);

        let wrapped = anyhow::Error::new(PromptvError::AlreadyExists("tag".into()))
            .context("creating tag");
        assert_eq!(exit_code_for(&wrapped), exit_codes::ALREADY_EXISTS);

        let other = anyhow::anyhow!("config is broken");
        assert_eq!(exit_code_for(&other), 1);
        assert!(hint_for(&other).is_none());
    }
}
