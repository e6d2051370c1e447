//! Variable substitution hook.
//!
//! The core stores prompt text verbatim and never interprets template
//! syntax. Embedders that want substitution plug in a [`Renderer`].

use std::collections::BTreeMap;

use crate::error::Result;

pub type Variables = BTreeMap<String, String>;

/// Substitutes variables into prompt text.
pub trait Renderer: Send + Sync {
    fn render(&self, text: &str, variables: &Variables) -> Result<String>;
}

/// Stable fingerprint of a variable set, used in cache keys.
///
/// The empty set has the empty fingerprint so plain lookups share one key.
/// Every name and value is hashed behind its byte length, so no two
/// distinct sets feed the hasher the same bytes.
pub fn fingerprint(variables: &Variables) -> String {
    if variables.is_empty() {
        return String::new();
    }
    let mut hasher = blake3::Hasher::new();
    for (name, value) in variables {
        hash_field(&mut hasher, name);
        hash_field(&mut hasher, value);
    }
    hasher.finalize().to_hex().to_string()
}

fn hash_field(hasher: &mut blake3::Hasher, field: &str) {
    hasher.update(&(field.len() as u64).to_le_bytes());
    hasher.update(field.as_bytes());
}
