//! MessageCatalog — merged message files across the cascade, with locale chains
//!
//! A catalog name maps to `{dir}/{name}.{ext}` in every root; the layers are
//! merged most-general-first so earlier roots (the application) override
//! later roots. Locale lookups extend the same idea across a tag chain:
//! `en-US` merges the `en` catalog first, then `en/us` on top, so the most
//! specific tag wins.
//!
//! Like the filesystem cascade, this is a lookup primitive: files that are
//! missing, unreadable, or unparseable contribute no layer rather than
//! erroring — a missing translation falls back to the more general layer.

use crate::config::deep_merge;
use crate::Cascade;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::sync::RwLock;

/// Cached, cascade-backed message catalog.
///
/// # Example
///
/// ```no_run
/// use kasane::{Cascade, MessageCatalog};
///
/// let catalog = MessageCatalog::new(Cascade::new(["app", "framework"]), "messages", "json");
/// let error_text = catalog.get("validation", "errors.required");
/// ```
#[derive(Debug)]
pub struct MessageCatalog {
    files: Cascade,
    dir: String,
    ext: String,
    cache: RwLock<HashMap<String, Value>>,
}

impl MessageCatalog {
    /// Create a catalog reading `{dir}/{name}.{ext}` through `files`.
    #[must_use]
    pub fn new(files: Cascade, dir: &str, ext: &str) -> Self {
        Self {
            files,
            dir: dir.to_string(),
            ext: ext.to_string(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Load one catalog, merged across every root that has it.
    ///
    /// Roots are merged in reverse list order, so the first root's entries
    /// land last and win. Nothing found anywhere yields an empty object.
    pub fn load(&self, name: &str) -> Value {
        if let Some(cached) = self.lock().get(name) {
            return cached.clone();
        }

        let mut merged = Value::Object(Map::new());
        for path in self.files.find_all_files(&self.dir, name, &self.ext).iter().rev() {
            let Ok(text) = fs::read_to_string(path) else {
                continue;
            };
            let Ok(layer) = serde_json::from_str(&text) else {
                continue;
            };
            deep_merge(&mut merged, layer);
        }

        self.lock_mut().insert(name.to_string(), merged.clone());
        merged
    }

    /// Look up a dotted path inside a catalog. `None` when the path leads
    /// nowhere.
    pub fn get(&self, name: &str, path: &str) -> Option<Value> {
        let mut value = self.load(name);
        for segment in path.split('.') {
            value = match value {
                Value::Object(mut map) => map.remove(segment)?,
                _ => return None,
            };
        }
        Some(value)
    }

    /// Load a locale's merged catalog, walking the tag chain from most
    /// general to most specific so the specific tag's entries win.
    ///
    /// `en-US` merges the `en` catalog, then `en/us` on top of it.
    pub fn load_locale(&self, tag: &str) -> Value {
        let mut merged = Value::Object(Map::new());
        for name in locale_chain(tag) {
            deep_merge(&mut merged, self.load(&name));
        }
        merged
    }

    /// Look up a translated string for a locale tag.
    ///
    /// `None` when the key is absent from every layer of the chain or the
    /// value is not a string.
    pub fn text(&self, tag: &str, path: &str) -> Option<String> {
        let mut value = self.load_locale(tag);
        for segment in path.split('.') {
            value = match value {
                Value::Object(mut map) => map.remove(segment)?,
                _ => return None,
            };
        }
        value.as_str().map(str::to_string)
    }

    fn lock(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Value>> {
        self.cache.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn lock_mut(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Value>> {
        self.cache.write().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Expand a locale tag into its lookup chain, most general first.
///
/// `"en-US"` → `["en", "en/us"]`; tags are lowercased and each `-` adds a
/// path level, so more specific catalogs live in per-language directories.
#[must_use]
pub fn locale_chain(tag: &str) -> Vec<String> {
    let parts: Vec<String> = tag
        .split('-')
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect();
    (1..=parts.len()).map(|end| parts[..end].join("/")).collect()
}
