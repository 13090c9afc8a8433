//! ConfigCascade — named config groups deep-merged from prioritized sources
//!
//! Sources are kept in priority order (front = highest). Loading a group
//! iterates sources lowest-priority-first and deep-merges each layer on top
//! of the accumulator, so the highest-priority source's keys land last and
//! win. Merged groups are cached; attaching or detaching a source drops the
//! cache before any subsequent load can observe stale data.
//!
//! # Capability model
//!
//! Reading is the base capability ([`Source`]); writing is opt-in via
//! [`WritableSource`], surfaced through the explicit
//! [`Source::as_writable`] hook rather than runtime type inspection.
//! [`ConfigCascade::write`] forwards to every writable source and skips the
//! rest.

use crate::{Cascade, ConfigError};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, RwLock};

/// A readable configuration source.
///
/// `read` returns `Ok(None)` when the source has nothing for the group —
/// that is routine, not an error; the group simply contributes no layer.
pub trait Source: Send + Sync {
    /// Read a group's data, if this source has any.
    fn read(&self, group: &str) -> Result<Option<Value>, ConfigError>;

    /// This source's write capability, if it has one.
    fn as_writable(&self) -> Option<&dyn WritableSource> {
        None
    }
}

/// A configuration source that also accepts writes.
pub trait WritableSource: Source {
    /// Set `key` (dotted paths allowed) inside `group` to `value`.
    fn write(&self, group: &str, key: &str, value: Value) -> Result<(), ConfigError>;
}

/// Prioritized, cached merger of configuration sources.
///
/// # Example
///
/// ```
/// use kasane::{ConfigCascade, MemorySource};
/// use serde_json::json;
/// use std::sync::Arc;
///
/// let mut config = ConfigCascade::new();
/// config.attach(Arc::new(MemorySource::with_group("app", json!({"name": "base", "debug": false}))), true);
/// // Attached at the front: higher priority, wins on conflicts.
/// config.attach(Arc::new(MemorySource::with_group("app", json!({"name": "site"}))), true);
///
/// assert_eq!(config.load("app.name").unwrap(), json!("site"));
/// assert_eq!(config.load("app.debug").unwrap(), json!(false));
/// ```
///
/// # Concurrency
///
/// Loads take a read lock on the merged-group cache and are safe to run
/// concurrently. Attach/detach require `&mut self`, so source mutation is
/// serialized by ownership and its cache invalidation happens-before any
/// later load.
#[derive(Default)]
pub struct ConfigCascade {
    /// Front = highest priority.
    sources: Vec<Arc<dyn Source>>,
    cache: RwLock<HashMap<String, Value>>,
}

impl ConfigCascade {
    /// Create a cascade with no sources attached.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a source. `first` inserts at the front (highest priority,
    /// overrides everything attached so far); otherwise at the rear (lowest
    /// priority). Drops all cached merged groups.
    pub fn attach(&mut self, source: Arc<dyn Source>, first: bool) {
        if first {
            self.sources.insert(0, source);
        } else {
            self.sources.push(source);
        }
        self.invalidate();
    }

    /// Detach a source by identity. Drops all cached merged groups.
    pub fn detach(&mut self, source: &Arc<dyn Source>) {
        self.sources.retain(|s| !Arc::ptr_eq(s, source));
        self.invalidate();
    }

    /// Number of attached sources.
    #[must_use]
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Load a group, or a value inside it via a dotted path
    /// (`"group.sub.key"`). A path that leads nowhere yields `Value::Null`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NoSources`] with nothing attached,
    /// [`ConfigError::EmptyGroupName`] for an empty name, and any source
    /// read failure.
    pub fn load(&self, name: &str) -> Result<Value, ConfigError> {
        if self.sources.is_empty() {
            return Err(ConfigError::NoSources);
        }
        let mut parts = name.split('.');
        let group = parts.next().unwrap_or_default();
        if group.is_empty() {
            return Err(ConfigError::EmptyGroupName);
        }

        let mut value = self.group(group)?;
        for segment in parts {
            value = match value {
                Value::Object(mut map) => map.remove(segment).unwrap_or(Value::Null),
                _ => Value::Null,
            };
        }
        Ok(value)
    }

    /// Like [`load`](Self::load), but substitutes `default` for a `Null`
    /// result (missing group or dotted path).
    pub fn load_or(&self, name: &str, default: Value) -> Result<Value, ConfigError> {
        let value = self.load(name)?;
        Ok(if value.is_null() { default } else { value })
    }

    /// Write `key` = `value` into `group` on every writable source, in
    /// attachment order. Sources without write capability are skipped.
    /// Returns how many sources accepted the write.
    ///
    /// The group's cached merge is dropped so the change is visible to the
    /// next load.
    pub fn write(&self, group: &str, key: &str, value: Value) -> Result<usize, ConfigError> {
        if group.is_empty() {
            return Err(ConfigError::EmptyGroupName);
        }
        let mut written = 0;
        for source in &self.sources {
            if let Some(writable) = source.as_writable() {
                writable.write(group, key, value.clone())?;
                written += 1;
            }
        }
        if written > 0 {
            self.lock_cache_mut().remove(group);
        }
        Ok(written)
    }

    /// Merged view of one group, built lowest-priority-first so the
    /// highest-priority source merges last and wins.
    fn group(&self, group: &str) -> Result<Value, ConfigError> {
        if let Some(cached) = self.lock_cache().get(group) {
            return Ok(cached.clone());
        }

        let mut merged = Value::Object(Map::new());
        for source in self.sources.iter().rev() {
            if let Some(layer) = source.read(group)? {
                deep_merge(&mut merged, layer);
            }
        }

        self.lock_cache_mut()
            .insert(group.to_string(), merged.clone());
        Ok(merged)
    }

    fn invalidate(&mut self) {
        self.lock_cache_mut().clear();
    }

    fn lock_cache(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Value>> {
        self.cache.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn lock_cache_mut(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Value>> {
        self.cache.write().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ConfigCascade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigCascade")
            .field("source_count", &self.sources.len())
            .finish()
    }
}

/// Deep-merge `layer` onto `base`: objects merge recursively key by key;
/// scalars and arrays overwrite.
pub(crate) fn deep_merge(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base_map), Value::Object(layer_map)) => {
            for (key, layer_value) in layer_map {
                match base_map.get_mut(&key) {
                    Some(base_value) => deep_merge(base_value, layer_value),
                    None => {
                        base_map.insert(key, layer_value);
                    }
                }
            }
        }
        (base_slot, layer_value) => *base_slot = layer_value,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Sources
// ═══════════════════════════════════════════════════════════════════════════════

/// On-disk format of a [`FileSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// `{group}.json`, parsed with `serde_json`.
    Json,
    /// `{group}.yaml`, parsed with `serde_yaml`.
    #[cfg(feature = "yaml")]
    Yaml,
}

impl FileFormat {
    fn ext(self) -> &'static str {
        match self {
            Self::Json => "json",
            #[cfg(feature = "yaml")]
            Self::Yaml => "yaml",
        }
    }
}

/// Read-only source backed by a filesystem [`Cascade`].
///
/// A group reads `{dir}/{group}.{ext}` from **every** root and merges the
/// layers most-general-first, so earlier roots (the application) override
/// later roots (the framework) within this single source — the same
/// direction the cascade uses everywhere else.
#[derive(Debug, Clone)]
pub struct FileSource {
    files: Cascade,
    dir: String,
    format: FileFormat,
}

impl FileSource {
    /// JSON files under `{dir}` across the cascade's roots.
    #[must_use]
    pub fn json(files: Cascade, dir: &str) -> Self {
        Self {
            files,
            dir: dir.to_string(),
            format: FileFormat::Json,
        }
    }

    /// YAML files under `{dir}` across the cascade's roots.
    #[cfg(feature = "yaml")]
    #[must_use]
    pub fn yaml(files: Cascade, dir: &str) -> Self {
        Self {
            files,
            dir: dir.to_string(),
            format: FileFormat::Yaml,
        }
    }

    fn parse(&self, group: &str, path: &std::path::Path) -> Result<Value, ConfigError> {
        let source_err = |message: String| ConfigError::Source {
            group: group.to_string(),
            source: format!("{}: {message}", path.display()),
        };
        let text = fs::read_to_string(path).map_err(|e| source_err(e.to_string()))?;
        match self.format {
            FileFormat::Json => serde_json::from_str(&text).map_err(|e| source_err(e.to_string())),
            #[cfg(feature = "yaml")]
            FileFormat::Yaml => serde_yaml::from_str(&text).map_err(|e| source_err(e.to_string())),
        }
    }
}

impl Source for FileSource {
    fn read(&self, group: &str) -> Result<Option<Value>, ConfigError> {
        let found = self.files.find_all_files(&self.dir, group, self.format.ext());
        if found.is_empty() {
            return Ok(None);
        }

        let mut merged = Value::Object(Map::new());
        for path in found.iter().rev() {
            let layer = self.parse(group, path)?;
            deep_merge(&mut merged, layer);
        }
        Ok(Some(merged))
    }
}

/// In-memory source with read and write capability.
///
/// Backs tests and runtime write-back. Writes land immediately; the cascade
/// invalidates its merged cache so the next load sees them.
#[derive(Debug, Default)]
pub struct MemorySource {
    groups: RwLock<HashMap<String, Value>>,
}

impl MemorySource {
    /// An empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A source pre-populated with one group.
    #[must_use]
    pub fn with_group(group: &str, value: Value) -> Self {
        let source = Self::new();
        source.set(group, value);
        source
    }

    /// Replace a whole group.
    pub fn set(&self, group: &str, value: Value) {
        self.lock_mut().insert(group.to_string(), value);
    }

    fn lock(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Value>> {
        self.groups.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn lock_mut(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Value>> {
        self.groups.write().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Source for MemorySource {
    fn read(&self, group: &str) -> Result<Option<Value>, ConfigError> {
        Ok(self.lock().get(group).cloned())
    }

    fn as_writable(&self) -> Option<&dyn WritableSource> {
        Some(self)
    }
}

impl WritableSource for MemorySource {
    fn write(&self, group: &str, key: &str, value: Value) -> Result<(), ConfigError> {
        let mut groups = self.lock_mut();
        let root = groups
            .entry(group.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        set_path(root, key, value);
        Ok(())
    }
}

/// Set a dotted path inside a value, creating intermediate objects and
/// overwriting anything that is not an object along the way.
fn set_path(root: &mut Value, path: &str, value: Value) {
    let mut current = root;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Value::Object(map) = current else {
            return;
        };
        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            return;
        }
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}
