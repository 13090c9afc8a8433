//! Autoloader — qualified names to cascade paths, loaded exactly once
//!
//! Maps a qualified name like `Controller::Admin::User` (or the equivalent
//! `Controller_Admin_User`) to `{dir}/Controller/Admin/User.{ext}` through
//! the filesystem cascade, and guarantees the caller's load action runs at
//! most once per name.

use crate::Cascade;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Cascade-backed name-to-file resolver with load-once bookkeeping.
#[derive(Debug)]
pub struct Autoloader {
    files: Cascade,
    dir: String,
    ext: String,
    loaded: Mutex<HashSet<String>>,
}

impl Autoloader {
    /// Create an autoloader resolving under `{dir}` with extension `{ext}`.
    #[must_use]
    pub fn new(files: Cascade, dir: &str, ext: &str) -> Self {
        Self {
            files,
            dir: dir.to_string(),
            ext: ext.to_string(),
            loaded: Mutex::new(HashSet::new()),
        }
    }

    /// Resolve a qualified name to the winning file in the cascade.
    ///
    /// Both `::` and `_` act as separators, so `Controller::Admin_User` and
    /// `Controller_Admin_User` resolve to the same relative path. `None`
    /// when no root contains the file, or the name is empty.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        let relative = segments(name)?.join("/");
        self.files.find_file(&self.dir, &relative, &self.ext)
    }

    /// Run `loader` on the resolved path, at most once per name.
    ///
    /// Returns `Ok(true)` when the loader ran and succeeded, `Ok(false)`
    /// when the name was already loaded or could not be resolved. A loader
    /// error propagates and the name stays unloaded, so a later call retries.
    ///
    /// The bookkeeping lock is held across the loader call, making the
    /// exactly-once guarantee hold under concurrent use.
    pub fn load_once<E>(
        &self,
        name: &str,
        loader: impl FnOnce(&Path) -> Result<(), E>,
    ) -> Result<bool, E> {
        let mut loaded = self
            .loaded
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if loaded.contains(name) {
            return Ok(false);
        }
        let Some(path) = self.resolve(name) else {
            return Ok(false);
        };
        loader(&path)?;
        loaded.insert(name.to_string());
        Ok(true)
    }

    /// Whether a name has been loaded.
    #[must_use]
    pub fn is_loaded(&self, name: &str) -> bool {
        self.loaded
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains(name)
    }
}

fn segments(name: &str) -> Option<Vec<&str>> {
    let parts: Vec<&str> = name
        .split("::")
        .flat_map(|part| part.split('_'))
        .filter(|part| !part.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts)
    }
}
