//! Cascade — ordered-root filesystem resolution
//!
//! A cascade is an ordered list of search roots. A file's logical identity is
//! its path relative to a root; earlier roots *shadow* later roots' files of
//! the same relative path. This is the primitive behind configuration
//! cascading, message catalogs, and autoloading: an application root placed
//! before a framework root transparently overrides individual framework
//! files.
//!
//! This is a lookup primitive, not a validating one: a root that lacks the
//! requested directory is silently skipped, and total absence is an empty
//! result, never an error.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// An ordered list of search roots, fixed at construction.
///
/// # Example
///
/// ```no_run
/// use kasane::Cascade;
///
/// // Application files shadow framework files.
/// let cascade = Cascade::new(["/srv/app/application", "/srv/app/framework"]);
/// let config = cascade.find_file("config", "database", "json");
/// ```
#[derive(Debug, Clone)]
pub struct Cascade {
    roots: Vec<PathBuf>,
}

impl Cascade {
    /// Create a cascade over the given roots, checked in list order.
    pub fn new<P: Into<PathBuf>>(roots: impl IntoIterator<Item = P>) -> Self {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }

    /// The configured roots, in resolution order.
    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Find the first root containing `{dir}/{name}.{ext}` as a regular file.
    ///
    /// Returns `None` when no root contains it — absence is routine here,
    /// the caller decides whether it is an error.
    #[must_use]
    pub fn find_file(&self, dir: &str, name: &str, ext: &str) -> Option<PathBuf> {
        let relative = relative_path(dir, name, ext);
        self.roots.iter().find_map(|root| {
            let candidate = root.join(&relative);
            candidate.is_file().then_some(candidate)
        })
    }

    /// Find `{dir}/{name}.{ext}` in **every** root that contains it, in root
    /// order.
    ///
    /// Used to accumulate override layers: the caller merges the returned
    /// files, typically most-general-first so earlier roots win.
    #[must_use]
    pub fn find_all_files(&self, dir: &str, name: &str, ext: &str) -> Vec<PathBuf> {
        let relative = relative_path(dir, name, ext);
        self.roots
            .iter()
            .filter_map(|root| {
                let candidate = root.join(&relative);
                candidate.is_file().then_some(candidate)
            })
            .collect()
    }

    /// List every file under `{root}/{dir}` across all roots, recursively.
    ///
    /// Keys are relative paths (`{dir}/...`, always `/`-separated); values
    /// are the winning absolute paths. The first root to produce a relative
    /// path wins — later roots' entries for the same key are shadowed.
    #[must_use]
    pub fn list_files(&self, dir: &str) -> BTreeMap<String, PathBuf> {
        let mut files = BTreeMap::new();
        for root in &self.roots {
            let base = root.join(dir);
            // Missing directory under this root: skip, not an error.
            walk(&base, dir, &mut files);
        }
        files
    }
}

fn relative_path(dir: &str, name: &str, ext: &str) -> PathBuf {
    let mut path = PathBuf::from(dir);
    path.push(format!("{name}.{ext}"));
    path
}

fn walk(base: &Path, relative: &str, files: &mut BTreeMap<String, PathBuf>) {
    let Ok(entries) = fs::read_dir(base) else {
        return;
    };
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let child_relative = format!("{relative}/{name}");
        let child_path = entry.path();
        if child_path.is_dir() {
            walk(&child_path, &child_relative, files);
        } else if !files.contains_key(&child_relative) {
            files.insert(child_relative, child_path);
        }
    }
}
