//! Profile discovery and lookup.

use crate::{Profile, ProfileSignature};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Profiles discovered at start-up, each loaded exactly once.
///
/// Names are unique: inserting a profile whose name is already known keeps
/// the first one and returns it.
///
/// # Example
///
/// ```rust
/// use pigment_icc::{Profile, ProfileSignature, ProfileStore};
///
/// let mut store = ProfileStore::new();
/// store.insert(Profile::srgb());
/// assert_eq!(store.profiles_for_signature(ProfileSignature::Rgb).len(), 1);
/// assert!(store.profiles_for_signature(ProfileSignature::Cmyk).is_empty());
/// ```
#[derive(Debug, Default, Clone)]
pub struct ProfileStore {
    profiles: Vec<Arc<Profile>>,
    by_name: HashMap<String, usize>,
}

impl ProfileStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans directories recursively for `.icc` / `.icm` files.
    ///
    /// Missing directories are skipped; files that fail to load are logged
    /// and skipped.
    pub fn discover<P: AsRef<Path>>(search_paths: &[P]) -> Self {
        let mut store = Self::new();
        for dir in search_paths {
            store.scan(dir.as_ref());
        }
        debug!(count = store.len(), "profile discovery finished");
        store
    }

    /// Adds every profile found under `dir`. Returns how many were new.
    pub fn scan(&mut self, dir: &Path) -> usize {
        if !dir.is_dir() {
            debug!(dir = %dir.display(), "profile directory not found");
            return 0;
        }
        let pattern = format!("{}/**/*", glob::Pattern::escape(&dir.to_string_lossy()));
        let paths = match glob::glob(&pattern) {
            Ok(paths) => paths,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "bad profile search pattern");
                return 0;
            }
        };

        let before = self.len();
        for path in paths.flatten() {
            if !is_profile_file(&path) {
                continue;
            }
            match Profile::from_file(&path) {
                Ok(profile) => {
                    debug!(path = %path.display(), name = profile.name(), "found profile");
                    self.insert(profile);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "skipping profile"),
            }
        }
        self.len() - before
    }

    /// Adds a profile, or returns the already-known profile of that name.
    pub fn insert(&mut self, profile: impl Into<Arc<Profile>>) -> Arc<Profile> {
        let profile = profile.into();
        if let Some(&i) = self.by_name.get(profile.name()) {
            return Arc::clone(&self.profiles[i]);
        }
        self.by_name.insert(profile.name().to_string(), self.profiles.len());
        self.profiles.push(Arc::clone(&profile));
        profile
    }

    /// Looks a profile up by product name.
    pub fn get_by_name(&self, name: &str) -> Option<Arc<Profile>> {
        self.by_name.get(name).map(|&i| Arc::clone(&self.profiles[i]))
    }

    /// Profiles whose declared signature matches, in discovery order.
    pub fn profiles_for_signature(&self, signature: ProfileSignature) -> Vec<Arc<Profile>> {
        self.profiles
            .iter()
            .filter(|p| p.signature() == signature)
            .cloned()
            .collect()
    }

    /// Iterates all profiles in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Profile>> {
        self.profiles.iter()
    }

    /// Number of profiles.
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

fn is_profile_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("icc") || e.eq_ignore_ascii_case("icm"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_dedupes_by_name() {
        let mut store = ProfileStore::new();
        let a = store.insert(Profile::srgb());
        let b = store.insert(Profile::srgb());
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(store.len(), 1);
        assert!(store.get_by_name(a.name()).is_some());
        assert!(store.get_by_name("nope").is_none());
    }

    #[test]
    fn test_missing_dir() {
        let store = ProfileStore::discover(&["/definitely/not/here"]);
        assert!(store.is_empty());
    }

    #[test]
    fn test_extension_filter() {
        assert!(!is_profile_file(Path::new("/no/such/file.icc")));
    }
}
