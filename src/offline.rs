//! Versioned on-disk cache of backend replies, consulted only when the
//! network is unreachable.
//!
//! Only a fixed set of read actions is cacheable. Entries are stored per
//! practitioner under `<root>/<version>/`. Nothing is ever invalidated and
//! older version directories are left alone.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Actions whose successful replies are kept for offline use
pub const CACHEABLE_ACTIONS: &[&str] = &["getPacientes", "getTratamientos"];

#[derive(Clone, Debug)]
pub struct OfflineCache {
    dir: PathBuf,
}

impl OfflineCache {
    pub fn new(root: &Path, version: &str) -> Self {
        OfflineCache {
            dir: root.join(version),
        }
    }

    /// Create the cache directory for this version
    pub fn install(&self) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        tracing::debug!(dir = %self.dir.display(), "Offline cache installed");
        Ok(())
    }

    pub fn is_cacheable(action: &str) -> bool {
        CACHEABLE_ACTIONS.contains(&action)
    }

    fn entry_path(&self, action: &str, email: &str) -> PathBuf {
        self.dir.join(format!("{}--{}.json", action, sanitize(email)))
    }

    /// Store a raw reply body. Returns false for non-cacheable actions.
    pub fn store(&self, action: &str, email: &str, body: &str) -> Result<bool> {
        if !Self::is_cacheable(action) {
            return Ok(false);
        }
        if !self.dir.exists() {
            self.install()?;
        }
        fs::write(self.entry_path(action, email), body)?;
        Ok(true)
    }

    /// Raw reply body stored for this action and practitioner
    pub fn lookup(&self, action: &str, email: &str) -> Option<String> {
        if !Self::is_cacheable(action) {
            return None;
        }
        fs::read_to_string(self.entry_path(action, email)).ok()
    }
}

fn sanitize(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_store_and_lookup_per_practitioner() {
        let dir = tempdir().unwrap();
        let cache = OfflineCache::new(dir.path(), "kine-v1");
        cache.install().unwrap();
        assert!(dir.path().join("kine-v1").is_dir());

        assert!(cache.store("getPacientes", "a@x.com", r#"{"ok":true}"#).unwrap());
        assert_eq!(
            cache.lookup("getPacientes", "a@x.com").as_deref(),
            Some(r#"{"ok":true}"#)
        );
        assert!(cache.lookup("getPacientes", "b@x.com").is_none());
    }

    #[test]
    fn test_only_fixed_actions_are_cached() {
        let dir = tempdir().unwrap();
        let cache = OfflineCache::new(dir.path(), "kine-v1");
        assert!(!cache.store("registrarSesion", "a@x.com", "{}").unwrap());
        assert!(cache.lookup("registrarSesion", "a@x.com").is_none());
    }

    #[test]
    fn test_versions_are_separate() {
        let dir = tempdir().unwrap();
        let v1 = OfflineCache::new(dir.path(), "kine-v1");
        let v2 = OfflineCache::new(dir.path(), "kine-v2");
        v1.store("getTratamientos", "a@x.com", "old").unwrap();
        assert!(v2.lookup("getTratamientos", "a@x.com").is_none());
        assert_eq!(v1.lookup("getTratamientos", "a@x.com").as_deref(), Some("old"));
    }
}
