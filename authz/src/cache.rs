//! Per-user permission set cache.

use dashmap::DashMap;
use database::User;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::types::Grant;

/// Source of a user's normalized permission set.
///
/// The engine only talks to this trait, so an invalidating implementation can
/// replace [`LazyPermissionCache`] without touching call sites.
pub trait PermissionCache: Send + Sync {
    /// The user's grants as normalized strings (see [`Grant::key`]).
    fn permissions_for(&self, user: &User) -> Arc<HashSet<String>>;

    /// Number of users currently cached
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Builds each user's set on first use and keeps it for the life of the process.
///
/// Entries are never invalidated: a change to `User::permissions` after the
/// first lookup is not observed until restart.
#[derive(Debug, Default)]
pub struct LazyPermissionCache {
    entries: DashMap<String, Arc<HashSet<String>>>,
}

impl LazyPermissionCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn build(user: &User) -> HashSet<String> {
        user.permissions
            .iter()
            .filter_map(|raw| match raw.parse::<Grant>() {
                Ok(_) => Some(raw.to_ascii_lowercase()),
                Err(e) => {
                    warn!("Ignoring permission for user {}: {}", user.id, e);
                    None
                }
            })
            .collect()
    }
}

impl PermissionCache for LazyPermissionCache {
    fn permissions_for(&self, user: &User) -> Arc<HashSet<String>> {
        // Hit path only takes a shard read lock
        if let Some(set) = self.entries.get(&user.id) {
            return Arc::clone(set.value());
        }

        let entry = self.entries.entry(user.id.clone()).or_insert_with(|| {
            debug!("Caching permission set for user {}", user.id);
            Arc::new(Self::build(user))
        });
        Arc::clone(entry.value())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(perms: &[&str]) -> User {
        User::new("u1", "alice", "editor").with_permissions(perms.iter().copied())
    }

    #[test]
    fn test_builds_normalized_set() {
        let cache = LazyPermissionCache::new();
        let set = cache.permissions_for(&user(&["READ:ReportA", "all:own-all", "garbage"]));

        assert!(set.contains("read:reporta"));
        assert!(set.contains("all:own-all"));
        assert!(!set.contains("garbage"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_reuses_first_set_and_stays_stale() {
        let cache = LazyPermissionCache::new();
        let first = cache.permissions_for(&user(&["read:all"]));

        let changed = user(&["delete:all"]);
        let second = cache.permissions_for(&changed);

        assert!(Arc::ptr_eq(&first, &second));
        assert!(second.contains("read:all"));
        assert!(!second.contains("delete:all"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_concurrent_population() {
        let cache = Arc::new(LazyPermissionCache::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    let u = User::new(format!("u{}", i % 4), "n", "editor")
                        .with_permissions(["read:all"]);
                    for _ in 0..100 {
                        assert!(cache.permissions_for(&u).contains("read:all"));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 4);
    }
}
