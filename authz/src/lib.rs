//! Permission resolution for the drive.
//!
//! Every user carries a set of grant strings (see [`types`] for the grammar).
//! [`PermissionEngine::resolve`] decides whether a user may perform an action
//! on a resource and reports which grant matched.
//!
//! # Resolution order
//!
//! 1. **System resource** (`id == "0"`): bypasses the general rules.
//!    `read` needs `read:sys-all` or `all:sys-all`; `create` and `update` are
//!    granted to admins by role alone; everything else is denied.
//! 2. **Shared access**: `"<action>:<userId>-<name>"` matches only if the user
//!    holds that exact grant *and* is listed in the resource's `sharedId`.
//! 3. **Candidates**, first match wins:
//!    `<action>:<name>`, `<action>:all`, `all:<name>`, then for the owner only
//!    `<action>:own-<name>`, `<action>:own-all`, `all:own-all`, and finally
//!    `all:all`.
//!
//! The candidate order is the specificity contract: resource-specific grants
//! beat action wildcards, which beat owner grants, which beat the global
//! wildcard.

pub mod cache;
pub mod error;
pub mod types;

use database::{Resource, User};
use std::sync::Arc;
use tracing::debug;

pub use cache::{LazyPermissionCache, PermissionCache};
pub use error::{AuthzError, Result};
pub use types::{Action, Grant, Scope};

/// Resolves `(user, action, resource)` triples against cached permission sets.
///
/// Safe to share across request tasks; resolution holds no locks beyond the
/// cache's own shard locks.
#[derive(Clone)]
pub struct PermissionEngine {
    cache: Arc<dyn PermissionCache>,
}

impl PermissionEngine {
    pub fn new(cache: Arc<dyn PermissionCache>) -> Self {
        Self { cache }
    }

    /// Engine backed by a fresh [`LazyPermissionCache`]
    pub fn with_lazy_cache() -> Self {
        Self::new(Arc::new(LazyPermissionCache::new()))
    }

    pub fn cache(&self) -> &Arc<dyn PermissionCache> {
        &self.cache
    }

    /// Return the grant that authorizes the request, or `None` when denied.
    pub fn resolve(&self, user: &User, action: Action, resource: &Resource) -> Option<Grant> {
        let decision = if resource.is_system() {
            self.resolve_system(user, action)
        } else {
            self.resolve_regular(user, action, resource)
        };

        match &decision {
            Some(grant) => debug!(
                "Allowed {} {} on {} via {}",
                user.id, action, resource.id, grant
            ),
            None => debug!("Denied {} {} on {}", user.id, action, resource.id),
        }

        decision
    }

    /// Like [`resolve`](Self::resolve) but turns a denial into an error.
    pub fn authorize(&self, user: &User, action: Action, resource: &Resource) -> Result<Grant> {
        self.resolve(user, action, resource)
            .ok_or_else(|| AuthzError::PermissionDenied {
                action: action.to_string(),
                resource: resource.name.clone(),
            })
    }

    fn resolve_system(&self, user: &User, action: Action) -> Option<Grant> {
        match action {
            Action::Read => {
                let granted = self.cache.permissions_for(user);
                [Action::Read, Action::All]
                    .into_iter()
                    .map(|a| Grant::new(a, Scope::SystemAll))
                    .find(|grant| granted.contains(&grant.key()))
            }
            // Role alone suffices; the grant is reported for the audit trail
            Action::Create | Action::Update if user.role.is_admin() => {
                Some(Grant::new(action, Scope::SystemAll))
            }
            _ => None,
        }
    }

    fn resolve_regular(&self, user: &User, action: Action, resource: &Resource) -> Option<Grant> {
        let granted = self.cache.permissions_for(user);

        let shared = Grant::new(
            action,
            Scope::Shared {
                user_id: user.id.clone(),
                resource: resource.name.clone(),
            },
        );
        if granted.contains(&shared.key()) && resource.is_shared_with(&user.id) {
            return Some(shared);
        }

        candidates(user, action, resource)
            .into_iter()
            .find(|grant| granted.contains(&grant.key()))
    }
}

/// The general candidate list for a non-system resource, in priority order.
pub fn candidates(user: &User, action: Action, resource: &Resource) -> Vec<Grant> {
    let name = || resource.name.clone();

    let mut list = vec![
        Grant::new(action, Scope::Named(name())),
        Grant::new(action, Scope::All),
        Grant::new(Action::All, Scope::Named(name())),
    ];

    if user.id == resource.owner_id {
        list.push(Grant::new(action, Scope::Own(name())));
        list.push(Grant::new(action, Scope::OwnAll));
        list.push(Grant::new(Action::All, Scope::OwnAll));
    }

    list.push(Grant::new(Action::All, Scope::All));
    list
}
