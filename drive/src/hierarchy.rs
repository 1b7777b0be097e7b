//! Folder structure operations on top of the credential store.
//!
//! The system resource (`id == "0"`) is the drive root. It is never deleted,
//! linked into, or shared through this module; attempts are reported as
//! [`DriveError::Conflict`].

use authz::{Action, PermissionEngine};
use database::{CredentialStore, Resource, User, SYSTEM_RESOURCE_ID};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::{DriveError, Result};

/// Outcome of a folder deletion that went ahead.
///
/// The folder itself is gone; `failed_children` counts children that were
/// denied or could not be removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FolderDeletion {
    pub failed_children: usize,
}

impl FolderDeletion {
    pub fn is_complete(&self) -> bool {
        self.failed_children == 0
    }
}

pub struct ResourceHierarchy {
    store: Arc<dyn CredentialStore>,
    engine: Arc<PermissionEngine>,
}

impl ResourceHierarchy {
    pub fn new(store: Arc<dyn CredentialStore>, engine: Arc<PermissionEngine>) -> Self {
        Self { store, engine }
    }

    /// Append `child_id` to a folder's content.
    pub async fn link_child(&self, parent: &Resource, child_id: &str) -> Result<()> {
        if parent.is_system() {
            return Err(system_conflict("linked into"));
        }
        if !parent.is_folder() {
            return Err(DriveError::NotAFolder(parent.name.clone()));
        }

        self.store.append_resource_child(parent, child_id).await?;
        debug!("Linked {} under {}", child_id, parent.name);
        Ok(())
    }

    /// Insert a resource record. Authorization is the caller's job.
    pub async fn create(&self, resource: &Resource) -> Result<()> {
        if resource.is_system() {
            return Err(DriveError::Conflict(format!(
                "id {} is reserved for the drive root",
                SYSTEM_RESOURCE_ID
            )));
        }

        self.store.insert_resource(resource).await?;
        info!("Created {} {} ({})", resource.kind, resource.name, resource.id);
        Ok(())
    }

    /// Remove a resource record. Parent linkage and children are left alone.
    pub async fn delete(&self, resource: &Resource) -> Result<()> {
        if resource.is_system() {
            return Err(system_conflict("deleted"));
        }

        self.store.delete_resource(resource).await?;
        info!("Deleted {} {} ({})", resource.kind, resource.name, resource.id);
        Ok(())
    }

    /// Check that `user` may create something at the drive root or inside
    /// `parent`.
    ///
    /// At the root the user needs `create` on the system resource; inside a
    /// folder they need `update` on that folder.
    pub async fn authorize_create(&self, user: &User, parent: Option<&Resource>) -> Result<()> {
        match parent {
            Some(parent) if !parent.is_system() => {
                if !parent.is_folder() {
                    return Err(DriveError::NotAFolder(parent.name.clone()));
                }
                self.engine.authorize(user, Action::Update, parent)?;
            }
            _ => {
                let root = self.store.find_resource_by_id(SYSTEM_RESOURCE_ID).await?;
                self.engine.authorize(user, Action::Create, &root)?;
            }
        }
        Ok(())
    }

    /// Authorize and create `resource` for `user`, either at the drive root or
    /// inside `parent`.
    ///
    /// Names are unique across the drive. If linking into the parent fails,
    /// the new record is removed again.
    pub async fn create_in(
        &self,
        user: &User,
        parent: Option<&Resource>,
        resource: Resource,
    ) -> Result<Resource> {
        match self.store.find_resource_by_name(&resource.name).await {
            Ok(_) => return Err(name_taken(&resource.name)),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e.into()),
        }

        self.authorize_create(user, parent).await?;
        self.create(&resource).await?;

        let parent = match parent {
            Some(parent) if !parent.is_system() => parent,
            _ => return Ok(resource),
        };

        if let Err(e) = self.link_child(parent, &resource.id).await {
            if let Err(cleanup) = self.store.delete_resource(&resource).await {
                error!(
                    "Failed to remove unlinked resource {}: {}",
                    resource.id, cleanup
                );
            }
            return Err(e);
        }

        Ok(resource)
    }

    /// Delete a folder, optionally together with its direct children.
    ///
    /// A non-empty folder without `recursive` is refused and nothing is
    /// touched. With `recursive`, each child needs its own `delete` grant;
    /// denials and store failures are counted and the loop moves on. The
    /// folder itself is deleted after the children are processed.
    pub async fn delete_folder(
        &self,
        folder: &Resource,
        user: &User,
        recursive: bool,
    ) -> Result<FolderDeletion> {
        if !folder.is_folder() {
            return Err(DriveError::NotAFolder(folder.name.clone()));
        }
        if folder.is_system() {
            return Err(system_conflict("deleted"));
        }
        if !folder.content.is_empty() && !recursive {
            return Err(DriveError::Conflict(format!(
                "folder {} is not empty",
                folder.name
            )));
        }

        let mut outcome = FolderDeletion::default();
        for child_id in &folder.content {
            if let Err(e) = self.delete_child(child_id, user).await {
                warn!(
                    "Could not remove {} from folder {}: {}",
                    child_id, folder.name, e
                );
                outcome.failed_children += 1;
            }
        }

        self.delete(folder).await?;

        if !outcome.is_complete() {
            warn!(
                "Folder {} removed, {} children could not be removed",
                folder.name, outcome.failed_children
            );
        }
        Ok(outcome)
    }

    async fn delete_child(&self, child_id: &str, user: &User) -> Result<()> {
        let child = self.store.find_resource_by_id(child_id).await?;
        self.engine.authorize(user, Action::Delete, &child)?;
        self.delete(&child).await
    }

    /// Add `user_id` to a resource's shared list.
    pub async fn share(&self, resource: &Resource, user_id: &str) -> Result<()> {
        if resource.is_system() {
            return Err(system_conflict("shared"));
        }

        self.store.append_shared_user(resource, user_id).await?;
        info!("Shared {} with {}", resource.name, user_id);
        Ok(())
    }
}

fn name_taken(name: &str) -> DriveError {
    DriveError::Conflict(format!("{} already exists", name))
}

fn system_conflict(verb: &str) -> DriveError {
    DriveError::Conflict(format!("the drive root cannot be {}", verb))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use database::{DatabaseError, MemoryStore, Result as StoreResult};
    use std::collections::HashSet;

    /// Delegates to a [`MemoryStore`] but fails deletes for chosen ids
    struct FlakyStore {
        inner: MemoryStore,
        undeletable: HashSet<String>,
    }

    #[async_trait]
    impl CredentialStore for FlakyStore {
        async fn find_user_by_id(&self, id: &str) -> StoreResult<User> {
            self.inner.find_user_by_id(id).await
        }

        async fn find_user_by_credentials(&self, name: &str, password: &str) -> StoreResult<User> {
            self.inner.find_user_by_credentials(name, password).await
        }

        async fn find_resource_by_name(&self, name: &str) -> StoreResult<Resource> {
            self.inner.find_resource_by_name(name).await
        }

        async fn find_resource_by_id(&self, id: &str) -> StoreResult<Resource> {
            self.inner.find_resource_by_id(id).await
        }

        async fn insert_resource(&self, resource: &Resource) -> StoreResult<()> {
            self.inner.insert_resource(resource).await
        }

        async fn delete_resource(&self, resource: &Resource) -> StoreResult<()> {
            if self.undeletable.contains(&resource.id) {
                return Err(DatabaseError::Other("disk on fire".to_string()));
            }
            self.inner.delete_resource(resource).await
        }

        async fn append_resource_child(&self, parent: &Resource, child_id: &str) -> StoreResult<()> {
            if self.undeletable.contains(&parent.id) {
                return Err(DatabaseError::Other("disk on fire".to_string()));
            }
            self.inner.append_resource_child(parent, child_id).await
        }

        async fn append_shared_user(&self, resource: &Resource, user_id: &str) -> StoreResult<()> {
            self.inner.append_shared_user(resource, user_id).await
        }

        async fn insert_user(&self, user: &User) -> StoreResult<()> {
            self.inner.insert_user(user).await
        }
    }

    fn hierarchy_over(store: Arc<dyn CredentialStore>) -> ResourceHierarchy {
        ResourceHierarchy::new(store, Arc::new(PermissionEngine::with_lazy_cache()))
    }

    fn editor(perms: &[&str]) -> User {
        User::new("u1", "alice", "editor").with_permissions(perms.iter().copied())
    }

    async fn seed_folder(store: &dyn CredentialStore, children: &[(&str, &str)]) -> Resource {
        let mut folder = Resource::folder("f1", "projects", "u1");
        for (id, owner) in children {
            let child = Resource::file(*id, format!("file-{}", id), *owner, format!("/tmp/{}", id));
            store.insert_resource(&child).await.unwrap();
            folder.content.push(id.to_string());
        }
        store.insert_resource(&folder).await.unwrap();
        folder
    }

    #[tokio::test]
    async fn test_recursive_delete_tolerates_denied_child() {
        let store = Arc::new(MemoryStore::with_system_resource());
        let folder = seed_folder(store.as_ref(), &[("c1", "u1"), ("c2", "u2")]).await;
        let hierarchy = hierarchy_over(store.clone());
        let user = editor(&["delete:own-all"]);

        let outcome = hierarchy.delete_folder(&folder, &user, true).await.unwrap();

        assert_eq!(outcome.failed_children, 1);
        assert!(!outcome.is_complete());
        assert!(store.find_resource_by_id("c1").await.unwrap_err().is_not_found());
        assert!(store.find_resource_by_id("c2").await.is_ok());
        assert!(store.find_resource_by_id("f1").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_non_recursive_delete_of_non_empty_folder_is_refused() {
        let store = Arc::new(MemoryStore::with_system_resource());
        let folder = seed_folder(store.as_ref(), &[("c1", "u1")]).await;
        let hierarchy = hierarchy_over(store.clone());
        let user = editor(&["all:all"]);

        let err = hierarchy.delete_folder(&folder, &user, false).await.unwrap_err();

        assert!(matches!(err, DriveError::Conflict(_)));
        assert!(store.find_resource_by_id("f1").await.is_ok());
        assert!(store.find_resource_by_id("c1").await.is_ok());
    }

    #[tokio::test]
    async fn test_empty_folder_deletes_without_recursive() {
        let store = Arc::new(MemoryStore::with_system_resource());
        let folder = seed_folder(store.as_ref(), &[]).await;
        let hierarchy = hierarchy_over(store.clone());

        let outcome = hierarchy
            .delete_folder(&folder, &editor(&[]), false)
            .await
            .unwrap();
        assert!(outcome.is_complete());
        assert_eq!(store.resource_count().await, 1);
    }

    #[tokio::test]
    async fn test_store_failures_and_missing_children_are_counted() {
        let inner = MemoryStore::with_system_resource();
        let folder = seed_folder(&inner, &[("c1", "u1"), ("c2", "u1")]).await;
        let mut folder = folder;
        folder.content.push("ghost".to_string());

        let store = Arc::new(FlakyStore {
            inner,
            undeletable: HashSet::from(["c1".to_string()]),
        });
        let hierarchy = hierarchy_over(store.clone());

        let outcome = hierarchy
            .delete_folder(&folder, &editor(&["all:all"]), true)
            .await
            .unwrap();

        assert_eq!(outcome.failed_children, 2);
        assert!(store.find_resource_by_id("c1").await.is_ok());
        assert!(store.find_resource_by_id("c2").await.is_err());
        assert!(store.find_resource_by_id("f1").await.is_err());
    }

    #[tokio::test]
    async fn test_folder_store_failure_is_fatal() {
        let inner = MemoryStore::with_system_resource();
        let folder = seed_folder(&inner, &[]).await;
        let store = Arc::new(FlakyStore {
            inner,
            undeletable: HashSet::from(["f1".to_string()]),
        });
        let hierarchy = hierarchy_over(store);

        let err = hierarchy
            .delete_folder(&folder, &editor(&["all:all"]), true)
            .await
            .unwrap_err();
        assert!(matches!(err, DriveError::Store(_)));
    }

    #[tokio::test]
    async fn test_system_resource_is_protected() {
        let store = Arc::new(MemoryStore::with_system_resource());
        let hierarchy = hierarchy_over(store.clone());
        let root = Resource::system();
        let admin = User::new("a1", "root", "admin").with_permissions(["all:all"]);

        assert!(matches!(
            hierarchy.delete(&root).await,
            Err(DriveError::Conflict(_))
        ));
        assert!(matches!(
            hierarchy.delete_folder(&root, &admin, true).await,
            Err(DriveError::Conflict(_))
        ));
        assert!(matches!(
            hierarchy.link_child(&root, "x").await,
            Err(DriveError::Conflict(_))
        ));
        assert!(matches!(
            hierarchy.share(&root, "u2").await,
            Err(DriveError::Conflict(_))
        ));
        assert!(matches!(
            hierarchy.create(&Resource::system()).await,
            Err(DriveError::Conflict(_))
        ));
        assert_eq!(store.resource_count().await, 1);
    }

    #[tokio::test]
    async fn test_delete_folder_rejects_files() {
        let store = Arc::new(MemoryStore::with_system_resource());
        let hierarchy = hierarchy_over(store);
        let file = Resource::file("c1", "notes", "u1", "/tmp/notes");

        assert!(matches!(
            hierarchy.delete_folder(&file, &editor(&["all:all"]), true).await,
            Err(DriveError::NotAFolder(_))
        ));
    }

    #[tokio::test]
    async fn test_create_at_root_requires_admin() {
        let store = Arc::new(MemoryStore::with_system_resource());
        let hierarchy = hierarchy_over(store.clone());
        let folder = Resource::folder("f1", "docs", "u1");

        let err = hierarchy
            .create_in(&editor(&["all:all"]), None, folder.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, DriveError::PermissionDenied(_)));

        let admin = User::new("a1", "root", "admin");
        hierarchy.create_in(&admin, None, folder).await.unwrap();
        assert!(store.find_resource_by_name("docs").await.is_ok());

        let root = store.find_resource_by_id(SYSTEM_RESOURCE_ID).await.unwrap();
        assert!(root.content.is_empty());
    }

    #[tokio::test]
    async fn test_create_in_folder_links_child() {
        let store = Arc::new(MemoryStore::with_system_resource());
        let parent = seed_folder(store.as_ref(), &[]).await;
        let hierarchy = hierarchy_over(store.clone());
        let user = editor(&["update:own-all"]);

        let child = Resource::folder("f2", "drafts", "u1");
        hierarchy.create_in(&user, Some(&parent), child).await.unwrap();

        let parent = store.find_resource_by_id("f1").await.unwrap();
        assert_eq!(parent.content, vec!["f2".to_string()]);

        let duplicate = Resource::folder("f3", "drafts", "u1");
        assert!(matches!(
            hierarchy.create_in(&user, Some(&parent), duplicate).await,
            Err(DriveError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_create_in_folder_requires_update_on_parent() {
        let store = Arc::new(MemoryStore::with_system_resource());
        let parent = seed_folder(store.as_ref(), &[]).await;
        let hierarchy = hierarchy_over(store.clone());
        let stranger = User::new("u2", "bob", "editor").with_permissions(["update:own-all"]);

        let child = Resource::folder("f2", "drafts", "u2");
        assert!(matches!(
            hierarchy.create_in(&stranger, Some(&parent), child).await,
            Err(DriveError::PermissionDenied(_))
        ));
        assert!(store.find_resource_by_id("f2").await.is_err());
    }

    #[tokio::test]
    async fn test_failed_link_removes_new_record() {
        let inner = MemoryStore::with_system_resource();
        let parent = seed_folder(&inner, &[]).await;
        let store = Arc::new(FlakyStore {
            inner,
            undeletable: HashSet::from(["f1".to_string()]),
        });
        let hierarchy = hierarchy_over(store.clone());

        let child = Resource::folder("f2", "drafts", "u1");
        let err = hierarchy
            .create_in(&editor(&["all:all"]), Some(&parent), child)
            .await
            .unwrap_err();

        assert!(matches!(err, DriveError::Store(_)));
        assert!(store.find_resource_by_id("f2").await.is_err());
    }

    #[tokio::test]
    async fn test_share_records_user_once() {
        let store = Arc::new(MemoryStore::with_system_resource());
        let folder = seed_folder(store.as_ref(), &[]).await;
        let hierarchy = hierarchy_over(store.clone());

        hierarchy.share(&folder, "u2").await.unwrap();
        hierarchy.share(&folder, "u2").await.unwrap();

        let folder = store.find_resource_by_id("f1").await.unwrap();
        assert_eq!(folder.shared_ids, vec!["u2".to_string()]);
    }

    #[tokio::test]
    async fn test_authorize_create_leaves_store_untouched() {
        let store = Arc::new(MemoryStore::with_system_resource());
        let parent = seed_folder(store.as_ref(), &[]).await;
        let hierarchy = hierarchy_over(store.clone());
        let stranger = User::new("u2", "bob", "editor").with_permissions(["read:all"]);

        assert!(matches!(
            hierarchy.authorize_create(&stranger, None).await,
            Err(DriveError::PermissionDenied(_))
        ));
        assert!(matches!(
            hierarchy.authorize_create(&stranger, Some(&parent)).await,
            Err(DriveError::PermissionDenied(_))
        ));
        hierarchy
            .authorize_create(&editor(&["update:own-all"]), Some(&parent))
            .await
            .unwrap();

        let file = Resource::file("c1", "notes", "u1", "/tmp/notes");
        assert!(matches!(
            hierarchy.authorize_create(&editor(&["all:all"]), Some(&file)).await,
            Err(DriveError::NotAFolder(_))
        ));
        assert_eq!(store.resource_count().await, 2);
    }

    #[tokio::test]
    async fn test_store_level_duplicate_is_conflict() {
        let store = Arc::new(MemoryStore::with_system_resource());
        let hierarchy = hierarchy_over(store.clone());

        hierarchy
            .create(&Resource::folder("f1", "docs", "u1"))
            .await
            .unwrap();
        assert!(matches!(
            hierarchy.create(&Resource::folder("f2", "docs", "u1")).await,
            Err(DriveError::Conflict(_))
        ));
    }
}
