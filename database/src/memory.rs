//! In-memory credential store for tests and throwaway servers

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::models::{Resource, User};
use crate::password::verify_password;
use crate::store::CredentialStore;
use crate::{DatabaseError, Result};

/// A [`CredentialStore`] held entirely in process memory.
///
/// Resource names and ids are unique, like the SQLite store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, User>>,
    resources: RwLock<Vec<Resource>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store seeded with the system resource
    pub fn with_system_resource() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            resources: RwLock::new(vec![Resource::system()]),
        }
    }

    pub async fn resource_count(&self) -> usize {
        self.resources.read().await.len()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_user_by_id(&self, id: &str) -> Result<User> {
        self.users
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(format!("user {}", id)))
    }

    async fn find_user_by_credentials(&self, name: &str, password: &str) -> Result<User> {
        self.users
            .read()
            .await
            .values()
            .find(|user| user.name == name && verify_password(password, &user.password))
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound("user".to_string()))
    }

    async fn find_resource_by_name(&self, name: &str) -> Result<Resource> {
        self.resources
            .read()
            .await
            .iter()
            .find(|res| res.name == name)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(format!("resource {}", name)))
    }

    async fn find_resource_by_id(&self, id: &str) -> Result<Resource> {
        self.resources
            .read()
            .await
            .iter()
            .find(|res| res.id == id)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(format!("resource {}", id)))
    }

    async fn insert_resource(&self, resource: &Resource) -> Result<()> {
        let mut resources = self.resources.write().await;
        if resources
            .iter()
            .any(|res| res.id == resource.id || res.name == resource.name)
        {
            return Err(DatabaseError::Duplicate(format!("resource {}", resource.name)));
        }
        resources.push(resource.clone());
        Ok(())
    }

    async fn delete_resource(&self, resource: &Resource) -> Result<()> {
        let mut resources = self.resources.write().await;
        let before = resources.len();
        resources.retain(|res| res.id != resource.id);

        if resources.len() == before {
            return Err(DatabaseError::NotFound(format!("resource {}", resource.id)));
        }
        Ok(())
    }

    async fn append_resource_child(&self, parent: &Resource, child_id: &str) -> Result<()> {
        let mut resources = self.resources.write().await;
        let stored = resources
            .iter_mut()
            .find(|res| res.id == parent.id)
            .ok_or_else(|| DatabaseError::NotFound(format!("resource {}", parent.id)))?;

        stored.content.push(child_id.to_string());
        Ok(())
    }

    async fn append_shared_user(&self, resource: &Resource, user_id: &str) -> Result<()> {
        let mut resources = self.resources.write().await;
        let stored = resources
            .iter_mut()
            .find(|res| res.id == resource.id)
            .ok_or_else(|| DatabaseError::NotFound(format!("resource {}", resource.id)))?;

        if !stored.is_shared_with(user_id) {
            stored.shared_ids.push(user_id.to_string());
        }
        Ok(())
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.id == user.id || u.name == user.name) {
            return Err(DatabaseError::Duplicate(format!("user {}", user.name)));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(())
    }
}
