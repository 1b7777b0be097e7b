//! Records persisted by the credential store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::DatabaseError;

/// Id of the distinguished drive root. It can never be deleted or have its
/// content mutated through the hierarchy operations.
pub const SYSTEM_RESOURCE_ID: &str = "0";

/// Name the system resource is seeded with.
pub const SYSTEM_RESOURCE_NAME: &str = "drive";

/// A user's role. Only `admin` carries meaning; anything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Other(String),
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "admin",
            Role::Other(role) => role,
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        if value == "admin" {
            Role::Admin
        } else {
            Role::Other(value)
        }
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        Role::from(value.to_string())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A drive user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub role: Role,
    /// Permission grant strings, `"<action>:<scope>"`
    pub permissions: Vec<String>,
    /// Argon2 PHC string; never sent back out
    #[serde(default, skip_serializing)]
    pub password: String,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: impl Into<Role>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: role.into(),
            permissions: Vec::new(),
            password: String::new(),
        }
    }

    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_password_hash(mut self, hash: impl Into<String>) -> Self {
        self.password = hash.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    File,
    Folder,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::File => "file",
            ResourceKind::Folder => "folder",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(ResourceKind::File),
            "folder" => Ok(ResourceKind::Folder),
            other => Err(DatabaseError::Other(format!(
                "Unknown resource type: {}",
                other
            ))),
        }
    }
}

/// A file or folder in the drive tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    #[serde(rename = "sharedId", default)]
    pub shared_ids: Vec<String>,
    #[serde(default)]
    pub location: String,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    /// Child resource ids, in insertion order. Always empty for files.
    #[serde(default)]
    pub content: Vec<String>,
}

impl Resource {
    /// Create a new, empty folder owned by `owner_id`.
    pub fn folder(
        id: impl Into<String>,
        name: impl Into<String>,
        owner_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            owner_id: owner_id.into(),
            shared_ids: Vec::new(),
            location: String::new(),
            kind: ResourceKind::Folder,
            content: Vec::new(),
        }
    }

    /// Create a new file record whose bytes live at `location`.
    pub fn file(
        id: impl Into<String>,
        name: impl Into<String>,
        owner_id: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            owner_id: owner_id.into(),
            shared_ids: Vec::new(),
            location: location.into(),
            kind: ResourceKind::File,
            content: Vec::new(),
        }
    }

    /// The drive root every deployment is seeded with.
    pub fn system() -> Self {
        Self::folder(SYSTEM_RESOURCE_ID, SYSTEM_RESOURCE_NAME, SYSTEM_RESOURCE_ID)
    }

    pub fn is_system(&self) -> bool {
        self.id == SYSTEM_RESOURCE_ID
    }

    pub fn is_folder(&self) -> bool {
        self.kind == ResourceKind::Folder
    }

    pub fn is_shared_with(&self, user_id: &str) -> bool {
        self.shared_ids.iter().any(|id| id == user_id)
    }
}

/// Generate a fresh resource or user id
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
