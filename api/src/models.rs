use chrono::{DateTime, Utc};
use database::{Resource, ResourceKind};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
}

/// Request a new capability key
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct KeyRequest {
    /// Random bytes in the key, 1 to 256 (default 32)
    pub length: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct KeyResponse {
    pub key: String,
}

#[derive(Debug, Deserialize)]
pub struct KeyVerifyParams {
    pub key: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct KeyVerifyResponse {
    pub valid: bool,
}

/// A drive entry as returned to clients. Disk locations are never exposed.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceResponse {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    #[serde(rename = "sharedId")]
    pub shared_id: Vec<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub content: Vec<String>,
}

impl From<Resource> for ResourceResponse {
    fn from(resource: Resource) -> Self {
        Self {
            id: resource.id,
            name: resource.name,
            owner_id: resource.owner_id,
            shared_id: resource.shared_ids,
            kind: match resource.kind {
                ResourceKind::File => "file".to_string(),
                ResourceKind::Folder => "folder".to_string(),
            },
            content: resource.content,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateFolderRequest {
    /// Name of the parent folder; the drive root when absent
    pub parent: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteFolderParams {
    #[serde(default)]
    pub recursive: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UploadParams {
    pub parent: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ShareRequest {
    pub user_id: String,
}

/// Delete response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteResponse {
    pub success: bool,
    pub id: String,
    pub failed_children: usize,
    pub message: String,
}

/// Generic success response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub store: StoreHealth,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StoreHealth {
    pub connected: bool,
    pub message: String,
}
