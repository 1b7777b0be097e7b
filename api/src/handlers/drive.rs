use authz::Action;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use database::{generate_id, Resource};
use tracing::{info, warn};

use crate::{
    error::{ApiError, ApiResult},
    middleware_hooks::CurrentUser,
    models::{
        CreateFolderRequest, DeleteFolderParams, DeleteResponse, ResourceResponse, ShareRequest,
        SuccessResponse, UploadParams,
    },
    AppState,
};

async fn find_by_name(state: &AppState, name: &str) -> ApiResult<Resource> {
    state.store.find_resource_by_name(name).await.map_err(|e| {
        if e.is_not_found() {
            ApiError::NotFound(format!("resource {}", name))
        } else {
            e.into()
        }
    })
}

async fn find_parent(state: &AppState, parent: Option<&str>) -> ApiResult<Option<Resource>> {
    match parent {
        Some(name) => find_by_name(state, name).await.map(Some),
        None => Ok(None),
    }
}

/// Download a file's bytes
///
/// GET /api/v1/drive/file/{name}
#[utoipa::path(
    get,
    path = "/api/v1/drive/file/{name}",
    params(("name" = String, Path, description = "File name")),
    responses(
        (status = 200, description = "File bytes", body = String, content_type = "application/octet-stream"),
        (status = 403, description = "Read not permitted", body = ApiErrorResponse),
        (status = 404, description = "No such file", body = ApiErrorResponse),
        (status = 409, description = "Resource is a folder", body = ApiErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "drive"
)]
pub async fn read_file(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(name): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let resource = find_by_name(&state, &name).await?;
    state.engine.authorize(&user, Action::Read, &resource)?;
    if resource.is_folder() {
        return Err(drive::DriveError::NotAFile(resource.name).into());
    }

    let bytes = state.files.read(&resource.location).await?;
    let disposition = format!("attachment; filename=\"{}\"", resource.name.replace('"', ""));

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

/// Delete a file and its stored bytes
///
/// DELETE /api/v1/drive/file/{name}
#[utoipa::path(
    delete,
    path = "/api/v1/drive/file/{name}",
    params(("name" = String, Path, description = "File name")),
    responses(
        (status = 200, description = "File deleted", body = DeleteResponse),
        (status = 403, description = "Delete not permitted", body = ApiErrorResponse),
        (status = 404, description = "No such file", body = ApiErrorResponse),
        (status = 409, description = "Resource is a folder", body = ApiErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "drive"
)]
pub async fn delete_file(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(name): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    let resource = find_by_name(&state, &name).await?;
    state.engine.authorize(&user, Action::Delete, &resource)?;
    if resource.is_folder() {
        return Err(drive::DriveError::NotAFile(resource.name).into());
    }

    state.hierarchy.delete(&resource).await?;
    if let Err(e) = state.files.remove(&resource.location).await {
        warn!("Deleted {} but its bytes remain: {}", resource.name, e);
    }

    Ok(Json(DeleteResponse {
        success: true,
        id: resource.id,
        failed_children: 0,
        message: format!("File {} deleted", resource.name),
    }))
}

/// Describe a folder
///
/// GET /api/v1/drive/folder/{name}
#[utoipa::path(
    get,
    path = "/api/v1/drive/folder/{name}",
    params(("name" = String, Path, description = "Folder name")),
    responses(
        (status = 200, description = "Folder", body = ResourceResponse),
        (status = 403, description = "Read not permitted", body = ApiErrorResponse),
        (status = 404, description = "No such folder", body = ApiErrorResponse),
        (status = 409, description = "Resource is a file", body = ApiErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "drive"
)]
pub async fn read_folder(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(name): Path<String>,
) -> ApiResult<Json<ResourceResponse>> {
    let resource = find_by_name(&state, &name).await?;
    state.engine.authorize(&user, Action::Read, &resource)?;
    if !resource.is_folder() {
        return Err(drive::DriveError::NotAFolder(resource.name).into());
    }

    Ok(Json(resource.into()))
}

/// Create a folder at the drive root or inside `parent`
///
/// POST /api/v1/drive/folder/{name}
#[utoipa::path(
    post,
    path = "/api/v1/drive/folder/{name}",
    params(("name" = String, Path, description = "Folder name")),
    request_body = CreateFolderRequest,
    responses(
        (status = 201, description = "Folder created", body = ResourceResponse),
        (status = 403, description = "Create not permitted", body = ApiErrorResponse),
        (status = 404, description = "Parent not found", body = ApiErrorResponse),
        (status = 409, description = "Name taken or parent is a file", body = ApiErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "drive"
)]
pub async fn create_folder(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(name): Path<String>,
    request: Option<Json<CreateFolderRequest>>,
) -> ApiResult<impl IntoResponse> {
    let request = request.map(|Json(request)| request).unwrap_or_default();
    let parent = find_parent(&state, request.parent.as_deref()).await?;

    let folder = Resource::folder(generate_id(), name, user.id.clone());
    let folder = state
        .hierarchy
        .create_in(&user, parent.as_ref(), folder)
        .await?;

    Ok((StatusCode::CREATED, Json(ResourceResponse::from(folder))))
}

/// Delete a folder, optionally with its direct children
///
/// DELETE /api/v1/drive/folder/{name}?recursive=
#[utoipa::path(
    delete,
    path = "/api/v1/drive/folder/{name}",
    params(
        ("name" = String, Path, description = "Folder name"),
        ("recursive" = Option<bool>, Query, description = "Also delete direct children")
    ),
    responses(
        (status = 200, description = "Folder deleted; failed_children counts children left behind", body = DeleteResponse),
        (status = 403, description = "Delete not permitted", body = ApiErrorResponse),
        (status = 404, description = "No such folder", body = ApiErrorResponse),
        (status = 409, description = "Folder not empty, or not a folder", body = ApiErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "drive"
)]
pub async fn delete_folder(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(name): Path<String>,
    Query(params): Query<DeleteFolderParams>,
) -> ApiResult<Json<DeleteResponse>> {
    let folder = find_by_name(&state, &name).await?;
    state.engine.authorize(&user, Action::Delete, &folder)?;

    let outcome = state
        .hierarchy
        .delete_folder(&folder, &user, params.recursive)
        .await?;

    let message = if outcome.is_complete() {
        format!("Folder {} deleted", folder.name)
    } else {
        format!(
            "Folder {} removed, {} children could not be removed",
            folder.name, outcome.failed_children
        )
    };

    Ok(Json(DeleteResponse {
        success: true,
        id: folder.id,
        failed_children: outcome.failed_children,
        message,
    }))
}

/// Upload a file from the multipart field `file`
///
/// POST /api/v1/drive/upload?parent=
#[utoipa::path(
    post,
    path = "/api/v1/drive/upload",
    params(("parent" = Option<String>, Query, description = "Parent folder name")),
    responses(
        (status = 201, description = "File stored", body = ResourceResponse),
        (status = 400, description = "No file field", body = ApiErrorResponse),
        (status = 403, description = "Create not permitted", body = ApiErrorResponse),
        (status = 409, description = "Name taken or parent is a file", body = ApiErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "drive"
)]
pub async fn upload_file(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<UploadParams>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let parent = find_parent(&state, params.parent.as_deref()).await?;
    // Nothing touches the files root until the user may create here
    state
        .hierarchy
        .authorize_create(&user, parent.as_ref())
        .await?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        upload = Some((file_name, bytes));
        break;
    }
    let (file_name, bytes) =
        upload.ok_or_else(|| ApiError::BadRequest("missing multipart field `file`".to_string()))?;

    let id = generate_id();
    let stored = state.files.write(&id, &file_name, &bytes).await?;
    let resource = Resource::file(id, stored.name, user.id.clone(), stored.location.clone());

    let resource = match state.hierarchy.create_in(&user, parent.as_ref(), resource).await {
        Ok(resource) => resource,
        Err(e) => {
            if let Err(cleanup) = state.files.remove(&stored.location).await {
                warn!("Failed to discard rejected upload {}: {}", stored.location, cleanup);
            }
            return Err(e.into());
        }
    };

    info!("{} uploaded {} ({} bytes)", user.name, resource.name, bytes.len());
    Ok((StatusCode::CREATED, Json(ResourceResponse::from(resource))))
}

/// Share a resource with another user
///
/// POST /api/v1/drive/share/{name}
#[utoipa::path(
    post,
    path = "/api/v1/drive/share/{name}",
    params(("name" = String, Path, description = "Resource name")),
    request_body = ShareRequest,
    responses(
        (status = 200, description = "Shared", body = SuccessResponse),
        (status = 403, description = "Update not permitted", body = ApiErrorResponse),
        (status = 404, description = "No such resource or user", body = ApiErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "drive"
)]
pub async fn share_resource(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(name): Path<String>,
    Json(request): Json<ShareRequest>,
) -> ApiResult<Json<SuccessResponse>> {
    let resource = find_by_name(&state, &name).await?;
    state.engine.authorize(&user, Action::Update, &resource)?;
    state.store.find_user_by_id(&request.user_id).await?;

    state.hierarchy.share(&resource, &request.user_id).await?;

    Ok(Json(SuccessResponse {
        success: true,
        message: format!("{} shared with {}", resource.name, request.user_id),
    }))
}
