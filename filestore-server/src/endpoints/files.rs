use axum::extract::{Multipart, Path};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use axum_extra::extract::WithRejection;
use bytes::Bytes;
use filestore_service::{FileUpdate, NewFile};
use filestore_types::{File, permission};
use serde::{Deserialize, Serialize};

use crate::auth::AuthAwareService;
use crate::error::{ApiError, ApiResult};
use crate::state::ServiceState;

/// The MIME type used when an upload does not declare one.
const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

pub fn router() -> Router<ServiceState> {
    let file_routes = routing::get(file_get).put(file_update).delete(file_delete);

    Router::new()
        .route(
            "/buckets/{bucket_id}/files",
            routing::post(file_create).get(file_list),
        )
        .route("/buckets/{bucket_id}/files/{file_id}", file_routes)
        .route(
            "/buckets/{bucket_id}/files/{file_id}/download",
            routing::get(file_download),
        )
        .route(
            "/buckets/{bucket_id}/files/{file_id}/view",
            routing::get(file_view),
        )
        .route(
            "/buckets/{bucket_id}/files/{file_id}/preview",
            routing::get(file_preview),
        )
}

/// Response returned when listing files.
#[derive(Debug, Serialize)]
struct FileList {
    total: usize,
    files: Vec<File>,
}

#[derive(Debug, Deserialize)]
struct UpdateFileRequest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    permissions: Option<Vec<String>>,
}

/// Reads the upload form.
///
/// The form carries the `fileId`, the `file` itself, and any number of `permissions` or
/// `permissions[]` fields. Other fields are ignored.
async fn read_upload(mut multipart: Multipart) -> ApiResult<NewFile> {
    let mut file_id = None;
    let mut upload = None;
    let mut permissions: Option<Vec<String>> = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().map(str::to_owned);
        match field_name.as_deref() {
            Some("fileId") => file_id = Some(field.text().await?),
            Some("permissions") | Some("permissions[]") => {
                let value = field.text().await?;
                permissions.get_or_insert_default().push(value);
            }
            Some("file") => {
                let name = field.file_name().unwrap_or_default().to_owned();
                let mime_type = field
                    .content_type()
                    .unwrap_or(DEFAULT_MIME_TYPE)
                    .to_owned();
                let payload = field.bytes().await?;
                upload = Some((name, mime_type, payload));
            }
            _ => (),
        }
    }

    let id = file_id.ok_or_else(|| ApiError::BadRequest("missing `fileId` field".into()))?;
    let (name, mime_type, payload) =
        upload.ok_or_else(|| ApiError::BadRequest("missing `file` field".into()))?;
    let permissions = permissions.map(permission::parse_all).transpose()?;

    Ok(NewFile {
        id,
        name,
        mime_type,
        permissions,
        payload,
    })
}

async fn file_create(
    service: AuthAwareService,
    Path(bucket_id): Path<String>,
    WithRejection(multipart, _): WithRejection<Multipart, ApiError>,
) -> ApiResult<Response> {
    let new = read_upload(multipart).await?;
    let file = service.create_file(&bucket_id, new).await?;
    Ok((StatusCode::CREATED, Json(file)).into_response())
}

async fn file_list(
    service: AuthAwareService,
    Path(bucket_id): Path<String>,
) -> ApiResult<Json<FileList>> {
    let files = service.list_files(&bucket_id)?;
    Ok(Json(FileList {
        total: files.len(),
        files,
    }))
}

async fn file_get(
    service: AuthAwareService,
    Path((bucket_id, file_id)): Path<(String, String)>,
) -> ApiResult<Json<File>> {
    Ok(Json(service.get_file(&bucket_id, &file_id)?))
}

async fn file_update(
    service: AuthAwareService,
    Path((bucket_id, file_id)): Path<(String, String)>,
    WithRejection(Json(request), _): WithRejection<Json<UpdateFileRequest>, ApiError>,
) -> ApiResult<Json<File>> {
    let update = FileUpdate {
        name: request.name,
        permissions: request
            .permissions
            .map(permission::parse_all)
            .transpose()?,
    };

    Ok(Json(service.update_file(&bucket_id, &file_id, update)?))
}

async fn file_delete(
    service: AuthAwareService,
    Path((bucket_id, file_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    service.delete_file(&bucket_id, &file_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// How the contents of a file are presented to the client.
#[derive(Clone, Copy, Debug)]
enum Disposition {
    Attachment,
    Inline,
}

async fn file_download(
    service: AuthAwareService,
    Path((bucket_id, file_id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let (file, payload) = service.read_file(&bucket_id, &file_id).await?;
    Ok(content_response(&file, payload, Some(Disposition::Attachment)))
}

async fn file_view(
    service: AuthAwareService,
    Path((bucket_id, file_id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let (file, payload) = service.read_file(&bucket_id, &file_id).await?;
    Ok(content_response(&file, payload, Some(Disposition::Inline)))
}

/// Serves the original contents. Rendering thumbnails is left to an image service in front.
async fn file_preview(
    service: AuthAwareService,
    Path((bucket_id, file_id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let (file, payload) = service.read_file(&bucket_id, &file_id).await?;
    Ok(content_response(&file, payload, None))
}

fn content_response(file: &File, payload: Bytes, disposition: Option<Disposition>) -> Response {
    let mut headers = HeaderMap::new();

    let content_type = HeaderValue::from_str(&file.mime_type)
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_MIME_TYPE));
    headers.insert(header::CONTENT_TYPE, content_type);

    if let Some(disposition) = disposition {
        let value = content_disposition(disposition, &file.name);
        // File names that cannot be represented in a header are left out.
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
    }

    (headers, payload).into_response()
}

fn content_disposition(disposition: Disposition, file_name: &str) -> String {
    let kind = match disposition {
        Disposition::Attachment => "attachment",
        Disposition::Inline => "inline",
    };

    let mut escaped = String::with_capacity(file_name.len());
    for c in file_name.chars() {
        if c == '"' || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    format!("{kind}; filename=\"{escaped}\"")
}
