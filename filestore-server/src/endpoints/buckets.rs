use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing};
use axum_extra::extract::WithRejection;
use filestore_service::BucketParams;
use filestore_types::{Bucket, permission};
use serde::{Deserialize, Serialize};

use crate::auth::AuthAwareService;
use crate::error::{ApiError, ApiResult};
use crate::state::ServiceState;

pub fn router() -> Router<ServiceState> {
    Router::new()
        .route("/buckets", routing::post(bucket_create).get(bucket_list))
        .route(
            "/buckets/{bucket_id}",
            routing::get(bucket_get).put(bucket_update).delete(bucket_delete),
        )
}

/// Bucket settings as sent by clients.
///
/// Permissions are taken as plain strings, so that a malformed permission is reported with its
/// own error rather than as a generic JSON error.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BucketSettings {
    name: String,
    #[serde(default)]
    permissions: Vec<String>,
    #[serde(default)]
    file_security: bool,
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default)]
    maximum_file_size: u64,
    #[serde(default)]
    allowed_file_extensions: Vec<String>,
    #[serde(default = "default_true")]
    encryption: bool,
    #[serde(default = "default_true")]
    antivirus: bool,
}

fn default_true() -> bool {
    true
}

impl TryFrom<BucketSettings> for BucketParams {
    type Error = ApiError;

    fn try_from(settings: BucketSettings) -> Result<Self, Self::Error> {
        Ok(BucketParams {
            name: settings.name,
            permissions: permission::parse_all(&settings.permissions)?,
            file_security: settings.file_security,
            enabled: settings.enabled,
            maximum_file_size: settings.maximum_file_size,
            allowed_file_extensions: settings.allowed_file_extensions,
            encryption: settings.encryption,
            antivirus: settings.antivirus,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateBucketRequest {
    bucket_id: String,
    #[serde(flatten)]
    settings: BucketSettings,
}

/// Response returned when listing buckets.
#[derive(Debug, Serialize)]
struct BucketList {
    total: usize,
    buckets: Vec<Bucket>,
}

async fn bucket_create(
    service: AuthAwareService,
    WithRejection(Json(request), _): WithRejection<Json<CreateBucketRequest>, ApiError>,
) -> ApiResult<Response> {
    let params = BucketParams::try_from(request.settings)?;
    let bucket = service.create_bucket(&request.bucket_id, params)?;
    Ok((StatusCode::CREATED, Json(bucket)).into_response())
}

async fn bucket_list(service: AuthAwareService) -> ApiResult<Json<BucketList>> {
    let buckets = service.list_buckets()?;
    Ok(Json(BucketList {
        total: buckets.len(),
        buckets,
    }))
}

async fn bucket_get(
    service: AuthAwareService,
    Path(bucket_id): Path<String>,
) -> ApiResult<Json<Bucket>> {
    Ok(Json(service.get_bucket(&bucket_id)?))
}

async fn bucket_update(
    service: AuthAwareService,
    Path(bucket_id): Path<String>,
    WithRejection(Json(settings), _): WithRejection<Json<BucketSettings>, ApiError>,
) -> ApiResult<Json<Bucket>> {
    let params = BucketParams::try_from(settings)?;
    Ok(Json(service.update_bucket(&bucket_id, params)?))
}

async fn bucket_delete(
    service: AuthAwareService,
    Path(bucket_id): Path<String>,
) -> ApiResult<StatusCode> {
    service.delete_bucket(&bucket_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
