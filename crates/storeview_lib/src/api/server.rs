use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use storeview_common_types::Address;
use tracing::*;

use super::ApiContext;
use crate::records::fetch_records;
use crate::schema::world;
use crate::views;
use crate::STOREVIEW_VERSION;

/// A fatal request failure. Unresolved joins are not errors; they are
/// already represented in the view output itself.
pub(super) enum ApiError {
    BadRequest(String),
    Internal(anyhow::Error),
}

impl<E: Into<anyhow::Error>> From<E> for ApiError {
    fn from(err: E) -> Self {
        ApiError::Internal(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Internal(err) => {
                error!(error = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": err.to_string() })),
                )
                    .into_response()
            }
        }
    }
}

pub(super) async fn index() -> impl IntoResponse {
    Json(json!({
        "message": "storeview: derived views over the world's record log",
        "version": STOREVIEW_VERSION,
    }))
}

pub(super) async fn materials(
    State(ctx): State<Arc<ApiContext>>,
) -> Result<impl IntoResponse, ApiError> {
    let records = fetch_records(ctx.source.as_ref(), &world().all()).await?;
    Ok(Json(views::build_materials(&records)?))
}

pub(super) async fn recipes(
    State(ctx): State<Arc<ApiContext>>,
) -> Result<impl IntoResponse, ApiError> {
    let records = fetch_records(ctx.source.as_ref(), &world().all()).await?;
    let materials = views::build_materials(&records)?;
    Ok(Json(views::build_recipes(&records, &materials)?))
}

pub(super) async fn orders(
    State(ctx): State<Arc<ApiContext>>,
) -> Result<impl IntoResponse, ApiError> {
    let records = fetch_records(ctx.source.as_ref(), &world().all()).await?;
    Ok(Json(views::build_orders(
        &records,
        &ctx.config.material_labels,
    )?))
}

pub(super) async fn pod_topology(
    State(ctx): State<Arc<ApiContext>>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let address: Address = address
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid address: {address}")))?;
    Ok(Json(
        views::build_pod_topology(ctx.source.as_ref(), address).await?,
    ))
}
