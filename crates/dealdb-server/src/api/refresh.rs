use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use dealdb_catalog::RefreshReport;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct RefreshRequest {
    refresh: serde_json::Value,
}

impl RefreshRequest {
    /// Accepts the string `"true"` and the boolean `true`.
    fn is_affirmative(&self) -> bool {
        match &self.refresh {
            serde_json::Value::Bool(b) => *b,
            serde_json::Value::String(s) => s == "true",
            _ => false,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct RefreshData {
    message: &'static str,
    report: RefreshReport,
}

/// `POST /refresh` with `{"refresh": "true"}`. Runs a full cycle before
/// responding.
pub(super) async fn post_refresh(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<RefreshData>>), ApiError> {
    let Json(request) =
        body.map_err(|e| ApiError::new(req_id.0.clone(), "bad_request", e.body_text()))?;

    if !request.is_affirmative() {
        tracing::warn!(value = %request.refresh, "refresh rejected: value is not \"true\"");
        return Err(ApiError::new(
            req_id.0,
            "forbidden",
            "refresh must be \"true\"",
        ));
    }

    let report = state.catalog.refresh().await.map_err(|e| {
        tracing::error!(error = %e, "refresh task failed");
        ApiError::new(req_id.0.clone(), "internal_error", "refresh did not complete")
    })?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse {
            data: RefreshData {
                message: "Successfully Refreshed Products",
                report,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}
