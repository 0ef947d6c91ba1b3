use axum::{
    extract::{Query, State},
    Extension, Json,
};
use dealdb_core::{ProductRecord, SortKey};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct ProductQuery {
    pub sort: Option<String>,
}

/// `GET /products?sort=<key>`. Refreshes first when the catalog is stale.
pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ProductQuery>,
) -> Json<ApiResponse<Vec<ProductRecord>>> {
    let sort = SortKey::from_param(query.sort.as_deref());
    let data = state.catalog.list_products(sort).await;

    Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    })
}
