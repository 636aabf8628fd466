//! Cost envelope routes.
//!
//! Every mutating endpoint goes through [`EnvelopeService`], which
//! serializes mutations per project and keeps totals current, so
//! handlers only translate between HTTP and the service.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::AppState;
use sitecost_core::envelope::LifecycleError;
use sitecost_core::import::ImportStrategy;
use sitecost_core::item::CostSideData;
use sitecost_core::procurement::NewProcurementLink;
use sitecost_shared::AppError;
use sitecost_shared::types::{CostItemId, ProjectId, PurchaseOrderId, TenderId};
use sitecost_store::{NewManualItem, ServiceError};

/// Creates the cost envelope routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/projects/{project_id}/cost-envelope", get(get_envelope))
        .route(
            "/projects/{project_id}/cost-envelope/draft",
            post(ensure_draft),
        )
        .route(
            "/projects/{project_id}/cost-envelope/promote",
            post(promote),
        )
        .route(
            "/projects/{project_id}/cost-envelope/import",
            post(import_from_tender),
        )
        .route(
            "/projects/{project_id}/cost-envelope/recompute",
            post(recompute),
        )
        .route("/projects/{project_id}/cost-envelope/totals", get(totals))
        .route("/projects/{project_id}/cost-envelope/items", post(add_item))
        .route(
            "/projects/{project_id}/cost-envelope/items/{item_id}/actual",
            put(update_actual_side),
        )
        .route(
            "/projects/{project_id}/cost-envelope/items/{item_id}",
            delete(remove_item),
        )
        .route(
            "/projects/{project_id}/cost-envelope/items/{item_id}/restore",
            post(restore_item),
        )
        .route(
            "/projects/{project_id}/cost-envelope/items/{item_id}/acknowledge",
            post(acknowledge_incoming_change),
        )
        .route(
            "/projects/{project_id}/cost-envelope/items/{item_id}/procurement-links",
            post(add_procurement_link),
        )
        .route(
            "/projects/{project_id}/cost-envelope/items/{item_id}/procurement-links/{po_id}",
            delete(remove_procurement_link),
        )
}

// ============================================================================
// Request Types
// ============================================================================

/// Request body for importing a tender BOQ.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    /// Tender whose priced BOQ is imported.
    pub tender_id: TenderId,
    /// Merge strategy: initial, merge, overwrite.
    pub strategy: ImportStrategy,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/projects/{project_id}/cost-envelope` - Full envelope.
async fn get_envelope(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
) -> impl IntoResponse {
    match state.service.get_envelope(project_id).await {
        Ok(Some(envelope)) => (StatusCode::OK, Json(json!({ "envelope": envelope }))).into_response(),
        Ok(None) => {
            error_response(&AppError::NotFound("Project has no cost envelope".into()))
        }
        Err(e) => {
            error!(error = %e, %project_id, "Failed to load envelope");
            map_service_error(&e)
        }
    }
}

/// POST `/projects/{project_id}/cost-envelope/draft` - Ensure a draft exists.
async fn ensure_draft(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
) -> impl IntoResponse {
    match state.service.ensure_draft(project_id).await {
        Ok(envelope) => {
            info!(%project_id, "Draft ensured");
            (StatusCode::OK, Json(json!({ "envelope": envelope }))).into_response()
        }
        Err(e) => {
            error!(error = %e, %project_id, "Failed to ensure draft");
            map_service_error(&e)
        }
    }
}

/// POST `/projects/{project_id}/cost-envelope/promote` - Promote draft to official.
async fn promote(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
) -> impl IntoResponse {
    match state.service.promote(project_id).await {
        Ok(envelope) => {
            info!(%project_id, "Draft promoted");
            (StatusCode::OK, Json(json!({ "envelope": envelope }))).into_response()
        }
        Err(e) => {
            error!(error = %e, %project_id, "Failed to promote draft");
            map_service_error(&e)
        }
    }
}

/// POST `/projects/{project_id}/cost-envelope/import` - Import a tender BOQ.
async fn import_from_tender(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
    Json(payload): Json<ImportRequest>,
) -> impl IntoResponse {
    match state
        .service
        .import_from_tender(project_id, payload.tender_id, payload.strategy)
        .await
    {
        Ok(outcome) => {
            info!(
                %project_id,
                tender_id = %payload.tender_id,
                strategy = %payload.strategy,
                added = outcome.added,
                updated = outcome.updated,
                conflicted = outcome.conflicted,
                removed = outcome.removed,
                "Tender BOQ imported"
            );
            (StatusCode::OK, Json(json!({ "outcome": outcome }))).into_response()
        }
        Err(e) => {
            error!(error = %e, %project_id, "Failed to import tender BOQ");
            map_service_error(&e)
        }
    }
}

/// POST `/projects/{project_id}/cost-envelope/recompute` - Force a totals pass.
async fn recompute(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
) -> impl IntoResponse {
    match state.service.recompute(project_id).await {
        Ok(envelope) => (StatusCode::OK, Json(json!({ "envelope": envelope }))).into_response(),
        Err(e) => {
            error!(error = %e, %project_id, "Failed to recompute totals");
            map_service_error(&e)
        }
    }
}

/// GET `/projects/{project_id}/cost-envelope/totals` - Totals and item stats.
async fn totals(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
) -> impl IntoResponse {
    match state.service.totals(project_id).await {
        Ok((totals, stats)) => (
            StatusCode::OK,
            Json(json!({ "totals": totals, "itemStats": stats })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, %project_id, "Failed to load totals");
            map_service_error(&e)
        }
    }
}

/// POST `/projects/{project_id}/cost-envelope/items` - Add a manual item.
async fn add_item(
    State(state): State<AppState>,
    Path(project_id): Path<ProjectId>,
    Json(payload): Json<NewManualItem>,
) -> impl IntoResponse {
    match state.service.add_item(project_id, payload).await {
        Ok(item_id) => {
            info!(%project_id, %item_id, "Manual item added");
            (StatusCode::CREATED, Json(json!({ "itemId": item_id }))).into_response()
        }
        Err(e) => {
            error!(error = %e, %project_id, "Failed to add item");
            map_service_error(&e)
        }
    }
}

/// PUT `/projects/{project_id}/cost-envelope/items/{item_id}/actual` - Replace
/// an item's actual side.
async fn update_actual_side(
    State(state): State<AppState>,
    Path((project_id, item_id)): Path<(ProjectId, CostItemId)>,
    Json(payload): Json<CostSideData>,
) -> impl IntoResponse {
    match state
        .service
        .update_actual_side(project_id, item_id, payload)
        .await
    {
        Ok(envelope) => (StatusCode::OK, Json(json!({ "envelope": envelope }))).into_response(),
        Err(e) => {
            error!(error = %e, %project_id, %item_id, "Failed to update actual side");
            map_service_error(&e)
        }
    }
}

/// DELETE `/projects/{project_id}/cost-envelope/items/{item_id}` - Soft remove.
async fn remove_item(
    State(state): State<AppState>,
    Path((project_id, item_id)): Path<(ProjectId, CostItemId)>,
) -> impl IntoResponse {
    match state.service.remove_item(project_id, item_id).await {
        Ok(envelope) => {
            info!(%project_id, %item_id, "Item removed");
            (StatusCode::OK, Json(json!({ "envelope": envelope }))).into_response()
        }
        Err(e) => {
            error!(error = %e, %project_id, %item_id, "Failed to remove item");
            map_service_error(&e)
        }
    }
}

/// POST `/projects/{project_id}/cost-envelope/items/{item_id}/restore` - Undo
/// a soft remove.
async fn restore_item(
    State(state): State<AppState>,
    Path((project_id, item_id)): Path<(ProjectId, CostItemId)>,
) -> impl IntoResponse {
    match state.service.restore_item(project_id, item_id).await {
        Ok(envelope) => {
            info!(%project_id, %item_id, "Item restored");
            (StatusCode::OK, Json(json!({ "envelope": envelope }))).into_response()
        }
        Err(e) => {
            error!(error = %e, %project_id, %item_id, "Failed to restore item");
            map_service_error(&e)
        }
    }
}

/// POST `/projects/{project_id}/cost-envelope/items/{item_id}/acknowledge` -
/// Clear the merge-conflict flag.
async fn acknowledge_incoming_change(
    State(state): State<AppState>,
    Path((project_id, item_id)): Path<(ProjectId, CostItemId)>,
) -> impl IntoResponse {
    match state
        .service
        .acknowledge_incoming_change(project_id, item_id)
        .await
    {
        Ok(envelope) => (StatusCode::OK, Json(json!({ "envelope": envelope }))).into_response(),
        Err(e) => {
            error!(error = %e, %project_id, %item_id, "Failed to acknowledge change");
            map_service_error(&e)
        }
    }
}

/// POST `/projects/{project_id}/cost-envelope/items/{item_id}/procurement-links` -
/// Link a purchase order.
async fn add_procurement_link(
    State(state): State<AppState>,
    Path((project_id, item_id)): Path<(ProjectId, CostItemId)>,
    Json(payload): Json<NewProcurementLink>,
) -> impl IntoResponse {
    match state
        .service
        .add_procurement_link(project_id, item_id, payload)
        .await
    {
        Ok(envelope) => {
            info!(%project_id, %item_id, "Procurement link added");
            (StatusCode::CREATED, Json(json!({ "envelope": envelope }))).into_response()
        }
        Err(e) => {
            error!(error = %e, %project_id, %item_id, "Failed to add procurement link");
            map_service_error(&e)
        }
    }
}

/// DELETE `.../items/{item_id}/procurement-links/{po_id}` - Unlink a
/// purchase order.
async fn remove_procurement_link(
    State(state): State<AppState>,
    Path((project_id, item_id, po_id)): Path<(ProjectId, CostItemId, PurchaseOrderId)>,
) -> impl IntoResponse {
    match state
        .service
        .remove_procurement_link(project_id, item_id, po_id)
        .await
    {
        Ok(envelope) => {
            info!(%project_id, %item_id, %po_id, "Procurement link removed");
            (StatusCode::OK, Json(json!({ "envelope": envelope }))).into_response()
        }
        Err(e) => {
            error!(error = %e, %project_id, %item_id, "Failed to remove procurement link");
            map_service_error(&e)
        }
    }
}

// ============================================================================
// Error Mapping
// ============================================================================

/// Maps service errors onto the shared application error taxonomy.
fn map_service_error(e: &ServiceError) -> axum::response::Response {
    let app_error = match e {
        ServiceError::Lifecycle(LifecycleError::NoDraft) | ServiceError::NoDraft => {
            AppError::BusinessRule("Project has no draft cost plan".into())
        }
        ServiceError::ItemNotFound(id) => AppError::NotFound(format!("Cost item: {id}")),
        ServiceError::TenderNotFound(id) => {
            AppError::NotFound(format!("Tender has no priced BOQ: {id}"))
        }
        ServiceError::PurchaseOrderNotFound(id) => {
            AppError::Validation(format!("Purchase order not found on project: {id}"))
        }
        ServiceError::Store(_) => AppError::Storage("An error occurred".into()),
    };
    error_response(&app_error)
}

/// Renders an application error as its HTTP response.
fn error_response(e: &AppError) -> axum::response::Response {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({
            "error": e.error_code(),
            "message": e.to_string()
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use tower::ServiceExt;

    use sitecost_core::events::NullEventSink;
    use sitecost_core::import::{PricedBoq, PricedBoqLine};
    use sitecost_store::backend::memory_operator;
    use sitecost_store::{
        EnvelopeService, EnvelopeStore, ProjectStore, PurchaseOrderStore, TenderBoqStore,
    };

    fn test_state() -> (AppState, TenderBoqStore) {
        let operator = memory_operator().unwrap();
        let tenders = TenderBoqStore::new(operator.clone());
        let service = EnvelopeService::new(
            EnvelopeStore::new(operator.clone()),
            tenders.clone(),
            PurchaseOrderStore::new(operator.clone()),
            ProjectStore::new(operator),
            Arc::new(NullEventSink),
        );
        (
            AppState {
                service: Arc::new(service),
            },
            tenders,
        )
    }

    fn router(state: AppState) -> axum::Router {
        crate::create_router(state)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn request(
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> axum::http::Request<axum::body::Body> {
        let builder = axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json");
        match body {
            Some(value) => builder
                .body(axum::body::Body::from(value.to_string()))
                .unwrap(),
            None => builder.body(axum::body::Body::empty()).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_health() {
        let (state, _) = test_state();
        let response = router(state)
            .oneshot(request("GET", "/api/v1/health", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "healthy");
    }

    #[tokio::test]
    async fn test_get_missing_envelope_is_404() {
        let (state, _) = test_state();
        let uri = format!("/api/v1/projects/{}/cost-envelope", ProjectId::new());
        let response = router(state).oneshot(request("GET", &uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_promote_without_draft_is_422() {
        let (state, _) = test_state();
        let uri = format!("/api/v1/projects/{}/cost-envelope/promote", ProjectId::new());
        let response = router(state)
            .oneshot(request("POST", &uri, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body_json(response).await["error"],
            "BUSINESS_RULE_VIOLATION"
        );
    }

    #[tokio::test]
    async fn test_draft_then_promote() {
        let (state, _) = test_state();
        let project_id = ProjectId::new();
        let app = router(state);

        let uri = format!("/api/v1/projects/{project_id}/cost-envelope/draft");
        let response = app
            .clone()
            .oneshot(request("POST", &uri, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let uri = format!("/api/v1/projects/{project_id}/cost-envelope/promote");
        let response = app.oneshot(request("POST", &uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["envelope"]["official"]["status"], "official");
    }

    #[tokio::test]
    async fn test_import_and_totals() {
        let (state, tenders) = test_state();
        let project_id = ProjectId::new();
        let tender_id = TenderId::new();
        tenders
            .put(&PricedBoq {
                tender_id,
                items: vec![PricedBoqLine {
                    id: "t-1".to_string(),
                    description: "Slab".to_string(),
                    unit: Some("m2".to_string()),
                    quantity: dec!(10),
                    unit_price: dec!(100),
                    total_price: dec!(1000),
                }],
            })
            .await
            .unwrap();
        let app = router(state);

        let uri = format!("/api/v1/projects/{project_id}/cost-envelope/import");
        let body = json!({ "tenderId": tender_id, "strategy": "initial" });
        let response = app
            .clone()
            .oneshot(request("POST", &uri, Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["outcome"]["added"], 1);

        let uri = format!("/api/v1/projects/{project_id}/cost-envelope/totals");
        let response = app.oneshot(request("GET", &uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["totals"]["estimatedTotal"], "1000");
        assert_eq!(json["itemStats"]["total"], 1);
    }

    #[tokio::test]
    async fn test_import_unknown_tender_is_404() {
        let (state, _) = test_state();
        let uri = format!(
            "/api/v1/projects/{}/cost-envelope/import",
            ProjectId::new()
        );
        let body = json!({ "tenderId": TenderId::new(), "strategy": "merge" });
        let response = router(state)
            .oneshot(request("POST", &uri, Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_add_item_then_remove() {
        let (state, _) = test_state();
        let project_id = ProjectId::new();
        let app = router(state);

        let uri = format!("/api/v1/projects/{project_id}/cost-envelope/items");
        let body = json!({
            "description": "Site hoarding",
            "unit": "m",
            "quantity": "50",
            "unitPrice": "20",
            "totalPrice": "1000"
        });
        let response = app
            .clone()
            .oneshot(request("POST", &uri, Some(body)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let item_id = body_json(response).await["itemId"]
            .as_str()
            .unwrap()
            .to_string();

        let uri = format!("/api/v1/projects/{project_id}/cost-envelope/items/{item_id}");
        let response = app.oneshot(request("DELETE", &uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["envelope"]["draft"]["items"][0]["state"]["isRemoved"], true);
    }

    #[tokio::test]
    async fn test_update_unknown_item_is_404() {
        let (state, _) = test_state();
        let project_id = ProjectId::new();
        let app = router(state);

        let uri = format!(
            "/api/v1/projects/{project_id}/cost-envelope/items/{}/actual",
            CostItemId::new()
        );
        let body = json!({
            "quantity": "1",
            "unitPrice": "0",
            "totalPrice": "0"
        });
        let response = app.oneshot(request("PUT", &uri, Some(body))).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_link_unknown_purchase_order_is_400() {
        let (state, _) = test_state();
        let project_id = ProjectId::new();
        let app = router(state.clone());

        let uri = format!("/api/v1/projects/{project_id}/cost-envelope/items");
        let body = json!({
            "description": "Rebar",
            "quantity": "1",
            "unitPrice": "1000",
            "totalPrice": "1000"
        });
        let response = app
            .clone()
            .oneshot(request("POST", &uri, Some(body)))
            .await
            .unwrap();
        let item_id = body_json(response).await["itemId"]
            .as_str()
            .unwrap()
            .to_string();

        let uri = format!(
            "/api/v1/projects/{project_id}/cost-envelope/items/{item_id}/procurement-links"
        );
        let body = json!({
            "purchaseOrderId": PurchaseOrderId::new(),
            "amount": "500",
            "allocationMode": "manual"
        });
        let response = app.oneshot(request("POST", &uri, Some(body))).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "VALIDATION_ERROR");
    }
}
