//! HTTP handlers for movement (ledger) endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::MovementWithProduct;
use crate::services::ledger::{
    LedgerService, MovementFilter, ReassignProductInput, RecordInboundInput, RecordOutboundInput,
    UpdateQuantityInput,
};
use crate::AppState;

/// Record an inbound movement (merchandise entry)
pub async fn record_inbound(
    State(state): State<AppState>,
    Json(input): Json<RecordInboundInput>,
) -> AppResult<(StatusCode, Json<MovementWithProduct>)> {
    let service = LedgerService::new(state.db);
    let movement = service.record_inbound(input).await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

/// Record an outbound movement (merchandise exit)
pub async fn record_outbound(
    State(state): State<AppState>,
    Json(input): Json<RecordOutboundInput>,
) -> AppResult<(StatusCode, Json<MovementWithProduct>)> {
    let service = LedgerService::new(state.db);
    let movement = service.record_outbound(input).await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

/// List movements with optional kind/product/date-range filters
pub async fn list_movements(
    State(state): State<AppState>,
    Query(filter): Query<MovementFilter>,
) -> AppResult<Json<Vec<MovementWithProduct>>> {
    let service = LedgerService::new(state.db);
    let movements = service.list_movements(filter).await?;
    Ok(Json(movements))
}

/// Get one movement with its product
pub async fn get_movement(
    State(state): State<AppState>,
    Path(movement_id): Path<Uuid>,
) -> AppResult<Json<MovementWithProduct>> {
    let service = LedgerService::new(state.db);
    let movement = service.get_movement(movement_id).await?;
    Ok(Json(movement))
}

/// Void an active movement, reversing its stock effect
pub async fn void_movement(
    State(state): State<AppState>,
    Path(movement_id): Path<Uuid>,
) -> AppResult<Json<MovementWithProduct>> {
    let service = LedgerService::new(state.db);
    let movement = service.void_movement(movement_id).await?;
    Ok(Json(movement))
}

/// Edit an active movement's quantity
pub async fn update_movement_quantity(
    State(state): State<AppState>,
    Path(movement_id): Path<Uuid>,
    Json(input): Json<UpdateQuantityInput>,
) -> AppResult<Json<MovementWithProduct>> {
    let service = LedgerService::new(state.db);
    let movement = service.update_quantity(movement_id, input).await?;
    Ok(Json(movement))
}

/// Reassign an active movement to another product
pub async fn reassign_movement_product(
    State(state): State<AppState>,
    Path(movement_id): Path<Uuid>,
    Json(input): Json<ReassignProductInput>,
) -> AppResult<Json<MovementWithProduct>> {
    let service = LedgerService::new(state.db);
    let movement = service.reassign_product(movement_id, input).await?;
    Ok(Json(movement))
}
