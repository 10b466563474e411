//! Product and service endpoints.

use super::{
    deleted, found, not_found, AppState, IdParam, IdPath, JsonBody, OfferFilter, QueryParams,
};
use crate::error::ApiError;
use crate::store::catalog::{Product, ProductInput, Service, ServiceInput};
use crate::validation::{non_negative, require_text};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use serde_json::Value;
use tracing::info;

fn validate_product(input: &ProductInput) -> Result<(), ApiError> {
    require_text("nome", &input.nome, 100)?;
    non_negative("quantidade", input.quantidade as f64)?;
    non_negative("preco", input.preco)
}

fn validate_service(input: &ServiceInput) -> Result<(), ApiError> {
    require_text("nome", &input.nome, 100)?;
    non_negative("preco", input.preco)?;
    require_text("detalhes", &input.detalhes, 1000)
}

/// GET /api/produtos
pub async fn list_products(
    State(state): State<AppState>,
    WithRejection(Query(filter), _): QueryParams<OfferFilter>,
) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(state.db.list_products(filter.ofertas)?))
}

/// GET /api/produtos/:id
pub async fn get_product(
    State(state): State<AppState>,
    WithRejection(Path(IdPath { id }), _): IdParam,
) -> Result<Json<Product>, ApiError> {
    found(state.db.get_product(id)?, "Product", id)
}

/// POST /api/produtos (Employee)
pub async fn create_product(
    State(state): State<AppState>,
    WithRejection(Json(input), _): JsonBody<ProductInput>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    validate_product(&input)?;
    let product = state.db.create_product(&input)?;
    info!("📦 Product {} created: {}", product.id, product.nome);
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /api/produtos/:id (Employee)
pub async fn update_product(
    State(state): State<AppState>,
    WithRejection(Path(IdPath { id }), _): IdParam,
    WithRejection(Json(input), _): JsonBody<ProductInput>,
) -> Result<Json<Product>, ApiError> {
    validate_product(&input)?;
    if !state.db.update_product(id, &input)? {
        return Err(not_found("Product", id));
    }
    found(state.db.get_product(id)?, "Product", id)
}

/// DELETE /api/produtos/:id (Employee)
pub async fn delete_product(
    State(state): State<AppState>,
    WithRejection(Path(IdPath { id }), _): IdParam,
) -> Result<Json<Value>, ApiError> {
    if !state.db.delete_product(id)? {
        return Err(not_found("Product", id));
    }
    Ok(deleted("Product", id))
}

/// GET /api/servicos
pub async fn list_services(
    State(state): State<AppState>,
    WithRejection(Query(filter), _): QueryParams<OfferFilter>,
) -> Result<Json<Vec<Service>>, ApiError> {
    Ok(Json(state.db.list_services(filter.ofertas)?))
}

/// GET /api/servicos/:id
pub async fn get_service(
    State(state): State<AppState>,
    WithRejection(Path(IdPath { id }), _): IdParam,
) -> Result<Json<Service>, ApiError> {
    found(state.db.get_service(id)?, "Service", id)
}

/// POST /api/servicos (Admin only)
pub async fn create_service(
    State(state): State<AppState>,
    WithRejection(Json(input), _): JsonBody<ServiceInput>,
) -> Result<(StatusCode, Json<Service>), ApiError> {
    validate_service(&input)?;
    let service = state.db.create_service(&input)?;
    info!("🛠️ Service {} created: {}", service.id, service.nome);
    Ok((StatusCode::CREATED, Json(service)))
}

/// PUT /api/servicos/:id (Admin only)
pub async fn update_service(
    State(state): State<AppState>,
    WithRejection(Path(IdPath { id }), _): IdParam,
    WithRejection(Json(input), _): JsonBody<ServiceInput>,
) -> Result<Json<Service>, ApiError> {
    validate_service(&input)?;
    if !state.db.update_service(id, &input)? {
        return Err(not_found("Service", id));
    }
    found(state.db.get_service(id)?, "Service", id)
}

/// DELETE /api/servicos/:id (Admin only)
pub async fn delete_service(
    State(state): State<AppState>,
    WithRejection(Path(IdPath { id }), _): IdParam,
) -> Result<Json<Value>, ApiError> {
    if !state.db.delete_service(id)? {
        return Err(not_found("Service", id));
    }
    Ok(deleted("Service", id))
}
