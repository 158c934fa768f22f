// src/handlers/inventory.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::{
        error::{ApiError, AppError},
        validation::{min_not_over_max, not_negative, positive},
    },
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{CompanyOwnerOnly, CompanyStaff, RequireRole},
        tenancy::TenantContext,
    },
    models::{
        inventory::{CompanyMaterial, MaterialSaleDetail, TransferStatus, Warehouse, WarehouseItem, WarehouseTransfer},
        report::ReportPeriod,
    },
    services::inventory_service::SaleItemInput,
};

// =============================================================================
//  1. MATERIAIS
// =============================================================================

// GET /api/materials
#[utoipa::path(
    get,
    path = "/api/materials",
    tag = "Inventory",
    responses((status = 200, description = "Catálogo de materiais", body = Vec<CompanyMaterial>)),
    security(("api_jwt" = []))
)]
pub async fn list_materials(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<CompanyStaff>,
) -> Result<impl IntoResponse, ApiError> {
    let materials = app_state
        .inventory_service
        .list_materials(&app_state.db_pool, tenant.company_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(materials)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMaterialPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Gel inseticida 30g")]
    pub name: String,

    #[schema(example = "un")]
    pub unit: Option<String>,

    #[validate(custom(function = "not_negative"))]
    #[schema(value_type = f64, example = 45.00)]
    pub price: Decimal,
}

// POST /api/materials
#[utoipa::path(
    post,
    path = "/api/materials",
    tag = "Inventory",
    request_body = CreateMaterialPayload,
    responses(
        (status = 201, description = "Material criado", body = CompanyMaterial),
        (status = 409, description = "Material com esse nome já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_material(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<CompanyOwnerOnly>,
    Json(payload): Json<CreateMaterialPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let material = app_state
        .inventory_service
        .create_material(
            &app_state.db_pool,
            tenant.company_id,
            payload.name.trim(),
            payload.unit.as_deref(),
            payload.price,
        )
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(material)))
}

// =============================================================================
//  2. VENDAS DE MATERIAL
// =============================================================================

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleItemPayload {
    pub material_id: Uuid,

    #[validate(custom(function = "positive"))]
    #[schema(value_type = f64, example = 2)]
    pub quantity: Decimal,

    #[validate(custom(function = "not_negative"))]
    #[schema(value_type = f64, example = 45.00)]
    pub unit_price: Decimal,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordSalePayload {
    pub customer_id: Uuid,
    pub branch_id: Option<Uuid>,
    // Vincula a venda à visita (atribuição ao operador no relatório)
    pub visit_id: Option<Uuid>,
    pub sold_at: Option<DateTime<Utc>>,
    #[validate(length(max = 2000, message = "too_long"))]
    pub notes: Option<String>,

    #[validate(length(min = 1, message = "required"), nested)]
    pub items: Vec<SaleItemPayload>,
}

// POST /api/sales
#[utoipa::path(
    post,
    path = "/api/sales",
    tag = "Inventory",
    request_body = RecordSalePayload,
    responses(
        (status = 201, description = "Venda registrada", body = MaterialSaleDetail),
        (status = 404, description = "Cliente, filial, visita ou material não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn record_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<CompanyStaff>,
    Json(payload): Json<RecordSalePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let items: Vec<SaleItemInput> = payload
        .items
        .iter()
        .map(|item| SaleItemInput {
            material_id: item.material_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
        })
        .collect();

    let sale = app_state
        .inventory_service
        .record_sale(
            &app_state.db_pool,
            tenant.company_id,
            payload.customer_id,
            payload.branch_id,
            payload.visit_id,
            payload.sold_at.unwrap_or_else(Utc::now),
            payload.notes.as_deref(),
            &items,
        )
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(sale)))
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SalesQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
    #[param(value_type = Option<String>, format = Date)]
    pub start: Option<NaiveDate>,
    #[param(value_type = Option<String>, format = Date)]
    pub end: Option<NaiveDate>,
}

// GET /api/sales
#[utoipa::path(
    get,
    path = "/api/sales",
    tag = "Inventory",
    params(SalesQuery),
    responses(
        (status = 200, description = "Vendas do período com itens", body = Vec<MaterialSaleDetail>),
        (status = 400, description = "Período inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_sales(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<CompanyOwnerOnly>,
    Query(query): Query<SalesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let result: Result<Vec<MaterialSaleDetail>, AppError> = async {
        let period = ReportPeriod::resolve(query.year, query.month, query.start, query.end)?;
        app_state
            .inventory_service
            .list_sales(&app_state.db_pool, tenant.company_id, &period)
            .await
    }
    .await;

    let sales = result.map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::OK, Json(sales)))
}

// =============================================================================
//  3. DEPÓSITOS E SALDOS
// =============================================================================

// GET /api/warehouses
#[utoipa::path(
    get,
    path = "/api/warehouses",
    tag = "Inventory",
    responses((status = 200, description = "Depósitos da empresa", body = Vec<Warehouse>)),
    security(("api_jwt" = []))
)]
pub async fn list_warehouses(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<CompanyStaff>,
) -> Result<impl IntoResponse, ApiError> {
    let warehouses = app_state
        .inventory_service
        .list_warehouses(&app_state.db_pool, tenant.company_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(warehouses)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateWarehousePayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Depósito Central")]
    pub name: String,
    pub location: Option<String>,
}

// POST /api/warehouses
#[utoipa::path(
    post,
    path = "/api/warehouses",
    tag = "Inventory",
    request_body = CreateWarehousePayload,
    responses(
        (status = 201, description = "Depósito criado", body = Warehouse),
        (status = 409, description = "Limite de depósitos do plano atingido")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_warehouse(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<CompanyOwnerOnly>,
    Json(payload): Json<CreateWarehousePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let warehouse = app_state
        .inventory_service
        .create_warehouse(&app_state.db_pool, tenant.company_id, payload.name.trim(), payload.location.as_deref())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(warehouse)))
}

// GET /api/warehouses/{id}/items
#[utoipa::path(
    get,
    path = "/api/warehouses/{id}/items",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID do depósito")),
    responses(
        (status = 200, description = "Saldos do depósito", body = Vec<WarehouseItem>),
        (status = 404, description = "Depósito não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_items(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<CompanyStaff>,
    Path(warehouse_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let items = app_state
        .inventory_service
        .list_items(&app_state.db_pool, tenant.company_id, warehouse_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(items)))
}

fn thresholds_in_order(payload: &SetItemPayload) -> Result<(), ValidationError> {
    min_not_over_max(payload.min_quantity, payload.max_quantity)
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "thresholds_in_order"))]
pub struct SetItemPayload {
    #[validate(custom(function = "not_negative"))]
    #[schema(value_type = f64, example = 20)]
    pub quantity: Decimal,

    #[validate(custom(function = "not_negative"))]
    #[schema(value_type = f64, example = 5)]
    pub min_quantity: Decimal,

    #[schema(value_type = Option<f64>, example = 50)]
    pub max_quantity: Option<Decimal>,
}

// PUT /api/warehouses/{id}/items/{material_id}
#[utoipa::path(
    put,
    path = "/api/warehouses/{id}/items/{material_id}",
    tag = "Inventory",
    request_body = SetItemPayload,
    params(
        ("id" = Uuid, Path, description = "ID do depósito"),
        ("material_id" = Uuid, Path, description = "ID do material")
    ),
    responses(
        (status = 200, description = "Saldo e limites gravados", body = WarehouseItem),
        (status = 400, description = "Mínimo maior que o máximo")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_item(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<CompanyOwnerOnly>,
    Path((warehouse_id, material_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<SetItemPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let item = app_state
        .inventory_service
        .set_item(
            &app_state.db_pool,
            tenant.company_id,
            warehouse_id,
            material_id,
            payload.quantity,
            payload.min_quantity,
            payload.max_quantity,
        )
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(item)))
}

// GET /api/inventory/low-stock
#[utoipa::path(
    get,
    path = "/api/inventory/low-stock",
    tag = "Inventory",
    responses((status = 200, description = "Itens no mínimo ou abaixo dele", body = Vec<WarehouseItem>)),
    security(("api_jwt" = []))
)]
pub async fn low_stock(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<CompanyStaff>,
) -> Result<impl IntoResponse, ApiError> {
    let items = app_state
        .inventory_service
        .low_stock(&app_state.db_pool, tenant.company_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(items)))
}

// =============================================================================
//  4. TRANSFERÊNCIAS
// =============================================================================

#[derive(Debug, Deserialize, IntoParams)]
pub struct TransferListQuery {
    #[param(inline)]
    pub status: Option<TransferStatus>,
}

// GET /api/transfers
#[utoipa::path(
    get,
    path = "/api/transfers",
    tag = "Inventory",
    params(TransferListQuery),
    responses((status = 200, description = "Transferências entre depósitos", body = Vec<WarehouseTransfer>)),
    security(("api_jwt" = []))
)]
pub async fn list_transfers(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<CompanyStaff>,
    Query(query): Query<TransferListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let transfers = app_state
        .inventory_service
        .list_transfers(&app_state.db_pool, tenant.company_id, query.status)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(transfers)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestTransferPayload {
    pub from_warehouse_id: Uuid,
    pub to_warehouse_id: Uuid,
    pub material_id: Uuid,

    #[validate(custom(function = "positive"))]
    #[schema(value_type = f64, example = 10)]
    pub quantity: Decimal,
}

// POST /api/transfers
#[utoipa::path(
    post,
    path = "/api/transfers",
    tag = "Inventory",
    request_body = RequestTransferPayload,
    responses(
        (status = 201, description = "Transferência solicitada (pendente)", body = WarehouseTransfer),
        (status = 404, description = "Depósito ou material não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn request_transfer(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<CompanyStaff>,
    Json(payload): Json<RequestTransferPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let transfer = app_state
        .inventory_service
        .request_transfer(
            &app_state.db_pool,
            tenant.company_id,
            payload.from_warehouse_id,
            payload.to_warehouse_id,
            payload.material_id,
            payload.quantity,
            tenant.profile_id,
        )
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(transfer)))
}

// POST /api/transfers/{id}/approve
#[utoipa::path(
    post,
    path = "/api/transfers/{id}/approve",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID da transferência")),
    responses(
        (status = 200, description = "Estoque movido e transferência aprovada", body = WarehouseTransfer),
        (status = 409, description = "Transferência já decidida"),
        (status = 422, description = "Saldo insuficiente na origem")
    ),
    security(("api_jwt" = []))
)]
pub async fn approve_transfer(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<CompanyOwnerOnly>,
    Path(transfer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let transfer = app_state
        .inventory_service
        .approve_transfer(&app_state.db_pool, tenant.company_id, transfer_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(transfer)))
}

// POST /api/transfers/{id}/reject
#[utoipa::path(
    post,
    path = "/api/transfers/{id}/reject",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "ID da transferência")),
    responses(
        (status = 200, description = "Transferência rejeitada", body = WarehouseTransfer),
        (status = 409, description = "Transferência já decidida")
    ),
    security(("api_jwt" = []))
)]
pub async fn reject_transfer(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<CompanyOwnerOnly>,
    Path(transfer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let transfer = app_state
        .inventory_service
        .reject_transfer(&app_state.db_pool, tenant.company_id, transfer_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(transfer)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_above_max_is_rejected() {
        let payload = SetItemPayload {
            quantity: Decimal::from(10),
            min_quantity: Decimal::from(8),
            max_quantity: Some(Decimal::from(5)),
        };
        assert!(payload.validate().is_err());

        let open_ended = SetItemPayload { max_quantity: None, ..payload };
        assert!(open_ended.validate().is_ok());
    }

    #[test]
    fn sale_items_are_validated() {
        let payload = RecordSalePayload {
            customer_id: Uuid::new_v4(),
            branch_id: None,
            visit_id: None,
            sold_at: None,
            notes: None,
            items: vec![SaleItemPayload {
                material_id: Uuid::new_v4(),
                quantity: Decimal::ZERO,
                unit_price: Decimal::from(10),
            }],
        };
        assert!(payload.validate().is_err());

        let empty = RecordSalePayload { items: vec![], ..payload };
        assert!(empty.validate().is_err());
    }
}
