// src/handlers/operations.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    db::operations_repo::VisitChanges,
    middleware::{
        i18n::Locale,
        rbac::{CompanyOwnerOnly, CompanyStaff, RequireRole},
        tenancy::TenantContext,
    },
    models::{
        operations::{Operator, Visit, VisitStatus},
        report::ReportPeriod,
    },
    services::operation_service::NewVisit,
};

// =============================================================================
//  1. OPERADORES
// =============================================================================

// GET /api/operators
#[utoipa::path(
    get,
    path = "/api/operators",
    tag = "Operations",
    responses((status = 200, description = "Operadores da empresa", body = Vec<Operator>)),
    security(("api_jwt" = []))
)]
pub async fn list_operators(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<CompanyStaff>,
) -> Result<impl IntoResponse, ApiError> {
    let operators = app_state
        .operations_service
        .list_operators(&app_state.db_pool, tenant.company_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(operators)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOperatorPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "João Técnico")]
    pub full_name: String,

    pub phone: Option<String>,

    #[validate(email(message = "invalid_email"))]
    #[schema(example = "joao@dedetizadora.com")]
    pub email: String,

    #[validate(length(min = 6, message = "password_too_short"))]
    pub password: String,
}

// POST /api/operators
#[utoipa::path(
    post,
    path = "/api/operators",
    tag = "Operations",
    request_body = CreateOperatorPayload,
    responses(
        (status = 201, description = "Operador criado com login próprio", body = Operator),
        (status = 409, description = "Limite de operadores do plano atingido"),
        (status = 502, description = "Falha na função remota de criação de login")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_operator(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<CompanyOwnerOnly>,
    Json(payload): Json<CreateOperatorPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let operator = app_state
        .operations_service
        .create_operator(
            &app_state.db_pool,
            tenant.company_id,
            payload.full_name.trim(),
            payload.phone.as_deref(),
            payload.email.trim(),
            &payload.password,
        )
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(operator)))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetOperatorActivePayload {
    pub is_active: bool,
}

// PUT /api/operators/{id}/active
#[utoipa::path(
    put,
    path = "/api/operators/{id}/active",
    tag = "Operations",
    request_body = SetOperatorActivePayload,
    params(("id" = Uuid, Path, description = "ID do operador")),
    responses(
        (status = 200, description = "Operador atualizado", body = Operator),
        (status = 404, description = "Operador não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_operator_active(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<CompanyOwnerOnly>,
    Path(operator_id): Path<Uuid>,
    Json(payload): Json<SetOperatorActivePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let operator = app_state
        .operations_service
        .set_operator_active(&app_state.db_pool, tenant.company_id, operator_id, payload.is_active)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(operator)))
}

// =============================================================================
//  2. VISITAS
// =============================================================================

#[derive(Debug, Deserialize, IntoParams)]
pub struct VisitListQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
    #[param(value_type = Option<String>, format = Date)]
    pub start: Option<NaiveDate>,
    #[param(value_type = Option<String>, format = Date)]
    pub end: Option<NaiveDate>,
    #[param(inline)]
    pub status: Option<VisitStatus>,
    pub operator_id: Option<Uuid>,
}

// GET /api/visits
#[utoipa::path(
    get,
    path = "/api/visits",
    tag = "Operations",
    params(VisitListQuery),
    responses(
        (status = 200, description = "Visitas do período", body = Vec<Visit>),
        (status = 400, description = "Período inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_visits(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<CompanyStaff>,
    Query(query): Query<VisitListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let result: Result<Vec<Visit>, AppError> = async {
        let period = ReportPeriod::resolve(query.year, query.month, query.start, query.end)?;
        app_state
            .operations_service
            .list_visits(&app_state.db_pool, tenant.company_id, &period, query.status, query.operator_id)
            .await
    }
    .await;

    let visits = result.map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::OK, Json(visits)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateVisitPayload {
    pub customer_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub operator_id: Option<Uuid>,
    pub scheduled_at: DateTime<Utc>,
    #[validate(length(max = 2000, message = "too_long"))]
    pub notes: Option<String>,
}

// POST /api/visits
#[utoipa::path(
    post,
    path = "/api/visits",
    tag = "Operations",
    request_body = CreateVisitPayload,
    responses(
        (status = 201, description = "Visita agendada", body = Visit),
        (status = 404, description = "Cliente, filial ou operador não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_visit(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<CompanyOwnerOnly>,
    Json(payload): Json<CreateVisitPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let new_visit = NewVisit {
        customer_id: payload.customer_id,
        branch_id: payload.branch_id,
        operator_id: payload.operator_id,
        scheduled_at: payload.scheduled_at,
        notes: payload.notes.as_deref(),
    };

    let visit = app_state
        .operations_service
        .create_visit(&app_state.db_pool, tenant.company_id, &new_visit)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(visit)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVisitPayload {
    pub status: Option<VisitStatus>,
    pub operator_id: Option<Uuid>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub is_invoiced: Option<bool>,
    pub is_checked: Option<bool>,
    #[validate(length(max = 2000, message = "too_long"))]
    pub notes: Option<String>,
}

// PATCH /api/visits/{id}
#[utoipa::path(
    patch,
    path = "/api/visits/{id}",
    tag = "Operations",
    request_body = UpdateVisitPayload,
    params(("id" = Uuid, Path, description = "ID da visita")),
    responses(
        (status = 200, description = "Visita atualizada", body = Visit),
        (status = 404, description = "Visita não encontrada"),
        (status = 409, description = "Visita cancelada não pode ser alterada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_visit(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<CompanyStaff>,
    Path(visit_id): Path<Uuid>,
    Json(payload): Json<UpdateVisitPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let changes = VisitChanges {
        status: payload.status,
        operator_id: payload.operator_id,
        scheduled_at: payload.scheduled_at,
        is_invoiced: payload.is_invoiced,
        is_checked: payload.is_checked,
        notes: payload.notes.as_deref(),
    };

    let visit = app_state
        .operations_service
        .update_visit(&app_state.db_pool, tenant.company_id, visit_id, &changes)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(visit)))
}

// DELETE /api/visits/{id}
#[utoipa::path(
    delete,
    path = "/api/visits/{id}",
    tag = "Operations",
    params(("id" = Uuid, Path, description = "ID da visita")),
    responses(
        (status = 204, description = "Visita removida"),
        (status = 404, description = "Visita não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_visit(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<CompanyOwnerOnly>,
    Path(visit_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .operations_service
        .delete_visit(&app_state.db_pool, tenant.company_id, visit_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
