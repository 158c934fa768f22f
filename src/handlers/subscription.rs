// src/handlers/subscription.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        validation::not_negative,
    },
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{AdminOnly, CompanyOwnerOnly, RequireRole},
        tenancy::TenantContext,
    },
    models::{
        subscription::{EffectiveLimit, ResourceKind, ResourceLimits, Subscription, SubscriptionOverview, SubscriptionPlan},
        tenancy::Company,
    },
};

// =============================================================================
//  ÁREA 1: ASSINATURA DA EMPRESA
// =============================================================================

// GET /api/subscription
#[utoipa::path(
    get,
    path = "/api/subscription",
    tag = "Subscription",
    responses(
        (status = 200, description = "Plano, limites efetivos e uso por recurso", body = SubscriptionOverview),
        (status = 404, description = "Empresa não encontrada para o perfil")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_subscription(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<CompanyOwnerOnly>,
) -> Result<impl IntoResponse, ApiError> {
    let overview = app_state
        .subscription_service
        .overview(&app_state.db_pool, tenant.company_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(overview)))
}

// =============================================================================
//  ÁREA 2: ADMINISTRAÇÃO (PLANOS)
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Profissional")]
    pub name: String,

    #[validate(custom(function = "not_negative"))]
    #[schema(value_type = f64, example = 199.90)]
    pub price: Decimal,

    #[validate(range(min = 0, message = "not_negative"))]
    pub max_operators: Option<i32>,
    #[validate(range(min = 0, message = "not_negative"))]
    pub max_customers: Option<i32>,
    #[validate(range(min = 0, message = "not_negative"))]
    pub max_branches: Option<i32>,
    #[validate(range(min = 0, message = "not_negative"))]
    pub max_warehouses: Option<i32>,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl PlanPayload {
    fn limits(&self) -> ResourceLimits {
        ResourceLimits {
            max_operators: self.max_operators,
            max_customers: self.max_customers,
            max_branches: self.max_branches,
            max_warehouses: self.max_warehouses,
        }
    }
}

// GET /api/admin/plans
#[utoipa::path(
    get,
    path = "/api/admin/plans",
    tag = "Admin",
    responses((status = 200, description = "Planos cadastrados", body = Vec<SubscriptionPlan>)),
    security(("api_jwt" = []))
)]
pub async fn list_plans(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
) -> Result<impl IntoResponse, ApiError> {
    let plans = app_state
        .subscription_service
        .list_plans(&app_state.db_pool)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(plans)))
}

// POST /api/admin/plans
#[utoipa::path(
    post,
    path = "/api/admin/plans",
    tag = "Admin",
    request_body = PlanPayload,
    responses(
        (status = 201, description = "Plano criado", body = SubscriptionPlan),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "Nome de plano já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_plan(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Json(payload): Json<PlanPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let plan = app_state
        .subscription_service
        .create_plan(&app_state.db_pool, payload.name.trim(), payload.price, &payload.limits())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(plan)))
}

// PUT /api/admin/plans/{id}
#[utoipa::path(
    put,
    path = "/api/admin/plans/{id}",
    tag = "Admin",
    request_body = PlanPayload,
    params(("id" = Uuid, Path, description = "ID do plano")),
    responses(
        (status = 200, description = "Plano atualizado", body = SubscriptionPlan),
        (status = 404, description = "Plano não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_plan(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Path(plan_id): Path<Uuid>,
    Json(payload): Json<PlanPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let plan = app_state
        .subscription_service
        .update_plan(&app_state.db_pool, plan_id, payload.price, &payload.limits(), payload.is_active)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(plan)))
}

// =============================================================================
//  ÁREA 3: ADMINISTRAÇÃO (EMPRESAS)
// =============================================================================

// GET /api/admin/companies
#[utoipa::path(
    get,
    path = "/api/admin/companies",
    tag = "Admin",
    responses((status = 200, description = "Empresas cadastradas", body = Vec<Company>)),
    security(("api_jwt" = []))
)]
pub async fn list_companies(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
) -> Result<impl IntoResponse, ApiError> {
    let companies = app_state
        .tenant_service
        .list_companies()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(companies)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignSubscriptionPayload {
    // Sem plano: só overrides (ou os tetos de teste)
    pub plan_id: Option<Uuid>,

    #[validate(range(min = 0, message = "not_negative"))]
    pub max_operators: Option<i32>,
    #[validate(range(min = 0, message = "not_negative"))]
    pub max_customers: Option<i32>,
    #[validate(range(min = 0, message = "not_negative"))]
    pub max_branches: Option<i32>,
    #[validate(range(min = 0, message = "not_negative"))]
    pub max_warehouses: Option<i32>,

    pub ends_at: Option<DateTime<Utc>>,
}

// PUT /api/admin/companies/{id}/subscription
#[utoipa::path(
    put,
    path = "/api/admin/companies/{id}/subscription",
    tag = "Admin",
    request_body = AssignSubscriptionPayload,
    params(("id" = Uuid, Path, description = "ID da empresa")),
    responses(
        (status = 200, description = "Assinatura ativa substituída", body = Subscription),
        (status = 404, description = "Empresa ou plano não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn assign_subscription(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Path(company_id): Path<Uuid>,
    Json(payload): Json<AssignSubscriptionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let overrides = ResourceLimits {
        max_operators: payload.max_operators,
        max_customers: payload.max_customers,
        max_branches: payload.max_branches,
        max_warehouses: payload.max_warehouses,
    };

    let subscription = app_state
        .subscription_service
        .assign(&app_state.db_pool, company_id, payload.plan_id, &overrides, payload.ends_at)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(subscription)))
}

// GET /api/admin/companies/{id}/limits
#[utoipa::path(
    get,
    path = "/api/admin/companies/{id}/limits",
    tag = "Admin",
    params(("id" = Uuid, Path, description = "ID da empresa")),
    responses((status = 200, description = "Teto efetivo por recurso", body = Vec<EffectiveLimit>)),
    security(("api_jwt" = []))
)]
pub async fn company_limits(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<AdminOnly>,
    Path(company_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut conn = app_state
        .db_pool
        .acquire()
        .await
        .map_err(|e| AppError::from(e).to_api_error(&locale, &app_state.i18n_store))?;
    let mut limits = Vec::with_capacity(ResourceKind::ALL.len());
    for kind in ResourceKind::ALL {
        let limit = app_state
            .subscription_service
            .effective_limit(&mut *conn, company_id, kind)
            .await
            .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;
        limits.push(limit);
    }

    Ok((StatusCode::OK, Json(limits)))
}
