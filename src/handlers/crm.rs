// src/handlers/crm.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::{
        error::{ApiError, AppError},
        validation::not_negative,
    },
    config::AppState,
    db::crm_repo::{CustomerFields, PricingOwner},
    middleware::{
        i18n::Locale,
        rbac::{CompanyOwnerOnly, CompanyStaff, RequireRole},
        tenancy::TenantContext,
    },
    models::crm::{Customer, CustomerBranch, PricingRecord, PricingType},
    services::crm_service::CustomerLogin,
};

// =============================================================================
//  ÁREA 1: CLIENTES
// =============================================================================

#[derive(Debug, Deserialize, IntoParams)]
pub struct CustomerListQuery {
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

// GET /api/customers
#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "CRM",
    params(CustomerListQuery),
    responses((status = 200, description = "Clientes da empresa", body = Vec<Customer>)),
    security(("api_jwt" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<CompanyStaff>,
    Query(query): Query<CustomerListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let customers = app_state
        .crm_service
        .list_customers(
            &app_state.db_pool,
            tenant.company_id,
            query.search.as_deref().filter(|s| !s.trim().is_empty()),
            query.page.unwrap_or(1),
            query.per_page.unwrap_or(50),
        )
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(customers)))
}

// Senha só faz sentido com e-mail de login
fn login_needs_email(payload: &CreateCustomerPayload) -> Result<(), ValidationError> {
    if payload.password.is_some() && payload.email.as_deref().is_none_or(|e| e.trim().is_empty()) {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "login_needs_email"))]
pub struct CreateCustomerPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Maria Souza")]
    pub full_name: String,

    #[schema(example = "Padaria Central")]
    pub company_name: Option<String>,

    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,

    pub phone: Option<String>,
    pub address: Option<String>,

    // Quando presente, o cliente ganha login próprio (função remota)
    #[validate(length(min = 6, message = "password_too_short"))]
    pub password: Option<String>,
}

// POST /api/customers
#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "CRM",
    request_body = CreateCustomerPayload,
    responses(
        (status = 201, description = "Cliente criado", body = Customer),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "Limite de clientes do plano atingido"),
        (status = 502, description = "Falha na função remota de criação de login")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<CompanyOwnerOnly>,
    Json(payload): Json<CreateCustomerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let fields = CustomerFields {
        full_name: payload.full_name.trim(),
        company_name: payload.company_name.as_deref(),
        email: payload.email.as_deref(),
        phone: payload.phone.as_deref(),
        address: payload.address.as_deref(),
    };
    let login = match (&payload.email, &payload.password) {
        (Some(email), Some(password)) => Some(CustomerLogin {
            email: email.trim().to_string(),
            password: password.clone(),
        }),
        _ => None,
    };

    let customer = app_state
        .crm_service
        .create_customer(&app_state.db_pool, tenant.company_id, &fields, login)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(customer)))
}

// GET /api/customers/{id}
#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente", body = Customer),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<CompanyStaff>,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = app_state
        .crm_service
        .get_customer(&app_state.db_pool, tenant.company_id, customer_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(customer)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerPayload {
    #[validate(length(min = 1, message = "required"))]
    pub full_name: String,
    pub company_name: Option<String>,
    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

// PUT /api/customers/{id}
#[utoipa::path(
    put,
    path = "/api/customers/{id}",
    tag = "CRM",
    request_body = UpdateCustomerPayload,
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 200, description = "Cliente atualizado", body = Customer),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<CompanyOwnerOnly>,
    Path(customer_id): Path<Uuid>,
    Json(payload): Json<UpdateCustomerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let fields = CustomerFields {
        full_name: payload.full_name.trim(),
        company_name: payload.company_name.as_deref(),
        email: payload.email.as_deref(),
        phone: payload.phone.as_deref(),
        address: payload.address.as_deref(),
    };

    let customer = app_state
        .crm_service
        .update_customer(&app_state.db_pool, tenant.company_id, customer_id, &fields)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(customer)))
}

// DELETE /api/customers/{id}
#[utoipa::path(
    delete,
    path = "/api/customers/{id}",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 204, description = "Cliente removido"),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<CompanyOwnerOnly>,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .crm_service
        .delete_customer(&app_state.db_pool, tenant.company_id, customer_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  ÁREA 2: FILIAIS
// =============================================================================

// GET /api/customers/{id}/branches
#[utoipa::path(
    get,
    path = "/api/customers/{id}/branches",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses((status = 200, description = "Filiais do cliente", body = Vec<CustomerBranch>)),
    security(("api_jwt" = []))
)]
pub async fn list_branches(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<CompanyStaff>,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let branches = app_state
        .crm_service
        .list_branches(&app_state.db_pool, tenant.company_id, customer_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(branches)))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBranchPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Filial Centro")]
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
}

// POST /api/customers/{id}/branches
#[utoipa::path(
    post,
    path = "/api/customers/{id}/branches",
    tag = "CRM",
    request_body = CreateBranchPayload,
    params(("id" = Uuid, Path, description = "ID do cliente")),
    responses(
        (status = 201, description = "Filial criada", body = CustomerBranch),
        (status = 409, description = "Limite de filiais do plano atingido")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_branch(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<CompanyOwnerOnly>,
    Path(customer_id): Path<Uuid>,
    Json(payload): Json<CreateBranchPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let branch = app_state
        .crm_service
        .create_branch(
            &app_state.db_pool,
            tenant.company_id,
            customer_id,
            payload.name.trim(),
            payload.address.as_deref(),
            payload.phone.as_deref(),
        )
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(branch)))
}

// DELETE /api/branches/{id}
#[utoipa::path(
    delete,
    path = "/api/branches/{id}",
    tag = "CRM",
    params(("id" = Uuid, Path, description = "ID da filial")),
    responses(
        (status = 204, description = "Filial removida"),
        (status = 404, description = "Filial não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_branch(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<CompanyOwnerOnly>,
    Path(branch_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .crm_service
        .delete_branch(&app_state.db_pool, tenant.company_id, branch_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  ÁREA 3: PREÇOS
// =============================================================================

/// Segmento da rota `/api/pricing/{owner}/{id}`.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PricingTarget {
    Customers,
    Branches,
}

impl From<PricingTarget> for PricingOwner {
    fn from(target: PricingTarget) -> Self {
        match target {
            PricingTarget::Customers => PricingOwner::Customer,
            PricingTarget::Branches => PricingOwner::Branch,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetPricingPayload {
    pub pricing_type: PricingType,

    #[validate(custom(function = "not_negative"))]
    #[schema(value_type = f64, example = 150.00)]
    pub amount: Decimal,
}

// GET /api/pricing/{owner}/{id}
#[utoipa::path(
    get,
    path = "/api/pricing/{owner}/{id}",
    tag = "CRM",
    params(
        ("owner" = PricingTarget, Path, description = "customers | branches"),
        ("id" = Uuid, Path, description = "ID do cliente ou da filial")
    ),
    responses((status = 200, description = "Preço definido no nível pedido (ou null)", body = PricingRecord)),
    security(("api_jwt" = []))
)]
pub async fn get_pricing(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<CompanyOwnerOnly>,
    Path((owner, owner_id)): Path<(PricingTarget, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let pricing = app_state
        .crm_service
        .get_pricing(&app_state.db_pool, tenant.company_id, owner.into(), owner_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(pricing)))
}

// PUT /api/pricing/{owner}/{id}
#[utoipa::path(
    put,
    path = "/api/pricing/{owner}/{id}",
    tag = "CRM",
    request_body = SetPricingPayload,
    params(
        ("owner" = PricingTarget, Path, description = "customers | branches"),
        ("id" = Uuid, Path, description = "ID do cliente ou da filial")
    ),
    responses(
        (status = 200, description = "Preço gravado (substitui o anterior)", body = PricingRecord),
        (status = 404, description = "Cliente ou filial não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_pricing(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<CompanyOwnerOnly>,
    Path((owner, owner_id)): Path<(PricingTarget, Uuid)>,
    Json(payload): Json<SetPricingPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let pricing = app_state
        .crm_service
        .set_pricing(
            &app_state.db_pool,
            tenant.company_id,
            owner.into(),
            owner_id,
            payload.pricing_type,
            payload.amount,
        )
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(pricing)))
}

// DELETE /api/pricing/{owner}/{id}
#[utoipa::path(
    delete,
    path = "/api/pricing/{owner}/{id}",
    tag = "CRM",
    params(
        ("owner" = PricingTarget, Path, description = "customers | branches"),
        ("id" = Uuid, Path, description = "ID do cliente ou da filial")
    ),
    responses(
        (status = 204, description = "Preço removido (filial volta a herdar o do cliente)"),
        (status = 404, description = "Nenhum preço definido")
    ),
    security(("api_jwt" = []))
)]
pub async fn clear_pricing(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<CompanyOwnerOnly>,
    Path((owner, owner_id)): Path<(PricingTarget, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .crm_service
        .clear_pricing(&app_state.db_pool, tenant.company_id, owner.into(), owner_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(email: Option<&str>, password: Option<&str>) -> CreateCustomerPayload {
        CreateCustomerPayload {
            full_name: "Maria Souza".into(),
            company_name: None,
            email: email.map(str::to_string),
            phone: None,
            address: None,
            password: password.map(str::to_string),
        }
    }

    #[test]
    fn password_requires_login_email() {
        assert!(payload(None, Some("segredo123")).validate().is_err());
        assert!(payload(Some("maria@padaria.com"), Some("segredo123")).validate().is_ok());
        assert!(payload(None, None).validate().is_ok());
    }

    #[test]
    fn short_passwords_are_rejected() {
        let errors = payload(Some("maria@padaria.com"), Some("123")).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }
}
