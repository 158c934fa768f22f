// src/handlers/tenancy.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::{
        auth::{Session, UserRole},
        tenancy::Company,
    },
};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub session: Session,
    // Ausente para administradores e para donos que ainda não registraram a empresa
    pub company: Option<Company>,
}

// GET /api/me
#[utoipa::path(
    get,
    path = "/api/me",
    tag = "Users",
    responses(
        (status = 200, description = "Sessão atual e empresa vinculada", body = MeResponse),
        (status = 401, description = "Token inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let company = match session.role {
        UserRole::Admin => None,
        role => match app_state.tenant_service.current_company(session.profile_id, role).await {
            Ok(company) => Some(company),
            Err(AppError::CompanyNotFound(_)) => None,
            Err(app_err) => return Err(app_err.to_api_error(&locale, &app_state.i18n_store)),
        },
    };

    Ok((StatusCode::OK, Json(MeResponse { session, company })))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCompanyPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Dedetizadora Boa Vista")]
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

// POST /api/company
#[utoipa::path(
    post,
    path = "/api/company",
    tag = "Tenancy",
    request_body = RegisterCompanyPayload,
    responses(
        (status = 201, description = "Empresa registrada para o dono autenticado", body = Company),
        (status = 403, description = "Apenas perfis de empresa podem registrar"),
        (status = 409, description = "Perfil já possui empresa")
    ),
    security(("api_jwt" = []))
)]
pub async fn register_company(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(session): AuthenticatedUser,
    Json(payload): Json<RegisterCompanyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let result: Result<Company, AppError> = async {
        let owner = app_state.tenant_service.find_profile(session.profile_id).await?;
        app_state
            .tenant_service
            .register_company(&owner, payload.name.trim(), payload.phone.as_deref(), payload.address.as_deref())
            .await
    }
    .await;

    let company = result.map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::CREATED, Json(company)))
}
