// src/handlers/imports.rs

use axum::{body::Bytes, extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{CompanyOwnerOnly, RequireRole},
        tenancy::TenantContext,
    },
    models::import::ImportSummary,
};

// POST /api/import/customers
#[utoipa::path(
    post,
    path = "/api/import/customers",
    tag = "Import",
    request_body(content = String, content_type = "text/csv", description = "Planilha exportada em CSV com cabeçalhos no idioma do usuário"),
    responses(
        (status = 200, description = "Resumo da importação (sucesso parcial é esperado)", body = ImportSummary),
        (status = 400, description = "Arquivo sem as colunas obrigatórias"),
        (status = 409, description = "Importação excederia o limite de clientes; nada foi enviado")
    ),
    security(("api_jwt" = []))
)]
pub async fn import_customers(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<CompanyOwnerOnly>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    if body.is_empty() {
        return Err(AppError::ImportFormat("empty file".into()).to_api_error(&locale, &app_state.i18n_store));
    }

    let summary = app_state
        .import_service
        .import_customers(tenant.company_id, &body, &locale.0)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(summary)))
}
