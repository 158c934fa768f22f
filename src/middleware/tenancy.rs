// src/middleware/tenancy.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::UserRole,
};

// Empresa do chamador, resolvida pelo `tenant_guard` (nunca vem do cliente)
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub company_id: Uuid,
    pub profile_id: Uuid,
    pub role: UserRole,
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<TenantContext>() {
            Some(tenant) => Ok(tenant.clone()),
            None => {
                let app_state = AppState::from_ref(state);
                let locale = Locale::from_headers(&parts.headers, &app_state.i18n_store);
                Err(AppError::Forbidden.to_api_error(&locale, &app_state.i18n_store))
            }
        }
    }
}
