// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::{Session, UserRole},
};

/// 1. Regra de papel exigida por uma rota
pub trait RoleRule: Send + Sync + 'static {
    fn allows(role: UserRole) -> bool;
}

pub struct AdminOnly;
pub struct CompanyOwnerOnly;
// Dono ou operador da empresa
pub struct CompanyStaff;

impl RoleRule for AdminOnly {
    fn allows(role: UserRole) -> bool {
        role == UserRole::Admin
    }
}

impl RoleRule for CompanyOwnerOnly {
    fn allows(role: UserRole) -> bool {
        role == UserRole::Company
    }
}

impl RoleRule for CompanyStaff {
    fn allows(role: UserRole) -> bool {
        matches!(role, UserRole::Company | UserRole::Operator)
    }
}

/// 2. O Extractor (Guardião). Depende da `Session` inserida pelos guards.
pub struct RequireRole<R>(pub PhantomData<R>);

impl<R, S> FromRequestParts<S> for RequireRole<R>
where
    R: RoleRule,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let locale = Locale::from_headers(&parts.headers, &app_state.i18n_store);

        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store))?;

        if !R::allows(session.role) {
            tracing::warn!(profile_id = %session.profile_id, role = ?session.role, "Papel sem acesso à rota");
            return Err(AppError::Forbidden.to_api_error(&locale, &app_state.i18n_store));
        }

        Ok(RequireRole(PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_rules() {
        assert!(AdminOnly::allows(UserRole::Admin));
        assert!(!AdminOnly::allows(UserRole::Company));

        assert!(CompanyOwnerOnly::allows(UserRole::Company));
        assert!(!CompanyOwnerOnly::allows(UserRole::Operator));

        assert!(CompanyStaff::allows(UserRole::Operator));
        assert!(CompanyStaff::allows(UserRole::Company));
        assert!(!CompanyStaff::allows(UserRole::Admin));
    }
}
