// src/middleware/auth.rs

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{i18n::Locale, tenancy::TenantContext},
    models::auth::{Claims, Session},
};

/// Valida o JWT do provedor de identidade (HS256, segredo compartilhado).
pub fn decode_claims(token: &str, secret: &str) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    // O provedor emite "aud" = "authenticated"; não conferimos audiência
    validation.validate_aud = false;

    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map_err(|e| {
            tracing::debug!("JWT rejeitado: {}", e);
            AppError::InvalidToken
        })?;
    Ok(data.claims)
}

async fn authenticate(app_state: &AppState, bearer: Option<&Bearer>) -> Result<Session, AppError> {
    let bearer = bearer.ok_or(AppError::InvalidToken)?;
    let claims = decode_claims(bearer.token(), &app_state.jwt_secret)?;
    let profile = app_state.tenant_service.find_profile(claims.sub).await?;
    Ok(Session::from(profile))
}

// Rotas que só exigem login (ex: /api/me, área administrativa)
pub async fn auth_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let session = authenticate(&app_state, bearer.as_ref().map(|TypedHeader(Authorization(b))| b))
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

// Rotas da empresa: login + resolução do tenant a partir do papel
pub async fn tenant_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let session = authenticate(&app_state, bearer.as_ref().map(|TypedHeader(Authorization(b))| b))
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let company_id = app_state
        .tenant_service
        .resolve_company_id(session.profile_id, session.role)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    tracing::debug!(profile_id = %session.profile_id, %company_id, "Tenant resolvido");

    request.extensions_mut().insert(TenantContext {
        company_id,
        profile_id: session.profile_id,
        role: session.role,
    });
    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

// Extrator para obter a sessão diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Session);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Session>() {
            Some(session) => Ok(AuthenticatedUser(session.clone())),
            None => {
                let app_state = AppState::from_ref(state);
                let locale = Locale::from_headers(&parts.headers, &app_state.i18n_store);
                Err(AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;
    use uuid::Uuid;

    use super::*;

    fn token(secret: &str, exp: i64, sub: Uuid) -> String {
        let claims = json!({
            "sub": sub,
            "exp": exp,
            "aud": "authenticated",
            "email": "dono@dedetizadora.com",
        });
        encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn accepts_provider_tokens_with_audience() {
        let sub = Uuid::new_v4();
        let jwt = token("segredo", Utc::now().timestamp() + 3600, sub);
        let claims = decode_claims(&jwt, "segredo").unwrap();
        assert_eq!(claims.sub, sub);
        assert_eq!(claims.email.as_deref(), Some("dono@dedetizadora.com"));
    }

    #[test]
    fn rejects_wrong_secret_and_expired_tokens() {
        let sub = Uuid::new_v4();
        let jwt = token("segredo", Utc::now().timestamp() + 3600, sub);
        assert!(matches!(decode_claims(&jwt, "outro"), Err(AppError::InvalidToken)));

        let expired = token("segredo", Utc::now().timestamp() - 3600, sub);
        assert!(matches!(decode_claims(&expired, "segredo"), Err(AppError::InvalidToken)));
    }
}
