use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;
use crate::models::subscription::ResourceKind;
use crate::services::gateway::GatewayError;

// Erro de domínio: repositórios e serviços só conhecem este tipo.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Token inválido")]
    InvalidToken,

    #[error("Acesso negado")]
    Forbidden,

    #[error("Perfil {0} não encontrado")]
    ProfileNotFound(Uuid),

    // Perfil autenticado sem linha de empresa correspondente
    #[error("Nenhuma empresa vinculada ao perfil {0}")]
    CompanyNotFound(Uuid),

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    #[error("Limite de {resource} excedido ({current} + {requested} > {limit})")]
    LimitExceeded {
        resource: ResourceKind,
        limit: i64,
        current: i64,
        requested: i64,
    },

    #[error("Visita cancelada não pode ser alterada")]
    VisitCancelled,

    #[error("Transferência já foi decidida")]
    TransferNotPending,

    #[error("Estoque insuficiente")]
    InsufficientStock,

    #[error("Período inválido: {0}")]
    InvalidPeriod(String),

    #[error("Arquivo de importação inválido: {0}")]
    ImportFormat(String),

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    #[error("Erro no gateway de funções: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

/// Erro que vai para o fio, já traduzido.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self { status, error: error.into(), details: None }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidPeriod(_)
            | AppError::ImportFormat(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidToken | AppError::JwtError(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::ProfileNotFound(_)
            | AppError::CompanyNotFound(_)
            | AppError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            AppError::LimitExceeded { .. }
            | AppError::VisitCancelled
            | AppError::TransferNotPending
            | AppError::UniqueConstraintViolation(_) => StatusCode::CONFLICT,
            AppError::InsufficientStock => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Gateway(_) => StatusCode::BAD_GATEWAY,
            AppError::FontNotFound(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Chave do dicionário e parâmetros da mensagem.
    fn message_key(&self) -> (&'static str, Vec<(&'static str, String)>) {
        match self {
            AppError::ValidationError(_) => ("error.validation", vec![]),
            AppError::InvalidToken | AppError::JwtError(_) => ("error.invalid_token", vec![]),
            AppError::Forbidden => ("error.forbidden", vec![]),
            AppError::ProfileNotFound(_) => ("error.profile_not_found", vec![]),
            AppError::CompanyNotFound(_) => ("error.company_not_found", vec![]),
            AppError::ResourceNotFound(what) => ("error.not_found", vec![("resource", what.clone())]),
            AppError::LimitExceeded { resource, limit, current, requested } => (
                "error.limit_exceeded",
                vec![
                    ("resource", resource.as_str().to_string()),
                    ("limit", limit.to_string()),
                    ("current", current.to_string()),
                    ("requested", requested.to_string()),
                ],
            ),
            AppError::VisitCancelled => ("error.visit_cancelled", vec![]),
            AppError::TransferNotPending => ("error.transfer_not_pending", vec![]),
            AppError::InsufficientStock => ("error.insufficient_stock", vec![]),
            AppError::InvalidPeriod(reason) => ("error.invalid_period", vec![("reason", reason.clone())]),
            AppError::ImportFormat(reason) => ("error.import_format", vec![("reason", reason.clone())]),
            AppError::UniqueConstraintViolation(what) => ("error.unique_violation", vec![("resource", what.clone())]),
            // Erros remotos sobem com o texto original
            AppError::Gateway(e) => ("error.gateway", vec![("message", e.to_string())]),
            AppError::FontNotFound(_)
            | AppError::DatabaseError(_)
            | AppError::InternalServerError(_) => ("error.internal", vec![]),
        }
    }

    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Erro Interno do Servidor: {:?}", self);
        }

        let (key, mut params) = self.message_key();
        if let AppError::LimitExceeded { resource, .. } = self {
            // Nome do recurso também vai traduzido
            let label = store.translate(&locale.0, &format!("resource.{}", resource), &[]);
            params.retain(|(name, _)| *name != "resource");
            params.push(("resource", label));
        }
        let error = store.translate(&locale.0, key, &params);

        let details = match self {
            AppError::ValidationError(errors) => {
                let mut details = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            let code = e.message.as_ref().map(|m| m.to_string()).unwrap_or_else(|| e.code.to_string());
                            store.translate(&locale.0, &format!("validation.{}", code), &[])
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                Some(json!(details))
            }
            AppError::LimitExceeded { resource, limit, current, requested } => Some(json!({
                "resource": resource,
                "limit": limit,
                "current": current,
                "requested": requested,
            })),
            _ => None,
        };

        ApiError { status, error, details }
    }
}

// Converte violações de unicidade do Postgres em erro de negócio
pub(crate) fn map_unique_violation(e: sqlx::Error, what: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return AppError::UniqueConstraintViolation(what.to_string());
        }
    }
    e.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> I18nStore {
        I18nStore::load().unwrap()
    }

    #[test]
    fn limit_exceeded_is_conflict_with_details() {
        let err = AppError::LimitExceeded {
            resource: ResourceKind::Customers,
            limit: 10,
            current: 8,
            requested: 12,
        };
        let api = err.to_api_error(&Locale("en".into()), &store());
        assert_eq!(api.status, StatusCode::CONFLICT);
        let details = api.details.unwrap();
        assert_eq!(details["limit"], 10);
        assert_eq!(details["resource"], "customers");
    }

    #[test]
    fn missing_company_row_is_a_typed_not_found() {
        let api = AppError::CompanyNotFound(Uuid::new_v4()).to_api_error(&Locale("pt".into()), &store());
        assert_eq!(api.status, StatusCode::NOT_FOUND);
        assert!(!api.error.is_empty());
    }

    #[test]
    fn gateway_errors_keep_the_remote_text() {
        let err = AppError::Gateway(GatewayError::Remote {
            status: 400,
            message: "duplicate key value violates unique constraint".into(),
        });
        let api = err.to_api_error(&Locale("en".into()), &store());
        assert_eq!(api.status, StatusCode::BAD_GATEWAY);
        assert!(api.error.contains("duplicate key value"));
    }
}
