// src/models/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,   // Administrador da plataforma
    Company, // Dono da empresa (tenant)
    Operator,
}

// Espelho local da identidade do provedor de autenticação
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    #[schema(example = "dono@dedetizadora.com")]
    pub email: String,
    pub full_name: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

// Estrutura de dados ("claims") dentro do JWT emitido pelo provedor
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,  // Subject (ID do perfil)
    pub exp: usize, // Expiration time
    #[serde(default)]
    pub iat: Option<usize>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Sessão explícita da requisição: quem está chamando e com qual papel.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub profile_id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl From<Profile> for Session {
    fn from(profile: Profile) -> Self {
        Self {
            profile_id: profile.id,
            email: profile.email,
            role: profile.role,
        }
    }
}
