// src/models/tenancy.rs

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;

// ---
// Company (o "Tenant")
// ---
// A linha de armazenamento da empresa. `profile_id` é a identidade do dono;
// os dados dependentes (clientes, operadores...) apontam para `id`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: Uuid,
    pub profile_id: Uuid,
    #[schema(example = "Dedetizadora Boa Vista")]
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}
