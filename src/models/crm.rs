// src/models/crm.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;

// --- ENUMS ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "pricing_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PricingType {
    Monthly,  // Valor fixo uma vez por mês
    PerVisit, // Valor somado a cada visita
}

// --- CLIENTE ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    #[schema(ignore)]
    pub company_id: Uuid,
    pub profile_id: Option<Uuid>,
    #[schema(example = "Maria da Silva")]
    pub full_name: String,
    #[schema(example = "Padaria Central")]
    pub company_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

// Sub-local do cliente, faturável separadamente
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerBranch {
    pub id: Uuid,
    pub customer_id: Uuid,
    #[schema(example = "Filial Centro")]
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

// --- PREÇOS ---

/// Linha de `customer_pricing` ou `branch_pricing`. `owner_id` é o cliente ou a filial.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PricingRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub pricing_type: PricingType,
    #[schema(example = "1000.00")]
    pub amount: Decimal,
    pub updated_at: DateTime<Utc>,
}
