// src/models/inventory.rs

use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;
use utoipa::ToSchema;

// --- 1. Materiais vendáveis ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyMaterial {
    pub id: Uuid,
    #[schema(ignore)]
    pub company_id: Uuid,
    #[schema(example = "Gel inseticida 30g")]
    pub name: String,
    #[schema(example = "un")]
    pub unit: Option<String>,
    #[schema(example = "45.00")]
    pub price: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

// --- 2. Venda de materiais ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaterialSale {
    pub id: Uuid,
    #[schema(ignore)]
    pub company_id: Uuid,
    pub customer_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub visit_id: Option<Uuid>,
    pub sold_at: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaterialSaleItem {
    pub id: Uuid,
    pub sale_id: Uuid,
    pub material_id: Uuid,
    #[schema(example = "2.0")]
    pub quantity: Decimal,
    #[schema(example = "45.00")]
    pub unit_price: Decimal,
}

/// Item de venda já juntado com o cabeçalho (usado pelos relatórios).
#[derive(Debug, Clone, FromRow)]
pub struct SaleLine {
    pub sale_id: Uuid,
    pub customer_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub visit_id: Option<Uuid>,
    pub sold_at: DateTime<Utc>,
    pub material_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

impl SaleLine {
    pub fn amount(&self) -> Decimal {
        self.quantity * self.unit_price
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaterialSaleDetail {
    #[serde(flatten)]
    pub header: MaterialSale,
    pub items: Vec<MaterialSaleItem>,
    pub total: Decimal,
}

// --- 3. Armazéns ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Warehouse {
    pub id: Uuid,
    #[schema(ignore)]
    pub company_id: Uuid,
    #[schema(example = "Depósito Central")]
    pub name: String,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseItem {
    pub id: Uuid,
    pub warehouse_id: Uuid,
    pub material_id: Uuid,
    pub quantity: Decimal,
    pub min_quantity: Decimal,
    pub max_quantity: Option<Decimal>,
    pub updated_at: DateTime<Utc>,
}

impl WarehouseItem {
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.min_quantity
    }
}

// --- 4. Transferências entre armazéns ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "transfer_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseTransfer {
    pub id: Uuid,
    #[schema(ignore)]
    pub company_id: Uuid,
    pub from_warehouse_id: Uuid,
    pub to_warehouse_id: Uuid,
    pub material_id: Uuid,
    pub quantity: Decimal,
    pub status: TransferStatus,
    pub requested_by: Option<Uuid>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
