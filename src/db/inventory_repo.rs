// src/db/inventory_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::inventory::{
        CompanyMaterial, MaterialSale, MaterialSaleItem, TransferStatus, Warehouse, WarehouseItem,
        WarehouseTransfer,
    },
};

const TRANSFER_COLUMNS: &str = "id, company_id, from_warehouse_id, to_warehouse_id, material_id, \
                                quantity, status, requested_by, decided_at, created_at";

const ITEM_COLUMNS: &str =
    "id, warehouse_id, material_id, quantity, min_quantity, max_quantity, updated_at";

#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Materiais
    // ---

    pub async fn list_materials<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
    ) -> Result<Vec<CompanyMaterial>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let materials = sqlx::query_as::<_, CompanyMaterial>(
            r#"
            SELECT id, company_id, name, unit, price, is_active, created_at
            FROM company_materials
            WHERE company_id = $1
            ORDER BY name ASC
            "#,
        )
            .bind(company_id)
            .fetch_all(executor)
            .await?;
        Ok(materials)
    }

    pub async fn create_material<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        name: &str,
        unit: Option<&str>,
        price: Decimal,
    ) -> Result<CompanyMaterial, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let material = sqlx::query_as::<_, CompanyMaterial>(
            r#"
            INSERT INTO company_materials (company_id, name, unit, price)
            VALUES ($1, $2, $3, $4)
            RETURNING id, company_id, name, unit, price, is_active, created_at
            "#,
        )
            .bind(company_id)
            .bind(name)
            .bind(unit)
            .bind(price)
            .fetch_one(executor)
            .await?;
        Ok(material)
    }

    /// Quantos dos ids informados pertencem à empresa.
    pub async fn count_owned_materials<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        material_ids: &[Uuid],
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT id) FROM company_materials WHERE company_id = $1 AND id = ANY($2)",
        )
            .bind(company_id)
            .bind(material_ids)
            .fetch_one(executor)
            .await?;
        Ok(count)
    }

    // ---
    // Vendas de materiais
    // ---

    pub async fn create_sale<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        customer_id: Uuid,
        branch_id: Option<Uuid>,
        visit_id: Option<Uuid>,
        sold_at: DateTime<Utc>,
        notes: Option<&str>,
    ) -> Result<MaterialSale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, MaterialSale>(
            r#"
            INSERT INTO paid_material_sales (company_id, customer_id, branch_id, visit_id, sold_at, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, company_id, customer_id, branch_id, visit_id, sold_at, notes
            "#,
        )
            .bind(company_id)
            .bind(customer_id)
            .bind(branch_id)
            .bind(visit_id)
            .bind(sold_at)
            .bind(notes)
            .fetch_one(executor)
            .await?;
        Ok(sale)
    }

    pub async fn add_sale_item<'e, E>(
        &self,
        executor: E,
        sale_id: Uuid,
        material_id: Uuid,
        quantity: Decimal,
        unit_price: Decimal,
    ) -> Result<MaterialSaleItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, MaterialSaleItem>(
            r#"
            INSERT INTO paid_material_sale_items (sale_id, material_id, quantity, unit_price)
            VALUES ($1, $2, $3, $4)
            RETURNING id, sale_id, material_id, quantity, unit_price
            "#,
        )
            .bind(sale_id)
            .bind(material_id)
            .bind(quantity)
            .bind(unit_price)
            .fetch_one(executor)
            .await?;
        Ok(item)
    }

    pub async fn list_sales<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<MaterialSale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sales = sqlx::query_as::<_, MaterialSale>(
            r#"
            SELECT id, company_id, customer_id, branch_id, visit_id, sold_at, notes
            FROM paid_material_sales
            WHERE company_id = $1 AND sold_at >= $2 AND sold_at < $3
            ORDER BY sold_at ASC
            "#,
        )
            .bind(company_id)
            .bind(start)
            .bind(end)
            .fetch_all(executor)
            .await?;
        Ok(sales)
    }

    pub async fn list_sale_items<'e, E>(
        &self,
        executor: E,
        sale_ids: &[Uuid],
    ) -> Result<Vec<MaterialSaleItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, MaterialSaleItem>(
            r#"
            SELECT id, sale_id, material_id, quantity, unit_price
            FROM paid_material_sale_items
            WHERE sale_id = ANY($1)
            "#,
        )
            .bind(sale_ids)
            .fetch_all(executor)
            .await?;
        Ok(items)
    }

    // ---
    // Armazéns e itens
    // ---

    pub async fn list_warehouses<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
    ) -> Result<Vec<Warehouse>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let warehouses = sqlx::query_as::<_, Warehouse>(
            "SELECT id, company_id, name, location, created_at FROM warehouses WHERE company_id = $1 ORDER BY name ASC",
        )
            .bind(company_id)
            .fetch_all(executor)
            .await?;
        Ok(warehouses)
    }

    pub async fn create_warehouse<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        name: &str,
        location: Option<&str>,
    ) -> Result<Warehouse, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let warehouse = sqlx::query_as::<_, Warehouse>(
            r#"
            INSERT INTO warehouses (company_id, name, location)
            VALUES ($1, $2, $3)
            RETURNING id, company_id, name, location, created_at
            "#,
        )
            .bind(company_id)
            .bind(name)
            .bind(location)
            .fetch_one(executor)
            .await?;
        Ok(warehouse)
    }

    pub async fn warehouse_belongs_to<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        warehouse_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM warehouses WHERE company_id = $1 AND id = $2)",
        )
            .bind(company_id)
            .bind(warehouse_id)
            .fetch_one(executor)
            .await?;
        Ok(exists)
    }

    pub async fn list_items<'e, E>(
        &self,
        executor: E,
        warehouse_id: Uuid,
    ) -> Result<Vec<WarehouseItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, WarehouseItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM warehouse_items WHERE warehouse_id = $1"
        ))
            .bind(warehouse_id)
            .fetch_all(executor)
            .await?;
        Ok(items)
    }

    /// Itens no ou abaixo do mínimo, em todos os armazéns da empresa.
    pub async fn list_low_stock<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
    ) -> Result<Vec<WarehouseItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, WarehouseItem>(
            r#"
            SELECT i.id, i.warehouse_id, i.material_id, i.quantity, i.min_quantity, i.max_quantity, i.updated_at
            FROM warehouse_items i
            JOIN warehouses w ON w.id = i.warehouse_id
            WHERE w.company_id = $1 AND i.quantity <= i.min_quantity
            ORDER BY w.name ASC
            "#,
        )
            .bind(company_id)
            .fetch_all(executor)
            .await?;
        Ok(items)
    }

    /// Define quantidade e limites de um item (chave de conflito: armazém + material).
    pub async fn upsert_item<'e, E>(
        &self,
        executor: E,
        warehouse_id: Uuid,
        material_id: Uuid,
        quantity: Decimal,
        min_quantity: Decimal,
        max_quantity: Option<Decimal>,
    ) -> Result<WarehouseItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, WarehouseItem>(&format!(
            r#"
            INSERT INTO warehouse_items (warehouse_id, material_id, quantity, min_quantity, max_quantity)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (warehouse_id, material_id)
            DO UPDATE SET
                quantity = EXCLUDED.quantity,
                min_quantity = EXCLUDED.min_quantity,
                max_quantity = EXCLUDED.max_quantity,
                updated_at = NOW()
            RETURNING {ITEM_COLUMNS}
            "#
        ))
            .bind(warehouse_id)
            .bind(material_id)
            .bind(quantity)
            .bind(min_quantity)
            .bind(max_quantity)
            .fetch_one(executor)
            .await?;
        Ok(item)
    }

    pub async fn get_item_for_update<'e, E>(
        &self,
        executor: E,
        warehouse_id: Uuid,
        material_id: Uuid,
    ) -> Result<Option<WarehouseItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, WarehouseItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM warehouse_items WHERE warehouse_id = $1 AND material_id = $2 FOR UPDATE"
        ))
            .bind(warehouse_id)
            .bind(material_id)
            .fetch_optional(executor)
            .await?;
        Ok(item)
    }

    /// Soma `delta` ao saldo, criando a linha se preciso.
    pub async fn adjust_item_quantity<'e, E>(
        &self,
        executor: E,
        warehouse_id: Uuid,
        material_id: Uuid,
        delta: Decimal,
    ) -> Result<WarehouseItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, WarehouseItem>(&format!(
            r#"
            INSERT INTO warehouse_items (warehouse_id, material_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (warehouse_id, material_id)
            DO UPDATE SET
                quantity = warehouse_items.quantity + EXCLUDED.quantity,
                updated_at = NOW()
            RETURNING {ITEM_COLUMNS}
            "#
        ))
            .bind(warehouse_id)
            .bind(material_id)
            .bind(delta)
            .fetch_one(executor)
            .await?;
        Ok(item)
    }

    // ---
    // Transferências
    // ---

    pub async fn create_transfer<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        from_warehouse_id: Uuid,
        to_warehouse_id: Uuid,
        material_id: Uuid,
        quantity: Decimal,
        requested_by: Uuid,
    ) -> Result<WarehouseTransfer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transfer = sqlx::query_as::<_, WarehouseTransfer>(&format!(
            r#"
            INSERT INTO warehouse_transfers
                (company_id, from_warehouse_id, to_warehouse_id, material_id, quantity, requested_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {TRANSFER_COLUMNS}
            "#
        ))
            .bind(company_id)
            .bind(from_warehouse_id)
            .bind(to_warehouse_id)
            .bind(material_id)
            .bind(quantity)
            .bind(requested_by)
            .fetch_one(executor)
            .await?;
        Ok(transfer)
    }

    pub async fn list_transfers<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        status: Option<TransferStatus>,
    ) -> Result<Vec<WarehouseTransfer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transfers = sqlx::query_as::<_, WarehouseTransfer>(&format!(
            r#"
            SELECT {TRANSFER_COLUMNS}
            FROM warehouse_transfers
            WHERE company_id = $1 AND ($2::transfer_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#
        ))
            .bind(company_id)
            .bind(status)
            .fetch_all(executor)
            .await?;
        Ok(transfers)
    }

    pub async fn get_transfer_for_update<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        transfer_id: Uuid,
    ) -> Result<Option<WarehouseTransfer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transfer = sqlx::query_as::<_, WarehouseTransfer>(&format!(
            "SELECT {TRANSFER_COLUMNS} FROM warehouse_transfers WHERE company_id = $1 AND id = $2 FOR UPDATE"
        ))
            .bind(company_id)
            .bind(transfer_id)
            .fetch_optional(executor)
            .await?;
        Ok(transfer)
    }

    pub async fn set_transfer_status<'e, E>(
        &self,
        executor: E,
        transfer_id: Uuid,
        status: TransferStatus,
    ) -> Result<WarehouseTransfer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let transfer = sqlx::query_as::<_, WarehouseTransfer>(&format!(
            r#"
            UPDATE warehouse_transfers SET status = $2, decided_at = NOW()
            WHERE id = $1
            RETURNING {TRANSFER_COLUMNS}
            "#
        ))
            .bind(transfer_id)
            .bind(status)
            .fetch_one(executor)
            .await?;
        Ok(transfer)
    }
}
