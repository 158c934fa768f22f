// src/services/inventory_service.rs

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CrmRepository, InventoryRepository, OperationsRepository},
    models::{
        inventory::{
            CompanyMaterial, MaterialSaleDetail, TransferStatus, Warehouse, WarehouseItem, WarehouseTransfer,
        },
        report::ReportPeriod,
        subscription::ResourceKind,
    },
    services::subscription_service::SubscriptionService,
};

/// Linha de uma venda de materiais.
#[derive(Debug, Clone)]
pub struct SaleItemInput {
    pub material_id: Uuid,
    pub quantity: Decimal,
    pub unit_price: Decimal,
}

/// Só transferências pendentes podem ser decididas.
pub fn ensure_pending(transfer: &WarehouseTransfer) -> Result<(), AppError> {
    if transfer.status != TransferStatus::Pending {
        return Err(AppError::TransferNotPending);
    }
    Ok(())
}

/// A visita vinculada à venda precisa ser do mesmo cliente (e da empresa,
/// já que `visit_owner` vem de uma busca escopada).
pub fn ensure_visit_of_customer(visit_id: Uuid, visit_owner: Option<Uuid>, customer_id: Uuid) -> Result<(), AppError> {
    if visit_owner != Some(customer_id) {
        return Err(AppError::ResourceNotFound(format!("visit {}", visit_id)));
    }
    Ok(())
}

/// O armazém de origem precisa ter saldo para a quantidade pedida.
pub fn ensure_stock(source: Option<&WarehouseItem>, quantity: Decimal) -> Result<(), AppError> {
    match source {
        Some(item) if item.quantity >= quantity => Ok(()),
        _ => Err(AppError::InsufficientStock),
    }
}

#[derive(Clone)]
pub struct InventoryService {
    repo: InventoryRepository,
    crm_repo: CrmRepository,
    operations_repo: OperationsRepository,
    subscriptions: SubscriptionService,
}

impl InventoryService {
    pub fn new(
        repo: InventoryRepository,
        crm_repo: CrmRepository,
        operations_repo: OperationsRepository,
        subscriptions: SubscriptionService,
    ) -> Self {
        Self { repo, crm_repo, operations_repo, subscriptions }
    }

    // =========================================================================
    //  MATERIAIS E VENDAS
    // =========================================================================

    pub async fn list_materials<'e, E>(&self, executor: E, company_id: Uuid) -> Result<Vec<CompanyMaterial>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_materials(executor, company_id).await
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
        self.repo.create_material(executor, company_id, name, unit, price).await
    }

    /// Grava cabeçalho e itens na mesma transação.
    pub async fn record_sale<'c, A>(
        &self,
        conn: A,
        company_id: Uuid,
        customer_id: Uuid,
        branch_id: Option<Uuid>,
        visit_id: Option<Uuid>,
        sold_at: DateTime<Utc>,
        notes: Option<&str>,
        items: &[SaleItemInput],
    ) -> Result<MaterialSaleDetail, AppError>
    where
        A: Acquire<'c, Database = Postgres>,
    {
        let mut tx = conn.begin().await?;

        // 1. Referências
        if self.crm_repo.find_customer(&mut *tx, company_id, customer_id).await?.is_none() {
            return Err(AppError::ResourceNotFound(format!("customer {}", customer_id)));
        }
        if let Some(branch_id) = branch_id {
            if self.crm_repo.branch_customer(&mut *tx, company_id, branch_id).await? != Some(customer_id) {
                return Err(AppError::ResourceNotFound(format!("branch {}", branch_id)));
            }
        }
        if let Some(visit_id) = visit_id {
            let owner = self.operations_repo.visit_customer(&mut *tx, company_id, visit_id).await?;
            ensure_visit_of_customer(visit_id, owner, customer_id)?;
        }
        let material_ids: Vec<Uuid> = items
            .iter()
            .map(|i| i.material_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let owned = self.repo.count_owned_materials(&mut *tx, company_id, &material_ids).await?;
        if owned != material_ids.len() as i64 {
            return Err(AppError::ResourceNotFound("material".to_string()));
        }

        // 2. Cabeçalho + itens
        let header = self
            .repo
            .create_sale(&mut *tx, company_id, customer_id, branch_id, visit_id, sold_at, notes)
            .await?;

        let mut saved = Vec::with_capacity(items.len());
        for item in items {
            saved.push(
                self.repo
                    .add_sale_item(&mut *tx, header.id, item.material_id, item.quantity, item.unit_price)
                    .await?,
            );
        }

        tx.commit().await?;

        let total = saved.iter().map(|i| i.quantity * i.unit_price).sum();
        Ok(MaterialSaleDetail { header, items: saved, total })
    }

    pub async fn list_sales<'c, A>(
        &self,
        conn: A,
        company_id: Uuid,
        period: &ReportPeriod,
    ) -> Result<Vec<MaterialSaleDetail>, AppError>
    where
        A: Acquire<'c, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;
        let sales = self.repo.list_sales(&mut *conn, company_id, period.start, period.end).await?;
        let sale_ids: Vec<Uuid> = sales.iter().map(|s| s.id).collect();
        let items = self.repo.list_sale_items(&mut *conn, &sale_ids).await?;

        let mut by_sale: HashMap<Uuid, Vec<_>> = HashMap::new();
        for item in items {
            by_sale.entry(item.sale_id).or_default().push(item);
        }

        Ok(sales
            .into_iter()
            .map(|header| {
                let items = by_sale.remove(&header.id).unwrap_or_default();
                let total = items.iter().map(|i| i.quantity * i.unit_price).sum();
                MaterialSaleDetail { header, items, total }
            })
            .collect())
    }

    // =========================================================================
    //  ARMAZÉNS
    // =========================================================================

    pub async fn list_warehouses<'e, E>(&self, executor: E, company_id: Uuid) -> Result<Vec<Warehouse>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_warehouses(executor, company_id).await
    }

    pub async fn create_warehouse<'c, A>(
        &self,
        conn: A,
        company_id: Uuid,
        name: &str,
        location: Option<&str>,
    ) -> Result<Warehouse, AppError>
    where
        A: Acquire<'c, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;
        self.subscriptions.ensure_capacity(&mut *conn, company_id, ResourceKind::Warehouses, 1).await?;
        self.repo.create_warehouse(&mut *conn, company_id, name, location).await
    }

    async fn ensure_warehouse<'e, E>(&self, executor: E, company_id: Uuid, warehouse_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if !self.repo.warehouse_belongs_to(executor, company_id, warehouse_id).await? {
            return Err(AppError::ResourceNotFound(format!("warehouse {}", warehouse_id)));
        }
        Ok(())
    }

    pub async fn list_items<'c, A>(&self, conn: A, company_id: Uuid, warehouse_id: Uuid) -> Result<Vec<WarehouseItem>, AppError>
    where
        A: Acquire<'c, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;
        self.ensure_warehouse(&mut *conn, company_id, warehouse_id).await?;
        self.repo.list_items(&mut *conn, warehouse_id).await
    }

    /// Define saldo e limites (mínimo/máximo) de um material no armazém.
    pub async fn set_item<'c, A>(
        &self,
        conn: A,
        company_id: Uuid,
        warehouse_id: Uuid,
        material_id: Uuid,
        quantity: Decimal,
        min_quantity: Decimal,
        max_quantity: Option<Decimal>,
    ) -> Result<WarehouseItem, AppError>
    where
        A: Acquire<'c, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;
        self.ensure_warehouse(&mut *conn, company_id, warehouse_id).await?;
        if self.repo.count_owned_materials(&mut *conn, company_id, &[material_id]).await? == 0 {
            return Err(AppError::ResourceNotFound(format!("material {}", material_id)));
        }
        self.repo
            .upsert_item(&mut *conn, warehouse_id, material_id, quantity, min_quantity, max_quantity)
            .await
    }

    pub async fn low_stock<'e, E>(&self, executor: E, company_id: Uuid) -> Result<Vec<WarehouseItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_low_stock(executor, company_id).await
    }

    // =========================================================================
    //  TRANSFERÊNCIAS
    // =========================================================================

    pub async fn list_transfers<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        status: Option<TransferStatus>,
    ) -> Result<Vec<WarehouseTransfer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_transfers(executor, company_id, status).await
    }

    pub async fn request_transfer<'c, A>(
        &self,
        conn: A,
        company_id: Uuid,
        from_warehouse_id: Uuid,
        to_warehouse_id: Uuid,
        material_id: Uuid,
        quantity: Decimal,
        requested_by: Uuid,
    ) -> Result<WarehouseTransfer, AppError>
    where
        A: Acquire<'c, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;
        self.ensure_warehouse(&mut *conn, company_id, from_warehouse_id).await?;
        self.ensure_warehouse(&mut *conn, company_id, to_warehouse_id).await?;
        if self.repo.count_owned_materials(&mut *conn, company_id, &[material_id]).await? == 0 {
            return Err(AppError::ResourceNotFound(format!("material {}", material_id)));
        }

        self.repo
            .create_transfer(&mut *conn, company_id, from_warehouse_id, to_warehouse_id, material_id, quantity, requested_by)
            .await
    }

    /// Aprova e move o estoque. Tudo numa transação, com as linhas travadas.
    pub async fn approve_transfer<'c, A>(&self, conn: A, company_id: Uuid, transfer_id: Uuid) -> Result<WarehouseTransfer, AppError>
    where
        A: Acquire<'c, Database = Postgres>,
    {
        let mut tx = conn.begin().await?;

        // 1. Trava a transferência
        let transfer = self
            .repo
            .get_transfer_for_update(&mut *tx, company_id, transfer_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("transfer {}", transfer_id)))?;
        ensure_pending(&transfer)?;

        // 2. Trava o saldo de origem e confere
        let source = self
            .repo
            .get_item_for_update(&mut *tx, transfer.from_warehouse_id, transfer.material_id)
            .await?;
        ensure_stock(source.as_ref(), transfer.quantity)?;

        // 3. Move
        self.repo
            .adjust_item_quantity(&mut *tx, transfer.from_warehouse_id, transfer.material_id, -transfer.quantity)
            .await?;
        self.repo
            .adjust_item_quantity(&mut *tx, transfer.to_warehouse_id, transfer.material_id, transfer.quantity)
            .await?;

        // 4. Marca como aprovada
        let approved = self.repo.set_transfer_status(&mut *tx, transfer.id, TransferStatus::Approved).await?;
        tx.commit().await?;

        tracing::info!(%transfer_id, quantity = %transfer.quantity, "Transferência aprovada");
        Ok(approved)
    }

    pub async fn reject_transfer<'c, A>(&self, conn: A, company_id: Uuid, transfer_id: Uuid) -> Result<WarehouseTransfer, AppError>
    where
        A: Acquire<'c, Database = Postgres>,
    {
        let mut tx = conn.begin().await?;

        let transfer = self
            .repo
            .get_transfer_for_update(&mut *tx, company_id, transfer_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("transfer {}", transfer_id)))?;
        ensure_pending(&transfer)?;

        let rejected = self.repo.set_transfer_status(&mut *tx, transfer.id, TransferStatus::Rejected).await?;
        tx.commit().await?;
        Ok(rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: i64) -> WarehouseItem {
        WarehouseItem {
            id: Uuid::new_v4(),
            warehouse_id: Uuid::new_v4(),
            material_id: Uuid::new_v4(),
            quantity: Decimal::from(quantity),
            min_quantity: Decimal::from(2),
            max_quantity: None,
            updated_at: Utc::now(),
        }
    }

    fn transfer(status: TransferStatus) -> WarehouseTransfer {
        WarehouseTransfer {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            from_warehouse_id: Uuid::new_v4(),
            to_warehouse_id: Uuid::new_v4(),
            material_id: Uuid::new_v4(),
            quantity: Decimal::from(3),
            status,
            requested_by: None,
            decided_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn decided_transfers_cannot_be_decided_again() {
        assert!(ensure_pending(&transfer(TransferStatus::Pending)).is_ok());
        assert!(matches!(ensure_pending(&transfer(TransferStatus::Approved)), Err(AppError::TransferNotPending)));
        assert!(matches!(ensure_pending(&transfer(TransferStatus::Rejected)), Err(AppError::TransferNotPending)));
    }

    #[test]
    fn source_must_cover_the_quantity() {
        assert!(ensure_stock(Some(&item(3)), Decimal::from(3)).is_ok());
        assert!(matches!(ensure_stock(Some(&item(2)), Decimal::from(3)), Err(AppError::InsufficientStock)));
        assert!(matches!(ensure_stock(None, Decimal::ONE), Err(AppError::InsufficientStock)));
    }

    #[test]
    fn sale_cannot_point_at_another_customers_visit() {
        let visit_id = Uuid::new_v4();
        let customer_id = Uuid::new_v4();
        assert!(ensure_visit_of_customer(visit_id, Some(customer_id), customer_id).is_ok());
        assert!(matches!(
            ensure_visit_of_customer(visit_id, Some(Uuid::new_v4()), customer_id),
            Err(AppError::ResourceNotFound(_))
        ));
        // Visita de outra empresa não aparece na busca escopada
        assert!(matches!(ensure_visit_of_customer(visit_id, None, customer_id), Err(AppError::ResourceNotFound(_))));
    }

    #[test]
    fn low_stock_is_at_or_below_minimum() {
        assert!(item(2).is_low_stock());
        assert!(!item(3).is_low_stock());
    }
}
