// src/db/report_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        crm::{Customer, CustomerBranch, PricingRecord},
        inventory::SaleLine,
        operations::{Operator, Visit},
    },
};

/// Leituras usadas pelos relatórios. Cada consulta é independente para
/// permitir execução concorrente no serviço.
#[derive(Clone)]
pub struct ReportRepository {
    pool: PgPool,
}

impl ReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // 1. Clientes da empresa
    pub async fn customers<'e, E>(&self, executor: E, company_id: Uuid) -> Result<Vec<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, company_id, profile_id, full_name, company_name, email, phone, address, created_at
            FROM customers
            WHERE company_id = $1
            "#,
        )
            .bind(company_id)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    // 2. Filiais (via cliente)
    pub async fn branches<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
    ) -> Result<Vec<CustomerBranch>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, CustomerBranch>(
            r#"
            SELECT b.id, b.customer_id, b.name, b.address, b.phone, b.created_at
            FROM customer_branches b
            JOIN customers c ON c.id = b.customer_id
            WHERE c.company_id = $1
            "#,
        )
            .bind(company_id)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    // 3. Preços por cliente
    pub async fn customer_pricing<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
    ) -> Result<Vec<PricingRecord>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, PricingRecord>(
            r#"
            SELECT p.id, p.customer_id AS owner_id, p.pricing_type, p.amount, p.updated_at
            FROM customer_pricing p
            JOIN customers c ON c.id = p.customer_id
            WHERE c.company_id = $1
            "#,
        )
            .bind(company_id)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    // 4. Preços por filial
    pub async fn branch_pricing<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
    ) -> Result<Vec<PricingRecord>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, PricingRecord>(
            r#"
            SELECT p.id, p.branch_id AS owner_id, p.pricing_type, p.amount, p.updated_at
            FROM branch_pricing p
            JOIN customer_branches b ON b.id = p.branch_id
            JOIN customers c ON c.id = b.customer_id
            WHERE c.company_id = $1
            "#,
        )
            .bind(company_id)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    // 5. Operadores (inclui inativos: visitas antigas continuam nomeadas)
    pub async fn operators<'e, E>(&self, executor: E, company_id: Uuid) -> Result<Vec<Operator>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, Operator>(
            "SELECT id, company_id, profile_id, full_name, phone, is_active, created_at FROM operators WHERE company_id = $1",
        )
            .bind(company_id)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    // 6. Visitas do período, restritas aos clientes do tenant
    pub async fn visits<'e, E>(
        &self,
        executor: E,
        customer_ids: &[Uuid],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Visit>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, Visit>(
            r#"
            SELECT id, company_id, customer_id, branch_id, operator_id, scheduled_at,
                   status, is_invoiced, is_checked, notes, created_at, updated_at
            FROM visits
            WHERE customer_id = ANY($1)
              AND scheduled_at >= $2 AND scheduled_at < $3
            ORDER BY scheduled_at ASC
            "#,
        )
            .bind(customer_ids)
            .bind(start)
            .bind(end)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    // 7. Itens vendidos no período, já juntados ao cabeçalho da venda
    pub async fn sale_lines<'e, E>(
        &self,
        executor: E,
        customer_ids: &[Uuid],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SaleLine>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, SaleLine>(
            r#"
            SELECT s.id AS sale_id, s.customer_id, s.branch_id, s.visit_id, s.sold_at,
                   i.material_id, i.quantity, i.unit_price
            FROM paid_material_sales s
            JOIN paid_material_sale_items i ON i.sale_id = s.id
            WHERE s.customer_id = ANY($1)
              AND s.sold_at >= $2 AND s.sold_at < $3
            "#,
        )
            .bind(customer_ids)
            .bind(start)
            .bind(end)
            .fetch_all(executor)
            .await?;
        Ok(rows)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
