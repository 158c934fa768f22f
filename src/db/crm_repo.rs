// src/db/crm_repo.rs

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Executor};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::crm::{Customer, CustomerBranch, PricingRecord, PricingType},
};

const CUSTOMER_COLUMNS: &str =
    "id, company_id, profile_id, full_name, company_name, email, phone, address, created_at";

#[derive(Clone)]
pub struct CrmRepository {
    pool: PgPool,
}

/// Campos editáveis de um cliente.
#[derive(Debug, Clone, Default)]
pub struct CustomerFields<'a> {
    pub full_name: &'a str,
    pub company_name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub address: Option<&'a str>,
}

/// Em qual tabela de preços operar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricingOwner {
    Customer,
    Branch,
}

impl PricingOwner {
    fn table(&self) -> &'static str {
        match self {
            PricingOwner::Customer => "customer_pricing",
            PricingOwner::Branch => "branch_pricing",
        }
    }

    fn key(&self) -> &'static str {
        match self {
            PricingOwner::Customer => "customer_id",
            PricingOwner::Branch => "branch_id",
        }
    }
}

impl CrmRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  CLIENTES
    // =========================================================================

    /// Listagem paginada (offset + limit) com busca opcional por nome/empresa/e-mail.
    pub async fn list_customers<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        search: Option<&str>,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let search_term = search.map(|q| format!("%{}%", q.trim()));

        let customers = sqlx::query_as::<_, Customer>(&format!(
            r#"
            SELECT {CUSTOMER_COLUMNS}
            FROM customers
            WHERE company_id = $1
              AND ($2::text IS NULL OR full_name ILIKE $2 OR company_name ILIKE $2 OR email ILIKE $2)
            ORDER BY full_name ASC
            OFFSET $3 LIMIT $4
            "#
        ))
            .bind(company_id)
            .bind(search_term)
            .bind(offset)
            .bind(limit)
            .fetch_all(executor)
            .await?;

        Ok(customers)
    }

    pub async fn find_customer<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE company_id = $1 AND id = $2"
        ))
            .bind(company_id)
            .bind(customer_id)
            .fetch_optional(executor)
            .await?;
        Ok(customer)
    }

    /// Cliente sem login próprio (`profile_id` nulo).
    pub async fn create_customer<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        fields: &CustomerFields<'_>,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Customer>(&format!(
            r#"
            INSERT INTO customers (company_id, full_name, company_name, email, phone, address)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
            .bind(company_id)
            .bind(fields.full_name)
            .bind(fields.company_name)
            .bind(fields.email)
            .bind(fields.phone)
            .bind(fields.address)
            .fetch_one(executor)
            .await
            .map_err(|e| map_unique_violation(e, "customer"))
    }

    pub async fn update_customer<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        customer_id: Uuid,
        fields: &CustomerFields<'_>,
    ) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            r#"
            UPDATE customers
            SET full_name = $3, company_name = $4, email = $5, phone = $6, address = $7
            WHERE company_id = $1 AND id = $2
            RETURNING {CUSTOMER_COLUMNS}
            "#
        ))
            .bind(company_id)
            .bind(customer_id)
            .bind(fields.full_name)
            .bind(fields.company_name)
            .bind(fields.email)
            .bind(fields.phone)
            .bind(fields.address)
            .fetch_optional(executor)
            .await?;
        Ok(customer)
    }

    pub async fn delete_customer<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        customer_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM customers WHERE company_id = $1 AND id = $2")
            .bind(company_id)
            .bind(customer_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    //  FILIAIS
    // =========================================================================

    pub async fn list_branches<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Vec<CustomerBranch>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let branches = sqlx::query_as::<_, CustomerBranch>(
            r#"
            SELECT b.id, b.customer_id, b.name, b.address, b.phone, b.created_at
            FROM customer_branches b
            JOIN customers c ON c.id = b.customer_id
            WHERE c.company_id = $1 AND b.customer_id = $2
            ORDER BY b.name ASC
            "#,
        )
            .bind(company_id)
            .bind(customer_id)
            .fetch_all(executor)
            .await?;
        Ok(branches)
    }

    pub async fn create_branch<'e, E>(
        &self,
        executor: E,
        customer_id: Uuid,
        name: &str,
        address: Option<&str>,
        phone: Option<&str>,
    ) -> Result<CustomerBranch, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let branch = sqlx::query_as::<_, CustomerBranch>(
            r#"
            INSERT INTO customer_branches (customer_id, name, address, phone)
            VALUES ($1, $2, $3, $4)
            RETURNING id, customer_id, name, address, phone, created_at
            "#,
        )
            .bind(customer_id)
            .bind(name)
            .bind(address)
            .bind(phone)
            .fetch_one(executor)
            .await?;
        Ok(branch)
    }

    /// Confirma que a filial pertence à empresa e devolve o cliente dono.
    pub async fn branch_customer<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        branch_id: Uuid,
    ) -> Result<Option<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer_id: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT b.customer_id
            FROM customer_branches b
            JOIN customers c ON c.id = b.customer_id
            WHERE c.company_id = $1 AND b.id = $2
            "#,
        )
            .bind(company_id)
            .bind(branch_id)
            .fetch_optional(executor)
            .await?;
        Ok(customer_id)
    }

    pub async fn delete_branch<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        branch_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            DELETE FROM customer_branches b
            USING customers c
            WHERE c.id = b.customer_id AND c.company_id = $1 AND b.id = $2
            "#,
        )
            .bind(company_id)
            .bind(branch_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    //  PREÇOS (upsert com chave de conflito no dono)
    // =========================================================================

    pub async fn upsert_pricing<'e, E>(
        &self,
        executor: E,
        owner: PricingOwner,
        owner_id: Uuid,
        pricing_type: PricingType,
        amount: Decimal,
    ) -> Result<PricingRecord, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (table, key) = (owner.table(), owner.key());
        let record = sqlx::query_as::<_, PricingRecord>(&format!(
            r#"
            INSERT INTO {table} ({key}, pricing_type, amount)
            VALUES ($1, $2, $3)
            ON CONFLICT ({key})
            DO UPDATE SET
                pricing_type = EXCLUDED.pricing_type,
                amount = EXCLUDED.amount,
                updated_at = NOW()
            RETURNING id, {key} AS owner_id, pricing_type, amount, updated_at
            "#
        ))
            .bind(owner_id)
            .bind(pricing_type)
            .bind(amount)
            .fetch_one(executor)
            .await?;
        Ok(record)
    }

    pub async fn find_pricing<'e, E>(
        &self,
        executor: E,
        owner: PricingOwner,
        owner_id: Uuid,
    ) -> Result<Option<PricingRecord>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (table, key) = (owner.table(), owner.key());
        let record = sqlx::query_as::<_, PricingRecord>(&format!(
            "SELECT id, {key} AS owner_id, pricing_type, amount, updated_at FROM {table} WHERE {key} = $1"
        ))
            .bind(owner_id)
            .fetch_optional(executor)
            .await?;
        Ok(record)
    }

    pub async fn delete_pricing<'e, E>(
        &self,
        executor: E,
        owner: PricingOwner,
        owner_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let (table, key) = (owner.table(), owner.key());
        let result = sqlx::query(&format!("DELETE FROM {table} WHERE {key} = $1"))
            .bind(owner_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
