// src/db/subscription_repo.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, PgConnection, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::subscription::{
        ResourceKind, ResourceLimits, Subscription, SubscriptionPlan, SubscriptionStatus,
    },
};

const PLAN_COLUMNS: &str = "id, name, price, max_operators, max_customers, max_branches, \
                            max_warehouses, is_active, created_at";

const SUBSCRIPTION_COLUMNS: &str = "id, company_id, plan_id, status, max_operators, max_customers, \
                                    max_branches, max_warehouses, starts_at, ends_at, created_at";

#[derive(Clone)]
pub struct SubscriptionRepository {
    pool: PgPool,
}

impl SubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // --- PLANOS ---

    pub async fn list_plans<'e, E>(&self, executor: E) -> Result<Vec<SubscriptionPlan>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let plans = sqlx::query_as::<_, SubscriptionPlan>(&format!(
            "SELECT {PLAN_COLUMNS} FROM subscription_plans ORDER BY price ASC, name ASC"
        ))
            .fetch_all(executor)
            .await?;
        Ok(plans)
    }

    pub async fn find_plan<'e, E>(
        &self,
        executor: E,
        plan_id: Uuid,
    ) -> Result<Option<SubscriptionPlan>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let plan = sqlx::query_as::<_, SubscriptionPlan>(&format!(
            "SELECT {PLAN_COLUMNS} FROM subscription_plans WHERE id = $1"
        ))
            .bind(plan_id)
            .fetch_optional(executor)
            .await?;
        Ok(plan)
    }

    pub async fn create_plan<'e, E>(
        &self,
        executor: E,
        name: &str,
        price: Decimal,
        limits: &ResourceLimits,
    ) -> Result<SubscriptionPlan, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, SubscriptionPlan>(&format!(
            r#"
            INSERT INTO subscription_plans
                (name, price, max_operators, max_customers, max_branches, max_warehouses)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PLAN_COLUMNS}
            "#
        ))
            .bind(name)
            .bind(price)
            .bind(limits.max_operators)
            .bind(limits.max_customers)
            .bind(limits.max_branches)
            .bind(limits.max_warehouses)
            .fetch_one(executor)
            .await
            .map_err(|e| map_unique_violation(e, "plan"))
    }

    /// Substitui preço, tetos e situação do plano.
    pub async fn update_plan<'e, E>(
        &self,
        executor: E,
        plan_id: Uuid,
        price: Decimal,
        limits: &ResourceLimits,
        is_active: bool,
    ) -> Result<Option<SubscriptionPlan>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let plan = sqlx::query_as::<_, SubscriptionPlan>(&format!(
            r#"
            UPDATE subscription_plans SET
                price = $2,
                max_operators = $3,
                max_customers = $4,
                max_branches = $5,
                max_warehouses = $6,
                is_active = $7
            WHERE id = $1
            RETURNING {PLAN_COLUMNS}
            "#
        ))
            .bind(plan_id)
            .bind(price)
            .bind(limits.max_operators)
            .bind(limits.max_customers)
            .bind(limits.max_branches)
            .bind(limits.max_warehouses)
            .bind(is_active)
            .fetch_optional(executor)
            .await?;
        Ok(plan)
    }

    // --- ASSINATURAS ---

    /// Assinatura ativa da empresa. Se houver mais de uma (dados legados),
    /// vence a mais recente.
    pub async fn find_active<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
    ) -> Result<Option<Subscription>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let subscription = sqlx::query_as::<_, Subscription>(&format!(
            r#"
            SELECT {SUBSCRIPTION_COLUMNS}
            FROM subscriptions
            WHERE company_id = $1 AND status = 'active'
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
            .bind(company_id)
            .fetch_optional(executor)
            .await?;
        Ok(subscription)
    }

    /// Cancela a ativa atual e grava a nova. O chamador abre a transação.
    pub async fn replace_active(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        plan_id: Option<Uuid>,
        overrides: &ResourceLimits,
        ends_at: Option<DateTime<Utc>>,
    ) -> Result<Subscription, AppError> {

        sqlx::query(
            "UPDATE subscriptions SET status = $2 WHERE company_id = $1 AND status = 'active'",
        )
            .bind(company_id)
            .bind(SubscriptionStatus::Cancelled)
            .execute(&mut *conn)
            .await?;

        let subscription = sqlx::query_as::<_, Subscription>(&format!(
            r#"
            INSERT INTO subscriptions
                (company_id, plan_id, status, max_operators, max_customers, max_branches, max_warehouses, ends_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {SUBSCRIPTION_COLUMNS}
            "#
        ))
            .bind(company_id)
            .bind(plan_id)
            .bind(SubscriptionStatus::Active)
            .bind(overrides.max_operators)
            .bind(overrides.max_customers)
            .bind(overrides.max_branches)
            .bind(overrides.max_warehouses)
            .bind(ends_at)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| map_unique_violation(e, "subscription"))?;

        Ok(subscription)
    }

    // --- USO ---

    /// Quantidade atual de um tipo de recurso na empresa.
    /// Filiais não têm company_id: contam via cliente dono.
    pub async fn count_usage<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        kind: ResourceKind,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = match kind {
            ResourceKind::Operators => "SELECT COUNT(*) FROM operators WHERE company_id = $1",
            ResourceKind::Customers => "SELECT COUNT(*) FROM customers WHERE company_id = $1",
            ResourceKind::Warehouses => "SELECT COUNT(*) FROM warehouses WHERE company_id = $1",
            ResourceKind::Branches => {
                r#"
                SELECT COUNT(*)
                FROM customer_branches b
                JOIN customers c ON c.id = b.customer_id
                WHERE c.company_id = $1
                "#
            }
        };

        let count: i64 = sqlx::query_scalar(sql)
            .bind(company_id)
            .fetch_one(executor)
            .await?;
        Ok(count)
    }
}
