// src/db/operations_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Executor};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::operations::{Operator, Visit, VisitStatus},
};

const VISIT_COLUMNS: &str = "id, company_id, customer_id, branch_id, operator_id, scheduled_at, \
                             status, is_invoiced, is_checked, notes, created_at, updated_at";

const OPERATOR_COLUMNS: &str = "id, company_id, profile_id, full_name, phone, is_active, created_at";

#[derive(Clone)]
pub struct OperationsRepository {
    pool: PgPool,
}

/// Alterações parciais de uma visita; `None` mantém o valor atual.
#[derive(Debug, Clone, Default)]
pub struct VisitChanges<'a> {
    pub status: Option<VisitStatus>,
    pub operator_id: Option<Uuid>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub is_invoiced: Option<bool>,
    pub is_checked: Option<bool>,
    pub notes: Option<&'a str>,
}

impl OperationsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // --- OPERADORES ---

    pub async fn list_operators<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
    ) -> Result<Vec<Operator>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let operators = sqlx::query_as::<_, Operator>(&format!(
            "SELECT {OPERATOR_COLUMNS} FROM operators WHERE company_id = $1 ORDER BY full_name ASC"
        ))
            .bind(company_id)
            .fetch_all(executor)
            .await?;
        Ok(operators)
    }

    /// Operadores são gravados pela função remota junto com o login.
    pub async fn find_operator<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        operator_id: Uuid,
    ) -> Result<Option<Operator>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let operator = sqlx::query_as::<_, Operator>(&format!(
            "SELECT {OPERATOR_COLUMNS} FROM operators WHERE company_id = $1 AND id = $2"
        ))
            .bind(company_id)
            .bind(operator_id)
            .fetch_optional(executor)
            .await?;
        Ok(operator)
    }

    pub async fn set_operator_active<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        operator_id: Uuid,
        is_active: bool,
    ) -> Result<Option<Operator>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let operator = sqlx::query_as::<_, Operator>(&format!(
            r#"
            UPDATE operators SET is_active = $3
            WHERE company_id = $1 AND id = $2
            RETURNING {OPERATOR_COLUMNS}
            "#
        ))
            .bind(company_id)
            .bind(operator_id)
            .bind(is_active)
            .fetch_optional(executor)
            .await?;
        Ok(operator)
    }

    pub async fn operator_belongs_to<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        operator_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM operators WHERE company_id = $1 AND id = $2)",
        )
            .bind(company_id)
            .bind(operator_id)
            .fetch_one(executor)
            .await?;
        Ok(exists)
    }

    // --- VISITAS ---

    pub async fn list_visits<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        status: Option<VisitStatus>,
        operator_id: Option<Uuid>,
    ) -> Result<Vec<Visit>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let visits = sqlx::query_as::<_, Visit>(&format!(
            r#"
            SELECT {VISIT_COLUMNS}
            FROM visits
            WHERE company_id = $1
              AND scheduled_at >= $2 AND scheduled_at < $3
              AND ($4::visit_status IS NULL OR status = $4)
              AND ($5::uuid IS NULL OR operator_id = $5)
            ORDER BY scheduled_at ASC
            "#
        ))
            .bind(company_id)
            .bind(start)
            .bind(end)
            .bind(status)
            .bind(operator_id)
            .fetch_all(executor)
            .await?;
        Ok(visits)
    }

    /// Cliente dono da visita, se ela for da empresa.
    pub async fn visit_customer<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        visit_id: Uuid,
    ) -> Result<Option<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let customer_id: Option<Uuid> = sqlx::query_scalar(
            "SELECT customer_id FROM visits WHERE company_id = $1 AND id = $2",
        )
            .bind(company_id)
            .bind(visit_id)
            .fetch_optional(executor)
            .await?;
        Ok(customer_id)
    }

    pub async fn find_visit<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        visit_id: Uuid,
    ) -> Result<Option<Visit>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let visit = sqlx::query_as::<_, Visit>(&format!(
            "SELECT {VISIT_COLUMNS} FROM visits WHERE company_id = $1 AND id = $2 FOR UPDATE"
        ))
            .bind(company_id)
            .bind(visit_id)
            .fetch_optional(executor)
            .await?;
        Ok(visit)
    }

    pub async fn create_visit<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        customer_id: Uuid,
        branch_id: Option<Uuid>,
        operator_id: Option<Uuid>,
        scheduled_at: DateTime<Utc>,
        notes: Option<&str>,
    ) -> Result<Visit, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Visita já nasce "assigned" quando tem operador
        let status = if operator_id.is_some() { VisitStatus::Assigned } else { VisitStatus::Pending };

        let visit = sqlx::query_as::<_, Visit>(&format!(
            r#"
            INSERT INTO visits (company_id, customer_id, branch_id, operator_id, scheduled_at, status, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {VISIT_COLUMNS}
            "#
        ))
            .bind(company_id)
            .bind(customer_id)
            .bind(branch_id)
            .bind(operator_id)
            .bind(scheduled_at)
            .bind(status)
            .bind(notes)
            .fetch_one(executor)
            .await?;
        Ok(visit)
    }

    pub async fn update_visit<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        visit_id: Uuid,
        changes: &VisitChanges<'_>,
    ) -> Result<Visit, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let visit = sqlx::query_as::<_, Visit>(&format!(
            r#"
            UPDATE visits SET
                status = COALESCE($3, status),
                operator_id = COALESCE($4, operator_id),
                scheduled_at = COALESCE($5, scheduled_at),
                is_invoiced = COALESCE($6, is_invoiced),
                is_checked = COALESCE($7, is_checked),
                notes = COALESCE($8, notes),
                updated_at = NOW()
            WHERE company_id = $1 AND id = $2
            RETURNING {VISIT_COLUMNS}
            "#
        ))
            .bind(company_id)
            .bind(visit_id)
            .bind(changes.status)
            .bind(changes.operator_id)
            .bind(changes.scheduled_at)
            .bind(changes.is_invoiced)
            .bind(changes.is_checked)
            .bind(changes.notes)
            .fetch_optional(executor)
            .await?;

        visit.ok_or_else(|| AppError::ResourceNotFound(format!("visit {}", visit_id)))
    }

    pub async fn delete_visit<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        visit_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM visits WHERE company_id = $1 AND id = $2")
            .bind(company_id)
            .bind(visit_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
