// src/services/operation_service.rs

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{operations_repo::VisitChanges, CrmRepository, OperationsRepository},
    models::{
        operations::{Operator, Visit, VisitStatus},
        report::ReportPeriod,
        subscription::ResourceKind,
    },
    services::{
        gateway::{CreateOperatorAccount, FunctionGateway},
        subscription_service::SubscriptionService,
    },
};

/// Visita cancelada é imutável. Nenhuma outra transição é validada.
pub fn ensure_editable(visit: &Visit) -> Result<(), AppError> {
    if visit.status == VisitStatus::Cancelled {
        return Err(AppError::VisitCancelled);
    }
    Ok(())
}

/// Dados de uma nova visita.
#[derive(Debug, Clone)]
pub struct NewVisit<'a> {
    pub customer_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub operator_id: Option<Uuid>,
    pub scheduled_at: DateTime<Utc>,
    pub notes: Option<&'a str>,
}

#[derive(Clone)]
pub struct OperationsService {
    repo: OperationsRepository,
    crm_repo: CrmRepository,
    subscriptions: SubscriptionService,
    gateway: Arc<dyn FunctionGateway>,
}

impl OperationsService {
    pub fn new(
        repo: OperationsRepository,
        crm_repo: CrmRepository,
        subscriptions: SubscriptionService,
        gateway: Arc<dyn FunctionGateway>,
    ) -> Self {
        Self { repo, crm_repo, subscriptions, gateway }
    }

    // --- OPERADORES ---

    pub async fn list_operators<'e, E>(&self, executor: E, company_id: Uuid) -> Result<Vec<Operator>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_operators(executor, company_id).await
    }

    /// Cria o operador dentro do teto do plano. A função remota grava a
    /// linha e o login juntos; a linha é relida aqui.
    pub async fn create_operator<'c, A>(
        &self,
        conn: A,
        company_id: Uuid,
        full_name: &str,
        phone: Option<&str>,
        email: &str,
        password: &str,
    ) -> Result<Operator, AppError>
    where
        A: Acquire<'c, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;
        self.subscriptions.ensure_capacity(&mut *conn, company_id, ResourceKind::Operators, 1).await?;

        let request = CreateOperatorAccount {
            company_id,
            email: email.to_string(),
            password: password.to_string(),
            full_name: full_name.to_string(),
            phone: phone.map(str::to_string),
        };
        let created = self.gateway.create_operator_account(&request).await?;

        let operator = self
            .repo
            .find_operator(&mut *conn, company_id, created.id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("operator {}", created.id)))?;
        tracing::info!(%company_id, operator_id = %operator.id, "Operador criado");
        Ok(operator)
    }

    pub async fn set_operator_active<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        operator_id: Uuid,
        is_active: bool,
    ) -> Result<Operator, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .set_operator_active(executor, company_id, operator_id, is_active)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("operator {}", operator_id)))
    }

    // --- VISITAS ---

    pub async fn list_visits<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        period: &ReportPeriod,
        status: Option<VisitStatus>,
        operator_id: Option<Uuid>,
    ) -> Result<Vec<Visit>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .list_visits(executor, company_id, period.start, period.end, status, operator_id)
            .await
    }

    /// Confere que cliente, filial e operador pertencem à empresa.
    async fn ensure_references(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        customer_id: Uuid,
        branch_id: Option<Uuid>,
        operator_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        if self.crm_repo.find_customer(&mut *conn, company_id, customer_id).await?.is_none() {
            return Err(AppError::ResourceNotFound(format!("customer {}", customer_id)));
        }
        if let Some(branch_id) = branch_id {
            let owner = self.crm_repo.branch_customer(&mut *conn, company_id, branch_id).await?;
            if owner != Some(customer_id) {
                return Err(AppError::ResourceNotFound(format!("branch {}", branch_id)));
            }
        }
        if let Some(operator_id) = operator_id {
            if !self.repo.operator_belongs_to(&mut *conn, company_id, operator_id).await? {
                return Err(AppError::ResourceNotFound(format!("operator {}", operator_id)));
            }
        }
        Ok(())
    }

    pub async fn create_visit<'c, A>(&self, conn: A, company_id: Uuid, visit: &NewVisit<'_>) -> Result<Visit, AppError>
    where
        A: Acquire<'c, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;
        self.ensure_references(&mut *conn, company_id, visit.customer_id, visit.branch_id, visit.operator_id)
            .await?;

        self.repo
            .create_visit(
                &mut *conn,
                company_id,
                visit.customer_id,
                visit.branch_id,
                visit.operator_id,
                visit.scheduled_at,
                visit.notes,
            )
            .await
    }

    /// Atualiza status/operador/flags. Trava a linha para que o teste de
    /// "cancelada" e a escrita aconteçam sobre o mesmo estado.
    pub async fn update_visit<'c, A>(
        &self,
        conn: A,
        company_id: Uuid,
        visit_id: Uuid,
        changes: &VisitChanges<'_>,
    ) -> Result<Visit, AppError>
    where
        A: Acquire<'c, Database = Postgres>,
    {
        let mut tx = conn.begin().await?;

        let current = self
            .repo
            .find_visit(&mut *tx, company_id, visit_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("visit {}", visit_id)))?;

        ensure_editable(&current)?;

        if let Some(operator_id) = changes.operator_id {
            if !self.repo.operator_belongs_to(&mut *tx, company_id, operator_id).await? {
                return Err(AppError::ResourceNotFound(format!("operator {}", operator_id)));
            }
        }

        let updated = self.repo.update_visit(&mut *tx, company_id, visit_id, changes).await?;
        tx.commit().await?;

        if updated.status != current.status {
            tracing::info!(%visit_id, from = current.status.as_str(), to = updated.status.as_str(), "Status da visita alterado");
        }
        Ok(updated)
    }

    pub async fn delete_visit<'e, E>(&self, executor: E, company_id: Uuid, visit_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if !self.repo.delete_visit(executor, company_id, visit_id).await? {
            return Err(AppError::ResourceNotFound(format!("visit {}", visit_id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::revenue::fixtures::{at, visit};

    #[test]
    fn cancelled_visits_are_frozen() {
        let v = visit(Uuid::new_v4(), None, None, at(2024, 6, 1), VisitStatus::Cancelled);
        assert!(matches!(ensure_editable(&v), Err(AppError::VisitCancelled)));
    }

    #[test]
    fn any_other_status_can_move_freely() {
        // Inclusive voltar de "completed" para "pending"
        for status in [VisitStatus::Pending, VisitStatus::Assigned, VisitStatus::InProgress, VisitStatus::Completed] {
            let v = visit(Uuid::new_v4(), None, None, at(2024, 6, 1), status);
            assert!(ensure_editable(&v).is_ok());
        }
    }
}
