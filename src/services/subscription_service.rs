// src/services/subscription_service.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{SubscriptionRepository, TenantRepository},
    models::subscription::{
        EffectiveLimit, ResourceKind, ResourceLimits, ResourceUsage, Subscription, SubscriptionOverview,
        SubscriptionPlan,
    },
};

#[derive(Clone)]
pub struct SubscriptionService {
    repo: SubscriptionRepository,
    tenant_repo: TenantRepository,
}

/// Verificação de capacidade sem I/O: falha quando `current + additional > limit`.
pub fn check_capacity(limit: &EffectiveLimit, current: i64, additional: i64) -> Result<(), AppError> {
    if current + additional > limit.limit {
        return Err(AppError::LimitExceeded {
            resource: limit.resource,
            limit: limit.limit,
            current,
            requested: additional,
        });
    }
    Ok(())
}

/// Como `check_capacity`, registrando a recusa.
fn guard_capacity(company_id: Uuid, limit: &EffectiveLimit, current: i64, additional: i64) -> Result<(), AppError> {
    check_capacity(limit, current, additional).inspect_err(|_| {
        tracing::info!(%company_id, resource = %limit.resource, limit = limit.limit, current, additional, "Limite do plano atingido");
    })
}

impl SubscriptionService {
    pub fn new(repo: SubscriptionRepository, tenant_repo: TenantRepository) -> Self {
        Self { repo, tenant_repo }
    }

    /// Assinatura ativa e o plano correspondente (se houver).
    async fn active_with_plan(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
    ) -> Result<(Option<Subscription>, Option<SubscriptionPlan>), AppError> {
        let subscription = self.repo.find_active(&mut *conn, company_id).await?;
        let plan = match subscription.as_ref().and_then(|s| s.plan_id) {
            Some(plan_id) => self.repo.find_plan(&mut *conn, plan_id).await?,
            None => None,
        };
        Ok((subscription, plan))
    }

    /// Teto efetivo de um tipo de recurso para a empresa.
    pub async fn effective_limit(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        kind: ResourceKind,
    ) -> Result<EffectiveLimit, AppError> {
        let (subscription, plan) = self.active_with_plan(conn, company_id).await?;
        Ok(EffectiveLimit::resolve(
            kind,
            subscription.map(|s| s.overrides()).as_ref(),
            plan.map(|p| p.limits()).as_ref(),
        ))
    }

    /// Teto, uso atual e saldo de cada tipo de recurso.
    pub async fn overview<'c, A>(&self, conn: A, company_id: Uuid) -> Result<SubscriptionOverview, AppError>
    where
        A: Acquire<'c, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;
        let (subscription, plan) = self.active_with_plan(&mut *conn, company_id).await?;
        let overrides = subscription.as_ref().map(|s| s.overrides());
        let plan_limits = plan.as_ref().map(|p| p.limits());

        let mut usage = Vec::with_capacity(ResourceKind::ALL.len());
        for kind in ResourceKind::ALL {
            let limit = EffectiveLimit::resolve(kind, overrides.as_ref(), plan_limits.as_ref());
            let current = self.repo.count_usage(&mut *conn, company_id, kind).await?;
            usage.push(ResourceUsage {
                resource: kind,
                limit: limit.limit,
                source: limit.source,
                current,
                remaining: limit.remaining(current),
            });
        }

        Ok(SubscriptionOverview { subscription, plan, usage })
    }

    /// Barra a criação de `additional` itens que estourariam o teto.
    /// Roda na conexão do chamador.
    pub async fn ensure_capacity(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        kind: ResourceKind,
        additional: i64,
    ) -> Result<EffectiveLimit, AppError> {
        let limit = self.effective_limit(&mut *conn, company_id, kind).await?;
        let current = self.repo.count_usage(&mut *conn, company_id, kind).await?;
        guard_capacity(company_id, &limit, current, additional)?;
        Ok(limit)
    }

    pub async fn usage<'e, E>(&self, executor: E, company_id: Uuid, kind: ResourceKind) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.count_usage(executor, company_id, kind).await
    }

    // --- ADMIN ---

    pub async fn list_plans<'e, E>(&self, executor: E) -> Result<Vec<SubscriptionPlan>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_plans(executor).await
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
        self.repo.create_plan(executor, name, price, limits).await
    }

    pub async fn update_plan<'e, E>(
        &self,
        executor: E,
        plan_id: Uuid,
        price: Decimal,
        limits: &ResourceLimits,
        is_active: bool,
    ) -> Result<SubscriptionPlan, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .update_plan(executor, plan_id, price, limits, is_active)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("plan {}", plan_id)))
    }

    /// Troca a assinatura ativa da empresa (plano e/ou overrides).
    pub async fn assign<'c, A>(
        &self,
        conn: A,
        company_id: Uuid,
        plan_id: Option<Uuid>,
        overrides: &ResourceLimits,
        ends_at: Option<DateTime<Utc>>,
    ) -> Result<Subscription, AppError>
    where
        A: Acquire<'c, Database = Postgres>,
    {
        let mut tx = conn.begin().await?;

        if self.tenant_repo.find_company(&mut *tx, company_id).await?.is_none() {
            return Err(AppError::ResourceNotFound(format!("company {}", company_id)));
        }
        if let Some(plan_id) = plan_id {
            if self.repo.find_plan(&mut *tx, plan_id).await?.is_none() {
                return Err(AppError::ResourceNotFound(format!("plan {}", plan_id)));
            }
        }

        let subscription = self.repo.replace_active(&mut tx, company_id, plan_id, overrides, ends_at).await?;
        tx.commit().await?;
        tracing::info!(%company_id, ?plan_id, "Assinatura substituída");
        Ok(subscription)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::subscription::LimitSource;

    #[test]
    fn refusal_reports_the_resource_and_counts() {
        let limit = EffectiveLimit { resource: ResourceKind::Warehouses, limit: 4, source: LimitSource::Override };
        assert!(guard_capacity(Uuid::new_v4(), &limit, 3, 1).is_ok());
        match guard_capacity(Uuid::new_v4(), &limit, 3, 2) {
            Err(AppError::LimitExceeded { resource, limit, current, requested }) => {
                assert_eq!(resource, ResourceKind::Warehouses);
                assert_eq!((limit, current, requested), (4, 3, 2));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn full_plan_rejects_even_a_single_item() {
        let limit = EffectiveLimit { resource: ResourceKind::Operators, limit: 2, source: LimitSource::Plan };
        assert!(matches!(guard_capacity(Uuid::new_v4(), &limit, 2, 1), Err(AppError::LimitExceeded { current: 2, .. })));
    }

    #[test]
    fn capacity_check_allows_exact_fill() {
        let limit = EffectiveLimit::resolve(ResourceKind::Customers, None, None);
        assert!(check_capacity(&limit, 2, 1).is_ok());
        match check_capacity(&limit, 3, 1) {
            Err(AppError::LimitExceeded { limit, current, requested, .. }) => {
                assert_eq!((limit, current, requested), (3, 3, 1));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
