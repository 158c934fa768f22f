// src/models/subscription.rs

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Operators,
    Customers,
    Branches,
    Warehouses,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Operators,
        ResourceKind::Customers,
        ResourceKind::Branches,
        ResourceKind::Warehouses,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Operators => "operators",
            ResourceKind::Customers => "customers",
            ResourceKind::Branches => "branches",
            ResourceKind::Warehouses => "warehouses",
        }
    }

    /// Teto aplicado quando não há plano nem override.
    pub fn trial_default(&self) -> i64 {
        match self {
            ResourceKind::Operators => 1,
            ResourceKind::Customers => 3,
            ResourceKind::Branches => 3,
            ResourceKind::Warehouses => 2,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "subscription_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Trial,
    Active,
    Expired,
    Cancelled,
}

// --- Structs ---

/// Tetos por tipo de recurso. `None` significa "não definido neste nível".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceLimits {
    pub max_operators: Option<i32>,
    pub max_customers: Option<i32>,
    pub max_branches: Option<i32>,
    pub max_warehouses: Option<i32>,
}

impl ResourceLimits {
    pub fn get(&self, kind: ResourceKind) -> Option<i32> {
        match kind {
            ResourceKind::Operators => self.max_operators,
            ResourceKind::Customers => self.max_customers,
            ResourceKind::Branches => self.max_branches,
            ResourceKind::Warehouses => self.max_warehouses,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPlan {
    pub id: Uuid,
    #[schema(example = "Profissional")]
    pub name: String,
    #[schema(example = "199.90")]
    pub price: Decimal,
    pub max_operators: Option<i32>,
    pub max_customers: Option<i32>,
    pub max_branches: Option<i32>,
    pub max_warehouses: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl SubscriptionPlan {
    pub fn limits(&self) -> ResourceLimits {
        ResourceLimits {
            max_operators: self.max_operators,
            max_customers: self.max_customers,
            max_branches: self.max_branches,
            max_warehouses: self.max_warehouses,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: Uuid,
    #[schema(ignore)]
    pub company_id: Uuid,
    pub plan_id: Option<Uuid>,
    pub status: SubscriptionStatus,
    // Overrides por assinatura (precedem o plano)
    pub max_operators: Option<i32>,
    pub max_customers: Option<i32>,
    pub max_branches: Option<i32>,
    pub max_warehouses: Option<i32>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    pub fn overrides(&self) -> ResourceLimits {
        ResourceLimits {
            max_operators: self.max_operators,
            max_customers: self.max_customers,
            max_branches: self.max_branches,
            max_warehouses: self.max_warehouses,
        }
    }
}

/// De onde veio o teto efetivo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LimitSource {
    Override,
    Plan,
    TrialDefault,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveLimit {
    pub resource: ResourceKind,
    pub limit: i64,
    pub source: LimitSource,
}

impl EffectiveLimit {
    /// override ?? plano ?? padrão de teste, avaliado por tipo de recurso.
    pub fn resolve(
        kind: ResourceKind,
        overrides: Option<&ResourceLimits>,
        plan: Option<&ResourceLimits>,
    ) -> Self {
        if let Some(value) = overrides.and_then(|o| o.get(kind)) {
            return Self { resource: kind, limit: value as i64, source: LimitSource::Override };
        }
        if let Some(value) = plan.and_then(|p| p.get(kind)) {
            return Self { resource: kind, limit: value as i64, source: LimitSource::Plan };
        }
        Self { resource: kind, limit: kind.trial_default(), source: LimitSource::TrialDefault }
    }

    pub fn remaining(&self, current: i64) -> i64 {
        (self.limit - current).max(0)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceUsage {
    pub resource: ResourceKind,
    pub limit: i64,
    pub source: LimitSource,
    pub current: i64,
    pub remaining: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionOverview {
    pub subscription: Option<Subscription>,
    pub plan: Option<SubscriptionPlan>,
    pub usage: Vec<ResourceUsage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan_customers(n: i32) -> ResourceLimits {
        ResourceLimits { max_customers: Some(n), ..Default::default() }
    }

    #[test]
    fn plan_limit_applies_when_override_is_null() {
        let overrides = ResourceLimits::default();
        let plan = plan_customers(25);
        let eff = EffectiveLimit::resolve(ResourceKind::Customers, Some(&overrides), Some(&plan));
        assert_eq!(eff.limit, 25);
        assert_eq!(eff.source, LimitSource::Plan);
    }

    #[test]
    fn override_wins_over_plan() {
        let overrides = ResourceLimits { max_customers: Some(5), ..Default::default() };
        let plan = plan_customers(25);
        let eff = EffectiveLimit::resolve(ResourceKind::Customers, Some(&overrides), Some(&plan));
        assert_eq!(eff.limit, 5);
        assert_eq!(eff.source, LimitSource::Override);
    }

    #[test]
    fn trial_defaults_without_plan_or_override() {
        let expected = [
            (ResourceKind::Operators, 1),
            (ResourceKind::Customers, 3),
            (ResourceKind::Branches, 3),
            (ResourceKind::Warehouses, 2),
        ];
        for (kind, limit) in expected {
            let eff = EffectiveLimit::resolve(kind, None, None);
            assert_eq!(eff.limit, limit);
            assert_eq!(eff.source, LimitSource::TrialDefault);
        }
    }

    #[test]
    fn each_kind_falls_back_independently() {
        let overrides = ResourceLimits { max_operators: Some(4), ..Default::default() };
        let plan = ResourceLimits { max_branches: Some(40), ..Default::default() };

        let ops = EffectiveLimit::resolve(ResourceKind::Operators, Some(&overrides), Some(&plan));
        let branches = EffectiveLimit::resolve(ResourceKind::Branches, Some(&overrides), Some(&plan));
        let warehouses = EffectiveLimit::resolve(ResourceKind::Warehouses, Some(&overrides), Some(&plan));

        assert_eq!((ops.limit, ops.source), (4, LimitSource::Override));
        assert_eq!((branches.limit, branches.source), (40, LimitSource::Plan));
        assert_eq!((warehouses.limit, warehouses.source), (2, LimitSource::TrialDefault));
    }

    #[test]
    fn remaining_never_goes_negative() {
        let eff = EffectiveLimit::resolve(ResourceKind::Customers, None, Some(&plan_customers(10)));
        assert_eq!(eff.remaining(8), 2);
        assert_eq!(eff.remaining(12), 0);
    }
}
