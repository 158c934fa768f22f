// src/models/report.rs

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::crm::PricingType;
use crate::models::operations::VisitStatus;

// =============================================================================
//  PARÂMETROS
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    #[default]
    Location, // Cliente + filial
    Operator,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
    Html,
    Pdf,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct RevenueQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
    #[param(value_type = Option<String>, format = Date)]
    pub start: Option<NaiveDate>,
    #[param(value_type = Option<String>, format = Date)]
    pub end: Option<NaiveDate>,
    #[serde(default)]
    #[param(inline)]
    pub group_by: GroupBy,
    pub search: Option<String>,
    #[serde(default)]
    #[param(inline)]
    pub format: ExportFormat,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct AnnualQuery {
    pub year: i32,
    pub search: Option<String>,
    #[serde(default)]
    #[param(inline)]
    pub format: ExportFormat,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct CalendarQuery {
    pub year: i32,
    pub month: u32,
}

/// Janela semiaberta `[start, end)` em UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReportPeriod {
    pub fn month(year: i32, month: u32) -> Result<Self, AppError> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| AppError::InvalidPeriod(format!("{}-{}", year, month)))?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or_else(|| AppError::InvalidPeriod(format!("{}-{}", year, month)))?;
        Ok(Self { start: midnight(first), end: midnight(next) })
    }

    pub fn year(year: i32) -> Result<Self, AppError> {
        let first = NaiveDate::from_ymd_opt(year, 1, 1)
            .ok_or_else(|| AppError::InvalidPeriod(year.to_string()))?;
        let next = NaiveDate::from_ymd_opt(year + 1, 1, 1)
            .ok_or_else(|| AppError::InvalidPeriod(year.to_string()))?;
        Ok(Self { start: midnight(first), end: midnight(next) })
    }

    /// Datas informadas pelo usuário são inclusivas nas duas pontas.
    pub fn between(start: NaiveDate, end: NaiveDate) -> Result<Self, AppError> {
        if end < start {
            return Err(AppError::InvalidPeriod(format!("{} > {}", start, end)));
        }
        let next = end
            .succ_opt()
            .ok_or_else(|| AppError::InvalidPeriod(end.to_string()))?;
        Ok(Self { start: midnight(start), end: midnight(next) })
    }

    pub fn from_query(query: &RevenueQuery) -> Result<Self, AppError> {
        Self::resolve(query.year, query.month, query.start, query.end)
    }

    /// Intervalo explícito tem precedência sobre ano+mês.
    pub fn resolve(
        year: Option<i32>,
        month: Option<u32>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Self, AppError> {
        match (start, end, year, month) {
            (Some(start), Some(end), _, _) => Self::between(start, end),
            (_, _, Some(year), Some(month)) => Self::month(year, month),
            _ => Err(AppError::InvalidPeriod("year+month or start+end".into())),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default())
}

// =============================================================================
//  LINHAS DE RESUMO
// =============================================================================

/// Chave de agrupamento de uma linha de receita.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RevenueGroup {
    #[serde(rename_all = "camelCase")]
    Location {
        customer_id: Uuid,
        customer_name: String,
        branch_id: Option<Uuid>,
        branch_name: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Operator {
        operator_id: Option<Uuid>, // None = visitas sem operador
        operator_name: Option<String>,
    },
}

impl RevenueGroup {
    pub fn label(&self) -> String {
        match self {
            RevenueGroup::Location { customer_name, branch_name, .. } => match branch_name {
                Some(branch) => format!("{} / {}", customer_name, branch),
                None => customer_name.clone(),
            },
            RevenueGroup::Operator { operator_name, .. } => operator_name.clone().unwrap_or_default(),
        }
    }

    fn sort_id(&self) -> Option<Uuid> {
        match self {
            RevenueGroup::Location { customer_id, branch_id, .. } => branch_id.or(Some(*customer_id)),
            RevenueGroup::Operator { operator_id, .. } => *operator_id,
        }
    }

    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        let hit = |s: &Option<String>| s.as_deref().is_some_and(|v| v.to_lowercase().contains(&term));
        match self {
            RevenueGroup::Location { customer_name, branch_name, .. } => {
                customer_name.to_lowercase().contains(&term) || hit(branch_name)
            }
            RevenueGroup::Operator { operator_name, .. } => hit(operator_name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevenueRow {
    pub group: RevenueGroup,
    pub pricing_type: Option<PricingType>,
    pub visit_count: i64,
    pub service_revenue: Decimal,
    pub material_revenue: Decimal,
    pub total_revenue: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevenueTotals {
    pub visit_count: i64,
    pub service_revenue: Decimal,
    pub material_revenue: Decimal,
    pub total_revenue: Decimal,
}

impl RevenueTotals {
    pub fn add(&mut self, visit_count: i64, service: Decimal, material: Decimal) {
        self.visit_count += visit_count;
        self.service_revenue += service;
        self.material_revenue += material;
        self.total_revenue += service + material;
    }

    pub fn of_rows(rows: &[RevenueRow]) -> Self {
        let mut totals = Self::default();
        for row in rows {
            totals.add(row.visit_count, row.service_revenue, row.material_revenue);
        }
        totals
    }
}

/// Ordena por total decrescente; empates por nome e depois por id.
pub fn sort_rows(rows: &mut [RevenueRow]) {
    rows.sort_by(|a, b| {
        b.total_revenue
            .cmp(&a.total_revenue)
            .then_with(|| a.group.label().cmp(&b.group.label()))
            .then_with(|| a.group.sort_id().cmp(&b.group.sort_id()))
    });
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevenueReport {
    pub period: ReportPeriod,
    pub group_by: GroupBy,
    pub rows: Vec<RevenueRow>,
    pub totals: RevenueTotals,
}

// =============================================================================
//  DETALHE POR VISITA
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisitDetailRow {
    pub visit_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub customer_id: Uuid,
    pub customer_name: String,
    pub branch_name: Option<String>,
    pub operator_name: Option<String>,
    pub status: VisitStatus,
    pub pricing_type: Option<PricingType>,
    pub service_amount: Decimal,
    pub material_revenue: Decimal,
    pub total: Decimal,
}

impl VisitDetailRow {
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        [Some(&self.customer_name), self.branch_name.as_ref(), self.operator_name.as_ref()]
            .into_iter()
            .flatten()
            .any(|name| name.to_lowercase().contains(&term))
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VisitReport {
    pub period: ReportPeriod,
    pub rows: Vec<VisitDetailRow>,
    pub totals: RevenueTotals,
}

// =============================================================================
//  ANUAL
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthBucket {
    pub month: u32,
    #[serde(flatten)]
    pub totals: RevenueTotals,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnnualReport {
    pub year: i32,
    pub months: Vec<MonthBucket>,
    pub rows: Vec<RevenueRow>,
    pub totals: RevenueTotals,
}

// =============================================================================
//  CALENDÁRIO
// =============================================================================

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEntry {
    pub visit_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub status: VisitStatus,
    pub customer_name: String,
    pub branch_name: Option<String>,
    pub operator_name: Option<String>,
    pub is_invoiced: bool,
    pub is_checked: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub pending: i64,
    pub assigned: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub cancelled: i64,
}

impl StatusCounts {
    pub fn bump(&mut self, status: VisitStatus) {
        match status {
            VisitStatus::Pending => self.pending += 1,
            VisitStatus::Assigned => self.assigned += 1,
            VisitStatus::InProgress => self.in_progress += 1,
            VisitStatus::Completed => self.completed += 1,
            VisitStatus::Cancelled => self.cancelled += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    pub counts: StatusCounts,
    pub visits: Vec<CalendarEntry>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalendarReport {
    pub year: i32,
    pub month: u32,
    pub days: Vec<CalendarDay>,
}

impl CalendarReport {
    pub fn day_of(at: DateTime<Utc>) -> NaiveDate {
        NaiveDate::from_ymd_opt(at.year(), at.month(), at.day()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn december_rolls_into_next_year() {
        let p = ReportPeriod::month(2024, 12).unwrap();
        assert_eq!(p.start.date_naive(), NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
        assert_eq!(p.end.date_naive(), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }

    #[test]
    fn explicit_range_is_inclusive_of_the_last_day() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let p = ReportPeriod::between(start, end).unwrap();
        assert!(p.contains(midnight(end) + Duration::hours(23)));
        assert!(!p.contains(midnight(end) + Duration::days(1)));
    }

    #[test]
    fn rejects_reversed_range_and_bad_month() {
        let a = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert!(matches!(ReportPeriod::between(a, b), Err(AppError::InvalidPeriod(_))));
        assert!(matches!(ReportPeriod::month(2024, 13), Err(AppError::InvalidPeriod(_))));
    }

    #[test]
    fn range_ending_on_the_last_representable_day_is_rejected() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(matches!(ReportPeriod::between(start, NaiveDate::MAX), Err(AppError::InvalidPeriod(_))));
    }

    #[test]
    fn explicit_range_wins_over_year_and_month() {
        let start = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
        let p = ReportPeriod::resolve(Some(2023), Some(1), Some(start), Some(end)).unwrap();
        assert_eq!(p.start.date_naive(), start);
        assert_eq!(p.end.date_naive(), NaiveDate::from_ymd_opt(2024, 5, 21).unwrap());
    }

    #[test]
    fn incomplete_range_without_month_is_invalid() {
        let start = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        assert!(matches!(ReportPeriod::resolve(None, None, Some(start), None), Err(AppError::InvalidPeriod(_))));
        assert!(matches!(ReportPeriod::resolve(Some(2024), None, None, None), Err(AppError::InvalidPeriod(_))));
        // Início sem fim cai para ano+mês quando presentes
        let p = ReportPeriod::resolve(Some(2024), Some(2), Some(start), None).unwrap();
        assert_eq!(p, ReportPeriod::month(2024, 2).unwrap());
    }

    fn revenue_query(uri: &str) -> RevenueQuery {
        let uri: axum::http::Uri = uri.parse().unwrap();
        axum::extract::Query::<RevenueQuery>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn revenue_query_reads_snake_case_keys() {
        let q = revenue_query("/api/reports/revenue?year=2024&month=3&group_by=operator&format=csv");
        assert_eq!(q.group_by, GroupBy::Operator);
        assert_eq!(q.format, ExportFormat::Csv);
        assert_eq!(ReportPeriod::from_query(&q).unwrap(), ReportPeriod::month(2024, 3).unwrap());
    }

    #[test]
    fn revenue_query_defaults_and_explicit_range() {
        let q = revenue_query("/api/reports/revenue?start=2024-03-01&end=2024-03-15&search=norte");
        assert_eq!(q.group_by, GroupBy::Location);
        assert_eq!(q.format, ExportFormat::Json);
        assert_eq!(q.search.as_deref(), Some("norte"));
        let p = ReportPeriod::from_query(&q).unwrap();
        assert_eq!(p.end.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 16).unwrap());
    }

    #[test]
    fn location_search_checks_branch_too() {
        let group = RevenueGroup::Location {
            customer_id: Uuid::new_v4(),
            customer_name: "Padaria Central".into(),
            branch_id: Some(Uuid::new_v4()),
            branch_name: Some("Filial Norte".into()),
        };
        assert!(group.matches("norte"));
        assert!(group.matches("PADARIA"));
        assert!(!group.matches("sul"));
        assert!(group.matches("  "));
    }
}
