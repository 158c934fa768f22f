// src/services/report_service.rs

use std::collections::HashSet;

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ReportRepository,
    models::{
        inventory::SaleLine,
        operations::Visit,
        report::{
            AnnualReport, CalendarReport, GroupBy, MonthBucket, ReportPeriod, RevenueReport,
            RevenueRow, RevenueTotals, VisitDetailRow, VisitReport,
        },
    },
    services::revenue::{self, LookupMaps, ReportDataset},
};

#[derive(Clone)]
pub struct ReportService {
    repo: ReportRepository,
}

impl ReportService {
    pub fn new(repo: ReportRepository) -> Self {
        Self { repo }
    }

    // =========================================================================
    //  FETCHER
    // =========================================================================

    /// Lê tudo que os relatórios precisam. As leituras independentes rodam
    /// em paralelo; qualquer falha aborta o cálculo inteiro.
    pub async fn load(&self, company_id: Uuid, period: &ReportPeriod) -> Result<ReportDataset, AppError> {
        let pool = self.repo.pool();

        // 1. Cadastros (não dependem do período)
        let (customers, branches, customer_pricing, branch_pricing, operators) = tokio::try_join!(
            self.repo.customers(pool, company_id),
            self.repo.branches(pool, company_id),
            self.repo.customer_pricing(pool, company_id),
            self.repo.branch_pricing(pool, company_id),
            self.repo.operators(pool, company_id),
        )?;

        // 2. Movimento do período, restrito aos clientes do tenant
        let customer_ids: Vec<Uuid> = customers.iter().map(|c| c.id).collect();
        let (visits, sales) = tokio::try_join!(
            self.repo.visits(pool, &customer_ids, period.start, period.end),
            self.repo.sale_lines(pool, &customer_ids, period.start, period.end),
        )?;

        tracing::debug!(
            %company_id,
            customers = customers.len(),
            visits = visits.len(),
            sale_lines = sales.len(),
            "Dados do relatório carregados"
        );

        Ok(ReportDataset { customers, branches, customer_pricing, branch_pricing, operators, visits, sales })
    }

    // =========================================================================
    //  RELATÓRIOS
    // =========================================================================

    pub async fn revenue(
        &self,
        company_id: Uuid,
        period: ReportPeriod,
        group_by: GroupBy,
        search: Option<&str>,
    ) -> Result<RevenueReport, AppError> {
        let data = self.load(company_id, &period).await?;
        let maps = LookupMaps::build(&data);

        let rows = match group_by {
            GroupBy::Location => revenue::aggregate_by_location(&data.visits, &data.sales, &maps),
            GroupBy::Operator => revenue::aggregate_by_operator(&data.visits, &data.sales, &maps),
        };
        let rows: Vec<RevenueRow> = match search {
            Some(term) => rows.into_iter().filter(|r| r.group.matches(term)).collect(),
            None => rows,
        };

        let totals = RevenueTotals::of_rows(&rows);
        Ok(RevenueReport {
            period,
            group_by,
            rows: rows.into_iter().map(round_row).collect(),
            totals: round_totals(totals),
        })
    }

    pub async fn visits(
        &self,
        company_id: Uuid,
        period: ReportPeriod,
        search: Option<&str>,
    ) -> Result<VisitReport, AppError> {
        let data = self.load(company_id, &period).await?;
        let maps = LookupMaps::build(&data);

        let rows: Vec<VisitDetailRow> = revenue::visit_details(&data.visits, &data.sales, &maps)
            .into_iter()
            .filter(|r| search.is_none_or(|term| r.matches(term)))
            .collect();

        let mut totals = RevenueTotals::default();
        for row in &rows {
            totals.add(1, row.service_amount, row.material_revenue);
        }

        Ok(VisitReport {
            period,
            rows: rows.into_iter().map(round_detail).collect(),
            totals: round_totals(totals),
        })
    }

    pub async fn annual(&self, company_id: Uuid, year: i32, search: Option<&str>) -> Result<AnnualReport, AppError> {
        let period = ReportPeriod::year(year)?;
        let data = self.load(company_id, &period).await?;
        let maps = LookupMaps::build(&data);

        // A busca filtra os locais antes de agregar, assim os meses batem com as linhas
        let (visits, sales) = match search {
            Some(term) => filter_locations(&data, &maps, term),
            None => (data.visits.clone(), data.sales.clone()),
        };

        let (months, rows) = revenue::annual(&visits, &sales, &maps);
        let totals = RevenueTotals::of_rows(&rows);

        Ok(AnnualReport {
            year,
            months: months
                .into_iter()
                .map(|m| MonthBucket { month: m.month, totals: round_totals(m.totals) })
                .collect(),
            rows: rows.into_iter().map(round_row).collect(),
            totals: round_totals(totals),
        })
    }

    pub async fn calendar(&self, company_id: Uuid, year: i32, month: u32) -> Result<CalendarReport, AppError> {
        let period = ReportPeriod::month(year, month)?;
        let data = self.load(company_id, &period).await?;
        let maps = LookupMaps::build(&data);

        Ok(CalendarReport { year, month, days: revenue::calendar(&data.visits, &maps) })
    }
}

// =============================================================================
//  PRESENTER (arredondamento só na saída)
// =============================================================================

fn round_totals(t: RevenueTotals) -> RevenueTotals {
    RevenueTotals {
        visit_count: t.visit_count,
        service_revenue: t.service_revenue.round_dp(2),
        material_revenue: t.material_revenue.round_dp(2),
        total_revenue: t.total_revenue.round_dp(2),
    }
}

fn round_row(row: RevenueRow) -> RevenueRow {
    RevenueRow {
        service_revenue: row.service_revenue.round_dp(2),
        material_revenue: row.material_revenue.round_dp(2),
        total_revenue: row.total_revenue.round_dp(2),
        ..row
    }
}

fn round_detail(row: VisitDetailRow) -> VisitDetailRow {
    VisitDetailRow {
        service_amount: row.service_amount.round_dp(2),
        material_revenue: row.material_revenue.round_dp(2),
        total: row.total.round_dp(2),
        ..row
    }
}

fn filter_locations(data: &ReportDataset, maps: &LookupMaps<'_>, term: &str) -> (Vec<Visit>, Vec<SaleLine>) {
    let keys: HashSet<(Uuid, Option<Uuid>)> = data
        .visits
        .iter()
        .map(|v| (v.customer_id, v.branch_id))
        .chain(data.sales.iter().map(|s| (s.customer_id, s.branch_id)))
        .filter(|(customer_id, branch_id)| maps.location_matches(*customer_id, *branch_id, term))
        .collect();

    let visits = data.visits.iter().filter(|v| keys.contains(&(v.customer_id, v.branch_id))).cloned().collect();
    let sales = data.sales.iter().filter(|s| keys.contains(&(s.customer_id, s.branch_id))).cloned().collect();
    (visits, sales)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::crm::PricingType;
    use crate::models::operations::VisitStatus;
    use crate::services::revenue::fixtures::*;

    #[test]
    fn rounding_happens_only_on_output() {
        let row = RevenueTotals {
            visit_count: 3,
            service_revenue: Decimal::new(33335, 3),
            material_revenue: Decimal::new(1, 3),
            total_revenue: Decimal::new(33336, 3),
        };
        let rounded = round_totals(row);
        assert_eq!(rounded.service_revenue, Decimal::new(3334, 2));
        assert_eq!(rounded.material_revenue, Decimal::ZERO);
    }

    #[test]
    fn annual_search_keeps_only_matching_locations() {
        let north = customer("Norte Alimentos");
        let south = customer("Sul Bebidas");
        let data = ReportDataset {
            customers: vec![north.clone(), south.clone()],
            customer_pricing: vec![pricing(north.id, PricingType::PerVisit, 10)],
            visits: vec![
                visit(north.id, None, None, at(2024, 5, 2), VisitStatus::Completed),
                visit(south.id, None, None, at(2024, 5, 3), VisitStatus::Completed),
            ],
            sales: vec![sale(south.id, None, None, at(2024, 5, 3), 20)],
            ..Default::default()
        };
        let maps = LookupMaps::build(&data);
        let (visits, sales) = filter_locations(&data, &maps, "norte");
        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].customer_id, north.id);
        assert!(sales.is_empty());
    }
}
