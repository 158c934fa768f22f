// src/services/revenue.rs
//
// Cálculo de receita em memória. Nada aqui toca o banco: o serviço de
// relatórios busca os dados, monta os mapas e chama estas funções.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{
    crm::{Customer, CustomerBranch, PricingRecord, PricingType},
    inventory::SaleLine,
    operations::{Operator, Visit, VisitStatus},
    report::{
        sort_rows, CalendarDay, CalendarEntry, CalendarReport, MonthBucket, RevenueGroup,
        RevenueRow, RevenueTotals, StatusCounts, VisitDetailRow,
    },
};

/// Tudo que o relatório precisa, já lido do banco.
#[derive(Debug, Clone, Default)]
pub struct ReportDataset {
    pub customers: Vec<Customer>,
    pub branches: Vec<CustomerBranch>,
    pub customer_pricing: Vec<PricingRecord>,
    pub branch_pricing: Vec<PricingRecord>,
    pub operators: Vec<Operator>,
    pub visits: Vec<Visit>,
    pub sales: Vec<SaleLine>,
}

/// Preço aplicável a uma visita.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPricing {
    pub pricing_type: PricingType,
    pub amount: Decimal,
}

impl From<&PricingRecord> for ResolvedPricing {
    fn from(record: &PricingRecord) -> Self {
        Self { pricing_type: record.pricing_type, amount: record.amount }
    }
}

/// (cliente, filial). Filial nula = chave do próprio cliente.
type LocationKey = (Uuid, Option<Uuid>);

// =============================================================================
//  JOINER
// =============================================================================

pub struct LookupMaps<'a> {
    customers: HashMap<Uuid, &'a Customer>,
    branches: HashMap<Uuid, &'a CustomerBranch>,
    operators: HashMap<Uuid, &'a Operator>,
    customer_pricing: HashMap<Uuid, &'a PricingRecord>,
    branch_pricing: HashMap<Uuid, &'a PricingRecord>,
}

impl<'a> LookupMaps<'a> {
    pub fn build(data: &'a ReportDataset) -> Self {
        Self {
            customers: data.customers.iter().map(|c| (c.id, c)).collect(),
            branches: data.branches.iter().map(|b| (b.id, b)).collect(),
            operators: data.operators.iter().map(|o| (o.id, o)).collect(),
            customer_pricing: data.customer_pricing.iter().map(|p| (p.owner_id, p)).collect(),
            branch_pricing: data.branch_pricing.iter().map(|p| (p.owner_id, p)).collect(),
        }
    }

    /// Preço da filial vence o do cliente; sem nenhum dos dois, não há preço.
    pub fn resolve_pricing(&self, customer_id: Uuid, branch_id: Option<Uuid>) -> Option<ResolvedPricing> {
        branch_id
            .and_then(|id| self.branch_pricing.get(&id))
            .or_else(|| self.customer_pricing.get(&customer_id))
            .map(|record| ResolvedPricing::from(*record))
    }

    pub fn customer_name(&self, customer_id: Uuid) -> String {
        self.customers
            .get(&customer_id)
            .map(|c| c.company_name.clone().filter(|n| !n.trim().is_empty()).unwrap_or_else(|| c.full_name.clone()))
            .unwrap_or_default()
    }

    pub fn branch_name(&self, branch_id: Option<Uuid>) -> Option<String> {
        branch_id.and_then(|id| self.branches.get(&id)).map(|b| b.name.clone())
    }

    pub fn operator_name(&self, operator_id: Option<Uuid>) -> Option<String> {
        operator_id.and_then(|id| self.operators.get(&id)).map(|o| o.full_name.clone())
    }

    pub fn location_matches(&self, customer_id: Uuid, branch_id: Option<Uuid>, term: &str) -> bool {
        self.location_group((customer_id, branch_id)).matches(term)
    }

    fn location_group(&self, (customer_id, branch_id): LocationKey) -> RevenueGroup {
        RevenueGroup::Location {
            customer_id,
            customer_name: self.customer_name(customer_id),
            branch_id,
            branch_name: self.branch_name(branch_id),
        }
    }
}

// Só visitas concluídas geram receita
fn qualifies(visit: &Visit) -> bool {
    visit.status == VisitStatus::Completed
}

fn location_of(visit: &Visit) -> LocationKey {
    (visit.customer_id, visit.branch_id)
}

fn service_for(pricing: Option<ResolvedPricing>, visit_count: i64) -> Decimal {
    match pricing {
        Some(p) if visit_count > 0 => match p.pricing_type {
            PricingType::Monthly => p.amount,
            PricingType::PerVisit => p.amount * Decimal::from(visit_count),
        },
        _ => Decimal::ZERO,
    }
}

fn materials_by_location(sales: &[SaleLine]) -> HashMap<LocationKey, Decimal> {
    let mut totals: HashMap<LocationKey, Decimal> = HashMap::new();
    for line in sales {
        *totals.entry((line.customer_id, line.branch_id)).or_default() += line.amount();
    }
    totals
}

fn materials_by_visit(sales: &[SaleLine]) -> HashMap<Uuid, Decimal> {
    let mut totals: HashMap<Uuid, Decimal> = HashMap::new();
    for line in sales {
        if let Some(visit_id) = line.visit_id {
            *totals.entry(visit_id).or_default() += line.amount();
        }
    }
    totals
}

// =============================================================================
//  AGREGADORES
// =============================================================================

/// Uma linha por local (cliente + filial) com ao menos uma visita concluída.
pub fn aggregate_by_location(visits: &[Visit], sales: &[SaleLine], maps: &LookupMaps<'_>) -> Vec<RevenueRow> {
    let mut counts: HashMap<LocationKey, i64> = HashMap::new();
    for visit in visits.iter().filter(|v| qualifies(v)) {
        *counts.entry(location_of(visit)).or_default() += 1;
    }

    let materials = materials_by_location(sales);

    let mut rows: Vec<RevenueRow> = counts
        .into_iter()
        .map(|(key, visit_count)| {
            let pricing = maps.resolve_pricing(key.0, key.1);
            let service_revenue = service_for(pricing, visit_count);
            let material_revenue = materials.get(&key).copied().unwrap_or_default();
            RevenueRow {
                group: maps.location_group(key),
                pricing_type: pricing.map(|p| p.pricing_type),
                visit_count,
                service_revenue,
                material_revenue,
                total_revenue: service_revenue + material_revenue,
            }
        })
        .collect();

    sort_rows(&mut rows);
    rows
}

/// Uma linha por operador (visitas sem operador formam a própria linha).
/// A mensalidade de um local vai uma única vez para o operador da
/// primeira visita concluída daquele local.
pub fn aggregate_by_operator(visits: &[Visit], sales: &[SaleLine], maps: &LookupMaps<'_>) -> Vec<RevenueRow> {
    let qualifying: Vec<&Visit> = visits.iter().filter(|v| qualifies(v)).collect();

    let mut totals: HashMap<Option<Uuid>, RevenueTotals> = HashMap::new();
    let mut earliest: HashMap<LocationKey, &Visit> = HashMap::new();

    for &visit in &qualifying {
        let entry = totals.entry(visit.operator_id).or_default();
        let pricing = maps.resolve_pricing(visit.customer_id, visit.branch_id);
        let per_visit = match pricing {
            Some(p) if p.pricing_type == PricingType::PerVisit => p.amount,
            _ => Decimal::ZERO,
        };
        entry.add(1, per_visit, Decimal::ZERO);

        earliest
            .entry(location_of(visit))
            .and_modify(|current| {
                if (visit.scheduled_at, visit.id) < (current.scheduled_at, current.id) {
                    *current = visit;
                }
            })
            .or_insert(visit);
    }

    for (key, first) in earliest {
        if let Some(p) = maps.resolve_pricing(key.0, key.1) {
            if p.pricing_type == PricingType::Monthly {
                if let Some(entry) = totals.get_mut(&first.operator_id) {
                    entry.add(0, p.amount, Decimal::ZERO);
                }
            }
        }
    }

    let operator_of_visit: HashMap<Uuid, Option<Uuid>> =
        qualifying.iter().map(|v| (v.id, v.operator_id)).collect();
    for (visit_id, amount) in materials_by_visit(sales) {
        if let Some(operator_id) = operator_of_visit.get(&visit_id) {
            if let Some(entry) = totals.get_mut(operator_id) {
                entry.add(0, Decimal::ZERO, amount);
            }
        }
    }

    let mut rows: Vec<RevenueRow> = totals
        .into_iter()
        .map(|(operator_id, t)| RevenueRow {
            group: RevenueGroup::Operator {
                operator_id,
                operator_name: maps.operator_name(operator_id),
            },
            pricing_type: None,
            visit_count: t.visit_count,
            service_revenue: t.service_revenue,
            material_revenue: t.material_revenue,
            total_revenue: t.total_revenue,
        })
        .collect();

    sort_rows(&mut rows);
    rows
}

/// Uma linha por visita concluída, em ordem cronológica.
/// Visitas de locais mensalistas aparecem com valor de serviço zero.
pub fn visit_details(visits: &[Visit], sales: &[SaleLine], maps: &LookupMaps<'_>) -> Vec<VisitDetailRow> {
    let materials = materials_by_visit(sales);

    let mut rows: Vec<VisitDetailRow> = visits
        .iter()
        .filter(|v| qualifies(v))
        .map(|visit| {
            let pricing = maps.resolve_pricing(visit.customer_id, visit.branch_id);
            let service_amount = match pricing {
                Some(p) if p.pricing_type == PricingType::PerVisit => p.amount,
                _ => Decimal::ZERO,
            };
            let material_revenue = materials.get(&visit.id).copied().unwrap_or_default();
            VisitDetailRow {
                visit_id: visit.id,
                scheduled_at: visit.scheduled_at,
                customer_id: visit.customer_id,
                customer_name: maps.customer_name(visit.customer_id),
                branch_name: maps.branch_name(visit.branch_id),
                operator_name: maps.operator_name(visit.operator_id),
                status: visit.status,
                pricing_type: pricing.map(|p| p.pricing_type),
                service_amount,
                material_revenue,
                total: service_amount + material_revenue,
            }
        })
        .collect();

    rows.sort_by(|a, b| (a.scheduled_at, a.visit_id).cmp(&(b.scheduled_at, b.visit_id)));
    rows
}

/// Doze meses, cada um agregado por local (mensalidade uma vez por mês),
/// mais o acumulado do ano por local.
pub fn annual(visits: &[Visit], sales: &[SaleLine], maps: &LookupMaps<'_>) -> (Vec<MonthBucket>, Vec<RevenueRow>) {
    let mut months = Vec::with_capacity(12);
    let mut yearly: HashMap<LocationKey, RevenueRow> = HashMap::new();

    for month in 1..=12u32 {
        let in_month = |at: &DateTime<Utc>| at.month() == month;
        let month_visits: Vec<Visit> = visits.iter().filter(|v| in_month(&v.scheduled_at)).cloned().collect();
        let month_sales: Vec<SaleLine> = sales.iter().filter(|s| in_month(&s.sold_at)).cloned().collect();

        let rows = aggregate_by_location(&month_visits, &month_sales, maps);
        months.push(MonthBucket { month, totals: RevenueTotals::of_rows(&rows) });

        for row in rows {
            let RevenueGroup::Location { customer_id, branch_id, .. } = row.group else {
                continue;
            };
            yearly
                .entry((customer_id, branch_id))
                .and_modify(|acc| {
                    acc.visit_count += row.visit_count;
                    acc.service_revenue += row.service_revenue;
                    acc.material_revenue += row.material_revenue;
                    acc.total_revenue += row.total_revenue;
                })
                .or_insert(row);
        }
    }

    let mut rows: Vec<RevenueRow> = yearly.into_values().collect();
    sort_rows(&mut rows);
    (months, rows)
}

/// Visitas do mês (todos os status) agrupadas por dia.
pub fn calendar(visits: &[Visit], maps: &LookupMaps<'_>) -> Vec<CalendarDay> {
    let mut sorted: Vec<&Visit> = visits.iter().collect();
    sorted.sort_by_key(|v| (v.scheduled_at, v.id));

    let mut days: BTreeMap<chrono::NaiveDate, CalendarDay> = BTreeMap::new();
    for visit in sorted {
        let date = CalendarReport::day_of(visit.scheduled_at);
        let day = days.entry(date).or_insert_with(|| CalendarDay {
            date,
            counts: StatusCounts::default(),
            visits: Vec::new(),
        });
        day.counts.bump(visit.status);
        day.visits.push(CalendarEntry {
            visit_id: visit.id,
            scheduled_at: visit.scheduled_at,
            status: visit.status,
            customer_name: maps.customer_name(visit.customer_id),
            branch_name: maps.branch_name(visit.branch_id),
            operator_name: maps.operator_name(visit.operator_id),
            is_invoiced: visit.is_invoiced,
            is_checked: visit.is_checked,
        });
    }

    days.into_values().collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::TimeZone;

    use super::*;

    pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 10, 0, 0).unwrap()
    }

    pub fn customer(name: &str) -> Customer {
        Customer {
            id: Uuid::new_v4(),
            company_id: Uuid::nil(),
            profile_id: None,
            full_name: name.to_string(),
            company_name: None,
            email: None,
            phone: None,
            address: None,
            created_at: at(2024, 1, 1),
        }
    }

    pub fn branch(customer: &Customer, name: &str) -> CustomerBranch {
        CustomerBranch {
            id: Uuid::new_v4(),
            customer_id: customer.id,
            name: name.to_string(),
            address: None,
            phone: None,
            created_at: at(2024, 1, 1),
        }
    }

    pub fn operator(name: &str) -> Operator {
        Operator {
            id: Uuid::new_v4(),
            company_id: Uuid::nil(),
            profile_id: None,
            full_name: name.to_string(),
            phone: None,
            is_active: true,
            created_at: at(2024, 1, 1),
        }
    }

    pub fn pricing(owner_id: Uuid, pricing_type: PricingType, amount: i64) -> PricingRecord {
        PricingRecord {
            id: Uuid::new_v4(),
            owner_id,
            pricing_type,
            amount: Decimal::from(amount),
            updated_at: at(2024, 1, 1),
        }
    }

    pub fn visit(
        customer_id: Uuid,
        branch_id: Option<Uuid>,
        operator_id: Option<Uuid>,
        scheduled_at: DateTime<Utc>,
        status: VisitStatus,
    ) -> Visit {
        Visit {
            id: Uuid::new_v4(),
            company_id: Uuid::nil(),
            customer_id,
            branch_id,
            operator_id,
            scheduled_at,
            status,
            is_invoiced: false,
            is_checked: false,
            notes: None,
            created_at: scheduled_at,
            updated_at: scheduled_at,
        }
    }

    pub fn sale(customer_id: Uuid, branch_id: Option<Uuid>, visit_id: Option<Uuid>, sold_at: DateTime<Utc>, amount: i64) -> SaleLine {
        SaleLine {
            sale_id: Uuid::new_v4(),
            customer_id,
            branch_id,
            visit_id,
            sold_at,
            material_id: Uuid::new_v4(),
            quantity: Decimal::from(2),
            unit_price: Decimal::from(amount) / Decimal::from(2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    fn completed(customer: &Customer, branch: Option<&CustomerBranch>, day: u32) -> Visit {
        visit(customer.id, branch.map(|b| b.id), None, at(2024, 3, day), VisitStatus::Completed)
    }

    fn row_for<'r>(rows: &'r [RevenueRow], branch_id: Option<Uuid>) -> &'r RevenueRow {
        rows.iter()
            .find(|r| matches!(&r.group, RevenueGroup::Location { branch_id: b, .. } if *b == branch_id))
            .expect("row for location")
    }

    #[test]
    fn branch_pricing_wins_and_inherits_customer_monthly() {
        // Cliente mensal 1000; filial A por visita 50 (3 visitas); filial B herda o mensal (5 visitas)
        let acme = customer("Acme");
        let a = branch(&acme, "A");
        let b = branch(&acme, "B");
        let mut data = ReportDataset {
            customers: vec![acme.clone()],
            branches: vec![a.clone(), b.clone()],
            customer_pricing: vec![pricing(acme.id, PricingType::Monthly, 1000)],
            branch_pricing: vec![pricing(a.id, PricingType::PerVisit, 50)],
            ..Default::default()
        };
        for day in 1..=3 {
            data.visits.push(completed(&acme, Some(&a), day));
        }
        for day in 1..=5 {
            data.visits.push(completed(&acme, Some(&b), day));
        }

        let maps = LookupMaps::build(&data);
        let rows = aggregate_by_location(&data.visits, &data.sales, &maps);

        assert_eq!(rows.len(), 2);
        let row_a = row_for(&rows, Some(a.id));
        assert_eq!(row_a.service_revenue, Decimal::from(150));
        assert_eq!(row_a.pricing_type, Some(PricingType::PerVisit));
        let row_b = row_for(&rows, Some(b.id));
        assert_eq!(row_b.visit_count, 5);
        assert_eq!(row_b.service_revenue, Decimal::from(1000));
        assert_eq!(row_b.pricing_type, Some(PricingType::Monthly));
        // Maior total primeiro
        assert_eq!(rows[0].total_revenue, Decimal::from(1000));
    }

    #[test]
    fn monthly_fee_is_flat_for_any_visit_count() {
        let c = customer("Padaria");
        let data = ReportDataset {
            customers: vec![c.clone()],
            customer_pricing: vec![pricing(c.id, PricingType::Monthly, 800)],
            visits: vec![completed(&c, None, 3)],
            ..Default::default()
        };
        let maps = LookupMaps::build(&data);
        let rows = aggregate_by_location(&data.visits, &data.sales, &maps);
        assert_eq!(rows[0].service_revenue, Decimal::from(800));
    }

    #[test]
    fn total_is_service_plus_material() {
        let c = customer("Mercado");
        let v = completed(&c, None, 10);
        let data = ReportDataset {
            customers: vec![c.clone()],
            customer_pricing: vec![pricing(c.id, PricingType::PerVisit, 120)],
            sales: vec![sale(c.id, None, Some(v.id), at(2024, 3, 10), 35)],
            visits: vec![v],
            ..Default::default()
        };
        let maps = LookupMaps::build(&data);
        let rows = aggregate_by_location(&data.visits, &data.sales, &maps);
        assert_eq!(rows[0].material_revenue, Decimal::from(35));
        assert_eq!(rows[0].total_revenue, rows[0].service_revenue + rows[0].material_revenue);
        assert_eq!(rows[0].total_revenue, Decimal::from(155));
    }

    #[test]
    fn locations_without_completed_visits_are_omitted() {
        let c = customer("Hotel");
        let cancelled = visit(c.id, None, None, at(2024, 3, 2), VisitStatus::Cancelled);
        let data = ReportDataset {
            customers: vec![c.clone()],
            customer_pricing: vec![pricing(c.id, PricingType::Monthly, 500)],
            sales: vec![sale(c.id, None, None, at(2024, 3, 2), 40)],
            visits: vec![cancelled],
            ..Default::default()
        };
        let maps = LookupMaps::build(&data);
        assert!(aggregate_by_location(&data.visits, &data.sales, &maps).is_empty());
    }

    #[test]
    fn unpriced_visits_still_count() {
        let c = customer("Escola");
        let data = ReportDataset {
            customers: vec![c.clone()],
            visits: vec![completed(&c, None, 1), completed(&c, None, 2)],
            ..Default::default()
        };
        let maps = LookupMaps::build(&data);
        let rows = aggregate_by_location(&data.visits, &data.sales, &maps);
        assert_eq!(rows[0].visit_count, 2);
        assert_eq!(rows[0].service_revenue, Decimal::ZERO);
        assert_eq!(rows[0].pricing_type, None);
    }

    #[test]
    fn null_branch_groups_under_customer_key() {
        let c = customer("Clínica");
        let b = branch(&c, "Anexo");
        let data = ReportDataset {
            customers: vec![c.clone()],
            branches: vec![b.clone()],
            customer_pricing: vec![pricing(c.id, PricingType::PerVisit, 10)],
            visits: vec![completed(&c, None, 1), completed(&c, None, 2), completed(&c, Some(&b), 3)],
            ..Default::default()
        };
        let maps = LookupMaps::build(&data);
        let rows = aggregate_by_location(&data.visits, &data.sales, &maps);
        assert_eq!(rows.len(), 2);
        let main = row_for(&rows, None);
        assert_eq!(main.visit_count, 2);
        assert_eq!(main.group.label(), "Clínica");
        assert_eq!(row_for(&rows, Some(b.id)).group.label(), "Clínica / Anexo");
    }

    #[test]
    fn operator_view_attributes_monthly_fee_once_to_earliest_visit() {
        let c = customer("Shopping");
        let first = operator("Ana");
        let second = operator("Bruno");
        let v1 = visit(c.id, None, Some(second.id), at(2024, 3, 20), VisitStatus::Completed);
        let v2 = visit(c.id, None, Some(first.id), at(2024, 3, 5), VisitStatus::Completed);
        let v3 = visit(c.id, None, None, at(2024, 3, 25), VisitStatus::Completed);
        let data = ReportDataset {
            customers: vec![c.clone()],
            operators: vec![first.clone(), second.clone()],
            customer_pricing: vec![pricing(c.id, PricingType::Monthly, 900)],
            sales: vec![sale(c.id, None, Some(v1.id), at(2024, 3, 20), 60)],
            visits: vec![v1, v2, v3],
            ..Default::default()
        };
        let maps = LookupMaps::build(&data);
        let rows = aggregate_by_operator(&data.visits, &data.sales, &maps);

        assert_eq!(rows.len(), 3);
        let service_total: Decimal = rows.iter().map(|r| r.service_revenue).sum();
        assert_eq!(service_total, Decimal::from(900));

        assert_eq!(rows[0].group.label(), "Ana");
        assert_eq!(rows[0].total_revenue, Decimal::from(900));
        assert_eq!(rows[1].group.label(), "Bruno");
        assert_eq!(rows[1].material_revenue, Decimal::from(60));
        let unassigned = rows
            .iter()
            .find(|r| matches!(r.group, RevenueGroup::Operator { operator_id: None, .. }))
            .unwrap();
        assert_eq!(unassigned.visit_count, 1);
    }

    #[test]
    fn visit_details_show_monthly_visits_with_zero_service() {
        let c = customer("Fábrica");
        let b = branch(&c, "Galpão");
        let v_monthly = completed(&c, None, 8);
        let v_per_visit = completed(&c, Some(&b), 2);
        let data = ReportDataset {
            customers: vec![c.clone()],
            branches: vec![b.clone()],
            customer_pricing: vec![pricing(c.id, PricingType::Monthly, 1000)],
            branch_pricing: vec![pricing(b.id, PricingType::PerVisit, 70)],
            visits: vec![v_monthly.clone(), v_per_visit.clone()],
            ..Default::default()
        };
        let maps = LookupMaps::build(&data);
        let rows = visit_details(&data.visits, &data.sales, &maps);

        assert_eq!(rows[0].visit_id, v_per_visit.id);
        assert_eq!(rows[0].service_amount, Decimal::from(70));
        assert_eq!(rows[1].pricing_type, Some(PricingType::Monthly));
        assert_eq!(rows[1].service_amount, Decimal::ZERO);
    }

    #[test]
    fn annual_charges_monthly_fee_once_per_month() {
        let c = customer("Condomínio");
        let mut data = ReportDataset {
            customers: vec![c.clone()],
            customer_pricing: vec![pricing(c.id, PricingType::Monthly, 1000)],
            ..Default::default()
        };
        for (month, day) in [(1, 5), (1, 20), (2, 3)] {
            data.visits.push(visit(c.id, None, None, at(2024, month, day), VisitStatus::Completed));
        }
        let maps = LookupMaps::build(&data);
        let (months, rows) = annual(&data.visits, &data.sales, &maps);

        assert_eq!(months.len(), 12);
        assert_eq!(months[0].totals.service_revenue, Decimal::from(1000));
        assert_eq!(months[0].totals.visit_count, 2);
        assert_eq!(months[1].totals.service_revenue, Decimal::from(1000));
        assert_eq!(months[2].totals, RevenueTotals::default());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].service_revenue, Decimal::from(2000));
        assert_eq!(rows[0].visit_count, 3);
    }

    #[test]
    fn calendar_buckets_all_statuses_by_day() {
        let c = customer("Restaurante");
        let data = ReportDataset {
            customers: vec![c.clone()],
            visits: vec![
                visit(c.id, None, None, at(2024, 3, 4), VisitStatus::Pending),
                visit(c.id, None, None, at(2024, 3, 4), VisitStatus::Cancelled),
                visit(c.id, None, None, at(2024, 3, 9), VisitStatus::Completed),
            ],
            ..Default::default()
        };
        let maps = LookupMaps::build(&data);
        let days = calendar(&data.visits, &maps);

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].visits.len(), 2);
        assert_eq!(days[0].counts.pending, 1);
        assert_eq!(days[0].counts.cancelled, 1);
        assert_eq!(days[1].counts.completed, 1);
        assert_eq!(days[1].visits[0].customer_name, "Restaurante");
    }
}
