// src/services/export_service.rs

use std::path::PathBuf;

use genpdf::{elements, style, Element};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    common::{error::AppError, i18n::I18nStore},
    models::{
        crm::PricingType,
        report::{
            AnnualReport, ExportFormat, GroupBy, ReportPeriod, RevenueGroup, RevenueReport, RevenueTotals, VisitReport,
        },
    },
};

/// Tabela neutra (já traduzida) que alimenta todos os formatos de saída.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportTable {
    pub title: String,
    pub subtitle: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub footer: Vec<String>,
}

/// Arquivo pronto para download.
#[derive(Debug)]
pub struct RenderedExport {
    pub content_type: &'static str,
    pub file_name: String,
    pub body: Vec<u8>,
}

#[derive(Clone)]
pub struct ExportService {
    fonts_dir: PathBuf,
    i18n: I18nStore,
}

fn money(value: Decimal) -> String {
    format!("{:.2}", value)
}

impl ExportService {
    pub fn new(fonts_dir: impl Into<PathBuf>, i18n: I18nStore) -> Self {
        Self { fonts_dir: fonts_dir.into(), i18n }
    }

    fn t(&self, lang: &str, key: &str) -> String {
        self.i18n.translate(lang, &format!("report.{}", key), &[])
    }

    fn period_label(&self, lang: &str, period: &ReportPeriod) -> String {
        // O fim é exclusivo; mostra o último dia incluído
        let last_day = period.end - chrono::Duration::days(1);
        format!(
            "{}: {} - {}",
            self.t(lang, "period"),
            period.start.format("%Y-%m-%d"),
            last_day.format("%Y-%m-%d")
        )
    }

    fn pricing_label(&self, lang: &str, pricing: Option<PricingType>) -> String {
        match pricing {
            Some(PricingType::Monthly) => self.t(lang, "pricing_monthly"),
            Some(PricingType::PerVisit) => self.t(lang, "pricing_per_visit"),
            None => "-".to_string(),
        }
    }

    fn totals_footer(&self, lang: &str, leading: usize, totals: &RevenueTotals) -> Vec<String> {
        let mut footer = vec![String::new(); leading];
        if let Some(first) = footer.first_mut() {
            *first = self.t(lang, "grand_total");
        }
        footer.extend([
            totals.visit_count.to_string(),
            money(totals.service_revenue),
            money(totals.material_revenue),
            money(totals.total_revenue),
        ]);
        footer
    }

    // =========================================================================
    //  MONTAGEM DAS TABELAS
    // =========================================================================

    pub fn revenue_table(&self, lang: &str, report: &RevenueReport) -> ExportTable {
        let by_operator = report.group_by == GroupBy::Operator;

        let mut headers = if by_operator {
            vec![self.t(lang, "operator")]
        } else {
            vec![self.t(lang, "customer"), self.t(lang, "branch"), self.t(lang, "pricing")]
        };
        let leading = headers.len();
        headers.extend(
            ["visits", "service_revenue", "material_revenue", "total"].map(|k| self.t(lang, k)),
        );

        let rows = report
            .rows
            .iter()
            .map(|row| {
                let mut cells = match &row.group {
                    RevenueGroup::Location { customer_name, branch_name, .. } => vec![
                        customer_name.clone(),
                        branch_name.clone().unwrap_or_else(|| self.t(lang, "main_location")),
                        self.pricing_label(lang, row.pricing_type),
                    ],
                    RevenueGroup::Operator { operator_name, .. } => {
                        vec![operator_name.clone().unwrap_or_else(|| self.t(lang, "unassigned"))]
                    }
                };
                cells.extend([
                    row.visit_count.to_string(),
                    money(row.service_revenue),
                    money(row.material_revenue),
                    money(row.total_revenue),
                ]);
                cells
            })
            .collect();

        ExportTable {
            title: self.t(lang, "title_revenue"),
            subtitle: self.period_label(lang, &report.period),
            headers,
            rows,
            footer: self.totals_footer(lang, leading, &report.totals),
        }
    }

    pub fn visits_table(&self, lang: &str, report: &VisitReport) -> ExportTable {
        let headers = [
            "date", "customer", "branch", "operator", "pricing", "service_revenue", "material_revenue", "total",
        ]
        .map(|k| self.t(lang, k))
        .to_vec();

        let rows = report
            .rows
            .iter()
            .map(|row| {
                vec![
                    row.scheduled_at.format("%Y-%m-%d %H:%M").to_string(),
                    row.customer_name.clone(),
                    row.branch_name.clone().unwrap_or_else(|| self.t(lang, "main_location")),
                    row.operator_name.clone().unwrap_or_else(|| self.t(lang, "unassigned")),
                    self.pricing_label(lang, row.pricing_type),
                    money(row.service_amount),
                    money(row.material_revenue),
                    money(row.total),
                ]
            })
            .collect();

        // Sem coluna de contagem: o rodapé mostra os três valores
        let mut footer = vec![String::new(); 5];
        footer[0] = self.t(lang, "grand_total");
        footer.extend([
            money(report.totals.service_revenue),
            money(report.totals.material_revenue),
            money(report.totals.total_revenue),
        ]);

        ExportTable {
            title: self.t(lang, "title_visits"),
            subtitle: self.period_label(lang, &report.period),
            headers,
            rows,
            footer,
        }
    }

    pub fn annual_table(&self, lang: &str, report: &AnnualReport) -> ExportTable {
        let mut headers = vec![self.t(lang, "month")];
        headers.extend(["visits", "service_revenue", "material_revenue", "total"].map(|k| self.t(lang, k)));

        let rows = report
            .months
            .iter()
            .map(|m| {
                vec![
                    format!("{}-{:02}", report.year, m.month),
                    m.totals.visit_count.to_string(),
                    money(m.totals.service_revenue),
                    money(m.totals.material_revenue),
                    money(m.totals.total_revenue),
                ]
            })
            .collect();

        ExportTable {
            title: self.t(lang, "title_annual"),
            subtitle: format!("{}: {}", self.t(lang, "period"), report.year),
            headers,
            rows,
            footer: self.totals_footer(lang, 1, &report.totals),
        }
    }

    // =========================================================================
    //  RENDERIZAÇÃO
    // =========================================================================

    pub fn render(&self, table: &ExportTable, format: ExportFormat, stem: &str) -> Result<RenderedExport, AppError> {
        let (content_type, extension, body) = match format {
            ExportFormat::Json => ("application/json", "json", serde_json::to_vec(table).map_err(anyhow::Error::from)?),
            ExportFormat::Csv => ("text/csv; charset=utf-8", "csv", to_csv(table)?),
            ExportFormat::Html => ("text/html; charset=utf-8", "html", to_html(table).into_bytes()),
            ExportFormat::Pdf => ("application/pdf", "pdf", self.to_pdf(table)?),
        };

        Ok(RenderedExport { content_type, file_name: format!("{}.{}", stem, extension), body })
    }

    fn to_pdf(&self, table: &ExportTable) -> Result<Vec<u8>, AppError> {
        // 1. Fonte
        let font_family = genpdf::fonts::from_files(&self.fonts_dir, "Roboto", None)
            .map_err(|_| AppError::FontNotFound(self.fonts_dir.display().to_string()))?;

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(table.title.clone());
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);

        // 2. Cabeçalho
        doc.push(elements::Paragraph::new(table.title.clone()).styled(style::Style::new().bold().with_font_size(16)));
        doc.push(elements::Paragraph::new(table.subtitle.clone()).styled(style::Style::new().with_font_size(10)));
        doc.push(elements::Break::new(1.5));

        // 3. Tabela (primeira coluna mais larga)
        let weights: Vec<usize> = (0..table.headers.len()).map(|i| if i == 0 { 3 } else { 2 }).collect();
        let mut layout = elements::TableLayout::new(weights);
        layout.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

        let pdf_error = |e: genpdf::error::Error| AppError::InternalServerError(anyhow::Error::msg(e.to_string()));
        let small = style::Style::new().with_font_size(8);
        let bold = small.bold();

        let mut header = layout.row();
        for cell in &table.headers {
            header.push_element(elements::Paragraph::new(cell.clone()).styled(bold));
        }
        header.push().map_err(pdf_error)?;

        for row in table.rows.iter().chain(std::iter::once(&table.footer)) {
            let mut line = layout.row();
            for cell in row {
                line.push_element(elements::Paragraph::new(cell.clone()).styled(small));
            }
            line.push().map_err(pdf_error)?;
        }

        doc.push(layout);

        // 4. Renderiza em memória
        let mut buffer = Vec::new();
        doc.render(&mut buffer).map_err(pdf_error)?;
        Ok(buffer)
    }
}

fn to_csv(table: &ExportTable) -> Result<Vec<u8>, AppError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    let csv_error = |e: csv::Error| AppError::InternalServerError(anyhow::Error::msg(e.to_string()));

    wtr.write_record(&table.headers).map_err(csv_error)?;
    for row in &table.rows {
        wtr.write_record(row).map_err(csv_error)?;
    }
    wtr.write_record(&table.footer).map_err(csv_error)?;

    wtr.into_inner()
        .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn to_html(table: &ExportTable) -> String {
    let cells = |row: &[String], tag: &str| -> String {
        row.iter().map(|c| format!("<{tag}>{}</{tag}>", escape_html(c))).collect()
    };

    let mut html = String::new();
    html.push_str("<!DOCTYPE html><html><head><meta charset=\"utf-8\">");
    html.push_str(&format!("<title>{}</title>", escape_html(&table.title)));
    html.push_str("<style>table{border-collapse:collapse}td,th{border:1px solid #999;padding:4px 8px}tfoot{font-weight:bold}</style>");
    html.push_str("</head><body>");
    html.push_str(&format!("<h1>{}</h1><p>{}</p>", escape_html(&table.title), escape_html(&table.subtitle)));
    html.push_str(&format!("<table><thead><tr>{}</tr></thead><tbody>", cells(&table.headers, "th")));
    for row in &table.rows {
        html.push_str(&format!("<tr>{}</tr>", cells(row, "td")));
    }
    html.push_str(&format!("</tbody><tfoot><tr>{}</tr></tfoot></table></body></html>", cells(&table.footer, "td")));
    html
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use uuid::Uuid;

    use super::*;
    use crate::models::report::RevenueRow;

    fn service() -> ExportService {
        ExportService::new("./fonts", I18nStore::load().unwrap())
    }

    fn sample_report() -> RevenueReport {
        let rows = vec![RevenueRow {
            group: RevenueGroup::Location {
                customer_id: Uuid::new_v4(),
                customer_name: "Bar <Central>".into(),
                branch_id: None,
                branch_name: None,
            },
            pricing_type: Some(PricingType::Monthly),
            visit_count: 2,
            service_revenue: Decimal::from(1000),
            material_revenue: Decimal::new(255, 1),
            total_revenue: Decimal::new(10255, 1),
        }];
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        RevenueReport {
            period: ReportPeriod::between(start, end).unwrap(),
            group_by: GroupBy::Location,
            totals: RevenueTotals::of_rows(&rows),
            rows,
        }
    }

    #[test]
    fn revenue_table_is_localized() {
        let table = service().revenue_table("pt", &sample_report());
        assert_eq!(table.headers[0], "Cliente");
        assert_eq!(table.rows[0][1], "Local principal");
        assert_eq!(table.rows[0][2], "Mensal");
        assert_eq!(table.rows[0][6], "1025.50");
        assert!(table.subtitle.ends_with("2024-03-01 - 2024-03-31"));
        assert_eq!(table.footer.len(), table.headers.len());
    }

    #[test]
    fn empty_operator_report_keeps_operator_layout() {
        let mut report = sample_report();
        report.group_by = GroupBy::Operator;
        report.rows.clear();
        report.totals = RevenueTotals::default();

        let table = service().revenue_table("en", &report);
        assert_eq!(table.headers[0], "Operator");
        assert_eq!(table.headers.len(), 5);
        assert!(table.rows.is_empty());
        assert_eq!(table.footer.len(), table.headers.len());
    }

    #[test]
    fn csv_has_header_rows_and_footer() {
        let svc = service();
        let table = svc.revenue_table("en", &sample_report());
        let out = svc.render(&table, ExportFormat::Csv, "revenue").unwrap();
        assert_eq!(out.file_name, "revenue.csv");
        let text = String::from_utf8(out.body).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().next().unwrap().starts_with("Customer,"));
    }

    #[test]
    fn html_escapes_cell_content() {
        let svc = service();
        let table = svc.revenue_table("en", &sample_report());
        let html = String::from_utf8(svc.render(&table, ExportFormat::Html, "revenue").unwrap().body).unwrap();
        assert!(html.contains("Bar &lt;Central&gt;"));
        assert!(!html.contains("<Central>"));
    }

    #[test]
    fn missing_fonts_is_a_typed_error() {
        let svc = ExportService::new("/nonexistent/fonts", I18nStore::load().unwrap());
        let table = svc.revenue_table("en", &sample_report());
        assert!(matches!(svc.render(&table, ExportFormat::Pdf, "revenue"), Err(AppError::FontNotFound(_))));
    }
}
