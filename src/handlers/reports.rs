// src/handlers/reports.rs

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{CompanyOwnerOnly, CompanyStaff, RequireRole},
        tenancy::TenantContext,
    },
    models::report::{
        AnnualQuery, AnnualReport, CalendarQuery, CalendarReport, ExportFormat, ReportPeriod, RevenueQuery,
        RevenueReport, VisitReport,
    },
    services::export_service::{ExportTable, RenderedExport},
};

// Arquivo para download (CSV/HTML/PDF)
fn attachment(rendered: RenderedExport) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", rendered.file_name);
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, rendered.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        rendered.body,
    )
        .into_response()
}

fn render(
    app_state: &AppState,
    table: ExportTable,
    format: ExportFormat,
    stem: &str,
) -> Result<Response, AppError> {
    let rendered = app_state.export_service.render(&table, format, stem)?;
    tracing::debug!(file = %rendered.file_name, bytes = rendered.body.len(), "Relatório exportado");
    Ok(attachment(rendered))
}

// GET /api/reports/revenue
#[utoipa::path(
    get,
    path = "/api/reports/revenue",
    tag = "Reports",
    params(RevenueQuery),
    responses(
        (status = 200, description = "Faturamento por local ou por operador (JSON ou arquivo)", body = RevenueReport),
        (status = 400, description = "Período inválido"),
        (status = 404, description = "Empresa não encontrada para o perfil")
    ),
    security(("api_jwt" = []))
)]
pub async fn revenue_report(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<CompanyOwnerOnly>,
    Query(query): Query<RevenueQuery>,
) -> Result<Response, ApiError> {
    let result: Result<Response, AppError> = async {
        let period = ReportPeriod::from_query(&query)?;
        let report = app_state
            .report_service
            .revenue(tenant.company_id, period, query.group_by, query.search.as_deref())
            .await?;

        match query.format {
            ExportFormat::Json => Ok(Json(report).into_response()),
            format => {
                let table = app_state.export_service.revenue_table(&locale.0, &report);
                render(&app_state, table, format, "revenue")
            }
        }
    }
    .await;

    result.map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))
}

// GET /api/reports/visits
#[utoipa::path(
    get,
    path = "/api/reports/visits",
    tag = "Reports",
    params(RevenueQuery),
    responses(
        (status = 200, description = "Detalhe por visita (JSON ou arquivo)", body = VisitReport),
        (status = 400, description = "Período inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn visits_report(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<CompanyOwnerOnly>,
    Query(query): Query<RevenueQuery>,
) -> Result<Response, ApiError> {
    let result: Result<Response, AppError> = async {
        let period = ReportPeriod::from_query(&query)?;
        let report = app_state
            .report_service
            .visits(tenant.company_id, period, query.search.as_deref())
            .await?;

        match query.format {
            ExportFormat::Json => Ok(Json(report).into_response()),
            format => {
                let table = app_state.export_service.visits_table(&locale.0, &report);
                render(&app_state, table, format, "visits")
            }
        }
    }
    .await;

    result.map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))
}

// GET /api/reports/annual
#[utoipa::path(
    get,
    path = "/api/reports/annual",
    tag = "Reports",
    params(AnnualQuery),
    responses(
        (status = 200, description = "Resumo anual com totais por mês", body = AnnualReport),
        (status = 400, description = "Ano inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn annual_report(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<CompanyOwnerOnly>,
    Query(query): Query<AnnualQuery>,
) -> Result<Response, ApiError> {
    let result: Result<Response, AppError> = async {
        let report = app_state
            .report_service
            .annual(tenant.company_id, query.year, query.search.as_deref())
            .await?;

        match query.format {
            ExportFormat::Json => Ok(Json(report).into_response()),
            format => {
                let table = app_state.export_service.annual_table(&locale.0, &report);
                render(&app_state, table, format, &format!("annual-{}", query.year))
            }
        }
    }
    .await;

    result.map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))
}

// GET /api/reports/calendar
#[utoipa::path(
    get,
    path = "/api/reports/calendar",
    tag = "Reports",
    params(CalendarQuery),
    responses(
        (status = 200, description = "Visitas do mês agrupadas por dia", body = CalendarReport)
    ),
    security(("api_jwt" = []))
)]
pub async fn calendar_report(
    State(app_state): State<AppState>,
    locale: Locale,
    tenant: TenantContext,
    _guard: RequireRole<CompanyStaff>,
    Query(query): Query<CalendarQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let calendar = app_state
        .report_service
        .calendar(tenant.company_id, query.year, query.month)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(calendar)))
}
