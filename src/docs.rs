// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Users / Tenancy ---
        handlers::tenancy::get_me,
        handlers::tenancy::register_company,

        // --- Subscription ---
        handlers::subscription::get_subscription,

        // --- Admin ---
        handlers::subscription::list_plans,
        handlers::subscription::create_plan,
        handlers::subscription::update_plan,
        handlers::subscription::list_companies,
        handlers::subscription::assign_subscription,
        handlers::subscription::company_limits,

        // --- CRM ---
        handlers::crm::list_customers,
        handlers::crm::create_customer,
        handlers::crm::get_customer,
        handlers::crm::update_customer,
        handlers::crm::delete_customer,
        handlers::crm::list_branches,
        handlers::crm::create_branch,
        handlers::crm::delete_branch,
        handlers::crm::get_pricing,
        handlers::crm::set_pricing,
        handlers::crm::clear_pricing,

        // --- Operations ---
        handlers::operations::list_operators,
        handlers::operations::create_operator,
        handlers::operations::set_operator_active,
        handlers::operations::list_visits,
        handlers::operations::create_visit,
        handlers::operations::update_visit,
        handlers::operations::delete_visit,

        // --- Inventory ---
        handlers::inventory::list_materials,
        handlers::inventory::create_material,
        handlers::inventory::record_sale,
        handlers::inventory::list_sales,
        handlers::inventory::list_warehouses,
        handlers::inventory::create_warehouse,
        handlers::inventory::list_items,
        handlers::inventory::set_item,
        handlers::inventory::low_stock,
        handlers::inventory::list_transfers,
        handlers::inventory::request_transfer,
        handlers::inventory::approve_transfer,
        handlers::inventory::reject_transfer,

        // --- Reports ---
        handlers::reports::revenue_report,
        handlers::reports::visits_report,
        handlers::reports::annual_report,
        handlers::reports::calendar_report,

        // --- Import ---
        handlers::imports::import_customers,
    ),
    components(
        schemas(
            // --- Auth / Tenancy ---
            models::auth::UserRole,
            models::auth::Profile,
            models::auth::Session,
            models::tenancy::Company,
            handlers::tenancy::MeResponse,
            handlers::tenancy::RegisterCompanyPayload,

            // --- Subscription ---
            models::subscription::ResourceKind,
            models::subscription::SubscriptionStatus,
            models::subscription::ResourceLimits,
            models::subscription::SubscriptionPlan,
            models::subscription::Subscription,
            models::subscription::LimitSource,
            models::subscription::EffectiveLimit,
            models::subscription::ResourceUsage,
            models::subscription::SubscriptionOverview,
            handlers::subscription::PlanPayload,
            handlers::subscription::AssignSubscriptionPayload,

            // --- CRM ---
            models::crm::PricingType,
            models::crm::Customer,
            models::crm::CustomerBranch,
            models::crm::PricingRecord,
            handlers::crm::CreateCustomerPayload,
            handlers::crm::UpdateCustomerPayload,
            handlers::crm::CreateBranchPayload,
            handlers::crm::PricingTarget,
            handlers::crm::SetPricingPayload,

            // --- Operations ---
            models::operations::VisitStatus,
            models::operations::Operator,
            models::operations::Visit,
            handlers::operations::CreateOperatorPayload,
            handlers::operations::SetOperatorActivePayload,
            handlers::operations::CreateVisitPayload,
            handlers::operations::UpdateVisitPayload,

            // --- Inventory ---
            models::inventory::CompanyMaterial,
            models::inventory::MaterialSale,
            models::inventory::MaterialSaleItem,
            models::inventory::MaterialSaleDetail,
            models::inventory::Warehouse,
            models::inventory::WarehouseItem,
            models::inventory::TransferStatus,
            models::inventory::WarehouseTransfer,
            handlers::inventory::CreateMaterialPayload,
            handlers::inventory::SaleItemPayload,
            handlers::inventory::RecordSalePayload,
            handlers::inventory::CreateWarehousePayload,
            handlers::inventory::SetItemPayload,
            handlers::inventory::RequestTransferPayload,

            // --- Reports ---
            models::report::GroupBy,
            models::report::ExportFormat,
            models::report::ReportPeriod,
            models::report::RevenueGroup,
            models::report::RevenueRow,
            models::report::RevenueTotals,
            models::report::RevenueReport,
            models::report::VisitDetailRow,
            models::report::VisitReport,
            models::report::MonthBucket,
            models::report::AnnualReport,
            models::report::CalendarEntry,
            models::report::StatusCounts,
            models::report::CalendarDay,
            models::report::CalendarReport,

            // --- Import ---
            models::import::ImportSummary,
        )
    ),
    tags(
        (name = "Users", description = "Sessão do usuário autenticado"),
        (name = "Tenancy", description = "Registro da empresa"),
        (name = "Subscription", description = "Plano, limites e uso da empresa"),
        (name = "Admin", description = "Planos e assinaturas (administração da plataforma)"),
        (name = "CRM", description = "Clientes, filiais e preços"),
        (name = "Operations", description = "Operadores e visitas"),
        (name = "Inventory", description = "Materiais, vendas, depósitos e transferências"),
        (name = "Reports", description = "Faturamento, visitas, resumo anual e calendário"),
        (name = "Import", description = "Importação em massa de clientes")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_every_route_family() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/me",
            "/api/admin/plans",
            "/api/customers",
            "/api/pricing/{owner}/{id}",
            "/api/visits/{id}",
            "/api/transfers/{id}/approve",
            "/api/reports/revenue",
            "/api/import/customers",
        ] {
            assert!(doc.paths.paths.contains_key(path), "rota ausente: {}", path);
        }
    }
}
