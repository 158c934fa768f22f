//src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Config};
use crate::docs::ApiDoc;
use crate::middleware::auth::{auth_guard, tenant_guard};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let config = Config::from_env()?;
    let app_state = AppState::new(&config).await?;

    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let app = router(app_state);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

fn router(app_state: AppState) -> Router {
    // Só login: sessão e primeiro registro da empresa
    let user_routes = Router::new()
        .route("/me", get(handlers::tenancy::get_me))
        .route("/company", post(handlers::tenancy::register_company))
        .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    // Plataforma (papel admin verificado em cada handler)
    let admin_routes = Router::new()
        .route(
            "/plans",
            post(handlers::subscription::create_plan).get(handlers::subscription::list_plans),
        )
        .route("/plans/{id}", put(handlers::subscription::update_plan))
        .route("/companies", get(handlers::subscription::list_companies))
        .route(
            "/companies/{id}/subscription",
            put(handlers::subscription::assign_subscription),
        )
        .route("/companies/{id}/limits", get(handlers::subscription::company_limits))
        .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    // Tudo que depende da empresa do chamador
    let tenant_routes = Router::new()
        .route("/subscription", get(handlers::subscription::get_subscription))
        // CRM
        .route(
            "/customers",
            post(handlers::crm::create_customer).get(handlers::crm::list_customers),
        )
        .route(
            "/customers/{id}",
            get(handlers::crm::get_customer)
                .put(handlers::crm::update_customer)
                .delete(handlers::crm::delete_customer),
        )
        .route(
            "/customers/{id}/branches",
            post(handlers::crm::create_branch).get(handlers::crm::list_branches),
        )
        .route("/branches/{id}", axum::routing::delete(handlers::crm::delete_branch))
        .route(
            "/pricing/{owner}/{id}",
            get(handlers::crm::get_pricing)
                .put(handlers::crm::set_pricing)
                .delete(handlers::crm::clear_pricing),
        )
        // Operação
        .route(
            "/operators",
            post(handlers::operations::create_operator).get(handlers::operations::list_operators),
        )
        .route("/operators/{id}/active", put(handlers::operations::set_operator_active))
        .route(
            "/visits",
            post(handlers::operations::create_visit).get(handlers::operations::list_visits),
        )
        .route(
            "/visits/{id}",
            axum::routing::patch(handlers::operations::update_visit).delete(handlers::operations::delete_visit),
        )
        // Estoque
        .route(
            "/materials",
            post(handlers::inventory::create_material).get(handlers::inventory::list_materials),
        )
        .route(
            "/sales",
            post(handlers::inventory::record_sale).get(handlers::inventory::list_sales),
        )
        .route(
            "/warehouses",
            post(handlers::inventory::create_warehouse).get(handlers::inventory::list_warehouses),
        )
        .route("/warehouses/{id}/items", get(handlers::inventory::list_items))
        .route("/warehouses/{id}/items/{material_id}", put(handlers::inventory::set_item))
        .route("/inventory/low-stock", get(handlers::inventory::low_stock))
        .route(
            "/transfers",
            post(handlers::inventory::request_transfer).get(handlers::inventory::list_transfers),
        )
        .route("/transfers/{id}/approve", post(handlers::inventory::approve_transfer))
        .route("/transfers/{id}/reject", post(handlers::inventory::reject_transfer))
        // Relatórios e importação
        .route("/reports/revenue", get(handlers::reports::revenue_report))
        .route("/reports/visits", get(handlers::reports::visits_report))
        .route("/reports/annual", get(handlers::reports::annual_report))
        .route("/reports/calendar", get(handlers::reports::calendar_report))
        .route("/import/customers", post(handlers::imports::import_customers))
        .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), tenant_guard));

    let api_routes = Router::new()
        .route("/health", get(|| async { "OK" }))
        .merge(user_routes)
        .merge(tenant_routes)
        .nest("/admin", admin_routes);

    Router::new()
        .nest("/api", api_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}
