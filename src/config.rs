// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{
        CrmRepository, InventoryRepository, OperationsRepository, ReportRepository,
        SubscriptionRepository, TenantRepository,
    },
    services::{
        crm_service::CrmService,
        export_service::ExportService,
        gateway::{FunctionGateway, HttpFunctionGateway},
        import_service::ImportService,
        inventory_service::InventoryService,
        operation_service::OperationsService,
        report_service::ReportService,
        subscription_service::SubscriptionService,
        tenancy_service::TenantService,
    },
};

/// Variáveis de ambiente lidas na partida.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub functions_url: String,
    pub functions_service_key: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub fonts_dir: String,
    pub gateway_timeout: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let required = |name: &str| env::var(name).with_context(|| format!("{} deve ser definida", name));

        let db_max_connections = match env::var("DB_MAX_CONNECTIONS") {
            Ok(raw) => raw.parse().context("DB_MAX_CONNECTIONS inválido")?,
            Err(_) => 5,
        };
        let gateway_timeout_secs: u64 = match env::var("GATEWAY_TIMEOUT_SECS") {
            Ok(raw) => raw.parse().context("GATEWAY_TIMEOUT_SECS inválido")?,
            Err(_) => 15,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            functions_url: required("FUNCTIONS_URL")?,
            functions_service_key: required("FUNCTIONS_SERVICE_KEY")?,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            db_max_connections,
            fonts_dir: env::var("FONTS_DIR").unwrap_or_else(|_| "./fonts".to_string()),
            gateway_timeout: Duration::from_secs(gateway_timeout_secs),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_secret: String,
    pub i18n_store: I18nStore,

    pub tenant_service: TenantService,
    pub subscription_service: SubscriptionService,
    pub crm_service: CrmService,
    pub operations_service: OperationsService,
    pub inventory_service: InventoryService,
    pub report_service: ReportService,
    pub export_service: ExportService,
    pub import_service: ImportService,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let gateway: Arc<dyn FunctionGateway> = Arc::new(HttpFunctionGateway::new(
            &config.functions_url,
            &config.functions_service_key,
            config.gateway_timeout,
        )?);

        Self::assemble(db_pool, config.jwt_secret.clone(), &config.fonts_dir, gateway)
    }

    // --- Monta o gráfico de dependências ---
    pub fn assemble(
        db_pool: PgPool,
        jwt_secret: String,
        fonts_dir: &str,
        gateway: Arc<dyn FunctionGateway>,
    ) -> anyhow::Result<Self> {
        let i18n_store = I18nStore::load()?;

        let tenant_repo = TenantRepository::new(db_pool.clone());
        let subscription_repo = SubscriptionRepository::new(db_pool.clone());
        let crm_repo = CrmRepository::new(db_pool.clone());
        let operations_repo = OperationsRepository::new(db_pool.clone());
        let inventory_repo = InventoryRepository::new(db_pool.clone());
        let report_repo = ReportRepository::new(db_pool.clone());

        let tenant_service = TenantService::new(tenant_repo.clone(), db_pool.clone());
        let subscription_service = SubscriptionService::new(subscription_repo, tenant_repo);
        let crm_service = CrmService::new(crm_repo.clone(), subscription_service.clone(), gateway.clone());
        let operations_service = OperationsService::new(
            operations_repo.clone(),
            crm_repo.clone(),
            subscription_service.clone(),
            gateway.clone(),
        );
        let inventory_service = InventoryService::new(
            inventory_repo,
            crm_repo,
            operations_repo,
            subscription_service.clone(),
        );
        let report_service = ReportService::new(report_repo);
        let export_service = ExportService::new(fonts_dir, i18n_store.clone());
        let import_service = ImportService::new(db_pool.clone(), subscription_service.clone(), gateway, i18n_store.clone());

        Ok(Self {
            db_pool,
            jwt_secret,
            i18n_store,
            tenant_service,
            subscription_service,
            crm_service,
            operations_service,
            inventory_service,
            report_service,
            export_service,
            import_service,
        })
    }
}
