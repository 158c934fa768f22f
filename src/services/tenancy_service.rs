// src/services/tenancy_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::TenantRepository,
    models::{
        auth::{Profile, UserRole},
        tenancy::Company,
    },
};

#[derive(Clone)]
pub struct TenantService {
    tenant_repo: TenantRepository,
    pool: PgPool,
}

impl TenantService {
    pub fn new(tenant_repo: TenantRepository, pool: PgPool) -> Self {
        Self { tenant_repo, pool }
    }

    pub async fn find_profile(&self, profile_id: Uuid) -> Result<Profile, AppError> {
        self.tenant_repo
            .find_profile(profile_id)
            .await?
            .ok_or(AppError::ProfileNotFound(profile_id))
    }

    /// Id de armazenamento da empresa do chamador.
    pub async fn resolve_company_id(&self, profile_id: Uuid, role: UserRole) -> Result<Uuid, AppError> {
        self.tenant_repo.resolve_company_id(profile_id, role).await
    }

    pub async fn current_company(&self, profile_id: Uuid, role: UserRole) -> Result<Company, AppError> {
        let company_id = self.resolve_company_id(profile_id, role).await?;
        self.tenant_repo
            .find_company(&self.pool, company_id)
            .await?
            .ok_or(AppError::CompanyNotFound(profile_id))
    }

    /// Primeiro acesso do dono: cria a linha da empresa. Sem assinatura
    /// ativa, valem os tetos de teste.
    pub async fn register_company(
        &self,
        owner: &Profile,
        name: &str,
        phone: Option<&str>,
        address: Option<&str>,
    ) -> Result<Company, AppError> {
        if owner.role != UserRole::Company {
            return Err(AppError::Forbidden);
        }

        let company = self
            .tenant_repo
            .create_company(&self.pool, owner.id, name, phone, address)
            .await?;

        tracing::info!(company_id = %company.id, profile_id = %owner.id, "Empresa registrada");
        Ok(company)
    }

    pub async fn list_companies(&self) -> Result<Vec<Company>, AppError> {
        self.tenant_repo.list_companies(&self.pool).await
    }
}
