// src/db/tenancy_repo.rs

use sqlx::{PgPool, Postgres, Executor};
use uuid::Uuid;
use crate::common::error::{map_unique_violation, AppError};
use crate::models::auth::{Profile, UserRole};
use crate::models::tenancy::Company;

#[derive(Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Perfil espelhado do provedor de autenticação.
    pub async fn find_profile(&self, profile_id: Uuid) -> Result<Option<Profile>, AppError> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT id, email, full_name, role, created_at FROM profiles WHERE id = $1",
        )
            .bind(profile_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(profile)
    }

    /// Resolve o id de armazenamento da empresa a partir do id do perfil.
    /// Dono → `companies.profile_id`; operador → `operators.profile_id`.
    /// Ausência é erro tipado: contagens nunca leem zero silenciosamente.
    pub async fn resolve_company_id(
        &self,
        profile_id: Uuid,
        role: UserRole,
    ) -> Result<Uuid, AppError> {
        let sql = match role {
            UserRole::Company => "SELECT id FROM companies WHERE profile_id = $1",
            UserRole::Operator => "SELECT company_id FROM operators WHERE profile_id = $1 AND is_active",
            UserRole::Admin => return Err(AppError::Forbidden),
        };

        let company_id: Option<Uuid> = sqlx::query_scalar(sql)
            .bind(profile_id)
            .fetch_optional(&self.pool)
            .await?;

        company_id.ok_or(AppError::CompanyNotFound(profile_id))
    }

    pub async fn find_company<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
    ) -> Result<Option<Company>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let company = sqlx::query_as::<_, Company>(
            "SELECT id, profile_id, name, phone, address, created_at FROM companies WHERE id = $1",
        )
            .bind(company_id)
            .fetch_optional(executor)
            .await?;
        Ok(company)
    }

    pub async fn list_companies<'e, E>(&self, executor: E) -> Result<Vec<Company>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let companies = sqlx::query_as::<_, Company>(
            "SELECT id, profile_id, name, phone, address, created_at FROM companies ORDER BY name ASC",
        )
            .fetch_all(executor)
            .await?;
        Ok(companies)
    }

    /// Cria a linha da empresa para um perfil já existente.
    pub async fn create_company<'e, E>(
        &self,
        executor: E,
        profile_id: Uuid,
        name: &str,
        phone: Option<&str>,
        address: Option<&str>,
    ) -> Result<Company, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Company>(
            r#"
            INSERT INTO companies (profile_id, name, phone, address)
            VALUES ($1, $2, $3, $4)
            RETURNING id, profile_id, name, phone, address, created_at
            "#,
        )
            .bind(profile_id)
            .bind(name)
            .bind(phone)
            .bind(address)
            .fetch_one(executor)
            .await
            .map_err(|e| map_unique_violation(e, "company"))
    }
}
