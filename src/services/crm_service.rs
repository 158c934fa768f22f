// src/services/crm_service.rs

use std::sync::Arc;

use rust_decimal::Decimal;
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        crm_repo::{CustomerFields, PricingOwner},
        CrmRepository,
    },
    models::{
        crm::{Customer, CustomerBranch, PricingRecord, PricingType},
        subscription::ResourceKind,
    },
    services::{
        gateway::{CreateCustomerAccount, FunctionGateway},
        subscription_service::SubscriptionService,
    },
};

/// Credenciais opcionais: quando presentes, o cliente ganha login próprio.
#[derive(Debug, Clone)]
pub struct CustomerLogin {
    pub email: String,
    pub password: String,
}

#[derive(Clone)]
pub struct CrmService {
    repo: CrmRepository,
    subscriptions: SubscriptionService,
    gateway: Arc<dyn FunctionGateway>,
}

impl CrmService {
    pub fn new(repo: CrmRepository, subscriptions: SubscriptionService, gateway: Arc<dyn FunctionGateway>) -> Self {
        Self { repo, subscriptions, gateway }
    }

    // =========================================================================
    //  1. CLIENTES
    // =========================================================================

    pub async fn list_customers<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        search: Option<&str>,
        page: i64,
        per_page: i64,
    ) -> Result<Vec<Customer>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let per_page = per_page.clamp(1, 200);
        let offset = (page.max(1) - 1) * per_page;
        self.repo.list_customers(executor, company_id, search, offset, per_page).await
    }

    pub async fn get_customer<'e, E>(&self, executor: E, company_id: Uuid, customer_id: Uuid) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .find_customer(executor, company_id, customer_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("customer {}", customer_id)))
    }

    /// Com credenciais, a função remota grava cliente e login juntos e a
    /// linha é relida aqui. Sem credenciais, a inserção é local.
    pub async fn create_customer<'c, A>(
        &self,
        conn: A,
        company_id: Uuid,
        fields: &CustomerFields<'_>,
        login: Option<CustomerLogin>,
    ) -> Result<Customer, AppError>
    where
        A: Acquire<'c, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;

        // 1. Teto do plano
        self.subscriptions.ensure_capacity(&mut *conn, company_id, ResourceKind::Customers, 1).await?;

        // 2. Linha do cliente
        let customer = match login {
            Some(login) => {
                let request = CreateCustomerAccount {
                    company_id,
                    email: login.email,
                    password: login.password,
                    full_name: fields.full_name.to_string(),
                    company_name: fields.company_name.map(str::to_string),
                    phone: fields.phone.map(str::to_string),
                    address: fields.address.map(str::to_string),
                };
                let created = self.gateway.create_customer_account(&request).await?;
                self.repo
                    .find_customer(&mut *conn, company_id, created.id)
                    .await?
                    .ok_or_else(|| AppError::ResourceNotFound(format!("customer {}", created.id)))?
            }
            None => self.repo.create_customer(&mut *conn, company_id, fields).await?,
        };

        tracing::info!(%company_id, customer_id = %customer.id, "Cliente criado");
        Ok(customer)
    }

    pub async fn update_customer<'e, E>(
        &self,
        executor: E,
        company_id: Uuid,
        customer_id: Uuid,
        fields: &CustomerFields<'_>,
    ) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo
            .update_customer(executor, company_id, customer_id, fields)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("customer {}", customer_id)))
    }

    pub async fn delete_customer<'e, E>(&self, executor: E, company_id: Uuid, customer_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if !self.repo.delete_customer(executor, company_id, customer_id).await? {
            return Err(AppError::ResourceNotFound(format!("customer {}", customer_id)));
        }
        Ok(())
    }

    // =========================================================================
    //  2. FILIAIS
    // =========================================================================

    pub async fn list_branches<'c, A>(
        &self,
        conn: A,
        company_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Vec<CustomerBranch>, AppError>
    where
        A: Acquire<'c, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;
        self.get_customer(&mut *conn, company_id, customer_id).await?;
        self.repo.list_branches(&mut *conn, company_id, customer_id).await
    }

    pub async fn create_branch<'c, A>(
        &self,
        conn: A,
        company_id: Uuid,
        customer_id: Uuid,
        name: &str,
        address: Option<&str>,
        phone: Option<&str>,
    ) -> Result<CustomerBranch, AppError>
    where
        A: Acquire<'c, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;
        self.get_customer(&mut *conn, company_id, customer_id).await?;
        self.subscriptions.ensure_capacity(&mut *conn, company_id, ResourceKind::Branches, 1).await?;
        self.repo.create_branch(&mut *conn, customer_id, name, address, phone).await
    }

    pub async fn delete_branch<'e, E>(&self, executor: E, company_id: Uuid, branch_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if !self.repo.delete_branch(executor, company_id, branch_id).await? {
            return Err(AppError::ResourceNotFound(format!("branch {}", branch_id)));
        }
        Ok(())
    }

    // =========================================================================
    //  3. PREÇOS
    // =========================================================================

    /// Confirma que o dono do preço (cliente ou filial) é da empresa.
    async fn ensure_owner(
        &self,
        conn: &mut PgConnection,
        company_id: Uuid,
        owner: PricingOwner,
        owner_id: Uuid,
    ) -> Result<(), AppError> {
        let found = match owner {
            PricingOwner::Customer => self.repo.find_customer(&mut *conn, company_id, owner_id).await?.is_some(),
            PricingOwner::Branch => self.repo.branch_customer(&mut *conn, company_id, owner_id).await?.is_some(),
        };
        if !found {
            let what = match owner {
                PricingOwner::Customer => "customer",
                PricingOwner::Branch => "branch",
            };
            return Err(AppError::ResourceNotFound(format!("{} {}", what, owner_id)));
        }
        Ok(())
    }

    pub async fn set_pricing<'c, A>(
        &self,
        conn: A,
        company_id: Uuid,
        owner: PricingOwner,
        owner_id: Uuid,
        pricing_type: PricingType,
        amount: Decimal,
    ) -> Result<PricingRecord, AppError>
    where
        A: Acquire<'c, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;
        self.ensure_owner(&mut *conn, company_id, owner, owner_id).await?;
        self.repo.upsert_pricing(&mut *conn, owner, owner_id, pricing_type, amount).await
    }

    pub async fn get_pricing<'c, A>(
        &self,
        conn: A,
        company_id: Uuid,
        owner: PricingOwner,
        owner_id: Uuid,
    ) -> Result<Option<PricingRecord>, AppError>
    where
        A: Acquire<'c, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;
        self.ensure_owner(&mut *conn, company_id, owner, owner_id).await?;
        self.repo.find_pricing(&mut *conn, owner, owner_id).await
    }

    pub async fn clear_pricing<'c, A>(
        &self,
        conn: A,
        company_id: Uuid,
        owner: PricingOwner,
        owner_id: Uuid,
    ) -> Result<(), AppError>
    where
        A: Acquire<'c, Database = Postgres>,
    {
        let mut conn = conn.acquire().await?;
        self.ensure_owner(&mut *conn, company_id, owner, owner_id).await?;
        if !self.repo.delete_pricing(&mut *conn, owner, owner_id).await? {
            return Err(AppError::ResourceNotFound(format!("pricing {}", owner_id)));
        }
        Ok(())
    }
}
