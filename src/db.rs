pub mod tenancy_repo;
pub use tenancy_repo::TenantRepository;
pub mod crm_repo;
pub use crm_repo::CrmRepository;
pub mod operations_repo;
pub use operations_repo::OperationsRepository;
pub mod inventory_repo;
pub use inventory_repo::InventoryRepository;
pub mod subscription_repo;
pub use subscription_repo::SubscriptionRepository;
pub mod report_repo;
pub use report_repo::ReportRepository;
