pub mod gateway;
pub mod revenue;
pub mod tenancy_service;
pub mod subscription_service;
pub mod crm_service;
pub mod operation_service;
pub mod inventory_service;
pub mod report_service;
pub mod export_service;
pub mod import_service;
