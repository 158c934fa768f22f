pub mod auth;
pub mod crm;
pub mod import;
pub mod inventory;
pub mod operations;
pub mod report;
pub mod subscription;
pub mod tenancy;
