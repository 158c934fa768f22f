pub mod crm;
pub mod imports;
pub mod inventory;
pub mod operations;
pub mod reports;
pub mod subscription;
pub mod tenancy;
