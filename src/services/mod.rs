// Services module - Business logic

pub mod coupons;
pub mod export_client;
pub mod registry_export;
