// Models module - Database entity representations

pub mod coupon;
pub mod export_request;
pub mod order;

pub use coupon::Coupon;
pub use export_request::{ExportFilterBuilder, ExportRequest};
pub use order::Order;
