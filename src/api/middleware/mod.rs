pub mod auth;
pub mod state;
