use axum::extract::FromRequest;

use crate::error::AppError;

/// `Json` extractor whose rejections render through `AppError`, so malformed
/// bodies still answer with `{success: false, message}`.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
