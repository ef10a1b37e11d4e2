use axum::extract::FromRequest;

use crate::error::AppError;

/// `axum::Json` whose rejections render as `AppError`, so a malformed body
/// still gets the `{"error": ...}` shape.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
