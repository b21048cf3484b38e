//! JSON body extractor with `AppError` rejections.

use axum::extract::FromRequest;

use crate::error::AppError;

/// Like [`axum::Json`], but a missing or malformed body becomes a 400 with
/// the usual `{"error": ...}` body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);
