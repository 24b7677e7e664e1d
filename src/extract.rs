use crate::error::AppError;
use axum::extract::{FromRequest, FromRequestParts};

/// `Json` whose rejections (malformed body, wrong field types, missing
/// content type) surface as `400` through [`AppError::Validation`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// `Path` with the same treatment, so `/videos/abc` answers with the usual
/// error envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);
