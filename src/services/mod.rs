pub mod auth;
pub mod cache;
pub mod comment;
pub mod notification;
pub mod reaction;
pub mod review;
pub mod video;

use sea_orm::{DbErr, SqlErr};

/// True when the store rejected a write because of a unique index.
pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
