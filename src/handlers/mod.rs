pub mod auth;
pub mod comment;
pub mod notification;
pub mod reaction;
pub mod review;
pub mod video;
