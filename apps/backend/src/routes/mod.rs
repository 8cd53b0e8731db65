//! HTTP route handlers

pub mod auth;
pub mod reviews;
pub mod sessions;
pub mod users;
pub mod weaknesses;
