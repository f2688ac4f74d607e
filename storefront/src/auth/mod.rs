//! Authentication middleware for the admin surface

pub mod admin_auth;

pub use admin_auth::{AdminCredentials, admin_auth_middleware};
