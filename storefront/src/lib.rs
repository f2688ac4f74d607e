//! storefront: order backend for a small apparel shop
//!
//! - Opens Stripe hosted checkout sessions for validated carts
//! - Reconciles signed Stripe webhooks into orders with exactly-once
//!   stock decrements
//! - Serves order lookup and a Basic Auth admin API

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod services;
pub mod state;
pub mod stripe;

pub use api::create_router;
