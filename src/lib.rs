//! Virtual staging orchestration service.
//!
//! Accepts room photos, submits them to AI staging vendors, and makes the
//! rendered results retrievable by correlation id. The primary vendor
//! delivers results through a webhook callback; a second vendor exposes no
//! webhook and is driven by bounded status polling. Either way the output
//! images are re-hosted to storage we control before being published, and a
//! process-wide rate limiter keeps submissions inside the vendor's cooldown
//! and hourly quota.

pub mod app_state;
pub mod config;
pub mod models;
pub mod routes;
pub mod services;
