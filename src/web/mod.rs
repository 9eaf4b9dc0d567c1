//! The web module for handling the Axum API.
//! This file declares the other files in this directory as sub-modules.

pub mod api;
pub mod cors;
pub mod error;
pub mod extract;
pub mod login_rate_limit;
pub mod models;
pub mod rate_limiter;
