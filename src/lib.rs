//! itemvault: a small multi-user item registry.
//!
//! The record store owns users and items, the token service signs identities, and the
//! authorization gate guards every request before it reaches the store.

pub mod auth;
pub mod config;
pub mod store;
pub mod web;

pub use itemvault_shared::{BcryptHasher, CredentialHasher, HashError, Item, Role, User};
