//! Sentra Core - Threat Intelligence Console Backend
//!
//! This crate provides the back end for the Sentra console: multi-tenant
//! user/role administration, the dual-scope authorization engine that
//! decides which permissions and UI pages a principal may see, and the
//! reference-data catalog (ASN registries, protocols) it protects.

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod policy;
pub mod repository;
pub mod server;
pub mod service;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
