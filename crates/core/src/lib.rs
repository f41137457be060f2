//! Kool Data Hub Core - Shared types library.
//!
//! This crate provides common types used across all Kool Data Hub components:
//! - `server` - REST API and Zoho sync scheduler
//! - `cli` - Command-line tools for migrations, one-shot syncs and user management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. Database encoding is available behind the `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, external IDs, emails and column values

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
