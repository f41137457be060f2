//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Password signup/login and JWT issuance
//!
//! The sync pipeline lives in [`crate::sync`].

pub mod auth;
