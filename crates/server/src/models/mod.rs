//! Domain models for the API.
//!
//! # Modules
//!
//! - [`assembly`] - Local assembly-line tables and the [`AssemblyResource`] trait
//! - [`user`] - User accounts and auth request bodies
//!
//! Synced Zoho rows have no model type: they are described by
//! [`crate::zoho::ResourceDescriptor`] and returned as JSON objects.

pub mod assembly;
pub mod user;

pub use assembly::{AssemblyResource, FieldValue};
pub use user::{LoginRequest, NewUser, User};
