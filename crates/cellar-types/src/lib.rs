//! Foundation types for the Cellar blob storage engine.
//!
//! This crate provides the identifier and identity types shared by the rest
//! of the Cellar workspace. It performs no I/O.
//!
//! # Key Types
//!
//! - [`OwnerKey`] — Fixed-width 8-byte identifier minted by the external
//!   persistent-object system that owns a blob
//! - [`Principal`] — The calling identity, as resolved by the host
//!   application (anonymous or a stable per-user key)

pub mod error;
pub mod owner;
pub mod principal;

pub use error::TypeError;
pub use owner::OwnerKey;
pub use principal::Principal;
