//! Bagworks Core - Shared types library.
//!
//! This crate provides common types used across all Bagworks components:
//! - `server` - Storefront and admin JSON API
//! - `cli` - Command-line tools for admin accounts and data checks
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no file access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for identifiers, prices, emails, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
