//! Subcommand implementations.

pub mod admin;
pub mod data;
pub mod db;
