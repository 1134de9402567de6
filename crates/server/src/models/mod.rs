//! Domain models persisted in JSON collections.
//!
//! Every entity has an explicit schema. Creates go through a `New*` payload
//! that is validated before a record is built, and updates go through a
//! `*Update` payload whose present fields overwrite the stored record while
//! absent fields are left alone.

pub mod admin;
pub mod blog_post;
pub mod order;
pub mod product;
pub mod session;

pub use admin::AdminAccount;
pub use blog_post::{BlogPost, BlogPostUpdate, NewBlogPost};
pub use order::{Customer, NewOrder, Order, OrderItem, OrderUpdate};
pub use product::{NewProduct, Product, ProductUpdate};
pub use session::{CurrentAdmin, keys as session_keys};

/// A payload field failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// camelCase name of the offending field.
    pub field: &'static str,
    /// Human-readable reason.
    pub message: String,
}

impl ValidationError {
    pub(crate) fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Trim a required text field, rejecting blank values.
pub(crate) fn require_text(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(field, "is required"));
    }
    Ok(trimmed.to_string())
}
