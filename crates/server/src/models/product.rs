//! Catalog products.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bagworks_core::{Price, ProductId};

use super::{ValidationError, require_text};
use crate::store::Record;

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Price in major currency units.
    pub price: Price,
    /// Primary image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Gallery image URLs.
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Bullet-point details shown on the product page.
    #[serde(default)]
    pub details: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    /// Whether the product accepts a custom-bag request.
    #[serde(default)]
    pub custom_option: bool,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record for Product {
    fn record_id(&self) -> &str {
        self.id.as_str()
    }
}

/// Payload for creating a product.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    #[serde(default)]
    pub name: String,
    pub price: Option<Price>,
    pub image: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub details: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub custom_option: bool,
}

impl NewProduct {
    /// Validate the payload and build the stored record.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the name is blank or the price is
    /// missing or not positive.
    pub fn into_product(
        self,
        id: ProductId,
        now: DateTime<Utc>,
    ) -> Result<Product, ValidationError> {
        let name = require_text("name", &self.name)?;
        let price = self
            .price
            .ok_or_else(|| ValidationError::new("price", "is required"))?;
        if !price.is_positive() {
            return Err(ValidationError::new("price", "must be greater than zero"));
        }

        Ok(Product {
            id,
            name,
            price,
            image: self.image,
            images: self.images,
            category: self.category,
            description: self.description,
            details: self.details,
            sizes: self.sizes,
            colors: self.colors,
            custom_option: self.custom_option,
            created_at: now,
            updated_at: None,
        })
    }
}

/// Partial update for a product. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub price: Option<Price>,
    pub image: Option<String>,
    pub images: Option<Vec<String>>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub details: Option<Vec<String>>,
    pub sizes: Option<Vec<String>>,
    pub colors: Option<Vec<String>>,
    pub custom_option: Option<bool>,
}

impl ProductUpdate {
    /// Check the provided fields before touching storage.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] for a blank name or a non-positive price.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            require_text("name", name)?;
        }
        if self.price.is_some_and(|p| !p.is_positive()) {
            return Err(ValidationError::new("price", "must be greater than zero"));
        }
        Ok(())
    }

    /// Overwrite the provided fields and stamp `updatedAt`.
    pub fn apply(self, product: &mut Product, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            product.name = name.trim().to_string();
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(image) = self.image {
            product.image = Some(image);
        }
        if let Some(images) = self.images {
            product.images = images;
        }
        if let Some(category) = self.category {
            product.category = Some(category);
        }
        if let Some(description) = self.description {
            product.description = Some(description);
        }
        if let Some(details) = self.details {
            product.details = details;
        }
        if let Some(sizes) = self.sizes {
            product.sizes = sizes;
        }
        if let Some(colors) = self.colors {
            product.colors = colors;
        }
        if let Some(custom_option) = self.custom_option {
            product.custom_option = custom_option;
        }
        product.updated_at = Some(now);
    }
}
