//! Orders placed by the storefront checkout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use bagworks_core::{OrderId, OrderStatus, Price, ProductId};

use crate::store::Record;

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub customer: Customer,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(
        default,
        deserialize_with = "lenient_price",
        skip_serializing_if = "Option::is_none"
    )]
    pub subtotal: Option<Price>,
    #[serde(
        default,
        deserialize_with = "lenient_price",
        skip_serializing_if = "Option::is_none"
    )]
    pub shipping_fee: Option<Price>,
    #[serde(
        default,
        deserialize_with = "lenient_price",
        skip_serializing_if = "Option::is_none"
    )]
    pub total: Option<Price>,
    /// Payment gateway reference for the checkout transaction.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record for Order {
    fn record_id(&self) -> &str {
        self.id.as_str()
    }
}

/// Shipping contact captured at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Customer {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub name: String,
    #[serde(
        default,
        deserialize_with = "lenient_price",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<Price>,
    #[serde(default = "default_quantity", deserialize_with = "lenient_quantity")]
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

const fn default_quantity() -> u32 {
    1
}

/// Accept a quantity as an integer, a whole float, or a numeric string.
///
/// Anything else falls back to the default rather than failing the order.
fn lenient_quantity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(quantity_from_value(&value).unwrap_or_else(default_quantity))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn quantity_from_value(value: &Value) -> Option<u32> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    if number.fract().abs() > f64::EPSILON || !(0.0..=f64::from(u32::MAX)).contains(&number) {
        return None;
    }

    Some(number as u32)
}

/// Accept any amount [`Price`] can parse; drop the rest as absent.
fn lenient_price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Price>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(|v| Price::try_from(v).ok()))
}

/// Order payload from the storefront.
///
/// The checkout is trusted: nothing here is required, and unknown fields
/// are dropped. The `id` is kept when supplied so the storefront can refer
/// to the order before the response arrives.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub id: Option<OrderId>,
    #[serde(default)]
    pub customer: Customer,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default, deserialize_with = "lenient_price")]
    pub subtotal: Option<Price>,
    #[serde(default, deserialize_with = "lenient_price")]
    pub shipping_fee: Option<Price>,
    #[serde(default, deserialize_with = "lenient_price")]
    pub total: Option<Price>,
    pub payment_reference: Option<String>,
    pub payment_method: Option<String>,
    pub status: Option<OrderStatus>,
    pub notes: Option<String>,
}

impl NewOrder {
    /// Build the stored order, stamping `createdAt`.
    #[must_use]
    pub fn into_order(self, id: OrderId, now: DateTime<Utc>) -> Order {
        Order {
            id,
            customer: self.customer,
            items: self.items,
            subtotal: self.subtotal,
            shipping_fee: self.shipping_fee,
            total: self.total,
            payment_reference: self.payment_reference,
            payment_method: self.payment_method,
            status: self.status.unwrap_or_default(),
            tracking_number: None,
            notes: self.notes,
            created_at: now,
            updated_at: None,
        }
    }
}

/// Admin update for an order. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    pub status: Option<OrderStatus>,
    pub tracking_number: Option<String>,
    pub notes: Option<String>,
    pub payment_reference: Option<String>,
}

impl OrderUpdate {
    /// Overwrite the provided fields and stamp `updatedAt`.
    pub fn apply(self, order: &mut Order, now: DateTime<Utc>) {
        if let Some(status) = self.status {
            order.status = status;
        }
        if let Some(tracking_number) = self.tracking_number {
            order.tracking_number = Some(tracking_number);
        }
        if let Some(notes) = self.notes {
            order.notes = Some(notes);
        }
        if let Some(payment_reference) = self.payment_reference {
            order.payment_reference = Some(payment_reference);
        }
        order.updated_at = Some(now);
    }
}
