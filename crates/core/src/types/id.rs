//! Newtype IDs for type-safe entity references.
//!
//! Records are persisted as JSON and identified by whatever the storefront or
//! admin panel sent, so IDs are kept as strings. Deserialization accepts both
//! JSON strings and integers: `42` and `"42"` name the same record.

use core::fmt;

use serde::Deserializer;
use serde::de::{self, Visitor};

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize` with `#[serde(transparent)]`
/// - `Deserialize` accepting strings or integers
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
///
/// # Example
///
/// ```rust
/// # use bagworks_core::define_id;
/// define_id!(WidgetId);
/// define_id!(GadgetId);
///
/// let widget_id = WidgetId::new("1");
/// let gadget_id = GadgetId::new("1");
///
/// // These are different types, so this won't compile:
/// // let _: WidgetId = gadget_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, ::serde::Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the ID as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::core::convert::From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl ::core::convert::From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl ::core::convert::AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                $crate::types::id::deserialize_loose(deserializer).map(Self)
            }
        }
    };
}

define_id!(ProductId);
define_id!(OrderId);
define_id!(BlogPostId);

/// Deserialize an identifier from a JSON string or integer.
///
/// Used by [`define_id!`]; integral floats (`7.0`) are accepted as well since
/// some clients send every number as a double.
///
/// # Errors
///
/// Returns a deserialization error for any other JSON type.
#[doc(hidden)]
pub fn deserialize_loose<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(LooseIdVisitor)
}

struct LooseIdVisitor;

impl Visitor<'_> for LooseIdVisitor {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string or integer identifier")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(v.to_owned())
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(v.to_string())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(v.to_string())
    }

    #[allow(clippy::cast_possible_truncation, clippy::float_cmp)]
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        if v.is_finite() && v.fract() == 0.0 && v.abs() < 9.007_199_254_740_992e15 {
            Ok((v as i64).to_string())
        } else {
            Err(E::invalid_value(de::Unexpected::Float(v), &self))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_and_string_ids_are_equal() {
        let from_int: OrderId = serde_json::from_str("42").unwrap();
        let from_str: OrderId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(from_int, from_str);
        assert_eq!(from_int.as_str(), "42");
    }

    #[test]
    fn test_integral_float_is_accepted() {
        let id: ProductId = serde_json::from_str("1700000000000.0").unwrap();
        assert_eq!(id.as_str(), "1700000000000");
    }

    #[test]
    fn test_fractional_float_is_rejected() {
        assert!(serde_json::from_str::<ProductId>("1.5").is_err());
    }

    #[test]
    fn test_other_json_types_are_rejected() {
        assert!(serde_json::from_str::<BlogPostId>("true").is_err());
        assert!(serde_json::from_str::<BlogPostId>("null").is_err());
        assert!(serde_json::from_str::<BlogPostId>("{}").is_err());
    }

    #[test]
    fn test_serializes_as_string() {
        let id = BlogPostId::new("1700000000123");
        assert_eq!(
            serde_json::to_string(&id).unwrap(),
            "\"1700000000123\""
        );
    }

    #[test]
    fn test_display() {
        let id = ProductId::from("abc");
        assert_eq!(format!("{id}"), "abc");
    }
}
