//! Newtype IDs for type-safe entity references.
//!
//! The marketplace backend issues opaque string identifiers (`_id`). Use the
//! `define_id!` macro to create wrappers that prevent accidentally passing an
//! artist ID where an artwork ID is expected.

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use miraki_core::define_id;
/// define_id!(ShelfId);
/// define_id!(PlinthId);
///
/// let shelf = ShelfId::new("64f1c0ffee");
/// assert_eq!(shelf.as_str(), "64f1c0ffee");
///
/// // These are different types, so this won't compile:
/// // let _: PlinthId = shelf;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying identifier.
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

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Define standard entity IDs
define_id!(UserId);
define_id!(ArtistId);
define_id!(ArtworkId);
define_id!(OrderId);
define_id!(BannerId);
define_id!(CollectionId);
define_id!(AddressId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_serializes_transparently() {
        let id = ArtworkId::new("aw-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"aw-1\"");

        let parsed: ArtworkId = serde_json::from_str("\"aw-2\"").unwrap();
        assert_eq!(parsed, ArtworkId::from("aw-2"));
    }

    #[test]
    fn test_id_display_is_raw_value() {
        assert_eq!(BannerId::new("b-9").to_string(), "b-9");
    }
}
