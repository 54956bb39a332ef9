//! Newtype wrappers for Shopify global IDs.
//!
//! Use the `define_gid!` macro to create type-safe wrappers around the
//! opaque `gid://shopify/...` identifier strings, preventing a customer id
//! from being passed where a metafield id belongs.

/// Macro to define a type-safe global-ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>` and `From<&str>` implementations
///
/// The inner value is opaque: this crate never inspects or constructs the
/// `gid://` structure, it only carries identifiers the platform handed out.
///
/// # Example
///
/// ```rust
/// # use quiz_bridge_core::define_gid;
/// define_gid!(ProductId);
/// define_gid!(VariantId);
///
/// let product = ProductId::new("gid://shopify/Product/1");
/// let variant = VariantId::new("gid://shopify/ProductVariant/1");
///
/// // These are different types, so this won't compile:
/// // let _: ProductId = variant;
/// ```
#[macro_export]
macro_rules! define_gid {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from a string value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the ID and returns its inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
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
    };
}

// Define the entity IDs this service handles
define_gid!(CustomerId);
define_gid!(MetafieldId);
