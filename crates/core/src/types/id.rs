//! Typed row IDs for the local database.
//!
//! ERP records are addressed by [`SalesOrderKey`](super::SalesOrderKey);
//! these IDs only name rows in the Order Desk tables.

/// Declare an `i32` row ID newtype.
///
/// With the `postgres` feature the type binds and decodes as a plain
/// `INTEGER` column.
///
/// ```rust
/// # use order_desk_core::row_id;
/// row_id!(
///     /// Example row.
///     ExampleId
/// );
/// assert_eq!(ExampleId::new(3).as_i32(), 3);
/// ```
#[macro_export]
macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            ::serde::Serialize, ::serde::Deserialize,
        )]
        #[cfg_attr(feature = "postgres", derive(::sqlx::Type), sqlx(transparent))]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn as_i32(self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

row_id!(
    /// Row in `erp_credentials`.
    CredentialId
);
row_id!(
    /// Row in `sales_orders`.
    SalesOrderId
);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions_and_display() {
        let id = CredentialId::new(42);
        assert_eq!(id.as_i32(), 42);
        assert_eq!(i32::from(id), 42);
        assert_eq!(CredentialId::from(42), id);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_serializes_as_bare_number() {
        assert_eq!(serde_json::to_string(&SalesOrderId::new(7)).unwrap(), "7");
        let back: SalesOrderId = serde_json::from_str("7").unwrap();
        assert_eq!(back, SalesOrderId::new(7));
    }
}
