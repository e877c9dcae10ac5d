//! Sales order identity: the ERP order type and the business key.
//!
//! The ERP addresses a sales order by `(OrderType, OrderNbr)`. Both parts
//! appear in page URLs (`/sales-orders/SO/000123`) and in ERP key paths, so
//! they are validated once here instead of at every call site.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum length of an order number in the ERP.
const MAX_ORDER_NBR_LEN: usize = 15;

/// ERP sales order type code.
///
/// Unknown codes are preserved as [`OrderType::Other`] so that orders created
/// with custom types in the ERP still round-trip through the cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum OrderType {
    /// `SO` - regular sales order.
    #[default]
    SalesOrder,
    /// `QT` - quote.
    Quote,
    /// `RC` - return for credit.
    ReturnForCredit,
    /// `CM` - credit memo.
    CreditMemo,
    /// `IN` - invoice.
    Invoice,
    /// Any other code configured in the ERP.
    Other(String),
}

impl OrderType {
    /// The ERP code for this order type.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::SalesOrder => "SO",
            Self::Quote => "QT",
            Self::ReturnForCredit => "RC",
            Self::CreditMemo => "CM",
            Self::Invoice => "IN",
            Self::Other(code) => code,
        }
    }

    /// Human-readable name used on pages.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::SalesOrder => "Sales Order",
            Self::Quote => "Quote",
            Self::ReturnForCredit => "Return for Credit",
            Self::CreditMemo => "Credit Memo",
            Self::Invoice => "Invoice",
            Self::Other(code) => code,
        }
    }

    fn from_code(code: &str) -> Self {
        let code = code.trim().to_uppercase();
        match code.as_str() {
            "SO" => Self::SalesOrder,
            "QT" => Self::Quote,
            "RC" => Self::ReturnForCredit,
            "CM" => Self::CreditMemo,
            "IN" => Self::Invoice,
            _ => Self::Other(code),
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for OrderType {
    type Err = OrderKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(OrderKeyError::EmptyOrderType);
        }
        if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) || trimmed.len() > 2 {
            return Err(OrderKeyError::InvalidOrderType(trimmed.to_string()));
        }
        Ok(Self::from_code(trimmed))
    }
}

impl From<String> for OrderType {
    fn from(code: String) -> Self {
        Self::from_code(&code)
    }
}

impl From<OrderType> for String {
    fn from(order_type: OrderType) -> Self {
        order_type.code().to_string()
    }
}

/// Errors produced while parsing a sales order key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderKeyError {
    /// The order type was blank.
    #[error("order type is required")]
    EmptyOrderType,
    /// The order type is not a 1-2 character alphanumeric code.
    #[error("invalid order type: {0}")]
    InvalidOrderType(String),
    /// The order number was blank.
    #[error("order number is required")]
    EmptyOrderNbr,
    /// The order number contains characters that cannot be used in a key path.
    #[error("invalid order number: {0}")]
    InvalidOrderNbr(String),
}

/// The ERP business key of a sales order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SalesOrderKey {
    /// Order type code.
    pub order_type: OrderType,
    /// Order number, unique within the order type.
    pub order_nbr: String,
}

impl SalesOrderKey {
    /// Build a key from its raw parts.
    ///
    /// The order number is trimmed. Slashes, control characters and numbers
    /// longer than the ERP allows are rejected.
    ///
    /// # Errors
    ///
    /// Returns `OrderKeyError` if either part is blank or malformed.
    pub fn parse(order_type: &str, order_nbr: &str) -> Result<Self, OrderKeyError> {
        let order_type: OrderType = order_type.parse()?;
        let order_nbr = order_nbr.trim();
        if order_nbr.is_empty() {
            return Err(OrderKeyError::EmptyOrderNbr);
        }
        if order_nbr.len() > MAX_ORDER_NBR_LEN
            || order_nbr.chars().any(|c| c == '/' || c.is_control())
        {
            return Err(OrderKeyError::InvalidOrderNbr(order_nbr.to_string()));
        }
        Ok(Self {
            order_type,
            order_nbr: order_nbr.to_string(),
        })
    }
}

impl fmt::Display for SalesOrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.order_type, self.order_nbr)
    }
}
