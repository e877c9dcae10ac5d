//! Sales order status as reported by the ERP.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sales order status.
///
/// The ERP reports statuses as display strings ("On Hold", "Back Order").
/// Unrecognized statuses are kept verbatim in [`OrderStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum OrderStatus {
    #[default]
    Open,
    OnHold,
    PendingApproval,
    BackOrder,
    Shipping,
    Completed,
    Cancelled,
    Other(String),
}

impl OrderStatus {
    /// The status string exactly as the ERP displays it.
    #[must_use]
    pub fn as_erp_str(&self) -> &str {
        match self {
            Self::Open => "Open",
            Self::OnHold => "On Hold",
            Self::PendingApproval => "Pending Approval",
            Self::BackOrder => "Back Order",
            Self::Shipping => "Shipping",
            Self::Completed => "Completed",
            Self::Cancelled => "Canceled",
            Self::Other(s) => s,
        }
    }

    /// Parse a status string from the ERP or from a filter query.
    ///
    /// Matching ignores case, spaces and underscores, and accepts both
    /// "Canceled" and "Cancelled".
    #[must_use]
    pub fn from_erp_str(s: &str) -> Self {
        let normalized: String = s
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "open" => Self::Open,
            "onhold" | "hold" => Self::OnHold,
            "pendingapproval" => Self::PendingApproval,
            "backorder" => Self::BackOrder,
            "shipping" => Self::Shipping,
            "completed" => Self::Completed,
            "canceled" | "cancelled" => Self::Cancelled,
            _ => Self::Other(s.trim().to_string()),
        }
    }

    /// Whether the ERP still allows editing an order in this status.
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(
            self,
            Self::Open | Self::OnHold | Self::PendingApproval | Self::BackOrder
        )
    }

    /// CSS badge class used on list and detail pages.
    #[must_use]
    pub const fn badge_class(&self) -> &'static str {
        match self {
            Self::Open => "badge badge-info",
            Self::OnHold | Self::PendingApproval => "badge badge-warning",
            Self::BackOrder => "badge badge-return",
            Self::Shipping => "badge badge-info",
            Self::Completed => "badge badge-success",
            Self::Cancelled => "badge badge-destructive",
            Self::Other(_) => "badge badge-neutral",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_erp_str())
    }
}

impl From<String> for OrderStatus {
    fn from(s: String) -> Self {
        Self::from_erp_str(&s)
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        status.as_erp_str().to_string()
    }
}
