//! Local sales order model.
//!
//! `CachedSalesOrder` is the display/storage shape shared by the cache
//! tables and the pages. `SalesOrderInput` is what the create and edit forms
//! produce after validation.

use chrono::{DateTime, NaiveDate, Utc};
use order_desk_core::options::is_valid_order_type;
use order_desk_core::{CredentialId, OrderStatus, SalesOrderId, SalesOrderKey};
use rust_decimal::Decimal;
use uuid::Uuid;

/// A sales order as mirrored from the ERP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedSalesOrder {
    /// ERP business key.
    pub key: SalesOrderKey,
    /// ERP record id.
    pub erp_id: Option<Uuid>,
    /// Customer account ID.
    pub customer_id: String,
    /// Customer's own reference (PO number).
    pub customer_order: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// Current status.
    pub status: OrderStatus,
    /// Whether the order is on hold.
    pub hold: bool,
    /// Order date.
    pub order_date: Option<NaiveDate>,
    /// Requested delivery date.
    pub requested_on: Option<NaiveDate>,
    /// Currency code.
    pub currency_id: Option<String>,
    /// Order total in the order currency.
    pub order_total: Decimal,
    /// Total ordered quantity.
    pub ordered_qty: Decimal,
    /// ERP last-modified timestamp, used to skip unchanged orders on refresh.
    pub last_modified: Option<DateTime<Utc>>,
    /// Order lines, ordered by line number.
    pub lines: Vec<CachedSalesOrderLine>,
}

/// A sales order line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedSalesOrderLine {
    /// Line number within the order.
    pub line_nbr: i32,
    /// ERP record id of the line.
    pub erp_id: Option<Uuid>,
    /// Inventory item ID.
    pub inventory_id: String,
    /// Line description.
    pub description: Option<String>,
    /// Warehouse ID.
    pub warehouse_id: Option<String>,
    /// Unit of measure.
    pub uom: Option<String>,
    /// Ordered quantity.
    pub quantity: Decimal,
    /// Unit price.
    pub unit_price: Decimal,
    /// Extended price (quantity x unit price after discounts).
    pub extended_price: Decimal,
}

/// A cached order together with its local bookkeeping.
#[derive(Debug, Clone)]
pub struct StoredSalesOrder {
    /// Local row id.
    pub id: SalesOrderId,
    /// Credential the order was fetched with.
    pub credential_id: CredentialId,
    /// When the row was last written from ERP data.
    pub synced_at: DateTime<Utc>,
    /// The order itself.
    pub order: CachedSalesOrder,
}

/// Validated form data for creating or updating an order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalesOrderInput {
    /// Order type code.
    pub order_type: String,
    /// Order number. Blank on create lets the ERP assign one.
    pub order_nbr: Option<String>,
    /// Customer account ID.
    pub customer_id: String,
    /// Customer reference.
    pub customer_order: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Put the order on hold.
    pub hold: bool,
    /// Order date. Blank lets the ERP default to today.
    pub order_date: Option<NaiveDate>,
    /// Requested delivery date.
    pub requested_on: Option<NaiveDate>,
    /// Lines in form order.
    pub lines: Vec<SalesOrderLineInput>,
}

/// One submitted order line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalesOrderLineInput {
    /// ERP id of an existing line; `None` for new lines.
    pub erp_id: Option<Uuid>,
    /// Inventory item ID.
    pub inventory_id: String,
    /// Line description.
    pub description: Option<String>,
    /// Warehouse ID.
    pub warehouse_id: Option<String>,
    /// Unit of measure.
    pub uom: Option<String>,
    /// Quantity.
    pub quantity: Decimal,
    /// Unit price. `None` lets the ERP apply its price list.
    pub unit_price: Option<Decimal>,
    /// Remove this existing line from the order.
    pub delete: bool,
}

impl SalesOrderInput {
    /// Business checks applied before anything is sent to the ERP.
    ///
    /// Returns one message per problem; an empty list means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !is_valid_order_type(&self.order_type) {
            errors.push(format!("Unknown order type '{}'", self.order_type.trim()));
        }
        if self.customer_id.trim().is_empty() {
            errors.push("Customer is required".to_string());
        }
        if let (Some(ordered), Some(requested)) = (self.order_date, self.requested_on)
            && requested < ordered
        {
            errors.push("Requested date cannot be before the order date".to_string());
        }

        let active: Vec<_> = self.lines.iter().filter(|l| !l.delete).collect();
        if active.is_empty() {
            errors.push("At least one line is required".to_string());
        }
        for (i, line) in active.iter().enumerate() {
            let n = i + 1;
            if line.inventory_id.trim().is_empty() {
                errors.push(format!("Line {n}: inventory ID is required"));
            }
            if line.quantity <= Decimal::ZERO {
                errors.push(format!("Line {n}: quantity must be greater than zero"));
            }
            if line.unit_price.is_some_and(|p| p < Decimal::ZERO) {
                errors.push(format!("Line {n}: unit price cannot be negative"));
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(inventory_id: &str, quantity: i64) -> SalesOrderLineInput {
        SalesOrderLineInput {
            inventory_id: inventory_id.to_string(),
            quantity: Decimal::from(quantity),
            ..Default::default()
        }
    }

    fn input() -> SalesOrderInput {
        SalesOrderInput {
            order_type: "SO".to_string(),
            customer_id: "ABARTENDE".to_string(),
            lines: vec![line("AALEGO500", 2)],
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_input() {
        assert!(input().validate().is_empty());
    }

    #[test]
    fn test_requires_customer_and_known_type() {
        let input = SalesOrderInput {
            order_type: "ZZ".to_string(),
            customer_id: " ".to_string(),
            ..input()
        };
        assert_eq!(
            input.validate(),
            vec![
                "Unknown order type 'ZZ'".to_string(),
                "Customer is required".to_string()
            ]
        );
    }

    #[test]
    fn test_deleted_lines_do_not_count() {
        let mut input = input();
        input.lines[0].delete = true;
        assert_eq!(
            input.validate(),
            vec!["At least one line is required".to_string()]
        );
    }

    #[test]
    fn test_line_errors_are_numbered() {
        let input = SalesOrderInput {
            lines: vec![line("AAA", 1), line("", 0)],
            ..input()
        };
        assert_eq!(
            input.validate(),
            vec![
                "Line 2: inventory ID is required".to_string(),
                "Line 2: quantity must be greater than zero".to_string()
            ]
        );
    }

    #[test]
    fn test_requested_before_order_date() {
        let input = SalesOrderInput {
            order_date: NaiveDate::from_ymd_opt(2026, 3, 10),
            requested_on: NaiveDate::from_ymd_opt(2026, 3, 1),
            ..input()
        };
        assert_eq!(input.validate().len(), 1);
    }
}
