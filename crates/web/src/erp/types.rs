//! Wire types for the `SalesOrder` entity.
//!
//! Field names follow the ERP's PascalCase contract. Absent fields are
//! omitted when serializing so that a PUT only touches what it carries.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A wrapped scalar: `{"value": ...}`.
///
/// Null values come back as `{}` and are sent as `{"value": null}`, which
/// clears the field. When the ERP rejects a record it echoes the entity
/// with an `error` string on each offending field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Value<T> {
    #[serde(default)]
    pub value: Option<T>,
    #[serde(default, skip_serializing)]
    pub error: Option<String>,
}

impl<T> Value<T> {
    /// Wrap a value.
    pub const fn new(value: T) -> Self {
        Self {
            value: Some(value),
            error: None,
        }
    }

    /// An explicit null.
    pub const fn null() -> Self {
        Self {
            value: None,
            error: None,
        }
    }

    /// Borrow the inner value, if any.
    pub const fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }
}

impl<T> Default for Value<T> {
    fn default() -> Self {
        Self::null()
    }
}

/// Read the inner value of an optional wrapped field.
pub fn field<T>(field: Option<&Value<T>>) -> Option<&T> {
    field.and_then(Value::get)
}

/// `SalesOrder` entity as exchanged with the ERP.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesOrderEntity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(rename = "OrderType", default, skip_serializing_if = "Option::is_none")]
    pub order_type: Option<Value<String>>,
    #[serde(rename = "OrderNbr", default, skip_serializing_if = "Option::is_none")]
    pub order_nbr: Option<Value<String>>,
    #[serde(rename = "CustomerID", default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<Value<String>>,
    #[serde(rename = "CustomerOrder", default, skip_serializing_if = "Option::is_none")]
    pub customer_order: Option<Value<String>>,
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Value<String>>,
    #[serde(rename = "Status", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Value<String>>,
    #[serde(rename = "Hold", default, skip_serializing_if = "Option::is_none")]
    pub hold: Option<Value<bool>>,
    #[serde(rename = "Date", default, skip_serializing_if = "Option::is_none")]
    pub date: Option<Value<String>>,
    #[serde(rename = "RequestedOn", default, skip_serializing_if = "Option::is_none")]
    pub requested_on: Option<Value<String>>,
    #[serde(rename = "CurrencyID", default, skip_serializing_if = "Option::is_none")]
    pub currency_id: Option<Value<String>>,
    #[serde(rename = "OrderTotal", default, skip_serializing_if = "Option::is_none")]
    pub order_total: Option<Value<f64>>,
    #[serde(rename = "OrderedQty", default, skip_serializing_if = "Option::is_none")]
    pub ordered_qty: Option<Value<f64>>,
    #[serde(rename = "LastModified", default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Value<String>>,
    #[serde(rename = "Details", default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<SalesOrderDetailEntity>>,
    /// Record-level error echoed back on failure.
    #[serde(default, skip_serializing)]
    pub error: Option<String>,
}

/// `SalesOrderDetail` (order line) entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesOrderDetailEntity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    /// Remove this line; only meaningful together with `id`.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub delete: bool,
    #[serde(rename = "LineNbr", default, skip_serializing_if = "Option::is_none")]
    pub line_nbr: Option<Value<i32>>,
    #[serde(rename = "InventoryID", default, skip_serializing_if = "Option::is_none")]
    pub inventory_id: Option<Value<String>>,
    #[serde(rename = "LineDescription", default, skip_serializing_if = "Option::is_none")]
    pub line_description: Option<Value<String>>,
    #[serde(rename = "WarehouseID", default, skip_serializing_if = "Option::is_none")]
    pub warehouse_id: Option<Value<String>>,
    #[serde(rename = "UOM", default, skip_serializing_if = "Option::is_none")]
    pub uom: Option<Value<String>>,
    #[serde(rename = "OrderQty", default, skip_serializing_if = "Option::is_none")]
    pub order_qty: Option<Value<f64>>,
    #[serde(rename = "UnitPrice", default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<Value<f64>>,
    #[serde(rename = "ExtendedPrice", default, skip_serializing_if = "Option::is_none")]
    pub extended_price: Option<Value<f64>>,
    #[serde(default, skip_serializing)]
    pub error: Option<String>,
}

/// Collect every `error` string from an entity echoed in an error response.
///
/// Field errors are prefixed with their path, e.g.
/// `Details #2 / InventoryID: Item 'X' not found.`
#[must_use]
pub fn collect_field_errors(body: &serde_json::Value) -> Vec<String> {
    let mut errors = Vec::new();
    walk_errors(body, &mut Vec::new(), &mut errors);
    errors.dedup();
    errors
}

fn walk_errors(node: &serde_json::Value, path: &mut Vec<String>, out: &mut Vec<String>) {
    match node {
        serde_json::Value::Object(map) => {
            for (key, child) in map {
                match child {
                    serde_json::Value::String(message) if key == "error" => {
                        if path.is_empty() {
                            out.push(message.clone());
                        } else {
                            out.push(format!("{}: {message}", path.join(" / ")));
                        }
                    }
                    serde_json::Value::Object(_) => {
                        path.push(key.clone());
                        walk_errors(child, path, out);
                        path.pop();
                    }
                    serde_json::Value::Array(items) => {
                        for (i, item) in items.iter().enumerate() {
                            path.push(format!("{key} #{}", i + 1));
                            walk_errors(item, path, out);
                            path.pop();
                        }
                    }
                    _ => {}
                }
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                walk_errors(item, path, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_null_value() {
        let entity: SalesOrderEntity = serde_json::from_str(
            r#"{
                "id": "8a5d6f7e-0b9b-4c1e-9a6f-2f1f0c3b4d5e",
                "OrderType": {"value": "SO"},
                "OrderNbr": {"value": "000123"},
                "Description": {},
                "Hold": {"value": false},
                "OrderTotal": {"value": 125.5},
                "rowNumber": 1,
                "custom": {}
            }"#,
        )
        .unwrap();

        assert_eq!(field(entity.order_nbr.as_ref()).unwrap(), "000123");
        assert_eq!(entity.description, Some(Value::default()));
        assert_eq!(field(entity.description.as_ref()), None);
        assert_eq!(field(entity.order_total.as_ref()), Some(&125.5));
        assert!(entity.details.is_none());
    }

    #[test]
    fn test_serialize_omits_absent_fields() {
        let entity = SalesOrderEntity {
            order_type: Some(Value::new("SO".to_string())),
            customer_id: Some(Value::new("ABARTENDE".to_string())),
            details: Some(vec![
                SalesOrderDetailEntity {
                    inventory_id: Some(Value::new("AALEGO500".to_string())),
                    order_qty: Some(Value::new(2.0)),
                    ..Default::default()
                },
                SalesOrderDetailEntity {
                    id: Some(Uuid::nil()),
                    delete: true,
                    ..Default::default()
                },
            ]),
            requested_on: Some(Value::null()),
            ..Default::default()
        };

        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "OrderType": {"value": "SO"},
                "CustomerID": {"value": "ABARTENDE"},
                "RequestedOn": {"value": null},
                "Details": [
                    {"InventoryID": {"value": "AALEGO500"}, "OrderQty": {"value": 2.0}},
                    {"id": "00000000-0000-0000-0000-000000000000", "delete": true}
                ]
            })
        );
    }

    #[test]
    fn test_collect_field_errors_walks_lines() {
        let body = serde_json::json!({
            "OrderType": {"value": "SO"},
            "CustomerID": {"value": "NOPE", "error": "'Customer' cannot be found in the system."},
            "Details": [
                {"InventoryID": {"value": "AALEGO500"}},
                {"InventoryID": {"value": "BAD", "error": "Item 'BAD' not found."}}
            ],
            "error": "Inserting 'Sales Order' record raised at least one error."
        });

        let errors = collect_field_errors(&body);
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&"CustomerID: 'Customer' cannot be found in the system.".to_string()));
        assert!(errors.contains(&"Details #2 / InventoryID: Item 'BAD' not found.".to_string()));
        assert!(errors.contains(
            &"Inserting 'Sales Order' record raised at least one error.".to_string()
        ));
    }
}
