//! Conversions between ERP wire entities and local models.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use order_desk_core::{OrderKeyError, OrderStatus, SalesOrderKey};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use thiserror::Error;

use super::types::{SalesOrderDetailEntity, SalesOrderEntity, Value, field};
use crate::models::{CachedSalesOrder, CachedSalesOrderLine, SalesOrderInput, SalesOrderLineInput};

/// Scale used for every stored amount and quantity.
const AMOUNT_SCALE: u32 = 4;

/// Errors converting an ERP entity into a local order.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversionError {
    #[error("ERP record is missing {0}")]
    MissingField(&'static str),

    #[error("ERP record has an invalid key: {0}")]
    InvalidKey(#[from] OrderKeyError),

    #[error("ERP record has an invalid {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

fn required_text(
    value: Option<&Value<String>>,
    name: &'static str,
) -> Result<String, ConversionError> {
    field(value)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or(ConversionError::MissingField(name))
}

fn optional_text(value: Option<&Value<String>>) -> Option<String> {
    field(value)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn amount(value: Option<&Value<f64>>, name: &'static str) -> Result<Decimal, ConversionError> {
    match field(value) {
        None => Ok(Decimal::ZERO),
        Some(v) => Decimal::from_f64(*v)
            .map(|d| d.round_dp(AMOUNT_SCALE).normalize())
            .ok_or_else(|| ConversionError::InvalidValue {
                field: name,
                value: v.to_string(),
            }),
    }
}

/// Parse an ERP date. Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS[.fff]`
/// and RFC 3339.
#[must_use]
pub fn parse_erp_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
}

/// Parse an ERP timestamp. Timestamps without an offset are taken as UTC.
#[must_use]
pub fn parse_erp_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.and_utc())
        })
}

fn date(value: Option<&Value<String>>, name: &'static str) -> Result<Option<NaiveDate>, ConversionError> {
    match optional_text(value) {
        None => Ok(None),
        Some(s) => parse_erp_date(&s)
            .map(Some)
            .ok_or(ConversionError::InvalidValue { field: name, value: s }),
    }
}

/// Convert an ERP entity into a cache row.
///
/// Lines are ordered by `LineNbr`. Lines with a missing or repeated number
/// get the next free number after the highest one seen, in wire order.
///
/// # Errors
///
/// Returns `ConversionError` if a key field or the customer is missing, or a
/// date or amount cannot be parsed.
pub fn to_cached_order(entity: &SalesOrderEntity) -> Result<CachedSalesOrder, ConversionError> {
    let order_type = required_text(entity.order_type.as_ref(), "OrderType")?;
    let order_nbr = required_text(entity.order_nbr.as_ref(), "OrderNbr")?;
    let key = SalesOrderKey::parse(&order_type, &order_nbr)?;

    let last_modified = match optional_text(entity.last_modified.as_ref()) {
        None => None,
        Some(s) => Some(parse_erp_timestamp(&s).ok_or(ConversionError::InvalidValue {
            field: "LastModified",
            value: s,
        })?),
    };

    let lines = entity
        .details
        .as_deref()
        .map(to_cached_lines)
        .transpose()?
        .unwrap_or_default();

    Ok(CachedSalesOrder {
        key,
        erp_id: entity.id,
        customer_id: required_text(entity.customer_id.as_ref(), "CustomerID")?,
        customer_order: optional_text(entity.customer_order.as_ref()),
        description: optional_text(entity.description.as_ref()),
        status: optional_text(entity.status.as_ref())
            .map(|s| OrderStatus::from_erp_str(&s))
            .unwrap_or_default(),
        hold: field(entity.hold.as_ref()).copied().unwrap_or(false),
        order_date: date(entity.date.as_ref(), "Date")?,
        requested_on: date(entity.requested_on.as_ref(), "RequestedOn")?,
        currency_id: optional_text(entity.currency_id.as_ref()),
        order_total: amount(entity.order_total.as_ref(), "OrderTotal")?,
        ordered_qty: amount(entity.ordered_qty.as_ref(), "OrderedQty")?,
        last_modified,
        lines,
    })
}

fn to_cached_lines(
    details: &[SalesOrderDetailEntity],
) -> Result<Vec<CachedSalesOrderLine>, ConversionError> {
    let mut next = details
        .iter()
        .filter_map(|d| field(d.line_nbr.as_ref()).copied())
        .filter(|n| *n > 0)
        .max()
        .unwrap_or(0);
    let mut used = HashSet::new();
    let mut lines = Vec::with_capacity(details.len());

    for detail in details {
        let line_nbr = match field(detail.line_nbr.as_ref()).copied() {
            Some(n) if n > 0 && used.insert(n) => n,
            _ => {
                next += 1;
                used.insert(next);
                next
            }
        };

        lines.push(CachedSalesOrderLine {
            line_nbr,
            erp_id: detail.id,
            inventory_id: required_text(detail.inventory_id.as_ref(), "InventoryID")?,
            description: optional_text(detail.line_description.as_ref()),
            warehouse_id: optional_text(detail.warehouse_id.as_ref()),
            uom: optional_text(detail.uom.as_ref()),
            quantity: amount(detail.order_qty.as_ref(), "OrderQty")?,
            unit_price: amount(detail.unit_price.as_ref(), "UnitPrice")?,
            extended_price: amount(detail.extended_price.as_ref(), "ExtendedPrice")?,
        });
    }

    lines.sort_by_key(|line| line.line_nbr);
    Ok(lines)
}

fn text_value(value: &str) -> Value<String> {
    Value::new(value.trim().to_string())
}

/// Optional text for a PUT. Blank values are omitted on create and sent as
/// empty strings on update so the ERP clears the field.
fn optional_text_value(value: Option<&str>, updating: bool) -> Option<Value<String>> {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => Some(Value::new(s.to_string())),
        None if updating => Some(Value::new(String::new())),
        None => None,
    }
}

fn decimal_value(value: Decimal) -> Option<Value<f64>> {
    value.to_f64().map(Value::new)
}

fn date_value(value: Option<NaiveDate>) -> Option<Value<String>> {
    value.map(|d| Value::new(d.format("%Y-%m-%d").to_string()))
}

/// Optional date for a PUT. Blank dates are omitted on create and sent as
/// null on update so the ERP clears the field.
fn optional_date_value(value: Option<NaiveDate>, updating: bool) -> Option<Value<String>> {
    match value {
        Some(_) => date_value(value),
        None if updating => Some(Value::null()),
        None => None,
    }
}

/// Build the PUT body for a create (`key` is `None`) or an update.
///
/// On create the order number is only sent if the user typed one; otherwise
/// the ERP numbering sequence assigns it.
#[must_use]
pub fn to_entity(input: &SalesOrderInput, key: Option<&SalesOrderKey>) -> SalesOrderEntity {
    let updating = key.is_some();
    let (order_type, order_nbr) = match key {
        Some(key) => (
            Value::new(key.order_type.code().to_string()),
            Some(Value::new(key.order_nbr.clone())),
        ),
        None => (
            Value::new(input.order_type.trim().to_uppercase()),
            input
                .order_nbr
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| Value::new(s.to_string())),
        ),
    };

    let details = input.lines.iter().filter_map(to_detail).collect();

    SalesOrderEntity {
        order_type: Some(order_type),
        order_nbr,
        customer_id: Some(text_value(&input.customer_id)),
        customer_order: optional_text_value(input.customer_order.as_deref(), updating),
        description: optional_text_value(input.description.as_deref(), updating),
        hold: Some(Value::new(input.hold)),
        date: date_value(input.order_date),
        requested_on: optional_date_value(input.requested_on, updating),
        details: Some(details),
        ..Default::default()
    }
}

fn to_detail(line: &SalesOrderLineInput) -> Option<SalesOrderDetailEntity> {
    if line.delete {
        return line.erp_id.map(|id| SalesOrderDetailEntity {
            id: Some(id),
            delete: true,
            ..Default::default()
        });
    }

    Some(SalesOrderDetailEntity {
        id: line.erp_id,
        inventory_id: Some(text_value(&line.inventory_id)),
        line_description: optional_text_value(line.description.as_deref(), line.erp_id.is_some()),
        warehouse_id: optional_text_value(line.warehouse_id.as_deref(), false),
        uom: optional_text_value(line.uom.as_deref(), false),
        order_qty: decimal_value(line.quantity),
        unit_price: line.unit_price.and_then(decimal_value),
        ..Default::default()
    })
}

/// Prefill an edit form from a cached order.
#[must_use]
pub fn to_input(order: &CachedSalesOrder) -> SalesOrderInput {
    SalesOrderInput {
        order_type: order.key.order_type.code().to_string(),
        order_nbr: Some(order.key.order_nbr.clone()),
        customer_id: order.customer_id.clone(),
        customer_order: order.customer_order.clone(),
        description: order.description.clone(),
        hold: order.hold,
        order_date: order.order_date,
        requested_on: order.requested_on,
        lines: order
            .lines
            .iter()
            .map(|line| SalesOrderLineInput {
                erp_id: line.erp_id,
                inventory_id: line.inventory_id.clone(),
                description: line.description.clone(),
                warehouse_id: line.warehouse_id.clone(),
                uom: line.uom.clone(),
                quantity: line.quantity,
                unit_price: Some(line.unit_price),
                delete: false,
            })
            .collect(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use order_desk_core::OrderType;
    use uuid::Uuid;

    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn wire_order() -> SalesOrderEntity {
        serde_json::from_value(serde_json::json!({
            "id": "8a5d6f7e-0b9b-4c1e-9a6f-2f1f0c3b4d5e",
            "OrderType": {"value": "SO"},
            "OrderNbr": {"value": "000123"},
            "CustomerID": {"value": "ABARTENDE"},
            "CustomerOrder": {},
            "Description": {"value": "  Spring restock "},
            "Status": {"value": "On Hold"},
            "Hold": {"value": true},
            "Date": {"value": "2026-03-02T00:00:00+02:00"},
            "RequestedOn": {"value": "2026-03-09T00:00:00"},
            "CurrencyID": {"value": "USD"},
            "OrderTotal": {"value": 1234.56789},
            "OrderedQty": {"value": 3.0},
            "LastModified": {"value": "2026-03-02T10:15:30.123+00:00"},
            "Details": [
                {"LineNbr": {"value": 2}, "InventoryID": {"value": "BBB"}, "OrderQty": {"value": 1.0}},
                {"LineNbr": {"value": 1}, "InventoryID": {"value": "AAA"}, "OrderQty": {"value": 2.0},
                 "UnitPrice": {"value": 10.5}, "ExtendedPrice": {"value": 21.0}}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_parse_erp_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(parse_erp_date("2026-03-02"), Some(expected));
        assert_eq!(parse_erp_date("2026-03-02T00:00:00"), Some(expected));
        assert_eq!(parse_erp_date("2026-03-02T00:00:00.000+02:00"), Some(expected));
        assert_eq!(parse_erp_date("03/02/2026"), None);
    }

    #[test]
    fn test_parse_erp_timestamp_without_offset_is_utc() {
        let ts = parse_erp_timestamp("2026-03-02T10:15:30.5").unwrap();
        assert_eq!(ts.to_rfc3339(), "2026-03-02T10:15:30.500+00:00");
    }

    #[test]
    fn test_to_cached_order() {
        let order = to_cached_order(&wire_order()).unwrap();

        assert_eq!(order.key, SalesOrderKey::parse("SO", "000123").unwrap());
        assert_eq!(order.customer_order, None);
        assert_eq!(order.description.as_deref(), Some("Spring restock"));
        assert_eq!(order.status, OrderStatus::OnHold);
        assert!(order.hold);
        assert_eq!(order.order_date, NaiveDate::from_ymd_opt(2026, 3, 2));
        assert_eq!(order.requested_on, NaiveDate::from_ymd_opt(2026, 3, 9));
        assert_eq!(order.order_total, dec("1234.5679"));
        assert_eq!(order.ordered_qty, dec("3"));
        assert!(order.last_modified.is_some());

        let inventory: Vec<_> = order.lines.iter().map(|l| l.inventory_id.as_str()).collect();
        assert_eq!(inventory, vec!["AAA", "BBB"]);
        assert_eq!(order.lines[0].unit_price, dec("10.5"));
        assert_eq!(order.lines[1].unit_price, Decimal::ZERO);
    }

    #[test]
    fn test_to_cached_order_requires_key_and_customer() {
        let mut entity = wire_order();
        entity.order_nbr = Some(Value::default());
        assert_eq!(
            to_cached_order(&entity),
            Err(ConversionError::MissingField("OrderNbr"))
        );

        let mut entity = wire_order();
        entity.customer_id = None;
        assert_eq!(
            to_cached_order(&entity),
            Err(ConversionError::MissingField("CustomerID"))
        );
    }

    #[test]
    fn test_missing_status_defaults_to_open() {
        let mut entity = wire_order();
        entity.status = None;
        assert_eq!(to_cached_order(&entity).unwrap().status, OrderStatus::Open);
    }

    #[test]
    fn test_line_numbers_filled_in() {
        let mut entity = wire_order();
        entity.details = Some(vec![
            SalesOrderDetailEntity {
                inventory_id: Some(Value::new("NEW".to_string())),
                ..Default::default()
            },
            SalesOrderDetailEntity {
                line_nbr: Some(Value::new(3)),
                inventory_id: Some(Value::new("THREE".to_string())),
                ..Default::default()
            },
            SalesOrderDetailEntity {
                line_nbr: Some(Value::new(3)),
                inventory_id: Some(Value::new("DUP".to_string())),
                ..Default::default()
            },
        ]);

        let order = to_cached_order(&entity).unwrap();
        let numbered: Vec<_> = order
            .lines
            .iter()
            .map(|l| (l.line_nbr, l.inventory_id.as_str()))
            .collect();
        assert_eq!(numbered, vec![(3, "THREE"), (4, "NEW"), (5, "DUP")]);
    }

    #[test]
    fn test_to_entity_create_omits_blank_number() {
        let input = SalesOrderInput {
            order_type: "so".to_string(),
            order_nbr: Some("  ".to_string()),
            customer_id: "ABARTENDE".to_string(),
            order_date: NaiveDate::from_ymd_opt(2026, 3, 2),
            lines: vec![SalesOrderLineInput {
                inventory_id: "AAA".to_string(),
                quantity: dec("2"),
                ..Default::default()
            }],
            ..Default::default()
        };

        let json = serde_json::to_value(to_entity(&input, None)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "OrderType": {"value": "SO"},
                "CustomerID": {"value": "ABARTENDE"},
                "Hold": {"value": false},
                "Date": {"value": "2026-03-02"},
                "Details": [{"InventoryID": {"value": "AAA"}, "OrderQty": {"value": 2.0}}]
            })
        );
    }

    #[test]
    fn test_to_entity_update_carries_key_and_deletes() {
        let key = SalesOrderKey::parse("SO", "000123").unwrap();
        let kept = Uuid::from_u128(1);
        let removed = Uuid::from_u128(2);
        let input = SalesOrderInput {
            order_type: "SO".to_string(),
            customer_id: "ABARTENDE".to_string(),
            lines: vec![
                SalesOrderLineInput {
                    erp_id: Some(kept),
                    inventory_id: "AAA".to_string(),
                    quantity: dec("1"),
                    unit_price: Some(dec("9.99")),
                    ..Default::default()
                },
                SalesOrderLineInput {
                    erp_id: Some(removed),
                    inventory_id: "BBB".to_string(),
                    delete: true,
                    ..Default::default()
                },
                SalesOrderLineInput {
                    inventory_id: "CCC".to_string(),
                    delete: true,
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        let entity = to_entity(&input, Some(&key));
        assert_eq!(field(entity.order_nbr.as_ref()).unwrap(), "000123");
        assert_eq!(field(entity.description.as_ref()).unwrap(), "");
        assert_eq!(entity.requested_on, Some(Value::null()));
        assert!(entity.date.is_none());

        let details = entity.details.unwrap();
        assert_eq!(details.len(), 2);
        assert_eq!(details[0].id, Some(kept));
        assert_eq!(field(details[0].unit_price.as_ref()), Some(&9.99));
        assert!(details[1].delete);
        assert_eq!(details[1].id, Some(removed));
        assert!(details[1].inventory_id.is_none());
    }

    #[test]
    fn test_blank_requested_date_clears_on_update_only() {
        let key = SalesOrderKey::parse("SO", "000123").unwrap();
        let input = SalesOrderInput {
            order_type: "SO".to_string(),
            customer_id: "ABARTENDE".to_string(),
            ..Default::default()
        };

        let update = serde_json::to_value(to_entity(&input, Some(&key))).unwrap();
        assert_eq!(update["RequestedOn"], serde_json::json!({"value": null}));

        let create = serde_json::to_value(to_entity(&input, None)).unwrap();
        assert!(create.get("RequestedOn").is_none());

        let dated = SalesOrderInput {
            requested_on: NaiveDate::from_ymd_opt(2026, 3, 9),
            ..input
        };
        let update = serde_json::to_value(to_entity(&dated, Some(&key))).unwrap();
        assert_eq!(update["RequestedOn"], serde_json::json!({"value": "2026-03-09"}));
    }

    #[test]
    fn test_to_input_prefills_form() {
        let order = to_cached_order(&wire_order()).unwrap();
        let input = to_input(&order);

        assert_eq!(input.order_type, OrderType::SalesOrder.code());
        assert_eq!(input.order_nbr.as_deref(), Some("000123"));
        assert_eq!(input.lines.len(), 2);
        assert_eq!(input.lines[0].unit_price, Some(dec("10.5")));
        assert!(input.lines.iter().all(|l| !l.delete));
    }
}
