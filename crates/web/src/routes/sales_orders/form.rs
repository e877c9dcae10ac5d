//! Sales order form parsing.
//!
//! The create and edit forms post header fields by name and line rows as
//! indexed fields:
//!
//! ```text
//! customer_id=ABARTENDE&line_inventory_id_0=AALEGO500&line_quantity_0=2
//! ```
//!
//! Rows may arrive with gaps in their indices. They are kept in index order
//! and renumbered from zero when the form is rendered again.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::NaiveDate;
use order_desk_core::options::{ORDER_TYPE_OPTIONS, UOM_OPTIONS};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use super::types::{OptionView, option_views};
use crate::models::{SalesOrderInput, SalesOrderLineInput};

/// Form fields that could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .errors.join("; "))]
pub struct FormError {
    pub errors: Vec<String>,
}

/// What the submit button asked for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormAction {
    /// Send the order to the ERP.
    #[default]
    Save,
    /// Re-render the form with extra blank line rows.
    AddLines,
}

/// Raw sales order form, as typed.
#[derive(Debug, Clone, Default)]
pub struct OrderForm {
    pub action: FormAction,
    pub order_type: String,
    pub order_nbr: String,
    pub customer_id: String,
    pub customer_order: String,
    pub description: String,
    pub hold: bool,
    pub order_date: String,
    pub requested_on: String,
    pub lines: Vec<LineForm>,
}

/// One raw line row.
#[derive(Debug, Clone, Default)]
pub struct LineForm {
    pub index: usize,
    pub erp_id: String,
    pub inventory_id: String,
    pub description: String,
    pub warehouse_id: String,
    pub uom: String,
    pub quantity: String,
    pub unit_price: String,
    pub delete: bool,
}

fn is_checked(value: &str) -> bool {
    matches!(value.trim(), "on" | "true" | "1" | "yes")
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_date(value: &str, label: &str, errors: &mut Vec<String>) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.push(format!("{label} must be a date (YYYY-MM-DD)"));
            None
        }
    }
}

fn parse_decimal(value: &str) -> Result<Option<Decimal>, ()> {
    let value = value.trim().replace(',', "");
    if value.is_empty() {
        return Ok(None);
    }
    Decimal::from_str(&value).map(Some).map_err(|_| ())
}

impl LineForm {
    /// A row with nothing typed into it.
    fn is_blank(&self) -> bool {
        self.erp_id.trim().is_empty()
            && self.inventory_id.trim().is_empty()
            && self.description.trim().is_empty()
            && self.warehouse_id.trim().is_empty()
            && self.quantity.trim().is_empty()
            && self.unit_price.trim().is_empty()
    }

    fn set(&mut self, field: &str, value: String) {
        match field {
            "erp_id" => self.erp_id = value,
            "inventory_id" => self.inventory_id = value,
            "description" => self.description = value,
            "warehouse_id" => self.warehouse_id = value,
            "uom" => self.uom = value,
            "quantity" => self.quantity = value,
            "unit_price" => self.unit_price = value,
            "delete" => self.delete = is_checked(&value),
            _ => {}
        }
    }

    /// Unit of measure drop-down. Units the ERP uses that are not in the
    /// standard list are kept as an extra option.
    #[must_use]
    pub fn uom_options(&self) -> Vec<OptionView> {
        let mut options = vec![OptionView {
            value: String::new(),
            label: "(default)".to_string(),
            selected: self.uom.trim().is_empty(),
        }];
        options.extend(option_views(UOM_OPTIONS, &self.uom));
        let current = self.uom.trim();
        if !current.is_empty() && !options.iter().any(|o| o.selected) {
            options.push(OptionView {
                value: current.to_string(),
                label: current.to_string(),
                selected: true,
            });
        }
        options
    }
}

impl OrderForm {
    /// Read a submitted form from its raw name/value pairs.
    #[must_use]
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut form = Self::default();
        let mut rows: BTreeMap<usize, LineForm> = BTreeMap::new();

        for (name, value) in pairs {
            if let Some(rest) = name.strip_prefix("line_") {
                let Some((field, index)) = rest.rsplit_once('_') else {
                    continue;
                };
                let Ok(index) = index.parse::<usize>() else {
                    continue;
                };
                rows.entry(index).or_default().set(field, value);
                continue;
            }

            match name.as_str() {
                "action" => {
                    form.action = if value == "add_lines" {
                        FormAction::AddLines
                    } else {
                        FormAction::Save
                    };
                }
                "order_type" => form.order_type = value,
                "order_nbr" => form.order_nbr = value,
                "customer_id" => form.customer_id = value,
                "customer_order" => form.customer_order = value,
                "description" => form.description = value,
                "hold" => form.hold = is_checked(&value),
                "order_date" => form.order_date = value,
                "requested_on" => form.requested_on = value,
                _ => {}
            }
        }

        form.lines = rows.into_values().collect();
        form.renumber();
        form
    }

    /// Prefill the form from an existing order.
    #[must_use]
    pub fn from_input(input: &SalesOrderInput) -> Self {
        let mut form = Self {
            action: FormAction::Save,
            order_type: input.order_type.clone(),
            order_nbr: input.order_nbr.clone().unwrap_or_default(),
            customer_id: input.customer_id.clone(),
            customer_order: input.customer_order.clone().unwrap_or_default(),
            description: input.description.clone().unwrap_or_default(),
            hold: input.hold,
            order_date: input
                .order_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            requested_on: input
                .requested_on
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            lines: input
                .lines
                .iter()
                .map(|line| LineForm {
                    index: 0,
                    erp_id: line.erp_id.map(|id| id.to_string()).unwrap_or_default(),
                    inventory_id: line.inventory_id.clone(),
                    description: line.description.clone().unwrap_or_default(),
                    warehouse_id: line.warehouse_id.clone().unwrap_or_default(),
                    uom: line.uom.clone().unwrap_or_default(),
                    quantity: line.quantity.normalize().to_string(),
                    unit_price: line
                        .unit_price
                        .map(|p| p.normalize().to_string())
                        .unwrap_or_default(),
                    delete: line.delete,
                })
                .collect(),
        };
        form.renumber();
        form
    }

    /// Append `count` empty line rows.
    #[must_use]
    pub fn with_blank_lines(mut self, count: usize) -> Self {
        self.lines
            .extend(std::iter::repeat_with(LineForm::default).take(count));
        self.renumber();
        self
    }

    fn renumber(&mut self) {
        for (i, line) in self.lines.iter_mut().enumerate() {
            line.index = i;
        }
    }

    /// Order type drop-down.
    #[must_use]
    pub fn order_type_options(&self) -> Vec<OptionView> {
        option_views(ORDER_TYPE_OPTIONS, &self.order_type)
    }

    /// Convert the typed values into an order input.
    ///
    /// Fully blank rows are dropped. Rows marked for deletion are not checked
    /// beyond their line id. Business rules are left to
    /// [`SalesOrderInput::validate`].
    ///
    /// # Errors
    ///
    /// Returns `FormError` listing every field that could not be read.
    pub fn parse(&self) -> Result<SalesOrderInput, FormError> {
        let mut errors = Vec::new();

        let order_date = parse_date(&self.order_date, "Order date", &mut errors);
        let requested_on = parse_date(&self.requested_on, "Requested date", &mut errors);

        let mut lines = Vec::new();
        let mut n = 0;
        for row in self.lines.iter().filter(|row| !row.is_blank()) {
            let erp_id = match optional(&row.erp_id) {
                Some(raw) => match Uuid::parse_str(&raw) {
                    Ok(id) => Some(id),
                    Err(_) => {
                        errors.push(format!("Line {}: invalid line id", n + 1));
                        None
                    }
                },
                None => None,
            };

            if row.delete {
                lines.push(SalesOrderLineInput {
                    erp_id,
                    inventory_id: row.inventory_id.trim().to_string(),
                    delete: true,
                    ..Default::default()
                });
                continue;
            }

            n += 1;
            let quantity = parse_decimal(&row.quantity).unwrap_or_else(|()| {
                errors.push(format!("Line {n}: quantity must be a number"));
                None
            });
            let unit_price = parse_decimal(&row.unit_price).unwrap_or_else(|()| {
                errors.push(format!("Line {n}: unit price must be a number"));
                None
            });

            lines.push(SalesOrderLineInput {
                erp_id,
                inventory_id: row.inventory_id.trim().to_string(),
                description: optional(&row.description),
                warehouse_id: optional(&row.warehouse_id),
                uom: optional(&row.uom),
                quantity: quantity.unwrap_or(Decimal::ZERO),
                unit_price,
                delete: false,
            });
        }

        if !errors.is_empty() {
            return Err(FormError { errors });
        }

        Ok(SalesOrderInput {
            order_type: self.order_type.trim().to_uppercase(),
            order_nbr: optional(&self.order_nbr),
            customer_id: self.customer_id.trim().to_string(),
            customer_order: optional(&self.customer_order),
            description: optional(&self.description),
            hold: self.hold,
            order_date,
            requested_on,
            lines,
        })
    }
}
