//! Static drop-down data for the sales order forms.
//!
//! The ERP exposes these lists through its own schema endpoints, but the
//! forms only need the common values, so they are kept as constants.

/// A single `<option>` in a drop-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectOption {
    /// Submitted value.
    pub value: &'static str,
    /// Displayed label.
    pub label: &'static str,
}

impl SelectOption {
    const fn new(value: &'static str, label: &'static str) -> Self {
        Self { value, label }
    }
}

/// Order types the create form offers.
pub const ORDER_TYPE_OPTIONS: &[SelectOption] = &[
    SelectOption::new("SO", "SO - Sales Order"),
    SelectOption::new("QT", "QT - Quote"),
    SelectOption::new("RC", "RC - Return for Credit"),
    SelectOption::new("CM", "CM - Credit Memo"),
    SelectOption::new("IN", "IN - Invoice"),
];

/// Status filter on the order list. The empty value means "any status".
pub const STATUS_FILTER_OPTIONS: &[SelectOption] = &[
    SelectOption::new("", "All statuses"),
    SelectOption::new("Open", "Open"),
    SelectOption::new("On Hold", "On Hold"),
    SelectOption::new("Pending Approval", "Pending Approval"),
    SelectOption::new("Back Order", "Back Order"),
    SelectOption::new("Shipping", "Shipping"),
    SelectOption::new("Completed", "Completed"),
    SelectOption::new("Canceled", "Canceled"),
];

/// Units of measure offered on order lines.
pub const UOM_OPTIONS: &[SelectOption] = &[
    SelectOption::new("EA", "Each"),
    SelectOption::new("BOX", "Box"),
    SelectOption::new("CASE", "Case"),
    SelectOption::new("PACK", "Pack"),
    SelectOption::new("KG", "Kilogram"),
    SelectOption::new("LB", "Pound"),
];

/// Whether an order type code may be used to create orders from this app.
#[must_use]
pub fn is_valid_order_type(code: &str) -> bool {
    let code = code.trim();
    ORDER_TYPE_OPTIONS
        .iter()
        .any(|opt| opt.value.eq_ignore_ascii_case(code))
}
