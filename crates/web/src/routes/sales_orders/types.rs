//! View types for the sales order pages.

use order_desk_core::options::SelectOption;
use order_desk_core::{OrderStatus, OrderType};
use serde::Deserialize;

use crate::db::CacheFilter;
use crate::models::{CachedSalesOrder, CachedSalesOrderLine, StoredSalesOrder};

/// Query parameters for the order list.
#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    /// Status filter (ERP display string).
    pub status: Option<String>,
    /// Order type filter.
    pub order_type: Option<String>,
    /// Search text.
    pub q: Option<String>,
    /// Flash success code.
    pub success: Option<String>,
    /// Flash error code.
    pub error: Option<String>,
    /// Refresh counts, set by the refresh redirect.
    pub added: Option<usize>,
    pub changed: Option<usize>,
    pub removed: Option<usize>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

impl OrderListQuery {
    /// Cache filter for this query. Unparseable order types are ignored.
    #[must_use]
    pub fn cache_filter(&self) -> CacheFilter {
        CacheFilter {
            status: non_blank(self.status.as_deref()).map(OrderStatus::from_erp_str),
            order_type: non_blank(self.order_type.as_deref())
                .and_then(|s| s.parse::<OrderType>().ok()),
            search: non_blank(self.q.as_deref()).map(str::to_string),
            limit: None,
        }
    }
}

/// An `<option>` with its selected state resolved.
#[derive(Debug, Clone)]
pub struct OptionView {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Build `<option>` views, marking the one equal to `current`.
#[must_use]
pub fn option_views(options: &[SelectOption], current: &str) -> Vec<OptionView> {
    let current = current.trim();
    options
        .iter()
        .map(|opt| OptionView {
            value: opt.value.to_string(),
            label: opt.label.to_string(),
            selected: opt.value.eq_ignore_ascii_case(current),
        })
        .collect()
}

/// Order row on the list page.
#[derive(Debug, Clone)]
pub struct OrderRowView {
    pub order_type: String,
    pub order_nbr: String,
    pub path: String,
    pub customer_id: String,
    pub customer_order: String,
    pub description: String,
    pub status: String,
    pub status_class: &'static str,
    pub hold: bool,
    pub order_date: String,
    pub currency_id: String,
    pub order_total: String,
}

impl From<&StoredSalesOrder> for OrderRowView {
    fn from(stored: &StoredSalesOrder) -> Self {
        let order = &stored.order;
        Self {
            order_type: order.key.order_type.code().to_string(),
            order_nbr: order.key.order_nbr.clone(),
            path: super::order_path(&order.key),
            customer_id: order.customer_id.clone(),
            customer_order: order.customer_order.clone().unwrap_or_default(),
            description: order.description.clone().unwrap_or_default(),
            status: order.status.to_string(),
            status_class: order.status.badge_class(),
            hold: order.hold,
            order_date: format_date(order.order_date),
            currency_id: order.currency_id.clone().unwrap_or_default(),
            order_total: order.order_total.to_string(),
        }
    }
}

/// Order on the details and delete pages.
#[derive(Debug, Clone)]
pub struct OrderDetailView {
    pub title: String,
    pub order_type: String,
    pub order_type_label: String,
    pub order_nbr: String,
    pub path: String,
    pub customer_id: String,
    pub customer_order: String,
    pub description: String,
    pub status: String,
    pub status_class: &'static str,
    pub hold: bool,
    pub editable: bool,
    pub order_date: String,
    pub requested_on: String,
    pub currency_id: String,
    pub order_total: String,
    pub ordered_qty: String,
    pub last_modified: String,
    pub lines: Vec<LineView>,
}

impl From<&CachedSalesOrder> for OrderDetailView {
    fn from(order: &CachedSalesOrder) -> Self {
        Self {
            title: order.key.to_string(),
            order_type: order.key.order_type.code().to_string(),
            order_type_label: order.key.order_type.label().to_string(),
            order_nbr: order.key.order_nbr.clone(),
            path: super::order_path(&order.key),
            customer_id: order.customer_id.clone(),
            customer_order: order.customer_order.clone().unwrap_or_default(),
            description: order.description.clone().unwrap_or_default(),
            status: order.status.to_string(),
            status_class: order.status.badge_class(),
            hold: order.hold,
            editable: order.status.is_editable(),
            order_date: format_date(order.order_date),
            requested_on: format_date(order.requested_on),
            currency_id: order.currency_id.clone().unwrap_or_default(),
            order_total: order.order_total.to_string(),
            ordered_qty: order.ordered_qty.to_string(),
            last_modified: order.last_modified.map_or_else(String::new, |dt| {
                dt.format("%b %d, %Y %H:%M UTC").to_string()
            }),
            lines: order.lines.iter().map(LineView::from).collect(),
        }
    }
}

/// Order line on the details page.
#[derive(Debug, Clone)]
pub struct LineView {
    pub line_nbr: i32,
    pub inventory_id: String,
    pub description: String,
    pub warehouse_id: String,
    pub uom: String,
    pub quantity: String,
    pub unit_price: String,
    pub extended_price: String,
}

impl From<&CachedSalesOrderLine> for LineView {
    fn from(line: &CachedSalesOrderLine) -> Self {
        Self {
            line_nbr: line.line_nbr,
            inventory_id: line.inventory_id.clone(),
            description: line.description.clone().unwrap_or_default(),
            warehouse_id: line.warehouse_id.clone().unwrap_or_default(),
            uom: line.uom.clone().unwrap_or_default(),
            quantity: line.quantity.to_string(),
            unit_price: line.unit_price.to_string(),
            extended_price: line.extended_price.to_string(),
        }
    }
}

fn format_date(date: Option<chrono::NaiveDate>) -> String {
    date.map_or_else(String::new, |d| d.format("%b %d, %Y").to_string())
}
