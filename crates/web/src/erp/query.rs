//! OData-style list parameters for entity queries.

use order_desk_core::OrderType;

/// Options for listing sales orders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Restrict to one order type.
    pub order_type: Option<OrderType>,
    /// `$top`: maximum records returned.
    pub top: Option<u32>,
    /// `$skip`: records skipped before the first returned one.
    pub skip: Option<u32>,
    /// `$expand=Details`: include order lines.
    pub expand_details: bool,
}

impl ListOptions {
    /// The `$filter` expression, if an order type is set.
    #[must_use]
    pub fn filter(&self) -> Option<String> {
        self.order_type
            .as_ref()
            .map(|order_type| format!("OrderType eq {}", quote(order_type.code())))
    }

    /// Query string pairs for `reqwest::RequestBuilder::query`.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(filter) = self.filter() {
            pairs.push(("$filter", filter));
        }
        if self.expand_details {
            pairs.push(("$expand", "Details".to_string()));
        }
        if let Some(top) = self.top {
            pairs.push(("$top", top.to_string()));
        }
        if let Some(skip) = self.skip.filter(|s| *s > 0) {
            pairs.push(("$skip", skip.to_string()));
        }
        pairs
    }
}

/// OData string literal: single quotes doubled.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_filter_by_default() {
        let opts = ListOptions::default();
        assert_eq!(opts.filter(), None);
        assert!(opts.query_pairs().is_empty());
    }

    #[test]
    fn test_filter_by_order_type() {
        let opts = ListOptions {
            order_type: Some(OrderType::SalesOrder),
            ..Default::default()
        };
        assert_eq!(opts.filter().as_deref(), Some("OrderType eq 'SO'"));
    }

    #[test]
    fn test_quote_doubles_single_quotes() {
        assert_eq!(quote("O'BRIEN"), "'O''BRIEN'");
    }

    #[test]
    fn test_query_pairs_paging() {
        let opts = ListOptions {
            top: Some(50),
            skip: Some(0),
            expand_details: true,
            ..Default::default()
        };
        assert_eq!(
            opts.query_pairs(),
            vec![("$expand", "Details".to_string()), ("$top", "50".to_string())]
        );

        let next = ListOptions {
            skip: Some(50),
            ..opts
        };
        assert!(next.query_pairs().contains(&("$skip", "50".to_string())));
    }
}
