//! Decide which cache rows a refresh writes or removes.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use order_desk_core::{OrderType, SalesOrderKey};

use crate::models::CachedSalesOrder;

/// Orders fetched from the ERP during a refresh.
#[derive(Debug, Clone, Default)]
pub struct RemoteListing {
    /// Converted orders, in the order the ERP returned them.
    pub orders: Vec<CachedSalesOrder>,
    /// `false` if paging stopped early or some records could not be read.
    pub complete: bool,
    /// Order type filter the listing was fetched with.
    pub order_type: Option<OrderType>,
}

/// Writes needed to bring the cache in line with a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Orders not yet cached.
    pub inserts: Vec<CachedSalesOrder>,
    /// Cached orders that changed (or whose change cannot be ruled out).
    pub updates: Vec<CachedSalesOrder>,
    /// Cached orders that are up to date.
    pub unchanged: usize,
    /// Cached orders the ERP no longer has.
    pub removals: Vec<SalesOrderKey>,
}

/// Compare the cache snapshot (`key -> LastModified`) with a listing.
///
/// - a remote key missing locally is inserted;
/// - a key on both sides is updated when the remote timestamp is newer or
///   either timestamp is missing, and is otherwise unchanged;
/// - a local key missing remotely is removed only if the listing is complete
///   and the key matches the listing's order type filter.
///
/// When the listing repeats a key, the last occurrence wins.
#[must_use]
pub fn reconcile(
    local: &HashMap<SalesOrderKey, Option<DateTime<Utc>>>,
    remote: RemoteListing,
) -> ReconcilePlan {
    let mut latest: Vec<CachedSalesOrder> = Vec::with_capacity(remote.orders.len());
    let mut positions: HashMap<SalesOrderKey, usize> = HashMap::new();
    for order in remote.orders {
        if let Some(&pos) = positions.get(&order.key) {
            if let Some(slot) = latest.get_mut(pos) {
                *slot = order;
            }
        } else {
            positions.insert(order.key.clone(), latest.len());
            latest.push(order);
        }
    }

    let mut plan = ReconcilePlan::default();

    for order in latest {
        match local.get(&order.key) {
            None => plan.inserts.push(order),
            Some(local_modified) => match (local_modified, order.last_modified) {
                (Some(local_ts), Some(remote_ts)) if remote_ts <= *local_ts => {
                    plan.unchanged += 1;
                }
                _ => plan.updates.push(order),
            },
        }
    }

    if remote.complete {
        let mut removals: Vec<SalesOrderKey> = local
            .keys()
            .filter(|key| !positions.contains_key(*key))
            .filter(|key| {
                remote
                    .order_type
                    .as_ref()
                    .is_none_or(|order_type| &key.order_type == order_type)
            })
            .cloned()
            .collect();
        removals.sort_by(|a, b| {
            a.order_type
                .code()
                .cmp(b.order_type.code())
                .then_with(|| a.order_nbr.cmp(&b.order_nbr))
        });
        plan.removals = removals;
    }

    plan
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use order_desk_core::OrderStatus;
    use rust_decimal::Decimal;

    use super::*;

    fn ts(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, hour, 0, 0).unwrap()
    }

    fn key(order_type: &str, nbr: &str) -> SalesOrderKey {
        SalesOrderKey::parse(order_type, nbr).unwrap()
    }

    fn order(order_type: &str, nbr: &str, modified: Option<DateTime<Utc>>) -> CachedSalesOrder {
        CachedSalesOrder {
            key: key(order_type, nbr),
            erp_id: None,
            customer_id: "ABARTENDE".to_string(),
            customer_order: None,
            description: None,
            status: OrderStatus::Open,
            hold: false,
            order_date: None,
            requested_on: None,
            currency_id: None,
            order_total: Decimal::ZERO,
            ordered_qty: Decimal::ZERO,
            last_modified: modified,
            lines: Vec::new(),
        }
    }

    fn listing(orders: Vec<CachedSalesOrder>, complete: bool) -> RemoteListing {
        RemoteListing {
            orders,
            complete,
            order_type: None,
        }
    }

    #[test]
    fn test_new_changed_and_unchanged_orders() {
        let local = HashMap::from([
            (key("SO", "000001"), Some(ts(8))),
            (key("SO", "000002"), Some(ts(8))),
        ]);
        let plan = reconcile(
            &local,
            listing(
                vec![
                    order("SO", "000001", Some(ts(8))),
                    order("SO", "000002", Some(ts(9))),
                    order("SO", "000003", Some(ts(9))),
                ],
                true,
            ),
        );

        assert_eq!(plan.unchanged, 1);
        assert_eq!(plan.updates.len(), 1);
        assert_eq!(plan.updates[0].key, key("SO", "000002"));
        assert_eq!(plan.inserts.len(), 1);
        assert_eq!(plan.inserts[0].key, key("SO", "000003"));
        assert!(plan.removals.is_empty());
    }

    #[test]
    fn test_missing_timestamp_forces_update() {
        let local = HashMap::from([
            (key("SO", "000001"), None),
            (key("SO", "000002"), Some(ts(8))),
        ]);
        let plan = reconcile(
            &local,
            listing(
                vec![
                    order("SO", "000001", Some(ts(8))),
                    order("SO", "000002", None),
                ],
                true,
            ),
        );

        assert_eq!(plan.updates.len(), 2);
        assert_eq!(plan.unchanged, 0);
    }

    #[test]
    fn test_removal_only_for_complete_listing() {
        let local = HashMap::from([
            (key("SO", "000001"), Some(ts(8))),
            (key("SO", "000009"), Some(ts(8))),
        ]);
        let remote = vec![order("SO", "000001", Some(ts(8)))];

        let partial = reconcile(&local, listing(remote.clone(), false));
        assert!(partial.removals.is_empty());

        let complete = reconcile(&local, listing(remote, true));
        assert_eq!(complete.removals, vec![key("SO", "000009")]);
    }

    #[test]
    fn test_removal_respects_order_type_filter() {
        let local = HashMap::from([
            (key("SO", "000001"), Some(ts(8))),
            (key("QT", "000002"), Some(ts(8))),
        ]);
        let plan = reconcile(
            &local,
            RemoteListing {
                orders: Vec::new(),
                complete: true,
                order_type: Some(OrderType::SalesOrder),
            },
        );

        assert_eq!(plan.removals, vec![key("SO", "000001")]);
    }

    #[test]
    fn test_duplicate_remote_keys_last_wins() {
        let mut first = order("SO", "000001", Some(ts(8)));
        first.customer_id = "FIRST".to_string();
        let mut second = order("SO", "000001", Some(ts(9)));
        second.customer_id = "SECOND".to_string();

        let plan = reconcile(&HashMap::new(), listing(vec![first, second], true));

        assert_eq!(plan.inserts.len(), 1);
        assert_eq!(plan.inserts[0].customer_id, "SECOND");
    }
}
