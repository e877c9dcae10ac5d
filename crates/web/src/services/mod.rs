//! Business logic that spans the ERP client and the database.

pub mod reconcile;
pub mod sync;

pub use reconcile::{ReconcilePlan, RemoteListing, reconcile};
pub use sync::{OrderDetails, RefreshSummary, SalesOrderSync, SyncError};
