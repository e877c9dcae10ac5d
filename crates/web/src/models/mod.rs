//! Domain models shared by the database, ERP and route layers.

pub mod credential;
pub mod sales_order;

pub use credential::ErpCredential;
pub use sales_order::{
    CachedSalesOrder, CachedSalesOrderLine, SalesOrderInput, SalesOrderLineInput,
    StoredSalesOrder,
};
