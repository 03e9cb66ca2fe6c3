//! Trait seams between the pipeline and the storage engine.

use crate::domain::{FreightFact, PriceFact, PurchaseFact, SalesFact, VendorSalesSummary};
use crate::error::{DataSourceError, SinkWriteError};

/// A queryable relational source exposing the four base relations.
pub trait FactSource {
    fn purchase_facts(&self) -> Result<Vec<PurchaseFact>, DataSourceError>;
    fn price_facts(&self) -> Result<Vec<PriceFact>, DataSourceError>;
    fn sales_facts(&self) -> Result<Vec<SalesFact>, DataSourceError>;
    fn freight_facts(&self) -> Result<Vec<FreightFact>, DataSourceError>;
}

/// A destination that accepts a named table and a row set.
///
/// Replace semantics: prior contents of `table` are fully discarded.
/// Implementations must make the swap atomic (stage, then rename) so a
/// failed write leaves the previous table intact, and must be idempotent:
/// writing identical rows twice yields an identical table.
pub trait SummarySink {
    fn replace_table(&self, table: &str, rows: &[VendorSalesSummary])
        -> Result<(), SinkWriteError>;
}
