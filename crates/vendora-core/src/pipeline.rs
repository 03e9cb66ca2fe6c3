//! Pipeline orchestration: aggregate, clean, persist.
//!
//! One synchronous batch run with no retries and no partial output; a
//! failure at any phase propagates before the sink is touched (or, for
//! sink failures, leaves the previous summary table in place).

use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use crate::aggregate;
use crate::domain::VendorSalesSummary;
use crate::error::{DataSourceError, PipelineError};
use crate::metrics;
use crate::source::{FactSource, SummarySink};

/// Name of the persisted summary table.
pub const SUMMARY_TABLE: &str = "vendor_sales_summary";

/// Outcome of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    /// Rows written to the summary table.
    pub rows: usize,
    /// Rows where a zero denominator left a non-finite ratio.
    pub indeterminate_rows: usize,
    pub elapsed_ms: u64,
}

/// Aggregate the base relations and clean the result, without persisting.
pub fn build_vendor_summary(
    source: &dyn FactSource,
) -> Result<Vec<VendorSalesSummary>, DataSourceError> {
    let purchases = source.purchase_facts()?;
    let prices = source.price_facts()?;
    let sales = source.sales_facts()?;
    let freight = source.freight_facts()?;

    info!(
        purchases = purchases.len(),
        prices = prices.len(),
        sales = sales.len(),
        freight = freight.len(),
        "aggregating vendor summary"
    );
    let merged = aggregate::vendor_summary(&purchases, &prices, &sales, &freight);

    info!(rows = merged.len(), "cleaning merged rows");
    Ok(metrics::clean(merged))
}

/// Run the full pipeline and replace the `vendor_sales_summary` table.
pub fn run(source: &dyn FactSource, sink: &dyn SummarySink) -> Result<SummaryReport, PipelineError> {
    let started = Instant::now();

    let rows = build_vendor_summary(source)?;
    let indeterminate_rows = rows.iter().filter(|row| row.is_indeterminate()).count();
    if indeterminate_rows > 0 {
        warn!(
            indeterminate_rows,
            "rows with zero denominators carry non-finite ratios"
        );
    }

    sink.replace_table(SUMMARY_TABLE, &rows)?;
    info!(rows = rows.len(), table = SUMMARY_TABLE, "summary persisted");

    Ok(SummaryReport {
        rows: rows.len(),
        indeterminate_rows,
        elapsed_ms: started.elapsed().as_millis() as u64,
    })
}
