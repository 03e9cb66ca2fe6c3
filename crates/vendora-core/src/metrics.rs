//! Cleaning pass and derived vendor performance metrics.
//!
//! Ratios use plain IEEE-754 division on purpose: a zero denominator
//! propagates `±inf` or `NaN` into the output row instead of raising an
//! error, matching the reference behavior of this pipeline. Callers can
//! detect such rows through [`VendorSalesSummary::is_indeterminate`].

use crate::domain::{MergedRow, VendorSalesSummary};

/// Clean one merged row and compute its derived metrics.
///
/// Volume is cast from its textual form to `f64` (unparseable or empty
/// values become zero, as do the null sales/freight columns left by the
/// left joins), and the text fields are trimmed of surrounding whitespace.
pub fn clean_row(row: MergedRow) -> VendorSalesSummary {
    let volume = row.volume.trim().parse::<f64>().unwrap_or(0.0);
    let total_sales_quantity = row.total_sales_quantity.unwrap_or(0.0);
    let total_sales_dollars = row.total_sales_dollars.unwrap_or(0.0);
    let total_sales_price = row.total_sales_price.unwrap_or(0.0);
    let total_excise_tax = row.total_excise_tax.unwrap_or(0.0);
    let freight_cost = row.freight_cost.unwrap_or(0.0);

    let gross_profit = total_sales_dollars - row.total_purchase_dollars;
    let profit_margin = gross_profit / total_sales_dollars * 100.0;
    let stock_turnover = total_sales_quantity / row.total_purchase_quantity as f64;
    let sales_to_purchase_ratio = total_sales_dollars / row.total_purchase_dollars;

    VendorSalesSummary {
        vendor_number: row.vendor_number,
        vendor_name: row.vendor_name.trim().to_string(),
        brand: row.brand,
        description: row.description.trim().to_string(),
        purchase_price: row.purchase_price,
        actual_price: row.actual_price,
        volume,
        total_purchase_quantity: row.total_purchase_quantity,
        total_purchase_dollars: row.total_purchase_dollars,
        total_sales_quantity,
        total_sales_dollars,
        total_sales_price,
        total_excise_tax,
        freight_cost,
        gross_profit,
        profit_margin,
        stock_turnover,
        sales_to_purchase_ratio,
    }
}

/// Clean every merged row, preserving order.
pub fn clean(rows: Vec<MergedRow>) -> Vec<VendorSalesSummary> {
    rows.into_iter().map(clean_row).collect()
}
