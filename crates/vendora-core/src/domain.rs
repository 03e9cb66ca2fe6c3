//! Canonical row types for the vendor sales pipeline.
//!
//! Fact records mirror the four base relations (`purchases`,
//! `purchase_prices`, `sales`, `vendor_invoice`); the raw dataset's column
//! names survive through serde on the output row. Derived rows carry the
//! aggregation output before and after the cleaning pass.

use serde::Serialize;

/// A raw purchase line from the `purchases` relation.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseFact {
    pub vendor_number: i64,
    pub vendor_name: String,
    pub brand: i64,
    pub description: String,
    pub purchase_price: f64,
    pub quantity: i64,
    pub dollars: f64,
}

/// A catalog price/volume entry from `purchase_prices`, keyed by brand.
///
/// `volume` stays textual until the cleaning pass casts it; it participates
/// in the purchase-side group key as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceFact {
    pub brand: i64,
    pub price: f64,
    pub volume: String,
}

/// A raw sale line from the `sales` relation.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesFact {
    pub vendor_no: i64,
    pub brand: i64,
    pub sales_quantity: f64,
    pub sales_dollars: f64,
    pub sales_price: f64,
    pub excise_tax: f64,
}

/// A freight charge from the `vendor_invoice` relation.
#[derive(Debug, Clone, PartialEq)]
pub struct FreightFact {
    pub vendor_number: i64,
    pub freight: f64,
}

/// One grouped purchase-side row: the seven-column group key plus totals.
///
/// Only purchase lines with `PurchasePrice > 0` contribute; rows at or
/// below zero are excluded from the summary entirely.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseSummaryRow {
    pub vendor_number: i64,
    pub vendor_name: String,
    pub brand: i64,
    pub description: String,
    pub purchase_price: f64,
    pub actual_price: f64,
    pub volume: String,
    pub total_purchase_quantity: i64,
    pub total_purchase_dollars: f64,
}

/// Sales-side totals for one (vendor, brand) pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SalesTotals {
    pub quantity: f64,
    pub dollars: f64,
    pub price: f64,
    pub excise_tax: f64,
}

/// Aggregator output before cleaning.
///
/// Sales and freight columns are `None` where the left joins found no
/// match; the cleaning pass fills them with zero.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRow {
    pub vendor_number: i64,
    pub vendor_name: String,
    pub brand: i64,
    pub description: String,
    pub purchase_price: f64,
    pub actual_price: f64,
    pub volume: String,
    pub total_purchase_quantity: i64,
    pub total_purchase_dollars: f64,
    pub total_sales_quantity: Option<f64>,
    pub total_sales_dollars: Option<f64>,
    pub total_sales_price: Option<f64>,
    pub total_excise_tax: Option<f64>,
    pub freight_cost: Option<f64>,
}

/// One row of the final `vendor_sales_summary` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VendorSalesSummary {
    pub vendor_number: i64,
    pub vendor_name: String,
    pub brand: i64,
    pub description: String,
    pub purchase_price: f64,
    pub actual_price: f64,
    pub volume: f64,
    pub total_purchase_quantity: i64,
    pub total_purchase_dollars: f64,
    pub total_sales_quantity: f64,
    pub total_sales_dollars: f64,
    pub total_sales_price: f64,
    pub total_excise_tax: f64,
    pub freight_cost: f64,
    pub gross_profit: f64,
    pub profit_margin: f64,
    pub stock_turnover: f64,
    pub sales_to_purchase_ratio: f64,
}

impl VendorSalesSummary {
    /// True when any derived ratio divided by zero and carries a non-finite
    /// sentinel (`±inf` or `NaN`) instead of a number.
    #[must_use]
    pub fn is_indeterminate(&self) -> bool {
        !self.profit_margin.is_finite()
            || !self.stock_turnover.is_finite()
            || !self.sales_to_purchase_ratio.is_finite()
    }
}
