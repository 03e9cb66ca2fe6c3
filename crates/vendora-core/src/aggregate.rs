//! Aggregation passes over the base relations.
//!
//! The summary is built as three explicit grouped passes (freight, purchase,
//! sales) followed by two left-join merges and a descending sort, rather
//! than a single SQL statement, so the aggregator works over any
//! [`crate::FactSource`] regardless of query dialect.
//!
//! All passes group through `BTreeMap` so the pre-sort row order is
//! deterministic; combined with a stable final sort, re-running over
//! unchanged data reproduces the output byte for byte.

use std::collections::BTreeMap;

use crate::domain::{
    FreightFact, MergedRow, PriceFact, PurchaseFact, PurchaseSummaryRow, SalesFact, SalesTotals,
};

/// Purchase-side group key. Prices are keyed by their bit pattern since
/// `f64` has no total order; identical values always share a key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct PurchaseKey {
    vendor_number: i64,
    vendor_name: String,
    brand: i64,
    description: String,
    purchase_price_bits: u64,
    actual_price_bits: u64,
    volume: String,
}

/// Sum freight per vendor.
pub fn freight_summary(rows: &[FreightFact]) -> BTreeMap<i64, f64> {
    let mut totals = BTreeMap::new();
    for row in rows {
        *totals.entry(row.vendor_number).or_insert(0.0) += row.freight;
    }
    totals
}

/// Sum the four sales metrics per (vendor, brand).
pub fn sales_summary(rows: &[SalesFact]) -> BTreeMap<(i64, i64), SalesTotals> {
    let mut totals: BTreeMap<(i64, i64), SalesTotals> = BTreeMap::new();
    for row in rows {
        let entry = totals.entry((row.vendor_no, row.brand)).or_default();
        entry.quantity += row.sales_quantity;
        entry.dollars += row.sales_dollars;
        entry.price += row.sales_price;
        entry.excise_tax += row.excise_tax;
    }
    totals
}

/// Inner-join purchases to catalog prices on brand, drop rows with a
/// non-positive purchase price, and sum quantity and dollars over the
/// seven-column group key.
///
/// The join replicates relational fan-out: every catalog row matching a
/// brand produces a joined row, each under its own group key.
pub fn purchase_summary(
    purchases: &[PurchaseFact],
    prices: &[PriceFact],
) -> Vec<PurchaseSummaryRow> {
    let mut catalog: BTreeMap<i64, Vec<&PriceFact>> = BTreeMap::new();
    for price in prices {
        catalog.entry(price.brand).or_default().push(price);
    }

    let mut grouped: BTreeMap<PurchaseKey, (i64, f64)> = BTreeMap::new();
    for purchase in purchases {
        if purchase.purchase_price <= 0.0 {
            continue;
        }
        let Some(matches) = catalog.get(&purchase.brand) else {
            continue;
        };
        for price in matches {
            let key = PurchaseKey {
                vendor_number: purchase.vendor_number,
                vendor_name: purchase.vendor_name.clone(),
                brand: purchase.brand,
                description: purchase.description.clone(),
                purchase_price_bits: purchase.purchase_price.to_bits(),
                actual_price_bits: price.price.to_bits(),
                volume: price.volume.clone(),
            };
            let totals = grouped.entry(key).or_insert((0, 0.0));
            totals.0 += purchase.quantity;
            totals.1 += purchase.dollars;
        }
    }

    grouped
        .into_iter()
        .map(|(key, (quantity, dollars))| PurchaseSummaryRow {
            vendor_number: key.vendor_number,
            vendor_name: key.vendor_name,
            brand: key.brand,
            description: key.description,
            purchase_price: f64::from_bits(key.purchase_price_bits),
            actual_price: f64::from_bits(key.actual_price_bits),
            volume: key.volume,
            total_purchase_quantity: quantity,
            total_purchase_dollars: dollars,
        })
        .collect()
}

/// Left-join the purchase summary to sales and freight totals, then sort
/// descending by `TotalPurchaseDollars`.
///
/// Every purchase-side row appears exactly once in the output; unmatched
/// sales/freight columns stay absent until the cleaning pass fills them.
pub fn merge_summaries(
    purchases: Vec<PurchaseSummaryRow>,
    sales: &BTreeMap<(i64, i64), SalesTotals>,
    freight: &BTreeMap<i64, f64>,
) -> Vec<MergedRow> {
    let mut rows: Vec<MergedRow> = purchases
        .into_iter()
        .map(|row| {
            let sale = sales.get(&(row.vendor_number, row.brand));
            let freight_cost = freight.get(&row.vendor_number).copied();
            MergedRow {
                vendor_number: row.vendor_number,
                vendor_name: row.vendor_name,
                brand: row.brand,
                description: row.description,
                purchase_price: row.purchase_price,
                actual_price: row.actual_price,
                volume: row.volume,
                total_purchase_quantity: row.total_purchase_quantity,
                total_purchase_dollars: row.total_purchase_dollars,
                total_sales_quantity: sale.map(|s| s.quantity),
                total_sales_dollars: sale.map(|s| s.dollars),
                total_sales_price: sale.map(|s| s.price),
                total_excise_tax: sale.map(|s| s.excise_tax),
                freight_cost,
            }
        })
        .collect();

    // Stable sort: ties keep the deterministic group-key order.
    rows.sort_by(|a, b| b.total_purchase_dollars.total_cmp(&a.total_purchase_dollars));
    rows
}

/// Run the full aggregation: three grouped passes, two merges, one sort.
pub fn vendor_summary(
    purchases: &[PurchaseFact],
    prices: &[PriceFact],
    sales: &[SalesFact],
    freight: &[FreightFact],
) -> Vec<MergedRow> {
    let freight_totals = freight_summary(freight);
    let purchase_totals = purchase_summary(purchases, prices);
    let sales_totals = sales_summary(sales);
    merge_summaries(purchase_totals, &sales_totals, &freight_totals)
}
