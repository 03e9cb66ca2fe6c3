//! Core contracts for vendora.
//!
//! This crate contains:
//! - Typed fact records for the four base relations
//! - The three-pass aggregator and left-join merge
//! - The cleaning pass and derived vendor performance metrics
//! - Data source / sink traits and the pipeline orchestrator
//!
//! Everything here is pure in-memory computation; the storage engine lives
//! in `vendora-warehouse` behind the [`FactSource`] and [`SummarySink`]
//! seams.

pub mod aggregate;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod source;

pub use domain::{
    FreightFact, MergedRow, PriceFact, PurchaseFact, PurchaseSummaryRow, SalesFact, SalesTotals,
    VendorSalesSummary,
};
pub use error::{ConfigError, DataSourceError, PipelineError, SinkWriteError};
pub use pipeline::{SummaryReport, SUMMARY_TABLE};
pub use source::{FactSource, SummarySink};
