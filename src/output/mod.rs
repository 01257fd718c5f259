//! Output module for run reports
//!
//! This module handles:
//! - Accumulating per-category counts and failures during a run
//! - The JSON layouts of the SII and laws reports
//! - Atomic report persistence under the data directory

mod law_report;
mod report;
mod sii_report;

pub use law_report::{Estado, LawDetail, LawReport};
pub use report::{
    persist_json, report_path, CategoryCount, CategoryKey, FailureRecord, ReportBuilder,
    RunReport, Totals,
};
pub use sii_report::{Fallo, Resumen, SiiReport, SII_REPORT_KEYS};
