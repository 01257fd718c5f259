//! The two invocation kinds
//!
//! - `leyes`: tax laws from LeyChile, one PDF per catalogue entry
//! - `sii`: SII resoluciones and circulares per year, plus XML schemas

mod leyes;
mod sii;

pub use leyes::{LawResult, LawRun, LawRunOutcome, LawStatus, LAWS_GROUP};
pub use sii::{plan as sii_plan, SiiRun, SiiRunOutcome, SCHEMAS_GROUP};
