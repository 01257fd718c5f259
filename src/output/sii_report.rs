//! JSON view of an SII run
//!
//! ```json
//! {
//!   "inicio": "...",
//!   "resoluciones": { "2024": 12 },
//!   "circulares": { "2024": 7 },
//!   "schemas": 3,
//!   "resumen": { "total_documentos": 22, "documentos_exitosos": 21, "documentos_fallidos": 1 },
//!   "fallos": [ { "categoria": "...", "url": "...", "motivo": "..." } ],
//!   "interrumpido": false,
//!   "fin": "..."
//! }
//! ```
//!
//! Every group recorded with a period becomes a `{period: count}` object
//! named after the group; groups without a period add to `schemas`. Groups
//! passed to `SiiReport::new` are always present, even when never crawled.

use crate::output::RunReport;
use chrono::{DateTime, Local};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Top-level keys a group name must not take
pub const SII_REPORT_KEYS: &[&str] = &[
    "inicio",
    "schemas",
    "resumen",
    "fallos",
    "interrumpido",
    "fin",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resumen {
    pub total_documentos: usize,
    pub documentos_exitosos: usize,
    pub documentos_fallidos: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fallo {
    pub categoria: String,
    pub url: String,
    pub motivo: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiiReport {
    pub inicio: DateTime<Local>,

    /// Per-year counts, keyed by group then year
    #[serde(flatten)]
    pub por_periodo: IndexMap<String, IndexMap<String, usize>>,

    pub schemas: usize,
    pub resumen: Resumen,
    pub fallos: Vec<Fallo>,
    pub interrumpido: bool,
    pub fin: DateTime<Local>,
}

impl SiiReport {
    /// Builds the view, listing every name in `groups` first and in order
    pub fn new<'a>(report: &RunReport, groups: impl IntoIterator<Item = &'a str>) -> Self {
        let mut por_periodo: IndexMap<String, IndexMap<String, usize>> = groups
            .into_iter()
            .map(|group| (group.to_string(), IndexMap::new()))
            .collect();
        let mut schemas = 0;

        for entry in &report.categories {
            match &entry.category.period {
                Some(period) => {
                    *por_periodo
                        .entry(entry.category.group.clone())
                        .or_default()
                        .entry(period.clone())
                        .or_insert(0) += entry.count;
                }
                None => schemas += entry.count,
            }
        }

        Self {
            inicio: report.started_at,
            por_periodo,
            schemas,
            resumen: Resumen {
                total_documentos: report.totals.total,
                documentos_exitosos: report.totals.succeeded,
                documentos_fallidos: report.totals.failed,
            },
            fallos: report
                .failures
                .iter()
                .map(|f| Fallo {
                    categoria: f.category.clone(),
                    url: f.url.clone(),
                    motivo: f.reason.clone(),
                })
                .collect(),
            interrumpido: report.interrupted,
            fin: report.finished_at,
        }
    }
}
