//! JSON view of a laws run
//!
//! `estado` is `exitoso` when the PDF is on disk, `fallido` when the law page
//! carried no PDF link, and `error` (with the reason) when the page or the
//! download failed.

use crate::output::RunReport;
use crate::runs::{LawResult, LawStatus};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Estado {
    Exitoso,
    Fallido,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LawDetail {
    pub codigo: String,
    pub nombre: String,
    pub estado: Estado,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&LawResult> for LawDetail {
    fn from(result: &LawResult) -> Self {
        let (estado, error) = match &result.status {
            LawStatus::Document(outcome) => match outcome.failure() {
                None => (Estado::Exitoso, None),
                Some(reason) => (Estado::Error, Some(reason.to_string())),
            },
            LawStatus::NoLinkFound => (Estado::Fallido, None),
            LawStatus::PageUnavailable(reason) => (Estado::Error, Some(reason.clone())),
        };

        Self {
            codigo: result.entry.code.clone(),
            nombre: result.entry.name.clone(),
            estado,
            error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LawReport {
    pub inicio: DateTime<Local>,
    pub exitosas: usize,
    pub fallidas: usize,
    pub total: usize,
    pub detalles: Vec<LawDetail>,
    pub interrumpido: bool,
    pub fin: DateTime<Local>,
}

impl LawReport {
    /// Builds the view from the run report and the per-law results
    ///
    /// `total` is the size of the catalogue, so laws skipped by an interrupt
    /// count towards neither `exitosas` nor `fallidas`.
    pub fn new(report: &RunReport, results: &[LawResult], catalogue_size: usize) -> Self {
        let detalles: Vec<LawDetail> = results.iter().map(LawDetail::from).collect();
        let exitosas = detalles
            .iter()
            .filter(|d| d.estado == Estado::Exitoso)
            .count();

        Self {
            inicio: report.started_at,
            exitosas,
            fallidas: detalles.len() - exitosas,
            total: catalogue_size,
            detalles,
            interrumpido: report.interrupted,
            fin: report.finished_at,
        }
    }
}
