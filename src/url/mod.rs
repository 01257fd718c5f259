//! URL handling module for Normativa-Scraper
//!
//! This module resolves anchor hrefs against a site origin or the fetched
//! page, and derives the host keys used for request pacing.

mod domain;
mod resolve;

pub use domain::host_key;
pub use resolve::{path_basename, resolve_href};
