//! Catalogue of the main tax laws referenced by the SII
//!
//! The table is compiled in and immutable. A configuration file may replace it
//! with its own `[[leychile.law]]` list, which is also how tests run against a
//! fake catalogue.

use serde::Deserialize;

/// LeyChile page for a norm, by its `idNorma`
pub const LEYCHILE_NAVIGATE_URL: &str = "https://www.bcn.cl/leychile/navegar?idNorma=";

/// A compiled catalogue row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Stable code used in reports (e.g. "DL_825_IVA")
    pub code: &'static str,
    /// LeyChile norm identifier
    pub id: &'static str,
    /// Human-readable law name
    pub name: &'static str,
}

pub const TAX_LAWS: &[CatalogEntry] = &[
    CatalogEntry {
        code: "DL_824_Impuesto_Renta",
        id: "2867",
        name: "Decreto Ley 824 - Ley de Impuesto a la Renta",
    },
    CatalogEntry {
        code: "DL_825_IVA",
        id: "2934",
        name: "Decreto Ley 825 - Ley de IVA",
    },
    CatalogEntry {
        code: "DL_830_Codigo_Tributario",
        id: "2869",
        name: "Decreto Ley 830 - Código Tributario",
    },
    CatalogEntry {
        code: "DL_3475_Timbres_Estampillas",
        id: "2977",
        name: "Decreto Ley 3475 - Ley de Timbres y Estampillas",
    },
    CatalogEntry {
        code: "Ley_17235_Impuesto_Territorial",
        id: "19526",
        name: "Ley 17.235 - Impuesto Territorial",
    },
    CatalogEntry {
        code: "Ley_16271_Herencias_Donaciones",
        id: "2860",
        name: "Ley 16.271 - Impuesto Herencias y Donaciones",
    },
    CatalogEntry {
        code: "Ley_18211_Alcoholes",
        id: "29473",
        name: "Ley 18.211 - Impuesto a Bebidas Alcohólicas",
    },
    CatalogEntry {
        code: "Ley_19995_Casinos",
        id: "213717",
        name: "Ley 19.995 - Casinos de Juego",
    },
    CatalogEntry {
        code: "DFL_7_Aduanas",
        id: "236894",
        name: "DFL 7 - Ordenanza de Aduanas",
    },
];

/// A law to download
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LawEntry {
    pub code: String,
    pub id: String,
    pub name: String,
    /// Law page on LeyChile
    pub url: String,
}

impl From<&CatalogEntry> for LawEntry {
    fn from(entry: &CatalogEntry) -> Self {
        Self {
            code: entry.code.to_string(),
            id: entry.id.to_string(),
            name: entry.name.to_string(),
            url: format!("{}{}", LEYCHILE_NAVIGATE_URL, entry.id),
        }
    }
}

/// The compiled tax-law catalogue as owned entries
pub fn default_catalogue() -> Vec<LawEntry> {
    TAX_LAWS.iter().map(LawEntry::from).collect()
}
