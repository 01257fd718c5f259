use crate::catalog::{default_catalogue, LawEntry};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure for Normativa-Scraper
///
/// Every section has defaults reproducing the published SII and LeyChile
/// layout, so an empty TOML file (or no file at all) is a valid configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scraper: ScraperConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    pub sii: SiiConfig,
    pub leychile: LeyChileConfig,
}

/// Request pacing and timeouts
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ScraperConfig {
    /// Minimum time between requests to the same host during SII crawls (milliseconds)
    pub request_delay_ms: u64,

    /// Minimum time between requests to the same host while fetching laws (milliseconds)
    pub law_delay_ms: u64,

    /// Total time allowed for a single request (seconds)
    pub request_timeout_secs: u64,

    /// Time allowed to establish a connection (seconds)
    pub connect_timeout_secs: u64,
}

impl ScraperConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn law_delay(&self) -> Duration {
        Duration::from_millis(self.law_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            request_delay_ms: 1000,
            law_delay_ms: 2000,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

/// User agent sent with every request
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Full User-Agent header value
    pub value: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            value: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
        }
    }
}

/// Output layout
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory every other output path is relative to
    pub root: PathBuf,

    /// Directory for JSON run reports, relative to `root`
    pub data_dir: PathBuf,

    /// Directory for run logs, relative to `root`
    pub logs_dir: PathBuf,
}

impl OutputConfig {
    /// Resolves a path relative to the output root
    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    pub fn data_path(&self) -> PathBuf {
        self.resolve(&self.data_dir)
    }

    pub fn logs_path(&self) -> PathBuf {
        self.resolve(&self.logs_dir)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            data_dir: PathBuf::from("data"),
            logs_dir: PathBuf::from("logs"),
        }
    }
}

/// Link filters for one kind of index page
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FilterConfig {
    /// Tokens matched against the lowercase href (e.g. ".pdf")
    pub extensions: Vec<String>,

    /// Tokens matched against the lowercase href and, if `match-text`, the anchor text
    pub keywords: Vec<String>,

    /// Whether keywords are also matched against the anchor text
    pub match_text: bool,

    /// Extension (without dot) a kept filename must end with
    pub expected_extension: String,
}

impl FilterConfig {
    /// Filters used on SII resolution and circular indexes
    pub fn sii_documents() -> Self {
        Self {
            extensions: vec![".pdf".into(), ".doc".into(), ".docx".into()],
            keywords: vec![
                "resolucion".into(),
                "circular".into(),
                "oficio".into(),
                "res_".into(),
                "cir_".into(),
            ],
            match_text: true,
            expected_extension: "pdf".into(),
        }
    }

    /// Filters used on the electronic-invoice XML schema page
    pub fn sii_schemas() -> Self {
        Self {
            extensions: vec![".zip".into()],
            keywords: vec!["schema".into()],
            match_text: false,
            expected_extension: "zip".into(),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self::sii_documents()
    }
}

/// SII (Servicio de Impuestos Internos) crawl configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SiiConfig {
    /// Origin root-relative links are resolved against
    pub base_origin: String,

    /// How many years before the current one are crawled
    pub years_back: u32,

    /// Explicit list of years; overrides the `years-back` window when non-empty
    pub years: Vec<i32>,

    /// Per-year document categories
    #[serde(rename = "category")]
    pub categories: Vec<SiiCategoryConfig>,

    pub schemas: SchemaConfig,
}

impl SiiConfig {
    /// Years to crawl, oldest first
    pub fn years(&self, current_year: i32) -> Vec<i32> {
        if !self.years.is_empty() {
            return self.years.clone();
        }
        let first = current_year - self.years_back as i32;
        (first..=current_year).collect()
    }
}

impl Default for SiiConfig {
    fn default() -> Self {
        Self {
            base_origin: "https://www.sii.cl".to_string(),
            years_back: 4,
            years: Vec::new(),
            categories: vec![
                SiiCategoryConfig {
                    name: "resoluciones".to_string(),
                    file_prefix: "resolucion".to_string(),
                    index_template:
                        "https://www.sii.cl/normativa_legislacion/resoluciones/{year}/res_ind{year}.htm"
                            .to_string(),
                    overrides: IndexMap::from([
                        (
                            "2024".to_string(),
                            "https://www.sii.cl/normativa_legislacion/resoluciones/2024/res_ind2024.htm"
                                .to_string(),
                        ),
                        (
                            "2023".to_string(),
                            "https://www.sii.cl/normativa_legislacion/resoluciones/2023/res_ind2023.htm"
                                .to_string(),
                        ),
                    ]),
                    filters: FilterConfig::sii_documents(),
                },
                SiiCategoryConfig {
                    name: "circulares".to_string(),
                    file_prefix: "circular".to_string(),
                    index_template:
                        "https://www.sii.cl/normativa_legislacion/circulares/{year}/indcir{year}.htm"
                            .to_string(),
                    overrides: IndexMap::from([
                        (
                            "2025".to_string(),
                            "https://www.sii.cl/normativa_legislacion/circulares/2025/indcir2025.htm"
                                .to_string(),
                        ),
                        (
                            "2024".to_string(),
                            "https://www.sii.cl/normativa_legislacion/circulares/2024/indcir2024.htm"
                                .to_string(),
                        ),
                        (
                            "2023".to_string(),
                            "https://www.sii.cl/normativa_legislacion/circulares/2023/indcir2023.htm"
                                .to_string(),
                        ),
                    ]),
                    filters: FilterConfig::sii_documents(),
                },
            ],
            schemas: SchemaConfig::default(),
        }
    }
}

/// One per-year SII document category
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SiiCategoryConfig {
    /// Category name; also the destination directory and report section
    pub name: String,

    /// Prefix for synthesized filenames (e.g. "resolucion")
    pub file_prefix: String,

    /// Index URL with `{year}` placeholders
    pub index_template: String,

    /// Known index URLs by year, used instead of the template
    #[serde(default)]
    pub overrides: IndexMap<String, String>,

    #[serde(default)]
    pub filters: FilterConfig,
}

impl SiiCategoryConfig {
    /// Index page URL for a year
    pub fn index_url(&self, year: i32) -> String {
        let key = year.to_string();
        match self.overrides.get(&key) {
            Some(url) => url.clone(),
            None => self.index_template.replace("{year}", &key),
        }
    }
}

/// XML schema archive crawl
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SchemaConfig {
    pub enabled: bool,

    /// Page listing the schema archives
    pub index_url: String,

    /// Destination directory, relative to the output root
    pub destination: PathBuf,

    /// Prefix for synthesized filenames
    pub file_prefix: String,

    pub filters: FilterConfig,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            index_url: "https://www.sii.cl/factura_electronica/formato_xml.htm".to_string(),
            destination: PathBuf::from("schemas"),
            file_prefix: "schema".to_string(),
            filters: FilterConfig::sii_schemas(),
        }
    }
}

/// LeyChile (Biblioteca del Congreso Nacional) law downloads
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LeyChileConfig {
    /// Origin root-relative links are resolved against
    pub base_origin: String,

    /// Destination directory, relative to the output root
    pub destination: PathBuf,

    /// Laws to download; the built-in tax-law catalogue is used when empty
    #[serde(rename = "law")]
    pub laws: Vec<LawEntry>,
}

impl LeyChileConfig {
    /// Laws to download, in order
    pub fn catalogue(&self) -> Vec<LawEntry> {
        if self.laws.is_empty() {
            default_catalogue()
        } else {
            self.laws.clone()
        }
    }
}

impl Default for LeyChileConfig {
    fn default() -> Self {
        Self {
            base_origin: "https://www.bcn.cl".to_string(),
            destination: PathBuf::from("leyes"),
            laws: Vec::new(),
        }
    }
}
