//! Local filename derivation
//!
//! Filenames are a pure function of the link and its category, so a rerun maps
//! every document to the same path and the existence check in the downloader
//! can skip it.

use crate::catalog::LawEntry;
use crate::crawler::DocumentLink;
use crate::url::path_basename;

/// Maximum length of the slug synthesized from anchor text
pub const MAX_SLUG_CHARS: usize = 50;

/// Slug used when neither the anchor text nor the URL offer anything usable
const FALLBACK_SLUG: &str = "documento";

/// Derives the local filename for a document link
///
/// The URL's basename is used when it already ends in `.<expected_extension>`.
/// Otherwise the name is synthesized as `<category>_<slug>.<ext>`, where the
/// slug comes from the anchor text (or, lacking text, the basename stem).
/// Characters that are invalid on common filesystems are always replaced.
///
/// # Example
///
/// ```
/// use normativa_scraper::crawler::{sanitize_filename, DocumentLink};
/// use url::Url;
///
/// let page = Url::parse("https://www.sii.cl/normativa/res_ind2024.htm").unwrap();
/// let link = DocumentLink {
///     url: Url::parse("https://www.sii.cl/normativa/detalle.htm?id=123").unwrap(),
///     anchor_text: "Resolución Nº 123 Modifica plazo".to_string(),
///     source_page: page,
/// };
///
/// assert_eq!(
///     sanitize_filename(&link, "resolucion", "pdf"),
///     "resolucion_Resolucion_N_123_Modifica_plazo.pdf"
/// );
/// ```
pub fn sanitize_filename(link: &DocumentLink, category: &str, expected_extension: &str) -> String {
    let extension = expected_extension.trim_start_matches('.').to_lowercase();
    let suffix = format!(".{}", extension);
    let basename = path_basename(&link.url);

    let name = match basename {
        Some(name) if name.to_lowercase().ends_with(&suffix) => name,
        other => {
            let source = if link.anchor_text.trim().is_empty() {
                other.map(|name| stem(&name).to_string()).unwrap_or_default()
            } else {
                link.anchor_text.clone()
            };
            format!("{}_{}{}", category, slugify(&source), suffix)
        }
    };

    replace_hostile(&name)
}

/// Filename for a downloaded law: `<id>_<name>.pdf`
///
/// Spaces and hyphens in the name become underscores; accents are kept.
pub fn law_filename(entry: &LawEntry) -> String {
    let name = entry.name.replace([' ', '-'], "_");
    replace_hostile(&format!("{}_{}.pdf", entry.id, name))
}

/// Builds a filesystem-friendly slug from free text
///
/// Diacritics are folded to ASCII, anything outside `[A-Za-z0-9_-]` and
/// whitespace is dropped, whitespace runs become `_`, and the result is cut at
/// [`MAX_SLUG_CHARS`].
pub fn slugify(text: &str) -> String {
    let kept: String = text
        .chars()
        .map(fold_diacritic)
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();

    let joined = kept.split_whitespace().collect::<Vec<_>>().join("_");
    let truncated: String = joined.chars().take(MAX_SLUG_CHARS).collect();
    let slug = truncated.trim_end_matches(['_', '-']);

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug.to_string()
    }
}

/// Replaces characters that are invalid in Windows or POSIX filenames
pub fn replace_hostile(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Maps accented Latin letters to their ASCII base letter
///
/// Covers the letters found in Spanish legal text; other non-ASCII characters
/// pass through and are dropped by the caller.
fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' => 'a',
        'Á' | 'À' | 'Â' | 'Ä' | 'Ã' => 'A',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' => 'O',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ç' => 'c',
        'Ç' => 'C',
        c => c,
    }
}

/// Filename without its last extension
fn stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) if dot > 0 => &name[..dot],
        _ => name,
    }
}
