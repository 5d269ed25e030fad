use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// URL rewrites that commonly lead to a print-friendly recipe page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrintPattern {
    /// `?print` (Serious Eats and many blogs)
    QueryPrint,
    /// `?printview` (Allrecipes)
    QueryPrintview,
    /// WordPress Recipe Maker: `/wprm_print/<slug>`
    WprmPrint,
    /// `/print/` suffix
    SuffixPrintSlash,
    /// `/print` suffix
    SuffixPrint,
}

impl PrintPattern {
    /// Every pattern, in the order they are tried. Earlier entries win.
    pub const PRIORITY: [PrintPattern; 5] = [
        PrintPattern::QueryPrint,
        PrintPattern::QueryPrintview,
        PrintPattern::WprmPrint,
        PrintPattern::SuffixPrintSlash,
        PrintPattern::SuffixPrint,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            PrintPattern::QueryPrint => "query_print",
            PrintPattern::QueryPrintview => "query_printview",
            PrintPattern::WprmPrint => "wprm_print",
            PrintPattern::SuffixPrintSlash => "suffix_print_slash",
            PrintPattern::SuffixPrint => "suffix_print",
        }
    }

    /// Human readable form of the rewrite, e.g. `?print`
    pub fn template(&self) -> &'static str {
        match self {
            PrintPattern::QueryPrint => "?print",
            PrintPattern::QueryPrintview => "?printview",
            PrintPattern::WprmPrint => "/wprm_print/<slug>",
            PrintPattern::SuffixPrintSlash => "/print/",
            PrintPattern::SuffixPrint => "/print",
        }
    }

    /// Rewrite `url` with this pattern.
    ///
    /// Returns `None` when the pattern does not apply, which only happens for
    /// [`PrintPattern::WprmPrint`] on URLs without a usable slug.
    pub fn apply(&self, url: &Url) -> Option<Url> {
        let mut page = url.clone();
        page.set_fragment(None);
        let separator = if page.query().is_some() { '&' } else { '?' };
        let base = page.as_str().trim_end_matches('/');

        let candidate = match self {
            PrintPattern::QueryPrint => format!("{}{}print", base, separator),
            PrintPattern::QueryPrintview => format!("{}{}printview", base, separator),
            PrintPattern::WprmPrint => {
                let slug = recipe_slug(url)?;
                format!("{}/wprm_print/{}", url.origin().ascii_serialization(), slug)
            }
            PrintPattern::SuffixPrintSlash => format!("{}/print/", base),
            PrintPattern::SuffixPrint => format!("{}/print", base),
        };

        Url::parse(&candidate).ok()
    }

    /// Which pattern produced `url`, checking `printview` before `print`.
    pub fn identify(url: &str) -> Option<Self> {
        if url.contains("?printview") || url.contains("&printview") {
            Some(PrintPattern::QueryPrintview)
        } else if url.contains("?print") || url.contains("&print") {
            Some(PrintPattern::QueryPrint)
        } else if url.contains("/wprm_print/") {
            Some(PrintPattern::WprmPrint)
        } else if url.ends_with("/print/") {
            Some(PrintPattern::SuffixPrintSlash)
        } else if url.ends_with("/print") {
            Some(PrintPattern::SuffixPrint)
        } else {
            None
        }
    }
}

impl fmt::Display for PrintPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.template())
    }
}

/// Candidate print URLs for `url`, in priority order.
pub fn candidates(url: &Url) -> Vec<(PrintPattern, Url)> {
    PrintPattern::PRIORITY
        .iter()
        .filter_map(|pattern| pattern.apply(url).map(|candidate| (*pattern, candidate)))
        .collect()
}

/// Last meaningful path segment: at least 3 characters, not all digits,
/// with `.html`, `.htm` or `.php` removed.
pub(crate) fn recipe_slug(url: &Url) -> Option<String> {
    let segment = url
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .rev()
        .find(|segment| {
            segment.chars().count() >= 3 && !segment.chars().all(|c| c.is_ascii_digit())
        })?;

    let slug = [".html", ".htm", ".php"]
        .iter()
        .find_map(|extension| segment.strip_suffix(extension))
        .unwrap_or(segment);
    Some(slug.to_string())
}
