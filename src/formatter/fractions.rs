use regex::Regex;
use std::sync::LazyLock;

use crate::config::{parse_ascii_fraction, FormattingConfig};

/// Unicode FRACTION SLASH, as in "1⁄2"
const FRACTION_SLASH: char = '\u{2044}';

static DECIMAL_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]*\.[0-9]+").expect("valid decimal regex"));

/// Rewrites vulgar fractions and known decimals to ASCII "n/d".
#[derive(Debug, Clone)]
pub(crate) struct FractionNormalizer {
    /// Longest symbol first so multi-char keys win over their prefixes
    symbols: Vec<(String, String)>,
    decimals: Vec<(f64, String)>,
    tolerance: f64,
}

impl FractionNormalizer {
    pub(crate) fn new(config: &FormattingConfig) -> Self {
        let mut symbols: Vec<(String, String)> = config
            .fraction_normalizations
            .iter()
            .map(|(symbol, ascii)| (symbol.clone(), ascii.trim().to_string()))
            .collect();
        symbols.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));

        let mut decimals: Vec<(f64, String)> = config
            .decimal_fractions
            .iter()
            .filter_map(|(decimal, ascii)| {
                decimal
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .map(|value| (value, ascii.trim().to_string()))
            })
            .collect();
        decimals.sort_by(|a, b| a.0.total_cmp(&b.0));

        Self {
            symbols,
            decimals,
            tolerance: config.decimal_tolerance,
        }
    }

    pub(crate) fn normalize(&self, text: &str) -> String {
        let text = self.replace_symbols(text);
        self.replace_decimals(&text)
    }

    /// Numeric value of a vulgar fraction symbol, used for pluralization
    pub(crate) fn symbol_value(&self, symbol: &str) -> Option<f64> {
        self.symbols
            .iter()
            .find(|(s, _)| s == symbol)
            .and_then(|(_, ascii)| parse_ascii_fraction(ascii))
    }

    pub(crate) fn symbols(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(|(s, _)| s.as_str())
    }

    fn replace_symbols(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        'outer: while let Some(ch) = rest.chars().next() {
            for (symbol, ascii) in &self.symbols {
                if let Some(after) = rest.strip_prefix(symbol.as_str()) {
                    // "1½" is a mixed number, keep the whole part separate
                    if out.ends_with(|c: char| c.is_ascii_digit()) {
                        out.push(' ');
                    }
                    out.push_str(ascii);
                    rest = after;
                    continue 'outer;
                }
            }

            if ch == FRACTION_SLASH {
                out.push('/');
            } else {
                out.push(ch);
            }
            rest = &rest[ch.len_utf8()..];
        }

        out
    }

    fn replace_decimals(&self, text: &str) -> String {
        if self.decimals.is_empty() {
            return text.to_string();
        }

        let mut out = String::with_capacity(text.len());
        let mut last = 0;

        for token in DECIMAL_TOKEN.find_iter(text) {
            if !is_standalone(text, token.start(), token.end()) {
                continue;
            }
            if let Some(ascii) = self.lookup(token.as_str()) {
                out.push_str(&text[last..token.start()]);
                out.push_str(ascii);
                last = token.end();
            }
        }

        out.push_str(&text[last..]);
        out
    }

    /// Closest known decimal within tolerance; values >= 1 are never converted.
    fn lookup(&self, token: &str) -> Option<&str> {
        let value: f64 = token.parse().ok()?;
        if value >= 1.0 {
            return None;
        }

        self.decimals
            .iter()
            .map(|(known, ascii)| ((known - value).abs(), ascii))
            .filter(|(distance, _)| *distance <= self.tolerance + f64::EPSILON)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, ascii)| ascii.as_str())
    }
}

/// A decimal token that is not glued to a word, version string or ratio.
fn is_standalone(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    if matches!(before, Some(c) if c.is_alphanumeric() || c == '.' || c == '/' || c == ',') {
        return false;
    }

    let mut after = text[end..].chars();
    match after.next() {
        Some('.') | Some(',') | Some('/') => !after.next().is_some_and(|c| c.is_ascii_digit()),
        _ => true,
    }
}
