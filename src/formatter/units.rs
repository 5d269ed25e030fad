use regex::{Captures, Regex};
use std::collections::HashMap;

use super::fractions::FractionNormalizer;
use crate::config::{parse_ascii_fraction, FormattingConfig};
use crate::error::RecipeDuckError;

/// Replaces abbreviated units that follow a quantity with their canonical
/// word, pluralized by the quantity.
#[derive(Debug, Clone)]
pub(crate) struct UnitNormalizer {
    /// `None` when no units are configured
    pattern: Option<Regex>,
    exact: HashMap<String, String>,
    folded: HashMap<String, String>,
    plurals: HashMap<String, String>,
    pluralize: bool,
    vulgar: Vec<(String, f64)>,
}

impl UnitNormalizer {
    pub(crate) fn new(
        config: &FormattingConfig,
        fractions: &FractionNormalizer,
    ) -> Result<Self, RecipeDuckError> {
        let mut entries: Vec<(String, String)> = config
            .unit_normalizations
            .iter()
            .map(|(abbr, unit)| (collapse_whitespace(abbr), unit.trim().to_string()))
            .collect();
        entries.sort();

        let mut exact = HashMap::new();
        let mut folded = HashMap::new();
        for (abbr, unit) in &entries {
            exact.insert(abbr.clone(), unit.clone());
            let key = abbr.to_lowercase();
            if key == *abbr {
                folded.insert(key, unit.clone());
            } else {
                folded.entry(key).or_insert_with(|| unit.clone());
            }
        }

        let vulgar: Vec<(String, f64)> = fractions
            .symbols()
            .filter_map(|symbol| fractions.symbol_value(symbol).map(|v| (symbol.to_string(), v)))
            .collect();

        let pattern = if folded.is_empty() {
            None
        } else {
            Some(build_pattern(folded.keys(), &vulgar)?)
        };

        Ok(Self {
            pattern,
            exact,
            folded,
            plurals: config.unit_plurals.clone(),
            pluralize: config.pluralize_units,
            vulgar,
        })
    }

    pub(crate) fn normalize(&self, text: &str) -> String {
        match &self.pattern {
            Some(pattern) => pattern
                .replace_all(text, |caps: &Captures| self.replace(caps))
                .into_owned(),
            None => text.to_string(),
        }
    }

    /// Canonical unit for a table cell that holds nothing but a unit token.
    pub(crate) fn normalize_unit_cell(&self, cell: &str, quantity: Option<&str>) -> Option<String> {
        let token = collapse_whitespace(cell);
        let canonical = self.canonical(&token).or_else(|| {
            token
                .strip_suffix(['s', 'S'])
                .and_then(|singular| self.canonical(singular))
        })?;
        Some(self.inflect(canonical, quantity))
    }

    fn replace(&self, caps: &Captures) -> String {
        let quantity = caps["qty"].trim();
        let unit = collapse_whitespace(&caps["unit"]);
        match self.canonical(&unit) {
            Some(canonical) => format!(
                "{} {}{}",
                quantity,
                self.inflect(canonical, Some(quantity)),
                caps.name("space").map_or("", |space| space.as_str())
            ),
            None => caps[0].to_string(),
        }
    }

    fn canonical(&self, unit: &str) -> Option<&str> {
        self.exact
            .get(unit)
            .or_else(|| self.folded.get(&unit.to_lowercase()))
            .map(String::as_str)
    }

    fn inflect(&self, canonical: &str, quantity: Option<&str>) -> String {
        let plural = self.pluralize
            && quantity
                .and_then(|q| self.quantity_value(q))
                .is_some_and(|value| value > 1.0);

        if plural {
            self.plurals
                .get(canonical)
                .cloned()
                .unwrap_or_else(|| english_plural(canonical))
        } else {
            canonical.to_string()
        }
    }

    /// Value of "2", "1.5", "1/2", "1 1/2", "1½"; `None` when unparseable.
    pub(crate) fn quantity_value(&self, quantity: &str) -> Option<f64> {
        quantity
            .split_whitespace()
            .map(|part| self.part_value(part))
            .sum::<Option<f64>>()
    }

    fn part_value(&self, part: &str) -> Option<f64> {
        if part.contains('/') {
            return parse_ascii_fraction(part);
        }
        if let Ok(value) = part.parse::<f64>() {
            return Some(value);
        }
        self.vulgar.iter().find_map(|(symbol, value)| {
            let whole = part.strip_suffix(symbol.as_str())?;
            if whole.is_empty() {
                Some(*value)
            } else {
                whole.parse::<f64>().ok().map(|w| w + value)
            }
        })
    }
}

fn build_pattern<'a>(
    units: impl Iterator<Item = &'a String>,
    vulgar: &[(String, f64)],
) -> Result<Regex, RecipeDuckError> {
    let mut units: Vec<&String> = units.collect();
    // Longest first so "tbsp" is tried before "t"
    units.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    let alternation = units
        .iter()
        .map(|unit| regex::escape(unit).replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|");

    let mut quantity = vec![
        r"\b[0-9]+\s+[0-9]+/[0-9]+".to_string(),
        r"\b[0-9]+/[0-9]+".to_string(),
        r"\b[0-9]+\.[0-9]+".to_string(),
    ];
    if !vulgar.is_empty() {
        let symbols = vulgar
            .iter()
            .map(|(symbol, _)| regex::escape(symbol))
            .collect::<Vec<_>>()
            .join("|");
        quantity.push(format!(r"(?:\b[0-9]+\s*)?(?:{})", symbols));
    }
    quantity.push(r"\b[0-9]+".to_string());

    let pattern = format!(
        r"(?i)(?P<qty>{})\s*(?P<unit>{})(?P<plural>s)?(?:\.(?P<space>\s)|\b)",
        quantity.join("|"),
        alternation
    );

    Regex::new(&pattern)
        .map_err(|e| RecipeDuckError::InvalidConfig(format!("unit_normalizations: {}", e)))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Regular English plural of the last word of `word`.
pub(crate) fn english_plural(word: &str) -> String {
    let Some(last) = word.chars().last() else {
        return String::new();
    };
    if !last.is_alphabetic() {
        return word.to_string();
    }

    let shouting = word.chars().any(char::is_alphabetic)
        && word.chars().filter(|c| c.is_alphabetic()).all(char::is_uppercase);
    let lower = word.to_lowercase();

    let (stem, suffix) = if lower.ends_with("ss")
        || lower.ends_with('x')
        || lower.ends_with('z')
        || lower.ends_with("ch")
        || lower.ends_with("sh")
    {
        (word, "es")
    } else if lower.ends_with('s') {
        (word, "")
    } else if lower.ends_with('y')
        && !lower
            .chars()
            .rev()
            .nth(1)
            .is_some_and(|c| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u'))
    {
        // Stem from `word` itself: lowercasing can change byte lengths
        let (last_index, _) = word.char_indices().last().unwrap_or((0, last));
        (&word[..last_index], "ies")
    } else {
        (word, "s")
    };

    if shouting {
        format!("{}{}", stem, suffix.to_uppercase())
    } else {
        format!("{}{}", stem, suffix)
    }
}
