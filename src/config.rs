use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::RecipeDuckError;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Provider used for recipe extraction when not specified
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Map of provider name to provider configuration
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Fallback configuration for automatic provider switching
    #[serde(default)]
    pub fallback: FallbackConfig,
    /// Deterministic post-processing of the model output
    #[serde(default)]
    pub formatting: FormattingConfig,
    /// Print-friendly URL search
    #[serde(default)]
    pub print_url: PrintUrlConfig,
    /// Page fetch timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

/// Configuration for a specific AI provider
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// Whether this provider is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Model identifier (e.g., "claude-3-5-sonnet-20241022", "gpt-4o")
    pub model: String,
    /// Temperature for generation (0.0-1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// API key for authentication (can also be set via environment variable)
    pub api_key: Option<String>,
    /// Base URL for API endpoint (for custom or proxy endpoints)
    pub base_url: Option<String>,
}

impl ProviderConfig {
    /// Built-in settings for a known provider, used when the config file has none.
    pub fn builtin(provider_name: &str) -> Option<Self> {
        let model = match provider_name {
            "anthropic" => "claude-3-5-sonnet-20241022",
            "openai" => "gpt-4o",
            _ => return None,
        };

        Some(ProviderConfig {
            enabled: true,
            model: model.to_string(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            api_key: None,
            base_url: None,
        })
    }
}

/// Configuration for provider fallback and retry behavior
#[derive(Debug, Deserialize, Clone)]
pub struct FallbackConfig {
    /// Whether fallback is enabled
    #[serde(default)]
    pub enabled: bool,
    /// Order of providers to try (first to last)
    #[serde(default)]
    pub order: Vec<String>,
    /// Number of retry attempts per provider before fallback
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Initial delay between retries in milliseconds (uses linear backoff)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            order: Vec::new(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

/// Rules applied by [`crate::formatter::RecipeFormatter`].
///
/// The value is read-only once a formatter has been built from it;
/// validation happens in [`FormattingConfig::validate`].
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct FormattingConfig {
    /// When false the formatter returns its input untouched
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Abbreviated unit -> canonical full word
    #[serde(default = "default_unit_normalizations")]
    pub unit_normalizations: HashMap<String, String>,
    /// Canonical unit -> plural form, for units where appending "s" is wrong
    #[serde(default = "default_unit_plurals")]
    pub unit_plurals: HashMap<String, String>,
    /// Unicode vulgar fraction -> ASCII "n/d"
    #[serde(default = "default_fraction_normalizations")]
    pub fraction_normalizations: HashMap<String, String>,
    /// Known decimal value -> ASCII "n/d"
    #[serde(default = "default_decimal_fractions")]
    pub decimal_fractions: HashMap<String, String>,
    /// Maximum distance between a decimal in the text and a known value
    #[serde(default = "default_decimal_tolerance")]
    pub decimal_tolerance: f64,
    #[serde(default = "default_true")]
    pub pluralize_units: bool,
    #[serde(default = "default_true")]
    pub fraction_conversion: bool,
    /// Ensure every ingredient line starts with `ingredient_bullet`
    #[serde(default = "default_true")]
    pub enforce_ingredient_bullets: bool,
    #[serde(default = "default_ingredient_bullet")]
    pub ingredient_bullet: String,
    /// Number plain instruction lines, not just the ones with a marker
    #[serde(default = "default_true")]
    pub enforce_numbered_steps: bool,
    /// Separate numbered steps with one blank line
    #[serde(default)]
    pub blank_line_between_steps: bool,
}

impl Default for FormattingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            unit_normalizations: default_unit_normalizations(),
            unit_plurals: default_unit_plurals(),
            fraction_normalizations: default_fraction_normalizations(),
            decimal_fractions: default_decimal_fractions(),
            decimal_tolerance: default_decimal_tolerance(),
            pluralize_units: true,
            fraction_conversion: true,
            enforce_ingredient_bullets: true,
            ingredient_bullet: default_ingredient_bullet(),
            enforce_numbered_steps: true,
            blank_line_between_steps: false,
        }
    }
}

impl FormattingConfig {
    /// Configuration that turns the formatter into an identity function
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Check the tables and flags, failing on the first invalid entry.
    pub fn validate(&self) -> Result<(), RecipeDuckError> {
        for (abbreviation, canonical) in &self.unit_normalizations {
            if abbreviation.trim().is_empty() {
                return Err(invalid("unit_normalizations contains an empty abbreviation"));
            }
            if canonical.trim().is_empty() {
                return Err(invalid(format!(
                    "unit_normalizations maps '{}' to an empty unit",
                    abbreviation
                )));
            }
        }

        for (singular, plural) in &self.unit_plurals {
            if singular.trim().is_empty() || plural.trim().is_empty() {
                return Err(invalid("unit_plurals entries must not be empty"));
            }
        }

        for (symbol, fraction) in &self.fraction_normalizations {
            if symbol.is_empty() {
                return Err(invalid("fraction_normalizations contains an empty key"));
            }
            if parse_ascii_fraction(fraction).is_none() {
                return Err(invalid(format!(
                    "fraction_normalizations maps '{}' to '{}', expected n/d",
                    symbol, fraction
                )));
            }
        }

        for (decimal, fraction) in &self.decimal_fractions {
            match decimal.trim().parse::<f64>() {
                Ok(value) if value > 0.0 && value < 1.0 => {}
                _ => {
                    return Err(invalid(format!(
                        "decimal_fractions key '{}' must be a decimal between 0 and 1",
                        decimal
                    )))
                }
            }
            if parse_ascii_fraction(fraction).is_none() {
                return Err(invalid(format!(
                    "decimal_fractions maps '{}' to '{}', expected n/d",
                    decimal, fraction
                )));
            }
        }

        if !self.decimal_tolerance.is_finite()
            || self.decimal_tolerance < 0.0
            || self.decimal_tolerance >= 0.05
        {
            return Err(invalid(format!(
                "decimal_tolerance must be in [0, 0.05), got {}",
                self.decimal_tolerance
            )));
        }

        if !matches!(self.ingredient_bullet.as_str(), "-" | "*" | "+") {
            return Err(invalid(format!(
                "ingredient_bullet must be one of '-', '*', '+', got '{}'",
                self.ingredient_bullet
            )));
        }

        Ok(())
    }
}

/// Settings for the print-friendly URL search
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PrintUrlConfig {
    /// Search for a print version before fetching a recipe page
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Ask the detection model when no pattern matches
    #[serde(default = "default_true")]
    pub llm_detection: bool,
    /// Wall-clock budget for the LLM detection step
    #[serde(default = "default_detection_timeout")]
    pub detection_timeout_seconds: f64,
    /// Model used for LLM detection (a small, cheap one is enough)
    #[serde(default = "default_detection_model")]
    pub detection_model: String,
    /// Budget for the whole search, all steps included
    #[serde(default = "default_search_budget")]
    pub search_budget_seconds: f64,
    /// Timeout for each HEAD/GET check
    #[serde(default = "default_check_timeout")]
    pub check_timeout_seconds: f64,
    /// A checked page smaller than this is treated as missing
    #[serde(default = "default_min_content_length")]
    pub min_content_length: u64,
    /// A checked page larger than this is treated as missing
    #[serde(default = "default_max_content_length")]
    pub max_content_length: u64,
    /// Upper bound on the HTML excerpt sent to the detection model
    #[serde(default = "default_excerpt_max_chars")]
    pub excerpt_max_chars: usize,
    /// Persist the domain cache to this JSON file
    #[serde(default)]
    pub cache_path: Option<PathBuf>,
}

impl Default for PrintUrlConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            llm_detection: true,
            detection_timeout_seconds: default_detection_timeout(),
            detection_model: default_detection_model(),
            search_budget_seconds: default_search_budget(),
            check_timeout_seconds: default_check_timeout(),
            min_content_length: default_min_content_length(),
            max_content_length: default_max_content_length(),
            excerpt_max_chars: default_excerpt_max_chars(),
            cache_path: None,
        }
    }
}

impl PrintUrlConfig {
    pub fn validate(&self) -> Result<(), RecipeDuckError> {
        for (name, seconds) in [
            ("detection_timeout_seconds", self.detection_timeout_seconds),
            ("search_budget_seconds", self.search_budget_seconds),
            ("check_timeout_seconds", self.check_timeout_seconds),
        ] {
            if !seconds.is_finite() || seconds <= 0.0 {
                return Err(invalid(format!(
                    "{} must be a positive number of seconds, got {}",
                    name, seconds
                )));
            }
        }

        if self.min_content_length >= self.max_content_length {
            return Err(invalid(format!(
                "min_content_length ({}) must be below max_content_length ({})",
                self.min_content_length, self.max_content_length
            )));
        }

        if self.detection_model.trim().is_empty() {
            return Err(invalid("detection_model must not be empty"));
        }

        if self.excerpt_max_chars == 0 {
            return Err(invalid("excerpt_max_chars must be greater than zero"));
        }

        Ok(())
    }

    pub fn detection_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.detection_timeout_seconds)
    }

    pub fn search_budget(&self) -> Duration {
        Duration::from_secs_f64(self.search_budget_seconds)
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.check_timeout_seconds)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            providers: HashMap::new(),
            fallback: FallbackConfig::default(),
            formatting: FormattingConfig::default(),
            print_url: PrintUrlConfig::default(),
            timeout: default_timeout(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with RECIPE_DUCK__ prefix
    /// 2. recipe-duck.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: RECIPE_DUCK__PRINT_URL__DETECTION_TIMEOUT_SECONDS
    ///
    /// The loaded value is validated before it is returned.
    pub fn load() -> Result<Self, RecipeDuckError> {
        let config = load_config()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RecipeDuckError> {
        if self.timeout == 0 {
            return Err(invalid("timeout must be greater than zero"));
        }
        for (name, provider) in &self.providers {
            if provider.model.trim().is_empty() {
                return Err(invalid(format!("provider '{}' has no model", name)));
            }
        }
        self.formatting.validate()?;
        self.print_url.validate()
    }

    /// Settings for `provider_name`, falling back to built-in defaults.
    pub fn provider_config(&self, provider_name: &str) -> Option<ProviderConfig> {
        self.providers
            .get(provider_name)
            .cloned()
            .or_else(|| ProviderConfig::builtin(provider_name))
    }
}

/// Load configuration from file and environment variables without validating it
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("recipe-duck").required(false))
        // Use double underscore for nested: RECIPE_DUCK__FORMATTING__ENABLED
        .add_source(
            Environment::with_prefix("RECIPE_DUCK")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

/// Parse "n/d" into its numeric value
pub(crate) fn parse_ascii_fraction(fraction: &str) -> Option<f64> {
    let (numerator, denominator) = fraction.trim().split_once('/')?;
    let numerator: u32 = numerator.trim().parse().ok()?;
    let denominator: u32 = denominator.trim().parse().ok()?;
    if denominator == 0 {
        return None;
    }
    Some(numerator as f64 / denominator as f64)
}

fn invalid(message: impl Into<String>) -> RecipeDuckError {
    RecipeDuckError::InvalidConfig(message.into())
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_provider() -> String {
    "anthropic".to_string()
}

fn default_temperature() -> f32 {
    0.0
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_timeout() -> u64 {
    30
}

fn default_ingredient_bullet() -> String {
    "-".to_string()
}

fn default_decimal_tolerance() -> f64 {
    0.005
}

fn default_detection_timeout() -> f64 {
    15.0
}

fn default_detection_model() -> String {
    "claude-3-5-haiku-20241022".to_string()
}

fn default_search_budget() -> f64 {
    30.0
}

fn default_check_timeout() -> f64 {
    5.0
}

fn default_min_content_length() -> u64 {
    1024
}

fn default_max_content_length() -> u64 {
    5 * 1024 * 1024
}

fn default_excerpt_max_chars() -> usize {
    10 * 1024
}

fn string_map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn default_unit_normalizations() -> HashMap<String, String> {
    string_map(&[
        // Volume
        ("tbsp", "tablespoon"),
        ("tbs", "tablespoon"),
        ("tbl", "tablespoon"),
        ("T", "tablespoon"),
        ("tsp", "teaspoon"),
        ("t", "teaspoon"),
        ("c", "cup"),
        ("pt", "pint"),
        ("qt", "quart"),
        ("gal", "gallon"),
        ("fl oz", "fluid ounce"),
        ("fl. oz", "fluid ounce"),
        ("ml", "milliliter"),
        ("l", "liter"),
        // Weight
        ("oz", "ounce"),
        ("lb", "pound"),
        ("lbs", "pound"),
        ("g", "gram"),
        ("kg", "kilogram"),
        ("mg", "milligram"),
    ])
}

fn default_unit_plurals() -> HashMap<String, String> {
    string_map(&[
        ("tablespoon", "tablespoons"),
        ("teaspoon", "teaspoons"),
        ("cup", "cups"),
        ("pint", "pints"),
        ("quart", "quarts"),
        ("gallon", "gallons"),
        ("fluid ounce", "fluid ounces"),
        ("ounce", "ounces"),
        ("pound", "pounds"),
        ("gram", "grams"),
        ("kilogram", "kilograms"),
        ("milligram", "milligrams"),
        ("milliliter", "milliliters"),
        ("liter", "liters"),
        ("pinch", "pinches"),
        ("dash", "dashes"),
        ("box", "boxes"),
        ("leaf", "leaves"),
    ])
}

fn default_fraction_normalizations() -> HashMap<String, String> {
    string_map(&[
        ("½", "1/2"),
        ("⅓", "1/3"),
        ("⅔", "2/3"),
        ("¼", "1/4"),
        ("¾", "3/4"),
        ("⅕", "1/5"),
        ("⅖", "2/5"),
        ("⅗", "3/5"),
        ("⅘", "4/5"),
        ("⅙", "1/6"),
        ("⅚", "5/6"),
        ("⅐", "1/7"),
        ("⅛", "1/8"),
        ("⅜", "3/8"),
        ("⅝", "5/8"),
        ("⅞", "7/8"),
        ("⅑", "1/9"),
        ("⅒", "1/10"),
    ])
}

fn default_decimal_fractions() -> HashMap<String, String> {
    string_map(&[
        ("0.5", "1/2"),
        ("0.25", "1/4"),
        ("0.75", "3/4"),
        ("0.33", "1/3"),
        ("0.67", "2/3"),
        ("0.125", "1/8"),
    ])
}
