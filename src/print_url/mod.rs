//! Print-friendly URL resolution.
//!
//! Given a recipe page URL, [`PrintUrlResolver::resolve`] looks for a print
//! version of the page, which is usually smaller and free of ads:
//!
//! 1. the strategy cached for the domain, if any
//! 2. the fixed [`PrintPattern`] sweep, in priority order
//! 3. optionally, asking a model to read the page's print links
//! 4. the original URL
//!
//! The first step that yields a usable page wins. Resolution never fails;
//! every error along the way is logged and treated as "try the next step".

mod cache;
mod llm;
mod patterns;
mod check;

pub use cache::{normalize_domain, DomainCache, InMemoryDomainCache, JsonFileDomainCache, PrintStrategy};
pub use patterns::{candidates, PrintPattern};
pub use check::{HttpChecker, UrlChecker};

use log::{debug, info, warn};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout, Instant};
use url::Url;

use crate::config::PrintUrlConfig;
use crate::error::RecipeDuckError;
use crate::fetchers::HtmlFetcher;
use crate::model::ExtractionInput;
use crate::providers::{build_print_detection_prompt, LlmProvider};

/// How a [`ResolvedUrl`] was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionMethod {
    Pattern,
    Cache,
    Llm,
    Original,
}

impl ResolutionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionMethod::Pattern => "pattern",
            ResolutionMethod::Cache => "cache",
            ResolutionMethod::Llm => "llm",
            ResolutionMethod::Original => "original",
        }
    }
}

impl fmt::Display for ResolutionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUrl {
    pub url: String,
    pub method: ResolutionMethod,
    pub elapsed: Duration,
}

/// Page fetcher and model used for the optional detection step
struct Detection {
    fetcher: Arc<dyn HtmlFetcher>,
    provider: Arc<dyn LlmProvider>,
}

pub struct PrintUrlResolver {
    config: PrintUrlConfig,
    checker: Arc<dyn UrlChecker>,
    cache: Arc<dyn DomainCache>,
    detection: Option<Detection>,
}

impl PrintUrlResolver {
    /// Create a resolver, validating `config` first.
    pub fn new(
        config: PrintUrlConfig,
        checker: Arc<dyn UrlChecker>,
        cache: Arc<dyn DomainCache>,
    ) -> Result<Self, RecipeDuckError> {
        config.validate()?;
        Ok(Self {
            config,
            checker,
            cache,
            detection: None,
        })
    }

    /// Resolver with an [`HttpChecker`] and an in-memory cache
    pub fn with_http_checker(config: PrintUrlConfig) -> Result<Self, RecipeDuckError> {
        let checker = HttpChecker::new(&config)?;
        Self::new(config, Arc::new(checker), Arc::new(InMemoryDomainCache::new()))
    }

    /// Enable the model-based step. It still only runs when
    /// `llm_detection` is set in the configuration.
    pub fn with_llm_detection(
        mut self,
        fetcher: Arc<dyn HtmlFetcher>,
        provider: Arc<dyn LlmProvider>,
    ) -> Self {
        self.detection = Some(Detection { fetcher, provider });
        self
    }

    pub fn config(&self) -> &PrintUrlConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<dyn DomainCache> {
        &self.cache
    }

    /// Find the best URL to fetch for `url`. Always returns a URL.
    pub async fn resolve(&self, url: &str) -> ResolvedUrl {
        let start = Instant::now();
        let original = |start: Instant| ResolvedUrl {
            url: url.to_string(),
            method: ResolutionMethod::Original,
            elapsed: start.elapsed(),
        };

        if !self.config.enabled {
            return original(start);
        }

        let page = match Url::parse(url) {
            Ok(page) if matches!(page.scheme(), "http" | "https") => page,
            _ => {
                debug!("Not searching for a print version of {}", url);
                return original(start);
            }
        };

        info!("Searching for a print version of {}", url);
        match timeout(self.config.search_budget(), self.search(&page)).await {
            Ok(Some((found, method))) => {
                let resolved = ResolvedUrl {
                    url: found.to_string(),
                    method,
                    elapsed: start.elapsed(),
                };
                info!(
                    "Using {} (method: {}, {:.2}s)",
                    resolved.url,
                    method,
                    resolved.elapsed.as_secs_f64()
                );
                resolved
            }
            Ok(None) => {
                let resolved = original(start);
                info!(
                    "No print version found for {} ({:.2}s)",
                    url,
                    resolved.elapsed.as_secs_f64()
                );
                resolved
            }
            Err(_) => {
                warn!(
                    "Print URL search budget of {:?} exhausted, using {}",
                    self.config.search_budget(),
                    url
                );
                original(start)
            }
        }
    }

    async fn search(&self, page: &Url) -> Option<(Url, ResolutionMethod)> {
        let domain = normalize_domain(page);
        let cached = match &domain {
            Some(domain) => self.cache.get(domain).await,
            None => None,
        };

        let mut detection_tried = false;
        if let (Some(domain), Some(strategy)) = (&domain, cached) {
            debug!("Cache hit for {}: {}", domain, strategy);
            let hit = match strategy {
                PrintStrategy::Pattern(pattern) => match pattern.apply(page) {
                    Some(candidate) => {
                        let usable = self.checker.check(candidate.as_str()).await;
                        usable.then_some(candidate)
                    }
                    None => None,
                },
                PrintStrategy::Llm => {
                    detection_tried = true;
                    self.detect(page).await
                }
            };

            if let Some(found) = hit {
                self.remember(domain, page, &found).await;
                return Some((found, ResolutionMethod::Cache));
            }
            debug!("Cached strategy for {} is stale", domain);
        }

        for (pattern, candidate) in candidates(page) {
            if cached == Some(PrintStrategy::Pattern(pattern)) {
                continue;
            }
            debug!("Trying {} ({})", candidate, pattern.id());
            if self.checker.check(candidate.as_str()).await {
                if let Some(domain) = &domain {
                    self.cache.put(domain, PrintStrategy::Pattern(pattern)).await;
                }
                return Some((candidate, ResolutionMethod::Pattern));
            }
        }

        if !detection_tried {
            if let Some(found) = self.detect(page).await {
                if let Some(domain) = &domain {
                    self.remember(domain, page, &found).await;
                }
                return Some((found, ResolutionMethod::Llm));
            }
        }

        None
    }

    /// Cache the pattern that reproduces `found`, or `Llm` when none does.
    async fn remember(&self, domain: &str, page: &Url, found: &Url) {
        let strategy = PrintPattern::identify(found.as_str())
            .filter(|pattern| pattern.apply(page).as_ref() == Some(found))
            .map(PrintStrategy::Pattern)
            .unwrap_or(PrintStrategy::Llm);
        self.cache.put(domain, strategy).await;
    }

    async fn detect(&self, page: &Url) -> Option<Url> {
        if !self.config.llm_detection {
            return None;
        }
        let detection = self.detection.as_ref()?;

        debug!("Asking {} for a print link", detection.provider.provider_name());
        match timeout(self.config.detection_timeout(), self.ask_model(detection, page)).await {
            Ok(found) => found,
            Err(_) => {
                warn!(
                    "Print link detection timed out after {:?}",
                    self.config.detection_timeout()
                );
                None
            }
        }
    }

    async fn ask_model(&self, detection: &Detection, page: &Url) -> Option<Url> {
        let fetched = match detection.fetcher.fetch(page.as_str()).await {
            Ok(fetched) if fetched.is_success() => fetched,
            Ok(fetched) => {
                debug!("{} returned HTTP {}", page, fetched.status);
                return None;
            }
            Err(e) => {
                debug!("Failed to fetch {} for detection: {}", page, e);
                return None;
            }
        };

        let Some(excerpt) = llm::print_cue_excerpt(&fetched.body, self.config.excerpt_max_chars)
        else {
            debug!("No print cues on {}", page);
            return None;
        };

        let prompt = build_print_detection_prompt(page.as_str());
        let answer = match detection
            .provider
            .extract(&ExtractionInput::Text(excerpt), &prompt)
            .await
        {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Print link detection failed: {}", e);
                return None;
            }
        };
        debug!("Detection answer: {}", answer.trim());

        let candidate = llm::parse_answer(&answer, page)?;
        if self.checker.check(candidate.as_str()).await {
            Some(candidate)
        } else {
            debug!("Suggested print link {} is not usable", candidate);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetchers::FetchedPage;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Accepts a fixed set of URLs and records every check
    #[derive(Default)]
    struct StubChecker {
        ok: Mutex<HashSet<String>>,
        checked: Mutex<Vec<String>>,
        delay: Option<Duration>,
    }

    impl StubChecker {
        fn accepting(urls: &[&str]) -> Self {
            let checker = Self::default();
            checker.set_ok(urls);
            checker
        }

        fn set_ok(&self, urls: &[&str]) {
            *self.ok.lock().unwrap() = urls.iter().map(|u| u.to_string()).collect();
        }

        fn checked(&self) -> Vec<String> {
            self.checked.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl UrlChecker for StubChecker {
        async fn check(&self, url: &str) -> bool {
            self.checked.lock().unwrap().push(url.to_string());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.ok.lock().unwrap().contains(url)
        }
    }

    struct StubFetcher {
        body: String,
    }

    #[async_trait]
    impl HtmlFetcher for StubFetcher {
        async fn fetch(&self, _url: &str) -> Result<FetchedPage, RecipeDuckError> {
            Ok(FetchedPage {
                status: 200,
                body: self.body.clone(),
            })
        }
    }

    struct StubProvider {
        answer: String,
        calls: AtomicUsize,
        delay: Option<Duration>,
    }

    impl StubProvider {
        fn answering(answer: &str) -> Self {
            Self {
                answer: answer.to_string(),
                calls: AtomicUsize::new(0),
                delay: None,
            }
        }
    }

    #[async_trait]
    impl LlmProvider for StubProvider {
        fn provider_name(&self) -> &str {
            "stub"
        }

        async fn extract(
            &self,
            _input: &ExtractionInput,
            _prompt: &str,
        ) -> Result<String, RecipeDuckError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self.answer.clone())
        }
    }

    const PRINT_PAGE: &str =
        r#"<html><body><a class="print" href="/recipes/print-view/soup">Print</a></body></html>"#;

    fn resolver(checker: Arc<StubChecker>, cache: Arc<InMemoryDomainCache>) -> PrintUrlResolver {
        PrintUrlResolver::new(PrintUrlConfig::default(), checker, cache).unwrap()
    }

    fn with_detection(
        resolver: PrintUrlResolver,
        provider: Arc<StubProvider>,
    ) -> PrintUrlResolver {
        resolver.with_llm_detection(
            Arc::new(StubFetcher {
                body: PRINT_PAGE.to_string(),
            }),
            provider,
        )
    }

    #[tokio::test]
    async fn test_pattern_match_is_cached() {
        let checker = Arc::new(StubChecker::accepting(&["https://example.com/recipe?print"]));
        let cache = Arc::new(InMemoryDomainCache::new());
        let resolver = resolver(checker, cache.clone());

        let resolved = resolver.resolve("https://example.com/recipe").await;
        assert_eq!(resolved.url, "https://example.com/recipe?print");
        assert_eq!(resolved.method, ResolutionMethod::Pattern);
        assert_eq!(
            cache.get("example.com").await,
            Some(PrintStrategy::Pattern(PrintPattern::QueryPrint))
        );
    }

    #[tokio::test]
    async fn test_earlier_pattern_wins() {
        let checker = Arc::new(StubChecker::accepting(&[
            "https://example.com/recipe?print",
            "https://example.com/recipe?printview",
        ]));
        let resolver = resolver(checker.clone(), Arc::new(InMemoryDomainCache::new()));

        let resolved = resolver.resolve("https://example.com/recipe").await;
        assert_eq!(resolved.url, "https://example.com/recipe?print");
        assert_eq!(checker.checked(), vec!["https://example.com/recipe?print"]);
    }

    #[tokio::test]
    async fn test_second_resolution_uses_cache() {
        let checker = Arc::new(StubChecker::accepting(&[
            "https://example.com/a/print/",
            "https://www.example.com/b/print/",
        ]));
        let resolver = resolver(checker.clone(), Arc::new(InMemoryDomainCache::new()));

        let first = resolver.resolve("https://example.com/a").await;
        assert_eq!(first.method, ResolutionMethod::Pattern);

        let second = resolver.resolve("https://www.example.com/b").await;
        assert_eq!(second.url, "https://www.example.com/b/print/");
        assert_eq!(second.method, ResolutionMethod::Cache);
        assert_eq!(checker.checked().last().unwrap(), "https://www.example.com/b/print/");
    }

    #[tokio::test]
    async fn test_stale_cache_falls_through_to_patterns() {
        let checker = Arc::new(StubChecker::accepting(&["https://example.com/a?print"]));
        let cache = Arc::new(InMemoryDomainCache::new());
        let resolver = resolver(checker.clone(), cache.clone());
        resolver.resolve("https://example.com/a").await;

        checker.set_ok(&["https://example.com/b?printview"]);
        let resolved = resolver.resolve("https://example.com/b").await;

        assert_eq!(resolved.url, "https://example.com/b?printview");
        assert_eq!(resolved.method, ResolutionMethod::Pattern);
        assert_eq!(
            cache.get("example.com").await,
            Some(PrintStrategy::Pattern(PrintPattern::QueryPrintview))
        );
        // The stale ?print candidate is checked once, not twice
        let checks = checker.checked();
        assert_eq!(
            checks.iter().filter(|u| *u == "https://example.com/b?print").count(),
            1
        );
    }

    #[tokio::test]
    async fn test_nothing_found_returns_original() {
        let checker = Arc::new(StubChecker::default());
        let cache = Arc::new(InMemoryDomainCache::new());
        let resolver = resolver(checker.clone(), cache.clone());

        let resolved = resolver.resolve("https://example.com/recipes/soup").await;
        assert_eq!(resolved.url, "https://example.com/recipes/soup");
        assert_eq!(resolved.method, ResolutionMethod::Original);
        assert_eq!(checker.checked().len(), 5);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_skips_search() {
        let checker = Arc::new(StubChecker::accepting(&["https://example.com/recipe?print"]));
        let config = PrintUrlConfig {
            enabled: false,
            ..Default::default()
        };
        let resolver =
            PrintUrlResolver::new(config, checker.clone(), Arc::new(InMemoryDomainCache::new()))
                .unwrap();

        let resolved = resolver.resolve("https://example.com/recipe").await;
        assert_eq!(resolved.method, ResolutionMethod::Original);
        assert!(checker.checked().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_url_returns_original() {
        let resolver = resolver(
            Arc::new(StubChecker::default()),
            Arc::new(InMemoryDomainCache::new()),
        );
        for input in ["not a url", "ftp://example.com/recipe", ""] {
            let resolved = resolver.resolve(input).await;
            assert_eq!(resolved.url, input);
            assert_eq!(resolved.method, ResolutionMethod::Original);
        }
    }

    #[tokio::test]
    async fn test_llm_detection_after_patterns() {
        let checker = Arc::new(StubChecker::accepting(&[
            "https://example.com/recipes/print-view/soup",
        ]));
        let cache = Arc::new(InMemoryDomainCache::new());
        let provider = Arc::new(StubProvider::answering("/recipes/print-view/soup"));
        let resolver = with_detection(resolver(checker, cache.clone()), provider.clone());

        let resolved = resolver.resolve("https://example.com/recipes/soup").await;
        assert_eq!(resolved.url, "https://example.com/recipes/print-view/soup");
        assert_eq!(resolved.method, ResolutionMethod::Llm);
        assert_eq!(cache.get("example.com").await, Some(PrintStrategy::Llm));

        let again = resolver.resolve("https://example.com/recipes/soup").await;
        assert_eq!(again.method, ResolutionMethod::Cache);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_remember_prefers_reproducible_pattern() {
        let cache = Arc::new(InMemoryDomainCache::new());
        let resolver = resolver(Arc::new(StubChecker::default()), cache.clone());
        let page = Url::parse("https://example.com/recipes/soup").unwrap();

        let found = Url::parse("https://example.com/wprm_print/soup").unwrap();
        resolver.remember("example.com", &page, &found).await;
        assert_eq!(
            cache.get("example.com").await,
            Some(PrintStrategy::Pattern(PrintPattern::WprmPrint))
        );

        // Looks like a pattern but the pattern would not produce it
        let found = Url::parse("https://example.com/other/print").unwrap();
        resolver.remember("example.com", &page, &found).await;
        assert_eq!(cache.get("example.com").await, Some(PrintStrategy::Llm));
    }

    #[tokio::test]
    async fn test_llm_none_answer_returns_original() {
        let checker = Arc::new(StubChecker::default());
        let provider = Arc::new(StubProvider::answering("NONE"));
        let resolver = with_detection(
            resolver(checker, Arc::new(InMemoryDomainCache::new())),
            provider.clone(),
        );

        let resolved = resolver.resolve("https://example.com/recipes/soup").await;
        assert_eq!(resolved.method, ResolutionMethod::Original);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_llm_detection_respects_flag() {
        let checker = Arc::new(StubChecker::accepting(&[
            "https://example.com/recipes/print-view/soup",
        ]));
        let provider = Arc::new(StubProvider::answering("/recipes/print-view/soup"));
        let config = PrintUrlConfig {
            llm_detection: false,
            ..Default::default()
        };
        let resolver =
            PrintUrlResolver::new(config, checker, Arc::new(InMemoryDomainCache::new()))
                .unwrap()
                .with_llm_detection(
                    Arc::new(StubFetcher {
                        body: PRINT_PAGE.to_string(),
                    }),
                    provider.clone(),
                );

        let resolved = resolver.resolve("https://example.com/recipes/soup").await;
        assert_eq!(resolved.method, ResolutionMethod::Original);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_llm_timeout_falls_through() {
        let checker = Arc::new(StubChecker::accepting(&[
            "https://example.com/recipes/print-view/soup",
        ]));
        let provider = Arc::new(StubProvider {
            delay: Some(Duration::from_secs(60)),
            ..StubProvider::answering("/recipes/print-view/soup")
        });
        let resolver = with_detection(
            resolver(checker, Arc::new(InMemoryDomainCache::new())),
            provider,
        );

        let resolved = resolver.resolve("https://example.com/recipes/soup").await;
        assert_eq!(resolved.method, ResolutionMethod::Original);
        assert!(resolved.elapsed >= Duration::from_secs(15));
        assert!(resolved.elapsed < Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_budget_exhaustion_returns_original() {
        let checker = Arc::new(StubChecker {
            delay: Some(Duration::from_secs(10)),
            ..StubChecker::accepting(&["https://example.com/recipe/print"])
        });
        let resolver = resolver(checker.clone(), Arc::new(InMemoryDomainCache::new()));

        let resolved = resolver.resolve("https://example.com/recipe").await;
        assert_eq!(resolved.method, ResolutionMethod::Original);
        assert_eq!(resolved.url, "https://example.com/recipe");
        assert!(resolved.elapsed <= Duration::from_secs(31));
        // 30s budget at 10s per check: the fifth candidate is never reached
        assert!(checker.checked().len() < 5);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PrintUrlConfig {
            detection_timeout_seconds: -1.0,
            ..Default::default()
        };
        let result = PrintUrlResolver::new(
            config,
            Arc::new(StubChecker::default()),
            Arc::new(InMemoryDomainCache::new()),
        );
        assert!(matches!(result, Err(RecipeDuckError::InvalidConfig(_))));
    }

    #[test]
    fn test_method_display() {
        assert_eq!(ResolutionMethod::Pattern.to_string(), "pattern");
        assert_eq!(ResolutionMethod::Original.to_string(), "original");
    }
}
