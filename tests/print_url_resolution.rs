use async_trait::async_trait;
use mockito::{Server, ServerGuard};
use recipe_duck::fetchers::RequestFetcher;
use recipe_duck::print_url::{normalize_domain, HttpChecker};
use recipe_duck::{
    DomainCache, ExtractionInput, InMemoryDomainCache, JsonFileDomainCache, LlmProvider,
    PrintPattern, PrintStrategy, PrintUrlConfig, PrintUrlResolver, RecipeDuckError,
    ResolutionMethod,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Answers every print-link question with the same reply
struct FixedAnswer {
    answer: String,
    calls: AtomicUsize,
}

impl FixedAnswer {
    fn new(answer: &str) -> Arc<Self> {
        Arc::new(FixedAnswer {
            answer: answer.to_string(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl LlmProvider for FixedAnswer {
    fn provider_name(&self) -> &str {
        "fixed"
    }

    async fn extract(
        &self,
        input: &ExtractionInput,
        prompt: &str,
    ) -> Result<String, RecipeDuckError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(prompt.contains("NONE"));
        assert!(matches!(input, ExtractionInput::Text(text) if text.contains("print")));
        Ok(self.answer.clone())
    }
}

fn config() -> PrintUrlConfig {
    PrintUrlConfig {
        llm_detection: false,
        check_timeout_seconds: 2.0,
        ..PrintUrlConfig::default()
    }
}

fn resolver(config: PrintUrlConfig, cache: Arc<dyn DomainCache>) -> PrintUrlResolver {
    let checker = HttpChecker::new(&config)
        .unwrap()
        .with_retry_delay(Duration::from_millis(10));
    PrintUrlResolver::new(config, Arc::new(checker), cache).unwrap()
}

/// Serve a print page of `size` bytes at `path`; HEAD carries no length
async fn serve_print_page(server: &mut ServerGuard, path: &str, size: usize) {
    server
        .mock("HEAD", path)
        .with_status(200)
        .create_async()
        .await;
    server
        .mock("GET", path)
        .with_status(200)
        .with_body("x".repeat(size))
        .create_async()
        .await;
}

#[tokio::test]
async fn test_pattern_found_then_served_from_cache() {
    let mut server = Server::new_async().await;
    serve_print_page(&mut server, "/recipes/soup/print/", 4096).await;
    serve_print_page(&mut server, "/recipes/stew/print/", 4096).await;

    let cache = Arc::new(InMemoryDomainCache::new());
    let resolver = resolver(config(), cache.clone());

    let soup = format!("{}/recipes/soup", server.url());
    let first = resolver.resolve(&soup).await;
    assert_eq!(first.method, ResolutionMethod::Pattern);
    assert_eq!(first.url, format!("{}/print/", soup));

    let domain = normalize_domain(&Url::parse(&soup).unwrap()).unwrap();
    assert_eq!(
        cache.get(&domain).await,
        Some(PrintStrategy::Pattern(PrintPattern::SuffixPrintSlash))
    );

    let stew = format!("{}/recipes/stew", server.url());
    let second = resolver.resolve(&stew).await;
    assert_eq!(second.method, ResolutionMethod::Cache);
    assert_eq!(second.url, format!("{}/print/", stew));
}

#[tokio::test]
async fn test_tiny_print_page_is_not_accepted() {
    let mut server = Server::new_async().await;
    serve_print_page(&mut server, "/recipes/soup/print/", 12).await;

    let resolver = resolver(config(), Arc::new(InMemoryDomainCache::new()));
    let soup = format!("{}/recipes/soup", server.url());

    let resolved = resolver.resolve(&soup).await;
    assert_eq!(resolved.method, ResolutionMethod::Original);
    assert_eq!(resolved.url, soup);
}

#[tokio::test]
async fn test_unreachable_host_falls_back_to_original() {
    let resolver = resolver(config(), Arc::new(InMemoryDomainCache::new()));

    let resolved = resolver.resolve("http://127.0.0.1:9/recipes/soup").await;
    assert_eq!(resolved.method, ResolutionMethod::Original);
    assert_eq!(resolved.url, "http://127.0.0.1:9/recipes/soup");
}

#[tokio::test]
async fn test_model_finds_unusual_print_link() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/recipes/stew")
        .with_status(200)
        .with_body(
            r#"<html><body>
                <a href="/about">About us</a>
                <a class="recipe-print" href="/printable/stew">Print this recipe</a>
            </body></html>"#,
        )
        .create_async()
        .await;
    serve_print_page(&mut server, "/printable/stew", 4096).await;

    let provider = FixedAnswer::new("/printable/stew");
    let fetcher = Arc::new(RequestFetcher::new(Some(Duration::from_secs(5))).unwrap());
    let cache = Arc::new(InMemoryDomainCache::new());
    let resolver = resolver(
        PrintUrlConfig {
            llm_detection: true,
            ..config()
        },
        cache.clone(),
    )
    .with_llm_detection(fetcher, provider.clone());

    let stew = format!("{}/recipes/stew", server.url());
    let resolved = resolver.resolve(&stew).await;
    assert_eq!(resolved.method, ResolutionMethod::Llm);
    assert_eq!(resolved.url, format!("{}/printable/stew", server.url()));
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

    let domain = normalize_domain(&Url::parse(&stew).unwrap()).unwrap();
    assert_eq!(cache.get(&domain).await, Some(PrintStrategy::Llm));
}

#[tokio::test]
async fn test_model_answering_none() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/recipes/stew")
        .with_status(200)
        .with_body(r#"<html><body><button onclick="window.print()">Print</button></body></html>"#)
        .create_async()
        .await;

    let provider = FixedAnswer::new("NONE");
    let fetcher = Arc::new(RequestFetcher::new(None).unwrap());
    let cache = Arc::new(InMemoryDomainCache::new());
    let resolver = resolver(
        PrintUrlConfig {
            llm_detection: true,
            ..config()
        },
        cache.clone(),
    )
    .with_llm_detection(fetcher, provider.clone());

    let stew = format!("{}/recipes/stew", server.url());
    let resolved = resolver.resolve(&stew).await;
    assert_eq!(resolved.method, ResolutionMethod::Original);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_json_cache_survives_restart() {
    let mut server = Server::new_async().await;
    serve_print_page(&mut server, "/recipes/soup/print/", 4096).await;
    serve_print_page(&mut server, "/recipes/pie/print/", 4096).await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cache").join("domains.json");

    let soup = format!("{}/recipes/soup", server.url());
    {
        let cache = Arc::new(JsonFileDomainCache::open(&path).await.unwrap());
        let resolver = resolver(config(), cache);
        assert_eq!(resolver.resolve(&soup).await.method, ResolutionMethod::Pattern);
    }

    let stored = std::fs::read_to_string(&path).unwrap();
    assert!(stored.contains("suffix_print_slash"));

    let cache = Arc::new(JsonFileDomainCache::open(&path).await.unwrap());
    let resolver = resolver(config(), cache);
    let pie = format!("{}/recipes/pie", server.url());
    let resolved = resolver.resolve(&pie).await;
    assert_eq!(resolved.method, ResolutionMethod::Cache);
    assert_eq!(resolved.url, format!("{}/print/", pie));
}

#[tokio::test]
async fn test_disabled_search_makes_no_requests() {
    let mut server = Server::new_async().await;
    let head = server
        .mock("HEAD", mockito::Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let resolver = resolver(
        PrintUrlConfig {
            enabled: false,
            ..config()
        },
        Arc::new(InMemoryDomainCache::new()),
    );
    let soup = format!("{}/recipes/soup", server.url());

    let resolved = resolver.resolve(&soup).await;
    assert_eq!(resolved.method, ResolutionMethod::Original);
    head.assert_async().await;
}
