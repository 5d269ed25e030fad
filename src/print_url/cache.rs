use async_trait::async_trait;
use dashmap::DashMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use url::Url;

use super::patterns::PrintPattern;
use crate::error::RecipeDuckError;

/// What worked last time for a domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrintStrategy {
    Pattern(PrintPattern),
    /// The detection model found a link that no pattern produces
    Llm,
}

impl fmt::Display for PrintStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrintStrategy::Pattern(pattern) => write!(f, "{}", pattern),
            PrintStrategy::Llm => f.write_str("llm"),
        }
    }
}

/// Per-domain memory of the last successful strategy.
///
/// Entries are hints. A reader must re-validate whatever it gets back, and
/// concurrent writers for the same domain may overwrite each other.
#[async_trait]
pub trait DomainCache: Send + Sync {
    async fn get(&self, domain: &str) -> Option<PrintStrategy>;

    async fn put(&self, domain: &str, strategy: PrintStrategy);
}

/// Process-lifetime cache
#[derive(Debug, Default)]
pub struct InMemoryDomainCache {
    entries: DashMap<String, PrintStrategy>,
}

impl InMemoryDomainCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl DomainCache for InMemoryDomainCache {
    async fn get(&self, domain: &str) -> Option<PrintStrategy> {
        self.entries.get(domain).map(|entry| *entry.value())
    }

    async fn put(&self, domain: &str, strategy: PrintStrategy) {
        self.entries.insert(domain.to_string(), strategy);
    }
}

/// Cache backed by a JSON file, rewritten after every update.
///
/// Write failures are logged and otherwise ignored: the in-memory copy stays
/// authoritative for the rest of the process.
#[derive(Debug)]
pub struct JsonFileDomainCache {
    path: PathBuf,
    entries: DashMap<String, PrintStrategy>,
    write_lock: Mutex<()>,
}

impl JsonFileDomainCache {
    /// Load the cache at `path`. A missing file starts an empty cache; an
    /// unreadable one is logged and replaced on the next write.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, RecipeDuckError> {
        let path = path.into();
        let mut entries = DashMap::new();

        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                match serde_json::from_str::<BTreeMap<String, PrintStrategy>>(&contents) {
                    Ok(stored) => {
                        debug!("Loaded {} domain cache entries from {:?}", stored.len(), path);
                        entries.extend(stored);
                    }
                    Err(e) => warn!("Ignoring corrupt domain cache {:?}: {}", path, e),
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No domain cache at {:?}, starting empty", path);
            }
            Err(e) => return Err(e.into()),
        }

        Ok(Self {
            path,
            entries,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self) -> Result<(), RecipeDuckError> {
        let _guard = self.write_lock.lock().await;

        let snapshot: BTreeMap<String, PrintStrategy> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        let json = serde_json::to_string_pretty(&snapshot)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl DomainCache for JsonFileDomainCache {
    async fn get(&self, domain: &str) -> Option<PrintStrategy> {
        self.entries.get(domain).map(|entry| *entry.value())
    }

    async fn put(&self, domain: &str, strategy: PrintStrategy) {
        self.entries.insert(domain.to_string(), strategy);
        if let Err(e) = self.persist().await {
            warn!("Failed to write domain cache {:?}: {}", self.path, e);
        }
    }
}

/// Cache key for `url`: lowercase host without `www.`, plus a non-default port.
pub fn normalize_domain(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    if host.is_empty() {
        return None;
    }

    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}
