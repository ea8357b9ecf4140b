//! Cache Manager Module
//!
//! Intercepts requests and answers them from the network, the current cache
//! generation, or the pinned shell, depending on the request class.

use std::sync::Arc;

use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{
    classify, CacheStats, Fetcher, GenerationTable, InterceptedRequest, RequestClass, RequestKey,
    RequestMode, ResponseSnapshot,
};
use crate::error::{FailureKind, Result, VaultError};

/// Generation table shared by every manager of one process.
pub type SharedGenerations = Arc<RwLock<GenerationTable>>;

// == Lifecycle ==
/// Where a manager is in its install/activate sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lifecycle {
    /// Prepared but not serving
    Installing,
    /// Serving from the named generation
    Active { generation: String },
}

/// Where an intercepted response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Network,
    Cache,
    Fallback,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Network => "network",
            Source::Cache => "cache",
            Source::Fallback => "fallback",
        }
    }
}

/// Result of one interception.
#[derive(Debug)]
pub struct Intercepted {
    pub response: ResponseSnapshot,
    pub source: Source,
    /// Background refresh started for a cache hit. Dropping it detaches it.
    pub revalidation: Option<JoinHandle<()>>,
}

impl Intercepted {
    fn served(response: ResponseSnapshot, source: Source) -> Self {
        Self {
            response,
            source,
            revalidation: None,
        }
    }
}

// == Cache Manager ==
/// Request-interception cache bound to one generation.
pub struct CacheManager {
    generation: String,
    shell_url: String,
    table: SharedGenerations,
    fetcher: Arc<dyn Fetcher>,
    lifecycle: watch::Sender<Lifecycle>,
}

impl CacheManager {
    // == Constructor ==
    /// Creates an installing manager for `generation`.
    ///
    /// `shell_url` is the absolute URL of the document served to offline
    /// navigations.
    pub fn new(
        generation: impl Into<String>,
        shell_url: impl Into<String>,
        table: SharedGenerations,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        let (lifecycle, _) = watch::channel(Lifecycle::Installing);
        Self {
            generation: generation.into(),
            shell_url: shell_url.into(),
            table,
            fetcher,
            lifecycle,
        }
    }

    pub fn generation(&self) -> &str {
        &self.generation
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.borrow().clone()
    }

    pub fn table(&self) -> &SharedGenerations {
        &self.table
    }

    // == Install ==
    /// Creates this manager's generation and pins the shell document in it.
    ///
    /// Other generations are left alone. A network failure aborts the
    /// install and the manager stays `Installing`.
    pub async fn install(&self) -> Result<()> {
        self.table.write().await.open(&self.generation);

        let request = InterceptedRequest::get(self.shell_url.clone(), RequestMode::Subresource);
        let shell = self
            .fetcher
            .fetch(&request)
            .await
            .map_err(|e| VaultError::network(FailureKind::Resource, &self.shell_url, e))?;

        if shell.is_cacheable() {
            let mut table = self.table.write().await;
            table.put_if_live(&self.generation, RequestKey::get(&self.shell_url), shell);
            info!("Installed generation '{}' with pinned shell", self.generation);
        } else {
            warn!(
                "Shell {} answered {}; generation '{}' installed without a fallback",
                self.shell_url, shell.status, self.generation
            );
        }
        Ok(())
    }

    // == Activate ==
    /// Deletes every other generation, then starts serving.
    ///
    /// Deletion happens under the table's write lock: a concurrent request
    /// sees either the table before activation or the one after.
    pub async fn activate(&self) -> Vec<String> {
        let deleted = {
            let mut table = self.table.write().await;
            table.open(&self.generation);
            table.retain_only(&self.generation)
        };

        for name in &deleted {
            info!("Deleted stale cache generation '{}'", name);
        }

        self.lifecycle.send_replace(Lifecycle::Active {
            generation: self.generation.clone(),
        });
        info!("Cache generation '{}' is active", self.generation);
        deleted
    }

    /// Waits until activation has completed.
    async fn until_active(&self) {
        let mut rx = self.lifecycle.subscribe();
        // the sender lives in self, so the channel cannot close here
        let _ = rx
            .wait_for(|state| matches!(state, Lifecycle::Active { .. }))
            .await;
    }

    // == Stats ==
    pub async fn stats(&self) -> CacheStats {
        self.table.read().await.stats(&self.generation)
    }

    // == Respond ==
    /// Answers one intercepted request.
    pub async fn respond(&self, request: InterceptedRequest) -> Result<Intercepted> {
        match classify(&request) {
            RequestClass::Mutating => self.pass_through(request).await,
            RequestClass::Navigation => {
                self.until_active().await;
                self.network_first(request).await
            }
            RequestClass::Idempotent => {
                self.until_active().await;
                self.stale_while_revalidate(request).await
            }
        }
    }

    async fn pass_through(&self, request: InterceptedRequest) -> Result<Intercepted> {
        self.table.write().await.stats_mut().record_passthrough();
        let response = self
            .fetcher
            .fetch(&request)
            .await
            .map_err(|e| VaultError::network(FailureKind::Resource, &request.url, e))?;
        Ok(Intercepted::served(response, Source::Network))
    }

    /// Navigations: any HTTP answer wins; the shell covers network failure.
    async fn network_first(&self, request: InterceptedRequest) -> Result<Intercepted> {
        let err = match self.fetcher.fetch(&request).await {
            Ok(response) => return Ok(Intercepted::served(response, Source::Network)),
            Err(err) => err,
        };

        let mut table = self.table.write().await;
        let shell = table
            .peek(&self.generation, &RequestKey::get(&self.shell_url))
            .cloned();
        match shell {
            Some(shell) => {
                table.stats_mut().record_fallback();
                info!("Offline navigation to {}; serving shell", request.url);
                Ok(Intercepted::served(shell, Source::Fallback))
            }
            None => {
                warn!("Offline navigation to {} and no shell pinned", request.url);
                Err(VaultError::network(FailureKind::Navigation, &request.url, err))
            }
        }
    }

    /// Everything else: cached answer now, refreshed copy for next time.
    async fn stale_while_revalidate(&self, request: InterceptedRequest) -> Result<Intercepted> {
        let key = RequestKey::new(request.method.clone(), &request.url);
        let cached = self.table.write().await.lookup(&self.generation, &key);

        if let Some(cached) = cached {
            debug!("Cache hit for {} (age {}ms)", key, cached.age_ms());
            let revalidation = self.spawn_revalidation(request, key);
            return Ok(Intercepted {
                response: cached,
                source: Source::Cache,
                revalidation: Some(revalidation),
            });
        }

        debug!("Cache miss for {}", key);
        let response = self
            .fetcher
            .fetch(&request)
            .await
            .map_err(|e| VaultError::network(FailureKind::Resource, &request.url, e))?;

        if response.is_cacheable() {
            let mut table = self.table.write().await;
            if !table.put_if_live(&self.generation, key.clone(), response.clone()) {
                debug!("Generation '{}' is gone; not storing {}", self.generation, key);
            }
        }
        Ok(Intercepted::served(response, Source::Network))
    }

    fn spawn_revalidation(&self, request: InterceptedRequest, key: RequestKey) -> JoinHandle<()> {
        let fetcher = Arc::clone(&self.fetcher);
        let table = Arc::clone(&self.table);
        let generation = self.generation.clone();

        tokio::spawn(async move {
            let outcome = fetcher.fetch(&request).await;

            let mut table = table.write().await;
            match outcome {
                Ok(fresh) if fresh.is_cacheable() => {
                    if table.put_if_live(&generation, key.clone(), fresh) {
                        table.stats_mut().record_refresh();
                        debug!("Refreshed {}", key);
                    }
                }
                Ok(fresh) => {
                    table.stats_mut().record_failed_refresh();
                    debug!("Refresh of {} answered {}; keeping stale copy", key, fresh.status);
                }
                Err(err) => {
                    table.stats_mut().record_failed_refresh();
                    debug!("Refresh of {} failed: {}; keeping stale copy", key, err);
                }
            }
        })
    }
}
