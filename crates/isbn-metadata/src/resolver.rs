//! Metadata resolution with provider fallback, field merging and caching
//!
//! Every request is keyed on the canonical ISBN-13, so an ISBN-10 and its
//! ISBN-13 share one cache entry and one in-flight resolution. The first
//! caller for a key spawns the resolution; later callers subscribe to its
//! result. A caller that gives up waiting only drops its own subscription.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use isbn_identifiers::{codec, Identifier};
use tokio::sync::watch;

use crate::cache::MetadataCache;
use crate::error::{ProviderError, ResolveError};
use crate::http::Fetch;
use crate::provider::Provider;
use crate::record::{Field, MetadataRecord};
use crate::registry::ProviderRegistry;

type Outcome = Option<Result<MetadataRecord, ResolveError>>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Keep asking later providers for fields earlier ones left unset
    pub merge_fields: bool,
    /// How long this caller waits before giving up
    pub wait_timeout: Option<Duration>,
}

impl ResolveOptions {
    pub fn merged() -> Self {
        Self {
            merge_fields: true,
            ..Self::default()
        }
    }

    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = Some(timeout);
        self
    }
}

struct Inner {
    registry: ProviderRegistry,
    http: Arc<dyn Fetch>,
    cache: MetadataCache,
    in_flight: Mutex<HashMap<Identifier, watch::Receiver<Outcome>>>,
}

/// Removes the in-flight marker when the resolution task ends, including by
/// panic or cancellation.
struct InFlightGuard {
    inner: Arc<Inner>,
    key: Identifier,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

#[derive(Clone)]
pub struct MetadataResolver {
    inner: Arc<Inner>,
}

impl MetadataResolver {
    pub fn new(registry: ProviderRegistry, http: Arc<dyn Fetch>) -> Self {
        Self::with_cache(registry, http, MetadataCache::new())
    }

    pub fn with_cache(registry: ProviderRegistry, http: Arc<dyn Fetch>, cache: MetadataCache) -> Self {
        Self {
            inner: Arc::new(Inner {
                registry,
                http,
                cache,
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.inner.registry
    }

    pub fn cache(&self) -> &MetadataCache {
        &self.inner.cache
    }

    /// Validate `raw` and resolve it.
    pub async fn resolve_str(
        &self,
        raw: &str,
        options: ResolveOptions,
    ) -> Result<MetadataRecord, ResolveError> {
        let id = codec::validate(raw)?;
        self.resolve(&id, options).await
    }

    pub async fn resolve(
        &self,
        id: &Identifier,
        options: ResolveOptions,
    ) -> Result<MetadataRecord, ResolveError> {
        let key = id.to_isbn13()?;

        if let Some(hit) = self.inner.cache.get(&key) {
            tracing::debug!(isbn = %key, "cache hit");
            return Ok((*hit).clone());
        }

        let mut rx = match self.join_or_start(&key, options.merge_fields) {
            Ok(rx) => rx,
            Err(hit) => return Ok((*hit).clone()),
        };

        let wait = async {
            let outcome = match rx.wait_for(Option::is_some).await {
                Ok(value) => (*value).clone(),
                Err(_) => None,
            };
            outcome.unwrap_or_else(|| {
                Err(ResolveError::Aborted {
                    isbn: key.to_string(),
                })
            })
        };

        match options.wait_timeout {
            Some(limit) => tokio::time::timeout(limit, wait).await.unwrap_or_else(|_| {
                tracing::debug!(isbn = %key, ?limit, "caller stopped waiting");
                Err(ResolveError::WaitTimedOut {
                    isbn: key.to_string(),
                })
            }),
            None => wait.await,
        }
    }

    /// Drop the cached record for `id`. Returns whether one was cached.
    pub fn invalidate(&self, id: &Identifier) -> Result<bool, ResolveError> {
        let key = id.to_isbn13()?;
        Ok(self.inner.cache.invalidate(&key))
    }

    /// Free-text search. Returns the first non-empty answer among providers
    /// that support queries, in registry order.
    pub async fn query(&self, text: &str) -> Vec<Identifier> {
        for provider in self.inner.registry.ordered() {
            if !provider.supports_query() {
                continue;
            }
            let call = provider.fetch_by_query(text, self.inner.http.as_ref());
            match with_timeout(provider.as_ref(), call).await {
                Ok(ids) if !ids.is_empty() => {
                    tracing::info!(provider = provider.name(), hits = ids.len(), "query answered");
                    return ids;
                }
                Ok(_) | Err(ProviderError::NotFound) | Err(ProviderError::Unsupported) => {
                    tracing::debug!(provider = provider.name(), "no query results");
                }
                Err(ProviderError::Transient(reason)) => {
                    tracing::warn!(provider = provider.name(), %reason, "query failed");
                }
            }
        }
        Vec::new()
    }

    /// ISBN-13s of the other editions of `id`'s work. Providers that support
    /// edition listings are tried in registry order; the first non-empty
    /// answer wins. Not cached.
    pub async fn editions(&self, id: &Identifier) -> Result<Vec<Identifier>, ResolveError> {
        let key = id.to_isbn13()?;
        for provider in self.inner.registry.ordered() {
            if !provider.supports_editions() {
                continue;
            }
            let call = provider.fetch_editions(&key, self.inner.http.as_ref());
            match with_timeout(provider.as_ref(), call).await {
                Ok(ids) if !ids.is_empty() => {
                    tracing::info!(isbn = %key, provider = provider.name(), editions = ids.len(), "editions found");
                    return Ok(ids);
                }
                Ok(_) | Err(ProviderError::NotFound) | Err(ProviderError::Unsupported) => {
                    tracing::debug!(isbn = %key, provider = provider.name(), "no editions");
                }
                Err(ProviderError::Transient(reason)) => {
                    tracing::warn!(isbn = %key, provider = provider.name(), %reason, "editions lookup failed");
                }
            }
        }
        Err(ResolveError::NotFoundAnywhere {
            isbn: key.to_string(),
        })
    }

    /// Subscribe to the in-flight resolution for `key`, starting one if none
    /// is running. Returns the cached record instead if a resolution finished
    /// since the caller's cache check.
    fn join_or_start(
        &self,
        key: &Identifier,
        merge: bool,
    ) -> Result<watch::Receiver<Outcome>, Arc<MetadataRecord>> {
        let mut in_flight = self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(rx) = in_flight.get(key) {
            tracing::debug!(isbn = %key, "joining in-flight resolution");
            return Ok(rx.clone());
        }
        // Cache is written before the marker is removed
        if let Some(hit) = self.inner.cache.get(key) {
            return Err(hit);
        }

        let (tx, rx) = watch::channel(None);
        in_flight.insert(key.clone(), rx.clone());
        drop(in_flight);

        let guard = InFlightGuard {
            inner: Arc::clone(&self.inner),
            key: key.clone(),
        };
        tokio::spawn(async move {
            let outcome = guard.inner.run_chain(&guard.key, merge).await;
            let _ = tx.send(Some(outcome));
            drop(guard);
        });

        Ok(rx)
    }
}

impl Inner {
    async fn run_chain(&self, key: &Identifier, merge: bool) -> Result<MetadataRecord, ResolveError> {
        let mut merged: Option<(MetadataRecord, Duration)> = None;

        for provider in self.registry.ordered() {
            if let Some((record, _)) = &merged {
                if record.has_all(Field::all()) {
                    break;
                }
            }

            let name = provider.name();
            let call = provider.fetch_by_identifier(key, self.http.as_ref());
            let mut record = match with_timeout(provider.as_ref(), call).await {
                Ok(record) if record.is_empty() => {
                    tracing::debug!(provider = name, isbn = %key, "empty record");
                    continue;
                }
                Ok(record) => record,
                Err(ProviderError::NotFound) | Err(ProviderError::Unsupported) => {
                    tracing::debug!(provider = name, isbn = %key, "not found");
                    continue;
                }
                Err(ProviderError::Transient(reason)) => {
                    tracing::warn!(provider = name, isbn = %key, %reason, "provider failed, falling back");
                    continue;
                }
            };
            record.isbn13 = key.clone();
            record.attribute_to(name);

            match merged.as_mut() {
                None => {
                    tracing::info!(provider = name, isbn = %key, fields = record.len(), "resolved");
                    merged = Some((record, provider.cache_ttl()));
                }
                Some((acc, ttl)) => {
                    let filled = acc.fill_missing(&record);
                    tracing::debug!(provider = name, isbn = %key, filled, "merged fields");
                    if filled > 0 {
                        *ttl = (*ttl).min(provider.cache_ttl());
                    }
                }
            }

            if !merge {
                break;
            }
        }

        match merged {
            Some((record, ttl)) => {
                self.cache.put(key.clone(), record.clone(), ttl);
                Ok(record)
            }
            None => {
                tracing::info!(isbn = %key, "no provider has metadata");
                Err(ResolveError::NotFoundAnywhere {
                    isbn: key.to_string(),
                })
            }
        }
    }
}

/// Bound a provider call by the provider's own timeout. Overrunning is a
/// transient failure.
async fn with_timeout<T>(
    provider: &dyn Provider,
    call: impl std::future::Future<Output = Result<T, ProviderError>>,
) -> Result<T, ProviderError> {
    let limit = provider.timeout();
    tokio::time::timeout(limit, call)
        .await
        .unwrap_or_else(|_| Err(ProviderError::Transient(format!("timed out after {:?}", limit))))
}
