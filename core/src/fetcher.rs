/*
    album-anniversaries | Rust CLI tool to surface album release anniversaries.
    Copyright (C) 2025  Israel Alberto Roldan Vega

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use crate::clock::{Clock, SystemClock};
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use log::debug;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;

/// How long a successful response is served from memory.
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("Request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("Response from {url} is not valid JSON: {message}")]
    Decode { url: String, message: String },
}

impl FetchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// The raw network capability the app is built on.
#[async_trait]
pub trait HttpSource: Send + Sync {
    /// GET `url` and decode the body as JSON.
    async fn get_json(&self, url: &str) -> Result<Value, FetchError>;

    /// POST to `url` with an empty body.
    async fn post(&self, url: &str) -> Result<(), FetchError>;
}

type Settled = Result<Arc<Value>, FetchError>;
type PendingRequest = Shared<BoxFuture<'static, Settled>>;

struct CacheEntry {
    value: Arc<Value>,
    stored_at_ms: i64,
}

impl CacheEntry {
    fn is_fresh(&self, now_ms: i64, ttl_ms: i64) -> bool {
        now_ms - self.stored_at_ms < ttl_ms
    }
}

/// Per-URL state. A URL with no entry is idle.
///
/// `Pending` moves to `Fulfilled` on success and back to idle on failure.
/// Expired `Fulfilled` entries stay until the next request replaces them.
enum UrlState {
    Pending {
        generation: u64,
        request: PendingRequest,
    },
    Fulfilled(CacheEntry),
}

#[derive(Default)]
struct Registry {
    urls: HashMap<String, UrlState>,
    generation: u64, // Bumped by clear() so late results are dropped
}

struct Inner {
    source: Arc<dyn HttpSource>,
    clock: Arc<dyn Clock>,
    enabled: bool,
    ttl_ms: i64,
    registry: Mutex<Registry>,
}

impl Inner {
    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn settle(&self, url: &str, generation: u64, settled: &Settled) {
        let mut registry = self.registry();
        let current = matches!(
            registry.urls.get(url),
            Some(UrlState::Pending { generation: g, .. }) if *g == generation
        );
        if !current {
            debug!("Dropping result for {} issued before the cache was cleared", url);
            return;
        }

        match settled {
            Ok(value) => {
                let entry = CacheEntry {
                    value: Arc::clone(value),
                    stored_at_ms: self.clock.epoch_millis(),
                };
                registry.urls.insert(url.to_string(), UrlState::Fulfilled(entry));
                debug!("Cached response for {}", url);
            }
            Err(e) => {
                registry.urls.remove(url);
                debug!("Request for {} failed, nothing cached: {}", url, e);
            }
        }
    }
}

/// Memoizes GET responses for [`CACHE_TTL`] and makes concurrent callers
/// for the same URL share a single request.
///
/// Cloning is cheap and clones share the same cache.
#[derive(Clone)]
pub struct CachingFetcher {
    inner: Arc<Inner>,
}

impl CachingFetcher {
    pub fn new(source: Arc<dyn HttpSource>, enabled: bool) -> Self {
        Self::with_clock(source, Arc::new(SystemClock), enabled)
    }

    pub fn with_clock(source: Arc<dyn HttpSource>, clock: Arc<dyn Clock>, enabled: bool) -> Self {
        Self {
            inner: Arc::new(Inner {
                source,
                clock,
                enabled,
                ttl_ms: CACHE_TTL.as_millis() as i64,
                registry: Mutex::new(Registry::default()),
            }),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled
    }

    /// Fetches `url`, from memory when a fresh copy exists.
    ///
    /// With `bypass` set, or when caching is disabled, the network is always
    /// hit and the cache is neither read nor written.
    pub async fn fetch(&self, url: &str, bypass: bool) -> Result<Arc<Value>, FetchError> {
        if !self.inner.enabled || bypass {
            debug!("Fetching {} without cache", url);
            return self.inner.source.get_json(url).await.map(Arc::new);
        }

        let request = {
            let mut registry = self.inner.registry();
            let now_ms = self.inner.clock.epoch_millis();

            let joined = match registry.urls.get(url) {
                Some(UrlState::Fulfilled(entry)) if entry.is_fresh(now_ms, self.inner.ttl_ms) => {
                    debug!("Cache hit for {}", url);
                    return Ok(Arc::clone(&entry.value));
                }
                Some(UrlState::Pending { request, .. }) => {
                    debug!("Joining in-flight request for {}", url);
                    Some(request.clone())
                }
                _ => None,
            };

            match joined {
                Some(request) => request,
                None => {
                    let generation = registry.generation;
                    let request = self.issue(url, generation);
                    registry.urls.insert(
                        url.to_string(),
                        UrlState::Pending {
                            generation,
                            request: request.clone(),
                        },
                    );
                    request
                }
            }
        };

        request.await
    }

    /// Drops every cached response and forgets in-flight requests.
    pub fn clear(&self) {
        let mut registry = self.inner.registry();
        registry.urls.clear();
        registry.generation += 1;
        debug!("Response cache cleared");
    }

    fn issue(&self, url: &str, generation: u64) -> PendingRequest {
        let inner = Arc::clone(&self.inner);
        let url = url.to_string();
        debug!("Cache miss for {}", url);

        async move {
            let settled = inner.source.get_json(&url).await.map(Arc::new);
            inner.settle(&url, generation, &settled);
            settled
        }
        .boxed()
        .shared()
    }
}
