//! Remote data fetching with an explicit per-page cache policy.
//!
//! Each page owns a [`PageState`] moving through
//! `Idle -> Loading -> {Success, Failure}`; every new request or retry puts it
//! back to `Loading`. Requests carry a ticket and only the newest ticket of a
//! page may change what the page displays, so a slow response that lands after
//! a newer request was issued is cached but otherwise ignored.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::anilist::{GraphQlTransport, Operation};
use crate::query::QueryVariables;

const MAX_CACHE_ENTRIES: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageKind {
    Trending,
    Popular,
    TopRated,
    NewReleases,
    Schedule,
    Search,
    Detail,
}

impl PageKind {
    pub const ALL: [PageKind; 7] = [
        Self::Trending,
        Self::Popular,
        Self::TopRated,
        Self::NewReleases,
        Self::Schedule,
        Self::Search,
        Self::Detail,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trending => "trending",
            Self::Popular => "popular",
            Self::TopRated => "top-rated",
            Self::NewReleases => "new-releases",
            Self::Schedule => "schedule",
            Self::Search => "search",
            Self::Detail => "detail",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == raw)
    }

    /// Stable catalogs reuse cached pages; rankings and the airing schedule
    /// always go back to the network.
    pub fn default_policy(self) -> FetchPolicy {
        match self {
            Self::Trending | Self::NewReleases | Self::Search | Self::Detail => {
                FetchPolicy::CacheFirst
            }
            Self::Popular | Self::TopRated | Self::Schedule => FetchPolicy::CacheAndNetwork,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchPolicy {
    /// Serve a cached response for identical variables without a request.
    CacheFirst,
    /// Always request; the response refreshes the cache.
    CacheAndNetwork,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub operation: Operation,
    pub variables: QueryVariables,
    /// Identity of what the page shows; stale data only stands in for a
    /// failed request of the same scope.
    pub scope: String,
    /// Path and query the client asked for, replayed when rebuilding a retry.
    pub origin: String,
}

impl QueryRequest {
    pub fn new(operation: Operation, variables: QueryVariables) -> Self {
        Self {
            operation,
            variables,
            scope: operation.name().to_string(),
            origin: String::new(),
        }
    }

    pub fn scoped(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    pub fn cache_key(&self) -> String {
        format!("{}:{}", self.operation.name(), self.variables.canonical())
    }
}

#[derive(Debug, Default)]
pub struct QueryCache {
    entries: HashMap<String, Value>,
}

impl QueryCache {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: String, data: Value) {
        if self.entries.len() >= MAX_CACHE_ENTRIES && !self.entries.contains_key(&key) {
            debug!("Query cache full ({} entries), clearing", self.entries.len());
            self.entries.clear();
        }
        self.entries.insert(key, data);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Success,
    Failure,
}

#[derive(Debug, Default)]
pub struct PageState {
    phase: Phase,
    latest_ticket: u64,
    last_request: Option<QueryRequest>,
    last_good: Option<(String, Value)>,
    last_error: Option<String>,
}

impl PageState {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn last_good(&self) -> Option<&Value> {
        self.last_good.as_ref().map(|(_, data)| data)
    }

    /// Last good data, only if it was fetched under `scope`.
    pub fn last_good_for(&self, scope: &str) -> Option<&Value> {
        self.last_good
            .as_ref()
            .filter(|(kept, _)| kept == scope)
            .map(|(_, data)| data)
    }

    pub fn last_request(&self) -> Option<&QueryRequest> {
        self.last_request.as_ref()
    }

    pub fn begin(&mut self, ticket: u64, request: QueryRequest) {
        self.latest_ticket = ticket;
        self.last_request = Some(request);
        self.phase = Phase::Loading;
    }

    /// Returns false when a newer request has superseded `ticket`.
    pub fn succeed(&mut self, ticket: u64, scope: &str, data: &Value) -> bool {
        if ticket != self.latest_ticket {
            return false;
        }
        self.phase = Phase::Success;
        self.last_good = Some((scope.to_string(), data.clone()));
        self.last_error = None;
        true
    }

    /// Returns false when a newer request has superseded `ticket`.
    /// The last good data is kept either way.
    pub fn fail(&mut self, ticket: u64, error: &str) -> bool {
        if ticket != self.latest_ticket {
            return false;
        }
        self.phase = Phase::Failure;
        self.last_error = Some(error.to_string());
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Success {
        data: Value,
        from_cache: bool,
    },
    /// `stale` holds the page's last successfully displayed data for the
    /// same scope, if any.
    Failure {
        error: String,
        stale: Option<Value>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    pub page: PageKind,
    pub phase: Phase,
    pub error: Option<String>,
    pub has_data: bool,
}

pub struct Fetcher {
    transport: Arc<dyn GraphQlTransport>,
    cache: Mutex<QueryCache>,
    pages: Mutex<HashMap<PageKind, PageState>>,
    next_ticket: AtomicU64,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn GraphQlTransport>) -> Self {
        Self {
            transport,
            cache: Mutex::new(QueryCache::default()),
            pages: Mutex::new(HashMap::new()),
            next_ticket: AtomicU64::new(0),
        }
    }

    pub async fn fetch(
        &self,
        page: PageKind,
        request: QueryRequest,
        policy: FetchPolicy,
    ) -> FetchOutcome {
        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed) + 1;
        let key = request.cache_key();
        self.pages
            .lock()
            .await
            .entry(page)
            .or_default()
            .begin(ticket, request.clone());

        if policy == FetchPolicy::CacheFirst {
            let cached = self.cache.lock().await.get(&key).cloned();
            if let Some(data) = cached {
                debug!(page = page.as_str(), operation = %request.operation, "Cache hit");
                self.settle_success(page, ticket, &request.scope, &data).await;
                return FetchOutcome::Success {
                    data,
                    from_cache: true,
                };
            }
        }

        info!(
            page = page.as_str(),
            operation = %request.operation,
            ?policy,
            "Fetching from AniList"
        );
        match self
            .transport
            .execute(request.operation, &request.variables)
            .await
        {
            Ok(data) => {
                self.cache.lock().await.insert(key, data.clone());
                self.settle_success(page, ticket, &request.scope, &data).await;
                FetchOutcome::Success {
                    data,
                    from_cache: false,
                }
            }
            Err(e) => {
                let error = format!("{:#}", e);
                warn!(page = page.as_str(), operation = %request.operation, "Fetch failed: {}", error);
                self.settle_failure(page, ticket, &request.scope, error).await
            }
        }
    }

    /// Repeats the page's last request against the network. `None` if the
    /// page has never issued one.
    pub async fn retry(&self, page: PageKind) -> Option<(QueryRequest, FetchOutcome)> {
        let request = self
            .pages
            .lock()
            .await
            .get(&page)
            .and_then(|s| s.last_request().cloned())?;
        info!(page = page.as_str(), operation = %request.operation, "Retrying last request");
        let outcome = self
            .fetch(page, request.clone(), FetchPolicy::CacheAndNetwork)
            .await;
        Some((request, outcome))
    }

    pub async fn snapshot(&self, page: PageKind) -> PageSnapshot {
        let pages = self.pages.lock().await;
        match pages.get(&page) {
            Some(state) => PageSnapshot {
                page,
                phase: state.phase(),
                error: state.last_error().map(str::to_string),
                has_data: state.last_good().is_some(),
            },
            None => PageSnapshot {
                page,
                phase: Phase::Idle,
                error: None,
                has_data: false,
            },
        }
    }

    pub async fn cached_entries(&self) -> usize {
        self.cache.lock().await.len()
    }

    async fn settle_success(&self, page: PageKind, ticket: u64, scope: &str, data: &Value) {
        let mut pages = self.pages.lock().await;
        if !pages.entry(page).or_default().succeed(ticket, scope, data) {
            debug!(page = page.as_str(), ticket, "Superseded response not displayed");
        }
    }

    async fn settle_failure(
        &self,
        page: PageKind,
        ticket: u64,
        scope: &str,
        error: String,
    ) -> FetchOutcome {
        let mut pages = self.pages.lock().await;
        let state = pages.entry(page).or_default();
        if !state.fail(ticket, &error) {
            debug!(page = page.as_str(), ticket, "Superseded failure not displayed");
        }
        FetchOutcome::Failure {
            error,
            stale: state.last_good_for(scope).cloned(),
        }
    }
}
