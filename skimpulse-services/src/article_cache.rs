//! Article Cache
//!
//! In-memory TTL cache for the skimfeed article list with single-flight
//! refresh. Requests never wait on a refresh when there is anything to
//! serve: fresh data is returned directly, stale data is returned while a
//! refresh is in flight or after it fails. Only a cold cache makes a caller
//! wait, and then every cold caller shares the same outbound fetch.

use std::sync::Arc;
use std::time::Duration;

use futures::channel::oneshot;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use skimpulse_core::ArticleList;
use skimpulse_feed::{ArticleSource, FeedError};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Default TTL (5 minutes)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

type RefreshOutcome = Result<ArticleList, FeedError>;

/// Handle to an in-flight refresh that any number of callers can await
type Flight = Shared<BoxFuture<'static, RefreshOutcome>>;

/// The cached list and its refresh state
#[derive(Default)]
struct CacheEntry {
    data: Option<ArticleList>,
    fetched_at: Option<Instant>,
    /// Present exactly while a refresh task is running
    in_flight: Option<Flight>,
}

impl CacheEntry {
    fn is_valid(&self, now: Instant, ttl: Duration) -> bool {
        match (&self.data, self.fetched_at) {
            (Some(_), Some(fetched_at)) => now.saturating_duration_since(fetched_at) < ttl,
            _ => false,
        }
    }

    fn is_refreshing(&self) -> bool {
        self.in_flight.is_some()
    }
}

struct Inner {
    entry: Mutex<CacheEntry>,
    source: Arc<dyn ArticleSource>,
    ttl: Duration,
}

impl Inner {
    /// Record a finished refresh; a failure leaves the previous data in place
    fn commit(&self, outcome: &RefreshOutcome) {
        let mut entry = self.entry.lock();
        if let Ok(articles) = outcome {
            entry.data = Some(articles.clone());
            entry.fetched_at = Some(Instant::now());
            info!("Cache updated with {} articles", articles.len());
        }
        entry.in_flight = None;
    }
}

/// Clears the refreshing state if the refresh task unwinds or is dropped
/// before committing
struct RefreshGuard {
    inner: Arc<Inner>,
    committed: bool,
}

impl RefreshGuard {
    fn commit(mut self, outcome: &RefreshOutcome) {
        self.inner.commit(outcome);
        self.committed = true;
    }
}

impl Drop for RefreshGuard {
    fn drop(&mut self) {
        if !self.committed {
            warn!("Cache refresh ended without a result");
            self.inner.entry.lock().in_flight = None;
        }
    }
}

/// Point-in-time view of the cache for health reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStatus {
    /// Whether any article list has ever been cached
    pub cached: bool,
    /// Time since the last successful refresh
    pub age: Option<Duration>,
    /// Whether the cached list is within its TTL
    pub is_valid: bool,
    pub ttl: Duration,
    pub refreshing: bool,
}

/// TTL cache in front of an [`ArticleSource`]
///
/// Cloning is cheap and every clone shares the same cache entry.
#[derive(Clone)]
pub struct ArticleCache {
    inner: Arc<Inner>,
}

impl ArticleCache {
    /// Create an empty cache
    pub fn new(source: Arc<dyn ArticleSource>, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                entry: Mutex::new(CacheEntry::default()),
                source,
                ttl,
            }),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Get the article list, refreshing from the source when needed
    ///
    /// Decision order:
    /// 1. fresh data is returned as is;
    /// 2. stale data is returned while another refresh is in flight;
    /// 3. a cold cache joins the in-flight refresh;
    /// 4. otherwise this call starts a refresh and awaits it, falling back
    ///    to stale data if it fails.
    ///
    /// Errors only surface when nothing has ever been cached.
    pub async fn get_articles(&self) -> Result<ArticleList, FeedError> {
        let (flight, refresh) = {
            let mut entry = self.inner.entry.lock();

            if entry.is_valid(Instant::now(), self.inner.ttl) {
                if let Some(data) = &entry.data {
                    debug!("Serving from cache");
                    return Ok(data.clone());
                }
            }

            if let Some(flight) = entry.in_flight.clone() {
                if let Some(stale) = &entry.data {
                    info!("Cache refresh in progress, serving stale cache");
                    return Ok(stale.clone());
                }
                debug!("Cache empty, joining in-flight refresh");
                (flight, None)
            } else {
                // Set under the same lock as the checks above, so only one
                // caller can ever start a refresh
                let (tx, rx) = oneshot::channel();
                let flight = flight_from(rx);
                entry.in_flight = Some(flight.clone());
                (flight, Some(tx))
            }
        };

        // Spawned after the lock is released: a task dropped during runtime
        // shutdown runs the guard, which takes the lock
        if let Some(tx) = refresh {
            self.spawn_refresh(tx);
        }

        match flight.await {
            Ok(articles) => Ok(articles),
            Err(err) => {
                if let Some(stale) = &self.inner.entry.lock().data {
                    warn!("Error fetching fresh data ({}), serving stale cache", err);
                    return Ok(stale.clone());
                }
                error!("Article refresh failed with no cache to fall back on: {}", err);
                Err(err)
            }
        }
    }

    /// Snapshot of the cache state; never triggers a fetch
    pub fn status(&self) -> CacheStatus {
        let entry = self.inner.entry.lock();
        let now = Instant::now();

        CacheStatus {
            cached: entry.data.is_some(),
            age: entry
                .fetched_at
                .map(|fetched_at| now.saturating_duration_since(fetched_at)),
            is_valid: entry.is_valid(now, self.inner.ttl),
            ttl: self.inner.ttl,
            refreshing: entry.is_refreshing(),
        }
    }

    /// Run one refresh on its own task, publishing the outcome to `tx`
    ///
    /// The task commits its own result, so a refresh completes even if every
    /// caller waiting on it goes away.
    fn spawn_refresh(&self, tx: oneshot::Sender<RefreshOutcome>) {
        info!("Cache miss, fetching fresh articles");

        let guard = RefreshGuard {
            inner: Arc::clone(&self.inner),
            committed: false,
        };
        tokio::spawn(async move {
            let outcome = guard.inner.source.fetch_articles().await;
            guard.commit(&outcome);
            // Nobody left waiting is fine
            let _ = tx.send(outcome);
        });
    }
}

/// Shared handle over the refresh task's outcome
///
/// A sender dropped without a result (panic, or the task never ran) turns
/// into [`FeedError::RefreshAborted`].
fn flight_from(rx: oneshot::Receiver<RefreshOutcome>) -> Flight {
    async move {
        match rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(FeedError::RefreshAborted(
                "refresh task ended without a result".to_string(),
            )),
        }
    }
    .boxed()
    .shared()
}

impl std::fmt::Debug for ArticleCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArticleCache")
            .field("status", &self.status())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use skimpulse_core::Article;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Semaphore;

    fn articles(titles: &[&str]) -> ArticleList {
        titles
            .iter()
            .enumerate()
            .map(|(i, t)| Article::new(*t, format!("https://skimfeed.com/r.php?id={i}")))
            .collect()
    }

    fn transport_error() -> FeedError {
        FeedError::transport("connection reset")
    }

    /// Replays scripted outcomes and counts outbound fetches
    struct ScriptedSource {
        outcomes: Mutex<VecDeque<RefreshOutcome>>,
        calls: AtomicUsize,
        /// When set, each fetch waits for a permit before returning
        gate: Option<Arc<Semaphore>>,
        panic: bool,
    }

    impl ScriptedSource {
        fn new(outcomes: Vec<RefreshOutcome>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: AtomicUsize::new(0),
                gate: None,
                panic: false,
            })
        }

        fn gated(outcomes: Vec<RefreshOutcome>, gate: Arc<Semaphore>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: AtomicUsize::new(0),
                gate: Some(gate),
                panic: false,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ArticleSource for ScriptedSource {
        async fn fetch_articles(&self) -> Result<ArticleList, FeedError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.acquire().await.unwrap().forget();
            }
            if self.panic {
                panic!("source blew up");
            }
            self.outcomes
                .lock()
                .pop_front()
                .unwrap_or(Err(FeedError::NoArticlesFound))
        }
    }

    fn cache_with(source: Arc<ScriptedSource>, ttl: Duration) -> ArticleCache {
        ArticleCache::new(source, ttl)
    }

    /// With paused time, a sleep only completes once every other task is idle
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_cache_served_without_refetch() {
        let source = ScriptedSource::new(vec![Ok(articles(&["First headline text"]))]);
        let cache = cache_with(source.clone(), DEFAULT_CACHE_TTL);

        let first = cache.get_articles().await.unwrap();
        let second = cache.get_articles().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(source.calls(), 1);

        let status = cache.status();
        assert!(status.cached);
        assert!(status.is_valid);
        assert!(!status.refreshing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_cache_refetches() {
        let source = ScriptedSource::new(vec![
            Ok(articles(&["Old headline text"])),
            Ok(articles(&["New headline text"])),
        ]);
        let cache = cache_with(source.clone(), Duration::from_secs(60));

        cache.get_articles().await.unwrap();
        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(cache.get_articles().await.unwrap(), articles(&["Old headline text"]));
        assert_eq!(source.calls(), 1);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(!cache.status().is_valid);
        assert_eq!(cache.get_articles().await.unwrap(), articles(&["New headline text"]));
        assert_eq!(source.calls(), 2);
        assert_eq!(cache.status().age, Some(Duration::ZERO));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_served_when_refresh_fails() {
        let source = ScriptedSource::new(vec![
            Ok(articles(&["Old headline text"])),
            Err(transport_error()),
            Err(FeedError::NoArticlesFound),
        ]);
        let cache = cache_with(source.clone(), Duration::from_secs(60));

        cache.get_articles().await.unwrap();
        tokio::time::advance(Duration::from_secs(3600)).await;

        assert_eq!(cache.get_articles().await.unwrap(), articles(&["Old headline text"]));
        assert_eq!(cache.get_articles().await.unwrap(), articles(&["Old headline text"]));
        assert_eq!(source.calls(), 3);

        let status = cache.status();
        assert!(status.cached);
        assert!(!status.is_valid);
        assert!(!status.refreshing);
        assert_eq!(status.age, Some(Duration::from_secs(3600)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cold_start_failure_propagates() {
        let source = ScriptedSource::new(vec![
            Err(transport_error()),
            Err(FeedError::NoArticlesFound),
            Ok(articles(&["Recovered headline"])),
        ]);
        let cache = cache_with(source.clone(), DEFAULT_CACHE_TTL);

        assert_eq!(cache.get_articles().await, Err(transport_error()));
        assert!(!cache.status().refreshing);
        assert!(!cache.status().cached);

        assert_eq!(cache.get_articles().await, Err(FeedError::NoArticlesFound));

        // the next request simply tries again
        assert_eq!(cache.get_articles().await.unwrap(), articles(&["Recovered headline"]));
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_cold_requests_share_one_fetch() {
        let gate = Arc::new(Semaphore::new(0));
        let source = ScriptedSource::gated(
            vec![Ok(articles(&["Shared headline text"]))],
            gate.clone(),
        );
        let cache = cache_with(source.clone(), DEFAULT_CACHE_TTL);

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get_articles().await })
            })
            .collect();

        settle().await;
        assert_eq!(source.calls(), 1);
        assert!(cache.status().refreshing);

        gate.add_permits(1);
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), articles(&["Shared headline text"]));
        }
        assert_eq!(source.calls(), 1);
        assert!(!cache.status().refreshing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_cold_requests_share_one_error() {
        let gate = Arc::new(Semaphore::new(0));
        let source = ScriptedSource::gated(vec![Err(transport_error())], gate.clone());
        let cache = cache_with(source.clone(), DEFAULT_CACHE_TTL);

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.get_articles().await })
            })
            .collect();

        settle().await;
        gate.add_permits(1);
        for handle in handles {
            assert_eq!(handle.await.unwrap(), Err(transport_error()));
        }
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_served_immediately_during_refresh() {
        let gate = Arc::new(Semaphore::new(1));
        let source = ScriptedSource::gated(
            vec![
                Ok(articles(&["Old headline text"])),
                Ok(articles(&["New headline text"])),
            ],
            gate.clone(),
        );
        let cache = cache_with(source.clone(), Duration::from_secs(60));

        cache.get_articles().await.unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;

        let refresher = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get_articles().await })
        };
        settle().await;
        assert!(cache.status().refreshing);

        // does not wait on the gated refresh and does not start another
        assert_eq!(cache.get_articles().await.unwrap(), articles(&["Old headline text"]));
        assert_eq!(source.calls(), 2);

        gate.add_permits(1);
        assert_eq!(refresher.await.unwrap().unwrap(), articles(&["New headline text"]));
        assert_eq!(cache.get_articles().await.unwrap(), articles(&["New headline text"]));
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_completes_after_caller_cancelled() {
        let gate = Arc::new(Semaphore::new(0));
        let source = ScriptedSource::gated(
            vec![Ok(articles(&["Committed headline"]))],
            gate.clone(),
        );
        let cache = cache_with(source.clone(), DEFAULT_CACHE_TTL);

        let caller = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get_articles().await })
        };
        settle().await;
        caller.abort();
        assert!(caller.await.unwrap_err().is_cancelled());
        assert!(cache.status().refreshing);

        gate.add_permits(1);
        settle().await;

        let status = cache.status();
        assert!(status.cached);
        assert!(!status.refreshing);
        assert_eq!(cache.get_articles().await.unwrap(), articles(&["Committed headline"]));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_source_clears_refreshing() {
        let source = Arc::new(ScriptedSource {
            outcomes: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            gate: None,
            panic: true,
        });
        let cache = cache_with(source.clone(), DEFAULT_CACHE_TTL);

        let err = cache.get_articles().await.unwrap_err();
        assert!(matches!(err, FeedError::RefreshAborted(_)));
        assert!(!cache.status().refreshing);

        // a later request is free to try again
        assert!(cache.get_articles().await.is_err());
        assert_eq!(source.calls(), 2);
    }

    #[test]
    fn test_refresh_on_shut_down_runtime_aborts() {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let handle = runtime.handle().clone();
        drop(runtime);

        let source = ScriptedSource::new(vec![Ok(articles(&["Never fetched headline"]))]);
        let cache = cache_with(source.clone(), DEFAULT_CACHE_TTL);

        // the refresh task is dropped inside spawn and its guard relocks the entry
        let result = handle.block_on(cache.get_articles());

        assert!(matches!(result, Err(FeedError::RefreshAborted(_))));
        assert!(!cache.status().refreshing);
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_ttl_always_refreshes() {
        let source = ScriptedSource::new(vec![
            Ok(articles(&["First headline text"])),
            Ok(articles(&["Second headline text"])),
        ]);
        let cache = cache_with(source.clone(), Duration::ZERO);

        cache.get_articles().await.unwrap();
        assert!(!cache.status().is_valid);
        assert_eq!(cache.get_articles().await.unwrap(), articles(&["Second headline text"]));
        assert_eq!(source.calls(), 2);
    }

    #[test]
    fn test_status_of_empty_cache() {
        let cache = cache_with(ScriptedSource::new(vec![]), Duration::from_secs(300));
        assert_eq!(
            cache.status(),
            CacheStatus {
                cached: false,
                age: None,
                is_valid: false,
                ttl: Duration::from_secs(300),
                refreshing: false,
            }
        );
    }
}
