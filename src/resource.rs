//! Keyed resource cache - client, handles, and the fetch lifecycle.
//!
//! [`ResourceClient`] owns a shared [`CacheStore`] and hands out
//! [`ResourceHandle`]s, one per logical screen/list/detail consumer. A handle
//! wraps an async producer (the backend-calling service function) and decides
//! per call whether to serve the shared cache entry or to run the producer,
//! with cancellation of superseded fetches, staleness tracking, optimistic
//! mutation, and explicit invalidation.

use crate::error::{Error, Result};
use crate::key::ResourceKeyBuilder;
use crate::observability::{CacheMetrics, NoOpMetrics};
use crate::serialization;
use crate::store::{CacheStore, InMemoryStore, StoredEntry};
use futures::future::BoxFuture;
use futures::FutureExt;
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Boxed async producer supplied by backend-calling service functions.
///
/// Must reject on failure and resolve with the payload on success. The
/// handle may invoke it any number of times (refetches), and may abandon an
/// invocation mid-flight when a newer fetch supersedes it.
pub type Producer<T> = Box<dyn Fn() -> BoxFuture<'static, Result<T>> + Send + Sync>;

/// Per-handle fetch behavior.
///
/// # Example
///
/// ```
/// use frontdesk_kit::resource::ResourceOptions;
/// use std::time::Duration;
///
/// let options = ResourceOptions::default()
///     .with_cache_time(Duration::from_secs(120))
///     .with_stale_time(Duration::from_secs(30));
/// ```
#[derive(Clone, Debug)]
pub struct ResourceOptions {
    /// Window during which a cached entry short-circuits a new fetch.
    pub cache_time: Duration,

    /// Window after which cached data is flagged stale without being removed.
    pub stale_time: Duration,

    /// When false, `get()` never fetches; it only reports current state.
    pub enabled: bool,

    /// When true and data is stale, `notify_focus()` triggers a refetch.
    pub refetch_on_focus: bool,
}

impl Default for ResourceOptions {
    fn default() -> Self {
        ResourceOptions {
            cache_time: Duration::from_secs(5 * 60),
            stale_time: Duration::from_secs(60),
            enabled: true,
            refetch_on_focus: false,
        }
    }
}

impl ResourceOptions {
    /// Override the freshness window.
    pub fn with_cache_time(mut self, cache_time: Duration) -> Self {
        self.cache_time = cache_time;
        self
    }

    /// Override the staleness window.
    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    /// Enable or disable automatic fetching.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Enable refetch-on-focus for stale data.
    pub fn with_refetch_on_focus(mut self, refetch_on_focus: bool) -> Self {
        self.refetch_on_focus = refetch_on_focus;
        self
    }
}

/// Snapshot of a handle's observable state, for rendering.
#[derive(Clone, Debug)]
pub struct ResourceState<T> {
    /// Last successfully fetched (or mutated) value, if any.
    pub data: Option<T>,
    /// A fetch is currently in flight.
    pub is_loading: bool,
    /// Last fetch error; cleared on the next successful fetch or mutate.
    pub error: Option<Error>,
    /// Data is past its staleness window or was explicitly invalidated.
    pub is_stale: bool,
}

struct HandleState<T> {
    data: Option<T>,
    error: Option<Error>,
    is_loading: bool,
    fetched_at: Option<Instant>,
    forced_stale: bool,
}

impl<T> Default for HandleState<T> {
    fn default() -> Self {
        HandleState {
            data: None,
            error: None,
            is_loading: false,
            fetched_at: None,
            forced_stale: false,
        }
    }
}

/// Shared entry point for the keyed resource cache.
///
/// Cheap to clone; all clones share the same store, so a mutation or
/// invalidation through one handle is visible to every other handle reading
/// the same key. This is the intended cross-component coherence mechanism
/// (one screen's update shows up on another screen).
///
/// # Example
///
/// ```ignore
/// use frontdesk_kit::{ResourceClient, store::InMemoryStore};
///
/// let client = ResourceClient::new(InMemoryStore::new());
/// let handle = client.handle("appointments", &params, move || {
///     let api = api.clone();
///     async move { api.list_appointments(params).await }
/// })?;
///
/// let appointments = handle.get().await?;
/// ```
#[derive(Clone)]
pub struct ResourceClient<S: CacheStore> {
    store: S,
    metrics: Arc<dyn CacheMetrics>,
    defaults: ResourceOptions,
}

/// Process-lifetime default client, shared by all callers that do not
/// inject their own store (tests should inject an isolated one instead).
static GLOBAL_CLIENT: Lazy<ResourceClient<InMemoryStore>> =
    Lazy::new(|| ResourceClient::new(InMemoryStore::new()));

/// The process-wide default client over an [`InMemoryStore`].
pub fn global() -> &'static ResourceClient<InMemoryStore> {
    &GLOBAL_CLIENT
}

impl<S: CacheStore> ResourceClient<S> {
    /// Create a new client over the given store.
    pub fn new(store: S) -> Self {
        ResourceClient {
            store,
            metrics: Arc::new(NoOpMetrics),
            defaults: ResourceOptions::default(),
        }
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: Box<dyn CacheMetrics>) -> Self {
        self.metrics = Arc::from(metrics);
        self
    }

    /// Set default options for handles built from this client.
    pub fn with_defaults(mut self, defaults: ResourceOptions) -> Self {
        self.defaults = defaults;
        self
    }

    /// Get store reference (for advanced use).
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Build a handle with this client's default options.
    ///
    /// `resource` is the logical name; `params` is any serializable value
    /// appended to the key. `producer` is the backend-calling function.
    ///
    /// # Errors
    ///
    /// Returns `Error::SerializationError` if `params` cannot be serialized
    /// into a cache key.
    pub fn handle<T, P, F, Fut>(
        &self,
        resource: &str,
        params: &P,
        producer: F,
    ) -> Result<ResourceHandle<T, S>>
    where
        T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
        P: Serialize,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        self.handle_with_options(resource, params, producer, self.defaults.clone())
    }

    /// Build a handle with explicit options.
    ///
    /// # Errors
    ///
    /// Returns `Error::SerializationError` if `params` cannot be serialized
    /// into a cache key.
    pub fn handle_with_options<T, P, F, Fut>(
        &self,
        resource: &str,
        params: &P,
        producer: F,
        options: ResourceOptions,
    ) -> Result<ResourceHandle<T, S>>
    where
        T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
        P: Serialize,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let key = ResourceKeyBuilder::build(resource, params)?;
        let (supersede, _) = watch::channel(0u64);
        Ok(ResourceHandle {
            client: self.clone(),
            resource: resource.to_string(),
            key: Mutex::new(key),
            producer: Box::new(move || producer().boxed()),
            options,
            state: Mutex::new(HandleState::default()),
            generation: AtomicU64::new(0),
            supersede,
            commit_guard: tokio::sync::Mutex::new(()),
        })
    }

    /// Remove every cache entry. For session resets (e.g. logout).
    ///
    /// # Errors
    /// Returns `Err` if the store fails.
    pub async fn clear_all(&self) -> Result<()> {
        self.store.clear_all().await
    }

    /// Remove every entry whose key contains `pattern`; returns the count.
    ///
    /// # Errors
    /// Returns `Err` if the store fails.
    pub async fn clear_by_pattern(&self, pattern: &str) -> Result<usize> {
        self.store.clear_by_pattern(pattern).await
    }
}

/// One logical cache consumer: a key, a producer, and observable state.
///
/// Methods take `&self`; wrap the handle in an `Arc` to share it across
/// tasks. At most one fetch per handle is logically current: starting a new
/// fetch supersedes (cancels, does not queue behind) the previous one, and a
/// superseded fetch's late resolution never overwrites a newer result.
pub struct ResourceHandle<T, S: CacheStore> {
    client: ResourceClient<S>,
    resource: String,
    key: Mutex<String>,
    producer: Producer<T>,
    options: ResourceOptions,
    state: Mutex<HandleState<T>>,
    generation: AtomicU64,
    supersede: watch::Sender<u64>,
    commit_guard: tokio::sync::Mutex<()>,
}

impl<T, S> ResourceHandle<T, S>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    S: CacheStore,
{
    /// Fetch-or-serve: the primary read path.
    ///
    /// If a shared cache entry for this key is younger than `cache_time`,
    /// it is served without invoking the producer. Otherwise any previous
    /// in-flight fetch for this handle is cancelled and a new one runs.
    ///
    /// A cache entry that fails validation (corrupted envelope, schema
    /// version drift) is evicted and refetched rather than surfaced as an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns `Error::FetchError` (or whatever the producer rejected with)
    /// on fetch failure. Cancellation resolves to `Ok(None)`, never `Err`.
    pub async fn get(&self) -> Result<Option<T>> {
        if !self.options.enabled {
            debug!("Fetch disabled for {}", self.key());
            return Ok(self.state().data);
        }

        let key = self.key();
        let timer = Instant::now();

        if let Some(entry) = self.client.store.get(&key).await? {
            if entry.is_fresh(self.options.cache_time) {
                match serialization::deserialize_from_cache::<T>(&entry.data) {
                    Ok(value) => {
                        let is_stale = entry.is_stale(self.options.stale_time);
                        {
                            let mut st = self.state.lock().unwrap();
                            st.data = Some(value.clone());
                            st.fetched_at = Some(entry.fetched_at);
                            st.error = None;
                        }
                        self.client.metrics.record_hit(&key, timer.elapsed());
                        debug!(
                            "✓ Served {} from cache (age {:?}, stale: {})",
                            key,
                            entry.age(),
                            is_stale
                        );
                        return Ok(Some(value));
                    }
                    Err(e) => {
                        warn!("Evicting unreadable entry for {}: {}", key, e);
                        self.client.store.delete(&key).await?;
                    }
                }
            }
        }

        self.run_fetch().await
    }

    /// Force a fetch, bypassing the cache-time check, exactly as a cold
    /// fetch.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    pub async fn refetch(&self) -> Result<Option<T>> {
        self.run_fetch().await
    }

    /// Overwrite both local state and the shared cache entry without
    /// invoking the producer. Marks the entry fresh. For optimistic updates
    /// after a successful write to the backend.
    ///
    /// Any fetch still in flight for this handle is retired: a mutate is the
    /// newest truth for the key and must not be clobbered by an older fetch
    /// landing late.
    ///
    /// # Errors
    ///
    /// Returns `Error::SerializationError` if the value cannot be encoded,
    /// or a store error on write failure.
    pub async fn mutate(&self, value: T) -> Result<()> {
        let key = self.key();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.announce(generation);

        let bytes = serialization::serialize_for_cache(&value)?;
        let _commit = self.commit_guard.lock().await;
        let entry = StoredEntry::new(bytes);
        let fetched_at = entry.fetched_at;
        self.client.store.set(&key, entry).await?;

        let mut st = self.state.lock().unwrap();
        st.data = Some(value);
        st.fetched_at = Some(fetched_at);
        st.is_loading = false;
        st.error = None;
        st.forced_stale = false;
        info!("✓ Mutated {} locally", key);
        Ok(())
    }

    /// Remove the shared cache entry and flag local state stale. Does not
    /// refetch by itself.
    ///
    /// # Errors
    /// Returns `Err` if the store fails.
    pub async fn invalidate(&self) -> Result<()> {
        let key = self.key();
        self.client.store.delete(&key).await?;
        let mut st = self.state.lock().unwrap();
        st.forced_stale = true;
        debug!("✓ Invalidated {}", key);
        Ok(())
    }

    /// Re-key the handle for new parameters.
    ///
    /// When the key actually changes, any in-flight fetch is cancelled and
    /// local state is reset (a new key means a new entry); the next `get()`
    /// fetches under the new key. A no-op when the key is unchanged.
    ///
    /// # Errors
    ///
    /// Returns `Error::SerializationError` if `params` cannot be serialized.
    pub fn set_params<P: Serialize>(&self, params: &P) -> Result<()> {
        let new_key = ResourceKeyBuilder::build(&self.resource, params)?;
        {
            let mut key = self.key.lock().unwrap();
            if *key == new_key {
                return Ok(());
            }
            debug!("Key change {} -> {}", *key, new_key);
            *key = new_key;
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.announce(generation);
        *self.state.lock().unwrap() = HandleState::default();
        Ok(())
    }

    /// Regain-focus hook for the outer shell: refetches when
    /// `refetch_on_focus` is set and current data is stale.
    ///
    /// # Errors
    ///
    /// Same as [`refetch`](Self::refetch).
    pub async fn notify_focus(&self) -> Result<Option<T>> {
        if !self.options.refetch_on_focus || !self.options.enabled {
            return Ok(None);
        }
        if self.state().is_stale {
            debug!("Focus regained with stale data, refetching {}", self.key());
            return self.run_fetch().await;
        }
        Ok(None)
    }

    /// Snapshot the handle's observable state.
    pub fn state(&self) -> ResourceState<T> {
        let st = self.state.lock().unwrap();
        let is_stale = st.forced_stale
            || st
                .fetched_at
                .map(|t| t.elapsed() >= self.options.stale_time)
                .unwrap_or(false);
        ResourceState {
            data: st.data.clone(),
            is_loading: st.is_loading,
            error: st.error.clone(),
            is_stale,
        }
    }

    /// The current full cache key.
    pub fn key(&self) -> String {
        self.key.lock().unwrap().clone()
    }

    /// The options this handle was built with.
    pub fn options(&self) -> &ResourceOptions {
        &self.options
    }

    async fn run_fetch(&self) -> Result<Option<T>> {
        let key = self.key();
        let timer = Instant::now();

        // Taking a new generation supersedes whatever fetch was in flight.
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.announce(generation);
        {
            let mut st = self.state.lock().unwrap();
            st.is_loading = true;
            st.error = None;
        }
        debug!("» Fetch for key: {} (generation {})", key, generation);

        let fut = (self.producer)();
        let outcome = tokio::select! {
            res = fut => res,
            _ = self.wait_superseded(generation) => Err(Error::Cancelled),
        };

        match outcome {
            Ok(value) => {
                let bytes = serialization::serialize_for_cache(&value)?;

                // Committed under the guard: a superseded fetch must never
                // land after a newer one has started committing.
                let _commit = self.commit_guard.lock().await;
                if self.generation.load(Ordering::SeqCst) != generation {
                    debug!("✗ Discarding superseded fetch result for {}", key);
                    return Ok(None);
                }
                let entry = StoredEntry::new(bytes);
                let fetched_at = entry.fetched_at;
                self.client.store.set(&key, entry).await?;
                {
                    let mut st = self.state.lock().unwrap();
                    st.data = Some(value.clone());
                    st.fetched_at = Some(fetched_at);
                    st.is_loading = false;
                    st.error = None;
                    st.forced_stale = false;
                }
                self.client.metrics.record_miss(&key, timer.elapsed());
                info!("✓ Fetch for {} succeeded in {:?}", key, timer.elapsed());
                Ok(Some(value))
            }
            Err(Error::Cancelled) => {
                // Deliberately aborted; the newer fetch owns loading state.
                debug!("✗ Fetch for {} superseded, result discarded", key);
                Ok(None)
            }
            Err(e) => {
                {
                    let mut st = self.state.lock().unwrap();
                    if self.generation.load(Ordering::SeqCst) == generation {
                        st.error = Some(e.clone());
                        st.is_loading = false;
                    }
                }
                self.client.metrics.record_error(&key, &e.to_string());
                Err(e)
            }
        }
    }

    /// Publish a new current generation. `send_modify` updates the channel
    /// even with no receivers subscribed yet, and the max keeps the value
    /// monotonic if two bumps race.
    fn announce(&self, generation: u64) {
        self.supersede.send_modify(|current| {
            *current = (*current).max(generation);
        });
    }

    /// Resolves once a newer generation has superseded `generation`.
    async fn wait_superseded(&self, generation: u64) {
        let mut rx = self.supersede.subscribe();
        loop {
            if *rx.borrow() != generation {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn client() -> ResourceClient<InMemoryStore> {
        ResourceClient::new(InMemoryStore::new())
    }

    fn counting_producer(
        calls: Arc<AtomicUsize>,
        value: u32,
    ) -> impl Fn() -> BoxFuture<'static, Result<u32>> + Send + Sync + 'static {
        move || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(value)
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn test_fresh_entry_skips_producer() {
        let client = client();
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = client
            .handle("widgets", &1u32, counting_producer(calls.clone(), 7))
            .expect("Failed to build handle");

        assert_eq!(handle.get().await.expect("First fetch failed"), Some(7));
        assert_eq!(handle.get().await.expect("Second fetch failed"), Some(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_refetches() {
        let client = client();
        let calls = Arc::new(AtomicUsize::new(0));
        let options = ResourceOptions::default()
            .with_cache_time(Duration::from_millis(40))
            .with_stale_time(Duration::from_millis(20));
        let handle = client
            .handle_with_options("widgets", &1u32, counting_producer(calls.clone(), 7), options)
            .expect("Failed to build handle");

        handle.get().await.expect("First fetch failed");
        tokio::time::sleep(Duration::from_millis(60)).await;
        handle.get().await.expect("Second fetch failed");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_stale_flag_flips_after_window() {
        let client = client();
        let calls = Arc::new(AtomicUsize::new(0));
        let options = ResourceOptions::default()
            .with_cache_time(Duration::from_secs(300))
            .with_stale_time(Duration::from_millis(50));
        let handle = client
            .handle_with_options("widgets", &1u32, counting_producer(calls.clone(), 7), options)
            .expect("Failed to build handle");

        handle.get().await.expect("Fetch failed");
        assert!(!handle.state().is_stale);

        tokio::time::sleep(Duration::from_millis(70)).await;
        assert!(handle.state().is_stale);
        // Stale data is still served; it is not removed.
        assert_eq!(handle.state().data, Some(7));
    }

    #[tokio::test]
    async fn test_mutate_bypasses_producer() {
        let client = client();
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = client
            .handle("widgets", &1u32, counting_producer(calls.clone(), 7))
            .expect("Failed to build handle");

        handle.mutate(99).await.expect("Mutate failed");
        assert_eq!(handle.state().data, Some(99));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // Subsequent fetch within cache_time serves the mutated value.
        assert_eq!(handle.get().await.expect("Fetch failed"), Some(99));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalidate_then_refetch_invokes_producer() {
        let client = client();
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = client
            .handle("widgets", &1u32, counting_producer(calls.clone(), 7))
            .expect("Failed to build handle");

        handle.get().await.expect("Fetch failed");
        handle.invalidate().await.expect("Invalidate failed");
        assert!(handle.state().is_stale);

        handle.refetch().await.expect("Refetch failed");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_does_not_refetch_by_itself() {
        let client = client();
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = client
            .handle("widgets", &1u32, counting_producer(calls.clone(), 7))
            .expect("Failed to build handle");

        handle.get().await.expect("Fetch failed");
        handle.invalidate().await.expect("Invalidate failed");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_error_recorded_not_cached() {
        let client = client();
        let attempts = Arc::new(AtomicUsize::new(0));
        let a = attempts.clone();
        let handle = client
            .handle("widgets", &1u32, move || {
                let a = a.clone();
                async move {
                    a.fetch_add(1, Ordering::SeqCst);
                    Err::<u32, _>(Error::FetchError("backend down".to_string()))
                }
                .boxed()
            })
            .expect("Failed to build handle");

        assert!(handle.get().await.is_err());
        let state = handle.state();
        assert!(state.data.is_none());
        assert!(matches!(state.error, Some(Error::FetchError(_))));

        // Failures are not cached: the next call hits the producer again.
        assert!(handle.get().await.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_notify_focus_refetches_only_stale_data() {
        let client = client();
        let calls = Arc::new(AtomicUsize::new(0));
        let options = ResourceOptions::default()
            .with_stale_time(Duration::from_millis(40))
            .with_refetch_on_focus(true);
        let handle = client
            .handle_with_options("widgets", &1u32, counting_producer(calls.clone(), 7), options)
            .expect("Failed to build handle");

        handle.get().await.expect("Fetch failed");

        // Fresh data: focus is a no-op.
        handle.notify_focus().await.expect("Focus failed");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(60)).await;

        // Stale data: focus refetches.
        handle.notify_focus().await.expect("Focus failed");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_disabled_handle_never_fetches() {
        let client = client();
        let calls = Arc::new(AtomicUsize::new(0));
        let options = ResourceOptions::default().with_enabled(false);
        let handle = client
            .handle_with_options("widgets", &1u32, counting_producer(calls.clone(), 7), options)
            .expect("Failed to build handle");

        assert_eq!(handle.get().await.expect("Get failed"), None);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_superseded_fetch_never_wins() {
        let client = client();
        let handle = Arc::new(
            client
                .handle("widgets", &1u32, move || {
                    async move {
                        // Slow first-generation producer.
                        tokio::time::sleep(Duration::from_millis(80)).await;
                        Ok(1u32)
                    }
                    .boxed()
                })
                .expect("Failed to build handle"),
        );

        let slow = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.get().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        // Re-key to new params; the slow fetch is now superseded.
        handle.set_params(&2u32).expect("set_params failed");
        handle.mutate(2).await.expect("Mutate failed");

        let slow_result = slow.await.expect("Task panicked").expect("Fetch errored");
        assert_eq!(slow_result, None, "superseded fetch must not yield data");
        assert_eq!(handle.state().data, Some(2));
    }

    #[tokio::test]
    async fn test_cross_handle_coherence() {
        let client = client();
        let calls_a = Arc::new(AtomicUsize::new(0));
        let calls_b = Arc::new(AtomicUsize::new(0));
        let a = client
            .handle("widgets", &1u32, counting_producer(calls_a.clone(), 7))
            .expect("Failed to build handle");
        let b = client
            .handle("widgets", &1u32, counting_producer(calls_b.clone(), 8))
            .expect("Failed to build handle");

        a.mutate(42).await.expect("Mutate failed");

        // B sees A's entry without ever calling its own producer.
        assert_eq!(b.get().await.expect("Fetch failed"), Some(42));
        assert_eq!(calls_b.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_clear_by_pattern_forces_refetch() {
        let client = client();
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = client
            .handle("appointments", &1u32, counting_producer(calls.clone(), 7))
            .expect("Failed to build handle");

        handle.get().await.expect("Fetch failed");
        client
            .clear_by_pattern("appointments")
            .await
            .expect("Clear failed");
        handle.get().await.expect("Fetch failed");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_global_client_is_shared() {
        let a = global();
        let b = global();
        assert!(std::ptr::eq(a, b));
    }
}
