//! Debounced parameter updates for keystroke-driven fetches.
//!
//! Wraps a [`ResourceHandle`] so that rapid parameter changes (a search box
//! being typed into) collapse into a single fetch once input settles.

use crate::error::Result;
use crate::resource::{ResourceHandle, ResourceState};
use crate::store::CacheStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A resource handle whose effective params update only after `delay` of
/// quiescence since the last change.
///
/// Each `set_params` call starts (or restarts) the quiet period. Calls that
/// get superseded by a newer change resolve to `Ok(None)` without touching
/// the inner handle; only the final call re-keys and fetches.
pub struct DebouncedHandle<T, P, S: CacheStore> {
    inner: ResourceHandle<T, S>,
    delay: Duration,
    seq: AtomicU64,
    pending: Mutex<Option<P>>,
}

impl<T, P, S> DebouncedHandle<T, P, S>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
    P: Serialize + Send + 'static,
    S: CacheStore,
{
    pub fn new(inner: ResourceHandle<T, S>, delay: Duration) -> Self {
        DebouncedHandle {
            inner,
            delay,
            seq: AtomicU64::new(0),
            pending: Mutex::new(None),
        }
    }

    /// Record a parameter change, wait out the quiet period, and fetch if no
    /// newer change arrived meanwhile.
    ///
    /// # Errors
    ///
    /// Same as [`ResourceHandle::get`] for the surviving call; superseded
    /// calls resolve to `Ok(None)`.
    pub async fn set_params(&self, params: P) -> Result<Option<T>> {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        *self.pending.lock().unwrap() = Some(params);

        tokio::time::sleep(self.delay).await;

        if self.seq.load(Ordering::SeqCst) != seq {
            // A newer keystroke owns the fetch.
            debug!("Debounced params superseded (seq {})", seq);
            return Ok(None);
        }

        let settled = self.pending.lock().unwrap().take();
        if let Some(p) = settled {
            self.inner.set_params(&p)?;
        }
        self.inner.get().await
    }

    /// Snapshot the inner handle's observable state.
    pub fn state(&self) -> ResourceState<T> {
        self.inner.state()
    }

    /// Access the wrapped handle (for `mutate`, `invalidate`, `refetch`).
    pub fn handle(&self) -> &ResourceHandle<T, S> {
        &self.inner
    }
}
