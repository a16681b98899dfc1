//! Frame index builder: cache lookup, strategy fallback chain, background jobs.

use cutmark_core::{CutmarkError, Result};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::cache::{CacheKey, IndexCache};
use crate::index::TimestampIndex;
use crate::source::MetadataSource;
use crate::strategy::{default_strategies, IndexProgress, IndexStrategy};

/// Builds a [`TimestampIndex`] by trying each strategy in order.
pub struct TimestampIndexBuilder {
    source: Arc<dyn MetadataSource>,
    strategies: Vec<Box<dyn IndexStrategy>>,
    cache: Option<IndexCache>,
}

impl TimestampIndexBuilder {
    /// Builder with the default packet-then-frame chain and no cache.
    pub fn new(source: Arc<dyn MetadataSource>) -> Self {
        Self {
            source,
            strategies: default_strategies(),
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: IndexCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Build the index for `path`, consulting and filling the cache.
    ///
    /// Fails with [`CutmarkError::IndexBuild`] when no strategy yields timestamps.
    pub fn build(&self, path: &Path, progress: &dyn Fn(IndexProgress)) -> Result<TimestampIndex> {
        let key = match &self.cache {
            Some(_) => Some(CacheKey::for_file(path)?),
            None => None,
        };

        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            if let Some(index) = cache.load(key) {
                info!(
                    "Frames index loaded from {}",
                    cache.entry_path(key).display()
                );
                return Ok(index);
            }
        }

        let index = self.run_strategies(path, progress)?;

        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            if let Err(e) = cache.store(key, &index) {
                warn!("Failed to cache frames index for {}: {}", key, e);
            }
        }
        Ok(index)
    }

    fn run_strategies(&self, path: &Path, progress: &dyn Fn(IndexProgress)) -> Result<TimestampIndex> {
        for strategy in &self.strategies {
            info!(
                "Building video frames index of {} from {}",
                path.display(),
                strategy.name()
            );
            match strategy.collect(self.source.as_ref(), path, progress) {
                Ok(Some(index)) if !index.is_empty() => {
                    info!(
                        "Frames index built: {} frames, {} keyframes",
                        index.pts().len(),
                        index.keyframes().len()
                    );
                    return Ok(index);
                }
                Ok(_) => info!("No timestamps from {}", strategy.name()),
                Err(e) => warn!("Index strategy {} failed: {}", strategy.name(), e),
            }
        }
        Err(CutmarkError::IndexBuild(format!(
            "Failed building frames index of {}",
            path.display()
        )))
    }

    /// Build on a dedicated thread.
    ///
    /// The result arrives exactly once on the returned oneshot receiver.
    /// A second build for the same file while one is running is rejected
    /// with [`CutmarkError::BuildInProgress`].
    pub fn spawn(self: Arc<Self>, path: PathBuf, in_flight: &InFlightBuilds) -> Result<IndexJob> {
        let key = CacheKey::for_file(&path)?;
        let guard = in_flight.acquire(key)?;

        let (result_tx, result_rx) = oneshot::channel();
        let (progress_tx, progress_rx) = crossbeam_channel::unbounded();

        std::thread::Builder::new()
            .name("cutmark-index".into())
            .spawn(move || {
                let result = self.build(&path, &|p| {
                    let _ = progress_tx.send(p);
                });
                drop(guard);
                let _ = result_tx.send(result);
            })?;

        Ok(IndexJob {
            result: result_rx,
            progress: progress_rx,
        })
    }
}

/// Handle to a background index build.
pub struct IndexJob {
    /// Completion, signalled once.
    pub result: oneshot::Receiver<Result<TimestampIndex>>,
    /// Progress updates from frame decoding.
    pub progress: crossbeam_channel::Receiver<IndexProgress>,
}

impl IndexJob {
    /// Block the current thread until the build finishes.
    ///
    /// Must not be called from within an async runtime.
    pub fn wait(self) -> Result<TimestampIndex> {
        self.result
            .blocking_recv()
            .map_err(|_| CutmarkError::IndexBuild("Index build thread went away".into()))?
    }
}

/// Registry of files with an index build in progress.
#[derive(Debug, Clone, Default)]
pub struct InFlightBuilds {
    keys: Arc<Mutex<HashSet<CacheKey>>>,
}

impl InFlightBuilds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key`, failing if a build for it is already running.
    pub fn acquire(&self, key: CacheKey) -> Result<InFlightGuard> {
        let mut keys = self.keys.lock();
        if !keys.insert(key.clone()) {
            return Err(CutmarkError::BuildInProgress(key.to_string()));
        }
        Ok(InFlightGuard {
            keys: Arc::clone(&self.keys),
            key,
        })
    }

    pub fn is_building(&self, key: &CacheKey) -> bool {
        self.keys.lock().contains(key)
    }
}

/// Releases its key when dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    keys: Arc<Mutex<HashSet<CacheKey>>>,
    key: CacheKey,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.keys.lock().remove(&self.key);
    }
}
