use crate::error::{ErrorKind, Result};
use crate::flight::InFlight;
use exn::{OptionExt, ResultExt};
use pcmcache_storage::{CacheKey, CacheLayout, local};
use pcmcache_tools::{DecodeHandle, FetchHandle};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::instrument;

/// Indicates how much work was required to produce a [`Cached`] entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effort {
    /// The entry already existed; no subprocess was started.
    Hit,
    /// The entry was downloaded, decoded and written by this call.
    Filled,
}

/// A decoded entry that is present in the cache.
#[derive(Clone, Debug)]
pub struct Cached {
    pub path: PathBuf,
    /// Size of the raw PCM data.
    pub bytes: u64,
    /// Playback duration of the PCM data.
    pub duration: Duration,
    pub effort: Effort,
}

/// Ensures decoded copies of remote audio exist in a local cache.
///
/// Fetching and decoding are delegated to the injected [`Fetch`] and
/// [`Decode`] implementations. A fill goes through these stages:
///
/// 1. **Check**: If the entry for the key exists it is returned as
///    [`Effort::Hit`] and nothing else happens.
/// 2. **Fetch**: The container is downloaded into a private staging
///    directory next to the entry.
/// 3. **Decode**: The container is decoded into memory. The staging
///    directory, container included, is removed whatever the outcome.
/// 4. **Persist**: The PCM data is published atomically at the entry path.
///
/// The entry path exists if and only if a fill completed, so a failure at any
/// stage leaves nothing behind. Concurrent fills of the same key within one
/// pipeline are serialized; the later callers observe a hit.
///
/// [`Fetch`]: pcmcache_tools::Fetch
/// [`Decode`]: pcmcache_tools::Decode
pub struct CachePipeline {
    layout: CacheLayout,
    fetcher: FetchHandle,
    decoder: DecodeHandle,
    in_flight: InFlight,
}
impl CachePipeline {
    pub fn new(layout: CacheLayout, fetcher: FetchHandle, decoder: DecodeHandle) -> Self {
        Self { layout, fetcher, decoder, in_flight: InFlight::default() }
    }

    /// Returns the cache entry for `(collection, item)`, filling it from
    /// `source` first if it doesn't exist yet.
    ///
    /// # Errors
    /// - [`InvalidKey`](ErrorKind::InvalidKey) if a name is unusable once sanitized.
    /// - [`PathError`](ErrorKind::PathError) if the entry can't be checked or
    ///   its directories can't be created.
    /// - [`FetchFailed`](ErrorKind::FetchFailed), [`DecodeFailed`](ErrorKind::DecodeFailed)
    ///   or [`PersistFailed`](ErrorKind::PersistFailed) from the respective stage.
    #[instrument(skip(self))]
    pub async fn ensure_cached(&self, collection: &str, item: &str, source: &str) -> Result<Cached> {
        let key = CacheKey::new(collection, item).or_raise(|| ErrorKind::InvalidKey)?;
        let target = self.layout.resolve(&key);
        if let Some(cached) = self.lookup(&target).await? {
            tracing::debug!(path = %target.display(), "Cache entry already exists");
            return Ok(cached);
        }

        let _flight = self.in_flight.acquire(&target).await;
        // Whoever held the key before us may have just filled it.
        if let Some(cached) = self.lookup(&target).await? {
            tracing::debug!(path = %target.display(), "Cache entry filled by concurrent request");
            return Ok(cached);
        }

        tracing::info!(path = %target.display(), "Cache entry missing; fetching");
        let bytes = self.fill(source, &target).await?;
        tracing::info!(path = %target.display(), bytes, "Cache entry filled");
        Ok(Cached { path: target, bytes, duration: self.decoder.format().duration(bytes), effort: Effort::Filled })
    }

    async fn lookup(&self, target: &Path) -> Result<Option<Cached>> {
        let size = local::entry_size(target).await.or_raise(|| ErrorKind::PathError)?;
        Ok(size.map(|bytes| Cached {
            path: target.to_path_buf(),
            bytes,
            duration: self.decoder.format().duration(bytes),
            effort: Effort::Hit,
        }))
    }

    async fn fill(&self, source: &str, target: &Path) -> Result<u64> {
        let parent = target.parent().ok_or_raise(|| ErrorKind::PathError)?;
        let entry_name = target.file_name().ok_or_raise(|| ErrorKind::PathError)?;
        local::create_dir_all(parent).await.or_raise(|| ErrorKind::PathError)?;

        let staging = local::staging_dir(parent).await.or_raise(|| ErrorKind::PathError)?;
        let container = CacheLayout::container_path(staging.path().join(entry_name));
        let decoded = self.fetch_and_decode(source, &container).await;
        let staging_path = staging.path().to_path_buf();
        if let Err(e) = local::remove_staging(staging).await {
            tracing::warn!(path = %staging_path.display(), error = ?e, "Failed to remove staging directory");
        }

        local::publish(target.to_path_buf(), decoded?).await.or_raise(|| ErrorKind::PersistFailed)
    }

    async fn fetch_and_decode(&self, source: &str, container: &Path) -> Result<Vec<u8>> {
        self.fetcher.fetch(source, container).await.or_raise(|| ErrorKind::FetchFailed)?;
        self.decoder.decode(container).await.or_raise(|| ErrorKind::DecodeFailed)
    }
}
