//! Deterministic on-disk layout of cache entries.
//!
//! Entries live two levels below the cache root:
//!
//! ```text
//! <root>/<collection>/<item>.pcm
//! ```
//!
//! Both levels come from a [`CacheKey`], whose components are sanitized on
//! construction, so resolving a key is pure and never fails.

use crate::error::{ErrorKind, Result};
use crate::path::component;
use std::fmt;
use std::path::{Path, PathBuf};

/// File extension of decoded (raw PCM) cache entries.
pub const ENTRY_EXTENSION: &str = "pcm";
/// File extension of the compressed container produced by the fetcher.
pub const CONTAINER_EXTENSION: &str = "opus";

/// A sanitized `(collection, item)` pair identifying one cache entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    collection: String,
    item: String,
}
impl CacheKey {
    /// Sanitizes both names into path components.
    ///
    /// # Errors
    /// Returns [`InvalidKey`](crate::error::ErrorKind::InvalidKey) if either
    /// name is unusable once sanitized.
    ///
    /// # Examples
    ///
    /// ```
    /// use pcmcache_storage::CacheKey;
    /// let key = CacheKey::new("Some/Channel:Name", "Title? \"Quote\"").unwrap();
    /// assert_eq!(key.collection(), "Some Channel Name");
    /// assert_eq!(key.item(), "Title Quote");
    /// assert!(CacheKey::new("..", "Title").is_err());
    /// ```
    pub fn new(collection: impl AsRef<str>, item: impl AsRef<str>) -> Result<Self> {
        Ok(Self { collection: component(collection)?, item: component(item)? })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn item(&self) -> &str {
        &self.item
    }

    /// Entry path relative to the cache root.
    pub fn relative_path(&self) -> PathBuf {
        Path::new(&self.collection).join(format!("{}.{ENTRY_EXTENSION}", self.item))
    }
}
impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.item)
    }
}

/// Maps [`CacheKey`]s onto paths beneath a cache root directory.
///
/// Constructing a layout touches nothing on disk; directories are created
/// lazily by whoever fills the cache.
#[derive(Clone, Debug)]
pub struct CacheLayout {
    root: PathBuf,
}
impl CacheLayout {
    /// A relative `root` is anchored to the current working directory, so
    /// every resolved entry path is absolute.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let root = std::path::absolute(root).map_err(|e| ErrorKind::from_io(e, root))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of the entry for `key`.
    pub fn resolve(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.relative_path())
    }

    /// Sanitizes the names and resolves them in one step.
    ///
    /// ```
    /// use pcmcache_storage::CacheLayout;
    /// use std::path::Path;
    /// let layout = CacheLayout::new("/srv/db").unwrap();
    /// assert_eq!(
    ///     layout.resolve_names("Some/Channel:Name", "Title? \"Quote\"").unwrap(),
    ///     Path::new("/srv/db/Some Channel Name/Title Quote.pcm"),
    /// );
    /// ```
    pub fn resolve_names(&self, collection: impl AsRef<str>, item: impl AsRef<str>) -> Result<PathBuf> {
        Ok(self.resolve(&CacheKey::new(collection, item)?))
    }

    /// Transient container path for an entry: same file name, container
    /// extension instead of [`ENTRY_EXTENSION`]. Only the final extension is
    /// replaced, so dots inside the item name survive.
    pub fn container_path(entry: impl AsRef<Path>) -> PathBuf {
        entry.as_ref().with_extension(CONTAINER_EXTENSION)
    }
}
