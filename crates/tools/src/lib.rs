//! Wrappers around the external programs that do the heavy lifting: yt-dlp
//! downloads a compressed audio container, ffmpeg decodes it into raw PCM.
//!
//! Both are exposed through object-safe traits ([`Fetch`], [`Decode`]) so the
//! cache pipeline can be handed real processes in production and stubs in
//! tests.

mod decoder;
pub mod error;
mod executable;
mod fetcher;
mod format;

pub use crate::decoder::Decoder;
pub use crate::executable::Executable;
pub use crate::fetcher::Fetcher;
pub use crate::format::PcmFormat;
use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

pub type FetchHandle = Arc<dyn Fetch>;
pub type DecodeHandle = Arc<dyn Decode>;

/// Materializes a compressed audio container from a remote identifier.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Downloads `source` to `destination`. A file may be left at
    /// `destination` even when this fails.
    async fn fetch(&self, source: &str, destination: &Path) -> Result<()>;
}

/// Converts a compressed audio container into raw PCM bytes.
#[async_trait]
pub trait Decode: Send + Sync {
    /// Format of the bytes returned by [`decode`](Self::decode).
    fn format(&self) -> PcmFormat;

    async fn decode(&self, container: &Path) -> Result<Vec<u8>>;
}

#[async_trait]
impl Fetch for Fetcher {
    async fn fetch(&self, source: &str, destination: &Path) -> Result<()> {
        Fetcher::fetch(self, source, destination).await
    }
}

#[async_trait]
impl Decode for Decoder {
    fn format(&self) -> PcmFormat {
        Decoder::format(self)
    }

    async fn decode(&self, container: &Path) -> Result<Vec<u8>> {
        Decoder::decode(self, container).await
    }
}
