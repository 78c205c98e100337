//! The fetch, decode and cache pipeline.
//!
//! [`CachePipeline::ensure_cached`] is the single entry point: given a
//! collection name, an item name and a source for the audio, it returns the
//! path of a decoded raw PCM file, downloading and decoding it first if the
//! cache doesn't have it yet. [`RemoteId`] turns user input (watch URLs,
//! short links, bare IDs) into the source handed to the downloader.

pub mod error;
mod flight;
mod pipeline;
mod source;

pub use crate::pipeline::{CachePipeline, Cached, Effort};
pub use crate::source::{DEFAULT_URL_TEMPLATE, RemoteId};
