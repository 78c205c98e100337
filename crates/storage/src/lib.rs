pub mod error;
mod layout;
pub mod local;
mod path;

pub use crate::layout::{CONTAINER_EXTENSION, CacheKey, CacheLayout, ENTRY_EXTENSION};
pub use crate::path::{FORBIDDEN, sanitize};
