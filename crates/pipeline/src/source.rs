//! Media identifiers and the source URLs handed to the downloader.

use crate::error::{Error, ErrorKind};
use std::fmt;
use std::str::FromStr;

/// Source URL template used when none is configured. `{id}` is replaced by
/// the media identifier.
pub const DEFAULT_URL_TEMPLATE: &str = "https://www.youtube.com/watch?v={id}";

/// A bare media identifier, as extracted from user input.
///
/// Accepts watch URLs (`…/watch?v=<id>&…`), short links (`youtu.be/<id>?…`),
/// shorts URLs (`…/shorts/<id>`) or the identifier itself.
///
/// ```
/// use pcmcache_pipeline::{DEFAULT_URL_TEMPLATE, RemoteId};
/// let id: RemoteId = "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42".parse().unwrap();
/// assert_eq!(id.as_str(), "dQw4w9WgXcQ");
/// assert_eq!(id.url(DEFAULT_URL_TEMPLATE), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RemoteId(String);
impl RemoteId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Renders the source URL by substituting every `{id}` in `template`.
    pub fn url(&self, template: &str) -> String {
        template.replace("{id}", &self.0)
    }

    fn extract(input: &str) -> &str {
        let candidate = if let Some((_, rest)) = input.split_once("v=") {
            rest.split('&').next()
        } else if let Some((_, rest)) = input.split_once("youtu.be/") {
            rest.split('?').next()
        } else if let Some((_, rest)) = input.split_once("/shorts/") {
            rest.split('?').next()
        } else {
            Some(input)
        };
        // Fragments (`#t=42`) never belong to the identifier.
        candidate.and_then(|c| c.split('#').next()).unwrap_or_default().trim_end_matches('/')
    }
}
impl FromStr for RemoteId {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let id = Self::extract(s.trim());
        let valid = !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            exn::bail!(ErrorKind::InvalidIdentifier(s.to_string()));
        }
        Ok(Self(id.to_string()))
    }
}
impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
