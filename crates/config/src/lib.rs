//! Configuration loading for pcmcache.
//!
//! Settings are layered with [`figment`], later layers overriding earlier ones:
//!
//! 1. Built-in defaults ([`Config::default`]).
//! 2. A configuration file: TOML, YAML or JSON, chosen by extension. Defaults
//!    to `config.toml` in the platform configuration directory.
//! 3. Environment variables prefixed with `PCMCACHE_`. Nested keys are
//!    separated with a double underscore (`PCMCACHE_DECODER__PROGRAM`).
//!
//! ```toml
//! cache_root = "/srv/pcmcache"
//!
//! [decoder]
//! program = "/opt/ffmpeg/bin/ffmpeg"
//!
//! [source]
//! url_template = "https://www.youtube.com/watch?v={id}"
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::{OptionExt, ResultExt};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "PCMCACHE_";
const CONFIG_FILE: &str = "config.toml";
/// Name of the cache directory placed next to the executable.
const CACHE_DIR: &str = "db";

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Root directory of the cache. See [`Config::cache_root`] for the default.
    pub cache_root: Option<PathBuf>,
    pub decoder: ToolConfig,
    pub fetcher: ToolConfig,
    pub source: SourceConfig,
}

/// Overrides for locating an external program.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Program name (looked up in `PATH`) or path. Discovered automatically
    /// when unset.
    pub program: Option<PathBuf>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Template for the URL handed to the downloader; `{id}` is replaced by
    /// the media identifier.
    pub url_template: Option<String>,
}

impl Config {
    /// Location of the configuration file used when none is given explicitly.
    pub fn default_file() -> Option<PathBuf> {
        ProjectDirs::from("", "", "pcmcache").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Loads the configuration, reading `file` if given (it must exist) or
    /// the [default file](Self::default_file) if it exists.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let file = match file {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => Self::default_file().filter(|path| path.is_file()),
        };
        tracing::debug!(file = ?file, "Loading configuration");
        Self::figment(file.as_deref()).extract().or_raise(|| ErrorKind::Load)
    }

    fn figment(file: Option<&Path>) -> Figment {
        let figment = Figment::from(Serialized::defaults(Config::default()));
        let figment = match file {
            Some(path) => match path.extension().and_then(OsStr::to_str) {
                Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                _ => figment.merge(Toml::file(path)),
            },
            None => figment,
        };
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// The configured cache root, or `db` next to the executable.
    ///
    /// When the executable is running from a temporary or build location
    /// (the system temp directory, or a cargo `target` directory) the current
    /// working directory is used instead.
    pub fn cache_root(&self) -> Result<PathBuf> {
        if let Some(root) = &self.cache_root {
            return Ok(root.clone());
        }
        let exe_dir = std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf));
        let base = match exe_dir {
            Some(dir) if !is_transient(&dir) => dir,
            _ => std::env::current_dir().or_raise(|| ErrorKind::CacheRoot)?,
        };
        Some(base.join(CACHE_DIR)).filter(|root| root.is_absolute()).ok_or_raise(|| ErrorKind::CacheRoot)
    }
}

fn is_transient(dir: &Path) -> bool {
    dir.starts_with(std::env::temp_dir()) || dir.components().any(|c| c.as_os_str() == "target")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[rstest]
    #[case("config.toml", "cache_root = \"/srv/pcm\"\n[decoder]\nprogram = \"/opt/ffmpeg\"\n")]
    #[case("config.yaml", "cache_root: /srv/pcm\ndecoder:\n  program: /opt/ffmpeg\n")]
    #[case("config.yml", "cache_root: /srv/pcm\ndecoder:\n  program: /opt/ffmpeg\n")]
    #[case("config.json", r#"{"cache_root": "/srv/pcm", "decoder": {"program": "/opt/ffmpeg"}}"#)]
    fn test_load_formats(#[case] name: &str, #[case] contents: &str) {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = write(temp_dir.path(), name, contents);
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.cache_root, Some(PathBuf::from("/srv/pcm")));
        assert_eq!(config.decoder.program, Some(PathBuf::from("/opt/ffmpeg")));
        assert_eq!(config.fetcher, ToolConfig::default());
        assert_eq!(config.source, SourceConfig::default());
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = write(temp_dir.path(), "config.toml", "[source]\nurl_template = \"https://example.test/{id}\"\n");
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.source.url_template.as_deref(), Some("https://example.test/{id}"));
        assert_eq!(config.cache_root, None);
        assert_eq!(config.decoder, ToolConfig::default());
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&temp_dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[test]
    fn test_load_malformed_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = write(temp_dir.path(), "config.toml", "cache_root = [1, 2");
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Load));
    }

    #[test]
    fn test_configured_cache_root_wins() {
        let config = Config { cache_root: Some(PathBuf::from("/srv/pcm")), ..Default::default() };
        assert_eq!(config.cache_root().unwrap(), Path::new("/srv/pcm"));
    }

    #[test]
    fn test_default_cache_root() {
        let root = Config::default().cache_root().unwrap();
        assert!(root.is_absolute());
        assert!(root.ends_with(CACHE_DIR));
    }

    #[rstest]
    #[case("/home/me/projects/pcmcache/target/debug", true)]
    #[case("/usr/local/bin", false)]
    fn test_is_transient(#[case] dir: &str, #[case] expected: bool) {
        assert_eq!(is_transient(Path::new(dir)), expected);
    }
}
