//! Command-line front end for the pcmcache pipeline.

mod cli;
mod error;

use crate::cli::{Cli, Command};
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use pcmcache_config::Config;
use pcmcache_pipeline::{CachePipeline, DEFAULT_URL_TEMPLATE, Effort, RemoteId};
use pcmcache_storage::CacheLayout;
use pcmcache_tools::{Decoder, Fetcher};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "pcmcache=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        },
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    if cli.cache_root.is_some() {
        config.cache_root = cli.cache_root;
    }
    let root = config.cache_root().or_raise(|| ErrorKind::Config)?;
    let layout = CacheLayout::new(root).or_raise(|| ErrorKind::Config)?;
    tracing::debug!(root = %layout.root().display(), "Using cache root");

    match cli.command {
        Command::Path { collection, item } => {
            let path = layout.resolve_names(&collection, &item).or_raise(|| ErrorKind::Cache)?;
            println!("{}", path.display());
        },
        Command::Fetch { identifier, collection, item } => {
            let (id, source) = source_url(&identifier, config.source.url_template.as_deref())?;
            let fetcher = Fetcher::resolve(config.fetcher.program.as_deref()).or_raise(|| ErrorKind::Tools)?;
            let decoder = Decoder::resolve(config.decoder.program.as_deref()).or_raise(|| ErrorKind::Tools)?;
            let pipeline = CachePipeline::new(layout, Arc::new(fetcher), Arc::new(decoder));

            let item = item.unwrap_or_else(|| id.to_string());
            let cached = pipeline
                .ensure_cached(&collection, &item, &source)
                .await
                .or_raise(|| ErrorKind::Cache)?;
            let effort = match cached.effort {
                Effort::Hit => "hit",
                Effort::Filled => "filled",
            };
            tracing::info!(effort, bytes = cached.bytes, duration = ?cached.duration, "Entry ready");
            println!("{}", cached.path.display());
        },
    }
    Ok(())
}

/// Extracts the media identifier from user input and renders the URL handed
/// to the downloader.
fn source_url(identifier: &str, template: Option<&str>) -> Result<(RemoteId, String)> {
    let id = identifier.parse::<RemoteId>().or_raise(|| ErrorKind::Identifier)?;
    let url = id.url(template.unwrap_or(DEFAULT_URL_TEMPLATE));
    Ok((id, url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_url_uses_default_template() {
        let (id, url) = source_url("https://youtu.be/dQw4w9WgXcQ?si=abc", None).unwrap();
        assert_eq!(id.as_str(), "dQw4w9WgXcQ");
        assert_eq!(url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    }

    #[test]
    fn test_source_url_uses_configured_template() {
        let (_, url) = source_url("dQw4w9WgXcQ", Some("https://piped.example/watch?v={id}")).unwrap();
        assert_eq!(url, "https://piped.example/watch?v=dQw4w9WgXcQ");
    }

    #[test]
    fn test_source_url_rejects_garbage() {
        let err = source_url("not an identifier", None).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Identifier));
    }
}
