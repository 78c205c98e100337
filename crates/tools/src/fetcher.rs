use crate::Executable;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::ffi::OsString;
use std::path::Path;
use tracing::instrument;

const YT_DLP: &str = "yt-dlp";

/// Downloads the best available audio stream of a remote source into an
/// Opus container using yt-dlp.
pub struct Fetcher {
    executable: Executable,
}
impl Fetcher {
    pub fn new(executable: Executable) -> Self {
        Self { executable }
    }

    pub fn resolve(configured: Option<&Path>) -> Result<Self> {
        Ok(Self::new(Executable::resolve(configured, YT_DLP, &[])?))
    }

    /// Audio only, Opus at the best quality, a single video even when the
    /// source is part of a playlist, written straight to `destination`
    /// (no `.part` file) with a fresh modification time.
    fn arguments(source: &str, destination: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "-x",
            "--audio-format",
            "opus",
            "--audio-quality",
            "0",
            "--no-playlist",
            "--no-part",
            "--no-mtime",
            "-o",
        ]
        .map(OsString::from)
        .into();
        args.push(destination.as_os_str().to_owned());
        args.push(source.into());
        args
    }

    /// Downloads `source` (a URL or anything else yt-dlp accepts) to
    /// `destination`.
    ///
    /// On failure `destination` may or may not exist; cleaning it up is the
    /// caller's responsibility.
    ///
    /// # Errors
    /// - [`Launch`](ErrorKind::Launch) if yt-dlp could not be started.
    /// - [`Failed`](ErrorKind::Failed) if it exited unsuccessfully, carrying
    ///   its combined output.
    #[instrument(skip(self), fields(destination = %destination.display()))]
    pub async fn fetch(&self, source: &str, destination: &Path) -> Result<()> {
        let program = self.executable.to_string();
        let output = self
            .executable
            .command()
            .args(Self::arguments(source, destination))
            .output()
            .await
            .or_raise(|| ErrorKind::Launch(program.clone()))?;
        if !output.status.success() {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            exn::bail!(ErrorKind::Failed {
                program,
                status: output.status.to_string(),
                output: combined.trim().to_string(),
            });
        }
        tracing::debug!("Container fetched");
        Ok(())
    }
}
