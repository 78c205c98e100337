//! Container to raw PCM decoding through an external ffmpeg process.
//!
//! The decoder writes PCM to its standard output and diagnostics to its
//! standard error. Both are pipes with a bounded OS buffer: if nothing reads
//! standard error while we sit blocked reading standard output, a chatty
//! decoder fills the buffer, blocks on its next diagnostic write, and never
//! produces the rest of the PCM. Standard error is therefore drained by its
//! own task for as long as standard output is being read.

use crate::error::{ErrorKind, Result};
use crate::{Executable, PcmFormat};
use exn::{OptionExt, ResultExt};
use std::path::Path;
use std::process::Stdio;
use tokio::io::{self, AsyncReadExt};
use tracing::instrument;

const FFMPEG: &str = "ffmpeg";
#[cfg(windows)]
const FALLBACKS: &[&str] = &[r"C:\ffmpeg\bin\ffmpeg.exe"];
#[cfg(not(windows))]
const FALLBACKS: &[&str] = &[];

/// Decodes compressed audio containers into raw [`PcmFormat`] bytes.
pub struct Decoder {
    executable: Executable,
    format: PcmFormat,
}
impl Decoder {
    pub fn new(executable: Executable) -> Self {
        Self { executable, format: PcmFormat::default() }
    }

    /// Uses the configured program if there is one, otherwise locates ffmpeg
    /// in `PATH` (or, on Windows, its usual install location).
    pub fn resolve(configured: Option<&Path>) -> Result<Self> {
        Ok(Self::new(Executable::resolve(configured, FFMPEG, FALLBACKS)?))
    }

    pub fn format(&self) -> PcmFormat {
        self.format
    }

    /// Decodes the whole container into memory.
    ///
    /// # Errors
    /// - [`Launch`](ErrorKind::Launch) if the process could not be started.
    /// - [`Pipe`](ErrorKind::Pipe) if a standard stream was not captured.
    /// - [`Io`](ErrorKind::Io) if reading output or waiting for exit failed.
    /// - [`Exited`](ErrorKind::Exited) if the decoder exited unsuccessfully.
    #[instrument(skip(self), fields(input = %container.display()))]
    pub async fn decode(&self, container: &Path) -> Result<Vec<u8>> {
        let program = self.executable.to_string();
        let mut child = self
            .executable
            .command()
            .args(self.format.decoder_args(container))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .or_raise(|| ErrorKind::Launch(program.clone()))?;
        // Any early return from here on drops `child`, which kills it.
        let mut stdout = child.stdout.take().ok_or_raise(|| ErrorKind::Pipe("stdout"))?;
        let mut stderr = child.stderr.take().ok_or_raise(|| ErrorKind::Pipe("stderr"))?;
        let drain = tokio::spawn(async move { io::copy(&mut stderr, &mut io::sink()).await });

        let mut pcm = Vec::new();
        if let Err(e) = stdout.read_to_end(&mut pcm).await {
            drain.abort();
            return Err(e).or_raise(|| ErrorKind::Io);
        }
        let status = child.wait().await.or_raise(|| ErrorKind::Io)?;
        let discarded = drain.await.or_raise(|| ErrorKind::Pipe("stderr"))?.or_raise(|| ErrorKind::Pipe("stderr"))?;
        if !status.success() {
            exn::bail!(ErrorKind::Exited { program, status: status.to_string() });
        }
        tracing::debug!(bytes = pcm.len(), discarded, "Container decoded");
        Ok(pcm)
    }
}
