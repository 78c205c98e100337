use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;

/// Bytes per sample of signed 16-bit PCM.
const BYTES_PER_SAMPLE: u16 = 2;

/// Raw, headerless, interleaved signed 16-bit little-endian PCM.
///
/// Cache entries carry no header, so the format is fixed for the whole cache
/// and must be known out of band by whoever plays them back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
}
impl Default for PcmFormat {
    /// 48 kHz stereo.
    fn default() -> Self {
        Self { sample_rate: 48_000, channels: 2 }
    }
}
impl PcmFormat {
    /// Bytes per frame (one sample for every channel).
    pub fn frame_size(&self) -> u64 {
        u64::from(self.channels) * u64::from(BYTES_PER_SAMPLE)
    }

    /// Playback duration of `bytes` of PCM data. Trailing bytes that don't
    /// make up a whole frame are ignored.
    pub fn duration(&self, bytes: u64) -> Duration {
        let rate = u64::from(self.sample_rate);
        if rate == 0 || self.channels == 0 {
            return Duration::ZERO;
        }
        let frames = bytes / self.frame_size();
        let nanos = (frames % rate) * 1_000_000_000 / rate;
        Duration::new(frames / rate, nanos as u32)
    }

    fn channel_layout(&self) -> &'static str {
        match self.channels {
            1 => "mono",
            _ => "stereo",
        }
    }

    /// ffmpeg arguments decoding `input` into this format on standard output.
    pub(crate) fn decoder_args(&self, input: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-loglevel", "error", "-hide_banner", "-i"].map(OsString::from).into();
        args.push(input.as_os_str().to_owned());
        args.extend(
            [
                "-vn".to_string(),
                "-ar".to_string(),
                self.sample_rate.to_string(),
                "-ac".to_string(),
                self.channels.to_string(),
                "-channel_layout".to_string(),
                self.channel_layout().to_string(),
                "-acodec".to_string(),
                "pcm_s16le".to_string(),
                "-f".to_string(),
                "s16le".to_string(),
                "pipe:1".to_string(),
            ]
            .map(OsString::from),
        );
        args
    }
}
