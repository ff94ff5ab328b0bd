//! ffmpeg argv construction for the clip transcode.
//!
//! Arg construction is a pure function of the clip request: identical
//! requests always yield identically configured transcoders.

use loopclip_models::ClipRequest;

/// Length of each loop fade, seconds.
pub const FADE_SECS: f64 = 0.05;

/// Output codec and bitrate are fixed regardless of source format.
pub const AUDIO_CODEC: &str = "libmp3lame";
pub const AUDIO_BITRATE: &str = "320k";

/// Builder for the transcoding stage invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeCommand {
    start_secs: f64,
    duration_secs: f64,
    loop_fades: bool,
}

impl TranscodeCommand {
    pub fn for_clip(request: &ClipRequest) -> Self {
        Self {
            start_secs: request.start_secs(),
            duration_secs: request.duration(),
            loop_fades: request.optimize_loop(),
        }
    }

    /// Build the full ffmpeg argument list: read raw audio from stdin,
    /// trim on the input side, optionally fade, encode MP3 to stdout.
    pub fn build_args(&self) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-hide_banner".into(),
            "-v".into(),
            "error".into(),
            // Input-side trim: segment extraction happens before the
            // re-encode so discarded audio is never processed.
            "-ss".into(),
            format!("{:.3}", self.start_secs),
            "-t".into(),
            format!("{:.3}", self.duration_secs),
            "-i".into(),
            "pipe:0".into(),
        ];

        if self.loop_fades {
            args.push("-af".into());
            args.push(loop_fade_filter(self.duration_secs));
        }

        args.extend(
            [
                "-vn",
                "-c:a",
                AUDIO_CODEC,
                "-b:a",
                AUDIO_BITRATE,
                "-f",
                "mp3",
                "pipe:1",
            ]
            .map(String::from),
        );

        args
    }
}

/// Symmetric 50 ms fade pair, always relative to the segment: fade-in
/// at offset 0, fade-out starting `FADE_SECS` before the segment ends.
pub fn loop_fade_filter(duration_secs: f64) -> String {
    format!(
        "afade=t=in:st=0:d={FADE_SECS},afade=t=out:st={:.2}:d={FADE_SECS}",
        duration_secs - FADE_SECS
    )
}
