/// FFmpeg command construction
///
/// Builds the relay invocation as a list of discrete arguments. Nothing here
/// goes through a shell, so URLs from settings are passed verbatim.
use crate::models::{Resolution, StreamConfig};

/// Silent audio input
const SILENT_AUDIO_INPUT: &str = "/dev/zero";
const AUDIO_SAMPLE_RATE: &str = "44100";
const AUDIO_CHANNELS: &str = "2";
const AUDIO_BITRATE: &str = "128k";
const VIDEO_CODEC: &str = "h264";
const PIXEL_FORMAT: &str = "yuv420p";
const GOP_SIZE: &str = "10";
const VIDEO_BITRATE: &str = "4000k";

/// Filter tokens in the order ffmpeg applies them: flips first, then rotation
pub fn video_filters(flip_horizontal: bool, flip_vertical: bool, rotate_90: bool) -> Vec<&'static str> {
    let mut filters = Vec::with_capacity(3);
    if flip_horizontal {
        filters.push("hflip");
    }
    if flip_vertical {
        filters.push("vflip");
    }
    if rotate_90 {
        filters.push("transpose=cclock");
    }
    if filters.is_empty() {
        filters.push("null");
    }
    filters
}

/// Program plus arguments, ready for the launcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfmpegCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl FfmpegCommand {
    /// Value following the first occurrence of `flag`
    pub fn arg_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct FfmpegCommandBuilder {
    program: String,
    source_url: String,
    destination_url: String,
    framerate: u32,
    resolution: Resolution,
    filters: Vec<&'static str>,
}

impl FfmpegCommandBuilder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            source_url: String::new(),
            destination_url: String::new(),
            framerate: 5,
            resolution: Resolution::default(),
            filters: video_filters(false, false, false),
        }
    }

    /// Take input, output and filters from a stream snapshot
    pub fn for_stream(program: impl Into<String>, config: &StreamConfig) -> Self {
        Self::new(program)
            .with_source(config.source_url.clone())
            .with_destination(config.destination_url.clone())
            .with_framerate(config.framerate)
            .with_resolution(config.resolution)
            .with_filters(video_filters(
                config.flip_horizontal,
                config.flip_vertical,
                config.rotate_90,
            ))
    }

    pub fn with_source(mut self, url: String) -> Self {
        self.source_url = url;
        self
    }

    pub fn with_destination(mut self, url: String) -> Self {
        self.destination_url = url;
        self
    }

    pub fn with_framerate(mut self, framerate: u32) -> Self {
        self.framerate = framerate;
        self
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_filters(mut self, filters: Vec<&'static str>) -> Self {
        self.filters = filters;
        self
    }

    pub fn build(&self) -> FfmpegCommand {
        let framerate = self.framerate.to_string();
        let mut args: Vec<String> = Vec::with_capacity(48);

        // MJPEG webcam input, read at its native rate
        args.extend(
            ["-re", "-f", "mjpeg", "-framerate", framerate.as_str(), "-i", self.source_url.as_str()]
                .map(String::from),
        );

        // Silent PCM input
        args.extend(
            [
                "-ar",
                AUDIO_SAMPLE_RATE,
                "-ac",
                AUDIO_CHANNELS,
                "-acodec",
                "pcm_s16le",
                "-f",
                "s16le",
                "-ac",
                AUDIO_CHANNELS,
                "-i",
                SILENT_AUDIO_INPUT,
            ]
            .map(String::from),
        );

        args.extend(
            ["-acodec", "aac", "-ab", AUDIO_BITRATE, "-strict", "experimental"].map(String::from),
        );

        let resolution = self.resolution.to_string();
        args.extend(
            [
                "-s",
                resolution.as_str(),
                "-vcodec",
                VIDEO_CODEC,
                "-pix_fmt",
                PIXEL_FORMAT,
                "-g",
                GOP_SIZE,
                "-vb",
                VIDEO_BITRATE,
                "-framerate",
                framerate.as_str(),
            ]
            .map(String::from),
        );

        let filter_chain = self.filters.join(",");
        args.extend(
            ["-f", "flv", "-filter:v", filter_chain.as_str(), self.destination_url.as_str()].map(String::from),
        );

        FfmpegCommand {
            program: self.program.clone(),
            args,
        }
    }
}
