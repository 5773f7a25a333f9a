/// One available encoding of a video, as advertised by the player response.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamDescriptor {
    pub itag: i64,
    pub url: String,
    pub mime_type: String,
    /// Height in pixels, `None` for audio-only streams.
    pub resolution: Option<u32>,
    pub frame_rate: Option<u32>,
    pub average_bitrate: Option<u64>,
    /// Carries both audio and video.
    pub progressive: bool,
    pub content_length: Option<u64>,
    pub default_filename: String,
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum StreamError {
    #[error("No {0} stream found")]
    NotFound(&'static str),
}

impl StreamDescriptor {
    /// The part of the mime type before the codecs, e.g. `video/mp4`.
    pub fn content_type(&self) -> &str {
        self.mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
    }

    /// Container extension, e.g. `mp4` for `video/mp4; codecs="avc1"`.
    pub fn subtype(&self) -> &str {
        self.content_type()
            .split_once('/')
            .map(|(_, sub)| sub)
            .unwrap_or_default()
    }

    pub fn has_video(&self) -> bool {
        self.content_type().starts_with("video/")
    }

    pub fn is_audio_only(&self) -> bool {
        !self.progressive && self.content_type().starts_with("audio/")
    }
}

/// Picks the highest resolution stream carrying video. With
/// `force_progressive` only premixed streams are considered.
pub fn best_video(
    streams: &[StreamDescriptor],
    force_progressive: bool,
) -> Result<&StreamDescriptor, StreamError> {
    let mut video = streams
        .iter()
        .filter(|s| s.has_video())
        .filter(|s| !force_progressive || s.progressive)
        .collect::<Vec<_>>();

    // Stable sort, so equal resolutions keep the resolver's order
    video.sort_by(|a, b| b.resolution.cmp(&a.resolution));

    video.first().copied().ok_or(StreamError::NotFound("video"))
}

/// Picks the audio-only stream with the highest average bitrate.
pub fn best_audio(streams: &[StreamDescriptor]) -> Result<&StreamDescriptor, StreamError> {
    let mut audio = streams
        .iter()
        .filter(|s| s.is_audio_only())
        .collect::<Vec<_>>();
    audio.sort_by(|a, b| b.average_bitrate.cmp(&a.average_bitrate));

    audio.first().copied().ok_or(StreamError::NotFound("audio"))
}
