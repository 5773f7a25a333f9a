use serde::Deserialize;
use serde_aux::prelude::*;

use crate::{
    stream::StreamDescriptor,
    util::{self, HttpClient},
};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialPlayerResponse {
    pub playability_status: PlayabilityStatus,
    pub streaming_data: Option<StreamingData>,
    pub video_details: Option<VideoDetails>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayabilityStatus {
    pub status: Status,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Ok,
    LiveStreamOffline,
    Unplayable,
    LoginRequired,
    Error,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingData {
    #[serde(default)]
    pub formats: Vec<Format>,
    #[serde(default)]
    pub adaptive_formats: Vec<Format>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Format {
    pub itag: i64,
    /// Absent for signature-ciphered formats.
    pub url: Option<String>,
    pub mime_type: String,
    pub bitrate: u64,
    pub average_bitrate: Option<u64>,
    pub height: Option<u32>,
    pub fps: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub content_length: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    pub video_id: String,
    pub title: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub length_seconds: i64,
    pub author: String,
}

#[derive(thiserror::Error, Debug)]
pub enum PlayerResponseError {
    #[error("Could not find initial player response")]
    NoInitialPlayerResponse,
    #[error("Could not parse initial player response")]
    ParseInitialPlayerResponse(#[from] serde_json::Error),
    #[error("Video is unavailable ({status:?}): {}", .reason.as_deref().unwrap_or("no reason given"))]
    Unplayable {
        status: Status,
        reason: Option<String>,
    },
    #[error("No streaming data found")]
    NoStreamingData,
    #[error("Could not download watch page")]
    DownloadWatchPageError(#[from] util::DownloadError),
}

/// Looks up the streams available for a video id.
#[async_trait::async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, video_id: &str) -> Result<Vec<StreamDescriptor>, PlayerResponseError>;
}

const IPR_STR: &str = "var ytInitialPlayerResponse =";

fn get_ipr_str(html: &str) -> Option<&str> {
    // Find the start of the initial player response
    let idx_ipr = html.find(IPR_STR)? + IPR_STR.len();

    // Find the start and end of the JSON object
    let idx_start = html[idx_ipr..].find("{")? + idx_ipr;
    let idx_end = html[idx_start..].find("};")? + idx_start + 1;

    // Bounds check
    if idx_start >= idx_end || idx_start >= html.len() || idx_end >= html.len() {
        return None;
    }

    Some(&html[idx_start..idx_end])
}

impl Format {
    fn into_descriptor(self, progressive: bool, stem: &str) -> Option<StreamDescriptor> {
        let Some(url) = self.url else {
            debug!("Skipping itag {} without direct url", self.itag);
            return None;
        };

        let mut stream = StreamDescriptor {
            itag: self.itag,
            url,
            mime_type: self.mime_type,
            resolution: self.height,
            frame_rate: self.fps,
            average_bitrate: Some(self.average_bitrate.unwrap_or(self.bitrate)),
            progressive,
            content_length: self.content_length,
            default_filename: String::new(),
        };
        stream.default_filename = format!("{}.{}", stem, stream.subtype());

        Some(stream)
    }
}

impl InitialPlayerResponse {
    pub fn from_html(html: &str) -> Result<Self, PlayerResponseError> {
        // Find the initial player response
        let ipr_str = get_ipr_str(html).ok_or(PlayerResponseError::NoInitialPlayerResponse)?;

        // Parse the JSON
        serde_json::from_str(ipr_str).map_err(PlayerResponseError::ParseInitialPlayerResponse)
    }

    /// All streams with a direct url: progressive `formats` first, then the
    /// adaptive ones, each in the order YouTube lists them.
    pub fn stream_descriptors(self) -> Result<Vec<StreamDescriptor>, PlayerResponseError> {
        if self.playability_status.status != Status::Ok {
            return Err(PlayerResponseError::Unplayable {
                status: self.playability_status.status,
                reason: self.playability_status.reason,
            });
        }

        let stem = self
            .video_details
            .as_ref()
            .map(|v| util::safe_filename(&v.title, &v.video_id))
            .unwrap_or_else(|| "video".to_string());
        let data = self
            .streaming_data
            .ok_or(PlayerResponseError::NoStreamingData)?;

        let progressive = data
            .formats
            .into_iter()
            .filter_map(|f| f.into_descriptor(true, &stem));
        let adaptive = data
            .adaptive_formats
            .into_iter()
            .filter_map(|f| f.into_descriptor(false, &stem));

        Ok(progressive.chain(adaptive).collect())
    }
}

/// Resolves streams by scraping the player response off the watch page.
pub struct YouTubeResolver {
    client: std::sync::Arc<HttpClient>,
}

impl YouTubeResolver {
    pub fn new(client: std::sync::Arc<HttpClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl Resolver for YouTubeResolver {
    async fn resolve(&self, video_id: &str) -> Result<Vec<StreamDescriptor>, PlayerResponseError> {
        let url = format!("https://www.youtube.com/watch?v={}", video_id);
        let html = self.client.fetch_text(&url).await?;
        let ipr = InitialPlayerResponse::from_html(&html)?;

        if let Some(details) = &ipr.video_details {
            info!(
                "Resolved \"{}\" by {} ({}s)",
                details.title, details.author, details.length_seconds
            );
        }

        ipr.stream_descriptors()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipr_str() {
        let test_str = r#"<script>var ytInitialPlayerResponse = {"response": "test"};</script>"#;
        let result = get_ipr_str(test_str).expect("Could not find IPR");
        assert_eq!(result, r#"{"response": "test"}"#);

        let test_str = r#"<script>var ytInitialPlayerResponse = {"#;
        assert!(get_ipr_str(test_str).is_none());

        let test_str = r#"<script>var ytInitialPlayerResponse = "#;
        assert!(get_ipr_str(test_str).is_none());

        let test_str = r#"<script>var ytInitialPlayerResponse ="#;
        assert!(get_ipr_str(test_str).is_none());
    }

    fn get_test_html(fname: &str) -> String {
        let mut d = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        d.push("resources/test/");
        d.push(fname);
        std::fs::read_to_string(d).expect(format!("Could not read {}", fname).as_str())
    }

    #[test]
    fn ipr_video() {
        let html = get_test_html("watchpage_video.html");
        let ipr = InitialPlayerResponse::from_html(&html).expect("Could not parse IPR");
        assert_eq!(ipr.playability_status.status, Status::Ok);

        let details = ipr.video_details.as_ref().unwrap();
        assert_eq!(details.video_id, "abc123");
        assert_eq!(details.length_seconds, 212);

        let streams = ipr.stream_descriptors().expect("No streams");
        // itag 313 is ciphered and has no url
        let itags = streams.iter().map(|s| s.itag).collect::<Vec<_>>();
        assert_eq!(itags, vec![18, 22, 137, 248, 140, 251]);

        let progressive = &streams[1];
        assert!(progressive.progressive);
        assert_eq!(progressive.resolution, Some(720));
        assert_eq!(progressive.default_filename, "Rick Astley - Never Gonna Give You Up.mp4");

        let webm = streams.iter().find(|s| s.itag == 248).unwrap();
        assert!(!webm.progressive);
        assert_eq!(webm.default_filename, "Rick Astley - Never Gonna Give You Up.webm");
        assert_eq!(webm.content_length, Some(84_341_510));

        let opus = streams.iter().find(|s| s.itag == 251).unwrap();
        assert!(opus.is_audio_only());
        assert_eq!(opus.average_bitrate, Some(135_879));
    }

    #[test]
    fn ipr_unplayable() {
        let html = get_test_html("watchpage_unplayable.html");
        let ipr = InitialPlayerResponse::from_html(&html).expect("Could not parse IPR");
        assert!(ipr.video_details.is_none());

        match ipr.stream_descriptors() {
            Err(PlayerResponseError::Unplayable { status, reason }) => {
                assert_eq!(status, Status::Error);
                assert_eq!(reason.as_deref(), Some("Video unavailable"));
            }
            other => panic!("Expected unplayable, got {:?}", other),
        }
    }

    #[test]
    fn long_multibyte_title_fits_filesystem() {
        let title = "日本語".repeat(34);
        let json = serde_json::json!({
            "playabilityStatus": {"status": "OK"},
            "streamingData": {"adaptiveFormats": [{
                "itag": 248,
                "url": "https://rr1---sn-test.googlevideo.com/videoplayback?itag=248",
                "mimeType": "video/webm; codecs=\"vp9\"",
                "bitrate": 3283036,
                "height": 1080
            }]},
            "videoDetails": {
                "videoId": "abc123",
                "title": title,
                "lengthSeconds": "60",
                "author": "someone"
            }
        });
        let ipr: InitialPlayerResponse = serde_json::from_value(json).unwrap();

        let streams = ipr.stream_descriptors().unwrap();
        let name = &streams[0].default_filename;
        assert!(name.ends_with(".webm"));
        assert!(format!("{}.tmp", name).len() <= 255);
    }

    #[test]
    fn no_player_response() {
        assert!(matches!(
            InitialPlayerResponse::from_html("<html><body>consent</body></html>"),
            Err(PlayerResponseError::NoInitialPlayerResponse)
        ));
    }
}
