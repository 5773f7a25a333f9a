use std::{path::PathBuf, sync::Arc};

use tokio::try_join;

use crate::{
    ffmpeg::{FfmpegError, MergeRequest, Muxer},
    player_response::{PlayerResponseError, Resolver},
    scratch::Scratch,
    stats::DownloadSummary,
    stream::{self, StreamDescriptor, StreamError},
    util::{self, DownloadError, Fetcher},
};

#[derive(thiserror::Error, Debug)]
pub enum WorkerError {
    #[error("Could not resolve video: {0}")]
    Resolve(#[from] PlayerResponseError),
    #[error("{0}")]
    NoStream(#[from] StreamError),
    #[error("Download failed: {0}")]
    Download(#[from] DownloadError),
    #[error("Merge failed: {0}")]
    Merge(#[from] FfmpegError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadRequest {
    pub video_id: String,
    /// Only accept streams that already carry audio and video.
    pub force_progressive: bool,
}

/// Sequences resolve, select, download and merge for one video.
pub struct Worker {
    resolver: Arc<dyn Resolver>,
    fetcher: Arc<dyn Fetcher>,
    muxer: Arc<dyn Muxer>,
    media_root: PathBuf,
}

impl Worker {
    pub fn new(
        resolver: Arc<dyn Resolver>,
        fetcher: Arc<dyn Fetcher>,
        muxer: Arc<dyn Muxer>,
        media_root: PathBuf,
    ) -> Self {
        Self {
            resolver,
            fetcher,
            muxer,
            media_root,
        }
    }

    pub async fn run(&self, request: &DownloadRequest) -> Result<DownloadSummary, WorkerError> {
        info!("Attempting to download video {}", request.video_id);

        let streams = self.resolver.resolve(&request.video_id).await?;
        let video = stream::best_video(&streams, request.force_progressive)?;
        debug!(
            "Video: itag {} {}p {}fps ({}), {}",
            video.itag,
            video.resolution.unwrap_or_default(),
            video.frame_rate.unwrap_or_default(),
            video.mime_type,
            expected_size(video)
        );

        if video.progressive {
            let download = self.fetcher.fetch(video, &self.media_root).await?;
            return Ok(DownloadSummary::new(download.bytes, download.path, false));
        }

        let audio = stream::best_audio(&streams)?;
        debug!(
            "Audio: itag {} {}kbps ({}), {}",
            audio.itag,
            audio.average_bitrate.unwrap_or_default() / 1000,
            audio.mime_type,
            expected_size(audio)
        );

        let scratch = Scratch::new(&self.media_root);
        let merged = self.download_and_merge(&scratch, video, audio).await;
        // Released on success and failure alike, the guard's Drop only
        // covers a cancelled request
        scratch.release().await;

        let (bytes, path) = merged?;
        Ok(DownloadSummary::new(bytes, path, true))
    }

    async fn download_and_merge(
        &self,
        scratch: &Scratch,
        video: &StreamDescriptor,
        audio: &StreamDescriptor,
    ) -> Result<(u64, PathBuf), WorkerError> {
        let (dl_video, dl_audio) = try_join!(
            self.fetcher.fetch(video, scratch.video_dir()),
            self.fetcher.fetch(audio, scratch.audio_dir())
        )?;

        let merged = self
            .muxer
            .merge(&MergeRequest {
                video: dl_video.path,
                audio: dl_audio.path,
                dest_dir: self.media_root.clone(),
            })
            .await?;

        Ok((dl_video.bytes + dl_audio.bytes, merged))
    }
}

fn expected_size(stream: &StreamDescriptor) -> String {
    stream
        .content_length
        .map(util::format_bytes)
        .unwrap_or_else(|| "size unknown".to_string())
}
