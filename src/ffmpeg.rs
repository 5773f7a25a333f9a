use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::ExitStatus,
};

/// Container every merged file ends up in.
pub const MERGED_EXTENSION: &str = "mp4";

#[derive(thiserror::Error, Debug)]
pub enum FfmpegError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("ffmpeg exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },
    #[error("Invalid input path {0}")]
    InvalidPath(PathBuf),
}

/// A video-only and an audio-only file to combine into `dest_dir`.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeRequest {
    pub video: PathBuf,
    pub audio: PathBuf,
    pub dest_dir: PathBuf,
}

#[async_trait::async_trait]
pub trait Muxer: Send + Sync {
    /// Returns the path of the merged file.
    async fn merge(&self, request: &MergeRequest) -> Result<PathBuf, FfmpegError>;
}

pub struct Ffmpeg {
    binary: PathBuf,
}

impl Ffmpeg {
    /// Uses the ffmpeg executable inside `dir`, or whichever one `PATH`
    /// resolves when no directory is given.
    pub fn new(dir: Option<&Path>) -> Self {
        let name = if cfg!(windows) { "ffmpeg.exe" } else { "ffmpeg" };
        let binary = match dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        };

        Self { binary }
    }

    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

impl MergeRequest {
    /// `<dest_dir>/<video stem>.mp4`
    pub fn output_path(&self) -> Result<PathBuf, FfmpegError> {
        let stem = self
            .video
            .file_stem()
            .ok_or_else(|| FfmpegError::InvalidPath(self.video.clone()))?;

        // Not with_extension, titles often contain dots
        let mut name = stem.to_os_string();
        name.push(".");
        name.push(MERGED_EXTENSION);

        Ok(self.dest_dir.join(name))
    }

    /// Where ffmpeg writes before the result is moved to `output`.
    pub fn partial_path(output: &Path) -> PathBuf {
        let mut name = output.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        output.with_file_name(name)
    }

    fn args(&self, output: &Path) -> Vec<OsString> {
        let mut args = Vec::new();
        args.extend(["-hide_banner", "-loglevel", "error", "-y", "-i"].map(OsString::from));
        args.push(self.video.clone().into());
        args.push("-i".into());
        args.push(self.audio.clone().into());
        // Explicit muxer, the partial file has no .mp4 extension
        args.extend(
            ["-map", "0:v:0", "-map", "1:a:0", "-c", "copy", "-f", "mp4"].map(OsString::from),
        );
        args.push(output.into());
        args
    }
}

#[async_trait::async_trait]
impl Muxer for Ffmpeg {
    async fn merge(&self, request: &MergeRequest) -> Result<PathBuf, FfmpegError> {
        let output = request.output_path()?;
        let partial = MergeRequest::partial_path(&output);

        let mut child = tokio::process::Command::new(&self.binary);
        child.args(request.args(&partial)).kill_on_drop(true);

        debug!(
            "Merging {} and {} into {}",
            request.video.display(),
            request.audio.display(),
            output.display()
        );
        let result = match child.output().await {
            Ok(result) if result.status.success() => {
                tokio::fs::rename(&partial, &output).await.map_err(FfmpegError::from)
            }
            Ok(result) => Err(FfmpegError::Failed {
                status: result.status,
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            }),
            Err(e) => Err(e.into()),
        };

        if let Err(e) = &result {
            debug!("Discarding partial merge {}: {}", partial.display(), e);
            let _ = tokio::fs::remove_file(&partial).await;
        }

        result.map(|_| output)
    }
}
