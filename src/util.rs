use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::StreamExt;
use reqwest_cookie_store::CookieStoreMutex;
use tokio::{fs::File, io::AsyncWriteExt};

use crate::stream::StreamDescriptor;

pub struct HttpClient {
    pub client: reqwest::Client,
    pub cookies: Arc<CookieStoreMutex>,
}

#[derive(thiserror::Error, Debug)]
pub enum DownloadError {
    #[error("reqwest error: {0}")]
    ReqwestError(#[from] reqwest::Error),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A stream fetched to local storage.
#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    pub path: PathBuf,
    pub bytes: u64,
}

/// Fetches one stream into a directory.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, stream: &StreamDescriptor, dir: &Path)
        -> Result<Download, DownloadError>;
}

impl HttpClient {
    pub fn new() -> reqwest::Result<HttpClient> {
        let cookies = Arc::new(CookieStoreMutex::default());

        let client = reqwest::Client::builder()
            .cookie_provider(cookies.clone())
            .build()?;

        Ok(HttpClient { client, cookies })
    }

    /// Streams `url` into `path`, going through a `.tmp` sibling so a partial
    /// transfer never sits under the final name. Returns the bytes written.
    pub async fn download_file(&self, url: &str, path: &Path) -> Result<u64, DownloadError> {
        let temp_path = path.with_file_name(format!(
            "{}.tmp",
            path.file_name().unwrap_or_default().to_string_lossy()
        ));
        let transfer = async {
            let mut file = File::create(&temp_path).await?;
            let resp = self.client.get(url).send().await?.error_for_status()?;
            let mut body = resp.bytes_stream();
            let mut size = 0;

            while let Some(chunk) = body.next().await {
                let chunk = chunk?;
                file.write_all(&chunk).await?;
                size += chunk.len() as u64;
            }

            file.flush().await?;
            Ok::<_, DownloadError>(size)
        };

        match transfer.await {
            Ok(size) => {
                tokio::fs::rename(&temp_path, path).await?;
                Ok(size)
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&temp_path).await;
                Err(e)
            }
        }
    }

    pub async fn fetch_text(&self, url: &str) -> Result<String, DownloadError> {
        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
            .map_err(|e| e.into())
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpClient {
    async fn fetch(
        &self,
        stream: &StreamDescriptor,
        dir: &Path,
    ) -> Result<Download, DownloadError> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(&stream.default_filename);

        debug!("Downloading itag {} to {}", stream.itag, path.display());
        let bytes = self.download_file(&stream.url, &path).await?;
        debug!("Wrote {} to {}", format_bytes(bytes), path.display());

        Ok(Download { path, bytes })
    }
}

/// Longest stem in bytes. Leaves room for an extension plus `.tmp` under the
/// usual 255 byte file name limit.
pub const MAX_STEM_BYTES: usize = 200;

/// Turns a video title into something usable as a file name on any
/// filesystem. Falls back to `fallback` when nothing printable is left.
pub fn safe_filename(title: &str, fallback: &str) -> String {
    const RESERVED: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|', '#', '%', '~'];

    let cleaned = title
        .chars()
        .filter(|c| !c.is_control() && !RESERVED.contains(c))
        .collect::<String>();
    let cleaned = cleaned.trim().trim_matches('.').trim();

    if cleaned.is_empty() {
        return fallback.to_string();
    }

    let mut end = cleaned.len().min(MAX_STEM_BYTES);
    while !cleaned.is_char_boundary(end) {
        end -= 1;
    }

    cleaned[..end].trim_end().to_string()
}

pub fn format_bytes(bytes: u64) -> String {
    let mut bytes = bytes as f64;
    let mut suffix = "B";

    for next in ["KiB", "MiB", "GiB", "TiB"] {
        if bytes <= 1024.0 {
            break;
        }
        bytes /= 1024.0;
        suffix = next;
    }

    format!("{:.2} {}", bytes, suffix)
}
