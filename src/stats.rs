use std::{fmt, path::PathBuf};

use crate::util;

pub const BYTES_PER_MEGABYTE: f64 = 1_048_576.0;

pub fn megabytes(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MEGABYTE
}

/// Outcome of one request: everything that was downloaded and where the
/// playable file ended up.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadSummary {
    pub bytes_downloaded: u64,
    pub path: PathBuf,
    pub merged: bool,
}

impl DownloadSummary {
    pub fn new(bytes_downloaded: u64, path: PathBuf, merged: bool) -> Self {
        Self {
            bytes_downloaded,
            path,
            merged,
        }
    }

    pub fn megabytes(&self) -> f64 {
        megabytes(self.bytes_downloaded)
    }

    pub fn log(&self) {
        info!(
            "Finished {} ({}{})",
            self.path.display(),
            util::format_bytes(self.bytes_downloaded),
            if self.merged { ", merged" } else { "" }
        );
    }
}

impl fmt::Display for DownloadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Downloaded {:.3} MB to {}",
            self.megabytes(),
            self.path.display()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn megabytes_are_mebibyte_based() {
        assert_eq!(megabytes(1_048_576), 1.0);
        assert_eq!(megabytes(524_288), 0.5);
        assert_eq!(megabytes(0), 0.0);
    }

    #[test]
    fn summary_text() {
        let summary = DownloadSummary::new(
            3 * 1_048_576 + 524_288,
            PathBuf::from("/library/Some Title.mp4"),
            true,
        );
        assert_eq!(
            summary.to_string(),
            "Downloaded 3.500 MB to /library/Some Title.mp4"
        );

        let summary = DownloadSummary::new(1234, PathBuf::from("/library/a.mp4"), false);
        assert_eq!(summary.to_string(), "Downloaded 0.001 MB to /library/a.mp4");
    }
}
