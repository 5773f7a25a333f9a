use std::{net::SocketAddr, path::PathBuf};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{name} is not a valid address: {source}")]
    InvalidAddr {
        name: &'static str,
        source: std::net::AddrParseError,
    },
}

/// Process-wide configuration, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Media library the finished files land in.
    pub media_root: PathBuf,
    /// Directory holding the ffmpeg executable. `None` means use `PATH`.
    pub ffmpeg_dir: Option<PathBuf>,
    pub bind_addr: SocketAddr,
}

impl Settings {
    /// Reads `PLEX_SERVER`, `FFMPEG_PATH` and `BIND_ADDR` from the
    /// environment. Load any `.env` file before calling this.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let media_root = get("PLEX_SERVER")
            .map(PathBuf::from)
            .ok_or(SettingsError::Missing("PLEX_SERVER"))?;
        let ffmpeg_dir = get("FFMPEG_PATH").map(PathBuf::from);
        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .trim()
            .parse::<SocketAddr>()
            .map_err(|source| SettingsError::InvalidAddr {
                name: "BIND_ADDR",
                source,
            })?;

        Ok(Settings {
            media_root,
            ffmpeg_dir,
            bind_addr,
        })
    }
}
