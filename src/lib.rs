//! # yt-plex
//!
//! A small HTTP service that downloads YouTube videos into a media library,
//! such as a Plex library folder.
//!
//! `GET /watch?v=<video id>&progressive=<bool>` resolves the streams of the
//! video and picks the highest resolution one. If that stream already carries
//! audio it is downloaded straight into the library. Otherwise the best audio
//! stream is downloaded alongside it into per-request scratch directories and
//! the two are muxed with ffmpeg.
//!
//! ## Usage
//!
//! The pieces can be used without the HTTP layer:
//!
//! ```rust,no_run
//! use std::{path::PathBuf, sync::Arc};
//! use yt_plex::{ffmpeg, player_response, util, worker};
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = Arc::new(util::HttpClient::new().unwrap());
//!     let worker = worker::Worker::new(
//!         Arc::new(player_response::YouTubeResolver::new(client.clone())),
//!         client,
//!         Arc::new(ffmpeg::Ffmpeg::new(None)),
//!         PathBuf::from("/srv/plex/YouTube"),
//!     );
//!
//!     let request = worker::DownloadRequest {
//!         video_id: "dQw4w9WgXcQ".into(),
//!         force_progressive: false,
//!     };
//!     let summary = worker.run(&request).await.unwrap();
//!     println!("{}", summary);
//! }
//! ```

#![forbid(unsafe_code)]

#[macro_use]
extern crate log;

pub mod ffmpeg;
pub mod player_response;
pub mod scratch;
pub mod server;
pub mod settings;
pub mod stats;
pub mod stream;
pub mod util;
pub mod worker;
