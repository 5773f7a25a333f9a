use std::sync::Arc;

use yt_plex::{
    ffmpeg::Ffmpeg,
    player_response::YouTubeResolver,
    server::{self, AppState},
    settings::Settings,
    util::HttpClient,
    worker::Worker,
};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let client = Arc::new(HttpClient::new().expect("Could not create HttpClient"));
    let worker = Worker::new(
        Arc::new(YouTubeResolver::new(client.clone())),
        client,
        Arc::new(Ffmpeg::new(settings.ffmpeg_dir.as_deref())),
        settings.media_root.clone(),
    );
    let app = server::router(AppState {
        worker: Arc::new(worker),
    });

    let listener = tokio::net::TcpListener::bind(settings.bind_addr)
        .await
        .expect("Could not bind listener");
    log::info!(
        "Serving on http://{} into {}",
        settings.bind_addr,
        settings.media_root.display()
    );

    axum::serve(listener, app)
        .await
        .expect("Server exited with error");
}
