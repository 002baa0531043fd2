//! # album-dl
//!
//! Backend library for assembling, tagging, and packaging albums from
//! external audio sources.
//!
//! ## Design Philosophy
//!
//! album-dl is designed to be:
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Detached jobs** - Submissions return immediately; progress is polled
//! - **Partial-failure tolerant** - One bad track never sinks the album
//! - **Pluggable** - The media fetch backend is a trait; yt-dlp is just the
//!   default implementation
//!
//! ## Quick Start
//!
//! ```no_run
//! use album_dl::{Album, AlbumDownloader, Config, Track};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = AlbumDownloader::new(Config::default()).await?;
//!
//!     let album = Album {
//!         name: "Test".to_string(),
//!         artist: "Artist".to_string(),
//!         tracks: vec![Track {
//!             number: 1,
//!             name: "First".to_string(),
//!             source_url: Some("https://example.com/watch?v=abc".to_string()),
//!             ..Default::default()
//!         }],
//!         ..Default::default()
//!     };
//!
//!     let id = downloader.submit_album(album, None).await?;
//!
//!     // Poll until the packaged archive is ready
//!     loop {
//!         let status = downloader.job_status(id).await?;
//!         if status.done {
//!             let artifact = downloader.take_artifact(id).await?;
//!             println!("archive at {}", artifact.path.display());
//!             break;
//!         }
//!         tokio::time::sleep(std::time::Duration::from_millis(500)).await;
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Archive packaging
pub mod archive;
/// Configuration types
pub mod config;
/// Cover art fetching and transcoding
pub mod cover;
/// Core downloader implementation (decomposed into focused submodules)
pub mod downloader;
/// Error types
pub mod error;
/// External audio fetching
pub mod fetcher;
/// Album job execution
mod job;
/// In-memory job registry
pub mod registry;
/// Filename sanitization
pub mod sanitize;
/// ID3 tag writing
pub mod tagger;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use archive::Archiver;
pub use config::Config;
pub use cover::CoverArtFetcher;
pub use downloader::AlbumDownloader;
pub use error::{
    ApiError, ArchiveError, Error, ErrorDetail, FetchError, JobError, Result, ToHttpStatus,
};
pub use fetcher::{AudioFetcher, YtDlpFetcher};
pub use registry::{ArtifactHandle, CancelOutcome, JobRegistry};
pub use types::{
    Album, Event, JobId, JobPhase, JobStatus, MAX_AUDIO_QUALITY, Track, TrackMetadata,
};

/// Helper function to run the downloader with graceful signal handling.
///
/// Waits for a termination signal and then calls the downloader's
/// `shutdown()` method.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use album_dl::{AlbumDownloader, Config, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let downloader = AlbumDownloader::new(Config::default()).await?;
///     downloader.start_job_sweeper();
///
///     // Run with automatic signal handling
///     run_with_shutdown(downloader).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(downloader: AlbumDownloader) -> Result<()> {
    wait_for_signal().await;
    downloader.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
