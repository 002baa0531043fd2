//! End-to-end pipeline tests driving real jobs against a mock fetch backend.

use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use id3::TagLike;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::downloader::test_helpers::{
    FAKE_AUDIO, MockFetcher, create_test_downloader, create_test_downloader_with, sample_album,
    wait_for_terminal,
};
use crate::types::{Album, JobPhase, Track};

/// Collect entry names from a finished job's archive
fn entry_names(archive_path: &std::path::Path) -> Vec<String> {
    let file = std::fs::File::open(archive_path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

/// Extract one entry from the archive into a temp file and return its path
fn extract_entry(
    archive_path: &std::path::Path,
    entry: &str,
    dest_dir: &std::path::Path,
) -> std::path::PathBuf {
    let file = std::fs::File::open(archive_path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut zipped = archive.by_name(entry).unwrap();
    let mut bytes = Vec::new();
    zipped.read_to_end(&mut bytes).unwrap();
    let out = dest_dir.join("extracted.mp3");
    std::fs::write(&out, bytes).unwrap();
    out
}

fn track(number: u32, name: &str, source: Option<&str>) -> Track {
    Track {
        number,
        name: name.into(),
        artists: vec![],
        duration_secs: None,
        source_url: source.map(str::to_string),
    }
}

#[tokio::test]
async fn concrete_scenario_soft_skip_and_sanitized_names() {
    // Album {name:"Test", artist:"Artist", tracks:[{1, 'A"B', "u1"}, {2, "C", ""}]}
    // must complete with completed=2/total=2, archive root "Test - Artist",
    // one file `01 AB.mp3`, and nothing for the skipped track.
    let (downloader, _temp) = create_test_downloader();

    let id = downloader.submit_album(sample_album(), None).await.unwrap();
    let status = wait_for_terminal(&downloader, id, Duration::from_secs(5)).await;

    assert!(status.done);
    assert_eq!(status.phase, JobPhase::Succeeded);
    assert_eq!(status.completed, 2);
    assert_eq!(status.total, 2);
    assert_eq!(status.failed, 0, "a soft-skip is not a failure");
    assert_eq!(status.status, "Downloaded!");

    let artifact = downloader.take_artifact(id).await.unwrap();
    assert_eq!(artifact.filename, "Test - Artist.zip");

    let names = entry_names(&artifact.path);
    assert!(names.contains(&"Test - Artist/".to_string()));
    assert!(
        names.contains(&"Test - Artist/01 AB.mp3".to_string()),
        "quote must be stripped from the filename: {names:?}"
    );
    assert_eq!(
        names.len(),
        2,
        "exactly one file plus the root dir; the skipped track leaves no entry: {names:?}"
    );
}

#[tokio::test]
async fn scratch_directory_is_removed_after_success() {
    let (downloader, _temp) = create_test_downloader();

    let id = downloader.submit_album(sample_album(), None).await.unwrap();
    wait_for_terminal(&downloader, id, Duration::from_secs(5)).await;

    let scratch = downloader.config().temp_dir().join(format!("job-{id}"));
    assert!(
        !scratch.exists(),
        "scratch directory must be deleted once the archive exists"
    );
}

#[tokio::test]
async fn unreachable_cover_still_completes_without_embedded_art() {
    let temp_extract = tempfile::TempDir::new().unwrap();
    let (downloader, _temp) = create_test_downloader();

    let mut album = sample_album();
    // Connection refused on localhost port 1
    album.cover_url = Some("http://127.0.0.1:1/cover.jpg".into());

    let id = downloader.submit_album(album, None).await.unwrap();
    let status = wait_for_terminal(&downloader, id, Duration::from_secs(5)).await;
    assert!(status.done, "a missing cover must not fail the job");

    let artifact = downloader.take_artifact(id).await.unwrap();
    let extracted = extract_entry(
        &artifact.path,
        "Test - Artist/01 AB.mp3",
        temp_extract.path(),
    );
    let tag = id3::Tag::read_from_path(&extracted).unwrap();
    assert_eq!(
        tag.pictures().count(),
        0,
        "no image may be embedded when the cover fetch fails"
    );
}

#[tokio::test]
async fn reachable_cover_is_embedded_in_every_fetched_track() {
    let temp_extract = tempfile::TempDir::new().unwrap();

    // Serve a small PNG; the pipeline transcodes it to JPEG
    let server = MockServer::start().await;
    let img = image::RgbImage::from_pixel(64, 64, image::Rgb([1, 2, 3]));
    let mut png = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut png, image::ImageFormat::Png)
        .unwrap();
    Mock::given(method("GET"))
        .and(path("/cover.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png.into_inner()))
        .mount(&server)
        .await;

    let (downloader, _temp) = create_test_downloader();
    let mut album = sample_album();
    album.cover_url = Some(format!("{}/cover.png", server.uri()));

    let id = downloader.submit_album(album, None).await.unwrap();
    wait_for_terminal(&downloader, id, Duration::from_secs(5)).await;

    let artifact = downloader.take_artifact(id).await.unwrap();
    let extracted = extract_entry(
        &artifact.path,
        "Test - Artist/01 AB.mp3",
        temp_extract.path(),
    );
    let tag = id3::Tag::read_from_path(&extracted).unwrap();
    let pictures: Vec<_> = tag.pictures().collect();
    assert_eq!(pictures.len(), 1);
    assert_eq!(pictures[0].mime_type, "image/jpeg");
    assert_eq!(
        image::guess_format(&pictures[0].data).unwrap(),
        image::ImageFormat::Jpeg
    );
}

#[tokio::test]
async fn fetched_tracks_carry_album_tags_and_audio() {
    let temp_extract = tempfile::TempDir::new().unwrap();
    let (downloader, _temp) = create_test_downloader();

    let id = downloader.submit_album(sample_album(), None).await.unwrap();
    wait_for_terminal(&downloader, id, Duration::from_secs(5)).await;

    let artifact = downloader.take_artifact(id).await.unwrap();
    let extracted = extract_entry(
        &artifact.path,
        "Test - Artist/01 AB.mp3",
        temp_extract.path(),
    );

    let tag = id3::Tag::read_from_path(&extracted).unwrap();
    assert_eq!(tag.title(), Some("A\"B"), "tags keep the unsanitized name");
    assert_eq!(tag.album(), Some("Test"));
    assert_eq!(tag.album_artist(), Some("Artist"));
    assert_eq!(tag.year(), Some(2020));
    assert_eq!(tag.track(), Some(1));

    let bytes = std::fs::read(&extracted).unwrap();
    assert!(
        bytes.windows(FAKE_AUDIO.len()).any(|w| w == FAKE_AUDIO),
        "the fetched audio payload must survive tagging and archiving"
    );
}

#[tokio::test]
async fn single_track_failure_is_soft_and_leaves_no_file() {
    let fetcher = Arc::new(MockFetcher::failing_on(&["bad"]));
    let (downloader, _temp) = create_test_downloader_with(fetcher);

    let album = Album {
        name: "Mixed".into(),
        artist: "Artist".into(),
        year: None,
        cover_url: None,
        tracks: vec![
            track(1, "Good One", Some("u1")),
            track(2, "Bad One", Some("bad")),
            track(3, "Good Two", Some("u3")),
        ],
    };

    let id = downloader.submit_album(album, None).await.unwrap();
    let status = wait_for_terminal(&downloader, id, Duration::from_secs(5)).await;

    assert!(status.done, "one failed track must not sink the album");
    assert_eq!(status.completed, 3);
    assert_eq!(status.failed, 1);

    let artifact = downloader.take_artifact(id).await.unwrap();
    let names = entry_names(&artifact.path);
    assert!(names.contains(&"Mixed - Artist/01 Good One.mp3".to_string()));
    assert!(names.contains(&"Mixed - Artist/03 Good Two.mp3".to_string()));
    assert!(
        !names.iter().any(|n| n.contains("Bad One")),
        "failed track must leave no file: {names:?}"
    );
}

#[tokio::test]
async fn all_tracks_failing_fails_the_job() {
    let fetcher = Arc::new(MockFetcher::failing_on(&["bad1", "bad2"]));
    let (downloader, _temp) = create_test_downloader_with(fetcher);

    let album = Album {
        name: "Doomed".into(),
        artist: "Artist".into(),
        year: None,
        cover_url: None,
        tracks: vec![
            track(1, "A", Some("bad1")),
            track(2, "B", Some("bad2")),
        ],
    };

    let id = downloader.submit_album(album, None).await.unwrap();
    let status = wait_for_terminal(&downloader, id, Duration::from_secs(5)).await;

    assert_eq!(status.phase, JobPhase::Failed);
    assert!(!status.done, "failed jobs keep done=false");
    assert_eq!(status.status, "Error occurred");
    assert!(status.error.is_some());
    assert_eq!(status.completed, 2, "counter still advanced past failures");
    assert_eq!(status.failed, 2);

    // Failure cleans up the scratch directory
    let scratch = downloader.config().temp_dir().join(format!("job-{id}"));
    assert!(!scratch.exists());
}

#[tokio::test]
async fn empty_track_list_yields_an_empty_archive() {
    let (downloader, _temp) = create_test_downloader();

    let album = Album {
        name: "Empty".into(),
        artist: "Artist".into(),
        year: None,
        cover_url: None,
        tracks: vec![],
    };

    let id = downloader.submit_album(album, None).await.unwrap();
    let status = wait_for_terminal(&downloader, id, Duration::from_secs(5)).await;

    assert!(status.done);
    assert_eq!(status.total, 0);
    assert_eq!(status.completed, 0);

    let artifact = downloader.take_artifact(id).await.unwrap();
    assert_eq!(
        entry_names(&artifact.path),
        vec!["Empty - Artist/".to_string()]
    );
}

#[tokio::test]
async fn placeholders_are_used_for_nameless_albums_and_tracks() {
    let (downloader, _temp) = create_test_downloader();

    let album = Album {
        name: String::new(),
        artist: String::new(),
        year: None,
        cover_url: None,
        tracks: vec![track(5, "", Some("u1"))],
    };

    let id = downloader.submit_album(album, None).await.unwrap();
    let status = wait_for_terminal(&downloader, id, Duration::from_secs(5)).await;
    assert!(status.done);

    let artifact = downloader.take_artifact(id).await.unwrap();
    assert_eq!(artifact.filename, "Unknown Album - Unknown Artist.zip");
    let names = entry_names(&artifact.path);
    assert!(
        names.contains(&"Unknown Album - Unknown Artist/05 Track 5.mp3".to_string()),
        "nameless track files use the ordinal placeholder: {names:?}"
    );
}

#[tokio::test]
async fn completed_is_monotonic_across_polls() {
    let fetcher = Arc::new(MockFetcher::with_delay(Duration::from_millis(30)));
    let (downloader, _temp) = create_test_downloader_with(fetcher);

    let album = Album {
        name: "Longer".into(),
        artist: "Artist".into(),
        year: None,
        cover_url: None,
        tracks: (1..=5)
            .map(|n| track(n, &format!("T{n}"), Some("u")))
            .collect(),
    };

    let id = downloader.submit_album(album, None).await.unwrap();

    let mut last = 0u32;
    loop {
        let status = downloader.job_status(id).await.unwrap();
        assert!(
            status.completed >= last,
            "completed went backwards: {last} -> {}",
            status.completed
        );
        assert!(status.completed <= status.total);
        last = status.completed;
        if status.phase != JobPhase::Running {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert_eq!(last, 5);
}
