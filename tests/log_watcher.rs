// tests/log_watcher.rs

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use tokio::time::{sleep, timeout};
use worldbup::watch::{FileFollower, LogWatcher, WatchOutcome};
use worldbup_test_utils::{init_tracing, with_timeout, FakeServer};

const POLL: Duration = Duration::from_millis(20);

fn append(path: &Path, text: &str) {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file.flush().unwrap();
}

fn follower(path: &Path) -> FileFollower {
    FileFollower::new(path).with_poll_interval(POLL)
}

#[tokio::test]
async fn lines_present_before_the_watch_are_ignored() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("latest.log");
    append(&log, "[12:00:00] Saved the world\n");

    let mut watch = LogWatcher::start(&follower(&log), "Saved the world")
        .await
        .unwrap();

    // Nothing new was written, so the old line must not count.
    let early = timeout(Duration::from_millis(300), watch.wait()).await;
    assert!(early.is_err(), "historical line matched: {early:?}");

    watch.cancel().await;
}

#[tokio::test]
async fn appended_line_containing_the_pattern_matches() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("latest.log");
    append(&log, "[12:00:00] Done (3.2s)!\n");

    let mut watch = LogWatcher::start(&follower(&log), "Turned off world auto-saving")
        .await
        .unwrap();

    append(&log, "[12:00:01] Unrelated chatter\n");
    append(
        &log,
        "[12:00:02] [Server thread/INFO]: Turned off world auto-saving\n",
    );

    match with_timeout(watch.wait()).await {
        WatchOutcome::Matched(line) => {
            assert!(line.ends_with("Turned off world auto-saving"));
            assert!(!line.ends_with('\n'));
        }
        other => panic!("expected a match, got {other:?}"),
    }
    watch.cancel().await;
}

#[tokio::test]
async fn partial_line_is_held_until_its_newline_arrives() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("latest.log");
    append(&log, "");

    let mut watch = LogWatcher::start(&follower(&log), "Saved the world")
        .await
        .unwrap();

    append(&log, "[12:00:00] Saved the wo");
    sleep(Duration::from_millis(100)).await;
    assert!(!watch.is_finished());

    append(&log, "rld\n");
    assert!(matches!(
        with_timeout(watch.wait()).await,
        WatchOutcome::Matched(_)
    ));
    watch.cancel().await;
}

#[tokio::test]
async fn log_created_after_the_watch_is_read_from_the_start() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("latest.log");

    let mut watch = LogWatcher::start(&follower(&log), "players online")
        .await
        .unwrap();

    append(&log, "There are 0 of a max of 20 players online:\n");

    assert!(matches!(
        with_timeout(watch.wait()).await,
        WatchOutcome::Matched(_)
    ));
    watch.cancel().await;
}

#[tokio::test]
async fn rotated_log_is_reopened() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("latest.log");
    append(&log, "old session line one\nold session line two\n");

    let mut watch = LogWatcher::start(&follower(&log), "Saved the world")
        .await
        .unwrap();

    fs::rename(&log, dir.path().join("2024-03-01-1.log")).unwrap();
    sleep(Duration::from_millis(60)).await;
    append(&log, "Saved the world\n");

    assert!(matches!(
        with_timeout(watch.wait()).await,
        WatchOutcome::Matched(_)
    ));
    watch.cancel().await;
}

#[tokio::test]
async fn truncated_log_is_read_from_the_start() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("latest.log");
    append(&log, &"filler line\n".repeat(50));

    let mut watch = LogWatcher::start(&follower(&log), "Turned on world auto-saving")
        .await
        .unwrap();

    fs::write(&log, "Turned on world auto-saving\n").unwrap();

    assert!(matches!(
        with_timeout(watch.wait()).await,
        WatchOutcome::Matched(_)
    ));
    watch.cancel().await;
}

#[tokio::test]
async fn blank_pattern_is_refused() {
    let server = FakeServer::new();
    let err = LogWatcher::start(&server, "   ").await.unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    assert_eq!(server.follow_count(), 0);
}

#[tokio::test]
async fn follow_failure_is_returned_from_start() {
    let server = FakeServer::new();
    server.refuse_follow();

    let err = LogWatcher::start(&server, "Saved").await.unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
}

#[tokio::test]
async fn ended_stream_is_reported() {
    let server = FakeServer::new();
    let mut watch = LogWatcher::start(&server, "Saved").await.unwrap();

    server.emit("something else");
    server.close_log();

    assert!(matches!(
        with_timeout(watch.wait()).await,
        WatchOutcome::Ended
    ));
    watch.cancel().await;
}

#[tokio::test]
async fn read_error_is_reported() {
    let server = FakeServer::new();
    let mut watch = LogWatcher::start(&server, "Saved").await.unwrap();

    server.break_log();

    match with_timeout(watch.wait()).await {
        WatchOutcome::Failed(err) => assert_eq!(err.kind(), io::ErrorKind::BrokenPipe),
        other => panic!("expected a failure, got {other:?}"),
    }
    watch.cancel().await;
}

#[tokio::test]
async fn cancel_releases_the_log() {
    let server = FakeServer::new();
    let watch = LogWatcher::start(&server, "Saved").await.unwrap();
    assert_eq!(server.live_followers(), 1);

    with_timeout(watch.cancel()).await;
    assert_eq!(server.live_followers(), 0);
}

#[tokio::test]
async fn concurrent_watches_are_independent() {
    let server = FakeServer::new();
    let mut off = LogWatcher::start(&server, "auto-saving").await.unwrap();
    let mut saved = LogWatcher::start(&server, "Saved the world").await.unwrap();

    server.emit("Turned off world auto-saving");
    server.emit("Saved the world");

    match with_timeout(off.wait()).await {
        WatchOutcome::Matched(line) => assert_eq!(line, "Turned off world auto-saving"),
        other => panic!("unexpected {other:?}"),
    }
    match with_timeout(saved.wait()).await {
        WatchOutcome::Matched(line) => assert_eq!(line, "Saved the world"),
        other => panic!("unexpected {other:?}"),
    }
    off.cancel().await;
    saved.cancel().await;
}

#[tokio::test]
async fn burst_larger_than_one_read_is_delivered_in_order() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("latest.log");
    append(&log, "");

    let mut watch = LogWatcher::start(&follower(&log), "Saved the world")
        .await
        .unwrap();

    // Several read chunks worth of chatter, then the confirmation.
    let mut burst = String::new();
    for i in 0..20_000 {
        burst.push_str(&format!("[12:00:00] [Server thread/INFO]: chunk filler {i}\n"));
    }
    burst.push_str("[12:00:01] [Server thread/INFO]: Saved the world\n");
    append(&log, &burst);

    match with_timeout(watch.wait()).await {
        WatchOutcome::Matched(line) => {
            assert_eq!(line, "[12:00:01] [Server thread/INFO]: Saved the world")
        }
        other => panic!("expected a match, got {other:?}"),
    }
    watch.cancel().await;
}
