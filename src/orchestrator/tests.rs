use std::{path::PathBuf, time::Duration};
use tokio::time::Instant;

use super::*;
use crate::{
    orchestrator::service::MockInferenceService,
    staging::{StagedVideo, VideoFormat},
};

const INTERVAL: Duration = Duration::from_secs(2);

fn policy() -> PollPolicy {
    PollPolicy::new(INTERVAL, Duration::from_secs(60))
}

fn handle(name: &str, state: AssetState) -> RemoteHandle {
    RemoteHandle {
        name: name.to_string(),
        uri: Some(format!("https://example.com/v1beta/{name}").parse().unwrap()),
        mime_type: Some("video/mp4".parse().unwrap()),
        state,
        failure: None,
    }
}

fn staged_sample() -> (StagedVideo, PathBuf) {
    let staged = StagedVideo::from_bytes(b"\x00\x00\x00\x18ftypmp42", VideoFormat::Mp4).unwrap();
    let path = staged.path().to_path_buf();
    (staged, path)
}

/// A service whose `get` reports the given states in order.
fn polling_service(states: Vec<AssetState>) -> MockInferenceService {
    let mut service = MockInferenceService::new();
    let mut states = states.into_iter();
    let expected = states.len();
    service
        .expect_get()
        .times(expected)
        .returning(move |name| Ok(handle(name, states.next().unwrap())));
    service
}

#[tokio::test(start_paused = true)]
async fn await_ready_sleeps_once_per_pending_observation() {
    // The initial handle is the first PENDING, `get` reports the second.
    let service = polling_service(vec![AssetState::Pending, AssetState::Ready]);
    let orchestrator = Orchestrator::new(service, policy());

    let start = Instant::now();
    let ready = orchestrator
        .await_ready(handle("files/h1", AssetState::Pending))
        .await
        .unwrap();

    assert_eq!(ready.name(), "files/h1");
    assert_eq!(ready.handle().state, AssetState::Ready);
    assert_eq!(start.elapsed(), INTERVAL * 2);
}

#[tokio::test(start_paused = true)]
async fn await_ready_returns_immediately_when_ready() {
    let mut service = MockInferenceService::new();
    service.expect_get().never();
    let orchestrator = Orchestrator::new(service, policy());

    let start = Instant::now();
    orchestrator
        .await_ready(handle("files/h1", AssetState::Ready))
        .await
        .unwrap();
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn await_ready_reports_remote_failure() {
    let mut service = MockInferenceService::new();
    service.expect_get().times(1).returning(|name| {
        Ok(RemoteHandle {
            failure: Some("unsupported codec".to_string()),
            ..handle(name, AssetState::Failed)
        })
    });
    let orchestrator = Orchestrator::new(service, policy());

    let err = orchestrator
        .await_ready(handle("files/h1", AssetState::Pending))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Processing);
    assert_eq!(
        err.to_string(),
        "remote processing of 'files/h1' failed: unsupported codec"
    );
}

#[tokio::test(start_paused = true)]
async fn await_ready_gives_up_after_timeout() {
    let mut service = MockInferenceService::new();
    service
        .expect_get()
        .times(3)
        .returning(|name| Ok(handle(name, AssetState::Pending)));
    let orchestrator = Orchestrator::new(
        service,
        PollPolicy::new(INTERVAL, Duration::from_secs(5)),
    );

    let err = orchestrator
        .await_ready(handle("files/h1", AssetState::Pending))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Timeout);
    match err {
        Error::Timeout { name, waited } => {
            assert_eq!(name, "files/h1");
            assert_eq!(waited, Duration::from_secs(5));
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn await_ready_never_waits_past_timeout_when_interval_is_longer() {
    let mut service = MockInferenceService::new();
    service
        .expect_get()
        .times(1)
        .returning(|name| Ok(handle(name, AssetState::Pending)));
    let timeout = Duration::from_secs(1);
    let orchestrator = Orchestrator::new(
        service,
        PollPolicy::new(Duration::from_secs(10), timeout),
    );

    let start = Instant::now();
    let err = orchestrator
        .await_ready(handle("files/h1", AssetState::Pending))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert_eq!(start.elapsed(), timeout);
}

#[tokio::test(start_paused = true)]
async fn await_ready_accepts_ready_state_seen_at_deadline() {
    let service = polling_service(vec![AssetState::Ready]);
    let orchestrator = Orchestrator::new(
        service,
        PollPolicy::new(Duration::from_secs(10), Duration::from_secs(3)),
    );

    let start = Instant::now();
    orchestrator
        .await_ready(handle("files/h1", AssetState::Pending))
        .await
        .unwrap();
    assert_eq!(start.elapsed(), Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn await_ready_surfaces_status_check_errors() {
    let mut service = MockInferenceService::new();
    service
        .expect_get()
        .times(1)
        .returning(|_| Err("connection reset".into()));
    let orchestrator = Orchestrator::new(service, policy());

    let err = orchestrator
        .await_ready(handle("files/h1", AssetState::Pending))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::StatusCheck { .. }));
    assert_eq!(err.kind(), ErrorKind::Processing);
}

#[tokio::test]
async fn ask_rejects_blank_question_without_remote_call() {
    let mut service = MockInferenceService::new();
    service.expect_generate().never();
    let orchestrator = Orchestrator::new(service, policy());
    let ready = ReadyAsset::try_from(handle("files/h1", AssetState::Ready)).unwrap();

    for question in ["", "  \t\n"] {
        let err = orchestrator.ask(&ready, question).await.unwrap_err();
        assert!(matches!(err, Error::EmptyQuestion));
        assert_eq!(err.kind(), ErrorKind::Precondition);
    }
}

#[tokio::test]
async fn ask_sends_combined_prompt_for_the_asset() {
    let mut service = MockInferenceService::new();
    service
        .expect_generate()
        .times(1)
        .withf(|prompt, asset| {
            asset.name == "files/h1"
                && prompt.contains("analyze this video")
                && prompt.contains("What product is shown?")
        })
        .returning(|_, _| Ok("A blender.".to_string()));
    let orchestrator = Orchestrator::new(service, policy());
    let ready = ReadyAsset::try_from(handle("files/h1", AssetState::Ready)).unwrap();

    let answer = orchestrator
        .ask(&ready, "What product is shown?")
        .await
        .unwrap();
    assert_eq!(answer.as_str(), "A blender.");
}

#[tokio::test]
async fn ask_wraps_service_failures() {
    let mut service = MockInferenceService::new();
    service
        .expect_generate()
        .returning(|_, _| Err("quota exceeded".into()));
    let orchestrator = Orchestrator::new(service, policy());
    let ready = ReadyAsset::try_from(handle("files/h1", AssetState::Ready)).unwrap();

    let err = orchestrator.ask(&ready, "Who?").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Inference);
    assert_eq!(err.to_string(), "inference request for 'files/h1' failed");
}

#[tokio::test]
async fn register_asset_uploads_bytes_with_video_mime_type() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sample.mov");
    std::fs::write(&path, b"moov").unwrap();

    let mut service = MockInferenceService::new();
    service
        .expect_upload()
        .times(1)
        .withf(|video| {
            video.display_name == "sample.mov"
                && video.mime_type.essence_str() == "video/quicktime"
                && video.bytes == b"moov"
        })
        .returning(|_| Ok(handle("files/h1", AssetState::Pending)));
    let orchestrator = Orchestrator::new(service, policy());

    let registered = orchestrator.register_asset(&path).await.unwrap();
    assert_eq!(registered.state, AssetState::Pending);
}

#[tokio::test]
async fn register_asset_checks_preconditions_before_upload() {
    let dir = tempfile::tempdir().unwrap();
    let unsupported = dir.path().join("clip.mkv");
    std::fs::write(&unsupported, b"data").unwrap();

    let mut service = MockInferenceService::new();
    service.expect_upload().never();
    let orchestrator = Orchestrator::new(service, policy());

    let err = orchestrator
        .register_asset(&dir.path().join("missing.mp4"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingVideo { .. }));
    assert_eq!(err.kind(), ErrorKind::Precondition);

    let err = orchestrator.register_asset(&unsupported).await.unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat { .. }));
    assert_eq!(err.kind(), ErrorKind::Precondition);
}

#[tokio::test]
async fn stage_video_copies_source_under_its_name() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("sample.mp4");
    std::fs::write(&source, b"frames").unwrap();

    let staged = stage_video(&source).await.unwrap();
    assert_ne!(staged.path(), source.as_path());
    assert_eq!(staged.display_name(), "sample.mp4");
    assert_eq!(staged.format(), VideoFormat::Mp4);
    assert_eq!(std::fs::read(staged.path()).unwrap(), b"frames");

    staged.close();
    assert!(source.exists());
}

#[tokio::test]
async fn stage_video_reports_bad_input_as_precondition() {
    let dir = tempfile::tempdir().unwrap();
    let unsupported = dir.path().join("clip.mkv");
    std::fs::write(&unsupported, b"data").unwrap();

    let err = stage_video(&dir.path().join("missing.mp4")).await.unwrap_err();
    assert!(matches!(err, Error::MissingVideo { .. }));
    assert_eq!(err.kind(), ErrorKind::Precondition);

    let err = stage_video(&unsupported).await.unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat { .. }));
    assert_eq!(err.kind(), ErrorKind::Precondition);
}

#[tokio::test(start_paused = true)]
async fn analyze_answers_and_removes_staged_file() {
    let (staged, path) = staged_sample();

    let mut service = MockInferenceService::new();
    service
        .expect_upload()
        .times(1)
        .returning(|_| Ok(handle("h1", AssetState::Pending)));
    service
        .expect_get()
        .times(1)
        .returning(|name| Ok(handle(name, AssetState::Ready)));
    service
        .expect_generate()
        .times(1)
        .withf(|_, asset| asset.name == "h1" && asset.state == AssetState::Ready)
        .returning(|_, _| Ok("A blender.".to_string()));
    let orchestrator = Orchestrator::new(service, policy());

    let answer = orchestrator
        .analyze(staged, "What product is shown?")
        .await
        .unwrap();

    assert_eq!(answer.into_inner(), "A blender.");
    assert!(!path.exists());
}

#[tokio::test]
async fn analyze_removes_staged_file_when_upload_fails() {
    let (staged, path) = staged_sample();

    let mut service = MockInferenceService::new();
    service
        .expect_upload()
        .returning(|_| Err("file too large".into()));
    service.expect_get().never();
    service.expect_generate().never();
    let orchestrator = Orchestrator::new(service, policy());

    let err = orchestrator.analyze(staged, "What?").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Upload);
    assert!(!path.exists());
}

#[tokio::test(start_paused = true)]
async fn analyze_stops_after_processing_failure() {
    let (staged, path) = staged_sample();

    let mut service = MockInferenceService::new();
    service
        .expect_upload()
        .returning(|_| Ok(handle("h1", AssetState::Pending)));
    service
        .expect_get()
        .times(1)
        .returning(|name| Ok(handle(name, AssetState::Failed)));
    service.expect_generate().never();
    let orchestrator = Orchestrator::new(service, policy());

    let err = orchestrator.analyze(staged, "What?").await.unwrap_err();
    assert!(matches!(err, Error::Processing { .. }));
    assert!(!path.exists());
}

#[tokio::test]
async fn analyze_removes_staged_file_when_inference_fails() {
    let (staged, path) = staged_sample();

    let mut service = MockInferenceService::new();
    service
        .expect_upload()
        .returning(|_| Ok(handle("h1", AssetState::Ready)));
    service.expect_get().never();
    service
        .expect_generate()
        .times(1)
        .returning(|_, _| Err("503 service unavailable".into()));
    let orchestrator = Orchestrator::new(service, policy());

    let err = orchestrator.analyze(staged, "What?").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Inference);
    assert!(!path.exists());
}

#[tokio::test]
async fn analyze_rejects_blank_question_before_upload() {
    let (staged, path) = staged_sample();

    let mut service = MockInferenceService::new();
    service.expect_upload().never();
    service.expect_get().never();
    service.expect_generate().never();
    let orchestrator = Orchestrator::new(service, policy());

    let err = orchestrator.analyze(staged, "   ").await.unwrap_err();
    assert!(matches!(err, Error::EmptyQuestion));
    assert!(!path.exists());
}
