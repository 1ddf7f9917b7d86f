#![cfg(unix)]

mod common;

use common::{fake_ffmpeg, write_script};
use mouthpiece_voice::{AudioTranscoder, FfmpegTranscoder, ToolInvoker, VoiceError};

#[tokio::test]
async fn test_transcode_writes_destination() {
    let temp_dir = tempfile::tempdir().unwrap();
    let ffmpeg = fake_ffmpeg(temp_dir.path());
    let source = temp_dir.path().join("message.mp3");
    let destination = temp_dir.path().join("message.wav");
    std::fs::write(&source, b"ID3 fake mp3").unwrap();

    let transcoder = FfmpegTranscoder::new(ffmpeg, ToolInvoker::default());
    transcoder.transcode(&source, &destination).await.unwrap();

    assert_eq!(std::fs::read(&destination).unwrap(), b"ID3 fake mp3");
}

#[tokio::test]
async fn test_transcode_twice_overwrites() {
    let temp_dir = tempfile::tempdir().unwrap();
    let ffmpeg = fake_ffmpeg(temp_dir.path());
    let source = temp_dir.path().join("message.mp3");
    let destination = temp_dir.path().join("message.wav");
    std::fs::write(&source, b"first").unwrap();

    let transcoder = FfmpegTranscoder::new(ffmpeg, ToolInvoker::default());
    transcoder.transcode(&source, &destination).await.unwrap();
    let first = std::fs::read(&destination).unwrap();

    transcoder.transcode(&source, &destination).await.unwrap();
    let second = std::fs::read(&destination).unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_missing_ffmpeg_fails_fast() {
    let temp_dir = tempfile::tempdir().unwrap();
    let source = temp_dir.path().join("message.mp3");
    let destination = temp_dir.path().join("message.wav");
    std::fs::write(&source, b"mp3").unwrap();

    let transcoder = FfmpegTranscoder::new(
        temp_dir.path().join("no-ffmpeg-here"),
        ToolInvoker::default(),
    );
    let result = transcoder.transcode(&source, &destination).await;

    match result {
        Err(VoiceError::ToolUnavailable(msg)) => {
            assert!(msg.contains("not installed"), "got: {}", msg)
        }
        other => panic!("Expected ToolUnavailable, got {:?}", other),
    }
    assert!(!destination.exists());
}

#[tokio::test]
async fn test_missing_source_is_io_error() {
    let temp_dir = tempfile::tempdir().unwrap();
    let ffmpeg = fake_ffmpeg(temp_dir.path());
    let transcoder = FfmpegTranscoder::new(ffmpeg, ToolInvoker::default());

    let result = transcoder
        .transcode(
            &temp_dir.path().join("absent.mp3"),
            &temp_dir.path().join("absent.wav"),
        )
        .await;
    assert!(matches!(result, Err(VoiceError::Io(_))), "got {:?}", result);
}

#[tokio::test]
async fn test_conversion_failure_is_tool_execution() {
    let temp_dir = tempfile::tempdir().unwrap();
    let ffmpeg = write_script(
        temp_dir.path(),
        "ffmpeg",
        "[ \"$1\" = \"-version\" ] && exit 0\necho 'Invalid data found when processing input' >&2\nexit 1",
    );
    let source = temp_dir.path().join("message.mp3");
    std::fs::write(&source, b"garbage").unwrap();

    let transcoder = FfmpegTranscoder::new(ffmpeg, ToolInvoker::default());
    let result = transcoder
        .transcode(&source, &temp_dir.path().join("message.wav"))
        .await;

    match result {
        Err(VoiceError::ToolExecution(e)) => {
            assert_eq!(e.exit_code, Some(1));
            assert!(e.stderr.contains("Invalid data"));
        }
        other => panic!("Expected ToolExecution, got {:?}", other),
    }
}
