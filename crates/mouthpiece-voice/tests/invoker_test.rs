#![cfg(unix)]

mod common;

use common::write_script;
use mouthpiece_voice::{ToolCommand, ToolError, ToolInvoker, VoiceError};
use std::time::{Duration, Instant};

#[tokio::test]
async fn test_run_returns_stdout() {
    let invoker = ToolInvoker::default();
    let stdout = invoker
        .run(&ToolCommand::new("sh").arg("-c").arg("echo hello"))
        .await
        .unwrap();
    assert_eq!(stdout.trim(), "hello");
}

#[tokio::test]
async fn test_failure_captures_both_streams() {
    let temp_dir = tempfile::tempdir().unwrap();
    let script = write_script(
        temp_dir.path(),
        "failing.sh",
        "echo partial output\necho something broke >&2\nexit 7",
    );

    let err = ToolInvoker::default()
        .run(&ToolCommand::new(&script).arg("--flag"))
        .await
        .unwrap_err();

    match err {
        ToolError::Execution(e) => {
            assert_eq!(e.exit_code, Some(7));
            assert_eq!(e.stdout.trim(), "partial output");
            assert_eq!(e.stderr.trim(), "something broke");
            assert!(e.command_line.ends_with("failing.sh --flag"), "got: {}", e.command_line);
        }
        other => panic!("Expected Execution error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_program_is_unavailable() {
    let err = ToolInvoker::default()
        .run(&ToolCommand::new("/nonexistent/mouthpiece-tool"))
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::Unavailable { .. }), "got {:?}", err);

    let voice_err: VoiceError = err.into();
    assert!(matches!(voice_err, VoiceError::ToolUnavailable(_)));
}

#[tokio::test]
async fn test_timeout_kills_long_running_tool() {
    let invoker = ToolInvoker::new(Duration::from_millis(200));
    let started = Instant::now();

    let err = invoker
        .run(&ToolCommand::new("sleep").arg("10"))
        .await
        .unwrap_err();

    assert!(matches!(err, ToolError::Timeout { .. }), "got {:?}", err);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_dropped_run_kills_tool() {
    let temp_dir = tempfile::tempdir().unwrap();
    let marker = temp_dir.path().join("marker");
    let command = ToolCommand::new("sh")
        .arg("-c")
        .arg(format!("sleep 1; touch '{}'", marker.display()));
    let invoker = ToolInvoker::default();

    let abandoned = tokio::time::timeout(Duration::from_millis(200), invoker.run(&command)).await;
    assert!(abandoned.is_err(), "run should still be in flight");

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(!marker.exists(), "tool kept running after its run was dropped");
}

#[tokio::test]
async fn test_probe() {
    let invoker = ToolInvoker::default();
    let temp_dir = tempfile::tempdir().unwrap();
    let tool = write_script(temp_dir.path(), "tool", "[ \"$1\" = \"--version\" ] || exit 1\necho 1.0");

    assert!(invoker.probe(&tool, "--version").await.is_ok());
    assert!(invoker.probe(&tool, "-v").await.is_err());
}
