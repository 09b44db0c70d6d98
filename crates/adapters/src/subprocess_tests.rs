use super::*;
use ltoarc_core::{LatestProgressSink, NullProgressSink};

#[tokio::test]
async fn captures_stdout_of_a_successful_command() {
    let sink = NullProgressSink;
    let (stdout, _stderr) = run_command("echo", &["hello", "world"], &sink, None, None)
        .await
        .unwrap();
    assert_eq!(stdout, "hello world");
}

#[tokio::test]
async fn non_zero_exit_without_abort_is_an_error() {
    let sink = NullProgressSink;
    let err = run_command("sh", &["-c", "exit 3"], &sink, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, SubprocessError::NonZeroExit { code: 3, .. }));
}

#[tokio::test]
async fn stdin_is_forwarded_to_the_child() {
    let sink = NullProgressSink;
    let (stdout, _stderr) = run_command("cat", &[], &sink, None, Some("piped in\n"))
        .await
        .unwrap();
    assert_eq!(stdout, "piped in");
}

#[tokio::test]
async fn progress_sink_sees_each_output_line() {
    let sink = LatestProgressSink::new();
    run_command("printf", &["line-one\\nline-two\\n"], &sink, None, None)
        .await
        .unwrap();
    assert_eq!(sink.latest().as_deref(), Some("line-two"));
}

#[tokio::test]
async fn abort_terminates_the_process_and_returns_without_erroring() {
    let sink = NullProgressSink;
    let abort = ltoarc_core::AbortSignal::new();
    let abort_clone = abort.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(150)).await;
        abort_clone.request();
    });
    let result = run_command("sleep", &["5"], &sink, Some(&abort), None).await;
    assert!(result.is_ok());
}
