// tests/process_runner.rs

#![cfg(unix)]

use worldbup::exec::{ProcessRunner, ProcessSpec, TokioProcessRunner};

#[tokio::test]
async fn exit_code_and_output_are_captured() {
    let spec = ProcessSpec::new("sh").args(["-c", "echo hi; echo oops >&2; exit 3"]);

    let output = TokioProcessRunner::new().run(&spec).await.unwrap();

    assert_eq!(output.code, Some(3));
    assert!(!output.success());
    assert_eq!(output.stdout.trim(), "hi");
    assert_eq!(output.stderr.trim(), "oops");
    assert_eq!(output.failure_reason(), "exit code 3: oops");
}

#[tokio::test]
async fn successful_process_reports_success() {
    let spec = ProcessSpec::new("true");
    let output = TokioProcessRunner::new().run(&spec).await.unwrap();
    assert!(output.success());
}

#[tokio::test]
async fn arguments_are_not_shell_interpreted() {
    let spec = ProcessSpec::new("echo").arg("$HOME; exit 1");
    let output = TokioProcessRunner::new().run(&spec).await.unwrap();
    assert_eq!(output.stdout.trim(), "$HOME; exit 1");
}

#[tokio::test]
async fn unknown_program_is_an_error() {
    let spec = ProcessSpec::new("worldbup-definitely-not-installed");
    let err = TokioProcessRunner::new().run(&spec).await.unwrap_err();
    assert!(format!("{err:#}").contains("worldbup-definitely-not-installed"));
}
