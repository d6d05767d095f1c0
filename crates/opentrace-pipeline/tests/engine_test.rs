//! End-to-end pipeline runs against real module executables.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::Duration;

use opentrace_pipeline::{
    CancellationToken, EngineConfig, ErrorKind, ExecutionStatus, ModuleInput, Pipeline,
    PipelineEngine,
};
use tempfile::TempDir;

/// Write an executable shell module that saves its stdin to `<name>.stdin`.
fn create_module(dir: &Path, name: &str, body: &str) {
    let path = dir.join(name);
    let script = format!("#!/bin/sh\ncat > \"$0.stdin\"\n{body}\n");
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
}

fn received(dir: &Path, name: &str) -> ModuleInput {
    let raw = fs::read_to_string(dir.join(format!("{name}.stdin"))).unwrap();
    serde_json::from_str(&raw).unwrap()
}

const IP_THEN_ASN: &str = r#"
modules:
  - name: ip_locator
    input: "8.8.8.8"
    config:
      precision: city
  - name: asn_lookup
    input: "$ip_locator"
"#;

#[tokio::test]
async fn test_chained_modules_receive_previous_result() {
    let bin = TempDir::new().unwrap();
    create_module(
        bin.path(),
        "ip_locator",
        r#"printf '%s\n' '{"result":"{\"city\":\"Mountain View\"}"}'"#,
    );
    create_module(
        bin.path(),
        "asn_lookup",
        r#"echo "lookup running" >&2
printf '%s\n' '{"result":"AS15169","meta":{"source":"test"}}'"#,
    );

    let pipeline = Pipeline::from_yaml(IP_THEN_ASN).unwrap();
    let engine = PipelineEngine::new(EngineConfig::new(bin.path()));
    let result = engine.execute(&pipeline, &CancellationToken::new()).await;

    assert_eq!(result.status, ExecutionStatus::Completed, "{:?}", result.error);
    let outputs = result.outputs;
    assert_eq!(outputs.get("ip_locator"), Some(r#"{"city":"Mountain View"}"#));
    assert_eq!(outputs.get("asn_lookup"), Some("AS15169"));

    let first = received(bin.path(), "ip_locator");
    assert_eq!(first.input, "8.8.8.8");
    assert_eq!(first.config["precision"], "city");

    let second = received(bin.path(), "asn_lookup");
    assert_eq!(second.input, r#"{"city":"Mountain View"}"#);
    assert!(second.config.is_empty());
}

#[tokio::test]
async fn test_failing_module_stops_pipeline() {
    let bin = TempDir::new().unwrap();
    create_module(bin.path(), "ip_locator", "echo 'lookup failed' >&2; exit 2");
    create_module(bin.path(), "asn_lookup", r#"printf '{"result":"x"}'"#);

    let pipeline = Pipeline::from_yaml(IP_THEN_ASN).unwrap();
    let engine = PipelineEngine::new(EngineConfig::new(bin.path()));
    let result = engine.execute(&pipeline, &CancellationToken::new()).await;

    assert_eq!(result.status, ExecutionStatus::Failed);
    assert_eq!(result.failed_step(), Some("ip_locator"));
    assert!(result.outputs.is_empty());
    assert!(!bin.path().join("asn_lookup.stdin").exists());

    let err = result.error.unwrap();
    assert_eq!(err.kind(), ErrorKind::Process);
    assert!(err.to_string().contains("exit status 2"));
}

#[tokio::test]
async fn test_missing_module_executable() {
    let bin = TempDir::new().unwrap();
    let pipeline = Pipeline::from_yaml("modules:\n  - name: ghost\n    input: x\n").unwrap();
    let engine = PipelineEngine::new(EngineConfig::new(bin.path()));

    let err = engine
        .execute(&pipeline, &CancellationToken::new())
        .await
        .into_result()
        .unwrap_err();

    assert_eq!(err.step(), Some("ghost"));
    assert!(err.to_string().contains("not found"));
}

#[tokio::test]
async fn test_malformed_output_keeps_raw_capture() {
    let bin = TempDir::new().unwrap();
    create_module(bin.path(), "chatty", "echo 'starting up'; echo '{\"result\":\"ok\"}'");
    let pipeline = Pipeline::from_yaml("modules:\n  - name: chatty\n").unwrap();
    let engine = PipelineEngine::new(EngineConfig::new(bin.path()));

    let err = engine
        .execute(&pipeline, &CancellationToken::new())
        .await
        .into_result()
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Protocol);
    assert!(err.to_string().contains("starting up"));
}

#[tokio::test]
async fn test_timeout_applies_per_module() {
    let bin = TempDir::new().unwrap();
    create_module(bin.path(), "slow", "exec sleep 30");
    let pipeline = Pipeline::from_yaml("modules:\n  - name: slow\n    input: x\n").unwrap();
    let config = EngineConfig::new(bin.path()).with_timeout(Some(Duration::from_millis(200)));
    let engine = PipelineEngine::new(config);

    let started = std::time::Instant::now();
    let result = engine.execute(&pipeline, &CancellationToken::new()).await;

    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(result.failed_step(), Some("slow"));
    assert!(result.error.unwrap().to_string().contains("timed out"));
}

#[tokio::test]
async fn test_cancel_interrupts_running_module() {
    let bin = TempDir::new().unwrap();
    create_module(bin.path(), "slow", "exec sleep 30");
    let pipeline = Pipeline::from_yaml("modules:\n  - name: slow\n").unwrap();
    let engine = PipelineEngine::new(EngineConfig::new(bin.path()));

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        canceller.cancel();
    });

    let started = std::time::Instant::now();
    let result = engine.execute(&pipeline, &token).await;

    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(result.status, ExecutionStatus::Failed);
    assert!(result.error.unwrap().to_string().contains("cancelled"));
}

#[tokio::test]
async fn test_escaped_env_token_reaches_module_config() {
    let bin = TempDir::new().unwrap();
    create_module(bin.path(), "scanner", r#"printf '{"result":"done"}'"#);
    let yaml = r#"
modules:
  - name: scanner
    input: host
    config:
      escaped: "$${KEEP}"
"#;
    let pipeline = Pipeline::from_yaml(yaml).unwrap();
    let engine = PipelineEngine::new(EngineConfig::new(bin.path()));

    engine
        .execute(&pipeline, &CancellationToken::new())
        .await
        .into_result()
        .unwrap();

    let got = received(bin.path(), "scanner");
    assert_eq!(got.config["escaped"], "${KEEP}");
}
