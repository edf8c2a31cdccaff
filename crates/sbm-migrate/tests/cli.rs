//! Usage errors are raised before any request is sent

use std::io::Write as _;

use sbm_migrate::{cli, MigrateError};

// nothing listens here; any request would fail with a transport error
const SBM_URL: &str = "http://127.0.0.1:9/api/v1/";

async fn run(args: &[&str]) -> (anyhow::Result<()>, String) {
    let matches = cli::command()
        .try_get_matches_from(args)
        .expect("arguments parse");
    let mut out = Vec::new();
    let result = cli::run(&matches, &mut out).await;
    (result, String::from_utf8(out).expect("utf8 output"))
}

fn migrate_error(result: &anyhow::Result<()>) -> &MigrateError {
    result
        .as_ref()
        .unwrap_err()
        .downcast_ref::<MigrateError>()
        .expect("migrate error")
}

#[tokio::test]
async fn malformed_record_reports_line_number() {
    let data = "{\"identity\": \"a\", \"language\": \"eng_ZA\", \"current_messageset_id\": 1, \"current_sequence_number\": 1, \"expected_messageset_id\": 1, \"expected_sequence_number\": 1}\n\nnot json\n";
    let (result, out) = run(&[
        "sbm-migrate", "service-disruption", "--sbm-url", SBM_URL, "--sbm-token", "t",
        "--messageset-id", "55", "--data", data,
    ])
    .await;

    let err = migrate_error(&result);
    assert!(matches!(err, MigrateError::MalformedRecord { line: 3, .. }));
    assert!(err.is_usage());
    assert!(out.is_empty());
}

#[tokio::test]
async fn invalid_scenario_file_is_usage_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "kind = \"cumulative\"\ndestinations = [100]\n\n[[stages]]\nmessage_set = 3\nimportant = [8, 15]").unwrap();
    let path = file.path().to_str().unwrap().to_string();

    let (result, _) = run(&[
        "sbm-migrate", "pmtct", "--sbm-url", SBM_URL, "--sbm-token", "t",
        "--scenario", &path, "--data", "",
    ])
    .await;

    assert!(matches!(migrate_error(&result), MigrateError::Scenario(_)));
}

#[tokio::test]
async fn missing_batch_file_is_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.json");

    let (result, _) = run(&[
        "sbm-migrate", "service-disruption", "--sbm-url", SBM_URL, "--sbm-token", "t",
        "--messageset-id", "55", "--file", path.to_str().unwrap(),
    ])
    .await;

    assert!(matches!(migrate_error(&result), MigrateError::Read { .. }));
}

#[tokio::test]
async fn unreachable_service_fails_setup() {
    let (result, out) = run(&[
        "sbm-migrate", "service-disruption", "--sbm-url", SBM_URL, "--sbm-token", "t",
        "--messageset-id", "55", "--data", "",
    ])
    .await;

    let err = migrate_error(&result);
    assert!(matches!(err, MigrateError::Setup(_)));
    assert!(!err.is_usage());
    assert!(out.is_empty());
}

fn binary(args: &[&str]) -> std::process::Output {
    std::process::Command::new(env!("CARGO_BIN_EXE_sbm-migrate"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("run sbm-migrate")
}

#[test]
fn missing_input_aborts_on_stdout() {
    let output = binary(&[
        "service-disruption", "--sbm-url", SBM_URL, "--sbm-token", "t", "--messageset-id", "55",
    ]);

    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--file"), "{stdout}");
    assert!(output.stderr.is_empty());
}

#[test]
fn malformed_batch_aborts_on_stdout() {
    let output = binary(&[
        "service-disruption", "--sbm-url", SBM_URL, "--sbm-token", "t", "--messageset-id", "55",
        "--data", "not json",
    ]);

    assert_eq!(output.status.code(), Some(2));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("error: malformed record on line 1"), "{stdout}");
}
