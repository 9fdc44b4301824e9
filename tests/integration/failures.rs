use predicates::prelude::*;
use test_support::{cmd_bin, tempdir, MockResponse, MockServer};

use crate::mock_org::{acme, report_cmd, report_cmd_with_retries, BIN};

#[test]
fn missing_organization_fails_before_any_request() {
  let server = MockServer::start(acme);
  let td = tempdir();

  cmd_bin(BIN)
    .args(["--since", "2024-01-15", "--token", "t", "--octokit-max-retries", "1"])
    .arg("--api-url")
    .arg(server.url())
    .arg("--output-dir")
    .arg(td.path())
    .assert()
    .failure()
    .code(1)
    .stderr(predicate::str::contains("input required and not supplied: organization"));

  assert!(server.requests().is_empty());
}

#[test]
fn inputs_are_read_from_runner_environment() {
  let server = MockServer::start(acme);
  let td = tempdir();

  cmd_bin(BIN)
    .env("INPUT_ORGANIZATION", "acme")
    .env("INPUT_SINCE", "2024-01-15")
    .env("INPUT_ACTIVITY_DAYS", "")
    .env("INPUT_TOKEN", "env-token")
    .env("INPUT_OUTPUTDIR", td.path())
    .env("INPUT_OCTOKIT_MAX_RETRIES", "0")
    .env("GITHUB_API_URL", server.url())
    .assert()
    .success();

  let first = server.requests().into_iter().next().unwrap();
  assert_eq!(first.header("authorization"), Some("Bearer env-token"));
  assert!(td.path().join("organization_user_activity.csv").exists());
}

#[test]
fn empty_include_inactive_input_is_false() {
  let server = MockServer::start(acme);
  let td = tempdir();

  report_cmd(&server, td.path()).env("INPUT_INCLUDE_INACTIVE", "").assert().success();

  let csv = std::fs::read_to_string(td.path().join("organization_user_activity.csv")).unwrap();
  assert!(!csv.contains(",false,"), "{csv}");
  assert!(server.request_lines().iter().all(|line| !line.contains("/members")));
}

#[test]
fn unknown_zone_fails_before_any_request() {
  let server = MockServer::start(acme);
  let td = tempdir();

  report_cmd(&server, td.path())
    .args(["--tz", "America/New_Yrok"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("invalid value for tz"))
    .stderr(predicate::str::contains("America/New_Yrok"));

  assert!(server.requests().is_empty());
}

#[test]
fn unusable_window_fails_before_any_request() {
  let server = MockServer::start(acme);
  let td = tempdir();

  cmd_bin(BIN)
    .args(["--organization", "acme", "--activity-days", "thirty", "--token", "t", "--octokit-max-retries", "0"])
    .arg("--api-url")
    .arg(server.url())
    .arg("--output-dir")
    .arg(td.path())
    .assert()
    .failure()
    .stderr(predicate::str::contains("activity_days must be a non-negative whole number"));

  assert!(server.requests().is_empty());
  assert!(!td.path().join("organization_user_activity.json").exists());
}

#[test]
fn unwritable_output_fails_before_any_request() {
  let server = MockServer::start(acme);
  let td = tempdir();
  let blocker = td.path().join("taken");
  std::fs::write(&blocker, "not a directory").unwrap();

  report_cmd(&server, &blocker.join("reports"))
    .assert()
    .failure()
    .stderr(predicate::str::contains("could not be created"));

  assert!(server.requests().is_empty());
}

#[test]
fn repository_failure_fails_the_run() {
  let server = MockServer::start(|req| match req.route() {
    "/repos/acme/gears/pulls/comments" => MockResponse::json(500, r#"{"message":"boom"}"#),
    _ => acme(req),
  });
  let td = tempdir();

  report_cmd(&server, td.path())
    .assert()
    .failure()
    .stderr(predicate::str::contains("aggregating activity for organization acme"))
    .stderr(predicate::str::contains("HTTP 500"));

  assert!(!td.path().join("organization_user_activity.json").exists());
}

#[test]
fn server_errors_are_retried() {
  let attempts = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
  let seen = std::sync::Arc::clone(&attempts);
  let server = MockServer::start(move |req| {
    if req.route() == "/orgs/acme/repos" && seen.fetch_add(1, std::sync::atomic::Ordering::SeqCst) == 0 {
      return MockResponse::json(502, "{}");
    }
    acme(req)
  });
  let td = tempdir();

  report_cmd_with_retries(&server, td.path(), 2)
    .assert()
    .success()
    .stderr(predicate::str::contains("retrying request"));
}

#[test]
fn snapshot_survives_directory_failure() {
  let server = MockServer::start(|req| {
    if req.route() == "/graphql" {
      return MockResponse::json(200, r#"{"data":null,"errors":[{"message":"Resource not accessible by integration"}]}"#);
    }
    acme(req)
  });
  let td = tempdir();

  report_cmd(&server, td.path())
    .args(["--enterprise", "acme-corp"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Resource not accessible by integration"));

  let raw = std::fs::read_to_string(td.path().join("organization_user_activity.json")).unwrap();
  let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
  assert_eq!(v.as_array().unwrap().len(), 3);
  assert!(!td.path().join("organization_user_activity.csv").exists());
}

#[test]
fn failures_are_annotated_inside_actions() {
  let td = tempdir();

  cmd_bin(BIN)
    .env("GITHUB_ACTIONS", "true")
    .args(["--since", "2024-01-15", "--token", "t", "--organization", "acme"])
    .arg("--output-dir")
    .arg(td.path())
    .assert()
    .failure()
    .stdout(predicate::str::starts_with("::error::input required and not supplied: octokit_max_retries"));
}

#[test]
fn expired_deadline_stops_the_run() {
  let server = MockServer::start(|req| {
    std::thread::sleep(std::time::Duration::from_millis(1200));
    acme(req)
  });
  let td = tempdir();

  report_cmd(&server, td.path())
    .args(["--timeout-secs", "1"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("deadline exceeded"));
}
