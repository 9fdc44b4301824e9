use predicates::prelude::*;
use test_support::{tempdir, MockServer};

use crate::mock_org::{acme, report_cmd, HEADER};

#[test]
fn enterprise_run_writes_both_files() {
  let server = MockServer::start(acme);
  let td = tempdir();
  let out_dir = td.path().join("reports");

  let output = report_cmd(&server, &out_dir)
    .args(["--enterprise", "acme-corp"])
    .output()
    .unwrap();
  assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

  let csv = std::fs::read_to_string(out_dir.join("organization_user_activity.csv")).unwrap();
  let expected = [
    HEADER,
    "hubot,hubot@corp.example,true,1,0,1,0",
    "mona,mona@github.example,true,3,0,0,1",
    "octo,octo@corp.example,true,0,1,0,0",
  ];
  assert_eq!(csv.lines().collect::<Vec<_>>(), expected);

  let pointer: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert!(pointer["report_json"].as_str().unwrap().ends_with("organization_user_activity.json"));
  assert!(pointer["report_csv"].as_str().unwrap().ends_with("organization_user_activity.csv"));

  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("email lookup failed"), "octo's 404 should be logged: {stderr}");
}

#[test]
fn snapshot_holds_per_repository_breakdown() {
  let server = MockServer::start(acme);
  let td = tempdir();

  report_cmd(&server, td.path()).assert().success();

  let raw = std::fs::read_to_string(td.path().join("organization_user_activity.json")).unwrap();
  let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
  let mona = v.as_array().unwrap().iter().find(|p| p["login"] == "mona").unwrap();

  assert_eq!(mona["commits"], 3);
  assert_eq!(mona["repositories"]["widgets"]["commits"], 2);
  assert_eq!(mona["repositories"]["gears"]["commits"], 1);
  assert_eq!(mona["repositories"]["gears"]["prComments"], 1);
  assert!(mona.get("email").is_none());
}

#[test]
fn every_page_is_followed() {
  let server = MockServer::start(acme);
  let td = tempdir();

  report_cmd(&server, td.path()).args(["--enterprise", "acme-corp"]).assert().success();

  let lines = server.request_lines();
  assert!(lines.iter().any(|l| l.starts_with("GET /orgs/acme/repos?") && l.ends_with("&page=2")));
  assert!(lines.iter().any(|l| l.starts_with("GET /repos/acme/widgets/commits?") && l.ends_with("&page=2")));
  assert!(lines
    .iter()
    .any(|l| l == "GET /repos/acme/gears/issues?state=all&since=2024-01-15T00:00:00Z&per_page=100"));

  let graphql: Vec<_> = server.requests().into_iter().filter(|r| r.method == "POST").collect();
  assert_eq!(graphql.len(), 2);
  let second: serde_json::Value = serde_json::from_str(&graphql[1].body).unwrap();
  assert_eq!(second["variables"]["after"], "Y3Vyc29yOjI=");
  assert_eq!(second["variables"]["first"], 100);
  assert_eq!(second["variables"]["enterprise"], "acme-corp");
}

#[test]
fn requests_carry_bearer_token() {
  let server = MockServer::start(acme);
  let td = tempdir();

  report_cmd(&server, td.path())
    .args(["--enterprise", "acme-corp", "--directory-token", "dir-token"])
    .assert()
    .success();

  for req in server.requests() {
    let expected = if req.method == "POST" { "Bearer dir-token" } else { "Bearer test-token" };
    assert_eq!(req.header("authorization"), Some(expected), "{} {}", req.method, req.path);
  }
}

#[test]
fn include_inactive_lists_quiet_members() {
  let server = MockServer::start(acme);
  let td = tempdir();

  report_cmd(&server, td.path())
    .arg("--include-inactive")
    .assert()
    .success();

  let csv = std::fs::read_to_string(td.path().join("organization_user_activity.csv")).unwrap();
  assert!(csv.lines().any(|l| l == "quiet,,false,0,0,0,0"), "csv was:\n{csv}");
  assert!(csv.lines().any(|l| l == "octo,,true,0,1,0,0"));
}

#[test]
fn trailing_days_use_calendar_subtraction() {
  let server = MockServer::start(acme);
  let td = tempdir();

  let mut cmd = test_support::cmd_bin(crate::mock_org::BIN);
  cmd
    .args(["--organization", "acme", "--activity-days", "30", "--now-override", "2024-03-01T08:00:00Z"])
    .args(["--token", "t", "--octokit-max-retries", "0"])
    .arg("--api-url")
    .arg(server.url())
    .arg("--output-dir")
    .arg(td.path())
    .assert()
    .success();

  assert!(server
    .request_lines()
    .iter()
    .any(|l| l.contains("/repos/acme/gears/commits?since=2024-01-31T00:00:00Z&")));
}

#[test]
fn run_outputs_are_appended() {
  let server = MockServer::start(acme);
  let td = tempdir();
  let outputs = td.path().join("github_output");

  report_cmd(&server, &td.path().join("out"))
    .env("GITHUB_OUTPUT", &outputs)
    .assert()
    .success()
    .stdout(predicate::str::contains("report_csv"));

  let text = std::fs::read_to_string(&outputs).unwrap();
  let keys: Vec<&str> = text.lines().filter_map(|l| l.split_once('=')).map(|(k, _)| k).collect();
  assert_eq!(keys, vec!["report_json", "report_csv"]);
}

#[test]
fn organization_without_repositories_writes_header_only() {
  let server = MockServer::start(|req| match req.route() {
    "/orgs/acme/repos" => test_support::MockResponse::json(200, "[]"),
    _ => test_support::MockResponse::json(404, "{}"),
  });
  let td = tempdir();

  report_cmd(&server, td.path()).assert().success();

  let csv = std::fs::read_to_string(td.path().join("organization_user_activity.csv")).unwrap();
  assert_eq!(csv, format!("{HEADER}\n"));
  let raw = std::fs::read_to_string(td.path().join("organization_user_activity.json")).unwrap();
  assert_eq!(serde_json::from_str::<serde_json::Value>(&raw).unwrap(), serde_json::json!([]));
}
