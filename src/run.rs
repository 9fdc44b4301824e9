// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Orchestrate one report run: window, output dir, aggregation, snapshot, email enrichment, CSV, run outputs
// role: processing/orchestrator
// inputs: EffectiveConfig
// outputs: Report files on disk; GITHUB_OUTPUT entries; stdout pointer {report_json, report_csv}
// side_effects: Creates directories; writes files; network calls through the GithubApi backend
// invariants:
// - window and output directory are validated before the first API call
// - the JSON snapshot is on disk before email enrichment starts
// - report_json is exported as soon as the snapshot exists, report_csv only after the CSV is written
// errors: Propagates every stage failure with context; per-user email failures never reach here
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use crate::activity::ActivityAggregator;
use crate::cli::EffectiveConfig;
use crate::email::{Directory, EmailResolver};
use crate::error::ConfigError;
use crate::github::api::{ClientConfig, GithubApi};
use crate::github::http::GithubHttpApi;
use crate::outputs;
use crate::report::{self, ReportPaths};
use crate::window::{self, ActivityWindow};

pub fn resolve_window(cfg: &EffectiveConfig) -> Result<ActivityWindow> {
  let now = match cfg.now_override.as_deref() {
    Some(raw) => window::parse_now_override(Some(raw)).ok_or_else(|| ConfigError::Invalid {
      name: "now-override",
      reason: format!("expected an RFC3339 instant, got {:?}", raw),
    })?,
    None => Utc::now(),
  };

  let today = window::today_in_tz(cfg.tz, now);
  let window = window::resolve(cfg.since.as_deref(), cfg.activity_days.as_deref(), today)?;
  Ok(window)
}

pub fn client_config(cfg: &EffectiveConfig, started: Instant) -> ClientConfig {
  ClientConfig {
    api_url: cfg.api_url.clone(),
    graphql_url: cfg.graphql_url.clone(),
    token: cfg.token.clone(),
    directory_token: cfg.directory_token.clone(),
    max_retries: cfg.max_retries,
    retry_backoff: cfg.retry_backoff,
    request_timeout: cfg.request_timeout,
    deadline: cfg.run_timeout.map(|t| started + t),
  }
}

pub fn run(cfg: &EffectiveConfig) -> Result<ReportPaths> {
  let started = Instant::now();

  let window = resolve_window(cfg)?;
  let paths = report::ensure_output_dir(&cfg.output_dir)?;
  info!(
    org = %cfg.organization,
    since = %window.start(),
    output_dir = %cfg.output_dir.display(),
    "starting activity report"
  );

  let api = GithubHttpApi::new(client_config(cfg, started));
  generate(cfg, &api, &window, &paths)?;

  println!("{}", outputs::pointer(&paths));
  Ok(paths)
}

/// Aggregate, snapshot, enrich and write the CSV against `api`.
pub fn generate(cfg: &EffectiveConfig, api: &dyn GithubApi, window: &ActivityWindow, paths: &ReportPaths) -> Result<()> {
  let records = ActivityAggregator::new(api, cfg.include_inactive)
    .aggregate(&cfg.organization, window)
    .with_context(|| format!("aggregating activity for organization {}", cfg.organization))?;

  report::write_json_snapshot(&paths.report_json, &records)?;
  outputs::set_path_output("report_json", &paths.report_json)?;
  info!(path = %paths.report_json.display(), records = records.len(), "raw snapshot written");

  let directory = match cfg.enterprise.as_deref() {
    Some(enterprise) => Directory::fetch(api, enterprise)
      .with_context(|| format!("loading SAML directory for enterprise {}", enterprise))?,
    None => {
      info!("no enterprise configured; using profile emails only");
      Directory::empty()
    }
  };
  if !directory.is_empty() {
    info!(entries = directory.len(), "directory emails available");
  }

  let records = EmailResolver::new(api, directory, cfg.concurrency).resolve_emails(records);

  report::write_csv_report(&paths.report_csv, &records)?;
  outputs::set_path_output("report_csv", &paths.report_csv)?;
  info!(path = %paths.report_csv.display(), rows = records.len(), "csv report written");

  Ok(())
}
