use std::path::PathBuf;
use std::time::Duration;

use clap::builder::FalseyValueParser;
use clap::Parser;

use crate::error::ConfigError;
use crate::github::token::discover_token;
use crate::util;
use crate::window::Tz;

#[derive(Parser, Debug)]
#[command(
    name = "org-activity-report",
    version,
    about = "Report per-user GitHub organization activity with resolved emails (JSON + CSV)",
    long_about = None
)]
pub struct Cli {
  /// Organization slug to scan
  #[arg(long, env = "INPUT_ORGANIZATION")]
  pub organization: Option<String>,

  /// Literal start date (YYYY-MM-DD); overrides --activity-days
  #[arg(long, env = "INPUT_SINCE")]
  pub since: Option<String>,

  /// Trailing window size in days, counted back from today in --tz
  #[arg(long = "activity-days", env = "INPUT_ACTIVITY_DAYS")]
  pub activity_days: Option<String>,

  /// Bearer token for REST and GraphQL calls (default: GITHUB_TOKEN, GH_TOKEN, then `gh auth token`)
  #[arg(long, env = "INPUT_TOKEN", hide_env_values = true)]
  pub token: Option<String>,

  /// Directory receiving organization_user_activity.{json,csv}; created if absent
  #[arg(long = "output-dir", env = "INPUT_OUTPUTDIR")]
  pub output_dir: Option<PathBuf>,

  /// Retries per request for transport failures, rate limits and 5xx answers
  #[arg(long = "octokit-max-retries", env = "INPUT_OCTOKIT_MAX_RETRIES")]
  pub octokit_max_retries: Option<String>,

  /// Enterprise slug whose SAML identities back the directory email lookup
  #[arg(long, env = "INPUT_ENTERPRISE")]
  pub enterprise: Option<String>,

  /// Token for the directory query (default: --token)
  #[arg(long = "directory-token", env = "INPUT_ORG_TOKEN", hide_env_values = true)]
  pub directory_token: Option<String>,

  /// Also report organization members without activity (isActive=false)
  #[arg(long = "include-inactive", env = "INPUT_INCLUDE_INACTIVE", value_parser = FalseyValueParser::new())]
  pub include_inactive: bool,

  /// REST API root
  #[arg(long = "api-url", env = "GITHUB_API_URL", default_value = "https://api.github.com")]
  pub api_url: String,

  /// GraphQL endpoint
  #[arg(long = "graphql-url", env = "GITHUB_GRAPHQL_URL", default_value = "https://api.github.com/graphql")]
  pub graphql_url: String,

  /// Overall run deadline in seconds (0 = none)
  #[arg(long = "timeout-secs", default_value_t = 3600)]
  pub timeout_secs: u64,

  /// Per-request timeout in seconds
  #[arg(long = "request-timeout-secs", default_value_t = 30)]
  pub request_timeout_secs: u64,

  /// Base delay before the first retry; doubles per attempt
  #[arg(long = "retry-backoff-ms", default_value_t = 1000)]
  pub retry_backoff_ms: u64,

  /// Parallel profile lookups during email resolution
  #[arg(long, default_value_t = 8)]
  pub concurrency: usize,

  /// Zone in which "today" is evaluated: utc, local, or an IANA name
  #[arg(long, default_value = "utc")]
  pub tz: String,

  /// Raise log level to debug
  #[arg(short, long)]
  pub verbose: bool,

  /// Emit a troff man page to stdout (internal; for packaging)
  #[arg(long, hide = true)]
  pub gen_man: bool,

  /// Override the "now" instant used for trailing windows (hidden; tests only)
  #[arg(long = "now-override", hide = true)]
  pub now_override: Option<String>,
}

#[derive(Debug)]
pub struct EffectiveConfig {
  pub organization: String,
  pub since: Option<String>,
  pub activity_days: Option<String>,
  pub token: String,
  pub directory_token: String,
  pub output_dir: PathBuf, // absolute path for stability
  pub max_retries: u32,
  pub enterprise: Option<String>,
  pub include_inactive: bool,
  pub api_url: String,
  pub graphql_url: String,
  pub run_timeout: Option<Duration>,
  pub request_timeout: Duration,
  pub retry_backoff: Duration,
  pub concurrency: usize,
  pub tz: Tz,
  pub now_override: Option<String>,
}

fn present(v: Option<String>) -> Option<String> {
  v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn non_empty_url(name: &'static str, v: String) -> Result<String, ConfigError> {
  let v = v.trim().trim_end_matches('/').to_string();
  if v.is_empty() {
    return Err(ConfigError::Invalid { name, reason: "must not be empty".into() });
  }
  Ok(v)
}

/// Validate inputs; nothing here touches the network.
pub fn normalize(cli: Cli) -> Result<EffectiveConfig, ConfigError> {
  let organization = present(cli.organization).ok_or(ConfigError::Missing("organization"))?;
  let output_dir = cli
    .output_dir
    .filter(|p| !p.as_os_str().is_empty())
    .map(util::canonicalize_lossy)
    .ok_or(ConfigError::Missing("outputDir"))?;

  let max_retries = present(cli.octokit_max_retries).ok_or(ConfigError::Missing("octokit_max_retries"))?;
  let max_retries = max_retries.parse::<u32>().map_err(|_| ConfigError::Invalid {
    name: "octokit_max_retries",
    reason: format!("expected a non-negative integer, got {:?}", max_retries),
  })?;

  if cli.concurrency == 0 {
    return Err(ConfigError::Invalid { name: "concurrency", reason: "must be at least 1".into() });
  }
  let tz = cli.tz.parse::<Tz>().map_err(|reason| ConfigError::Invalid { name: "tz", reason })?;

  let token = present(cli.token)
    .or_else(discover_token)
    .ok_or(ConfigError::Missing("token"))?;
  let directory_token = present(cli.directory_token)
    .or_else(|| present(std::env::var("ORG_TOKEN").ok()))
    .unwrap_or_else(|| token.clone());

  Ok(EffectiveConfig {
    organization,
    since: present(cli.since),
    activity_days: present(cli.activity_days),
    token,
    directory_token,
    output_dir,
    max_retries,
    enterprise: present(cli.enterprise),
    include_inactive: cli.include_inactive,
    api_url: non_empty_url("api-url", cli.api_url)?,
    graphql_url: non_empty_url("graphql-url", cli.graphql_url)?,
    run_timeout: (cli.timeout_secs > 0).then(|| Duration::from_secs(cli.timeout_secs)),
    request_timeout: Duration::from_secs(cli.request_timeout_secs.max(1)),
    retry_backoff: Duration::from_millis(cli.retry_backoff_ms),
    concurrency: cli.concurrency,
    tz,
    now_override: present(cli.now_override),
  })
}
