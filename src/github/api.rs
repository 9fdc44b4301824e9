// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Trait seam for the GitHub REST/GraphQL calls the aggregator and email resolver depend on
// role: github/api
// outputs: GithubApi trait, RepoRef, ClientConfig
// invariants:
// - list methods return every page (pagination is the backend's job, never the caller's)
// - implementations are Sync so per-user lookups can fan out
// errors: TransportError after the backend's own retries are exhausted
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::time::{Duration, Instant};

use crate::error::TransportError;
use crate::ext::serde_json::JsonFetch;
use crate::model::ActivityKind;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RepoRef {
  pub owner: String,
  pub name: String,
}

impl RepoRef {
  /// Build from a repository object of `GET /orgs/{org}/repos`.
  pub fn from_json(repo_json: &serde_json::Value, org: &str) -> Option<Self> {
    let name = repo_json.fetch("name").to_non_empty_string()?;
    let owner = repo_json
      .fetch("owner.login")
      .to_non_empty_string()
      .unwrap_or_else(|| org.to_string());

    Some(Self { owner, name })
  }

  pub fn full_name(&self) -> String {
    format!("{}/{}", self.owner, self.name)
  }
}

pub trait GithubApi: Sync {
  fn list_org_repos_json(&self, org: &str) -> Result<Vec<serde_json::Value>, TransportError>;
  fn list_org_members_json(&self, org: &str) -> Result<Vec<serde_json::Value>, TransportError>;
  /// Items of one activity kind created or updated since `since` (RFC3339).
  fn list_repo_activity_json(
    &self,
    repo: &RepoRef,
    kind: ActivityKind,
    since: &str,
  ) -> Result<Vec<serde_json::Value>, TransportError>;
  fn get_user_json(&self, login: &str) -> Result<serde_json::Value, TransportError>;
  /// One page of the enterprise SAML external-identity list (the GraphQL `data` object).
  fn saml_identities_json(&self, enterprise: &str, after: Option<&str>) -> Result<serde_json::Value, TransportError>;
}

/// REST path (relative to the API root) listing `kind` for `repo`.
pub fn activity_path(repo: &RepoRef, kind: ActivityKind, since: &str) -> String {
  let base = format!("/repos/{}/{}", repo.owner, repo.name);

  match kind {
    ActivityKind::Commit => format!("{base}/commits?since={since}&per_page=100"),
    ActivityKind::Issue => format!("{base}/issues?state=all&since={since}&per_page=100"),
    ActivityKind::IssueComment => format!("{base}/issues/comments?since={since}&per_page=100"),
    ActivityKind::PrComment => format!("{base}/pulls/comments?since={since}&per_page=100"),
  }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
  pub api_url: String,
  pub graphql_url: String,
  pub token: String,
  pub directory_token: String,
  pub max_retries: u32,
  pub retry_backoff: Duration,
  pub request_timeout: Duration,
  pub deadline: Option<Instant>,
}
