// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Aggregate per-user commits, issues, issue comments and PR review comments across every organization repository
// role: aggregation/core
// inputs: GithubApi backend, organization slug, ActivityWindow, inactive-user policy
// outputs: Vec<UserActivityRecord> sorted by login, one record per login
// invariants:
// - a login seen in several repositories yields exactly one merged record whose counters are the per-repo sums
// - commits count once per (login, sha); issues and comments count once per id
// - issues carrying a pull_request key are not issues
// - a 409 on a commit listing means an empty repository and contributes nothing
// errors: any other TransportError aborts the whole aggregation
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info};

use crate::error::TransportError;
use crate::ext::serde_json::JsonFetch;
use crate::github::api::{GithubApi, RepoRef};
use crate::model::{ActivityCounts, ActivityKind, UserActivityRecord};
use crate::window::ActivityWindow;

pub struct ActivityAggregator<'a> {
  api: &'a dyn GithubApi,
  include_inactive: bool,
}

impl<'a> ActivityAggregator<'a> {
  pub fn new(api: &'a dyn GithubApi, include_inactive: bool) -> Self {
    Self { api, include_inactive }
  }

  pub fn aggregate(&self, org: &str, window: &ActivityWindow) -> Result<Vec<UserActivityRecord>, TransportError> {
    let since = window.since_param();
    let repos: Vec<RepoRef> = self
      .api
      .list_org_repos_json(org)?
      .iter()
      .filter_map(|r| RepoRef::from_json(r, org))
      .collect();
    info!(org, repos = repos.len(), since = %since, "aggregating organization activity");

    let mut ledger = ActivityLedger::default();

    for repo in &repos {
      let mut repo_counts = ActivityCounts::default();

      for kind in ActivityKind::ALL {
        let items = match self.api.list_repo_activity_json(repo, kind, &since) {
          Ok(items) => items,
          Err(e) if kind == ActivityKind::Commit && e.status() == Some(409) => {
            debug!(repo = %repo.full_name(), "repository is empty");
            Vec::new()
          }
          Err(e) => return Err(e),
        };

        for item in &items {
          if let Some(login) = ledger.record(&repo.name, kind, item, window) {
            debug!(repo = %repo.full_name(), ?kind, login = %login, "counted");
            repo_counts.bump(kind);
          }
        }
      }

      info!(
        repo = %repo.full_name(),
        commits = repo_counts.commits,
        issues = repo_counts.issues,
        issue_comments = repo_counts.issue_comments,
        pr_comments = repo_counts.pr_comments,
        "repository scanned"
      );
    }

    if self.include_inactive {
      for member in self.api.list_org_members_json(org)? {
        if let Some(login) = member.fetch("login").to_non_empty_string() {
          ledger.users.entry(login).or_default();
        }
      }
    }

    let records = ledger.into_records(self.include_inactive);
    info!(
      org,
      users = records.len(),
      active = records.iter().filter(|r| r.is_active).count(),
      "aggregation finished"
    );
    Ok(records)
  }
}

/// Per-repository counters of one login; totals are always derived from these.
type UserTally = BTreeMap<String, ActivityCounts>;

#[derive(Default)]
struct ActivityLedger {
  users: BTreeMap<String, UserTally>,
  seen: HashSet<(ActivityKind, String)>,
}

impl ActivityLedger {
  /// Count `item` towards its author; returns the login when it was counted.
  fn record(&mut self, repo: &str, kind: ActivityKind, item: &serde_json::Value, window: &ActivityWindow) -> Option<String> {
    let login = attributed_login(kind, item, window)?;

    if let Some(key) = dedup_key(kind, &login, item) {
      if !self.seen.insert((kind, key)) {
        return None;
      }
    }

    let tally = self.users.entry(login.clone()).or_default();
    tally.entry(repo.to_string()).or_default().bump(kind);
    Some(login)
  }

  fn into_records(self, include_inactive: bool) -> Vec<UserActivityRecord> {
    self
      .users
      .into_iter()
      .map(|(login, repositories)| {
        let mut counts = ActivityCounts::default();
        for per_repo in repositories.values() {
          counts += *per_repo;
        }
        UserActivityRecord::new(login, counts, repositories)
      })
      .filter(|r| include_inactive || r.is_active)
      .collect()
  }
}

fn attributed_login(kind: ActivityKind, item: &serde_json::Value, window: &ActivityWindow) -> Option<String> {
  match kind {
    // commits without a linked account have a null author
    ActivityKind::Commit => item.fetch("author.login").to_non_empty_string(),
    ActivityKind::Issue if item.get("pull_request").is_some() => None,
    ActivityKind::Issue | ActivityKind::IssueComment | ActivityKind::PrComment => {
      let created = item.fetch("created_at").to_non_empty_string();
      if created.and_then(|ts| window.admits(&ts)) == Some(false) {
        return None;
      }
      item.fetch("user.login").to_non_empty_string()
    }
  }
}

fn dedup_key(kind: ActivityKind, login: &str, item: &serde_json::Value) -> Option<String> {
  match kind {
    ActivityKind::Commit => item.fetch("sha").to_non_empty_string().map(|sha| format!("{login}@{sha}")),
    _ => item.fetch("id").value().map(|id| id.to_string()),
  }
}
