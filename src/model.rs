// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Define the per-user activity model, report row projection and directory entries
// role: model/types
// outputs: ActivityCounts, UserActivityRecord, EmailResolution, DirectoryEntry, ReportRow
// invariants:
// - counters only ever grow (AddAssign), never decrement
// - ReportRow field order is the CSV column order: login,email,isActive,commits,issues,issueComments,prComments
// - is_active is derived from counters at construction time
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::BTreeMap;
use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

/// The tracked activity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityKind {
  Commit,
  Issue,
  IssueComment,
  PrComment,
}

impl ActivityKind {
  pub const ALL: [ActivityKind; 4] = [
    ActivityKind::Commit,
    ActivityKind::Issue,
    ActivityKind::IssueComment,
    ActivityKind::PrComment,
  ];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityCounts {
  pub commits: u64,
  pub issues: u64,
  pub issue_comments: u64,
  pub pr_comments: u64,
}

impl ActivityCounts {
  pub fn bump(&mut self, kind: ActivityKind) {
    match kind {
      ActivityKind::Commit => self.commits += 1,
      ActivityKind::Issue => self.issues += 1,
      ActivityKind::IssueComment => self.issue_comments += 1,
      ActivityKind::PrComment => self.pr_comments += 1,
    }
  }

  pub fn total(&self) -> u64 {
    self.commits + self.issues + self.issue_comments + self.pr_comments
  }
}

impl AddAssign for ActivityCounts {
  fn add_assign(&mut self, rhs: Self) {
    self.commits += rhs.commits;
    self.issues += rhs.issues;
    self.issue_comments += rhs.issue_comments;
    self.pr_comments += rhs.pr_comments;
  }
}

/// Raw data a record was derived from; persisted verbatim in the JSON snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPayload {
  pub login: String,
  pub is_active: bool,
  #[serde(flatten)]
  pub counts: ActivityCounts,
  pub repositories: BTreeMap<String, ActivityCounts>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserActivityRecord {
  pub login: String,
  pub counts: ActivityCounts,
  pub is_active: bool,
  pub email: Option<String>,
  pub json_payload: serde_json::Value,
}

impl UserActivityRecord {
  pub fn new(login: String, counts: ActivityCounts, repositories: BTreeMap<String, ActivityCounts>) -> Self {
    let is_active = counts.total() > 0;
    let payload = ActivityPayload {
      login: login.clone(),
      is_active,
      counts,
      repositories,
    };
    // ActivityPayload holds only strings, bools, integers and maps; conversion cannot fail.
    let json_payload = serde_json::to_value(&payload).unwrap_or(serde_json::Value::Null);

    Self {
      login,
      counts,
      is_active,
      email: None,
      json_payload,
    }
  }

  pub fn with_email(mut self, email: String) -> Self {
    self.email = Some(email);
    self
  }
}

/// Transient view of the two email sources for one login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailResolution {
  pub login: String,
  pub profile_email: Option<String>,
  pub directory_email: Option<String>,
  pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
  pub login: String,
  pub sso_email: String,
}

/// One CSV row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
  pub login: String,
  pub email: String,
  pub is_active: bool,
  pub commits: u64,
  pub issues: u64,
  pub issue_comments: u64,
  pub pr_comments: u64,
}

impl From<&UserActivityRecord> for ReportRow {
  fn from(record: &UserActivityRecord) -> Self {
    Self {
      login: record.login.clone(),
      email: record.email.clone().unwrap_or_default(),
      is_active: record.is_active,
      commits: record.counts.commits,
      issues: record.counts.issues,
      issue_comments: record.counts.issue_comments,
      pr_comments: record.counts.pr_comments,
    }
  }
}
