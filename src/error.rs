// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Typed failure taxonomy for configuration, windows, transport, reporting and per-user resolution
// role: errors/types
// outputs: ConfigError, InvalidWindowError, TransportError, ReportWriteError, ResolutionError
// invariants:
// - ResolutionError always carries a usable fallback record (users are never dropped)
// - TransportError messages name the URL that failed
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::PathBuf;

use thiserror::Error;

use crate::model::UserActivityRecord;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("input required and not supplied: {0}")]
  Missing(&'static str),
  #[error("invalid value for {name}: {reason}")]
  Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidWindowError {
  #[error("unparseable since date {0:?}; expected YYYY-MM-DD")]
  BadSince(String),
  #[error("activity_days must be a non-negative whole number, got {0:?}")]
  BadDays(String),
  #[error("no activity window: provide since or activity_days")]
  Missing,
  #[error("activity_days {0} reaches before the supported calendar range")]
  OutOfRange(u32),
}

#[derive(Debug, Error)]
pub enum TransportError {
  #[error("{url} answered HTTP {status}: {body}")]
  Status { url: String, status: u16, body: String },
  #[error("request to {url} failed: {message}")]
  Network { url: String, message: String },
  #[error("response from {url} could not be decoded: {message}")]
  Decode { url: String, message: String },
  #[error("GraphQL query against {url} returned errors: {message}")]
  GraphQl { url: String, message: String },
  #[error("run deadline exceeded before requesting {url}")]
  DeadlineExceeded { url: String },
}

impl TransportError {
  pub fn status(&self) -> Option<u16> {
    match self {
      TransportError::Status { status, .. } => Some(*status),
      _ => None,
    }
  }
}

#[derive(Debug, Error)]
pub enum ReportWriteError {
  #[error("output directory {path} could not be created: {source}")]
  CreateDir { path: PathBuf, source: std::io::Error },
  #[error("output directory {path} is not writable: {source}")]
  NotWritable { path: PathBuf, source: std::io::Error },
  #[error("failed to write {path}: {message}")]
  Write { path: PathBuf, message: String },
}

/// A single user's email lookup failed; `fallback` is what gets reported instead.
#[derive(Debug, Error)]
#[error("email resolution for {login} failed: {source}")]
pub struct ResolutionError {
  pub login: String,
  #[source]
  pub source: TransportError,
  pub fallback: UserActivityRecord,
}
