// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Attach an email to every aggregated record from the public profile and the enterprise SAML directory
// role: enrichment/email
// inputs: GithubApi backend, optional enterprise slug, records from the aggregator, fan-out width
// outputs: Records with email set, in input order
// side_effects: Network calls (one directory walk, one profile lookup per user); one info line per user
// invariants:
// - precedence: non-empty profile email, then directory email, then ""
// - the directory is fetched once, fully paginated, and read-only afterwards
// - a failed profile lookup never drops a record or affects other users
// errors: directory fetch failures propagate; per-user failures are logged and replaced by their fallback
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::error::{ResolutionError, TransportError};
use crate::ext::serde_json::JsonFetch;
use crate::github::api::GithubApi;
use crate::github::saml::{parse_page, SamlPage};
use crate::model::{DirectoryEntry, EmailResolution, UserActivityRecord};

/// Login to SSO email, keyed case-insensitively.
#[derive(Debug, Default, Clone)]
pub struct Directory {
  by_login: HashMap<String, String>,
}

impl Directory {
  pub fn empty() -> Self {
    Self::default()
  }

  pub fn from_entries(entries: impl IntoIterator<Item = DirectoryEntry>) -> Self {
    let by_login = entries
      .into_iter()
      .map(|e| (e.login.to_lowercase(), e.sso_email))
      .collect();
    Self { by_login }
  }

  /// Walk every page of the enterprise's SAML identities.
  pub fn fetch(api: &dyn GithubApi, enterprise: &str) -> Result<Self, TransportError> {
    let mut entries = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;

    loop {
      let data = api.saml_identities_json(enterprise, cursor.as_deref())?;
      pages += 1;

      match parse_page(&data) {
        SamlPage::NoProvider => {
          warn!(enterprise, "enterprise has no SAML identity provider; directory emails unavailable");
          return Ok(Self::empty());
        }
        SamlPage::Entries { entries: page, next_cursor } => {
          entries.extend(page);
          // a cursor that does not advance would loop forever
          match next_cursor {
            Some(next) if cursor.as_deref() != Some(next.as_str()) => cursor = Some(next),
            _ => break,
          }
        }
      }
    }

    info!(enterprise, pages, identities = entries.len(), "directory loaded");
    Ok(Self::from_entries(entries))
  }

  pub fn lookup(&self, login: &str) -> Option<&str> {
    self.by_login.get(&login.to_lowercase()).map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.by_login.len()
  }

  pub fn is_empty(&self) -> bool {
    self.by_login.is_empty()
  }
}

pub fn choose_email(profile: Option<&str>, directory: Option<&str>) -> String {
  let usable = |s: Option<&str>| s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);
  usable(profile).or_else(|| usable(directory)).unwrap_or_default()
}

pub struct EmailResolver<'a> {
  api: &'a dyn GithubApi,
  directory: Directory,
  concurrency: usize,
}

impl<'a> EmailResolver<'a> {
  pub fn new(api: &'a dyn GithubApi, directory: Directory, concurrency: usize) -> Self {
    Self {
      api,
      directory,
      concurrency: concurrency.max(1),
    }
  }

  pub fn resolve_one(&self, record: UserActivityRecord) -> Result<UserActivityRecord, ResolutionError> {
    let directory_email = self.directory.lookup(&record.login).map(str::to_string);

    let profile = match self.api.get_user_json(&record.login) {
      Ok(profile) => profile,
      Err(source) => {
        let fallback = match directory_email {
          Some(email) if !email.trim().is_empty() => record.with_email(email.trim().to_string()),
          _ => record,
        };
        return Err(ResolutionError {
          login: fallback.login.clone(),
          source,
          fallback,
        });
      }
    };

    let profile_email = profile.fetch("email").to_non_empty_string();
    let resolution = EmailResolution {
      email: choose_email(profile_email.as_deref(), directory_email.as_deref()),
      login: record.login.clone(),
      profile_email,
      directory_email,
    };

    info!(
      login = %resolution.login,
      profile_email = resolution.profile_email.as_deref().unwrap_or(""),
      directory_email = resolution.directory_email.as_deref().unwrap_or(""),
      email = %resolution.email,
      "email resolved"
    );

    Ok(record.with_email(resolution.email))
  }

  /// Resolve every record on a bounded pool; output order follows input order.
  pub fn resolve_emails(&self, records: Vec<UserActivityRecord>) -> Vec<UserActivityRecord> {
    let results = self.resolve_all(records);
    let total = results.len();
    let mut failed = 0usize;

    let resolved: Vec<UserActivityRecord> = results
      .into_iter()
      .map(|r| {
        r.unwrap_or_else(|err| {
          failed += 1;
          warn!(login = %err.login, error = %err.source, "email lookup failed; keeping fallback");
          err.fallback
        })
      })
      .collect();

    info!(users = total, failed, "email resolution finished");
    resolved
  }

  fn resolve_all(&self, records: Vec<UserActivityRecord>) -> Vec<Result<UserActivityRecord, ResolutionError>> {
    match rayon::ThreadPoolBuilder::new().num_threads(self.concurrency).build() {
      Ok(pool) => pool.install(|| records.into_par_iter().map(|r| self.resolve_one(r)).collect()),
      Err(e) => {
        warn!(error = %e, "could not start lookup pool; resolving sequentially");
        records.into_iter().map(|r| self.resolve_one(r)).collect()
      }
    }
  }
}
