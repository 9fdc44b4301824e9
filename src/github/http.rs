// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: ureq-backed GithubApi with bounded retries, Link-header pagination and a run deadline
// role: github/http-backend
// inputs: ClientConfig (API roots, tokens, retry count, backoff, timeouts, deadline)
// outputs: JSON values for REST lists (all pages) and GraphQL data objects
// side_effects: Network calls; sleeps between retries
// invariants:
// - REST lists follow rel="next" until absent; a repeated next URL ends the walk
// - no request starts after the deadline; no retry sleep crosses it
// - only transport failures, 429, 5xx and rate-limited 403 are retried
// errors: TransportError (Status, Network, Decode, GraphQl, DeadlineExceeded)
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::TransportError;
use crate::ext::serde_json::JsonFetch;
use crate::github::api::{activity_path, ClientConfig, GithubApi, RepoRef};
use crate::github::links::next_page_url;
use crate::github::saml::{SAML_IDENTITIES_QUERY, SAML_PAGE_SIZE};
use crate::model::ActivityKind;

const USER_AGENT: &str = "org-activity-report";
const MAX_BACKOFF: Duration = Duration::from_secs(60);
const MAX_ERROR_BODY: usize = 300;

pub struct GithubHttpApi {
  agent: ureq::Agent,
  cfg: ClientConfig,
}

impl GithubHttpApi {
  pub fn new(cfg: ClientConfig) -> Self {
    let agent = ureq::AgentBuilder::new()
      .timeout(cfg.request_timeout)
      .user_agent(USER_AGENT)
      .build();

    Self { agent, cfg }
  }

  fn api_url(&self, path: &str) -> String {
    format!("{}{}", self.cfg.api_url.trim_end_matches('/'), path)
  }

  fn check_deadline(&self, url: &str) -> Result<(), TransportError> {
    match self.cfg.deadline {
      Some(deadline) if Instant::now() >= deadline => Err(TransportError::DeadlineExceeded { url: url.to_string() }),
      _ => Ok(()),
    }
  }

  /// Delay before the next attempt, or `None` when `err` is not worth retrying.
  fn retry_delay(&self, err: &ureq::Error, attempt: u32) -> Option<Duration> {
    let backoff = self
      .cfg
      .retry_backoff
      .saturating_mul(1u32 << attempt.min(6))
      .min(MAX_BACKOFF);

    match err {
      ureq::Error::Transport(_) => Some(backoff),
      ureq::Error::Status(code, resp) => {
        let rate_limited = *code == 403 && resp.header("x-ratelimit-remaining") == Some("0");
        if !(rate_limited || matches!(*code, 429 | 500 | 502 | 503 | 504)) {
          return None;
        }

        let retry_after = resp
          .header("retry-after")
          .and_then(|s| s.trim().parse::<u64>().ok())
          .map(Duration::from_secs);

        Some(retry_after.unwrap_or(backoff).min(MAX_BACKOFF))
      }
    }
  }

  fn into_transport_error(url: &str, err: ureq::Error) -> TransportError {
    match err {
      ureq::Error::Status(status, resp) => {
        let mut body = resp.into_string().unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
          let mut end = MAX_ERROR_BODY;
          while !body.is_char_boundary(end) {
            end -= 1;
          }
          body.truncate(end);
        }
        TransportError::Status { url: url.to_string(), status, body }
      }
      ureq::Error::Transport(t) => TransportError::Network { url: url.to_string(), message: t.to_string() },
    }
  }

  /// Run `send` with bounded retries.
  fn send_with_retries<F>(&self, url: &str, send: F) -> Result<ureq::Response, TransportError>
  where
    F: Fn() -> Result<ureq::Response, ureq::Error>,
  {
    let mut attempt: u32 = 0;

    loop {
      self.check_deadline(url)?;

      let err = match send() {
        Ok(resp) => return Ok(resp),
        Err(err) => err,
      };

      let delay = if attempt < self.cfg.max_retries { self.retry_delay(&err, attempt) } else { None };
      let delay = delay.filter(|d| match self.cfg.deadline {
        Some(deadline) => Instant::now() + *d < deadline,
        None => true,
      });

      let Some(delay) = delay else {
        return Err(Self::into_transport_error(url, err));
      };

      attempt += 1;
      warn!(url, attempt, max_retries = self.cfg.max_retries, delay_ms = delay.as_millis() as u64, error = %err, "retrying request");
      std::thread::sleep(delay);
    }
  }

  fn get(&self, url: &str) -> Result<ureq::Response, TransportError> {
    self.send_with_retries(url, || {
      self
        .agent
        .get(url)
        .set("Accept", "application/vnd.github+json")
        .set("X-GitHub-Api-Version", "2022-11-28")
        .set("Authorization", &format!("Bearer {}", self.cfg.token))
        .call()
    })
  }

  fn get_json(&self, url: &str) -> Result<serde_json::Value, TransportError> {
    self
      .get(url)?
      .into_json::<serde_json::Value>()
      .map_err(|e| TransportError::Decode { url: url.to_string(), message: e.to_string() })
  }

  /// Fetch a REST list and every following page.
  fn get_all_pages(&self, first_url: &str) -> Result<Vec<serde_json::Value>, TransportError> {
    let mut out = Vec::new();
    let mut next = Some(first_url.to_string());
    let mut page = 0usize;

    while let Some(url) = next.take() {
      page += 1;
      let resp = self.get(&url)?;
      let following = next_page_url(resp.header("link"));
      let body: serde_json::Value = resp
        .into_json()
        .map_err(|e| TransportError::Decode { url: url.clone(), message: e.to_string() })?;

      let serde_json::Value::Array(items) = body else {
        return Err(TransportError::Decode { url, message: "expected a JSON array".into() });
      };

      debug!(url = %url, page, items = items.len(), "fetched page");
      out.extend(items);

      next = following.filter(|n| *n != url);
    }

    Ok(out)
  }

  fn post_graphql(&self, token: &str, variables: serde_json::Value) -> Result<serde_json::Value, TransportError> {
    let url = self.cfg.graphql_url.as_str();
    let body = serde_json::json!({ "query": SAML_IDENTITIES_QUERY, "variables": variables });

    let resp = self.send_with_retries(url, || {
      self
        .agent
        .post(url)
        .set("Authorization", &format!("Bearer {}", token))
        .send_json(body.clone())
    })?;

    let v: serde_json::Value = resp
      .into_json()
      .map_err(|e| TransportError::Decode { url: url.to_string(), message: e.to_string() })?;

    if let Some(errors) = v.fetch("errors").value().and_then(|e| e.as_array()).filter(|e| !e.is_empty()) {
      let message = errors
        .iter()
        .filter_map(|e| e.fetch("message").to::<String>())
        .collect::<Vec<_>>()
        .join("; ");
      return Err(TransportError::GraphQl { url: url.to_string(), message });
    }

    Ok(v.fetch("data").value().cloned().unwrap_or(serde_json::Value::Null))
  }
}

impl GithubApi for GithubHttpApi {
  fn list_org_repos_json(&self, org: &str) -> Result<Vec<serde_json::Value>, TransportError> {
    self.get_all_pages(&self.api_url(&format!("/orgs/{}/repos?type=all&per_page=100", org)))
  }

  fn list_org_members_json(&self, org: &str) -> Result<Vec<serde_json::Value>, TransportError> {
    self.get_all_pages(&self.api_url(&format!("/orgs/{}/members?per_page=100", org)))
  }

  fn list_repo_activity_json(
    &self,
    repo: &RepoRef,
    kind: ActivityKind,
    since: &str,
  ) -> Result<Vec<serde_json::Value>, TransportError> {
    self.get_all_pages(&self.api_url(&activity_path(repo, kind, since)))
  }

  fn get_user_json(&self, login: &str) -> Result<serde_json::Value, TransportError> {
    self.get_json(&self.api_url(&format!("/users/{}", login)))
  }

  fn saml_identities_json(&self, enterprise: &str, after: Option<&str>) -> Result<serde_json::Value, TransportError> {
    let variables = serde_json::json!({
      "enterprise": enterprise,
      "first": SAML_PAGE_SIZE,
      "after": after,
    });
    self.post_graphql(&self.cfg.directory_token, variables)
  }
}
