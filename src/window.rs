// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Resolve the activity window lower bound from an explicit since date or a trailing day count
// role: windowing
// inputs: optional since string, optional activity_days string, "today" evaluated in a zone
// outputs: ActivityWindow (inclusive lower bound date) and its API query rendering
// invariants:
// - since wins over activity_days unconditionally when present
// - trailing windows use calendar-day subtraction on a date, never elapsed seconds
// - empty strings are treated as absent inputs
// errors: InvalidWindowError for unparseable dates, bad day counts, or no usable input
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::str::FromStr;

use chrono::{DateTime, Days, Local, NaiveDate, TimeZone, Utc};

use crate::error::InvalidWindowError;

/// Zone in which "today" is evaluated for trailing windows.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Tz {
  Utc,
  Local,
  Zone(chrono_tz::Tz),
}

impl FromStr for Tz {
  type Err = String;

  fn from_str(raw: &str) -> Result<Self, Self::Err> {
    let s = raw.trim();
    if s.eq_ignore_ascii_case("utc") {
      return Ok(Tz::Utc);
    }
    if s.eq_ignore_ascii_case("local") {
      return Ok(Tz::Local);
    }
    s.parse::<chrono_tz::Tz>()
      .map(Tz::Zone)
      .map_err(|_| format!("unknown time zone {:?}; expected utc, local, or an IANA name", raw))
  }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum WindowSpec {
  Since { date: String },
  TrailingDays { days: String },
}

/// Inclusive lower bound (midnight UTC) for every activity query.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct ActivityWindow {
  start: NaiveDate,
}

impl ActivityWindow {
  pub fn starting(start: NaiveDate) -> Self {
    Self { start }
  }

  pub fn start(&self) -> NaiveDate {
    self.start
  }

  pub fn start_utc(&self) -> DateTime<Utc> {
    Utc.from_utc_datetime(&self.start.and_time(chrono::NaiveTime::MIN))
  }

  /// Rendering used for the `since` query parameter.
  pub fn since_param(&self) -> String {
    format!("{}T00:00:00Z", self.start.format("%Y-%m-%d"))
  }

  /// Whether an RFC3339 timestamp falls inside the window; `None` when unparseable.
  pub fn admits(&self, timestamp: &str) -> Option<bool> {
    DateTime::parse_from_rfc3339(timestamp)
      .ok()
      .map(|ts| ts.with_timezone(&Utc) >= self.start_utc())
  }
}

fn present(raw: Option<&str>) -> Option<&str> {
  raw.map(str::trim).filter(|s| !s.is_empty())
}

pub fn window_spec(since: Option<&str>, activity_days: Option<&str>) -> Result<WindowSpec, InvalidWindowError> {
  match (present(since), present(activity_days)) {
    (Some(date), _) => Ok(WindowSpec::Since { date: date.to_string() }),
    (None, Some(days)) => Ok(WindowSpec::TrailingDays { days: days.to_string() }),
    (None, None) => Err(InvalidWindowError::Missing),
  }
}

/// Parse a literal calendar date. RFC3339 timestamps are accepted and reduced to their UTC date.
pub fn parse_since(raw: &str) -> Result<NaiveDate, InvalidWindowError> {
  let s = raw.trim();

  if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
    return Ok(date);
  }

  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc).date_naive())
    .map_err(|_| InvalidWindowError::BadSince(raw.to_string()))
}

pub fn parse_days(raw: &str) -> Result<u32, InvalidWindowError> {
  raw
    .trim()
    .parse::<u32>()
    .map_err(|_| InvalidWindowError::BadDays(raw.to_string()))
}

pub fn resolve_spec(spec: &WindowSpec, today: NaiveDate) -> Result<ActivityWindow, InvalidWindowError> {
  match spec {
    WindowSpec::Since { date } => parse_since(date).map(ActivityWindow::starting),
    WindowSpec::TrailingDays { days } => {
      let n = parse_days(days)?;
      today
        .checked_sub_days(Days::new(u64::from(n)))
        .map(ActivityWindow::starting)
        .ok_or(InvalidWindowError::OutOfRange(n))
    }
  }
}

pub fn resolve(
  explicit_since: Option<&str>,
  trailing_days: Option<&str>,
  today: NaiveDate,
) -> Result<ActivityWindow, InvalidWindowError> {
  let spec = window_spec(explicit_since, trailing_days)?;
  resolve_spec(&spec, today)
}

/// Calendar date of `now` in `tz`.
pub fn today_in_tz(tz: Tz, now: DateTime<Utc>) -> NaiveDate {
  match tz {
    Tz::Utc => now.date_naive(),
    Tz::Local => now.with_timezone(&Local).date_naive(),
    Tz::Zone(zone) => now.with_timezone(&zone).date_naive(),
  }
}

/// Parse a `--now-override` RFC3339 instant.
pub fn parse_now_override(s: Option<&str>) -> Option<DateTime<Utc>> {
  s.and_then(|raw| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.with_timezone(&Utc)))
}
