//! Named run outputs and failure annotations for automation runners.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::report::ReportPaths;

/// Append `name=value` to the file named by `GITHUB_OUTPUT`, when set.
pub fn set_output(name: &str, value: &str) -> Result<()> {
  let Some(file) = std::env::var_os("GITHUB_OUTPUT").filter(|v| !v.is_empty()) else {
    return Ok(());
  };

  let mut f = std::fs::OpenOptions::new()
    .create(true)
    .append(true)
    .open(&file)
    .with_context(|| format!("opening run output file {}", Path::new(&file).display()))?;
  writeln!(f, "{}={}", name, value).with_context(|| format!("writing run output {}", name))?;
  Ok(())
}

pub fn set_path_output(name: &str, path: &Path) -> Result<()> {
  set_output(name, &path.to_string_lossy())
}

/// JSON printed to stdout once both files exist.
pub fn pointer(paths: &ReportPaths) -> serde_json::Value {
  serde_json::json!({
    "report_json": paths.report_json.to_string_lossy(),
    "report_csv": paths.report_csv.to_string_lossy(),
  })
}

/// `::error::` workflow command for `message`, escaped per the runner's rules.
pub fn error_annotation(message: &str) -> String {
  let escaped = message.replace('%', "%25").replace('\r', "%0D").replace('\n', "%0A");
  format!("::error::{}", escaped)
}

pub fn running_in_actions() -> bool {
  std::env::var("GITHUB_ACTIONS").map(|v| v == "true").unwrap_or(false)
}
