//! Token discovery used when no token input was supplied.

/// `GITHUB_TOKEN`, then `GH_TOKEN`, then `gh auth token`.
pub fn discover_token() -> Option<String> {
  for var in ["GITHUB_TOKEN", "GH_TOKEN"] {
    if let Ok(t) = std::env::var(var) {
      if !t.trim().is_empty() {
        return Some(t.trim().to_string());
      }
    }
  }

  let output = std::process::Command::new("gh").args(["auth", "token"]).output().ok()?;
  if !output.status.success() {
    return None;
  }

  let t = String::from_utf8_lossy(&output.stdout).trim().to_string();
  (!t.is_empty()).then_some(t)
}
