// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Utilities for absolute paths, log subscriber setup and man page rendering
// role: utilities/helpers
// inputs: paths; verbosity flag; clap CommandFactory
// outputs: Absolute path strings, an installed tracing subscriber, man page text
// side_effects: init_logging installs the global subscriber (stderr)
// invariants:
// - canonicalize_lossy always returns an absolute path, even for paths that do not exist yet
// - log lines never go to stdout (stdout carries the result pointer)
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::path::{Path, PathBuf};

use clap::CommandFactory;
use tracing_subscriber::EnvFilter;

pub fn canonicalize_lossy<P: AsRef<Path>>(p: P) -> PathBuf {
  let p = p.as_ref();
  match std::fs::canonicalize(p) {
    Ok(x) => x,
    Err(_) => match std::env::current_dir() {
      Ok(cwd) => cwd.join(p),
      Err(_) => PathBuf::from(p),
    },
  }
}

/// Install the stderr subscriber; `RUST_LOG` wins over `verbose`.
pub fn init_logging(verbose: bool) {
  let default_level = if verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .try_init();
}

/// Render a section-1 man page for a clap `CommandFactory` implementor.
/// Returns the troff content as a UTF-8 string.
pub fn render_man_page<T: CommandFactory>() -> anyhow::Result<String> {
  let cmd = T::command();
  let man = clap_mangen::Man::new(cmd);
  let mut buf: Vec<u8> = Vec::new();

  man.render(&mut buf)?;

  Ok(String::from_utf8_lossy(&buf).to_string())
}
