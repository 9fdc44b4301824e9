use std::process::ExitCode;

use clap::Parser;

mod activity;
mod cli;
mod email;
mod error;
mod ext;
mod github;
mod model;
mod outputs;
mod report;
mod run;
mod util;
mod window;

use crate::cli::{normalize, Cli};

fn main() -> ExitCode {
  let cli = Cli::parse();

  if cli.gen_man {
    return match util::render_man_page::<Cli>() {
      Ok(page) => {
        print!("{}", page);
        ExitCode::SUCCESS
      }
      Err(e) => fail(&e),
    };
  }

  util::init_logging(cli.verbose);

  // Phase 1: validate inputs before any network call
  let cfg = match normalize(cli) {
    Ok(cfg) => cfg,
    Err(e) => return fail(&anyhow::Error::new(e)),
  };

  // Phase 2: aggregate, snapshot, enrich, write
  match run::run(&cfg) {
    Ok(_) => ExitCode::SUCCESS,
    Err(e) => fail(&e),
  }
}

fn fail(err: &anyhow::Error) -> ExitCode {
  tracing::error!(error = %format!("{:#}", err), "run failed");
  eprintln!("Error: {:#}", err);
  if outputs::running_in_actions() {
    println!("{}", outputs::error_annotation(&format!("{:#}", err)));
  }
  ExitCode::FAILURE
}
