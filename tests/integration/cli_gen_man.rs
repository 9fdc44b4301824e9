#[test]
fn gen_man_outputs_troff() {
  test_support::init_tracing();
  let mut cmd = test_support::cmd_bin(crate::mock_org::BIN);
  let out = cmd.args(["--gen-man"]).output().unwrap();
  assert!(out.status.success());
  let text = String::from_utf8_lossy(&out.stdout);
  assert!(text.contains(".TH"), "expected troff man header");
  assert!(text.contains("organization"));
}

#[test]
fn help_lists_runner_inputs() {
  let mut cmd = test_support::cmd_bin(crate::mock_org::BIN);
  let out = cmd.arg("--help").output().unwrap();
  assert!(out.status.success());
  let text = String::from_utf8_lossy(&out.stdout);
  for flag in ["--organization", "--since", "--activity-days", "--output-dir", "--octokit-max-retries", "--enterprise"] {
    assert!(text.contains(flag), "missing {flag} in help");
  }
}
