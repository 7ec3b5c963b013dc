use predicates::prelude::*;

use super::common::TestEnv;

fn publish_and_pull(env: &TestEnv, releases: &[(&str, &str)]) {
  for (tag, bytecode) in releases {
    let artifact = env.write_artifact(&format!("{}.json", tag), &[("contracts/Token.sol", "Token", bytecode)]);
    env
      .abivault_cmd()
      .arg("push")
      .arg(&artifact)
      .arg(format!("token:{}", tag))
      .assert()
      .success();
  }
  env.abivault_cmd().args(["pull", "token"]).assert().success();
}

#[test]
fn summary_filters_similar_releases() {
  let env = TestEnv::new();
  publish_and_pull(
    &env,
    &[("v1.0.0", "01"), ("v1.1.0", "02"), ("v2.0.0", "02"), ("latest", "02")],
  );

  let result = env.json(&["summary", "token", "--filter-similar"]);
  assert_eq!(
    result["summary"]["contracts"]["contracts/Token.sol:Token"],
    serde_json::json!(["v1.0.0", "v1.1.0", "latest"])
  );
  assert!(env.root_path().join("token/summary.json").is_file());
}

#[test]
fn summary_of_all_projects_is_written_at_root() {
  let env = TestEnv::new();
  publish_and_pull(&env, &[("v1.0.0", "01")]);

  env
    .abivault_cmd()
    .arg("summary")
    .assert()
    .success()
    .stdout(predicate::str::contains("Summary written to"));

  let written: serde_json::Value =
    serde_json::from_slice(&std::fs::read(env.root_path().join("summary.json")).unwrap()).unwrap();
  assert_eq!(
    written["contracts"]["contracts/Token.sol:Token"],
    serde_json::json!(["token:v1.0.0"])
  );
}
