use predicates::prelude::*;

use super::common::TestEnv;

fn release(env: &TestEnv) {
  let artifact = env.write_artifact(
    "release.json",
    &[("contracts/Token.sol", "Token", "6001"), ("contracts/Old.sol", "Old", "6009")],
  );
  env.abivault_cmd().arg("push").arg(&artifact).arg("token:v1").assert().success();
  env.abivault_cmd().args(["pull", "token:v1"]).assert().success();
}

#[test]
fn diff_shows_change_rows() {
  let env = TestEnv::new();
  release(&env);
  let fresh = env.write_artifact(
    "fresh.json",
    &[("contracts/Token.sol", "Token", "6002"), ("contracts/New.sol", "New", "6003")],
  );

  env
    .abivault_cmd()
    .arg("diff")
    .arg(&fresh)
    .arg("token:v1")
    .assert()
    .success()
    .stdout(predicate::str::contains("+ contracts/New.sol:New"))
    .stdout(predicate::str::contains("- contracts/Old.sol:Old"))
    .stdout(predicate::str::contains("~ contracts/Token.sol:Token"));
}

#[test]
fn diff_against_itself_is_empty() {
  let env = TestEnv::new();
  release(&env);
  let same = env.build_path("release.json");

  env
    .abivault_cmd()
    .arg("diff")
    .arg(&same)
    .arg("token:v1")
    .assert()
    .success()
    .stdout(predicate::str::contains("No contract changes"));
}

#[test]
fn diff_without_reference_reports_all_added() {
  let env = TestEnv::new();
  let fresh = env.write_artifact("fresh.json", &[("contracts/Token.sol", "Token", "6002")]);

  let changes = env.json(&["diff", fresh.to_str().unwrap(), "token:v1"]);
  assert_eq!(
    changes,
    serde_json::json!([{ "path": "contracts/Token.sol", "name": "Token", "status": "added" }])
  );
}
