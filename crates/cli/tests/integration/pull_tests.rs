use predicates::prelude::*;

use super::common::TestEnv;

fn publish(env: &TestEnv, tag: &str, bytecode: &str) {
  let artifact = env.write_artifact(&format!("{}.json", tag), &[("contracts/Token.sol", "Token", bytecode)]);
  env
    .abivault_cmd()
    .arg("push")
    .arg(&artifact)
    .arg(format!("token:{}", tag))
    .assert()
    .success();
}

#[test]
fn pull_into_empty_store() {
  let env = TestEnv::new();
  publish(&env, "v1", "6001");
  publish(&env, "v2", "6002");

  env
    .abivault_cmd()
    .args(["pull", "token"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Pulled: 4"));

  assert!(env.root_path().join("token/tags/v1.json").is_file());
  assert!(env.root_path().join("token/tags/v2.json").is_file());

  let listing = env.json(&["list", "token"]);
  assert_eq!(listing["tags"], serde_json::json!(["v1", "v2"]));
}

#[test]
fn second_pull_is_up_to_date() {
  let env = TestEnv::new();
  publish(&env, "v1", "6001");

  env.abivault_cmd().args(["pull", "token"]).assert().success();
  env
    .abivault_cmd()
    .args(["pull", "token"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Already up to date"));
}

#[test]
fn pull_single_tag_json() {
  let env = TestEnv::new();
  publish(&env, "v1", "6001");
  publish(&env, "v2", "6002");

  let result = env.json(&["pull", "token:v2"]);
  assert_eq!(result["pulled_tags"], serde_json::json!(["v2"]));
  assert_eq!(result["remote_tags"], serde_json::json!(["v1", "v2"]));
  assert!(!env.root_path().join("token/tags/v1.json").exists());
}

#[test]
fn pull_unknown_selector_fails() {
  let env = TestEnv::new();
  publish(&env, "v1", "6001");

  env
    .abivault_cmd()
    .args(["pull", "token:v9"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("neither a tag nor an id"));
}

#[test]
fn list_remote_shows_published_tags() {
  let env = TestEnv::new();
  publish(&env, "v1", "6001");

  env
    .abivault_cmd()
    .args(["list", "token", "--remote"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Tags: 1"))
    .stdout(predicate::str::contains("v1"));
}
