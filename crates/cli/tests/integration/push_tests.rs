use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn push_prints_derived_id() {
  let env = TestEnv::new();
  let artifact = env.write_artifact("build.json", &[("contracts/Token.sol", "Token", "6001")]);

  env
    .abivault_cmd()
    .arg("push")
    .arg(&artifact)
    .arg("token:v1")
    .assert()
    .success()
    .stdout(predicate::str::contains("Pushed"))
    .stdout(predicate::str::contains("Contracts: 1"));

  assert!(env.bucket_path().join("token/tags/v1.json").is_file());
}

#[test]
fn push_json_output_is_valid() {
  let env = TestEnv::new();
  let artifact = env.write_artifact("build.json", &[("contracts/Token.sol", "Token", "6001")]);

  let result = env.json(&["push", artifact.to_str().unwrap(), "token:v1"]);
  let id = result["id"].as_str().unwrap();
  assert_eq!(id.len(), 12);
  assert_eq!(result["format"], "hardhat-build-info-v1");
  assert!(env.bucket_path().join(format!("token/ids/{}.json", id)).is_file());
}

#[test]
fn push_existing_tag_conflicts() {
  let env = TestEnv::new();
  let first = env.write_artifact("first.json", &[("contracts/Token.sol", "Token", "6001")]);
  let second = env.write_artifact("second.json", &[("contracts/Token.sol", "Token", "6002")]);

  env.abivault_cmd().arg("push").arg(&first).arg("token:v1").assert().success();

  env
    .abivault_cmd()
    .arg("push")
    .arg(&second)
    .arg("token:v1")
    .assert()
    .failure()
    .stderr(predicate::str::contains("already exists"));

  env
    .abivault_cmd()
    .arg("push")
    .arg(&second)
    .arg("token:v1")
    .arg("--force")
    .assert()
    .success()
    .stderr(predicate::str::contains("repointed"));
}

#[test]
fn push_directory_with_two_documents_fails() {
  let env = TestEnv::new();
  env.write_artifact("a.json", &[("contracts/A.sol", "A", "01")]);
  let b = env.write_artifact("b.json", &[("contracts/B.sol", "B", "02")]);

  env
    .abivault_cmd()
    .arg("push")
    .arg(b.parent().unwrap())
    .arg("token:v1")
    .assert()
    .failure()
    .stderr(predicate::str::contains("ambiguous"));
}
