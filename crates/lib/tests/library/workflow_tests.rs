//! Push, pull, diff and summarize across a local store and a remote bucket.

use abivault_lib::Error;
use abivault_lib::diff::{ContractStatus, diff};
use abivault_lib::pull::pull;
use abivault_lib::push::push;
use abivault_lib::storage::StorageProvider;
use abivault_lib::summary::{SummaryScope, summarize};
use abivault_lib::util::hash::derive_artifact_id;

use super::common::Workspace;

#[tokio::test]
async fn push_then_pull_round_trips_bytes() {
  let ws = Workspace::new();
  let v1 = ws.write_build("v1.json", &[("contracts/Token.sol", "Token", "6001")]);
  let v2 = ws.write_build("v2.json", &[("contracts/Token.sol", "Token", "6002")]);

  let pushed_v1 = push(ws.remote.as_ref(), &v1, "token", Some("v1"), false).await.unwrap();
  let pushed_v2 = push(ws.remote.as_ref(), &v2, "token", Some("v2"), false).await.unwrap();

  let result = pull(ws.local_provider(), ws.remote_provider(), "token", None, false, &ws.config)
    .await
    .unwrap();
  assert_eq!(result.pulled_tags, vec!["v1", "v2"]);
  assert!(!result.has_failures());

  assert_eq!(ws.local.download_by_tag("token", "v1").await.unwrap(), std::fs::read(&v1).unwrap());
  assert_eq!(
    ws.local.download_by_id("token", &pushed_v2.id).await.unwrap(),
    std::fs::read(&v2).unwrap()
  );
  assert!(ws.local.has_by_id("token", &pushed_v1.id).await.unwrap());

  let again = pull(ws.local_provider(), ws.remote_provider(), "token", None, false, &ws.config)
    .await
    .unwrap();
  assert_eq!(again.pulled(), 0);
}

#[tokio::test]
async fn conflicting_push_and_forced_repoint() {
  let ws = Workspace::new();
  let first = ws.write_build("a.json", &[("contracts/Token.sol", "Token", "6001")]);
  let second = ws.write_build("b.json", &[("contracts/Token.sol", "Token", "6002")]);

  push(ws.remote.as_ref(), &first, "token", Some("v1"), false).await.unwrap();
  let err = push(ws.remote.as_ref(), &second, "token", Some("v1"), false)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Conflict { .. }));
  assert!(err.is_user_facing());

  let forced = push(ws.remote.as_ref(), &second, "token", Some("v1"), true).await.unwrap();
  let tagged = ws.remote.download_by_tag("token", "v1").await.unwrap();
  assert_eq!(derive_artifact_id(&tagged), forced.id);
  assert_eq!(ws.remote.list_ids("token").await.unwrap().len(), 2);
}

#[tokio::test]
async fn diff_against_pulled_release() {
  let ws = Workspace::new();
  let released = ws.write_build(
    "release.json",
    &[
      ("contracts/Token.sol", "Token", "6001"),
      ("contracts/Legacy.sol", "Legacy", "6009"),
    ],
  );
  push(ws.remote.as_ref(), &released, "token", Some("v1.0.0"), false)
    .await
    .unwrap();
  pull(ws.local_provider(), ws.remote_provider(), "token", Some("v1.0.0"), false, &ws.config)
    .await
    .unwrap();

  let fresh = ws.write_build(
    "fresh.json",
    &[
      ("contracts/Token.sol", "Token", "6002"),
      ("contracts/Vault.sol", "Vault", "6003"),
    ],
  );
  let changes = diff(&fresh, ws.local.as_ref(), "token", "v1.0.0").await.unwrap();
  let rows: Vec<(&str, ContractStatus)> = changes.iter().map(|c| (c.name.as_str(), c.status)).collect();
  assert_eq!(
    rows,
    vec![
      ("Legacy", ContractStatus::Removed),
      ("Token", ContractStatus::Changed),
      ("Vault", ContractStatus::Added),
    ]
  );
}

#[tokio::test]
async fn summary_over_pulled_releases() {
  let ws = Workspace::new();
  let tags = [("v1.0.0", "6001"), ("v1.1.0", "6002"), ("v2.0.0", "6002"), ("latest", "6002")];
  for (tag, bytecode) in tags {
    let path = ws.write_build(&format!("{}.json", tag), &[("contracts/Token.sol", "Token", bytecode)]);
    push(ws.remote.as_ref(), &path, "token", Some(tag), false).await.unwrap();
  }
  pull(ws.local_provider(), ws.remote_provider(), "token", None, false, &ws.config)
    .await
    .unwrap();

  let scope = SummaryScope::Project("token".to_string());
  let (summary, path) = summarize(&ws.local, &scope, true).await.unwrap();

  assert_eq!(
    summary.contracts["contracts/Token.sol:Token"],
    vec!["v1.0.0", "v1.1.0", "latest"]
  );
  assert_eq!(summary.releases.len(), 4);
  assert!(path.is_file());
}
