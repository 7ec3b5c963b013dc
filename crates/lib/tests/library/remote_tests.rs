//! Remote storage over the HTTP bucket gateway.

use std::sync::Arc;
use std::time::Duration;

use abivault_lib::push::push;
use abivault_lib::storage::{HttpObjectStore, RemoteStorage, StorageProvider};
use abivault_lib::util::hash::derive_artifact_id;
use mockito::Matcher;

use super::common::{Workspace, build_info};

fn http_remote(server: &mockito::ServerGuard) -> RemoteStorage {
  let store = HttpObjectStore::new(&server.url(), Some("s3cret"), Duration::from_secs(5)).unwrap();
  RemoteStorage::new(Arc::new(store), "artifacts")
}

#[tokio::test]
async fn push_over_http_uploads_id_and_tag() {
  let ws = Workspace::new();
  let path = ws.write_build("v1.json", &[("contracts/Token.sol", "Token", "6001")]);
  let content = build_info(&[("contracts/Token.sol", "Token", "6001")]);
  let id = derive_artifact_id(&content);

  let mut server = mockito::Server::new_async().await;
  let tag_head = server
    .mock("HEAD", "/artifacts/token/tags/v1.json")
    .with_status(404)
    .create_async()
    .await;
  let id_head = server
    .mock("HEAD", format!("/artifacts/token/ids/{}.json", id).as_str())
    .with_status(404)
    .create_async()
    .await;
  let id_put = server
    .mock("PUT", format!("/artifacts/token/ids/{}.json", id).as_str())
    .match_header("authorization", "Bearer s3cret")
    .match_body(Matcher::Any)
    .with_status(200)
    .create_async()
    .await;
  let tag_put = server
    .mock("PUT", "/artifacts/token/tags/v1.json")
    .with_status(200)
    .create_async()
    .await;

  let remote = http_remote(&server);
  let result = push(&remote, &path, "token", Some("v1"), false).await.unwrap();
  assert_eq!(result.id, id);

  tag_head.assert_async().await;
  id_head.assert_async().await;
  id_put.assert_async().await;
  tag_put.assert_async().await;
}

#[tokio::test]
async fn listing_over_http() {
  let mut server = mockito::Server::new_async().await;
  let _tags = server
    .mock("GET", "/")
    .match_query(Matcher::UrlEncoded("prefix".into(), "artifacts/token/tags/".into()))
    .with_status(200)
    .with_header("content-type", "application/json")
    .with_body(r#"{"keys": ["artifacts/token/tags/v1.json", "artifacts/token/tags/v2.json"]}"#)
    .create_async()
    .await;

  let remote = http_remote(&server);
  let tags = remote.list_tags("token").await.unwrap();
  assert_eq!(tags.into_iter().collect::<Vec<_>>(), vec!["v1", "v2"]);
}

#[tokio::test]
async fn unreachable_remote_is_infrastructure_failure() {
  let mut server = mockito::Server::new_async().await;
  let _m = server.mock("GET", Matcher::Any).with_status(503).create_async().await;

  let remote = http_remote(&server);
  let err: abivault_lib::Error = remote.list_tags("token").await.unwrap_err().into();
  assert!(!err.is_user_facing());
}
