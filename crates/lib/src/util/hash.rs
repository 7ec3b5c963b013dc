//! Hashing utilities for content-addressed storage and contract comparison.
//!
//! This module provides:
//! - `ArtifactId`: A truncated 12-character hash identifying an artifact
//! - `ContractDigest`: A full 64-character hash over a contract's semantic content
//! - `derive_artifact_id()`: Artifact id derivation from serialized bytes
//! - `hash_contract()`: Order-insensitive contract hashing

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::artifact::ContractEntry;
use crate::consts::ARTIFACT_ID_LEN;

/// A content-addressed identifier for an artifact.
///
/// The id is the SHA-256 of the artifact's serialized bytes, hex encoded and
/// truncated to 12 characters. Identical bytes always produce the same id.
///
/// # Format
///
/// Lowercase hexadecimal, e.g. `"3f9a0c12be47"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArtifactId(pub String);

impl ArtifactId {
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for ArtifactId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// A full 64-character SHA-256 digest over the semantically relevant parts of
/// a compiled contract.
///
/// Two contracts are equivalent iff their digests match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractDigest(pub String);

impl fmt::Display for ContractDigest {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Derive the artifact id for serialized artifact content.
pub fn derive_artifact_id(content: &[u8]) -> ArtifactId {
  let full = hex::encode(Sha256::digest(content));
  ArtifactId(full[..ARTIFACT_ID_LEN].to_string())
}

/// Hash a compiled contract.
///
/// ABI members are sorted by name first (ties broken by member type, then by
/// input types) so that compiler emission order does not matter. The hash then covers, in order:
/// the serialized sorted ABI, the bytecode object and the metadata string.
pub fn hash_contract(entry: &ContractEntry) -> ContractDigest {
  let mut abi: Vec<&Map<String, Value>> = entry.abi.iter().collect();
  abi.sort_by(|a, b| abi_sort_key(a).cmp(&abi_sort_key(b)));

  // Serializing a Vec of maps cannot fail.
  let serialized_abi = serde_json::to_string(&abi).unwrap_or_default();

  let mut hasher = Sha256::new();
  hasher.update(serialized_abi.as_bytes());
  hasher.update(entry.bytecode.as_bytes());
  hasher.update(entry.metadata.as_bytes());
  ContractDigest(hex::encode(hasher.finalize()))
}

/// Name, member type, then input types so overloads order deterministically.
fn abi_sort_key(member: &Map<String, Value>) -> (&str, &str, Vec<&str>) {
  let inputs = member
    .get("inputs")
    .and_then(Value::as_array)
    .map(|inputs| {
      inputs
        .iter()
        .map(|input| input.get("type").and_then(Value::as_str).unwrap_or(""))
        .collect()
    })
    .unwrap_or_default();
  (str_field(member, "name"), str_field(member, "type"), inputs)
}

fn str_field<'a>(member: &'a Map<String, Value>, key: &str) -> &'a str {
  member.get(key).and_then(Value::as_str).unwrap_or("")
}
