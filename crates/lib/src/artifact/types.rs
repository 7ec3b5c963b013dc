//! Artifact document schemas.
//!
//! Two producer formats are recognised:
//!
//! - Hardhat build-info files (`"_format": "hh-sol-build-info-1"`), which wrap
//!   the compiler's standard-JSON input and output with compiler metadata.
//! - Plain solc standard-JSON documents (`input` + `output`, no `_format`).
//!
//! Only the fields needed for content comparison are typed. Everything else
//! stays in the raw bytes the artifact was loaded from and is passed through
//! untouched.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `_format` marker of Hardhat build-info documents.
pub const HARDHAT_BUILD_INFO_FORMAT: &str = "hh-sol-build-info-1";

/// Producer format an artifact document was recognised as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactFormat {
  HardhatBuildInfoV1,
  SolcStandardJson,
}

impl fmt::Display for ArtifactFormat {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ArtifactFormat::HardhatBuildInfoV1 => write!(f, "{}", HARDHAT_BUILD_INFO_FORMAT),
      ArtifactFormat::SolcStandardJson => write!(f, "solc-standard-json"),
    }
  }
}

/// Identity of a compiled contract within one artifact: source path plus
/// contract name.
///
/// Ordering is by path, then name. The `path:name` rendering is only used at
/// the edges (summary documents, terminal output); comparisons never go
/// through the string form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContractKey {
  pub path: String,
  pub name: String,
}

impl ContractKey {
  pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
    Self {
      path: path.into(),
      name: name.into(),
    }
  }
}

impl fmt::Display for ContractKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.path, self.name)
  }
}

/// The semantically relevant part of one compiled contract.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractEntry {
  /// ABI members as emitted by the compiler (unsorted).
  pub abi: Vec<Map<String, Value>>,
  /// Creation bytecode object (hex, possibly with link placeholders).
  pub bytecode: String,
  /// Deployed bytecode section, kept opaque.
  pub deployed_bytecode: Option<Value>,
  /// Compiler metadata string; empty when the producer omitted it.
  pub metadata: String,
}

/// Schema of `hh-sol-build-info-1` documents.
#[derive(Debug, Deserialize)]
pub(crate) struct HardhatBuildInfo {
  #[serde(rename = "_format")]
  pub format: String,
  pub id: String,
  #[serde(rename = "solcVersion")]
  pub solc_version: String,
  #[serde(rename = "solcLongVersion")]
  pub solc_long_version: String,
  pub input: Value,
  pub output: CompilerOutput,
}

/// Schema of plain solc standard-JSON documents.
#[derive(Debug, Deserialize)]
pub(crate) struct StandardJson {
  pub input: Value,
  pub output: CompilerOutput,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompilerOutput {
  #[serde(default)]
  pub contracts: BTreeMap<String, BTreeMap<String, ContractOutput>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContractOutput {
  pub abi: Vec<Map<String, Value>>,
  pub evm: EvmOutput,
  #[serde(default)]
  pub metadata: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EvmOutput {
  pub bytecode: BytecodeOutput,
  #[serde(rename = "deployedBytecode", default)]
  pub deployed_bytecode: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BytecodeOutput {
  pub object: String,
}

impl From<ContractOutput> for ContractEntry {
  fn from(output: ContractOutput) -> Self {
    Self {
      abi: output.abi,
      bytecode: output.evm.bytecode.object,
      deployed_bytecode: output.evm.deployed_bytecode,
      metadata: output.metadata.unwrap_or_default(),
    }
  }
}
