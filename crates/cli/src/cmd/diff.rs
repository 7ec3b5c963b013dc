//! Diff command implementation.
//!
//! Compares a freshly built artifact against a release in the local store and
//! lists added, removed and changed contracts.

use std::path::Path;

use anyhow::Result;

use abivault_lib::Config;
use abivault_lib::diff::diff;
use abivault_lib::reference::Reference;

use super::runtime;
use crate::output::{OutputFormat, print_change, print_json, print_success};

pub fn cmd_diff(config: &Config, path: &Path, reference: &str, output: OutputFormat) -> Result<()> {
  let reference: Reference = reference.parse()?;
  let selector = reference.require_selector()?;
  let local = config.local_storage();

  let changes = runtime()?.block_on(diff(path, &local, &reference.project, selector))?;

  if output.is_json() {
    return print_json(&changes);
  }

  if changes.is_empty() {
    print_success(&format!("No contract changes against {}", reference));
    return Ok(());
  }

  for change in &changes {
    print_change(change.status, &format!("{}:{}", change.path, change.name));
  }
  println!();
  println!("{} contract(s) differ from {}", changes.len(), reference);

  Ok(())
}
