//! Implementation of the `abivault push` command.

use std::path::Path;

use anyhow::Result;

use abivault_lib::Config;
use abivault_lib::push::push;
use abivault_lib::reference::Reference;

use super::runtime;
use crate::output::{OutputFormat, format_bytes, print_json, print_stat, print_success, print_warning};

/// Publish the artifact at `path` to the configured remote.
pub fn cmd_push(config: &Config, path: &Path, reference: &str, force: bool, output: OutputFormat) -> Result<()> {
  let reference: Reference = reference.parse()?;
  let remote = config.remote_storage()?;

  let result = runtime()?.block_on(push(
    &remote,
    path,
    &reference.project,
    reference.selector.as_deref(),
    force,
  ))?;

  if output.is_json() {
    return print_json(&result);
  }

  if result.overwritten
    && let Some(tag) = &result.tag
  {
    print_warning(&format!("Tag '{}' was repointed", tag));
  }
  print_success(&format!("Pushed {}", result.id));
  print_stat("Project", &result.project);
  if let Some(tag) = &result.tag {
    print_stat("Tag", tag);
  }
  print_stat("Format", &result.format.to_string());
  print_stat("Contracts", &result.contracts.to_string());
  print_stat("Size", &format_bytes(result.size));

  Ok(())
}
