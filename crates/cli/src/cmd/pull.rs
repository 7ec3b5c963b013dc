//! Implementation of the `abivault pull` command.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Result, bail};

use abivault_lib::Config;
use abivault_lib::pull::pull;
use abivault_lib::reference::Reference;

use super::runtime;
use crate::output::{
  OutputFormat, format_duration, print_info, print_json, print_stat, print_success, print_warning, symbols,
};

/// Pull a project (or one tag/id of it) from the remote into the local store.
///
/// Fails when any item could not be pulled, after reporting the ones that were.
pub fn cmd_pull(config: &Config, reference: &str, force: bool, output: OutputFormat) -> Result<()> {
  let start = Instant::now();
  let reference: Reference = reference.parse()?;
  let local = Arc::new(config.local_storage());
  let remote = Arc::new(config.remote_storage()?);

  let result = runtime()?.block_on(pull(
    local,
    remote,
    &reference.project,
    reference.selector.as_deref(),
    force,
    config,
  ))?;

  if output.is_json() {
    print_json(&result)?;
  } else {
    if result.pulled() == 0 && !result.has_failures() {
      print_info("Already up to date");
    } else {
      print_success(&format!("Pulled {} item(s) into {}", result.pulled(), config.root.display()));
    }
    for tag in &result.pulled_tags {
      println!("  {} tag {}", symbols::ARROW, tag);
    }
    for id in &result.pulled_ids {
      println!("  {} id {}", symbols::ARROW, id);
    }
    print_stat("Pulled", &result.pulled().to_string());
    print_stat("Skipped", &result.skipped().to_string());
    print_stat("Failed", &result.failed().to_string());
    print_stat("Duration", &format_duration(start.elapsed()));

    for tag in &result.failed_tags {
      print_warning(&format!("Failed to pull tag {}", tag));
    }
    for id in &result.failed_ids {
      print_warning(&format!("Failed to pull id {}", id));
    }
  }

  if result.has_failures() {
    bail!("{} item(s) failed to pull", result.failed());
  }
  Ok(())
}
