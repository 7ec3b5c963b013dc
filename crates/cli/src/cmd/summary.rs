//! Implementation of the `abivault summary` command.

use anyhow::Result;
use serde_json::json;

use abivault_lib::Config;
use abivault_lib::reference::validate_name;
use abivault_lib::summary::{SummaryScope, summarize};

use super::runtime;
use crate::output::{OutputFormat, print_json, print_stat, print_success};

pub fn cmd_summary(config: &Config, project: Option<&str>, filter_similar: bool, output: OutputFormat) -> Result<()> {
  let scope = match project {
    Some(project) => {
      validate_name("project", project)?;
      SummaryScope::Project(project.to_string())
    }
    None => SummaryScope::All,
  };
  let local = config.local_storage();

  let (summary, path) = runtime()?.block_on(summarize(&local, &scope, filter_similar))?;

  if output.is_json() {
    return print_json(&json!({ "path": path, "summary": summary }));
  }

  print_success(&format!("Summary written to {}", path.display()));
  print_stat("Contracts", &summary.contracts.len().to_string());
  print_stat("Releases", &summary.releases.len().to_string());

  Ok(())
}
