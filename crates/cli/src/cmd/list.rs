//! Implementation of the `abivault list` command.

use anyhow::Result;
use serde::Serialize;

use abivault_lib::Config;
use abivault_lib::storage::StorageProvider;
use abivault_lib::util::hash::ArtifactId;

use super::runtime;
use crate::output::{OutputFormat, print_info, print_json, print_stat};

#[derive(Debug, Serialize)]
struct Listing {
  project: String,
  location: String,
  tags: Vec<String>,
  ids: Vec<ArtifactId>,
}

async fn list(storage: &dyn StorageProvider, project: &str) -> abivault_lib::Result<Listing> {
  Ok(Listing {
    project: project.to_string(),
    location: storage.location(),
    tags: storage.list_tags(project).await?.into_iter().collect(),
    ids: storage.list_ids(project).await?.into_iter().collect(),
  })
}

pub fn cmd_list(config: &Config, project: &str, remote: bool, output: OutputFormat) -> Result<()> {
  let rt = runtime()?;
  let listing = if remote {
    let storage = config.remote_storage()?;
    rt.block_on(list(&storage, project))?
  } else {
    rt.block_on(list(&config.local_storage(), project))?
  };

  if output.is_json() {
    return print_json(&listing);
  }

  print_info(&format!("{} ({})", listing.project, listing.location));
  print_stat("Tags", &listing.tags.len().to_string());
  for tag in &listing.tags {
    println!("    {}", tag);
  }
  print_stat("Ids", &listing.ids.len().to_string());
  for id in &listing.ids {
    println!("    {}", id);
  }

  Ok(())
}
