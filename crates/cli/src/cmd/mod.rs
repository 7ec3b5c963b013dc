mod diff;
mod list;
mod pull;
mod push;
mod summary;

pub use diff::cmd_diff;
pub use list::cmd_list;
pub use pull::cmd_pull;
pub use push::cmd_push;
pub use summary::cmd_summary;

use anyhow::{Context, Result};
use tokio::runtime::Runtime;

fn runtime() -> Result<Runtime> {
  Runtime::new().context("Failed to create async runtime")
}
