pub mod config;
pub mod init;
pub mod objective;

use anyhow::Context;
use erk_core::{config::Config, issue_store::FileIssueStore};
use std::path::Path;

/// Open the file-backed issue store configured for `root`. An uninitialized
/// project uses the default issues directory.
pub fn open_store(root: &Path) -> anyhow::Result<FileIssueStore> {
    let config = Config::load_or_default(root).context("failed to load config")?;
    Ok(FileIssueStore::new(config.issues_path(root)))
}
