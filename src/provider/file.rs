//! File-backed provider.
//!
//! Reads a JSON array of build records from disk. Used for offline runs
//! and for replaying captured build histories.

use super::BuildDataProvider;
use crate::error::ProviderResult;
use crate::models::Build;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

/// Serves builds from a JSON file.
#[derive(Debug, Clone)]
pub struct FileProvider {
    path: PathBuf,
}

impl FileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl BuildDataProvider for FileProvider {
    async fn get_builds_of_build_configuration(
        &self,
        build_configuration_id: &str,
        count: usize,
    ) -> ProviderResult<Vec<Build>> {
        // Re-read on every call so edits show up without a restart
        let content = tokio::fs::read_to_string(&self.path).await?;
        let all: Vec<Build> = serde_json::from_str(&content)?;

        let builds: Vec<Build> = all
            .into_iter()
            .filter(|b| b.build_configuration_id == build_configuration_id)
            .take(count)
            .collect();

        debug!(
            "Read {} builds of {} from {}",
            builds.len(),
            build_configuration_id,
            self.path.display()
        );

        Ok(builds)
    }
}
