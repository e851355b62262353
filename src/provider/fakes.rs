//! In-memory providers for tests.

use super::BuildDataProvider;
use crate::error::{ProviderError, ProviderResult};
use crate::models::Build;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::sync::Mutex;

/// Returns a fixed list of builds and records every request.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    builds: Vec<Build>,
    requests: Mutex<Vec<(String, usize)>>,
}

impl MemoryProvider {
    pub fn new(builds: Vec<Build>) -> Self {
        Self {
            builds,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests seen so far as `(build_configuration_id, count)`.
    pub fn requests(&self) -> Vec<(String, usize)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl BuildDataProvider for MemoryProvider {
    async fn get_builds_of_build_configuration(
        &self,
        build_configuration_id: &str,
        count: usize,
    ) -> ProviderResult<Vec<Build>> {
        self.requests
            .lock()
            .unwrap()
            .push((build_configuration_id.to_string(), count));
        Ok(self.builds.iter().take(count).cloned().collect())
    }
}

/// Fails every request, or only requests for one build configuration.
#[derive(Debug, Default)]
pub struct FailingProvider {
    pub only_for: Option<String>,
    pub builds: Vec<Build>,
}

#[async_trait]
impl BuildDataProvider for FailingProvider {
    async fn get_builds_of_build_configuration(
        &self,
        build_configuration_id: &str,
        _count: usize,
    ) -> ProviderResult<Vec<Build>> {
        match &self.only_for {
            Some(id) if id != build_configuration_id => Ok(self.builds.clone()),
            _ => Err(ProviderError::Status {
                status: 503,
                body: "Service Unavailable".to_string(),
            }),
        }
    }
}

/// Build fixture: `minute` is the start time in minutes after 10:00.
pub fn build(id: i64, branch: &str, state: &str, status: Option<&str>, minute: u32) -> Build {
    Build {
        id,
        build_configuration_id: "Proj_Build".to_string(),
        number: id.to_string(),
        branch_name: branch.to_string(),
        state: state.to_string(),
        status: status.map(String::from),
        status_text: status.map(|s| format!("{} text #{}", s, id)),
        start_date: Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, minute, 0).unwrap()),
        percentage_complete: if state == "running" { Some(60) } else { None },
        elapsed_seconds: Some(60 * u64::from(minute)),
        estimated_total_seconds: Some(600),
        ..Default::default()
    }
}
