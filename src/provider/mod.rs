//! Build-data providers.
//!
//! A provider returns the most recent builds of one build configuration.
//! Network access, authentication and timeouts all live behind this seam.

pub mod file;
pub mod teamcity;

#[cfg(test)]
pub mod fakes;

pub use file::FileProvider;
pub use teamcity::{TeamCityClient, TeamCityConfig};

use crate::error::ProviderResult;
use crate::models::Build;
use async_trait::async_trait;
use std::sync::Arc;

/// Source of recent build records.
#[async_trait]
pub trait BuildDataProvider: Send + Sync {
    /// Fetch up to `count` recent builds of a build configuration.
    ///
    /// Builds come back in the order the CI system delivers them, which is
    /// not guaranteed to be sorted by date.
    async fn get_builds_of_build_configuration(
        &self,
        build_configuration_id: &str,
        count: usize,
    ) -> ProviderResult<Vec<Build>>;
}

#[async_trait]
impl<P: BuildDataProvider + ?Sized> BuildDataProvider for Arc<P> {
    async fn get_builds_of_build_configuration(
        &self,
        build_configuration_id: &str,
        count: usize,
    ) -> ProviderResult<Vec<Build>> {
        (**self)
            .get_builds_of_build_configuration(build_configuration_id, count)
            .await
    }
}
