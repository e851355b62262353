//! Tile aggregation.
//!
//! [`TileService`] fetches the recent builds of a tile's build
//! configuration and reduces them to one representative build per branch.
//! A provider failure never escapes: the tile degrades to an empty list.

pub mod aggregator;

pub use aggregator::*;

use crate::models::{Tile, TileData, TileOutcome, View};
use crate::provider::BuildDataProvider;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

/// Number of recent builds fetched per tile, independent of the display
/// limit, so a finished build can be found behind a running one.
pub const FETCH_WINDOW: usize = 20;

/// Produces tile summaries from a build-data provider.
pub struct TileService<P: ?Sized> {
    provider: Arc<P>,
}

impl<P: BuildDataProvider + ?Sized> TileService<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    /// Aggregate one tile, keeping any fetch failure in the outcome.
    pub async fn aggregate(&self, view: &View, tile: &Tile) -> TileOutcome {
        let fetched = self
            .provider
            .get_builds_of_build_configuration(&tile.build_configuration_id, FETCH_WINDOW)
            .await;

        match fetched {
            Ok(builds) => {
                debug!(
                    "Tile '{}': {} builds across {} branches",
                    tile.label,
                    builds.len(),
                    branch_count(&builds)
                );
                TileOutcome::Populated(TileData {
                    label: tile.label.clone(),
                    builds: summarize_branches(
                        &builds,
                        view.default_number_of_branches_per_tile,
                    ),
                })
            }
            Err(cause) => {
                warn!(
                    "Tile '{}' ({}) shown empty: {}",
                    tile.label, tile.build_configuration_id, cause
                );
                TileOutcome::Degraded {
                    data: TileData::empty(tile.label.clone()),
                    cause,
                }
            }
        }
    }

    /// Latest data for one tile. Never fails.
    pub async fn get_latest_tile_data(&self, view: &View, tile: &Tile) -> TileData {
        self.aggregate(view, tile).await.into_tile_data()
    }

    /// Aggregate every tile of a view concurrently, in tile order.
    pub async fn get_dashboard(&self, view: &View) -> Vec<TileOutcome> {
        join_all(view.tiles.iter().map(|tile| self.aggregate(view, tile))).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::models::Build;
    use crate::provider::fakes::{build, FailingProvider, MemoryProvider};

    fn view_with_limit(limit: usize) -> View {
        View {
            name: "Main".to_string(),
            default_number_of_branches_per_tile: limit,
            tiles: vec![tile("Build", "Proj_Build")],
        }
    }

    fn tile(label: &str, id: &str) -> Tile {
        Tile {
            label: label.to_string(),
            build_configuration_id: id.to_string(),
        }
    }

    fn scenario_builds() -> Vec<Build> {
        vec![
            build(3, "main", "running", None, 30),
            build(1, "main", "finished", Some("SUCCESS"), 10),
            build(2, "dev", "finished", Some("FAILURE"), 20),
        ]
    }

    #[tokio::test]
    async fn test_running_main_and_finished_dev() {
        let builds = scenario_builds();
        let service = TileService::new(Arc::new(MemoryProvider::new(builds.clone())));
        let view = view_with_limit(2);

        let data = service
            .get_latest_tile_data(&view, &tile("Build", "Proj_Build"))
            .await;

        assert_eq!(data.label, "Build");
        assert_eq!(data.builds.len(), 2);

        let main = &data.builds[0];
        assert_eq!(main.branch_name, "main");
        assert_eq!(main.id, 3);
        assert_eq!(main.state, "running");
        assert_eq!(main.percentage_complete, Some(60));
        assert_eq!(main.status.as_deref(), Some("SUCCESS"));
        assert_eq!(main.status_text, builds[1].status_text);

        assert_eq!(data.builds[1], builds[2]);
    }

    #[tokio::test]
    async fn test_requests_fixed_fetch_window() {
        let provider = Arc::new(MemoryProvider::new(scenario_builds()));
        let service = TileService::new(Arc::clone(&provider));

        service
            .get_latest_tile_data(&view_with_limit(1), &tile("Build", "Proj_Build"))
            .await;
        service
            .get_latest_tile_data(&view_with_limit(7), &tile("Other", "Proj_Other"))
            .await;

        assert_eq!(
            provider.requests(),
            vec![
                ("Proj_Build".to_string(), FETCH_WINDOW),
                ("Proj_Other".to_string(), FETCH_WINDOW)
            ]
        );
    }

    #[tokio::test]
    async fn test_limit_keeps_first_seen_branch() {
        let service = TileService::new(Arc::new(MemoryProvider::new(vec![
            build(1, "B1", "finished", Some("SUCCESS"), 1),
            build(2, "B2", "finished", Some("SUCCESS"), 2),
        ])));

        let data = service
            .get_latest_tile_data(&view_with_limit(1), &tile("Build", "Proj_Build"))
            .await;

        assert_eq!(data.builds.len(), 1);
        assert_eq!(data.builds[0].branch_name, "B1");
    }

    #[tokio::test]
    async fn test_provider_failure_degrades_to_empty_tile() {
        let service = TileService::new(Arc::new(FailingProvider::default()));
        let view = view_with_limit(3);
        let t = tile("Nightly", "Proj_Nightly");

        let outcome = service.aggregate(&view, &t).await;
        assert!(outcome.is_degraded());
        assert!(matches!(
            outcome.cause(),
            Some(ProviderError::Status { status: 503, .. })
        ));

        let data = service.get_latest_tile_data(&view, &t).await;
        assert_eq!(data, TileData::empty("Nightly"));
    }

    #[tokio::test]
    async fn test_empty_history_is_populated_but_empty() {
        let service = TileService::new(Arc::new(MemoryProvider::new(Vec::new())));

        let outcome = service
            .aggregate(&view_with_limit(3), &tile("Build", "Proj_Build"))
            .await;

        assert!(!outcome.is_degraded());
        assert!(outcome.tile_data().builds.is_empty());
    }

    #[tokio::test]
    async fn test_repeated_calls_are_identical() {
        let service = TileService::new(Arc::new(MemoryProvider::new(scenario_builds())));
        let view = view_with_limit(5);
        let t = tile("Build", "Proj_Build");

        let first = service.get_latest_tile_data(&view, &t).await;
        let second = service.get_latest_tile_data(&view, &t).await;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_dashboard_isolates_failing_tile() {
        let provider: Arc<dyn BuildDataProvider> = Arc::new(FailingProvider {
            only_for: Some("Proj_Broken".to_string()),
            builds: scenario_builds(),
        });
        let service = TileService::new(provider);

        let view = View {
            name: "Wall".to_string(),
            default_number_of_branches_per_tile: 5,
            tiles: vec![
                tile("Build", "Proj_Build"),
                tile("Broken", "Proj_Broken"),
                tile("Deploy", "Proj_Deploy"),
            ],
        };

        let outcomes = service.get_dashboard(&view).await;
        let labels: Vec<&str> = outcomes
            .iter()
            .map(|o| o.tile_data().label.as_str())
            .collect();

        assert_eq!(labels, vec!["Build", "Broken", "Deploy"]);
        assert!(!outcomes[0].is_degraded());
        assert!(outcomes[1].is_degraded());
        assert!(outcomes[1].tile_data().builds.is_empty());
        assert_eq!(outcomes[2].tile_data().builds.len(), 2);
    }

    #[test]
    fn test_blocking_aggregation() {
        let service = TileService::new(Arc::new(MemoryProvider::new(scenario_builds())));
        let data = tokio_test::block_on(
            service.get_latest_tile_data(&view_with_limit(0), &tile("Build", "Proj_Build")),
        );
        assert_eq!(data.label, "Build");
        assert!(data.builds.is_empty());
    }
}
