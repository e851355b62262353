//! BuildTiles - per-branch CI build summaries for dashboard tiles.
//!
//! The library reduces the recent builds of a build configuration to one
//! representative build per branch. Builds come from a
//! [`provider::BuildDataProvider`]; [`tiles::TileService`] does the
//! grouping and never lets a provider failure escape.

pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod provider;
pub mod report;
pub mod tiles;

pub use error::{ProviderError, ProviderResult};
pub use models::{Build, Dashboard, Tile, TileData, TileOutcome, View};
pub use provider::BuildDataProvider;
pub use tiles::{TileService, FETCH_WINDOW};
