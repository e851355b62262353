//! Data models for build tiles.
//!
//! This module contains the build records delivered by a build-data
//! provider, the view and tile configuration, and the tile results
//! produced by the aggregator.

use crate::error::ProviderError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Lifecycle state value of a build that has completed.
pub const FINISHED_STATE: &str = "finished";

/// The agent a build ran (or runs) on.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Agent {
    pub id: Option<i64>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

/// Reference to another build (artifact or snapshot dependency).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BuildReference {
    pub id: i64,
    pub build_configuration_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

/// A name/value build property.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub value: String,
}

/// A VCS change included in a build.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Change {
    pub id: i64,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,
}

/// Short description of the build configuration a build belongs to.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BuildConfigurationSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub project_name: String,
}

/// One CI build execution.
///
/// Builds are value records: the aggregator only reads them and builds new
/// records from them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Build {
    pub id: i64,
    pub build_configuration_id: String,
    /// Human-readable build number.
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub branch_name: String,
    #[serde(default)]
    pub is_default_branch: bool,
    /// Lifecycle state (`queued`, `running`, `finished`).
    pub state: String,
    /// Outcome, e.g. `SUCCESS` or `FAILURE`. `None` when unknown.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub status_text: Option<String>,
    #[serde(default)]
    pub queued_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finish_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub percentage_complete: Option<u8>,
    #[serde(default)]
    pub elapsed_seconds: Option<u64>,
    #[serde(default)]
    pub estimated_total_seconds: Option<u64>,
    #[serde(default)]
    pub current_stage_text: Option<String>,
    #[serde(default)]
    pub agent: Option<Agent>,
    #[serde(default)]
    pub artifact_dependencies: Vec<BuildReference>,
    #[serde(default)]
    pub snapshot_dependencies: Vec<BuildReference>,
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(default)]
    pub last_changes: Vec<Change>,
    #[serde(default)]
    pub build_configuration: Option<BuildConfigurationSummary>,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
}

impl Build {
    /// Whether the build has reached the `finished` state (case-insensitive).
    pub fn has_finished(&self) -> bool {
        self.state.eq_ignore_ascii_case(FINISHED_STATE)
    }

    /// Whether the build is currently executing.
    pub fn is_running(&self) -> bool {
        self.state.eq_ignore_ascii_case("running")
    }

    /// Create a copy of this build carrying the status of `last_finished`.
    ///
    /// Every attribute comes from `self` except `status` and `status_text`.
    /// Without a finished build the status is unknown and both are `None`.
    pub fn with_status_of(&self, last_finished: Option<&Build>) -> Build {
        Build {
            status: last_finished.and_then(|b| b.status.clone()),
            status_text: last_finished.and_then(|b| b.status_text.clone()),
            ..self.clone()
        }
    }

    /// Display text for the status, `UNKNOWN` when unset.
    pub fn status_label(&self) -> &str {
        self.status.as_deref().unwrap_or("UNKNOWN")
    }
}

/// Orders builds by start date, most recently started first.
///
/// A build without a start date has never started and sorts as the oldest.
pub fn by_start_date_desc(a: &Build, b: &Build) -> Ordering {
    b.start_date.cmp(&a.start_date)
}

/// A dashboard tile bound to one build configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    /// Label shown on the tile.
    pub label: String,
    /// Build configuration the tile summarizes.
    pub build_configuration_id: String,
}

/// A dashboard view: a named set of tiles plus display limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub name: String,
    /// Maximum number of branches shown per tile.
    #[serde(default = "default_branches_per_tile")]
    pub default_number_of_branches_per_tile: usize,
    #[serde(default)]
    pub tiles: Vec<Tile>,
}

pub(crate) fn default_branches_per_tile() -> usize {
    5
}

impl View {
    /// Create an empty view with the default branch limit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_number_of_branches_per_tile: default_branches_per_tile(),
            tiles: Vec::new(),
        }
    }
}

/// Per-branch summary of one tile.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TileData {
    pub label: String,
    /// One representative build per branch, in branch order.
    pub builds: Vec<Build>,
}

impl TileData {
    /// Creates tile data with no builds.
    pub fn empty(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            builds: Vec::new(),
        }
    }
}

/// A rendered dashboard: every tile of one view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    /// Name of the view.
    pub view: String,
    /// When the tiles were aggregated.
    pub generated_at: DateTime<Utc>,
    /// Tiles in view order.
    pub tiles: Vec<TileData>,
    /// Number of tiles shown empty because their fetch failed.
    pub degraded_tiles: usize,
}

impl Dashboard {
    /// Collect tile outcomes into a dashboard.
    pub fn from_outcomes(view: &View, outcomes: Vec<TileOutcome>) -> Self {
        let degraded_tiles = outcomes.iter().filter(|o| o.is_degraded()).count();
        Self {
            view: view.name.clone(),
            generated_at: Utc::now(),
            tiles: outcomes.into_iter().map(TileOutcome::into_tile_data).collect(),
            degraded_tiles,
        }
    }

    /// Total number of representative builds across tiles.
    pub fn build_count(&self) -> usize {
        self.tiles.iter().map(|t| t.builds.len()).sum()
    }
}

/// Result of aggregating one tile.
#[derive(Debug)]
pub enum TileOutcome {
    /// Builds were fetched and summarized.
    Populated(TileData),
    /// The provider failed; the tile is shown empty.
    Degraded { data: TileData, cause: ProviderError },
}

impl TileOutcome {
    /// The tile data shown to the consumer.
    pub fn tile_data(&self) -> &TileData {
        match self {
            TileOutcome::Populated(data) => data,
            TileOutcome::Degraded { data, .. } => data,
        }
    }

    /// Consume the outcome, dropping any failure cause.
    pub fn into_tile_data(self) -> TileData {
        match self {
            TileOutcome::Populated(data) => data,
            TileOutcome::Degraded { data, .. } => data,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, TileOutcome::Degraded { .. })
    }

    /// The fetch failure, if any.
    pub fn cause(&self) -> Option<&ProviderError> {
        match self {
            TileOutcome::Populated(_) => None,
            TileOutcome::Degraded { cause, .. } => Some(cause),
        }
    }
}

impl fmt::Display for TileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileOutcome::Populated(data) => {
                write!(f, "{} ({} branches)", data.label, data.builds.len())
            }
            TileOutcome::Degraded { data, cause } => {
                write!(f, "{} (degraded: {})", data.label, cause)
            }
        }
    }
}
