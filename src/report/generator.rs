//! Dashboard rendering.
//!
//! Renders a [`Dashboard`] as plain text for terminals or as JSON for
//! other tools.

use crate::models::{Build, Dashboard, TileData};
use anyhow::Result;

/// Width of the branch column in text output.
const BRANCH_WIDTH: usize = 24;

/// Generate a complete plain-text dashboard.
pub fn generate_text_report(dashboard: &Dashboard) -> String {
    let mut output = String::new();

    output.push_str(&generate_header(dashboard));

    for tile in &dashboard.tiles {
        output.push_str(&generate_tile_section(tile));
    }

    if dashboard.degraded_tiles > 0 {
        output.push_str(&format!(
            "\n{} tile(s) could not be refreshed.\n",
            dashboard.degraded_tiles
        ));
    }

    output
}

fn generate_header(dashboard: &Dashboard) -> String {
    format!(
        "== {} ==  ({})\n\n",
        dashboard.view,
        dashboard.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    )
}

/// Generate the section for one tile.
fn generate_tile_section(tile: &TileData) -> String {
    let mut section = String::new();

    section.push_str(&format!("{}\n", tile.label));

    if tile.builds.is_empty() {
        section.push_str("  (no builds)\n");
    }

    for build in &tile.builds {
        section.push_str(&generate_build_line(build));
    }

    section.push('\n');
    section
}

/// One line per representative build.
fn generate_build_line(build: &Build) -> String {
    let branch = if build.branch_name.is_empty() {
        "<default>"
    } else {
        build.branch_name.as_str()
    };

    let progress = match build.percentage_complete {
        Some(pct) if build.is_running() => format!("running {}%", pct),
        _ => build.state.to_lowercase(),
    };

    let mut line = format!(
        "  {:<width$} #{:<10} {:<14} {}",
        branch,
        build.number,
        progress,
        build.status_label(),
        width = BRANCH_WIDTH
    );

    if let Some(ref text) = build.status_text {
        line.push_str(&format!("  {}", text));
    }
    line.push('\n');

    line
}

/// Generate a JSON dashboard.
pub fn generate_json_report(dashboard: &Dashboard) -> Result<String> {
    serde_json::to_string_pretty(dashboard).map_err(Into::into)
}
