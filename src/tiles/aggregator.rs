//! Branch grouping and representative build selection.
//!
//! This module turns a flat list of recent builds into one build per
//! branch, suitable for a dashboard tile.

use crate::models::{by_start_date_desc, Build};

/// Group builds by branch name.
///
/// Groups appear in the order their branch is first seen in `builds`, and
/// builds keep their input order within a group.
pub fn group_by_branch(builds: &[Build]) -> Vec<(String, Vec<&Build>)> {
    let mut grouped: Vec<(String, Vec<&Build>)> = Vec::new();

    for build in builds {
        match grouped
            .iter_mut()
            .find(|(branch, _)| *branch == build.branch_name)
        {
            Some((_, group)) => group.push(build),
            None => grouped.push((build.branch_name.clone(), vec![build])),
        }
    }

    grouped
}

/// Pick the build that summarizes one branch.
///
/// The most recently started build wins. If it is still queued or running,
/// the result carries its progress but the status of the most recent
/// finished build on the branch, or an unknown status if there is none.
/// Returns `None` for an empty group.
pub fn representative_build(branch_builds: &[&Build]) -> Option<Build> {
    let mut ordered: Vec<&Build> = branch_builds.to_vec();
    ordered.sort_by(|a, b| by_start_date_desc(a, b));

    let current = *ordered.first()?;
    if current.has_finished() {
        return Some(current.clone());
    }

    let last_finished = ordered.iter().copied().find(|b| b.has_finished());
    Some(current.with_status_of(last_finished))
}

/// Summarize builds into at most `limit` representative builds, one per
/// branch, in branch order.
pub fn summarize_branches(builds: &[Build], limit: usize) -> Vec<Build> {
    group_by_branch(builds)
        .into_iter()
        .filter_map(|(_, group)| representative_build(&group))
        .take(limit)
        .collect()
}

/// Number of distinct branches in `builds`.
pub fn branch_count(builds: &[Build]) -> usize {
    group_by_branch(builds).len()
}
