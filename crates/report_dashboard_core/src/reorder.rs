//! crates/report_dashboard_core/src/reorder.rs
//!
//! Pure helpers that compute a new display order for the report list.

use std::collections::{HashMap, HashSet};

use crate::domain::Report;

/// Moves the item identified by `active_id` to the position currently held by
/// `over_id`, shifting the items in between.
///
/// Returns `None` when either id is unknown or both ids are the same, which
/// callers treat as "nothing to do".
pub fn move_item<T, F>(items: &[T], get_id: F, active_id: &str, over_id: &str) -> Option<Vec<T>>
where
    T: Clone,
    F: Fn(&T) -> &str,
{
    if active_id == over_id {
        return None;
    }
    let old_index = items.iter().position(|item| get_id(item) == active_id)?;
    let new_index = items.iter().position(|item| get_id(item) == over_id)?;

    let mut reordered = items.to_vec();
    let moved = reordered.remove(old_index);
    reordered.insert(new_index, moved);
    Some(reordered)
}

pub fn move_report(reports: &[Report], active_id: &str, over_id: &str) -> Option<Vec<Report>> {
    move_item(reports, |r| r.id.as_str(), active_id, over_id)
}

/// Rebuilds `reports` in the order given by `ids`.
///
/// Unknown and repeated ids are skipped. Unlike a plain list replacement,
/// reports not named in `ids` are not dropped: they keep their relative order
/// and are placed after the named ones.
pub fn reorder_by_ids<I, S>(reports: &[Report], ids: I) -> Vec<Report>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let by_id: HashMap<&str, &Report> = reports.iter().map(|r| (r.id.as_str(), r)).collect();
    let mut placed: HashSet<&str> = HashSet::with_capacity(reports.len());
    let mut ordered = Vec::with_capacity(reports.len());

    for id in ids {
        if let Some(report) = by_id.get(id.as_ref()) {
            if placed.insert(report.id.as_str()) {
                ordered.push((*report).clone());
            }
        }
    }

    ordered.extend(
        reports
            .iter()
            .filter(|r| !placed.contains(r.id.as_str()))
            .cloned(),
    );
    ordered
}
