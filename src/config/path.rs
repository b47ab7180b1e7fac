//! Dotted-path resolution over a configuration tree.
//!
//! A path such as `system.database.name` is split on `.` and each segment
//! selects a key of the current mapping. Resolution stops at the first
//! segment that is missing or that would have to descend into a non-mapping.

use super::value::Value;

/// Splits a dotted path into its segments.
pub fn segments(path: &str) -> std::str::Split<'_, char> {
    path.split('.')
}

/// Walks `root` along `path`, returning the value it points at.
///
/// Returns `None` as soon as a segment cannot be followed; the remaining
/// segments are not examined.
pub fn resolve<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    segments(path).try_fold(root, |current, segment| current.get(segment))
}
