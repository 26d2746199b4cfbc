//! Sanitizing of per-website access rule lists.
//!
//! Website configuration carries caller supplied `rules`, `ignore` and
//! `runners` lists. They are capped before storage so a single website can't
//! grow unbounded audit configuration.

use crate::types::Runner;

/// Maximum number of entries kept in a `rules` or `ignore` list.
pub const MAX_RULE_ENTRIES: usize = 250;

/// Entries this long or longer are dropped.
pub const MAX_RULE_LENGTH: usize = 200;

/// Maximum number of runners kept.
pub const MAX_RUNNERS: usize = 4;

/// Truncate a rule list to [`MAX_RULE_ENTRIES`] and drop empty or oversized entries.
///
/// Truncation happens first, so a list of 300 entries never yields more
/// than 250 even if some of the first 250 are dropped.
#[must_use]
pub fn sanitize_rules<S: AsRef<str>>(rules: &[S]) -> Vec<String> {
    rules
        .iter()
        .take(MAX_RULE_ENTRIES)
        .map(AsRef::as_ref)
        .filter(|rule| !rule.is_empty() && rule.len() < MAX_RULE_LENGTH)
        .map(ToString::to_string)
        .collect()
}

/// Keep only known runner names, capped at [`MAX_RUNNERS`].
///
/// Order is preserved and duplicates are not collapsed.
#[must_use]
pub fn sanitize_runners<S: AsRef<str>>(runners: &[S]) -> Vec<Runner> {
    runners
        .iter()
        .filter_map(|name| Runner::parse(name.as_ref()))
        .take(MAX_RUNNERS)
        .collect()
}
