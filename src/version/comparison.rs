//! Version-aware ordering for release tags and reported server versions.
//!
//! Both sides are first parsed as SemVer after stripping a leading `v`. Tags
//! that are not valid SemVer (`1.106`, `1.2.3.4`, `2024.10`) fall back to a
//! per-segment comparison:
//!
//! - segments are split on `.`, `-` and `+`;
//! - numeric segments compare numerically, so `1.10` > `1.9`;
//! - a missing trailing segment counts as `0`, so `1.2` == `1.2.0`;
//! - a numeric segment sorts after a non-numeric one, and two non-numeric
//!   segments compare lexically.
//!
//! # Examples
//!
//! ```rust
//! use immich_autoupdate::version::comparison::{is_newer, strip_v};
//!
//! assert!(is_newer("1.9.0", "1.10.0"));
//! assert!(!is_newer("1.2.3", "v1.2.3"));
//! assert_eq!(strip_v("v1.2.3"), "1.2.3");
//! ```

use semver::Version;
use std::cmp::Ordering;

/// Remove one leading `v`/`V` and surrounding whitespace.
#[must_use]
pub fn strip_v(version: &str) -> &str {
    let trimmed = version.trim();
    trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed)
}

/// Total order between two version strings.
#[must_use]
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let (a, b) = (strip_v(a), strip_v(b));

    match (Version::parse(a), Version::parse(b)) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => compare_segments(a, b),
    }
}

/// Whether `latest` is strictly greater than `current`.
#[must_use]
pub fn is_newer(current: &str, latest: &str) -> bool {
    compare_versions(latest, current) == Ordering::Greater
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Segment<'a> {
    // Variant order is the ordering: text sorts before numbers
    Text(&'a str),
    Number(u64),
}

fn segments(version: &str) -> Vec<Segment<'_>> {
    version
        .split(['.', '-', '+'])
        .map(|part| part.parse().map_or(Segment::Text(part), Segment::Number))
        .collect()
}

fn compare_segments(a: &str, b: &str) -> Ordering {
    let (a, b) = (segments(a), segments(b));
    let len = a.len().max(b.len());

    (0..len)
        .map(|i| {
            let left = a.get(i).unwrap_or(&Segment::Number(0));
            let right = b.get(i).unwrap_or(&Segment::Number(0));
            left.cmp(right)
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}
