//! Whether a release should be installed.
//!
//! The decision is a pure function of the two versions, the publish date,
//! today's date, and the release notes. The checks run in a fixed order:
//!
//! 1. the release must be at least `min_days` old (whole calendar days);
//! 2. its notes must not mention a risk keyword;
//! 3. it must be newer than what is running.
//!
//! A blocked release is reported even when it is already installed.

use chrono::NaiveDate;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::constants::RISK_KEYWORDS;
use crate::version::is_newer;

static RISK_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    let alternatives = RISK_KEYWORDS
        .iter()
        .map(|keyword| {
            keyword
                .split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("(?i){alternatives}")).ok()
});

/// What a run should do with the latest release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The running version is the latest (or newer).
    UpToDate,
    /// Published too recently to be trusted.
    SkipTooRecent {
        /// Whole days since publication; negative if the date is in the future
        days_since_release: i64,
        /// Required age
        min_days: i64,
    },
    /// Old enough, but the notes need a human.
    BlockedBreakingChange {
        /// First keyword found, in lowercase canonical form
        keyword: String,
    },
    /// Install it.
    Update,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UpToDate => write!(f, "up to date"),
            Self::SkipTooRecent {
                days_since_release,
                min_days,
            } => {
                write!(f, "release is {days_since_release} day(s) old, waiting for {min_days}")
            }
            Self::BlockedBreakingChange { keyword } => {
                write!(f, "release notes mention '{keyword}'")
            }
            Self::Update => write!(f, "update"),
        }
    }
}

/// First risk keyword in `notes`, lowercased with single spaces.
#[must_use]
pub fn find_risk_keyword(notes: &str) -> Option<String> {
    let pattern = RISK_PATTERN.as_ref()?;
    pattern.find(notes).map(|found| {
        found
            .as_str()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    })
}

/// Decide what to do with release `latest` given the running `current`.
#[must_use]
pub fn decide(
    latest: &str,
    current: &str,
    published_on: NaiveDate,
    today: NaiveDate,
    release_notes: &str,
    min_days: i64,
) -> Decision {
    let days_since_release = (today - published_on).num_days();
    if days_since_release < min_days {
        return Decision::SkipTooRecent {
            days_since_release,
            min_days,
        };
    }

    if let Some(keyword) = find_risk_keyword(release_notes) {
        return Decision::BlockedBreakingChange { keyword };
    }

    if is_newer(current, latest) {
        Decision::Update
    } else {
        Decision::UpToDate
    }
}
