//! Parser for the `KEY=value` settings file.
//!
//! The settings file started life as a shell fragment that the old cron
//! script `source`d, so the parser accepts the subset of shell assignment
//! syntax those files actually use:
//!
//! ```text
//! # comment
//! IMMICH_DIR=/opt/immich-app
//! export IMMICH_HOST=127.0.0.1:2283
//! IMMICH_API_KEY="abc def"        # quotes are stripped
//! GOTIFY_TOKEN='A.b$c'            # no expansion inside quotes
//! EMAIL_FROM="Immich \"nas\" <nas@example.com>"
//! IMMICH_DIR="/opt"/immich-app    # parts of one word are joined
//! MIN_RELEASE_AGE_DAYS=7 # trailing comments on unquoted values
//! ```
//!
//! No variable expansion happens here; path-valued keys are expanded by the
//! loader with `shellexpand`.

use crate::core::UpdaterError;
use std::collections::BTreeMap;

/// A parsed settings file: key to last assigned value.
pub type Entries = BTreeMap<String, String>;

/// Parse settings text into key/value entries.
///
/// A key assigned twice keeps its last value, matching what `source` did.
///
/// # Errors
///
/// Returns [`UpdaterError::ConfigInvalid`] naming the 1-based line number for
/// lines without `=`, with an empty or malformed key, or with an
/// unterminated quote or trailing backslash.
pub fn parse_entries(content: &str) -> Result<Entries, UpdaterError> {
    let mut entries = Entries::new();

    for (index, raw) in content.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line = line.strip_prefix("export ").map_or(line, str::trim_start);
        let Some((key, value)) = line.split_once('=') else {
            return Err(invalid(line_no, "expected KEY=value"));
        };

        let key = key.trim();
        if !is_valid_key(key) {
            return Err(invalid(line_no, &format!("invalid key '{key}'")));
        }

        let value = parse_value(value.trim()).map_err(|what| invalid(line_no, what))?;
        entries.insert(key.to_string(), value);
    }

    Ok(entries)
}

/// One shell word: quoted and unquoted parts joined, quotes removed.
///
/// Inside double quotes a backslash escapes `"`, `\`, `$` and `` ` ``;
/// outside quotes it escapes any character. Single quotes are literal.
/// Unquoted whitespace is kept between parts and trimmed at the end, and a
/// `#` after unquoted whitespace starts a comment.
fn parse_value(value: &str) -> Result<String, &'static str> {
    let mut out = String::new();
    let mut pending_space = String::new();
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                pending_space.push(c);
                continue;
            }
            '#' if !pending_space.is_empty() => return Ok(out),
            _ => {}
        }
        out.push_str(&pending_space);
        pending_space.clear();

        match c {
            '\'' => loop {
                match chars.next() {
                    Some('\'') => break,
                    Some(c) => out.push(c),
                    None => return Err("unterminated quote"),
                }
            },
            '"' => loop {
                match chars.next() {
                    Some('"') => break,
                    Some('\\') => match chars.next() {
                        Some(c @ ('"' | '\\' | '$' | '`')) => out.push(c),
                        Some(c) => {
                            out.push('\\');
                            out.push(c);
                        }
                        None => return Err("unterminated quote"),
                    },
                    Some(c) => out.push(c),
                    None => return Err("unterminated quote"),
                }
            },
            '\\' => match chars.next() {
                Some(c) => out.push(c),
                None => return Err("trailing backslash"),
            },
            c => out.push(c),
        }
    }

    Ok(out)
}

fn is_valid_key(key: &str) -> bool {
    let mut chars = key.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn invalid(line_no: usize, what: &str) -> UpdaterError {
    UpdaterError::ConfigInvalid {
        reason: format!("line {line_no}: {what}"),
    }
}
