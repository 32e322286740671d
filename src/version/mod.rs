//! Version handling.
//!
//! Release tags and the version reported by the running server are compared
//! with [`comparison::compare_versions`], never with string equality: `1.10.0`
//! must sort after `1.9.0`.

pub mod comparison;

pub use comparison::{compare_versions, is_newer, strip_v};
