//! Pattern construction, searching and casting.
//!
//! The three layers build on each other in a fixed order:
//!
//! ```text
//! pattern  →  find  →  cast
//! (String)    (Capture)  (Value)
//! ```
//!
//! Patterns are plain strings, so they can be concatenated freely with `+` or
//! `format!`. The combinators in [`pattern`] wrap their operands in non-capturing
//! groups wherever precedence would otherwise leak into neighbouring fragments.

pub mod cast;
pub mod error;
pub mod find;
pub mod pattern;

pub use cast::{cast, Cast, Value};
pub use error::{Error, Result};
pub use find::{Capture, Case, Matcher};
