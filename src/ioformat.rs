//! Helpers shared by the per-program readers and writers.
//!
//! [`ptt`] holds the block extractors every reader starts from: it cuts a whole
//! output file into named sections before the section-specific patterns run.

pub mod ptt;
