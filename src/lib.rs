//! # autoio
//!
//! Text-processing core shared by the readers and writers that drive external
//! computational chemistry programs.
//!
//! File Layout
//!
//! src/
//!   ├── autoparse    Pattern construction, searching and value casting
//!   │     ├── pattern   Composable regex fragments and lexical constants
//!   │     ├── find      Match, capture, split and replace over a subject string
//!   │     └── cast      Typing of raw captures into [`autoparse::Value`]
//!   └── ioformat     Higher-level helpers built on autoparse
//!         └── ptt       Block and section extraction (named, sigil, parenthesis, index lines)
//!
//! Every operation is a pure function of its arguments. Absence of a match is an
//! ordinary `None` or empty result; only malformed patterns or malformed numeric
//! tokens produce an [`autoparse::Error`].

pub mod autoparse;
pub mod ioformat;
