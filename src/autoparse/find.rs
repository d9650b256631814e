//! Finder
//!
//! Applies patterns to a subject string: tests for a match, extracts captures,
//! splits, replaces.
//!
//! ## Matching mode
//!
//! Every search runs in multi-line mode, so [`LINE_START`](super::pattern::LINE_START)
//! and [`LINE_END`](super::pattern::LINE_END) anchor at line boundaries while
//! [`STRING_START`](super::pattern::STRING_START) and
//! [`STRING_END`](super::pattern::STRING_END) anchor at the ends of the subject.
//!
//! ## Results
//!
//! - No match is `Ok(None)` (or an empty `Vec`); callers branch on it.
//! - A pattern the engine rejects is `Err(Error::InvalidPattern)`.
//! - Asking for captures from a pattern without groups is `Err(Error::NoCaptureGroups)`.
//!
//! The free functions are case-sensitive and compile their pattern on each call.
//! Build a [`Matcher`] to reuse a compiled pattern or to match without regard to case.

use std::collections::BTreeMap;
use std::ops::Range;

use fancy_regex::{Captures, Regex, RegexBuilder};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::error::{Error, Result};
use super::pattern::{NUMBER, STRING_END, STRING_START};

/// Step budget for patterns that need the backtracking engine (lookaround and
/// backreferences). Patterns without those features never backtrack.
pub const BACKTRACK_LIMIT: usize = 100_000_000;

static NUMBER_REGEX: Lazy<regex::Regex> =
    Lazy::new(|| regex::Regex::new(&format!(r"\A(?:{})\z", *NUMBER)).unwrap());

/// Letter-case handling for a search.
///
/// Deserializes from `"sensitive"` or `"insensitive"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Case {
    #[default]
    Sensitive,
    Insensitive,
}

/// The captured text of one match.
///
/// A pattern with a single group produces [`Capture::Single`]; a pattern with
/// several groups produces [`Capture::Group`] with one entry per group, in group
/// order. A group that did not take part in the match contributes `""`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Capture {
    Single(String),
    Group(Vec<String>),
}

impl Capture {
    /// The capture as one string, if the pattern had a single group.
    pub fn as_single(&self) -> Option<&str> {
        match self {
            Capture::Single(s) => Some(s),
            Capture::Group(_) => None,
        }
    }

    /// All captured strings in group order.
    pub fn values(&self) -> &[String] {
        match self {
            Capture::Single(s) => std::slice::from_ref(s),
            Capture::Group(values) => values,
        }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.values().get(index).map(String::as_str)
    }

    pub fn into_values(self) -> Vec<String> {
        match self {
            Capture::Single(s) => vec![s],
            Capture::Group(values) => values,
        }
    }
}

impl From<&str> for Capture {
    fn from(s: &str) -> Self {
        Capture::Single(s.to_string())
    }
}

impl<S: Into<String>> From<Vec<S>> for Capture {
    fn from(values: Vec<S>) -> Self {
        Capture::Group(values.into_iter().map(Into::into).collect())
    }
}

// ============================================================================
// MATCHER
// ============================================================================

/// A compiled pattern.
///
/// Carries every finder operation as a method, so one compilation can serve many
/// subjects. It is also the predicate returned by [`matcher`].
#[derive(Debug, Clone)]
pub struct Matcher {
    pattern: String,
    case: Case,
    regex: Regex,
}

impl Matcher {
    /// Compile `pattern` for case-sensitive matching.
    pub fn new(pattern: &str) -> Result<Self> {
        Self::with_case(pattern, Case::Sensitive)
    }

    pub fn with_case(pattern: &str, case: Case) -> Result<Self> {
        let flags = match case {
            Case::Sensitive => "(?m)",
            Case::Insensitive => "(?mi)",
        };
        let regex = RegexBuilder::new(&format!("{}{}", flags, pattern))
            .backtrack_limit(BACKTRACK_LIMIT)
            .build()
            .map_err(|e| Error::invalid_pattern(pattern, e))?;
        Ok(Self {
            pattern: pattern.to_string(),
            case,
            regex,
        })
    }

    /// The pattern as given, without the mode flags.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Number of capturing groups in the pattern.
    pub fn group_count(&self) -> usize {
        self.regex.captures_len() - 1
    }

    pub fn case(&self) -> Case {
        self.case
    }

    /// Whether `subject` contains a match anywhere.
    pub fn is_match(&self, subject: &str) -> Result<bool> {
        self.regex
            .is_match(subject)
            .map_err(|e| Error::engine(&self.pattern, e))
    }

    /// Whether the whole of `subject` matches.
    pub fn full_match(&self, subject: &str) -> Result<bool> {
        Matcher::with_case(&full_pattern(&self.pattern), self.case)?.is_match(subject)
    }

    /// Whether a match begins at the start of `subject`.
    pub fn starts_with(&self, subject: &str) -> Result<bool> {
        Matcher::with_case(&prefix_pattern(&self.pattern), self.case)?.is_match(subject)
    }

    /// Whether a match ends at the end of `subject`.
    pub fn ends_with(&self, subject: &str) -> Result<bool> {
        Matcher::with_case(&suffix_pattern(&self.pattern), self.case)?.is_match(subject)
    }

    /// Captures of the leftmost match.
    pub fn first_capture(&self, subject: &str) -> Result<Option<Capture>> {
        self.require_groups()?;
        let caps = self
            .regex
            .captures(subject)
            .map_err(|e| Error::engine(&self.pattern, e))?;
        Ok(caps.map(|caps| self.capture_from(&caps)))
    }

    /// Captures and byte span of the leftmost match at or after byte `start`.
    ///
    /// Anchors see the whole subject, so `^` still only matches at a line start.
    /// Without capturing groups the capture is the whole match.
    pub fn first_capture_at(
        &self,
        subject: &str,
        start: usize,
    ) -> Result<Option<(Capture, Range<usize>)>> {
        let caps = self
            .regex
            .captures_from_pos(subject, start)
            .map_err(|e| Error::engine(&self.pattern, e))?;
        Ok(caps.map(|caps| {
            let span = caps.get(0).map_or(start..start, |m| m.start()..m.end());
            (self.capture_from(&caps), span)
        }))
    }

    /// Captures of every non-overlapping match, left to right.
    ///
    /// Without capturing groups each entry is the whole match.
    pub fn all_captures(&self, subject: &str) -> Result<Option<Vec<Capture>>> {
        let mut captures = Vec::new();
        for caps in self.regex.captures_iter(subject) {
            let caps = caps.map_err(|e| Error::engine(&self.pattern, e))?;
            captures.push(self.capture_from(&caps));
        }
        Ok(if captures.is_empty() {
            None
        } else {
            Some(captures)
        })
    }

    /// Like [`Matcher::all_captures`], with the byte span of each whole match.
    pub fn all_captures_with_spans(&self, subject: &str) -> Result<Vec<(Capture, Range<usize>)>> {
        let mut found = Vec::new();
        for caps in self.regex.captures_iter(subject) {
            let caps = caps.map_err(|e| Error::engine(&self.pattern, e))?;
            let span = caps.get(0).map_or(0..0, |m| m.start()..m.end());
            found.push((self.capture_from(&caps), span));
        }
        Ok(found)
    }

    /// Captures of the rightmost non-overlapping match.
    pub fn last_capture(&self, subject: &str) -> Result<Option<Capture>> {
        self.require_groups()?;
        Ok(self
            .all_captures(subject)?
            .and_then(|mut captures| captures.pop()))
    }

    /// Named groups of the leftmost match, keyed by group name.
    pub fn first_named_capture(&self, subject: &str) -> Result<Option<BTreeMap<String, String>>> {
        let caps = self
            .regex
            .captures(subject)
            .map_err(|e| Error::engine(&self.pattern, e))?;
        Ok(caps.map(|caps| self.named_from(&caps)))
    }

    /// Named groups of every non-overlapping match.
    pub fn all_named_captures(
        &self,
        subject: &str,
    ) -> Result<Option<Vec<BTreeMap<String, String>>>> {
        let mut named = Vec::new();
        for caps in self.regex.captures_iter(subject) {
            let caps = caps.map_err(|e| Error::engine(&self.pattern, e))?;
            named.push(self.named_from(&caps));
        }
        Ok(if named.is_empty() { None } else { Some(named) })
    }

    /// Pieces of `subject` between matches. Empty pieces are kept.
    pub fn split(&self, subject: &str) -> Result<Vec<String>> {
        let mut pieces = Vec::new();
        let mut last = 0;
        for m in self.regex.find_iter(subject) {
            let m = m.map_err(|e| Error::engine(&self.pattern, e))?;
            pieces.push(subject[last..m.start()].to_string());
            last = m.end();
        }
        pieces.push(subject[last..].to_string());
        Ok(pieces)
    }

    /// Replace every match with `replacement`, taken literally.
    pub fn replace(&self, replacement: &str, subject: &str) -> Result<String> {
        let mut out = String::with_capacity(subject.len());
        let mut last = 0;
        for m in self.regex.find_iter(subject) {
            let m = m.map_err(|e| Error::engine(&self.pattern, e))?;
            out.push_str(&subject[last..m.start()]);
            out.push_str(replacement);
            last = m.end();
        }
        out.push_str(&subject[last..]);
        Ok(out)
    }

    pub fn remove(&self, subject: &str) -> Result<String> {
        self.replace("", subject)
    }

    fn require_groups(&self) -> Result<()> {
        if self.group_count() == 0 {
            return Err(Error::NoCaptureGroups {
                pattern: self.pattern.clone(),
            });
        }
        Ok(())
    }

    fn capture_from(&self, caps: &Captures<'_>) -> Capture {
        let text = |i: usize| caps.get(i).map_or("", |m| m.as_str()).to_string();
        match self.group_count() {
            0 => Capture::Single(text(0)),
            1 => Capture::Single(text(1)),
            n => Capture::Group((1..=n).map(text).collect()),
        }
    }

    fn named_from(&self, caps: &Captures<'_>) -> BTreeMap<String, String> {
        self.regex
            .capture_names()
            .flatten()
            .map(|name| {
                let value = caps.name(name).map_or("", |m| m.as_str());
                (name.to_string(), value.to_string())
            })
            .collect()
    }
}

// ============================================================================
// PREDICATES
// ============================================================================

/// Compile `pattern` into a reusable predicate.
pub fn matcher(pattern: &str, case: Case) -> Result<Matcher> {
    Matcher::with_case(pattern, case)
}

pub fn has_match(pattern: &str, subject: &str) -> Result<bool> {
    Matcher::new(pattern)?.is_match(subject)
}

/// Whether the whole of `subject` matches `pattern`.
pub fn full_match(pattern: &str, subject: &str) -> Result<bool> {
    has_match(&full_pattern(pattern), subject)
}

pub fn starts_with(pattern: &str, subject: &str) -> Result<bool> {
    has_match(&prefix_pattern(pattern), subject)
}

pub fn ends_with(pattern: &str, subject: &str) -> Result<bool> {
    has_match(&suffix_pattern(pattern), subject)
}

fn full_pattern(pattern: &str) -> String {
    format!("{}(?:{}){}", STRING_START, pattern, STRING_END)
}

fn prefix_pattern(pattern: &str) -> String {
    format!("{}(?:{})", STRING_START, pattern)
}

fn suffix_pattern(pattern: &str) -> String {
    format!("(?:{}){}", pattern, STRING_END)
}

/// Whether `subject`, ignoring surrounding whitespace, is a single numeric literal.
pub fn is_number(subject: &str) -> bool {
    NUMBER_REGEX.is_match(subject.trim())
}

// ============================================================================
// CAPTURES
// ============================================================================

pub fn first_capture(pattern: &str, subject: &str) -> Result<Option<Capture>> {
    Matcher::new(pattern)?.first_capture(subject)
}

pub fn all_captures(pattern: &str, subject: &str) -> Result<Option<Vec<Capture>>> {
    Matcher::new(pattern)?.all_captures(subject)
}

pub fn last_capture(pattern: &str, subject: &str) -> Result<Option<Capture>> {
    Matcher::new(pattern)?.last_capture(subject)
}

pub fn first_named_capture(
    pattern: &str,
    subject: &str,
) -> Result<Option<BTreeMap<String, String>>> {
    Matcher::new(pattern)?.first_named_capture(subject)
}

pub fn all_named_captures(
    pattern: &str,
    subject: &str,
) -> Result<Option<Vec<BTreeMap<String, String>>>> {
    Matcher::new(pattern)?.all_named_captures(subject)
}

// ============================================================================
// PRIORITY RESOLUTION
// ============================================================================

/// The first of `patterns`, in list order, that matches anywhere in `subject`.
///
/// Used to classify a token before capturing it, e.g. deciding whether a value
/// is written as an exponential float, a float or an integer.
pub fn first_matching_pattern<'p, P: AsRef<str>>(
    patterns: &'p [P],
    subject: &str,
    case: Case,
) -> Result<Option<&'p str>> {
    Ok(first_matching(patterns, subject, case)?.map(|(pattern, _)| pattern))
}

pub fn first_matching_pattern_all_captures<P: AsRef<str>>(
    patterns: &[P],
    subject: &str,
    case: Case,
) -> Result<Option<Vec<Capture>>> {
    match first_matching(patterns, subject, case)? {
        Some((_, matcher)) => matcher.all_captures(subject),
        None => Ok(None),
    }
}

pub fn first_matching_pattern_first_capture<P: AsRef<str>>(
    patterns: &[P],
    subject: &str,
    case: Case,
) -> Result<Option<Capture>> {
    match first_matching(patterns, subject, case)? {
        Some((_, matcher)) => matcher.first_capture(subject),
        None => Ok(None),
    }
}

pub fn first_matching_pattern_last_capture<P: AsRef<str>>(
    patterns: &[P],
    subject: &str,
    case: Case,
) -> Result<Option<Capture>> {
    match first_matching(patterns, subject, case)? {
        Some((_, matcher)) => matcher.last_capture(subject),
        None => Ok(None),
    }
}

fn first_matching<'p, P: AsRef<str>>(
    patterns: &'p [P],
    subject: &str,
    case: Case,
) -> Result<Option<(&'p str, Matcher)>> {
    for pattern in patterns {
        let pattern = pattern.as_ref();
        let matcher = Matcher::with_case(pattern, case)?;
        if matcher.is_match(subject)? {
            return Ok(Some((pattern, matcher)));
        }
    }
    Ok(None)
}

// ============================================================================
// SPLITTING AND EDITING
// ============================================================================

pub fn split(pattern: &str, subject: &str) -> Result<Vec<String>> {
    Matcher::new(pattern)?.split(subject)
}

/// Whitespace-separated words.
pub fn split_words(subject: &str) -> Vec<String> {
    subject.split_whitespace().map(str::to_string).collect()
}

/// Lines of `subject`, skipping empty ones.
pub fn split_lines(subject: &str) -> Vec<String> {
    subject
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// `subject` without its whitespace-only lines. Other lines are kept verbatim,
/// line endings included.
pub fn remove_empty_lines(subject: &str) -> String {
    subject
        .split_inclusive('\n')
        .filter(|line| !line.trim().is_empty())
        .collect()
}

pub fn strip_spaces(subject: &str) -> &str {
    subject.trim()
}

/// Replace every match of `pattern` with the literal `replacement`.
pub fn replace(pattern: &str, replacement: &str, subject: &str) -> Result<String> {
    Matcher::new(pattern)?.replace(replacement, subject)
}

pub fn remove(pattern: &str, subject: &str) -> Result<String> {
    Matcher::new(pattern)?.remove(subject)
}
