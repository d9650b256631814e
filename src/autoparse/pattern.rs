//! Pattern DSL
//!
//! Functions that compose regular-expression fragments, plus a table of named
//! fragments for the lexical classes that show up in program output (numbers,
//! identifiers, whitespace runs).
//!
//! ## Design
//!
//! A pattern is just a `String`. Concatenating two patterns must never change
//! what either of them means, so every combinator inspects its operand and adds a
//! non-capturing group `(?:...)` when the operand would otherwise bind wrongly:
//!
//! ```text
//! maybe("[0-9]")     →  [0-9]?           single atom, no group needed
//! maybe("[0-9]+")    →  (?:[0-9]+)?      quantified, grouped
//! series("a|b", ",") →  (?:a|b)(?:,(?:a|b))*
//! ```
//!
//! ## Alternation order
//!
//! [`one_of_these`] keeps the order of its list, and the backend resolves overlaps
//! by taking the first alternative that matches at a position (leftmost-first).
//! [`NUMBER`] depends on that: exponential forms are listed before the plain float,
//! which is listed before the plain integer, so `1.5E3` is never split into `1.5`.
//!
//! ## Constants
//!
//! Single-token classes are `&'static str` constants. Composite ones are built once
//! from the combinators on first use and never change afterwards.

use once_cell::sync::Lazy;

// ============================================================================
// BOUNDARIES AND WILDCARDS
// ============================================================================

/// Start of the whole subject.
pub const STRING_START: &str = r"\A";
/// End of the whole subject.
pub const STRING_END: &str = r"\z";
/// Start of a line (searches run in multi-line mode).
pub const LINE_START: &str = "^";
/// End of a line (searches run in multi-line mode).
pub const LINE_END: &str = "$";

/// Any character, newlines included.
pub const WILDCARD: &str = r"[\s\S]";
/// Any character except a newline.
pub const NONNEWLINE: &str = r"[^\n]";
pub const NEWLINE: &str = r"\n";

// ============================================================================
// WHITESPACE
// ============================================================================

/// Any whitespace character, newlines included.
pub const SPACE: &str = r"\s";
/// A space or tab; never crosses a line.
pub const LINESPACE: &str = r"[ \t]";
pub const NONSPACE: &str = r"\S";

/// One or more whitespace characters.
pub static SPACES: Lazy<String> = Lazy::new(|| one_or_more(SPACE));
/// Zero or more whitespace characters.
pub static MAYBE_SPACES: Lazy<String> = Lazy::new(|| zero_or_more(SPACE));
/// One or more spaces or tabs.
pub static LINESPACES: Lazy<String> = Lazy::new(|| one_or_more(LINESPACE));
/// The rest of the current line, possibly empty.
pub static LINE_FILL: Lazy<String> = Lazy::new(|| zero_or_more(NONNEWLINE));

// ============================================================================
// CHARACTERS AND NUMBERS
// ============================================================================

pub const LETTER: &str = "[A-Za-z]";
pub const DIGIT: &str = "[0-9]";
pub const PLUS: &str = r"\+";
pub const MINUS: &str = "-";
pub const SIGN: &str = "[+-]";

/// Characters allowed unescaped in a URL path segment.
pub const URLSAFE_CHAR: &str = "[A-Za-z0-9_.~-]";

/// A letter or underscore followed by letters, digits or underscores.
pub const VARIABLE_NAME: &str = "[A-Za-z_][A-Za-z0-9_]*";

pub static UNSIGNED_INTEGER: Lazy<String> = Lazy::new(|| one_or_more(DIGIT));

pub static INTEGER: Lazy<String> = Lazy::new(|| maybe(SIGN) + UNSIGNED_INTEGER.as_str());

/// `12.`, `12.5` or `.5`.
pub static UNSIGNED_FLOAT: Lazy<String> = Lazy::new(|| {
    one_of_these(&[
        format!("{}{}{}", *UNSIGNED_INTEGER, escape("."), maybe(&UNSIGNED_INTEGER)),
        format!("{}{}", escape("."), *UNSIGNED_INTEGER),
    ])
});

pub static FLOAT: Lazy<String> = Lazy::new(|| maybe(SIGN) + UNSIGNED_FLOAT.as_str());

/// Integer mantissa with an `E`/`e` exponent, e.g. `5E-3`.
pub static EXPONENTIAL_INTEGER: Lazy<String> =
    Lazy::new(|| format!("{}[eE]{}", *INTEGER, *INTEGER));

/// Float mantissa with an `E`/`e` exponent, e.g. `-1.25e+02`.
pub static EXPONENTIAL_FLOAT: Lazy<String> = Lazy::new(|| format!("{}[eE]{}", *FLOAT, *INTEGER));

/// Integer mantissa with a Fortran `D`/`d` exponent, e.g. `5D-3`.
pub static EXPONENTIAL_INTEGER_D: Lazy<String> =
    Lazy::new(|| format!("{}[dD]{}", *INTEGER, *INTEGER));

/// Float mantissa with a Fortran `D`/`d` exponent, e.g. `0.1000D+01`.
pub static EXPONENTIAL_FLOAT_D: Lazy<String> =
    Lazy::new(|| format!("{}[dD]{}", *FLOAT, *INTEGER));

/// Any numeric literal. Alternatives are tried most-specific first.
pub static NUMBER: Lazy<String> = Lazy::new(|| {
    one_of_these(&[
        EXPONENTIAL_FLOAT.as_str(),
        EXPONENTIAL_FLOAT_D.as_str(),
        EXPONENTIAL_INTEGER.as_str(),
        EXPONENTIAL_INTEGER_D.as_str(),
        FLOAT.as_str(),
        INTEGER.as_str(),
    ])
});

// ============================================================================
// COMBINATORS
// ============================================================================

/// Pattern matching `s` literally.
pub fn escape(s: &str) -> String {
    fancy_regex::escape(s).into_owned()
}

/// Zero or one occurrence of `pattern`.
pub fn maybe(pattern: &str) -> String {
    format!("{}?", atom(pattern))
}

/// Zero or more occurrences, as many as possible.
pub fn zero_or_more(pattern: &str) -> String {
    format!("{}*", atom(pattern))
}

/// Zero or more occurrences, as few as possible.
pub fn zero_or_more_lazy(pattern: &str) -> String {
    format!("{}*?", atom(pattern))
}

/// One or more occurrences, as many as possible.
pub fn one_or_more(pattern: &str) -> String {
    format!("{}+", atom(pattern))
}

/// One or more occurrences, as few as possible.
pub fn one_or_more_lazy(pattern: &str) -> String {
    format!("{}+?", atom(pattern))
}

/// Any one of `patterns`, tried in list order.
///
/// # Panics
///
/// Panics if `patterns` is empty; an empty alternation would match everywhere.
pub fn one_of_these<P: AsRef<str>>(patterns: &[P]) -> String {
    assert!(
        !patterns.is_empty(),
        "one_of_these requires at least one alternative"
    );
    let alternatives: Vec<&str> = patterns.iter().map(AsRef::as_ref).collect();
    format!("(?:{})", alternatives.join("|"))
}

pub fn capturing(pattern: &str) -> String {
    format!("({})", pattern)
}

/// # Panics
///
/// Panics if `name` is empty.
pub fn named_capturing(pattern: &str, name: &str) -> String {
    assert!(!name.is_empty(), "named_capturing requires a group name");
    format!("(?P<{}>{})", name, pattern)
}

/// Zero-width: the position is preceded by `pattern`.
///
/// The backend only accepts fixed-length lookbehind bodies.
pub fn preceded_by(pattern: &str) -> String {
    format!("(?<={})", pattern)
}

pub fn not_preceded_by(pattern: &str) -> String {
    format!("(?<!{})", pattern)
}

/// Zero-width: the position is followed by `pattern`.
pub fn followed_by(pattern: &str) -> String {
    format!("(?={})", pattern)
}

pub fn not_followed_by(pattern: &str) -> String {
    format!("(?!{})", pattern)
}

/// One or more `pattern`s, consecutive ones joined by `separator`.
///
/// `series(VARIABLE_NAME, "-")` matches `C-C-H`.
pub fn series(pattern: &str, separator: &str) -> String {
    let item = sequence_item(pattern);
    let link = format!("{}{}", sequence_item(separator), item);
    format!("{}{}", item, zero_or_more(&link))
}

/// `pattern` with optional spaces or tabs in front.
pub fn lpadded(pattern: &str) -> String {
    lpadded_with(pattern, LINESPACE)
}

/// `pattern` with optional spaces or tabs behind.
pub fn rpadded(pattern: &str) -> String {
    rpadded_with(pattern, LINESPACE)
}

/// `pattern` with optional spaces or tabs on both sides.
pub fn padded(pattern: &str) -> String {
    padded_with(pattern, LINESPACE)
}

pub fn lpadded_with(pattern: &str, fill: &str) -> String {
    format!("{}{}", zero_or_more(fill), sequence_item(pattern))
}

pub fn rpadded_with(pattern: &str, fill: &str) -> String {
    format!("{}{}", sequence_item(pattern), zero_or_more(fill))
}

pub fn padded_with(pattern: &str, fill: &str) -> String {
    let fill = zero_or_more(fill);
    format!("{}{}{}", fill, sequence_item(pattern), fill)
}

// ============================================================================
// PRECEDENCE
// ============================================================================

/// Wrap `pattern` so a quantifier applies to all of it.
fn atom(pattern: &str) -> String {
    if is_atom(pattern) {
        pattern.to_string()
    } else {
        format!("(?:{})", pattern)
    }
}

/// Wrap `pattern` so it can be concatenated with neighbours.
fn sequence_item(pattern: &str) -> String {
    if has_top_level_alternation(pattern) {
        format!("(?:{})", pattern)
    } else {
        pattern.to_string()
    }
}

/// True when a postfix quantifier would bind to the whole of `pattern`.
fn is_atom(pattern: &str) -> bool {
    let chars: Vec<char> = pattern.chars().collect();
    match chars.as_slice() {
        [] => false,
        [c] => !matches!(*c, '|' | '(' | ')' | '[' | ']'),
        ['\\', c] => !matches!(*c, 'p' | 'P' | 'x' | 'u' | 'U'),
        ['[', ..] => class_end(&chars, 0) == Some(chars.len() - 1),
        ['(', ..] => group_end(&chars, 0) == Some(chars.len() - 1),
        _ => false,
    }
}

/// Index of the `]` closing the class that opens at `start`.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut i = start + 1;
    if chars.get(i) == Some(&'^') {
        i += 1;
    }
    // a leading `]` is a literal member
    if chars.get(i) == Some(&']') {
        i += 1;
    }
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            ']' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

/// Index of the `)` closing the group that opens at `start`.
fn group_end(chars: &[char], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = start;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 1,
            '[' => i = class_end(chars, i)?,
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn has_top_level_alternation(pattern: &str) -> bool {
    let chars: Vec<char> = pattern.chars().collect();
    let mut depth = 0usize;
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 1,
            '[' => match class_end(&chars, i) {
                Some(end) => i = end,
                None => return false,
            },
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            '|' if depth == 0 => return true,
            _ => {}
        }
        i += 1;
    }
    false
}
