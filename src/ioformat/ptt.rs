//! Block Extraction
//!
//! Pulls delimited sections out of program input and output text. Four section
//! conventions are understood:
//!
//! ```text
//! named end blocks     species CH4          paren blocks     key = (
//!                        ...                                   ...
//!                      end species CH4                       )
//!
//! sigil blocks         $molecule            index lines      2,5,7-9
//!                        ...
//!                      $end
//! ```
//!
//! plus `key = value` lines, which are collected into keyword dictionaries with
//! typed values.
//!
//! ## Conventions
//!
//! - A block body never contains its delimiter lines. For line-delimited blocks
//!   the body runs from the line after the header to the end of the line before
//!   the footer, without the final newline.
//! - A section that is not there is `Ok(None)` or an empty `Vec`.
//! - Malformed numeric data (an index token that is not a number) is an error.

use std::collections::BTreeMap;

use log::{debug, trace};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::autoparse::cast::{cast, Value};
use crate::autoparse::error::{Error, Result};
use crate::autoparse::find::Matcher;
use crate::autoparse::pattern::{
    capturing, escape, lpadded, maybe, one_or_more, padded_with, LINESPACE, LINESPACES,
    LINE_END, LINE_FILL, LINE_START, NONSPACE, SPACE, VARIABLE_NAME,
};

/// A `(name, body)` pair.
pub type Block = (String, String);

/// Keyword name to typed value.
pub type KeywordDict = BTreeMap<String, Value>;

static INDEX_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([^\s-]+)\s*-\s*([^\s-]+)\s*$").unwrap());

/// Longest range `idx_lst_from_line` will expand.
pub const MAX_RANGE_LEN: usize = 1_000_000;

const LINE_BLANKS: [char; 2] = [' ', '\t'];

// ============================================================================
// KEYWORD DICTIONARIES
// ============================================================================

/// Parse the `key = value` lines of every block.
///
/// The outer keys are carried over unchanged; each body becomes a
/// [`KeywordDict`] via [`keyword_dct_from_block`].
///
/// # Example
///
/// ```text
/// {"key1": "(\n val1 = 100\n val2 = 100.0\n)\n"}
///   → {"key1": {"val1": Int(100), "val2": Float(100.0)}}
/// ```
pub fn keyword_dcts_from_blocks<K, S, I>(blocks: I) -> BTreeMap<K, KeywordDict>
where
    I: IntoIterator<Item = (K, S)>,
    K: Ord,
    S: AsRef<str>,
{
    blocks
        .into_iter()
        .map(|(key, block)| (key, keyword_dct_from_block(block.as_ref())))
        .collect()
}

/// Parse the `key = value` lines of one block.
///
/// One pair of parentheses around the whole block is optional and dropped. Blank
/// lines, lines without `=`, and anything after a `#` are ignored. The key is the
/// text before the first `=`; the value is typed by [`format_value`].
pub fn keyword_dct_from_block(block: &str) -> KeywordDict {
    let mut dict = KeywordDict::new();
    for line in strip_enclosing_parens(block.trim()).lines() {
        let line = line.split('#').next().unwrap_or_default();
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if !key.is_empty() {
            dict.insert(key.to_string(), format_value(value));
        }
    }
    dict
}

/// Type one raw keyword value.
///
/// - `'text'` and `"text"` stay strings, without their quotes.
/// - `[a, b, c]` becomes a [`Value::Seq`] of individually typed elements.
/// - Anything else goes through [`cast`].
pub fn format_value(raw: &str) -> Value {
    let text = raw.trim();
    if let Some(inner) = unquote(text) {
        return Value::Str(inner.to_string());
    }
    if let Some(inner) = text.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
        return Value::Seq(
            inner
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(format_value)
                .collect(),
        );
    }
    cast(text)
}

fn unquote(text: &str) -> Option<&str> {
    ['"', '\''].iter().find_map(|&quote| {
        text.strip_prefix(quote)
            .and_then(|t| t.strip_suffix(quote))
    })
}

fn strip_enclosing_parens(text: &str) -> &str {
    if text.starts_with('(') && closing_paren(text, 0) == Some(text.len() - 1) {
        &text[1..text.len() - 1]
    } else {
        text
    }
}

// ============================================================================
// NAMED END BLOCKS
// ============================================================================

/// Every `{header} {name}` ... `{footer}` block, in source order.
///
/// The footer line may repeat the block's name (`end species CH4`) or stand alone
/// (`end`); `footer` defaults to `header`. A name that appears twice keeps its
/// first position and takes the later body.
///
/// Returns `None` when the footer token appears nowhere in `text`: without it no
/// block can be delimited, however plausible the header lines look.
pub fn named_end_blocks(
    text: &str,
    header: &str,
    footer: Option<&str>,
) -> Result<Option<Vec<Block>>> {
    let footer = footer.unwrap_or(header);
    if !text.split('\n').any(|line| after_token(line, footer).is_some()) {
        debug!("footer `{}` not found; no `{}` blocks parsed", footer, header);
        return Ok(None);
    }

    let headers = Matcher::new(&header_line_pattern(
        header,
        &capturing(&one_or_more(NONSPACE)),
    ))?;
    let mut blocks: Vec<Block> = Vec::new();
    let found = scan_end_blocks(text, &headers, false, |line, name| {
        is_footer_line(line, footer, name)
    })?;
    for (name, body) in found {
        match blocks.iter_mut().find(|(existing, _)| *existing == name) {
            Some(block) => block.1 = body,
            None => blocks.push((name, body)),
        }
    }
    Ok(Some(blocks))
}

/// The `{header} {name}` ... `{footer}` block with exactly this `name`.
pub fn end_block(text: &str, header: &str, name: &str, footer: &str) -> Result<Option<Block>> {
    let headers = Matcher::new(&header_line_pattern(header, &capturing(&escape(name))))?;
    let found = scan_end_blocks(text, &headers, true, |line, name| {
        is_footer_line(line, footer, name)
    })?;
    Ok(found.into_iter().next())
}

/// The whole header line: `header`, then `name`, then anything after a space or tab.
///
/// `name` must be a pattern with exactly one capturing group.
fn header_line_pattern(header: &str, name: &str) -> String {
    format!(
        "{}{}{}{}{}{}",
        LINE_START,
        lpadded(&escape(header)),
        *LINESPACES,
        name,
        maybe(&format!("{}{}", LINESPACE, *LINE_FILL)),
        LINE_END,
    )
}

/// Pair each line matched by `headers` with the lines up to its footer.
///
/// Only the header line goes through the regex engine; the body is walked line by
/// line, so the cost stays linear in the size of `text`. The capture of `headers`
/// (or the whole header line, without groups) is the block name handed to
/// `is_footer`. A header with no footer after it opens nothing, and the scan
/// resumes on the next line.
fn scan_end_blocks<F>(
    text: &str,
    headers: &Matcher,
    first_only: bool,
    is_footer: F,
) -> Result<Vec<Block>>
where
    F: Fn(&str, &str) -> bool,
{
    let mut blocks = Vec::new();
    let mut pos = 0;
    while pos <= text.len() {
        let Some((capture, span)) = headers.first_capture_at(text, pos)? else {
            break;
        };
        let name = capture.get(0).unwrap_or_default().to_string();
        match body_until_footer(text, span.end, |line| is_footer(line, &name)) {
            Some((body, end)) => {
                blocks.push((name, body));
                if first_only {
                    break;
                }
                pos = end;
            }
            None => {
                trace!("`{}` at byte {} has no closing line", name, span.start);
                pos = span.end + 1;
            }
        }
    }
    Ok(blocks)
}

/// Body following the header line that ends at `header_end`, and the byte offset
/// just past the footer line.
///
/// The body runs from the line after the header to the end of the line before
/// the footer, without its final newline.
fn body_until_footer<F>(text: &str, header_end: usize, is_footer: F) -> Option<(String, usize)>
where
    F: Fn(&str) -> bool,
{
    let body_start = header_end + 1;
    if text.get(header_end..body_start) != Some("\n") {
        return None;
    }
    let mut line_start = body_start;
    for line in text[body_start..].split('\n') {
        if is_footer(line) {
            let body = if line_start > body_start {
                &text[body_start..line_start - 1]
            } else {
                ""
            };
            return Some((body.to_string(), line_start + line.len()));
        }
        line_start += line.len() + 1;
    }
    None
}

/// `footer`, optionally followed by the block's `name`, and nothing else.
fn is_footer_line(line: &str, footer: &str, name: &str) -> bool {
    let Some(rest) = after_token(line, footer) else {
        return false;
    };
    let rest = rest.trim_end_matches(LINE_BLANKS);
    rest.is_empty()
        || (rest.starts_with(LINE_BLANKS) && rest.trim_start_matches(LINE_BLANKS) == name)
}

/// What follows `token` when a line opens with it, spaces and tabs aside, and no
/// word character runs on from it.
fn after_token<'a>(line: &'a str, token: &str) -> Option<&'a str> {
    let rest = line.trim_start_matches(LINE_BLANKS).strip_prefix(token)?;
    (!rest.starts_with(is_word_char)).then_some(rest)
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

// ============================================================================
// SIGIL BLOCKS
// ============================================================================

/// The first `{symbol}{header}` ... `{symbol}end` section.
///
/// Both delimiter lines must use the same one-character `symbol`, so asking for
/// `%scf` in a file that writes `$scf` finds nothing. The closing `end` is matched
/// without regard to letter case.
pub fn symb_block(text: &str, symbol: &str, header: &str) -> Result<Option<Block>> {
    let pattern = format!(
        "{}{}{}{}",
        LINE_START,
        lpadded(&format!("{}{}", escape(symbol), escape(header))),
        maybe(&format!("{}{}", LINESPACE, *LINE_FILL)),
        LINE_END,
    );
    let found = scan_end_blocks(text, &Matcher::new(&pattern)?, true, |line, _| {
        is_sigil_end(line, symbol)
    })?;
    Ok(found
        .into_iter()
        .next()
        .map(|(_, body)| (header.to_string(), body)))
}

fn is_sigil_end(line: &str, symbol: &str) -> bool {
    line.trim_start_matches(LINE_BLANKS)
        .strip_prefix(symbol)
        .and_then(|rest| after_token_ignore_case(rest, "end"))
        .is_some()
}

fn after_token_ignore_case<'a>(text: &'a str, token: &str) -> Option<&'a str> {
    let head = text.get(..token.len())?;
    let rest = &text[token.len()..];
    (head.eq_ignore_ascii_case(token) && !rest.starts_with(is_word_char)).then_some(rest)
}

// ============================================================================
// PAREN BLOCKS
// ============================================================================

/// Every `key = ( ... )` assignment, in source order.
///
/// The body is everything between the opening parenthesis and its balancing
/// closing one, interior whitespace and nested parentheses included. With `key`
/// only that key's assignments are returned. Assignments nested inside another
/// block's body are part of that body, not separate results.
pub fn paren_blocks(text: &str, key: Option<&str>) -> Result<Vec<Block>> {
    let key_pattern = key.map_or_else(|| VARIABLE_NAME.to_string(), escape);
    let opening = format!(
        "{}{}{}",
        capturing(&key_pattern),
        padded_with("=", SPACE),
        escape("(")
    );

    let mut blocks = Vec::new();
    let mut cursor = 0;
    for (capture, span) in Matcher::new(&opening)?.all_captures_with_spans(text)? {
        // `mykey = (` is not an assignment to `key`
        if span.start < cursor || text[..span.start].ends_with(is_word_char) {
            continue;
        }
        let open = span.end - 1;
        match closing_paren(text, open) {
            Some(close) => {
                let name = capture.get(0).unwrap_or_default().to_string();
                blocks.push((name, text[open + 1..close].to_string()));
                cursor = close + 1;
            }
            None => trace!(
                "unbalanced parenthesis after `{}` at byte {}",
                capture.get(0).unwrap_or_default(),
                open
            ),
        }
    }
    Ok(blocks)
}

/// The first `key = ( ... )` assignment for `key`.
pub fn paren_block(text: &str, key: &str) -> Result<Option<Block>> {
    Ok(paren_blocks(text, Some(key))?.into_iter().next())
}

/// Byte index of the `)` balancing the `(` at `open`.
fn closing_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, byte) in text.bytes().enumerate().skip(open) {
        match byte {
            b'(' => depth += 1,
            b')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

// ============================================================================
// INDEX LINES
// ============================================================================

/// Expand a comma-separated line of indices and inclusive ranges.
///
/// `"10,13-15"` becomes `[10, 13, 14, 15]`. Empty tokens are skipped. A token
/// that is not a non-negative integer is [`Error::InvalidIndex`], a range
/// that runs backwards is [`Error::InvalidRange`], and one spanning more than
/// [`MAX_RANGE_LEN`] indices is [`Error::RangeTooLong`].
pub fn idx_lst_from_line(line: &str) -> Result<Vec<usize>> {
    let mut indices = Vec::new();
    for token in line.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match INDEX_RANGE.captures(token) {
            Some(caps) => {
                let start = parse_index(&caps[1])?;
                let end = parse_index(&caps[2])?;
                if end < start {
                    return Err(Error::InvalidRange {
                        token: token.to_string(),
                    });
                }
                if end - start >= MAX_RANGE_LEN {
                    return Err(Error::RangeTooLong {
                        token: token.to_string(),
                        limit: MAX_RANGE_LEN,
                    });
                }
                indices.extend(start..=end);
            }
            None => indices.push(parse_index(token)?),
        }
    }
    Ok(indices)
}

fn parse_index(token: &str) -> Result<usize> {
    token.parse().map_err(|_| Error::InvalidIndex {
        token: token.to_string(),
    })
}

// ============================================================================
// TEXT CLEANUP
// ============================================================================

/// Drop everything from `delim` to the end of each line.
pub fn remove_comments(text: &str, delim: &str) -> String {
    text.lines()
        .map(|line| line.split(delim).next().unwrap_or_default())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Trim every line and drop the ones left empty.
pub fn remove_whitespace(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
