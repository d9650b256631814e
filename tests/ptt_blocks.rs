//! Block extraction over program-style text
//!
//! Each test feeds a small, realistic excerpt through one extractor and checks the
//! exact name and body text that come back.

use std::collections::BTreeMap;

use autoio::autoparse::{Error, Value};
use autoio::ioformat::ptt::{
    end_block, idx_lst_from_line, keyword_dct_from_block, keyword_dcts_from_blocks,
    named_end_blocks, paren_block, paren_blocks, remove_comments, remove_whitespace, symb_block,
    MAX_RANGE_LEN,
};
use proptest::prelude::*;
use rstest::rstest;

const KEYVAL_STR: &str = "(\n val1 = 100\n val2 = 100.0\n)\n";

const MESS_STR: &str = "\
Model
  Species  CH4
    Geometry[angstrom] 5
    C 0.0 0.0 0.0
  End  CH4
  Species  H
    Geometry[angstrom] 1
    H 0.0 0.0 0.0
  End
End
";

const QCHEM_STR: &str = "\
$rem
   method  b3lyp
   basis   6-31g*
$end

$molecule
0 1
O
$end
";

// ============================================================================
// KEYWORD DICTIONARIES
// ============================================================================

#[test]
fn test_keyword_dcts_from_blocks_types_values() {
    let dcts = keyword_dcts_from_blocks([("key1", KEYVAL_STR)]);

    let inner = &dcts["key1"];
    assert_eq!(inner.len(), 2);
    assert_eq!(inner["val1"], Value::Int(100));
    assert_eq!(inner["val2"], Value::Float(100.0));
}

#[test]
fn test_keyword_dcts_from_blocks_serializes_as_plain_json() {
    let dcts = keyword_dcts_from_blocks([("key1", KEYVAL_STR)]);
    let json = serde_json::to_string(&dcts).unwrap();
    assert_eq!(json, r#"{"key1":{"val1":100,"val2":100.0}}"#);
}

#[rstest]
#[case("flag = true", Value::Bool(true))]
#[case("flag = True", Value::Bool(true))]
#[case("flag = FALSE", Value::Bool(false))]
#[case("flag = none", Value::Null)]
#[case("flag = None", Value::Null)]
fn test_keyword_literals_normalize(#[case] line: &str, #[case] expected: Value) {
    let dict = keyword_dct_from_block(line);
    assert_eq!(dict["flag"], expected);
}

#[test]
fn test_keyword_dct_without_parens_and_with_lists() {
    let block = "\n  program = 'molpro2015'\n  mem = 4\n  freqs = [100.5, 200, none]\n";
    let dict = keyword_dct_from_block(block);

    let mut expected = BTreeMap::new();
    expected.insert("program".to_string(), Value::from("molpro2015"));
    expected.insert("mem".to_string(), Value::Int(4));
    expected.insert(
        "freqs".to_string(),
        Value::Seq(vec![Value::Float(100.5), Value::Int(200), Value::Null]),
    );
    assert_eq!(dict, expected);
}

#[test]
fn test_keyword_dcts_keep_outer_keys() {
    let mut blocks = BTreeMap::new();
    blocks.insert(1, "a = 1");
    blocks.insert(2, "");
    let dcts = keyword_dcts_from_blocks(blocks);
    assert_eq!(dcts[&1]["a"], Value::Int(1));
    assert!(dcts[&2].is_empty());
}

// ============================================================================
// NAMED END BLOCKS
// ============================================================================

#[test]
fn test_named_end_blocks_in_source_order() {
    let blocks = named_end_blocks(MESS_STR, "Species", Some("End")).unwrap().unwrap();
    assert_eq!(
        blocks,
        vec![
            (
                "CH4".to_string(),
                "    Geometry[angstrom] 5\n    C 0.0 0.0 0.0".to_string()
            ),
            (
                "H".to_string(),
                "    Geometry[angstrom] 1\n    H 0.0 0.0 0.0".to_string()
            ),
        ]
    );
}

#[test]
fn test_named_end_blocks_missing_footer_is_none() {
    let text = "Species A\n  x\nSpecies B\n  y\n";
    assert_eq!(named_end_blocks(text, "Species", Some("End")).unwrap(), None);
}

#[test]
fn test_named_end_blocks_footer_defaults_to_header() {
    let text = "basis cc-pvdz\n  H 1s\nbasis cc-pvdz\n";
    let blocks = named_end_blocks(text, "basis", None).unwrap().unwrap();
    assert_eq!(blocks, vec![("cc-pvdz".to_string(), "  H 1s".to_string())]);
}

#[test]
fn test_named_end_blocks_footer_present_but_no_blocks() {
    let text = "End\n";
    assert_eq!(
        named_end_blocks(text, "Species", Some("End")).unwrap(),
        Some(vec![])
    );
}

#[test]
fn test_named_end_blocks_repeated_name_keeps_later_body() {
    let text = "kw a\n1\nend\nkw b\n2\nend\nkw a\n3\nend\n";
    let blocks = named_end_blocks(text, "kw", Some("end")).unwrap().unwrap();
    assert_eq!(
        blocks,
        vec![
            ("a".to_string(), "3".to_string()),
            ("b".to_string(), "2".to_string())
        ]
    );
}

#[test]
fn test_end_block_targets_one_name() {
    let block = end_block(MESS_STR, "Species", "H", "End").unwrap();
    assert_eq!(
        block,
        Some((
            "H".to_string(),
            "    Geometry[angstrom] 1\n    H 0.0 0.0 0.0".to_string()
        ))
    );
    assert_eq!(end_block(MESS_STR, "Species", "CH", "End").unwrap(), None);
    assert_eq!(end_block(MESS_STR, "Species", "OH", "End").unwrap(), None);
}

#[test]
fn test_end_block_empty_body() {
    let block = end_block("kw name\nend name\n", "kw", "name", "end").unwrap();
    assert_eq!(block, Some(("name".to_string(), String::new())));
}

proptest! {
    #[test]
    fn end_block_round_trips_body(
        name in "[A-Za-z][A-Za-z0-9_]{0,8}",
        body in "[a-c0-9 =.]{0,20}(\n[a-c0-9 =.]{0,20}){0,4}",
    ) {
        let text = format!("kw {}\n{}\nend {}", name, body, name);
        let block = end_block(&text, "kw", &name, "end").unwrap();
        prop_assert_eq!(block, Some((name, body)));
    }
}

// ============================================================================
// SIGIL BLOCKS
// ============================================================================

#[rstest]
#[case("$", "rem", Some("   method  b3lyp\n   basis   6-31g*"))]
#[case("$", "molecule", Some("0 1\nO"))]
#[case("%", "rem", None)]
#[case("$", "basis", None)]
fn test_symb_block(#[case] symbol: &str, #[case] header: &str, #[case] body: Option<&str>) {
    let block = symb_block(QCHEM_STR, symbol, header).unwrap();
    let expected = body.map(|body| (header.to_string(), body.to_string()));
    assert_eq!(block, expected);
}

#[test]
fn test_symb_block_percent_sections() {
    let text = "%scf\n  maxiter 200\n%END\n";
    let block = symb_block(text, "%", "scf").unwrap();
    assert_eq!(block, Some(("scf".to_string(), "  maxiter 200".to_string())));
    assert_eq!(symb_block(text, "$", "scf").unwrap(), None);
}

// ============================================================================
// PAREN BLOCKS
// ============================================================================

#[test]
fn test_paren_blocks_preserve_interior_whitespace() {
    let text = "key1 = ( <A> )\nkey2 = (\n <B> )";
    let blocks = paren_blocks(text, None).unwrap();
    assert_eq!(
        blocks,
        vec![
            ("key1".to_string(), " <A> ".to_string()),
            ("key2".to_string(), "\n <B> ".to_string()),
        ]
    );
}

#[test]
fn test_paren_blocks_filter_by_key() {
    let text = "opt = (a)\nfreq = (b)\nopt=(\n  c\n)\nmyopt = (d)\n";
    let blocks = paren_blocks(text, Some("opt")).unwrap();
    assert_eq!(
        blocks,
        vec![
            ("opt".to_string(), "a".to_string()),
            ("opt".to_string(), "\n  c\n".to_string()),
        ]
    );
    assert_eq!(
        paren_block(text, "freq").unwrap(),
        Some(("freq".to_string(), "b".to_string()))
    );
    assert_eq!(paren_block(text, "scan").unwrap(), None);
}

#[test]
fn test_paren_blocks_nested_and_unbalanced() {
    let text = "outer = (\n inner = (x)\n)\nbroken = (y\n";
    let blocks = paren_blocks(text, None).unwrap();
    assert_eq!(
        blocks,
        vec![("outer".to_string(), "\n inner = (x)\n".to_string())]
    );
}

// ============================================================================
// WHOLE-FILE INPUTS
// ============================================================================

const GEOMETRY_LINES: usize = 60_000;

/// About a megabyte of coordinate lines.
fn geometry_body() -> String {
    (0..GEOMETRY_LINES)
        .map(|i| format!("  C {}.0 0.0 0.0", i))
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn test_end_blocks_on_megabyte_input() {
    let body = geometry_body();
    let text = format!("kw A\n{}\nend A\nkw B\n  H 0.0 0.0 0.0\nend\n", body);
    assert!(text.len() > 1_000_000);

    assert_eq!(
        end_block(&text, "kw", "A", "end").unwrap(),
        Some(("A".to_string(), body.clone()))
    );
    assert_eq!(end_block(&text, "kw", "Z", "end").unwrap(), None);

    let blocks = named_end_blocks(&text, "kw", Some("end")).unwrap().unwrap();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0], ("A".to_string(), body));
    assert_eq!(blocks[1].1, "  H 0.0 0.0 0.0");

    assert_eq!(named_end_blocks(&text, "kw", Some("stop")).unwrap(), None);
}

#[test]
fn test_unterminated_header_on_megabyte_input() {
    let text = format!("kw A\n{}\n", geometry_body());
    assert_eq!(end_block(&text, "kw", "A", "end").unwrap(), None);
    assert_eq!(symb_block(&text, "$", "rem").unwrap(), None);
}

#[test]
fn test_symb_block_on_megabyte_input() {
    let body = geometry_body();
    let text = format!("$molecule\n0 1\n{}\n$end\n", body);
    let (header, found) = symb_block(&text, "$", "molecule").unwrap().unwrap();
    assert_eq!(header, "molecule");
    assert_eq!(found.lines().count(), GEOMETRY_LINES + 1);
    assert!(found.ends_with(&format!("  C {}.0 0.0 0.0", GEOMETRY_LINES - 1)));
}

#[test]
fn test_paren_blocks_on_megabyte_input() {
    let body = geometry_body();
    let text = format!("geom = (\n{}\n)\nopts = (tight)\n", body);
    let blocks = paren_blocks(&text, None).unwrap();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0], ("geom".to_string(), format!("\n{}\n", body)));
    assert_eq!(blocks[1], ("opts".to_string(), "tight".to_string()));
}

// ============================================================================
// INDEX LINES
// ============================================================================

#[rstest]
#[case("2,5", vec![2, 5])]
#[case("7-9", vec![7, 8, 9])]
#[case("10,13-15", vec![10, 13, 14, 15])]
#[case(" 1 , 3 - 4 ,", vec![1, 3, 4])]
#[case("", vec![])]
fn test_idx_lst_from_line(#[case] line: &str, #[case] expected: Vec<usize>) {
    assert_eq!(idx_lst_from_line(line).unwrap(), expected);
}

#[rstest]
#[case("2,x")]
#[case("1-b")]
#[case("-3")]
#[case("1.5")]
fn test_idx_lst_rejects_non_numeric_tokens(#[case] line: &str) {
    let err = idx_lst_from_line(line).unwrap_err();
    assert!(matches!(err, Error::InvalidIndex { .. }), "{:?}", err);
}

#[test]
fn test_idx_lst_rejects_descending_range() {
    let err = idx_lst_from_line("9-7").unwrap_err();
    assert!(matches!(err, Error::InvalidRange { .. }));
}

#[test]
fn test_idx_lst_rejects_oversized_range() {
    let err = idx_lst_from_line("1-18446744073709551615").unwrap_err();
    assert!(matches!(err, Error::RangeTooLong { .. }), "{:?}", err);

    let widest = format!("0-{}", MAX_RANGE_LEN - 1);
    assert_eq!(idx_lst_from_line(&widest).unwrap().len(), MAX_RANGE_LEN);
    let too_wide = format!("0-{}", MAX_RANGE_LEN);
    assert!(idx_lst_from_line(&too_wide).is_err());
}

// ============================================================================
// CLEANUP
// ============================================================================

#[test]
fn test_cleanup_before_keyword_parsing() {
    let text = "# header comment\n  nprocs = 4   # cores\n\n  mem = 8\n";
    let cleaned = remove_whitespace(&remove_comments(text, "#"));
    assert_eq!(cleaned, "nprocs = 4\nmem = 8");
    let dict = keyword_dct_from_block(&cleaned);
    assert_eq!(dict["nprocs"], Value::Int(4));
}
