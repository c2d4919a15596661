//! Tests for the list loader.

use std::fs;

use tempfile::TempDir;

use super::*;

#[test]
fn trims_and_drops_blank_lines() {
    assert_eq!(
        parse_entries("  foo.com  \n\n bar.com\n"),
        vec!["foo.com".to_string(), "bar.com".to_string()]
    );
}

#[test]
fn keeps_duplicates_and_order() {
    assert_eq!(
        parse_entries("b.com\na.com\nb.com\n"),
        vec!["b.com", "a.com", "b.com"]
    );
}

#[test]
fn handles_crlf_and_tabs() {
    assert_eq!(
        parse_entries("\tone.ru\r\n\r\ntwo.ru \r\n"),
        vec!["one.ru", "two.ru"]
    );
}

#[test]
fn whitespace_only_content_is_empty() {
    assert!(parse_entries("   \n\t\n\n").is_empty());
}

#[test]
fn load_from_file() {
    let dir = TempDir::new().expect("create tempdir");
    let path = dir.path().join("list.lst");
    fs::write(&path, "  foo.com  \n\n bar.com\n").unwrap();

    let entries = load_entries(&path).unwrap();
    assert_eq!(entries, vec!["foo.com", "bar.com"]);
}

#[test]
fn missing_file_yields_empty_list() {
    let dir = TempDir::new().expect("create tempdir");
    let entries = load_entries(&dir.path().join("does-not-exist.lst")).unwrap();
    assert!(entries.is_empty());
}

#[test]
fn directory_path_is_an_error() {
    let dir = TempDir::new().expect("create tempdir");
    let err = load_entries(dir.path()).unwrap_err();
    assert!(matches!(err, RuleError::Io { .. }));
}

#[test]
fn invalid_utf8_is_an_error() {
    let dir = TempDir::new().expect("create tempdir");
    let path = dir.path().join("binary.lst");
    fs::write(&path, [0xff, 0xfe, b'\n']).unwrap();

    let err = load_entries(&path).unwrap_err();
    assert!(err.to_string().contains("binary.lst"));
}
