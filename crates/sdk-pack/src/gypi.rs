//! Source lists from `.gypi` files
//!
//! A gypi file is a python dict literal. Only the string list under
//! `'sources'` is needed, so comments are dropped and the list is read with
//! a pair of patterns instead of a full parser.

use crate::error::{PackError, PackResult};
use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::path::Path;

lazy_static! {
    static ref SOURCES: Regex = Regex::new(r#"['"]sources['"]\s*:\s*\[([^\]]*)\]"#).unwrap();
    static ref STRING: Regex = Regex::new(r#"'([^']*)'|"([^"]*)""#).unwrap();
}

/// Entries of the `sources` list in `text`
pub fn parse_sources(text: &str) -> Option<Vec<String>> {
    let uncommented: String = text
        .lines()
        .map(|line| line.split('#').next().unwrap_or(""))
        .collect::<Vec<_>>()
        .join("\n");
    let list = SOURCES.captures(&uncommented)?;
    Some(
        STRING
            .captures_iter(&list[1])
            .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
            .map(|m| m.as_str().to_string())
            .collect(),
    )
}

/// dart:io runtime sources, every entry a `.dart` file
pub fn load_io_sources(file: &Path) -> PackResult<Vec<String>> {
    let text = fs::read_to_string(file)?;
    let invalid = |message: String| PackError::SourcesList {
        file: file.to_path_buf(),
        message,
    };
    let sources = parse_sources(&text).ok_or_else(|| invalid("no 'sources' list".to_string()))?;
    if let Some(bad) = sources.iter().find(|s| !s.ends_with(".dart")) {
        return Err(invalid(format!("{bad} is not a dart file")));
    }
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const IO_SOURCES: &str = r#"
# Copyright (c) 2012, the Dart project authors.
# This file contains all sources for the dart:io library.
{
  'sources': [
    'buffer_list.dart',
    'common.dart',
    # 'disabled.dart',
    "io.dart",
    'socket_impl.dart',
  ],
}
"#;

    #[test]
    fn test_parse_sources() {
        assert_eq!(
            parse_sources(IO_SOURCES).unwrap(),
            vec!["buffer_list.dart", "common.dart", "io.dart", "socket_impl.dart"]
        );
        assert_eq!(parse_sources("{'sources': []}").unwrap(), Vec::<String>::new());
        assert_eq!(parse_sources("{'includes': ['a.gypi']}"), None);
    }

    #[test]
    fn test_load_rejects_non_dart() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("io_sources.gypi");
        fs::write(&file, "{'sources': ['io.dart', 'eventhandler.cc']}").unwrap();
        let err = load_io_sources(&file).unwrap_err();
        assert!(err.to_string().contains("eventhandler.cc is not a dart file"));
    }
}
