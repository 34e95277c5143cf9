//! File operations used by the SDK layout

use crate::error::{PackError, PackResult};
use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::{NoExpand, Regex};
use std::fs;
use std::path::Path;
use tracing::{debug, trace};
use walkdir::WalkDir;

/// Copy one file with its permissions, creating parent directories
pub fn copy_file(from: &Path, to: &Path) -> PackResult<()> {
    if !from.is_file() {
        return Err(PackError::MissingSource(from.to_path_buf()));
    }
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(from, to)?;
    trace!(from = %from.display(), to = %to.display(), "copied");
    Ok(())
}

/// Name patterns to leave out of a tree copy
///
/// Like shell globs, matched against each entry's own name; a matching
/// directory is skipped with everything below it.
fn ignore_set(patterns: &[&str]) -> PackResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// Recursively copy `from` to `to`, skipping entries matching `ignore`
///
/// Returns the number of files copied.
pub fn copy_tree(from: &Path, to: &Path, ignore: &[&str]) -> PackResult<usize> {
    if !from.is_dir() {
        return Err(PackError::MissingSource(from.to_path_buf()));
    }
    let ignore = ignore_set(ignore)?;
    let mut copied = 0;
    let walker = WalkDir::new(from)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !ignore.is_match(Path::new(entry.file_name())));
    for entry in walker {
        let entry = entry?;
        let relative = entry.path().strip_prefix(from).unwrap_or(entry.path());
        let dest = to.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest)?;
        } else {
            fs::copy(entry.path(), &dest)?;
            copied += 1;
        }
    }
    debug!(from = %from.display(), to = %to.display(), files = copied, "copied tree");
    Ok(copied)
}

/// A regex substitution applied to a whole file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub pattern: String,
    /// Inserted literally, `$` included
    pub replacement: String,
}

impl Substitution {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }
}

/// Apply `substitutions` in order to `file`
pub fn replace_in_file(file: &Path, substitutions: &[Substitution]) -> PackResult<()> {
    if !file.is_file() {
        return Err(PackError::MissingSource(file.to_path_buf()));
    }
    let mut contents = fs::read_to_string(file)?;
    for substitution in substitutions {
        let regex = Regex::new(&substitution.pattern)?;
        contents = regex
            .replace_all(&contents, NoExpand(&substitution.replacement))
            .into_owned();
    }
    fs::write(file, contents)?;
    Ok(())
}

/// Create `file` if missing and bump its modification time
pub fn touch(file: &Path) -> PackResult<()> {
    let handle = fs::OpenOptions::new().create(true).append(true).open(file)?;
    handle.set_modified(std::time::SystemTime::now())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_copy_tree_ignores_by_name() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        for file in ["core.dart", "build.py", "doc/index.html", "impl/list.dart", "impl/.svn/entries", "x.sh"] {
            let path = src.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, file).unwrap();
        }
        fs::create_dir_all(src.join("lib.svn")).unwrap();

        let dest = dir.path().join("dest");
        let copied = copy_tree(&src, &dest, &["*.svn", ".svn", "doc", "*.py", "*.gypi", "*.sh"]).unwrap();
        assert_eq!(copied, 2);
        assert!(dest.join("core.dart").is_file());
        assert!(dest.join("impl/list.dart").is_file());
        assert!(!dest.join("doc").exists());
        assert!(!dest.join("build.py").exists());
        assert!(!dest.join("impl/.svn").exists());
        assert!(!dest.join("lib.svn").exists());
    }

    #[test]
    fn test_missing_sources() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            copy_tree(&dir.path().join("nope"), dir.path(), &[]),
            Err(PackError::MissingSource(_))
        ));
        assert!(matches!(
            copy_file(&dir.path().join("nope"), &dir.path().join("x")),
            Err(PackError::MissingSource(_))
        ));
    }

    #[test]
    fn test_replacements_are_literal() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("dart2js");
        fs::write(&file, "exec \"$BIN_DIR\"/dart \"$BIN_DIR/../../lib/compiler/dart2js.dart\"\n").unwrap();

        replace_in_file(&file, &[Substitution::new(r"\$BIN_DIR/\.\./\.\./lib", "$BIN_DIR/../lib")]).unwrap();
        assert_eq!(
            fs::read_to_string(&file).unwrap(),
            "exec \"$BIN_DIR\"/dart \"$BIN_DIR/../lib/compiler/dart2js.dart\"\n"
        );
    }

    #[test]
    fn test_touch() {
        let dir = tempdir().unwrap();
        let stamp = dir.path().join("create.stamp");
        touch(&stamp).unwrap();
        touch(&stamp).unwrap();
        assert_eq!(fs::read_to_string(&stamp).unwrap(), "");
    }
}
