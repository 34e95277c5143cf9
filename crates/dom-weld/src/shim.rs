//! Web components polyfill support
//!
//! The polyfill subclasses the dart2js implementation classes, so the
//! generated `html_dart2js.dart` is rewritten with every `_XImpl` class made
//! public and an extra source appended.

use crate::error::WeldResult;
use lazy_static::lazy_static;
use regex::Regex;
use std::borrow::Cow;
use std::fs;
use std::path::Path;
use tracing::info;

lazy_static! {
    static ref PRIVATE_IMPL: Regex = Regex::new(r"(^|[\s(<])_(\w+Impl)").unwrap();
}

/// Drop the leading underscore of `_XImpl` identifiers
pub fn publicize_impl_classes(source: &str) -> Cow<'_, str> {
    PRIVATE_IMPL.replace_all(source, "${1}${2}")
}

/// Rewrite `library` in place and append `extra_code`
pub fn apply_webcomponents_shim(library: &Path, extra_code: &Path) -> WeldResult<()> {
    let source = fs::read_to_string(library)?;
    let extra = fs::read_to_string(extra_code)?;
    let mut shimmed = publicize_impl_classes(&source).into_owned();
    shimmed.push_str(&extra);
    fs::write(library, shimmed)?;
    info!(library = %library.display(), extra = %extra_code.display(), "applied web components shim");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_publicize() {
        let source = "class _NodeImpl extends _EventTargetImpl implements Node {\n  \
                      List<_ElementImpl> get children => new _FrozenList(_x);\n  \
                      _DivElementImpl f(_SpanElementImpl s) => s;\n}\n";
        assert_eq!(
            publicize_impl_classes(source),
            "class NodeImpl extends EventTargetImpl implements Node {\n  \
             List<ElementImpl> get children => new _FrozenList(_x);\n  \
             DivElementImpl f(SpanElementImpl s) => s;\n}\n"
        );
    }

    #[test]
    fn test_leaves_member_access_alone() {
        // `a._FooImpl` is preceded by a dot, not whitespace
        assert_eq!(publicize_impl_classes("x = a._FooImpl;"), "x = a._FooImpl;");
        assert_eq!(publicize_impl_classes("_FooImpl x;"), "FooImpl x;");
    }

    #[test]
    fn test_apply_shim() {
        let dir = tempdir().unwrap();
        let library = dir.path().join("html_dart2js.dart");
        let extra = dir.path().join("shim.dart");
        fs::write(&library, "class _DocumentImpl {}\n").unwrap();
        fs::write(&extra, "class Polyfill extends DocumentImpl {}\n").unwrap();

        apply_webcomponents_shim(&library, &extra).unwrap();
        assert_eq!(
            fs::read_to_string(&library).unwrap(),
            "class DocumentImpl {}\nclass Polyfill extends DocumentImpl {}\n"
        );
    }
}
