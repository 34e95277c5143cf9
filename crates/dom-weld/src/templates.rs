//! Template loading
//!
//! Templates are looked up by name under each `root/subpath` pair in order,
//! then among the templates built into this crate. Loaded text is run
//! through a line preprocessor understanding `$if COND`, `$else` and
//! `$endif`; conditions come from the system that owns the loader.

use crate::error::{WeldError, WeldResult};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::trace;

macro_rules! builtin {
    ($($name:literal),* $(,)?) => {
        &[$(($name, include_str!(concat!("../templates/", $name)))),*]
    };
}

/// Templates shipped with the crate
static BUILTIN: &[(&str, &str)] = builtin![
    "callback.darttemplate",
    "cpp_callback_header.template",
    "cpp_callback_implementation.template",
    "cpp_derived_sources.template",
    "cpp_header.template",
    "cpp_implementation.template",
    "cpp_resolver.template",
    "dart2js_impl.darttemplate",
    "dart_implementation.darttemplate",
    "factoryprovider.darttemplate",
    "factoryprovider_Elements.darttemplate",
    "html_dart2js.darttemplate",
    "html_dartium.darttemplate",
    "immutable_list_mixin.darttemplate",
    "interface.darttemplate",
];

/// Template source with search paths and preprocessor conditions
#[derive(Debug)]
pub struct TemplateLoader {
    roots: Vec<PathBuf>,
    subpaths: Vec<String>,
    conditions: HashMap<String, bool>,
    cache: RefCell<HashMap<String, Option<String>>>,
}

impl TemplateLoader {
    pub fn new(roots: Vec<PathBuf>, subpaths: &[&str], conditions: &[(&str, bool)]) -> Self {
        Self {
            roots,
            subpaths: subpaths.iter().map(|s| s.to_string()).collect(),
            conditions: conditions
                .iter()
                .map(|(name, value)| (name.to_string(), *value))
                .collect(),
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Load a template that must exist
    pub fn load(&self, name: &str) -> WeldResult<String> {
        self.try_load(name)?
            .ok_or_else(|| WeldError::TemplateNotFound(name.to_string()))
    }

    /// Load a template if any search location has it
    pub fn try_load(&self, name: &str) -> WeldResult<Option<String>> {
        if let Some(cached) = self.cache.borrow().get(name) {
            return Ok(cached.clone());
        }
        let found = match self.find(name)? {
            Some(raw) => Some(self.preprocess(name, &raw)?),
            None => None,
        };
        self.cache
            .borrow_mut()
            .insert(name.to_string(), found.clone());
        Ok(found)
    }

    fn find(&self, name: &str) -> WeldResult<Option<String>> {
        for root in &self.roots {
            for subpath in &self.subpaths {
                let path = root.join(subpath).join(name);
                if path.is_file() {
                    trace!(path = %path.display(), "template");
                    return Ok(Some(std::fs::read_to_string(path)?));
                }
            }
        }
        Ok(BUILTIN
            .iter()
            .find(|(builtin, _)| *builtin == name)
            .map(|(_, text)| text.to_string()))
    }

    /// Apply `$if` / `$else` / `$endif` lines
    fn preprocess(&self, name: &str, text: &str) -> WeldResult<String> {
        let syntax = |message: String| WeldError::TemplateSyntax {
            name: name.to_string(),
            message,
        };
        // (active, seen_else) per open block
        let mut stack: Vec<(bool, bool)> = Vec::new();
        let mut out = String::new();
        for line in text.split_inclusive('\n') {
            let words: Vec<&str> = line.split_whitespace().collect();
            match words.first().copied() {
                Some("$if") => {
                    let &[_, cond] = words.as_slice() else {
                        return Err(syntax(format!("malformed $if: {}", line.trim_end())));
                    };
                    let value = *self
                        .conditions
                        .get(cond)
                        .ok_or_else(|| syntax(format!("unknown condition {cond}")))?;
                    stack.push((value, false));
                }
                Some("$else") => {
                    let top = stack
                        .last_mut()
                        .ok_or_else(|| syntax("$else without $if".to_string()))?;
                    if top.1 {
                        return Err(syntax("duplicate $else".to_string()));
                    }
                    *top = (!top.0, true);
                }
                Some("$endif") => {
                    stack
                        .pop()
                        .ok_or_else(|| syntax("$endif without $if".to_string()))?;
                }
                _ => {
                    if stack.iter().all(|(active, _)| *active) {
                        out.push_str(line);
                    }
                }
            }
        }
        if !stack.is_empty() {
            return Err(syntax("unterminated $if".to_string()));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn loader(roots: Vec<PathBuf>) -> TemplateLoader {
        TemplateLoader::new(
            roots,
            &["html/dart2js", "html", ""],
            &[("DART2JS", true), ("DARTIUM", false)],
        )
    }

    #[test]
    fn test_conditions() {
        let l = loader(vec![]);
        let text = "a\n$if DART2JS\nb\n$if DARTIUM\nc\n$else\nd\n$endif\n$else\ne\n$endif\nf\n";
        assert_eq!(l.preprocess("t", text).unwrap(), "a\nb\nd\nf\n");
    }

    #[test]
    fn test_condition_errors() {
        let l = loader(vec![]);
        assert!(l.preprocess("t", "$if NOPE\n$endif\n").is_err());
        assert!(l.preprocess("t", "$if DART2JS\n").is_err());
        assert!(l.preprocess("t", "$endif\n").is_err());
        assert!(l.preprocess("t", "$if DART2JS\n$else\n$else\n$endif\n").is_err());
    }

    #[test]
    fn test_search_order_and_builtin_fallback() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("html")).unwrap();
        fs::create_dir_all(dir.path().join("html/dart2js")).unwrap();
        fs::write(dir.path().join("html/x.darttemplate"), "generic\n").unwrap();
        fs::write(dir.path().join("html/dart2js/x.darttemplate"), "specific\n").unwrap();

        let l = loader(vec![dir.path().to_path_buf()]);
        assert_eq!(l.load("x.darttemplate").unwrap(), "specific\n");
        assert!(l.load("interface.darttemplate").unwrap().contains("$!MEMBERS"));
        assert!(l.try_load("impl_Nope.darttemplate").unwrap().is_none());
        assert!(matches!(
            l.load("impl_Nope.darttemplate"),
            Err(WeldError::TemplateNotFound(_))
        ));
    }
}
