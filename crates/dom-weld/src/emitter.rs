//! Template emitter
//!
//! Generated files are trees of text fragments. Templates contain
//! placeholders that are substituted at emission time:
//!
//! - `$NAME` and `$(NAME)` insert a bound value,
//! - `$!NAME` opens a hole, a nested insertion point returned to the caller,
//! - `$$` is a literal dollar sign.
//!
//! Names are `[A-Z_][A-Z0-9_]*`; a `$` followed by anything else is kept
//! as-is, so `$dom_addEventListener` passes through untouched.
//!
//! Every node of every file lives in one arena owned by [`Emitter`] and is
//! addressed by a copyable [`Hole`]. A hole inherits the bindings that were in
//! scope when it was created.

use crate::error::{WeldError, WeldResult};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Insertion point inside the emitter arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hole(usize);

#[derive(Debug)]
enum Fragment {
    Text(String),
    Child(usize),
}

#[derive(Debug, Default)]
struct Node {
    fragments: Vec<Fragment>,
    bindings: IndexMap<String, String>,
}

/// Holes opened by one emission, in template order
#[derive(Debug, Default)]
pub struct Holes(Vec<(String, Hole)>);

impl Holes {
    /// Hole opened by `$!name`
    pub fn get(&self, name: &str) -> WeldResult<Hole> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, h)| *h)
            .ok_or_else(|| WeldError::MissingHole(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Hole)> {
        self.0.iter().map(|(n, h)| (n.as_str(), *h))
    }
}

enum Piece<'t> {
    Text(&'t str),
    Dollar,
    Var(&'t str),
    Hole(&'t str),
}

fn is_name_start(c: u8) -> bool {
    c.is_ascii_uppercase() || c == b'_'
}

fn is_name_char(c: u8) -> bool {
    c.is_ascii_uppercase() || c.is_ascii_digit() || c == b'_'
}

fn name_end(bytes: &[u8], start: usize) -> Option<usize> {
    if start >= bytes.len() || !is_name_start(bytes[start]) {
        return None;
    }
    let mut end = start + 1;
    while end < bytes.len() && is_name_char(bytes[end]) {
        end += 1;
    }
    Some(end)
}

fn tokenize(template: &str) -> Vec<Piece<'_>> {
    let bytes = template.as_bytes();
    let mut pieces = Vec::new();
    let mut literal = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'$' || i + 1 >= bytes.len() {
            i += 1;
            continue;
        }
        let (piece, next) = match bytes[i + 1] {
            b'$' => (Piece::Dollar, i + 2),
            b'!' => match name_end(bytes, i + 2) {
                Some(end) => (Piece::Hole(&template[i + 2..end]), end),
                None => {
                    i += 1;
                    continue;
                }
            },
            b'(' => match name_end(bytes, i + 2) {
                Some(end) if end < bytes.len() && bytes[end] == b')' => {
                    (Piece::Var(&template[i + 2..end]), end + 1)
                }
                _ => {
                    i += 1;
                    continue;
                }
            },
            _ => match name_end(bytes, i + 1) {
                Some(end) => (Piece::Var(&template[i + 1..end]), end),
                None => {
                    i += 1;
                    continue;
                }
            },
        };
        if literal < i {
            pieces.push(Piece::Text(&template[literal..i]));
        }
        pieces.push(piece);
        i = next;
        literal = next;
    }
    if literal < bytes.len() {
        pieces.push(Piece::Text(&template[literal..]));
    }
    pieces
}

/// Arena of emission trees, one root per output file plus scratch roots
#[derive(Debug, Default)]
pub struct Emitter {
    nodes: Vec<Node>,
    files: BTreeMap<PathBuf, Hole>,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, bindings: IndexMap<String, String>) -> Hole {
        self.nodes.push(Node {
            fragments: Vec::new(),
            bindings,
        });
        Hole(self.nodes.len() - 1)
    }

    /// Root hole of the file at `path`, created on first use
    pub fn file(&mut self, path: impl AsRef<Path>) -> Hole {
        let path = path.as_ref().to_path_buf();
        if let Some(hole) = self.files.get(&path) {
            return *hole;
        }
        let hole = self.alloc(IndexMap::new());
        self.files.insert(path, hole);
        hole
    }

    /// Root hole that belongs to no file
    pub fn scratch(&mut self) -> Hole {
        self.alloc(IndexMap::new())
    }

    /// Paths of every file created so far, sorted
    pub fn file_paths(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    /// Bind a value visible to every later emission into `at` and its new holes
    pub fn bind(&mut self, at: Hole, name: &str, value: impl Into<String>) {
        self.nodes[at.0].bindings.insert(name.to_string(), value.into());
    }

    /// Substitute `template` and append it at `at`
    ///
    /// `vars` shadow the bindings inherited by `at`. Returns the holes the
    /// template opened; each inherits the merged bindings.
    pub fn emit(&mut self, at: Hole, template: &str, vars: &[(&str, &str)]) -> WeldResult<Holes> {
        let mut scope = self.nodes[at.0].bindings.clone();
        for (name, value) in vars {
            scope.insert((*name).to_string(), (*value).to_string());
        }

        let mut text = String::new();
        let mut fragments = Vec::new();
        let mut holes = Vec::new();
        for piece in tokenize(template) {
            match piece {
                Piece::Text(t) => text.push_str(t),
                Piece::Dollar => text.push('$'),
                Piece::Var(name) => {
                    let value = scope.get(name).ok_or_else(|| WeldError::MissingPlaceholder {
                        name: name.to_string(),
                    })?;
                    text.push_str(value);
                }
                Piece::Hole(name) => {
                    if !text.is_empty() {
                        fragments.push(Fragment::Text(std::mem::take(&mut text)));
                    }
                    let hole = self.alloc(scope.clone());
                    fragments.push(Fragment::Child(hole.0));
                    holes.push((name.to_string(), hole));
                }
            }
        }
        if !text.is_empty() {
            fragments.push(Fragment::Text(text));
        }
        self.nodes[at.0].fragments.extend(fragments);
        Ok(Holes(holes))
    }

    /// Append text without substitution
    pub fn emit_raw(&mut self, at: Hole, text: impl Into<String>) {
        self.nodes[at.0].fragments.push(Fragment::Text(text.into()));
    }

    /// Graft the tree rooted at `child` into `at`
    pub fn attach(&mut self, at: Hole, child: Hole) {
        self.nodes[at.0].fragments.push(Fragment::Child(child.0));
    }

    /// Whether nothing has been emitted under `at`
    pub fn is_empty(&self, at: Hole) -> bool {
        self.nodes[at.0].fragments.iter().all(|f| match f {
            Fragment::Text(t) => t.is_empty(),
            Fragment::Child(c) => self.is_empty(Hole(*c)),
        })
    }

    /// Flattened text of the tree rooted at `at`
    pub fn fragments(&self, at: Hole) -> String {
        let mut out = String::new();
        self.render(at.0, &mut out);
        out
    }

    fn render(&self, index: usize, out: &mut String) {
        for fragment in &self.nodes[index].fragments {
            match fragment {
                Fragment::Text(t) => out.push_str(t),
                Fragment::Child(c) => self.render(*c, out),
            }
        }
    }

    /// Write every file whose content differs from what is on disk
    pub fn flush(&self) -> WeldResult<FlushReport> {
        let mut report = FlushReport::default();
        for (path, hole) in &self.files {
            let content = self.fragments(*hole);
            if fs::read_to_string(path).is_ok_and(|existing| existing == content) {
                report.unchanged += 1;
                continue;
            }
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, content)?;
            debug!(path = %path.display(), "wrote");
            report.written.push(path.clone());
        }
        Ok(report)
    }
}

/// Outcome of [`Emitter::flush`]
#[derive(Debug, Default)]
pub struct FlushReport {
    pub written: Vec<PathBuf>,
    pub unchanged: usize,
}

/// Substitute a template into a string
pub fn format(template: &str, vars: &[(&str, &str)]) -> WeldResult<String> {
    let mut emitter = Emitter::new();
    let root = emitter.scratch();
    emitter.emit(root, template, vars)?;
    Ok(emitter.fragments(root))
}
