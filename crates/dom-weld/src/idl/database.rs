//! IDL database
//!
//! Loads parsed interface documents from disk and answers the lookups the
//! generators need.

use crate::error::{WeldError, WeldResult};
use crate::idl::IdlInterface;
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::debug;

lazy_static! {
    static ref TYPE_WORD: Regex = Regex::new(r"\w+").unwrap();
}

#[derive(Deserialize)]
struct DatabaseDocument {
    interfaces: Vec<IdlInterface>,
}

/// Collection of interfaces keyed by id
#[derive(Debug, Clone, Default)]
pub struct IdlDatabase {
    interfaces: IndexMap<String, IdlInterface>,
}

impl IdlDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a single `{"interfaces": [...]}` file or from a directory
    /// holding one interface per `*.json` file.
    pub fn load(path: &Path) -> WeldResult<Self> {
        let mut db = Self::new();
        if path.is_dir() {
            let mut files: Vec<_> = fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
                .collect();
            files.sort();
            for file in files {
                let text = fs::read_to_string(&file)?;
                let interface: IdlInterface =
                    serde_json::from_str(&text).map_err(|source| WeldError::Database {
                        file: file.clone(),
                        source,
                    })?;
                db.add_interface(interface);
            }
        } else {
            let text = fs::read_to_string(path)?;
            let document: DatabaseDocument =
                serde_json::from_str(&text).map_err(|source| WeldError::Database {
                    file: path.to_path_buf(),
                    source,
                })?;
            for interface in document.interfaces {
                db.add_interface(interface);
            }
        }
        debug!(count = db.interfaces.len(), path = %path.display(), "loaded IDL database");
        Ok(db)
    }

    /// Add or replace an interface
    ///
    /// Members without a documented owner are attributed to `interface`.
    pub fn add_interface(&mut self, mut interface: IdlInterface) {
        for attribute in &mut interface.attributes {
            attribute
                .doc_js_interface_name
                .get_or_insert_with(|| interface.id.clone());
        }
        for operation in &mut interface.operations {
            operation
                .doc_js_interface_name
                .get_or_insert_with(|| interface.id.clone());
        }
        self.interfaces.insert(interface.id.clone(), interface);
    }

    /// Rename interfaces and every type reference to them
    ///
    /// Renamed interfaces are bound to JavaScript under their new name and
    /// keep the old one for documentation.
    pub fn rename_types(&mut self, renames: &[(&str, &str)]) {
        let table: HashMap<&str, &str> = renames.iter().copied().collect();
        let convert = |type_name: &mut String| {
            let renamed = TYPE_WORD.replace_all(type_name.as_str(), |caps: &Captures| {
                table.get(&caps[0]).copied().unwrap_or(&caps[0]).to_string()
            });
            if renamed != type_name.as_str() {
                *type_name = renamed.into_owned();
            }
        };

        let interfaces = std::mem::take(&mut self.interfaces);
        for (_, mut interface) in interfaces {
            if let Some(new_id) = table.get(interface.id.as_str()) {
                debug!(from = %interface.id, to = new_id, "renaming interface");
                interface.doc_js_name.get_or_insert_with(|| interface.id.clone());
                interface.id = new_id.to_string();
                interface.javascript_binding_name = Some(new_id.to_string());
            }
            for parent in &mut interface.parents {
                convert(&mut parent.type_id);
            }
            for attribute in &mut interface.attributes {
                convert(&mut attribute.type_id);
            }
            for operation in &mut interface.operations {
                convert(&mut operation.type_id);
                for argument in &mut operation.arguments {
                    convert(&mut argument.type_id);
                }
            }
            for constant in &mut interface.constants {
                convert(&mut constant.type_id);
            }
            self.interfaces.insert(interface.id.clone(), interface);
        }
    }

    /// Builder form of [`IdlDatabase::add_interface`]
    pub fn with_interface(mut self, interface: IdlInterface) -> Self {
        self.add_interface(interface);
        self
    }

    pub fn has_interface(&self, id: &str) -> bool {
        self.interfaces.contains_key(id)
    }

    pub fn get_interface(&self, id: &str) -> WeldResult<&IdlInterface> {
        self.interfaces
            .get(id)
            .ok_or_else(|| WeldError::InterfaceNotFound(id.to_string()))
    }

    pub fn interfaces(&self) -> impl Iterator<Item = &IdlInterface> {
        self.interfaces.values()
    }

    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }

    /// The interface followed by every transitive parent present in the
    /// database, depth first in declaration order, each listed once.
    pub fn hierarchy<'a>(&'a self, interface: &'a IdlInterface) -> Vec<&'a IdlInterface> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        self.walk_hierarchy(interface, &mut seen, &mut out);
        out
    }

    fn walk_hierarchy<'a>(
        &'a self,
        interface: &'a IdlInterface,
        seen: &mut HashSet<&'a str>,
        out: &mut Vec<&'a IdlInterface>,
    ) {
        if !seen.insert(interface.id.as_str()) {
            return;
        }
        out.push(interface);
        for parent in &interface.parents {
            if let Some(parent) = self.interfaces.get(&parent.type_id) {
                self.walk_hierarchy(parent, seen, out);
            }
        }
    }

    /// Interfaces sorted by id, with every parent before its children
    pub fn generation_order(&self) -> Vec<&IdlInterface> {
        let mut ids: Vec<&String> = self.interfaces.keys().collect();
        ids.sort();
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for id in ids {
            self.visit_parents_first(id, &mut seen, &mut out);
        }
        out
    }

    fn visit_parents_first<'a>(
        &'a self,
        id: &str,
        seen: &mut HashSet<&'a str>,
        out: &mut Vec<&'a IdlInterface>,
    ) {
        let Some(interface) = self.interfaces.get(id) else {
            return;
        };
        if !seen.insert(interface.id.as_str()) {
            return;
        }
        for parent in &interface.parents {
            self.visit_parents_first(&parent.type_id, seen, out);
        }
        out.push(interface);
    }
}
