//! IDL type registry
//!
//! Resolves IDL type names to [`IdlTypeInfo`] descriptors. Names are matched
//! against the static table; `sequence<T>` and `T[]` resolve their element
//! recursively. Anything else is treated as an interface type. Descriptors
//! are memoised per registry.
//!
//! The fallback is permissive; [`TypeRegistry::unregistered_types`] lists the
//! names the database references that neither the table nor the database
//! knows, so callers can choose to reject them.

mod info;
mod table;

pub use info::{IdlTypeInfo, TypeKind};
pub use table::{dart_type, is_registered_type, type_data, TypeClass, TypeData};

use crate::idl::IdlDatabase;
use crate::renamer::HtmlRenamer;
use lazy_static::lazy_static;
use regex::Regex;
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::iter;
use std::rc::Rc;
use tracing::debug;

lazy_static! {
    static ref SEQUENCE: Regex = Regex::new(r"^(?:sequence<(\w+)>|(\w+)\[\])$").unwrap();
}

/// Memoising resolver of IDL type names
#[derive(Debug)]
pub struct TypeRegistry<'a> {
    database: &'a IdlDatabase,
    renamer: Option<&'a HtmlRenamer<'a>>,
    cache: RefCell<HashMap<String, Rc<IdlTypeInfo>>>,
}

impl<'a> TypeRegistry<'a> {
    pub fn new(database: &'a IdlDatabase) -> Self {
        Self {
            database,
            renamer: None,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Rename database interfaces through `renamer` in [`TypeRegistry::dart_type`]
    pub fn with_renamer(mut self, renamer: &'a HtmlRenamer<'a>) -> Self {
        self.renamer = Some(renamer);
        self
    }

    pub fn database(&self) -> &'a IdlDatabase {
        self.database
    }

    /// Descriptor for `type_name`
    pub fn type_info(&self, type_name: &str) -> Rc<IdlTypeInfo> {
        if let Some(info) = self.cache.borrow().get(type_name) {
            return Rc::clone(info);
        }
        let info = Rc::new(self.resolve(type_name));
        self.cache
            .borrow_mut()
            .insert(type_name.to_string(), Rc::clone(&info));
        info
    }

    fn resolve(&self, type_name: &str) -> IdlTypeInfo {
        if let Some(caps) = SEQUENCE.captures(type_name) {
            let sequence = TypeData::new(TypeClass::Sequence);
            if type_name == "DOMString[]" {
                return IdlTypeInfo::new(
                    type_name,
                    sequence,
                    TypeKind::DomStringArray(self.type_info("DOMString")),
                );
            }
            let item = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
            return IdlTypeInfo::new(type_name, sequence, TypeKind::Sequence(self.type_info(item)));
        }
        let Some(data) = type_data(type_name) else {
            return IdlTypeInfo::new(type_name, TypeData::new(TypeClass::Interface), TypeKind::Interface);
        };
        let kind = match data.class {
            TypeClass::Primitive => TypeKind::Primitive,
            TypeClass::SvgTearOff => TypeKind::SvgTearOff,
            TypeClass::Interface | TypeClass::Sequence => TypeKind::Interface,
        };
        IdlTypeInfo::new(type_name, data, kind)
    }

    /// Dart type for `type_name`, with database interfaces renamed
    pub fn dart_type(&self, type_name: &str) -> String {
        let dart_type = self.type_info(type_name).dart_type();
        match self.database.get_interface(&dart_type) {
            Ok(interface) => match self.renamer {
                Some(renamer) => renamer.rename_interface(interface),
                None => interface.id.clone(),
            },
            Err(_) => dart_type,
        }
    }

    /// Type names referenced by the database that are neither in the table
    /// nor database interfaces, sorted
    pub fn unregistered_types(&self) -> Vec<String> {
        let mut names = BTreeSet::new();
        for interface in self.database.interfaces() {
            let references = interface
                .parents
                .iter()
                .map(|p| p.type_id.as_str())
                .chain(interface.attributes.iter().map(|a| a.type_id.as_str()))
                .chain(interface.constants.iter().map(|c| c.type_id.as_str()))
                .chain(interface.operations.iter().flat_map(|op| {
                    iter::once(op.type_id.as_str()).chain(op.arguments.iter().map(|a| a.type_id.as_str()))
                }));
            for type_name in references {
                self.collect_unregistered(&self.type_info(type_name), &mut names);
            }
        }
        for name in &names {
            debug!(type_name = %name, "unregistered IDL type, treated as interface");
        }
        names.into_iter().collect()
    }

    fn collect_unregistered(&self, info: &IdlTypeInfo, names: &mut BTreeSet<String>) {
        match info.kind() {
            TypeKind::Sequence(item) | TypeKind::DomStringArray(item) => self.collect_unregistered(item, names),
            TypeKind::Interface
                if !is_registered_type(info.idl_type()) && !self.database.has_interface(info.idl_type()) =>
            {
                names.insert(info.idl_type().to_string());
            }
            _ => {}
        }
    }
}
