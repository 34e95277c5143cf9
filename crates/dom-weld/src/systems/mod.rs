//! Generator systems
//!
//! A [`System`] receives every interface of the database in generation
//! order and writes into a shared [`Emitter`]. The dart:html front end
//! ([`HtmlInterfacesSystem`]) owns one [`Backend`]; for each interface the
//! backend hands out an [`ImplementationGenerator`] that receives the same
//! member stream as the interface file and writes the implementation side.

mod dart2js;
mod interfaces;
mod native;

pub use dart2js::HtmlDart2JsBackend;
pub use interfaces::HtmlInterfacesSystem;
pub use native::{to_webkit_name, NativeBackend, DEFAULT_DERIVED_SOURCES_PARTITIONS};

use crate::analysis::{analyze_operation, OperationInfo};
use crate::dom::{find_matching_attribute, is_dart_collection_type, is_pure_interface, list_implementation_info};
use crate::emitter::{Emitter, Hole};
use crate::error::WeldResult;
use crate::idl::{IdlAttribute, IdlConstant, IdlDatabase, IdlInterface, IdlOperation};
use crate::renamer::HtmlRenamer;
use crate::templates::TemplateLoader;
use crate::types::TypeRegistry;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Everything a system needs besides the emitter
#[derive(Debug)]
pub struct SystemOptions<'a> {
    pub templates: TemplateLoader,
    pub database: &'a IdlDatabase,
    pub types: &'a TypeRegistry<'a>,
    pub renamer: &'a HtmlRenamer<'a>,
    pub output_dir: PathBuf,
}

impl<'a> SystemOptions<'a> {
    /// Dart type of an IDL type, database interfaces renamed
    pub fn dart_type(&self, type_name: &str) -> String {
        self.types.dart_type(type_name)
    }

    /// Emit a library file listing `file_paths` as `#source` directives
    ///
    /// The template opens a `$!SOURCES` hole; paths are sorted and made
    /// relative to the library file.
    pub fn generate_lib_file(
        &self,
        emitter: &mut Emitter,
        template: &str,
        lib_file_path: &Path,
        file_paths: &[PathBuf],
        vars: &[(&str, &str)],
    ) -> WeldResult<()> {
        let template = self.templates.load(template)?;
        let root = emitter.file(lib_file_path);
        let sources = emitter.emit(root, &template, vars)?.get("SOURCES")?;
        let lib_dir = lib_file_path.parent().unwrap_or(Path::new(""));
        let mut relative: Vec<String> = file_paths
            .iter()
            .map(|path| massage_path(&relative_path(path, lib_dir)))
            .collect();
        relative.sort();
        for path in &relative {
            emitter.emit(sources, "#source('$PATH');\n", &[("PATH", path)])?;
        }
        debug!(path = %lib_file_path.display(), sources = file_paths.len(), "library file");
        Ok(())
    }
}

/// A code generation system driven over the whole database
pub trait System<'a> {
    fn process_interface(&mut self, emitter: &mut Emitter, interface: &'a IdlInterface) -> WeldResult<()>;

    /// Callback interfaces become function typedefs
    fn process_callback(
        &mut self,
        emitter: &mut Emitter,
        interface: &'a IdlInterface,
        info: &OperationInfo,
    ) -> WeldResult<()>;

    fn generate_libraries(&mut self, emitter: &mut Emitter) -> WeldResult<()>;

    fn finish(&mut self, _emitter: &mut Emitter) -> WeldResult<()> {
        Ok(())
    }
}

/// Implementation side of the dart:html library
pub trait Backend<'a> {
    fn options(&self) -> &SystemOptions<'a>;

    /// Generator for the implementation of one interface
    fn implementation_generator<'s>(
        &'s mut self,
        interface: &'a IdlInterface,
    ) -> Box<dyn ImplementationGenerator<'a> + 's>;

    fn process_callback(
        &mut self,
        _emitter: &mut Emitter,
        _interface: &IdlInterface,
        _info: &OperationInfo,
    ) -> WeldResult<()> {
        Ok(())
    }

    /// Emit the library file including `interface_files` and the backend's own files
    fn generate_libraries(&mut self, emitter: &mut Emitter, interface_files: &[PathBuf]) -> WeldResult<()>;
}

/// Per-interface implementation generator handed out by a [`Backend`]
pub trait ImplementationGenerator<'a> {
    fn has_implementation(&self) -> bool;
    fn implementation_class_name(&self) -> String;
    fn implementation_path(&self) -> PathBuf;
    fn factory_provider_path(&self) -> PathBuf;
    fn elements_factory_provider_path(&self) -> PathBuf;

    /// Whether members of merged interfaces are also added to this class
    fn implements_merged_members(&self) -> bool;

    /// Open the implementation class in `implementation`; returns the
    /// members hole the front end emits `on` getters into.
    fn start_interface(&mut self, emitter: &mut Emitter, implementation: Hole) -> WeldResult<Hole>;

    fn emit_factory_provider(
        &mut self,
        emitter: &mut Emitter,
        at: Hole,
        info: &OperationInfo,
        factory_provider: &str,
    ) -> WeldResult<()>;

    fn add_indexer(&mut self, emitter: &mut Emitter, element_type: &str) -> WeldResult<()>;

    fn amend_indexer(&mut self, _emitter: &mut Emitter, _element_type: &str) -> WeldResult<()> {
        Ok(())
    }

    fn add_attribute(
        &mut self,
        emitter: &mut Emitter,
        attribute: &IdlAttribute,
        html_name: &str,
        read_only: bool,
    ) -> WeldResult<()>;

    fn add_operation(&mut self, emitter: &mut Emitter, info: &OperationInfo, html_name: &str) -> WeldResult<()>;

    fn add_constant(&mut self, _emitter: &mut Emitter, _constant: &IdlConstant) -> WeldResult<()> {
        Ok(())
    }

    /// Members that follow come from the secondary parent `interface`
    fn secondary_context(&mut self, _emitter: &mut Emitter, _interface: &'a IdlInterface) -> WeldResult<()> {
        Ok(())
    }

    fn finish_interface(&mut self, emitter: &mut Emitter) -> WeldResult<()>;
}

/// Walk over the members of one interface
///
/// [`MemberWalk::generate`] drives the callbacks: own constants, attributes,
/// indexer and operations first, then members inherited from secondary
/// parents that the interface does not already declare.
pub trait MemberWalk<'a> {
    fn database(&self) -> &'a IdlDatabase;
    fn interface(&self) -> &'a IdlInterface;

    fn start_interface(&mut self, emitter: &mut Emitter) -> WeldResult<()>;
    fn finish_interface(&mut self, emitter: &mut Emitter) -> WeldResult<()>;
    fn add_constant(&mut self, emitter: &mut Emitter, constant: &'a IdlConstant) -> WeldResult<()>;
    fn add_attribute(&mut self, emitter: &mut Emitter, attribute: &'a IdlAttribute) -> WeldResult<()>;
    fn add_secondary_attribute(
        &mut self,
        emitter: &mut Emitter,
        parent: &'a IdlInterface,
        attribute: &'a IdlAttribute,
    ) -> WeldResult<()>;
    fn add_indexer(&mut self, emitter: &mut Emitter, element_type: &str) -> WeldResult<()>;
    fn amend_indexer(&mut self, emitter: &mut Emitter, element_type: &str) -> WeldResult<()>;
    fn add_operation(&mut self, emitter: &mut Emitter, info: &OperationInfo) -> WeldResult<()>;
    fn add_static_operation(&mut self, emitter: &mut Emitter, info: &OperationInfo) -> WeldResult<()>;
    fn add_secondary_operation(
        &mut self,
        emitter: &mut Emitter,
        parent: &'a IdlInterface,
        info: &OperationInfo,
    ) -> WeldResult<()>;

    fn generate(&mut self, emitter: &mut Emitter) -> WeldResult<()> {
        let interface = self.interface();
        debug!(interface = %interface.id, "generating");
        self.start_interface(emitter)?;
        self.add_members(emitter, interface)?;
        self.add_secondary_members(emitter, interface)?;
        self.finish_interface(emitter)
    }

    fn add_members(&mut self, emitter: &mut Emitter, interface: &'a IdlInterface) -> WeldResult<()> {
        let mut constants: Vec<&IdlConstant> = interface.constants.iter().collect();
        constants.sort_by(|a, b| a.id.cmp(&b.id));
        for constant in constants {
            self.add_constant(emitter, constant)?;
        }

        for attribute in interface.attributes.iter().filter(|a| a.type_id != "EventListener") {
            self.add_attribute(emitter, attribute)?;
        }

        if let Some((element_type, requires_indexer)) = list_implementation_info(interface, self.database()) {
            if requires_indexer {
                self.add_indexer(emitter, element_type)?;
            } else {
                self.amend_indexer(emitter, element_type)?;
            }
        }

        for operations in group_operations(&interface.operations).values() {
            let info = analyze_operation(interface, operations)?;
            if info.is_static() {
                self.add_static_operation(emitter, &info)?;
            } else {
                self.add_operation(emitter, &info)?;
            }
        }
        Ok(())
    }

    fn add_secondary_members(&mut self, emitter: &mut Emitter, interface: &'a IdlInterface) -> WeldResult<()> {
        for parent in transitive_secondary_parents(self.database(), interface) {
            for attribute in parent.attributes.iter().filter(|a| a.type_id != "EventListener") {
                if find_matching_attribute(interface, attribute).is_none() {
                    self.add_secondary_attribute(emitter, parent, attribute)?;
                }
            }
            for (id, operations) in group_operations(&parent.operations) {
                if !interface.has_operation(id) {
                    let info = analyze_operation(interface, &operations)?;
                    self.add_secondary_operation(emitter, parent, &info)?;
                }
            }
        }
        Ok(())
    }
}

/// Operations grouped into overload sets, ordered by name
pub fn group_operations(operations: &[IdlOperation]) -> BTreeMap<&str, Vec<IdlOperation>> {
    let mut groups: BTreeMap<&str, Vec<IdlOperation>> = BTreeMap::new();
    for operation in operations {
        groups.entry(operation.id.as_str()).or_default().push(operation.clone());
    }
    groups
}

/// Parents whose members are copied rather than inherited
///
/// The primary parent chain is inherited by the generated class; every other
/// parent is walked transitively. A pure primary parent has no class, so in
/// that case all parents are secondary. Collection types are skipped.
pub fn transitive_secondary_parents<'a>(database: &'a IdlDatabase, interface: &IdlInterface) -> Vec<&'a IdlInterface> {
    fn walk<'a>(database: &'a IdlDatabase, parents: &[crate::idl::IdlParent], out: &mut Vec<&'a IdlInterface>) {
        for parent in parents {
            if is_dart_collection_type(&parent.type_id) {
                continue;
            }
            if let Ok(parent) = database.get_interface(&parent.type_id) {
                out.push(parent);
                walk(database, &parent.parents, out);
            }
        }
    }

    let mut out = Vec::new();
    if let Some(first) = interface.parents.first() {
        let secondary = if is_pure_interface(&first.type_id) {
            &interface.parents[..]
        } else {
            &interface.parents[1..]
        };
        walk(database, secondary, &mut out);
    }
    out
}

/// Drive `system` over every interface of `database`, parents first
pub fn generate<'a>(database: &'a IdlDatabase, system: &mut dyn System<'a>, emitter: &mut Emitter) -> WeldResult<()> {
    for interface in database.generation_order() {
        if interface.is_callback() {
            let info = analyze_operation(interface, &interface.operations)?;
            system.process_callback(emitter, interface, &info)?;
        } else {
            system.process_interface(emitter, interface)?;
        }
    }
    system.generate_libraries(emitter)?;
    system.finish(emitter)
}

/// `path` relative to the directory `base`
pub fn relative_path(path: &Path, base: &Path) -> PathBuf {
    let path: Vec<Component> = path.components().collect();
    let base: Vec<Component> = base.components().collect();
    let common = path.iter().zip(&base).take_while(|(a, b)| a == b).count();
    let mut out = PathBuf::new();
    for _ in common..base.len() {
        out.push("..");
    }
    for component in &path[common..] {
        out.push(component.as_os_str());
    }
    out
}

/// Forward slashes regardless of host
pub fn massage_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Flavor {
        Dart2Js,
        Native,
    }

    /// Run the dart:html front end with one backend over `db`
    pub fn run_html(db: &IdlDatabase, out: &Path, flavor: Flavor) -> Emitter {
        let renamer = HtmlRenamer::new(db);
        let types = TypeRegistry::new(db).with_renamer(&renamer);
        let options = |subpaths: &[&str], conditions: &[(&str, bool)]| SystemOptions {
            templates: TemplateLoader::new(Vec::new(), subpaths, conditions),
            database: db,
            types: &types,
            renamer: &renamer,
            output_dir: out.to_path_buf(),
        };
        let backend: Box<dyn Backend<'_> + '_> = match flavor {
            Flavor::Dart2Js => Box::new(HtmlDart2JsBackend::new(options(
                &["html/dart2js", "html/impl", "html", ""],
                &[("DART2JS", true), ("DARTIUM", false)],
            ))),
            Flavor::Native => Box::new(NativeBackend::new(
                options(
                    &["dom/native", "html/dartium", "html/impl", ""],
                    &[("DARTIUM", true), ("DART2JS", false)],
                ),
                "../html",
            )),
        };
        let mut system = HtmlInterfacesSystem::new(options(&["html/interface", "html/impl", "html", ""], &[]), backend);
        let mut emitter = Emitter::new();
        generate(db, &mut system, &mut emitter).unwrap();
        emitter
    }

    /// Everything emitted into the file at `path`
    pub fn read(emitter: &mut Emitter, path: PathBuf) -> String {
        let hole = emitter.file(path);
        emitter.fragments(hole)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idl::{IdlAttribute, IdlOperation};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_relative_path() {
        assert_eq!(
            relative_path(Path::new("out/html/interface/Node.dart"), Path::new("out")),
            PathBuf::from("html/interface/Node.dart")
        );
        assert_eq!(
            relative_path(Path::new("out/cpp/DartNode.cpp"), Path::new("out/gen")),
            PathBuf::from("../cpp/DartNode.cpp")
        );
        assert_eq!(massage_path(Path::new("a\\b.dart")), "a/b.dart");
    }

    #[test]
    fn test_secondary_parents() {
        let db = IdlDatabase::new()
            .with_interface(IdlInterface::new("Node"))
            .with_interface(IdlInterface::new("ElementTraversal"))
            .with_interface(IdlInterface::new("NodeSelector"))
            .with_interface(IdlInterface::new("Mixin").parent("NodeSelector"))
            .with_interface(
                IdlInterface::new("Element")
                    .parent("Node")
                    .parent("ElementTraversal")
                    .parent("Mixin"),
            )
            .with_interface(IdlInterface::new("Pure").parent("ElementTraversal").parent("Node"));

        let ids = |iface: &str| {
            transitive_secondary_parents(&db, db.get_interface(iface).unwrap())
                .into_iter()
                .map(|i| i.id.as_str())
                .collect::<Vec<_>>()
        };
        assert_eq!(ids("Element"), vec!["ElementTraversal", "Mixin", "NodeSelector"]);
        assert_eq!(ids("Pure"), vec!["ElementTraversal", "Node"]);
        assert!(ids("Node").is_empty());
    }

    #[derive(Default)]
    struct Recorder<'a> {
        interface: Option<&'a IdlInterface>,
        database: Option<&'a IdlDatabase>,
        log: Vec<String>,
    }

    impl<'a> MemberWalk<'a> for Recorder<'a> {
        fn database(&self) -> &'a IdlDatabase {
            self.database.unwrap()
        }
        fn interface(&self) -> &'a IdlInterface {
            self.interface.unwrap()
        }
        fn start_interface(&mut self, _: &mut Emitter) -> WeldResult<()> {
            self.log.push("start".into());
            Ok(())
        }
        fn finish_interface(&mut self, _: &mut Emitter) -> WeldResult<()> {
            self.log.push("finish".into());
            Ok(())
        }
        fn add_constant(&mut self, _: &mut Emitter, c: &'a IdlConstant) -> WeldResult<()> {
            self.log.push(format!("const {}", c.id));
            Ok(())
        }
        fn add_attribute(&mut self, _: &mut Emitter, a: &'a IdlAttribute) -> WeldResult<()> {
            self.log.push(format!("attr {}", a.id));
            Ok(())
        }
        fn add_secondary_attribute(&mut self, _: &mut Emitter, p: &'a IdlInterface, a: &'a IdlAttribute) -> WeldResult<()> {
            self.log.push(format!("attr {}.{}", p.id, a.id));
            Ok(())
        }
        fn add_indexer(&mut self, _: &mut Emitter, t: &str) -> WeldResult<()> {
            self.log.push(format!("indexer {t}"));
            Ok(())
        }
        fn amend_indexer(&mut self, _: &mut Emitter, t: &str) -> WeldResult<()> {
            self.log.push(format!("amend {t}"));
            Ok(())
        }
        fn add_operation(&mut self, _: &mut Emitter, info: &OperationInfo) -> WeldResult<()> {
            self.log.push(format!("op {}/{}", info.name, info.operations.len()));
            Ok(())
        }
        fn add_static_operation(&mut self, _: &mut Emitter, info: &OperationInfo) -> WeldResult<()> {
            self.log.push(format!("static {}", info.name));
            Ok(())
        }
        fn add_secondary_operation(&mut self, _: &mut Emitter, p: &'a IdlInterface, info: &OperationInfo) -> WeldResult<()> {
            self.log.push(format!("op {}.{}", p.id, info.name));
            Ok(())
        }
    }

    #[test]
    fn test_member_walk_order() {
        let db = IdlDatabase::new()
            .with_interface(IdlInterface::new("Node"))
            .with_interface(
                IdlInterface::new("ElementTraversal")
                    .attribute(IdlAttribute::new("firstElementChild", "Element"))
                    .attribute(IdlAttribute::new("shared", "long"))
                    .operation(IdlOperation::new("remove", "void")),
            )
            .with_interface(
                IdlInterface::new("Element")
                    .parent("Node")
                    .parent("ElementTraversal")
                    .parent("sequence<Node>")
                    .constant(IdlConstant::new("Z_CONST", "long", "2"))
                    .constant(IdlConstant::new("A_CONST", "long", "1"))
                    .attribute(IdlAttribute::new("shared", "long"))
                    .attribute(IdlAttribute::new("onclick", "EventListener"))
                    .operation(IdlOperation::new("remove", "void"))
                    .operation(IdlOperation::new("create", "Element").static_op())
                    .operation(IdlOperation::new("item", "Node"))
                    .operation(IdlOperation::new("item", "Node").arg(crate::idl::IdlArgument::new("i", "long"))),
            );
        let mut walk = Recorder {
            interface: Some(db.get_interface("Element").unwrap()),
            database: Some(&db),
            log: Vec::new(),
        };
        walk.generate(&mut Emitter::new()).unwrap();
        assert_eq!(
            walk.log,
            vec![
                "start",
                "const A_CONST",
                "const Z_CONST",
                "attr shared",
                "indexer Node",
                "static create",
                "op item/2",
                "op remove/1",
                "attr ElementTraversal.firstElementChild",
                "finish",
            ]
        );
    }
}
