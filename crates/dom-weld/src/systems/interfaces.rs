//! dart:html interfaces
//!
//! Writes one Dart interface per IDL interface under `html/interface/` and
//! forwards every member to the backend's implementation generator. Events,
//! factory providers, element constructors and merged interfaces are handled
//! here so every backend shares them.

use super::{Backend, ImplementationGenerator, MemberWalk, System, SystemOptions};
use crate::analysis::{analyze_constructor, type_or_nothing, OperationInfo};
use crate::dom::{
    dart_dom_name_of_attribute, interface_factory, match_source_filter,
    maybe_typed_array_element_type_in_hierarchy,
};
use crate::emitter::{Emitter, Hole};
use crate::error::{WeldError, WeldResult};
use crate::html::elements::{emit_html_element_factory_constructors, html_element_constructor_infos};
use crate::html::events::{dom_to_html_event, dom_to_html_events, event_attributes};
use crate::html::{is_merged_interface, is_private, merged_into};
use crate::idl::{IdlAttribute, IdlConstant, IdlDatabase, IdlInterface};
use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;

/// Front end generating the dart:html interfaces around a backend
pub struct HtmlInterfacesSystem<'a> {
    options: SystemOptions<'a>,
    backend: Box<dyn Backend<'a> + 'a>,
    event_classes: HashSet<String>,
    interface_files: Vec<PathBuf>,
    elements_factory: Option<Hole>,
}

impl<'a> HtmlInterfacesSystem<'a> {
    pub fn new(options: SystemOptions<'a>, backend: Box<dyn Backend<'a> + 'a>) -> Self {
        Self {
            options,
            backend,
            event_classes: HashSet::new(),
            interface_files: Vec::new(),
            elements_factory: None,
        }
    }

    fn interface_path(&self, name: &str) -> PathBuf {
        self.options
            .output_dir
            .join("html")
            .join("interface")
            .join(format!("{name}.dart"))
    }

    /// Files included by the generated library so far
    pub fn interface_files(&self) -> &[PathBuf] {
        &self.interface_files
    }
}

impl<'a> System<'a> for HtmlInterfacesSystem<'a> {
    fn process_interface(&mut self, emitter: &mut Emitter, interface: &'a IdlInterface) -> WeldResult<()> {
        let placeholder = emitter.scratch();
        let mut generator = HtmlInterfaceGenerator {
            options: &self.options,
            event_classes: &mut self.event_classes,
            interface_files: &mut self.interface_files,
            elements_factory: &mut self.elements_factory,
            backend: self.backend.implementation_generator(interface),
            backend_enabled: true,
            interface,
            html_interface_name: self.options.renamer.rename_interface(interface),
            interface_file: placeholder,
            members: placeholder,
            implementation: placeholder,
            implementation_members: placeholder,
        };
        generator.generate(emitter)
    }

    fn process_callback(
        &mut self,
        emitter: &mut Emitter,
        interface: &'a IdlInterface,
        info: &OperationInfo,
    ) -> WeldResult<()> {
        let path = self.interface_path(&interface.id);
        self.interface_files.push(path.clone());
        let file = emitter.file(path);
        let template = self.options.templates.load("callback.darttemplate")?;
        emitter.emit(file, &template, &[])?;
        let params = info.parameters_implementation_declaration(|t| self.options.dart_type(t), "null")?;
        emitter.emit(
            file,
            "typedef $TYPE $NAME($PARAMS);\n",
            &[
                ("TYPE", &self.options.dart_type(&info.type_name)),
                ("NAME", &interface.id),
                ("PARAMS", &params),
            ],
        )?;
        self.backend.process_callback(emitter, interface, info)
    }

    fn generate_libraries(&mut self, emitter: &mut Emitter) -> WeldResult<()> {
        self.backend.generate_libraries(emitter, &self.interface_files)
    }
}

struct HtmlInterfaceGenerator<'s, 'a> {
    options: &'s SystemOptions<'a>,
    event_classes: &'s mut HashSet<String>,
    interface_files: &'s mut Vec<PathBuf>,
    elements_factory: &'s mut Option<Hole>,
    backend: Box<dyn ImplementationGenerator<'a> + 's>,
    /// Off while members of merged interfaces are added to a backend that
    /// cannot implement them
    backend_enabled: bool,
    interface: &'a IdlInterface,
    html_interface_name: String,
    interface_file: Hole,
    members: Hole,
    implementation: Hole,
    implementation_members: Hole,
}

impl<'s, 'a> HtmlInterfaceGenerator<'s, 'a> {
    fn dart_type(&self, type_name: &str) -> String {
        self.options.dart_type(type_name)
    }

    /// `Type` or `Type.name`; names outside the database are already Dart names
    fn constructor_name(&self, info: &OperationInfo) -> String {
        let type_name = if self.options.database.has_interface(&info.type_name) {
            self.dart_type(&info.type_name)
        } else {
            info.type_name.clone()
        };
        match &info.constructor_name {
            Some(name) => format!("{type_name}.{name}"),
            None => type_name,
        }
    }

    fn extends_clause(&self) -> String {
        let mut extends = Vec::new();
        let mut suppressed = Vec::new();
        for parent in &self.interface.parents {
            if match_source_filter(&parent.annotations) || parent.type_id.contains('<') {
                extends.push(self.dart_type(&parent.type_id));
            } else {
                suppressed.push(self.dart_type(&parent.type_id));
            }
        }

        let mut clause = String::new();
        let mut comment = " extends";
        if !extends.is_empty() {
            clause.push_str(" extends ");
            clause.push_str(&extends.join(", "));
            comment = ",";
        }
        if !suppressed.is_empty() {
            clause.push_str(&format!(" /*{comment} {} */", suppressed.join(", ")));
        }
        clause
    }

    fn add_attribute_member(
        &mut self,
        emitter: &mut Emitter,
        attribute: &IdlAttribute,
        is_secondary: bool,
    ) -> WeldResult<()> {
        let dom_name = dart_dom_name_of_attribute(attribute);
        let renamer = self.options.renamer;
        let Some(html_name) = renamer.rename_member(&self.interface.id, &dom_name, "get:") else {
            return Ok(());
        };
        if is_private(&html_name) {
            return Ok(());
        }
        let setter_name = renamer.rename_member(&self.interface.id, &dom_name, "set:");
        let read_only = attribute.is_read_only() || setter_name.is_none();
        if !read_only && setter_name.as_deref() != Some(html_name.as_str()) {
            return Err(WeldError::invalid_idl(
                &self.interface.id,
                format!("getter and setter of {dom_name} are renamed differently"),
            ));
        }

        if !is_secondary {
            let owner = attribute
                .doc_js_interface_name
                .as_deref()
                .unwrap_or(self.interface.id.as_str());
            emitter.emit(
                self.members,
                "\n  /** @domName $DOMINTERFACE.$DOMNAME */",
                &[("DOMINTERFACE", owner), ("DOMNAME", &dom_name)],
            )?;
            emitter.emit(
                self.members,
                "\n  $MODIFIER$TYPE $NAME;\n",
                &[
                    ("MODIFIER", if read_only { "final " } else { "" }),
                    ("NAME", &html_name),
                    ("TYPE", &self.dart_type(&attribute.type_id)),
                ],
            )?;
        }
        if self.backend_enabled {
            self.backend.add_attribute(emitter, attribute, &html_name, read_only)?;
        }
        Ok(())
    }

    fn add_operation_member(
        &mut self,
        emitter: &mut Emitter,
        info: &OperationInfo,
        skip_declaration: bool,
    ) -> WeldResult<()> {
        let Some(html_name) = self.options.renamer.rename_member(&self.interface.id, &info.name, "") else {
            // Removed `item` still backs the indexer
            if info.name == "item" && self.backend_enabled {
                self.backend.add_operation(emitter, info, "_item")?;
            }
            return Ok(());
        };

        if !is_private(&html_name) && !skip_declaration {
            let owner = info
                .overloads
                .first()
                .and_then(|op| op.doc_js_interface_name.as_deref())
                .unwrap_or(self.interface.id.as_str());
            emitter.emit(
                self.members,
                "\n  /** @domName $DOMINTERFACE.$DOMNAME */",
                &[("DOMINTERFACE", owner), ("DOMNAME", &info.name)],
            )?;
            let params = info.parameters_interface_declaration(|t| self.dart_type(t))?;
            emitter.emit(
                self.members,
                "\n  $TYPE $NAME($PARAMS);\n",
                &[
                    ("TYPE", &self.dart_type(&info.type_name)),
                    ("NAME", &html_name),
                    ("PARAMS", &params),
                ],
            )?;
        }
        if self.backend_enabled {
            self.backend.add_operation(emitter, info, &html_name)?;
        }
        Ok(())
    }

    /// Events classes of the parents that declare events
    fn parent_events_classes(&self) -> Vec<String> {
        // Document and DocumentFragment do not extend Element in IDL
        if matches!(self.interface.id.as_str(), "Document" | "DocumentFragment") {
            return vec!["ElementEvents".to_string()];
        }

        let database = self.options.database;
        let mut names = BTreeSet::new();
        let mut visit = vec![self.interface];
        while let Some(interface) = visit.pop() {
            for parent in &interface.parents {
                let Ok(parent) = database.get_interface(&parent.type_id) else {
                    continue;
                };
                if self.event_classes.contains(&parent.id) {
                    names.insert(format!("{}Events", self.options.renamer.rename_interface(parent)));
                }
                visit.push(parent);
            }
        }
        if names.is_empty() {
            return vec!["Events".to_string()];
        }
        names.into_iter().collect()
    }

    fn generate_events(&mut self, emitter: &mut Emitter) -> WeldResult<()> {
        let Some(event_attrs) = event_attributes(self.interface) else {
            return Ok(());
        };
        self.event_classes.insert(self.interface.id.clone());

        let events_interface = format!("{}Events", self.html_interface_name);
        let events_class = format!("_{events_interface}Impl");
        let parents = self.parent_events_classes();
        let [parent_events_interface] = parents.as_slice() else {
            return Err(WeldError::invalid_idl(
                &self.interface.id,
                format!("Only one parent event class allowed, found {}", parents.join(", ")),
            ));
        };
        let parent_events_class = format!("_{parent_events_interface}Impl");

        if event_attrs.is_empty() {
            return self.emit_event_getter(emitter, parent_events_interface, &parent_events_class);
        }
        self.emit_event_getter(emitter, &events_interface, &events_class)?;

        let events_members = emitter
            .emit(
                self.interface_file,
                "\ninterface $INTERFACE extends $PARENTS {\n$!MEMBERS}\n",
                &[("INTERFACE", &events_interface), ("PARENTS", &parents.join(", "))],
            )?
            .get("MEMBERS")?;
        let implementation_members = emitter
            .emit(
                self.implementation,
                "\nclass $CLASSNAME extends $SUPER implements $INTERFACE {\n  $CLASSNAME(_ptr) : super(_ptr);\n$!MEMBERS}\n",
                &[
                    ("CLASSNAME", &events_class),
                    ("INTERFACE", &events_interface),
                    ("SUPER", &parent_events_class),
                ],
            )?
            .get("MEMBERS")?;

        for event in dom_to_html_events(&self.html_interface_name, &event_attrs)? {
            let name = dom_to_html_event(&event)?;
            emitter.emit(events_members, "\n  EventListenerList get $NAME();\n", &[("NAME", name)])?;
            emitter.emit(
                implementation_members,
                "\n  EventListenerList get $NAME() => this['$DOM_NAME'];\n",
                &[("NAME", name), ("DOM_NAME", &event)],
            )?;
        }
        Ok(())
    }

    fn emit_event_getter(&mut self, emitter: &mut Emitter, events_interface: &str, events_class: &str) -> WeldResult<()> {
        emitter.emit(
            self.members,
            "\n  /**\n   * @domName EventTarget.addEventListener, EventTarget.removeEventListener, EventTarget.dispatchEvent\n   */\n  $TYPE get on();\n",
            &[("TYPE", events_interface)],
        )?;
        emitter.emit(
            self.implementation_members,
            "\n  $TYPE get on() =>\n    new $TYPE(this);\n",
            &[("TYPE", events_class)],
        )?;
        Ok(())
    }
}

impl<'s, 'a> MemberWalk<'a> for HtmlInterfaceGenerator<'s, 'a> {
    fn database(&self) -> &'a IdlDatabase {
        self.options.database
    }

    fn interface(&self) -> &'a IdlInterface {
        self.interface
    }

    fn start_interface(&mut self, emitter: &mut Emitter) -> WeldResult<()> {
        let interface = self.interface;
        let typename = self.html_interface_name.clone();
        let templates = &self.options.templates;

        self.interface_file = if is_merged_interface(&interface.id) {
            emitter.scratch()
        } else {
            let path = self
                .options
                .output_dir
                .join("html")
                .join("interface")
                .join(format!("{typename}.dart"));
            self.interface_files.push(path.clone());
            emitter.file(path)
        };

        let template = match templates.try_load(&format!("interface_{typename}.darttemplate"))? {
            Some(template) => template,
            None => templates.load("interface.darttemplate")?,
        };
        let mut extends = self.extends_clause();

        let mut factory_provider = interface_factory(&typename).map(str::to_string);
        let mut constructors = Vec::new();
        if let Some(info) = analyze_constructor(interface) {
            let provider = format!("_{typename}FactoryProvider");
            let path = self.backend.factory_provider_path();
            self.interface_files.push(path.clone());
            let file = emitter.file(path);
            self.backend.emit_factory_provider(emitter, file, &info, &provider)?;
            factory_provider = Some(provider);
            constructors.push(info);
        }

        let infos = html_element_constructor_infos(&typename);
        if !infos.is_empty() {
            let factories = match *self.elements_factory {
                Some(hole) => hole,
                None => {
                    let path = self.backend.elements_factory_provider_path();
                    self.interface_files.push(path.clone());
                    let file = emitter.file(path);
                    let template = templates.load("factoryprovider_Elements.darttemplate")?;
                    let hole = emitter.emit(file, &template, &[])?.get("FACTORY_METHODS")?;
                    *self.elements_factory = Some(hole);
                    hole
                }
            };
            let class_name = self.backend.implementation_class_name();
            emit_html_element_factory_constructors(emitter, factories, infos, &typename, &class_name)?;
        }
        for info in infos {
            constructors.push(info.constructor_info(&typename));
            match &factory_provider {
                Some(provider) if provider != info.factory_provider_name => {
                    return Err(WeldError::invalid_idl(
                        &interface.id,
                        format!("conflicting factory providers {provider} and {}", info.factory_provider_name),
                    ));
                }
                Some(_) => {}
                None => factory_provider = Some(info.factory_provider_name.to_string()),
            }
        }
        if let Some(provider) = &factory_provider {
            extends.push_str(" default ");
            extends.push_str(provider);
        }

        let holes = emitter.emit(
            self.interface_file,
            &format!("{template}$!TOP_LEVEL"),
            &[("ID", &typename), ("EXTENDS", &extends)],
        )?;
        self.members = holes.get("MEMBERS")?;
        emitter.emit(
            holes.get("TYPE_COMMENT")?,
            "/// @domName $DOMNAME",
            &[("DOMNAME", interface.doc_js_name())],
        )?;

        self.implementation = if self.backend.has_implementation() {
            let path = self.backend.implementation_path();
            self.interface_files.push(path.clone());
            emitter.file(path)
        } else {
            emitter.scratch()
        };
        self.implementation_members = self.backend.start_interface(emitter, self.implementation)?;

        for info in &constructors {
            let params = info.parameters_interface_declaration(|t| self.dart_type(t))?;
            emitter.emit(
                self.members,
                "\n  $CTOR($PARAMS);\n",
                &[("CTOR", &self.constructor_name(info)), ("PARAMS", &params)],
            )?;
        }

        if let Some(element_type) = maybe_typed_array_element_type_in_hierarchy(interface, self.options.database) {
            emitter.emit(
                self.members,
                "\n  $CTOR(int length);\n\n  $CTOR.fromList(List<$TYPE> list);\n\n  $CTOR.fromBuffer(ArrayBuffer buffer, [int byteOffset, int length]);\n",
                &[("CTOR", &interface.id), ("TYPE", &self.dart_type(element_type))],
            )?;
        }

        self.generate_events(emitter)?;

        self.backend_enabled = self.backend.implements_merged_members();
        let merged: Vec<&str> = merged_into(&interface.id).collect();
        for name in merged {
            let merged_interface = self.options.database.get_interface(name)?;
            self.add_members(emitter, merged_interface)?;
        }
        self.backend_enabled = true;
        Ok(())
    }

    fn finish_interface(&mut self, emitter: &mut Emitter) -> WeldResult<()> {
        self.backend.finish_interface(emitter)
    }

    fn add_constant(&mut self, emitter: &mut Emitter, constant: &'a IdlConstant) -> WeldResult<()> {
        let ty = type_or_nothing(&self.dart_type(&constant.type_id), Some(&constant.type_id));
        emitter.emit(
            self.members,
            "\n  static final $TYPE$NAME = $VALUE;\n",
            &[("NAME", &constant.id), ("TYPE", &ty), ("VALUE", &constant.value)],
        )?;
        self.backend.add_constant(emitter, constant)
    }

    fn add_attribute(&mut self, emitter: &mut Emitter, attribute: &'a IdlAttribute) -> WeldResult<()> {
        self.add_attribute_member(emitter, attribute, false)
    }

    fn add_secondary_attribute(
        &mut self,
        emitter: &mut Emitter,
        parent: &'a IdlInterface,
        attribute: &'a IdlAttribute,
    ) -> WeldResult<()> {
        self.backend.secondary_context(emitter, parent)?;
        self.add_attribute_member(emitter, attribute, true)
    }

    fn add_indexer(&mut self, emitter: &mut Emitter, element_type: &str) -> WeldResult<()> {
        if self.backend_enabled {
            self.backend.add_indexer(emitter, element_type)?;
        }
        Ok(())
    }

    fn amend_indexer(&mut self, emitter: &mut Emitter, element_type: &str) -> WeldResult<()> {
        if self.backend_enabled {
            self.backend.amend_indexer(emitter, element_type)?;
        }
        Ok(())
    }

    fn add_operation(&mut self, emitter: &mut Emitter, info: &OperationInfo) -> WeldResult<()> {
        self.add_operation_member(emitter, info, false)
    }

    fn add_static_operation(&mut self, emitter: &mut Emitter, info: &OperationInfo) -> WeldResult<()> {
        self.add_operation_member(emitter, info, true)
    }

    fn add_secondary_operation(
        &mut self,
        emitter: &mut Emitter,
        parent: &'a IdlInterface,
        info: &OperationInfo,
    ) -> WeldResult<()> {
        self.backend.secondary_context(emitter, parent)?;
        self.add_operation_member(emitter, info, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idl::{ExtAttrValue, IdlArgument, IdlOperation};
    use crate::renamer::HtmlRenamer;
    use crate::systems::test_support::{read, run_html, Flavor};
    use crate::systems::{generate, HtmlDart2JsBackend};
    use crate::templates::TemplateLoader;
    use crate::types::TypeRegistry;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn database() -> IdlDatabase {
        IdlDatabase::new()
            .with_interface(IdlInterface::new("EventTarget"))
            .with_interface(
                IdlInterface::new("Node")
                    .parent("EventTarget")
                    .constant(IdlConstant::new("ELEMENT_NODE", "unsigned short", "1"))
                    .attribute(IdlAttribute::new("parentNode", "Node").read_only())
                    .attribute(IdlAttribute::new("nodeValue", "DOMString"))
                    .operation(
                        IdlOperation::new("appendChild", "Node").arg(IdlArgument::new("newChild", "Node")),
                    ),
            )
            .with_interface(
                IdlInterface::new("Element")
                    .parent("Node")
                    .attribute(IdlAttribute::new("onclick", "EventListener"))
                    .attribute(IdlAttribute::new("tagName", "DOMString").read_only()),
            )
            .with_interface(
                IdlInterface::new("HTMLElement")
                    .parent("Element")
                    .attribute(IdlAttribute::new("title", "DOMString")),
            )
            .with_interface(IdlInterface::new("HTMLDivElement").parent("HTMLElement"))
            .with_interface(
                IdlInterface::new("VoidCallback")
                    .with_ext_attr("Callback", ExtAttrValue::Flag)
                    .operation(IdlOperation::new("handleEvent", "void")),
            )
    }

    fn run(db: &IdlDatabase, out: &Path) -> Emitter {
        run_html(db, out, Flavor::Dart2Js)
    }

    #[test]
    fn test_interface_files() {
        let db = database();
        let out = Path::new("out");
        let mut emitter = run(&db, out);

        let node = read(&mut emitter, out.join("html/interface/Node.dart"));
        assert!(node.contains("interface Node /* extends EventTarget */ {"));
        assert!(node.contains("/// @domName Node"));
        assert!(node.contains("\n  static final int ELEMENT_NODE = 1;\n"));
        assert!(node.contains("\n  /** @domName Node.parentNode */\n  final Node parent;\n"));
        assert!(node.contains("\n  String nodeValue;\n"));
        assert!(node.contains("\n  Node $dom_appendChild(Node newChild);\n"));

        let element = read(&mut emitter, out.join("html/interface/Element.dart"));
        assert!(element.contains("  ElementEvents get on();\n"));
        assert!(element.contains("\ninterface ElementEvents extends Events {\n"));
        // Element also carries the events WebKit does not declare in IDL
        for event in ["click", "touchEnter", "touchLeave", "transitionEnd"] {
            assert!(element.contains(&format!("\n  EventListenerList get {event}();\n")));
        }
        // Members of the merged HTMLElement land on Element
        assert!(element.contains("\n  String title;\n"));

        let div = read(&mut emitter, out.join("html/interface/DivElement.dart"));
        assert!(div.contains("interface DivElement /* extends Element */ default _Elements {"));
        assert!(div.contains("\n  DivElement();\n"));

        let callback = read(&mut emitter, out.join("html/interface/VoidCallback.dart"));
        assert!(callback.ends_with("typedef void VoidCallback();\n"));

        // Merged interfaces get no file of their own
        assert!(!emitter.file_paths().any(|p| p.ends_with("HTMLElement.dart")));
    }

    #[test]
    fn test_library_lists_sorted_sources() {
        let db = database();
        let out = Path::new("out");
        let mut emitter = run(&db, out);
        let lib = read(&mut emitter, out.join("html_dart2js.dart"));
        let sources: Vec<&str> = lib.lines().filter(|l| l.starts_with("#source(")).collect();
        let mut sorted = sources.clone();
        sorted.sort();
        assert_eq!(sources, sorted);
        assert!(sources.contains(&"#source('html/interface/Node.dart');"));
        assert!(sources.contains(&"#source('html/dart2js/Node.dart');"));
        assert!(sources.contains(&"#source('html/dart2js/_Elements.dart');"));
    }

    #[test]
    fn test_two_parent_event_classes_is_an_error() {
        let db = IdlDatabase::new()
            .with_interface(IdlInterface::new("A").attribute(IdlAttribute::new("onload", "EventListener")))
            .with_interface(IdlInterface::new("B").attribute(IdlAttribute::new("onerror", "EventListener")))
            .with_interface(
                IdlInterface::new("C")
                    .parent("A")
                    .parent("B")
                    .attribute(IdlAttribute::new("onabort", "EventListener")),
            );
        let renamer = HtmlRenamer::new(&db);
        let types = TypeRegistry::new(&db).with_renamer(&renamer);
        let options = || SystemOptions {
            templates: TemplateLoader::new(Vec::new(), &[""], &[("DARTIUM", false), ("DART2JS", true)]),
            database: &db,
            types: &types,
            renamer: &renamer,
            output_dir: PathBuf::from("out"),
        };
        let backend = HtmlDart2JsBackend::new(options());
        let mut system = HtmlInterfacesSystem::new(options(), Box::new(backend));
        let err = generate(&db, &mut system, &mut Emitter::new()).unwrap_err();
        assert!(matches!(err, WeldError::InvalidIdl { interface, .. } if interface == "C"));
    }
}
