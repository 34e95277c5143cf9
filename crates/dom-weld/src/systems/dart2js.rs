//! dart2js implementation of dart:html
//!
//! Every interface becomes a `_XImpl` class bound to the JavaScript
//! constructor through a native spec. Attributes map to fields where the
//! names agree and to native getters/setters otherwise.

use super::{Backend, ImplementationGenerator, SystemOptions};
use crate::analysis::OperationInfo;
use crate::dom::{
    dart_dom_name_of_attribute, find_matching_attribute, is_dart_collection_type, is_pure_interface,
    list_implementation_info, make_native_spec, maybe_typed_array_element_type,
};
use crate::emitter::{Emitter, Hole};
use crate::error::{WeldError, WeldResult};
use crate::html::{is_merged_interface, merge_target, merged_into, JS_CUSTOM_MEMBERS};
use crate::idl::{IdlAttribute, IdlConstant, IdlInterface};
use std::path::PathBuf;

/// Types kept as interfaces in signatures
static DO_NOT_NARROW: &[&str] = &[
    "DOMStringList",
    "DOMStringMap",
    "EventListener",
    "IDBAny",
    "IDBKey",
    "MediaQueryListListener",
];

/// dart2js backend, writes `html/dart2js/*.dart` and `html_dart2js.dart`
#[derive(Debug)]
pub struct HtmlDart2JsBackend<'a> {
    options: SystemOptions<'a>,
}

impl<'a> HtmlDart2JsBackend<'a> {
    pub fn new(options: SystemOptions<'a>) -> Self {
        Self { options }
    }
}

impl<'a> Backend<'a> for HtmlDart2JsBackend<'a> {
    fn options(&self) -> &SystemOptions<'a> {
        &self.options
    }

    fn implementation_generator<'s>(
        &'s mut self,
        interface: &'a IdlInterface,
    ) -> Box<dyn ImplementationGenerator<'a> + 's> {
        Box::new(Dart2JsClassGenerator {
            options: &self.options,
            interface,
            html_interface_name: self.options.renamer.rename_interface(interface),
            members: None,
            current_secondary_parent: None,
        })
    }

    fn generate_libraries(&mut self, emitter: &mut Emitter, interface_files: &[PathBuf]) -> WeldResult<()> {
        let path = self.options.output_dir.join("html_dart2js.dart");
        self.options
            .generate_lib_file(emitter, "html_dart2js.darttemplate", &path, interface_files, &[])
    }
}

struct Dart2JsClassGenerator<'s, 'a> {
    options: &'s SystemOptions<'a>,
    interface: &'a IdlInterface,
    html_interface_name: String,
    members: Option<Hole>,
    current_secondary_parent: Option<&'a str>,
}

impl<'s, 'a> Dart2JsClassGenerator<'s, 'a> {
    fn members(&self) -> WeldResult<Hole> {
        self.members
            .ok_or_else(|| WeldError::MissingHole("MEMBERS".to_string()))
    }

    fn dart_type(&self, type_name: &str) -> String {
        self.options.dart_type(type_name)
    }

    fn impl_class_name(type_name: &str) -> String {
        format!("_{type_name}Impl")
    }

    fn should_narrow(&self, type_name: &str) -> bool {
        if DO_NOT_NARROW.contains(&type_name) {
            return false;
        }
        // Callbacks are typedefs and have no class
        self.options
            .database
            .get_interface(type_name)
            .is_ok_and(|interface| !interface.is_callback())
    }

    /// Implementation class for database interfaces, Dart type otherwise
    fn narrow(&self, type_name: &str) -> String {
        if self.should_narrow(type_name) {
            Self::impl_class_name(&self.dart_type(type_name))
        } else {
            self.dart_type(type_name)
        }
    }

    fn has_custom_implementation(&self, member: &str) -> bool {
        let key = format!("{}.{member}", self.html_interface_name);
        JS_CUSTOM_MEMBERS.contains(&key.as_str())
    }

    /// Native object has an indexer and a length property
    fn has_javascript_indexing_behaviour(&self) -> bool {
        matches!(list_implementation_info(self.interface, self.options.database), Some((_, true)))
    }

    /// Attribute of the same name inherited along the primary parent chain
    ///
    /// Interfaces merged into an ancestor, or the ancestor an IDL parent was
    /// merged into, are searched as well. Returns the attribute and the Dart
    /// parent it comes from.
    fn find_shadowed_attribute(&self, attribute: &IdlAttribute) -> Option<(&'a IdlAttribute, &'a str)> {
        let database = self.options.database;
        let mut interface = self.interface;
        loop {
            let parent = interface.parents.first()?;
            if is_dart_collection_type(&parent.type_id) || is_pure_interface(&parent.type_id) {
                return None;
            }
            let parent = database.get_interface(&parent.type_id).ok()?;

            let mut search: Vec<&str> = Vec::new();
            let parent_name = match merge_target(&parent.id) {
                Some(target) => {
                    search.push(parent.id.as_str());
                    target
                }
                None => parent.id.as_str(),
            };
            search.extend(merged_into(parent_name).map(|name| -> &str { name }));
            search.push(parent_name);

            let parent_interface = database.get_interface(parent_name).ok()?;
            for name in search {
                let Ok(candidate) = database.get_interface(name) else {
                    continue;
                };
                if let Some(found) = find_matching_attribute(candidate, attribute) {
                    return Some((found, parent_interface.id.as_str()));
                }
            }
            interface = parent_interface;
        }
    }

    fn add_renaming_getter(&self, emitter: &mut Emitter, attribute: &IdlAttribute, html_name: &str) -> WeldResult<()> {
        emitter.emit(
            self.members()?,
            "\n  $TYPE get $(HTML_NAME)() native \"return this.$NAME;\";\n",
            &[
                ("HTML_NAME", html_name),
                ("NAME", &attribute.id),
                ("TYPE", &self.narrow(&attribute.type_id)),
            ],
        )?;
        Ok(())
    }

    fn add_renaming_setter(&self, emitter: &mut Emitter, attribute: &IdlAttribute, html_name: &str) -> WeldResult<()> {
        emitter.emit(
            self.members()?,
            "\n  void set $HTML_NAME($TYPE value) native \"this.$NAME = value;\";\n",
            &[
                ("HTML_NAME", html_name),
                ("NAME", &attribute.id),
                ("TYPE", &self.narrow(&attribute.type_id)),
            ],
        )?;
        Ok(())
    }
}

impl<'s, 'a> ImplementationGenerator<'a> for Dart2JsClassGenerator<'s, 'a> {
    fn has_implementation(&self) -> bool {
        !(is_pure_interface(&self.interface.id) || is_merged_interface(&self.interface.id))
    }

    fn implementation_class_name(&self) -> String {
        Self::impl_class_name(&self.html_interface_name)
    }

    fn implementation_path(&self) -> PathBuf {
        self.options
            .output_dir
            .join("html")
            .join("dart2js")
            .join(format!("{}.dart", self.html_interface_name))
    }

    fn factory_provider_path(&self) -> PathBuf {
        self.options
            .output_dir
            .join("html")
            .join("dart2js")
            .join(format!("_{}FactoryProvider.dart", self.html_interface_name))
    }

    fn elements_factory_provider_path(&self) -> PathBuf {
        self.options.output_dir.join("html").join("dart2js").join("_Elements.dart")
    }

    fn implements_merged_members(&self) -> bool {
        true
    }

    fn start_interface(&mut self, emitter: &mut Emitter, implementation: Hole) -> WeldResult<Hole> {
        let interface = self.interface;
        let class_name = self.implementation_class_name();

        let base = interface
            .parents
            .first()
            .filter(|p| !is_dart_collection_type(&p.type_id) && !is_pure_interface(&p.type_id))
            .map(|p| Self::impl_class_name(&self.dart_type(&p.type_id)));
        let extends = base.map(|b| format!(" extends {b}")).unwrap_or_default();

        let mut implements = vec![self.html_interface_name.clone()];
        if let Some(element_type) = maybe_typed_array_element_type(interface) {
            implements.push(format!("List<{}>", self.dart_type(element_type)));
        }
        if self.has_javascript_indexing_behaviour() {
            implements.push("JavaScriptIndexingBehavior".to_string());
        }

        let templates = &self.options.templates;
        let template_name = format!("impl_{}.darttemplate", self.html_interface_name);
        let template = match templates.try_load(&template_name)? {
            Some(template) => template,
            None => templates.load("dart2js_impl.darttemplate")?,
        };
        let native_spec = format!(" native \"{}\"", make_native_spec(interface.javascript_binding_name()));
        let holes = emitter.emit(
            implementation,
            &template,
            &[
                ("CLASSNAME", &class_name),
                ("EXTENDS", &extends),
                ("IMPLEMENTS", &format!(" implements {}", implements.join(", "))),
                ("NATIVESPEC", &native_spec),
            ],
        )?;
        let members = holes.get("MEMBERS").map_err(|_| WeldError::TemplateSyntax {
            name: template_name,
            message: format!("class {class_name} doesn't use the $!MEMBERS variable"),
        })?;
        self.members = Some(members);
        Ok(members)
    }

    fn emit_factory_provider(
        &mut self,
        emitter: &mut Emitter,
        at: Hole,
        info: &OperationInfo,
        factory_provider: &str,
    ) -> WeldResult<()> {
        let templates = &self.options.templates;
        let template = match templates.try_load(&format!("factoryprovider_{}.darttemplate", self.html_interface_name))? {
            Some(template) => template,
            None => templates.load("factoryprovider.darttemplate")?,
        };
        let params = info.parameters_implementation_declaration(|t| self.dart_type(t), "null")?;
        let named_constructor = if info.name.is_empty() {
            self.html_interface_name.as_str()
        } else {
            info.name.as_str()
        };
        emitter.emit(
            at,
            &template,
            &[
                ("FACTORYPROVIDER", factory_provider),
                ("CONSTRUCTOR", &self.html_interface_name),
                ("PARAMETERS", &params),
                ("NAMED_CONSTRUCTOR", named_constructor),
                ("ARGUMENTS", &info.parameters_as_argument_list()),
            ],
        )?;
        Ok(())
    }

    fn add_indexer(&mut self, emitter: &mut Emitter, element_type: &str) -> WeldResult<()> {
        let members = self.members()?;
        let is_node_list = self.interface.id == "NodeList";
        emitter.emit(
            members,
            "\n  $TYPE operator[](int index) native \"return this[index];\";\n",
            &[("TYPE", &self.narrow(element_type))],
        )?;

        if self.interface.ext_attrs.has("CustomIndexedSetter") {
            emitter.emit(
                members,
                "\n  void operator[]=(int index, $TYPE value) native \"this[index] = value\";\n",
                &[("TYPE", &self.narrow(element_type))],
            )?;
        } else if !is_node_list {
            // NodeList has a hand-written setter going through the parent node
            emitter.emit(
                members,
                "\n  void operator[]=(int index, $TYPE value) {\n    throw new UnsupportedOperationException(\"Cannot assign element of immutable List.\");\n  }\n",
                &[("TYPE", &self.narrow(element_type))],
            )?;
        }

        if !is_node_list {
            let template = self.options.templates.load("immutable_list_mixin.darttemplate")?;
            emitter.emit(members, &template, &[("E", &self.dart_type(element_type))])?;
        }
        Ok(())
    }

    fn add_attribute(
        &mut self,
        emitter: &mut Emitter,
        attribute: &IdlAttribute,
        html_name: &str,
        read_only: bool,
    ) -> WeldResult<()> {
        if self.has_custom_implementation(&attribute.id) {
            return Ok(());
        }

        if attribute.id != html_name {
            self.add_renaming_getter(emitter, attribute, html_name)?;
            if !read_only {
                self.add_renaming_setter(emitter, attribute, html_name)?;
            }
            return Ok(());
        }

        let members = self.members()?;
        let name = dart_dom_name_of_attribute(attribute);
        // A field cannot shadow an inherited field
        if let Some((shadowed, owner)) = self.find_shadowed_attribute(attribute) {
            if read_only && attribute.type_id == shadowed.type_id {
                emitter.emit(
                    members,
                    "\n  // Use implementation from $SUPER.\n  // final $TYPE $NAME;\n",
                    &[("SUPER", owner), ("NAME", &name), ("TYPE", &self.narrow(&attribute.type_id))],
                )?;
                return Ok(());
            }
            emitter.emit_raw(members, "\n  // Shadowing definition.");
            self.add_renaming_getter(emitter, attribute, &name)?;
            if !read_only {
                self.add_renaming_setter(emitter, attribute, &name)?;
            }
            return Ok(());
        }

        let template = if read_only {
            "\n  final $TYPE $NAME;\n"
        } else {
            "\n  $TYPE $NAME;\n"
        };
        emitter.emit(members, template, &[("NAME", &name), ("TYPE", &self.narrow(&attribute.type_id))])?;
        Ok(())
    }

    fn add_operation(&mut self, emitter: &mut Emitter, info: &OperationInfo, html_name: &str) -> WeldResult<()> {
        // TODO: bind static operations once dart2js supports static natives
        if self.has_custom_implementation(&info.name) || info.is_static() {
            return Ok(());
        }

        let members = self.members()?;
        let params = info.parameters_implementation_declaration(|t| self.narrow(t), "null")?;
        let return_type = self.narrow(&info.type_name);
        if html_name != info.declared_name {
            emitter.emit(
                members,
                "\n  $TYPE $(HTML_NAME)($PARAMS) native \"$NAME\";\n",
                &[
                    ("TYPE", &return_type),
                    ("HTML_NAME", html_name),
                    ("NAME", &info.declared_name),
                    ("PARAMS", &params),
                ],
            )?;
        } else {
            emitter.emit(
                members,
                "\n  $TYPE $NAME($PARAMS) native;\n",
                &[("TYPE", &return_type), ("NAME", &info.name), ("PARAMS", &params)],
            )?;
        }
        Ok(())
    }

    fn add_constant(&mut self, emitter: &mut Emitter, constant: &IdlConstant) -> WeldResult<()> {
        emitter.emit(
            self.members()?,
            "\n  static final $TYPE $NAME = $VALUE;\n",
            &[
                ("NAME", &constant.id),
                ("TYPE", &self.dart_type(&constant.type_id)),
                ("VALUE", &constant.value),
            ],
        )?;
        Ok(())
    }

    fn secondary_context(&mut self, emitter: &mut Emitter, interface: &'a IdlInterface) -> WeldResult<()> {
        if self.current_secondary_parent != Some(interface.id.as_str()) {
            self.current_secondary_parent = Some(interface.id.as_str());
            emitter.emit(self.members()?, "\n  // From $WHERE\n", &[("WHERE", &interface.id)])?;
        }
        Ok(())
    }

    fn finish_interface(&mut self, _emitter: &mut Emitter) -> WeldResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::idl::{ExtAttrValue, IdlArgument, IdlAttribute, IdlConstant, IdlDatabase, IdlInterface, IdlOperation};
    use crate::systems::test_support::{read, run_html, Flavor};
    use std::path::Path;

    fn database() -> IdlDatabase {
        IdlDatabase::new()
            .with_interface(IdlInterface::new("EventTarget"))
            .with_interface(
                IdlInterface::new("Node")
                    .parent("EventTarget")
                    .constant(IdlConstant::new("ELEMENT_NODE", "unsigned short", "1"))
                    .attribute(IdlAttribute::new("parentNode", "Node").read_only())
                    .attribute(IdlAttribute::new("nodeName", "DOMString").read_only())
                    .attribute(IdlAttribute::new("textContent", "DOMString"))
                    .operation(
                        IdlOperation::new("insertBefore", "Node")
                            .arg(IdlArgument::new("newChild", "Node"))
                            .arg(IdlArgument::new("refChild", "Node")),
                    ),
            )
            .with_interface(
                IdlInterface::new("Element")
                    .parent("Node")
                    .attribute(IdlAttribute::new("nodeName", "DOMString").read_only())
                    .attribute(IdlAttribute::new("textContent", "DOMString")),
            )
            .with_interface(
                IdlInterface::new("HTMLElement")
                    .parent("Element")
                    .attribute(IdlAttribute::new("lang", "DOMString").read_only()),
            )
            .with_interface(
                IdlInterface::new("HTMLDivElement")
                    .parent("HTMLElement")
                    .attribute(IdlAttribute::new("lang", "DOMString").read_only()),
            )
            .with_interface(
                IdlInterface::new("NodeList")
                    .parent("sequence<Node>")
                    .attribute(IdlAttribute::new("length", "unsigned long").read_only())
                    .operation(IdlOperation::new("item", "Node").arg(IdlArgument::new("index", "unsigned long"))),
            )
            .with_interface(IdlInterface::new("StyleSheetList").parent("sequence<StyleSheet>"))
            .with_interface(IdlInterface::new("StyleSheet"))
            .with_interface(
                IdlInterface::new("DOMWindow")
                    .attribute(IdlAttribute::new("top", "DOMWindow").read_only())
                    .attribute(IdlAttribute::new("name", "DOMString")),
            )
            .with_interface(
                IdlInterface::new("WebKitCSSMatrix")
                    .with_ext_attr("Constructor", ExtAttrValue::Function(crate::idl::IdlFunction {
                        id: None,
                        arguments: vec![IdlArgument::new("cssValue", "DOMString").optional()],
                    }))
                    .operation(IdlOperation::new("inverse", "WebKitCSSMatrix")),
            )
    }

    #[test]
    fn test_impl_classes() {
        let db = database();
        let out = Path::new("out");
        let mut emitter = run_html(&db, out, Flavor::Dart2Js);

        let node = read(&mut emitter, out.join("html/dart2js/Node.dart"));
        assert!(node.contains("class _NodeImpl extends _EventTargetImpl implements Node native \"*Node\" {"));
        assert!(node.contains("\n  static final int ELEMENT_NODE = 1;\n"));
        assert!(node.contains("\n  _NodeImpl get parent() native \"return this.parentNode;\";\n"));
        assert!(!node.contains("set parent("));
        assert!(node.contains("\n  final String nodeName;\n"));
        assert!(node.contains("\n  String get $dom_textContent() native \"return this.textContent;\";\n"));
        assert!(node.contains("\n  void set $dom_textContent(String value) native \"this.textContent = value;\";\n"));
        assert!(node.contains(
            "\n  _NodeImpl insertBefore(_NodeImpl newChild, _NodeImpl refChild) native;\n"
        ));

        let element = read(&mut emitter, out.join("html/dart2js/Element.dart"));
        assert!(element.contains("\n  // Use implementation from Node.\n  // final String nodeName;\n"));
    }

    #[test]
    fn test_attribute_from_merged_parent_is_not_redeclared() {
        let db = database();
        let out = Path::new("out");
        let mut emitter = run_html(&db, out, Flavor::Dart2Js);

        let element = read(&mut emitter, out.join("html/dart2js/Element.dart"));
        assert!(element.contains("\n  final String lang;\n"));
        let div = read(&mut emitter, out.join("html/dart2js/DivElement.dart"));
        assert!(div.contains("class _DivElementImpl extends _ElementImpl implements DivElement"));
        assert!(div.contains("\n  // Use implementation from Element.\n  // final String lang;\n"));
    }

    #[test]
    fn test_list_classes() {
        let db = database();
        let out = Path::new("out");
        let mut emitter = run_html(&db, out, Flavor::Dart2Js);

        let nodes = read(&mut emitter, out.join("html/dart2js/NodeList.dart"));
        assert!(nodes.contains("implements NodeList, JavaScriptIndexingBehavior native \"*NodeList\""));
        assert!(nodes.contains("\n  _NodeImpl operator[](int index) native \"return this[index];\";\n"));
        assert!(!nodes.contains("Cannot assign element of immutable List."));
        assert!(!nodes.contains("Iterator<"));

        let sheets = read(&mut emitter, out.join("html/dart2js/StyleSheetList.dart"));
        assert!(sheets.contains("Cannot assign element of immutable List."));
        assert!(sheets.contains("Iterator<StyleSheet> iterator()"));
    }

    #[test]
    fn test_custom_members_and_native_specs() {
        let db = database();
        let out = Path::new("out");
        let mut emitter = run_html(&db, out, Flavor::Dart2Js);

        let window = read(&mut emitter, out.join("html/dart2js/Window.dart"));
        assert!(window.contains("class _WindowImpl implements Window native \"@*DOMWindow\" {"));
        assert!(!window.contains(" top"));
        assert!(window.contains("\n  String name;\n"));
    }

    #[test]
    fn test_factory_provider() {
        let db = database();
        let out = Path::new("out");
        let mut emitter = run_html(&db, out, Flavor::Dart2Js);

        let provider = read(&mut emitter, out.join("html/dart2js/_CSSMatrixFactoryProvider.dart"));
        assert!(provider.contains("class _CSSMatrixFactoryProvider {"));
        assert!(provider.contains("factory CSSMatrix([String cssValue]) native"));

        let interface = read(&mut emitter, out.join("html/interface/CSSMatrix.dart"));
        assert!(interface.contains("interface CSSMatrix default _CSSMatrixFactoryProvider {"));
        assert!(interface.contains("\n  CSSMatrix([String cssValue]);\n"));
        assert!(interface.contains("\n  CSSMatrix inverse();\n"));
    }
}
