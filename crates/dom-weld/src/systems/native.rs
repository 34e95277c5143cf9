//! Native (Dartium) implementation of dart:html
//!
//! Each interface gets a Dart class whose members are `native` bindings,
//! plus a C++ header and source with one callback per binding and a
//! resolver mapping binding names to callbacks. The backend also writes
//! the `DartDerivedSourcesNN.cpp` partitions and `DartResolver.cpp`.

use super::{massage_path, relative_path, Backend, ImplementationGenerator, SystemOptions};
use crate::analysis::{analyze_constructor, OperationInfo};
use crate::dom::{is_dart_collection_type, is_dart_list_type, is_pure_interface};
use crate::emitter::{format, Emitter, Hole};
use crate::error::{WeldError, WeldResult};
use crate::idl::{ExtAttrs, IdlArgument, IdlAttribute, IdlInterface, IdlOperation};
use crate::types::IdlTypeInfo;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing::debug;

pub const DEFAULT_DERIVED_SOURCES_PARTITIONS: usize = 20;

lazy_static! {
    static ref WEBKIT_PREFIX: Regex = Regex::new(r"^(hTML|uRL|jS|xML|xSLT)").unwrap();
    static ref WEBKIT_PREDICATE: Regex = Regex::new(r"^(create|exclusive)").unwrap();
}

static CONSTRUCTABLE_ATTRIBUTES: &[&str] = &["CustomConstructor", "V8CustomConstructor", "Constructor", "NamedConstructor"];

/// Reflected SVG attributes that live in the HTML namespace
static SVG_HTML_NAMES: &[&str] = &[
    "class",
    "id",
    "onabort",
    "onclick",
    "onerror",
    "onload",
    "onmousedown",
    "onmousemove",
    "onmouseout",
    "onmouseover",
    "onmouseup",
    "onresize",
    "onscroll",
    "onunload",
];

/// Native backend, writes `dart/*Implementation.dart`, `cpp/Dart*.{h,cpp}`
/// and the library glue
#[derive(Debug)]
pub struct NativeBackend<'a> {
    options: SystemOptions<'a>,
    auxiliary_dir: PathBuf,
    partitions: usize,
    cpp_header_files: Vec<PathBuf>,
    cpp_impl_files: Vec<PathBuf>,
}

impl<'a> NativeBackend<'a> {
    pub fn new(options: SystemOptions<'a>, auxiliary_dir: impl Into<PathBuf>) -> Self {
        Self {
            options,
            auxiliary_dir: auxiliary_dir.into(),
            partitions: DEFAULT_DERIVED_SOURCES_PARTITIONS,
            cpp_header_files: Vec::new(),
            cpp_impl_files: Vec::new(),
        }
    }

    /// Number of `DartDerivedSourcesNN.cpp` files, at least one
    pub fn with_partitions(mut self, partitions: usize) -> Self {
        self.partitions = partitions.max(1);
        self
    }

    fn cpp_header_path(&self, interface_name: &str) -> PathBuf {
        cpp_path(&self.options.output_dir, interface_name, "h")
    }

    fn cpp_impl_path(&self, interface_name: &str) -> PathBuf {
        cpp_path(&self.options.output_dir, interface_name, "cpp")
    }

    fn generate_derived_sources(&self, emitter: &mut Emitter) -> WeldResult<()> {
        let template = self.options.templates.load("cpp_derived_sources.template")?;
        for partition in 0..self.partitions {
            let path = self
                .options
                .output_dir
                .join(format!("DartDerivedSources{:02}.cpp", partition + 1));
            let dir = path.parent().unwrap_or(Path::new(""));
            let mut includes = String::new();
            for impl_file in self.cpp_impl_files.iter().skip(partition).step_by(self.partitions) {
                includes.push_str(&format!("#include \"{}\"\n", massage_path(&relative_path(impl_file, dir))));
            }
            let file = emitter.file(&path);
            emitter.emit(file, &template, &[("INCLUDES", &includes)])?;
        }
        Ok(())
    }

    fn generate_resolver(&self, emitter: &mut Emitter) -> WeldResult<()> {
        let path = self.options.output_dir.join("DartResolver.cpp");
        let dir = path.parent().unwrap_or(Path::new(""));
        let mut includes = String::new();
        let mut body = String::new();
        for header in &self.cpp_header_files {
            includes.push_str(&format!("#include \"{}\"\n", massage_path(&relative_path(header, dir))));
            let class_name = header.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
            body.push_str(&format(
                "    if (Dart_NativeFunction func = $CLASS_NAME::resolver(name, argumentCount))\n        return func;\n",
                &[("CLASS_NAME", &class_name)],
            )?);
        }
        let template = self.options.templates.load("cpp_resolver.template")?;
        let file = emitter.file(&path);
        emitter.emit(file, &template, &[("INCLUDES", &includes), ("RESOLVER_BODY", &body)])?;
        Ok(())
    }
}

fn cpp_path(output_dir: &Path, interface_name: &str, extension: &str) -> PathBuf {
    output_dir.join("cpp").join(format!("Dart{interface_name}.{extension}"))
}

fn cpp_includes(includes: &BTreeSet<String>) -> String {
    includes.iter().map(|include| format!("#include {include}\n")).collect()
}

impl<'a> Backend<'a> for NativeBackend<'a> {
    fn options(&self) -> &SystemOptions<'a> {
        &self.options
    }

    fn implementation_generator<'s>(
        &'s mut self,
        interface: &'a IdlInterface,
    ) -> Box<dyn ImplementationGenerator<'a> + 's> {
        let html_interface_name = self.options.renamer.rename_interface(interface);
        let interface_type_info = self.options.types.type_info(&interface.id);
        Box::new(NativeClassGenerator {
            options: &self.options,
            cpp_header_files: &mut self.cpp_header_files,
            cpp_impl_files: &mut self.cpp_impl_files,
            interface,
            interface_type_info,
            html_interface_name,
            holes: None,
            cpp_impl_includes: BTreeSet::new(),
        })
    }

    fn process_callback(&mut self, emitter: &mut Emitter, interface: &IdlInterface, _info: &OperationInfo) -> WeldResult<()> {
        if is_pure_interface(&interface.id) {
            return Ok(());
        }
        let types = self.options.types;
        let class_name = format!("Dart{}", interface.id);
        let header_handlers = emitter.scratch();
        let impl_handlers = emitter.scratch();
        let mut includes = BTreeSet::new();

        for operation in &interface.operations {
            let (return_prefix, error_return) = if operation.type_id == "void" {
                ("", "")
            } else {
                ("return ", " false")
            };

            let mut parameters = Vec::new();
            let mut arguments = Vec::new();
            let mut conversion_includes = Vec::new();
            for argument in &operation.arguments {
                let info = types.type_info(&argument.type_id);
                parameters.push(format!("{} {}", info.parameter_type(), argument.id));
                arguments.push(info.to_dart_conversion(&argument.id, &interface.id, &ExtAttrs::new()));
                conversion_includes.extend(info.conversion_includes());
            }
            let parameters = parameters.join(", ");

            let native_return_type = types.type_info(&operation.type_id).native_type();
            emitter.emit(
                header_handlers,
                "\n    virtual $TYPE handleEvent($PARAMETERS);\n",
                &[("TYPE", &native_return_type), ("PARAMETERS", &parameters)],
            )?;

            if operation.ext_attrs.has("Custom") {
                continue;
            }

            includes.extend(conversion_includes);
            let arguments_declaration = if arguments.is_empty() {
                "Dart_Handle* arguments = 0".to_string()
            } else {
                format!("Dart_Handle arguments[] = {{ {} }}", arguments.join(", "))
            };
            emitter.emit(
                impl_handlers,
                concat!(
                    "\n$TYPE $CLASS_NAME::handleEvent($PARAMETERS)\n",
                    "{\n",
                    "    if (!m_callback.isolate()->isAlive())\n",
                    "        return$ERROR_RETURN;\n",
                    "    DartIsolate::Scope scope(m_callback.isolate());\n",
                    "    DartApiScope apiScope;\n",
                    "    $ARGUMENTS_DECLARATION;\n",
                    "    $(RETURN_PREFIX)m_callback.handleEvent($ARGUMENT_COUNT, arguments);\n",
                    "}\n",
                ),
                &[
                    ("TYPE", &native_return_type),
                    ("CLASS_NAME", &class_name),
                    ("PARAMETERS", &parameters),
                    ("ERROR_RETURN", error_return),
                    ("RETURN_PREFIX", return_prefix),
                    ("ARGUMENTS_DECLARATION", &arguments_declaration),
                    ("ARGUMENT_COUNT", &arguments.len().to_string()),
                ],
            )?;
        }

        let header = emitter.file(self.cpp_header_path(&interface.id));
        let template = self.options.templates.load("cpp_callback_header.template")?;
        let handlers = emitter.fragments(header_handlers);
        emitter.emit(header, &template, &[("INTERFACE", &interface.id), ("HANDLERS", &handlers)])?;

        let impl_path = self.cpp_impl_path(&interface.id);
        self.cpp_impl_files.push(impl_path.clone());
        let implementation = emitter.file(impl_path);
        let template = self.options.templates.load("cpp_callback_implementation.template")?;
        let handlers = emitter.fragments(impl_handlers);
        emitter.emit(
            implementation,
            &template,
            &[
                ("INCLUDES", &cpp_includes(&includes)),
                ("INTERFACE", &interface.id),
                ("HANDLERS", &handlers),
            ],
        )?;
        Ok(())
    }

    fn generate_libraries(&mut self, emitter: &mut Emitter, interface_files: &[PathBuf]) -> WeldResult<()> {
        let output_dir = &self.options.output_dir;
        let auxiliary_dir = massage_path(&relative_path(&self.auxiliary_dir, output_dir));
        self.options.generate_lib_file(
            emitter,
            "html_dartium.darttemplate",
            &output_dir.join("html_dartium.dart"),
            interface_files,
            &[("AUXILIARY_DIR", &auxiliary_dir)],
        )?;
        self.generate_derived_sources(emitter)?;
        self.generate_resolver(emitter)?;
        debug!(
            headers = self.cpp_header_files.len(),
            sources = self.cpp_impl_files.len(),
            partitions = self.partitions,
            "native glue"
        );
        Ok(())
    }
}

/// Scratch and file holes of the class being generated
#[derive(Debug, Clone, Copy)]
struct ClassHoles {
    implementation: Hole,
    members: Hole,
    cpp_header: Hole,
    cpp_impl: Hole,
    cpp_declarations: Hole,
    cpp_definitions: Hole,
    cpp_resolver: Hole,
}

struct NativeClassGenerator<'s, 'a> {
    options: &'s SystemOptions<'a>,
    cpp_header_files: &'s mut Vec<PathBuf>,
    cpp_impl_files: &'s mut Vec<PathBuf>,
    interface: &'a IdlInterface,
    interface_type_info: Rc<IdlTypeInfo>,
    html_interface_name: String,
    holes: Option<ClassHoles>,
    cpp_impl_includes: BTreeSet<String>,
}

/// One C++ callback bound to a Dart native member
struct NativeCallback<'n> {
    name: &'n str,
    needs_receiver: bool,
    function_expression: String,
    /// Id of the IDL node the callback implements
    node_id: &'n str,
    ext_attrs: &'n ExtAttrs,
    arguments: &'n [IdlArgument],
    return_type: &'n str,
    raises_dom_exception: bool,
}

impl<'s, 'a> NativeClassGenerator<'s, 'a> {
    fn holes(&self) -> WeldResult<ClassHoles> {
        self.holes.ok_or_else(|| WeldError::MissingHole("MEMBERS".to_string()))
    }

    fn type_info(&self, type_name: &str) -> Rc<IdlTypeInfo> {
        self.options.types.type_info(type_name)
    }

    fn dart_type(&self, type_name: &str) -> String {
        self.options.dart_type(type_name)
    }

    fn impl_class_name(interface_name: &str) -> String {
        format!("_{interface_name}Impl")
    }

    fn base_class_name(&self) -> String {
        const ROOT: &str = "NativeFieldWrapperClass1";
        match self.interface.parents.first() {
            Some(parent)
                if !is_pure_interface(&parent.type_id)
                    && !is_dart_list_type(&parent.type_id)
                    && !is_dart_collection_type(&parent.type_id) =>
            {
                Self::impl_class_name(&parent.type_id)
            }
            _ => ROOT.to_string(),
        }
    }

    fn is_constructable(&self) -> bool {
        let ext_attrs = &self.interface.ext_attrs;
        CONSTRUCTABLE_ATTRIBUTES.iter().any(|name| ext_attrs.has(name))
            || ext_attrs.text("ConstructorTemplate") == Some("TypedArray")
    }

    fn generate_constructors(&mut self, emitter: &mut Emitter) -> WeldResult<()> {
        if !self.is_constructable() {
            return Ok(());
        }
        let holes = self.holes()?;
        let interface = self.interface;
        let id = interface.id.as_str();
        // Arity is unknown here, so dispatch is by name only
        emitter.emit(
            holes.cpp_resolver,
            "    if (name == \"$(INTERFACE_NAME)_constructor_Callback\")\n        return Dart$(INTERFACE_NAME)Internal::constructorCallback;\n",
            &[("INTERFACE_NAME", id)],
        )?;

        let ext_attrs = &interface.ext_attrs;
        if ext_attrs.has("CustomConstructor") {
            emitter.emit_raw(holes.cpp_declarations, "\nvoid constructorCallback(Dart_NativeArguments);\n");
            return Ok(());
        }

        if ext_attrs.text("ConstructorTemplate") == Some("TypedArray") {
            self.cpp_impl_includes.insert("\"DartArrayBufferViewCustom.h\"".to_string());
            emitter.emit(
                holes.cpp_definitions,
                concat!(
                    "\nstatic void constructorCallback(Dart_NativeArguments args)\n",
                    "{\n",
                    "    WebCore::DartArrayBufferViewInternal::constructWebGLArray<Dart$(INTERFACE_NAME)>(args);\n",
                    "}\n",
                ),
                &[("INTERFACE_NAME", id)],
            )?;
            return Ok(());
        }

        let create_function = if ext_attrs.has("NamedConstructor") {
            "createForJSConstructor"
        } else {
            "create"
        };
        let idl_args = analyze_constructor(interface).map(|info| info.idl_args).unwrap_or_default();
        self.generate_native_callback(
            emitter,
            NativeCallback {
                name: "constructorCallback",
                needs_receiver: false,
                function_expression: format!("{}::{create_function}", self.interface_type_info.native_type()),
                node_id: id,
                ext_attrs,
                arguments: &idl_args,
                return_type: id,
                raises_dom_exception: ext_attrs.has("ConstructorRaisesException"),
            },
        )
    }

    fn generate_cpp_header(&self, emitter: &mut Emitter, holes: ClassHoles) -> WeldResult<()> {
        let interface = self.interface;
        let id = interface.id.as_str();
        let type_info = &self.interface_type_info;

        let to_native = if type_info.custom_to_native() {
            "    static PassRefPtr<NativeType> toNative(Dart_Handle handle, Dart_Handle& exception);\n".to_string()
        } else {
            format(
                concat!(
                    "    static NativeType* toNative(Dart_Handle handle, Dart_Handle& exception)\n",
                    "    {\n",
                    "        return DartDOMWrapper::unwrapDartWrapper<Dart$INTERFACE>(handle, exception);\n",
                    "    }\n",
                ),
                &[("INTERFACE", id)],
            )?
        };

        let ext_attrs = &interface.ext_attrs;
        let custom_to_dart = ext_attrs.has("CustomToJS")
            || (ext_attrs.has("CustomToJSObject") && !ext_attrs.has("TypedArray"))
            || ext_attrs.has("PureInterface")
            || ext_attrs.has("CPPPureInterface")
            || type_info.custom_to_dart();
        let to_dart = if custom_to_dart {
            "    static Dart_Handle toDart(NativeType* value);\n".to_string()
        } else {
            format(
                concat!(
                    "    static Dart_Handle toDart(NativeType* value)\n",
                    "    {\n",
                    "        return DartDOMWrapper::toDart<Dart$(INTERFACE)>(value);\n",
                    "    }\n",
                ),
                &[("INTERFACE", id)],
            )?
        };

        let hierarchy = self.options.database.hierarchy(interface);
        let any = |test: &dyn Fn(&IdlInterface) -> bool| {
            if hierarchy.iter().any(|i| test(i)) {
                "true"
            } else {
                "false"
            }
        };
        let webcore_includes: BTreeSet<String> = type_info.webcore_includes().into_iter().collect();
        let declarations = emitter.fragments(holes.cpp_declarations);
        let template = self.options.templates.load("cpp_header.template")?;
        emitter.emit(
            holes.cpp_header,
            &template,
            &[
                ("INTERFACE", id),
                ("WEBCORE_INCLUDES", &cpp_includes(&webcore_includes)),
                ("WEBCORE_CLASS_NAME", &type_info.native_type()),
                ("DECLARATIONS", &declarations),
                ("IS_NODE", any(&|i| i.id == "Node")),
                ("IS_ACTIVE", any(&|i| i.ext_attrs.has("ActiveDOMObject"))),
                ("IS_EVENT_TARGET", any(&|i| i.ext_attrs.has("EventTarget"))),
                ("TO_NATIVE", &to_native),
                ("TO_DART", &to_dart),
            ],
        )?;
        Ok(())
    }

    fn add_getter(&mut self, emitter: &mut Emitter, attribute: &IdlAttribute, html_name: &str) -> WeldResult<()> {
        let declaration = format!("{} get {html_name}()", self.dart_type(&attribute.type_id));
        let is_custom = attribute.ext_attrs.has("Custom") || attribute.ext_attrs.has("CustomGetter");
        let callback_name = self.generate_native_binding(emitter, &attribute.id, 1, &declaration, "Getter", is_custom)?;
        if is_custom {
            return Ok(());
        }

        let ext_attrs = &attribute.ext_attrs;
        let function_name = if ext_attrs.has("Reflect") {
            if ext_attrs.has("URL") {
                if ext_attrs.has("NonEmpty") {
                    "getNonEmptyURLAttribute".to_string()
                } else {
                    "getURLAttribute".to_string()
                }
            } else {
                self.type_info(&attribute.type_id).webcore_getter_name().to_string()
            }
        } else if let Some(implemented_as) = ext_attrs.text("ImplementedAs") {
            implemented_as.to_string()
        } else {
            let mut name = match attribute.id.as_str() {
                "operator" => "_operator".to_string(),
                "target" if attribute.type_id == "SVGAnimatedString" => "svgTarget".to_string(),
                id => to_webkit_name(id),
            };
            if attribute.type_id.starts_with("SVGAnimated") {
                name.push_str("Animated");
            }
            name
        };

        let function_expression = self.webcore_function_expression(&function_name, ext_attrs, false);
        self.generate_native_callback(
            emitter,
            NativeCallback {
                name: &callback_name,
                needs_receiver: true,
                function_expression,
                node_id: &attribute.id,
                ext_attrs,
                arguments: &[],
                return_type: &attribute.type_id,
                raises_dom_exception: attribute.get_raises,
            },
        )
    }

    fn add_setter(&mut self, emitter: &mut Emitter, attribute: &IdlAttribute, html_name: &str) -> WeldResult<()> {
        let declaration = format!("void set {html_name}({} value)", self.dart_type(&attribute.type_id));
        let ext_attrs = &attribute.ext_attrs;
        let is_custom = ["Custom", "CustomSetter", "V8CustomSetter"]
            .iter()
            .any(|name| ext_attrs.has(name));
        let callback_name = self.generate_native_binding(emitter, &attribute.id, 2, &declaration, "Setter", is_custom)?;
        if is_custom {
            return Ok(());
        }

        let function_name = if ext_attrs.has("Reflect") {
            self.type_info(&attribute.type_id).webcore_setter_name().to_string()
        } else {
            let mut name = webkit_setter_name(&attribute.id);
            if attribute.type_id.starts_with("SVGAnimated") {
                name.push_str("Animated");
            }
            name
        };

        // The new value arrives as the only argument
        let value = IdlArgument {
            id: attribute.id.clone(),
            type_id: attribute.type_id.clone(),
            ext_attrs: attribute.ext_attrs.clone(),
            default_value: None,
        };
        let function_expression = self.webcore_function_expression(&function_name, ext_attrs, false);
        self.generate_native_callback(
            emitter,
            NativeCallback {
                name: &callback_name,
                needs_receiver: true,
                function_expression,
                node_id: &attribute.id,
                ext_attrs,
                arguments: std::slice::from_ref(&value),
                return_type: "void",
                raises_dom_exception: attribute.set_raises,
            },
        )
    }

    fn has_native_index_getter(&self) -> bool {
        let ext_attrs = &self.interface.ext_attrs;
        ext_attrs.has("CustomIndexedGetter") || ext_attrs.has("NumericIndexedGetter")
    }

    fn has_native_index_setter(&self) -> bool {
        self.interface.ext_attrs.has("CustomIndexedSetter")
    }

    fn emit_native_index_getter(&mut self, emitter: &mut Emitter, element_type: &str) -> WeldResult<()> {
        let declaration = format!("{element_type} operator[](int index)");
        self.generate_native_binding(emitter, "numericIndexGetter", 2, &declaration, "Callback", true)?;
        Ok(())
    }

    fn emit_native_index_setter(&mut self, emitter: &mut Emitter, element_type: &str) -> WeldResult<()> {
        let declaration = format!("void operator[]=(int index, {element_type} value)");
        self.generate_native_binding(emitter, "numericIndexSetter", 3, &declaration, "Callback", true)?;
        Ok(())
    }

    /// Optional in IDL and overloaded in WebCore rather than defaulted
    fn is_argument_optional_in_webcore(&self, operation_id: &str, argument: &IdlArgument) -> bool {
        if !argument.is_optional() || argument.ext_attrs.has("Callback") {
            return false;
        }
        if matches!(operation_id, "addEventListener" | "removeEventListener") && argument.id == "useCapture" {
            return false;
        }
        !(self.interface.id == "CSSStyleDeclaration" && operation_id == "setProperty" && argument.id == "priority")
    }

    /// Dart body picking the fixed-arity native binding for the actual arguments
    fn generate_dispatcher(
        &mut self,
        emitter: &mut Emitter,
        operations: &[IdlOperation],
        declaration: &str,
        argument_names: &[&str],
    ) -> WeldResult<()> {
        let body = emitter
            .emit(
                self.holes()?.members,
                "\n  $DECLARATION {\n$!BODY  }\n",
                &[("DECLARATION", declaration)],
            )?
            .get("BODY")?;

        let mut version = 1;
        if let [operation] = operations {
            let mut argument_count = operation.arguments.len();
            for (position, argument) in operation.arguments.iter().enumerate().rev() {
                if self.is_argument_optional_in_webcore(&operation.id, argument) {
                    // Later arguments optional only at the binding level are
                    // still passed, so the call keeps `argument_count`
                    let check = format!("{} !== _null", argument_names[position]);
                    self.generate_call(emitter, body, &mut version, operation, argument_names, argument_count, &[check])?;
                    argument_count = position;
                }
            }
            self.generate_call(emitter, body, &mut version, operation, argument_names, argument_count, &[])?;
            return Ok(());
        }

        for operation in operations {
            for (position, argument) in operation.arguments.iter().enumerate() {
                if self.is_argument_optional_in_webcore(&operation.id, argument) {
                    let checks = self.argument_checks(operation, argument_names, position);
                    self.generate_call(emitter, body, &mut version, operation, argument_names, position, &checks)?;
                }
            }
            let count = operation.arguments.len();
            let checks = self.argument_checks(operation, argument_names, count);
            self.generate_call(emitter, body, &mut version, operation, argument_names, count, &checks)?;
        }
        emitter.emit_raw(body, "    throw \"Incorrect number or type of arguments\";\n");
        Ok(())
    }

    /// Type checks for the first `count` arguments, absence checks for the rest
    fn argument_checks(&self, operation: &IdlOperation, argument_names: &[&str], count: usize) -> Vec<String> {
        argument_names
            .iter()
            .enumerate()
            .map(|(i, name)| match operation.arguments.get(i) {
                Some(argument) if i < count => {
                    format!("({name} is {} || {name} === null)", self.dart_type(&argument.type_id))
                }
                _ => format!("{name} === _null"),
            })
            .collect()
    }

    #[allow(clippy::too_many_arguments)]
    fn generate_call(
        &mut self,
        emitter: &mut Emitter,
        body: Hole,
        version: &mut usize,
        operation: &IdlOperation,
        argument_names: &[&str],
        argument_count: usize,
        checks: &[String],
    ) -> WeldResult<()> {
        let returns = operation.type_id != "void";
        let template = match (checks.is_empty(), returns) {
            (false, true) => "    if ($CHECKS) {\n      return $CALL;\n    }\n",
            (false, false) => "    if ($CHECKS) {\n      $CALL;\n      return;\n    }\n",
            (true, true) => "    return $CALL;\n",
            (true, false) => "    $CALL;\n",
        };

        let overload_name = format!("{}_{version}", operation.id);
        *version += 1;
        let argument_list = argument_names[..argument_count].join(", ");
        let call = format!("_{overload_name}({argument_list})");
        emitter.emit(body, template, &[("CHECKS", &checks.join(" && ")), ("CALL", &call)])?;

        let declaration = format!(
            "{}{} _{overload_name}({argument_list})",
            if operation.is_static { "static " } else { "" },
            self.dart_type(&operation.type_id),
        );
        let argc = usize::from(!operation.is_static) + argument_count;
        let callback_name = self.generate_native_binding(emitter, &overload_name, argc, &declaration, "Callback", false)?;
        self.generate_operation_native_callback(emitter, operation, &operation.arguments[..argument_count], &callback_name)
    }

    fn generate_operation_native_callback(
        &mut self,
        emitter: &mut Emitter,
        operation: &IdlOperation,
        arguments: &[IdlArgument],
        callback_name: &str,
    ) -> WeldResult<()> {
        let function_name = operation.ext_attrs.text("ImplementedAs").unwrap_or(&operation.id);
        let function_expression = self.webcore_function_expression(function_name, &operation.ext_attrs, operation.is_static);
        self.generate_native_callback(
            emitter,
            NativeCallback {
                name: callback_name,
                needs_receiver: !operation.is_static,
                function_expression,
                node_id: &operation.id,
                ext_attrs: &operation.ext_attrs,
                arguments,
                return_type: &operation.type_id,
                raises_dom_exception: operation.raises,
            },
        )
    }

    fn generate_native_callback(&mut self, emitter: &mut Emitter, callback: NativeCallback<'_>) -> WeldResult<()> {
        let holes = self.holes()?;
        let ext_attrs = callback.ext_attrs;
        let mut arguments = callback.arguments;
        let mut cpp_arguments: Vec<String> = Vec::new();
        let mut requires_v8_scope = arguments
            .iter()
            .any(|argument| self.type_info(&argument.type_id).requires_v8_scope());
        let mut raises_exceptions = callback.raises_dom_exception || !arguments.is_empty();
        let mut runtime_check = None;

        let call_with = ext_attrs.text("CallWith");
        let requires_stack_info = call_with == Some("ScriptArguments|CallStack");
        if requires_stack_info {
            raises_exceptions = true;
            requires_v8_scope = true;
            cpp_arguments = vec!["scriptArguments".to_string(), "scriptCallStack".to_string()];
            // WebCore rebuilds the last argument from the script arguments
            arguments = &arguments[..arguments.len().saturating_sub(1)];
        }

        let requires_script_execution_context = call_with == Some("ScriptExecutionContext");
        if requires_script_execution_context {
            raises_exceptions = true;
            cpp_arguments = vec!["context".to_string()];
        }

        let requires_dom_window = ext_attrs.has("NamedConstructor");
        if requires_dom_window {
            raises_exceptions = true;
            cpp_arguments = vec!["document".to_string()];
        }

        if let Some(implemented_by) = ext_attrs.text("ImplementedBy") {
            if !callback.needs_receiver {
                return Err(WeldError::invalid_idl(
                    &self.interface.id,
                    format!("{} is ImplementedBy {implemented_by} but has no receiver", callback.node_id),
                ));
            }
            self.cpp_impl_includes.insert(format!("\"{implemented_by}.h\""));
            cpp_arguments.push("receiver".to_string());
        }

        if ext_attrs.has("Reflect") {
            cpp_arguments = vec![self.reflection_attribute_name(callback.node_id, ext_attrs)];
        }

        let per_context = ext_attrs.text("synthesizedV8EnabledPerContext");
        let at_runtime = ext_attrs.text("synthesizedV8EnabledAtRuntime");
        if per_context.is_some() && at_runtime.is_some() {
            return Err(WeldError::invalid_idl(
                &self.interface.id,
                format!("{} is enabled both per context and at runtime", callback.node_id),
            ));
        }
        if let Some(feature) = per_context {
            raises_exceptions = true;
            self.cpp_impl_includes.insert("\"ContextFeatures.h\"".to_string());
            self.cpp_impl_includes.insert("\"DOMWindow.h\"".to_string());
            runtime_check = Some(format(
                concat!(
                    "        if (!ContextFeatures::$(FEATURE)Enabled(DartUtilities::domWindowForCurrentIsolate()->document())) {\n",
                    "            exception = Dart_NewString(\"Feature $FEATURE is not enabled\");\n",
                    "            goto fail;\n",
                    "        }",
                ),
                &[("FEATURE", feature)],
            )?);
        }
        if let Some(feature) = at_runtime {
            raises_exceptions = true;
            self.cpp_impl_includes.insert("\"RuntimeEnabledFeatures.h\"".to_string());
            runtime_check = Some(format(
                concat!(
                    "        if (!RuntimeEnabledFeatures::$(FEATURE)Enabled()) {\n",
                    "            exception = Dart_NewString(\"Feature $FEATURE is not enabled\");\n",
                    "            goto fail;\n",
                    "        }",
                ),
                &[("FEATURE", &to_webkit_name(feature))],
            )?);
        }

        let mut body = emitter
            .emit(
                holes.cpp_definitions,
                "\nstatic void $CALLBACK_NAME(Dart_NativeArguments args)\n{\n    DartApiScope dartApiScope;\n$!BODY}\n",
                &[("CALLBACK_NAME", callback.name)],
            )?
            .get("BODY")?;
        if raises_exceptions {
            body = emitter
                .emit(
                    body,
                    "    Dart_Handle exception = 0;\n$!BODY\nfail:\n    Dart_ThrowException(exception);\n    ASSERT_NOT_REACHED();\n",
                    &[],
                )?
                .get("BODY")?;
        }
        body = emitter.emit(body, "    {\n$!BODY        return;\n    }\n", &[])?.get("BODY")?;

        if requires_v8_scope {
            emitter.emit_raw(body, "        V8Scope v8scope;\n\n");
        }
        if let Some(check) = runtime_check {
            emitter.emit_raw(body, format!("{check}\n"));
        }
        if requires_script_execution_context {
            emitter.emit_raw(
                body,
                concat!(
                    "        ScriptExecutionContext* context = DartUtilities::scriptExecutionContext();\n",
                    "        if (!context) {\n",
                    "            exception = Dart_NewString(\"Failed to retrieve a context\");\n",
                    "            goto fail;\n",
                    "        }\n\n",
                ),
            );
        }
        if requires_dom_window {
            self.cpp_impl_includes.insert("\"DOMWindow.h\"".to_string());
            emitter.emit_raw(
                body,
                concat!(
                    "        DOMWindow* domWindow = DartUtilities::domWindowForCurrentIsolate();\n",
                    "        if (!domWindow) {\n",
                    "            exception = Dart_NewString(\"Failed to fetch domWindow\");\n",
                    "            goto fail;\n",
                    "        }\n",
                    "        Document* document = domWindow->document();\n",
                ),
            );
        }
        if callback.needs_receiver {
            emitter.emit(
                body,
                "        $WEBCORE_CLASS_NAME* receiver = DartDOMWrapper::receiver< $WEBCORE_CLASS_NAME >(args);\n",
                &[("WEBCORE_CLASS_NAME", &self.interface_type_info.native_type())],
            )?;
        }
        if requires_stack_info {
            self.cpp_impl_includes.insert("\"ScriptArguments.h\"".to_string());
            self.cpp_impl_includes.insert("\"ScriptCallStack.h\"".to_string());
            emitter.emit(
                body,
                concat!(
                    "\n        Dart_Handle customArgument = Dart_GetNativeArgument(args, $INDEX);\n",
                    "        RefPtr<ScriptArguments> scriptArguments(DartUtilities::createScriptArguments(customArgument, exception));\n",
                    "        if (!scriptArguments)\n",
                    "            goto fail;\n",
                    "        RefPtr<ScriptCallStack> scriptCallStack(DartUtilities::createScriptCallStack());\n",
                    "        if (!scriptCallStack->size())\n",
                    "            return;\n",
                ),
                &[("INDEX", &(arguments.len() + 1).to_string())],
            )?;
        }

        let start_index = usize::from(callback.needs_receiver);
        for (i, argument) in arguments.iter().enumerate() {
            let type_info = self.type_info(&argument.type_id);
            self.cpp_impl_includes.extend(type_info.to_native_includes());
            let name = argument.ext_attrs.text("DartName").unwrap_or(&argument.id);
            let accept_null = (argument.is_optional() && !self.is_argument_optional_in_webcore(callback.node_id, argument))
                || argument.ext_attrs.text("Optional") == Some("DefaultIsNullString");
            type_info.emit_to_native(
                emitter,
                body,
                &argument.ext_attrs,
                accept_null,
                name,
                &format!("Dart_GetNativeArgument(args, {})", start_index + i),
            )?;
            cpp_arguments.push(type_info.argument_expression(name, &self.interface.id));
        }
        emitter.emit_raw(body, "\n");

        if ext_attrs.has("NeedsUserGestureCheck") {
            cpp_arguments.push("DartUtilities::processingUserGesture".to_string());
        }

        let mut invocation = body;
        if callback.raises_dom_exception {
            cpp_arguments.push("ec".to_string());
            invocation = emitter
                .emit(
                    body,
                    concat!(
                        "        ExceptionCode ec = 0;\n",
                        "$!INVOCATION",
                        "        if (UNLIKELY(ec)) {\n",
                        "            exception = DartDOMWrapper::exceptionCodeToDartException(ec);\n",
                        "            goto fail;\n",
                        "        }\n",
                    ),
                    &[],
                )?
                .get("INVOCATION")?;
        }

        let function_call = format!("{}({})", callback.function_expression, cpp_arguments.join(", "));
        if callback.return_type == "void" {
            emitter.emit(invocation, "        $FUNCTION_CALL;\n", &[("FUNCTION_CALL", &function_call)])?;
        } else {
            let return_type_info = self.type_info(callback.return_type);
            self.cpp_impl_includes.extend(return_type_info.conversion_includes());
            let conversion = return_type_info.to_dart_conversion(&function_call, &self.interface.id, ext_attrs);
            emitter.emit(
                invocation,
                "        Dart_Handle returnValue = $TO_DART_CONVERSION;\n        if (returnValue)\n            Dart_SetReturnValue(args, returnValue);\n",
                &[("TO_DART_CONVERSION", &conversion)],
            )?;
        }
        Ok(())
    }

    /// Declare the Dart native member and register its resolver entry;
    /// returns the C++ callback name
    fn generate_native_binding(
        &mut self,
        emitter: &mut Emitter,
        idl_name: &str,
        argument_count: usize,
        dart_declaration: &str,
        native_suffix: &str,
        is_custom: bool,
    ) -> WeldResult<String> {
        let holes = self.holes()?;
        let native_binding = format!("{}_{idl_name}_{native_suffix}", self.interface.id);
        emitter.emit(
            holes.members,
            "\n  $DART_DECLARATION native \"$NATIVE_BINDING\";\n",
            &[("DART_DECLARATION", dart_declaration), ("NATIVE_BINDING", &native_binding)],
        )?;

        let callback_name = format!("{idl_name}{native_suffix}");
        emitter.emit(
            holes.cpp_resolver,
            "    if (argumentCount == $ARGC && name == \"$NATIVE_BINDING\")\n        return Dart$(INTERFACE_NAME)Internal::$CPP_CALLBACK_NAME;\n",
            &[
                ("ARGC", &argument_count.to_string()),
                ("NATIVE_BINDING", &native_binding),
                ("INTERFACE_NAME", &self.interface.id),
                ("CPP_CALLBACK_NAME", &callback_name),
            ],
        )?;

        if is_custom {
            emitter.emit(
                holes.cpp_declarations,
                "\nvoid $CPP_CALLBACK_NAME(Dart_NativeArguments);\n",
                &[("CPP_CALLBACK_NAME", &callback_name)],
            )?;
        }
        Ok(callback_name)
    }

    fn reflection_attribute_name(&mut self, attribute_id: &str, ext_attrs: &ExtAttrs) -> String {
        let namespace = if self.interface.id.starts_with("SVG") && !SVG_HTML_NAMES.contains(&attribute_id) {
            "SVGNames"
        } else {
            "HTMLNames"
        };
        self.cpp_impl_includes.insert(format!("\"{namespace}.h\""));
        let attribute_name = match ext_attrs.text("Reflect") {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => attribute_id.to_lowercase(),
        };
        format!("WebCore::{namespace}::{attribute_name}Attr")
    }

    fn webcore_function_expression(&self, function_name: &str, ext_attrs: &ExtAttrs, is_static: bool) -> String {
        if let Some(implemented_by) = ext_attrs.text("ImplementedBy") {
            return format!("{implemented_by}::{function_name}");
        }
        if is_static {
            return format!("{}::{function_name}", self.interface_type_info.idl_type());
        }
        format!("{}{function_name}", self.interface_type_info.receiver())
    }
}

impl<'s, 'a> ImplementationGenerator<'a> for NativeClassGenerator<'s, 'a> {
    fn has_implementation(&self) -> bool {
        !is_pure_interface(&self.interface.id)
    }

    fn implementation_class_name(&self) -> String {
        Self::impl_class_name(&self.interface.id)
    }

    fn implementation_path(&self) -> PathBuf {
        self.options
            .output_dir
            .join("dart")
            .join(format!("{}Implementation.dart", self.interface.id))
    }

    fn factory_provider_path(&self) -> PathBuf {
        self.options
            .output_dir
            .join("dart")
            .join(format!("{}FactoryProviderImplementation.dart", self.interface.id))
    }

    fn elements_factory_provider_path(&self) -> PathBuf {
        self.options
            .output_dir
            .join("dart")
            .join("_ElementsFactoryProviderImplementation.dart")
    }

    fn implements_merged_members(&self) -> bool {
        // The C++ object of the merged-into interface lacks these members
        false
    }

    fn start_interface(&mut self, emitter: &mut Emitter, implementation: Hole) -> WeldResult<Hole> {
        let (cpp_header, cpp_impl) = if self.has_implementation() {
            let header_path = cpp_path(&self.options.output_dir, &self.interface.id, "h");
            let impl_path = cpp_path(&self.options.output_dir, &self.interface.id, "cpp");
            self.cpp_header_files.push(header_path.clone());
            self.cpp_impl_files.push(impl_path.clone());
            (emitter.file(header_path), emitter.file(impl_path))
        } else {
            (emitter.scratch(), emitter.scratch())
        };
        let holes = ClassHoles {
            implementation,
            members: emitter.scratch(),
            cpp_header,
            cpp_impl,
            cpp_declarations: emitter.scratch(),
            cpp_definitions: emitter.scratch(),
            cpp_resolver: emitter.scratch(),
        };
        self.holes = Some(holes);
        self.generate_constructors(emitter)?;
        Ok(holes.members)
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
        emitter.emit(
            at,
            &template,
            &[
                ("FACTORYPROVIDER", factory_provider),
                ("INTERFACE", &self.html_interface_name),
                ("PARAMETERS", &params),
                ("ARGUMENTS", &info.parameters_as_argument_list()),
                ("NATIVE_NAME", &format!("{}_constructor_Callback", self.interface.id)),
            ],
        )?;
        Ok(())
    }

    fn add_indexer(&mut self, emitter: &mut Emitter, element_type: &str) -> WeldResult<()> {
        let members = self.holes()?.members;
        let dart_element_type = self.dart_type(element_type);
        if self.has_native_index_getter() {
            self.emit_native_index_getter(emitter, &dart_element_type)?;
        } else {
            emitter.emit(
                members,
                "\n  $TYPE operator[](int index) native \"$(INTERFACE)_item_Callback\";\n",
                &[("TYPE", &dart_element_type), ("INTERFACE", &self.interface.id)],
            )?;
        }

        let is_node_list = self.interface.id == "NodeList";
        if self.has_native_index_setter() {
            self.emit_native_index_setter(emitter, &dart_element_type)?;
        } else if !is_node_list {
            emitter.emit(
                members,
                "\n  void operator[]=(int index, $TYPE value) {\n    throw new UnsupportedOperationException(\"Cannot assign element of immutable List.\");\n  }\n",
                &[("TYPE", &dart_element_type)],
            )?;
        }

        // The List members of NodeList are hand-written
        if !is_node_list {
            let template = self.options.templates.load("immutable_list_mixin.darttemplate")?;
            emitter.emit(members, &template, &[("E", &dart_element_type)])?;
        }
        Ok(())
    }

    fn amend_indexer(&mut self, emitter: &mut Emitter, element_type: &str) -> WeldResult<()> {
        // Native accessors are not virtual in C++, so subclasses rebind them
        let dart_element_type = self.dart_type(element_type);
        if self.has_native_index_getter() {
            self.emit_native_index_getter(emitter, &dart_element_type)?;
        }
        if self.has_native_index_setter() {
            self.emit_native_index_setter(emitter, &dart_element_type)?;
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
        if attribute.ext_attrs.has("CheckSecurityForNode") {
            return Ok(());
        }
        self.add_getter(emitter, attribute, html_name)?;
        if !read_only {
            self.add_setter(emitter, attribute, html_name)?;
        }
        Ok(())
    }

    fn add_operation(&mut self, emitter: &mut Emitter, info: &OperationInfo, html_name: &str) -> WeldResult<()> {
        let Some(operation) = info.operations.first() else {
            return Ok(());
        };
        if operation.ext_attrs.has("CheckSecurityForNode") {
            return Ok(());
        }

        let is_custom = operation.ext_attrs.has("Custom");
        let has_optional_arguments = operation
            .arguments
            .iter()
            .any(|argument| self.is_argument_optional_in_webcore(&operation.id, argument));
        let needs_dispatcher = !is_custom && (info.operations.len() > 1 || has_optional_arguments);

        let params = if needs_dispatcher {
            info.parameters_implementation_declaration(|_| "Dynamic".to_string(), "_null")?
        } else {
            info.parameters_implementation_declaration(|t| self.dart_type(t), "null")?
        };
        let declaration = format!(
            "{}{} {html_name}({params})",
            if info.is_static() { "static " } else { "" },
            self.dart_type(&info.type_name),
        );

        if needs_dispatcher {
            let names: Vec<&str> = info.param_infos.iter().map(|p| p.name.as_str()).collect();
            return self.generate_dispatcher(emitter, &info.operations, &declaration, &names);
        }

        let argc = usize::from(!info.is_static()) + info.param_infos.len();
        let callback_name = self.generate_native_binding(emitter, &info.name, argc, &declaration, "Callback", is_custom)?;
        if !is_custom {
            self.generate_operation_native_callback(emitter, operation, &operation.arguments, &callback_name)?;
        }
        Ok(())
    }

    fn finish_interface(&mut self, emitter: &mut Emitter) -> WeldResult<()> {
        let holes = self.holes()?;
        let templates = &self.options.templates;
        let mut template = None;
        if self.html_interface_name == self.interface.id || !self.options.database.has_interface(&self.html_interface_name) {
            template = templates.try_load(&format!("impl_{}.darttemplate", self.html_interface_name))?;
        }
        let template = match template {
            Some(template) => template,
            None => templates.load("dart_implementation.darttemplate")?,
        };

        let class_name = self.implementation_class_name();
        let members = emitter
            .emit(
                holes.implementation,
                &template,
                &[
                    ("CLASSNAME", &class_name),
                    ("EXTENDS", &format!(" extends {}", self.base_class_name())),
                    ("IMPLEMENTS", &format!(" implements {}", self.html_interface_name)),
                    ("NATIVESPEC", ""),
                ],
            )?
            .get("MEMBERS")?;
        emitter.attach(members, holes.members);

        self.generate_cpp_header(emitter, holes)?;

        let definitions = emitter.fragments(holes.cpp_definitions);
        let resolver = emitter.fragments(holes.cpp_resolver);
        let template = self.options.templates.load("cpp_implementation.template")?;
        emitter.emit(
            holes.cpp_impl,
            &template,
            &[
                ("INTERFACE", &self.interface.id),
                ("INCLUDES", &cpp_includes(&self.cpp_impl_includes)),
                ("CALLBACKS", &definitions),
                ("RESOLVER", &resolver),
                ("DART_IMPLEMENTATION_CLASS", &class_name),
            ],
        )?;
        Ok(())
    }
}

/// WebCore getter name for an IDL attribute name
///
/// `URL` becomes `url`, `XMLStandalone` becomes `xmlStandalone`, and
/// boolean-like `create…`/`exclusive` names gain an `is` prefix.
pub fn to_webkit_name(name: &str) -> String {
    let mut chars = name.chars();
    let name: String = match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => return String::new(),
    };
    let name = WEBKIT_PREFIX.replace(&name, |caps: &regex::Captures| caps[1].to_lowercase());
    WEBKIT_PREDICATE
        .replace(&name, |caps: &regex::Captures| {
            let word = &caps[1];
            format!("is{}{}", word[..1].to_uppercase(), &word[1..])
        })
        .into_owned()
}

/// WebCore setter name: `set` and the capitalized name, `xml` upper-cased whole
fn webkit_setter_name(name: &str) -> String {
    let xml_prefixed = name.starts_with("xml") && name[3..].chars().next().is_some_and(char::is_uppercase);
    if xml_prefixed {
        return format!("setXML{}", &name[3..]);
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => format!("set{}{}", first.to_uppercase(), chars.as_str()),
        None => "set".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idl::{ExtAttrValue, IdlConstant, IdlDatabase, IdlFunction};
    use crate::systems::test_support::{read, run_html, Flavor};
    use pretty_assertions::assert_eq;

    fn database() -> IdlDatabase {
        IdlDatabase::new()
            .with_interface(IdlInterface::new("EventTarget"))
            .with_interface(
                IdlInterface::new("Node")
                    .parent("EventTarget")
                    .constant(IdlConstant::new("ELEMENT_NODE", "unsigned short", "1"))
                    .attribute(IdlAttribute::new("parentNode", "Node").read_only())
                    .attribute({
                        let mut attr = IdlAttribute::new("nodeValue", "DOMString");
                        attr.set_raises = true;
                        attr
                    })
                    .operation(
                        IdlOperation::new("add", "void").arg(IdlArgument::new("child", "Node")),
                    )
                    .operation(
                        IdlOperation::new("add", "void").arg(IdlArgument::new("child", "DOMString")),
                    ),
            )
            .with_interface(
                IdlInterface::new("Element")
                    .parent("Node")
                    .operation(
                        IdlOperation::new("scrollIntoView", "void")
                            .arg(IdlArgument::new("alignWithTop", "boolean").optional()),
                    ),
            )
            .with_interface(IdlInterface::new("HTMLElement").parent("Element"))
            .with_interface(
                IdlInterface::new("WebKitCSSMatrix").with_ext_attr(
                    "Constructor",
                    ExtAttrValue::Function(IdlFunction {
                        id: None,
                        arguments: vec![IdlArgument::new("cssValue", "DOMString").optional()],
                    }),
                ),
            )
            .with_interface(
                IdlInterface::new("VoidCallback")
                    .with_ext_attr("Callback", ExtAttrValue::Flag)
                    .operation(IdlOperation::new("handleEvent", "void")),
            )
    }

    #[test]
    fn test_webkit_names() {
        assert_eq!(to_webkit_name("URL"), "url");
        assert_eq!(to_webkit_name("XMLStandalone"), "xmlStandalone");
        assert_eq!(to_webkit_name("parentNode"), "parentNode");
        assert_eq!(to_webkit_name("exclusive"), "isExclusive");
        assert_eq!(webkit_setter_name("xmlStandalone"), "setXMLStandalone");
        assert_eq!(webkit_setter_name("nodeValue"), "setNodeValue");
    }

    #[test]
    fn test_dart_class_and_bindings() {
        let db = database();
        let out = Path::new("out");
        let mut emitter = run_html(&db, out, Flavor::Native);

        let node = read(&mut emitter, out.join("dart/NodeImplementation.dart"));
        assert!(node.contains("class _NodeImpl extends _EventTargetImpl implements Node {"));
        assert!(node.contains("\n  Node get parent() native \"Node_parentNode_Getter\";\n"));
        assert!(node.contains("\n  void set nodeValue(String value) native \"Node_nodeValue_Setter\";\n"));
        assert!(node.contains("\n  void add(child) {\n"));
        assert!(node.contains("    if ((child is Node || child === null)) {\n      _add_1(child);\n      return;\n    }\n"));
        assert!(node.contains("    if ((child is String || child === null)) {\n      _add_2(child);\n      return;\n    }\n"));
        assert!(node.contains("    throw \"Incorrect number or type of arguments\";\n"));
        assert!(node.contains("\n  void _add_1(child) native \"Node_add_1_Callback\";\n"));

        let event_target = read(&mut emitter, out.join("dart/EventTargetImplementation.dart"));
        assert!(event_target.contains("class _EventTargetImpl extends NativeFieldWrapperClass1 implements EventTarget {"));
    }

    #[test]
    fn test_optional_argument_dispatch() {
        let db = database();
        let out = Path::new("out");
        let mut emitter = run_html(&db, out, Flavor::Native);

        let element = read(&mut emitter, out.join("dart/ElementImplementation.dart"));
        assert!(element.contains(concat!(
            "\n  void scrollIntoView([alignWithTop = _null]) {\n",
            "    if (alignWithTop !== _null) {\n",
            "      _scrollIntoView_1(alignWithTop);\n",
            "      return;\n",
            "    }\n",
            "    _scrollIntoView_2();\n",
            "  }\n",
        )));
        assert!(element.contains("\n  void _scrollIntoView_2() native \"Element_scrollIntoView_2_Callback\";\n"));

        let cpp = read(&mut emitter, out.join("cpp/DartElement.cpp"));
        assert!(cpp.contains("    if (argumentCount == 2 && name == \"Element_scrollIntoView_1_Callback\")\n        return DartElementInternal::scrollIntoView_1Callback;\n"));
        assert!(cpp.contains("    if (argumentCount == 1 && name == \"Element_scrollIntoView_2_Callback\")\n"));
        assert!(cpp.contains("        receiver->scrollIntoView(alignWithTop);\n"));
        assert!(cpp.contains("        receiver->scrollIntoView();\n"));
    }

    #[test]
    fn test_cpp_callbacks() {
        let db = database();
        let out = Path::new("out");
        let mut emitter = run_html(&db, out, Flavor::Native);

        let cpp = read(&mut emitter, out.join("cpp/DartNode.cpp"));
        assert!(cpp.contains(concat!(
            "\nstatic void parentNodeGetter(Dart_NativeArguments args)\n",
            "{\n",
            "    DartApiScope dartApiScope;\n",
            "    {\n",
            "        Node* receiver = DartDOMWrapper::receiver< Node >(args);\n",
            "\n",
            "        Dart_Handle returnValue = DartNode::toDart(receiver->parentNode());\n",
            "        if (returnValue)\n",
            "            Dart_SetReturnValue(args, returnValue);\n",
            "        return;\n",
            "    }\n",
            "}\n",
        )));
        assert!(cpp.contains("    Dart_Handle exception = 0;\n"));
        assert!(cpp.contains("        ExceptionCode ec = 0;\n        receiver->setNodeValue(nodeValue, ec);\n"));
        assert!(cpp.contains("    if (argumentCount == 1 && name == \"Node_parentNode_Getter\")\n        return DartNodeInternal::parentNodeGetter;\n"));

        let header = read(&mut emitter, out.join("cpp/DartNode.h"));
        assert!(header.contains("DartDOMWrapper::unwrapDartWrapper<DartNode>(handle, exception)"));
        assert!(header.contains("static const bool isNode = true;"));
    }

    #[test]
    fn test_constructor_and_factory_provider() {
        let db = database();
        let out = Path::new("out");
        let mut emitter = run_html(&db, out, Flavor::Native);

        let cpp = read(&mut emitter, out.join("cpp/DartWebKitCSSMatrix.cpp"));
        assert!(cpp.contains("    if (name == \"WebKitCSSMatrix_constructor_Callback\")\n        return DartWebKitCSSMatrixInternal::constructorCallback;\n"));
        assert!(cpp.contains("\nstatic void constructorCallback(Dart_NativeArguments args)\n"));
        assert!(cpp.contains("DartWebKitCSSMatrix::toDart(WebKitCSSMatrix::create(cssValue))"));

        let provider = read(&mut emitter, out.join("dart/WebKitCSSMatrixFactoryProviderImplementation.dart"));
        assert!(provider.contains("class _CSSMatrixFactoryProvider {"));
        assert!(provider.contains("native \"WebKitCSSMatrix_constructor_Callback\""));
    }

    #[test]
    fn test_callback_bindings() {
        let db = database();
        let out = Path::new("out");
        let mut emitter = run_html(&db, out, Flavor::Native);

        let header = read(&mut emitter, out.join("cpp/DartVoidCallback.h"));
        assert!(header.contains("\n    virtual void handleEvent();\n"));
        let cpp = read(&mut emitter, out.join("cpp/DartVoidCallback.cpp"));
        assert!(cpp.contains("    Dart_Handle* arguments = 0;\n    m_callback.handleEvent(0, arguments);\n"));
    }

    #[test]
    fn test_library_glue() {
        let db = database();
        let out = Path::new("out");
        let mut emitter = run_html(&db, out, Flavor::Native);

        let lib = read(&mut emitter, out.join("html_dartium.dart"));
        assert!(lib.contains("#source('dart/NodeImplementation.dart');"));
        assert!(lib.contains("#source('html/interface/Node.dart');"));
        assert!(lib.contains("../html"));

        // Generation order is Element's parents first: EventTarget, Node, Element
        let first = read(&mut emitter, out.join("DartDerivedSources01.cpp"));
        assert!(first.contains("#include \"cpp/DartEventTarget.cpp\"\n"));
        let second = read(&mut emitter, out.join("DartDerivedSources02.cpp"));
        assert!(second.contains("#include \"cpp/DartNode.cpp\"\n"));
        assert!(emitter.file_paths().any(|p| p.ends_with("DartDerivedSources20.cpp")));

        let resolver = read(&mut emitter, out.join("DartResolver.cpp"));
        assert!(resolver.contains("#include \"cpp/DartNode.h\"\n"));
        assert!(resolver.contains("    if (Dart_NativeFunction func = DartNode::resolver(name, argumentCount))\n        return func;\n"));
        // Callback headers have no resolver
        assert!(!resolver.contains("DartVoidCallback"));
    }
}
