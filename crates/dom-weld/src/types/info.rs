//! Type descriptors
//!
//! Each descriptor knows how a value of its IDL type is declared, converted
//! and passed in the generated Dart and C++ code.

use crate::emitter::{Emitter, Hole};
use crate::error::WeldResult;
use crate::idl::ExtAttrs;
use crate::types::table::{TypeData, SVG_SUPPLEMENTAL_INCLUDES};
use lazy_static::lazy_static;
use regex::Regex;
use std::rc::Rc;

lazy_static! {
    static ref LOWER_WORD_START: Regex = Regex::new(r"(^| )([a-z])").unwrap();
}

static WTF_INCLUDES: &[&str] = &[
    "ArrayBuffer",
    "ArrayBufferView",
    "Float32Array",
    "Float64Array",
    "Int8Array",
    "Int16Array",
    "Int32Array",
    "Uint8Array",
    "Uint16Array",
    "Uint32Array",
    "Uint8ClampedArray",
];

static SVG_PRIMITIVE_TYPES: &[&str] = &[
    "SVGAngle",
    "SVGLength",
    "SVGMatrix",
    "SVGNumber",
    "SVGPoint",
    "SVGRect",
    "SVGTransform",
];

/// Descriptor category with its category-specific data
#[derive(Debug)]
pub enum TypeKind {
    Primitive,
    Interface,
    SvgTearOff,
    Sequence(Rc<IdlTypeInfo>),
    /// `DOMString[]`, converted through `DOMStringList`
    DomStringArray(Rc<IdlTypeInfo>),
}

/// Resolved descriptor for one IDL type name
#[derive(Debug)]
pub struct IdlTypeInfo {
    idl_type: String,
    data: TypeData,
    kind: TypeKind,
}

impl IdlTypeInfo {
    pub fn new(idl_type: impl Into<String>, data: TypeData, kind: TypeKind) -> Self {
        Self {
            idl_type: idl_type.into(),
            data,
            kind,
        }
    }

    pub fn idl_type(&self) -> &str {
        &self.idl_type
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    pub fn dart_type(&self) -> String {
        match &self.kind {
            TypeKind::Sequence(item) | TypeKind::DomStringArray(item) => {
                format!("List<{}>", item.dart_type())
            }
            _ => self.data.dart_type.unwrap_or(&self.idl_type).to_string(),
        }
    }

    pub fn native_type(&self) -> String {
        if let Some(native) = self.data.native_type {
            return native.to_string();
        }
        match self.kind {
            TypeKind::SvgTearOff if self.idl_type.ends_with("List") => {
                format!("SVGListPropertyTearOff<{}>", self.idl_type)
            }
            TypeKind::SvgTearOff => format!("SVGPropertyTearOff<{}>", self.idl_type),
            _ => self.idl_type.clone(),
        }
    }

    pub fn requires_v8_scope(&self) -> bool {
        self.data.requires_v8_scope
    }

    pub fn custom_to_native(&self) -> bool {
        self.data.custom_to_native
    }

    pub fn custom_to_dart(&self) -> bool {
        self.data.custom_to_dart
    }

    pub fn webcore_getter_name(&self) -> &'static str {
        self.data.webcore_getter_name
    }

    pub fn webcore_setter_name(&self) -> &'static str {
        self.data.webcore_setter_name
    }

    /// C++ type of a parameter of this type in a WebCore signature
    pub fn parameter_type(&self) -> String {
        match self.kind {
            TypeKind::Primitive if self.native_type() == "String" => "const String&".to_string(),
            TypeKind::Primitive => self.native_type(),
            _ => format!("{}*", self.native_type()),
        }
    }

    /// Expression passing the converted local `name` to WebCore
    pub fn argument_expression(&self, name: &str, interface_name: &str) -> String {
        match self.kind {
            TypeKind::SvgTearOff if interface_name.ends_with("List") => name.to_string(),
            TypeKind::SvgTearOff => format!("{name}->propertyReference()"),
            _ if self.custom_to_native() => format!("{name}.get()"),
            _ => name.to_string(),
        }
    }

    /// Prefix used to call members on the native receiver
    pub fn receiver(&self) -> &'static str {
        match self.kind {
            TypeKind::SvgTearOff if !self.idl_type.ends_with("List") => {
                "receiver->propertyReference()."
            }
            _ => "receiver->",
        }
    }

    /// WebCore headers declaring the native type
    pub fn webcore_includes(&self) -> Vec<String> {
        let native = self.native_type();
        if WTF_INCLUDES.contains(&self.idl_type.as_str()) {
            return vec![format!("<wtf/{native}.h>")];
        }
        if !self.idl_type.starts_with("SVG") {
            return vec![format!("\"{native}.h\"")];
        }
        if self.idl_type == "SVGNumber" || self.idl_type == "SVGPoint" {
            return vec!["\"SVGPropertyTearOff.h\"".to_string()];
        }
        let include = if self.idl_type.starts_with("SVGPathSeg") {
            self.idl_type.replace("Abs", "").replace("Rel", "")
        } else {
            self.idl_type.clone()
        };
        let mut includes = vec![format!("\"{include}.h\"")];
        includes.extend(SVG_SUPPLEMENTAL_INCLUDES.iter().map(|s| s.to_string()));
        includes
    }

    /// Binding headers needed to convert values of this type to Dart
    pub fn conversion_includes(&self) -> Vec<String> {
        match &self.kind {
            TypeKind::Primitive => Vec::new(),
            TypeKind::Sequence(item) | TypeKind::DomStringArray(item) => item.conversion_includes(),
            _ => std::iter::once(self.idl_type.as_str())
                .chain(self.data.conversion_includes.iter().copied())
                .map(|include| format!("\"Dart{include}.h\""))
                .collect(),
        }
    }

    /// Binding headers needed to convert Dart values to this type
    pub fn to_native_includes(&self) -> Vec<String> {
        match self.kind {
            TypeKind::Primitive => Vec::new(),
            TypeKind::DomStringArray(_) => vec!["\"DartDOMStringList.h\"".to_string()],
            _ => vec![format!("\"Dart{}.h\"", self.idl_type)],
        }
    }

    /// C++ expression converting native `value` to a Dart handle
    pub fn to_dart_conversion(&self, value: &str, interface_name: &str, attributes: &ExtAttrs) -> String {
        match &self.kind {
            TypeKind::Primitive => {
                let capitalized = self.capitalized_native_type();
                let mut chars = capitalized.chars();
                let lowered: String = match chars.next() {
                    Some(first) => first.to_lowercase().chain(chars).collect(),
                    None => String::new(),
                };
                let suffix = if attributes.has("TreatReturnedNullStringAs") {
                    "WithNullCheck"
                } else {
                    ""
                };
                format!("DartUtilities::{lowered}ToDart{suffix}({value})")
            }
            TypeKind::Sequence(item) | TypeKind::DomStringArray(item) => format!(
                "DartDOMWrapper::vectorToDart<Dart{}>({value})",
                item.native_type()
            ),
            TypeKind::SvgTearOff => {
                let native = self.native_type();
                let cast = if interface_name.starts_with("SVGAnimated") {
                    format!("static_cast<{native}*>({value})")
                } else if self.idl_type == "SVGStringList" {
                    format!("{native}::create(receiver, {value})")
                } else if interface_name.ends_with("List") {
                    format!("static_cast<{native}*>({value}.get())")
                } else if SVG_PRIMITIVE_TYPES.contains(&self.idl_type.as_str()) {
                    format!("{native}::create({value})")
                } else {
                    format!("static_cast<{native}*>({value})")
                };
                format!("Dart{}::toDart({cast})", self.idl_type)
            }
            TypeKind::Interface => format!("Dart{}::toDart({value})", self.idl_type),
        }
    }

    /// Emit the C++ statements converting Dart `handle` to a native local `name`
    pub fn emit_to_native(
        &self,
        emitter: &mut Emitter,
        at: Hole,
        node_attrs: &ExtAttrs,
        accept_null: bool,
        name: &str,
        handle: &str,
    ) -> WeldResult<()> {
        const CHECK: &str = "        if (exception)\n            goto fail;\n";
        let null_check = if accept_null { "WithNullCheck" } else { "" };
        match self.kind {
            TypeKind::DomStringArray(_) => {
                emitter.emit(
                    at,
                    &format!("\n        RefPtr<DOMStringList> $NAME = DartDOMStringList::toNative($HANDLE, exception);\n{CHECK}"),
                    &[("NAME", name), ("HANDLE", handle)],
                )?;
            }
            TypeKind::Primitive => {
                let function = format!("dartTo{}{null_check}", self.capitalized_native_type());
                let native = self.native_type();
                let ty = match native.as_str() {
                    "SerializedScriptValue" => format!("RefPtr<{native}>"),
                    "String" => "DartStringAdapter".to_string(),
                    _ => native.clone(),
                };
                emitter.emit(
                    at,
                    &format!("\n        $TYPE $NAME = DartUtilities::$FUNCTION_NAME($HANDLE, exception);\n{CHECK}"),
                    &[("TYPE", &ty), ("NAME", name), ("FUNCTION_NAME", &function), ("HANDLE", handle)],
                )?;
            }
            _ if node_attrs.has("Callback") => {
                let function = format!("create{null_check}");
                emitter.emit(
                    at,
                    &format!("\n        RefPtr<$TYPE> $NAME = Dart$IDL_TYPE::$FUNCTION_NAME($HANDLE, exception);\n{CHECK}"),
                    &[
                        ("TYPE", &self.native_type()),
                        ("NAME", name),
                        ("FUNCTION_NAME", &function),
                        ("IDL_TYPE", &self.idl_type),
                        ("HANDLE", handle),
                    ],
                )?;
            }
            _ => {
                let ty = if self.custom_to_native() {
                    format!("RefPtr<{}>", self.native_type())
                } else {
                    format!("{}*", self.native_type())
                };
                emitter.emit(
                    at,
                    &format!("\n        $TYPE $NAME = Dart$IDL_TYPE::toNative($HANDLE, exception);\n{CHECK}"),
                    &[("TYPE", &ty), ("NAME", name), ("IDL_TYPE", &self.idl_type), ("HANDLE", handle)],
                )?;
            }
        }
        Ok(())
    }

    /// `unsigned long long` becomes `UnsignedLongLong`
    fn capitalized_native_type(&self) -> String {
        LOWER_WORD_START
            .replace_all(&self.native_type(), |caps: &regex::Captures| caps[2].to_uppercase())
            .into_owned()
    }
}
