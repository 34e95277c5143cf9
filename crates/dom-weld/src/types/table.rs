//! Static IDL type table

use lazy_static::lazy_static;
use std::collections::HashMap;

/// Descriptor category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeClass {
    Primitive,
    Interface,
    SvgTearOff,
    Sequence,
}

/// Per-type facts used by the descriptors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeData {
    pub class: TypeClass,
    pub dart_type: Option<&'static str>,
    pub native_type: Option<&'static str>,
    pub custom_to_dart: bool,
    pub custom_to_native: bool,
    pub conversion_includes: &'static [&'static str],
    pub webcore_getter_name: &'static str,
    pub webcore_setter_name: &'static str,
    pub requires_v8_scope: bool,
}

impl TypeData {
    pub const fn new(class: TypeClass) -> Self {
        Self {
            class,
            dart_type: None,
            native_type: None,
            custom_to_dart: false,
            custom_to_native: false,
            conversion_includes: &[],
            webcore_getter_name: "getAttribute",
            webcore_setter_name: "setAttribute",
            requires_v8_scope: false,
        }
    }

    const fn dart(mut self, dart_type: &'static str) -> Self {
        self.dart_type = Some(dart_type);
        self
    }

    const fn native(mut self, native_type: &'static str) -> Self {
        self.native_type = Some(native_type);
        self
    }

    const fn accessors(mut self, getter: &'static str, setter: &'static str) -> Self {
        self.webcore_getter_name = getter;
        self.webcore_setter_name = setter;
        self
    }

    const fn custom_to_dart(mut self) -> Self {
        self.custom_to_dart = true;
        self
    }

    const fn custom_to_native(mut self) -> Self {
        self.custom_to_native = true;
        self
    }

    const fn includes(mut self, includes: &'static [&'static str]) -> Self {
        self.conversion_includes = includes;
        self
    }

    const fn v8_scope(mut self) -> Self {
        self.requires_v8_scope = true;
        self
    }
}

const fn primitive() -> TypeData {
    TypeData::new(TypeClass::Primitive)
}

const fn interface() -> TypeData {
    TypeData::new(TypeClass::Interface)
}

const fn tear_off() -> TypeData {
    TypeData::new(TypeClass::SvgTearOff)
}

static IDL_TYPES: &[(&str, TypeData)] = &[
    ("boolean", primitive().dart("bool").native("bool").accessors("hasAttribute", "setBooleanAttribute")),
    ("byte", primitive().dart("int").native("int")),
    ("octet", primitive().dart("int").native("int")),
    ("short", primitive().dart("int").native("int")),
    ("unsigned short", primitive().dart("int").native("int")),
    ("int", primitive().dart("int")),
    ("unsigned int", primitive().dart("int").native("unsigned")),
    ("long", primitive().dart("int").native("int").accessors("getIntegralAttribute", "setIntegralAttribute")),
    (
        "unsigned long",
        primitive()
            .dart("int")
            .native("unsigned")
            .accessors("getUnsignedIntegralAttribute", "setUnsignedIntegralAttribute"),
    ),
    ("long long", primitive().dart("int")),
    ("unsigned long long", primitive().dart("int")),
    ("float", primitive().dart("num").native("double")),
    ("double", primitive().dart("num")),
    ("any", primitive().dart("Object")),
    ("Array", primitive().dart("List")),
    ("custom", primitive().dart("Dynamic")),
    ("Date", primitive().dart("Date").native("double")),
    ("DOMObject", primitive().dart("Object").native("ScriptValue")),
    ("DOMString", primitive().dart("String").native("String")),
    ("Dictionary", primitive().dart("Map").v8_scope()),
    ("Flags", primitive().dart("Object")),
    ("DOMTimeStamp", primitive().dart("int").native("unsigned long long")),
    ("object", primitive().dart("Object").native("ScriptValue")),
    ("PositionOptions", primitive().dart("Object")),
    ("SerializedScriptValue", primitive().dart("Dynamic")),
    ("WebKitFlags", primitive().dart("Object")),
    ("sequence", primitive().dart("List")),
    ("void", primitive().dart("void")),
    ("CSSRule", interface().includes(&["CSSImportRule"])),
    ("DOMException", interface().native("DOMCoreException")),
    ("DOMStringList", interface().dart("List<String>").custom_to_native()),
    ("DOMStringMap", interface().dart("Map<String, String>")),
    ("DOMWindow", interface().custom_to_dart()),
    ("Element", interface().custom_to_dart()),
    ("EventListener", interface().custom_to_native()),
    ("EventTarget", interface().custom_to_native()),
    ("HTMLElement", interface().custom_to_dart()),
    ("IDBAny", interface().dart("Dynamic").custom_to_native()),
    ("IDBKey", interface().dart("Dynamic").custom_to_native()),
    ("MutationRecordArray", interface().native("MutationRecordArray").dart("List<MutationRecord>")),
    ("StyleSheet", interface().includes(&["CSSStyleSheet"])),
    ("SVGElement", interface().custom_to_dart()),
    ("SVGAngle", tear_off()),
    ("SVGLength", tear_off()),
    ("SVGLengthList", tear_off()),
    ("SVGMatrix", tear_off()),
    ("SVGNumber", tear_off().native("SVGPropertyTearOff<float>")),
    ("SVGNumberList", tear_off()),
    ("SVGPathSegList", tear_off().native("SVGPathSegListPropertyTearOff")),
    ("SVGPoint", tear_off().native("SVGPropertyTearOff<FloatPoint>")),
    ("SVGPointList", tear_off()),
    ("SVGPreserveAspectRatio", tear_off()),
    ("SVGRect", tear_off().native("SVGPropertyTearOff<FloatRect>")),
    ("SVGStringList", tear_off().native("SVGStaticListPropertyTearOff<SVGStringList>")),
    ("SVGTransform", tear_off()),
    ("SVGTransformList", tear_off().native("SVGTransformListPropertyTearOff")),
];

pub(crate) static SVG_SUPPLEMENTAL_INCLUDES: &[&str] = &[
    "\"SVGAnimatedPropertyTearOff.h\"",
    "\"SVGAnimatedListPropertyTearOff.h\"",
    "\"SVGStaticListPropertyTearOff.h\"",
    "\"SVGAnimatedListPropertyTearOff.h\"",
    "\"SVGTransformListPropertyTearOff.h\"",
    "\"SVGPathSegListPropertyTearOff.h\"",
];

lazy_static! {
    static ref TABLE: HashMap<&'static str, TypeData> = IDL_TYPES.iter().copied().collect();
}

/// Table entry for an IDL type name
pub fn type_data(name: &str) -> Option<TypeData> {
    TABLE.get(name).copied()
}

pub fn is_registered_type(name: &str) -> bool {
    TABLE.contains_key(name)
}

/// Dart type from the table alone; unregistered names map to themselves
pub fn dart_type(idl_type: &str) -> String {
    type_data(idl_type)
        .and_then(|data| data.dart_type)
        .unwrap_or(idl_type)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_defaults() {
        let long = type_data("long").unwrap();
        assert_eq!(long.webcore_getter_name, "getIntegralAttribute");
        let float = type_data("float").unwrap();
        assert_eq!(float.webcore_getter_name, "getAttribute");
        assert_eq!(float.native_type, Some("double"));
        assert!(type_data("Dictionary").unwrap().requires_v8_scope);
    }

    #[test]
    fn test_dart_type() {
        assert_eq!(dart_type("DOMString"), "String");
        assert_eq!(dart_type("CSSRule"), "CSSRule");
        assert_eq!(dart_type("Node"), "Node");
        assert!(is_registered_type("unsigned long long"));
        assert!(!is_registered_type("Node"));
    }
}
