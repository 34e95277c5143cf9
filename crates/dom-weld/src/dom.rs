//! Facts about DOM interfaces shared by every generator

use crate::idl::{IdlAttribute, IdlDatabase, IdlInterface};
use lazy_static::lazy_static;
use regex::Regex;

/// Interfaces used only as mixins; they never get an implementation class
static PURE_INTERFACES: &[&str] = &[
    "DOMStringMap",
    "ElementTimeControl",
    "ElementTraversal",
    "MediaQueryListListener",
    "NodeSelector",
    "SVGExternalResourcesRequired",
    "SVGFilterPrimitiveStandardAttributes",
    "SVGFitToViewBox",
    "SVGLangSpace",
    "SVGLocatable",
    "SVGStylable",
    "SVGTests",
    "SVGTransformable",
    "SVGURIReference",
    "SVGZoomAndPan",
    "TimeoutHandler",
];

/// Attribute names that are reserved words in Dart
static DART_ATTRIBUTE_RENAMES: &[(&str, &str)] = &[("default", "defaultValue"), ("final", "finalValue")];

static TYPED_ARRAYS: &[&str] = &[
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

static CUSTOM_NATIVE_SPECS: &[(&str, &str)] = &[
    // Workers have no console object
    ("Console", "=(typeof console == 'undefined' ? {} : console)"),
    ("DOMWindow", "@*DOMWindow"),
];

lazy_static! {
    static ref LIST_ELEMENT: Regex = Regex::new(r"^sequence<(\w*)>$").unwrap();
}

pub fn is_pure_interface(name: &str) -> bool {
    PURE_INTERFACES.contains(&name)
}

/// Factory provider backing the interface constructors, if fixed
pub fn interface_factory(name: &str) -> Option<&'static str> {
    TYPED_ARRAYS
        .contains(&name)
        .then_some("_TypedArrayFactoryProvider")
}

/// dart2js native spec for a JavaScript constructor name
///
/// Unlisted classes are marked hidden (`*`) so they are patched at runtime.
pub fn make_native_spec(javascript_binding_name: &str) -> String {
    CUSTOM_NATIVE_SPECS
        .iter()
        .find(|(name, _)| *name == javascript_binding_name)
        .map(|(_, spec)| spec.to_string())
        .unwrap_or_else(|| format!("*{javascript_binding_name}"))
}

/// Dart name of an attribute
pub fn dart_dom_name_of_attribute(attribute: &IdlAttribute) -> String {
    if let Some(name) = attribute.ext_attrs.text("DartName") {
        return name.to_string();
    }
    DART_ATTRIBUTE_RENAMES
        .iter()
        .find(|(from, _)| *from == attribute.id)
        .map(|(_, to)| to.to_string())
        .unwrap_or_else(|| attribute.id.clone())
}

/// `T` from `sequence<T>`
pub fn maybe_list_element_type_name(type_name: &str) -> Option<&str> {
    LIST_ELEMENT
        .captures(type_name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Element type when the interface directly implements `List<T>`
pub fn maybe_list_element_type(interface: &IdlInterface) -> Option<&str> {
    interface
        .parents
        .iter()
        .find_map(|parent| maybe_list_element_type_name(&parent.type_id))
}

/// Element type when the interface is a typed array
pub fn maybe_typed_array_element_type(interface: &IdlInterface) -> Option<&str> {
    if interface.parents.iter().any(|p| p.type_id == "ArrayBufferView") {
        return maybe_list_element_type(interface);
    }
    None
}

/// Typed array element type of the interface or one of its direct parents
pub fn maybe_typed_array_element_type_in_hierarchy<'a>(
    interface: &'a IdlInterface,
    database: &'a IdlDatabase,
) -> Option<&'a str> {
    maybe_typed_array_element_type(interface).or_else(|| {
        interface.parents.iter().find_map(|parent| {
            database
                .get_interface(&parent.type_id)
                .ok()
                .and_then(maybe_typed_array_element_type)
        })
    })
}

/// `(element_type, requires_indexer)` for interfaces implementing `List`
///
/// The indexer is required when the interface itself declares the list
/// parent, and inherited when a database ancestor does.
pub fn list_implementation_info<'a>(
    interface: &'a IdlInterface,
    database: &'a IdlDatabase,
) -> Option<(&'a str, bool)> {
    if let Some(element_type) = maybe_list_element_type(interface) {
        return Some((element_type, true));
    }
    interface.parents.iter().find_map(|parent| {
        let parent = database.get_interface(&parent.type_id).ok()?;
        list_implementation_info(parent, database).map(|(element_type, _)| (element_type, false))
    })
}

pub fn is_dart_list_type(type_name: &str) -> bool {
    type_name == "List" || type_name.starts_with("sequence<")
}

pub fn is_dart_collection_type(type_name: &str) -> bool {
    is_dart_list_type(type_name)
}

/// Parent annotated for the WebKit or Dart builds
pub fn match_source_filter(annotations: &[String]) -> bool {
    annotations.iter().any(|a| a == "WebKit" || a == "Dart")
}

pub fn find_matching_attribute<'a>(interface: &'a IdlInterface, attribute: &IdlAttribute) -> Option<&'a IdlAttribute> {
    interface.attributes.iter().find(|a| a.id == attribute.id)
}
