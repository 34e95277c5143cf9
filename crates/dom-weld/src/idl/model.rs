//! IDL node types
//!
//! These mirror the already-parsed IDL database documents. Every node is
//! read-only for the generators; the builder methods exist for assembling
//! databases in code.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize a type reference written either as `"T"` or `{"id": "T"}`
fn type_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TypeRef {
        Name(String),
        Object { id: String },
    }

    Ok(match TypeRef::deserialize(deserializer)? {
        TypeRef::Name(id) | TypeRef::Object { id } => id,
    })
}

/// Function-valued extended attribute, e.g. `Constructor(in DOMString a)`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdlFunction {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub arguments: Vec<IdlArgument>,
}

/// Value of one extended attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtAttrValue {
    Function(IdlFunction),
    Text(String),
    Flag,
}

/// Loosely typed extended attribute bag
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtAttrs(IndexMap<String, ExtAttrValue>);

impl ExtAttrs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the attribute is present with any value
    pub fn has(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&ExtAttrValue> {
        self.0.get(name)
    }

    /// Whether the attribute is present without a value
    pub fn is_flag(&self, name: &str) -> bool {
        matches!(self.0.get(name), Some(ExtAttrValue::Flag))
    }

    /// String value of the attribute, if it carries one
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.0.get(name) {
            Some(ExtAttrValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    /// Function value of the attribute, if it carries one
    pub fn function(&self, name: &str) -> Option<&IdlFunction> {
        match self.0.get(name) {
            Some(ExtAttrValue::Function(function)) => Some(function),
            _ => None,
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ExtAttrValue) {
        self.0.insert(name.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ExtAttrValue)> {
        self.0.iter()
    }

    /// Builder form of [`ExtAttrs::insert`] with a flag value
    pub fn with_flag(mut self, name: impl Into<String>) -> Self {
        self.insert(name, ExtAttrValue::Flag);
        self
    }

    /// Builder form of [`ExtAttrs::insert`] with a text value
    pub fn with_text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, ExtAttrValue::Text(value.into()));
        self
    }
}

/// Operation or constructor argument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdlArgument {
    pub id: String,
    #[serde(rename = "type", deserialize_with = "type_id")]
    pub type_id: String,
    #[serde(default)]
    pub ext_attrs: ExtAttrs,
    /// Default value written in the IDL, if any
    #[serde(default)]
    pub default_value: Option<String>,
}

impl IdlArgument {
    pub fn new(id: impl Into<String>, type_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_id: type_id.into(),
            ext_attrs: ExtAttrs::new(),
            default_value: None,
        }
    }

    /// Mark as `[Optional]`
    pub fn optional(mut self) -> Self {
        self.ext_attrs.insert("Optional", ExtAttrValue::Flag);
        self
    }

    pub fn with_ext_attr(mut self, name: impl Into<String>, value: ExtAttrValue) -> Self {
        self.ext_attrs.insert(name, value);
        self
    }

    /// `[Optional]` without a value; `[Optional=DefaultIsUndefined]` and
    /// friends are required at the binding level.
    pub fn is_optional(&self) -> bool {
        self.ext_attrs.is_flag("Optional")
    }
}

/// Interface attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdlAttribute {
    pub id: String,
    #[serde(rename = "type", deserialize_with = "type_id")]
    pub type_id: String,
    #[serde(default)]
    pub is_read_only: bool,
    #[serde(default)]
    pub ext_attrs: ExtAttrs,
    #[serde(default)]
    pub get_raises: bool,
    #[serde(default)]
    pub set_raises: bool,
    #[serde(default)]
    pub doc_js_interface_name: Option<String>,
}

impl IdlAttribute {
    pub fn new(id: impl Into<String>, type_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_id: type_id.into(),
            is_read_only: false,
            ext_attrs: ExtAttrs::new(),
            get_raises: false,
            set_raises: false,
            doc_js_interface_name: None,
        }
    }

    pub fn read_only(mut self) -> Self {
        self.is_read_only = true;
        self
    }

    pub fn with_ext_attr(mut self, name: impl Into<String>, value: ExtAttrValue) -> Self {
        self.ext_attrs.insert(name, value);
        self
    }

    /// Read-only in the generated API
    pub fn is_read_only(&self) -> bool {
        self.is_read_only || self.ext_attrs.has("Replaceable")
    }
}

/// Interface operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdlOperation {
    pub id: String,
    #[serde(rename = "type", deserialize_with = "type_id")]
    pub type_id: String,
    #[serde(default)]
    pub arguments: Vec<IdlArgument>,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub raises: bool,
    #[serde(default)]
    pub ext_attrs: ExtAttrs,
    #[serde(default)]
    pub doc_js_interface_name: Option<String>,
}

impl IdlOperation {
    pub fn new(id: impl Into<String>, type_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_id: type_id.into(),
            arguments: Vec::new(),
            is_static: false,
            raises: false,
            ext_attrs: ExtAttrs::new(),
            doc_js_interface_name: None,
        }
    }

    pub fn arg(mut self, argument: IdlArgument) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn static_op(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn with_ext_attr(mut self, name: impl Into<String>, value: ExtAttrValue) -> Self {
        self.ext_attrs.insert(name, value);
        self
    }

    /// Copy keeping only the first `count` arguments
    pub fn truncated(&self, count: usize) -> Self {
        let mut op = self.clone();
        op.arguments.truncate(count);
        op
    }
}

/// Interface constant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdlConstant {
    pub id: String,
    #[serde(rename = "type", deserialize_with = "type_id")]
    pub type_id: String,
    pub value: String,
}

impl IdlConstant {
    pub fn new(id: impl Into<String>, type_id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_id: type_id.into(),
            value: value.into(),
        }
    }
}

/// Parent reference with its annotations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdlParent {
    #[serde(rename = "type", deserialize_with = "type_id")]
    pub type_id: String,
    #[serde(default)]
    pub annotations: Vec<String>,
}

/// Interface node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdlInterface {
    pub id: String,
    #[serde(default)]
    pub javascript_binding_name: Option<String>,
    #[serde(default)]
    pub doc_js_name: Option<String>,
    #[serde(default)]
    pub parents: Vec<IdlParent>,
    #[serde(default)]
    pub attributes: Vec<IdlAttribute>,
    #[serde(default)]
    pub operations: Vec<IdlOperation>,
    #[serde(default)]
    pub constants: Vec<IdlConstant>,
    #[serde(default)]
    pub ext_attrs: ExtAttrs,
}

impl IdlInterface {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            javascript_binding_name: None,
            doc_js_name: None,
            parents: Vec::new(),
            attributes: Vec::new(),
            operations: Vec::new(),
            constants: Vec::new(),
            ext_attrs: ExtAttrs::new(),
        }
    }

    pub fn parent(mut self, type_id: impl Into<String>) -> Self {
        self.parents.push(IdlParent {
            type_id: type_id.into(),
            annotations: Vec::new(),
        });
        self
    }

    pub fn attribute(mut self, attribute: IdlAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn operation(mut self, operation: IdlOperation) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn constant(mut self, constant: IdlConstant) -> Self {
        self.constants.push(constant);
        self
    }

    pub fn with_ext_attr(mut self, name: impl Into<String>, value: ExtAttrValue) -> Self {
        self.ext_attrs.insert(name, value);
        self
    }

    /// Name of the JavaScript constructor backing this interface
    pub fn javascript_binding_name(&self) -> &str {
        self.javascript_binding_name.as_deref().unwrap_or(&self.id)
    }

    /// Name used in documentation lookups
    pub fn doc_js_name(&self) -> &str {
        self.doc_js_name.as_deref().unwrap_or(&self.id)
    }

    /// Callback interfaces generate typedefs instead of classes
    pub fn is_callback(&self) -> bool {
        self.ext_attrs.has("Callback")
    }

    pub fn has_attribute(&self, id: &str) -> bool {
        self.attributes.iter().any(|a| a.id == id)
    }

    pub fn has_operation(&self, id: &str) -> bool {
        self.operations.iter().any(|o| o.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_interface() {
        let json = r#"{
            "id": "HTMLInputElement",
            "parents": [{"type": {"id": "HTMLElement"}}],
            "attributes": [
                {"id": "value", "type": "DOMString", "ext_attrs": {"TreatNullAs": "NullString"}},
                {"id": "form", "type": {"id": "HTMLFormElement"}, "is_read_only": true}
            ],
            "operations": [
                {"id": "select", "type": "void"},
                {"id": "setSelectionRange", "type": "void", "arguments": [
                    {"id": "start", "type": "long"},
                    {"id": "direction", "type": "DOMString", "ext_attrs": {"Optional": null}}
                ]}
            ],
            "ext_attrs": {"Constructor": {"arguments": []}, "Conditional": "INPUT"}
        }"#;
        let interface: IdlInterface = serde_json::from_str(json).unwrap();

        assert_eq!(interface.parents[0].type_id, "HTMLElement");
        assert_eq!(interface.attributes[1].type_id, "HTMLFormElement");
        assert!(interface.attributes[1].is_read_only());
        assert_eq!(interface.attributes[0].ext_attrs.text("TreatNullAs"), Some("NullString"));
        assert!(interface.operations[1].arguments[1].is_optional());
        assert!(!interface.operations[1].arguments[0].is_optional());
        assert!(interface.ext_attrs.function("Constructor").is_some());
        assert_eq!(interface.javascript_binding_name(), "HTMLInputElement");
    }

    #[test]
    fn test_optional_with_value_is_required() {
        let arg = IdlArgument::new("x", "DOMString")
            .with_ext_attr("Optional", ExtAttrValue::Text("DefaultIsUndefined".into()));
        assert!(!arg.is_optional());
    }

    #[test]
    fn test_replaceable_is_read_only() {
        let attr = IdlAttribute::new("location", "Location")
            .with_ext_attr("Replaceable", ExtAttrValue::Flag);
        assert!(attr.is_read_only());
    }
}
