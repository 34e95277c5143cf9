//! dart:html specific tables

pub mod elements;
pub mod events;

/// Interfaces folded into another one in dart:html: every member of the key
/// is generated on the value, and references to the key use the value.
pub static MERGED_INTERFACES: &[(&str, &str)] = &[("HTMLDocument", "Document"), ("HTMLElement", "Element")];

/// Members with hand-written dart2js implementations
pub static JS_CUSTOM_MEMBERS: &[&str] = &[
    "IDBDatabase.transaction",
    "IFrameElement.contentWindow",
    "Window.document",
    "Window.top",
    "Window.location",
    "Window.open",
];

/// Whether `id` is merged into another interface
pub fn is_merged_interface(id: &str) -> bool {
    merge_target(id).is_some()
}

/// Interface `id` is merged into, if any
pub fn merge_target(id: &str) -> Option<&'static str> {
    MERGED_INTERFACES
        .iter()
        .find(|(merged, _)| *merged == id)
        .map(|(_, into)| *into)
}

/// Interfaces merged into `target`
pub fn merged_into(target: &str) -> impl Iterator<Item = &'static str> + '_ {
    MERGED_INTERFACES
        .iter()
        .filter(move |(_, into)| *into == target)
        .map(|(merged, _)| *merged)
}

/// Private dart:html member names start with an underscore
pub fn is_private(name: &str) -> bool {
    name.starts_with('_')
}
