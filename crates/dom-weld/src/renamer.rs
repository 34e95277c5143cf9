//! dart:html naming
//!
//! Maps WebKit interface names to their dart:html names and decides, per
//! member, whether it is exposed, renamed, hidden behind a `$dom_` prefix or
//! dropped. Member keys are `Interface.member`, optionally with a `get:` or
//! `set:` prefix on the member to target a single accessor. Matching walks the
//! interface hierarchy so a rule on `Node` applies to every element.

use crate::idl::{IdlDatabase, IdlInterface};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};

static INTERFACE_RENAMES: &[(&str, &str)] = &[
    ("DOMFormData", "FormData"),
    ("DOMMimeType", "MimeType"),
    ("DOMMimeTypeArray", "MimeTypeArray"),
    ("DOMPlugin", "Plugin"),
    ("DOMPluginArray", "PluginArray"),
    ("DOMSelection", "Selection"),
    ("DOMURL", "Url"),
    ("DOMWindow", "Window"),
    ("IDBAny", "_Any"),
    ("WebKitAnimation", "Animation"),
    ("WebKitAnimationEvent", "AnimationEvent"),
    ("WebKitBlobBuilder", "BlobBuilder"),
    ("WebKitCSSKeyframeRule", "CSSKeyframeRule"),
    ("WebKitCSSKeyframesRule", "CSSKeyframesRule"),
    ("WebKitCSSMatrix", "CSSMatrix"),
    ("WebKitCSSTransformValue", "CSSTransformValue"),
    ("WebKitFlags", "Flags"),
    ("WebKitLoseContext", "LoseContext"),
    ("WebKitPoint", "Point"),
    ("WebKitTransitionEvent", "TransitionEvent"),
    ("XMLHttpRequest", "HttpRequest"),
    ("XMLHttpRequestException", "HttpRequestException"),
    ("XMLHttpRequestProgressEvent", "HttpRequestProgressEvent"),
    ("XMLHttpRequestUpload", "HttpRequestUpload"),
];

/// Members kept under a `$dom_` name so hand-written code can wrap them
static PRIVATE_MEMBERS: &[&str] = &[
    "Document.createElement",
    "Document.createEvent",
    "Document.body",
    "Document.querySelectorAll",
    "Element.getAttribute",
    "Element.hasAttribute",
    "Element.removeAttribute",
    "Element.setAttribute",
    "Element.get:attributes",
    "Element.get:children",
    "Element.className",
    "Element.getElementsByClassName",
    "Element.querySelectorAll",
    "Event.initEvent",
    "EventTarget.addEventListener",
    "EventTarget.dispatchEvent",
    "EventTarget.removeEventListener",
    "MouseEvent.initMouseEvent",
    "Node.appendChild",
    "Node.get:childNodes",
    "Node.get:firstChild",
    "Node.get:lastChild",
    "Node.removeChild",
    "Node.replaceChild",
    "Node.get:textContent",
    "Node.set:textContent",
    "UIEvent.initUIEvent",
];

static RENAMED_MEMBERS: &[(&str, &str)] = &[
    ("Document.get:defaultView", "window"),
    ("Element.scrollIntoViewIfNeeded", "scrollIntoView"),
    ("Element.webkitMatchesSelector", "matchesSelector"),
    ("Node.cloneNode", "clone"),
    ("Node.get:nextSibling", "nextNode"),
    ("Node.get:ownerDocument", "document"),
    ("Node.get:parentNode", "parent"),
    ("Node.get:previousSibling", "previousNode"),
];

static REMOVED_MEMBERS: &[&str] = &[
    "Element.get:outerText",
    "Element.scrollByLines",
    "Element.scrollByPages",
    "Node.get:attributes",
    "Node.get:localName",
    "Node.get:namespaceURI",
    "Node.isEqualNode",
    "Node.isSameNode",
    "Node.isSupported",
    "Node.lookupNamespaceURI",
    "Node.normalize",
];

/// Extra rules layered over the built-in tables
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RenameOverrides {
    /// WebKit interface name to dart:html name
    pub interfaces: BTreeMap<String, String>,
    /// `Interface.member` to new member name
    pub members: BTreeMap<String, String>,
    /// `Interface.member` keys to drop
    pub removed: Vec<String>,
    /// `Interface.member` keys to expose under `$dom_`
    pub private: Vec<String>,
}

/// Renames WebKit interfaces and members to their dart:html names
#[derive(Debug)]
pub struct HtmlRenamer<'a> {
    database: &'a IdlDatabase,
    interfaces: HashMap<String, String>,
    members: HashMap<String, String>,
    removed: HashSet<String>,
    private: HashSet<String>,
}

impl<'a> HtmlRenamer<'a> {
    pub fn new(database: &'a IdlDatabase) -> Self {
        Self::with_overrides(database, &RenameOverrides::default())
    }

    pub fn with_overrides(database: &'a IdlDatabase, overrides: &RenameOverrides) -> Self {
        let own = |(k, v): &(&str, &str)| (k.to_string(), v.to_string());
        let mut interfaces: HashMap<_, _> = INTERFACE_RENAMES.iter().map(own).collect();
        interfaces.extend(overrides.interfaces.clone());
        let mut members: HashMap<_, _> = RENAMED_MEMBERS.iter().map(own).collect();
        members.extend(overrides.members.clone());
        let mut removed: HashSet<_> = REMOVED_MEMBERS.iter().map(|s| s.to_string()).collect();
        removed.extend(overrides.removed.iter().cloned());
        let mut private: HashSet<_> = PRIVATE_MEMBERS.iter().map(|s| s.to_string()).collect();
        private.extend(overrides.private.iter().cloned());
        Self {
            database,
            interfaces,
            members,
            removed,
            private,
        }
    }

    /// dart:html name of an interface
    ///
    /// `HTML`-prefixed interfaces deriving from `Element` or `Document` lose
    /// the prefix.
    pub fn rename_interface(&self, interface: &IdlInterface) -> String {
        if let Some(renamed) = self.interfaces.get(&interface.id) {
            return renamed.clone();
        }
        if let Some(stripped) = interface.id.strip_prefix("HTML") {
            let is_dom = self
                .database
                .hierarchy(interface)
                .iter()
                .any(|i| i.id == "Element" || i.id == "Document");
            if is_dom {
                return stripped.to_string();
            }
        }
        interface.id.clone()
    }

    /// [`HtmlRenamer::rename_interface`] by id; unknown ids are unchanged
    pub fn rename_interface_id(&self, id: &str) -> String {
        match self.database.get_interface(id) {
            Ok(interface) => self.rename_interface(interface),
            Err(_) => self.interfaces.get(id).cloned().unwrap_or_else(|| id.to_string()),
        }
    }

    /// dart:html name of a member, or `None` when it is not exposed
    ///
    /// `prefix` is `""`, `"get:"` or `"set:"`.
    pub fn rename_member(&self, interface_id: &str, member: &str, prefix: &str) -> Option<String> {
        if self.find_match(interface_id, member, prefix, |k| self.removed.contains(k)).is_some() {
            return None;
        }
        let target = match self.find_match(interface_id, member, prefix, |k| self.members.contains_key(k)) {
            Some(key) => self.members[&key].clone(),
            None => member.to_string(),
        };
        if self.find_match(interface_id, member, prefix, |k| self.private.contains(k)).is_some()
            && !target.starts_with("$dom_")
        {
            return Some(format!("$dom_{target}"));
        }
        Some(target)
    }

    fn find_match(
        &self,
        interface_id: &str,
        member: &str,
        prefix: &str,
        is_candidate: impl Fn(&str) -> bool,
    ) -> Option<String> {
        let names: Vec<String> = match self.database.get_interface(interface_id) {
            Ok(interface) => self
                .database
                .hierarchy(interface)
                .iter()
                .map(|i| self.rename_interface(i))
                .collect(),
            Err(_) => vec![interface_id.to_string()],
        };
        for name in names {
            let plain = format!("{name}.{member}");
            if is_candidate(&plain) {
                return Some(plain);
            }
            let accessor = format!("{name}.{prefix}{member}");
            if !prefix.is_empty() && is_candidate(&accessor) {
                return Some(accessor);
            }
        }
        None
    }
}
