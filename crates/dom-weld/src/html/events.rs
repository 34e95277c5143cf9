//! dart:html event tables
//!
//! DOM event names are exposed as camelCase getters on per-interface
//! `Events` classes. Names are discovered from `on<event>` attributes of type
//! `EventListener`, plus a few manual additions.

use crate::error::{WeldError, WeldResult};
use crate::idl::{IdlAttribute, IdlInterface};
use lazy_static::lazy_static;
use std::collections::{BTreeSet, HashMap};

/// Events without an `on<event>` attribute in the IDL
static MANUAL_EVENTS: &[(&str, &[&str])] = &[
    ("Element", &["touchleave", "touchenter", "webkitTransitionEnd"]),
    ("Window", &["DOMContentLoaded"]),
];

/// `on<event>` attributes whose event name must be camel case
static ON_ATTRIBUTE_TO_EVENT_NAME: &[(&str, &str)] = &[
    ("webkitanimationend", "webkitAnimationEnd"),
    ("webkitanimationiteration", "webkitAnimationIteration"),
    ("webkitanimationstart", "webkitAnimationStart"),
    ("webkitspeechchange", "webkitSpeechChange"),
    ("webkittransitionend", "webkitTransitionEnd"),
];

/// Interfaces that get an `on` getter even without events of their own
static EXPLICIT_EVENT_CLASSES: &[&str] = &["DocumentFragment"];

/// Raw DOM event name to dart:html getter name
static HTML_EVENT_NAMES: &[(&str, &str)] = &[
    ("DOMContentLoaded", "contentLoaded"),
    ("abort", "abort"),
    ("addstream", "addStream"),
    ("addtrack", "addTrack"),
    ("audioend", "audioEnd"),
    ("audioprocess", "audioProcess"),
    ("audiostart", "audioStart"),
    ("beforecopy", "beforeCopy"),
    ("beforecut", "beforeCut"),
    ("beforepaste", "beforePaste"),
    ("beforeunload", "beforeUnload"),
    ("blocked", "blocked"),
    ("blur", "blur"),
    ("cached", "cached"),
    ("canplay", "canPlay"),
    ("canplaythrough", "canPlayThrough"),
    ("change", "change"),
    ("chargingchange", "chargingChange"),
    ("chargingtimechange", "chargingTimeChange"),
    ("checking", "checking"),
    ("click", "click"),
    ("close", "close"),
    ("complete", "complete"),
    ("connect", "connect"),
    ("connecting", "connecting"),
    ("contextmenu", "contextMenu"),
    ("copy", "copy"),
    ("cuechange", "cueChange"),
    ("cut", "cut"),
    ("dblclick", "doubleClick"),
    ("devicemotion", "deviceMotion"),
    ("deviceorientation", "deviceOrientation"),
    ("dischargingtimechange", "dischargingTimeChange"),
    ("display", "display"),
    ("downloading", "downloading"),
    ("drag", "drag"),
    ("dragend", "dragEnd"),
    ("dragenter", "dragEnter"),
    ("dragleave", "dragLeave"),
    ("dragover", "dragOver"),
    ("dragstart", "dragStart"),
    ("drop", "drop"),
    ("durationchange", "durationChange"),
    ("emptied", "emptied"),
    ("end", "end"),
    ("ended", "ended"),
    ("enter", "enter"),
    ("error", "error"),
    ("exit", "exit"),
    ("focus", "focus"),
    ("hashchange", "hashChange"),
    ("input", "input"),
    ("invalid", "invalid"),
    ("keydown", "keyDown"),
    ("keypress", "keyPress"),
    ("keyup", "keyUp"),
    ("levelchange", "levelChange"),
    ("load", "load"),
    ("loadeddata", "loadedData"),
    ("loadedmetadata", "loadedMetadata"),
    ("loadend", "loadEnd"),
    ("loadstart", "loadStart"),
    ("message", "message"),
    ("mousedown", "mouseDown"),
    ("mousemove", "mouseMove"),
    ("mouseout", "mouseOut"),
    ("mouseover", "mouseOver"),
    ("mouseup", "mouseUp"),
    ("mousewheel", "mouseWheel"),
    ("mute", "mute"),
    ("nomatch", "noMatch"),
    ("noupdate", "noUpdate"),
    ("obsolete", "obsolete"),
    ("offline", "offline"),
    ("online", "online"),
    ("open", "open"),
    ("pagehide", "pageHide"),
    ("pageshow", "pageShow"),
    ("paste", "paste"),
    ("pause", "pause"),
    ("play", "play"),
    ("playing", "playing"),
    ("popstate", "popState"),
    ("progress", "progress"),
    ("ratechange", "rateChange"),
    ("readystatechange", "readyStateChange"),
    ("removestream", "removeStream"),
    ("removetrack", "removeTrack"),
    ("reset", "reset"),
    ("resize", "resize"),
    ("result", "result"),
    ("resultdeleted", "resultDeleted"),
    ("scroll", "scroll"),
    ("search", "search"),
    ("seeked", "seeked"),
    ("seeking", "seeking"),
    ("select", "select"),
    ("selectionchange", "selectionChange"),
    ("selectstart", "selectStart"),
    ("show", "show"),
    ("soundend", "soundEnd"),
    ("soundstart", "soundStart"),
    ("speechend", "speechEnd"),
    ("speechstart", "speechStart"),
    ("stalled", "stalled"),
    ("start", "start"),
    ("statechange", "stateChange"),
    ("storage", "storage"),
    ("submit", "submit"),
    ("success", "success"),
    ("suspend", "suspend"),
    ("timeupdate", "timeUpdate"),
    ("touchcancel", "touchCancel"),
    ("touchend", "touchEnd"),
    ("touchenter", "touchEnter"),
    ("touchleave", "touchLeave"),
    ("touchmove", "touchMove"),
    ("touchstart", "touchStart"),
    ("unload", "unload"),
    ("unmute", "unmute"),
    ("updateready", "updateReady"),
    ("versionchange", "versionChange"),
    ("volumechange", "volumeChange"),
    ("waiting", "waiting"),
    ("webkitAnimationEnd", "animationEnd"),
    ("webkitAnimationIteration", "animationIteration"),
    ("webkitAnimationStart", "animationStart"),
    ("webkitfullscreenchange", "fullscreenChange"),
    ("webkitfullscreenerror", "fullscreenError"),
    ("webkitkeyadded", "keyAdded"),
    ("webkitkeyerror", "keyError"),
    ("webkitkeymessage", "keyMessage"),
    ("webkitneedkey", "needKey"),
    ("webkitpointerlockchange", "pointerLockChange"),
    ("webkitpointerlockerror", "pointerLockError"),
    ("webkitSpeechChange", "speechChange"),
    ("webkitsourceclose", "sourceClose"),
    ("webkitsourceended", "sourceEnded"),
    ("webkitsourceopen", "sourceOpen"),
    ("webkitTransitionEnd", "transitionEnd"),
    ("write", "write"),
    ("writeend", "writeEnd"),
    ("writestart", "writeStart"),
];

lazy_static! {
    static ref EVENT_NAMES: HashMap<&'static str, &'static str> =
        HTML_EVENT_NAMES.iter().copied().collect();
}

/// dart:html getter name for a raw DOM event name
pub fn dom_to_html_event(event_name: &str) -> WeldResult<&'static str> {
    EVENT_NAMES
        .get(event_name)
        .copied()
        .ok_or_else(|| WeldError::UnknownEvent(event_name.to_string()))
}

fn on_attribute_to_event_name(attribute: &IdlAttribute) -> String {
    let event = attribute.id.strip_prefix("on").unwrap_or(&attribute.id);
    ON_ATTRIBUTE_TO_EVENT_NAME
        .iter()
        .find(|(on, _)| *on == event)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| event.to_string())
}

/// Raw event names of an interface, ordered by their dart:html name
pub fn dom_to_html_events(interface_name: &str, events: &[&IdlAttribute]) -> WeldResult<Vec<String>> {
    let mut names: BTreeSet<String> = events.iter().map(|a| on_attribute_to_event_name(a)).collect();
    if let Some((_, manual)) = MANUAL_EVENTS.iter().find(|(id, _)| *id == interface_name) {
        names.extend(manual.iter().map(|s| s.to_string()));
    }
    let mut keyed = names
        .into_iter()
        .map(|name| Ok((dom_to_html_event(&name)?, name)))
        .collect::<WeldResult<Vec<_>>>()?;
    keyed.sort();
    Ok(keyed.into_iter().map(|(_, name)| name).collect())
}

/// Whether an `on` getter is generated, and the event attributes to expose
pub fn event_attributes(interface: &IdlInterface) -> Option<Vec<&IdlAttribute>> {
    let events: Vec<&IdlAttribute> = interface
        .attributes
        .iter()
        .filter(|a| a.type_id == "EventListener")
        .collect();
    if !events.is_empty() || EXPLICIT_EVENT_CLASSES.contains(&interface.id.as_str()) {
        Some(events)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(dom_to_html_event("dblclick").unwrap(), "doubleClick");
        assert_eq!(dom_to_html_event("webkitAnimationEnd").unwrap(), "animationEnd");
        assert!(matches!(
            dom_to_html_event("bogus"),
            Err(WeldError::UnknownEvent(name)) if name == "bogus"
        ));
    }

    #[test]
    fn test_events_sorted_by_html_name() {
        let click = IdlAttribute::new("onclick", "EventListener");
        let anim = IdlAttribute::new("onwebkitanimationend", "EventListener");
        let dbl = IdlAttribute::new("ondblclick", "EventListener");
        let events = dom_to_html_events("Element", &[&click, &anim, &dbl]).unwrap();
        assert_eq!(
            events,
            [
                "webkitAnimationEnd",
                "click",
                "dblclick",
                "touchenter",
                "touchleave",
                "webkitTransitionEnd"
            ]
        );
    }

    #[test]
    fn test_unknown_event_is_an_error() {
        let odd = IdlAttribute::new("onfrobnicate", "EventListener");
        assert!(dom_to_html_events("Node", &[&odd]).is_err());
    }

    #[test]
    fn test_event_attributes() {
        let plain = IdlInterface::new("Node");
        assert!(event_attributes(&plain).is_none());
        let fragment = IdlInterface::new("DocumentFragment");
        assert_eq!(event_attributes(&fragment).map(|e| e.len()), Some(0));
        let element = IdlInterface::new("Element")
            .attribute(IdlAttribute::new("onclick", "EventListener"))
            .attribute(IdlAttribute::new("id", "DOMString"));
        assert_eq!(event_attributes(&element).map(|e| e.len()), Some(1));
    }
}
