//! Convenience constructors for HTML elements
//!
//! `new DivElement()` and friends are generated as factories on the shared
//! `_Elements` provider that create the element by tag name.

use crate::analysis::{OperationInfo, ParamInfo};
use crate::emitter::{Emitter, Hole};
use crate::error::WeldResult;
use crate::types;

/// One convenience constructor of an element interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementConstructorInfo {
    /// Named constructor suffix, `h1` in `HeadingElement.h1`
    pub name: Option<&'static str>,
    pub tag: &'static str,
    /// Optional `(type, name)` parameters set as properties after creation
    pub opt_params: &'static [(&'static str, &'static str)],
    pub factory_provider_name: &'static str,
}

impl ElementConstructorInfo {
    const fn tag(tag: &'static str) -> Self {
        Self {
            name: None,
            tag,
            opt_params: &[],
            factory_provider_name: "_Elements",
        }
    }

    const fn named(name: &'static str) -> Self {
        Self {
            name: Some(name),
            ..Self::tag(name)
        }
    }

    const fn with_params(tag: &'static str, opt_params: &'static [(&'static str, &'static str)]) -> Self {
        Self {
            opt_params,
            ..Self::tag(tag)
        }
    }

    /// Constructor signature as an [`OperationInfo`]
    pub fn constructor_info(&self, interface_name: &str) -> OperationInfo {
        OperationInfo {
            declared_name: interface_name.to_string(),
            name: interface_name.to_string(),
            constructor_name: self.name.map(str::to_string),
            type_name: interface_name.to_string(),
            param_infos: self
                .opt_params
                .iter()
                .map(|(ty, name)| ParamInfo::new(*name, None, *ty, true))
                .collect(),
            ..Default::default()
        }
    }
}

type E = ElementConstructorInfo;

static ELEMENT_CONSTRUCTORS: &[(&str, &[ElementConstructorInfo])] = &[
    ("AnchorElement", &[E::with_params("a", &[("String", "href")])]),
    ("AreaElement", &[E::tag("area")]),
    ("BRElement", &[E::tag("br")]),
    ("BaseElement", &[E::tag("base")]),
    ("BodyElement", &[E::tag("body")]),
    ("ButtonElement", &[E::tag("button")]),
    ("CanvasElement", &[E::with_params("canvas", &[("int", "width"), ("int", "height")])]),
    ("DListElement", &[E::tag("dl")]),
    ("DataListElement", &[E::tag("datalist")]),
    ("DetailsElement", &[E::tag("details")]),
    ("DivElement", &[E::tag("div")]),
    ("EmbedElement", &[E::tag("embed")]),
    ("FieldSetElement", &[E::tag("fieldset")]),
    ("Form", &[E::tag("form")]),
    ("HRElement", &[E::tag("hr")]),
    ("HeadElement", &[E::tag("head")]),
    (
        "HeadingElement",
        &[
            E::named("h1"),
            E::named("h2"),
            E::named("h3"),
            E::named("h4"),
            E::named("h5"),
            E::named("h6"),
        ],
    ),
    ("HtmlElement", &[E::tag("html")]),
    ("IFrameElement", &[E::tag("iframe")]),
    (
        "ImageElement",
        &[E::with_params("img", &[("String", "src"), ("int", "width"), ("int", "height")])],
    ),
    ("InputElement", &[E::with_params("input", &[("String", "type")])]),
    ("KeygenElement", &[E::tag("keygen")]),
    ("LIElement", &[E::tag("li")]),
    ("LabelElement", &[E::tag("label")]),
    ("LegendElement", &[E::tag("legend")]),
    ("LinkElement", &[E::tag("link")]),
    ("MapElement", &[E::tag("map")]),
    ("MenuElement", &[E::tag("menu")]),
    ("MeterElement", &[E::tag("meter")]),
    ("OListElement", &[E::tag("ol")]),
    ("ObjectElement", &[E::tag("object")]),
    ("OptGroupElement", &[E::tag("optgroup")]),
    ("OutputElement", &[E::tag("output")]),
    ("ParagraphElement", &[E::tag("p")]),
    ("ParamElement", &[E::tag("param")]),
    ("PreElement", &[E::tag("pre")]),
    ("ProgressElement", &[E::tag("progress")]),
    ("ScriptElement", &[E::tag("script")]),
    ("SourceElement", &[E::tag("source")]),
    ("SpanElement", &[E::tag("span")]),
    ("StyleElement", &[E::tag("style")]),
    ("TableCaptionElement", &[E::tag("caption")]),
    ("TableCellElement", &[E::tag("td")]),
    ("TableColElement", &[E::tag("col")]),
    ("TableElement", &[E::tag("table")]),
    ("TableRowElement", &[E::tag("tr")]),
    ("TextAreaElement", &[E::tag("textarea")]),
    ("TitleElement", &[E::tag("title")]),
    ("TrackElement", &[E::tag("track")]),
    ("UListElement", &[E::tag("ul")]),
    ("VideoElement", &[E::tag("video")]),
];

/// Convenience constructors declared for a dart:html interface name
pub fn html_element_constructor_infos(typename: &str) -> &'static [ElementConstructorInfo] {
    ELEMENT_CONSTRUCTORS
        .iter()
        .find(|(name, _)| *name == typename)
        .map(|(_, infos)| *infos)
        .unwrap_or(&[])
}

/// Emit the `_Elements` factories for one interface
pub fn emit_html_element_factory_constructors(
    emitter: &mut Emitter,
    at: Hole,
    infos: &[ElementConstructorInfo],
    typename: &str,
    class_name: &str,
) -> WeldResult<()> {
    for info in infos {
        let constructor = info.constructor_info(typename);
        let params = constructor.parameters_interface_declaration(|t| types::dart_type(t))?;
        let holes = emitter.emit(
            at,
            "\n  factory $CONSTRUCTOR($PARAMS) {\n    $CLASS _e = _document.$dom_createElement(\"$TAG\");\n$!INITS    return _e;\n  }\n",
            &[
                ("CONSTRUCTOR", &constructor.constructor_full_name()),
                ("CLASS", class_name),
                ("TAG", info.tag),
                ("PARAMS", &params),
            ],
        )?;
        let inits = holes.get("INITS")?;
        for param in &constructor.param_infos {
            emitter.emit(inits, "    if ($E != null) _e.$E = $E;\n", &[("E", &param.name)])?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lookup() {
        assert_eq!(html_element_constructor_infos("HeadingElement").len(), 6);
        assert_eq!(html_element_constructor_infos("DivElement")[0].tag, "div");
        assert!(html_element_constructor_infos("Node").is_empty());
    }

    #[test]
    fn test_emit_factories() {
        let mut e = Emitter::new();
        let root = e.scratch();
        emit_html_element_factory_constructors(
            &mut e,
            root,
            html_element_constructor_infos("CanvasElement"),
            "CanvasElement",
            "_CanvasElementImpl",
        )
        .unwrap();
        assert_eq!(
            e.fragments(root),
            "\n  factory CanvasElement([int width, int height]) {\n    _CanvasElementImpl _e = _document.$dom_createElement(\"canvas\");\n    if (width != null) _e.width = width;\n    if (height != null) _e.height = height;\n    return _e;\n  }\n"
        );
    }

    #[test]
    fn test_named_heading_constructor() {
        let info = &html_element_constructor_infos("HeadingElement")[1];
        assert_eq!(info.tag, "h2");
        assert_eq!(info.constructor_info("HeadingElement").constructor_full_name(), "HeadingElement.h2");
    }
}
