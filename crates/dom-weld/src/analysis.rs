//! Operation analysis
//!
//! Turns a set of same-named IDL operations into one Dart calling
//! convention: overloads with optional arguments are split at every optional
//! position, the resulting argument lists are zipped by position and each
//! position becomes one [`ParamInfo`].

use crate::error::{WeldError, WeldResult};
use crate::idl::{IdlArgument, IdlInterface, IdlOperation};
use crate::types;

/// One parameter of a generated Dart signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamInfo {
    pub name: String,
    /// IDL type id; `None` when overloads disagree
    pub type_id: Option<String>,
    pub dart_type: String,
    pub is_optional: bool,
}

impl ParamInfo {
    pub fn new(
        name: impl Into<String>,
        type_id: Option<String>,
        dart_type: impl Into<String>,
        is_optional: bool,
    ) -> Self {
        Self {
            name: name.into(),
            type_id,
            dart_type: dart_type.into(),
            is_optional,
        }
    }
}

/// Calling convention derived from an overload set or a constructor
#[derive(Debug, Clone, Default)]
pub struct OperationInfo {
    /// Operations as declared
    pub operations: Vec<IdlOperation>,
    /// Fixed-arity signatures after splitting; empty for constructors
    pub overloads: Vec<IdlOperation>,
    /// Constructor arguments as declared
    pub idl_args: Vec<IdlArgument>,
    /// IDL name; empty for unnamed constructors
    pub declared_name: String,
    /// Dart name (`DartName` wins over the IDL name)
    pub name: String,
    /// Named constructor suffix, e.g. `h1` in `HeadingElement.h1`
    pub constructor_name: Option<String>,
    pub js_name: String,
    pub type_name: String,
    pub param_infos: Vec<ParamInfo>,
}

impl OperationInfo {
    /// Parameters for an interface declaration; unresolved types keep their
    /// IDL name in a comment.
    pub fn parameters_interface_declaration(
        &self,
        rename_type: impl Fn(&str) -> String,
    ) -> WeldResult<String> {
        format_params(&self.param_infos, None, |param| {
            type_or_nothing(&rename_type(&param.dart_type), param.type_id.as_deref())
        })
    }

    /// Parameters for an implementation; optional parameters get
    /// `default_value` unless it is `null`.
    pub fn parameters_implementation_declaration(
        &self,
        rename_type: impl Fn(&str) -> String,
        default_value: &str,
    ) -> WeldResult<String> {
        format_params(&self.param_infos, Some(default_value), |param| {
            type_or_nothing(&rename_type(&param.dart_type), None)
        })
    }

    pub fn parameters_as_argument_list(&self) -> String {
        self.param_infos
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn is_static(&self) -> bool {
        self.overloads.first().is_some_and(|op| op.is_static)
    }

    /// `Type` or `Type.name` for named constructors
    pub fn constructor_full_name(&self) -> String {
        match &self.constructor_name {
            Some(name) => format!("{}.{}", self.type_name, name),
            None => self.type_name.clone(),
        }
    }
}

/// Render a parameter list, optional parameters in `[...]`
pub fn format_params(
    params: &[ParamInfo],
    default_value: Option<&str>,
    type_fn: impl Fn(&ParamInfo) -> String,
) -> WeldResult<String> {
    let format_param = |param: &ParamInfo| {
        let ty = type_fn(param);
        match default_value {
            Some(default) if param.is_optional && default != "null" => {
                format!("{ty}{} = {default}", param.name)
            }
            _ => format!("{ty}{}", param.name),
        }
    };

    let mut required = Vec::new();
    let mut optional = Vec::new();
    for param in params {
        if param.is_optional {
            optional.push(param);
        } else {
            if !optional.is_empty() {
                let names: Vec<_> = params.iter().map(|p| p.name.as_str()).collect();
                return Err(WeldError::OptionalBeforeRequired(names.join(", ")));
            }
            required.push(param);
        }
    }
    let mut texts: Vec<String> = required.into_iter().map(format_param).collect();
    if !optional.is_empty() {
        let inner: Vec<String> = optional.into_iter().map(format_param).collect();
        texts.push(format!("[{}]", inner.join(", ")));
    }
    Ok(texts.join(", "))
}

/// Type prefix where a type may be omitted; empty or with a trailing space
pub fn type_or_nothing(dart_type: &str, comment: Option<&str>) -> String {
    if dart_type == "Dynamic" {
        match comment {
            Some(comment) => format!("/*{comment}*/ "),
            None => String::new(),
        }
    } else {
        format!("{dart_type} ")
    }
}

/// Type where an omitted type must be written `var`
pub fn type_or_var(dart_type: &str, comment: Option<&str>) -> String {
    if dart_type == "Dynamic" {
        match comment {
            Some(comment) => format!("var /*{comment}*/"),
            None => "var".to_string(),
        }
    } else {
        dart_type.to_string()
    }
}

/// Split every overload at each optional argument position
///
/// Signatures that come out identical are kept once, so splitting an
/// already split list yields a list of the same size.
pub fn split_overloads(operations: &[IdlOperation]) -> Vec<IdlOperation> {
    let mut split: Vec<IdlOperation> = Vec::new();
    let mut push = |op: IdlOperation| {
        let duplicate = split
            .iter()
            .any(|seen| seen.id == op.id && seen.arguments == op.arguments);
        if !duplicate {
            split.push(op);
        }
    };
    for operation in operations {
        for (i, argument) in operation.arguments.iter().enumerate() {
            if argument.is_optional() {
                push(operation.truncated(i));
            }
        }
        push(operation.clone());
    }
    split
}

/// Merge the arguments found at one position across overloads
///
/// `None` marks an overload too short to have this position.
fn dart_arg(args: &[Option<&IdlArgument>], constructor: bool) -> ParamInfo {
    let present: Vec<&IdlArgument> = args.iter().flatten().copied().collect();

    let is_optional = args.iter().any(|arg| match arg {
        None => true,
        Some(arg) if arg.ext_attrs.has("Callback") || constructor => arg.ext_attrs.has("Optional"),
        Some(_) => false,
    });

    let mut type_ids: Vec<&str> = present.iter().map(|a| a.type_id.as_str()).collect();
    type_ids.sort();
    type_ids.dedup();
    let mut dart_types: Vec<String> = type_ids.iter().map(|t| types::dart_type(t)).collect();
    dart_types.sort();
    dart_types.dedup();
    let (type_id, dart_type) = match (dart_types.len(), type_ids.as_slice()) {
        (1, [only]) => (Some(only.to_string()), only.to_string()),
        (1, [first, ..]) => (None, first.to_string()),
        _ => (None, "Dynamic".to_string()),
    };

    let mut names: Vec<&str> = present.iter().map(|a| a.id.as_str()).collect();
    names.sort();
    names.dedup();

    ParamInfo::new(names.join("_OR_"), type_id, dart_type, is_optional)
}

/// Calling convention for a set of same-named operations
pub fn analyze_operation(interface: &IdlInterface, operations: &[IdlOperation]) -> WeldResult<OperationInfo> {
    let first = operations.first().ok_or_else(|| {
        WeldError::invalid_idl(&interface.id, "empty overload set")
    })?;
    let overloads = split_overloads(operations);

    let arity = overloads.iter().map(|op| op.arguments.len()).max().unwrap_or(0);
    let param_infos = (0..arity)
        .map(|i| {
            let column: Vec<Option<&IdlArgument>> =
                overloads.iter().map(|op| op.arguments.get(i)).collect();
            dart_arg(&column, false)
        })
        .collect();

    let declared_name = first.id.clone();
    let name = first
        .ext_attrs
        .text("DartName")
        .map(str::to_string)
        .unwrap_or_else(|| declared_name.clone());

    Ok(OperationInfo {
        operations: operations.to_vec(),
        overloads,
        idl_args: Vec::new(),
        js_name: declared_name.clone(),
        declared_name,
        name,
        constructor_name: None,
        type_name: first.type_id.clone(),
        param_infos,
    })
}

/// Constructor calling convention from `Constructor` or `NamedConstructor`
pub fn analyze_constructor(interface: &IdlInterface) -> Option<OperationInfo> {
    let (name, idl_args) = if interface.ext_attrs.has("Constructor") {
        let args = interface
            .ext_attrs
            .function("Constructor")
            .map(|f| f.arguments.clone())
            .unwrap_or_default();
        (String::new(), args)
    } else {
        let function = interface.ext_attrs.function("NamedConstructor")?;
        (function.id.clone().unwrap_or_default(), function.arguments.clone())
    };

    let param_infos = idl_args
        .iter()
        .map(|arg| dart_arg(&[Some(arg)], true))
        .collect();

    Some(OperationInfo {
        operations: Vec::new(),
        overloads: Vec::new(),
        idl_args,
        declared_name: name.clone(),
        js_name: name.clone(),
        name,
        constructor_name: None,
        type_name: interface.id.clone(),
        param_infos,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idl::ExtAttrValue;
    use pretty_assertions::assert_eq;

    fn iface() -> IdlInterface {
        IdlInterface::new("CanvasRenderingContext2D")
    }

    #[test]
    fn test_split_is_idempotent() {
        let op = IdlOperation::new("drawImage", "void")
            .arg(IdlArgument::new("image", "HTMLImageElement"))
            .arg(IdlArgument::new("x", "float").optional())
            .arg(IdlArgument::new("y", "float").optional());
        let once = split_overloads(&[op]);
        assert_eq!(once.len(), 3);
        let twice = split_overloads(&once);
        assert_eq!(twice.len(), once.len());
    }

    #[test]
    fn test_analyze_optional_positions() {
        let op = IdlOperation::new("fill", "void")
            .arg(IdlArgument::new("path", "Path"))
            .arg(IdlArgument::new("winding", "DOMString").optional());
        let info = analyze_operation(&iface(), &[op]).unwrap();
        assert_eq!(
            info.param_infos,
            vec![
                ParamInfo::new("path", Some("Path".into()), "Path", false),
                ParamInfo::new("winding", Some("DOMString".into()), "DOMString", true),
            ]
        );
        assert_eq!(
            info.parameters_interface_declaration(|t| types::dart_type(t)).unwrap(),
            "Path path, [String winding]"
        );
    }

    #[test]
    fn test_analyze_disagreeing_overloads() {
        let a = IdlOperation::new("setFillColor", "void").arg(IdlArgument::new("color", "DOMString"));
        let b = IdlOperation::new("setFillColor", "void")
            .arg(IdlArgument::new("grayLevel", "float"))
            .arg(IdlArgument::new("alpha", "float"));
        let info = analyze_operation(&iface(), &[a, b]).unwrap();
        assert_eq!(info.param_infos[0].name, "color_OR_grayLevel");
        assert_eq!(info.param_infos[0].dart_type, "Dynamic");
        assert_eq!(info.param_infos[0].type_id, None);
        assert!(!info.param_infos[0].is_optional);
        assert!(info.param_infos[1].is_optional);
        assert_eq!(
            info.parameters_interface_declaration(|t| t.to_string()).unwrap(),
            "color_OR_grayLevel, [float alpha]"
        );
    }

    #[test]
    fn test_same_dart_type_keeps_first_idl_type() {
        let a = IdlOperation::new("f", "void").arg(IdlArgument::new("x", "long"));
        let b = IdlOperation::new("f", "void").arg(IdlArgument::new("x", "short"));
        let info = analyze_operation(&iface(), &[a, b]).unwrap();
        assert_eq!(info.param_infos[0], ParamInfo::new("x", None, "long", false));
    }

    #[test]
    fn test_dart_name_and_statics() {
        let op = IdlOperation::new("webkitRequestFullScreen", "void")
            .with_ext_attr("DartName", ExtAttrValue::Text("requestFullScreen".into()))
            .static_op();
        let info = analyze_operation(&iface(), &[op]).unwrap();
        assert_eq!(info.declared_name, "webkitRequestFullScreen");
        assert_eq!(info.name, "requestFullScreen");
        assert!(info.is_static());
        assert!(analyze_operation(&iface(), &[]).is_err());
    }

    #[test]
    fn test_required_after_optional_is_rejected() {
        let params = vec![
            ParamInfo::new("a", None, "int", true),
            ParamInfo::new("b", None, "int", false),
        ];
        let err = format_params(&params, None, |_| String::new()).unwrap_err();
        assert!(matches!(err, WeldError::OptionalBeforeRequired(_)));
    }

    #[test]
    fn test_implementation_defaults() {
        let info = OperationInfo {
            param_infos: vec![
                ParamInfo::new("a", None, "int", false),
                ParamInfo::new("b", None, "Dynamic", true),
            ],
            ..Default::default()
        };
        assert_eq!(
            info.parameters_implementation_declaration(|t| t.to_string(), "_null").unwrap(),
            "int a, [b = _null]"
        );
        assert_eq!(
            info.parameters_implementation_declaration(|t| t.to_string(), "null").unwrap(),
            "int a, [b]"
        );
        assert_eq!(info.parameters_as_argument_list(), "a, b");
    }

    #[test]
    fn test_constructors() {
        let plain = IdlInterface::new("MessageChannel")
            .with_ext_attr("Constructor", ExtAttrValue::Flag);
        let info = analyze_constructor(&plain).unwrap();
        assert!(info.param_infos.is_empty());
        assert_eq!(info.constructor_full_name(), "MessageChannel");

        let audio = IdlInterface::new("HTMLAudioElement").with_ext_attr(
            "NamedConstructor",
            ExtAttrValue::Function(crate::idl::IdlFunction {
                id: Some("Audio".into()),
                arguments: vec![IdlArgument::new("src", "DOMString").optional()],
            }),
        );
        let info = analyze_constructor(&audio).unwrap();
        assert_eq!(info.name, "Audio");
        assert!(info.param_infos[0].is_optional);

        assert!(analyze_constructor(&IdlInterface::new("Node")).is_none());
    }

    #[test]
    fn test_type_or_helpers() {
        assert_eq!(type_or_nothing("Dynamic", Some("Node")), "/*Node*/ ");
        assert_eq!(type_or_nothing("Dynamic", None), "");
        assert_eq!(type_or_nothing("int", None), "int ");
        assert_eq!(type_or_var("Dynamic", None), "var");
        assert_eq!(type_or_var("Dynamic", Some("T")), "var /*T*/");
        assert_eq!(type_or_var("String", None), "String");
    }
}
