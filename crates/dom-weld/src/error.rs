//! Error types for the binding generator

use std::path::PathBuf;
use thiserror::Error;

/// Result type for dom-weld operations
pub type WeldResult<T> = Result<T, WeldError>;

/// Main error type for dom-weld
#[derive(Debug, Error)]
pub enum WeldError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// IDL database document could not be decoded
    #[error("Invalid IDL document {file}: {source}")]
    Database {
        file: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file could not be decoded
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Interface referenced but absent from the database
    #[error("Interface not found: {0}")]
    InterfaceNotFound(String),

    /// Type name not present in the registry table nor in the database
    #[error("Unknown IDL type: {0}")]
    UnknownType(String),

    /// No template with this name on any search path
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    /// Unbalanced `$if` / `$else` / `$endif`
    #[error("Template {name}: {message}")]
    TemplateSyntax { name: String, message: String },

    /// Template placeholder without a binding
    #[error("No value for placeholder ${name}")]
    MissingPlaceholder { name: String },

    /// Template hole requested but not present in the emitted text
    #[error("Template has no hole named {0}")]
    MissingHole(String),

    /// Parameter list with an optional parameter before a required one
    #[error("Optional parameters cannot precede required ones: {0}")]
    OptionalBeforeRequired(String),

    /// Event attribute without a known html event name
    #[error("No known html event name for event: {0}")]
    UnknownEvent(String),

    /// Unknown generator system name
    #[error("Unknown system: {0}")]
    UnknownSystem(String),

    /// Invalid IDL construct
    #[error("Invalid IDL in {interface}: {message}")]
    InvalidIdl { interface: String, message: String },
}

impl WeldError {
    /// Shorthand for [`WeldError::InvalidIdl`]
    pub fn invalid_idl(interface: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidIdl {
            interface: interface.into(),
            message: message.into(),
        }
    }
}
