use std::path::PathBuf;

/// Result type alias for the annotation engine
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the annotation engine.
///
/// Engine errors render as `<Kind> : <message>`. Errors coming from the package
/// loader (`Io`, `Syntax`, `Load`) are passed through unmodified.
#[derive(Debug)]
pub enum Error {
    /// A comment line could not be tokenized into a tag
    MalformedAnnotation(String),
    /// A `@Param` tag has the wrong shape
    MalformedParamComment(String),
    /// A `@Param` tag names a location outside path/query/header/form/body
    UnknownParameterLocation(String),
    /// The resolver could not locate a referenced type
    TypeNotFound(String),
    /// A header group schema has no properties
    NilSchemaProperties(String),
    /// A `@Header` tag names a header missing from its group
    UnknownHeader(String),
    /// A `@Success` / `@Failure` tag has the wrong shape
    MalformedResponseComment(String),
    /// A `@Router` tag has the wrong shape
    MalformedRouterComment(String),
    IoError(std::io::Error),
    SyntaxError { file: PathBuf, message: String },
    /// Opaque failure reported by a package loader
    LoadError(String),
    SerializationError(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::MalformedAnnotation(msg) => write!(f, "MalformedAnnotation : {}", msg),
            Error::MalformedParamComment(msg) => write!(f, "MalformedParamComment : {}", msg),
            Error::UnknownParameterLocation(msg) => {
                write!(f, "UnknownParameterLocation : {}", msg)
            }
            Error::TypeNotFound(msg) => write!(f, "TypeNotFound : {}", msg),
            Error::NilSchemaProperties(msg) => write!(f, "NilSchemaProperties : {}", msg),
            Error::UnknownHeader(msg) => write!(f, "UnknownHeader : {}", msg),
            Error::MalformedResponseComment(msg) => {
                write!(f, "MalformedResponseComment : {}", msg)
            }
            Error::MalformedRouterComment(msg) => write!(f, "MalformedRouterComment : {}", msg),
            Error::IoError(e) => write!(f, "{}", e),
            Error::SyntaxError { file, message } => {
                write!(f, "{}: {}", file.display(), message)
            }
            Error::LoadError(msg) => write!(f, "{}", msg),
            Error::SerializationError(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(format!("JSON serialization error: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::SerializationError(format!("YAML serialization error: {}", err))
    }
}

impl From<syn::Error> for Error {
    fn from(err: syn::Error) -> Self {
        Error::SyntaxError {
            file: PathBuf::from("<unknown>"),
            message: err.to_string(),
        }
    }
}
