use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type for rendering operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while building responses or rendering views.
///
/// A failed restore of [`AmbientState`](crate::ambient::AmbientState) is not
/// listed here: it is reported as a boolean by `restore`/`clear` because the
/// caller may legitimately choose to proceed anyway.
#[derive(Debug)]
pub enum Error {
    /// A capture limit was hit; the render is aborted with no partial output
    ResourceExhausted(&'static str),
    /// A second layout was attached to a view that already has one
    LayoutAlreadyAttached,
    /// A section operation ran on a view with no layout attached
    LayoutNotAttached,
    /// `start_section` was called while another section is being captured
    SectionAlreadyOpen(String),
    /// `end_section` was called with no section open
    SectionNotOpen,
    /// A template finished while a section capture was still open
    UnclosedSection(String),
    /// An operation needed a capability the renderer was not given
    MissingCollaborator(&'static str),
    /// The engine has no template registered under the resolved path
    TemplateNotFound(PathBuf),
    /// A raw upstream response could not be parsed
    MalformedUpstream(String),
    /// A CSV row did not serialize to a map of columns
    CsvRow(usize),
    /// Configuration could not be loaded
    Config(String),
    /// IO operation failed
    Io(io::Error),
    /// JSON serialization failed
    Json(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ResourceExhausted(what) => write!(f, "resource exhausted: {}", what),
            Error::LayoutAlreadyAttached => write!(f, "view already has a layout attached"),
            Error::LayoutNotAttached => write!(f, "no layout attached to the view"),
            Error::SectionAlreadyOpen(name) => {
                write!(f, "section \"{}\" is still being captured", name)
            }
            Error::SectionNotOpen => write!(f, "no section is currently open"),
            Error::UnclosedSection(name) => {
                write!(f, "template finished with section \"{}\" left open", name)
            }
            Error::MissingCollaborator(what) => write!(f, "missing collaborator: {}", what),
            Error::TemplateNotFound(path) => {
                write!(f, "no template registered for {}", path.display())
            }
            Error::MalformedUpstream(reason) => {
                write!(f, "malformed upstream response: {}", reason)
            }
            Error::CsvRow(index) => write!(f, "CSV row {} is not a map of columns", index),
            Error::Config(reason) => write!(f, "config error: {}", reason),
            Error::Io(err) => write!(f, "IO error: {}", err),
            Error::Json(err) => write!(f, "JSON error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}
