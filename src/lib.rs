//! Server-side view rendering with output capture.
//!
//! Templates run with every write captured into an in-memory sink instead of
//! going to the transport. A view's captured output can be framed by a
//! single layout template, which replays named sections the view recorded.
//! The [`Renderer`] facade turns the captured bytes, plus JSON, CSV, files,
//! redirects, and raw upstream responses, into complete [`Response`] values.
//!
//! Nothing here touches process globals: transport state lives in an
//! explicit [`AmbientState`] the caller owns, and responses and body streams
//! come from pluggable factories so the facade can sit on a foreign HTTP
//! stack.

pub mod ambient;
pub mod config;
pub mod csv;
pub mod error;
pub mod http;
pub mod renderer;
pub mod view;

pub use ambient::{AmbientSnapshot, AmbientState};
pub use config::RenderConfig;
pub use csv::CsvOptions;
pub use error::{Error, Result};
pub use http::{
    BodyStream, Header, HttpFactory, HttpHeaders, HttpStatus, Response, ResponseFactory,
    StreamFactory,
};
pub use renderer::Renderer;
pub use view::{
    Bindings, CapturedBuffer, FileEngine, Layout, ScriptEngine, TemplateContext, TemplateEngine,
    TemplateFn, View,
};
