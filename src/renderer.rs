//! The rendering facade.
//!
//! [`Renderer`] turns application data into complete [`Response`] values:
//! redirects, verbatim content, JSON, CSV downloads, files, upstream
//! responses replayed from raw bytes, and captured view output. Every
//! operation either returns a full response or an error, never a partial
//! message.
//!
//! Responses and body streams come from pluggable factories so the facade
//! can sit on top of a foreign HTTP stack; the response factory is required,
//! the stream factory and template engine only for the operations that use
//! them.

use std::collections::HashMap;
use std::fmt::Display;
use std::fs;
use std::io::Write;
use std::path::Path;

use indexmap::IndexMap;
use log::debug;
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::ambient::AmbientState;
use crate::config::RenderConfig;
use crate::csv::{self, CsvOptions};
use crate::error::{Error, Result};
use crate::http::factory::{ResponseFactory, StreamFactory};
use crate::http::response::Response;
use crate::http::status::HttpStatus;
use crate::http::stream::BodyStream;
use crate::view::{Bindings, TemplateEngine, View};

static MIME_TYPES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("html", "text/html"),
        ("htm", "text/html"),
        ("css", "text/css"),
        ("js", "text/javascript"),
        ("json", "application/json"),
        ("xml", "application/xml"),
        ("txt", "text/plain"),
        ("csv", "text/csv"),
        ("png", "image/png"),
        ("jpg", "image/jpeg"),
        ("jpeg", "image/jpeg"),
        ("gif", "image/gif"),
        ("svg", "image/svg+xml"),
        ("webp", "image/webp"),
        ("ico", "image/x-icon"),
        ("pdf", "application/pdf"),
        ("zip", "application/zip"),
        ("woff", "font/woff"),
        ("woff2", "font/woff2"),
        ("mp4", "video/mp4"),
        ("mp3", "audio/mpeg"),
        ("wasm", "application/wasm"),
    ])
});

pub struct Renderer {
    response_factory: Box<dyn ResponseFactory>,
    stream_factory: Option<Box<dyn StreamFactory>>,
    engine: Option<Box<dyn TemplateEngine>>,
    config: RenderConfig,
}

impl Renderer {
    pub fn new<F>(response_factory: F) -> Self
    where
        F: ResponseFactory + 'static,
    {
        Self {
            response_factory: Box::new(response_factory),
            stream_factory: None,
            engine: None,
            config: RenderConfig::default(),
        }
    }

    pub fn set_stream_factory<F>(&mut self, factory: F)
    where
        F: StreamFactory + 'static,
    {
        self.stream_factory = Some(Box::new(factory));
    }

    pub fn set_engine<E>(&mut self, engine: E)
    where
        E: TemplateEngine + 'static,
    {
        self.engine = Some(Box::new(engine));
    }

    pub fn set_config(&mut self, config: RenderConfig) {
        self.config = config;
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    fn stream_factory(&self) -> Result<&dyn StreamFactory> {
        self.stream_factory
            .as_deref()
            .ok_or(Error::MissingCollaborator("stream factory"))
    }

    fn engine(&self) -> Result<&dyn TemplateEngine> {
        self.engine
            .as_deref()
            .ok_or(Error::MissingCollaborator("template engine"))
    }

    fn base_or_new(&self, base: Option<Response>, status: u16) -> Response {
        base.unwrap_or_else(|| self.response_factory.create_response(status))
    }

    /// Builds a redirect to `location`. Callers pick the status, typically
    /// [`HttpStatus::Found`]; a base response keeps its headers but takes
    /// the redirect status.
    pub fn render_redirect(&self, location: &str, status: u16, base: Option<Response>) -> Response {
        let mut response = self.base_or_new(base, status);
        response.status = status;
        response.set_header("Location", location);
        response
    }

    /// Puts `content` verbatim into the body under the given content type.
    /// The body is rewound, ready to stream out.
    pub fn render_content(
        &self,
        content: impl Display,
        content_type: &str,
        base: Option<Response>,
    ) -> Result<Response> {
        let mut response = self.base_or_new(base, HttpStatus::Ok.code());
        let mut body = BodyStream::new();
        write!(body, "{}", content)?;
        body.rewind();
        response.body = body;
        response.set_header("Content-Type", content_type);
        Ok(response)
    }

    /// Serializes `data` to JSON text. Object key order follows insertion
    /// order, so output is deterministic.
    pub fn render_json<T: Serialize>(&self, data: &T, base: Option<Response>) -> Result<Response> {
        let text = serde_json::to_string(data)?;
        self.render_content(text, "application/json;charset=utf-8", base)
    }

    /// Renders rows as a CSV download named `filename`.
    pub fn render_csv<T: Serialize>(
        &self,
        rows: &[T],
        filename: &str,
        options: Option<&CsvOptions>,
        base: Option<Response>,
    ) -> Result<Response> {
        let options = options.cloned().unwrap_or_default();
        let text = csv::render_rows(rows, &options)?;

        let mut response = self.render_content(text, "text/csv", base)?;
        response.status = HttpStatus::Ok.code();
        response.set_header(
            "Content-Disposition",
            &format!("attachment; filename=\"{}\"", filename),
        );
        Ok(response)
    }

    /// Serves a file from disk: body through the stream factory, MIME type
    /// from the extension, disposition `inline` or `attachment` with the
    /// download name when one is given, and `Last-Modified` from the file
    /// mtime when available.
    pub fn render_file(
        &self,
        filepath: &Path,
        filename: Option<&str>,
        as_attachment: bool,
        base: Option<Response>,
    ) -> Result<Response> {
        let body = self.stream_factory()?.create_stream_from_file(filepath)?;

        let mut response = self.base_or_new(base, HttpStatus::Ok.code());
        response.set_header("Content-Type", mime_type(filepath));

        let mut disposition = if as_attachment { "attachment" } else { "inline" }.to_string();
        if let Some(name) = filename {
            disposition.push_str(&format!(";filename=\"{}\"", name));
        }
        response.set_header("Content-Disposition", &disposition);

        if let Ok(metadata) = fs::metadata(filepath)
            && let Ok(modified) = metadata.modified()
        {
            response.set_header("Last-Modified", &httpdate::fmt_http_date(modified));
        }

        response.body = body;
        Ok(response)
    }

    /// Replays a raw upstream HTTP response: status from the status line,
    /// headers split on their first colon with comma-separated values,
    /// remaining bytes as the body.
    ///
    /// `header_size` gives the exact length of the header block when the
    /// caller knows it (HTTP clients usually report it); otherwise the bytes
    /// are scanned for the first blank line. Malformed input is an error,
    /// never a partial response.
    pub fn render_upstream_response(
        &self,
        raw: &[u8],
        header_size: Option<usize>,
        base: Option<Response>,
    ) -> Result<Response> {
        let stream_factory = self.stream_factory()?;

        let (head, body) = match header_size {
            Some(size) if size <= raw.len() => raw.split_at(size),
            Some(size) => {
                return Err(Error::MalformedUpstream(format!(
                    "header size {} exceeds response length {}",
                    size,
                    raw.len()
                )));
            }
            None => match find_subsequence(raw, b"\r\n\r\n") {
                Some(pos) => (&raw[..pos + 4], &raw[pos + 4..]),
                None => {
                    return Err(Error::MalformedUpstream(
                        "missing blank line after headers".to_string(),
                    ));
                }
            },
        };

        let head_text = String::from_utf8_lossy(head);
        let mut lines = head_text.lines();

        let Some(status_line) = lines.next() else {
            return Err(Error::MalformedUpstream("empty header block".to_string()));
        };
        let mut parts = status_line.split_whitespace();
        let version = parts.next().unwrap_or_default();
        let code = match parts.next().and_then(|c| c.parse::<u16>().ok()) {
            Some(code) if version.starts_with("HTTP") => code,
            _ => {
                return Err(Error::MalformedUpstream(format!(
                    "bad status line: {}",
                    status_line
                )));
            }
        };

        let mut response = self.base_or_new(base, code);
        response.status = code;

        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            // Redirected upstreams carry several header blocks; later
            // status lines are skipped like the first.
            if line.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("HTTP")) {
                continue;
            }
            let Some((name, content)) = line.split_once(':') else {
                return Err(Error::MalformedUpstream(format!("bad header line: {}", line)));
            };
            let values: Vec<String> = content
                .trim()
                .split(',')
                .map(|v| v.trim_start().to_string())
                .collect();
            response.headers.set_all(name.trim(), values);
        }

        response.body = stream_factory.create_stream(body.to_vec());
        Ok(response)
    }

    /// Renders a view template into a response.
    ///
    /// The ambient state is captured before the render and restored after
    /// it, success or not. A fresh response takes the ambient status; a base
    /// response keeps its own. Headers land in two waves: the view's tracked
    /// headers grouped by name, then the ambient header lines, later waves
    /// replacing earlier ones name by name.
    pub fn render_view(
        &self,
        viewpath: impl AsRef<Path>,
        vars: Bindings,
        ambient: &mut AmbientState,
        base: Option<Response>,
    ) -> Result<Response> {
        let engine = self.engine()?;
        let stream_factory = self.stream_factory()?;

        let resolved = self.config.resolve(viewpath.as_ref());
        debug!("rendering view {}", resolved.display());

        let snapshot = ambient.capture();
        let mut view = View::new(resolved, vars);
        let buffer = match view.render(engine, &self.config) {
            Ok(buffer) => buffer,
            Err(err) => {
                ambient.restore(&snapshot);
                return Err(err);
            }
        };

        let mut response = self.base_or_new(base, ambient.status());

        let mut tracked: IndexMap<String, Vec<String>> = IndexMap::new();
        for header in view.headers() {
            tracked
                .entry(header.name().trim().to_string())
                .or_default()
                .extend(header.values().iter().cloned());
        }
        for (name, values) in tracked {
            response.headers.set_all(&name, values);
        }
        for (name, values) in ambient.new_headers() {
            response.headers.set_all(&name, values);
        }

        response.body = stream_factory.create_stream(buffer.into_bytes());
        ambient.restore(&snapshot);
        Ok(response)
    }
}

fn mime_type(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| MIME_TYPES.get(ext.to_ascii_lowercase().as_str()).copied())
        .unwrap_or("application/octet-stream")
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
