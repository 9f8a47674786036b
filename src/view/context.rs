//! The API a running template sees.
//!
//! A [`TemplateContext`] borrows the view being rendered and the live capture
//! stack for the duration of one template execution. Writes go to the
//! innermost capture scope; headers and the layout attachment go to the view;
//! nothing a template does can reach the transport directly.

use std::path::{Path, PathBuf};

use log::trace;
use serde_json::Value;

use crate::config::RenderConfig;
use crate::error::{Error, Result};
use crate::http::headers::Header;
use crate::view::capture::{CaptureStack, REPLAY_CHUNK};
use crate::view::engine::TemplateEngine;
use crate::view::{Bindings, View};

pub struct TemplateContext<'a> {
    view: &'a mut View,
    captures: &'a mut CaptureStack,
    engine: &'a dyn TemplateEngine,
    config: &'a RenderConfig,
    vars: Bindings,
    path: PathBuf,
    depth: usize,
}

impl<'a> TemplateContext<'a> {
    pub(crate) fn new(
        view: &'a mut View,
        captures: &'a mut CaptureStack,
        engine: &'a dyn TemplateEngine,
        config: &'a RenderConfig,
        vars: Bindings,
        path: PathBuf,
        depth: usize,
    ) -> Self {
        Self {
            view,
            captures,
            engine,
            config,
            vars,
            path,
            depth,
        }
    }

    /// Resolved path of the template currently executing.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bindings visible to this template.
    pub fn vars(&self) -> &Bindings {
        &self.vars
    }

    pub fn var(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// String form of a binding: strings come back verbatim, other values in
    /// their JSON text form, nulls as `None`.
    pub fn var_string(&self, name: &str) -> Option<String> {
        match self.vars.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Writes text into the innermost capture scope.
    pub fn write(&mut self, text: &str) -> Result<()> {
        self.captures.write(text.as_bytes())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.captures.write(bytes)
    }

    /// Tracks a raw header line on the view, parsed per [`Header::parse`].
    pub fn header(&mut self, line: &str) {
        self.view.headers.push(Header::parse(line));
    }

    /// Attaches the layout this view should be framed in. Fails on a second
    /// attachment no matter which template performs it.
    pub fn attach_layout(&mut self, path: impl Into<PathBuf>, vars: Bindings) -> Result<()> {
        self.view.attach_layout(path, vars)
    }

    /// Executes another template inline, writing into the current scope.
    ///
    /// The callee sees the view's vars with `extra` merged on top, callee
    /// side winning on collision.
    pub fn include(&mut self, path: impl AsRef<Path>, extra: Bindings) -> Result<()> {
        if self.depth >= self.config.max_include_depth {
            return Err(Error::ResourceExhausted("include depth limit reached"));
        }

        let resolved = self.config.resolve(path.as_ref());
        let vars = self.view.vars.merged(&extra);
        let engine = self.engine;
        let mut child = TemplateContext {
            view: &mut *self.view,
            captures: &mut *self.captures,
            engine,
            config: self.config,
            vars,
            path: resolved.clone(),
            depth: self.depth + 1,
        };
        engine.execute(&resolved, &mut child)
    }

    /// Opens a named section. Everything written until [`end_section`] is
    /// captured under the name instead of the surrounding scope.
    ///
    /// Requires an attached layout, since that is where the section is
    /// filed. Sections do not nest.
    ///
    /// [`end_section`]: TemplateContext::end_section
    pub fn start_section(&mut self, name: &str) -> Result<()> {
        if self.view.layout.is_none() {
            return Err(Error::LayoutNotAttached);
        }
        if let Some(open) = self.captures.open_section() {
            return Err(Error::SectionAlreadyOpen(open.to_string()));
        }
        self.captures.push_section(name.to_string());
        Ok(())
    }

    /// Closes the open section and files its buffer on the layout,
    /// overwriting any earlier capture under the same name.
    pub fn end_section(&mut self) -> Result<()> {
        let (name, buffer) = self.captures.pop_section()?;
        let Some(layout) = self.view.layout.as_mut() else {
            return Err(Error::LayoutNotAttached);
        };
        trace!("captured section {:?} ({} bytes)", name, buffer.len());
        layout.sections.insert(name, buffer);
        Ok(())
    }

    /// Replays a captured section into the current scope, in fixed-size
    /// chunks. Unknown names and a missing layout write nothing; replaying
    /// twice emits the bytes twice.
    pub fn section(&mut self, name: &str) -> Result<()> {
        let Some(layout) = self.view.layout.as_ref() else {
            return Ok(());
        };
        let Some(buffer) = layout.sections.get(name) else {
            return Ok(());
        };
        for chunk in buffer.as_bytes().chunks(REPLAY_CHUNK) {
            self.captures.write(chunk)?;
        }
        Ok(())
    }

    /// Replays the view's own captured output, the unnamed section a layout
    /// wraps.
    pub fn content(&mut self) -> Result<()> {
        self.section("")
    }
}
