//! Template engines: the seam between the capture machinery and whatever
//! produces the actual markup.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::view::context::TemplateContext;

pub trait TemplateEngine {
    fn execute(&self, path: &Path, ctx: &mut TemplateContext<'_>) -> Result<()>;
}

/// A native template: plain host code with full access to the context.
pub type TemplateFn = dyn Fn(&mut TemplateContext<'_>) -> Result<()> + Send + Sync;

/// Engine backed by a registry of native template functions.
///
/// Keys are the resolved paths the engine will be asked to execute, so
/// register them the way [`RenderConfig::resolve`](crate::config::RenderConfig::resolve)
/// produces them.
#[derive(Default)]
pub struct ScriptEngine {
    templates: HashMap<PathBuf, Box<TemplateFn>>,
}

impl ScriptEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, path: impl Into<PathBuf>, template: F)
    where
        F: Fn(&mut TemplateContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.templates.insert(path.into(), Box::new(template));
    }
}

impl TemplateEngine for ScriptEngine {
    fn execute(&self, path: &Path, ctx: &mut TemplateContext<'_>) -> Result<()> {
        let Some(template) = self.templates.get(path) else {
            return Err(Error::TemplateNotFound(path.to_path_buf()));
        };
        template(ctx)
    }
}

/// Engine that emits template files byte for byte, with no interpretation.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileEngine;

impl TemplateEngine for FileEngine {
    fn execute(&self, path: &Path, ctx: &mut TemplateContext<'_>) -> Result<()> {
        let bytes = fs::read(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => Error::TemplateNotFound(path.to_path_buf()),
            _ => Error::Io(err),
        })?;
        ctx.write_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RenderConfig;
    use crate::view::{Bindings, View};
    use std::io::Write;

    #[test]
    fn test_script_engine_runs_registered_template() {
        let mut engine = ScriptEngine::new();
        engine.register("greeting.html", |ctx: &mut TemplateContext<'_>| {
            ctx.write("hello")
        });

        let mut view = View::new("greeting.html", Bindings::new());
        let buffer = view.render(&engine, &RenderConfig::default()).unwrap();
        assert_eq!(buffer.text(), "hello");
    }

    #[test]
    fn test_script_engine_misses_with_path() {
        let engine = ScriptEngine::new();
        let mut view = View::new("absent.html", Bindings::new());
        match view.render(&engine, &RenderConfig::default()) {
            Err(Error::TemplateNotFound(path)) => {
                assert_eq!(path, PathBuf::from("absent.html"));
            }
            other => panic!("expected TemplateNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_file_engine_emits_file_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("static.html");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(b"<p>as-is</p>").unwrap();

        let mut view = View::new(&path, Bindings::new());
        let buffer = view.render(&FileEngine, &RenderConfig::default()).unwrap();
        assert_eq!(buffer.as_bytes(), b"<p>as-is</p>");
    }

    #[test]
    fn test_file_engine_missing_file_is_template_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.html");

        let mut view = View::new(&path, Bindings::new());
        match view.render(&FileEngine, &RenderConfig::default()) {
            Err(Error::TemplateNotFound(missing)) => assert_eq!(missing, path),
            other => panic!("expected TemplateNotFound, got {:?}", other),
        }
    }
}
