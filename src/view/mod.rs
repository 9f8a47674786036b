//! Views, layouts, and the capture-driven render pipeline.
//!
//! A [`View`] names a template plus its bindings. Rendering executes that
//! template with every write captured; if the template attached a [`Layout`],
//! the captured output is filed as the unnamed section and the layout
//! template runs in a second capture pass, replaying sections where it wants
//! them. The result of either pass is a [`CapturedBuffer`] ready to become a
//! response body.

pub mod capture;
pub mod context;
pub mod engine;

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde_json::Value;

use crate::config::RenderConfig;
use crate::error::{Error, Result};
use crate::http::headers::Header;
use crate::view::capture::CaptureStack;

pub use capture::CapturedBuffer;
pub use context::TemplateContext;
pub use engine::{FileEngine, ScriptEngine, TemplateEngine, TemplateFn};

/// Insertion-ordered template bindings, name to JSON value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    vars: IndexMap<String, Value>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// A copy of `self` with `overrides` merged on top, overrides winning.
    pub fn merged(&self, overrides: &Bindings) -> Bindings {
        let mut vars = self.vars.clone();
        for (name, value) in &overrides.vars {
            vars.insert(name.clone(), value.clone());
        }
        Bindings { vars }
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.vars.iter().map(|(n, v)| (n.as_str(), v))
    }
}

/// A template plus its bindings, tracked headers, and optional layout.
#[derive(Debug)]
pub struct View {
    path: PathBuf,
    vars: Bindings,
    headers: Vec<Header>,
    layout: Option<Layout>,
}

impl View {
    pub fn new(path: impl Into<PathBuf>, vars: Bindings) -> Self {
        Self {
            path: path.into(),
            vars,
            headers: Vec::new(),
            layout: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn vars(&self) -> &Bindings {
        &self.vars
    }

    /// Headers tracked during the last render, in emission order.
    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    pub fn layout(&self) -> Option<&Layout> {
        self.layout.as_ref()
    }

    /// Attaches a layout. A view frames itself in at most one layout, so a
    /// second attachment fails eagerly.
    pub fn attach_layout(&mut self, path: impl Into<PathBuf>, vars: Bindings) -> Result<()> {
        if self.layout.is_some() {
            return Err(Error::LayoutAlreadyAttached);
        }
        self.layout = Some(Layout::new(path, vars));
        Ok(())
    }

    /// Runs the view template, then the layout template if one was attached,
    /// and returns the final captured output.
    ///
    /// The view template executes with the view's own path and vars. When a
    /// layout is attached by the time the template finishes, the captured
    /// output is filed as the unnamed section and the layout template runs
    /// with the view's vars merged under the layout's own, writing the final
    /// buffer. Tracked headers reset at the start of every render.
    pub fn render(
        &mut self,
        engine: &dyn TemplateEngine,
        config: &RenderConfig,
    ) -> Result<CapturedBuffer> {
        self.headers.clear();

        let mut captures = CaptureStack::new(config.max_capture_bytes);
        captures.push_anonymous();

        let path = self.path.clone();
        let vars = self.vars.clone();
        let mut ctx = TemplateContext::new(self, &mut captures, engine, config, vars, path.clone(), 0);
        engine.execute(&path, &mut ctx)?;

        if let Some(open) = captures.open_section() {
            return Err(Error::UnclosedSection(open.to_string()));
        }
        let main = captures.pop().unwrap_or_default();

        let Some(layout) = self.layout.as_mut() else {
            return Ok(main);
        };
        layout.sections.insert(String::new(), main);
        let layout_path = config.resolve(&layout.path);
        let layout_vars = self.vars.merged(&layout.vars);

        captures.push_anonymous();
        let mut ctx = TemplateContext::new(
            self,
            &mut captures,
            engine,
            config,
            layout_vars,
            layout_path.clone(),
            0,
        );
        engine.execute(&layout_path, &mut ctx)?;

        if let Some(open) = captures.open_section() {
            return Err(Error::UnclosedSection(open.to_string()));
        }
        Ok(captures.pop().unwrap_or_default())
    }
}

/// A frame template around a view, plus the sections captured for it.
#[derive(Debug)]
pub struct Layout {
    path: PathBuf,
    vars: Bindings,
    sections: IndexMap<String, CapturedBuffer>,
}

impl Layout {
    fn new(path: impl Into<PathBuf>, vars: Bindings) -> Self {
        Self {
            path: path.into(),
            vars,
            sections: IndexMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn vars(&self) -> &Bindings {
        &self.vars
    }

    /// The buffer captured under `name`, the unnamed section being `""`.
    pub fn section(&self, name: &str) -> Option<&CapturedBuffer> {
        self.sections.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bindings_merged_rightmost_wins() {
        let base = Bindings::new().with("a", 1).with("b", "base");
        let over = Bindings::new().with("b", "override").with("c", true);

        let merged = base.merged(&over);
        assert_eq!(merged.get("a"), Some(&json!(1)));
        assert_eq!(merged.get("b"), Some(&json!("override")));
        assert_eq!(merged.get("c"), Some(&json!(true)));
        assert_eq!(base.get("b"), Some(&json!("base")));
    }

    #[test]
    fn test_render_without_layout_returns_view_output() {
        let mut engine = ScriptEngine::new();
        engine.register("plain.html", |ctx: &mut TemplateContext<'_>| {
            let name = ctx.var_string("name").unwrap_or_default();
            ctx.write(&format!("hi {}", name))
        });

        let mut view = View::new("plain.html", Bindings::new().with("name", "sam"));
        let buffer = view.render(&engine, &RenderConfig::default()).unwrap();
        assert_eq!(buffer.text(), "hi sam");
        assert!(view.layout().is_none());
    }

    #[test]
    fn test_layout_wraps_view_output_as_unnamed_section() {
        let mut engine = ScriptEngine::new();
        engine.register("page.html", |ctx: &mut TemplateContext<'_>| {
            ctx.attach_layout("frame", Bindings::new())?;
            ctx.write("inner")
        });
        engine.register("frame.html", |ctx: &mut TemplateContext<'_>| {
            ctx.write("[")?;
            ctx.content()?;
            ctx.write("]")
        });

        let mut view = View::new("page.html", Bindings::new());
        let buffer = view.render(&engine, &RenderConfig::default()).unwrap();
        assert_eq!(buffer.text(), "[inner]");
        assert_eq!(
            view.layout().unwrap().section("").unwrap().as_bytes(),
            b"inner"
        );
    }

    #[test]
    fn test_layout_vars_override_view_vars() {
        let mut engine = ScriptEngine::new();
        engine.register("page.html", |ctx: &mut TemplateContext<'_>| {
            ctx.attach_layout("frame", Bindings::new().with("who", "layout"))
        });
        engine.register("frame.html", |ctx: &mut TemplateContext<'_>| {
            let who = ctx.var_string("who").unwrap_or_default();
            let kept = ctx.var_string("kept").unwrap_or_default();
            ctx.write(&format!("{}/{}", who, kept))
        });

        let mut view = View::new(
            "page.html",
            Bindings::new().with("who", "view").with("kept", "yes"),
        );
        let buffer = view.render(&engine, &RenderConfig::default()).unwrap();
        assert_eq!(buffer.text(), "layout/yes");
    }

    #[test]
    fn test_second_layout_attach_fails() {
        let mut engine = ScriptEngine::new();
        engine.register("page.html", |ctx: &mut TemplateContext<'_>| {
            ctx.attach_layout("one", Bindings::new())?;
            ctx.attach_layout("two", Bindings::new())
        });

        let mut view = View::new("page.html", Bindings::new());
        match view.render(&engine, &RenderConfig::default()) {
            Err(Error::LayoutAlreadyAttached) => {}
            other => panic!("expected LayoutAlreadyAttached, got {:?}", other),
        }
    }

    #[test]
    fn test_unclosed_section_names_the_section() {
        let mut engine = ScriptEngine::new();
        engine.register("page.html", |ctx: &mut TemplateContext<'_>| {
            ctx.attach_layout("frame", Bindings::new())?;
            ctx.start_section("dangling")
        });

        let mut view = View::new("page.html", Bindings::new());
        match view.render(&engine, &RenderConfig::default()) {
            Err(Error::UnclosedSection(name)) => assert_eq!(name, "dangling"),
            other => panic!("expected UnclosedSection, got {:?}", other),
        }
    }

    #[test]
    fn test_section_without_layout_fails_to_open() {
        let mut engine = ScriptEngine::new();
        engine.register("page.html", |ctx: &mut TemplateContext<'_>| {
            ctx.start_section("content")
        });

        let mut view = View::new("page.html", Bindings::new());
        match view.render(&engine, &RenderConfig::default()) {
            Err(Error::LayoutNotAttached) => {}
            other => panic!("expected LayoutNotAttached, got {:?}", other),
        }
    }

    #[test]
    fn test_sections_do_not_nest() {
        let mut engine = ScriptEngine::new();
        engine.register("page.html", |ctx: &mut TemplateContext<'_>| {
            ctx.attach_layout("frame", Bindings::new())?;
            ctx.start_section("outer")?;
            ctx.start_section("inner")
        });

        let mut view = View::new("page.html", Bindings::new());
        match view.render(&engine, &RenderConfig::default()) {
            Err(Error::SectionAlreadyOpen(name)) => assert_eq!(name, "outer"),
            other => panic!("expected SectionAlreadyOpen, got {:?}", other),
        }
    }

    #[test]
    fn test_reopened_section_overwrites() {
        let mut engine = ScriptEngine::new();
        engine.register("page.html", |ctx: &mut TemplateContext<'_>| {
            ctx.attach_layout("frame", Bindings::new())?;
            ctx.start_section("slot")?;
            ctx.write("first")?;
            ctx.end_section()?;
            ctx.start_section("slot")?;
            ctx.write("second")?;
            ctx.end_section()
        });
        engine.register("frame.html", |ctx: &mut TemplateContext<'_>| {
            ctx.section("slot")
        });

        let mut view = View::new("page.html", Bindings::new());
        let buffer = view.render(&engine, &RenderConfig::default()).unwrap();
        assert_eq!(buffer.text(), "second");
    }

    #[test]
    fn test_section_replay_is_repeatable_and_absent_is_silent() {
        let mut engine = ScriptEngine::new();
        engine.register("page.html", |ctx: &mut TemplateContext<'_>| {
            ctx.attach_layout("frame", Bindings::new())?;
            ctx.start_section("repeat")?;
            ctx.write("x")?;
            ctx.end_section()
        });
        engine.register("frame.html", |ctx: &mut TemplateContext<'_>| {
            ctx.section("repeat")?;
            ctx.section("repeat")?;
            ctx.section("absent")
        });

        let mut view = View::new("page.html", Bindings::new());
        let buffer = view.render(&engine, &RenderConfig::default()).unwrap();
        assert_eq!(buffer.text(), "xx");
    }

    #[test]
    fn test_include_sees_view_vars_with_overrides() {
        let mut engine = ScriptEngine::new();
        engine.register("page.html", |ctx: &mut TemplateContext<'_>| {
            ctx.include("partial", Bindings::new().with("b", "callee"))
        });
        engine.register("partial.html", |ctx: &mut TemplateContext<'_>| {
            let a = ctx.var_string("a").unwrap_or_default();
            let b = ctx.var_string("b").unwrap_or_default();
            ctx.write(&format!("{}+{}", a, b))
        });

        let mut view = View::new(
            "page.html",
            Bindings::new().with("a", "caller").with("b", "caller"),
        );
        let buffer = view.render(&engine, &RenderConfig::default()).unwrap();
        assert_eq!(buffer.text(), "caller+callee");
    }

    #[test]
    fn test_include_depth_limit() {
        let mut engine = ScriptEngine::new();
        engine.register("loop.html", |ctx: &mut TemplateContext<'_>| {
            ctx.include("loop", Bindings::new())
        });

        let config = RenderConfig {
            max_include_depth: 4,
            ..RenderConfig::default()
        };
        let mut view = View::new("loop.html", Bindings::new());
        match view.render(&engine, &config) {
            Err(Error::ResourceExhausted(what)) => {
                assert!(what.contains("depth"));
            }
            other => panic!("expected ResourceExhausted, got {:?}", other),
        }
    }

    #[test]
    fn test_capture_byte_limit_aborts_render() {
        let mut engine = ScriptEngine::new();
        engine.register("big.html", |ctx: &mut TemplateContext<'_>| {
            for _ in 0..1024 {
                ctx.write("0123456789abcdef")?;
            }
            Ok(())
        });

        let config = RenderConfig {
            max_capture_bytes: 1024,
            ..RenderConfig::default()
        };
        let mut view = View::new("big.html", Bindings::new());
        match view.render(&engine, &config) {
            Err(Error::ResourceExhausted(what)) => assert!(what.contains("byte")),
            other => panic!("expected ResourceExhausted, got {:?}", other),
        }
    }

    #[test]
    fn test_tracked_headers_reset_per_render() {
        let mut engine = ScriptEngine::new();
        engine.register("page.html", |ctx: &mut TemplateContext<'_>| {
            ctx.header("X-Once: yes");
            ctx.write("ok")
        });

        let mut view = View::new("page.html", Bindings::new());
        view.render(&engine, &RenderConfig::default()).unwrap();
        view.render(&engine, &RenderConfig::default()).unwrap();
        assert_eq!(view.headers().len(), 1);
        assert_eq!(view.headers()[0].name(), "X-Once");
    }
}
