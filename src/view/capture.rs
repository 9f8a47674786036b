//! Output capture for template execution.
//!
//! Template writes never reach the transport directly; they land in the
//! buffer of the innermost open capture scope. [`CaptureStack`] keeps those
//! scopes explicit: a view render pushes an anonymous scope, section capture
//! pushes a named one on top, and whoever pushed a scope pops it to collect
//! the bytes as a [`CapturedBuffer`].

use crate::error::{Error, Result};
use crate::http::stream::BodyStream;

/// Chunk size used when replaying a captured buffer into another scope.
pub(crate) const REPLAY_CHUNK: usize = 4096;

/// Bytes collected by one capture scope, readable from the start.
#[derive(Debug, Clone, Default)]
pub struct CapturedBuffer {
    bytes: Vec<u8>,
}

impl CapturedBuffer {
    pub(crate) fn append(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Captured bytes as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

impl From<CapturedBuffer> for BodyStream {
    fn from(buffer: CapturedBuffer) -> Self {
        BodyStream::from_bytes(buffer.bytes)
    }
}

#[derive(Debug)]
enum ScopeKind {
    Anonymous,
    Section(String),
}

#[derive(Debug)]
struct Scope {
    kind: ScopeKind,
    buffer: CapturedBuffer,
}

/// Stack of open capture scopes with a shared byte budget.
///
/// The budget counts every byte written during one render, across all
/// scopes; it never shrinks when a scope is popped.
#[derive(Debug)]
pub(crate) struct CaptureStack {
    scopes: Vec<Scope>,
    written: usize,
    max_bytes: usize,
}

impl CaptureStack {
    pub(crate) fn new(max_bytes: usize) -> Self {
        Self {
            scopes: Vec::new(),
            written: 0,
            max_bytes,
        }
    }

    pub(crate) fn push_anonymous(&mut self) {
        self.scopes.push(Scope {
            kind: ScopeKind::Anonymous,
            buffer: CapturedBuffer::default(),
        });
    }

    pub(crate) fn push_section(&mut self, name: String) {
        self.scopes.push(Scope {
            kind: ScopeKind::Section(name),
            buffer: CapturedBuffer::default(),
        });
    }

    /// Appends bytes to the innermost open scope.
    pub(crate) fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if self.written + bytes.len() > self.max_bytes {
            return Err(Error::ResourceExhausted("capture byte limit exceeded"));
        }
        self.written += bytes.len();

        let scope = self
            .scopes
            .last_mut()
            .expect("write outside an open capture scope");
        scope.buffer.append(bytes);
        Ok(())
    }

    /// Pops the innermost scope and hands back its buffer.
    pub(crate) fn pop(&mut self) -> Option<CapturedBuffer> {
        self.scopes.pop().map(|scope| scope.buffer)
    }

    /// Pops the innermost scope, which must be a named section.
    pub(crate) fn pop_section(&mut self) -> Result<(String, CapturedBuffer)> {
        match self.scopes.pop() {
            Some(Scope {
                kind: ScopeKind::Section(name),
                buffer,
            }) => Ok((name, buffer)),
            Some(scope) => {
                self.scopes.push(scope);
                Err(Error::SectionNotOpen)
            }
            None => Err(Error::SectionNotOpen),
        }
    }

    /// Name of the currently open section, if the innermost scope is one.
    pub(crate) fn open_section(&self) -> Option<&str> {
        match &self.scopes.last()?.kind {
            ScopeKind::Section(name) => Some(name),
            ScopeKind::Anonymous => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_land_in_innermost_scope() {
        let mut stack = CaptureStack::new(1024);
        stack.push_anonymous();
        stack.write(b"outer ").unwrap();

        stack.push_section("nested".to_string());
        stack.write(b"inner").unwrap();

        let (name, inner) = stack.pop_section().unwrap();
        assert_eq!(name, "nested");
        assert_eq!(inner.as_bytes(), b"inner");

        stack.write(b"more").unwrap();
        assert_eq!(stack.pop().unwrap().as_bytes(), b"outer more");
    }

    #[test]
    fn test_byte_budget_spans_scopes() {
        let mut stack = CaptureStack::new(8);
        stack.push_anonymous();
        stack.write(b"1234").unwrap();

        stack.push_section("s".to_string());
        stack.write(b"5678").unwrap();

        match stack.write(b"9") {
            Err(Error::ResourceExhausted(_)) => {}
            other => panic!("expected ResourceExhausted, got {:?}", other),
        }
    }

    #[test]
    fn test_pop_section_requires_open_section() {
        let mut stack = CaptureStack::new(1024);
        stack.push_anonymous();
        stack.write(b"kept").unwrap();

        assert!(matches!(stack.pop_section(), Err(Error::SectionNotOpen)));
        // The anonymous scope survives the failed pop.
        assert_eq!(stack.pop().unwrap().as_bytes(), b"kept");
    }

    #[test]
    fn test_open_section_tracks_top_scope() {
        let mut stack = CaptureStack::new(1024);
        stack.push_anonymous();
        assert_eq!(stack.open_section(), None);

        stack.push_section("content".to_string());
        assert_eq!(stack.open_section(), Some("content"));

        stack.pop_section().unwrap();
        assert_eq!(stack.open_section(), None);
    }

    #[test]
    fn test_captured_buffer_into_stream() {
        let mut buffer = CapturedBuffer::default();
        buffer.append(b"payload");
        let stream: BodyStream = buffer.into();
        assert_eq!(stream.as_bytes(), b"payload");
    }
}
