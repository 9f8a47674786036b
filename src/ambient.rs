//! Explicit stand-in for process-global response state.
//!
//! Web runtimes often keep the outgoing status code and header lines in
//! hidden process state. [`AmbientState`] models that state as a plain value
//! the caller owns and threads through
//! [`Renderer::render_view`](crate::renderer::Renderer::render_view), so
//! nothing here touches globals. An [`AmbientSnapshot`] preserves a point in
//! time to roll back to after a render.
//!
//! Once the state is committed (headers on the wire) it can no longer be
//! rolled back or cleared; both operations report that instead of failing.

use indexmap::IndexMap;
use log::warn;

use crate::http::headers::Header;

/// Mutable response-side transport state: status code plus raw header lines.
#[derive(Debug)]
pub struct AmbientState {
    status: u16,
    lines: Vec<String>,
    committed: bool,
}

impl AmbientState {
    pub fn new() -> Self {
        Self {
            status: 200,
            lines: Vec::new(),
            committed: false,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    /// Stages a raw header line such as `"X-Frame-Options: DENY"`.
    pub fn add_header_line(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    pub fn header_lines(&self) -> &[String] {
        &self.lines
    }

    /// Marks the state as sent. Irreversible; from here on `restore` and
    /// `clear` refuse to run.
    pub fn commit(&mut self) {
        self.committed = true;
    }

    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// Saves the current status and header lines for a later [`restore`].
    ///
    /// [`restore`]: AmbientState::restore
    pub fn capture(&self) -> AmbientSnapshot {
        AmbientSnapshot {
            status: self.status,
            lines: self.lines.clone(),
        }
    }

    /// Header lines currently staged, parsed and grouped by trimmed name.
    ///
    /// Lines sharing a name contribute their values in line order.
    pub fn new_headers(&self) -> IndexMap<String, Vec<String>> {
        group_lines(&self.lines)
    }

    /// Rolls status and header lines back to a snapshot.
    ///
    /// Returns `false` without touching anything when the state is already
    /// committed.
    pub fn restore(&mut self, snapshot: &AmbientSnapshot) -> bool {
        if self.committed {
            warn!("ambient state already committed, restore skipped");
            return false;
        }
        self.status = snapshot.status;
        self.lines = snapshot.lines.clone();
        true
    }

    /// Resets to status 200 with no header lines, under the same committed
    /// guard as [`restore`](AmbientState::restore).
    pub fn clear(&mut self) -> bool {
        if self.committed {
            warn!("ambient state already committed, clear skipped");
            return false;
        }
        self.status = 200;
        self.lines.clear();
        true
    }
}

impl Default for AmbientState {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of an [`AmbientState`]'s status and header lines.
#[derive(Debug, Clone)]
pub struct AmbientSnapshot {
    status: u16,
    lines: Vec<String>,
}

impl AmbientSnapshot {
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Saved header lines, parsed and grouped like
    /// [`AmbientState::new_headers`].
    pub fn headers(&self) -> IndexMap<String, Vec<String>> {
        group_lines(&self.lines)
    }
}

fn group_lines(lines: &[String]) -> IndexMap<String, Vec<String>> {
    let mut headers: IndexMap<String, Vec<String>> = IndexMap::new();
    for line in lines {
        let header = Header::parse(line);
        headers
            .entry(header.name().trim().to_string())
            .or_default()
            .extend(header.values().iter().cloned());
    }
    headers
}
