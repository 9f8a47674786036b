use crate::http::headers::HttpHeaders;
use crate::http::status::HttpStatus;
use crate::http::stream::BodyStream;

/// Outgoing HTTP message assembled by the rendering facade.
///
/// The status is a bare `u16` so codes copied from upstream responses pass
/// through unchanged even when this crate has no name for them.
#[derive(Debug)]
pub struct Response {
    pub status: u16,
    pub headers: HttpHeaders,
    pub body: BodyStream,
}

impl Response {
    pub fn new() -> Self {
        Self {
            status: HttpStatus::Ok.code(),
            headers: HttpHeaders::new(),
            body: BodyStream::new(),
        }
    }

    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            ..Self::new()
        }
    }

    /// Replaces the values under a header name with a single value.
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.set(name, value);
    }

    pub fn header(&self, name: &str) -> Option<&[String]> {
        self.headers.get(name)
    }

    /// First value under a header name, the common case for singletons like
    /// `Content-Type`.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .and_then(|values| values.first())
            .map(|v| v.as_str())
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}
