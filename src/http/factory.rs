//! Factories the rendering facade uses to mint responses and body streams.

use std::path::Path;

use crate::error::Result;
use crate::http::response::Response;
use crate::http::stream::BodyStream;

/// Mints empty responses with a given status code.
pub trait ResponseFactory {
    fn create_response(&self, status: u16) -> Response;
}

/// Mints body streams from raw bytes or file contents.
pub trait StreamFactory {
    fn create_stream(&self, bytes: Vec<u8>) -> BodyStream;

    fn create_stream_from_file(&self, path: &Path) -> Result<BodyStream>;
}

/// Default factory backed by this crate's own message types.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpFactory;

impl ResponseFactory for HttpFactory {
    fn create_response(&self, status: u16) -> Response {
        Response::with_status(status)
    }
}

impl StreamFactory for HttpFactory {
    fn create_stream(&self, bytes: Vec<u8>) -> BodyStream {
        BodyStream::from_bytes(bytes)
    }

    fn create_stream_from_file(&self, path: &Path) -> Result<BodyStream> {
        BodyStream::from_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_response_carries_status() {
        let response = HttpFactory.create_response(404);
        assert_eq!(response.status, 404);
        assert!(response.body.is_empty());
    }

    #[test]
    fn test_create_stream_wraps_bytes() {
        let stream = HttpFactory.create_stream(b"payload".to_vec());
        assert_eq!(stream.as_bytes(), b"payload");
    }
}
