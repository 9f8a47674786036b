pub mod factory;
pub mod headers;
pub mod response;
pub mod status;
pub mod stream;

pub use factory::{HttpFactory, ResponseFactory, StreamFactory};
pub use headers::{Header, HttpHeaders};
pub use response::Response;
pub use status::HttpStatus;
pub use stream::BodyStream;
