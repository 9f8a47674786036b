/// Status codes the rendering facade emits on its own.
///
/// [`Response`](crate::http::response::Response) keeps its status as a bare
/// `u16` so codes imported from an upstream response survive untouched; this
/// enum only names the codes this crate produces itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpStatus {
    Ok = 200,

    MovedPermanently = 301,
    Found = 302,
    SeeOther = 303,
    TemporaryRedirect = 307,
    PermanentRedirect = 308,
}

impl HttpStatus {
    pub fn code(self) -> u16 {
        self as u16
    }
}
