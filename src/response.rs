use bytes::{Bytes, BytesMut};
use http::{HeaderMap, Response, StatusCode};
use http_body_util::Full;
use std::io;

/// The response side of a request as seen by handlers: headers, a status line
/// that can be written once, and a body.
pub trait ResponseSink {
    fn headers(&self) -> &HeaderMap;

    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Sets the status. Only the first call has an effect.
    fn write_header(&mut self, status: StatusCode);

    /// Appends to the body, implicitly committing a `200 OK` status line if
    /// none was written yet.
    fn write(&mut self, data: &[u8]);

    fn status(&self) -> StatusCode;

    /// Whether the status line or any body bytes have been written.
    fn written(&self) -> bool;
}

/// A buffering [`ResponseSink`] recycled between requests.
///
/// It is converted into an [`http::Response`] once the filter chain returns.
#[derive(Debug)]
pub struct ResponseWriter {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
    wrote_header: bool,
}

impl ResponseWriter {
    pub fn new() -> ResponseWriter {
        ResponseWriter {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
            wrote_header: false,
        }
    }

    /// The body bytes written so far.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Restores the writer to its freshly constructed state, keeping allocations.
    pub(crate) fn reset(&mut self) {
        self.status = StatusCode::OK;
        self.headers.clear();
        self.body.clear();
        self.wrote_header = false;
    }

    /// Moves the buffered status, headers and body out into a response.
    pub(crate) fn take_response(&mut self) -> Response<Full<Bytes>> {
        let mut res = Response::new(Full::new(self.body.split().freeze()));
        *res.status_mut() = self.status;
        *res.headers_mut() = std::mem::take(&mut self.headers);
        res
    }
}

impl Default for ResponseWriter {
    fn default() -> Self {
        ResponseWriter::new()
    }
}

impl ResponseSink for ResponseWriter {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_header(&mut self, status: StatusCode) {
        if self.wrote_header {
            tracing::warn!(
                current = self.status.as_u16(),
                ignored = status.as_u16(),
                "response status written more than once"
            );
            return;
        }
        self.status = status;
        self.wrote_header = true;
    }

    fn write(&mut self, data: &[u8]) {
        if !self.wrote_header {
            self.write_header(StatusCode::OK);
        }
        self.body.extend_from_slice(data);
    }

    fn status(&self) -> StatusCode {
        self.status
    }

    fn written(&self) -> bool {
        self.wrote_header || !self.body.is_empty()
    }
}

impl io::Write for ResponseWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        ResponseSink::write(self, buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::CONTENT_TYPE;
    use http_body_util::BodyExt;
    use std::io::Write;

    #[test]
    fn write_commits_200() {
        let mut w = ResponseWriter::new();
        assert!(!w.written());
        ResponseSink::write(&mut w, b"hello");
        assert!(w.written());
        assert_eq!(w.status(), StatusCode::OK);
    }

    #[test]
    fn first_status_wins() {
        let mut w = ResponseWriter::new();
        w.write_header(StatusCode::NOT_FOUND);
        w.write_header(StatusCode::OK);
        assert_eq!(w.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn io_write_appends_to_body() {
        let mut w = ResponseWriter::new();
        write!(w, "{}-{}", 1, 2).unwrap();
        assert_eq!(w.body(), b"1-2");
    }

    #[test]
    fn reset_forgets_everything() {
        let mut w = ResponseWriter::new();
        w.headers_mut().insert(CONTENT_TYPE, "text/plain".parse().unwrap());
        w.write_header(StatusCode::CREATED);
        ResponseSink::write(&mut w, b"x");
        w.reset();
        assert!(!w.written());
        assert_eq!(w.status(), StatusCode::OK);
        assert!(w.headers().is_empty());
        assert!(w.body().is_empty());
    }

    #[tokio::test]
    async fn converts_into_response() {
        let mut w = ResponseWriter::new();
        w.headers_mut().insert(CONTENT_TYPE, "text/plain".parse().unwrap());
        w.write_header(StatusCode::CREATED);
        ResponseSink::write(&mut w, b"made");

        let res = w.take_response();
        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(res.headers()[CONTENT_TYPE], "text/plain");
        let body = res.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"made");
        assert!(w.body().is_empty());
    }
}
