use crate::middleware::{Logger, TracingLogger};
use crate::params::Params;
use crate::response::{ResponseSink, ResponseWriter};
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE, LOCATION};
use http::{Method, Request, StatusCode};
use std::any::Any;
use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::net::SocketAddr;
use std::sync::Arc;

/// A custom error responder, see [`Context::set_error_handler`].
///
/// It receives the status being reported and the optional detail passed to
/// [`Context::on_error_with`].
pub type ErrorHandler = Arc<dyn Fn(&mut Context, StatusCode, Option<&str>) + Send + Sync>;

/// The per-request state handed to every filter and handler.
///
/// A context is owned by exactly one in-flight request. The router recycles
/// contexts through a [`Pool`](crate::Pool) and resets them in between, so
/// nothing set on a context outlives the request that set it.
pub struct Context {
    request: Request<Bytes>,
    response: ResponseWriter,
    params: Params,
    path: String,
    data: Option<HashMap<String, Box<dyn Any + Send + Sync>>>,
    err_handlers: Option<HashMap<StatusCode, ErrorHandler>>,
    err_4xx: Option<ErrorHandler>,
    err_5xx: Option<ErrorHandler>,
    logger: Arc<dyn Logger>,
}

impl Context {
    /// An idle context whose params buffer holds `max_params` bindings.
    pub(crate) fn new(max_params: usize, logger: Arc<dyn Logger>) -> Context {
        Context {
            request: Request::default(),
            response: ResponseWriter::new(),
            params: Params::with_capacity(max_params),
            path: String::new(),
            data: None,
            err_handlers: None,
            err_4xx: None,
            err_5xx: None,
            logger,
        }
    }

    /// A context bound to `req` outside of any router, for driving filters
    /// and handlers directly.
    pub fn detached(req: Request<Bytes>) -> Context {
        let mut ctx = Context::new(0, Arc::new(TracingLogger));
        ctx.path.push_str(req.uri().path());
        ctx.request = req;
        ctx
    }

    pub(crate) fn attach(&mut self, req: Request<Bytes>, response: ResponseWriter) {
        self.request = req;
        self.response = response;
    }

    /// Hands the response writer back, leaving an empty one in its place.
    pub(crate) fn take_response(&mut self) -> ResponseWriter {
        std::mem::take(&mut self.response)
    }

    /// Restores the context to its freshly constructed state. Only capacity
    /// survives: the params buffer is truncated, not freed.
    pub(crate) fn reset(&mut self) {
        self.request = Request::default();
        self.response.reset();
        self.params.clear();
        self.path.clear();
        self.data = None;
        self.err_handlers = None;
        self.err_4xx = None;
        self.err_5xx = None;
    }

    pub(crate) fn set_path(&mut self, path: &str) {
        self.path.clear();
        self.path.push_str(path);
    }

    /// Borrows what matching needs: the method and path to read and the
    /// params buffer to bind into.
    pub(crate) fn route_parts(&mut self) -> (&Method, &str, &mut Params) {
        (self.request.method(), &self.path, &mut self.params)
    }

    pub(crate) fn split_request_response(&mut self) -> (&Request<Bytes>, &mut dyn ResponseSink) {
        (&self.request, &mut self.response)
    }

    pub fn request(&self) -> &Request<Bytes> {
        &self.request
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    /// The decoded, normalised path the router matched against.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The peer address, when the request came in through a
    /// [`RequestService`](crate::RequestService).
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.request.extensions().get::<SocketAddr>().copied()
    }

    pub fn response(&self) -> &ResponseWriter {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut ResponseWriter {
        &mut self.response
    }

    /// The parameters bound by the matched route.
    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    pub fn write(&mut self, data: &[u8]) {
        self.response.write(data);
    }

    pub fn write_str(&mut self, s: &str) {
        self.response.write(s.as_bytes());
    }

    pub fn write_header(&mut self, status: StatusCode) {
        self.response.write_header(status);
    }

    /// Replaces a response header. Invalid names or values are logged and
    /// dropped.
    pub fn set_header(&mut self, name: &str, value: &str) {
        match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                self.response.headers_mut().insert(name, value);
            }
            _ => tracing::warn!(name, value, "ignoring invalid response header"),
        }
    }

    /// Points the client at `location` with a redirection status.
    pub fn redirect(&mut self, location: &str, status: StatusCode) {
        match HeaderValue::from_str(location) {
            Ok(value) => {
                self.response.headers_mut().insert(LOCATION, value);
                self.write_header(status);
            }
            Err(_) => {
                tracing::warn!(location, "invalid redirect location");
                self.on_error(StatusCode::INTERNAL_SERVER_ERROR);
            }
        }
    }

    /// Stores a request-scoped value under `key`, replacing any previous
    /// value. The map is allocated on first use.
    pub fn set<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.data.get_or_insert_with(HashMap::new).insert(key.into(), Box::new(value));
    }

    /// The value stored under `key`, if there is one and it is a `T`.
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.get_ok(key).and_then(|value| value.downcast_ref::<T>())
    }

    /// The value stored under `key`, whatever its type.
    pub fn get_ok(&self, key: &str) -> Option<&(dyn Any + Send + Sync)> {
        self.data.as_ref()?.get(key).map(|value| &**value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get_ok(key).is_some()
    }

    /// Removes and returns the value stored under `key`.
    pub fn delete(&mut self, key: &str) -> Option<Box<dyn Any + Send + Sync>> {
        self.data.as_mut()?.remove(key)
    }

    /// Registers a responder for `status`, consulted first by [`on_error`](Context::on_error).
    pub fn set_error_handler<F>(&mut self, status: StatusCode, handler: F)
    where
        F: Fn(&mut Context, StatusCode, Option<&str>) + Send + Sync + 'static,
    {
        self.err_handlers
            .get_or_insert_with(HashMap::new)
            .insert(status, Arc::new(handler));
    }

    /// Registers a responder for every 4xx status without a specific handler.
    pub fn set_4xx_handler<F>(&mut self, handler: F)
    where
        F: Fn(&mut Context, StatusCode, Option<&str>) + Send + Sync + 'static,
    {
        self.err_4xx = Some(Arc::new(handler));
    }

    /// Registers a responder for every 5xx status without a specific handler.
    pub fn set_5xx_handler<F>(&mut self, handler: F)
    where
        F: Fn(&mut Context, StatusCode, Option<&str>) + Send + Sync + 'static,
    {
        self.err_5xx = Some(Arc::new(handler));
    }

    /// Reports an HTTP error. See [`on_error_with`](Context::on_error_with).
    pub fn on_error(&mut self, status: StatusCode) {
        self.report(status, None)
    }

    /// Reports an HTTP error with a detail message.
    ///
    /// Statuses below 400 are ignored. A handler registered for the exact
    /// status wins, then the 4xx/5xx class handler. Without either, the
    /// status line and `detail` (or the canonical reason) are written, unless
    /// the response has already been written to.
    pub fn on_error_with(&mut self, status: StatusCode, detail: &str) {
        self.report(status, Some(detail))
    }

    fn report(&mut self, status: StatusCode, detail: Option<&str>) {
        if !status.is_client_error() && !status.is_server_error() {
            return;
        }

        let handler = self
            .err_handlers
            .as_ref()
            .and_then(|handlers| handlers.get(&status))
            .or(if status.is_client_error() {
                self.err_4xx.as_ref()
            } else {
                self.err_5xx.as_ref()
            })
            .cloned();
        if let Some(handler) = handler {
            handler(self, status, detail);
            return;
        }

        if self.response.written() {
            return;
        }
        let text = detail.or(status.canonical_reason()).unwrap_or(status.as_str());
        self.response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
        self.response.write_header(status);
        self.response.write(text.as_bytes());
    }
}

impl Debug for Context {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ method: {}, path: {:?}, params: {:?}, status: {} }}",
            self.request.method(),
            self.path,
            self.params,
            self.response.status()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> Context {
        Context::detached(Request::builder().uri("/users/7").body(Bytes::new()).unwrap())
    }

    fn body(ctx: &Context) -> &str {
        std::str::from_utf8(ctx.response().body()).unwrap()
    }

    #[derive(Clone, Debug, PartialEq)]
    struct User(&'static str);

    #[test]
    fn default_error_uses_status_text() {
        let mut ctx = ctx();
        ctx.on_error(StatusCode::NOT_FOUND);
        assert_eq!(ctx.response().status(), StatusCode::NOT_FOUND);
        assert_eq!(body(&ctx), "Not Found");
        assert_eq!(ctx.response().headers()[CONTENT_TYPE], "text/plain; charset=utf-8");
    }

    #[test]
    fn detail_replaces_status_text() {
        let mut ctx = ctx();
        ctx.on_error_with(StatusCode::BAD_REQUEST, "missing id");
        assert_eq!(body(&ctx), "missing id");
    }

    #[test]
    fn non_error_status_is_ignored() {
        let mut ctx = ctx();
        ctx.on_error(StatusCode::FOUND);
        assert!(!ctx.response().written());
    }

    #[test]
    fn does_not_write_over_a_started_response() {
        let mut ctx = ctx();
        ctx.write_str("partial");
        ctx.on_error(StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ctx.response().status(), StatusCode::OK);
        assert_eq!(body(&ctx), "partial");
    }

    #[test]
    fn specific_handler_beats_class_handler() {
        let mut ctx = ctx();
        ctx.set_4xx_handler(|ctx: &mut Context, status: StatusCode, _: Option<&str>| {
            ctx.write_header(status);
            ctx.write_str("class");
        });
        ctx.set_error_handler(StatusCode::NOT_FOUND, |ctx: &mut Context, _: StatusCode, detail: Option<&str>| {
            ctx.write_header(StatusCode::NOT_FOUND);
            ctx.write_str(detail.unwrap_or("specific"));
        });
        ctx.on_error(StatusCode::NOT_FOUND);
        assert_eq!(body(&ctx), "specific");

        let mut other = self::ctx();
        other.set_4xx_handler(|ctx: &mut Context, status: StatusCode, _: Option<&str>| {
            ctx.write_header(status);
            ctx.write_str("class");
        });
        other.on_error(StatusCode::FORBIDDEN);
        assert_eq!(other.response().status(), StatusCode::FORBIDDEN);
        assert_eq!(body(&other), "class");

        other.reset();
        other.on_error(StatusCode::FORBIDDEN);
        assert_eq!(body(&other), "Forbidden");
    }

    #[test]
    fn scratch_store_is_keyed() {
        let mut ctx = ctx();
        assert!(!ctx.contains("user"));
        assert!(ctx.data.is_none());

        ctx.set("user", String::from("user-jack"));
        ctx.set("token", String::from("token-xyz"));
        ctx.set("visits", 3u32);
        assert_eq!(ctx.get::<String>("user").map(String::as_str), Some("user-jack"));
        assert_eq!(ctx.get::<String>("token").map(String::as_str), Some("token-xyz"));
        assert_eq!(ctx.get::<u32>("visits"), Some(&3));
        assert!(ctx.get::<u64>("visits").is_none());
        assert!(ctx.get_ok("visits").is_some());

        ctx.set("user", User("rose"));
        assert_eq!(ctx.get::<User>("user"), Some(&User("rose")));

        let removed = ctx.delete("token").and_then(|value| value.downcast::<String>().ok());
        assert_eq!(removed.as_deref().map(String::as_str), Some("token-xyz"));
        assert!(!ctx.contains("token"));
        assert!(ctx.delete("token").is_none());
    }

    #[test]
    fn reset_is_idempotent_and_leak_free() {
        let mut ctx = Context::new(4, Arc::new(TracingLogger));
        let cap = ctx.params().capacity();
        for round in 0..3 {
            assert!(ctx.params().is_empty());
            assert!(!ctx.contains("user"));
            assert!(ctx.data.is_none());
            assert!(!ctx.response().written());

            ctx.attach(Request::new(Bytes::new()), ResponseWriter::new());
            ctx.params.push(Arc::from("id"), &round.to_string());
            ctx.set("user", User("jack"));
            ctx.set_error_handler(StatusCode::NOT_FOUND, |_: &mut Context, _: StatusCode, _: Option<&str>| {});
            ctx.write_str("hello");

            ctx.reset();
            ctx.reset();
            assert_eq!(ctx.params().capacity(), cap);
        }
        ctx.on_error(StatusCode::NOT_FOUND);
        assert_eq!(body(&ctx), "Not Found");
    }

    #[test]
    fn redirect_sets_location() {
        let mut ctx = ctx();
        ctx.redirect("/login", StatusCode::SEE_OTHER);
        assert_eq!(ctx.response().status(), StatusCode::SEE_OTHER);
        assert_eq!(ctx.response().headers()[LOCATION], "/login");
    }

    #[test]
    fn request_accessors() {
        let mut req = Request::builder()
            .method(Method::POST)
            .uri("/users/7?x=1")
            .body(Bytes::new())
            .unwrap();
        req.extensions_mut().insert(SocketAddr::from(([127, 0, 0, 1], 9000)));
        let mut ctx = Context::detached(req);
        assert_eq!(*ctx.method(), Method::POST);
        assert_eq!(ctx.path(), "/users/7");
        assert_eq!(ctx.remote_addr(), Some(SocketAddr::from(([127, 0, 0, 1], 9000))));

        ctx.set_header("x-request-id", "abc");
        ctx.set_header("bad header", "abc");
        assert_eq!(ctx.response().headers().len(), 1);
    }
}
