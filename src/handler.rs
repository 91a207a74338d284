use crate::context::Context;
use crate::middleware::Filter;
use crate::response::ResponseSink;
use bytes::Bytes;
use http::{Method, Request, StatusCode};
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// The single capability every route terminal exposes: consume the request
/// context and produce the response as a side effect.
///
/// Any `Fn(&mut Context)` closure or function is a handler:
///
/// ```
/// use routerify_radix::{Context, Router};
/// use routerify_radix::prelude::*;
///
/// fn hello(ctx: &mut Context) {
///     let name = ctx.params().get_string_must("name", "world").to_owned();
///     ctx.write_str(&format!("Hello {}", name));
/// }
///
/// let router = Router::builder().get("/hello/{name}", hello).build().unwrap();
/// # drop(router);
/// ```
pub trait Handler: Send + Sync {
    fn serve(&self, ctx: &mut Context);
}

impl<F> Handler for F
where
    F: Fn(&mut Context) + Send + Sync,
{
    fn serve(&self, ctx: &mut Context) {
        self(ctx)
    }
}

/// Adapts a native `http`-style handler, one that only sees the request and a
/// response sink, into a [`Handler`].
pub struct Wrap<F>(F);

impl<F> Wrap<F>
where
    F: Fn(&Request<Bytes>, &mut dyn ResponseSink) + Send + Sync + 'static,
{
    pub fn new(f: F) -> Wrap<F> {
        Wrap(f)
    }
}

impl<F> Handler for Wrap<F>
where
    F: Fn(&Request<Bytes>, &mut dyn ResponseSink) + Send + Sync + 'static,
{
    fn serve(&self, ctx: &mut Context) {
        let (req, res) = ctx.split_request_response();
        (self.0)(req, res)
    }
}

impl<F> Debug for Wrap<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("Wrap")
    }
}

/// A handler answering every request with `200 OK` and the given text.
pub fn ok(text: impl Into<String>) -> impl Handler {
    let text = text.into();
    move |ctx: &mut Context| {
        ctx.write_header(StatusCode::OK);
        ctx.write_str(&text);
    }
}

/// A handler answering every request with an empty body and the given status.
pub fn status(status: StatusCode) -> impl Handler {
    move |ctx: &mut Context| ctx.write_header(status)
}

/// A resource with one entry point per HTTP method.
///
/// Every method defaults to `501 Not Implemented`. [`prepare`](Controller::prepare)
/// runs before any of them and ends the request when it returns `false`.
/// Register one with [`Routes::controller`](crate::Routes::controller).
pub trait Controller: Send + Sync + 'static {
    fn prepare(&self, _ctx: &mut Context) -> bool {
        true
    }

    fn options(&self, ctx: &mut Context) {
        ctx.on_error(StatusCode::NOT_IMPLEMENTED);
    }

    fn get(&self, ctx: &mut Context) {
        ctx.on_error(StatusCode::NOT_IMPLEMENTED);
    }

    fn head(&self, ctx: &mut Context) {
        ctx.on_error(StatusCode::NOT_IMPLEMENTED);
    }

    fn post(&self, ctx: &mut Context) {
        ctx.on_error(StatusCode::NOT_IMPLEMENTED);
    }

    fn put(&self, ctx: &mut Context) {
        ctx.on_error(StatusCode::NOT_IMPLEMENTED);
    }

    fn delete(&self, ctx: &mut Context) {
        ctx.on_error(StatusCode::NOT_IMPLEMENTED);
    }

    fn trace(&self, ctx: &mut Context) {
        ctx.on_error(StatusCode::NOT_IMPLEMENTED);
    }

    fn connect(&self, ctx: &mut Context) {
        ctx.on_error(StatusCode::NOT_IMPLEMENTED);
    }

    fn patch(&self, ctx: &mut Context) {
        ctx.on_error(StatusCode::NOT_IMPLEMENTED);
    }
}

/// Dispatches to the controller method for one fixed HTTP method.
pub(crate) struct ControllerHandler {
    controller: Arc<dyn Controller>,
    method: Method,
}

impl ControllerHandler {
    pub(crate) fn new(controller: Arc<dyn Controller>, method: Method) -> ControllerHandler {
        ControllerHandler { controller, method }
    }
}

impl Handler for ControllerHandler {
    fn serve(&self, ctx: &mut Context) {
        let c = &self.controller;
        match self.method {
            Method::OPTIONS => c.options(ctx),
            Method::GET => c.get(ctx),
            Method::HEAD => c.head(ctx),
            Method::POST => c.post(ctx),
            Method::PUT => c.put(ctx),
            Method::DELETE => c.delete(ctx),
            Method::TRACE => c.trace(ctx),
            Method::CONNECT => c.connect(ctx),
            Method::PATCH => c.patch(ctx),
            _ => ctx.on_error(StatusCode::NOT_IMPLEMENTED),
        }
    }
}

/// Runs [`Controller::prepare`] in front of the controller's routes.
pub(crate) struct ControllerFilter {
    controller: Arc<dyn Controller>,
}

impl ControllerFilter {
    pub(crate) fn new(controller: Arc<dyn Controller>) -> ControllerFilter {
        ControllerFilter { controller }
    }
}

impl Filter for ControllerFilter {
    fn filter(&self, ctx: &mut Context, next: &dyn Handler) {
        if self.controller.prepare(ctx) {
            next.serve(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::FilterChain;
    use crate::response::ResponseWriter;

    fn request(method: Method) -> Request<Bytes> {
        Request::builder().method(method).uri("/").body(Bytes::new()).unwrap()
    }

    #[test]
    fn wrap_sees_request_and_sink() {
        let h = Wrap::new(|req: &Request<Bytes>, res: &mut dyn ResponseSink| {
            res.write_header(StatusCode::ACCEPTED);
            res.write(req.method().as_str().as_bytes());
        });
        let mut ctx = Context::detached(request(Method::PUT));
        h.serve(&mut ctx);
        assert_eq!(ctx.response().status(), StatusCode::ACCEPTED);
        assert_eq!(ctx.response().body(), b"PUT");
    }

    #[test]
    fn result_handlers() {
        let mut ctx = Context::detached(request(Method::GET));
        ok("fine").serve(&mut ctx);
        assert_eq!(ctx.response().body(), b"fine");

        let mut ctx = Context::detached(request(Method::GET));
        status(StatusCode::NO_CONTENT).serve(&mut ctx);
        assert_eq!(ctx.response().status(), StatusCode::NO_CONTENT);
        assert!(ctx.response().body().is_empty());
    }

    struct Users {
        allow: bool,
    }

    impl Controller for Users {
        fn prepare(&self, ctx: &mut Context) -> bool {
            if !self.allow {
                ctx.on_error(StatusCode::FORBIDDEN);
            }
            self.allow
        }

        fn get(&self, ctx: &mut Context) {
            ctx.write_str("list users");
        }
    }

    fn serve_controller(controller: Arc<dyn Controller>, method: Method) -> ResponseWriter {
        let chain = FilterChain::new(Arc::new(ControllerHandler::new(controller.clone(), method.clone())))
            .with_filters(vec![Arc::new(ControllerFilter::new(controller)) as Arc<dyn Filter>]);
        let mut ctx = Context::detached(request(method));
        chain.serve(&mut ctx);
        ctx.take_response()
    }

    #[test]
    fn controller_dispatches_by_method() {
        let users: Arc<dyn Controller> = Arc::new(Users { allow: true });
        let res = serve_controller(users.clone(), Method::GET);
        assert_eq!(res.body(), b"list users");

        let res = serve_controller(users, Method::POST);
        assert_eq!(res.status(), StatusCode::NOT_IMPLEMENTED);
    }

    #[test]
    fn controller_prepare_short_circuits() {
        let res = serve_controller(Arc::new(Users { allow: false }), Method::GET);
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        assert_eq!(res.body(), b"Forbidden");
    }
}
