use crate::config::RouterConfig;
use crate::context::Context;
use crate::error::MatchError;
use crate::handler::Handler;
use crate::helpers;
use crate::middleware::{serve_wrapped, BoxedFilter, Logger};
use crate::pool::Pool;
use crate::response::{ResponseSink, ResponseWriter};
use crate::route::Leaf;
use crate::tree::Node;
use bytes::Bytes;
use http::header::ALLOW;
use http::{HeaderValue, Request, Response, StatusCode};
use http_body_util::Full;
use std::borrow::Cow;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

pub use self::builder::{Group, RouterBuilder, Routes};

mod builder;

/// A sealed routing table, ready to serve requests.
///
/// A `Router` is produced by [`RouterBuilder::build`] and never changes
/// afterwards, so it can be shared between any number of connections behind
/// an `Arc` without locking. Serve it through a [`RouterService`](crate::RouterService)
/// or call [`handle`](Router::handle) directly.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use http::{Request, StatusCode};
/// use routerify_radix::prelude::*;
/// use routerify_radix::{Context, Router};
///
/// let router = Router::builder()
///     .get("/users/{id:\\d+}", |ctx: &mut Context| {
///         let id = ctx.params().get_int_must("id", 0);
///         ctx.write_str(&format!("user {}", id));
///     })
///     .build()
///     .unwrap();
///
/// let res = router.handle(Request::get("/users/42").body(Bytes::new()).unwrap());
/// assert_eq!(res.status(), StatusCode::OK);
///
/// let res = router.handle(Request::get("/users/jack").body(Bytes::new()).unwrap());
/// assert_eq!(res.status(), StatusCode::NOT_FOUND);
/// ```
pub struct Router {
    root: Node,
    filters: Vec<BoxedFilter>,
    config: RouterConfig,
    logger: Arc<dyn Logger>,
    max_params: usize,
    contexts: Pool<Context>,
    writers: Pool<ResponseWriter>,
}

impl Router {
    /// Return a [RouterBuilder](./struct.RouterBuilder.html) instance to build a `Router`.
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    pub(crate) fn new(root: Node, filters: Vec<BoxedFilter>, config: RouterConfig, logger: Arc<dyn Logger>) -> Router {
        let max_params = root.max_params();
        let context_logger = logger.clone();
        let contexts = Pool::new(config.pool_capacity, move || {
            Context::new(max_params, context_logger.clone())
        });
        let writers = Pool::new(config.pool_capacity, ResponseWriter::new);

        let router = Router {
            root,
            filters,
            config,
            logger,
            max_params,
            contexts,
            writers,
        };
        tracing::debug!(
            routes = router.leaves().len(),
            max_params,
            filters = router.filters.len(),
            env = %router.config.env,
            "router sealed"
        );
        router
    }

    /// Routes one request and returns the response produced for it.
    ///
    /// The router level filters wrap the whole dispatch, so they also observe
    /// the `400`, `404` and `405` answers produced by the router itself.
    pub fn handle(&self, req: Request<Bytes>) -> Response<Full<Bytes>> {
        let mut checkout = Checkout::new(self);
        let ctx = checkout.ctx();

        let path = self.normalize_path(req.uri().path());
        let malformed = path.is_none();
        ctx.set_path(path.as_deref().unwrap_or_else(|| req.uri().path()));

        let writer = self.writers.acquire();
        ctx.attach(req, writer);

        let dispatch = Dispatch {
            root: &self.root,
            malformed,
        };
        serve_wrapped(&self.filters, &dispatch, ctx);

        ctx.response_mut().take_response()
    }

    /// Percent-decodes (when enabled) and strips one trailing slash. `None`
    /// when the path does not decode to UTF-8.
    fn normalize_path<'a>(&self, raw: &'a str) -> Option<Cow<'a, str>> {
        let decoded = if self.config.decode_path {
            helpers::percent_decode_request_path(raw).ok()?
        } else {
            Cow::Borrowed(raw)
        };
        Some(match decoded {
            Cow::Borrowed(path) => Cow::Borrowed(helpers::trim_trailing_slash(path)),
            Cow::Owned(path) => Cow::Owned(helpers::trim_trailing_slash(&path).to_owned()),
        })
    }

    /// Every registered route, for documentation and diagnostics.
    ///
    /// Leaves sharing a path come ordered by method; paths come in tree
    /// order, static branches before parameter ones.
    pub fn leaves(&self) -> Vec<&Leaf> {
        let mut out = Vec::new();
        self.root.collect_leaves(&mut out);
        out
    }

    /// The size of the params buffer every request context is created with.
    pub fn max_params(&self) -> usize {
        self.max_params
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }
}

impl Debug for Router {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ routes: {:?}, filters: {}, max_params: {}, config: {:?} }}",
            self.leaves(),
            self.filters.len(),
            self.max_params,
            self.config
        )
    }
}

/// A context checked out of the router's pools for one request.
///
/// Dropping it, on return or while unwinding, resets the context and its
/// response writer and hands both back.
struct Checkout<'r> {
    router: &'r Router,
    ctx: Option<Context>,
}

impl<'r> Checkout<'r> {
    fn new(router: &'r Router) -> Checkout<'r> {
        Checkout {
            router,
            ctx: Some(router.contexts.acquire()),
        }
    }

    fn ctx(&mut self) -> &mut Context {
        let contexts = &self.router.contexts;
        self.ctx.get_or_insert_with(|| contexts.acquire())
    }
}

impl Drop for Checkout<'_> {
    fn drop(&mut self) {
        let mut ctx = match self.ctx.take() {
            Some(ctx) => ctx,
            None => return,
        };
        let mut writer = ctx.take_response();
        writer.reset();
        ctx.reset();
        self.router.writers.release(writer);
        self.router.contexts.release(ctx);
    }
}

/// The innermost handler of the router level chain: matches the tree and
/// serves the leaf, or reports why it could not.
struct Dispatch<'r> {
    root: &'r Node,
    malformed: bool,
}

impl Handler for Dispatch<'_> {
    fn serve(&self, ctx: &mut Context) {
        if self.malformed {
            tracing::trace!(path = ctx.request().uri().path(), "undecodable request path");
            ctx.on_error(StatusCode::BAD_REQUEST);
            return;
        }

        let found = {
            let (method, path, params) = ctx.route_parts();
            self.root.find(method, path, params)
        };
        match found {
            Ok(leaf) => {
                tracing::trace!(method = %leaf.method(), route = leaf.path(), "matched");
                leaf.serve(ctx);
            }
            Err(MatchError::NotFound) => {
                tracing::trace!(path = ctx.path(), "no route");
                ctx.on_error(StatusCode::NOT_FOUND);
            }
            Err(err) => {
                tracing::trace!(path = ctx.path(), %err, "method not allowed");
                if let Some(allow) = err.allow_header().and_then(|a| HeaderValue::from_str(&a).ok()) {
                    ctx.response_mut().headers_mut().insert(ALLOW, allow);
                }
                ctx.on_error(StatusCode::METHOD_NOT_ALLOWED);
            }
        }
    }
}
