use crate::config::RouterConfig;
use crate::constants::{self, METHODS};
use crate::handler::{Controller, ControllerFilter, ControllerHandler, Handler};
use crate::middleware::{BoxedFilter, Logger, TracingLogger};
use crate::route::Leaf;
use crate::router::Router;
use crate::tree::pattern::Pattern;
use crate::tree::Node;
use crate::Error;
use http::Method;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// The route registration surface shared by [`RouterBuilder`] and [`Group`].
///
/// Only [`add_boxed_route`](Routes::add_boxed_route) has to be implemented;
/// every other method funnels into it.
pub trait Routes: Sized {
    /// Registers `handler` for `method` at `pattern`, wrapped in `filters`
    /// (outermost first).
    fn add_boxed_route(
        self,
        method: Method,
        pattern: &str,
        handler: Arc<dyn Handler>,
        filters: Vec<BoxedFilter>,
    ) -> Self;

    /// Registers a route with route-local filters.
    fn add_route<H>(self, method: Method, pattern: &str, handler: H, filters: Vec<BoxedFilter>) -> Self
    where
        H: Handler + 'static,
    {
        self.add_boxed_route(method, pattern, Arc::new(handler), filters)
    }

    fn route<H>(self, method: Method, pattern: &str, handler: H) -> Self
    where
        H: Handler + 'static,
    {
        self.add_route(method, pattern, handler, Vec::new())
    }

    /// Adds a new route with `GET` method and the handler at the specified path.
    fn get<H: Handler + 'static>(self, pattern: &str, handler: H) -> Self {
        self.route(Method::GET, pattern, handler)
    }

    /// Adds a new route with `POST` method and the handler at the specified path.
    fn post<H: Handler + 'static>(self, pattern: &str, handler: H) -> Self {
        self.route(Method::POST, pattern, handler)
    }

    /// Adds a new route with `PUT` method and the handler at the specified path.
    fn put<H: Handler + 'static>(self, pattern: &str, handler: H) -> Self {
        self.route(Method::PUT, pattern, handler)
    }

    /// Adds a new route with `DELETE` method and the handler at the specified path.
    fn delete<H: Handler + 'static>(self, pattern: &str, handler: H) -> Self {
        self.route(Method::DELETE, pattern, handler)
    }

    /// Adds a new route with `PATCH` method and the handler at the specified path.
    fn patch<H: Handler + 'static>(self, pattern: &str, handler: H) -> Self {
        self.route(Method::PATCH, pattern, handler)
    }

    /// Adds a new route with `HEAD` method and the handler at the specified path.
    fn head<H: Handler + 'static>(self, pattern: &str, handler: H) -> Self {
        self.route(Method::HEAD, pattern, handler)
    }

    /// Adds a new route with `OPTIONS` method and the handler at the specified path.
    fn options<H: Handler + 'static>(self, pattern: &str, handler: H) -> Self {
        self.route(Method::OPTIONS, pattern, handler)
    }

    /// Adds a new route with `TRACE` method and the handler at the specified path.
    fn trace<H: Handler + 'static>(self, pattern: &str, handler: H) -> Self {
        self.route(Method::TRACE, pattern, handler)
    }

    /// Adds a new route with `CONNECT` method and the handler at the specified path.
    fn connect<H: Handler + 'static>(self, pattern: &str, handler: H) -> Self {
        self.route(Method::CONNECT, pattern, handler)
    }

    /// Registers the same handler under every supported method.
    fn any<H: Handler + 'static>(self, pattern: &str, handler: H) -> Self {
        let handler: Arc<dyn Handler> = Arc::new(handler);
        METHODS.iter().fold(self, |routes, method| {
            routes.add_boxed_route(method.clone(), pattern, handler.clone(), Vec::new())
        })
    }

    /// Registers the routes declared by `f` under `prefix`, each wrapped in
    /// `filters`. Groups nest; an outer group's filters run outside an inner
    /// group's.
    ///
    /// ```
    /// use routerify_radix::prelude::*;
    /// use routerify_radix::{filter_fn, Context, Handler, Router};
    ///
    /// let auth = filter_fn(|ctx: &mut Context, next: &dyn Handler| {
    ///     if ctx.request().headers().contains_key("authorization") {
    ///         next.serve(ctx);
    ///     } else {
    ///         ctx.on_error(http::StatusCode::UNAUTHORIZED);
    ///     }
    /// });
    ///
    /// let router = Router::builder()
    ///     .group("/api", vec![auth], |api| {
    ///         api.get("/users", |ctx: &mut Context| ctx.write_str("users"))
    ///             .get("/users/{id}", |ctx: &mut Context| ctx.write_str("user"))
    ///     })
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(router.leaves()[0].path(), "/api/users");
    /// ```
    fn group<F>(self, prefix: &str, filters: Vec<BoxedFilter>, f: F) -> Self
    where
        F: FnOnce(Group) -> Group,
    {
        let group = f(Group::new(prefix, filters));
        group.into_routes().into_iter().fold(self, |routes, route| {
            routes.add_boxed_route(route.method, &route.pattern, route.handler, route.filters)
        })
    }

    /// Registers `controller` for every supported method at `pattern`.
    /// [`Controller::prepare`] runs inside `filters`, right before the method.
    fn controller<C: Controller>(self, pattern: &str, controller: C, filters: Vec<BoxedFilter>) -> Self {
        let controller: Arc<dyn Controller> = Arc::new(controller);
        let prepare: BoxedFilter = Arc::new(ControllerFilter::new(controller.clone()));
        METHODS.iter().fold(self, |routes, method| {
            let mut chain = filters.clone();
            chain.push(prepare.clone());
            let handler = Arc::new(ControllerHandler::new(controller.clone(), method.clone()));
            routes.add_boxed_route(method.clone(), pattern, handler, chain)
        })
    }
}

struct BuilderInner {
    root: Node,
    filters: Vec<BoxedFilter>,
    config: RouterConfig,
    logger: Arc<dyn Logger>,
}

/// Builder for a [`Router`].
///
/// Every registration method consumes and returns the builder. The first
/// failing registration is remembered and later calls become no-ops;
/// [`build`](RouterBuilder::build) then reports it, so a `Router` can only
/// exist with a valid route table.
///
/// # Examples
///
/// ```
/// use routerify_radix::prelude::*;
/// use routerify_radix::{Context, LogFilter, Router, TracingLogger};
/// use std::sync::Arc;
///
/// fn home(ctx: &mut Context) {
///     ctx.write_str("home");
/// }
///
/// let router = Router::builder()
///     .filter(Arc::new(LogFilter::new(Arc::new(TracingLogger))))
///     .get("/", home)
///     .build()
///     .unwrap();
/// # drop(router);
///
/// // Registering the same route twice is a startup error.
/// let err = Router::builder().get("/", home).get("/", home).build();
/// assert!(err.is_err());
/// ```
pub struct RouterBuilder {
    inner: crate::Result<BuilderInner>,
}

impl RouterBuilder {
    pub fn new() -> RouterBuilder {
        RouterBuilder::default()
    }

    /// Creates a new [Router](./struct.Router.html) instance from the added configuration.
    pub fn build(self) -> crate::Result<Router> {
        self.inner
            .map(|inner| Router::new(inner.root, inner.filters, inner.config, inner.logger))
    }

    fn and_then<F: FnOnce(BuilderInner) -> crate::Result<BuilderInner>>(self, func: F) -> Self {
        RouterBuilder {
            inner: self.inner.and_then(func),
        }
    }

    /// Adds a router level filter. Router level filters wrap every route, and
    /// the routing step itself, in registration order.
    pub fn filter(self, filter: BoxedFilter) -> Self {
        self.and_then(move |mut inner| {
            inner.filters.push(filter);
            Ok(inner)
        })
    }

    pub fn filters(self, filters: Vec<BoxedFilter>) -> Self {
        self.and_then(move |mut inner| {
            inner.filters.extend(filters);
            Ok(inner)
        })
    }

    pub fn config(self, config: RouterConfig) -> Self {
        self.and_then(move |mut inner| {
            inner.config = config;
            Ok(inner)
        })
    }

    /// Sets the logger handed to every request [`Context`](crate::Context).
    pub fn logger(self, logger: Arc<dyn Logger>) -> Self {
        self.and_then(move |mut inner| {
            inner.logger = logger;
            Ok(inner)
        })
    }
}

impl Routes for RouterBuilder {
    fn add_boxed_route(
        self,
        method: Method,
        pattern: &str,
        handler: Arc<dyn Handler>,
        filters: Vec<BoxedFilter>,
    ) -> Self {
        self.and_then(move |mut inner| {
            if !constants::is_supported_method(&method) {
                return Err(Error::UnsupportedMethod(method));
            }
            let pattern = Pattern::parse(pattern)?;
            let path = pattern.render();
            tracing::debug!(%method, path = %path, filters = filters.len(), "registering route");

            let mut leaf = Leaf::new(method, path, pattern.params(), handler);
            leaf.add_filters(filters);
            inner.root.insert(&pattern, leaf)?;
            Ok(inner)
        })
    }
}

impl Default for RouterBuilder {
    fn default() -> RouterBuilder {
        RouterBuilder {
            inner: Ok(BuilderInner {
                root: Node::default(),
                filters: Vec::new(),
                config: RouterConfig::default(),
                logger: Arc::new(TracingLogger),
            }),
        }
    }
}

impl Debug for RouterBuilder {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Ok(inner) => write!(f, "{{ root: {:?}, filters: {} }}", inner.root, inner.filters.len()),
            Err(err) => write!(f, "{{ error: {} }}", err),
        }
    }
}

struct PendingRoute {
    method: Method,
    pattern: String,
    handler: Arc<dyn Handler>,
    filters: Vec<BoxedFilter>,
}

/// Routes collected under a common path prefix and common filters.
///
/// A group is only a staging area: its routes land in the enclosing builder
/// (or group) once the closure passed to [`Routes::group`] returns.
pub struct Group {
    prefix: String,
    filters: Vec<BoxedFilter>,
    routes: Vec<PendingRoute>,
}

impl Group {
    fn new(prefix: &str, filters: Vec<BoxedFilter>) -> Group {
        Group {
            prefix: prefix.trim_end_matches('/').to_owned(),
            filters,
            routes: Vec::new(),
        }
    }

    /// The collected routes, with the group's filters spliced in front of
    /// each route's own.
    fn into_routes(self) -> Vec<PendingRoute> {
        let Group { filters, routes, .. } = self;
        routes
            .into_iter()
            .map(|mut route| {
                let mut chain = filters.clone();
                chain.append(&mut route.filters);
                route.filters = chain;
                route
            })
            .collect()
    }
}

impl Routes for Group {
    fn add_boxed_route(
        mut self,
        method: Method,
        pattern: &str,
        handler: Arc<dyn Handler>,
        filters: Vec<BoxedFilter>,
    ) -> Self {
        self.routes.push(PendingRoute {
            method,
            pattern: format!("{}{}", self.prefix, pattern),
            handler,
            filters,
        });
        self
    }
}

impl Debug for Group {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ prefix: {:?}, filters: {}, routes: {} }}",
            self.prefix,
            self.filters.len(),
            self.routes.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::middleware::filter_fn;
    use crate::response::ResponseSink;
    use bytes::Bytes;
    use http::{Request, StatusCode};
    use http_body_util::BodyExt;

    fn token(name: &'static str) -> BoxedFilter {
        filter_fn(move |ctx: &mut Context, next: &dyn Handler| {
            ctx.write_str(&format!("{}-before ", name));
            next.serve(ctx);
            ctx.write_str(&format!("{}-after ", name));
        })
    }

    fn run(router: &Router, method: Method, uri: &str) -> (StatusCode, String) {
        let res = router.handle(Request::builder().method(method).uri(uri).body(Bytes::new()).unwrap());
        let status = res.status();
        let bytes = futures::executor::block_on(res.into_body().collect()).unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn filter_layers_nest_router_group_route() {
        let router = Router::builder()
            .filter(token("R"))
            .group("/api", vec![token("G1")], |api| {
                api.group("/v1", vec![token("G2")], |v1| {
                    v1.add_route(Method::GET, "/items", |ctx: &mut Context| ctx.write_str("H "), vec![token("L")])
                })
            })
            .build()
            .unwrap();

        let (status, body) = run(&router, Method::GET, "/api/v1/items");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            "R-before G1-before G2-before L-before H L-after G2-after G1-after R-after "
        );
        assert_eq!(router.leaves()[0].filter_count(), 3);
    }

    #[test]
    fn group_filters_only_wrap_group_routes() {
        let router = Router::builder()
            .group("/admin", vec![token("G")], |admin| {
                admin.get("/", |ctx: &mut Context| ctx.write_str("admin "))
            })
            .get("/public", |ctx: &mut Context| ctx.write_str("public "))
            .build()
            .unwrap();

        assert_eq!(run(&router, Method::GET, "/admin").1, "G-before admin G-after ");
        assert_eq!(run(&router, Method::GET, "/public").1, "public ");
    }

    #[test]
    fn first_error_wins() {
        let err = Router::builder()
            .get("users", |_: &mut Context| {})
            .get("/", |_: &mut Context| {})
            .get("/", |_: &mut Context| {})
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }), "{}", err);

        let err = Router::builder()
            .get("/test", |_: &mut Context| {})
            .get("/test/", |_: &mut Context| {})
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateRoute { .. }));
    }

    #[test]
    fn rejects_non_standard_methods() {
        let method = Method::from_bytes(b"PURGE").unwrap();
        let err = Router::builder()
            .route(method, "/", |_: &mut Context| {})
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedMethod(_)));
    }

    #[test]
    fn any_registers_every_method() {
        let router = Router::builder()
            .any("/ping", |ctx: &mut Context| {
                let m = ctx.method().to_string();
                ctx.write_str(&m);
            })
            .build()
            .unwrap();
        assert_eq!(router.leaves().len(), 9);
        assert_eq!(run(&router, Method::PATCH, "/ping").1, "PATCH");
        assert_eq!(run(&router, Method::OPTIONS, "/ping").1, "OPTIONS");
    }

    struct Articles;

    impl Controller for Articles {
        fn prepare(&self, ctx: &mut Context) -> bool {
            if ctx.params().get("id") == Some("0") {
                ctx.on_error(StatusCode::NOT_FOUND);
                return false;
            }
            true
        }

        fn get(&self, ctx: &mut Context) {
            let id = ctx.params().get_string_must("id", "").to_owned();
            ctx.write_str(&format!("article {}", id));
        }

        fn delete(&self, ctx: &mut Context) {
            ctx.write_header(StatusCode::NO_CONTENT);
        }
    }

    #[test]
    fn controller_routes() {
        let router = Router::builder()
            .controller("/articles/{id}", Articles, vec![])
            .build()
            .unwrap();

        assert_eq!(run(&router, Method::GET, "/articles/7"), (StatusCode::OK, "article 7".to_owned()));
        assert_eq!(run(&router, Method::DELETE, "/articles/7").0, StatusCode::NO_CONTENT);
        assert_eq!(run(&router, Method::PUT, "/articles/7").0, StatusCode::NOT_IMPLEMENTED);
        assert_eq!(run(&router, Method::GET, "/articles/0").0, StatusCode::NOT_FOUND);
    }

    #[test]
    fn leaves_expose_param_metadata() {
        let router = Router::builder()
            .get(r"/users/{id:\d+:int:user id}", |_: &mut Context| {})
            .build()
            .unwrap();
        let leaves = router.leaves();
        assert_eq!(leaves[0].path(), "/users/{id}");
        let param = &leaves[0].params()[0];
        assert_eq!(param.name, "id");
        assert_eq!(param.pattern.as_deref(), Some(r"\d+"));
        assert_eq!(param.data_type, "int");
        assert_eq!(param.description, "user id");
    }

    #[test]
    fn custom_logger_reaches_the_context() {
        #[derive(Default)]
        struct Silent;
        impl Logger for Silent {
            fn debug(&self, _: fmt::Arguments<'_>) {}
            fn info(&self, _: fmt::Arguments<'_>) {}
            fn warning(&self, _: fmt::Arguments<'_>) {}
            fn error(&self, _: fmt::Arguments<'_>) {}
            fn critical(&self, _: fmt::Arguments<'_>) {}
        }

        let logger: Arc<dyn Logger> = Arc::new(Silent);
        let expected = logger.clone();
        let router = Router::builder()
            .logger(logger)
            .get("/", move |ctx: &mut Context| {
                let same = Arc::ptr_eq(ctx.logger(), &expected);
                ctx.write_str(if same { "same" } else { "other" });
            })
            .build()
            .unwrap();
        assert_eq!(run(&router, Method::GET, "/").1, "same");
    }

    #[test]
    fn handler_status_survives_writes() {
        let router = Router::builder()
            .post("/items", |ctx: &mut Context| {
                ctx.write_header(StatusCode::CREATED);
                ctx.response_mut().write(b"made");
            })
            .build()
            .unwrap();
        assert_eq!(run(&router, Method::POST, "/items"), (StatusCode::CREATED, "made".to_owned()));
    }
}
