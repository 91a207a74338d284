//! `routerify-radix` is a radix-tree HTTP router with per-route filter chains and pooled request contexts for
//! the Rust HTTP library [hyper](https://hyper.rs/).
//!
//! Core features:
//!
//! - 🌲 Route matching in time proportional to the path length, not to the number of routes, using an
//!   edge-compressed radix tree
//!
//! - 🧅 Onion-style [filters](#filters) at router, group and route level
//!
//! - ♻️ Request contexts and response buffers recycled through object [pools](./struct.Pool.html)
//!
//! - 🔒 A two-phase lifecycle: routes are registered on a [`RouterBuilder`](./struct.RouterBuilder.html) and served
//!   by an immutable [`Router`](./struct.Router.html), shareable across threads without locks
//!
//! - ❗ Registration mistakes (malformed patterns, duplicate routes, conflicting parameters) are reported by
//!   [`build`](./struct.RouterBuilder.html#method.build), never at request time
//!
//! ## Basic Example
//!
//! A simple example using `routerify-radix` with `hyper` would look like the following:
//!
//! ```no_run
//! use hyper::service::Service;
//! use hyper_util::rt::{TokioExecutor, TokioIo};
//! use hyper_util::server::conn::auto::Builder;
//! // Import the prelude traits.
//! use routerify_radix::prelude::*;
//! use routerify_radix::{Context, LogFilter, Router, RouterService, TracingLogger};
//! use std::net::SocketAddr;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! // A handler for "/" page.
//! fn home_handler(ctx: &mut Context) {
//!     ctx.write_str("Home page");
//! }
//!
//! // A handler for "/users/{userId}" page.
//! fn user_handler(ctx: &mut Context) {
//!     let user_id = ctx.params().get_string_must("userId", "").to_owned();
//!     ctx.write_str(&format!("Hello {}", user_id));
//! }
//!
//! fn router() -> Router {
//!     Router::builder()
//!         .filter(Arc::new(LogFilter::new(Arc::new(TracingLogger))))
//!         .get("/", home_handler)
//!         .get("/users/{userId}", user_handler)
//!         .build()
//!         .unwrap()
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let service = Arc::new(RouterService::new(router()));
//!
//!     let addr = SocketAddr::from(([127, 0, 0, 1], 3001));
//!     let listener = TcpListener::bind(addr).await?;
//!     println!("App is running on: {}", addr);
//!
//!     loop {
//!         let (stream, _) = listener.accept().await?;
//!         let service = service.clone();
//!
//!         tokio::spawn(async move {
//!             let request_service = service.call(&stream).await.unwrap();
//!             let io = TokioIo::new(stream);
//!             if let Err(err) = Builder::new(TokioExecutor::new()).serve_connection(io, request_service).await {
//!                 eprintln!("Error serving connection: {:?}", err);
//!             }
//!         });
//!     }
//! }
//! ```
//!
//! ## Routing
//!
//! ### Route Handlers
//!
//! A handler is anything implementing [`Handler`](./trait.Handler.html): a function or closure taking
//! `&mut Context`, a native handler adapted with [`Wrap`](./struct.Wrap.html), or a
//! [`Controller`](./trait.Controller.html) registered with
//! [`Routes::controller`](./trait.Routes.html#method.controller).
//! Handlers respond by writing through the context.
//!
//! ```
//! use routerify_radix::prelude::*;
//! use routerify_radix::{handler, Context, Router};
//! use http::StatusCode;
//!
//! let router = Router::builder()
//!     .get("/about", |ctx: &mut Context| ctx.write_str("About page"))
//!     .get("/health", handler::ok("up"))
//!     .delete("/cache", handler::status(StatusCode::NO_CONTENT))
//!     .build()
//!     .unwrap();
//! # drop(router);
//! ```
//!
//! ### Route Parameters
//!
//! Route parameters are named path segments captured at their position in the URL.
//!
//! ```txt
//! Route path:  /users/{userName}/books/{bookName}
//! Request URL: http://localhost:3000/users/alice/books/HarryPotter
//! Params:      [("userName", "alice"), ("bookName", "HarryPotter")]
//! ```
//!
//! The full syntax is `{name}`, `{name:regex}`, `{name:regex:type}` or `{name:regex:type:description}`. The regex must
//! match the whole segment; type and description are metadata for documentation tools, see
//! [`Router::leaves`](./struct.Router.html#method.leaves). A trailing `{*name}` captures the rest of the path.
//!
//! ```
//! use bytes::Bytes;
//! use http::Request;
//! use routerify_radix::prelude::*;
//! use routerify_radix::{Context, Router};
//!
//! let router = Router::builder()
//!     .get(r"/users/{id:\d+:int:the user id}", |ctx: &mut Context| {
//!         let id = ctx.params().get_int_must("id", 0);
//!         ctx.write_str(&format!("user #{}", id));
//!     })
//!     .get("/static/{*file}", |ctx: &mut Context| {
//!         let file = ctx.params().get_string_must("file", "").to_owned();
//!         ctx.write_str(&file);
//!     })
//!     .build()
//!     .unwrap();
//!
//! let res = router.handle(Request::get("/users/42").body(Bytes::new()).unwrap());
//! assert_eq!(res.status(), 200);
//! ```
//!
//! A static segment is always preferred over a parameter at the same position, and once the matcher has committed
//! to a branch it does not go back: with `/foo/bar` and `/foo/{x}/baz` registered, `/foo/bar/baz` is not found.
//!
//! ### Groups
//!
//! [`Routes::group`](./trait.Routes.html#method.group) registers routes under a common prefix, wrapped in common
//! filters:
//!
//! ```
//! use routerify_radix::prelude::*;
//! use routerify_radix::{Context, Router};
//!
//! let router = Router::builder()
//!     .group("/api", vec![], |api| {
//!         api.get("/users", |ctx: &mut Context| ctx.write_str("users"))
//!             .group("/admin", vec![], |admin| admin.get("/stats", |ctx: &mut Context| ctx.write_str("stats")))
//!     })
//!     .build()
//!     .unwrap();
//!
//! let paths: Vec<_> = router.leaves().iter().map(|leaf| leaf.path().to_owned()).collect();
//! assert_eq!(paths, ["/api/users", "/api/admin/stats"]);
//! ```
//!
//! ## Filters
//!
//! A [`Filter`](./trait.Filter.html) wraps the rest of the pipeline: it runs code before and after calling
//! `next.serve(ctx)`, or answers on its own by not calling it. For filters `[A, B]` around a handler `H` the order is
//! `A-before, B-before, H, B-after, A-after`. Router level filters are outermost and also see the router's own
//! `404`/`405` answers, then come group filters, then route filters.
//!
//! ```
//! use routerify_radix::prelude::*;
//! use routerify_radix::{filter_fn, Context, Router};
//! use std::time::Instant;
//!
//! let timing = filter_fn(|ctx: &mut Context, next: &dyn Handler| {
//!     let start = Instant::now();
//!     next.serve(ctx);
//!     let elapsed = format!("{:?}", start.elapsed());
//!     ctx.set_header("x-elapsed", &elapsed);
//! });
//!
//! let router = Router::builder()
//!     .filter(timing)
//!     .add_route(http::Method::GET, "/", |ctx: &mut Context| ctx.write_str("home"), vec![])
//!     .build()
//!     .unwrap();
//! # drop(router);
//! ```
//!
//! [`LogFilter`](./struct.LogFilter.html) and [`RecoveryFilter`](./struct.RecoveryFilter.html) are provided.
//!
//! ## Error Handling
//!
//! Handlers report HTTP errors with [`Context::on_error`](./struct.Context.html#method.on_error). By default the
//! status text is written as the body; a handler registered on the context for that status (or for its class)
//! takes over instead:
//!
//! ```
//! use bytes::Bytes;
//! use http::{Request, StatusCode};
//! use routerify_radix::prelude::*;
//! use routerify_radix::{filter_fn, Context, Router};
//!
//! let router = Router::builder()
//!     .filter(filter_fn(|ctx: &mut Context, next: &dyn Handler| {
//!         ctx.set_4xx_handler(|ctx: &mut Context, status: StatusCode, _: Option<&str>| {
//!             ctx.write_header(status);
//!             ctx.write_str("{\"error\":true}");
//!         });
//!         next.serve(ctx);
//!     }))
//!     .build()
//!     .unwrap();
//!
//! let res = router.handle(Request::get("/missing").body(Bytes::new()).unwrap());
//! assert_eq!(res.status(), StatusCode::NOT_FOUND);
//! ```

pub use self::config::{Environment, RouterConfig};
pub use self::context::{Context, ErrorHandler};
pub use self::error::{Error, MatchError};
pub use self::handler::{Controller, Handler, Wrap};
pub use self::middleware::{
    combine, combine_all, filter_fn, BoxedFilter, Filter, FilterChain, LogFilter, Logger, RecoveryFilter, TracingLogger,
};
pub use self::params::{ParamError, Params};
pub use self::pool::Pool;
pub use self::response::{ResponseSink, ResponseWriter};
pub use self::route::{Leaf, ParamInfo};
pub use self::router::{Group, Router, RouterBuilder, Routes};
pub use self::service::{RequestService, RouterService};

mod config;
mod constants;
mod context;
mod error;
pub mod handler;
mod helpers;
mod middleware;
mod params;
mod pool;
pub mod prelude;
mod response;
mod route;
mod router;
mod service;
mod tree;

/// A Result type often returned from methods that can have routerify-radix errors.
pub type Result<T> = std::result::Result<T, Error>;
