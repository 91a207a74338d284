use crate::context::Context;
use crate::handler::Handler;
use std::sync::Arc;

pub(crate) use self::chain::serve_wrapped;
pub use self::chain::FilterChain;
pub use self::logger::{LogFilter, Logger, TracingLogger};
pub use self::recovery::RecoveryFilter;

mod chain;
mod logger;
mod recovery;

/// A middleware layer. Refer to [Filters](./index.html#filters) for more info.
///
/// A filter receives the request context and `next`, the rest of the pipeline.
/// Whatever it does before calling `next.serve(ctx)` runs on the way in, whatever
/// it does afterwards runs on the way out. Not calling `next` at all ends the
/// request at this layer.
///
/// Closures of the shape `Fn(&mut Context, &dyn Handler)` are filters:
///
/// ```
/// use routerify_radix::{Context, Handler, Router};
/// use routerify_radix::prelude::*;
/// use std::sync::Arc;
///
/// let powered_by = |ctx: &mut Context, next: &dyn Handler| {
///     ctx.set_header("x-powered-by", "routerify-radix");
///     next.serve(ctx);
/// };
///
/// let router = Router::builder()
///     .filter(Arc::new(powered_by))
///     .get("/", |ctx: &mut Context| ctx.write_str("home"))
///     .build()
///     .unwrap();
/// # drop(router);
/// ```
pub trait Filter: Send + Sync {
    fn filter(&self, ctx: &mut Context, next: &dyn Handler);
}

impl<F> Filter for F
where
    F: Fn(&mut Context, &dyn Handler) + Send + Sync,
{
    fn filter(&self, ctx: &mut Context, next: &dyn Handler) {
        self(ctx, next)
    }
}

/// A shareable, type-erased filter, the form filters are registered in.
pub type BoxedFilter = Arc<dyn Filter>;

/// Boxes a filter closure without spelling out the trait object type.
pub fn filter_fn<F>(f: F) -> BoxedFilter
where
    F: Fn(&mut Context, &dyn Handler) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Two filters fused into one: `outer` wraps `inner` wraps whatever comes next.
struct Combined {
    outer: BoxedFilter,
    inner: BoxedFilter,
}

impl Filter for Combined {
    fn filter(&self, ctx: &mut Context, next: &dyn Handler) {
        let inner = Link {
            filter: self.inner.as_ref(),
            next,
        };
        self.outer.filter(ctx, &inner);
    }
}

/// A filter bound to its continuation, usable wherever a handler is expected.
struct Link<'a> {
    filter: &'a dyn Filter,
    next: &'a dyn Handler,
}

impl Handler for Link<'_> {
    fn serve(&self, ctx: &mut Context) {
        self.filter.filter(ctx, self.next)
    }
}

/// Combines two filters so that `first` runs outside `second`. A missing
/// operand is the identity.
pub fn combine(first: Option<BoxedFilter>, second: Option<BoxedFilter>) -> Option<BoxedFilter> {
    match (first, second) {
        (None, other) | (other, None) => other,
        (Some(outer), Some(inner)) => Some(Arc::new(Combined { outer, inner })),
    }
}

/// Folds `filters` into a single filter, the first one outermost.
pub fn combine_all<I>(filters: I) -> Option<BoxedFilter>
where
    I: IntoIterator<Item = BoxedFilter>,
{
    let filters: Vec<BoxedFilter> = filters.into_iter().collect();
    filters
        .into_iter()
        .rev()
        .fold(None, |inner, outer| combine(Some(outer), inner))
}
