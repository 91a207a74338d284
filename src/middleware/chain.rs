use super::{BoxedFilter, Filter};
use crate::context::Context;
use crate::handler::Handler;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// A handler wrapped in an ordered list of filters.
///
/// The filters are kept outermost first and are never fused into closures, so
/// the chain can still be extended at either end after it is built. Serving
/// walks the list without allocating.
#[derive(Clone)]
pub struct FilterChain {
    filters: Vec<BoxedFilter>,
    handler: Arc<dyn Handler>,
}

impl FilterChain {
    /// A chain that terminates in `handler` and has no filters yet.
    pub fn new(handler: Arc<dyn Handler>) -> FilterChain {
        FilterChain {
            filters: Vec::new(),
            handler,
        }
    }

    /// Builder-style [`add_filters`](FilterChain::add_filters).
    pub fn with_filters(mut self, filters: Vec<BoxedFilter>) -> FilterChain {
        self.add_filters(filters);
        self
    }

    /// Adds `filter` as the innermost layer: it runs after every filter already
    /// in the chain and right before the handler.
    pub fn before(&mut self, filter: BoxedFilter) -> &mut FilterChain {
        self.filters.push(filter);
        self
    }

    /// Adds every filter in order, as if by repeated [`before`](FilterChain::before).
    pub fn add_filters<I>(&mut self, filters: I) -> &mut FilterChain
    where
        I: IntoIterator<Item = BoxedFilter>,
    {
        self.filters.extend(filters);
        self
    }

    /// Splices `filters` in front of the chain, making them the outermost layers.
    pub fn insert_front<I>(&mut self, filters: I) -> &mut FilterChain
    where
        I: IntoIterator<Item = BoxedFilter>,
    {
        self.filters.splice(0..0, filters);
        self
    }

    /// Splices `filters` at the tail of the chain, just outside the handler.
    pub fn insert_back<I>(&mut self, filters: I) -> &mut FilterChain
    where
        I: IntoIterator<Item = BoxedFilter>,
    {
        self.add_filters(filters)
    }

    /// Number of filter layers around the handler.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn filters(&self) -> &[BoxedFilter] {
        &self.filters
    }

    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }
}

impl Handler for FilterChain {
    fn serve(&self, ctx: &mut Context) {
        serve_wrapped(&self.filters, self.handler.as_ref(), ctx)
    }
}

/// Serves `handler` wrapped in `filters`, outermost first.
pub(crate) fn serve_wrapped(filters: &[BoxedFilter], handler: &dyn Handler, ctx: &mut Context) {
    Next { filters, handler }.serve(ctx)
}

/// The remainder of a chain from some filter inwards.
struct Next<'a> {
    filters: &'a [BoxedFilter],
    handler: &'a dyn Handler,
}

impl Handler for Next<'_> {
    fn serve(&self, ctx: &mut Context) {
        match self.filters.split_first() {
            Some((filter, rest)) => filter.filter(
                ctx,
                &Next {
                    filters: rest,
                    handler: self.handler,
                },
            ),
            None => self.handler.serve(ctx),
        }
    }
}

impl Debug for FilterChain {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{{ filters: {} }}", self.filters.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::filter_fn;
    use bytes::Bytes;
    use http::Request;

    fn token(name: &'static str) -> BoxedFilter {
        filter_fn(move |ctx: &mut Context, next: &dyn Handler| {
            ctx.write_str(&format!("{}-before ", name));
            next.serve(ctx);
            ctx.write_str(&format!("{}-after ", name));
        })
    }

    fn chain() -> FilterChain {
        FilterChain::new(Arc::new(|ctx: &mut Context| ctx.write_str("H ")))
    }

    fn run(chain: &FilterChain) -> String {
        let mut ctx = Context::detached(Request::new(Bytes::new()));
        chain.serve(&mut ctx);
        String::from_utf8(ctx.response().body().to_vec()).unwrap()
    }

    #[test]
    fn onion_ordering() {
        let mut c = chain();
        c.add_filters(vec![token("A"), token("B")]);
        assert_eq!(run(&c), "A-before B-before H B-after A-after ");
    }

    #[test]
    fn before_adds_innermost() {
        let mut c = chain();
        c.before(token("A")).before(token("B"));
        assert_eq!(run(&c), "A-before B-before H B-after A-after ");
    }

    #[test]
    fn insert_front_and_back() {
        let mut c = chain();
        c.add_filters(vec![token("B")]);
        c.insert_front(vec![token("A0"), token("A1")]);
        c.insert_back(vec![token("C")]);
        assert_eq!(c.len(), 4);
        assert_eq!(
            run(&c),
            "A0-before A1-before B-before C-before H C-after B-after A1-after A0-after "
        );
    }

    #[test]
    fn empty_chain_serves_handler() {
        let c = chain();
        assert!(c.is_empty());
        assert_eq!(run(&c), "H ");
    }
}
