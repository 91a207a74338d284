use crate::context::Context;
use crate::handler::Handler;
use crate::middleware::{BoxedFilter, FilterChain};
use http::Method;
use regex::Regex;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// Metadata of one path parameter, as declared in the route pattern.
///
/// `pattern`, `data_type` and `description` come from the optional
/// `{name:regex:type:description}` fields and are only informational except
/// for the compiled regex, which constrains matching.
#[derive(Debug, Clone)]
pub struct ParamInfo {
    pub name: String,
    pub pattern: Option<String>,
    pub(crate) regex: Option<Regex>,
    pub data_type: String,
    pub description: String,
    pub catch_all: bool,
}

impl ParamInfo {
    pub(crate) fn catch_all(name: &str) -> ParamInfo {
        ParamInfo {
            name: name.to_owned(),
            pattern: None,
            regex: None,
            data_type: crate::constants::DEFAULT_PARAM_TYPE.to_owned(),
            description: String::new(),
            catch_all: true,
        }
    }

    /// The parameter rendered back into a pattern, without its metadata.
    pub fn segment(&self) -> String {
        if self.catch_all {
            format!("{{*{}}}", self.name)
        } else {
            format!("{{{}}}", self.name)
        }
    }

    /// Whether `value` satisfies the parameter's constraint.
    pub fn accepts(&self, value: &str) -> bool {
        !value.is_empty() && self.regex.as_ref().map_or(true, |re| re.is_match(value))
    }

    /// The parameter as declared, including its constraint, for diagnostics.
    pub(crate) fn declaration(&self) -> String {
        match (&self.pattern, self.catch_all) {
            (_, true) => self.segment(),
            (Some(re), false) => format!("{{{}:{}}}", self.name, re),
            (None, false) => self.segment(),
        }
    }

    /// Two declarations describe the same tree position only if they agree on
    /// name, kind and constraint.
    pub(crate) fn same_as(&self, other: &ParamInfo) -> bool {
        self.name == other.name && self.catch_all == other.catch_all && self.pattern == other.pattern
    }
}

/// The terminal of a route for one HTTP method.
///
/// A leaf owns the route's handler wrapped in its route-local [`FilterChain`],
/// and remembers the full pattern it was registered under so documentation
/// tooling can walk the table through [`Router::leaves`](crate::Router::leaves).
pub struct Leaf {
    method: Method,
    path: String,
    params: Vec<ParamInfo>,
    chain: FilterChain,
}

impl Leaf {
    pub(crate) fn new(method: Method, path: String, params: Vec<ParamInfo>, handler: Arc<dyn Handler>) -> Leaf {
        Leaf {
            method,
            path,
            params,
            chain: FilterChain::new(handler),
        }
    }

    /// The registered pattern with parameters rendered as `{name}`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn params(&self) -> &[ParamInfo] {
        &self.params
    }

    /// Number of group and route filters wrapped around the handler.
    pub fn filter_count(&self) -> usize {
        self.chain.len()
    }

    pub(crate) fn add_filters(&mut self, filters: Vec<BoxedFilter>) {
        self.chain.add_filters(filters);
    }
}

impl Handler for Leaf {
    fn serve(&self, ctx: &mut Context) {
        self.chain.serve(ctx)
    }
}

impl Debug for Leaf {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ method: {}, path: {:?}, params: {:?}, filters: {} }}",
            self.method,
            self.path,
            self.params.iter().map(|p| p.name.as_str()).collect::<Vec<_>>(),
            self.chain.len()
        )
    }
}
