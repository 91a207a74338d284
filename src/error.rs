use http::Method;
use thiserror::Error;

/// Errors produced while building a [`Router`](crate::Router) or serving a connection.
///
/// Every registration-time variant is fatal: [`RouterBuilder::build`](crate::RouterBuilder::build)
/// refuses to produce a router once any of them has been recorded.
#[derive(Debug, Error)]
pub enum Error {
    /// The route pattern is malformed.
    #[error("invalid route pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The constraint of a path parameter is not a valid regular expression.
    #[error("invalid constraint for parameter `{name}` in {pattern:?}: {source}")]
    InvalidRegex {
        pattern: String,
        name: String,
        #[source]
        source: regex::Error,
    },

    /// The same method was registered twice for the same path.
    #[error("route {method} {path} has already been registered")]
    DuplicateRoute { method: Method, path: String },

    /// Two patterns declare different parameters at the same tree position.
    #[error("conflicting parameter in {pattern:?}: `{new}` clashes with existing `{existing}`")]
    ParamConflict {
        pattern: String,
        existing: String,
        new: String,
    },

    /// The method is not one of the nine standard HTTP methods.
    #[error("unsupported method: {0}")]
    UnsupportedMethod(Method),

    /// The incoming request body could not be read.
    #[error("couldn't read the request body: {0}")]
    ReadBody(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The configuration sources could not be loaded.
    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

/// The two non-success outcomes of matching a request against the tree.
///
/// These are ordinary results, not failures: the dispatcher turns them into
/// `404 Not Found` and `405 Method Not Allowed` responses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("no route matches the request path")]
    NotFound,

    /// A route exists for the path but not for the method. Carries the
    /// registered methods sorted by name.
    #[error("method not allowed, allowed: {0:?}")]
    MethodNotAllowed(Vec<Method>),
}

impl MatchError {
    /// Renders the value of the `Allow` header, or `None` for [`MatchError::NotFound`].
    pub fn allow_header(&self) -> Option<String> {
        match self {
            MatchError::NotFound => None,
            MatchError::MethodNotAllowed(methods) => Some(
                methods
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
        }
    }
}
