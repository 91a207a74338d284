use http::Method;

/// Every method a route can be registered for. `any` registers all of them.
pub(crate) const METHODS: [Method; 9] = [
    Method::OPTIONS,
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::TRACE,
    Method::CONNECT,
    Method::PATCH,
];

pub(crate) const DEFAULT_POOL_CAPACITY: usize = 1024;

pub(crate) const DEFAULT_PARAM_TYPE: &str = "string";

pub(crate) const CONFIG_FILE_NAME: &str = "routerify";

pub(crate) const CONFIG_ENV_PREFIX: &str = "ROUTERIFY";

pub(crate) fn is_supported_method(method: &Method) -> bool {
    METHODS.contains(method)
}
