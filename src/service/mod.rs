pub use self::request_service::RequestService;
pub use self::router_service::RouterService;

mod request_service;
mod router_service;
