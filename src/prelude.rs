//! The traits needed at registration and call sites, for glob import.

pub use crate::handler::Handler;
pub use crate::middleware::Filter;
pub use crate::response::ResponseSink;
pub use crate::router::Routes;
