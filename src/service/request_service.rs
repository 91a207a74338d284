use crate::router::Router;
use crate::Error;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::{service::Service, Request, Response};
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;

/// Serves the requests of one connection through a shared [`Router`].
///
/// The request body is collected in full before routing and the peer address
/// is stored in the request extensions, where
/// [`Context::remote_addr`](crate::Context::remote_addr) finds it.
#[derive(Debug, Clone)]
pub struct RequestService {
    pub(crate) router: Arc<Router>,
    pub(crate) remote_addr: SocketAddr,
}

impl RequestService {
    pub fn new(router: Arc<Router>, remote_addr: SocketAddr) -> RequestService {
        RequestService { router, remote_addr }
    }
}

impl<B> Service<Request<B>> for RequestService
where
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    type Response = Response<Full<Bytes>>;
    type Error = Error;
    #[allow(clippy::type_complexity)]
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<B>) -> Self::Future {
        let router = self.router.clone();
        let remote_addr = self.remote_addr;

        let fut = async move {
            let (mut parts, body) = req.into_parts();
            parts.extensions.insert(remote_addr);

            let body = body
                .collect()
                .await
                .map_err(|e| Error::ReadBody(e.into()))?
                .to_bytes();

            Ok(router.handle(Request::from_parts(parts, body)))
        };

        Box::pin(fut)
    }
}
