use super::Filter;
use crate::context::Context;
use crate::handler::Handler;
use crate::response::ResponseSink;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// The logging capability handed to every [`Context`].
///
/// The router core never logs through it; it exists for filters and handlers.
/// The default implementation is [`TracingLogger`].
pub trait Logger: Send + Sync {
    fn debug(&self, args: fmt::Arguments<'_>);
    fn info(&self, args: fmt::Arguments<'_>);
    fn warning(&self, args: fmt::Arguments<'_>);
    fn error(&self, args: fmt::Arguments<'_>);
    fn critical(&self, args: fmt::Arguments<'_>);
}

/// Forwards every level to the matching `tracing` macro. `critical` is emitted
/// at `ERROR` with a `critical = true` field.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!("{}", args);
    }

    fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!("{}", args);
    }

    fn warning(&self, args: fmt::Arguments<'_>) {
        tracing::warn!("{}", args);
    }

    fn error(&self, args: fmt::Arguments<'_>) {
        tracing::error!("{}", args);
    }

    fn critical(&self, args: fmt::Arguments<'_>) {
        tracing::error!(critical = true, "{}", args);
    }
}

/// Logs the start and the completion of every request it wraps.
///
/// The completion line's level follows the response status: 5xx is critical,
/// 4xx error, 3xx warning, 2xx info, anything else debug.
pub struct LogFilter {
    logger: Arc<dyn Logger>,
}

impl LogFilter {
    pub fn new(logger: Arc<dyn Logger>) -> LogFilter {
        LogFilter { logger }
    }
}

impl Filter for LogFilter {
    fn filter(&self, ctx: &mut Context, next: &dyn Handler) {
        let start = Instant::now();
        let addr = client_addr(ctx);
        let uri = ctx.request().uri();
        let target = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or_else(|| uri.path());
        self.logger
            .info(format_args!("Started {} {} {}", ctx.method(), target, addr));

        next.serve(ctx);

        let status = ctx.response().status();
        let line = format!(
            "Completed {} {} in {:?}",
            status.as_u16(),
            status.canonical_reason().unwrap_or(""),
            start.elapsed()
        );
        if status.is_server_error() {
            self.logger.critical(format_args!("{}", line));
        } else if status.is_client_error() {
            self.logger.error(format_args!("{}", line));
        } else if status.is_redirection() {
            self.logger.warning(format_args!("{}", line));
        } else if status.is_success() {
            self.logger.info(format_args!("{}", line));
        } else {
            self.logger.debug(format_args!("{}", line));
        }
    }
}

fn client_addr(ctx: &Context) -> String {
    let headers = ctx.request().headers();
    ["x-real-ip", "x-forwarded-for"]
        .iter()
        .find_map(|name| headers.get(*name).and_then(|v| v.to_str().ok()))
        .map(str::to_owned)
        .or_else(|| ctx.remote_addr().map(|addr| addr.to_string()))
        .unwrap_or_else(|| "-".to_owned())
}
