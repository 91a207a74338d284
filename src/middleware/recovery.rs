use super::{Filter, Logger};
use crate::config::Environment;
use crate::context::Context;
use crate::handler::Handler;
use http::StatusCode;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Turns a panic anywhere below it into a `500 Internal Server Error`.
///
/// The panic is logged as critical. The panic message is echoed in the
/// response body only in [`Environment::Develop`].
pub struct RecoveryFilter {
    logger: Arc<dyn Logger>,
    env: Environment,
}

impl RecoveryFilter {
    pub fn new(logger: Arc<dyn Logger>, env: Environment) -> RecoveryFilter {
        RecoveryFilter { logger, env }
    }
}

impl Filter for RecoveryFilter {
    fn filter(&self, ctx: &mut Context, next: &dyn Handler) {
        let result = panic::catch_unwind(AssertUnwindSafe(|| next.serve(ctx)));
        if let Err(payload) = result {
            let msg = panic_message(payload.as_ref());
            self.logger.critical(format_args!(
                "PANIC: {} while serving {} {}",
                msg,
                ctx.method(),
                ctx.path()
            ));
            match self.env {
                Environment::Develop => ctx.on_error_with(StatusCode::INTERNAL_SERVER_ERROR, &msg),
                Environment::Production => ctx.on_error(StatusCode::INTERNAL_SERVER_ERROR),
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::TracingLogger;
    use crate::response::ResponseSink;
    use bytes::Bytes;
    use http::Request;

    fn serve(env: Environment) -> Context {
        let filter = RecoveryFilter::new(Arc::new(TracingLogger), env);
        let mut ctx = Context::detached(Request::new(Bytes::new()));
        filter.filter(&mut ctx, &|_: &mut Context| panic!("boom"));
        ctx
    }

    #[test]
    fn recovers_with_500_and_message_in_develop() {
        let ctx = serve(Environment::Develop);
        assert_eq!(ctx.response().status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ctx.response().body(), b"boom");
    }

    #[test]
    fn hides_message_in_production() {
        let ctx = serve(Environment::Production);
        assert_eq!(ctx.response().status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ctx.response().body(), b"Internal Server Error");
    }

    #[test]
    fn passes_through_without_panic() {
        let filter = RecoveryFilter::new(Arc::new(TracingLogger), Environment::Develop);
        let mut ctx = Context::detached(Request::new(Bytes::new()));
        filter.filter(&mut ctx, &|ctx: &mut Context| ctx.write_str("fine"));
        assert_eq!(ctx.response().status(), StatusCode::OK);
        assert_eq!(ctx.response().body(), b"fine");
    }
}
