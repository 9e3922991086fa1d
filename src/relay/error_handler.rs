//! Error funnel for post-hand-off failures.

use std::borrow::Cow;
use std::sync::Arc;

use axum::http::StatusCode;

use crate::relay::error::RelayError;
use crate::relay::target::RelayTarget;

/// Default log message for streaming failures.
pub const DEFAULT_STREAMING_MESSAGE: &str = "Request streaming error:";

/// The single sink for every failure after the relay hands the body off.
pub trait ErrorFunnel: Send + Sync {
    fn handle(&self, err: &RelayError);
}

impl<F> ErrorFunnel for F
where
    F: Fn(&RelayError) + Send + Sync,
{
    fn handle(&self, err: &RelayError) {
        self(err)
    }
}

/// Logs, applies a fallback status and finalizes the bound target.
#[derive(Debug, Clone)]
pub struct ErrorHandler<T> {
    target: T,
    message: Cow<'static, str>,
    status: StatusCode,
}

impl<T: RelayTarget> ErrorHandler<T> {
    /// Handler with the default message and `500 Internal Server Error`.
    pub fn new(target: T) -> Self {
        Self {
            target,
            message: Cow::Borrowed(DEFAULT_STREAMING_MESSAGE),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn with_message(mut self, message: impl Into<Cow<'static, str>>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Finalize the target with the fallback status.
    ///
    /// A target that is already finalized is left untouched and the error
    /// is only logged at debug level. Returns true when this call finalized.
    pub fn handle(&self, err: &RelayError) -> bool {
        if self.target.is_finalized() {
            tracing::debug!(error = %err, "{} target already finalized, nothing to do", self.message);
            return false;
        }

        tracing::error!(error = %err, status = self.status.as_u16(), "{}", self.message);
        self.target.set_status(self.status);
        self.target.finalize()
    }

    pub fn into_funnel(self) -> Arc<dyn ErrorFunnel> {
        Arc::new(self)
    }
}

impl<T: RelayTarget> ErrorFunnel for ErrorHandler<T> {
    fn handle(&self, err: &RelayError) {
        ErrorHandler::handle(self, err);
    }
}
