//! Caller-facing relay target.
//!
//! # Responsibilities
//! - Hold the status and headers that will be sent to the caller
//! - Accept one upstream body stream and drain it on a Tokio task
//! - Finalize exactly once, whichever path gets there first
//!
//! # Design Decisions
//! - Body chunks go through a bounded channel (caller backpressure)
//! - A finalized target is frozen: status and header writes are ignored
//! - The state lock is never held across an await point

use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::{stream, StreamExt};
use tokio::sync::{mpsc, Notify};

use crate::relay::error::RelayError;
use crate::relay::error_handler::ErrorFunnel;
use crate::relay::upstream::BodyStream;

/// Chunks buffered between the upstream reader and the caller's connection.
const BODY_CHANNEL_CAPACITY: usize = 16;

/// The sink a relay drives to completion.
///
/// Implementations are cheap handles onto shared state: the relay keeps
/// one clone and the body task another.
pub trait RelayTarget: Clone + Send + Sync + 'static {
    fn status(&self) -> StatusCode;

    fn set_status(&self, status: StatusCode);

    /// Set `name` to exactly `value`, replacing earlier values.
    fn set_header(&self, name: &HeaderName, value: &HeaderValue);

    /// Add another value under `name`.
    fn append_header(&self, name: &HeaderName, value: &HeaderValue);

    /// Start streaming `body` into the target and return immediately.
    ///
    /// Natural completion finalizes the target; any failure while
    /// streaming is routed to `on_error` once. An `Err` means nothing was
    /// attached.
    fn pipe(&self, body: BodyStream, on_error: Arc<dyn ErrorFunnel>) -> Result<(), RelayError>;

    /// Mark the response complete. Idempotent; returns true only for the
    /// call that actually finalized.
    fn finalize(&self) -> bool;

    fn is_finalized(&self) -> bool;
}

struct TargetState {
    status: StatusCode,
    headers: HeaderMap,
    sender: Option<mpsc::Sender<Bytes>>,
    receiver: Option<mpsc::Receiver<Bytes>>,
    body_attached: bool,
    finalized: bool,
}

/// [`RelayTarget`] backed by an axum response.
///
/// Status and headers are snapshotted when the target is turned into a
/// response; the body keeps flowing afterwards.
#[derive(Clone)]
pub struct ResponseTarget {
    shared: Arc<Mutex<TargetState>>,
    finalized: Arc<Notify>,
}

impl ResponseTarget {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel(BODY_CHANNEL_CAPACITY);
        Self {
            shared: Arc::new(Mutex::new(TargetState {
                status: StatusCode::OK,
                headers: HeaderMap::new(),
                sender: Some(sender),
                receiver: Some(receiver),
                body_attached: false,
                finalized: false,
            })),
            finalized: Arc::new(Notify::new()),
        }
    }

    /// Copy of the headers set so far.
    pub fn headers(&self) -> HeaderMap {
        self.lock().headers.clone()
    }

    fn lock(&self) -> MutexGuard<'_, TargetState> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sender for the next chunk, or None once finalized.
    fn sender(&self) -> Option<mpsc::Sender<Bytes>> {
        self.lock().sender.clone()
    }
}

impl Default for ResponseTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ResponseTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("ResponseTarget")
            .field("status", &state.status)
            .field("headers", &state.headers)
            .field("body_attached", &state.body_attached)
            .field("finalized", &state.finalized)
            .finish()
    }
}

impl RelayTarget for ResponseTarget {
    fn status(&self) -> StatusCode {
        self.lock().status
    }

    fn set_status(&self, status: StatusCode) {
        let mut state = self.lock();
        if state.finalized {
            tracing::debug!(status = status.as_u16(), "Ignoring status on finalized target");
            return;
        }
        state.status = status;
    }

    fn set_header(&self, name: &HeaderName, value: &HeaderValue) {
        let mut state = self.lock();
        if !state.finalized {
            state.headers.insert(name.clone(), value.clone());
        }
    }

    fn append_header(&self, name: &HeaderName, value: &HeaderValue) {
        let mut state = self.lock();
        if !state.finalized {
            state.headers.append(name.clone(), value.clone());
        }
    }

    fn pipe(&self, mut body: BodyStream, on_error: Arc<dyn ErrorFunnel>) -> Result<(), RelayError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| RelayError::NoRuntime)?;

        {
            let mut state = self.lock();
            if state.finalized {
                return Err(RelayError::TargetFinalized);
            }
            if state.body_attached {
                return Err(RelayError::BodyAlreadyAttached);
            }
            state.body_attached = true;
        }

        let target = self.clone();
        runtime.spawn(async move {
            let Some(sender) = target.sender() else {
                tracing::debug!("Target finalized before the body task started");
                return;
            };

            let mut relayed: usize = 0;
            loop {
                // A caller that goes away while the upstream is idle must
                // still be noticed, so wait on both sides.
                let next = tokio::select! {
                    next = body.next() => next,
                    _ = sender.closed() => {
                        tracing::debug!(relayed, "Caller went away while waiting on upstream");
                        on_error.handle(&RelayError::ClientDisconnected);
                        return;
                    }
                    _ = target.finalized.notified() => {
                        tracing::debug!(relayed, "Target finalized mid-stream, dropping remaining body");
                        return;
                    }
                };

                let chunk = match next {
                    Some(Ok(chunk)) => chunk,
                    Some(Err(e)) => {
                        on_error.handle(&RelayError::UpstreamBody(e));
                        return;
                    }
                    None => break,
                };

                if target.is_finalized() {
                    tracing::debug!(relayed, "Target finalized mid-stream, dropping remaining body");
                    return;
                }
                relayed += chunk.len();
                if sender.send(chunk).await.is_err() {
                    on_error.handle(&RelayError::ClientDisconnected);
                    return;
                }
            }

            tracing::trace!(relayed, "Body relay complete");
            // The body ends once this clone and the target's own sender are gone.
            drop(sender);
            target.finalize();
        });

        Ok(())
    }

    fn finalize(&self) -> bool {
        let mut state = self.lock();
        if state.finalized {
            return false;
        }
        state.finalized = true;
        // The body ends once this sender and the body task's clone are gone.
        state.sender = None;
        drop(state);
        // Stored as a permit if the body task is not waiting yet.
        self.finalized.notify_one();
        true
    }

    fn is_finalized(&self) -> bool {
        self.lock().finalized
    }
}

impl IntoResponse for ResponseTarget {
    fn into_response(self) -> Response {
        let mut state = self.lock();

        let body = match state.receiver.take() {
            Some(receiver) => Body::from_stream(stream::unfold(receiver, |mut receiver| async move {
                receiver
                    .recv()
                    .await
                    .map(|chunk| (Ok::<_, Infallible>(chunk), receiver))
            })),
            None => Body::empty(),
        };

        let mut response = Response::new(body);
        *response.status_mut() = state.status;
        *response.headers_mut() = state.headers.clone();
        response
    }
}
