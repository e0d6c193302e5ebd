//! # Dispatcher
//!
//! The inbound half of a gateway. Every decoded frame passes through
//! [`Dispatcher::on_frame`] exactly once, in transport delivery order.
//!
//! - Requests go to the registered [`RequestHandler`]; its result is wrapped
//!   in a reply envelope and sent back over the same connection.
//! - Responses go to the [`FutureManager`], keyed by the sequence number in
//!   the envelope.
//!
//! ## Early requests
//!
//! The peer may start calling before the local side has registered its
//! handler. Such requests are held in a bounded backlog and answered in
//! arrival order once a handler is registered. While the backlog drains,
//! newly delivered requests join its tail, so ordering is preserved.
//!
//! Every request remembers the binding generation it arrived on. Its reply
//! is only sent on that binding; a teardown discards whatever is still
//! queued.

use std::collections::VecDeque;
use std::sync::Arc;

use duoframe::CallDecoder;
use duoframe::Incoming;
use duoframe::Kind;
use duoframe::ReplyDecoder;
use duoframe::ReplyErrEncoder;
use duoframe::ReplyOkEncoder;
use parking_lot::Mutex;

use crate::bridge::TransportBridge;
use crate::config::HandlerMode;
use crate::diagnostics::Diagnostic;
use crate::diagnostics::Reporter;
use crate::error::Error;
use crate::error::Result;
use crate::pending::FutureManager;

/// What a request handler returns: reply bytes, or a failure message for the caller.
pub type HandlerResult = std::result::Result<Vec<u8>, String>;

/// Answers requests from the peer.
///
/// Closures `Fn(Vec<u8>) -> HandlerResult` implement this directly.
#[async_trait::async_trait]
pub trait RequestHandler: Send + Sync + 'static {
    async fn handle(&self, payload: Vec<u8>) -> HandlerResult;
}

#[async_trait::async_trait]
impl<F> RequestHandler for F
where
    F: Fn(Vec<u8>) -> HandlerResult + Send + Sync + 'static,
{
    async fn handle(&self, payload: Vec<u8>) -> HandlerResult {
        self(payload)
    }
}

/// A request waiting for a handler or a drain.
struct Queued {
    generation: Option<u64>,
    seq: u64,
    body: Vec<u8>,
}

#[derive(Default)]
struct HandlerSlot {
    handler: Option<Arc<dyn RequestHandler>>,
    backlog: VecDeque<Queued>,
    draining: bool,
}

#[derive(Clone)]
pub struct Dispatcher {
    slot: Arc<Mutex<HandlerSlot>>,
    manager: FutureManager,
    bridge: TransportBridge,
    reporter: Reporter,
    mode: HandlerMode,
    max_queued: usize,
}

impl Dispatcher {
    pub(crate) fn new(
        manager: FutureManager,
        bridge: TransportBridge,
        reporter: Reporter,
        mode: HandlerMode,
        max_queued: usize,
    ) -> Self {
        Self {
            slot: Arc::new(Mutex::new(HandlerSlot::default())),
            manager,
            bridge,
            reporter,
            mode,
            max_queued,
        }
    }

    /// Registers the request handler. Single assignment.
    ///
    /// If requests were queued, a task is spawned on the current tokio runtime
    /// to answer them. Without a runtime the registration is refused with
    /// [`Error::RuntimeUnavailable`] and nothing changes.
    pub fn register(&self, handler: Arc<dyn RequestHandler>) -> Result<()> {
        let mut slot = self.slot.lock();
        if slot.handler.is_some() {
            return Err(Error::HandlerAlreadyRegistered);
        }
        if slot.backlog.is_empty() {
            slot.handler = Some(handler);
            return Ok(());
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| Error::RuntimeUnavailable)?;
        slot.handler = Some(handler);
        slot.draining = true;
        let queued = slot.backlog.len();
        drop(slot);

        tracing::debug!(gateway = self.reporter.gateway(), queued, "answering requests queued before registration");
        let this = self.clone();
        runtime.spawn(async move { this.drain_backlog().await });
        Ok(())
    }

    /// Requests currently waiting for a handler.
    pub fn queued(&self) -> usize {
        self.slot.lock().backlog.len()
    }

    /// Discards every queued request, reporting each one. Called when the
    /// connection they arrived on is torn down.
    pub fn abandon_queued(&self) -> usize {
        let abandoned: Vec<Queued> = self.slot.lock().backlog.drain(..).collect();
        for queued in &abandoned {
            self.reporter.report(Diagnostic::RequestAbandoned { seq: queued.seq });
        }
        abandoned.len()
    }

    /// Routes one inbound frame.
    pub async fn on_frame(&self, frame: Incoming<'_>) {
        match frame {
            Incoming::Request(payload) => self.on_request(payload).await,
            Incoming::Response(payload) => self.on_response(payload),
            Incoming::Unrecognized { discriminator, len } => {
                self.reporter.report(Diagnostic::UnrecognizedFrame { discriminator, len });
            }
        }
    }

    async fn on_request(&self, payload: &[u8]) {
        let call = match CallDecoder::decode(payload) {
            Ok(call) => call,
            Err(reason) => return self.reporter.report(Diagnostic::MalformedFrame { reason }),
        };

        let generation = self.bridge.generation();
        let handler = {
            let mut slot = self.slot.lock();
            match slot.handler.clone() {
                Some(handler) if !slot.draining => Ok(handler),
                _ if slot.backlog.len() >= self.max_queued => Err(Some(Diagnostic::Backpressure {
                    seq: call.seq,
                    queued: slot.backlog.len(),
                    limit: self.max_queued,
                })),
                _ => {
                    slot.backlog.push_back(Queued { generation, seq: call.seq, body: call.body.to_vec() });
                    Err(None)
                }
            }
        };

        match handler {
            Ok(handler) => self.serve(handler, Queued { generation, seq: call.seq, body: call.body.to_vec() }).await,
            Err(Some(diagnostic)) => self.reporter.report(diagnostic),
            Err(None) => tracing::debug!(gateway = self.reporter.gateway(), seq = call.seq, "queued request"),
        }
    }

    fn on_response(&self, payload: &[u8]) {
        let reply = match ReplyDecoder::decode(payload) {
            Ok(reply) => reply,
            Err(reason) => return self.reporter.report(Diagnostic::MalformedFrame { reason }),
        };

        let seq = reply.seq;
        let resolved = match reply.status {
            Ok(body) => self.manager.complete(seq, body.to_vec()),
            Err(message) => self.manager.fail(seq, Error::Remote(message)),
        };

        if !resolved {
            self.reporter.report(Diagnostic::StaleResponse { seq });
        }
    }

    async fn drain_backlog(self) {
        loop {
            let (handler, request) = {
                let mut slot = self.slot.lock();
                let next = slot.backlog.pop_front();
                match (slot.handler.clone(), next) {
                    (Some(handler), Some(request)) => (handler, request),
                    _ => {
                        slot.draining = false;
                        return;
                    }
                }
            };
            self.serve(handler, request).await;
        }
    }

    async fn serve(&self, handler: Arc<dyn RequestHandler>, request: Queued) {
        match self.mode {
            HandlerMode::Inline => self.answer(handler, request).await,
            HandlerMode::Spawned => {
                let this = self.clone();
                tokio::spawn(async move { this.answer(handler, request).await });
            }
        }
    }

    /// Runs the handler and sends its reply on the request's own binding.
    /// Does not wait for the peer.
    async fn answer(&self, handler: Arc<dyn RequestHandler>, request: Queued) {
        let Queued { generation, seq, body } = request;
        let reply = match handler.handle(body).await {
            Ok(result) => ReplyOkEncoder::new(seq, &result).encode(),
            Err(message) => {
                tracing::debug!(gateway = self.reporter.gateway(), seq, %message, "request handler failed");
                ReplyErrEncoder::new(seq, &message).encode()
            }
        };

        let sent = match generation {
            Some(generation) => self.bridge.send(generation, Kind::Response, &reply).await,
            None => Err(Error::NotConnected),
        };
        if let Err(error) = sent {
            self.reporter.report(Diagnostic::ReplyDropped { seq, error });
        }
    }
}
