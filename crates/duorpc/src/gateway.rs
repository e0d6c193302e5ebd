//! # Gateway
//!
//! The per-connection facade. Issues calls to the peer, answers the peer's
//! calls through the registered handler, and owns the bookkeeping that ties
//! the two together.
//!
//! ```text
//!   send(payload) ──► FutureManager.register ──► CallEncoder ──► Bridge.send
//!                                                                    │
//!   on_receive(bytes) ◄──────────────── transport ◄──────────────────┘
//!        │
//!        └─► FrameCodec.decode ─► Dispatcher.on_frame ─┬─► handler ─► reply
//!                                                      └─► FutureManager.complete
//! ```
//!
//! Cloning a `Gateway` yields another handle to the same connection.

use std::sync::Arc;
use std::time::Duration;

use duoframe::CallEncoder;
use duoframe::Kind;
use duoframe::Role;

use crate::bridge::TransportBridge;
use crate::config::GatewayConfig;
use crate::diagnostics::Diagnostic;
use crate::diagnostics::DiagnosticSink;
use crate::diagnostics::Reporter;
use crate::diagnostics::TracingSink;
use crate::dispatch::Dispatcher;
use crate::dispatch::HandlerResult;
use crate::dispatch::RequestHandler;
use crate::error::Error;
use crate::error::Result;
use crate::pending::CallHandle;
use crate::pending::FutureManager;
use crate::transport::Transport;

/// Fluent builder for a [`Gateway`].
pub struct GatewayBuilder {
    name: String,
    role: Role,
    config: GatewayConfig,
    sink: Arc<dyn DiagnosticSink>,
}

impl GatewayBuilder {
    pub fn new(role: Role) -> Self {
        Self {
            name: role.to_string(),
            role,
            config: GatewayConfig::default(),
            sink: Arc::new(TracingSink),
        }
    }

    /// Name used in logs and diagnostics. Defaults to the role.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn config(mut self, config: GatewayConfig) -> Self {
        self.config = config;
        self
    }

    pub fn sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn build(self) -> Gateway {
        let name: Arc<str> = Arc::from(self.name);
        let reporter = Reporter::new(name.clone(), self.sink);
        let manager = FutureManager::new();
        let bridge = TransportBridge::new(duoframe::FrameCodec::new(self.role));
        let dispatcher = Dispatcher::new(
            manager.clone(),
            bridge.clone(),
            reporter.clone(),
            self.config.handler_mode,
            self.config.max_queued_requests,
        );

        Gateway {
            name,
            role: self.role,
            config: Arc::new(self.config),
            manager,
            dispatcher,
            bridge,
            reporter,
        }
    }
}

#[derive(Clone)]
pub struct Gateway {
    name: Arc<str>,
    role: Role,
    config: Arc<GatewayConfig>,
    manager: FutureManager,
    dispatcher: Dispatcher,
    bridge: TransportBridge,
    reporter: Reporter,
}

impl Gateway {
    /// A gateway with default configuration that logs diagnostics via `tracing`.
    pub fn new(role: Role) -> Self {
        GatewayBuilder::new(role).build()
    }

    pub fn builder(role: Role) -> GatewayBuilder {
        GatewayBuilder::new(role)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn is_bound(&self) -> bool {
        self.bridge.is_bound()
    }

    /// Calls currently awaiting a reply.
    pub fn pending_count(&self) -> usize {
        self.manager.len()
    }

    /// Peer requests held back until a handler is registered.
    pub fn queued_requests(&self) -> usize {
        self.dispatcher.queued()
    }

    /// Binds a callback-driven transport. The host delivers every inbound
    /// message through [`Gateway::on_receive`].
    pub fn bind(&self, transport: Arc<dyn Transport>) -> Result<()> {
        let generation = self.bridge.bind(transport)?;
        tracing::info!(gateway = %self.name, role = %self.role, generation, "transport bound");
        Ok(())
    }

    /// Binds a pull-driven transport and spawns a task that feeds every
    /// message from [`Transport::recv`] into [`Gateway::on_receive`].
    ///
    /// When the transport reports end of stream or fails, the gateway is torn
    /// down as by [`Gateway::dispose`].
    pub fn attach(&self, transport: Arc<dyn Transport>) -> Result<()> {
        let generation = self.bridge.bind(transport.clone())?;
        tracing::info!(gateway = %self.name, role = %self.role, generation, "transport attached");

        let gateway = self.clone();
        let pump = tokio::spawn(async move { gateway.pump(transport, generation).await });
        self.bridge.set_pump(generation, pump.abort_handle());
        Ok(())
    }

    async fn pump(self, transport: Arc<dyn Transport>, generation: u64) {
        let reason = loop {
            match transport.recv().await {
                Ok(Some(msg)) => self.on_receive(&msg).await,
                Ok(None) => break "stream closed".to_string(),
                Err(e) => break e.to_string(),
            }
        };

        if self.teardown(Some(generation)).is_some() {
            self.reporter.report(Diagnostic::TransportClosed { reason });
        }
    }

    /// Delivery callback for one inbound message.
    ///
    /// Must be invoked sequentially per connection, in transport order.
    pub async fn on_receive(&self, bytes: &[u8]) {
        match self.bridge.codec().decode(bytes) {
            Ok(frame) => self.dispatcher.on_frame(frame).await,
            Err(reason) => self.reporter.report(Diagnostic::MalformedFrame { reason }),
        }
    }

    /// Registers the handler for the peer's requests. Single assignment.
    pub fn on_request(&self, handler: impl RequestHandler) -> Result<()> {
        self.dispatcher.register(Arc::new(handler))
    }

    /// Same as [`Gateway::on_request`], for a plain closure.
    pub fn on_request_fn<F>(&self, handler: F) -> Result<()>
    where
        F: Fn(Vec<u8>) -> HandlerResult + Send + Sync + 'static,
    {
        self.on_request(handler)
    }

    /// Issues a call. Fails with [`Error::NotConnected`] without registering
    /// anything when no transport is bound.
    pub async fn send(&self, payload: &[u8]) -> Result<CallHandle> {
        let (handle, transport) = {
            let binding = self.bridge.read();
            let Some(current) = binding.as_ref() else {
                return Err(Error::NotConnected);
            };
            let (_, handle) = self.manager.register();
            (handle, current.transport.clone())
        };

        let envelope = CallEncoder::new(handle.seq(), payload).encode();
        let frame = self.bridge.codec().encode(Kind::Request, &envelope);

        // On failure the dropped handle takes its pending entry with it.
        transport.send(&frame).await?;
        tracing::trace!(gateway = %self.name, seq = handle.seq(), len = payload.len(), "request sent");
        Ok(handle)
    }

    /// Waits for the reply to `handle`, at most `timeout`.
    ///
    /// On timeout the call is cancelled and [`Error::Timeout`] is returned; a
    /// reply arriving later is treated as stale.
    pub async fn await_result(&self, mut handle: CallHandle, timeout: Duration) -> Result<Vec<u8>> {
        match tokio::time::timeout(timeout, &mut handle.rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::Cancelled),
            Err(_) => {
                if self.manager.cancel(handle.seq()) {
                    tracing::debug!(gateway = %self.name, seq = handle.seq(), ?timeout, "request timed out");
                    return Err(Error::Timeout);
                }
                // Resolved between the deadline and the cancel; that result stands.
                handle.rx.try_recv().unwrap_or(Err(Error::Timeout))
            }
        }
    }

    /// Sends `payload` and waits for the reply with the configured timeout.
    pub async fn call(&self, payload: &[u8]) -> Result<Vec<u8>> {
        let handle = self.send(payload).await?;
        self.await_result(handle, self.config.call_timeout).await
    }

    /// Tears the connection down: unbinds the transport, fails every
    /// pending call with [`Error::Teardown`] and discards queued peer
    /// requests. Idempotent.
    ///
    /// Returns how many calls were failed. The gateway may be bound again
    /// afterwards.
    pub fn dispose(&self) -> usize {
        self.teardown(None).unwrap_or(0)
    }

    /// Clears the binding and fails the pending calls in one exclusive
    /// section, so no call can register against a binding that is going away.
    ///
    /// With `Some(generation)` only that binding is torn down; `None` is
    /// returned when a newer binding has taken its place.
    fn teardown(&self, generation: Option<u64>) -> Option<usize> {
        let (previous, failed) = {
            let mut binding = self.bridge.write();
            if let Some(expected) = generation {
                if binding.as_ref().map(|b| b.generation) != Some(expected) {
                    return None;
                }
            }
            let previous = binding.take();
            (previous, self.manager.fail_all(Error::Teardown))
        };

        if let Some(previous) = previous {
            let abandoned = self.dispatcher.abandon_queued();
            tracing::info!(
                gateway = %self.name,
                generation = previous.generation,
                failed,
                abandoned,
                "connection torn down"
            );
            previous.release();
        }
        Some(failed)
    }
}
