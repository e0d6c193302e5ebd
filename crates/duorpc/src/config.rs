//! Gateway configuration.

use std::time::Duration;

/// Where the request handler runs relative to inbound delivery.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum HandlerMode {
    /// Inside the delivery path. Frames on a connection are handled strictly
    /// one after another, so a slow handler delays every later frame.
    #[default]
    Inline,
    /// On a fresh tokio task per request. Later frames are not held up, and
    /// replies leave in completion order.
    Spawned,
}

#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Deadline used by [`crate::Gateway::call`].
    pub call_timeout: Duration,
    /// Requests held while no handler is registered. Beyond this they are dropped.
    pub max_queued_requests: usize,
    pub handler_mode: HandlerMode,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(30),
            max_queued_requests: 256,
            handler_mode: HandlerMode::Inline,
        }
    }
}

impl GatewayConfig {
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_max_queued_requests(mut self, limit: usize) -> Self {
        self.max_queued_requests = limit;
        self
    }

    pub fn with_handler_mode(mut self, mode: HandlerMode) -> Self {
        self.handler_mode = mode;
        self
    }
}
