//! # Transport Bridge
//!
//! Holds the gateway's reference to the live transport and moves tagged
//! frames through it.
//!
//! ## Invariants
//!
//! - At most one transport is bound at a time. Binding again is only legal
//!   after the previous binding was cleared (reconnect).
//! - Readers observe either a fully bound or an unbound state: the binding is
//!   published and cleared under an exclusive lock.
//! - Each binding carries a generation number so that work started for an old
//!   binding (a receive pump) cannot clear a newer one.
//! - A reply leaves on the binding its request arrived on, or not at all.

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use duoframe::FrameCodec;
use duoframe::Kind;
use parking_lot::RwLock;
use parking_lot::RwLockReadGuard;
use parking_lot::RwLockWriteGuard;
use tokio::task::AbortHandle;

use crate::error::Error;
use crate::error::Result;
use crate::transport::Transport;

/// One attachment of a physical channel.
pub(crate) struct Binding {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) generation: u64,
    pump: Option<AbortHandle>,
}

impl Binding {
    /// Stops the receive pump, if this binding has one.
    pub(crate) fn release(self) {
        if let Some(pump) = self.pump {
            pump.abort();
        }
    }
}

#[derive(Clone)]
pub struct TransportBridge {
    codec: FrameCodec,
    binding: Arc<RwLock<Option<Binding>>>,
    generation: Arc<AtomicU64>,
}

impl TransportBridge {
    pub fn new(codec: FrameCodec) -> Self {
        Self {
            codec,
            binding: Arc::new(RwLock::new(None)),
            generation: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn codec(&self) -> FrameCodec {
        self.codec
    }

    /// Attaches `transport` and returns the generation of the new binding.
    pub fn bind(&self, transport: Arc<dyn Transport>) -> Result<u64> {
        let mut binding = self.binding.write();
        if binding.is_some() {
            return Err(Error::AlreadyBound);
        }

        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        *binding = Some(Binding { transport, generation, pump: None });
        Ok(generation)
    }

    /// Associates a receive pump with binding `generation`. If that binding
    /// is already gone the pump is stopped right away.
    pub(crate) fn set_pump(&self, generation: u64, pump: AbortHandle) {
        let mut binding = self.binding.write();
        match binding.as_mut() {
            Some(current) if current.generation == generation => current.pump = Some(pump),
            _ => pump.abort(),
        }
    }

    pub fn is_bound(&self) -> bool {
        self.binding.read().is_some()
    }

    /// Generation of the current binding, if any.
    pub fn generation(&self) -> Option<u64> {
        self.binding.read().as_ref().map(|b| b.generation)
    }

    /// Tags `payload` as `kind` for this role and sends it on binding
    /// `generation`.
    ///
    /// Fails with [`Error::Teardown`] when that binding has been replaced,
    /// so a reply never reaches a peer that did not ask for it.
    pub async fn send(&self, generation: u64, kind: Kind, payload: &[u8]) -> Result<()> {
        let transport = match self.binding.read().as_ref() {
            None => return Err(Error::NotConnected),
            Some(current) if current.generation != generation => return Err(Error::Teardown),
            Some(current) => current.transport.clone(),
        };
        let frame = self.codec.encode(kind, payload);
        transport.send(&frame).await?;
        Ok(())
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, Option<Binding>> {
        self.binding.read()
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, Option<Binding>> {
        self.binding.write()
    }
}
