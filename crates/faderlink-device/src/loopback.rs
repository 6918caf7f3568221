//! In-memory transport for tests and demos
//!
//! Behaves like a permanently attached controller: connects on demand, records
//! every finalized outbound message, and lets the owner inject raw inbound
//! messages and simulate unplug/replug or send failures.

use crate::communicator::{Communicator, MessageSink};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

struct LoopbackInner {
    allow_connect: AtomicBool,
    fail_sends: AtomicBool,
    connected: AtomicBool,
    sent: Mutex<Vec<Vec<u8>>>,
    sink: Mutex<Option<MessageSink>>,
}

/// Control handle for a loopback transport.
///
/// Create one, pass [`Loopback::factory`] to
/// [`Device::with_communicator`](crate::Device::with_communicator), then drive
/// the fake hardware through this handle.
#[derive(Clone)]
pub struct Loopback {
    inner: Arc<LoopbackInner>,
}

impl Loopback {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(LoopbackInner {
                allow_connect: AtomicBool::new(true),
                fail_sends: AtomicBool::new(false),
                connected: AtomicBool::new(false),
                sent: Mutex::new(Vec::new()),
                sink: Mutex::new(None),
            }),
        }
    }

    /// Communicator factory for [`Device::with_communicator`](crate::Device::with_communicator).
    pub fn factory(
        &self,
    ) -> impl FnOnce(MessageSink) -> Box<dyn Communicator> + Send + 'static {
        let inner = self.inner.clone();
        move |sink: MessageSink| {
            *inner.sink.lock().unwrap() = Some(sink);
            Box::new(LoopbackCommunicator {
                inner,
                pending: Vec::new(),
            }) as Box<dyn Communicator>
        }
    }

    /// Inject a raw hardware message, as if the device sent it.
    pub fn feed(&self, control_id: u8, value: u8) {
        let sink = self.inner.sink.lock().unwrap();
        if let Some(sink) = sink.as_ref() {
            sink.raw_message(control_id, value);
        }
    }

    /// All successfully finalized outbound messages, oldest first.
    pub fn sent_messages(&self) -> Vec<Vec<u8>> {
        self.inner.sent.lock().unwrap().clone()
    }

    /// Make every subsequent send fail (or succeed again).
    pub fn fail_sends(&self, fail: bool) {
        self.inner.fail_sends.store(fail, Ordering::Release);
    }

    /// Simulate pulling the cable: drops the connection and refuses reconnects.
    pub fn unplug(&self) {
        self.inner.allow_connect.store(false, Ordering::Release);
        self.inner.connected.store(false, Ordering::Release);
    }

    /// Allow the device worker to reconnect again.
    pub fn replug(&self) {
        self.inner.allow_connect.store(true, Ordering::Release);
    }
}

impl Default for Loopback {
    fn default() -> Self {
        Self::new()
    }
}

struct LoopbackCommunicator {
    inner: Arc<LoopbackInner>,
    pending: Vec<u8>,
}

impl Communicator for LoopbackCommunicator {
    fn connect(&mut self) -> bool {
        let connected = self.inner.allow_connect.load(Ordering::Acquire);
        self.inner.connected.store(connected, Ordering::Release);
        connected
    }

    fn disconnect(&mut self) {
        self.inner.connected.store(false, Ordering::Release);
    }

    fn poll(&mut self) {}

    fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Acquire)
    }

    fn begin_message(&mut self) -> bool {
        self.pending.clear();
        true
    }

    fn append_message(&mut self, bytes: &[u8]) -> bool {
        self.pending.extend_from_slice(bytes);
        true
    }

    fn finalize_message(&mut self) -> bool {
        if self.inner.fail_sends.load(Ordering::Acquire) {
            return false;
        }
        self.inner
            .sent
            .lock()
            .unwrap()
            .push(std::mem::take(&mut self.pending));
        true
    }

    fn connection_lost(&mut self) {
        self.inner.connected.store(false, Ordering::Release);
    }
}
