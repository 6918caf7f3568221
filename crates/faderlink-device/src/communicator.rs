//! Hardware transport abstraction
//!
//! The device worker talks to the physical controller only through the
//! [`Communicator`] trait, so the MIDI backend can be swapped for an in-memory
//! one in tests and demos. Inbound traffic flows the other way: the transport
//! calls [`MessageSink::raw_message`] from whatever thread the OS delivers
//! MIDI on, which enqueues the message and wakes the worker without blocking.

use flume::Sender;

/// A raw (control ID, value) pair as delivered by the hardware.
#[derive(Debug, Clone, Copy)]
pub struct RawMessage {
    pub control_id: u8,
    pub value: u8,
}

/// Inbound side of the worker's message queue, handed to the transport.
///
/// Clonable and safe to call from any thread; enqueueing never blocks.
#[derive(Clone)]
pub struct MessageSink {
    message_tx: Sender<RawMessage>,
    wake_tx: Sender<()>,
}

impl MessageSink {
    pub(crate) fn new(message_tx: Sender<RawMessage>, wake_tx: Sender<()>) -> Self {
        Self { message_tx, wake_tx }
    }

    /// Deliver a raw hardware message to the device worker.
    pub fn raw_message(&self, control_id: u8, value: u8) {
        let _ = self.message_tx.send(RawMessage { control_id, value });
        // Wake channel is bounded(1): a full channel means a wake is already
        // pending, which is all we need
        let _ = self.wake_tx.try_send(());
    }
}

/// One hardware connection, owned and driven by the device worker thread.
///
/// Outbound messages are built in three phases because some platform MIDI APIs
/// assemble a packet list incrementally: [`begin_message`], any number of
/// [`append_message`] calls, then [`finalize_message`] to actually send.
///
/// [`begin_message`]: Communicator::begin_message
/// [`append_message`]: Communicator::append_message
/// [`finalize_message`]: Communicator::finalize_message
pub trait Communicator: Send {
    /// Attempt to open the hardware connection. Returns whether it is now open.
    fn connect(&mut self) -> bool;

    /// Close the hardware connection.
    fn disconnect(&mut self);

    /// Pump OS-level notifications (hot-unplug detection). Called by the
    /// worker at most every 100 ms.
    fn poll(&mut self);

    fn is_connected(&self) -> bool;

    /// Start building an outbound message.
    fn begin_message(&mut self) -> bool;

    /// Append bytes to the message being built.
    fn append_message(&mut self, bytes: &[u8]) -> bool;

    /// Send the built message to the hardware.
    fn finalize_message(&mut self) -> bool;

    /// Treat the connection as lost (after a failed send or an OS
    /// notification); the worker will attempt a reconnect on its next cycle.
    fn connection_lost(&mut self);
}

/// Factory invoked on the worker thread to build its communicator.
pub trait CommunicatorFactory: Send + 'static {
    fn build(self: Box<Self>, sink: MessageSink) -> Box<dyn Communicator>;
}

impl<F> CommunicatorFactory for F
where
    F: FnOnce(MessageSink) -> Box<dyn Communicator> + Send + 'static,
{
    fn build(self: Box<Self>, sink: MessageSink) -> Box<dyn Communicator> {
        self(sink)
    }
}

// Lets callers box a factory up front and hand it across threads
impl CommunicatorFactory for Box<dyn CommunicatorFactory> {
    fn build(self: Box<Self>, sink: MessageSink) -> Box<dyn Communicator> {
        (*self).build(sink)
    }
}
