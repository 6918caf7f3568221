//! Hardware device worker for faderlink
//!
//! This crate owns the physical controller: a dedicated worker thread drains
//! raw hardware messages into the canonical state, fires user callbacks, and
//! pushes LED/control commands back to the device, reconnecting automatically
//! when the hardware is unplugged.
//!
//! # Architecture
//!
//! ```text
//! MIDI driver thread → MessageSink → flume queue → worker thread
//!                                                     ├─ canonical State (mutex)
//!                                                     ├─ user callbacks
//!                                                     └─ outbound command queue → hardware
//! ```
//!
//! The transport is pluggable through the [`Communicator`] trait: the default
//! backend is [`midi::MidiCommunicator`]; [`loopback::Loopback`] provides an
//! in-memory device for tests and demos.

mod communicator;
mod device;
pub mod loopback;
pub mod midi;
mod sysex;

pub use communicator::{Communicator, CommunicatorFactory, MessageSink, RawMessage};
pub use device::Device;
