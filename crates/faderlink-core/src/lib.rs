//! Shared state model and wire protocol for faderlink
//!
//! faderlink exposes a multi-group MIDI control surface (nanoKONTROL2) as a
//! shared, observable state object and replicates that state to any number of
//! consumer processes over TCP. This crate holds the pieces common to both
//! sides of the wire:
//!
//! - the [`State`] value type and its rising-edge filter,
//! - the [`Button`]/[`Dial`]/[`Slider`]/[`Led`] control enumerations and the
//!   hardware control-ID resolution,
//! - the 8-byte [`Event`] wire codec and the full-state snapshot order,
//! - the [`CallbackRegistry`] used by every state owner to dispatch changes.

mod callback;
mod controls;
mod packet;
mod state;

pub use callback::{ButtonCallback, CallbackRegistry, DialCallback, SliderCallback};
pub use controls::{resolve_control, Button, Control, Dial, Led, Slider};
pub use packet::{snapshot_events, Event, DEFAULT_PORT, FRAME_SIZE};
pub use state::{scale_raw_value, Group, State};
