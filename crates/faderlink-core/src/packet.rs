//! Wire protocol
//!
//! A single fixed-size frame carries every state change:
//!
//! ```text
//! offset 0: u16 type   (1 = Button, 2 = Dial, 3 = Slider)
//! offset 2: u16 id     (wire ordinal of the control enum)
//! offset 4: u32 value  (bool as 0/1 for buttons; f32 bit pattern otherwise)
//! ```
//!
//! All fields are big-endian. Float values are transferred as their raw IEEE-754
//! bit pattern, so a round trip is bit-exact.

use crate::controls::{Button, Dial, Slider};
use crate::state::State;

/// Well-known TCP port of the relay server.
pub const DEFAULT_PORT: u16 = 40807;

/// Size of one wire frame in bytes.
pub const FRAME_SIZE: usize = 8;

const TYPE_BUTTON: u16 = 0x0001;
const TYPE_DIAL: u16 = 0x0002;
const TYPE_SLIDER: u16 = 0x0003;

/// A single state-change event, as carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    Button(Button, bool),
    Dial(Dial, f32),
    Slider(Slider, f32),
}

impl Event {
    /// Encode into a network-order frame.
    pub fn encode(&self) -> [u8; FRAME_SIZE] {
        let (frame_type, id, value) = match *self {
            Event::Button(button, pressed) => (TYPE_BUTTON, button as u16, u32::from(pressed)),
            Event::Dial(dial, value) => (TYPE_DIAL, dial as u16, value.to_bits()),
            Event::Slider(slider, value) => (TYPE_SLIDER, slider as u16, value.to_bits()),
        };

        let mut frame = [0u8; FRAME_SIZE];
        frame[0..2].copy_from_slice(&frame_type.to_be_bytes());
        frame[2..4].copy_from_slice(&id.to_be_bytes());
        frame[4..8].copy_from_slice(&value.to_be_bytes());
        frame
    }

    /// Decode a network-order frame.
    ///
    /// Returns `None` for unknown types or ordinals; such frames are skipped
    /// rather than treated as connection errors, so newer peers can add
    /// controls without breaking older consumers.
    pub fn decode(frame: &[u8; FRAME_SIZE]) -> Option<Event> {
        let frame_type = u16::from_be_bytes([frame[0], frame[1]]);
        let id = u16::from_be_bytes([frame[2], frame[3]]);
        let value = u32::from_be_bytes([frame[4], frame[5], frame[6], frame[7]]);

        match frame_type {
            TYPE_BUTTON => Button::from_ordinal(id).map(|button| Event::Button(button, value != 0)),
            TYPE_DIAL => Dial::from_ordinal(id).map(|dial| Event::Dial(dial, f32::from_bits(value))),
            TYPE_SLIDER => {
                Slider::from_ordinal(id).map(|slider| Event::Slider(slider, f32::from_bits(value)))
            }
            _ => None,
        }
    }

    /// Apply this event to a state replica.
    pub fn apply(&self, state: &mut State) {
        match *self {
            Event::Button(button, pressed) => state.set_button(button, pressed),
            Event::Dial(dial, value) => state.set_dial(dial, value),
            Event::Slider(slider, value) => state.set_slider(slider, value),
        }
    }
}

/// Events describing a full state snapshot, in the fixed bootstrap order:
/// all 35 buttons, then 8 dials, then 8 sliders.
///
/// A late-joining client receives this burst before any incremental frames so
/// it starts from ground truth.
pub fn snapshot_events(state: &State) -> Vec<Event> {
    let mut events = Vec::with_capacity(Button::ALL.len() + Dial::ALL.len() + Slider::ALL.len());

    for button in Button::ALL {
        events.push(Event::Button(button, state.button(button)));
    }
    for dial in Dial::ALL {
        events.push(Event::Dial(dial, state.dial(dial)));
    }
    for slider in Slider::ALL {
        events.push(Event::Slider(slider, state.slider(slider)));
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_frame_layout() {
        let frame = Event::Button(Button::Play, true).encode();
        assert_eq!(frame[0..2], [0x00, 0x01]);
        assert_eq!(frame[2..4], (Button::Play as u16).to_be_bytes());
        assert_eq!(frame[4..8], [0x00, 0x00, 0x00, 0x01]);
    }

    #[test]
    fn test_dial_round_trip_is_bit_exact() {
        let frame = Event::Dial(Dial::Group3, 0.5).encode();
        match Event::decode(&frame) {
            Some(Event::Dial(dial, value)) => {
                assert_eq!(dial, Dial::Group3);
                assert_eq!(value.to_bits(), 0.5f32.to_bits());
            }
            other => panic!("Expected dial event, got {:?}", other),
        }

        // An awkward value that would not survive a decimal reformat
        let awkward = 41.0f32 / 127.0;
        let frame = Event::Slider(Slider::Group7, awkward).encode();
        match Event::decode(&frame) {
            Some(Event::Slider(_, value)) => assert_eq!(value.to_bits(), awkward.to_bits()),
            other => panic!("Expected slider event, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_rejects_unknown() {
        let mut frame = Event::Button(Button::Stop, true).encode();
        frame[0..2].copy_from_slice(&0x0009u16.to_be_bytes());
        assert_eq!(Event::decode(&frame), None);

        let mut frame = Event::Button(Button::Stop, true).encode();
        frame[2..4].copy_from_slice(&999u16.to_be_bytes());
        assert_eq!(Event::decode(&frame), None);
    }

    #[test]
    fn test_snapshot_order_and_size() {
        let mut state = State::default();
        state.groups[3].mute = true;
        state.groups[0].dial = 0.25;

        let events = snapshot_events(&state);
        assert_eq!(events.len(), 51);

        // Buttons first, in enum order
        assert_eq!(events[0], Event::Button(Button::TrackPrevious, false));
        let mute_index = Button::ALL
            .iter()
            .position(|&b| b == Button::Group4Mute)
            .unwrap();
        assert_eq!(events[mute_index], Event::Button(Button::Group4Mute, true));

        // Then dials, then sliders
        assert_eq!(events[35], Event::Dial(Dial::Group1, 0.25));
        assert_eq!(events[43], Event::Slider(Slider::Group1, 1.0));
        assert_eq!(events[50], Event::Slider(Slider::Group8, 1.0));
    }

    #[test]
    fn test_apply() {
        let mut state = State::default();
        Event::Button(Button::Group1Mute, true).apply(&mut state);
        Event::Dial(Dial::Group2, 0.5).apply(&mut state);
        Event::Slider(Slider::Group3, 0.0).apply(&mut state);

        assert!(state.groups[0].mute);
        assert_eq!(state.groups[1].dial, 0.5);
        assert_eq!(state.groups[2].slider, 0.0);
    }
}
