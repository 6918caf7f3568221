//! Controller state model
//!
//! [`State`] is a plain value type: owners keep the canonical copy behind a
//! mutex and hand out full copies, never references. Dial and slider values
//! are the raw 0-127 hardware reading scaled by 1/127, so they always land in
//! [0.0, 1.0].

use crate::controls::{Button, Dial, Slider};
use serde::{Deserialize, Serialize};

/// State of one fader group: dial, slider, and the three group buttons.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Group {
    pub dial: f32,
    pub slider: f32,
    pub solo: bool,
    pub mute: bool,
    pub record: bool,
}

impl Default for Group {
    fn default() -> Self {
        Self {
            dial: 0.0,
            // Faders rest at the top on a freshly powered device
            slider: 1.0,
            solo: false,
            mute: false,
            record: false,
        }
    }
}

/// Full state of the control surface: eight groups plus the transport buttons.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct State {
    pub groups: [Group; 8],

    pub track_previous: bool,
    pub track_next: bool,

    pub cycle: bool,

    pub marker_set: bool,
    pub marker_previous: bool,
    pub marker_next: bool,

    pub rewind: bool,
    pub fast_forward: bool,
    pub stop: bool,
    pub play: bool,
    pub record: bool,
}

impl State {
    /// Read a button value. [`Button::None`] reads as `false`.
    pub fn button(&self, button: Button) -> bool {
        match self.button_field(button) {
            Some(field) => *field,
            None => false,
        }
    }

    /// Write a button value. [`Button::None`] is ignored.
    pub fn set_button(&mut self, button: Button, pressed: bool) {
        if let Some(field) = self.button_field_mut(button) {
            *field = pressed;
        }
    }

    /// Read a dial value. [`Dial::None`] reads as `0.0`.
    pub fn dial(&self, dial: Dial) -> f32 {
        dial.group().map_or(0.0, |group| self.groups[group].dial)
    }

    /// Write a dial value. [`Dial::None`] is ignored.
    pub fn set_dial(&mut self, dial: Dial, value: f32) {
        if let Some(group) = dial.group() {
            self.groups[group].dial = value;
        }
    }

    /// Read a slider value. [`Slider::None`] reads as `0.0`.
    pub fn slider(&self, slider: Slider) -> f32 {
        slider
            .group()
            .map_or(0.0, |group| self.groups[group].slider)
    }

    /// Write a slider value. [`Slider::None`] is ignored.
    pub fn set_slider(&mut self, slider: Slider, value: f32) {
        if let Some(group) = slider.group() {
            self.groups[group].slider = value;
        }
    }

    /// Rising-edge filter between two snapshots.
    ///
    /// Returns a copy of `current` where every button field is true only if it
    /// is pressed in `current` but was not pressed in `previous`. Dial and
    /// slider values are continuous and pass through unchanged. Polling
    /// consumers use this to get "was just pressed" semantics from a
    /// level-triggered snapshot source.
    pub fn newly_pressed(previous: &State, current: &State) -> State {
        let mut only_new = *current;

        for (group, previous_group) in only_new.groups.iter_mut().zip(previous.groups.iter()) {
            group.solo = group.solo && !previous_group.solo;
            group.mute = group.mute && !previous_group.mute;
            group.record = group.record && !previous_group.record;
        }

        only_new.track_previous = current.track_previous && !previous.track_previous;
        only_new.track_next = current.track_next && !previous.track_next;

        only_new.cycle = current.cycle && !previous.cycle;

        only_new.marker_set = current.marker_set && !previous.marker_set;
        only_new.marker_previous = current.marker_previous && !previous.marker_previous;
        only_new.marker_next = current.marker_next && !previous.marker_next;

        only_new.rewind = current.rewind && !previous.rewind;
        only_new.fast_forward = current.fast_forward && !previous.fast_forward;
        only_new.stop = current.stop && !previous.stop;
        only_new.play = current.play && !previous.play;
        only_new.record = current.record && !previous.record;

        only_new
    }

    fn button_field(&self, button: Button) -> Option<&bool> {
        Some(match button {
            Button::None => return None,
            Button::TrackPrevious => &self.track_previous,
            Button::TrackNext => &self.track_next,
            Button::Cycle => &self.cycle,
            Button::MarkerSet => &self.marker_set,
            Button::MarkerPrevious => &self.marker_previous,
            Button::MarkerNext => &self.marker_next,
            Button::Rewind => &self.rewind,
            Button::FastForward => &self.fast_forward,
            Button::Stop => &self.stop,
            Button::Play => &self.play,
            Button::Record => &self.record,
            group_button => {
                let index = group_button as usize - Button::Group1Solo as usize;
                let group = &self.groups[index / 3];
                match index % 3 {
                    0 => &group.solo,
                    1 => &group.mute,
                    _ => &group.record,
                }
            }
        })
    }

    fn button_field_mut(&mut self, button: Button) -> Option<&mut bool> {
        Some(match button {
            Button::None => return None,
            Button::TrackPrevious => &mut self.track_previous,
            Button::TrackNext => &mut self.track_next,
            Button::Cycle => &mut self.cycle,
            Button::MarkerSet => &mut self.marker_set,
            Button::MarkerPrevious => &mut self.marker_previous,
            Button::MarkerNext => &mut self.marker_next,
            Button::Rewind => &mut self.rewind,
            Button::FastForward => &mut self.fast_forward,
            Button::Stop => &mut self.stop,
            Button::Play => &mut self.play,
            Button::Record => &mut self.record,
            group_button => {
                let index = group_button as usize - Button::Group1Solo as usize;
                let group = &mut self.groups[index / 3];
                match index % 3 {
                    0 => &mut group.solo,
                    1 => &mut group.mute,
                    _ => &mut group.record,
                }
            }
        })
    }
}

/// Scale a raw 0-127 hardware value into [0.0, 1.0].
pub fn scale_raw_value(raw: u8) -> f32 {
    f32::from(raw) / 127.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = State::default();
        for group in &state.groups {
            assert_eq!(group.dial, 0.0);
            assert_eq!(group.slider, 1.0);
            assert!(!group.solo && !group.mute && !group.record);
        }
        assert!(!state.play);
    }

    #[test]
    fn test_button_accessors() {
        let mut state = State::default();
        state.set_button(Button::Group4Mute, true);
        assert!(state.groups[3].mute);
        assert!(state.button(Button::Group4Mute));

        state.set_button(Button::Play, true);
        assert!(state.play);

        // None is ignored on write and false on read
        state.set_button(Button::None, true);
        assert!(!state.button(Button::None));
    }

    #[test]
    fn test_dial_slider_accessors() {
        let mut state = State::default();
        state.set_dial(Dial::Group2, 0.25);
        assert_eq!(state.groups[1].dial, 0.25);
        assert_eq!(state.dial(Dial::Group2), 0.25);

        state.set_slider(Slider::Group8, 0.5);
        assert_eq!(state.groups[7].slider, 0.5);

        state.set_dial(Dial::None, 0.75);
        assert_eq!(state, {
            let mut expected = State::default();
            expected.set_dial(Dial::Group2, 0.25);
            expected.set_slider(Slider::Group8, 0.5);
            expected
        });
    }

    #[test]
    fn test_newly_pressed_idempotent() {
        // No self-transition counts as new
        let mut state = State::default();
        state.cycle = true;
        state.groups[0].solo = true;
        state.groups[5].record = true;

        let only_new = State::newly_pressed(&state, &state);
        for button in Button::ALL {
            assert!(!only_new.button(button), "{} should not be new", button.name());
        }
    }

    #[test]
    fn test_newly_pressed_rising_edge() {
        let previous = State::default();
        let mut current = State::default();
        current.cycle = true;

        let only_new = State::newly_pressed(&previous, &current);
        assert!(only_new.cycle);

        // Held across both snapshots is no longer new
        let held = State::newly_pressed(&current, &current);
        assert!(!held.cycle);
    }

    #[test]
    fn test_newly_pressed_passes_continuous_values() {
        let mut previous = State::default();
        previous.groups[2].dial = 0.9;

        let mut current = State::default();
        current.groups[2].dial = 0.3;
        current.groups[6].slider = 0.7;

        let only_new = State::newly_pressed(&previous, &current);
        assert_eq!(only_new.groups[2].dial, 0.3);
        assert_eq!(only_new.groups[6].slider, 0.7);
    }

    #[test]
    fn test_scale_raw_value() {
        assert_eq!(scale_raw_value(0), 0.0);
        assert_eq!(scale_raw_value(127), 1.0);
        for raw in 0..=127u8 {
            let value = scale_raw_value(raw);
            assert!((0.0..=1.0).contains(&value));
            assert_eq!(value, f32::from(raw) / 127.0);
        }
    }

    #[test]
    fn test_state_serializes_to_yaml() {
        let mut state = State::default();
        state.groups[3].mute = true;
        state.groups[0].slider = 0.5;

        let yaml = serde_yaml::to_string(&state).unwrap();
        let parsed: State = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, state);
    }
}
