//! Control enumerations for the nanoKONTROL2 surface
//!
//! Each physical control is identified three ways:
//! - its enum variant (used throughout the public API),
//! - its wire ordinal (`as u16`, carried in the `id` field of an event frame),
//! - its hardware control ID (the CC number the device sends/receives).
//!
//! The `None` variants exist because both the hardware ID lookup and the wire
//! ordinal lookup may legitimately miss (unrecognized ID from the device, or a
//! frame from a newer peer).

/// A button on the control surface.
///
/// Transport buttons come first, then the per-group solo/mute/record buttons,
/// matching the order of the initial full-state burst sent to new clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Button {
    None,
    TrackPrevious,
    TrackNext,
    Cycle,
    MarkerSet,
    MarkerPrevious,
    MarkerNext,
    Rewind,
    FastForward,
    Stop,
    Play,
    Record,
    Group1Solo,
    Group1Mute,
    Group1Record,
    Group2Solo,
    Group2Mute,
    Group2Record,
    Group3Solo,
    Group3Mute,
    Group3Record,
    Group4Solo,
    Group4Mute,
    Group4Record,
    Group5Solo,
    Group5Mute,
    Group5Record,
    Group6Solo,
    Group6Mute,
    Group6Record,
    Group7Solo,
    Group7Mute,
    Group7Record,
    Group8Solo,
    Group8Mute,
    Group8Record,
}

/// A dial (knob) on the control surface, one per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Dial {
    None,
    Group1,
    Group2,
    Group3,
    Group4,
    Group5,
    Group6,
    Group7,
    Group8,
}

/// A slider (fader) on the control surface, one per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Slider {
    None,
    Group1,
    Group2,
    Group3,
    Group4,
    Group5,
    Group6,
    Group7,
    Group8,
}

/// An LED on the control surface.
///
/// Only the transport and group buttons with backing lights are listed; the
/// track/marker buttons have no LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Led {
    None,
    Cycle,
    Rewind,
    FastForward,
    Stop,
    Play,
    Record,
    Group1Solo,
    Group1Mute,
    Group1Record,
    Group2Solo,
    Group2Mute,
    Group2Record,
    Group3Solo,
    Group3Mute,
    Group3Record,
    Group4Solo,
    Group4Mute,
    Group4Record,
    Group5Solo,
    Group5Mute,
    Group5Record,
    Group6Solo,
    Group6Mute,
    Group6Record,
    Group7Solo,
    Group7Mute,
    Group7Record,
    Group8Solo,
    Group8Mute,
    Group8Record,
}

// Hardware control ID layout: each group control family occupies a contiguous
// block of eight CC numbers, one per group.
const SLIDER_ID_BASE: u8 = 0x00;
const DIAL_ID_BASE: u8 = 0x10;
const SOLO_ID_BASE: u8 = 0x20;
const MUTE_ID_BASE: u8 = 0x30;
const RECORD_ID_BASE: u8 = 0x40;

impl Button {
    /// All real buttons, in wire-ordinal order (`None` excluded).
    ///
    /// This order is also the button portion of the full-state burst.
    pub const ALL: [Button; 35] = [
        Button::TrackPrevious,
        Button::TrackNext,
        Button::Cycle,
        Button::MarkerSet,
        Button::MarkerPrevious,
        Button::MarkerNext,
        Button::Rewind,
        Button::FastForward,
        Button::Stop,
        Button::Play,
        Button::Record,
        Button::Group1Solo,
        Button::Group1Mute,
        Button::Group1Record,
        Button::Group2Solo,
        Button::Group2Mute,
        Button::Group2Record,
        Button::Group3Solo,
        Button::Group3Mute,
        Button::Group3Record,
        Button::Group4Solo,
        Button::Group4Mute,
        Button::Group4Record,
        Button::Group5Solo,
        Button::Group5Mute,
        Button::Group5Record,
        Button::Group6Solo,
        Button::Group6Mute,
        Button::Group6Record,
        Button::Group7Solo,
        Button::Group7Mute,
        Button::Group7Record,
        Button::Group8Solo,
        Button::Group8Mute,
        Button::Group8Record,
    ];

    /// Look up a button from its wire ordinal.
    pub fn from_ordinal(ordinal: u16) -> Option<Button> {
        match ordinal {
            1..=35 => Some(Self::ALL[usize::from(ordinal) - 1]),
            _ => None,
        }
    }

    /// Look up a button from its hardware control ID.
    pub fn from_control_id(id: u8) -> Button {
        match id {
            0x3A => Button::TrackPrevious,
            0x3B => Button::TrackNext,
            0x2E => Button::Cycle,
            0x3C => Button::MarkerSet,
            0x3D => Button::MarkerPrevious,
            0x3E => Button::MarkerNext,
            0x2B => Button::Rewind,
            0x2C => Button::FastForward,
            0x2A => Button::Stop,
            0x29 => Button::Play,
            0x2D => Button::Record,
            _ => match group_role(id) {
                Some((group, GroupRole::Solo)) => Self::ALL[11 + group * 3],
                Some((group, GroupRole::Mute)) => Self::ALL[12 + group * 3],
                Some((group, GroupRole::Record)) => Self::ALL[13 + group * 3],
                _ => Button::None,
            },
        }
    }

    /// Display name matching the physical labeling.
    pub fn name(self) -> &'static str {
        match self {
            Button::None => "None",
            Button::TrackPrevious => "Track Previous",
            Button::TrackNext => "Track Next",
            Button::Cycle => "Cycle",
            Button::MarkerSet => "Marker Set",
            Button::MarkerPrevious => "Marker Previous",
            Button::MarkerNext => "Marker Next",
            Button::Rewind => "Rewind",
            Button::FastForward => "Fast Forward",
            Button::Stop => "Stop",
            Button::Play => "Play",
            Button::Record => "Record",
            Button::Group1Solo => "Group 1 Solo",
            Button::Group1Mute => "Group 1 Mute",
            Button::Group1Record => "Group 1 Record",
            Button::Group2Solo => "Group 2 Solo",
            Button::Group2Mute => "Group 2 Mute",
            Button::Group2Record => "Group 2 Record",
            Button::Group3Solo => "Group 3 Solo",
            Button::Group3Mute => "Group 3 Mute",
            Button::Group3Record => "Group 3 Record",
            Button::Group4Solo => "Group 4 Solo",
            Button::Group4Mute => "Group 4 Mute",
            Button::Group4Record => "Group 4 Record",
            Button::Group5Solo => "Group 5 Solo",
            Button::Group5Mute => "Group 5 Mute",
            Button::Group5Record => "Group 5 Record",
            Button::Group6Solo => "Group 6 Solo",
            Button::Group6Mute => "Group 6 Mute",
            Button::Group6Record => "Group 6 Record",
            Button::Group7Solo => "Group 7 Solo",
            Button::Group7Mute => "Group 7 Mute",
            Button::Group7Record => "Group 7 Record",
            Button::Group8Solo => "Group 8 Solo",
            Button::Group8Mute => "Group 8 Mute",
            Button::Group8Record => "Group 8 Record",
        }
    }
}

impl Dial {
    /// All real dials, in wire-ordinal (group) order.
    pub const ALL: [Dial; 8] = [
        Dial::Group1,
        Dial::Group2,
        Dial::Group3,
        Dial::Group4,
        Dial::Group5,
        Dial::Group6,
        Dial::Group7,
        Dial::Group8,
    ];

    /// Look up a dial from its wire ordinal.
    pub fn from_ordinal(ordinal: u16) -> Option<Dial> {
        match ordinal {
            1..=8 => Some(Self::ALL[usize::from(ordinal) - 1]),
            _ => None,
        }
    }

    /// Look up a dial from its hardware control ID.
    pub fn from_control_id(id: u8) -> Dial {
        if (DIAL_ID_BASE..DIAL_ID_BASE + 8).contains(&id) {
            Self::ALL[usize::from(id - DIAL_ID_BASE)]
        } else {
            Dial::None
        }
    }

    /// Zero-based group index, `None` for [`Dial::None`].
    pub fn group(self) -> Option<usize> {
        match self {
            Dial::None => None,
            other => Some(other as usize - 1),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Dial::None => "None",
            Dial::Group1 => "Group 1 Dial",
            Dial::Group2 => "Group 2 Dial",
            Dial::Group3 => "Group 3 Dial",
            Dial::Group4 => "Group 4 Dial",
            Dial::Group5 => "Group 5 Dial",
            Dial::Group6 => "Group 6 Dial",
            Dial::Group7 => "Group 7 Dial",
            Dial::Group8 => "Group 8 Dial",
        }
    }
}

impl Slider {
    /// All real sliders, in wire-ordinal (group) order.
    pub const ALL: [Slider; 8] = [
        Slider::Group1,
        Slider::Group2,
        Slider::Group3,
        Slider::Group4,
        Slider::Group5,
        Slider::Group6,
        Slider::Group7,
        Slider::Group8,
    ];

    /// Look up a slider from its wire ordinal.
    pub fn from_ordinal(ordinal: u16) -> Option<Slider> {
        match ordinal {
            1..=8 => Some(Self::ALL[usize::from(ordinal) - 1]),
            _ => None,
        }
    }

    /// Look up a slider from its hardware control ID.
    pub fn from_control_id(id: u8) -> Slider {
        if (SLIDER_ID_BASE..SLIDER_ID_BASE + 8).contains(&id) {
            Self::ALL[usize::from(id - SLIDER_ID_BASE)]
        } else {
            Slider::None
        }
    }

    /// Zero-based group index, `None` for [`Slider::None`].
    pub fn group(self) -> Option<usize> {
        match self {
            Slider::None => None,
            other => Some(other as usize - 1),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Slider::None => "None",
            Slider::Group1 => "Group 1 Slider",
            Slider::Group2 => "Group 2 Slider",
            Slider::Group3 => "Group 3 Slider",
            Slider::Group4 => "Group 4 Slider",
            Slider::Group5 => "Group 5 Slider",
            Slider::Group6 => "Group 6 Slider",
            Slider::Group7 => "Group 7 Slider",
            Slider::Group8 => "Group 8 Slider",
        }
    }
}

impl Led {
    /// The hardware control ID used to address this LED in a Control Change
    /// message. `None` has no meaningful address and maps to 0.
    pub fn control_id(self) -> u8 {
        match self {
            Led::None => 0,
            Led::Cycle => 0x2E,
            Led::Rewind => 0x2B,
            Led::FastForward => 0x2C,
            Led::Stop => 0x2A,
            Led::Play => 0x29,
            Led::Record => 0x2D,
            group_led => {
                // Group LEDs start at ordinal 7, three per group, in
                // solo/mute/record order.
                let index = group_led as u8 - 7;
                let group = index / 3;
                match index % 3 {
                    0 => SOLO_ID_BASE + group,
                    1 => MUTE_ID_BASE + group,
                    _ => RECORD_ID_BASE + group,
                }
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Led::None => "None",
            Led::Cycle => "Cycle",
            Led::Rewind => "Rewind",
            Led::FastForward => "Fast Forward",
            Led::Stop => "Stop",
            Led::Play => "Play",
            Led::Record => "Record",
            Led::Group1Solo => "Group 1 Solo",
            Led::Group1Mute => "Group 1 Mute",
            Led::Group1Record => "Group 1 Record",
            Led::Group2Solo => "Group 2 Solo",
            Led::Group2Mute => "Group 2 Mute",
            Led::Group2Record => "Group 2 Record",
            Led::Group3Solo => "Group 3 Solo",
            Led::Group3Mute => "Group 3 Mute",
            Led::Group3Record => "Group 3 Record",
            Led::Group4Solo => "Group 4 Solo",
            Led::Group4Mute => "Group 4 Mute",
            Led::Group4Record => "Group 4 Record",
            Led::Group5Solo => "Group 5 Solo",
            Led::Group5Mute => "Group 5 Mute",
            Led::Group5Record => "Group 5 Record",
            Led::Group6Solo => "Group 6 Solo",
            Led::Group6Mute => "Group 6 Mute",
            Led::Group6Record => "Group 6 Record",
            Led::Group7Solo => "Group 7 Solo",
            Led::Group7Mute => "Group 7 Mute",
            Led::Group7Record => "Group 7 Record",
            Led::Group8Solo => "Group 8 Solo",
            Led::Group8Mute => "Group 8 Mute",
            Led::Group8Record => "Group 8 Record",
        }
    }
}

/// Per-group button roles, in hardware ID block order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupRole {
    Solo,
    Mute,
    Record,
}

/// Decompose a hardware control ID into (group index, role) if it falls in one
/// of the per-group button blocks.
fn group_role(id: u8) -> Option<(usize, GroupRole)> {
    match id {
        _ if (SOLO_ID_BASE..SOLO_ID_BASE + 8).contains(&id) => {
            Some((usize::from(id - SOLO_ID_BASE), GroupRole::Solo))
        }
        _ if (MUTE_ID_BASE..MUTE_ID_BASE + 8).contains(&id) => {
            Some((usize::from(id - MUTE_ID_BASE), GroupRole::Mute))
        }
        _ if (RECORD_ID_BASE..RECORD_ID_BASE + 8).contains(&id) => {
            Some((usize::from(id - RECORD_ID_BASE), GroupRole::Record))
        }
        _ => None,
    }
}

/// Resolution of a raw hardware control ID to a typed control.
///
/// A control ID maps to at most one category; the precedence is button, then
/// dial, then slider, then ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Button(Button),
    Dial(Dial),
    Slider(Slider),
    None,
}

/// Resolve a raw hardware control ID into a typed control.
pub fn resolve_control(control_id: u8) -> Control {
    let button = Button::from_control_id(control_id);
    if button != Button::None {
        return Control::Button(button);
    }

    let dial = Dial::from_control_id(control_id);
    if dial != Dial::None {
        return Control::Dial(dial);
    }

    let slider = Slider::from_control_id(control_id);
    if slider != Slider::None {
        return Control::Slider(slider);
    }

    Control::None
}
