//! MIDI transport backend
//!
//! Uses midir for cross-platform MIDI I/O (ALSA on Linux, CoreMIDI on macOS,
//! WinMM on Windows). Ports are matched by a case-insensitive substring of the
//! device name. The input callback runs on the MIDI driver thread and must not
//! block; it only parses the Control Change message and pushes it through the
//! [`MessageSink`].

use crate::communicator::{Communicator, MessageSink};
use midir::{MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};

/// Port-name substring of the supported control surface.
pub const DEVICE_NAME: &str = "nanoKONTROL2";

/// Error type for MIDI port discovery and connection.
#[derive(Debug, thiserror::Error)]
pub enum MidiBackendError {
    #[error("Failed to initialize MIDI input: {0}")]
    InputInit(String),

    #[error("Failed to initialize MIDI output: {0}")]
    OutputInit(String),

    #[error("No MIDI port found matching '{0}'")]
    PortNotFound(String),

    #[error("Failed to connect to MIDI port: {0}")]
    Connect(String),
}

/// MIDI-backed hardware transport.
pub struct MidiCommunicator {
    sink: MessageSink,
    input: Option<MidiInputConnection<MessageSink>>,
    output: Option<MidiOutputConnection>,
    pending: Vec<u8>,
}

impl MidiCommunicator {
    pub fn new(sink: MessageSink) -> Self {
        Self {
            sink,
            input: None,
            output: None,
            pending: Vec::new(),
        }
    }

    fn connect_input(&self) -> Result<MidiInputConnection<MessageSink>, MidiBackendError> {
        let midi_in = MidiInput::new("faderlink-in")
            .map_err(|e| MidiBackendError::InputInit(e.to_string()))?;

        let pattern = DEVICE_NAME.to_lowercase();
        let port = midi_in
            .ports()
            .into_iter()
            .find(|port| {
                midi_in
                    .port_name(port)
                    .map(|name| name.to_lowercase().contains(&pattern))
                    .unwrap_or(false)
            })
            .ok_or_else(|| MidiBackendError::PortNotFound(DEVICE_NAME.to_string()))?;

        midi_in
            .connect(&port, "faderlink-input", Self::midi_callback, self.sink.clone())
            .map_err(|e| MidiBackendError::Connect(e.to_string()))
    }

    fn connect_output(&self) -> Result<MidiOutputConnection, MidiBackendError> {
        let midi_out = MidiOutput::new("faderlink-out")
            .map_err(|e| MidiBackendError::OutputInit(e.to_string()))?;

        let pattern = DEVICE_NAME.to_lowercase();
        let port = midi_out
            .ports()
            .into_iter()
            .find(|port| {
                midi_out
                    .port_name(port)
                    .map(|name| name.to_lowercase().contains(&pattern))
                    .unwrap_or(false)
            })
            .ok_or_else(|| MidiBackendError::PortNotFound(DEVICE_NAME.to_string()))?;

        midi_out
            .connect(&port, "faderlink-output")
            .map_err(|e| MidiBackendError::Connect(e.to_string()))
    }

    /// The midir callback. Called from the MIDI driver thread for every
    /// inbound message; forwards Control Change pairs, drops everything else.
    fn midi_callback(_timestamp: u64, data: &[u8], sink: &mut MessageSink) {
        if data.len() >= 3 && data[0] & 0xF0 == 0xB0 {
            sink.raw_message(data[1], data[2]);
        }
    }

    /// Whether a port matching the device name is currently present.
    fn port_present(&self) -> bool {
        let Ok(midi_in) = MidiInput::new("faderlink-poll") else {
            return false;
        };

        let pattern = DEVICE_NAME.to_lowercase();
        midi_in.ports().iter().any(|port| {
            midi_in
                .port_name(port)
                .map(|name| name.to_lowercase().contains(&pattern))
                .unwrap_or(false)
        })
    }
}

impl Communicator for MidiCommunicator {
    fn connect(&mut self) -> bool {
        if self.is_connected() {
            return true;
        }

        let input = match self.connect_input() {
            Ok(input) => input,
            Err(MidiBackendError::PortNotFound(_)) => return false,
            Err(e) => {
                log::debug!("[midi] Input connect failed: {}", e);
                return false;
            }
        };

        // LED control needs the output side too; treat the pair as one unit
        let output = match self.connect_output() {
            Ok(output) => output,
            Err(e) => {
                log::debug!("[midi] Output connect failed: {}", e);
                return false;
            }
        };

        log::info!("[midi] Connected to {}", DEVICE_NAME);
        self.input = Some(input);
        self.output = Some(output);
        true
    }

    fn disconnect(&mut self) {
        self.input = None;
        self.output = None;
    }

    fn poll(&mut self) {
        // midir has no unplug notification; detect removal by re-enumerating
        if self.is_connected() && !self.port_present() {
            log::info!("[midi] Device port disappeared");
            self.disconnect();
        }
    }

    fn is_connected(&self) -> bool {
        self.input.is_some() && self.output.is_some()
    }

    fn begin_message(&mut self) -> bool {
        self.pending.clear();
        self.output.is_some()
    }

    fn append_message(&mut self, bytes: &[u8]) -> bool {
        self.pending.extend_from_slice(bytes);
        true
    }

    fn finalize_message(&mut self) -> bool {
        let Some(output) = self.output.as_mut() else {
            return false;
        };

        match output.send(&self.pending) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("[midi] Send failed: {}", e);
                false
            }
        }
    }

    fn connection_lost(&mut self) {
        self.disconnect();
    }
}
