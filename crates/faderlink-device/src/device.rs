//! Device worker
//!
//! Owns one hardware connection and a dedicated thread. The thread drains the
//! inbound message queue into the canonical [`State`], fires user callbacks,
//! re-checks connection liveness, reconnects when unplugged, and pushes queued
//! LED/control commands to the hardware. All public methods are non-blocking;
//! the worker is woken through a coalescing bounded(1) channel and otherwise
//! re-checks liveness once a second on its own.

use crate::communicator::{Communicator, CommunicatorFactory, MessageSink, RawMessage};
use crate::midi::MidiCommunicator;
use crate::sysex;
use faderlink_core::{resolve_control, scale_raw_value, Button, CallbackRegistry, Control, Dial, Led, Slider, State};
use flume::Receiver;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// How long the worker sleeps with no wakeups before re-checking liveness.
const WAIT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Minimum interval between communicator polls.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Outbound command for the hardware.
#[derive(Debug, Clone, Copy)]
enum Command {
    /// Run the SysEx handshake that enables or disables host LED control.
    Control(bool),
    /// Switch one LED on or off.
    Led(Led, bool),
}

struct DeviceShared {
    state: Mutex<State>,
    connected: AtomicBool,
    shutting_down: AtomicBool,
    callbacks: CallbackRegistry,
}

/// Handle to the device worker. Dropping it joins the worker thread after a
/// final command drain, so LED commands queued just before teardown still go
/// out.
pub struct Device {
    shared: Arc<DeviceShared>,
    command_tx: flume::Sender<Command>,
    wake_tx: flume::Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl Device {
    /// Open the device through the MIDI backend.
    pub fn new() -> Self {
        Self::with_communicator(|sink: MessageSink| {
            Box::new(MidiCommunicator::new(sink)) as Box<dyn Communicator>
        })
    }

    /// Open the device with a custom transport.
    ///
    /// The factory runs on the worker thread; the sink it receives is the
    /// transport's path for delivering inbound hardware messages.
    pub fn with_communicator(factory: impl CommunicatorFactory) -> Self {
        let (message_tx, message_rx) = flume::unbounded::<RawMessage>();
        let (command_tx, command_rx) = flume::unbounded::<Command>();
        let (wake_tx, wake_rx) = flume::bounded::<()>(1);

        let shared = Arc::new(DeviceShared {
            state: Mutex::new(State::default()),
            connected: AtomicBool::new(false),
            shutting_down: AtomicBool::new(false),
            callbacks: CallbackRegistry::new(),
        });

        let sink = MessageSink::new(message_tx, wake_tx.clone());
        let worker_shared = shared.clone();
        let factory: Box<dyn CommunicatorFactory> = Box::new(factory);

        let thread = std::thread::Builder::new()
            .name("faderlink-device".into())
            .spawn(move || {
                let communicator = factory.build(sink);
                run(worker_shared, communicator, message_rx, command_rx, wake_rx);
            })
            .expect("Failed to spawn device worker thread");

        Self {
            shared,
            command_tx,
            wake_tx,
            thread: Some(thread),
        }
    }

    /// Whether the hardware is currently connected.
    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::Acquire)
    }

    /// Snapshot copy of the canonical state.
    pub fn state(&self) -> State {
        *self.shared.state.lock().unwrap()
    }

    /// Queue the SysEx handshake that hands LED control to the host (or back
    /// to the device).
    pub fn enable_led_control(&self, enable: bool) {
        self.queue_command(Command::Control(enable));
    }

    /// Queue an LED on/off change.
    pub fn set_led(&self, led: Led, on: bool) {
        self.queue_command(Command::Led(led, on));
    }

    pub fn set_button_callback(&self, callback: impl Fn(Button, bool) + Send + Sync + 'static) {
        self.shared.callbacks.set_button(callback);
    }

    pub fn clear_button_callback(&self) {
        self.shared.callbacks.clear_button();
    }

    pub fn set_dial_callback(&self, callback: impl Fn(Dial, f32) + Send + Sync + 'static) {
        self.shared.callbacks.set_dial(callback);
    }

    pub fn clear_dial_callback(&self) {
        self.shared.callbacks.clear_dial();
    }

    pub fn set_slider_callback(&self, callback: impl Fn(Slider, f32) + Send + Sync + 'static) {
        self.shared.callbacks.set_slider(callback);
    }

    pub fn clear_slider_callback(&self) {
        self.shared.callbacks.clear_slider();
    }

    fn queue_command(&self, command: Command) {
        let _ = self.command_tx.send(command);
        let _ = self.wake_tx.try_send(());
    }
}

impl Default for Device {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        self.shared.shutting_down.store(true, Ordering::Release);
        let _ = self.wake_tx.try_send(());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Worker loop. One pass per wake (or per second with no wakeups): drain
/// inbound messages, poll liveness, reconnect if needed, then drain outbound
/// commands. Exit intent is sampled before the drains so commands queued just
/// ahead of shutdown are still sent.
fn run(
    shared: Arc<DeviceShared>,
    mut communicator: Box<dyn Communicator>,
    message_rx: Receiver<RawMessage>,
    command_rx: Receiver<Command>,
    wake_rx: Receiver<()>,
) {
    log::debug!("[device] Worker thread started");

    let mut last_poll = Instant::now() - POLL_INTERVAL;
    let mut was_connected = false;

    loop {
        // Timeout is the safety net for a missed wake; either way we drain
        // everything below
        let _ = wake_rx.recv_timeout(WAIT_TIMEOUT);

        let should_exit = shared.shutting_down.load(Ordering::Acquire);

        while let Ok(message) = message_rx.try_recv() {
            process_message(&shared, message);
        }

        if last_poll.elapsed() >= POLL_INTERVAL {
            communicator.poll();
            last_poll = Instant::now();
        }

        let mut connected = communicator.is_connected();
        if !connected && !should_exit {
            connected = communicator.connect();
            if connected {
                log::info!("[device] Hardware connected");
            }
        }

        if connected != was_connected {
            shared.connected.store(connected, Ordering::Release);
            if !connected {
                log::info!("[device] Hardware disconnected");
            }
        }
        was_connected = connected;

        if connected {
            while let Ok(command) = command_rx.try_recv() {
                let sent = match command {
                    Command::Control(enable) => send_control_command(&mut *communicator, enable),
                    Command::Led(led, on) => send_led_command(&mut *communicator, led, on),
                };

                if !sent {
                    // Fail fast: a half-sent SysEx leaves the hardware LED
                    // state unknowable, so drop the rest of the queue and
                    // force a reconnect cycle
                    log::warn!("[device] Send failed, discarding queued commands");
                    while command_rx.try_recv().is_ok() {}
                    communicator.connection_lost();
                    break;
                }
            }
        }

        if should_exit {
            break;
        }
    }

    communicator.disconnect();
    shared.connected.store(false, Ordering::Release);
    log::debug!("[device] Worker thread stopped");
}

/// Apply one raw hardware message to the canonical state and fire the matching
/// callback. A control ID belongs to exactly one category; the state lock is
/// released before the callback runs.
fn process_message(shared: &DeviceShared, message: RawMessage) {
    let pressed = message.value != 0;
    let value = scale_raw_value(message.value);

    let control = resolve_control(message.control_id);

    {
        let mut state = shared.state.lock().unwrap();
        match control {
            Control::Button(button) => state.set_button(button, pressed),
            Control::Dial(dial) => state.set_dial(dial, value),
            Control::Slider(slider) => state.set_slider(slider, value),
            Control::None => {}
        }
    }

    match control {
        Control::Button(button) => {
            log::debug!("[device] {} -> {}", button.name(), pressed);
            shared.callbacks.invoke_button(button, pressed);
        }
        Control::Dial(dial) => {
            log::debug!("[device] {} -> {:.3}", dial.name(), value);
            shared.callbacks.invoke_dial(dial, value);
        }
        Control::Slider(slider) => {
            log::debug!("[device] {} -> {:.3}", slider.name(), value);
            shared.callbacks.invoke_slider(slider, value);
        }
        Control::None => {
            log::trace!(
                "[device] Ignoring unrecognized control ID {:#04x}",
                message.control_id
            );
        }
    }
}

/// Run the six-message LED-control handshake as one transport message.
fn send_control_command(communicator: &mut dyn Communicator, enable: bool) -> bool {
    let mut sent = communicator.begin_message();

    sent = sent && communicator.append_message(&sysex::START_SYSEX);
    sent = sent && communicator.append_message(&sysex::SECOND_SYSEX);

    sent = sent && communicator.append_message(&sysex::START_SYSEX);
    if enable {
        let mut main = sysex::MAIN_SYSEX;
        main[sysex::LED_MODE_OFFSET] = 0x01;
        sent = sent && communicator.append_message(&main);
    } else {
        sent = sent && communicator.append_message(&sysex::MAIN_SYSEX);
    }

    sent = sent && communicator.append_message(&sysex::START_SYSEX);
    sent = sent && communicator.append_message(&sysex::END_SYSEX);

    sent && communicator.finalize_message()
}

/// Send a single LED on/off change as a Control Change message.
fn send_led_command(communicator: &mut dyn Communicator, led: Led, on: bool) -> bool {
    let message = [0xB0, led.control_id(), if on { 0x7F } else { 0x00 }];

    let sent = communicator.begin_message() && communicator.append_message(&message);
    sent && communicator.finalize_message()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loopback::Loopback;
    use std::time::Duration;

    fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_raw_message_updates_state_and_fires_callback() {
        let loopback = Loopback::new();
        let device = Device::with_communicator(loopback.factory());

        let (event_tx, event_rx) = flume::unbounded();
        device.set_button_callback(move |button, pressed| {
            let _ = event_tx.send((button, pressed));
        });

        assert!(wait_until(Duration::from_secs(1), || device.is_connected()));

        // Group 1 Mute pressed at full value
        loopback.feed(0x30, 127);

        let (button, pressed) = event_rx.recv_timeout(Duration::from_secs(1)).unwrap();
        assert_eq!(button, Button::Group1Mute);
        assert!(pressed);
        assert!(device.state().groups[0].mute);
    }

    #[test]
    fn test_dial_and_slider_scaling() {
        let loopback = Loopback::new();
        let device = Device::with_communicator(loopback.factory());
        assert!(wait_until(Duration::from_secs(1), || device.is_connected()));

        loopback.feed(0x10, 127); // Group 1 dial at max
        loopback.feed(0x04, 64); // Group 5 slider at mid

        assert!(wait_until(Duration::from_secs(1), || {
            device.state().groups[0].dial == 1.0
        }));
        assert_eq!(device.state().groups[4].slider, 64.0 / 127.0);
    }

    #[test]
    fn test_unknown_control_id_is_ignored() {
        let loopback = Loopback::new();
        let device = Device::with_communicator(loopback.factory());
        assert!(wait_until(Duration::from_secs(1), || device.is_connected()));

        loopback.feed(0x7F, 127);
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(device.state(), State::default());
    }

    #[test]
    fn test_led_command_bytes() {
        let loopback = Loopback::new();
        let device = Device::with_communicator(loopback.factory());
        assert!(wait_until(Duration::from_secs(1), || device.is_connected()));

        device.set_led(Led::Play, true);
        device.set_led(Led::Group1Solo, false);

        assert!(wait_until(Duration::from_secs(1), || {
            loopback.sent_messages().len() == 2
        }));
        let sent = loopback.sent_messages();
        assert_eq!(sent[0], vec![0xB0, 0x29, 0x7F]);
        assert_eq!(sent[1], vec![0xB0, 0x20, 0x00]);
    }

    #[test]
    fn test_led_control_handshake_layout() {
        let loopback = Loopback::new();
        let device = Device::with_communicator(loopback.factory());
        assert!(wait_until(Duration::from_secs(1), || device.is_connected()));

        device.enable_led_control(true);

        assert!(wait_until(Duration::from_secs(1), || {
            !loopback.sent_messages().is_empty()
        }));
        let sent = loopback.sent_messages();
        assert_eq!(sent.len(), 1);

        let expected_len = sysex::START_SYSEX.len() * 3
            + sysex::SECOND_SYSEX.len()
            + sysex::MAIN_SYSEX.len()
            + sysex::END_SYSEX.len();
        assert_eq!(sent[0].len(), expected_len);

        // The LED mode byte inside the main block must be toggled on
        let main_start = sysex::START_SYSEX.len() * 2 + sysex::SECOND_SYSEX.len();
        assert_eq!(sent[0][main_start + sysex::LED_MODE_OFFSET], 0x01);
    }

    #[test]
    fn test_send_failure_discards_queue_and_reconnects() {
        let loopback = Loopback::new();
        let device = Device::with_communicator(loopback.factory());
        assert!(wait_until(Duration::from_secs(1), || device.is_connected()));

        loopback.fail_sends(true);
        device.set_led(Led::Play, true);
        device.set_led(Led::Stop, true);

        // First failure drops the connection and the remaining command
        assert!(wait_until(Duration::from_secs(1), || !device.is_connected()));
        assert!(loopback.sent_messages().is_empty());

        // Worker reconnects on its own once sends work again
        loopback.fail_sends(false);
        assert!(wait_until(Duration::from_secs(2), || device.is_connected()));

        // The discarded commands are not retried
        std::thread::sleep(Duration::from_millis(50));
        assert!(loopback.sent_messages().is_empty());
    }

    #[test]
    fn test_reconnect_resumes_state_updates() {
        let loopback = Loopback::new();
        let device = Device::with_communicator(loopback.factory());
        assert!(wait_until(Duration::from_secs(1), || device.is_connected()));

        loopback.unplug();
        assert!(wait_until(Duration::from_secs(1), || !device.is_connected()));

        loopback.replug();
        assert!(wait_until(Duration::from_secs(2), || device.is_connected()));

        loopback.feed(0x29, 127); // Play
        assert!(wait_until(Duration::from_secs(1), || device.state().play));
    }

    #[test]
    fn test_commands_queued_before_drop_are_sent() {
        let loopback = Loopback::new();
        {
            let device = Device::with_communicator(loopback.factory());
            assert!(wait_until(Duration::from_secs(1), || device.is_connected()));
            device.set_led(Led::Record, true);
            // Dropped immediately; the worker drains once more before exit
        }
        assert_eq!(loopback.sent_messages(), vec![vec![0xB0, 0x2D, 0x7F]]);
    }
}
