//! TCP state client
//!
//! Maintains a replica of a remote relay's state. A dedicated thread connects,
//! reads 8-byte event frames, applies them to the replica, and fires user
//! callbacks. On any transport error it drops the connection and retries, so a
//! client can outlive server restarts and come back with a fresh full-state
//! burst.

use crate::settings::ClientSettings;
use faderlink_core::{Button, CallbackRegistry, Dial, Event, Slider, State, FRAME_SIZE};
use flume::Receiver;
use std::io::Read;
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

/// Timeout for the TCP connect itself.
const CONNECT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Read timeout; bounds how quickly the reader observes shutdown.
const READ_TIMEOUT: Duration = Duration::from_millis(100);

struct ClientShared {
    state: Mutex<State>,
    connected: AtomicBool,
    shutting_down: AtomicBool,
    callbacks: CallbackRegistry,
}

/// Handle to the client reader thread. Dropping it disconnects and joins.
pub struct Client {
    shared: Arc<ClientShared>,
    wake_tx: flume::Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl Client {
    /// Connect to a relay on the default port.
    pub fn new(host: impl Into<String>) -> Self {
        Self::with_settings(ClientSettings {
            host: host.into(),
            ..ClientSettings::default()
        })
    }

    /// Connect with explicit settings.
    pub fn with_settings(settings: ClientSettings) -> Self {
        let shared = Arc::new(ClientShared {
            state: Mutex::new(State::default()),
            connected: AtomicBool::new(false),
            shutting_down: AtomicBool::new(false),
            callbacks: CallbackRegistry::new(),
        });

        let (wake_tx, wake_rx) = flume::bounded::<()>(1);

        let reader_shared = shared.clone();
        let thread = std::thread::Builder::new()
            .name("faderlink-client".into())
            .spawn(move || run(reader_shared, settings, wake_rx))
            .expect("Failed to spawn client reader thread");

        Self {
            shared,
            wake_tx,
            thread: Some(thread),
        }
    }

    /// Whether a server connection is currently up.
    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::Acquire)
    }

    /// Snapshot copy of the replicated state.
    pub fn state(&self) -> State {
        *self.shared.state.lock().unwrap()
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
}

impl Drop for Client {
    fn drop(&mut self) {
        self.shared.shutting_down.store(true, Ordering::Release);
        let _ = self.wake_tx.try_send(());
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Reader thread body: connect, stream frames, retry on any failure.
fn run(shared: Arc<ClientShared>, settings: ClientSettings, wake_rx: Receiver<()>) {
    let retry = Duration::from_millis(settings.retry_ms);

    while !shared.shutting_down.load(Ordering::Acquire) {
        match open_connection(&settings) {
            Ok(stream) => {
                log::info!("[client] Connected to {}:{}", settings.host, settings.port);
                shared.connected.store(true, Ordering::Release);

                if let Err(e) = read_frames(&shared, &stream) {
                    if !shared.shutting_down.load(Ordering::Acquire) {
                        log::info!("[client] Connection lost: {}", e);
                    }
                }

                let _ = stream.shutdown(Shutdown::Both);
                shared.connected.store(false, Ordering::Release);
            }
            Err(e) => {
                log::debug!(
                    "[client] Connect to {}:{} failed: {}",
                    settings.host,
                    settings.port,
                    e
                );
            }
        }

        if shared.shutting_down.load(Ordering::Acquire) {
            break;
        }
        // Retry wait, interruptible by shutdown wake
        let _ = wake_rx.recv_timeout(retry);
    }
}

fn open_connection(settings: &ClientSettings) -> std::io::Result<TcpStream> {
    let addr = resolve(settings)?;
    let stream = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)?;
    stream.set_read_timeout(Some(READ_TIMEOUT))?;
    stream.set_nodelay(true)?;
    Ok(stream)
}

fn resolve(settings: &ClientSettings) -> std::io::Result<SocketAddr> {
    (settings.host.as_str(), settings.port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("No address found for {}", settings.host),
            )
        })
}

/// Stream frames until the connection breaks or shutdown is requested.
fn read_frames(shared: &ClientShared, stream: &TcpStream) -> std::io::Result<()> {
    let mut stream = stream;

    while !shared.shutting_down.load(Ordering::Acquire) {
        let Some(frame) = receive_frame(&mut stream)? else {
            continue;
        };

        match Event::decode(&frame) {
            Some(event) => apply_event(shared, event),
            // A frame we cannot decode is skipped, not fatal; the stream
            // stays aligned because frames are fixed size
            None => log::debug!("[client] Skipping unrecognized frame {:02x?}", frame),
        }
    }

    Ok(())
}

/// Read one complete frame if available.
///
/// Peeks first so a partially arrived frame is never consumed; `read_exact`
/// only runs once all 8 bytes are buffered. Returns `Ok(None)` when no
/// complete frame is ready yet.
fn receive_frame(stream: &mut &TcpStream) -> std::io::Result<Option<[u8; FRAME_SIZE]>> {
    let mut frame = [0u8; FRAME_SIZE];

    match stream.peek(&mut frame) {
        Ok(0) => Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "Server closed the connection",
        )),
        Ok(n) if n < FRAME_SIZE => {
            // Partial frame in flight; let the rest arrive
            std::thread::sleep(Duration::from_millis(1));
            Ok(None)
        }
        Ok(_) => {
            stream.read_exact(&mut frame)?;
            Ok(Some(frame))
        }
        Err(e)
            if e.kind() == std::io::ErrorKind::WouldBlock
                || e.kind() == std::io::ErrorKind::TimedOut =>
        {
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Apply one decoded event to the replica and fire the matching callback.
/// The state lock is released before the callback runs.
fn apply_event(shared: &ClientShared, event: Event) {
    {
        let mut state = shared.state.lock().unwrap();
        event.apply(&mut state);
    }

    match event {
        Event::Button(button, pressed) => shared.callbacks.invoke_button(button, pressed),
        Event::Dial(dial, value) => shared.callbacks.invoke_dial(dial, value),
        Event::Slider(slider, value) => shared.callbacks.invoke_slider(slider, value),
    }
}
