//! TCP state relay
//!
//! Owns one device worker and replicates every state change to any number of
//! TCP clients. Each accepted connection gets its own writer thread and its
//! own set of event queues, so a slow or dead client never blocks the device
//! worker or the other clients. A new client first receives a 51-frame
//! full-state burst, then incremental frames as changes occur.

use crate::settings::{default_state_file_path, ServerSettings};
use faderlink_core::{snapshot_events, Button, Dial, Event, Slider, State};
use faderlink_device::{midi::MidiCommunicator, Communicator, CommunicatorFactory, Device, MessageSink};
use flume::{Receiver, Sender};
use std::io::Write;
use std::net::{Shutdown, TcpListener, TcpStream};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// How long an idle writer sleeps before re-checking shutdown.
const WRITER_WAIT_TIMEOUT: Duration = Duration::from_millis(1000);

/// Minimum interval between state-file writes.
const PERSIST_INTERVAL: Duration = Duration::from_millis(250);

struct ServerShared {
    state: Mutex<State>,
    listening: AtomicBool,
    shutting_down: AtomicBool,
    local_port: AtomicU16,
    state_file: Option<PathBuf>,
    last_persist: Mutex<Instant>,
}

impl ServerShared {
    /// Write the mirrored state to the state file, rate limited. Called from
    /// the device worker thread on every state change.
    fn persist_state(&self, force: bool) {
        let Some(path) = self.state_file.as_ref() else {
            return;
        };

        {
            let mut last = self.last_persist.lock().unwrap();
            if !force && last.elapsed() < PERSIST_INTERVAL {
                return;
            }
            *last = Instant::now();
        }

        let state = *self.state.lock().unwrap();
        let yaml = match serde_yaml::to_string(&state) {
            Ok(yaml) => yaml,
            Err(e) => {
                log::warn!("[server] Failed to serialize state: {}", e);
                return;
            }
        };

        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Err(e) = std::fs::write(path, yaml) {
            log::warn!("[server] Failed to write state file {}: {}", path.display(), e);
        }
    }
}

/// One accepted client connection: its writer thread, event queues, and wake.
struct Connection {
    button_tx: Sender<(Button, bool)>,
    dial_tx: Sender<(Dial, f32)>,
    slider_tx: Sender<(Slider, f32)>,
    wake_tx: Sender<()>,
    complete: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

type ConnectionList = Arc<Mutex<Vec<Connection>>>;

/// Relay server handle. Dropping it stops the listener, disconnects every
/// client, releases the hardware, and joins all owned threads.
pub struct Server {
    shared: Arc<ServerShared>,
    listen_thread: Option<JoinHandle<()>>,
}

impl Server {
    /// Start a relay for the MIDI-attached device.
    pub fn new(settings: ServerSettings) -> Self {
        Self::with_communicator(settings, |sink: MessageSink| {
            Box::new(MidiCommunicator::new(sink)) as Box<dyn Communicator>
        })
    }

    /// Start a relay with a custom hardware transport.
    pub fn with_communicator(settings: ServerSettings, factory: impl CommunicatorFactory) -> Self {
        let state_file = if settings.persist_state {
            Some(
                settings
                    .state_file
                    .clone()
                    .unwrap_or_else(default_state_file_path),
            )
        } else {
            None
        };

        let shared = Arc::new(ServerShared {
            state: Mutex::new(State::default()),
            listening: AtomicBool::new(false),
            shutting_down: AtomicBool::new(false),
            local_port: AtomicU16::new(0),
            state_file,
            last_persist: Mutex::new(Instant::now() - PERSIST_INTERVAL),
        });

        let listen_shared = shared.clone();
        let factory: Box<dyn CommunicatorFactory> = Box::new(factory);

        let listen_thread = std::thread::Builder::new()
            .name("faderlink-listen".into())
            .spawn(move || listen(listen_shared, settings, factory))
            .expect("Failed to spawn listen thread");

        Self {
            shared,
            listen_thread: Some(listen_thread),
        }
    }

    /// Snapshot copy of the mirrored state.
    pub fn state(&self) -> State {
        *self.shared.state.lock().unwrap()
    }

    /// Whether the listener is accepting connections.
    pub fn is_listening(&self) -> bool {
        self.shared.listening.load(Ordering::Acquire)
    }

    /// The bound TCP port, or 0 before the listener is up. Mainly useful with
    /// an ephemeral-port configuration.
    pub fn local_port(&self) -> u16 {
        self.shared.local_port.load(Ordering::Acquire)
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.shared.shutting_down.store(true, Ordering::Release);
        if let Some(thread) = self.listen_thread.take() {
            let _ = thread.join();
        }
        self.shared.persist_state(true);
    }
}

/// Listener thread: bind with retry, own the device, accept clients, reap
/// finished writers, and tear everything down on shutdown.
fn listen(shared: Arc<ServerShared>, settings: ServerSettings, factory: Box<dyn CommunicatorFactory>) {
    let accept_poll = Duration::from_millis(settings.accept_poll_ms);
    let bind_retry = Duration::from_millis(settings.retry_ms);

    let listener = loop {
        if shared.shutting_down.load(Ordering::Acquire) {
            return;
        }
        match TcpListener::bind(("0.0.0.0", settings.port)) {
            Ok(listener) => break listener,
            Err(e) => {
                log::warn!("[server] Failed to bind port {}: {}", settings.port, e);
                std::thread::sleep(bind_retry);
            }
        }
    };

    if let Err(e) = listener.set_nonblocking(true) {
        log::warn!("[server] Failed to make listener non-blocking: {}", e);
        return;
    }

    match listener.local_addr() {
        Ok(addr) => {
            log::info!("[server] Listening on {}", addr);
            shared.local_port.store(addr.port(), Ordering::Release);
        }
        Err(e) => log::warn!("[server] Failed to read local address: {}", e),
    }

    let connections: ConnectionList = Arc::new(Mutex::new(Vec::new()));

    let device = Device::with_communicator(factory);
    register_fan_out(&device, &shared, &connections);

    shared.listening.store(true, Ordering::Release);
    while !shared.shutting_down.load(Ordering::Acquire) {
        match listener.accept() {
            Ok((stream, peer)) => {
                log::info!("[server] Client connected from {}", peer);
                spawn_connection(stream, &shared, &connections);
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(accept_poll);
            }
            Err(e) => {
                log::warn!("[server] Accept failed: {}", e);
                std::thread::sleep(accept_poll);
            }
        }

        prune_connections(&connections);
    }
    shared.listening.store(false, Ordering::Release);

    // Wake every writer so it observes shutdown, then join them all
    loop {
        {
            let conns = connections.lock().unwrap();
            if conns.is_empty() {
                break;
            }
            for connection in conns.iter() {
                let _ = connection.wake_tx.try_send(());
            }
        }
        prune_connections(&connections);
        std::thread::sleep(Duration::from_millis(10));
    }

    // Device dropped here, releasing the hardware and joining its worker
    drop(device);
    log::info!("[server] Stopped");
}

/// Register the fan-out callbacks on the device worker. Each state change
/// updates the mirror, then lands in every live connection's queue. The
/// connections lock is held only for the enumeration and enqueue, never
/// across network I/O.
fn register_fan_out(device: &Device, shared: &Arc<ServerShared>, connections: &ConnectionList) {
    let button_shared = shared.clone();
    let button_connections = connections.clone();
    device.set_button_callback(move |button, pressed| {
        button_shared.state.lock().unwrap().set_button(button, pressed);
        button_shared.persist_state(false);

        for connection in button_connections.lock().unwrap().iter() {
            let _ = connection.button_tx.send((button, pressed));
            let _ = connection.wake_tx.try_send(());
        }
    });

    let dial_shared = shared.clone();
    let dial_connections = connections.clone();
    device.set_dial_callback(move |dial, value| {
        dial_shared.state.lock().unwrap().set_dial(dial, value);
        dial_shared.persist_state(false);

        for connection in dial_connections.lock().unwrap().iter() {
            let _ = connection.dial_tx.send((dial, value));
            let _ = connection.wake_tx.try_send(());
        }
    });

    let slider_shared = shared.clone();
    let slider_connections = connections.clone();
    device.set_slider_callback(move |slider, value| {
        slider_shared.state.lock().unwrap().set_slider(slider, value);
        slider_shared.persist_state(false);

        for connection in slider_connections.lock().unwrap().iter() {
            let _ = connection.slider_tx.send((slider, value));
            let _ = connection.wake_tx.try_send(());
        }
    });
}

/// Spawn the writer thread for one accepted client and register its queues.
///
/// The queues are registered before the writer takes its state snapshot, so no
/// event can fall between the two. An event that lands in both the snapshot
/// and the queue is applied twice, which is harmless because frames carry
/// absolute values.
fn spawn_connection(stream: TcpStream, shared: &Arc<ServerShared>, connections: &ConnectionList) {
    let (button_tx, button_rx) = flume::unbounded();
    let (dial_tx, dial_rx) = flume::unbounded();
    let (slider_tx, slider_rx) = flume::unbounded();
    let (wake_tx, wake_rx) = flume::bounded(1);

    let complete = Arc::new(AtomicBool::new(false));

    connections.lock().unwrap().push(Connection {
        button_tx,
        dial_tx,
        slider_tx,
        wake_tx,
        complete: complete.clone(),
        thread: None,
    });

    let writer_shared = shared.clone();
    let writer_complete = complete;
    let thread = std::thread::Builder::new()
        .name("faderlink-writer".into())
        .spawn(move || {
            write_connection(stream, writer_shared, button_rx, dial_rx, slider_rx, wake_rx);
            writer_complete.store(true, Ordering::Release);
        })
        .expect("Failed to spawn connection writer thread");

    // Only this thread mutates the list, so the entry just pushed is still last
    connections.lock().unwrap().last_mut().unwrap().thread = Some(thread);
}

/// Writer thread body: full-state burst, then drain-and-send on every wake.
/// Any send failure ends this connection only.
fn write_connection(
    mut stream: TcpStream,
    shared: Arc<ServerShared>,
    button_rx: Receiver<(Button, bool)>,
    dial_rx: Receiver<(Dial, f32)>,
    slider_rx: Receiver<(Slider, f32)>,
    wake_rx: Receiver<()>,
) {
    if let Err(e) = stream.set_nodelay(true) {
        // Nagle batching makes the event stream jittery but still correct
        log::warn!("[server] Failed to disable Nagle algorithm: {}", e);
    }

    let snapshot = snapshot_events(&shared.state.lock().unwrap());
    if send_events(&mut stream, &snapshot).is_ok() {
        loop {
            let _ = wake_rx.recv_timeout(WRITER_WAIT_TIMEOUT);

            if shared.shutting_down.load(Ordering::Acquire) {
                break;
            }

            if flush_queues(&mut stream, &button_rx, &dial_rx, &slider_rx).is_err() {
                log::info!("[server] Client connection lost");
                break;
            }
        }
    }

    let _ = stream.shutdown(Shutdown::Both);
}

/// Drain all three queues in button, dial, slider order and send each event.
fn flush_queues(
    stream: &mut TcpStream,
    button_rx: &Receiver<(Button, bool)>,
    dial_rx: &Receiver<(Dial, f32)>,
    slider_rx: &Receiver<(Slider, f32)>,
) -> std::io::Result<()> {
    while let Ok((button, pressed)) = button_rx.try_recv() {
        stream.write_all(&Event::Button(button, pressed).encode())?;
    }
    while let Ok((dial, value)) = dial_rx.try_recv() {
        stream.write_all(&Event::Dial(dial, value).encode())?;
    }
    while let Ok((slider, value)) = slider_rx.try_recv() {
        stream.write_all(&Event::Slider(slider, value).encode())?;
    }
    Ok(())
}

fn send_events(stream: &mut TcpStream, events: &[Event]) -> std::io::Result<()> {
    for event in events {
        stream.write_all(&event.encode())?;
    }
    Ok(())
}

/// Join and drop connections whose writer has finished.
fn prune_connections(connections: &ConnectionList) {
    let mut conns = connections.lock().unwrap();

    for connection in conns.iter_mut() {
        if connection.complete.load(Ordering::Acquire) {
            if let Some(thread) = connection.thread.take() {
                let _ = thread.join();
            }
        }
    }

    conns.retain(|connection| {
        !(connection.complete.load(Ordering::Acquire) && connection.thread.is_none())
    });
}
