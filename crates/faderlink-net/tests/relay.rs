//! End-to-end relay tests over real TCP sockets on localhost, with the
//! loopback transport standing in for the hardware.

use faderlink_core::{Button, Dial, Event, State, FRAME_SIZE};
use faderlink_device::loopback::Loopback;
use faderlink_net::{Client, ClientSettings, Server, ServerSettings};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::time::{Duration, Instant};

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

fn start_server(settings: ServerSettings) -> (Server, Loopback, u16) {
    let loopback = Loopback::new();
    let server = Server::with_communicator(settings, loopback.factory());
    assert!(wait_until(Duration::from_secs(2), || server.is_listening()));

    let port = server.local_port();
    assert_ne!(port, 0);
    (server, loopback, port)
}

fn connect_raw(port: u16) -> TcpStream {
    let stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();
    stream
}

fn read_event(stream: &mut TcpStream) -> Event {
    let mut frame = [0u8; FRAME_SIZE];
    stream.read_exact(&mut frame).unwrap();
    Event::decode(&frame).expect("Undecodable frame on the wire")
}

fn read_burst(stream: &mut TcpStream) -> Vec<Event> {
    (0..51).map(|_| read_event(stream)).collect()
}

fn ephemeral_settings() -> ServerSettings {
    ServerSettings {
        port: 0,
        ..ServerSettings::default()
    }
}

#[test]
fn test_late_joiner_receives_full_state_burst() {
    let (server, loopback, port) = start_server(ephemeral_settings());

    // Group 4 Mute pressed before anyone is connected
    loopback.feed(0x33, 127);
    assert!(wait_until(Duration::from_secs(1), || {
        server.state().groups[3].mute
    }));

    let mut stream = connect_raw(port);
    let burst = read_burst(&mut stream);

    assert_eq!(burst.len(), 51);
    assert!(burst.contains(&Event::Button(Button::Group4Mute, true)));
    assert!(burst.contains(&Event::Button(Button::Play, false)));
}

#[test]
fn test_fan_out_and_slow_client_isolation() {
    let (_server, loopback, port) = start_server(ephemeral_settings());

    let mut first = connect_raw(port);
    let mut second = connect_raw(port);
    read_burst(&mut first);
    read_burst(&mut second);

    // Both clients see the same incremental event
    loopback.feed(0x29, 127); // Play
    assert_eq!(read_event(&mut first), Event::Button(Button::Play, true));
    assert_eq!(read_event(&mut second), Event::Button(Button::Play, true));

    // One client going away must not affect the other
    drop(first);
    loopback.feed(0x2A, 127); // Stop
    assert_eq!(read_event(&mut second), Event::Button(Button::Stop, true));
}

#[test]
fn test_end_to_end_replication() {
    let (server, loopback, port) = start_server(ephemeral_settings());

    let client = Client::with_settings(ClientSettings {
        host: "127.0.0.1".to_string(),
        port,
        retry_ms: 100,
    });
    assert!(wait_until(Duration::from_secs(2), || client.is_connected()));

    let (event_tx, event_rx) = flume::unbounded();
    client.set_button_callback(move |button, pressed| {
        let _ = event_tx.send((button, pressed));
    });

    loopback.feed(0x30, 127); // Group 1 Mute

    let (button, pressed) = event_rx.recv_timeout(Duration::from_secs(2)).unwrap();
    assert_eq!(button, Button::Group1Mute);
    assert!(pressed);

    assert!(wait_until(Duration::from_secs(1), || {
        client.state().groups[0].mute
    }));
    assert_eq!(client.state(), server.state());
}

#[test]
fn test_client_retries_until_server_appears() {
    // Reserve a port, then release it for the server to claim
    let probe = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = probe.local_addr().unwrap().port();
    drop(probe);

    let client = Client::with_settings(ClientSettings {
        host: "127.0.0.1".to_string(),
        port,
        retry_ms: 100,
    });
    std::thread::sleep(Duration::from_millis(200));
    assert!(!client.is_connected());

    let loopback = Loopback::new();
    let _server = Server::with_communicator(
        ServerSettings {
            port,
            ..ServerSettings::default()
        },
        loopback.factory(),
    );

    assert!(wait_until(Duration::from_secs(3), || client.is_connected()));
    assert_eq!(client.state(), State::default());
}

#[test]
fn test_split_frame_is_not_consumed_until_complete() {
    // Stand in for the server so frame boundaries can be controlled exactly
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let client = Client::with_settings(ClientSettings {
        host: "127.0.0.1".to_string(),
        port,
        retry_ms: 100,
    });

    let (mut stream, _) = listener.accept().unwrap();
    stream.set_nodelay(true).unwrap();
    assert!(wait_until(Duration::from_secs(2), || client.is_connected()));

    // First 3 bytes of a frame: the client must not consume anything yet
    let frame = Event::Button(Button::Group1Mute, true).encode();
    stream.write_all(&frame[..3]).unwrap();
    std::thread::sleep(Duration::from_millis(100));
    assert!(!client.state().groups[0].mute);
    assert!(client.is_connected());

    // The rest of the frame plus a follow-up frame apply in order
    stream.write_all(&frame[3..]).unwrap();
    stream
        .write_all(&Event::Dial(Dial::Group2, 0.25).encode())
        .unwrap();

    assert!(wait_until(Duration::from_secs(1), || {
        client.state().groups[1].dial == 0.25
    }));
    assert!(client.state().groups[0].mute);
}

#[test]
fn test_state_file_is_written() {
    let dir = std::env::temp_dir().join("faderlink-relay-test");
    std::fs::create_dir_all(&dir).unwrap();
    let state_file = dir.join("state.yaml");
    std::fs::remove_file(&state_file).ok();

    let settings = ServerSettings {
        port: 0,
        persist_state: true,
        state_file: Some(state_file.clone()),
        ..ServerSettings::default()
    };
    let (server, loopback, _port) = start_server(settings);

    loopback.feed(0x33, 127); // Group 4 Mute
    assert!(wait_until(Duration::from_secs(1), || {
        server.state().groups[3].mute
    }));

    // Dropping the server flushes a final write
    drop(server);

    let text = std::fs::read_to_string(&state_file).unwrap();
    let state: State = serde_yaml::from_str(&text).unwrap();
    assert!(state.groups[3].mute);
    assert_eq!(state.groups[0].slider, 1.0);

    std::fs::remove_file(&state_file).ok();
}
