//! TCP state relay and client for faderlink
//!
//! The [`Server`] owns the hardware through a device worker and fans every
//! state change out to connected TCP clients; each [`Client`] keeps a local
//! replica of the server's state and fires the same callbacks the device
//! would. The wire protocol is a stream of fixed-size 8-byte event frames; a
//! freshly connected client first receives a full-state burst, then
//! incremental frames.

mod client;
mod server;
mod settings;

pub use client::Client;
pub use server::Server;
pub use settings::{
    default_settings_path, default_state_file_path, load_server_settings, ClientSettings,
    ServerSettings,
};
