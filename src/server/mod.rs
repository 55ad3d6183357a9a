// Server module entry point
// Accept loop, per-connection serving and signal handling around an adapter listener

pub mod connection;
pub mod listener;
pub mod signal;

// `loop` is a keyword, so the module is exposed as server_loop
#[path = "loop.rs"]
pub mod server_loop;

use crate::adapter::Listener;
use crate::config::Config;
use std::sync::atomic::AtomicUsize;

pub use listener::create_reusable_listener;
pub use server_loop::run;

/// Shared by every connection task
pub struct ServerState {
    pub config: Config,
    pub listener: Listener,
    /// Currently open connections
    pub connections: AtomicUsize,
}

impl ServerState {
    pub const fn new(config: Config, listener: Listener) -> Self {
        Self {
            config,
            listener,
            connections: AtomicUsize::new(0),
        }
    }
}
