//! Logger module
//!
//! Server lifecycle lines, access logging in several formats, and error
//! and warning lines. Everything falls back to stdout/stderr until
//! [`init`] has been called, so the adapter can log from tests and
//! embedded hosts without setup.

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use chrono::Local;
use std::net::SocketAddr;
use writer::Level;

/// Initialize the logger with configuration. Call once at startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        Level::parse(&config.logging.level),
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_info(message),
        None => println!("{message}"),
    }
}

fn write_error(level: Level, message: &str) {
    let line = format!("{} {message}", timestamp());
    match writer::get() {
        Some(w) if w.enabled(level) => w.write_error(&line),
        Some(_) => {}
        None => eprintln!("{line}"),
    }
}

fn write_access(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config, media_types: &[String]) {
    write_info("======================================");
    write_info("Resource HTTP listener started");
    write_info(&format!("Listening on: http://{addr}"));
    write_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        write_info(&format!("Worker threads: {workers}"));
    }
    write_info(&format!("Serializers: {}", media_types.join(", ")));
    write_info(&format!(
        "Compression: {}, ETag: {}, end response: {}",
        config.http.use_compression,
        config.http.use_etag,
        config.http.end_response,
    ));
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("Error log: {path}"));
    }
    write_info("======================================\n");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    write_info(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(
        Level::Error,
        &format!("[ERROR] Failed to serve connection: {err:?}"),
    );
}

pub fn log_error(message: &str) {
    write_error(Level::Error, &format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(Level::Warn, &format!("[WARN] {message}"));
}

/// Error handed back by the listener after the client got its response
pub fn log_listener_failure(method: &str, path: &str, error: &crate::adapter::Error) {
    write_error(
        Level::Warn,
        &format!("[LISTENER] {method} {path} failed: {error}"),
    );
}

pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_access(&entry.format(format));
}

pub fn log_shutdown(active_connections: usize) {
    write_info(&format!(
        "[Shutdown] Stopped accepting; {active_connections} connection(s) still open"
    ));
}
