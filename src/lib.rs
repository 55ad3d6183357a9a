//! HTTP adapter for a request engine.
//!
//! The [`adapter::Listener`] negotiates media types, encodings and language,
//! runs pluggable [`adapter::Serializer`]s around an [`adapter::Engine`] and
//! finalizes responses with compression, `ETag`s and conditional GET.
//! [`server`] hosts a listener on hyper.

pub mod adapter;
pub mod config;
pub mod http;
pub mod logger;
pub mod serializers;
pub mod server;
