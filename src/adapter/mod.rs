//! Protocol adapter between HTTP and a request engine
//!
//! A [`Listener`] takes a [`RawRequest`](crate::http::RawRequest), runs it
//! through content negotiation and the registered [`Serializer`]s, calls the
//! [`Engine`] and writes the result into a
//! [`RawResponse`](crate::http::RawResponse).

mod context;
mod error;
mod finalize;
pub mod messages;
mod negotiation;
mod pipeline;
mod registry;
mod serializer;
mod settings;
mod status;

pub use context::{ContextRequest, ContextResponse, Meta, Payload, RequestMeta, ResponseKind};
pub use error::{BoxError, DomainError, Error};
pub use finalize::Finalizer;
pub use messages::Messages;
pub use negotiation::Negotiation;
pub use pipeline::{Listener, ListenerOptions};
pub use registry::{SerializerEntry, SerializerFactory, SerializerRegistry};
pub use serializer::{Engine, Serializer};
pub use settings::Settings;
pub use status::StatusMap;
