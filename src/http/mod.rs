//! HTTP protocol layer
//!
//! Header negotiation, compression, validators and the transport handles the
//! adapter writes into. Nothing here knows about serializers or the engine.

pub mod cache;
pub mod compress;
pub mod negotiate;
pub mod response;
pub mod transport;

pub use compress::Encoding;
pub use response::{build_413_response, into_hyper};
pub use transport::{RawRequest, RawResponse, RequestBody};
