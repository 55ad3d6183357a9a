//! Listener settings

use serde::{Deserialize, Serialize};

/// Behaviour switches fixed at listener construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    /// End the transport response; when false the listener hands back the
    /// computed response and the host finishes it
    #[serde(default = "default_true")]
    pub end_response: bool,
    /// Negotiate gzip/deflate from `Accept-Encoding`
    #[serde(default = "default_true")]
    pub use_compression: bool,
    /// Emit weak `ETag`s and answer conditional GETs
    #[serde(default = "default_true")]
    pub use_etag: bool,
}

#[allow(clippy::missing_const_for_fn)]
fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            end_response: true,
            use_compression: true,
            use_etag: true,
        }
    }
}
