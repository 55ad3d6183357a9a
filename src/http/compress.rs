//! Response body compression
//!
//! Encoding runs on the blocking pool so large payloads don't stall the
//! connection task. `deflate` is the zlib format (RFC 9110 §8.4.1.2).

use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;
use hyper::body::Bytes;
use hyper::header::HeaderValue;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Gzip,
    Deflate,
}

impl Encoding {
    /// Supported codings in server preference order
    pub const TOKENS: [&'static str; 2] = ["gzip", "deflate"];

    pub fn from_token(token: &str) -> Option<Self> {
        match token.to_ascii_lowercase().as_str() {
            "gzip" => Some(Self::Gzip),
            "deflate" => Some(Self::Deflate),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Deflate => "deflate",
        }
    }

    pub fn header_value(self) -> HeaderValue {
        HeaderValue::from_static(self.as_str())
    }
}

/// Compress `data` off the async runtime
pub async fn compress(encoding: Encoding, data: Bytes) -> io::Result<Bytes> {
    tokio::task::spawn_blocking(move || compress_blocking(encoding, &data))
        .await
        .map_err(io::Error::other)?
}

fn compress_blocking(encoding: Encoding, data: &[u8]) -> io::Result<Bytes> {
    let compressed = match encoding {
        Encoding::Gzip => {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(data)?;
            encoder.finish()?
        }
        Encoding::Deflate => {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(data)?;
            encoder.finish()?
        }
    };
    Ok(Bytes::from(compressed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::{GzDecoder, ZlibDecoder};
    use std::io::Read;

    #[test]
    fn test_tokens() {
        assert_eq!(Encoding::from_token("GZIP"), Some(Encoding::Gzip));
        assert_eq!(Encoding::from_token("br"), None);
        assert_eq!(Encoding::Deflate.as_str(), "deflate");
    }

    #[tokio::test]
    async fn test_gzip_roundtrip() {
        let data = Bytes::from_static(b"hello hello hello hello");
        let compressed = compress(Encoding::Gzip, data.clone()).await.unwrap();
        let mut out = Vec::new();
        GzDecoder::new(&compressed[..]).read_to_end(&mut out).unwrap();
        assert_eq!(out, data);
    }

    #[tokio::test]
    async fn test_deflate_is_zlib() {
        let data = Bytes::from_static(b"payload");
        let compressed = compress(Encoding::Deflate, data.clone()).await.unwrap();
        let mut out = Vec::new();
        ZlibDecoder::new(&compressed[..]).read_to_end(&mut out).unwrap();
        assert_eq!(out, data);
    }
}
