//! Turning fetched bytes into artifacts

use crate::error::DecodeError;
use bytes::Bytes;

/// A decoded, in-memory object the cache can hold
///
/// `cost_bytes` is what the cache charges against its byte budget; it should
/// approximate the resident size of the decoded value, not the encoded size.
pub trait Artifact: Send + Sync + 'static {
    /// Approximate resident size in bytes
    fn cost_bytes(&self) -> u64;
}

impl Artifact for image::DynamicImage {
    fn cost_bytes(&self) -> u64 {
        self.as_bytes().len() as u64
    }
}

impl Artifact for Bytes {
    fn cost_bytes(&self) -> u64 {
        self.len() as u64
    }
}

/// Decodes raw bytes into an [`Artifact`]
///
/// Decoding runs on the blocking thread pool, so implementations may do
/// CPU-heavy work.
pub trait ArtifactDecoder: Send + Sync + 'static {
    /// The artifact type produced
    type Output: Artifact;

    /// Decode one encoded resource
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the bytes are not a valid encoding.
    fn decode(&self, bytes: &[u8]) -> Result<Self::Output, DecodeError>;
}

/// Image decoder backed by the `image` crate
///
/// The format is guessed from the content (PNG, JPEG and GIF are enabled).
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageDecoder;

impl ArtifactDecoder for ImageDecoder {
    type Output = image::DynamicImage;

    fn decode(&self, bytes: &[u8]) -> Result<Self::Output, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::new("empty image body"));
        }
        image::load_from_memory(bytes).map_err(|e| DecodeError::new(e.to_string()))
    }
}

/// Keeps the fetched bytes as-is
#[derive(Clone, Copy, Debug, Default)]
pub struct RawBytesDecoder;

impl ArtifactDecoder for RawBytesDecoder {
    type Output = Bytes;

    fn decode(&self, bytes: &[u8]) -> Result<Self::Output, DecodeError> {
        Ok(Bytes::copy_from_slice(bytes))
    }
}
