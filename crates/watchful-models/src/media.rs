//! Capture-side types: page origin, media constraints, and video frames.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// Errors parsing a page origin.
#[derive(Debug, Error)]
pub enum OriginError {
    #[error("Invalid page URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Page URL has no host: {0}")]
    MissingHost(String),
}

/// Protocol and hostname of the page hosting the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Origin {
    /// URL scheme without the trailing colon (`https`, `http`, ...)
    pub protocol: String,
    pub hostname: String,
}

impl Origin {
    pub fn new(protocol: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            hostname: hostname.into(),
        }
    }

    /// Parse the origin of a page URL.
    pub fn parse(page_url: &str) -> Result<Self, OriginError> {
        let url = Url::parse(page_url)?;
        let hostname = url
            .host_str()
            .ok_or_else(|| OriginError::MissingHost(page_url.to_string()))?;
        Ok(Self::new(url.scheme(), hostname))
    }

    /// Whether camera capture is allowed from this origin.
    ///
    /// HTTPS pages and localhost (including loopback addresses) qualify.
    pub fn is_secure(&self) -> bool {
        let protocol = self.protocol.trim_end_matches(':').to_ascii_lowercase();
        let hostname = self.hostname.to_ascii_lowercase();

        protocol == "https"
            || hostname.contains("localhost")
            || hostname == "127.0.0.1"
            || hostname == "[::1]"
            || hostname == "::1"
    }
}

/// Which camera to request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum FacingMode {
    /// Front camera, facing the viewer
    #[default]
    User,
    /// Rear camera
    Environment,
}

/// Constraints for a video-only capture request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MediaConstraints {
    pub facing_mode: FacingMode,
    pub width: u32,
    pub height: u32,
    /// Audio is never requested
    pub audio: bool,
}

impl MediaConstraints {
    /// Video-only constraints at the given resolution.
    pub fn video(width: u32, height: u32, facing_mode: FacingMode) -> Self {
        Self {
            facing_mode,
            width,
            height,
            audio: false,
        }
    }
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self::video(640, 480, FacingMode::User)
    }
}

/// A captured frame handed to the landmark model.
///
/// Pixel data is shared, so cloning a frame is cheap.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Monotonic frame counter assigned by the stream
    pub sequence: u64,
    pub width: u32,
    pub height: u32,
    pub captured_at: DateTime<Utc>,
    /// Raw pixel buffer in the stream's native layout
    pub data: Arc<[u8]>,
}

impl VideoFrame {
    pub fn new(sequence: u64, width: u32, height: u32, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            sequence,
            width,
            height,
            captured_at: Utc::now(),
            data: data.into(),
        }
    }

    /// Frame without pixel data, for models that read the stream directly.
    pub fn empty(sequence: u64, width: u32, height: u32) -> Self {
        Self::new(sequence, width, height, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_https_is_secure() {
        let origin = Origin::parse("https://video.example.com/watch?v=1").unwrap();
        assert_eq!(origin.protocol, "https");
        assert_eq!(origin.hostname, "video.example.com");
        assert!(origin.is_secure());
    }

    #[test]
    fn test_http_localhost_is_secure() {
        assert!(Origin::parse("http://localhost:5173/").unwrap().is_secure());
        assert!(Origin::parse("http://127.0.0.1:8080/").unwrap().is_secure());
    }

    #[test]
    fn test_plain_http_is_insecure() {
        let origin = Origin::parse("http://video.example.com/").unwrap();
        assert!(!origin.is_secure());
    }

    #[test]
    fn test_protocol_with_colon() {
        // Browsers report `location.protocol` with a trailing colon.
        assert!(Origin::new("https:", "example.com").is_secure());
        assert!(!Origin::new("http:", "example.com").is_secure());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Origin::parse("not a url").is_err());
    }

    #[test]
    fn test_default_constraints() {
        let constraints = MediaConstraints::default();
        assert_eq!((constraints.width, constraints.height), (640, 480));
        assert_eq!(constraints.facing_mode, FacingMode::User);
        assert!(!constraints.audio);
    }
}
