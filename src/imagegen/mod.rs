//! Image generation via an OpenAI-compatible images API.
//!
//! A prompt goes out, a base64 PNG comes back, and [`fit_image`] crops it
//! to the frame the site displays. The provider sits behind the
//! [`ImageProvider`] trait so the web layer and tests can swap it out.

pub mod fit;
pub mod provider;

use std::fmt;
use std::str::FromStr;

pub use fit::{fit_image, FRAME_HEIGHT, FRAME_WIDTH};
pub use provider::{create_provider, ImageProvider, OpenAiImageProvider};

/// Default images endpoint.
pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/images/generations";

/// Default image model.
pub const DEFAULT_MODEL: &str = "gpt-image-1";

/// Default requested size.
pub const DEFAULT_SIZE: &str = "1024x1024";

/// Requested output size: `<width>x<height>`, or `auto` to let the API pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    Auto,
    Exact { width: u32, height: u32 },
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSize::Auto => f.write_str("auto"),
            ImageSize::Exact { width, height } => write!(f, "{width}x{height}"),
        }
    }
}

impl FromStr for ImageSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(ImageSize::Auto);
        }

        let (w, h) = s.split_once(['x', 'X']).ok_or_else(|| {
            format!("Invalid image size '{s}'. Expected WIDTHxHEIGHT (e.g. 1024x1024) or auto")
        })?;

        let parse = |part: &str| -> Result<u32, String> {
            match part.parse::<u32>() {
                Ok(0) | Err(_) => Err(format!(
                    "Invalid image size '{s}'. Dimensions must be positive integers"
                )),
                Ok(n) => Ok(n),
            }
        };

        Ok(ImageSize::Exact {
            width: parse(w)?,
            height: parse(h)?,
        })
    }
}

/// Settings for talking to the images API.
#[derive(Debug, Clone)]
pub struct ImageApiConfig {
    /// API key; generation fails with [`GenerateError::NotConfigured`] without one.
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    pub size: ImageSize,
}

impl Default for ImageApiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            size: ImageSize::Exact {
                width: 1024,
                height: 1024,
            },
        }
    }
}

/// Errors that can occur during image generation.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// No API key is available.
    #[error("Missing SMILE_IMAGE_API_KEY or OPENAI_API_KEY for AI image generation.")]
    NotConfigured,

    /// Network or connection error when calling the API.
    #[error("Image generation failed: {0}")]
    RequestFailed(String),

    /// The API returned a non-success HTTP status code.
    #[error("Image generation failed ({status}): {body}")]
    HttpError {
        /// HTTP status code.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// The response was not the JSON we expected.
    #[error("Image generation failed: could not parse response: {0}")]
    ParseError(String),

    /// The response had no `data` entries.
    #[error("Image generation failed: no image data returned.")]
    NoImageData,

    /// The first `data` entry had no `b64_json` payload.
    #[error("Image generation failed: missing image payload.")]
    MissingPayload,

    /// The payload was not valid base64.
    #[error("Image generation failed: invalid base64 payload: {0}")]
    DecodeError(String),

    /// The bytes were not an image we can read or write.
    #[error("Image generation failed: {0}")]
    ImageError(String),
}

impl From<image::ImageError> for GenerateError {
    fn from(err: image::ImageError) -> Self {
        GenerateError::ImageError(err.to_string())
    }
}
