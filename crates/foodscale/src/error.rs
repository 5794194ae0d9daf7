//! Error taxonomy for estimation requests.
//!
//! Only malformed input stops a request. Calibration and segmentation
//! fallbacks are not errors; they surface as `status = "degraded"` on the
//! result instead.

use crate::pipeline::Stage;

/// Client-side faults: the request cannot be turned into a decoded image and
/// valid scalar parameters. Never retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    /// The request carried no image payload.
    #[error("missing img field in request")]
    MissingImage,
    /// The image text was not valid base64.
    #[error("invalid base64 image data: {0}")]
    InvalidEncoding(String),
    /// A byte-array payload contained a value outside the byte range.
    #[error("invalid byte array image data: value {0} is outside -128..=255")]
    InvalidByteArray(i64),
    /// The bytes did not decode to a raster image.
    #[error("could not decode image: {0}")]
    Undecodable(String),
    /// The decoded raster has no pixels.
    #[error("image is empty ({width}x{height})")]
    EmptyImage {
        /// Decoded width in pixels.
        width: u32,
        /// Decoded height in pixels.
        height: u32,
    },
    /// The declared reference diameter is NaN, infinite, zero or negative.
    #[error("plate diameter must be finite and > 0, got {0}")]
    InvalidDiameter(f64),
}

impl InputError {
    /// Machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingImage => "missing_image",
            Self::InvalidEncoding(_) => "invalid_encoding",
            Self::InvalidByteArray(_) => "invalid_byte_array",
            Self::Undecodable(_) => "undecodable_image",
            Self::EmptyImage { .. } => "empty_image",
            Self::InvalidDiameter(_) => "invalid_diameter",
        }
    }
}

/// Failure of a single estimation call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EstimateError {
    /// Malformed input, rejected before the `Decoded` stage.
    #[error(transparent)]
    Input(#[from] InputError),
    /// A non-finite value survived clamping. Internal fault.
    #[error("non-finite {quantity} produced during {stage}")]
    Computation {
        /// Stage that produced the value.
        stage: Stage,
        /// Name of the offending quantity.
        quantity: &'static str,
    },
}

impl EstimateError {
    /// Machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Input(e) => e.kind(),
            Self::Computation { .. } => "computation_error",
        }
    }

    /// `true` for faults caused by the caller's request.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Input(_))
    }

    /// HTTP-equivalent status code (4xx for input, 5xx for internal faults).
    pub fn status_code(&self) -> u16 {
        if self.is_client_error() {
            400
        } else {
            500
        }
    }
}

/// Serializable error body returned instead of a result.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable kind, see [`EstimateError::kind`].
    pub error: String,
    /// Human-readable description.
    pub message: String,
}

impl From<&EstimateError> for ErrorResponse {
    fn from(e: &EstimateError) -> Self {
        Self {
            error: e.kind().to_string(),
            message: e.to_string(),
        }
    }
}

/// Errors raised while loading configuration or catalog files.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid JSON for the expected schema.
    #[error("failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),
    /// The parsed values violate a constraint.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
