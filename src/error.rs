//! User-facing error types for address detection and booking submission.
//!
//! The `Display` text of each variant is exactly what the UI shows.

use thiserror::Error;

use crate::booking::validate::ValidationState;

/// Failure reported by a geolocation source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    PositionUnavailable,
    #[error("timeout")]
    Timeout,
    #[error("{0}")]
    Other(String),
}

/// Why an address could not be detected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetectionError {
    #[error("Location not supported on this device.")]
    Unsupported,
    #[error("Please allow location access.")]
    PermissionDenied,
    #[error("Position unavailable. Turn on GPS.")]
    PositionUnavailable,
    #[error("Location timed out. Try again.")]
    Timeout,
    #[error("Enable location permission and try again.")]
    Other,
    #[error("Could not detect address from coordinates.")]
    Geocoding,
}

impl From<PositionError> for DetectionError {
    fn from(e: PositionError) -> Self {
        match e {
            PositionError::PermissionDenied => Self::PermissionDenied,
            PositionError::PositionUnavailable => Self::PositionUnavailable,
            PositionError::Timeout => Self::Timeout,
            PositionError::Other(_) => Self::Other,
        }
    }
}

/// Why a booking was not created.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// One or more fields failed validation; nothing was sent.
    #[error("Please fix the highlighted fields")]
    Invalid(ValidationState),
    /// The backend answered with a non-2xx status; the body is shown as is.
    #[error("{0}")]
    Rejected(String),
    /// No response at all.
    #[error("Server error")]
    Network,
}

/// The bookings endpoint answered with its own error message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct BookingsRejected(pub String);
