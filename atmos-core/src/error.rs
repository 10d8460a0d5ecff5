use chrono::NaiveDate;
use thiserror::Error;

/// Every way a client call can fail.
///
/// Nothing is retried or recovered internally; each variant reaches the
/// caller exactly as produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AtmosError {
    /// The API key given at construction was empty.
    #[error("API key is missing.")]
    MissingCredential,

    /// A required call argument was empty, or the upstream payload lacked a
    /// field the data model cannot do without.
    #[error("Missing required field: {0}")]
    MissingRequiredField(String),

    /// `days` outside of the range the forecast endpoint accepts.
    #[error("The number of forecast days must be between 1 and 14, got {days}.")]
    InvalidRange { days: u32 },

    #[error("The date must be in the format YYYY-MM-DD, got '{0}'.")]
    InvalidDateFormat(String),

    #[error("The date must be between today and the next 14 days: {date} is outside {earliest}..={latest}.")]
    OutOfRangeDate {
        date: NaiveDate,
        earliest: NaiveDate,
        latest: NaiveDate,
    },

    /// Non-2xx answer from the upstream service, or a transport failure
    /// reported with a synthetic server-error status.
    #[error("Error {status}: {message}")]
    UpstreamRequestFailed { status: u16, message: String },
}

impl AtmosError {
    /// HTTP status carried by [`AtmosError::UpstreamRequestFailed`].
    pub fn status_code(&self) -> Option<u16> {
        match self {
            AtmosError::UpstreamRequestFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn missing(field: impl Into<String>) -> Self {
        AtmosError::MissingRequiredField(field.into())
    }
}

pub type Result<T> = std::result::Result<T, AtmosError>;
