// ⚠️ Error taxonomy - remote calls, local edit validation, relay endpoints

use crate::edit::FieldKind;
use crate::phone::MobileRejection;
use thiserror::Error;

// ============================================================================
// REMOTE CALL ERRORS
// ============================================================================

/// Failure of one of the three outbound calls (fetch, update, notify).
///
/// A timeout is an ordinary failure, not a separate terminal state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("server responded with HTTP {0}")]
    Status(u16),

    /// HTML error page or other non-JSON body where JSON was expected
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The remote end answered with an explicit error
    #[error("{0}")]
    Rejected(String),

    #[error("messaging credentials are not configured")]
    MissingCredentials,
}

impl ApiError {
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if let Some(status) = err.status() {
            ApiError::Status(status.as_u16())
        } else if err.is_decode() {
            ApiError::Malformed(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }

    /// Message shown to the operator (Marathi, like the rest of the UI copy)
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Timeout => "विनंती टाइमआउट! कृपया नंतर पुन्हा प्रयत्न करा।".to_string(),
            ApiError::Network(_) => {
                "नेटवर्क त्रुटी: सर्व्हरशी कनेक्ट होऊ शकले नाही। कृपया इंटरनेट कनेक्शन तपासा।"
                    .to_string()
            }
            ApiError::Status(code) => {
                format!("सर्व्हर त्रुटी: {}. कृपया नंतर पुन्हा प्रयत्न करा।", code)
            }
            ApiError::Malformed(_) => "API कडून डेटा मिळवण्यात समस्या आली।".to_string(),
            ApiError::Rejected(message) => format!("त्रुटी: {}", message),
            ApiError::MissingCredentials => {
                "WhatsApp क्रेडेन्शियल्स कॉन्फिगर केलेले नाहीत।".to_string()
            }
        }
    }
}

// ============================================================================
// INLINE EDIT ERRORS
// ============================================================================

/// Local edit failures. None of these ever reach the network.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("no {0} edit is active")]
    NotEditing(FieldKind),

    #[error("a {0} save is already in progress")]
    SaveInFlight(FieldKind),

    #[error("invalid mobile number: {0}")]
    InvalidMobile(MobileRejection),

    #[error("record has no voter card id")]
    MissingVoterCardId,

    #[error("record {0} not found")]
    RecordNotFound(String),
}

// ============================================================================
// RELAY ERRORS
// ============================================================================

/// Update Relay failures, rendered as `{status: "error", message}`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpdateError {
    #[error("Invalid JSON input")]
    InvalidJson,

    #[error("Missing required field: epic_id")]
    MissingEpicId,

    #[error("Invalid mobile number format. Must be 10 digits or empty.")]
    InvalidMobile,

    #[error("Database error: {0}")]
    Storage(String),

    #[error("Contact history needs a database")]
    NoDatabase,
}

impl UpdateError {
    pub fn status_code(&self) -> u16 {
        match self {
            UpdateError::Storage(_) => 500,
            UpdateError::NoDatabase => 404,
            _ => 400,
        }
    }
}

/// Messaging Proxy failures, rendered as `{success: false, error, message}`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProxyError {
    #[error("Missing required fields: phone_number, message, phone_number_id, api_key")]
    MissingFields,

    #[error("{message}")]
    Provider { status: u16, message: String },

    #[error("{0}")]
    Transport(String),
}

impl ProxyError {
    pub fn status_code(&self) -> u16 {
        match self {
            ProxyError::MissingFields => 400,
            ProxyError::Provider { status, .. } => {
                if (400..600).contains(status) {
                    *status
                } else {
                    400
                }
            }
            ProxyError::Transport(_) => 500,
        }
    }

    /// Human summary for the `message` field of the JSON body
    pub fn summary(&self) -> &'static str {
        match self {
            ProxyError::MissingFields => "Missing required fields",
            ProxyError::Provider { .. } => "WhatsApp API error",
            ProxyError::Transport(_) => "Failed to send WhatsApp message",
        }
    }
}
